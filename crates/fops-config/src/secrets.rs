//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only the env var NAME of the bearer token
//!   (`/auth/token_env`, default `FOPS_API_TOKEN`).
//! - Callers resolve once at startup and hand the result to constructors;
//!   no other module reads the environment for credentials.
//! - `Debug` output is redacted and errors name the variable, never the value.

use anyhow::{bail, Result};
use serde_json::Value;

pub const DEFAULT_TOKEN_ENV: &str = "FOPS_API_TOKEN";

/// Credentials resolved from the environment.
#[derive(Clone)]
pub struct ResolvedSecrets {
    /// Env var the token was read from (safe to print).
    pub token_env: String,
    /// Bearer token. `None` if the variable was absent or blank.
    pub api_token: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("token_env", &self.token_env)
            .field("api_token", &self.api_token.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl ResolvedSecrets {
    /// Fail with `SECRETS_MISSING` unless a token was resolved.
    pub fn require_token(&self) -> Result<&str> {
        match self.api_token.as_deref() {
            Some(t) => Ok(t),
            None => bail!(
                "SECRETS_MISSING: required env var '{}' (api token) is not set or empty",
                self.token_env
            ),
        }
    }
}

fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

/// Resolve the bearer token named by the config. Never fails; use
/// [`ResolvedSecrets::require_token`] where a token is mandatory.
pub fn resolve_secrets(config_json: &Value) -> ResolvedSecrets {
    let token_env =
        read_str_at(config_json, "/auth/token_env").unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string());
    let api_token = resolve_env(&token_env);
    ResolvedSecrets {
        token_env,
        api_token,
    }
}
