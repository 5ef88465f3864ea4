//! Typed views over the merged config JSON.
//!
//! Every key has a default so an empty config yields the parity behavior:
//! 30s timeout, 3 retries, 1000ms linear backoff.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Backoff formula selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    /// `base_delay * n` before retry n.
    #[default]
    Linear,
    /// `base_delay * 2^(n-1)`, capped at `max_delay_ms`.
    Exponential,
}

/// `/client` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientSettings {
    /// Backend origin, e.g. `https://ops.example.com`. Required for any
    /// command that touches the network.
    pub base_url: Option<String>,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub backoff: BackoffKind,
    pub max_delay_ms: u64,
    /// Send a deterministic `Idempotency-Key` header on stage submissions.
    pub idempotency_header: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: 30_000,
            max_retries: 3,
            base_delay_ms: 1_000,
            backoff: BackoffKind::Linear,
            max_delay_ms: 30_000,
            idempotency_header: false,
        }
    }
}

impl ClientSettings {
    pub fn from_config_json(config_json: &Value) -> Result<Self> {
        let settings: ClientSettings = match config_json.get("client") {
            None | Some(Value::Null) => ClientSettings::default(),
            Some(v) => serde_json::from_value(v.clone()).context("invalid /client section")?,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            bail!("CONFIG_INVALID /client/timeout_ms must be > 0");
        }
        if self.backoff == BackoffKind::Exponential && self.max_delay_ms < self.base_delay_ms {
            bail!(
                "CONFIG_INVALID /client/max_delay_ms ({}) must be >= base_delay_ms ({})",
                self.max_delay_ms,
                self.base_delay_ms
            );
        }
        if let Some(url) = &self.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                bail!("CONFIG_INVALID /client/base_url must start with http:// or https://");
            }
        }
        Ok(())
    }

    /// Base URL or an error naming the missing key.
    pub fn require_base_url(&self) -> Result<&str> {
        match self.base_url.as_deref() {
            Some(u) => Ok(u),
            None => bail!("CONFIG_MISSING /client/base_url is required for network commands"),
        }
    }
}

/// `/routes` section: backend paths for the collaborator calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouteSettings {
    pub stage_details: String,
    pub stage_submit: String,
    pub file_upload: String,
    pub feedback_definitions: String,
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            stage_details: "/api/stage/details".to_string(),
            stage_submit: "/api/stage/submit".to_string(),
            file_upload: "/api/files/upload".to_string(),
            feedback_definitions: "/api/feedback/definitions".to_string(),
        }
    }
}

impl RouteSettings {
    /// Missing entries keep their defaults. A present entry must be a string
    /// path starting with `/`.
    pub fn from_config_json(config_json: &Value) -> Result<Self> {
        let section = match config_json.get("routes") {
            None | Some(Value::Null) => return Ok(RouteSettings::default()),
            Some(v) => v,
        };
        let Value::Object(entries) = section else {
            bail!("CONFIG_INVALID /routes must be a mapping of route name to path");
        };
        for (key, value) in entries {
            if !value.is_string() {
                bail!("CONFIG_INVALID /routes/{key} must be a string path");
            }
        }
        let routes: RouteSettings = serde_json::from_value(section.clone())
            .context("CONFIG_INVALID /routes section")?;
        routes.validate()?;
        Ok(routes)
    }

    fn validate(&self) -> Result<()> {
        for (key, path) in [
            ("stage_details", &self.stage_details),
            ("stage_submit", &self.stage_submit),
            ("file_upload", &self.file_upload),
            ("feedback_definitions", &self.feedback_definitions),
        ] {
            if !path.starts_with('/') {
                bail!("CONFIG_INVALID /routes/{key} must start with '/' (got {path:?})");
            }
        }
        Ok(())
    }
}
