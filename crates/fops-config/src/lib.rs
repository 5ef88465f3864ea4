//! fops-config
//!
//! Layered YAML configuration for the field-operations client.
//!
//! Documents are merged in order (earlier = base, later = override), converted
//! to JSON, checked for literal secrets, canonicalised and hashed. Typed views
//! over the merged JSON live in [`settings`]; bearer-token resolution lives in
//! [`secrets`].

pub mod secrets;
pub mod settings;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

pub use settings::{BackoffKind, ClientSettings, RouteSettings};

/// Value prefixes that look like credentials. Config must hold env var NAMES
/// only; a leaf string starting with one of these aborts loading with
/// `CONFIG_SECRET_DETECTED`.
const SECRET_PREFIXES: &[&str] = &[
    "Bearer ",    // pasted Authorization header
    "eyJ",        // JWT (base64url of `{"`)
    "sk-",        // generic API key style
    "sk_live",    // payment provider live key
    "sk_test",    // payment provider test key
    "AKIA",       // AWS access key ID
    "-----BEGIN", // PEM private keys
    "ghp_",       // GitHub PAT
    "glpat-",     // GitLab PAT
];

/// Result of loading and merging one or more YAML documents.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// SHA-256 (hex) of `canonical_json`.
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Typed client settings (timeouts, retry policy, base URL).
    pub fn client(&self) -> Result<ClientSettings> {
        ClientSettings::from_config_json(&self.config_json)
    }

    /// Typed backend route table.
    pub fn routes(&self) -> Result<RouteSettings> {
        RouteSettings::from_config_json(&self.config_json)
    }
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        // An empty document parses as null; treat it as "no overrides".
        if v_json.is_null() {
            continue;
        }
        merged = deep_merge(merged, v_json);
    }

    enforce_no_secret_literals(&merged)?;

    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    collect_string_leaves(v, "", &mut leaves);

    for (ptr, s) in leaves {
        if looks_like_secret(s) {
            bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
        }
    }
    Ok(())
}

fn collect_string_leaves<'a>(v: &'a Value, prefix: &str, out: &mut Vec<(String, &'a str)>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, k.replace('~', "~0").replace('/', "~1"));
                collect_string_leaves(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                collect_string_leaves(vv, &format!("{prefix}/{i}"), out);
            }
        }
        Value::String(s) => out.push((prefix.to_string(), s.as_str())),
        _ => {}
    }
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    if t.len() < 8 {
        return false;
    }
    SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_documents_override_earlier_ones() {
        let base = "client:\n  timeout_ms: 30000\n  max_retries: 3\n";
        let env = "client:\n  max_retries: 5\n";
        let cfg = load_layered_yaml_from_strings(&[base, env]).unwrap();
        assert_eq!(cfg.config_json["client"]["timeout_ms"], 30000);
        assert_eq!(cfg.config_json["client"]["max_retries"], 5);
    }

    #[test]
    fn empty_override_document_is_ignored() {
        let base = "client:\n  base_url: \"https://ops.example.test\"\n";
        let cfg = load_layered_yaml_from_strings(&[base, ""]).unwrap();
        assert_eq!(cfg.config_json["client"]["base_url"], "https://ops.example.test");
    }

    #[test]
    fn literal_bearer_token_is_rejected() {
        let yaml = "auth:\n  token_env: \"Bearer abcdefghijkl\"\n";
        let err = load_layered_yaml_from_strings(&[yaml]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("CONFIG_SECRET_DETECTED"), "got: {msg}");
        assert!(msg.contains("/auth/token_env"));
        assert!(!msg.contains("abcdefghijkl"), "value must never be echoed");
    }

    #[test]
    fn short_strings_are_never_flagged() {
        assert!(!looks_like_secret("eyJ"));
        assert!(looks_like_secret("eyJhbGciOiJIUzI1NiJ9"));
    }

    #[test]
    fn hash_is_stable_for_identical_input() {
        let yaml = "client:\n  base_url: \"https://ops.example.test\"\n";
        let a = load_layered_yaml_from_strings(&[yaml]).unwrap();
        let b = load_layered_yaml_from_strings(&[yaml]).unwrap();
        assert_eq!(a.config_hash, b.config_hash);
        assert_eq!(a.config_hash.len(), 64);
    }
}
