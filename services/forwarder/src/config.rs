//! Forwarder configuration loading: TOML is the sole config source.
//!
//! # Required fields
//! - `pull_bind`
//!
//! Everything else defaults: `pub_bind` to `0.0.0.0:0` (OS-assigned), `topic`
//! to the local hostname, `hwm` to 20000.

use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    pub pull_bind: String,
    pub pub_bind: String,
    pub topic: String,
    pub hwm: usize,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    pull_bind: Option<String>,
    pub_bind: Option<String>,
    topic: Option<String>,
    hwm: Option<usize>,
}

pub fn load_config_from_path(path: &Path) -> Result<ForwarderConfig, ConfigError> {
    let toml_str = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("reading config file '{}': {e}", path.display())))?;
    load_config_from_str(&toml_str)
}

pub fn load_config_from_str(toml_str: &str) -> Result<ForwarderConfig, ConfigError> {
    let raw: RawConfig = toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;

    let pull_bind = raw
        .pull_bind
        .ok_or_else(|| ConfigError::MissingField("pull_bind".to_owned()))?;
    let pub_bind = raw.pub_bind.unwrap_or_else(|| "0.0.0.0:0".to_owned());
    let topic = raw.topic.unwrap_or_else(default_topic);
    let hwm = raw.hwm.unwrap_or(20_000);

    Ok(ForwarderConfig {
        pull_bind,
        pub_bind,
        topic,
        hwm,
    })
}

fn default_topic() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_owned())
}

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    MissingField(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(s) => write!(f, "IO error: {s}"),
            ConfigError::Parse(s) => write!(f, "parse error: {s}"),
            ConfigError::MissingField(s) => write!(f, "missing required field: {s}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_pull_bind_is_an_error() {
        let err = load_config_from_str("hwm = 10").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn defaults_apply_when_optional_fields_are_absent() {
        let cfg = load_config_from_str("pull_bind = \"0.0.0.0:9000\"").unwrap();
        assert_eq!(cfg.hwm, 20_000);
        assert_eq!(cfg.pub_bind, "0.0.0.0:0");
        assert!(!cfg.topic.is_empty());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = load_config_from_str(
            "pull_bind = \"0.0.0.0:9000\"\npub_bind = \"0.0.0.0:9001\"\ntopic = \"custom\"\nhwm = 5",
        )
        .unwrap();
        assert_eq!(cfg.pub_bind, "0.0.0.0:9001");
        assert_eq!(cfg.topic, "custom");
        assert_eq!(cfg.hwm, 5);
    }
}
