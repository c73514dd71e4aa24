//! TOML configuration loading, following the raw/validated split used
//! throughout this pipeline's services.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::writer::StreamWriterConfig;

#[derive(Debug, Deserialize)]
pub struct RawStreamWriterConfig {
    sub_endpoint: Option<String>,
    work_dir: Option<String>,
    complete_dir: Option<String>,
    prefix: Option<String>,
    suffix: Option<String>,
    granularity_secs: Option<u32>,
    rollover_check_interval_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub sub_endpoint: String,
    pub writer: StreamWriterConfig,
    pub rollover_check_interval_secs: u64,
}

pub fn load_config_from_path(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
    load_config_from_str(&text)
}

pub fn load_config_from_str(text: &str) -> Result<LoadedConfig, ConfigError> {
    let raw: RawStreamWriterConfig =
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
    let sub_endpoint = raw
        .sub_endpoint
        .ok_or_else(|| ConfigError::MissingField("sub_endpoint".to_owned()))?;
    Ok(LoadedConfig {
        sub_endpoint,
        writer: StreamWriterConfig {
            work_dir: PathBuf::from(raw.work_dir.unwrap_or_else(|| "/var/spool/old-log-inn/work".to_owned())),
            complete_dir: PathBuf::from(
                raw.complete_dir.unwrap_or_else(|| "/var/spool/old-log-inn/complete".to_owned()),
            ),
            prefix: raw.prefix.unwrap_or_else(|| "archive_".to_owned()),
            suffix: raw.suffix.unwrap_or_else(|| ".gz".to_owned()),
            granularity_secs: raw.granularity_secs.unwrap_or(3600),
        },
        rollover_check_interval_secs: raw.rollover_check_interval_secs.unwrap_or(30),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(std::io::Error),
    #[error("parse: {0}")]
    Parse(String),
    #[error("missing required field: {0}")]
    MissingField(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_defaults_for_missing_fields() {
        let cfg = load_config_from_str("sub_endpoint = \"127.0.0.1:6000\"\n").unwrap();
        assert_eq!(cfg.writer.granularity_secs, 3600);
        assert_eq!(cfg.writer.prefix, "archive_");
    }

    #[test]
    fn missing_sub_endpoint_is_an_error() {
        let err = load_config_from_str("").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }
}
