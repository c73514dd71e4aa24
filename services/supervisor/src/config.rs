use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::SupervisorError;

/// One child process to launch: a program name resolved via `PATH` and its
/// argument list.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgramSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalConfig {
    pub stream_writer: ProgramSpec,
    pub aggregator: ProgramSpec,
    pub data_source: Option<ProgramSpec>,
    /// Hard ceiling on how long the whole pipeline runs before a clean
    /// shutdown is initiated; absent means "run until signaled".
    pub duration_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub forwarder: ProgramSpec,
    pub file_logger: Option<ProgramSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorConfig {
    pub global: GlobalConfig,
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeConfig>,
}

pub fn load_config(path: &Path) -> Result<SupervisorConfig, SupervisorError> {
    let text = std::fs::read_to_string(path)?;
    load_config_from_str(&text)
}

pub fn load_config_from_str(text: &str) -> Result<SupervisorConfig, SupervisorError> {
    serde_json::from_str(text).map_err(|e| SupervisorError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_and_per_node_sections() {
        let json = r#"
        {
          "global": {
            "stream_writer": { "program": "stream-writer", "args": ["--config", "sw.toml"] },
            "aggregator": { "program": "aggregator", "args": ["--upstreams", "up.txt"] },
            "duration_secs": 3600
          },
          "nodes": {
            "node-a": {
              "forwarder": { "program": "forwarder", "args": ["--config", "a.toml"] },
              "file_logger": { "program": "file-logger", "args": ["--sub", "tcp://127.0.0.1:9"] }
            }
          }
        }
        "#;
        let config = load_config_from_str(json).unwrap();
        assert_eq!(config.global.stream_writer.program, "stream-writer");
        assert_eq!(config.global.duration_secs, Some(3600));
        assert!(config.global.data_source.is_none());
        let node = &config.nodes["node-a"];
        assert_eq!(node.forwarder.args, vec!["--config".to_owned(), "a.toml".to_owned()]);
        assert!(node.file_logger.is_some());
    }

    #[test]
    fn rejects_missing_required_field() {
        let json = r#"{ "global": { "aggregator": { "program": "aggregator" } }, "nodes": {} }"#;
        assert!(load_config_from_str(json).is_err());
    }
}
