//! Writes a filtered subset of the published stream to local rotating log
//! files, one file handle per distinct `log_path` basename, kept open for
//! the life of the process.

mod filters;
mod rotating_file;

pub use filters::{body_matches, HeaderFilters};
pub use rotating_file::RotatingFile;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use regex::Regex;

pub struct FileLoggerConfig {
    pub sub_endpoint: String,
    pub output_dir: PathBuf,
    pub add_hostname_to_path: bool,
    pub max_bytes: u64,
    pub backup_count: u32,
    pub header_filters: HeaderFilters,
    pub body_filter: Option<Regex>,
}

pub struct FileLogger {
    config: FileLoggerConfig,
    handles: HashMap<String, RotatingFile>,
}

impl FileLogger {
    pub fn new(config: FileLoggerConfig) -> Self {
        FileLogger {
            config,
            handles: HashMap::new(),
        }
    }

    /// Decode, filter, and (if accepted) write one message. The body is only
    /// decompressed once the header filters have already passed, so
    /// rejected events never pay for body decompression.
    pub fn handle_message(
        &mut self,
        compressed_header: &[u8],
        compressed_body: &[u8],
    ) -> Result<bool, FileLoggerError> {
        let header = inn_wire::decode_header(compressed_header)?;
        if !self.config.header_filters.matches(&header) {
            return Ok(false);
        }
        let body = inn_wire::decode_body(compressed_body)?;
        if !body_matches(self.config.body_filter.as_ref(), &body) {
            return Ok(false);
        }

        let filename = compute_filename(&header.log_path, &header.hostname, self.config.add_hostname_to_path);
        if !self.handles.contains_key(&filename) {
            let path = self.config.output_dir.join(&filename);
            let file = RotatingFile::open(path, self.config.max_bytes, self.config.backup_count)?;
            self.handles.insert(filename.clone(), file);
        }
        let handle = self.handles.get_mut(&filename).expect("just inserted");
        handle.write_line(&body)?;
        Ok(true)
    }
}

fn compute_filename(log_path: &str, hostname: &str, add_hostname: bool) -> String {
    let base = Path::new(log_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(log_path)
        .to_owned();
    if add_hostname {
        format!("{hostname}_{base}")
    } else {
        base
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FileLoggerError {
    #[error("codec: {0}")]
    Codec(#[from] inn_wire::CodecError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use inn_wire::LogHeader;
    use tempfile::tempdir;

    fn header() -> LogHeader {
        LogHeader {
            hostname: "web-01".to_owned(),
            uuid: "u".to_owned(),
            sequence: 1,
            pid: 1,
            timestamp: 0.0,
            log_path: "/var/log/app/access.log".to_owned(),
            nodename: None,
        }
    }

    fn encode(h: &LogHeader, body: &[u8]) -> (Vec<u8>, Vec<u8>) {
        (
            inn_wire::encode_header(h).unwrap(),
            inn_wire::encode_body(body).unwrap(),
        )
    }

    #[test]
    fn filename_uses_basename_of_log_path() {
        assert_eq!(compute_filename("/var/log/app/access.log", "web-01", false), "access.log");
        assert_eq!(compute_filename("/var/log/app/access.log", "web-01", true), "web-01_access.log");
    }

    #[test]
    fn accepted_message_is_written_and_flushed() {
        let dir = tempdir().unwrap();
        let mut logger = FileLogger::new(FileLoggerConfig {
            sub_endpoint: "unused".to_owned(),
            output_dir: dir.path().to_path_buf(),
            add_hostname_to_path: false,
            max_bytes: 0,
            backup_count: 0,
            header_filters: HeaderFilters::default(),
            body_filter: None,
        });
        let (h, b) = encode(&header(), b"a log line");
        let accepted = logger.handle_message(&h, &b).unwrap();
        assert!(accepted);
        let contents = std::fs::read_to_string(dir.path().join("access.log")).unwrap();
        assert_eq!(contents, "a log line\n");
    }

    #[test]
    fn rejected_header_writes_nothing() {
        let dir = tempdir().unwrap();
        let mut logger = FileLogger::new(FileLoggerConfig {
            sub_endpoint: "unused".to_owned(),
            output_dir: dir.path().to_path_buf(),
            add_hostname_to_path: false,
            max_bytes: 0,
            backup_count: 0,
            header_filters: HeaderFilters {
                hostname: Some(Regex::new("^db-").unwrap()),
                ..Default::default()
            },
            body_filter: None,
        });
        let (h, b) = encode(&header(), b"a log line");
        let accepted = logger.handle_message(&h, &b).unwrap();
        assert!(!accepted);
        assert!(!dir.path().join("access.log").exists());
    }
}
