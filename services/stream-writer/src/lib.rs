//! Rotating, gzip-wrapped, time-bucketed archive writer and reader.

mod bucket;
mod clock;
mod config;
mod error;
mod reader;
mod writer;

pub use bucket::{bucket_key, bucket_start, BUCKET_FORMAT};
pub use clock::{Clock, SystemClock};
pub use config::{load_config_from_path, load_config_from_str, ConfigError, LoadedConfig};
pub use error::StreamWriterError;
pub use reader::LogStreamReader;
pub use writer::{LogStreamWriter, StreamWriterConfig};
