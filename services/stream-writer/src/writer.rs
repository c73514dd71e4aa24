//! The rotating, gzip-wrapped archive writer.
//!
//! A crash loses at most the record currently being written: every write
//! flushes both the gzip encoder and the underlying file.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::write::GzEncoder;
use flate2::Compression;
use inn_wire::LogHeader;

use crate::bucket::{bucket_key, bucket_start};
use crate::clock::Clock;
use crate::error::StreamWriterError;

#[derive(Debug, Clone)]
pub struct StreamWriterConfig {
    pub work_dir: PathBuf,
    pub complete_dir: PathBuf,
    pub prefix: String,
    pub suffix: String,
    pub granularity_secs: u32,
}

enum State {
    Idle,
    Open {
        bucket: String,
        work_path: PathBuf,
        encoder: GzEncoder<File>,
    },
}

pub struct LogStreamWriter {
    config: StreamWriterConfig,
    clock: Arc<dyn Clock>,
    state: State,
}

impl LogStreamWriter {
    pub fn new(config: StreamWriterConfig, clock: Arc<dyn Clock>) -> Self {
        LogStreamWriter {
            config,
            clock,
            state: State::Idle,
        }
    }

    /// Encode and append one record, rotating to a new bucket file first if
    /// the current time has crossed into a new bucket. `body` is the raw,
    /// uncompressed body; use this when the caller holds decompressed data.
    pub fn write(&mut self, header: &LogHeader, body: &[u8]) -> Result<(), StreamWriterError> {
        let compressed_header = inn_wire::encode_header(header)?;
        let compressed_body = inn_wire::encode_body(body)?;
        self.write_compressed(&compressed_header, &compressed_body)
    }

    /// Append one record whose header and body are already wire-compressed,
    /// exactly as received from the publish stream. This avoids paying to
    /// decompress and recompress data the writer never needs to inspect.
    pub fn write_compressed(
        &mut self,
        compressed_header: &[u8],
        compressed_body: &[u8],
    ) -> Result<(), StreamWriterError> {
        self.roll_if_needed()?;
        if matches!(self.state, State::Idle) {
            self.open_bucket()?;
        }

        let framed = inn_wire::frame(compressed_header, compressed_body);

        let State::Open { encoder, .. } = &mut self.state else {
            unreachable!("just ensured Open above");
        };
        encoder.write_all(&framed)?;
        encoder.flush()?;
        Ok(())
    }

    /// Close and rename the current bucket if the clock has moved into a
    /// new bucket since it was opened. Callers invoke this on an idle timer
    /// tick to bound how long a sparse-traffic bucket stays open.
    pub fn check_for_rollover(&mut self) -> Result<(), StreamWriterError> {
        self.roll_if_needed()
    }

    fn roll_if_needed(&mut self) -> Result<(), StreamWriterError> {
        let current_bucket = bucket_key(bucket_start(self.clock.now(), self.config.granularity_secs));
        let should_close = match &self.state {
            State::Idle => false,
            State::Open { bucket, .. } => *bucket != current_bucket,
        };
        if should_close {
            self.close_current()?;
        }
        Ok(())
    }

    fn open_bucket(&mut self) -> Result<(), StreamWriterError> {
        let bucket = bucket_key(bucket_start(self.clock.now(), self.config.granularity_secs));
        let filename = format!("{}{}{}", self.config.prefix, bucket, self.config.suffix);
        std::fs::create_dir_all(&self.config.work_dir)?;
        let work_path = self.config.work_dir.join(&filename);
        let file = File::create(&work_path)?;
        let encoder = GzEncoder::new(file, Compression::default());
        self.state = State::Open {
            bucket,
            work_path,
            encoder,
        };
        Ok(())
    }

    fn close_current(&mut self) -> Result<(), StreamWriterError> {
        let State::Open { bucket, work_path, encoder } =
            std::mem::replace(&mut self.state, State::Idle)
        else {
            return Ok(());
        };
        encoder.finish()?;
        let filename = format!("{}{}{}", self.config.prefix, bucket, self.config.suffix);
        std::fs::create_dir_all(&self.config.complete_dir)?;
        let complete_path = self.config.complete_dir.join(&filename);
        std::fs::rename(&work_path, &complete_path)?;
        Ok(())
    }

    /// Path of the archive currently being written, if any.
    pub fn current_work_path(&self) -> Option<&Path> {
        match &self.state {
            State::Idle => None,
            State::Open { work_path, .. } => Some(work_path),
        }
    }
}

impl Drop for LogStreamWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close_current() {
            tracing::error!(error = %e, "failed to close archive on drop");
        }
    }
}
