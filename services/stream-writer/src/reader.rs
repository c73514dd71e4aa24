//! Pull-mode reader over one completed archive file. Iterates to
//! end-of-stream, yielding the still-compressed `(header, body)` byte pairs
//! for each framed record.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use inn_wire::{unframe, FrameError};

pub struct LogStreamReader {
    buf: Vec<u8>,
    offset: usize,
    done: bool,
}

impl LogStreamReader {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let mut decoder = GzDecoder::new(file);
        let mut buf = Vec::new();
        decoder.read_to_end(&mut buf)?;
        Ok(LogStreamReader {
            buf,
            offset: 0,
            done: false,
        })
    }
}

impl Iterator for LogStreamReader {
    type Item = Result<(Vec<u8>, Vec<u8>), FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.buf.len() {
            return None;
        }
        match unframe(&self.buf[self.offset..]) {
            Ok((header, body, consumed)) => {
                let item = (header.to_vec(), body.to_vec());
                self.offset += consumed;
                Some(Ok(item))
            }
            Err(e) => {
                // A framing error aborts this single file; the bucket loop
                // continues with the next archive.
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::bucket_start;
    use crate::clock::Clock;
    use crate::writer::{LogStreamWriter, StreamWriterConfig};
    use inn_wire::LogHeader;
    use std::sync::Arc;
    use tempfile::tempdir;

    struct FixedClock(chrono::DateTime<chrono::Utc>);
    impl Clock for FixedClock {
        fn now(&self) -> chrono::DateTime<chrono::Utc> {
            self.0
        }
    }

    #[test]
    fn reads_back_every_written_record() {
        let dir = tempdir().unwrap();
        let now = chrono::Utc::now();
        let _ = bucket_start(now, 60);
        let config = StreamWriterConfig {
            work_dir: dir.path().join("work"),
            complete_dir: dir.path().join("complete"),
            prefix: "archive_".to_owned(),
            suffix: ".gz".to_owned(),
            granularity_secs: 3600,
        };
        let mut writer = LogStreamWriter::new(config, Arc::new(FixedClock(now)));
        let h1 = LogHeader {
            hostname: "a".into(),
            uuid: "u1".into(),
            sequence: 1,
            pid: 1,
            timestamp: 1.0,
            log_path: "/x".into(),
            nodename: None,
        };
        let h2 = LogHeader {
            sequence: 2,
            uuid: "u2".into(),
            ..h1.clone()
        };
        writer.write(&h1, b"line one").unwrap();
        writer.write(&h2, b"line two").unwrap();
        drop(writer);

        let archive_path = std::fs::read_dir(dir.path().join("complete"))
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        let reader = LogStreamReader::open(&archive_path).unwrap();
        let records: Vec<_> = reader.collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(records.len(), 2);
        let bodies: Vec<_> = records
            .iter()
            .map(|(h, b)| (inn_wire::decode_header(h).unwrap(), inn_wire::decode_body(b).unwrap()))
            .collect();
        assert_eq!(bodies[0].0.sequence, 1);
        assert_eq!(bodies[0].1, b"line one");
        assert_eq!(bodies[1].0.sequence, 2);
        assert_eq!(bodies[1].1, b"line two");
    }
}
