//! Per-bucket retrieval: download every archive in a bucket, decode and
//! filter headers, sort and deduplicate by `(timestamp, uuid)`, then read
//! back and filter the bodies of the survivors.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use inn_wire::LogHeader;
use regex::Regex;
use stream_writer::LogStreamReader;

use crate::error::RetrieverError;
use crate::store::RemoteStore;

pub struct RetrievedRecord {
    pub header: LogHeader,
    pub body: Vec<u8>,
}

struct Candidate {
    header: LogHeader,
    data_file: usize,
    offset: u64,
    size: u64,
}

/// Download, merge, deduplicate, and filter one bucket's worth of archives.
/// `header_filter` decides whether a decoded header is worth keeping at all
/// (cheap, runs before body decompression); `body_regex`, if set, is
/// applied to the decompressed body of survivors only.
pub async fn process_bucket(
    store: &dyn RemoteStore,
    keys: &[String],
    work_dir: &Path,
    header_filter: &dyn Fn(&LogHeader) -> bool,
    body_regex: Option<&Regex>,
) -> Result<Vec<RetrievedRecord>, RetrieverError> {
    std::fs::create_dir_all(work_dir)?;

    let mut data_files: Vec<PathBuf> = Vec::new();
    let mut candidates: Vec<Candidate> = Vec::new();

    for (index, key) in keys.iter().enumerate() {
        let archive_path = work_dir.join(format!("{:04}-{}", index, sanitize(key)));
        store.download(key, &archive_path).await?;

        let data_path = work_dir.join(format!("{:04}-{}.data", index, sanitize(key)));
        let data_file_index = data_files.len();
        data_files.push(data_path.clone());
        let mut data_out = std::fs::File::create(&data_path)?;
        let mut written: u64 = 0;

        let reader = match LogStreamReader::open(&archive_path) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to open archive, skipping");
                std::fs::remove_file(&archive_path).ok();
                continue;
            }
        };

        for record in reader {
            let (compressed_header, compressed_body) = match record {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "frame error, aborting this archive");
                    break;
                }
            };
            let header = match inn_wire::decode_header(&compressed_header) {
                Ok(h) => h,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "dropping undecodable header");
                    continue;
                }
            };
            if !header_filter(&header) {
                continue;
            }
            let body = match inn_wire::decode_body(&compressed_body) {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "dropping undecodable body");
                    continue;
                }
            };
            data_out.write_all(&body)?;
            candidates.push(Candidate {
                header,
                data_file: data_file_index,
                offset: written,
                size: body.len() as u64,
            });
            written += body.len() as u64;
        }
        data_out.flush()?;
        std::fs::remove_file(&archive_path).ok();
    }

    candidates.sort_by(|a, b| a.header.dedup_key().cmp(&b.header.dedup_key()));
    candidates.dedup_by(|a, b| a.header.dedup_key() == b.header.dedup_key());

    let mut out = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let mut file = std::fs::File::open(&data_files[candidate.data_file])?;
        file.seek(SeekFrom::Start(candidate.offset))?;
        let mut body = vec![0u8; candidate.size as usize];
        file.read_exact(&mut body)?;

        let passes = match body_regex {
            None => true,
            Some(re) => std::str::from_utf8(&body).map(|s| re.is_match(s)).unwrap_or(false),
        };
        if passes {
            out.push(RetrievedRecord {
                header: candidate.header,
                body,
            });
        }
    }

    for data_file in &data_files {
        std::fs::remove_file(data_file).ok();
    }

    Ok(out)
}

fn sanitize(key: &str) -> String {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct DirBackedStore {
        archive_dir: PathBuf,
    }

    #[async_trait]
    impl RemoteStore for DirBackedStore {
        async fn list(&self, _prefix: &str, _marker: Option<&str>) -> Result<crate::store::Page, RetrieverError> {
            unimplemented!("not exercised in this test")
        }
        async fn download(&self, key: &str, dest_path: &Path) -> Result<(), RetrieverError> {
            std::fs::copy(self.archive_dir.join(key), dest_path)?;
            Ok(())
        }
    }

    fn header(uuid: &str, seq: u64, ts: f64, log_path: &str) -> LogHeader {
        LogHeader {
            hostname: "web-01".to_owned(),
            uuid: uuid.to_owned(),
            sequence: seq,
            pid: 1,
            timestamp: ts,
            log_path: log_path.to_owned(),
            nodename: None,
        }
    }

    #[tokio::test]
    async fn dedupes_same_event_seen_in_two_archives_and_keeps_first() {
        let store_dir = tempdir().unwrap();
        let work_dir = tempdir().unwrap();

        let h_shared = header("dup-uuid", 1, 1_700_000_000.0, "/var/log/a.log");
        let h_unique_a = header("a-only", 2, 1_700_000_001.0, "/var/log/a.log");
        let h_unique_b = header("b-only", 3, 1_700_000_002.0, "/var/log/a.log");

        write_single_archive(store_dir.path(), "archive_one.gz", &[
            (h_shared.clone(), b"shared body".as_slice()),
            (h_unique_a.clone(), b"a body".as_slice()),
        ]);
        write_single_archive(store_dir.path(), "archive_two.gz", &[
            (h_shared.clone(), b"shared body".as_slice()),
            (h_unique_b.clone(), b"b body".as_slice()),
        ]);

        let store = DirBackedStore {
            archive_dir: store_dir.path().to_path_buf(),
        };
        let records = process_bucket(
            &store,
            &["archive_one.gz".to_owned(), "archive_two.gz".to_owned()],
            work_dir.path(),
            &|_h| true,
            None,
        )
        .await
        .unwrap();

        assert_eq!(records.len(), 3);
        let uuids: std::collections::HashSet<_> = records.iter().map(|r| r.header.uuid.clone()).collect();
        assert_eq!(uuids, ["dup-uuid", "a-only", "b-only"].into_iter().map(String::from).collect());
    }

    #[tokio::test]
    async fn body_regex_filters_survivors() {
        let store_dir = tempdir().unwrap();
        let work_dir = tempdir().unwrap();

        let h1 = header("u1", 1, 1.0, "/var/log/a.log");
        let h2 = header("u2", 2, 2.0, "/var/log/a.log");
        write_single_archive(store_dir.path(), "archive.gz", &[
            (h1, b"contains ERROR token".as_slice()),
            (h2, b"totally fine".as_slice()),
        ]);

        let store = DirBackedStore {
            archive_dir: store_dir.path().to_path_buf(),
        };
        let re = Regex::new("ERROR").unwrap();
        let records = process_bucket(
            &store,
            &["archive.gz".to_owned()],
            work_dir.path(),
            &|_h| true,
            Some(&re),
        )
        .await
        .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].header.uuid, "u1");
    }

    fn write_single_archive(dir: &Path, name: &str, records: &[(LogHeader, &[u8])]) {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        let file = std::fs::File::create(dir.join(name)).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        for (h, b) in records {
            let ch = inn_wire::encode_header(h).unwrap();
            let cb = inn_wire::encode_body(b).unwrap();
            encoder.write_all(&inn_wire::frame(&ch, &cb)).unwrap();
        }
        encoder.finish().unwrap();
    }
}
