//! A single rotating log file, sized the way
//! `logging.handlers.RotatingFileHandler` does: once a write would push the
//! file past `max_bytes`, the existing backups shift up by one
//! (`name.N` → `name.N+1`, oldest dropped) and a fresh file is opened.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backup_count: u32,
    file: File,
    size: u64,
}

impl RotatingFile {
    pub fn open(path: PathBuf, max_bytes: u64, backup_count: u32) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok(RotatingFile {
            path,
            max_bytes,
            backup_count,
            file,
            size,
        })
    }

    /// Write `data` followed by a newline, flushing immediately. Rotates
    /// first if this write would exceed `max_bytes` (and `max_bytes > 0`).
    pub fn write_line(&mut self, data: &[u8]) -> std::io::Result<()> {
        let incoming = data.len() as u64 + 1;
        if self.max_bytes > 0 && self.size + incoming > self.max_bytes && self.size > 0 {
            self.rotate()?;
        }
        self.file.write_all(data)?;
        self.file.write_all(b"\n")?;
        self.file.flush()?;
        self.size += incoming;
        Ok(())
    }

    fn rotate(&mut self) -> std::io::Result<()> {
        if self.backup_count > 0 {
            let oldest = self.backup_path(self.backup_count);
            if oldest.exists() {
                std::fs::remove_file(&oldest)?;
            }
            for n in (1..self.backup_count).rev() {
                let src = self.backup_path(n);
                if src.exists() {
                    std::fs::rename(&src, self.backup_path(n + 1))?;
                }
            }
            std::fs::rename(&self.path, self.backup_path(1))?;
        } else {
            std::fs::remove_file(&self.path)?;
        }
        self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.size = 0;
        Ok(())
    }

    fn backup_path(&self, n: u32) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{n}"));
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_accumulate_in_one_file_below_the_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut f = RotatingFile::open(path.clone(), 1024, 2).unwrap();
        f.write_line(b"line one").unwrap();
        f.write_line(b"line two").unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "line one\nline two\n");
    }

    #[test]
    fn rotates_when_max_bytes_exceeded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut f = RotatingFile::open(path.clone(), 10, 2).unwrap();
        f.write_line(b"12345").unwrap();
        f.write_line(b"67890").unwrap();
        assert!(dir.path().join("app.log.1").exists());
        let current = std::fs::read_to_string(&path).unwrap();
        assert_eq!(current, "67890\n");
        let backup = std::fs::read_to_string(dir.path().join("app.log.1")).unwrap();
        assert_eq!(backup, "12345\n");
    }

    #[test]
    fn zero_backup_count_just_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut f = RotatingFile::open(path.clone(), 10, 0).unwrap();
        f.write_line(b"12345").unwrap();
        f.write_line(b"67890").unwrap();
        assert!(!dir.path().join("app.log.1").exists());
        let current = std::fs::read_to_string(&path).unwrap();
        assert_eq!(current, "67890\n");
    }
}
