use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use retriever::{Page, RemoteStore, RetrieverError};

/// An in-memory `RemoteStore` for exercising enumeration, pagination, and
/// download without a network dependency. Keys are paginated in sorted
/// order, `page_size` keys at a time.
pub struct FakeStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    page_size: usize,
}

impl FakeStore {
    pub fn new(page_size: usize) -> Self {
        FakeStore {
            objects: Mutex::new(BTreeMap::new()),
            page_size: page_size.max(1),
        }
    }

    pub fn put(&self, key: impl Into<String>, bytes: Vec<u8>) {
        self.objects.lock().unwrap().insert(key.into(), bytes);
    }
}

#[async_trait]
impl RemoteStore for FakeStore {
    async fn list(&self, prefix: &str, marker: Option<&str>) -> Result<Page, RetrieverError> {
        let objects = self.objects.lock().unwrap();
        let mut matching: Vec<&String> = objects.keys().filter(|k| k.starts_with(prefix)).collect();
        matching.sort();

        let start = match marker {
            Some(m) => matching.partition_point(|k| k.as_str() <= m),
            None => 0,
        };
        let page: Vec<String> = matching[start..].iter().take(self.page_size).map(|k| (**k).clone()).collect();
        let next_marker = if start + page.len() < matching.len() {
            page.last().cloned()
        } else {
            None
        };
        Ok(Page { keys: page, next_marker })
    }

    async fn download(&self, key: &str, dest_path: &Path) -> Result<(), RetrieverError> {
        let objects = self.objects.lock().unwrap();
        let bytes = objects
            .get(key)
            .ok_or_else(|| RetrieverError::RemoteStore(format!("no such key: {key}")))?;
        std::fs::write(dest_path, bytes)?;
        Ok(())
    }
}
