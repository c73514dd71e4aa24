//! `RemoteStore` is the single seam for the archive store: the concrete
//! object-store client it talks to is deliberately out of this crate's
//! scope, specified only at this interface.

use std::path::Path;

use async_trait::async_trait;

use crate::error::RetrieverError;

pub struct Page {
    pub keys: Vec<String>,
    pub next_marker: Option<String>,
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// List keys under `prefix`, paginating from `marker` (the previous
    /// page's last key, or `None` for the first page).
    async fn list(&self, prefix: &str, marker: Option<&str>) -> Result<Page, RetrieverError>;

    /// Download `key` to `dest_path`, overwriting it if present.
    async fn download(&self, key: &str, dest_path: &Path) -> Result<(), RetrieverError>;
}

/// A `RemoteStore` backed by a minimal S3-compatible list/get HTTP API.
pub struct HttpRemoteStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemoteStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpRemoteStore {
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("reqwest client with a fixed timeout always builds"),
        }
    }
}

#[derive(serde::Deserialize)]
struct ListResponse {
    keys: Vec<String>,
    next_marker: Option<String>,
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn list(&self, prefix: &str, marker: Option<&str>) -> Result<Page, RetrieverError> {
        let mut url = format!("{}/list?prefix={}", self.base_url, urlencode(prefix));
        if let Some(m) = marker {
            url.push_str(&format!("&marker={}", urlencode(m)));
        }
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RetrieverError::RemoteStore(e.to_string()))?;
        let body: ListResponse = resp
            .json()
            .await
            .map_err(|e| RetrieverError::RemoteStore(e.to_string()))?;
        Ok(Page {
            keys: body.keys,
            next_marker: body.next_marker,
        })
    }

    async fn download(&self, key: &str, dest_path: &Path) -> Result<(), RetrieverError> {
        let url = format!("{}/object/{}", self.base_url, urlencode(key));
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RetrieverError::RemoteStore(e.to_string()))?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| RetrieverError::RemoteStore(e.to_string()))?;
        std::fs::write(dest_path, &bytes)?;
        Ok(())
    }
}

fn urlencode(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}
