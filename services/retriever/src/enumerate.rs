//! Enumerate archive keys in the remote store, filter by prefix/suffix and
//! an inclusive `[low, high]` bucket-timestamp range, and group by bucket.

use std::collections::BTreeMap;

use crate::error::RetrieverError;
use crate::store::RemoteStore;

const TS14_LEN: usize = 14;

/// Extract the 14-digit bucket timestamp from a key, if it matches
/// `<prefix>YYYYMMDDHHMMSS<suffix>` exactly.
pub fn extract_ts14<'a>(key: &'a str, prefix: &str, suffix: &str) -> Option<&'a str> {
    let rest = key.strip_prefix(prefix)?;
    let ts = rest.strip_suffix(suffix)?;
    if ts.len() == TS14_LEN && ts.bytes().all(|b| b.is_ascii_digit()) {
        Some(ts)
    } else {
        None
    }
}

/// Paginate the whole store under `prefix`, keep only keys whose bucket
/// timestamp falls in `[low_ts, high_ts]` (inclusive, lexicographic), and
/// group them by bucket.
pub async fn enumerate_buckets(
    store: &dyn RemoteStore,
    prefix: &str,
    suffix: &str,
    low_ts: &str,
    high_ts: &str,
) -> Result<BTreeMap<String, Vec<String>>, RetrieverError> {
    let mut buckets: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut marker: Option<String> = None;
    loop {
        let page = store.list(prefix, marker.as_deref()).await?;
        for key in &page.keys {
            if let Some(ts) = extract_ts14(key, prefix, suffix) {
                if ts >= low_ts && ts <= high_ts {
                    buckets.entry(ts.to_owned()).or_default().push(key.clone());
                }
            }
        }
        match page.next_marker {
            Some(next) => marker = Some(next),
            None => break,
        }
    }
    Ok(buckets)
}
