pub mod enumerate;
pub mod error;
pub mod merge;
pub mod store;

pub use enumerate::{enumerate_buckets, extract_ts14};
pub use error::RetrieverError;
pub use merge::{process_bucket, RetrievedRecord};
pub use store::{HttpRemoteStore, Page, RemoteStore};
