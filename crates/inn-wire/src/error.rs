use thiserror::Error;

/// Errors from compressing/decompressing or (de)serializing one message part.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("compression: {0}")]
    Compression(#[from] std::io::Error),
    #[error("header JSON: {0}")]
    Header(#[from] serde_json::Error),
}

/// Errors from parsing the 8-byte frame prefix.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame too short: need at least 9 bytes, got {0}")]
    TooShort(usize),
    #[error("unsupported frame version {0}")]
    UnsupportedVersion(u8),
    #[error("truncated frame: header/body shorter than declared lengths")]
    Truncated,
}
