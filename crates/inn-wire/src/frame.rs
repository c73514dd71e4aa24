//! The on-disk / archive record framing: a fixed 9-byte prefix followed by
//! the (already-compressed) header bytes and body bytes.
//!
//! ```text
//! [ version: u8 ][ header_len: u32 BE ][ body_len: u32 BE ][ header ][ body ]
//! ```

use crate::error::FrameError;

pub const FRAME_VERSION: u8 = 1;
const PREFIX_LEN: usize = 1 + 4 + 4;

/// Prefix + compressed header + compressed body, ready to write to a stream.
pub fn frame(compressed_header: &[u8], compressed_body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(PREFIX_LEN + compressed_header.len() + compressed_body.len());
    out.push(FRAME_VERSION);
    out.extend_from_slice(&(compressed_header.len() as u32).to_be_bytes());
    out.extend_from_slice(&(compressed_body.len() as u32).to_be_bytes());
    out.extend_from_slice(compressed_header);
    out.extend_from_slice(compressed_body);
    out
}

/// Parse one framed record from the front of `buf`, returning the
/// (compressed header, compressed body) and the number of bytes consumed.
pub fn unframe(buf: &[u8]) -> Result<(&[u8], &[u8], usize), FrameError> {
    if buf.len() < PREFIX_LEN {
        return Err(FrameError::TooShort(buf.len()));
    }
    let version = buf[0];
    if version != FRAME_VERSION {
        return Err(FrameError::UnsupportedVersion(version));
    }
    let header_len = u32::from_be_bytes(buf[1..5].try_into().unwrap()) as usize;
    let body_len = u32::from_be_bytes(buf[5..9].try_into().unwrap()) as usize;
    let total = PREFIX_LEN + header_len + body_len;
    if buf.len() < total {
        return Err(FrameError::Truncated);
    }
    let header = &buf[PREFIX_LEN..PREFIX_LEN + header_len];
    let body = &buf[PREFIX_LEN + header_len..total];
    Ok((header, body, total))
}
