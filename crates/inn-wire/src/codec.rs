//! Compression of the two message parts (header JSON, opaque body).
//!
//! Header and body are compressed independently so that a consumer can
//! inspect the header without paying to decompress the body.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::CodecError;
use crate::header::LogHeader;

/// Serialize and zlib-compress a header.
pub fn encode_header(header: &LogHeader) -> Result<Vec<u8>, CodecError> {
    let json = serde_json::to_vec(header)?;
    compress(&json)
}

/// Decompress and deserialize a header.
pub fn decode_header(compressed: &[u8]) -> Result<LogHeader, CodecError> {
    let json = decompress(compressed)?;
    Ok(serde_json::from_slice(&json)?)
}

/// Zlib-compress an opaque body.
pub fn encode_body(body: &[u8]) -> Result<Vec<u8>, CodecError> {
    compress(body)
}

/// Decompress an opaque body.
pub fn decode_body(compressed: &[u8]) -> Result<Vec<u8>, CodecError> {
    decompress(compressed)
}

fn compress(raw: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw)?;
    Ok(encoder.finish()?)
}

fn decompress(raw: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut decoder = ZlibDecoder::new(raw);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
