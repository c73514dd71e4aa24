//! Length-prefixed multipart framing over a `tokio` stream.
//!
//! Wire shape: `[part_count: u8][len: u32 BE][bytes] ...` repeated
//! `part_count` times. This stands in for the multipart ZeroMQ message used
//! by the original pipeline (PUSH/PULL = 2 parts, PUB/SUB = 3 parts with a
//! leading topic frame) and is written/read atomically per call so a reader
//! never observes a partial message.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::NetError;

const MAX_PARTS: u8 = 8;
const MAX_PART_LEN: u32 = 256 * 1024 * 1024;

pub async fn write_multipart<W: AsyncWrite + Unpin>(
    writer: &mut W,
    parts: &[&[u8]],
) -> Result<(), NetError> {
    debug_assert!(parts.len() <= MAX_PARTS as usize);
    let mut buf = Vec::with_capacity(1 + parts.iter().map(|p| 4 + p.len()).sum::<usize>());
    buf.push(parts.len() as u8);
    for part in parts {
        buf.extend_from_slice(&(part.len() as u32).to_be_bytes());
        buf.extend_from_slice(part);
    }
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_multipart<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<Vec<Vec<u8>>, NetError> {
    let mut count_buf = [0u8; 1];
    reader.read_exact(&mut count_buf).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            NetError::Closed
        } else {
            NetError::Io(e)
        }
    })?;
    let count = count_buf[0];
    if count == 0 || count > MAX_PARTS {
        return Err(NetError::Malformed(format!("bad part count {count}")));
    }
    let mut parts = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf).await?;
        let len = u32::from_be_bytes(len_buf);
        if len > MAX_PART_LEN {
            return Err(NetError::Malformed(format!("part too large: {len}")));
        }
        let mut part = vec![0u8; len as usize];
        reader.read_exact(&mut part).await?;
        parts.push(part);
    }
    Ok(parts)
}
