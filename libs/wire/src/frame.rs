//! Length-prefix framing shared by every link.
//!
//! A frame is a 4-byte big-endian length followed by that many payload bytes.

use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Largest frame either side may send or claim. Larger claims are rejected
/// before any allocation happens.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Write one frame: length prefix, payload, flush.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    if bytes.len() > MAX_FRAME_LEN {
        return Err(Error::FrameTooLarge {
            len: bytes.len(),
            max: MAX_FRAME_LEN,
        });
    }
    writer.write_u32(bytes.len() as u32).await?;
    writer.write_all(bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame. A clean EOF at the length prefix or mid-payload is
/// reported as `ConnectionClosed`.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>> {
    let len = reader.read_u32().await.map_err(eof_as_closed)? as usize;

    if len > MAX_FRAME_LEN {
        return Err(Error::FrameTooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await.map_err(eof_as_closed)?;
    Ok(buf)
}

/// Run `op` under an optional time limit.
pub(crate) async fn maybe_timeout<F, T>(
    limit: Option<Duration>,
    what: &'static str,
    op: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, op)
            .await
            .map_err(|_| Error::Timeout { op: what })?,
        None => op.await,
    }
}

fn eof_as_closed(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::ConnectionClosed
    } else {
        e.into()
    }
}
