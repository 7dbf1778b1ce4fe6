//! Async frame I/O over any tokio stream
//!
//! Protocol format: [4-byte big-endian length][N-byte payload]

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::MessageCodec;
use crate::{CoreError, Result};

/// Payload buffer reserved up front
const INITIAL_PAYLOAD_CAPACITY: usize = 8 * 1024;

/// Encode `msg` and write it as one frame
pub async fn write_frame<W, T>(writer: &mut W, msg: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let encoded = MessageCodec::encode(msg)?;
    writer.write_all(&encoded).await?;
    writer.flush().await?;
    tracing::trace!("Wrote frame of {} bytes", encoded.len());
    Ok(())
}

/// Read one complete frame; EOF anywhere is an error
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    try_read_frame(reader).await?.ok_or_else(|| {
        CoreError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "Stream closed while reading length",
        ))
    })
}

/// Read one complete frame, or `None` if the peer closed cleanly first
pub async fn try_read_frame<R, T>(reader: &mut R) -> Result<Option<T>>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    // Read 4-byte length prefix
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    // Validate size (prevent DoS)
    let len = MessageCodec::checked_len(len_buf)?;

    // Read payload; memory grows with bytes received, not with the claimed length
    let mut data = Vec::with_capacity(len.min(INITIAL_PAYLOAD_CAPACITY));
    (&mut *reader).take(len as u64).read_to_end(&mut data).await?;
    if data.len() != len {
        return Err(CoreError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "Stream closed while reading payload",
        )));
    }

    tracing::trace!("Read frame of {} bytes", len + 4);
    MessageCodec::decode_payload(&data).map(Some)
}
