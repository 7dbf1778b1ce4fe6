//! Postcard serialization codec for network messages

use crate::error::{CoreError, Result};
use bytes::{BufMut, Bytes, BytesMut};
use postcard::{from_bytes, to_allocvec};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Maximum message size (16MB)
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Length prefix size in bytes
const PREFIX_LEN: usize = 4;

/// Message codec for serialization/deserialization
pub struct MessageCodec;

impl MessageCodec {
    /// Encode message to bytes
    ///
    /// Returns length-prefixed format:
    /// [4 bytes length (big endian)] [message payload]
    pub fn encode<T: Serialize>(msg: &T) -> Result<Bytes> {
        let payload = to_allocvec(msg)?;

        // Limit message size
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(CoreError::MessageTooLarge {
                size: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(PREFIX_LEN + payload.len());
        buf.put_u32(payload.len() as u32);
        buf.put_slice(&payload);
        Ok(buf.freeze())
    }

    /// Decode message from bytes
    ///
    /// Expects length-prefixed format
    pub fn decode<T: DeserializeOwned>(buf: &[u8]) -> Result<T> {
        if buf.len() < PREFIX_LEN {
            return Err(CoreError::InvalidMessageFormat(
                "Buffer too small for length prefix".into(),
            ));
        }

        let len = Self::checked_len([buf[0], buf[1], buf[2], buf[3]])?;

        if buf.len() < PREFIX_LEN + len {
            return Err(CoreError::InvalidMessageFormat(
                "Buffer too small for payload".into(),
            ));
        }

        Self::decode_payload(&buf[PREFIX_LEN..PREFIX_LEN + len])
    }

    /// Decode a bare payload (length prefix already stripped)
    pub fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
        from_bytes(payload).map_err(CoreError::from)
    }

    /// Read a length prefix and reject oversized frames
    pub fn checked_len(prefix: [u8; PREFIX_LEN]) -> Result<usize> {
        let len = u32::from_be_bytes(prefix) as usize;
        if len > MAX_MESSAGE_SIZE {
            return Err(CoreError::MessageTooLarge {
                size: len,
                max: MAX_MESSAGE_SIZE,
            });
        }
        Ok(len)
    }
}
