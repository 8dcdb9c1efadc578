//! RPC frame encoding and decoding
//!
//! Frame format:
//! - 4 bytes: payload length (big-endian u32)
//! - N bytes: JSON payload

use bytes::{Buf, BufMut, BytesMut};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;

/// Maximum allowed payload size (64KB)
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Length header size
pub const HEADER_SIZE: usize = 4;

/// Protocol errors
#[derive(Debug)]
pub enum ProtocolError {
    /// Payload exceeds maximum allowed size
    MessageTooLarge(usize),
    /// JSON serialization/deserialization error
    JsonError(serde_json::Error),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::MessageTooLarge(size) => {
                write!(
                    f,
                    "Message too large: {} bytes (max: {})",
                    size, MAX_MESSAGE_SIZE
                )
            }
            ProtocolError::JsonError(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        ProtocolError::JsonError(err)
    }
}

/// Encode a message as one frame
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    let json = serde_json::to_vec(msg)?;

    if json.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(json.len()));
    }

    let mut buf = Vec::with_capacity(HEADER_SIZE + json.len());
    buf.put_u32(json.len() as u32);
    buf.extend_from_slice(&json);
    Ok(buf)
}

/// Decode one frame from the front of `buf`
///
/// Returns:
/// - `Ok(Some(msg))` - Complete frame decoded, buffer advanced
/// - `Ok(None)` - Need more data (buffer unchanged)
/// - `Err(e)` - Protocol error
///
/// An oversized length header is rejected before its payload arrives.
pub fn decode<T: DeserializeOwned>(buf: &mut BytesMut) -> Result<Option<T>, ProtocolError> {
    if buf.len() < HEADER_SIZE {
        return Ok(None);
    }

    // Peek at the length without consuming
    let length = (&buf[..HEADER_SIZE]).get_u32() as usize;

    if length > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(length));
    }

    if buf.len() < HEADER_SIZE + length {
        return Ok(None);
    }

    buf.advance(HEADER_SIZE);
    let json_bytes = buf.split_to(length);

    let msg = serde_json::from_slice(&json_bytes)?;
    Ok(Some(msg))
}
