//! Frame Codec
//!
//! Each `WireMessage` travels as one frame:
//!
//! ```text
//! +----------------------+-------------------------------+
//! | length: u32 (LE)     | payload: bincode(WireMessage) |
//! +----------------------+-------------------------------+
//! ```
//!
//! The length counts payload bytes only. A peer closing the stream exactly on a frame
//! boundary reads as `ProtocolError::Closed`; closing mid-frame is an I/O error.

use super::types::WireMessage;
use crate::error::ProtocolError;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on a single payload. Large enough for a full rating matrix.
pub const MAX_FRAME_BYTES: usize = 256 * 1024 * 1024;

const HEADER_BYTES: usize = 4;

/// Encodes a message into a complete frame (header + payload).
///
/// Useful when the same message goes to several peers: encode once, write many times.
pub fn encode_frame(message: &WireMessage) -> Result<Vec<u8>, ProtocolError> {
    let payload = bincode::serialize(message).map_err(ProtocolError::Encode)?;
    if payload.len() > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge {
            size: payload.len(),
            limit: MAX_FRAME_BYTES,
        });
    }

    let mut frame = Vec::with_capacity(HEADER_BYTES + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

pub fn decode_payload(payload: &[u8]) -> Result<WireMessage, ProtocolError> {
    bincode::deserialize(payload).map_err(ProtocolError::Decode)
}

/// Writes an already encoded frame and flushes.
pub async fn write_frame<W>(stream: &mut W, frame: &[u8]) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    stream.write_all(frame).await?;
    stream.flush().await?;
    Ok(())
}

pub async fn write_message<W>(stream: &mut W, message: &WireMessage) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(message)?;
    tracing::trace!("Writing {} frame ({} bytes)", message.kind(), frame.len());
    write_frame(stream, &frame).await
}

pub async fn read_message<R>(stream: &mut R) -> Result<WireMessage, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_BYTES];

    // A zero-byte read before any header byte is a clean close.
    let first = stream.read(&mut header).await?;
    if first == 0 {
        return Err(ProtocolError::Closed);
    }
    stream.read_exact(&mut header[first..]).await?;

    let len = u32::from_le_bytes(header) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge {
            size: len,
            limit: MAX_FRAME_BYTES,
        });
    }

    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await?;

    decode_payload(&payload)
}
