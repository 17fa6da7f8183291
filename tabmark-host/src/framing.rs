//! Native messaging frames: a 4-byte little-endian length, then UTF-8 JSON.

use serde::{de::DeserializeOwned, Serialize};
use bytes::Bytes;
use tokio_util::codec::LengthDelimitedCodec;

/// Largest frame accepted from the browser.
pub const MAX_INBOUND_FRAME: usize = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    #[error("Frame I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

/// Codec for both directions of the native messaging pipe.
pub fn native_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .little_endian()
        .length_field_length(4)
        .max_frame_length(MAX_INBOUND_FRAME)
        .new_codec()
}

pub fn encode_message<T: Serialize>(message: &T) -> Result<Bytes, FramingError> {
    Ok(Bytes::from(serde_json::to_vec(message)?))
}

pub fn decode_message<T: DeserializeOwned>(frame: &[u8]) -> Result<T, FramingError> {
    Ok(serde_json::from_slice(frame)?)
}
