//! Protocol error types.

use thiserror::Error;

/// Errors raised by the wire codecs.
///
/// These are framing-level failures; a device-reported error travels as a
/// well-formed packet and is surfaced through
/// [`ResponseMeta::Err`](crate::message::ResponseMeta) instead.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Byte-stuffing decode failed. The message names the failing stage
    /// but never includes frame content.
    #[error("malformed frame: {0}")]
    MalformedFrame(&'static str),

    /// Decoded packet body is too short to carry the mandatory regions.
    #[error("short frame: {len} bytes")]
    ShortFrame { len: usize },

    /// Computed CRC disagrees with the packet trailer.
    #[error("CRC mismatch: expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch { expected: u32, actual: u32 },

    /// JSON region longer than the 16-bit length field can describe.
    #[error("JSON region too large: {0} bytes")]
    OversizedJson(usize),
}
