//! Packet build and parse.
//!
//! A packet is the decoded, pre-stuffing byte sequence. The CRC-32 (IEEE
//! 802.3 polynomial) in the trailer covers every byte from the code through
//! the last binary byte. The JSON region's length is explicit; the binary
//! region's length is whatever remains between the JSON and the trailer.

use crate::error::ProtocolError;
use bytes::{BufMut, BytesMut};

/// Largest JSON region the 16-bit length field can describe.
pub const MAX_JSON_LEN: usize = 0xFFFF;

/// Smallest parseable packet: code + length field + CRC trailer, with an
/// empty JSON region and no binary.
const MIN_PACKET_LEN: usize = 1 + 2 + 4;

/// A parsed packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Command or response code byte.
    pub code: u8,
    /// JSON region (UTF-8 bytes, not yet parsed).
    pub json: Vec<u8>,
    /// Trailing binary region, possibly empty.
    pub binary: Vec<u8>,
}

impl Packet {
    /// Builds the packet bytes for `code`, a JSON region, and an optional
    /// binary region.
    pub fn build(code: u8, json: &[u8], binary: &[u8]) -> Result<BytesMut, ProtocolError> {
        if json.len() > MAX_JSON_LEN {
            return Err(ProtocolError::OversizedJson(json.len()));
        }

        let mut buf = BytesMut::with_capacity(MIN_PACKET_LEN + json.len() + binary.len());
        buf.put_u8(code);
        buf.put_u16(json.len() as u16);
        buf.put_slice(json);
        buf.put_slice(binary);

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&buf);
        buf.put_u32(hasher.finalize());

        Ok(buf)
    }

    /// Parses a decoded packet body, verifying the CRC trailer and
    /// splitting the code, JSON, and binary regions.
    pub fn parse(data: &[u8]) -> Result<Packet, ProtocolError> {
        // The trailer alone needs 4 bytes and the body at least 1.
        if data.len() < 5 {
            return Err(ProtocolError::ShortFrame { len: data.len() });
        }

        let (body, trailer) = data.split_at(data.len() - 4);
        let expected = u32::from_be_bytes(trailer.try_into().unwrap());

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(body);
        let actual = hasher.finalize();
        if actual != expected {
            return Err(ProtocolError::CrcMismatch { expected, actual });
        }

        if body.len() < 3 {
            return Err(ProtocolError::ShortFrame { len: data.len() });
        }
        let code = body[0];
        let json_len = u16::from_be_bytes([body[1], body[2]]) as usize;
        if 3 + json_len > body.len() {
            return Err(ProtocolError::ShortFrame { len: data.len() });
        }

        Ok(Packet {
            code,
            json: body[3..3 + json_len].to_vec(),
            binary: body[3 + json_len..].to_vec(),
        })
    }
}
