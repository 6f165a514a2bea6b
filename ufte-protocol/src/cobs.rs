//! COBS byte-stuffing.
//!
//! Consistent Overhead Byte Stuffing rewrites a payload into a form that
//! contains no 0x00 byte, so the transport can use 0x00 as an unambiguous
//! frame delimiter. The output is a sequence of blocks: a code byte
//! `c ∈ [0x01, 0xFF]` followed by `c - 1` literal bytes. `c` is the
//! distance to the next zero in the original payload, capped at 0xFF for
//! runs of 254+ non-zero bytes, in which case the block continues without
//! an implicit zero.

use crate::error::ProtocolError;

/// Longest literal run a single block can carry.
const MAX_RUN: usize = 254;

/// Stuffs `data` into a zero-free representation.
///
/// The empty payload encodes to a single `0x01` byte.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / MAX_RUN + 2);
    let mut rest = data;

    loop {
        match rest.iter().take(MAX_RUN).position(|&b| b == 0) {
            // A zero within reach: the code byte is its distance plus one.
            Some(n) => {
                out.push(n as u8 + 1);
                out.extend_from_slice(&rest[..n]);
                rest = &rest[n + 1..];
                if rest.is_empty() {
                    // Payload ended on the zero just consumed.
                    out.push(0x01);
                    return out;
                }
            }
            // A full-length run: 0xFF marks a block with no implicit zero.
            None if rest.len() >= MAX_RUN => {
                out.push(0xFF);
                out.extend_from_slice(&rest[..MAX_RUN]);
                rest = &rest[MAX_RUN..];
                if rest.is_empty() {
                    return out;
                }
            }
            // Final short run.
            None => {
                out.push(rest.len() as u8 + 1);
                out.extend_from_slice(rest);
                return out;
            }
        }
    }
}

/// Unstuffs `data` back into the original payload.
///
/// The input must be a complete stuffed region with the frame delimiter
/// already stripped; any embedded 0x00, or a code byte claiming more
/// literal bytes than remain, is malformed.
pub fn decode(data: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::MalformedFrame("empty stuffed region"));
    }

    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let code = data[i];
        if code == 0 {
            return Err(ProtocolError::MalformedFrame("zero code byte"));
        }
        i += 1;

        let run = code as usize - 1;
        if i + run > data.len() {
            return Err(ProtocolError::MalformedFrame("block overruns input"));
        }

        let literals = &data[i..i + run];
        if literals.contains(&0) {
            return Err(ProtocolError::MalformedFrame("zero inside literal run"));
        }
        out.extend_from_slice(literals);
        i += run;

        // A non-maximal block implies a zero in the original payload,
        // except at the very end of the input.
        if code < 0xFF && i < data.len() {
            out.push(0);
        }
    }

    Ok(out)
}
