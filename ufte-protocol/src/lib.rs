//! # ufte-protocol
//!
//! Wire protocol for the UFTE serial file-transfer link.
//!
//! This crate provides:
//! - COBS byte-stuffing so packets can share the wire with a reserved
//!   delimiter byte
//! - CRC-32 protected packet build/parse
//! - Command codes, directory entries, and typed response metadata
//!
//! Everything here is pure: no I/O, no timing. The packet layout is
//!
//! ```text
//! +------+----------+-----------------+----------+--------+
//! | code | json_len | json            | binary   | crc32  |
//! | 1 B  | 2 B (BE) | json_len bytes  | 0+ bytes | 4 B BE |
//! +------+----------+-----------------+----------+--------+
//! ```
//!
//! and each packet travels as a COBS-stuffed frame followed by a single
//! 0x00 delimiter.

pub mod cobs;
pub mod error;
pub mod message;
pub mod packet;

pub use error::ProtocolError;
pub use message::{Command, DirEntry, EntryKind, ResponseMeta};
pub use packet::{Packet, MAX_JSON_LEN};

/// Delimiter byte appended after every stuffed frame on the wire.
pub const FRAME_DELIMITER: u8 = 0x00;

/// ASCII beacon the device emits while idle; watching for it proves the
/// link is up without consuming a request slot.
pub const BEACON: &[u8] = b"UFTE";

/// Default transfer chunk size. The device reserves a fixed RAM budget per
/// frame; larger chunks are legal on the wire but may be rejected.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Default baud rate for the serial link.
pub const DEFAULT_BAUD: u32 = 115_200;
