//! # ufte-client
//!
//! Session layer for the UFTE serial file-transfer link.
//!
//! This crate provides:
//! - A serial endpoint seam ([`SerialLink`]) and its `serialport`-backed
//!   implementation
//! - The frame transport: delimiter framing, receive accumulator, and the
//!   post-write transmission pause
//! - Passive beacon sync
//! - A synchronous one-request-at-a-time engine ([`Session`])
//! - Chunked streaming PUT/GET and the typed command surface ([`Client`])
//!
//! A session is single-threaded by design: one owner, one outstanding
//! request, no background reader. Sharing one across threads requires an
//! external mutex.

pub mod client;
pub mod error;
pub mod link;
pub mod session;
mod sync;
mod transfer;
pub mod transport;

pub use client::Client;
pub use error::ClientError;
pub use link::{SerialLink, SerialPortLink};
pub use session::{Session, SessionConfig};
pub use transport::FrameTransport;
