//! Session configuration and the request engine.
//!
//! One session owns one serial endpoint. Requests are strictly
//! one-at-a-time: write a command frame, read the next response frame.
//! There is no request ID correlation on the wire; a response is taken to
//! answer the most recent request, which is why the engine never pipelines
//! and never retries.

use std::time::Duration;

use serde_json::Value;
use ufte_protocol::{cobs, Command, Packet, ProtocolError, ResponseMeta, DEFAULT_BAUD};

use crate::error::ClientError;
use crate::link::{SerialLink, SerialPortLink};
use crate::sync;
use crate::transport::FrameTransport;

/// Serial session settings. All values have defaults except the port path.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Serial device path, e.g. `/dev/ttyUSB0`.
    pub port: String,
    /// Baud rate.
    pub baud: u32,
    /// Hardware RTS/CTS flow control.
    pub rtscts: bool,
    /// Per-request timeout (also bounds each sync attempt).
    pub timeout: Duration,
}

impl SessionConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud: DEFAULT_BAUD,
            rtscts: true,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_baud(mut self, baud: u32) -> Self {
        self.baud = baud;
        self
    }

    pub fn with_rtscts(mut self, rtscts: bool) -> Self {
        self.rtscts = rtscts;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A connected session: endpoint, receive accumulator, timeout.
///
/// Not safe for concurrent use; one caller owns the session and serializes
/// its requests. After an error the session may hold stray response bytes —
/// [`resync`](Session::resync) discards them and watches for the beacon
/// again, or the session can be dropped and reopened.
pub struct Session {
    transport: FrameTransport,
    timeout: Duration,
}

impl Session {
    /// Opens the serial port and waits for the device beacon.
    pub fn open(config: &SessionConfig) -> Result<Self, ClientError> {
        let link = SerialPortLink::open(&config.port, config.baud, config.rtscts)?;
        let mut session = Session::from_link(Box::new(link), config.timeout);
        session.resync()?;
        Ok(session)
    }

    /// Wraps an already-open endpoint without syncing. Callers that manage
    /// their own link (or tests with a scripted one) sync explicitly.
    pub fn from_link(link: Box<dyn SerialLink>, timeout: Duration) -> Self {
        Session {
            transport: FrameTransport::new(link),
            timeout,
        }
    }

    /// Discards buffered receive state and watches for the beacon.
    pub fn resync(&mut self) -> Result<(), ClientError> {
        sync::await_beacon(&mut self.transport, self.timeout)
    }

    /// Issues one request and reads its response.
    ///
    /// Returns the decoded metadata (which may be a device-reported
    /// failure) and, when the metadata names a positive binary count, that
    /// many bytes from the tail of the response packet.
    pub fn request(
        &mut self,
        command: Command,
        params: Value,
        bin: Option<&[u8]>,
    ) -> Result<(ResponseMeta, Option<Vec<u8>>), ClientError> {
        let json = serde_json::to_vec(&params)?;
        let packet = Packet::build(command.code(), &json, bin.unwrap_or(&[]))?;
        let stuffed = cobs::encode(&packet);

        tracing::debug!(
            code = command.code(),
            json_len = json.len(),
            bin_len = bin.map_or(0, <[u8]>::len),
            "request"
        );

        self.transport.write_frame(&stuffed)?;

        let frame = self.transport.read_frame(self.timeout).map_err(|e| match e {
            ClientError::ReadTimeout => ClientError::Timeout,
            other => other,
        })?;

        let body = cobs::decode(&frame)?;
        let response = Packet::parse(&body)?;
        let meta = ResponseMeta::from_json(&response.json);

        let bin_out = match meta.bin_len() {
            0 => None,
            n if n <= response.binary.len() => {
                let start = response.binary.len() - n;
                Some(response.binary[start..].to_vec())
            }
            n => {
                // Metadata names more trailing bytes than the packet holds.
                return Err(ClientError::Protocol(ProtocolError::ShortFrame {
                    len: n,
                }));
            }
        };

        tracing::debug!(
            ok = meta.is_ok(),
            bin_len = bin_out.as_ref().map_or(0, Vec::len),
            "response"
        );

        Ok((meta, bin_out))
    }

    /// Closes the session, releasing the endpoint and discarding the
    /// accumulator.
    pub fn close(self) {
        drop(self);
    }

    /// Test hook: writes raw bytes to the endpoint, bypassing framing.
    pub fn raw_write(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        self.transport.raw_write(bytes)
    }

    /// Test hook and recovery aid: discards buffered receive state.
    pub fn reset_accumulator(&mut self) {
        self.transport.reset_accumulator();
    }
}
