//! Frame transport.
//!
//! Owns the serial link and the receive accumulator. Outbound frames get
//! the 0x00 delimiter appended; inbound bytes are split at delimiters into
//! complete frames, with any partial tail retained for the next read. The
//! retained tail never contains a delimiter.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use bytes::{Buf, BytesMut};
use ufte_protocol::FRAME_DELIMITER;

use crate::error::ClientError;
use crate::link::SerialLink;

/// Size of a single read from the endpoint.
const READ_CHUNK: usize = 4096;

/// Poll slice for pseudo-terminal reads.
const PTY_POLL_SLICE: Duration = Duration::from_millis(20);

pub struct FrameTransport {
    link: Box<dyn SerialLink>,
    /// Complete frames already split out, oldest first.
    ready: VecDeque<Vec<u8>>,
    /// Partial frame bytes; never contains a delimiter.
    tail: BytesMut,
}

impl FrameTransport {
    pub fn new(link: Box<dyn SerialLink>) -> Self {
        FrameTransport {
            link,
            ready: VecDeque::new(),
            tail: BytesMut::with_capacity(READ_CHUNK),
        }
    }

    /// Writes one stuffed frame: appends the delimiter, writes, flushes,
    /// then blocks for twice the nominal transmission time. USB-serial
    /// adapters acknowledge the write before the bytes leave the host; the
    /// overestimate absorbs interbyte gap and driver buffering.
    pub fn write_frame(&mut self, stuffed: &[u8]) -> Result<(), ClientError> {
        debug_assert!(!stuffed.contains(&FRAME_DELIMITER));

        let mut wire = Vec::with_capacity(stuffed.len() + 1);
        wire.extend_from_slice(stuffed);
        wire.push(FRAME_DELIMITER);

        self.link.write_all(&wire).map_err(ClientError::WriteFailed)?;
        self.link.flush().map_err(ClientError::WriteFailed)?;

        let secs = 2.0 * (wire.len() as f64 * 10.0) / f64::from(self.link.baud());
        std::thread::sleep(Duration::from_secs_f64(secs));

        tracing::debug!(bytes = wire.len(), "frame written");
        Ok(())
    }

    /// Reads until one complete frame is available, bounded by `timeout`
    /// (an absolute deadline computed at entry). Returns the frame bytes
    /// with the delimiter stripped; anything past the delimiter stays
    /// buffered for the next call.
    pub fn read_frame(&mut self, timeout: Duration) -> Result<Vec<u8>, ClientError> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(frame) = self.ready.pop_front() {
                tracing::debug!(bytes = frame.len(), "frame received");
                return Ok(frame);
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::debug!("read deadline reached with no delimiter");
                return Err(ClientError::ReadTimeout);
            }

            let remaining = deadline - now;
            let wait = if self.link.is_pty() {
                remaining.min(PTY_POLL_SLICE)
            } else {
                remaining
            };

            let mut buf = [0u8; READ_CHUNK];
            match self.link.read_timeout(&mut buf, wait) {
                Ok(0) => {}
                Ok(n) => self.absorb(&buf[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                Err(e) => return Err(ClientError::ReadFailed(e)),
            }
        }
    }

    /// One bounded read of raw bytes, bypassing frame splitting. Used by
    /// the beacon watcher, which runs before any framed traffic.
    pub(crate) fn read_raw(&mut self, buf: &mut [u8], wait: Duration) -> Result<usize, ClientError> {
        match self.link.read_timeout(buf, wait) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(ClientError::ReadFailed(e)),
        }
    }

    /// Test hook: writes bytes to the endpoint with no delimiter and no
    /// transmission pause.
    pub fn raw_write(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        self.link.write_all(bytes).map_err(ClientError::WriteFailed)?;
        self.link.flush().map_err(ClientError::WriteFailed)
    }

    /// Test hook and recovery aid: discards all buffered receive state.
    pub fn reset_accumulator(&mut self) {
        self.ready.clear();
        self.tail.clear();
    }

    /// Splits complete frames out of newly arrived bytes, keeping the
    /// delimiter-free tail.
    fn absorb(&mut self, data: &[u8]) {
        self.tail.extend_from_slice(data);
        while let Some(pos) = self.tail.iter().position(|&b| b == FRAME_DELIMITER) {
            let frame = self.tail.split_to(pos).to_vec();
            self.tail.advance(1);
            self.ready.push_back(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::mock::MockLink;

    #[test]
    fn frame_split_across_reads() {
        let link = MockLink::new(vec![
            Some(vec![0x11, 0x22]),
            Some(vec![0x33]),
            Some(vec![0x44, 0x00]),
        ]);
        let mut transport = FrameTransport::new(Box::new(link));

        let frame = transport.read_frame(Duration::from_secs(1)).unwrap();
        assert_eq!(frame, vec![0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn bytes_after_delimiter_are_retained() {
        // Two frames plus a partial third arrive in one read.
        let link = MockLink::new(vec![
            Some(vec![0xAA, 0x00, 0xBB, 0xCC, 0x00, 0xDD]),
            Some(vec![0xEE, 0x00]),
        ]);
        let mut transport = FrameTransport::new(Box::new(link));

        assert_eq!(transport.read_frame(Duration::from_secs(1)).unwrap(), vec![0xAA]);
        assert_eq!(
            transport.read_frame(Duration::from_secs(1)).unwrap(),
            vec![0xBB, 0xCC]
        );
        // Tail holds 0xDD with no delimiter until more bytes arrive.
        assert!(!transport.tail.contains(&FRAME_DELIMITER));
        assert_eq!(
            transport.read_frame(Duration::from_secs(1)).unwrap(),
            vec![0xDD, 0xEE]
        );
    }

    #[test]
    fn empty_frame_from_back_to_back_delimiters() {
        let link = MockLink::new(vec![Some(vec![0x00, 0x00])]);
        let mut transport = FrameTransport::new(Box::new(link));

        assert_eq!(transport.read_frame(Duration::from_secs(1)).unwrap(), Vec::<u8>::new());
        assert_eq!(transport.read_frame(Duration::from_secs(1)).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn read_times_out_without_delimiter() {
        let link = MockLink::new(vec![Some(vec![0x11, 0x22])]);
        let mut transport = FrameTransport::new(Box::new(link));

        let err = transport.read_frame(Duration::from_millis(30)).unwrap_err();
        assert!(matches!(err, ClientError::ReadTimeout));
        // The partial bytes stay buffered for a later attempt.
        assert_eq!(&transport.tail[..], &[0x11, 0x22]);
    }

    #[test]
    fn pty_reads_poll_in_slices() {
        let link = MockLink::new_pty(vec![None, None, Some(vec![0x55, 0x00])]);
        let mut transport = FrameTransport::new(Box::new(link));

        let frame = transport.read_frame(Duration::from_secs(1)).unwrap();
        assert_eq!(frame, vec![0x55]);
    }

    #[test]
    fn write_appends_delimiter_per_frame() {
        let link = MockLink::new(vec![]);
        let written = link.written_handle();
        let mut transport = FrameTransport::new(Box::new(link));

        transport.write_frame(&[0x01, 0x02, 0x03]).unwrap();
        transport.write_frame(&[0x04]).unwrap();

        assert_eq!(
            written.lock().unwrap().as_slice(),
            &[0x01, 0x02, 0x03, 0x00, 0x04, 0x00]
        );
    }

    #[test]
    fn raw_write_skips_delimiter() {
        let link = MockLink::new(vec![]);
        let written = link.written_handle();
        let mut transport = FrameTransport::new(Box::new(link));

        transport.raw_write(&[0xDE, 0xAD]).unwrap();
        assert_eq!(written.lock().unwrap().as_slice(), &[0xDE, 0xAD]);
    }

    #[test]
    fn reset_discards_buffered_frames_and_tail() {
        let link = MockLink::new(vec![Some(vec![0xAA, 0x00, 0xBB])]);
        let mut transport = FrameTransport::new(Box::new(link));

        // Pull bytes in without consuming the ready frame.
        transport.absorb(&[0x01, 0x00, 0x02]);
        assert!(!transport.ready.is_empty());

        transport.reset_accumulator();
        assert!(transport.ready.is_empty());
        assert!(transport.tail.is_empty());
    }
}
