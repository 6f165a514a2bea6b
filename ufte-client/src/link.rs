//! Serial endpoint seam.
//!
//! The transport talks to the wire through the [`SerialLink`] trait so the
//! framing, sync, and transfer layers can be exercised against scripted
//! endpoints in tests.

use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, StopBits};

use crate::error::ClientError;

/// Byte-stream operations the transport needs from a serial endpoint.
pub trait SerialLink: Send {
    /// Writes the whole buffer.
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()>;

    /// Flushes buffered output toward the device.
    fn flush(&mut self) -> std::io::Result<()>;

    /// Reads available bytes, blocking up to `timeout`. A timeout may
    /// surface as `Ok(0)` or as an error of kind `TimedOut`.
    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> std::io::Result<usize>;

    /// Configured baud rate, used to compute transmission-time pauses.
    fn baud(&self) -> u32;

    /// Whether the endpoint is a pseudo-terminal. PTYs have no modem
    /// timing, so the transport polls them in short slices instead of
    /// arming one long native timeout.
    fn is_pty(&self) -> bool;
}

/// Real serial port behind the `serialport` crate.
///
/// Opened raw: 8 data bits, 1 stop bit, no parity, no echo or line-ending
/// translation, hardware RTS/CTS when requested. Every byte value passes
/// through unchanged.
pub struct SerialPortLink {
    port: Box<dyn serialport::SerialPort>,
    baud: u32,
    pty: bool,
}

impl SerialPortLink {
    pub fn open(path: &str, baud: u32, rtscts: bool) -> Result<Self, ClientError> {
        let flow = if rtscts {
            FlowControl::Hardware
        } else {
            FlowControl::None
        };

        let port = serialport::new(path, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(flow)
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(|e| ClientError::OpenFailed(format!("{}: {}", path, e)))?;

        tracing::debug!(path, baud, rtscts, "serial port opened");

        Ok(SerialPortLink {
            port,
            baud,
            pty: is_pty_path(path),
        })
    }
}

impl SerialLink for SerialPortLink {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.port.write_all(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.port.flush()
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> std::io::Result<usize> {
        // serialport rejects a zero timeout on some platforms.
        let timeout = timeout.max(Duration::from_millis(1));
        self.port
            .set_timeout(timeout)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        self.port.read(buf)
    }

    fn baud(&self) -> u32 {
        self.baud
    }

    fn is_pty(&self) -> bool {
        self.pty
    }
}

/// Pseudo-terminal device paths on the platforms this runs on.
fn is_pty_path(path: &str) -> bool {
    path.starts_with("/dev/pts/") || path.ends_with("/ptmx")
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted endpoint for unit tests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// A scripted link: reads pop chunks off a queue (`None` = one timed-out
    /// read), writes accumulate in a shared log for inspection.
    pub(crate) struct MockLink {
        reads: VecDeque<Option<Vec<u8>>>,
        written: Arc<Mutex<Vec<u8>>>,
        pty: bool,
    }

    impl MockLink {
        pub(crate) fn new(reads: Vec<Option<Vec<u8>>>) -> Self {
            MockLink {
                reads: reads.into(),
                written: Arc::new(Mutex::new(Vec::new())),
                pty: false,
            }
        }

        pub(crate) fn new_pty(reads: Vec<Option<Vec<u8>>>) -> Self {
            MockLink {
                pty: true,
                ..Self::new(reads)
            }
        }

        /// Handle onto the write log, usable after the link is boxed.
        pub(crate) fn written_handle(&self) -> Arc<Mutex<Vec<u8>>> {
            Arc::clone(&self.written)
        }
    }

    impl SerialLink for MockLink {
        fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
            self.written.lock().unwrap().extend_from_slice(buf);
            Ok(())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }

        fn read_timeout(&mut self, buf: &mut [u8], _timeout: Duration) -> std::io::Result<usize> {
            match self.reads.pop_front().flatten() {
                Some(chunk) => {
                    assert!(chunk.len() <= buf.len(), "scripted chunk larger than read buffer");
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "scripted timeout",
                )),
            }
        }

        fn baud(&self) -> u32 {
            // High enough that post-write pauses stay in the microseconds.
            8_000_000
        }

        fn is_pty(&self) -> bool {
            self.pty
        }
    }

    #[test]
    fn is_pty_path_recognizes_pts() {
        assert!(is_pty_path("/dev/pts/3"));
        assert!(is_pty_path("/dev/ptmx"));
        assert!(!is_pty_path("/dev/ttyUSB0"));
        assert!(!is_pty_path("/dev/ttyACM1"));
    }
}
