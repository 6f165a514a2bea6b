//! Beacon detection.
//!
//! The device emits a periodic ASCII beacon (`UFTE_READY`) during its
//! boot/idle window. Watching for the `UFTE` token proves the host-side
//! TTY is configured correctly and the device is listening, without
//! consuming a request slot. The detector never transmits.

use std::time::{Duration, Instant};

use ufte_protocol::BEACON;

use crate::error::ClientError;
use crate::transport::FrameTransport;

/// Attempts before giving up.
const ATTEMPTS: u32 = 3;

/// Pause between attempts.
const RETRY_PAUSE: Duration = Duration::from_millis(500);

/// Sliding window the beacon is matched against.
const WINDOW: usize = 50;

/// Read slice while watching.
const WATCH_SLICE: Duration = Duration::from_millis(50);

/// Blocks until the beacon is observed, up to `timeout` per attempt with
/// [`ATTEMPTS`] attempts. Pending receive bytes and the accumulator are
/// discarded first so a stale beacon cannot satisfy the watch.
pub(crate) fn await_beacon(
    transport: &mut FrameTransport,
    timeout: Duration,
) -> Result<(), ClientError> {
    for attempt in 1..=ATTEMPTS {
        transport.reset_accumulator();
        drain(transport)?;

        if watch(transport, timeout)? {
            tracing::debug!(attempt, "beacon detected");
            return Ok(());
        }
        tracing::debug!(attempt, "no beacon within timeout");

        if attempt < ATTEMPTS {
            std::thread::sleep(RETRY_PAUSE);
        }
    }

    Err(ClientError::SyncFailed { attempts: ATTEMPTS })
}

/// Discards whatever the endpoint has buffered right now.
fn drain(transport: &mut FrameTransport) -> Result<(), ClientError> {
    let mut buf = [0u8; 256];
    loop {
        let n = transport.read_raw(&mut buf, Duration::from_millis(5))?;
        if n == 0 {
            return Ok(());
        }
    }
}

/// One bounded watch for the beacon token in a sliding window.
fn watch(transport: &mut FrameTransport, timeout: Duration) -> Result<bool, ClientError> {
    let deadline = Instant::now() + timeout;
    let mut window: Vec<u8> = Vec::with_capacity(WINDOW);
    let mut buf = [0u8; 256];

    while Instant::now() < deadline {
        let n = transport.read_raw(&mut buf, WATCH_SLICE)?;
        for &byte in &buf[..n] {
            if window.len() == WINDOW {
                window.remove(0);
            }
            window.push(byte);
            if window.ends_with(BEACON) {
                return Ok(true);
            }
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::mock::MockLink;

    #[test]
    fn beacon_found_amid_garbage() {
        let link = MockLink::new(vec![
            None, // drain sees nothing buffered
            Some(b"\xFF\x00garbage\x7F".to_vec()),
            Some(b"UFTE_READY\r\n".to_vec()),
        ]);
        let mut transport = FrameTransport::new(Box::new(link));

        await_beacon(&mut transport, Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn beacon_split_across_reads() {
        let link = MockLink::new(vec![
            None,
            Some(b"noise UF".to_vec()),
            Some(b"TE_READY".to_vec()),
        ]);
        let mut transport = FrameTransport::new(Box::new(link));

        await_beacon(&mut transport, Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn stale_bytes_are_drained_first() {
        // The first read happens during the drain, so its beacon must not
        // satisfy the watch; the later live beacon does.
        let link = MockLink::new(vec![
            Some(b"UFTE_READY\r\n".to_vec()),
            None,
            Some(b"UFTE_READY\r\n".to_vec()),
        ]);
        let mut transport = FrameTransport::new(Box::new(link));

        await_beacon(&mut transport, Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn silence_exhausts_attempts() {
        let link = MockLink::new(vec![]);
        let mut transport = FrameTransport::new(Box::new(link));

        let err = await_beacon(&mut transport, Duration::from_millis(20)).unwrap_err();
        assert!(matches!(err, ClientError::SyncFailed { attempts: 3 }));
    }
}
