//! High-level command surface.

use std::path::Path;

use serde_json::json;
use ufte_protocol::{Command, DirEntry, ResponseMeta};

use crate::error::ClientError;
use crate::session::{Session, SessionConfig};
use crate::transfer;

/// Typed wrappers over the request engine. One instance per serial
/// session; calls are strictly sequential.
pub struct Client {
    session: Session,
}

impl Client {
    /// Opens the port, syncs on the beacon, and returns a ready client.
    pub fn open(config: &SessionConfig) -> Result<Self, ClientError> {
        Ok(Client {
            session: Session::open(config)?,
        })
    }

    /// Wraps an already-open session.
    pub fn from_session(session: Session) -> Self {
        Client { session }
    }

    /// Discards buffered receive state and re-syncs on the beacon. The
    /// recovery path after a timeout or framing error.
    pub fn resync(&mut self) -> Result<(), ClientError> {
        self.session.resync()
    }

    /// Changes the device's working directory.
    pub fn cd(&mut self, path: &str) -> Result<(), ClientError> {
        self.simple(Command::Cd, path)
    }

    /// Lists a device directory.
    pub fn ls(&mut self, path: &str) -> Result<Vec<DirEntry>, ClientError> {
        let (meta, _) = self
            .session
            .request(Command::Ls, json!({ "path": path }), None)?;
        match meta {
            ResponseMeta::Entries(entries) => Ok(entries),
            ResponseMeta::Err(msg) => Err(ClientError::Remote(msg)),
            // An empty directory may come back as a bare acknowledgement.
            _ => Ok(Vec::new()),
        }
    }

    /// Removes a device file.
    pub fn rm(&mut self, path: &str) -> Result<(), ClientError> {
        self.simple(Command::Rm, path)
    }

    /// Reboots the device. It resets shortly after acknowledging, so the
    /// session needs a fresh sync before further requests.
    pub fn reboot(&mut self) -> Result<(), ClientError> {
        let (meta, _) = self.session.request(Command::Reboot, json!({}), None)?;
        match meta {
            ResponseMeta::Err(msg) => Err(ClientError::Remote(msg)),
            _ => Ok(()),
        }
    }

    /// Uploads a local file in `chunk`-byte requests; the final empty
    /// request commits the file on the device.
    pub fn put(
        &mut self,
        local: impl AsRef<Path>,
        remote: &str,
        chunk: usize,
    ) -> Result<u64, ClientError> {
        transfer::put_file(&mut self.session, local.as_ref(), remote, chunk)
    }

    /// Downloads a device file into `local`.
    pub fn get(&mut self, remote: &str, local: impl AsRef<Path>) -> Result<u64, ClientError> {
        transfer::get_file(&mut self.session, remote, local.as_ref())
    }

    /// Dispatches a transfer by direction string: `"up"` uploads `local`
    /// to `remote`, `"down"` downloads `remote` into `local`.
    pub fn transfer(
        &mut self,
        direction: &str,
        local: impl AsRef<Path>,
        remote: &str,
        chunk: usize,
    ) -> Result<u64, ClientError> {
        match direction {
            "up" => self.put(local, remote, chunk),
            "down" => self.get(remote, local),
            other => Err(ClientError::InvalidArgument(format!(
                "unknown transfer direction {:?} (expected \"up\" or \"down\")",
                other
            ))),
        }
    }

    /// Access to the underlying session, e.g. for its test hooks.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Closes the session.
    pub fn close(self) {
        self.session.close();
    }

    fn simple(&mut self, command: Command, path: &str) -> Result<(), ClientError> {
        let (meta, _) = self.session.request(command, json!({ "path": path }), None)?;
        match meta {
            ResponseMeta::Err(msg) => Err(ClientError::Remote(msg)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::mock::MockLink;
    use std::time::Duration;
    use ufte_protocol::{cobs, Packet, FRAME_DELIMITER};

    /// Wire bytes of one device response frame.
    fn response_frame(json: &str, bin: &[u8]) -> Vec<u8> {
        let packet = Packet::build(Command::Resp.code(), json.as_bytes(), bin).unwrap();
        let mut wire = cobs::encode(&packet);
        wire.push(FRAME_DELIMITER);
        wire
    }

    fn client_with(reads: Vec<Option<Vec<u8>>>) -> Client {
        Client::from_session(Session::from_link(
            Box::new(MockLink::new(reads)),
            Duration::from_millis(200),
        ))
    }

    #[test]
    fn cd_maps_ok_to_unit() {
        let mut client = client_with(vec![Some(response_frame(r#"{"ok":true}"#, &[]))]);
        client.cd("/home").unwrap();
    }

    #[test]
    fn cd_maps_failure_to_remote_error() {
        let mut client = client_with(vec![Some(response_frame(
            r#"{"ok":false,"err":"no such directory"}"#,
            &[],
        ))]);
        match client.cd("/missing").unwrap_err() {
            ClientError::Remote(msg) => assert_eq!(msg, "no such directory"),
            other => panic!("expected Remote, got {:?}", other),
        }
    }

    #[test]
    fn ls_returns_entries() {
        let mut client = client_with(vec![Some(response_frame(
            r#"{"ok":true,"entries":[{"n":"a.txt","t":"f","s":12}]}"#,
            &[],
        ))]);
        let entries = client.ls("/").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a.txt");
    }

    #[test]
    fn ls_without_entries_is_empty() {
        let mut client = client_with(vec![Some(response_frame(r#"{"ok":true}"#, &[]))]);
        assert!(client.ls("/empty").unwrap().is_empty());
    }

    #[test]
    fn unknown_transfer_direction_is_invalid_argument() {
        let mut client = client_with(vec![]);
        let err = client
            .transfer("sideways", "/tmp/a", "/b", 1024)
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }
}
