//! Streaming file transfer.
//!
//! Both directions move one bounded chunk per request, so resident memory
//! stays at one chunk buffer regardless of file size. Neither direction is
//! transactional: a mid-transfer failure leaves a partial file on the
//! receiving side, and nothing is cleaned up or retried here.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde_json::json;
use ufte_protocol::{Command, ResponseMeta};

use crate::error::ClientError;
use crate::session::Session;

fn local_io(path: &Path, source: std::io::Error) -> ClientError {
    ClientError::LocalIo {
        path: path.display().to_string(),
        source,
    }
}

/// Uploads a local file to `remote`, `chunk` bytes per request.
///
/// The final request carries zero bytes of binary; the device takes that
/// as end-of-file and commits. Returns the byte count sent.
pub(crate) fn put_file(
    session: &mut Session,
    local: &Path,
    remote: &str,
    chunk: usize,
) -> Result<u64, ClientError> {
    let mut file = File::open(local).map_err(|e| local_io(local, e))?;
    let mut buf = vec![0u8; chunk.max(1)];
    let mut off: u64 = 0;

    loop {
        let n = file.read(&mut buf).map_err(|e| local_io(local, e))?;

        let (meta, _) = session.request(
            Command::Put,
            json!({ "path": remote, "off": off }),
            Some(&buf[..n]),
        )?;
        if let ResponseMeta::Err(msg) = meta {
            return Err(ClientError::Remote(msg));
        }

        if n == 0 {
            tracing::debug!(remote, bytes = off, "upload complete");
            return Ok(off);
        }
        off += n as u64;
    }
}

/// Downloads `remote` into a local file. Chunk sizing is the device's
/// choice; each response's trailing binary is appended until `eof`.
///
/// Returns the byte count received. On failure the partially written
/// local file is left in place.
pub(crate) fn get_file(
    session: &mut Session,
    remote: &str,
    local: &Path,
) -> Result<u64, ClientError> {
    let mut file = File::create(local).map_err(|e| local_io(local, e))?;
    let mut off: u64 = 0;

    loop {
        let (meta, bin) =
            session.request(Command::Get, json!({ "path": remote, "off": off }), None)?;

        match meta {
            ResponseMeta::Err(msg) => return Err(ClientError::Remote(msg)),
            ResponseMeta::Chunk { eof, .. } => {
                if let Some(data) = bin {
                    file.write_all(&data).map_err(|e| local_io(local, e))?;
                    off += data.len() as u64;
                }
                if eof {
                    file.flush().map_err(|e| local_io(local, e))?;
                    tracing::debug!(remote, bytes = off, "download complete");
                    return Ok(off);
                }
            }
            // Success without chunk metadata carries nothing to write.
            ResponseMeta::Ok | ResponseMeta::Entries(_) => {}
        }
    }
}
