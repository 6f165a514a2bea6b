//! Command codes, directory entries, and response metadata.

use serde::{Deserialize, Serialize};

/// Command code bytes.
///
/// `Sync` is defined for wire completeness but the client never transmits
/// it; synchronization is passive beacon watching. Response packets carry
/// `Resp`, though the code byte on responses is not validated strictly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    Resp = 0x00,
    Sync = 0x01,
    Cd = 0x11,
    Ls = 0x12,
    Rm = 0x13,
    Get = 0x21,
    Put = 0x22,
    Reboot = 0x31,
}

impl Command {
    /// The on-wire code byte.
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Whether a directory entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    #[serde(rename = "f")]
    File,
    #[serde(rename = "d")]
    Dir,
}

/// One entry of an LS listing.
///
/// The device keeps keys short to fit its frame budget: `n` name,
/// `t` type, `s` size. Directory sizes are present but unspecified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "t")]
    pub kind: EntryKind,
    #[serde(rename = "s")]
    pub size: u64,
}

/// Raw response JSON as it appears on the wire. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct ResponseWire {
    ok: bool,
    #[serde(default)]
    err: Option<String>,
    #[serde(default)]
    entries: Option<Vec<DirEntry>>,
    #[serde(default)]
    eof: Option<bool>,
    #[serde(default)]
    bin: Option<u64>,
}

/// Decoded response metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseMeta {
    /// Plain acknowledgement.
    Ok,
    /// LS success with its listing.
    Entries(Vec<DirEntry>),
    /// GET success: `bin` bytes trail the JSON region, `eof` marks the
    /// final chunk.
    Chunk { eof: bool, bin: usize },
    /// Device-reported failure, message verbatim.
    Err(String),
}

impl ResponseMeta {
    /// Decodes the JSON region of a response packet.
    ///
    /// Malformed JSON is a clean protocol-level failure, not a framing
    /// failure: it folds to `Err("bad_json")` rather than raising.
    pub fn from_json(json: &[u8]) -> Self {
        let wire: ResponseWire = match serde_json::from_slice(json) {
            Ok(wire) => wire,
            Err(_) => return ResponseMeta::Err("bad_json".to_string()),
        };

        if !wire.ok {
            return ResponseMeta::Err(wire.err.unwrap_or_else(|| "unspecified error".to_string()));
        }
        if let Some(entries) = wire.entries {
            return ResponseMeta::Entries(entries);
        }
        if wire.eof.is_some() || wire.bin.is_some() {
            return ResponseMeta::Chunk {
                eof: wire.eof.unwrap_or(false),
                bin: wire.bin.unwrap_or(0) as usize,
            };
        }
        ResponseMeta::Ok
    }

    /// Whether the device reported success.
    pub fn is_ok(&self) -> bool {
        !matches!(self, ResponseMeta::Err(_))
    }

    /// Count of binary bytes the response says trail its JSON region.
    pub fn bin_len(&self) -> usize {
        match self {
            ResponseMeta::Chunk { bin, .. } => *bin,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_codes_match_the_wire() {
        assert_eq!(Command::Resp.code(), 0x00);
        assert_eq!(Command::Sync.code(), 0x01);
        assert_eq!(Command::Cd.code(), 0x11);
        assert_eq!(Command::Ls.code(), 0x12);
        assert_eq!(Command::Rm.code(), 0x13);
        assert_eq!(Command::Get.code(), 0x21);
        assert_eq!(Command::Put.code(), 0x22);
        assert_eq!(Command::Reboot.code(), 0x31);
    }

    #[test]
    fn plain_ok() {
        assert_eq!(ResponseMeta::from_json(br#"{"ok":true}"#), ResponseMeta::Ok);
    }

    #[test]
    fn failure_keeps_the_device_message() {
        let meta = ResponseMeta::from_json(br#"{"ok":false,"err":"no such file"}"#);
        assert_eq!(meta, ResponseMeta::Err("no such file".to_string()));
        assert!(!meta.is_ok());
    }

    #[test]
    fn failure_without_message() {
        let meta = ResponseMeta::from_json(br#"{"ok":false}"#);
        assert_eq!(meta, ResponseMeta::Err("unspecified error".to_string()));
    }

    #[test]
    fn ls_entries_decode() {
        let json = br#"{"ok":true,"entries":[{"n":"boot.bin","t":"f","s":4096},{"n":"logs","t":"d","s":0}]}"#;
        match ResponseMeta::from_json(json) {
            ResponseMeta::Entries(entries) => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].name, "boot.bin");
                assert_eq!(entries[0].kind, EntryKind::File);
                assert_eq!(entries[0].size, 4096);
                assert_eq!(entries[1].kind, EntryKind::Dir);
            }
            other => panic!("expected entries, got {:?}", other),
        }
    }

    #[test]
    fn get_chunk_decodes() {
        let meta = ResponseMeta::from_json(br#"{"ok":true,"eof":false,"bin":512}"#);
        assert_eq!(
            meta,
            ResponseMeta::Chunk {
                eof: false,
                bin: 512
            }
        );
        assert_eq!(meta.bin_len(), 512);

        let last = ResponseMeta::from_json(br#"{"ok":true,"eof":true,"bin":0}"#);
        assert_eq!(last, ResponseMeta::Chunk { eof: true, bin: 0 });
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let meta = ResponseMeta::from_json(br#"{"ok":true,"uptime":12345,"fw":"2.1"}"#);
        assert_eq!(meta, ResponseMeta::Ok);
    }

    #[test]
    fn malformed_json_folds_to_bad_json() {
        let meta = ResponseMeta::from_json(b"{\"ok\":tr");
        assert_eq!(meta, ResponseMeta::Err("bad_json".to_string()));
        assert_eq!(ResponseMeta::from_json(b""), ResponseMeta::Err("bad_json".to_string()));
    }
}
