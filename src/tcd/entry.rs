//! One variable-length record inside a tag data file
//!
//! Layout: u32 tag_length, u32 idx_id, then tag_length payload bytes
//! (UTF-8 string, null terminator, 0x58 filler up to an 8-byte chunk
//! boundary). The filename file is the exception: its payloads are not
//! chunk-padded.

use super::error::{DbError, DbResult};
use super::io::{read_exact_counted, read_u32};
use super::tags::{Tag, SEEK_SENTINEL};
use std::io::{Read, Seek};
use std::path::Path;

/// Payloads are padded to this boundary (filename file excepted).
const CHUNK_LEN: usize = 8;

/// Filler byte for the padding region.
const PAD_BYTE: u8 = b'X';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFileEntry {
    /// Decoded payload string (bytes before the first null).
    pub text: String,

    /// Per-record linking value. The builder sets the track ordinal here for
    /// title and filename entries; everything else carries the sentinel.
    pub idx_id: u32,

    /// Byte position of this entry's header within its tag file. Assigned on
    /// load and reassigned every time the containing file is emitted.
    pub offset_in_file: Option<u32>,
}

impl TagFileEntry {
    pub fn new(text: impl Into<String>, idx_id: u32) -> Self {
        Self {
            text: text.into(),
            idx_id,
            offset_in_file: None,
        }
    }

    /// Convenience for entries that carry no linking value.
    pub fn unlinked(text: impl Into<String>) -> Self {
        Self::new(text, SEEK_SENTINEL)
    }

    /// Read one entry from `r`, which must be positioned at an entry header.
    /// `path` is only used for error reporting.
    pub fn parse_from<R: Read + Seek>(r: &mut R, tag: Tag, path: &Path) -> DbResult<Self> {
        let offset = r
            .stream_position()
            .map_err(|e| DbError::io(path, e))? as u32;

        let tag_length = read_u32(r).map_err(|e| DbError::from_read(path, e))? as usize;
        let idx_id = read_u32(r).map_err(|e| DbError::from_read(path, e))?;

        let mut payload = vec![0u8; tag_length];
        read_exact_counted(r, &mut payload).map_err(|e| DbError::from_read(path, e))?;

        let text = decode_payload(&payload, tag)?;

        Ok(Self {
            text,
            idx_id,
            offset_in_file: Some(offset),
        })
    }

    /// Serialize this entry, header included, applying the padding rule for
    /// the given kind.
    pub fn to_bytes(&self, tag: Tag) -> Vec<u8> {
        let tag_length = self.tag_length(tag) as usize;

        let mut bytes = Vec::with_capacity(8 + tag_length);
        bytes.extend_from_slice(&(tag_length as u32).to_le_bytes());
        bytes.extend_from_slice(&self.idx_id.to_le_bytes());
        bytes.extend_from_slice(self.text.as_bytes());
        bytes.push(0);
        bytes.resize(8 + tag_length, PAD_BYTE);
        bytes
    }

    /// The tag_length field as written to disk: string + null, rounded up to
    /// the chunk boundary except for the filename file.
    pub fn tag_length(&self, tag: Tag) -> u32 {
        let with_null = self.text.len() + 1;
        let padded = if tag.is_filename_db() {
            with_null
        } else {
            with_null.div_ceil(CHUNK_LEN) * CHUNK_LEN
        };
        padded as u32
    }

    /// Total on-disk size of this entry, 8-byte header included.
    pub fn size(&self, tag: Tag) -> u32 {
        self.tag_length(tag) + 8
    }
}

fn decode_payload(payload: &[u8], tag: Tag) -> DbResult<String> {
    let pre_null = match payload.iter().position(|&b| b == 0) {
        Some(pos) => &payload[..pos],
        None => payload,
    };

    match std::str::from_utf8(pre_null) {
        Ok(s) => Ok(s.to_owned()),
        // Player-generated comment entries can hold ten raw u32 counters
        // instead of text; render them the way the firmware prints them.
        Err(_) if tag == Tag::Comment && pre_null.len() == 40 => {
            let words: Vec<String> = pre_null
                .chunks_exact(4)
                .map(|c| format!("{:08X}", u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
                .collect();
            Ok(words.join(" "))
        }
        Err(_) => Err(DbError::DecodeError {
            tag: tag.name(),
            len: pre_null.len(),
        }),
    }
}
