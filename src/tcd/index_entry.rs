//! One fixed-size record in the master index
//!
//! 23 u32 slots followed by a u32 flag word, 96 bytes total. During
//! editing a file-referenced slot holds either a raw integer (offset or
//! sentinel, as loaded) or a reference into the sibling tag file's arena;
//! the finalizer converts every reference back to an offset before emit.

use super::error::{DbError, DbResult};
use super::io::read_u32;
use super::tag_file::TagFileSet;
use super::tags::{Tag, SEEK_SENTINEL, TAG_COUNT};
use std::io::Read;
use std::path::Path;

pub const FLAG_DELETED: u32 = 0x0001;
pub const FLAG_DIRCACHE: u32 = 0x0002;
pub const FLAG_DIRTYNUM: u32 = 0x0004;
pub const FLAG_TRKNUMGEN: u32 = 0x0008;
pub const FLAG_RESURRECTED: u32 = 0x0010;

/// State of one slot during editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Raw on-disk value: an offset, an embedded number, 0 (uninitialized)
    /// or the sentinel.
    Value(u32),
    /// Arena index of an entry in the corresponding sibling tag file.
    Entry(usize),
}

/// A resolved slot value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagValue<'a> {
    Text(&'a str),
    Number(u32),
}

impl<'a> TagValue<'a> {
    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            TagValue::Text(s) => Some(s),
            TagValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<u32> {
        match self {
            TagValue::Number(n) => Some(*n),
            TagValue::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexFileEntry {
    pub slots: [Slot; TAG_COUNT],
    pub flag: u32,
}

impl IndexFileEntry {
    /// On-disk size: 23 slots + flag word.
    pub const SIZE: u32 = (TAG_COUNT as u32) * 4 + 4;

    pub fn new() -> Self {
        Self {
            slots: [Slot::Value(0); TAG_COUNT],
            flag: 0,
        }
    }

    pub fn parse_from<R: Read>(r: &mut R, path: &Path) -> DbResult<Self> {
        let mut slots = [Slot::Value(0); TAG_COUNT];
        for slot in slots.iter_mut() {
            *slot = Slot::Value(read_u32(r).map_err(|e| DbError::from_read(path, e))?);
        }
        let flag = read_u32(r).map_err(|e| DbError::from_read(path, e))?;
        Ok(Self { slots, flag })
    }

    /// Serialize this record. Every slot must have been finalized to an
    /// integer; `record` is only used for error reporting.
    pub fn to_bytes(&self, record: usize) -> DbResult<Vec<u8>> {
        let mut bytes = Vec::with_capacity(Self::SIZE as usize);
        for (index, slot) in self.slots.iter().enumerate() {
            match slot {
                Slot::Value(v) => bytes.extend_from_slice(&v.to_le_bytes()),
                Slot::Entry(_) => {
                    return Err(DbError::UnresolvedReference {
                        record,
                        tag: Tag::from_index(index)?.name(),
                    })
                }
            }
        }
        bytes.extend_from_slice(&self.flag.to_le_bytes());
        Ok(bytes)
    }

    /// Resolve the value of one tag for this record.
    ///
    /// File-referenced slots go through the sibling tag file: a reference
    /// yields the referenced entry's text, an integer is looked up by
    /// offset, the sentinel is "no value". Embedded numeric slots return
    /// the raw integer, with 0 meaning "undefined" for every kind except
    /// mtime.
    pub fn get<'a>(&'a self, tag: Tag, siblings: &'a TagFileSet) -> Option<TagValue<'a>> {
        let slot = self.slots[tag.index()];

        if tag.is_file_backed() {
            match slot {
                Slot::Entry(index) => siblings
                    .get(tag)
                    .and_then(|f| f.entry(index))
                    .map(|e| TagValue::Text(&e.text)),
                Slot::Value(SEEK_SENTINEL) => None,
                Slot::Value(offset) => siblings
                    .get(tag)
                    .and_then(|f| f.find_by_offset(offset))
                    .map(|e| TagValue::Text(&e.text)),
            }
        } else {
            match slot {
                Slot::Value(v) if tag == Tag::Mtime => Some(TagValue::Number(v)),
                Slot::Value(0) => None,
                Slot::Value(v) => Some(TagValue::Number(v)),
                // Embedded slots never hold references.
                Slot::Entry(_) => None,
            }
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.flag & FLAG_DELETED != 0
    }

    pub fn is_dircache(&self) -> bool {
        self.flag & FLAG_DIRCACHE != 0
    }

    pub fn is_dirtynum(&self) -> bool {
        self.flag & FLAG_DIRTYNUM != 0
    }

    pub fn is_trknumgen(&self) -> bool {
        self.flag & FLAG_TRKNUMGEN != 0
    }

    pub fn is_resurrected(&self) -> bool {
        self.flag & FLAG_RESURRECTED != 0
    }

    /// The cache index stored in the high 16 bits when DIRCACHE is set.
    pub fn dircache_index(&self) -> Option<u16> {
        self.is_dircache().then(|| (self.flag >> 16) as u16)
    }

    pub fn flag_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.is_deleted() {
            names.push("DELETED");
        }
        if self.is_dircache() {
            names.push("DIRCACHE");
        }
        if self.is_dirtynum() {
            names.push("DIRTYNUM");
        }
        if self.is_trknumgen() {
            names.push("TRKNUMGEN");
        }
        if self.is_resurrected() {
            names.push("RESURRECTED");
        }
        names
    }
}

impl Default for IndexFileEntry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tcd::entry::TagFileEntry;
    use crate::tcd::tag_file::TagFile;
    use std::io::Cursor;

    fn siblings_with_artist(text: &str) -> (TagFileSet, usize) {
        let mut artist = TagFile::new(Tag::Artist);
        let index = artist.add(TagFileEntry::unlinked(text));
        let mut set = TagFileSet::new();
        set.insert(artist);
        (set, index)
    }

    #[test]
    fn serialization_round_trip() {
        let mut entry = IndexFileEntry::new();
        entry.slots[Tag::Year.index()] = Slot::Value(2001);
        entry.flag = FLAG_TRKNUMGEN;

        let bytes = entry.to_bytes(0).unwrap();
        assert_eq!(bytes.len(), IndexFileEntry::SIZE as usize);

        let parsed =
            IndexFileEntry::parse_from(&mut Cursor::new(bytes), Path::new("t")).unwrap();
        assert_eq!(parsed.slots[Tag::Year.index()], Slot::Value(2001));
        assert_eq!(parsed.flag, FLAG_TRKNUMGEN);
    }

    #[test]
    fn unresolved_reference_is_rejected() {
        let mut entry = IndexFileEntry::new();
        entry.slots[Tag::Genre.index()] = Slot::Entry(0);

        let err = entry.to_bytes(7).unwrap_err();
        assert!(matches!(
            err,
            DbError::UnresolvedReference {
                record: 7,
                tag: "genre"
            }
        ));
    }

    #[test]
    fn get_resolves_references_and_offsets() {
        let (siblings, index) = siblings_with_artist("Can");

        let mut entry = IndexFileEntry::new();
        entry.slots[Tag::Artist.index()] = Slot::Entry(index);
        assert_eq!(
            entry.get(Tag::Artist, &siblings).and_then(|v| v.as_text()),
            Some("Can")
        );

        entry.slots[Tag::Artist.index()] = Slot::Value(SEEK_SENTINEL);
        assert_eq!(entry.get(Tag::Artist, &siblings), None);
    }

    #[test]
    fn numeric_zero_means_undefined_except_mtime() {
        let siblings = TagFileSet::new();
        let entry = IndexFileEntry::new();
        assert_eq!(entry.get(Tag::Year, &siblings), None);
        assert_eq!(
            entry.get(Tag::Mtime, &siblings),
            Some(TagValue::Number(0))
        );
    }

    #[test]
    fn dircache_index_lives_in_the_high_bits() {
        let mut entry = IndexFileEntry::new();
        entry.flag = FLAG_DIRCACHE | (0x0123 << 16);
        assert_eq!(entry.dircache_index(), Some(0x0123));
        assert_eq!(entry.flag_names(), vec!["DIRCACHE"]);

        entry.flag = 0x0123 << 16;
        assert_eq!(entry.dircache_index(), None);
    }
}
