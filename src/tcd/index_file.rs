//! Master index file (database_idx.tcd)
//!
//! Owns the ten sibling tag files and the fixed-size track records that
//! point into them. Loading opens the siblings first so records can resolve
//! their string slots; emitting is orchestrated by the writer so offsets
//! are reassigned before the master goes out.

use super::error::{DbError, DbResult};
use super::index_entry::{IndexFileEntry, TagValue};
use super::io::{read_u32, write_u32};
use super::tag_file::{TagFile, TagFileSet};
use super::tags::{Tag, INDEX_FILENAME, TAG_MAGIC};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct IndexFile {
    pub magic: u32,
    pub datasize: u32,
    pub entry_count: u32,
    pub serial: u32,
    pub commitid: u32,
    pub dirty: u32,
    pub entries: Vec<IndexFileEntry>,
    pub tag_files: TagFileSet,
}

impl IndexFile {
    pub fn new() -> Self {
        Self {
            magic: TAG_MAGIC,
            datasize: 0,
            entry_count: 0,
            serial: 0,
            commitid: 0,
            dirty: 0,
            entries: Vec::new(),
            tag_files: TagFileSet::new(),
        }
    }

    /// Load a database given the path of its master index. The requested
    /// sibling tag files (all ten by default) are opened from the same
    /// directory first; a missing sibling is a hard error.
    pub fn load(index_path: &Path, kinds: Option<&[Tag]>) -> DbResult<IndexFile> {
        let dir = index_path.parent().unwrap_or_else(|| Path::new("."));

        let mut tag_files = TagFileSet::new();
        let requested: &[Tag] = kinds.unwrap_or(&Tag::FILE_BACKED);
        for &tag in requested {
            let filename = tag
                .data_filename()
                .ok_or_else(|| DbError::UnknownTag(tag.name().to_string()))?;
            let sibling_path = dir.join(filename);
            if !sibling_path.exists() {
                return Err(DbError::MissingSibling {
                    tag: tag.name(),
                    expected_path: sibling_path,
                });
            }
            tag_files.insert(TagFile::load(&sibling_path)?);
        }

        let file = File::open(index_path).map_err(|e| DbError::io(index_path, e))?;
        let mut reader = BufReader::new(file);

        let magic = read_u32(&mut reader).map_err(|e| DbError::from_read(index_path, e))?;
        if magic != TAG_MAGIC {
            return Err(DbError::MagicMismatch {
                path: index_path.to_path_buf(),
                expected: TAG_MAGIC,
                got: magic,
            });
        }

        let mut index = IndexFile::new();
        index.tag_files = tag_files;
        index.datasize = read_u32(&mut reader).map_err(|e| DbError::from_read(index_path, e))?;
        index.entry_count =
            read_u32(&mut reader).map_err(|e| DbError::from_read(index_path, e))?;
        index.serial = read_u32(&mut reader).map_err(|e| DbError::from_read(index_path, e))?;
        index.commitid = read_u32(&mut reader).map_err(|e| DbError::from_read(index_path, e))?;
        index.dirty = read_u32(&mut reader).map_err(|e| DbError::from_read(index_path, e))?;

        for _ in 0..index.entry_count {
            index
                .entries
                .push(IndexFileEntry::parse_from(&mut reader, index_path)?);
        }

        Ok(index)
    }

    /// Convenience: load from a database directory.
    pub fn load_dir(db_dir: &Path, kinds: Option<&[Tag]>) -> DbResult<IndexFile> {
        IndexFile::load(&db_dir.join(INDEX_FILENAME), kinds)
    }

    /// Write the master file. The aggregate datasize counts the master's
    /// own header and records plus the datasize of every sibling except the
    /// filename file; the siblings must therefore have been emitted (or
    /// loaded) already so their datasize fields are current.
    pub fn emit(&mut self, path: &Path) -> DbResult<()> {
        self.entry_count = self.entries.len() as u32;
        self.datasize = 24
            + self.entry_count * IndexFileEntry::SIZE
            + self
                .tag_files
                .iter()
                .filter(|(tag, _)| !tag.is_filename_db())
                .map(|(_, f)| f.datasize)
                .sum::<u32>();

        let file = File::create(path).map_err(|e| DbError::io(path, e))?;
        let mut writer = BufWriter::new(file);

        for value in [
            self.magic,
            self.datasize,
            self.entry_count,
            self.serial,
            self.commitid,
            self.dirty,
        ] {
            write_u32(&mut writer, value).map_err(|e| DbError::io(path, e))?;
        }

        for (record, entry) in self.entries.iter().enumerate() {
            let bytes = entry.to_bytes(record)?;
            writer.write_all(&bytes).map_err(|e| DbError::io(path, e))?;
        }

        writer.flush().map_err(|e| DbError::io(path, e))?;
        Ok(())
    }

    pub fn add_entry(&mut self, entry: IndexFileEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve one tag of one record against the owned siblings.
    pub fn value(&self, record: usize, tag: Tag) -> Option<TagValue<'_>> {
        self.entries
            .get(record)
            .and_then(|e| e.get(tag, &self.tag_files))
    }
}

impl Default for IndexFile {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tcd::index_entry::Slot;
    use tempfile::TempDir;

    #[test]
    fn empty_index_datasize_is_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(INDEX_FILENAME);

        let mut index = IndexFile::new();
        for tag in Tag::FILE_BACKED {
            index.tag_files.insert(TagFile::new(tag));
        }
        index.emit(&path).unwrap();
        assert_eq!(index.datasize, 24);

        // 24-byte header, no records
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 24);
    }

    #[test]
    fn load_requires_every_requested_sibling() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(INDEX_FILENAME);
        std::fs::write(&path, TAG_MAGIC.to_le_bytes()).unwrap();

        let err = IndexFile::load(&path, Some(&[Tag::Artist])).unwrap_err();
        assert!(matches!(err, DbError::MissingSibling { tag: "artist", .. }));
    }

    #[test]
    fn load_rejects_bad_magic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(INDEX_FILENAME);
        std::fs::write(&path, [0u8; 24]).unwrap();

        let err = IndexFile::load(&path, Some(&[])).unwrap_err();
        assert!(matches!(
            err,
            DbError::MagicMismatch {
                expected: TAG_MAGIC,
                got: 0,
                ..
            }
        ));
    }

    #[test]
    fn header_fields_survive_a_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(INDEX_FILENAME);

        let mut index = IndexFile::new();
        index.serial = 42;
        index.commitid = 7;
        index.dirty = 1;
        let mut entry = IndexFileEntry::new();
        entry.slots[Tag::Year.index()] = Slot::Value(1999);
        index.add_entry(entry);
        index.emit(&path).unwrap();

        let loaded = IndexFile::load(&path, Some(&[])).unwrap();
        assert_eq!(loaded.serial, 42);
        assert_eq!(loaded.commitid, 7);
        assert_eq!(loaded.dirty, 1);
        assert_eq!(loaded.entry_count, 1);
        assert_eq!(loaded.datasize, 24 + 96);
        assert_eq!(loaded.value(0, Tag::Year).and_then(|v| v.as_number()), Some(1999));
    }
}
