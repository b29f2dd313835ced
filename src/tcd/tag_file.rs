//! Tag data file (database_N.tcd)
//!
//! A TagFile owns the entries for one tag kind in an insertion-ordered
//! arena. Index records refer to entries by arena position, so the emit
//! pass writes entries through a sorted permutation instead of reordering
//! the arena; references stay valid across emits.

use super::entry::TagFileEntry;
use super::error::{DbError, DbResult};
use super::io::{read_u32, write_u32};
use super::tags::{Tag, TAG_MAGIC};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct TagFile {
    tag: Tag,
    pub magic: u32,
    pub datasize: u32,
    pub entry_count: u32,
    entries: Vec<TagFileEntry>,
    by_offset: HashMap<u32, usize>,
    by_key: HashMap<String, usize>,
}

impl TagFile {
    pub fn new(tag: Tag) -> Self {
        assert!(tag.is_file_backed(), "{} has no tag data file", tag);
        Self {
            tag,
            magic: TAG_MAGIC,
            datasize: 0,
            entry_count: 0,
            entries: Vec::new(),
            by_offset: HashMap::new(),
            by_key: HashMap::new(),
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn entries(&self) -> &[TagFileEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&TagFileEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dedup key for a payload: raw for duplicate-allowed kinds, case-folded
    /// otherwise.
    fn key_for(&self, text: &str) -> String {
        if self.tag.allows_duplicates() {
            text.to_owned()
        } else {
            text.to_lowercase()
        }
    }

    /// Load a tag file, deriving its kind from the file name. Every entry on
    /// disk is kept; the by-key map keeps the first occurrence as canonical.
    pub fn load(path: &Path) -> DbResult<TagFile> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DbError::UnknownTag(path.display().to_string()))?;
        let tag = Tag::from_data_filename(filename)?;

        let file = File::open(path).map_err(|e| DbError::io(path, e))?;
        let mut reader = BufReader::new(file);

        let magic = read_u32(&mut reader).map_err(|e| DbError::from_read(path, e))?;
        if magic != TAG_MAGIC {
            return Err(DbError::MagicMismatch {
                path: path.to_path_buf(),
                expected: TAG_MAGIC,
                got: magic,
            });
        }
        let datasize = read_u32(&mut reader).map_err(|e| DbError::from_read(path, e))?;
        let entry_count = read_u32(&mut reader).map_err(|e| DbError::from_read(path, e))?;

        let mut tag_file = TagFile::new(tag);
        tag_file.datasize = datasize;
        tag_file.entry_count = entry_count;

        for _ in 0..entry_count {
            let entry = TagFileEntry::parse_from(&mut reader, tag, path)?;
            let index = tag_file.entries.len();
            if let Some(offset) = entry.offset_in_file {
                tag_file.by_offset.insert(offset, index);
            }
            let key = tag_file.key_for(&entry.text);
            tag_file.by_key.entry(key).or_insert(index);
            tag_file.entries.push(entry);
        }

        Ok(tag_file)
    }

    /// Write the file, assigning `offset_in_file` to every entry as it goes
    /// out. Entries are emitted sorted by case-folded payload (or by the
    /// caller's tie-break key), except for the filename file which keeps
    /// insertion order. The sort is stable, so an already-canonical file
    /// round-trips byte-for-byte.
    pub fn emit(&mut self, path: &Path, tiebreak: Option<&HashMap<String, String>>) -> DbResult<()> {
        self.entry_count = self.entries.len() as u32;
        self.datasize = self
            .entries
            .iter()
            .map(|e| e.size(self.tag))
            .sum();

        self.by_offset.clear();
        self.by_key.clear();

        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        if !self.tag.is_filename_db() {
            order.sort_by_key(|&i| {
                let text = &self.entries[i].text;
                match tiebreak.and_then(|m| m.get(text)) {
                    Some(key) => key.clone(),
                    None => text.to_lowercase(),
                }
            });
        }

        let file = File::create(path).map_err(|e| DbError::io(path, e))?;
        let mut writer = BufWriter::new(file);

        write_u32(&mut writer, self.magic).map_err(|e| DbError::io(path, e))?;
        write_u32(&mut writer, self.datasize).map_err(|e| DbError::io(path, e))?;
        write_u32(&mut writer, self.entry_count).map_err(|e| DbError::io(path, e))?;

        let mut position: u32 = 12;
        for &index in &order {
            let entry = &mut self.entries[index];
            entry.offset_in_file = Some(position);
            let bytes = entry.to_bytes(self.tag);
            writer.write_all(&bytes).map_err(|e| DbError::io(path, e))?;

            self.by_offset.insert(position, index);
            let key = self.key_for(&self.entries[index].text);
            self.by_key.entry(key).or_insert(index);

            position += bytes.len() as u32;
        }

        writer.flush().map_err(|e| DbError::io(path, e))?;
        Ok(())
    }

    /// Get-or-insert by dedup key. Returns the arena index of the canonical
    /// entry, which is stable for the lifetime of this TagFile.
    pub fn add(&mut self, entry: TagFileEntry) -> usize {
        let key = self.key_for(&entry.text);
        if let Some(&existing) = self.by_key.get(&key) {
            return existing;
        }
        let index = self.entries.len();
        if let Some(offset) = entry.offset_in_file {
            self.by_offset.insert(offset, index);
        }
        self.entries.push(entry);
        self.by_key.insert(key, index);
        index
    }

    /// Like [`TagFile::add`], but on a key match the stored text is also
    /// updated to the caller's casing. Used where the caller's form is the
    /// canonical one and an earlier add may have registered a raw-cased
    /// variant.
    pub fn upsert(&mut self, entry: TagFileEntry) -> usize {
        let key = self.key_for(&entry.text);
        if let Some(&existing) = self.by_key.get(&key) {
            if self.entries[existing].text != entry.text {
                self.entries[existing].text = entry.text;
            }
            return existing;
        }
        self.add(entry)
    }

    pub fn find_by_offset(&self, offset: u32) -> Option<&TagFileEntry> {
        self.by_offset.get(&offset).map(|&i| &self.entries[i])
    }

    pub fn find_by_key(&self, text: &str) -> Option<&TagFileEntry> {
        self.by_key.get(&self.key_for(text)).map(|&i| &self.entries[i])
    }

    /// Drop entries failing the predicate and rebuild both lookups. Returns
    /// the arena remap (old index -> new index) for surviving entries so
    /// callers can fix up references held in index records.
    pub fn retain<F: Fn(&TagFileEntry) -> bool>(&mut self, keep: F) -> HashMap<usize, usize> {
        let mut remap = HashMap::new();
        let mut kept = Vec::with_capacity(self.entries.len());

        for (old_index, entry) in self.entries.drain(..).enumerate() {
            if keep(&entry) {
                remap.insert(old_index, kept.len());
                kept.push(entry);
            }
        }
        self.entries = kept;

        self.by_offset.clear();
        self.by_key.clear();
        for (index, entry) in self.entries.iter().enumerate() {
            if let Some(offset) = entry.offset_in_file {
                self.by_offset.insert(offset, index);
            }
            let key = if self.tag.allows_duplicates() {
                entry.text.clone()
            } else {
                entry.text.to_lowercase()
            };
            self.by_key.entry(key).or_insert(index);
        }

        remap
    }
}

/// The ten sibling tag files of a master index, keyed by tag kind and
/// iterated in tag-index order.
#[derive(Debug, Default, Clone)]
pub struct TagFileSet {
    files: BTreeMap<Tag, TagFile>,
}

impl TagFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file: TagFile) -> Option<TagFile> {
        self.files.insert(file.tag(), file)
    }

    pub fn get(&self, tag: Tag) -> Option<&TagFile> {
        self.files.get(&tag)
    }

    pub fn get_mut(&mut self, tag: Tag) -> Option<&mut TagFile> {
        self.files.get_mut(&tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tag, &TagFile)> {
        self.files.iter().map(|(&tag, file)| (tag, file))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Tag, &mut TagFile)> {
        self.files.iter_mut().map(|(&tag, file)| (tag, file))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
