//! Database writer and finalizer
//!
//! The ordering protocol that produces a self-consistent on-disk set: tag
//! files are emitted first (assigning entry offsets), then index records
//! have their references resolved to those offsets, then the master index
//! goes out with its aggregate size.

use super::error::{DbError, DbResult};
use super::index_entry::Slot;
use super::index_file::IndexFile;
use super::tags::{Tag, INDEX_FILENAME, SEEK_SENTINEL};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Per-kind sort tie-break maps: payload string -> sort key.
pub type SortMap = HashMap<Tag, HashMap<String, String>>;

/// Write a complete database to `out_dir`.
///
/// Pre-existing `database*.tcd` files in the directory are moved into a
/// `.backup/` subdirectory first, so an aborted write leaves a recoverable
/// prior version. With `auto_finalize` disabled the caller is responsible
/// for records holding only integer slots (pure round-trip copies).
pub fn write_database(
    index: &mut IndexFile,
    out_dir: &Path,
    auto_finalize: bool,
    sort_map: Option<&SortMap>,
) -> DbResult<()> {
    prepare_output_dir(out_dir)?;

    for (tag, tag_file) in index.tag_files.iter_mut() {
        let filename = tag
            .data_filename()
            .ok_or_else(|| DbError::UnknownTag(tag.name().to_string()))?;
        let path = out_dir.join(filename);
        let tiebreak = sort_map.and_then(|m| m.get(&tag));
        log::debug!("writing {} ({} entries)", filename, tag_file.len());
        tag_file.emit(&path, tiebreak)?;
    }

    if auto_finalize {
        finalize_index(index);
    }

    let index_path = out_dir.join(INDEX_FILENAME);
    log::debug!("writing {} ({} records)", INDEX_FILENAME, index.len());
    index.emit(&index_path)?;

    Ok(())
}

/// Convert every file-referenced slot to its final integer form.
///
/// References resolve to the referenced entry's freshly assigned offset; a
/// leftover 0 is reinterpreted as "no value"; nonzero integers are offsets
/// from a prior load and are kept as-is.
pub fn finalize_index(index: &mut IndexFile) {
    let IndexFile {
        entries, tag_files, ..
    } = index;

    for (record, entry) in entries.iter_mut().enumerate() {
        for tag in Tag::FILE_BACKED {
            let slot = &mut entry.slots[tag.index()];
            match *slot {
                Slot::Entry(arena_index) => {
                    let offset = tag_files
                        .get(tag)
                        .and_then(|f| f.entry(arena_index))
                        .and_then(|e| e.offset_in_file);
                    match offset {
                        Some(offset) => *slot = Slot::Value(offset),
                        None => {
                            // The referenced entry was never written; only a
                            // caller bug can get us here.
                            log::warn!(
                                "record {}: {} reference has no assigned offset, writing sentinel",
                                record,
                                tag
                            );
                            *slot = Slot::Value(SEEK_SENTINEL);
                        }
                    }
                }
                Slot::Value(0) => *slot = Slot::Value(SEEK_SENTINEL),
                Slot::Value(_) => {}
            }
        }
    }
}

/// Create `out_dir` if needed; relocate any existing database files into a
/// `.backup/` subdirectory.
fn prepare_output_dir(out_dir: &Path) -> DbResult<()> {
    if !out_dir.is_dir() {
        fs::create_dir_all(out_dir).map_err(|e| DbError::io(out_dir, e))?;
        return Ok(());
    }

    let mut existing = Vec::new();
    let listing = fs::read_dir(out_dir).map_err(|e| DbError::io(out_dir, e))?;
    for dir_entry in listing {
        let dir_entry = dir_entry.map_err(|e| DbError::io(out_dir, e))?;
        let name = dir_entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("database") && name.ends_with(".tcd") {
            existing.push(dir_entry.path());
        }
    }

    if existing.is_empty() {
        return Ok(());
    }

    let backup_dir = out_dir.join(".backup");
    fs::create_dir_all(&backup_dir).map_err(|e| DbError::io(&backup_dir, e))?;
    log::info!(
        "backing up {} existing database files to {:?}",
        existing.len(),
        backup_dir
    );
    for path in existing {
        if let Some(name) = path.file_name() {
            fs::rename(&path, backup_dir.join(name)).map_err(|e| DbError::io(&path, e))?;
        }
    }

    Ok(())
}
