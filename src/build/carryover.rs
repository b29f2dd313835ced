//! Per-track player state carry-over between databases

use crate::tcd::{IndexFile, Tag};
use std::collections::HashMap;

/// Player-maintained counters preserved across rebuilds.
const CARRIED_TAGS: [Tag; 5] = [
    Tag::PlayCount,
    Tag::Rating,
    Tag::LastPlayed,
    Tag::LastElapsed,
    Tag::LastOffset,
];

/// Copy playcount, rating and the last-played counters from `source` into
/// `target`, matching records by their filename string. Target records with
/// no counterpart keep their defaults; the number of unmatched records is
/// returned for reporting.
pub fn carry_over_player_state(source: &IndexFile, target: &mut IndexFile) -> usize {
    let mut by_path: HashMap<&str, usize> = HashMap::new();
    for (record, entry) in source.entries.iter().enumerate() {
        if let Some(path) = entry
            .get(Tag::Filename, &source.tag_files)
            .and_then(|v| v.as_text())
        {
            by_path.entry(path).or_insert(record);
        }
    }

    let IndexFile {
        entries, tag_files, ..
    } = target;

    let mut unmatched = 0;
    for entry in entries.iter_mut() {
        let path = entry
            .get(Tag::Filename, tag_files)
            .and_then(|v| v.as_text())
            .map(str::to_owned);

        let source_record = path.as_deref().and_then(|p| by_path.get(p).copied());
        match source_record {
            Some(record) => {
                let source_entry = &source.entries[record];
                for tag in CARRIED_TAGS {
                    entry.slots[tag.index()] = source_entry.slots[tag.index()];
                }
            }
            None => unmatched += 1,
        }
    }

    unmatched
}
