//! Database inspection for the CLI

use crate::tcd::{IndexFile, Tag};
use std::collections::BTreeSet;

/// Print header fields and per-file entry counts.
pub fn print_stats(index: &IndexFile) {
    println!("master index:");
    println!("  magic:       {:#010x}", index.magic);
    println!("  datasize:    {}", index.datasize);
    println!("  entry_count: {}", index.entry_count);
    println!("  serial:      {}", index.serial);
    println!("  commitid:    {}", index.commitid);
    println!("  dirty:       {}", index.dirty);

    let deleted = index.entries.iter().filter(|e| e.is_deleted()).count();
    if deleted > 0 {
        println!("  deleted:     {}", deleted);
    }

    println!("tag files:");
    for (tag, file) in index.tag_files.iter() {
        println!(
            "  {:<16} {:>6} entries, datasize {}",
            tag.name(),
            file.len(),
            file.datasize
        );
    }
}

/// Print the sorted unique values of one file-backed tag.
pub fn print_unique_values(index: &IndexFile, tag: Tag) {
    let mut values = BTreeSet::new();
    for record in 0..index.entries.len() {
        if index.entries[record].is_deleted() {
            continue;
        }
        if let Some(text) = index.value(record, tag).and_then(|v| v.as_text()) {
            values.insert(text.to_owned());
        }
    }

    println!("{} unique {} value(s):", values.len(), tag.name());
    for value in values {
        println!("- {}", value);
    }
}

/// Print one line per track.
pub fn print_tracks(index: &IndexFile) {
    for record in 0..index.entries.len() {
        if index.entries[record].is_deleted() {
            continue;
        }
        let get = |tag| {
            index
                .value(record, tag)
                .and_then(|v| v.as_text())
                .unwrap_or("-")
                .to_owned()
        };
        println!(
            "{:5}  {} - {} - {} ({})",
            record,
            get(Tag::Artist),
            get(Tag::Album),
            get(Tag::Title),
            get(Tag::Filename),
        );
    }
}
