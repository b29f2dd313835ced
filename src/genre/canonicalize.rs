//! Per-track genre rewrite

use super::hierarchy::GenreMap;
use crate::tcd::{DbError, DbResult, IndexFile, Slot, Tag, TagFileEntry, SEEK_SENTINEL};
use std::path::PathBuf;

/// Pick the single canonical genre for a possibly multi-value genre string.
///
/// The string is split on `;`, each part is canonicalized through the map,
/// and the most frequent canonical form wins; ties go to whichever appears
/// first in the original order. Returns `None` when the split yields
/// nothing.
pub fn select_canonical_genre(original: &str, map: &GenreMap) -> Option<String> {
    let parts: Vec<&str> = original
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        return None;
    }

    let canonicals: Vec<String> = parts.iter().map(|p| map.canonical_of(p)).collect();

    let mut counts: Vec<(&str, usize)> = Vec::new();
    for canonical in &canonicals {
        if let Some(entry) = counts.iter_mut().find(|e| e.0 == canonical.as_str()) {
            entry.1 += 1;
        } else {
            counts.push((canonical.as_str(), 1));
        }
    }
    let best = counts.iter().map(|e| e.1).max()?;

    // counts preserves first-appearance order, so the first entry at the
    // maximum is the original-order tie-break.
    counts
        .iter()
        .find(|e| e.1 == best)
        .map(|e| e.0.to_owned())
}

/// Title-case a genre for display: first letter of each space-separated
/// word uppercased, the rest lowercased.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rewrite the genre slot of every non-deleted record to its single
/// canonical genre, then strip legacy multi-value strings from the genre
/// tag file. Returns the number of records whose genre actually changed.
///
/// Every rewritten slot becomes a reference into the genre tag file (even
/// when the canonical form equals the current value), so the strip below
/// can never strand a stale integer offset.
pub fn canonicalize_genres(index: &mut IndexFile, map: &GenreMap) -> DbResult<usize> {
    if index.tag_files.get(Tag::Genre).is_none() {
        return Err(DbError::MissingSibling {
            tag: Tag::Genre.name(),
            expected_path: PathBuf::from(Tag::Genre.data_filename().unwrap_or_default()),
        });
    }

    let IndexFile {
        entries, tag_files, ..
    } = index;

    let mut modified = 0;
    for entry in entries.iter_mut() {
        if entry.is_deleted() {
            continue;
        }

        let original = match entry
            .get(Tag::Genre, tag_files)
            .and_then(|v| v.as_text())
            .map(str::to_owned)
        {
            Some(s) if !s.trim().is_empty() => s,
            _ => continue,
        };

        let Some(chosen) = select_canonical_genre(&original, map) else {
            continue;
        };
        let chosen = title_case(&chosen);
        if chosen.is_empty() {
            continue;
        }

        // Upsert rather than add: the builder seeded this file with the raw
        // tag casing, and the title-cased form must win.
        let genre_file = tag_files.get_mut(Tag::Genre).expect("checked above");
        let arena_index = genre_file.upsert(TagFileEntry::unlinked(chosen.clone()));
        entry.slots[Tag::Genre.index()] = Slot::Entry(arena_index);

        if chosen.to_lowercase() != original.to_lowercase() {
            modified += 1;
        }
    }

    // Multi-value strings are never a canonical form; drop them and remap
    // the surviving arena indices.
    let genre_file = tag_files.get_mut(Tag::Genre).expect("checked above");
    let remap = genre_file.retain(|e| !e.text.contains(';'));

    let genre_slot = Tag::Genre.index();
    for entry in entries.iter_mut() {
        if let Slot::Entry(old) = entry.slots[genre_slot] {
            match remap.get(&old) {
                Some(&new) => entry.slots[genre_slot] = Slot::Entry(new),
                None => {
                    log::warn!("genre reference vanished during cleanup, writing sentinel");
                    entry.slots[genre_slot] = Slot::Value(SEEK_SENTINEL);
                }
            }
        }
    }

    Ok(modified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_index;
    use crate::model::TrackMetadata;

    fn identity_map() -> GenreMap {
        GenreMap::from_pairs([("rock", "rock"), ("pop", "pop")])
    }

    fn track_with_genre(path: &str, genre: &str) -> TrackMetadata {
        let mut t = TrackMetadata::new(path, 100, 0);
        t.title = Some("T".into());
        t.genre = Some(genre.into());
        t
    }

    #[test]
    fn frequency_wins() {
        let chosen = select_canonical_genre("Rock; Pop; Rock", &identity_map()).unwrap();
        assert_eq!(chosen, "rock");
    }

    #[test]
    fn ties_go_to_original_order() {
        let chosen = select_canonical_genre("Pop; Rock", &identity_map()).unwrap();
        assert_eq!(chosen, "pop");
    }

    #[test]
    fn empty_splits_yield_nothing() {
        assert_eq!(select_canonical_genre(" ; ; ", &identity_map()), None);
    }

    #[test]
    fn title_case_matches_capwords() {
        assert_eq!(title_case("heavy METAL"), "Heavy Metal");
        assert_eq!(title_case("pop"), "Pop");
        assert_eq!(title_case("  drum   and bass "), "Drum And Bass");
    }

    #[test]
    fn rewrite_collapses_multi_value_genres() {
        let map = GenreMap::from_pairs([
            ("heavy metal", "metal"),
            ("death metal", "metal"),
            ("pop", "pop"),
        ]);

        let mut index = build_index(&[track_with_genre(
            "/Music/a.mp3",
            "Death Metal; Pop; Heavy Metal",
        )]);
        let modified = canonicalize_genres(&mut index, &map).unwrap();
        assert_eq!(modified, 1);

        assert_eq!(
            index.value(0, Tag::Genre).and_then(|v| v.as_text()),
            Some("Metal")
        );

        let genre_file = index.tag_files.get(Tag::Genre).unwrap();
        let texts: Vec<&str> = genre_file.entries().iter().map(|e| e.text.as_str()).collect();
        assert!(texts.contains(&"Metal"));
        assert!(!texts.iter().any(|t| t.contains(';')));
    }

    #[test]
    fn raw_cased_genres_are_rewritten_to_title_case() {
        // The builder seeds the genre file with the tag's raw casing; the
        // canonical pass must replace it, not just point at it.
        let mut index = build_index(&[
            track_with_genre("/Music/a.mp3", "ROCK"),
            track_with_genre("/Music/b.mp3", "rock"),
        ]);
        let modified = canonicalize_genres(&mut index, &identity_map()).unwrap();
        assert_eq!(modified, 0);

        assert_eq!(
            index.value(0, Tag::Genre).and_then(|v| v.as_text()),
            Some("Rock")
        );
        assert_eq!(
            index.value(1, Tag::Genre).and_then(|v| v.as_text()),
            Some("Rock")
        );

        let genre_file = index.tag_files.get(Tag::Genre).unwrap();
        assert_eq!(genre_file.len(), 1);
        assert_eq!(genre_file.entries()[0].text, "Rock");
    }

    #[test]
    fn unchanged_single_genres_are_not_counted_as_modified() {
        let mut index = build_index(&[track_with_genre("/Music/a.mp3", "Rock")]);
        let modified = canonicalize_genres(&mut index, &identity_map()).unwrap();
        assert_eq!(modified, 0);
        assert_eq!(
            index.value(0, Tag::Genre).and_then(|v| v.as_text()),
            Some("Rock")
        );
    }

    #[test]
    fn deleted_records_are_left_alone() {
        use crate::tcd::FLAG_DELETED;

        let mut index = build_index(&[track_with_genre("/Music/a.mp3", "Pop; Rock")]);
        index.entries[0].flag |= FLAG_DELETED;
        let modified = canonicalize_genres(&mut index, &identity_map()).unwrap();
        assert_eq!(modified, 0);
    }
}
