use tagcache_tool::build::{build_index, carry_over_player_state};
use tagcache_tool::model::TrackMetadata;
use tagcache_tool::tcd::{
    write_database, IndexFile, IndexFileEntry, Slot, Tag, SEEK_SENTINEL,
};
use tempfile::TempDir;

/// The two-track fixture from the format documentation: same artist, album,
/// genre and year, different titles and lengths.
fn two_track_fixture() -> Vec<TrackMetadata> {
    let mut a = TrackMetadata::new("/Music/A/a.mp3", 4_000_000, 0x1234_5678);
    a.title = Some("A".into());
    a.artist = Some("X".into());
    a.album = Some("Alpha".into());
    a.genre = Some("Rock".into());
    a.year = Some(2001);
    a.length_ms = Some(180_000);
    a.bitrate_kbps = Some(192);

    let mut b = TrackMetadata::new("/Music/A/b.mp3", 5_000_000, 0x1234_5678);
    b.title = Some("B".into());
    b.artist = Some("X".into());
    b.album = Some("Alpha".into());
    b.genre = Some("Rock".into());
    b.year = Some(2001);
    b.length_ms = Some(200_000);
    b.bitrate_kbps = Some(192);

    vec![a, b]
}

#[test]
fn fresh_build_of_two_tracks() {
    let dir = TempDir::new().unwrap();
    let mut index = build_index(&two_track_fixture());
    write_database(&mut index, dir.path(), true, None).unwrap();

    // Shared strings deduplicated, titles kept apart
    assert_eq!(index.tag_files.get(Tag::Artist).unwrap().len(), 1);
    assert_eq!(index.tag_files.get(Tag::Album).unwrap().len(), 1);
    assert_eq!(index.tag_files.get(Tag::Genre).unwrap().len(), 1);
    assert_eq!(index.tag_files.get(Tag::Title).unwrap().len(), 2);
    assert_eq!(index.tag_files.get(Tag::Filename).unwrap().len(), 2);

    // After finalize, record 0's artist slot is the offset of the sole
    // artist entry, which sits right behind the 12-byte file header.
    assert_eq!(index.entries[0].slots[Tag::Artist.index()], Slot::Value(12));

    // Reload and check everything resolves from disk
    let loaded = IndexFile::load_dir(dir.path(), None).unwrap();
    assert_eq!(loaded.entry_count, 2);
    assert_eq!(
        loaded.value(0, Tag::Artist).and_then(|v| v.as_text()),
        Some("X")
    );
    assert_eq!(
        loaded.value(0, Tag::Album).and_then(|v| v.as_text()),
        Some("Alpha")
    );
    assert_eq!(
        loaded.value(1, Tag::Title).and_then(|v| v.as_text()),
        Some("B")
    );
    assert_eq!(
        loaded.value(0, Tag::Filename).and_then(|v| v.as_text()),
        Some("/Music/A/a.mp3")
    );
    assert_eq!(
        loaded.value(1, Tag::Length).and_then(|v| v.as_number()),
        Some(200_000)
    );

    // Both tracks share one artist entry on disk
    assert_eq!(
        loaded.entries[0].slots[Tag::Artist.index()],
        loaded.entries[1].slots[Tag::Artist.index()]
    );
}

#[test]
fn master_datasize_excludes_the_filename_file() {
    let dir = TempDir::new().unwrap();
    let mut index = build_index(&two_track_fixture());
    write_database(&mut index, dir.path(), true, None).unwrap();

    let sibling_sum: u32 = index
        .tag_files
        .iter()
        .filter(|(tag, _)| *tag != Tag::Filename)
        .map(|(_, f)| f.datasize)
        .sum();
    assert_eq!(index.datasize, 24 + 2 * 96 + sibling_sum);

    let loaded = IndexFile::load_dir(dir.path(), None).unwrap();
    assert_eq!(loaded.datasize, index.datasize);
}

#[test]
fn empty_database_builds_and_round_trips() {
    let dir = TempDir::new().unwrap();
    let mut index = build_index(&[]);
    write_database(&mut index, dir.path(), true, None).unwrap();

    assert_eq!(index.datasize, 24);

    let loaded = IndexFile::load_dir(dir.path(), None).unwrap();
    assert_eq!(loaded.entry_count, 0);
    assert_eq!(loaded.datasize, 24);
    for (_, file) in loaded.tag_files.iter() {
        assert_eq!(file.entry_count, 0);
    }
}

#[test]
fn finalize_turns_missing_strings_into_sentinels() {
    let dir = TempDir::new().unwrap();

    let mut track = TrackMetadata::new("/Music/untagged.mp3", 1, 0);
    track.title = Some("Untagged".into());
    let mut index = build_index(&[track]);
    write_database(&mut index, dir.path(), true, None).unwrap();

    // No artist and no albumartist anywhere
    assert_eq!(
        index.entries[0].slots[Tag::Artist.index()],
        Slot::Value(SEEK_SENTINEL)
    );
    assert_eq!(
        index.entries[0].slots[Tag::CanonicalArtist.index()],
        Slot::Value(SEEK_SENTINEL)
    );

    let loaded = IndexFile::load_dir(dir.path(), None).unwrap();
    assert_eq!(loaded.value(0, Tag::Artist), None);
}

#[test]
fn carry_over_from_a_prior_database_on_disk() {
    let dir = TempDir::new().unwrap();

    // Prior database with play history
    let mut old = build_index(&two_track_fixture());
    old.entries[0].slots[Tag::PlayCount.index()] = Slot::Value(7);
    old.entries[0].slots[Tag::LastPlayed.index()] = Slot::Value(99);
    write_database(&mut old, dir.path(), true, None).unwrap();

    // Fresh rebuild of the same library
    let mut fresh = build_index(&two_track_fixture());
    let loaded_old = IndexFile::load_dir(dir.path(), None).unwrap();
    let unmatched = carry_over_player_state(&loaded_old, &mut fresh);

    assert_eq!(unmatched, 0);
    assert_eq!(
        fresh.value(0, Tag::PlayCount).and_then(|v| v.as_number()),
        Some(7)
    );
    assert_eq!(
        fresh.value(0, Tag::LastPlayed).and_then(|v| v.as_number()),
        Some(99)
    );
    assert_eq!(fresh.value(1, Tag::PlayCount), None);
}

#[test]
fn added_records_can_reference_existing_entries() {
    // Editing flow: append a record to a loaded database using references
    let dir = TempDir::new().unwrap();
    let mut index = build_index(&two_track_fixture());
    write_database(&mut index, dir.path(), true, None).unwrap();

    let mut loaded = IndexFile::load_dir(dir.path(), None).unwrap();
    let artist_entry = {
        let artist_file = loaded.tag_files.get(Tag::Artist).unwrap();
        artist_file.find_by_key("x").unwrap().offset_in_file.unwrap()
    };

    let mut record = IndexFileEntry::new();
    record.slots[Tag::Artist.index()] = Slot::Value(artist_entry);
    loaded.add_entry(record);

    let out = TempDir::new().unwrap();
    write_database(&mut loaded, out.path(), true, None).unwrap();

    let reloaded = IndexFile::load_dir(out.path(), None).unwrap();
    assert_eq!(reloaded.entry_count, 3);
    assert_eq!(
        reloaded.value(2, Tag::Artist).and_then(|v| v.as_text()),
        Some("X")
    );
}
