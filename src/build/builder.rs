//! Fresh database construction from track metadata

use crate::model::TrackMetadata;
use crate::tcd::{
    IndexFile, IndexFileEntry, Slot, Tag, TagFile, TagFileEntry, SEEK_SENTINEL,
};

/// Build a complete in-memory database from the given tracks, in input
/// order.
///
/// String slots are stored as references into the freshly populated tag
/// files and stay references until the writer finalizes them. Title and
/// filename entries carry the track ordinal as their idx_id; every other
/// entry carries the sentinel.
pub fn build_index(tracks: &[TrackMetadata]) -> IndexFile {
    let mut index = IndexFile::new();
    for tag in Tag::FILE_BACKED {
        index.tag_files.insert(TagFile::new(tag));
    }

    for (ordinal, track) in tracks.iter().enumerate() {
        let mut record = IndexFileEntry::new();

        set_number(&mut record, Tag::Year, track.year);
        set_number(&mut record, Tag::DiscNumber, track.discnumber);
        set_number(&mut record, Tag::TrackNumber, track.tracknumber);
        set_number(&mut record, Tag::Bitrate, track.bitrate_kbps);
        set_number(&mut record, Tag::Length, track.length_ms);
        record.slots[Tag::Mtime.index()] = Slot::Value(track.mtime_fat);

        for tag in Tag::FILE_BACKED {
            let text = match tag {
                Tag::Artist => track.artist.as_deref(),
                Tag::Album => track.album.as_deref(),
                Tag::Genre => track.genre.as_deref(),
                Tag::Title => track.title.as_deref(),
                Tag::Filename => Some(track.path.as_str()),
                Tag::Composer => Some(track.composer_or_default()),
                Tag::Comment => Some(track.comment_or_default()),
                Tag::AlbumArtist => track.albumartist.as_deref(),
                Tag::Grouping => track.grouping_or_title(),
                Tag::CanonicalArtist => track.canonical_artist(),
                _ => unreachable!("{} is not file-backed", tag),
            };

            let Some(text) = text else {
                // Left at 0; the finalizer turns it into the sentinel.
                continue;
            };

            let idx_id = if tag == Tag::Title || tag == Tag::Filename {
                ordinal as u32
            } else {
                SEEK_SENTINEL
            };

            let tag_file = index
                .tag_files
                .get_mut(tag)
                .expect("builder installs every file-backed tag file");
            let arena_index = tag_file.add(TagFileEntry::new(text, idx_id));
            record.slots[tag.index()] = Slot::Entry(arena_index);
        }

        index.add_entry(record);
    }

    index
}

fn set_number(record: &mut IndexFileEntry, tag: Tag, value: Option<u32>) {
    record.slots[tag.index()] = Slot::Value(value.unwrap_or(0));
}
