//! Tag taxonomy
//!
//! The master index carries 23 slots per track. Ten of them are offsets
//! into separate tag data files; the rest hold their numeric value inline.

use super::error::DbError;

/// Shared magic constant of every database file.
pub const TAG_MAGIC: u32 = 0x5443_4810;

/// Number of slots in an index record.
pub const TAG_COUNT: usize = 23;

/// "No value" marker for file-referenced slots.
pub const SEEK_SENTINEL: u32 = 0xFFFF_FFFF;

/// File name of the master index.
pub const INDEX_FILENAME: &str = "database_idx.tcd";

/// One of the 23 tag kinds, in slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tag {
    Artist,
    Album,
    Genre,
    Title,
    Filename,
    Composer,
    Comment,
    AlbumArtist,
    Grouping,
    Year,
    DiscNumber,
    TrackNumber,
    CanonicalArtist,
    Bitrate,
    Length,
    PlayCount,
    Rating,
    PlayTime,
    LastPlayed,
    CommitId,
    Mtime,
    LastElapsed,
    LastOffset,
}

impl Tag {
    /// Every tag kind, in slot order.
    pub const ALL: [Tag; TAG_COUNT] = [
        Tag::Artist,
        Tag::Album,
        Tag::Genre,
        Tag::Title,
        Tag::Filename,
        Tag::Composer,
        Tag::Comment,
        Tag::AlbumArtist,
        Tag::Grouping,
        Tag::Year,
        Tag::DiscNumber,
        Tag::TrackNumber,
        Tag::CanonicalArtist,
        Tag::Bitrate,
        Tag::Length,
        Tag::PlayCount,
        Tag::Rating,
        Tag::PlayTime,
        Tag::LastPlayed,
        Tag::CommitId,
        Tag::Mtime,
        Tag::LastElapsed,
        Tag::LastOffset,
    ];

    /// The ten kinds whose per-track value is an offset into a tag file.
    pub const FILE_BACKED: [Tag; 10] = [
        Tag::Artist,
        Tag::Album,
        Tag::Genre,
        Tag::Title,
        Tag::Filename,
        Tag::Composer,
        Tag::Comment,
        Tag::AlbumArtist,
        Tag::Grouping,
        Tag::CanonicalArtist,
    ];

    /// Slot position of this kind in an index record.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Result<Tag, DbError> {
        Tag::ALL
            .get(index)
            .copied()
            .ok_or_else(|| DbError::UnknownTag(index.to_string()))
    }

    pub fn name(self) -> &'static str {
        match self {
            Tag::Artist => "artist",
            Tag::Album => "album",
            Tag::Genre => "genre",
            Tag::Title => "title",
            Tag::Filename => "filename",
            Tag::Composer => "composer",
            Tag::Comment => "comment",
            Tag::AlbumArtist => "albumartist",
            Tag::Grouping => "grouping",
            Tag::Year => "year",
            Tag::DiscNumber => "discnumber",
            Tag::TrackNumber => "tracknumber",
            Tag::CanonicalArtist => "canonicalartist",
            Tag::Bitrate => "bitrate",
            Tag::Length => "length",
            Tag::PlayCount => "playcount",
            Tag::Rating => "rating",
            Tag::PlayTime => "playtime",
            Tag::LastPlayed => "lastplayed",
            Tag::CommitId => "commitid",
            Tag::Mtime => "mtime",
            Tag::LastElapsed => "lastelapsed",
            Tag::LastOffset => "lastoffset",
        }
    }

    pub fn from_name(name: &str) -> Result<Tag, DbError> {
        Tag::ALL
            .iter()
            .copied()
            .find(|t| t.name() == name)
            .ok_or_else(|| DbError::UnknownTag(name.to_string()))
    }

    /// True when the slot value is an offset into a separate tag file.
    pub fn is_file_backed(self) -> bool {
        Tag::FILE_BACKED.contains(&self)
    }

    /// The filename tag file is the only one without chunk padding, and the
    /// only one emitted in insertion order.
    pub fn is_filename_db(self) -> bool {
        self == Tag::Filename
    }

    /// Title entries may repeat; every other file-backed kind deduplicates
    /// on the case-folded payload.
    pub fn allows_duplicates(self) -> bool {
        self == Tag::Title
    }

    /// On-disk file name of the tag data file for this kind, if any.
    pub fn data_filename(self) -> Option<&'static str> {
        match self {
            Tag::Artist => Some("database_0.tcd"),
            Tag::Album => Some("database_1.tcd"),
            Tag::Genre => Some("database_2.tcd"),
            Tag::Title => Some("database_3.tcd"),
            Tag::Filename => Some("database_4.tcd"),
            Tag::Composer => Some("database_5.tcd"),
            Tag::Comment => Some("database_6.tcd"),
            Tag::AlbumArtist => Some("database_7.tcd"),
            Tag::Grouping => Some("database_8.tcd"),
            Tag::CanonicalArtist => Some("database_12.tcd"),
            _ => None,
        }
    }

    pub fn from_data_filename(filename: &str) -> Result<Tag, DbError> {
        Tag::FILE_BACKED
            .iter()
            .copied()
            .find(|t| t.data_filename() == Some(filename))
            .ok_or_else(|| DbError::UnknownTag(filename.to_string()))
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
