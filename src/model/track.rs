use serde::{Deserialize, Serialize};

/// Comment written for tracks with no comment tag. Player-generated
/// databases carry this exact placeholder, so fresh builds must emit it
/// byte-for-byte.
pub const UNTAGGED_COMMENT: &str = " 0000167A 0000167A 00003832 00003832 00000000 00000000 00008608 00008608 00000000 00000000";

/// Composer written for tracks with no composer tag.
pub const UNTAGGED_COMPOSER: &str = "<Untagged>";

/// Metadata of one audio file, as produced by the tag reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Path of the track as it should appear in the database (device path
    /// after the build pipeline's remapping).
    pub path: String,

    /// File size in bytes
    pub size: u64,

    /// Modification time in the FAT32 packed date+time encoding
    pub mtime_fat: u32,

    /// String tags (absent when the file carries no such tag)
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub albumartist: Option<String>,
    pub composer: Option<String>,
    pub comment: Option<String>,
    pub grouping: Option<String>,
    pub genre: Option<String>,
    pub date: Option<String>,

    /// Numeric tags
    pub year: Option<u32>,
    pub discnumber: Option<u32>,
    pub tracknumber: Option<u32>,
    pub bitrate_kbps: Option<u32>,
    pub length_ms: Option<u32>,
}

impl TrackMetadata {
    /// Skeleton record with only filesystem-derived fields populated.
    pub fn new(path: impl Into<String>, size: u64, mtime_fat: u32) -> Self {
        Self {
            path: path.into(),
            size,
            mtime_fat,
            title: None,
            artist: None,
            album: None,
            albumartist: None,
            composer: None,
            comment: None,
            grouping: None,
            genre: None,
            date: None,
            year: None,
            discnumber: None,
            tracknumber: None,
            bitrate_kbps: None,
            length_ms: None,
        }
    }

    /// Artist used for the canonicalartist slot: artist, else albumartist.
    pub fn canonical_artist(&self) -> Option<&str> {
        self.artist.as_deref().or(self.albumartist.as_deref())
    }

    /// Composer with the legacy placeholder for untagged files.
    pub fn composer_or_default(&self) -> &str {
        self.composer.as_deref().unwrap_or(UNTAGGED_COMPOSER)
    }

    /// Grouping falls back to the title.
    pub fn grouping_or_title(&self) -> Option<&str> {
        self.grouping.as_deref().or(self.title.as_deref())
    }

    /// Comment with the legacy placeholder for untagged files.
    pub fn comment_or_default(&self) -> &str {
        self.comment.as_deref().unwrap_or(UNTAGGED_COMMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_defaults() {
        let mut track = TrackMetadata::new("/Music/a.mp3", 1024, 0);
        assert_eq!(track.canonical_artist(), None);
        assert_eq!(track.composer_or_default(), "<Untagged>");
        assert_eq!(track.grouping_or_title(), None);
        assert_eq!(track.comment_or_default(), UNTAGGED_COMMENT);

        track.albumartist = Some("Various".into());
        assert_eq!(track.canonical_artist(), Some("Various"));
        track.artist = Some("Can".into());
        assert_eq!(track.canonical_artist(), Some("Can"));

        track.title = Some("Vitamin C".into());
        assert_eq!(track.grouping_or_title(), Some("Vitamin C"));
    }
}
