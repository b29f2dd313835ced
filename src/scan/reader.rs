//! Audio tag reading behind a pluggable trait

use crate::model::TrackMetadata;
use crate::tcd::fat_pack;
use anyhow::{Context, Result};
use lofty::prelude::*;
use lofty::tag::ItemKey;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Extracts one populated track-metadata record per audio file.
pub trait TagReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<TrackMetadata>;
}

/// Tag reader backed by lofty, covering every format in the default
/// extension set.
pub struct LoftyReader;

impl LoftyReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoftyReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TagReader for LoftyReader {
    fn read(&self, path: &Path) -> Result<TrackMetadata> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to stat audio file: {:?}", path))?;
        let mtime_unix = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        let tagged = lofty::read_from_path(path)
            .with_context(|| format!("Failed to read tags from: {:?}", path))?;

        let mut track = TrackMetadata::new(
            path.to_string_lossy().into_owned(),
            metadata.len(),
            fat_pack(mtime_unix),
        );

        let properties = tagged.properties();
        track.length_ms = Some(properties.duration().as_millis() as u32);
        track.bitrate_kbps = properties.audio_bitrate();

        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            track.title = tag.title().map(|s| s.into_owned());
            track.artist = tag.artist().map(|s| s.into_owned());
            track.album = tag.album().map(|s| s.into_owned());
            track.genre = tag.genre().map(|s| s.into_owned());
            track.comment = tag.comment().map(|s| s.into_owned());
            track.albumartist = tag.get_string(&ItemKey::AlbumArtist).map(str::to_owned);
            track.composer = tag.get_string(&ItemKey::Composer).map(str::to_owned);
            track.grouping = tag.get_string(&ItemKey::ContentGroup).map(str::to_owned);
            track.date = tag.get_string(&ItemKey::RecordingDate).map(str::to_owned);
            track.year = tag.year();
            track.tracknumber = tag.track();
            track.discnumber = tag.disk();
        }

        Ok(track)
    }
}
