//! Main build pipeline orchestration

use super::builder::build_index;
use super::carryover::carry_over_player_state;
use super::config::BuildConfig;
use crate::genre::{canonicalize_genres, load_genre_map};
use crate::model::TrackMetadata;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::scan::{scan_music_directory, ScanOptions, TagReader};
use crate::tcd::{write_database, IndexFile, SortMap, Tag};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Summary returned to the caller for reporting.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Number of tracks indexed
    pub track_count: usize,

    /// Entry count per tag file, in tag-index order
    pub tag_entry_counts: Vec<(Tag, usize)>,

    /// Records the carry-over could not match, when a prior database was
    /// supplied
    pub unmatched_carryover: Option<usize>,
}

/// The complete scan -> build -> canonicalize -> carry-over -> write flow.
pub struct BuildPipeline<R: TagReader> {
    config: BuildConfig,
    reader: R,
}

impl<R: TagReader> BuildPipeline<R> {
    pub fn new(config: BuildConfig, reader: R) -> Self {
        Self { config, reader }
    }

    pub fn run(&self, progress: &dyn ProgressSink) -> Result<BuildReport> {
        log::info!("Building database from {:?}", self.config.music_dir);

        // Step 1: scan and extract metadata in parallel
        let scan_options = ScanOptions {
            extensions: self.config.extensions.clone(),
            workers: self.config.workers.unwrap_or_else(num_cpus::get),
        };
        let mut tracks = scan_music_directory(
            &self.config.music_dir,
            &self.reader,
            &scan_options,
            progress,
        )?;

        // Worker completion order is arbitrary; sort for a deterministic
        // database.
        tracks.sort_by(|a, b| a.path.cmp(&b.path));

        // Step 2: rewrite source paths to device paths
        for track in &mut tracks {
            track.path = device_path(
                Path::new(&track.path),
                &self.config.music_dir,
                &self.config.device_prefix,
            )?;
        }

        progress.emit(ProgressEvent::Message(format!(
            "Building database for {} tracks",
            tracks.len()
        )));

        // Step 3: construct the in-memory database
        let mut index = build_index(&tracks);

        // Step 4: optional genre canonicalization
        if let Some(genre_file) = &self.config.genre_file {
            progress.emit(ProgressEvent::Message(
                "Canonicalizing genres...".to_string(),
            ));
            let map = load_genre_map(genre_file, self.config.genre_threshold)
                .with_context(|| format!("Failed to load genre file: {:?}", genre_file))?;
            let modified = canonicalize_genres(&mut index, &map)?;
            log::info!("canonicalized genres on {} records", modified);
        }

        // Step 5: optional player-state carry-over
        let mut unmatched_carryover = None;
        if let Some(old_db_dir) = &self.config.old_db_dir {
            progress.emit(ProgressEvent::Message(
                "Carrying over player state...".to_string(),
            ));
            let old_index = IndexFile::load_dir(old_db_dir, None)
                .with_context(|| format!("Failed to load prior database: {:?}", old_db_dir))?;
            let unmatched = carry_over_player_state(&old_index, &mut index);
            if unmatched > 0 {
                log::info!("{} records had no prior counterpart", unmatched);
            }
            unmatched_carryover = Some(unmatched);
        }

        // Step 6: deterministic title ordering for duplicate titles
        let sort_map = title_sort_map(&tracks);

        // Step 7: write everything out
        progress.emit(ProgressEvent::Message(
            "Writing database files...".to_string(),
        ));
        write_database(&mut index, &self.config.output_dir, true, Some(&sort_map))
            .with_context(|| format!("Failed to write database to {:?}", self.config.output_dir))?;
        progress.emit(ProgressEvent::Progress(100));

        let tag_entry_counts = index
            .tag_files
            .iter()
            .map(|(tag, file)| (tag, file.len()))
            .collect();

        Ok(BuildReport {
            track_count: tracks.len(),
            tag_entry_counts,
            unmatched_carryover,
        })
    }
}

/// Map a scanned path to its on-device form: the path relative to the music
/// directory, under the device prefix, with forward slashes.
fn device_path(source: &Path, music_dir: &Path, device_prefix: &str) -> Result<String> {
    let relative = source
        .strip_prefix(music_dir)
        .with_context(|| format!("{:?} is not under the music directory", source))?;

    let mut parts = vec![device_prefix.trim_end_matches('/').to_string()];
    for component in relative.components() {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }
    Ok(parts.join("/"))
}

/// Tie-break sub-map for the title tag file.
///
/// Only titles that collide case-folded get an entry; their sort key stays
/// the lowercased title first, with the track path appended behind a NUL
/// so colliding entries order deterministically among themselves while
/// everything else still sorts by case-folded payload.
fn title_sort_map(tracks: &[TrackMetadata]) -> SortMap {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for track in tracks {
        if let Some(title) = &track.title {
            *counts.entry(title.to_lowercase()).or_insert(0) += 1;
        }
    }

    let mut titles = HashMap::new();
    for track in tracks {
        let Some(title) = &track.title else { continue };
        if counts[&title.to_lowercase()] < 2 {
            continue;
        }
        titles
            .entry(title.clone())
            .or_insert_with(|| format!("{}\u{0}{}", title.to_lowercase(), track.path));
    }

    let mut sort_map = SortMap::new();
    sort_map.insert(Tag::Title, titles);
    sort_map
}
