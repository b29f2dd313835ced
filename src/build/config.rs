//! Build configuration

use crate::scan::DEFAULT_EXTENSIONS;
use std::path::PathBuf;

/// Configuration for the database build pipeline.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Directory containing the music files to index
    pub music_dir: PathBuf,

    /// Path prefix of the music directory as seen by the device
    /// (e.g. "/Music")
    pub device_prefix: String,

    /// Directory receiving the database files
    pub output_dir: PathBuf,

    /// Optional genre hierarchy for canonicalization
    pub genre_file: Option<PathBuf>,

    /// Roll-up threshold for the genre hierarchy
    pub genre_threshold: usize,

    /// Optional prior database to carry per-track player state from
    pub old_db_dir: Option<PathBuf>,

    /// Worker pool width (None = logical core count)
    pub workers: Option<usize>,

    /// Lowercased extensions to index
    pub extensions: Vec<String>,
}

impl BuildConfig {
    pub fn new(
        music_dir: impl Into<PathBuf>,
        device_prefix: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            music_dir: music_dir.into(),
            device_prefix: device_prefix.into(),
            output_dir: output_dir.into(),
            genre_file: None,
            genre_threshold: 0,
            old_db_dir: None,
            workers: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_genre_file(mut self, path: impl Into<PathBuf>, threshold: usize) -> Self {
        self.genre_file = Some(path.into());
        self.genre_threshold = threshold;
        self
    }

    pub fn with_old_db(mut self, dir: impl Into<PathBuf>) -> Self {
        self.old_db_dir = Some(dir.into());
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }
}
