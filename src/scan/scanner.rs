//! Parallel directory scan

use super::reader::TagReader;
use crate::model::TrackMetadata;
use crate::progress::{ProgressEvent, ProgressSink};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use walkdir::WalkDir;

/// Extensions indexed when the caller does not override the set.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "wav", "ape", "wv", "m4a", "mp4", "mpc",
];

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Lowercased extensions to index
    pub extensions: Vec<String>,

    /// Worker pool width for tag decoding
    pub workers: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            workers: num_cpus::get(),
        }
    }
}

/// Walk `root` recursively and decode every matching audio file on a worker
/// pool of `options.workers` threads.
///
/// Results arrive in completion order; callers that need a deterministic
/// ordering must sort the returned list themselves. A file that fails to
/// decode is logged and skipped, never fatal.
pub fn scan_music_directory<R: TagReader>(
    root: &Path,
    reader: &R,
    options: &ScanOptions,
    progress: &dyn ProgressSink,
) -> Result<Vec<TrackMetadata>> {
    let paths = collect_audio_paths(root, &options.extensions)?;
    let total = paths.len();

    progress.emit(ProgressEvent::Message(format!(
        "Found {} music files under {:?}",
        total, root
    )));
    if total == 0 {
        return Ok(Vec::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .build()
        .context("Failed to build scan worker pool")?;

    let done = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel();

    pool.install(|| {
        paths.par_iter().for_each_with(tx, |tx, path| {
            match reader.read(path) {
                Ok(track) => {
                    // A dropped receiver just means the caller stopped
                    // listening; finish quietly.
                    let _ = tx.send(track);
                }
                Err(e) => {
                    log::warn!("skipping unreadable file {:?}: {:#}", path, e);
                }
            }
            let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
            progress.emit(ProgressEvent::Progress((finished * 100 / total) as u8));
        });
    });

    Ok(rx.into_iter().collect())
}

fn collect_audio_paths(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        anyhow::bail!("music directory does not exist: {:?}", root);
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.with_context(|| format!("Failed to walk directory: {:?}", root))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .is_some_and(|e| extensions.iter().any(|want| *want == e));
        if matches {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopProgress;
    use std::fs;
    use tempfile::TempDir;

    struct PathOnlyReader;

    impl TagReader for PathOnlyReader {
        fn read(&self, path: &Path) -> Result<TrackMetadata> {
            if path.file_name().is_some_and(|n| n == "broken.mp3") {
                anyhow::bail!("unreadable");
            }
            Ok(TrackMetadata::new(
                path.to_string_lossy().into_owned(),
                0,
                0,
            ))
        }
    }

    #[test]
    fn scan_filters_by_extension_and_survives_bad_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.mp3"), b"x").unwrap();
        fs::write(dir.path().join("sub/b.FLAC"), b"x").unwrap();
        fs::write(dir.path().join("broken.mp3"), b"x").unwrap();
        fs::write(dir.path().join("cover.jpg"), b"x").unwrap();

        let options = ScanOptions {
            workers: 2,
            ..Default::default()
        };
        let mut tracks =
            scan_music_directory(dir.path(), &PathOnlyReader, &options, &NoopProgress).unwrap();
        tracks.sort_by(|a, b| a.path.cmp(&b.path));

        let names: Vec<&str> = tracks
            .iter()
            .map(|t| t.path.rsplit('/').next().unwrap())
            .collect();
        assert_eq!(names, vec!["a.mp3", "b.FLAC"]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let result = scan_music_directory(
            &missing,
            &PathOnlyReader,
            &ScanOptions::default(),
            &NoopProgress,
        );
        assert!(result.is_err());
    }
}
