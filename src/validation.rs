//! Round-trip validation of written databases

use crate::tcd::{Tag, INDEX_FILENAME};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Compare every database file in `input_dir` against its counterpart in
/// `output_dir`, byte for byte. Returns true when all eleven files match.
pub fn compare_databases(input_dir: &Path, output_dir: &Path) -> Result<bool> {
    let mut filenames = vec![INDEX_FILENAME];
    filenames.extend(Tag::FILE_BACKED.iter().filter_map(|t| t.data_filename()));

    let mut all_match = true;
    for filename in filenames {
        let original = input_dir.join(filename);
        let written = output_dir.join(filename);

        if !original.exists() {
            log::warn!("original file not found for comparison: {:?}", original);
            continue;
        }
        if !written.exists() {
            log::error!("written file not found for comparison: {:?}", written);
            all_match = false;
            continue;
        }

        let original_bytes = fs::read(&original)
            .with_context(|| format!("Failed to read {:?}", original))?;
        let written_bytes =
            fs::read(&written).with_context(|| format!("Failed to read {:?}", written))?;

        if original_bytes == written_bytes {
            log::info!("{} matches original ({} bytes)", filename, written_bytes.len());
        } else {
            log::error!(
                "{} differs from original ({} vs {} bytes)",
                filename,
                original_bytes.len(),
                written_bytes.len()
            );
            all_match = false;
        }
    }

    Ok(all_match)
}
