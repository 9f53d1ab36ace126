use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{read_manifest, render};
use crate::error::{Result, SlicerError};

/// Drop entries whose clip no longer exists next to the manifest.
///
/// The manifest is rewritten through a temporary file in the same directory
/// and renamed over the original. Returns the number of removed entries.
pub fn sync_manifest(manifest_path: &Path) -> Result<usize> {
    let dir = manifest_path
        .parent()
        .ok_or_else(|| SlicerError::Manifest(format!("no parent directory for {}", manifest_path.display())))?;

    let entries = read_manifest(manifest_path)?;
    let before = entries.len();
    let kept: Vec<_> = entries
        .into_iter()
        .filter(|entry| {
            let exists = dir.join(&entry.filename).is_file();
            if !exists {
                debug!("Removing entry for missing clip {}", entry.filename);
            }
            exists
        })
        .collect();
    let removed = before - kept.len();

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| SlicerError::filesystem(dir, e))?;
    tmp.write_all(render(&kept).as_bytes())
        .map_err(|e| SlicerError::filesystem(tmp.path(), e))?;
    tmp.persist(manifest_path)
        .map_err(|e| SlicerError::filesystem(manifest_path, e.error))?;

    info!("Synced {}: removed {} of {} entries", manifest_path.display(), removed, before);
    Ok(removed)
}
