// Clip-to-transcript manifests (`filename|text` per line)
//
// - Writer: buffers one recording's entries and appends them in one write
// - Filter: drops banned or wrong-script entries into a clean copy
// - Sync: drops entries whose clip file is gone, rewriting in place

pub mod filter;
pub mod sync;

pub use filter::{FilterReport, ManifestFilter};
pub use sync::sync_manifest;

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, SlicerError};

pub const FIELD_SEPARATOR: char = '|';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub filename: String,
    pub text: String,
}

impl ManifestEntry {
    pub fn new<S1: Into<String>, S2: Into<String>>(filename: S1, text: S2) -> Self {
        Self {
            filename: filename.into(),
            text: text.into(),
        }
    }

    /// Split a line on its first `|`. Filenames never contain `|`, so any
    /// further separators belong to the text.
    pub fn parse_line(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\n', '\r']);
        let (filename, text) = line
            .split_once(FIELD_SEPARATOR)
            .ok_or_else(|| SlicerError::Manifest(format!("line has no '|': {:?}", line)))?;
        Ok(Self::new(filename, text))
    }
}

impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.filename, FIELD_SEPARATOR, self.text)
    }
}

/// Read every entry of a manifest file, skipping blank lines
pub fn read_manifest<P: AsRef<Path>>(path: P) -> Result<Vec<ManifestEntry>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| SlicerError::filesystem(path, e))?;

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(ManifestEntry::parse_line)
        .collect()
}

pub(crate) fn render(entries: &[ManifestEntry]) -> String {
    entries.iter().map(|entry| format!("{}\n", entry)).collect()
}

/// Buffers the entries of one recording until [`commit`](Self::commit).
///
/// Nothing touches disk before commit, so a recording that fails midway
/// leaves no partial manifest behind.
#[derive(Debug)]
pub struct ManifestWriter {
    path: PathBuf,
    entries: Vec<ManifestEntry>,
}

impl ManifestWriter {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queue an entry; text with line breaks would corrupt the line format
    pub fn push(&mut self, entry: ManifestEntry) -> Result<()> {
        if entry.text.contains(['\n', '\r']) {
            return Err(SlicerError::Manifest(format!(
                "text for {} contains a line break",
                entry.filename
            )));
        }
        if entry.filename.contains(FIELD_SEPARATOR) {
            return Err(SlicerError::Manifest(format!(
                "filename {:?} contains '{}'",
                entry.filename, FIELD_SEPARATOR
            )));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Append all queued entries to the manifest file in a single write
    pub fn commit(self) -> Result<usize> {
        if self.entries.is_empty() {
            return Ok(0);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SlicerError::filesystem(&self.path, e))?;
        file.write_all(render(&self.entries).as_bytes())
            .map_err(|e| SlicerError::filesystem(&self.path, e))?;

        info!("Wrote {} manifest entries to {}", self.entries.len(), self.path.display());
        Ok(self.entries.len())
    }
}
