use std::path::Path;

use crate::segment::Segment;

/// Characters not allowed in Windows filenames
pub const RESERVED_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Leaves room for a `_{n}` suffix and the extension within 255 characters
pub const MAX_STEM_CHARS: usize = 247;

const EXTENSION: &str = "wav";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingMode {
    /// `{start_ms}_{end_ms}.wav`, text recorded in the manifest
    Positional,
    /// Sanitized transcript text, text carried by the name itself
    Transcript,
}

impl NamingMode {
    pub fn from_flag(use_transcript_as_filename: bool) -> Self {
        if use_transcript_as_filename {
            NamingMode::Transcript
        } else {
            NamingMode::Positional
        }
    }

    pub fn writes_manifest(self) -> bool {
        matches!(self, NamingMode::Positional)
    }
}

/// Replace reserved characters with `_` and cap the length
pub fn sanitize_filename(text: &str) -> String {
    text.chars()
        .map(|c| if RESERVED_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_STEM_CHARS)
        .collect()
}

pub fn positional_filename(segment: &Segment) -> String {
    format!("{}_{}.{}", segment.start_ms, segment.end_ms, EXTENSION)
}

/// Picks output filenames for the segments of one recording directory
#[derive(Debug, Clone)]
pub struct FilenameResolver {
    mode: NamingMode,
}

impl FilenameResolver {
    pub fn new(mode: NamingMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> NamingMode {
        self.mode
    }

    /// Filename for `segment` that does not exist yet in `dir`.
    ///
    /// Transcript text is trimmed before sanitizing. Names that collide get
    /// `_1`, `_2`, ... appended. A segment with empty text falls back to its
    /// positional stem, under the same collision rule.
    pub fn resolve(&self, segment: &Segment, dir: &Path) -> String {
        match self.mode {
            NamingMode::Positional => positional_filename(segment),
            NamingMode::Transcript => {
                let mut stem = sanitize_filename(segment.text.trim());
                if stem.is_empty() {
                    stem = format!("{}_{}", segment.start_ms, segment.end_ms);
                }
                first_free_name(&stem, dir)
            }
        }
    }
}

fn first_free_name(stem: &str, dir: &Path) -> String {
    let candidate = format!("{}.{}", stem, EXTENSION);
    if !dir.join(&candidate).exists() {
        return candidate;
    }

    (1u64..)
        .map(|n| format!("{}_{}.{}", stem, n, EXTENSION))
        .find(|name| !dir.join(name).exists())
        .unwrap_or(candidate)
}
