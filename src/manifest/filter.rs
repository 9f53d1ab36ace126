use std::path::Path;
use tracing::{info, warn};

use super::{read_manifest, render, ManifestEntry};
use crate::config::ManifestConfig;
use crate::error::{Result, SlicerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterReport {
    pub kept: usize,
    pub dropped_banned: usize,
    pub dropped_script: usize,
}

/// Text-only filter over manifest entries
#[derive(Debug, Clone, Default)]
pub struct ManifestFilter {
    banned_phrases: Vec<String>,
    full_match: bool,
    filter_latin: bool,
}

impl ManifestFilter {
    pub fn new(banned_phrases: Vec<String>, full_match: bool, filter_latin: bool) -> Self {
        let banned_phrases = banned_phrases
            .into_iter()
            .map(|phrase| phrase.trim().to_string())
            .filter(|phrase| !phrase.is_empty())
            .collect();

        Self {
            banned_phrases,
            full_match,
            filter_latin,
        }
    }

    /// Build from config, reading the ban file when one is configured and present
    pub fn from_config(config: &ManifestConfig) -> Result<Self> {
        let phrases = match &config.ban_file {
            Some(path) if path.exists() => load_banned_phrases(path)?,
            Some(path) => {
                warn!("Ban file {} not found, no phrases banned", path.display());
                Vec::new()
            }
            None => Vec::new(),
        };
        Ok(Self::new(phrases, config.full_match, config.filter_latin))
    }

    pub fn is_banned(&self, text: &str) -> bool {
        if self.full_match {
            self.banned_phrases.iter().any(|phrase| phrase == text)
        } else {
            self.banned_phrases.iter().any(|phrase| text.contains(phrase.as_str()))
        }
    }

    pub fn has_foreign_script(&self, text: &str) -> bool {
        self.filter_latin && text.chars().any(|c| c.is_ascii_alphabetic())
    }

    /// Split entries into the kept list and a report of what was dropped
    pub fn apply(&self, entries: Vec<ManifestEntry>) -> (Vec<ManifestEntry>, FilterReport) {
        let mut report = FilterReport::default();
        let mut kept = Vec::with_capacity(entries.len());

        for entry in entries {
            if self.has_foreign_script(&entry.text) {
                info!("drop non-target script text: {}", entry.text);
                report.dropped_script += 1;
            } else if self.is_banned(&entry.text) {
                info!("drop banned text: {}", entry.text);
                report.dropped_banned += 1;
            } else {
                kept.push(entry);
            }
        }

        report.kept = kept.len();
        (kept, report)
    }

    /// Filter `manifest_path` into `output_path`, leaving the source untouched
    pub fn filter_file(&self, manifest_path: &Path, output_path: &Path) -> Result<FilterReport> {
        let entries = read_manifest(manifest_path)?;
        let (kept, report) = self.apply(entries);

        std::fs::write(output_path, render(&kept))
            .map_err(|e| SlicerError::filesystem(output_path, e))?;

        info!(
            "Filtered {}: kept {}, dropped {} banned and {} by script",
            manifest_path.display(),
            report.kept,
            report.dropped_banned,
            report.dropped_script
        );
        Ok(report)
    }
}

pub fn load_banned_phrases(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SlicerError::filesystem(path, e))?;
    Ok(content.lines().map(|line| line.trim().to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<ManifestEntry> {
        vec![
            ManifestEntry::new("1.wav", "こんにちは"),
            ManifestEntry::new("2.wav", "ありがとう"),
            ManifestEntry::new("3.wav", "OK です"),
            ManifestEntry::new("4.wav", "ありがとうございます"),
        ]
    }

    #[test]
    fn test_full_match_only_drops_exact_text() {
        let filter = ManifestFilter::new(vec!["ありがとう".to_string(), "".to_string()], true, false);
        let (kept, report) = filter.apply(entries());
        assert_eq!(kept.len(), 3);
        assert_eq!(report.dropped_banned, 1);
        assert!(kept.iter().any(|e| e.filename == "4.wav"));
    }

    #[test]
    fn test_substring_match_drops_containing_text() {
        let filter = ManifestFilter::new(vec!["ありがとう".to_string()], false, false);
        let (kept, report) = filter.apply(entries());
        assert_eq!(report.dropped_banned, 2);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_empty_ban_lines_never_match_everything() {
        let filter = ManifestFilter::new(vec!["  ".to_string()], false, false);
        let (kept, _) = filter.apply(entries());
        assert_eq!(kept.len(), 4);
    }

    #[test]
    fn test_latin_filter() {
        let filter = ManifestFilter::new(Vec::new(), true, true);
        let (kept, report) = filter.apply(entries());
        assert_eq!(report.dropped_script, 1);
        assert!(kept.iter().all(|e| e.filename != "3.wav"));
    }

    #[test]
    fn test_filter_file_writes_clean_copy() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("mapping.list");
        let output = dir.path().join("clean_mapping.list");
        std::fs::write(&source, "a.wav|keep\nb.wav|drop\n").unwrap();

        let filter = ManifestFilter::new(vec!["drop".to_string()], true, false);
        let report = filter.filter_file(&source, &output).unwrap();

        assert_eq!(report.kept, 1);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "a.wav|keep\n");
        assert_eq!(std::fs::read_to_string(&source).unwrap(), "a.wav|keep\nb.wav|drop\n");
    }
}
