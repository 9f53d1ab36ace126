use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, SlicerError};

fn default_target_sample_rate() -> Option<u32> {
    Some(44100)
}

fn default_true() -> bool {
    true
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("input")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_binary_path() -> String {
    "ffmpeg".to_string()
}

fn default_convert_extensions() -> Vec<String> {
    vec!["flac".to_string()]
}

fn default_manifest_filename() -> String {
    "mapping.list".to_string()
}

fn default_clean_filename() -> String {
    "clean_mapping.list".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub split: SplitConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub manifest: ManifestConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Output sample rate; `None` keeps the source rate
    #[serde(default = "default_target_sample_rate")]
    pub target_sample_rate: Option<u32>,
    /// Collapse all channels into one
    #[serde(default)]
    pub mono_downmix: bool,
    /// Name clips after their transcript instead of their time range
    #[serde(default)]
    pub use_transcript_as_filename: bool,
    /// Shift applied to every subtitle timestamp, in seconds
    #[serde(default)]
    pub subtitle_offset_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Directory searched for subtitle/audio pairs
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    /// Root of the per-recording output directories
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Remove an existing output directory before the batch starts
    #[serde(default = "default_true")]
    pub clean_output: bool,
    /// Keep going when one recording fails
    #[serde(default)]
    pub continue_on_error: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Manifest written next to the clips in positional mode
    #[serde(default = "default_manifest_filename")]
    pub filename: String,
    /// Output of the manifest filter
    #[serde(default = "default_clean_filename")]
    pub clean_filename: String,
    /// File with one banned phrase per line
    #[serde(default)]
    pub ban_file: Option<PathBuf>,
    /// Banned phrases must equal the whole text (otherwise substring match)
    #[serde(default = "default_true")]
    pub full_match: bool,
    /// Drop entries whose text contains Latin letters
    #[serde(default)]
    pub filter_latin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    #[serde(default = "default_binary_path")]
    pub binary_path: String,
    /// Source extensions converted to WAV before splitting
    /// Common values: ["flac", "mp3", "m4a", "ogg"]
    #[serde(default = "default_convert_extensions")]
    pub convert_extensions: Vec<String>,
    /// Keep the intermediate WAV produced by conversion
    #[serde(default)]
    pub keep_converted: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: default_target_sample_rate(),
            mono_downmix: false,
            use_transcript_as_filename: false,
            subtitle_offset_seconds: 0.0,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            clean_output: true,
            continue_on_error: false,
        }
    }
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            filename: default_manifest_filename(),
            clean_filename: default_clean_filename(),
            ban_file: None,
            full_match: true,
            filter_latin: false,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: default_binary_path(),
            convert_extensions: default_convert_extensions(),
            keep_converted: false,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SlicerError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| SlicerError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SlicerError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SlicerError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.split.target_sample_rate == Some(0) {
            return Err(SlicerError::Config("target_sample_rate must be positive".to_string()));
        }
        if !self.split.subtitle_offset_seconds.is_finite() {
            return Err(SlicerError::Config("subtitle_offset_seconds must be finite".to_string()));
        }
        if self.manifest.filename.is_empty() || self.manifest.filename.contains(['/', '\\']) {
            return Err(SlicerError::Config(format!(
                "Invalid manifest filename: '{}'",
                self.manifest.filename
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.split.target_sample_rate, Some(44100));
        assert!(!config.split.mono_downmix);
        assert!(!config.split.use_transcript_as_filename);
        assert_eq!(config.split.subtitle_offset_seconds, 0.0);
        assert_eq!(config.manifest.filename, "mapping.list");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            "[split]\nmono_downmix = true\nsubtitle_offset_seconds = 1.5\n",
        )
        .unwrap();
        assert!(config.split.mono_downmix);
        assert_eq!(config.split.subtitle_offset_seconds, 1.5);
        assert_eq!(config.split.target_sample_rate, Some(44100));
        assert_eq!(config.batch.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_partial_sections_fill_missing_fields() {
        let config: Config = toml::from_str(
            "[batch]\ncontinue_on_error = true\n\n[media]\nkeep_converted = true\n",
        )
        .unwrap();
        assert!(config.batch.continue_on_error);
        assert_eq!(config.batch.input_dir, PathBuf::from("input"));
        assert_eq!(config.batch.output_dir, PathBuf::from("output"));
        assert!(config.batch.clean_output);
        assert!(config.media.keep_converted);
        assert_eq!(config.media.binary_path, "ffmpeg");
        assert_eq!(config.media.convert_extensions, vec!["flac".to_string()]);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.split.use_transcript_as_filename = true;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert!(loaded.split.use_transcript_as_filename);
    }

    #[test]
    fn test_validate_rejects_zero_sample_rate() {
        let mut config = Config::default();
        config.split.target_sample_rate = Some(0);
        assert!(matches!(config.validate(), Err(SlicerError::Config(_))));
    }
}
