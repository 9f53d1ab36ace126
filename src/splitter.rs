//! Segmentation of one recording.
//!
//! Cues are fed to the [`SegmentMerger`] in file order. Every segment it
//! emits is extracted, named and written before the next cue is fed, and the
//! manifest is committed only after the last segment succeeded.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::audio::{AudioExtractor, ExtractOptions, Waveform};
use crate::config::{ManifestConfig, SplitConfig};
use crate::error::{Result, SlicerError};
use crate::manifest::{ManifestEntry, ManifestWriter};
use crate::naming::{FilenameResolver, NamingMode};
use crate::segment::{Segment, SegmentMerger};
use crate::subtitle::{format_srt_time, read_srt};

/// Outcome of splitting one recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReport {
    pub recording: String,
    pub output_dir: PathBuf,
    pub cues: usize,
    pub segments: usize,
    pub manifest_entries: usize,
}

pub struct Splitter {
    config: SplitConfig,
    manifest_filename: String,
    show_progress: bool,
}

impl Splitter {
    pub fn new(config: SplitConfig, manifest: &ManifestConfig) -> Self {
        Self {
            config,
            manifest_filename: manifest.filename.clone(),
            show_progress: true,
        }
    }

    /// Enable or disable the per-cue progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Name of the output subdirectory for an audio file (its stem)
    pub fn recording_name(audio_path: &Path) -> Result<String> {
        audio_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| SlicerError::Config(format!("Invalid audio filename: {}", audio_path.display())))
    }

    /// Split `audio_path` by the cues of `subtitle_path` into `{output_root}/{recording}/`
    pub fn split_recording(
        &self,
        subtitle_path: &Path,
        audio_path: &Path,
        output_root: &Path,
    ) -> Result<SplitReport> {
        let name = Self::recording_name(audio_path)?;
        self.run(subtitle_path, audio_path, output_root, &name)
            .map_err(|e| e.in_recording(name))
    }

    fn run(
        &self,
        subtitle_path: &Path,
        audio_path: &Path,
        output_root: &Path,
        name: &str,
    ) -> Result<SplitReport> {
        info!("Splitting recording {}", name);

        let cues = read_srt(subtitle_path, self.config.subtitle_offset_seconds)?;
        let waveform = Waveform::load(audio_path)?;

        let output_dir = output_root.join(name);
        std::fs::create_dir_all(&output_dir)
            .map_err(|e| SlicerError::filesystem(&output_dir, e))?;

        let extractor = AudioExtractor::new(&waveform, ExtractOptions::from(&self.config));
        let resolver = FilenameResolver::new(NamingMode::from_flag(self.config.use_transcript_as_filename));
        let mut manifest = resolver
            .mode()
            .writes_manifest()
            .then(|| ManifestWriter::new(output_dir.join(&self.manifest_filename)));

        let progress = self.progress_bar(cues.len() as u64, name);
        let cue_count = cues.len();
        let mut merger = SegmentMerger::new();
        let mut segments = 0;

        for cue in cues {
            if let Some(segment) = merger.feed(cue) {
                self.emit(&segment, &extractor, &resolver, &output_dir, manifest.as_mut())?;
                segments += 1;
            }
            progress.inc(1);
        }
        if let Some(segment) = merger.flush() {
            self.emit(&segment, &extractor, &resolver, &output_dir, manifest.as_mut())?;
            segments += 1;
        }
        progress.finish_and_clear();

        let manifest_entries = match manifest {
            Some(writer) => writer.commit()?,
            None => 0,
        };

        info!("Recording {}: {} cues -> {} segments", name, cue_count, segments);
        Ok(SplitReport {
            recording: name.to_string(),
            output_dir,
            cues: cue_count,
            segments,
            manifest_entries,
        })
    }

    fn emit(
        &self,
        segment: &Segment,
        extractor: &AudioExtractor<'_>,
        resolver: &FilenameResolver,
        output_dir: &Path,
        manifest: Option<&mut ManifestWriter>,
    ) -> Result<()> {
        let clip = extractor.extract_segment(segment).map_err(|e| match e {
            SlicerError::Extraction(message) => SlicerError::Extraction(format!(
                "segment {} --> {}: {}",
                format_srt_time(segment.start_ms),
                format_srt_time(segment.end_ms),
                message
            )),
            other => other,
        })?;

        let filename = resolver.resolve(segment, output_dir);
        clip.write_wav(output_dir.join(&filename))?;
        debug!("Wrote {} ({} ms): {}", filename, segment.duration_ms(), segment.text);

        if let Some(manifest) = manifest {
            manifest.push(ManifestEntry::new(filename, segment.text.clone()))?;
        }
        Ok(())
    }

    fn progress_bar(&self, len: u64, name: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} cues")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(format!("Processing {}", name));
        pb
    }
}
