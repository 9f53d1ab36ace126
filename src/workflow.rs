use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Result, SlicerError};
use crate::manifest::{sync_manifest, FilterReport, ManifestFilter};
use crate::media::{MediaProcessorFactory, MediaProcessorTrait};
use crate::splitter::{SplitReport, Splitter};

/// One subtitle/audio pair to split
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RecordingTask {
    pub subtitle_path: PathBuf,
    pub audio_path: PathBuf,
    /// Set when the audio has to be converted to WAV first
    pub needs_conversion: bool,
}

impl RecordingTask {
    /// Path of the WAV the splitter reads
    pub fn wav_path(&self) -> PathBuf {
        if self.needs_conversion {
            self.audio_path.with_extension("wav")
        } else {
            self.audio_path.clone()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub processed: Vec<SplitReport>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn segments(&self) -> usize {
        self.processed.iter().map(|report| report.segments).sum()
    }
}

/// Find every `.srt` under `input_dir` that has a sibling `.wav`, or failing
/// that a sibling with one of `convert_extensions`. Sorted by path.
pub fn discover_tasks(input_dir: &Path, convert_extensions: &[String]) -> Vec<RecordingTask> {
    let mut tasks = Vec::new();

    for entry in WalkDir::new(input_dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        let is_srt = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("srt"));
        if !entry.file_type().is_file() || !is_srt {
            continue;
        }

        let wav = path.with_extension("wav");
        if wav.is_file() {
            tasks.push(RecordingTask {
                subtitle_path: path.to_path_buf(),
                audio_path: wav,
                needs_conversion: false,
            });
            continue;
        }

        match convert_extensions
            .iter()
            .map(|ext| path.with_extension(ext))
            .find(|candidate| candidate.is_file())
        {
            Some(source) => tasks.push(RecordingTask {
                subtitle_path: path.to_path_buf(),
                audio_path: source,
                needs_conversion: true,
            }),
            None => warn!("No audio found for {}, skipping", path.display()),
        }
    }

    tasks.sort();
    tasks
}

/// Recording names shared by more than one task, with the audio files
/// involved. Output directories are keyed by name, so these would collide.
pub fn duplicate_recordings(tasks: &[RecordingTask]) -> BTreeMap<String, Vec<PathBuf>> {
    let mut by_name: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for task in tasks {
        if let Ok(name) = Splitter::recording_name(&task.audio_path) {
            by_name.entry(name).or_default().push(task.audio_path.clone());
        }
    }
    by_name.retain(|_, paths| paths.len() > 1);
    by_name
}

pub struct Workflow {
    config: Config,
    media: Box<dyn MediaProcessorTrait>,
    show_progress: bool,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        let media = MediaProcessorFactory::create_processor(config.media.clone());
        Self::with_media(config, media)
    }

    /// Build with a specific media processor implementation
    pub fn with_media(config: Config, media: Box<dyn MediaProcessorTrait>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            media,
            show_progress: true,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn splitter(&self) -> Splitter {
        Splitter::new(self.config.split.clone(), &self.config.manifest)
            .with_progress(self.show_progress)
    }

    /// Split a single subtitle/audio pair
    pub async fn split_single<P: AsRef<Path>>(
        &self,
        subtitle_path: P,
        audio_path: P,
        output_dir: P,
    ) -> Result<SplitReport> {
        let subtitle_path = subtitle_path.as_ref();
        let audio_path = audio_path.as_ref();

        for path in [subtitle_path, audio_path] {
            if !path.exists() {
                return Err(SlicerError::FileNotFound(path.display().to_string()));
            }
        }

        let is_wav = audio_path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
        let task = RecordingTask {
            subtitle_path: subtitle_path.to_path_buf(),
            audio_path: audio_path.to_path_buf(),
            needs_conversion: !is_wav,
        };

        fs::create_dir_all(output_dir.as_ref()).await?;
        self.process_task(&task, output_dir.as_ref()).await
    }

    /// Split every pair found under the configured input directory, in order
    pub async fn run_batch(&self) -> Result<BatchReport> {
        let input_dir = &self.config.batch.input_dir;
        let output_dir = &self.config.batch.output_dir;
        info!("Processing directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(SlicerError::Config(format!(
                "Input path is not a directory: {}",
                input_dir.display()
            )));
        }

        self.prepare_output_dir(output_dir).await?;

        let tasks = discover_tasks(input_dir, &self.config.media.convert_extensions);
        info!("Found {} recordings to process", tasks.len());

        for (name, paths) in duplicate_recordings(&tasks) {
            warn!(
                "{} recordings are named '{}' and share one output directory: {:?}",
                paths.len(),
                name,
                paths
            );
        }

        if tasks.iter().any(|task| task.needs_conversion) {
            self.media.check_availability().await?;
        }

        let mut report = BatchReport::default();
        for task in tasks {
            match self.process_task(&task, output_dir).await {
                Ok(split) => {
                    info!("Successfully processed: {}", task.subtitle_path.display());
                    report.processed.push(split);
                }
                Err(e) if self.config.batch.continue_on_error => {
                    warn!("Failed to process {}: {}", task.subtitle_path.display(), e);
                    report.failed.push((task.subtitle_path.clone(), e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Batch finished: {} recordings, {} segments, {} failures",
            report.processed.len(),
            report.segments(),
            report.failed.len()
        );
        Ok(report)
    }

    async fn prepare_output_dir(&self, output_dir: &Path) -> Result<()> {
        if output_dir.exists() && self.config.batch.clean_output {
            warn!("Output directory {} exists, removing it", output_dir.display());
            fs::remove_dir_all(output_dir)
                .await
                .map_err(|e| SlicerError::filesystem(output_dir, e))?;
        }
        fs::create_dir_all(output_dir)
            .await
            .map_err(|e| SlicerError::filesystem(output_dir, e))
    }

    async fn process_task(&self, task: &RecordingTask, output_dir: &Path) -> Result<SplitReport> {
        let wav_path = task.wav_path();
        let converted = task.needs_conversion && !wav_path.exists();

        if converted {
            self.media.transcode_to_wav(&task.audio_path, &wav_path).await?;
        }

        // Decoding and encoding are CPU bound; keep them off the runtime workers
        let splitter = self.splitter();
        let subtitle_path = task.subtitle_path.clone();
        let audio_path = wav_path.clone();
        let output_root = output_dir.to_path_buf();
        let result = tokio::task::spawn_blocking(move || {
            splitter.split_recording(&subtitle_path, &audio_path, &output_root)
        })
        .await
        .map_err(SlicerError::from)
        .and_then(|split| split);

        if converted && !self.config.media.keep_converted {
            if let Err(e) = fs::remove_file(&wav_path).await {
                warn!("Failed to remove converted audio {}: {}", wav_path.display(), e);
            }
        }

        result
    }

    /// Write a filtered copy of every recording's manifest under `target_dir`
    pub async fn filter_manifests<P: AsRef<Path>>(&self, target_dir: P) -> Result<FilterReport> {
        let filter = ManifestFilter::from_config(&self.config.manifest)?;
        let mut total = FilterReport::default();

        for dir in recording_dirs(target_dir.as_ref())? {
            let manifest = dir.join(&self.config.manifest.filename);
            if !manifest.is_file() {
                warn!("No manifest in {}, skipping", dir.display());
                continue;
            }
            let report = filter.filter_file(&manifest, &dir.join(&self.config.manifest.clean_filename))?;
            total.kept += report.kept;
            total.dropped_banned += report.dropped_banned;
            total.dropped_script += report.dropped_script;
        }

        Ok(total)
    }

    /// Remove entries pointing at deleted clips from every manifest under `target_dir`
    pub async fn sync_manifests<P: AsRef<Path>>(&self, target_dir: P, manifest_name: &str) -> Result<usize> {
        let mut removed = 0;

        for dir in recording_dirs(target_dir.as_ref())? {
            let manifest = dir.join(manifest_name);
            if !manifest.is_file() {
                warn!("No {} in {}, skipping", manifest_name, dir.display());
                continue;
            }
            removed += sync_manifest(&manifest)?;
        }

        Ok(removed)
    }
}

/// Immediate subdirectories of `target_dir`, sorted
fn recording_dirs(target_dir: &Path) -> Result<Vec<PathBuf>> {
    if !target_dir.is_dir() {
        return Err(SlicerError::Config(format!(
            "Target path is not a directory: {}",
            target_dir.display()
        )));
    }

    let mut dirs: Vec<PathBuf> = WalkDir::new(target_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .collect();
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;

    mock! {
        pub Media {}

        #[async_trait]
        impl MediaProcessorTrait for Media {
            async fn transcode_to_wav(&self, source_path: &Path, wav_path: &Path) -> Result<()>;
            async fn check_availability(&self) -> Result<()>;
        }
    }

    fn write_silence(path: &Path, millis: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..(millis * 8) {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn test_config(root: &Path) -> Config {
        let mut config = Config::default();
        config.batch.input_dir = root.join("input");
        config.batch.output_dir = root.join("output");
        config.split.target_sample_rate = None;
        config
    }

    const SRT: &str = "1\n00:00:00,000 --> 00:00:00,500\na\n\n2\n00:00:00,500 --> 00:00:01,000\nb\n";

    #[test]
    fn test_discover_prefers_wav_and_falls_back_to_flac() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("one.srt"), SRT).unwrap();
        std::fs::write(root.join("one.wav"), b"").unwrap();
        std::fs::write(root.join("one.flac"), b"").unwrap();
        std::fs::create_dir(root.join("sub")).unwrap();
        std::fs::write(root.join("sub/two.srt"), SRT).unwrap();
        std::fs::write(root.join("sub/two.flac"), b"").unwrap();
        std::fs::write(root.join("orphan.srt"), SRT).unwrap();

        let tasks = discover_tasks(root, &["flac".to_string()]);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].audio_path, root.join("one.wav"));
        assert!(!tasks[0].needs_conversion);
        assert_eq!(tasks[1].audio_path, root.join("sub/two.flac"));
        assert_eq!(tasks[1].wav_path(), root.join("sub/two.wav"));
    }

    #[test]
    fn test_duplicate_recording_names_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for sub in ["a", "b"] {
            std::fs::create_dir(root.join(sub)).unwrap();
            std::fs::write(root.join(sub).join("talk.srt"), SRT).unwrap();
            std::fs::write(root.join(sub).join("talk.wav"), b"").unwrap();
        }
        std::fs::write(root.join("other.srt"), SRT).unwrap();
        std::fs::write(root.join("other.wav"), b"").unwrap();

        let tasks = discover_tasks(root, &[]);
        assert_eq!(tasks.len(), 3);

        let duplicates = duplicate_recordings(&tasks);
        assert_eq!(duplicates.len(), 1);
        assert_eq!(
            duplicates["talk"],
            vec![root.join("a/talk.wav"), root.join("b/talk.wav")]
        );
    }

    #[tokio::test]
    async fn test_split_single_writes_clips() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("talk.srt"), SRT).unwrap();
        write_silence(&root.join("talk.wav"), 1000);

        let workflow = Workflow::with_media(test_config(root), Box::new(MockMedia::new()))
            .unwrap()
            .with_progress(false);
        let report = workflow
            .split_single(root.join("talk.srt"), root.join("talk.wav"), root.join("out"))
            .await
            .unwrap();

        assert_eq!(report.segments, 1);
        assert!(root.join("out/talk/0_1000.wav").is_file());
    }

    #[tokio::test]
    async fn test_split_single_missing_audio_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("talk.srt"), SRT).unwrap();

        let workflow = Workflow::with_media(test_config(root), Box::new(MockMedia::new())).unwrap();
        let err = workflow
            .split_single(root.join("talk.srt"), root.join("talk.wav"), root.join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, SlicerError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_batch_converts_flac_and_removes_intermediate() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(&config.batch.input_dir).unwrap();
        std::fs::write(config.batch.input_dir.join("talk.srt"), SRT).unwrap();
        std::fs::write(config.batch.input_dir.join("talk.flac"), b"fake").unwrap();

        let mut media = MockMedia::new();
        media.expect_check_availability().times(1).returning(|| Ok(()));
        media
            .expect_transcode_to_wav()
            .times(1)
            .returning(|_, wav_path| {
                write_silence(wav_path, 1000);
                Ok(())
            });

        let workflow = Workflow::with_media(config.clone(), Box::new(media))
            .unwrap()
            .with_progress(false);
        let report = workflow.run_batch().await.unwrap();

        assert_eq!(report.processed.len(), 1);
        assert_eq!(report.segments(), 1);
        let out = config.batch.output_dir.join("talk");
        assert!(out.join("0_1000.wav").is_file());
        assert_eq!(std::fs::read_to_string(out.join("mapping.list")).unwrap(), "0_1000.wav|a, b\n");
        assert!(!config.batch.input_dir.join("talk.wav").exists());
    }

    #[tokio::test]
    async fn test_batch_failure_policy() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        std::fs::create_dir_all(&config.batch.input_dir).unwrap();
        // Subtitle runs past the end of the audio
        std::fs::write(config.batch.input_dir.join("a.srt"), "1\n00:00:00,000 --> 00:00:05,000\nx\n").unwrap();
        write_silence(&config.batch.input_dir.join("a.wav"), 1000);
        std::fs::write(config.batch.input_dir.join("b.srt"), SRT).unwrap();
        write_silence(&config.batch.input_dir.join("b.wav"), 1000);

        let workflow = Workflow::with_media(config.clone(), Box::new(MockMedia::new()))
            .unwrap()
            .with_progress(false);
        let err = workflow.run_batch().await.unwrap_err();
        assert!(matches!(err, SlicerError::Recording { ref name, .. } if name == "a"));

        config.batch.continue_on_error = true;
        let workflow = Workflow::with_media(config.clone(), Box::new(MockMedia::new()))
            .unwrap()
            .with_progress(false);
        let report = workflow.run_batch().await.unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.processed.len(), 1);
        // The failed recording never got a manifest
        assert!(!config.batch.output_dir.join("a").join("mapping.list").exists());
    }

    #[tokio::test]
    async fn test_filter_and_sync_over_recording_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for name in ["r1", "r2"] {
            std::fs::create_dir(root.join(name)).unwrap();
            std::fs::write(root.join(name).join("0_1.wav"), b"").unwrap();
            std::fs::write(
                root.join(name).join("mapping.list"),
                "0_1.wav|keep\n1_2.wav|spam\n",
            )
            .unwrap();
        }

        let mut config = Config::default();
        config.manifest.ban_file = Some(root.join("ban.txt"));
        std::fs::write(root.join("ban.txt"), "spam\n").unwrap();
        let workflow = Workflow::with_media(config, Box::new(MockMedia::new())).unwrap();

        let report = workflow.filter_manifests(root).await.unwrap();
        assert_eq!(report.kept, 2);
        assert_eq!(report.dropped_banned, 2);
        assert!(root.join("r1/clean_mapping.list").is_file());

        let removed = workflow.sync_manifests(root, "mapping.list").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(std::fs::read_to_string(root.join("r2/mapping.list")).unwrap(), "0_1.wav|keep\n");
    }
}
