use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use crate::config::MediaConfig;
use crate::error::{Result, SlicerError};
use super::{MediaProcessorTrait, MediaCommandBuilder};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);

        Self { command_builder }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn transcode_to_wav(&self, source_path: &Path, wav_path: &Path) -> Result<()> {
        info!("Converting {} to {}", source_path.display(), wav_path.display());

        let command = self.command_builder.transcode_to_wav(source_path, wav_path);
        command.execute().await?;

        info!("Audio conversion completed");
        Ok(())
    }

    async fn check_availability(&self) -> Result<()> {
        self.command_builder
            .version_check()
            .execute()
            .await
            .map_err(|e| SlicerError::Media(format!("Media processor not found: {}", e)))?;

        info!("Media processor is available");
        Ok(())
    }
}
