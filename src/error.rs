use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlicerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Subtitle parse error in block {block}: {message}")]
    Parse { block: usize, message: String },

    #[error("Audio extraction error: {0}")]
    Extraction(String),

    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Recording '{name}' failed: {source}")]
    Recording {
        name: String,
        #[source]
        source: Box<SlicerError>,
    },

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SlicerError {
    pub fn parse<S: Into<String>>(block: usize, message: S) -> Self {
        SlicerError::Parse {
            block,
            message: message.into(),
        }
    }

    pub fn filesystem<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        SlicerError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Attach the recording name to an error raised while processing it
    pub fn in_recording<S: Into<String>>(self, name: S) -> Self {
        match self {
            already @ SlicerError::Recording { .. } => already,
            other => SlicerError::Recording {
                name: name.into(),
                source: Box::new(other),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, SlicerError>;
