use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::SplitConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Clip options shared by `split` and `batch`; unset flags keep the config value
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct AudioArgs {
    /// Sample rate for output clips
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Keep the source sample rate
    #[arg(long, conflicts_with = "sample_rate")]
    pub keep_sample_rate: bool,

    /// Convert clips to mono
    #[arg(long)]
    pub mono: bool,

    /// Use subtitle text as clip filename instead of the time range
    #[arg(long)]
    pub use_transcript_as_filename: bool,

    /// Subtitle offset in seconds
    #[arg(long, allow_hyphen_values = true)]
    pub subtitle_offset: Option<f64>,
}

impl AudioArgs {
    pub fn apply(&self, split: &mut SplitConfig) {
        if let Some(rate) = self.sample_rate {
            split.target_sample_rate = Some(rate);
        }
        if self.keep_sample_rate {
            split.target_sample_rate = None;
        }
        if self.mono {
            split.mono_downmix = true;
        }
        if self.use_transcript_as_filename {
            split.use_transcript_as_filename = true;
        }
        if let Some(offset) = self.subtitle_offset {
            split.subtitle_offset_seconds = offset;
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split one recording by its subtitle timings
    Split {
        /// Subtitle file (SRT)
        #[arg(short, long)]
        subtitle: PathBuf,

        /// Audio file (WAV, or any format ffmpeg can convert)
        #[arg(short, long)]
        audio: PathBuf,

        /// Output directory; clips go to a subdirectory named after the audio file
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        audio_args: AudioArgs,
    },

    /// Split every subtitle/audio pair in a directory
    Batch {
        /// Input directory containing SRT and audio files
        #[arg(short, long)]
        input_dir: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        audio_args: AudioArgs,

        /// Keep an existing output directory instead of removing it
        #[arg(long)]
        no_clean: bool,

        /// Continue with the next recording when one fails
        #[arg(long)]
        continue_on_error: bool,
    },

    /// Write a filtered copy of each recording's manifest
    Filter {
        /// Directory whose subdirectories hold manifests
        #[arg(short, long, default_value = "output")]
        target_dir: PathBuf,

        /// File with banned phrases, one per line
        #[arg(short, long)]
        ban_file: Option<PathBuf>,

        /// Banned phrases must match the whole text (false: substring match)
        #[arg(long)]
        full_match: Option<bool>,

        /// Remove entries containing Latin letters
        #[arg(long)]
        filter_latin: bool,
    },

    /// Remove manifest lines whose clip file no longer exists
    Sync {
        /// Directory whose subdirectories hold manifests
        #[arg(short, long, default_value = "output")]
        target_dir: PathBuf,

        /// Manifest filename inside each subdirectory
        #[arg(short, long)]
        manifest: Option<String>,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Output path
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}
