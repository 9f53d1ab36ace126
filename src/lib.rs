//! srt-slicer - subtitle-driven audio segmentation
//!
//! Turns a long recording plus its SRT subtitles into short utterance clips
//! and a `filename|text` manifest, for building speech training data.

pub mod cli;
pub mod config;
pub mod error;
pub mod subtitle;
pub mod segment;
pub mod audio;
pub mod naming;
pub mod manifest;
pub mod splitter;
pub mod media;
pub mod workflow;
