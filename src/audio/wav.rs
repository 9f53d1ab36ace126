use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use tracing::info;

use crate::error::{Result, SlicerError};

/// Decoded recording held in memory: interleaved frames in [-1.0, 1.0]
#[derive(Debug, Clone)]
pub struct Waveform {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels: channels.max(1),
            sample_rate,
        }
    }

    /// Decode a WAV file (integer PCM of any width, or 32-bit float)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = WavReader::open(path).map_err(|e| {
            SlicerError::Extraction(format!("Cannot read audio {}: {}", path.display(), e))
        })?;
        let spec = reader.spec();

        let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 32) => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()?,
            (SampleFormat::Int, bits @ 1..=32) => {
                let scale = (1u64 << (bits - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()?
            }
            (format, bits) => {
                return Err(SlicerError::Extraction(format!(
                    "Unsupported WAV format in {}: {:?} {} bit",
                    path.display(),
                    format,
                    bits
                )));
            }
        };

        let waveform = Self::new(samples, spec.channels, spec.sample_rate);
        info!(
            "Loaded {}: {} ch @ {} Hz, {} ms",
            path.display(),
            waveform.channels,
            waveform.sample_rate,
            waveform.duration_ms()
        );
        Ok(waveform)
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration_ms(&self) -> u64 {
        frames_to_ms(self.frames(), self.sample_rate)
    }

    fn ms_to_frame(&self, ms: u64) -> usize {
        (ms as u128 * self.sample_rate as u128 / 1000) as usize
    }

    /// Copy `[start_ms, end_ms)` into a new clip at the source format
    pub fn slice_ms(&self, start_ms: u64, end_ms: u64) -> Result<Clip> {
        if end_ms < start_ms {
            return Err(SlicerError::Extraction(format!(
                "Inverted range {}-{} ms",
                start_ms, end_ms
            )));
        }

        let start = self.ms_to_frame(start_ms);
        let end = self.ms_to_frame(end_ms);
        if end > self.frames() {
            return Err(SlicerError::Extraction(format!(
                "Range {}-{} ms exceeds audio length of {} ms",
                start_ms,
                end_ms,
                self.duration_ms()
            )));
        }

        let channels = self.channels as usize;
        Ok(Clip {
            samples: self.samples[start * channels..end * channels].to_vec(),
            channels: self.channels,
            sample_rate: self.sample_rate,
        })
    }
}

/// One extracted, normalized piece of audio
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl Clip {
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_ms(&self) -> u64 {
        frames_to_ms(self.frames(), self.sample_rate)
    }

    /// Encode as 16-bit signed PCM WAV
    pub fn write_wav<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let spec = WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut writer = WavWriter::create(path, spec).map_err(|e| match e {
            hound::Error::IoError(io) => SlicerError::filesystem(path, io),
            other => SlicerError::Wav(other),
        })?;
        for &sample in &self.samples {
            writer.write_sample(to_i16(sample))?;
        }
        writer.finalize()?;

        Ok(())
    }
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

fn frames_to_ms(frames: usize, sample_rate: u32) -> u64 {
    if sample_rate == 0 {
        return 0;
    }
    (frames as u128 * 1000 / sample_rate as u128) as u64
}
