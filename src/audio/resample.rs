use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::{Result, SlicerError};

const CHUNK_FRAMES: usize = 1024;

/// Average interleaved frames down to a single channel
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return samples.to_vec();
    }

    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Band-limited sample-rate converter for interleaved frames.
///
/// Wraps a windowed-sinc resampler, so content above the lower of the two
/// Nyquist frequencies is filtered out instead of folding back on downsampling.
#[derive(Debug, Clone, Copy)]
pub struct SincResampler {
    source_rate: u32,
    target_rate: u32,
}

impl SincResampler {
    pub fn new(source_rate: u32, target_rate: u32) -> Self {
        Self {
            source_rate,
            target_rate,
        }
    }

    /// Number of output frames for `frames` input frames, rounded to nearest
    pub fn output_frames(&self, frames: usize) -> usize {
        if self.source_rate == 0 {
            return 0;
        }
        let scaled = frames as u128 * self.target_rate as u128;
        ((scaled + self.source_rate as u128 / 2) / self.source_rate as u128) as usize
    }

    /// Resample interleaved `samples`, returning exactly `output_frames` frames
    pub fn resample(&self, samples: &[f32], channels: u16) -> Result<Vec<f32>> {
        let channels = channels.max(1) as usize;
        if self.source_rate == self.target_rate || samples.is_empty() {
            return Ok(samples.to_vec());
        }
        if self.source_rate == 0 || self.target_rate == 0 {
            return Err(SlicerError::Extraction(format!(
                "cannot resample {} Hz to {} Hz",
                self.source_rate, self.target_rate
            )));
        }

        let in_frames = samples.len() / channels;
        let expected = self.output_frames(in_frames);
        let planar: Vec<Vec<f32>> = (0..channels)
            .map(|ch| samples.iter().skip(ch).step_by(channels).copied().collect())
            .collect();

        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };
        let ratio = self.target_rate as f64 / self.source_rate as f64;
        let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_FRAMES, channels)
            .map_err(|e| SlicerError::Extraction(format!("resampler init: {}", e)))?;

        // The filter delays its output; keep feeding silence past the input
        // until the delayed tail of the last real frame has come out
        let delay = resampler.output_delay();
        let needed = delay + expected;
        let max_chunks = in_frames / CHUNK_FRAMES + 4 + delay / CHUNK_FRAMES;

        let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(needed + CHUNK_FRAMES); channels];
        let mut position = 0;
        for _ in 0..max_chunks {
            if output[0].len() >= needed {
                break;
            }

            let start = position.min(in_frames);
            let end = (position + CHUNK_FRAMES).min(in_frames);
            let chunk: Vec<Vec<f32>> = planar
                .iter()
                .map(|channel| {
                    let mut block = channel[start..end].to_vec();
                    block.resize(CHUNK_FRAMES, 0.0);
                    block
                })
                .collect();
            position += CHUNK_FRAMES;

            let result = resampler
                .process(&chunk, None)
                .map_err(|e| SlicerError::Extraction(format!("resample: {}", e)))?;
            for (out, produced) in output.iter_mut().zip(result) {
                out.extend_from_slice(&produced);
            }
        }

        if output[0].len() < needed {
            return Err(SlicerError::Extraction(format!(
                "resampler produced {} of {} frames",
                output[0].len().saturating_sub(delay),
                expected
            )));
        }

        let mut interleaved = Vec::with_capacity(expected * channels);
        for frame in delay..needed {
            for channel in &output {
                interleaved.push(channel[frame]);
            }
        }
        Ok(interleaved)
    }
}
