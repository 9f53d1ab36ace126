// Audio handling for clip extraction
//
// - Wav: decoding the source recording and encoding clips (hound)
// - Resample: channel downmix and sample-rate conversion on f32 frames

pub mod resample;
pub mod wav;

pub use resample::{SincResampler, downmix_to_mono};
pub use wav::{Clip, Waveform};

use tracing::debug;

use crate::config::SplitConfig;
use crate::error::{Result, SlicerError};
use crate::segment::Segment;

/// Clip normalization applied to every extracted segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtractOptions {
    pub mono_downmix: bool,
    pub target_sample_rate: Option<u32>,
}

impl From<&SplitConfig> for ExtractOptions {
    fn from(config: &SplitConfig) -> Self {
        Self {
            mono_downmix: config.mono_downmix,
            target_sample_rate: config.target_sample_rate,
        }
    }
}

/// Cuts clips out of one decoded recording
pub struct AudioExtractor<'a> {
    source: &'a Waveform,
    options: ExtractOptions,
}

impl<'a> AudioExtractor<'a> {
    pub fn new(source: &'a Waveform, options: ExtractOptions) -> Self {
        Self { source, options }
    }

    /// Produce the normalized clip for `[start_ms, end_ms)` of the source
    pub fn extract(&self, start_ms: u64, end_ms: u64) -> Result<Clip> {
        let mut clip = self.source.slice_ms(start_ms, end_ms)?;

        if self.options.mono_downmix && clip.channels > 1 {
            clip.samples = downmix_to_mono(&clip.samples, clip.channels);
            clip.channels = 1;
        }

        if let Some(target) = self.options.target_sample_rate {
            if target == 0 {
                return Err(SlicerError::Extraction("target sample rate must be positive".to_string()));
            }
            if target != clip.sample_rate {
                let resampler = SincResampler::new(clip.sample_rate, target);
                clip.samples = resampler.resample(&clip.samples, clip.channels)?;
                clip.sample_rate = target;
            }
        }

        debug!(
            "Extracted {}-{} ms: {} frames, {} ch @ {} Hz",
            start_ms,
            end_ms,
            clip.frames(),
            clip.channels,
            clip.sample_rate
        );
        Ok(clip)
    }

    pub fn extract_segment(&self, segment: &Segment) -> Result<Clip> {
        self.extract(segment.start_ms, segment.end_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_ramp(frames: usize, sample_rate: u32) -> Waveform {
        let mut samples = Vec::with_capacity(frames * 2);
        for i in 0..frames {
            samples.push(0.5);
            samples.push(if i % 2 == 0 { -0.5 } else { 0.5 });
        }
        Waveform::new(samples, 2, sample_rate)
    }

    #[test]
    fn test_extract_keeps_duration() {
        let source = stereo_ramp(8000, 8000);
        let extractor = AudioExtractor::new(&source, ExtractOptions::default());
        let clip = extractor.extract(250, 750).unwrap();
        assert_eq!(clip.frames(), 4000);
        assert_eq!(clip.channels, 2);
        assert_eq!(clip.duration_ms(), 500);
    }

    #[test]
    fn test_extract_downmix_and_resample() {
        let source = stereo_ramp(8000, 8000);
        let options = ExtractOptions {
            mono_downmix: true,
            target_sample_rate: Some(16000),
        };
        let clip = AudioExtractor::new(&source, options).extract(0, 500).unwrap();
        assert_eq!(clip.channels, 1);
        assert_eq!(clip.sample_rate, 16000);
        assert_eq!(clip.frames(), 8000);
        assert_eq!(clip.duration_ms(), 500);
    }

    #[test]
    fn test_extract_out_of_bounds_is_error() {
        let source = stereo_ramp(8000, 8000);
        let extractor = AudioExtractor::new(&source, ExtractOptions::default());
        assert!(matches!(extractor.extract(500, 1001), Err(SlicerError::Extraction(_))));
    }

    #[test]
    fn test_same_rate_is_not_resampled() {
        let source = Waveform::new(vec![0.1, 0.2, 0.3, 0.4], 1, 4000);
        let options = ExtractOptions {
            mono_downmix: false,
            target_sample_rate: Some(4000),
        };
        let clip = AudioExtractor::new(&source, options).extract(0, 1).unwrap();
        assert_eq!(clip.samples, vec![0.1, 0.2, 0.3, 0.4]);
    }
}
