// Decoded PCM held in memory
use std::sync::Arc;

/// Immutable interleaved f32 PCM. Cloning shares the samples.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    samples: Arc<[f32]>,
    sample_rate: u32,
    channels: usize,
}

impl DecodedAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: usize) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
            channels,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of frames (one sample per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels
    }

    /// Duration at 1.0x in seconds
    pub fn native_duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Split into one Vec per channel, the layout the resampler expects
    pub fn deinterleave(&self, start_frame: usize, frames: usize) -> Vec<Vec<f32>> {
        let end = (start_frame + frames).min(self.frames());
        let start = start_frame.min(end);
        let mut planes = vec![Vec::with_capacity(end - start); self.channels];

        for frame in start..end {
            let base = frame * self.channels;
            for (ch, plane) in planes.iter_mut().enumerate() {
                plane.push(self.samples[base + ch]);
            }
        }

        planes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_comes_from_frames_and_rate() {
        let audio = DecodedAudio::new(vec![0.0; 44100 * 2 * 3], 44100, 2);
        assert_eq!(audio.frames(), 44100 * 3);
        assert!((audio.native_duration_seconds() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn deinterleave_splits_channels_and_clamps_range() {
        let audio = DecodedAudio::new(vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0], 8000, 2);
        let planes = audio.deinterleave(1, 10);
        assert_eq!(planes, vec![vec![2.0, 3.0], vec![-2.0, -3.0]]);
        assert_eq!(audio.deinterleave(5, 2), vec![Vec::<f32>::new(), Vec::new()]);
    }

    #[test]
    fn zero_rate_has_no_duration() {
        let audio = DecodedAudio::new(vec![0.0; 10], 0, 1);
        assert_eq!(audio.native_duration_seconds(), 0.0);
    }
}
