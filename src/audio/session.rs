// A playback session: one decoded buffer streamed to a fresh cpal output
// at a fixed rate multiplier.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, error, warn};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::audio::buffer::DecodedAudio;
use crate::audio::output::{AudioOutput, OutputFeed};
use crate::error::{PlayerError, Result};
use crate::platform::{PlaybackSink, SessionHandle};

/// Input frames handed to the resampler per call
const CHUNK_FRAMES: usize = 1024;

/// Output-to-input frame ratio for a rate multiplier. Playing faster
/// consumes more source frames per output frame, so pitch follows the rate.
pub fn resample_ratio(source_rate: u32, output_rate: u32, rate: f64) -> f64 {
    output_rate as f64 / (source_rate as f64 * rate)
}

/// Interleave channel planes into the device layout. Mono is duplicated,
/// surplus channels are dropped, missing ones repeat the last source channel.
pub fn map_channels(planes: &[Vec<f32>], output_channels: usize) -> Vec<f32> {
    if planes.is_empty() || output_channels == 0 {
        return vec![];
    }

    let frames = planes.iter().map(|p| p.len()).min().unwrap_or(0);
    let last = planes.len() - 1;
    let mut interleaved = Vec::with_capacity(frames * output_channels);

    for frame in 0..frames {
        for ch in 0..output_channels {
            interleaved.push(planes[ch.min(last)][frame]);
        }
    }

    interleaved
}

pub struct CpalSink {
    volume: f32,
}

impl CpalSink {
    pub fn new(volume: f32) -> Self {
        Self { volume }
    }
}

impl PlaybackSink for CpalSink {
    fn create_session(&self, buffer: DecodedAudio, rate: f64) -> Result<Box<dyn SessionHandle>> {
        let output = AudioOutput::new(self.volume)?;
        Ok(Box::new(CpalSession::new(output, buffer, rate)))
    }
}

pub struct CpalSession {
    output: Option<AudioOutput>,
    buffer: DecodedAudio,
    rate: f64,
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    feeder: Option<JoinHandle<()>>,
}

impl CpalSession {
    pub fn new(output: AudioOutput, buffer: DecodedAudio, rate: f64) -> Self {
        Self {
            output: Some(output),
            buffer,
            rate,
            stop: Arc::new(AtomicBool::new(false)),
            finished: Arc::new(AtomicBool::new(false)),
            feeder: None,
        }
    }
}

impl SessionHandle for CpalSession {
    fn start(&mut self) -> Result<()> {
        let output = self
            .output
            .as_ref()
            .ok_or_else(|| PlayerError::Output("session already stopped".into()))?;
        if self.feeder.is_some() {
            return Ok(());
        }

        let feed = output.feed();
        let buffer = self.buffer.clone();
        let rate = self.rate;
        let stop = Arc::clone(&self.stop);
        let finished = Arc::clone(&self.finished);

        let handle = std::thread::Builder::new()
            .name("vaporplay-feeder".into())
            .spawn(move || {
                if let Err(e) = feed_session(&buffer, rate, &feed, &stop) {
                    error!("Playback feeder failed: {}", e);
                }
                finished.store(true, Ordering::SeqCst);
            })
            .map_err(|e| PlayerError::Output(format!("failed to spawn feeder thread: {}", e)))?;

        self.feeder = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        let Some(output) = self.output.take() else {
            return;
        };

        self.stop.store(true, Ordering::SeqCst);
        output.halt();
        if let Some(feeder) = self.feeder.take() {
            if feeder.join().is_err() {
                warn!("Playback feeder panicked");
            }
        }
        // Dropping the stream releases the device
        drop(output);
        debug!("Session output halted");
    }

    fn is_finished(&self) -> bool {
        self.output.is_none() || self.finished.load(Ordering::SeqCst)
    }
}

impl Drop for CpalSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sinc_params() -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    }
}

/// Push the whole buffer through the resampler into the output ring.
/// Returns early once `stop` is raised.
fn feed_session(buffer: &DecodedAudio, rate: f64, feed: &OutputFeed, stop: &AtomicBool) -> Result<()> {
    let out_channels = feed.channels() as usize;
    let ratio = resample_ratio(buffer.sample_rate(), feed.sample_rate(), rate);
    let frames = buffer.frames();

    debug!(
        "Feeding {} frames at {}x (ratio {:.4}, {} -> {} channels)",
        frames,
        rate,
        ratio,
        buffer.channels(),
        out_channels
    );

    if (ratio - 1.0).abs() < f64::EPSILON {
        let mut pos = 0;
        while pos < frames {
            let planes = buffer.deinterleave(pos, CHUNK_FRAMES);
            if !feed.write_until(&map_channels(&planes, out_channels), stop) {
                return Ok(());
            }
            pos += CHUNK_FRAMES;
        }
    } else {
        let mut resampler =
            SincFixedIn::<f32>::new(ratio, 1.0, sinc_params(), CHUNK_FRAMES, buffer.channels())
                .map_err(|e| PlayerError::Resample(e.to_string()))?;

        let mut pos = 0;
        while pos + CHUNK_FRAMES <= frames {
            let planes = buffer.deinterleave(pos, CHUNK_FRAMES);
            let out = resampler
                .process(&planes[..], None)
                .map_err(|e| PlayerError::Resample(e.to_string()))?;
            if !feed.write_until(&map_channels(&out, out_channels), stop) {
                return Ok(());
            }
            pos += CHUNK_FRAMES;
        }

        // Remaining frames, then one empty call to flush the filter delay
        if pos < frames {
            let planes = buffer.deinterleave(pos, frames - pos);
            let out = resampler
                .process_partial(Some(&planes[..]), None)
                .map_err(|e| PlayerError::Resample(e.to_string()))?;
            if !feed.write_until(&map_channels(&out, out_channels), stop) {
                return Ok(());
            }
        }
        let out = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| PlayerError::Resample(e.to_string()))?;
        if !feed.write_until(&map_channels(&out, out_channels), stop) {
            return Ok(());
        }
    }

    // Let the device drain what is queued
    while feed.queued() > 0 && !stop.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(5));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_accounts_for_rate_and_device() {
        assert_eq!(resample_ratio(44100, 44100, 1.0), 1.0);
        assert_eq!(resample_ratio(44100, 44100, 0.5), 2.0);
        assert_eq!(resample_ratio(48000, 48000, 1.25), 0.8);
        assert!((resample_ratio(44100, 48000, 1.0) - 48000.0 / 44100.0).abs() < 1e-12);
    }

    #[test]
    fn mono_is_duplicated_to_stereo() {
        let planes = vec![vec![0.1, 0.2]];
        assert_eq!(map_channels(&planes, 2), vec![0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn surplus_channels_are_dropped() {
        let planes = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        assert_eq!(map_channels(&planes, 2), vec![1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn missing_channels_repeat_the_last_one() {
        let planes = vec![vec![1.0], vec![2.0]];
        assert_eq!(map_channels(&planes, 4), vec![1.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn nothing_to_map() {
        assert!(map_channels(&[], 2).is_empty());
        assert!(map_channels(&[vec![1.0]], 0).is_empty());
    }
}
