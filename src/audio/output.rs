// Audio output using cpal
// Handles cross-platform audio output with a ring buffer

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use log::error;
use parking_lot::Mutex;
use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapRb,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{PlayerError, Result};

const RING_BUFFER_SIZE: usize = 48000 * 2 / 4; // ~250ms of stereo audio at 48kHz

type RingProducer = ringbuf::HeapProd<f32>;
type RingConsumer = ringbuf::HeapCons<f32>;

/// The writing half of an output stream. `Send`, so a feeder thread can own it
/// while the stream itself stays on the thread that built it.
#[derive(Clone)]
pub struct OutputFeed {
    producer: Arc<Mutex<RingProducer>>,
    clear_flag: Arc<AtomicBool>,
    sample_rate: u32,
    channels: u16,
}

pub struct AudioOutput {
    stream: Stream,
    feed: OutputFeed,
}

impl AudioOutput {
    /// Create a new audio output with default device
    pub fn new(volume: f32) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| PlayerError::Output("no output device available".into()))?;

        let config = device
            .default_output_config()
            .map_err(|e| PlayerError::Output(format!("failed to get default output config: {}", e)))?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        // Ring buffer for passing samples to the audio thread
        let rb = HeapRb::<f32>::new(RING_BUFFER_SIZE);
        let (producer, consumer) = rb.split();
        let producer = Arc::new(Mutex::new(producer));
        let consumer = Arc::new(Mutex::new(consumer));

        let volume = volume.clamp(0.0, 1.0);
        let clear_flag = Arc::new(AtomicBool::new(false));

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &config.into(),
                consumer,
                volume,
                clear_flag.clone(),
            )?,
            cpal::SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &config.into(),
                consumer,
                volume,
                clear_flag.clone(),
            )?,
            cpal::SampleFormat::U16 => Self::build_stream::<u16>(
                &device,
                &config.into(),
                consumer,
                volume,
                clear_flag.clone(),
            )?,
            format => {
                return Err(PlayerError::Output(format!(
                    "unsupported sample format: {:?}",
                    format
                )))
            }
        };

        stream
            .play()
            .map_err(|e| PlayerError::Output(format!("failed to start stream: {}", e)))?;

        Ok(Self {
            stream,
            feed: OutputFeed {
                producer,
                clear_flag,
                sample_rate,
                channels,
            },
        })
    }

    fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
        device: &cpal::Device,
        config: &StreamConfig,
        consumer: Arc<Mutex<RingConsumer>>,
        volume: f32,
        clear_flag: Arc<AtomicBool>,
    ) -> Result<Stream> {
        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    fill_from_ring(data, &mut *consumer.lock(), volume, &clear_flag);
                },
                move |err| {
                    error!("Audio output error: {}", err);
                },
                None,
            )
            .map_err(|e| PlayerError::Output(format!("failed to build output stream: {}", e)))?;

        Ok(stream)
    }

    /// A handle for writing samples from another thread
    pub fn feed(&self) -> OutputFeed {
        self.feed.clone()
    }

    /// Silence the device right away. The stream cannot be resumed afterwards.
    pub fn halt(&self) {
        self.feed.clear();
        if let Err(e) = self.stream.pause() {
            error!("Failed to pause output stream: {}", e);
        }
    }
}

/// One device callback: pull queued samples at `volume`, silence once the
/// ring runs dry. A raised clear flag drops everything queued first.
fn fill_from_ring<T, C>(data: &mut [T], consumer: &mut C, volume: f32, clear_flag: &AtomicBool)
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
    C: Consumer<Item = f32>,
{
    if clear_flag.swap(false, Ordering::SeqCst) {
        while consumer.try_pop().is_some() {}
    }

    for sample in data.iter_mut() {
        let value = consumer.try_pop().unwrap_or(0.0) * volume;
        *sample = T::from_sample(value);
    }
}

impl OutputFeed {
    /// Write samples to the output buffer
    /// Returns the number of samples actually written
    pub fn write(&self, samples: &[f32]) -> usize {
        let mut producer = self.producer.lock();
        let mut written = 0;

        for &sample in samples {
            if producer.try_push(sample).is_ok() {
                written += 1;
            } else {
                // Buffer full, drop remaining samples
                break;
            }
        }

        written
    }

    /// Write samples, blocking until all are written or `stop` is raised.
    /// Returns false if interrupted.
    pub fn write_until(&self, samples: &[f32], stop: &AtomicBool) -> bool {
        let mut remaining = samples;

        while !remaining.is_empty() {
            if stop.load(Ordering::SeqCst) {
                return false;
            }
            let written = self.write(remaining);
            if written > 0 {
                remaining = &remaining[written..];
            } else {
                // Buffer full, wait a bit
                std::thread::sleep(Duration::from_millis(1));
            }
        }

        true
    }

    /// Samples queued but not yet pulled by the device
    pub fn queued(&self) -> usize {
        self.producer.lock().occupied_len()
    }

    /// Clear the buffer on the next device callback
    pub fn clear(&self) {
        self.clear_flag.store(true, Ordering::SeqCst);
    }

    /// Get the output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the number of output channels
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_scales_by_volume_then_pads_with_silence() {
        let (mut producer, mut consumer) = HeapRb::<f32>::new(8).split();
        producer.try_push(0.5).unwrap();
        producer.try_push(1.0).unwrap();

        let mut data = [1.0f32; 4];
        fill_from_ring(&mut data, &mut consumer, 0.5, &AtomicBool::new(false));
        assert_eq!(data, [0.25, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn clear_flag_drops_queued_samples_once() {
        let (mut producer, mut consumer) = HeapRb::<f32>::new(8).split();
        producer.try_push(0.5).unwrap();
        let clear = AtomicBool::new(true);

        let mut data = [1.0f32; 2];
        fill_from_ring(&mut data, &mut consumer, 1.0, &clear);
        assert_eq!(data, [0.0, 0.0]);
        assert!(!clear.load(Ordering::SeqCst));

        producer.try_push(0.75).unwrap();
        fill_from_ring(&mut data, &mut consumer, 1.0, &clear);
        assert_eq!(data, [0.75, 0.0]);
    }
}
