// Audio decoder using Symphonia
// Decodes an in-memory file to raw PCM samples

use std::io::Cursor;

use log::{debug, warn};
use symphonia::core::audio::{AudioBufferRef, AudioPlanes, Signal};
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

use crate::audio::buffer::DecodedAudio;
use crate::error::{PlayerError, Result};

pub struct AudioDecoder {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: usize,
    n_frames: Option<u64>,
    input_len: usize,
}

/// Samples to reserve up front. Headers can claim any length (streaming
/// writers often leave 0xFFFFFFFF), so the claim is capped by the input size.
fn reserve_samples(n_frames: Option<u64>, channels: usize, input_len: usize) -> usize {
    n_frames
        .map(|f| usize::try_from(f).unwrap_or(usize::MAX).saturating_mul(channels))
        .unwrap_or(0)
        .min(input_len)
}

impl AudioDecoder {
    /// Probe the bytes of a file and prepare for decoding.
    /// `extension` is only a hint; the probe looks at the content.
    pub fn open(bytes: Vec<u8>, extension: Option<&str>) -> Result<Self> {
        let input_len = bytes.len();
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| PlayerError::Probe(e.to_string()))?;

        let format = probed.format;

        // Find the first audio track
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(PlayerError::NoAudioTrack)?;

        let track_id = track.id;
        let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
        let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2);
        let n_frames = track.codec_params.n_frames;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| PlayerError::Decode(format!("failed to create decoder: {}", e)))?;

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_rate,
            channels,
            n_frames,
            input_len,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Decode next packet, returns interleaved f32 samples
    /// Returns None when end of stream is reached
    pub fn decode_next(&mut self) -> Result<Option<Vec<f32>>> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(e) => return Err(PlayerError::Decode(format!("failed to read packet: {}", e))),
            };

            // Skip packets from other tracks
            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    // The codec may only learn the real layout from the first frame
                    let spec = decoded.spec();
                    self.sample_rate = spec.rate;
                    self.channels = spec.channels.count();
                    return Ok(Some(Self::audio_buf_to_f32(&decoded)));
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Decode error (skipping packet): {}", e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Decode the whole stream into one buffer
    pub fn decode_all(mut self) -> Result<DecodedAudio> {
        let mut samples = Vec::with_capacity(reserve_samples(
            self.n_frames,
            self.channels,
            self.input_len,
        ));

        loop {
            match self.decode_next() {
                Ok(Some(chunk)) => samples.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) if !samples.is_empty() => {
                    // Keep what decoded cleanly; a truncated tail is still playable
                    warn!("Stopping decode early after {} samples: {}", samples.len(), e);
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        if samples.is_empty() || self.channels == 0 || self.sample_rate == 0 {
            return Err(PlayerError::Undecodable);
        }

        debug!(
            "Decoded {} samples ({} channels @ {} Hz)",
            samples.len(),
            self.channels,
            self.sample_rate
        );

        Ok(DecodedAudio::new(samples, self.sample_rate, self.channels))
    }

    /// Convert any AudioBufferRef to interleaved f32 samples
    fn audio_buf_to_f32(buf: &AudioBufferRef) -> Vec<f32> {
        match buf {
            AudioBufferRef::F32(b) => Self::interleave_convert(b.planes(), b.frames(), |s: f32| s),
            AudioBufferRef::F64(b) => {
                Self::interleave_convert(b.planes(), b.frames(), |s: f64| s as f32)
            }
            AudioBufferRef::S8(b) => {
                let scale = 1.0 / 128.0;
                Self::interleave_convert(b.planes(), b.frames(), |s: i8| s as f32 * scale)
            }
            AudioBufferRef::S16(b) => {
                let scale = 1.0 / 32768.0;
                Self::interleave_convert(b.planes(), b.frames(), |s: i16| s as f32 * scale)
            }
            AudioBufferRef::S24(b) => {
                let scale = 1.0 / 8388608.0;
                Self::interleave_convert(b.planes(), b.frames(), |s| s.inner() as f32 * scale)
            }
            AudioBufferRef::S32(b) => {
                let scale = 1.0 / 2147483648.0;
                Self::interleave_convert(b.planes(), b.frames(), |s: i32| s as f32 * scale)
            }
            AudioBufferRef::U8(b) => {
                Self::interleave_convert(b.planes(), b.frames(), |s: u8| (s as f32 - 128.0) / 128.0)
            }
            AudioBufferRef::U16(b) => Self::interleave_convert(b.planes(), b.frames(), |s: u16| {
                (s as f32 - 32768.0) / 32768.0
            }),
            AudioBufferRef::U24(b) => Self::interleave_convert(b.planes(), b.frames(), |s| {
                (s.inner() as f32 - 8388608.0) / 8388608.0
            }),
            AudioBufferRef::U32(b) => Self::interleave_convert(b.planes(), b.frames(), |s: u32| {
                (s as f64 - 2147483648.0) as f32 / 2147483648.0
            }),
        }
    }

    fn interleave_convert<T: Sample + Copy, F: Fn(T) -> f32>(
        planes: AudioPlanes<T>,
        frames: usize,
        convert: F,
    ) -> Vec<f32> {
        let planes = planes.planes();
        let num_channels = planes.len();
        if num_channels == 0 || frames == 0 {
            return vec![];
        }

        let mut interleaved = Vec::with_capacity(frames * num_channels);
        for frame in 0..frames {
            for plane in planes.iter() {
                interleaved.push(convert(plane[frame]));
            }
        }

        interleaved
    }
}

/// Decode a complete file held in memory
pub fn decode_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<DecodedAudio> {
    AudioDecoder::open(bytes, extension)?.decode_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(sample_rate: u32, channels: u16, frames: usize) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..frames * channels as usize {
                let value = ((i % 100) as i16 - 50) * 200;
                writer.write_sample(value).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn decodes_pcm_wav_to_interleaved_f32() {
        let audio = decode_bytes(wav_bytes(8000, 2, 16000), Some("wav")).unwrap();
        assert_eq!(audio.sample_rate(), 8000);
        assert_eq!(audio.channels(), 2);
        assert_eq!(audio.frames(), 16000);
        assert!((audio.native_duration_seconds() - 2.0).abs() < 1e-6);
        assert!(audio.samples().iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn reservation_never_exceeds_the_input() {
        assert_eq!(reserve_samples(Some(1000), 2, 1_000_000), 2000);
        assert_eq!(reserve_samples(Some(u32::MAX as u64), 8, 944), 944);
        assert_eq!(reserve_samples(Some(u64::MAX), 2, 10), 10);
        assert_eq!(reserve_samples(None, 2, 10), 0);
    }

    #[test]
    fn unknown_length_header_does_not_reserve_the_claimed_size() {
        let mut bytes = wav_bytes(8000, 2, 100);
        // Rewrite the RIFF and data sizes the way a streaming recorder leaves them
        bytes[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
        let data = bytes.windows(4).position(|w| w == b"data").unwrap();
        bytes[data + 4..data + 8].copy_from_slice(&u32::MAX.to_le_bytes());

        // An error is fine too, as long as the process survives it
        if let Ok(audio) = decode_bytes(bytes, Some("wav")) {
            assert!(audio.frames() <= 100);
        }
    }

    #[test]
    fn garbage_bytes_fail_to_probe() {
        let err = decode_bytes(b"definitely not audio".to_vec(), None).unwrap_err();
        assert!(matches!(err, PlayerError::Probe(_)), "got {err:?}");
    }
}
