// Platform audio service: one awaitable decode call plus session creation.
// Decoders come in two shapes (future-returning or callback-style); the
// shape is checked once when the platform is built and callback decoders
// are bridged so every caller awaits the same interface.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::audio::buffer::DecodedAudio;
use crate::audio::decoder::decode_bytes;
use crate::audio::session::CpalSink;
use crate::error::{PlayerError, Result};

pub type DecodeFuture = Pin<Box<dyn Future<Output = Result<DecodedAudio>> + Send + 'static>>;
pub type DecodeSuccess = Box<dyn FnOnce(DecodedAudio) + Send + 'static>;
pub type DecodeFailure = Box<dyn FnOnce(PlayerError) + Send + 'static>;

pub trait AwaitableDecoder: Send + Sync {
    fn decode(&self, bytes: Vec<u8>, extension: Option<String>) -> DecodeFuture;
}

/// Decoder that reports through a pair of callbacks. At most one of them is
/// expected to run.
pub trait CallbackDecoder: Send + Sync {
    fn decode_with_callbacks(
        &self,
        bytes: Vec<u8>,
        extension: Option<String>,
        on_success: DecodeSuccess,
        on_error: DecodeFailure,
    );
}

pub enum DecoderCapability {
    Awaitable(Arc<dyn AwaitableDecoder>),
    Callback(Arc<dyn CallbackDecoder>),
}

/// Reduce either decoder shape to the awaitable one
pub fn normalize(capability: DecoderCapability) -> Arc<dyn AwaitableDecoder> {
    match capability {
        DecoderCapability::Awaitable(decoder) => decoder,
        DecoderCapability::Callback(inner) => {
            debug!("Decoder is callback-based; bridging to an awaitable interface");
            Arc::new(CallbackBridge { inner })
        }
    }
}

struct CallbackBridge {
    inner: Arc<dyn CallbackDecoder>,
}

impl AwaitableDecoder for CallbackBridge {
    fn decode(&self, bytes: Vec<u8>, extension: Option<String>) -> DecodeFuture {
        let (tx, rx) = oneshot::channel();
        let tx = Arc::new(Mutex::new(Some(tx)));
        let err_tx = Arc::clone(&tx);

        self.inner.decode_with_callbacks(
            bytes,
            extension,
            Box::new(move |audio| {
                if let Some(tx) = tx.lock().take() {
                    let _ = tx.send(Ok(audio));
                }
            }),
            Box::new(move |err| {
                if let Some(tx) = err_tx.lock().take() {
                    let _ = tx.send(Err(err));
                }
            }),
        );

        // Both callbacks dropped unused closes the channel
        Box::pin(async move { rx.await.unwrap_or(Err(PlayerError::Cancelled)) })
    }
}

/// Symphonia on the blocking pool
pub struct SymphoniaDecoder;

impl AwaitableDecoder for SymphoniaDecoder {
    fn decode(&self, bytes: Vec<u8>, extension: Option<String>) -> DecodeFuture {
        Box::pin(async move {
            tokio::task::spawn_blocking(move || decode_bytes(bytes, extension.as_deref()))
                .await
                .map_err(|e| PlayerError::Decode(format!("decode task failed: {}", e)))?
        })
    }
}

/// One playing instance of a decoded buffer
pub trait SessionHandle {
    fn start(&mut self) -> Result<()>;
    /// Halt output now. Calling it again does nothing.
    fn stop(&mut self);
    fn is_finished(&self) -> bool;
}

pub trait PlaybackSink: Send + Sync {
    fn create_session(&self, buffer: DecodedAudio, rate: f64) -> Result<Box<dyn SessionHandle>>;
}

#[derive(Clone)]
pub struct AudioPlatform {
    decoder: Arc<dyn AwaitableDecoder>,
    sink: Arc<dyn PlaybackSink>,
}

impl AudioPlatform {
    pub fn new(capability: DecoderCapability, sink: Arc<dyn PlaybackSink>) -> Self {
        Self {
            decoder: normalize(capability),
            sink,
        }
    }

    /// Symphonia decoding and the default cpal output device
    pub fn native(volume: f32) -> Self {
        Self::new(
            DecoderCapability::Awaitable(Arc::new(SymphoniaDecoder)),
            Arc::new(CpalSink::new(volume)),
        )
    }

    pub fn decoder(&self) -> Arc<dyn AwaitableDecoder> {
        Arc::clone(&self.decoder)
    }

    pub fn decode(&self, bytes: Vec<u8>, extension: Option<String>) -> DecodeFuture {
        self.decoder.decode(bytes, extension)
    }

    pub fn create_session(&self, buffer: DecodedAudio, rate: f64) -> Result<Box<dyn SessionHandle>> {
        self.sink.create_session(buffer, rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ImmediateCallback {
        fail: bool,
    }

    impl CallbackDecoder for ImmediateCallback {
        fn decode_with_callbacks(
            &self,
            bytes: Vec<u8>,
            _extension: Option<String>,
            on_success: DecodeSuccess,
            on_error: DecodeFailure,
        ) {
            if self.fail {
                on_error(PlayerError::Undecodable);
            } else {
                on_success(DecodedAudio::new(bytes.iter().map(|b| *b as f32).collect(), 4, 1));
            }
        }
    }

    struct ThreadedCallback;

    impl CallbackDecoder for ThreadedCallback {
        fn decode_with_callbacks(
            &self,
            bytes: Vec<u8>,
            _extension: Option<String>,
            on_success: DecodeSuccess,
            _on_error: DecodeFailure,
        ) {
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(10));
                on_success(DecodedAudio::new(vec![0.0; bytes.len()], 2, 1));
            });
        }
    }

    struct SilentCallback;

    impl CallbackDecoder for SilentCallback {
        fn decode_with_callbacks(
            &self,
            _bytes: Vec<u8>,
            _extension: Option<String>,
            _on_success: DecodeSuccess,
            _on_error: DecodeFailure,
        ) {
        }
    }

    #[tokio::test]
    async fn callback_success_resolves_the_future() {
        let decoder = normalize(DecoderCapability::Callback(Arc::new(ImmediateCallback {
            fail: false,
        })));
        let audio = decoder.decode(vec![1, 2, 3, 4], None).await.unwrap();
        assert_eq!(audio.frames(), 4);
        assert_eq!(audio.native_duration_seconds(), 1.0);
    }

    #[tokio::test]
    async fn callback_error_rejects_the_future() {
        let decoder = normalize(DecoderCapability::Callback(Arc::new(ImmediateCallback {
            fail: true,
        })));
        let err = decoder.decode(vec![], None).await.unwrap_err();
        assert!(matches!(err, PlayerError::Undecodable));
    }

    #[tokio::test]
    async fn callback_from_another_thread_is_awaited() {
        let decoder = normalize(DecoderCapability::Callback(Arc::new(ThreadedCallback)));
        let audio = decoder.decode(vec![0; 6], None).await.unwrap();
        assert_eq!(audio.native_duration_seconds(), 3.0);
    }

    #[tokio::test]
    async fn dropped_callbacks_resolve_as_cancelled() {
        let decoder = normalize(DecoderCapability::Callback(Arc::new(SilentCallback)));
        let err = decoder.decode(vec![], None).await.unwrap_err();
        assert!(matches!(err, PlayerError::Cancelled));
    }

    #[tokio::test]
    async fn symphonia_decoder_rejects_garbage() {
        let err = SymphoniaDecoder.decode(b"nope".to_vec(), None).await.unwrap_err();
        assert!(matches!(err, PlayerError::Probe(_)));
    }
}
