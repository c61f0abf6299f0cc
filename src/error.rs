// Error types shared by decoding, output and the playback controller
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to probe file format: {0}")]
    Probe(String),

    #[error("no audio track found")]
    NoAudioTrack,

    #[error("decode failed: {0}")]
    Decode(String),

    /// The bytes probed fine but produced no playable audio.
    #[error("file contains no decodable audio")]
    Undecodable,

    #[error("audio output error: {0}")]
    Output(String),

    #[error("resampler error: {0}")]
    Resample(String),

    /// Play was requested before a decoded buffer exists.
    #[error("no decoded audio is ready to play")]
    NotReady,

    #[error("decode was abandoned before it finished")]
    Cancelled,

    #[error("settings error: {0}")]
    Settings(String),
}

impl From<symphonia::core::errors::Error> for PlayerError {
    fn from(e: symphonia::core::errors::Error) -> Self {
        PlayerError::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PlayerError>;
