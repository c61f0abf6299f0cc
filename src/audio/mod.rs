// Audio decoding and output
// Uses Symphonia for decoding and cpal for output

pub mod buffer;
pub mod decoder;
pub mod output;
pub mod session;

pub use buffer::DecodedAudio;
