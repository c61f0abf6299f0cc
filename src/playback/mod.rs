// Playback state machine and everything derived from it

pub mod clock;
pub mod controller;
pub mod speed;
pub mod state;
pub mod ticker;
pub mod view;

pub use controller::{DecodeOutcome, DecodeRequest, PlaybackController};
pub use speed::{PlaybackSpeed, SPEED_OPTIONS};
pub use ticker::{SessionId, TickOutcome, TickScheduler, TickerHandle, TokioTickScheduler};
pub use view::{StatusLine, UiState};
