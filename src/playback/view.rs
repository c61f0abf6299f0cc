// What the widget shows, computed fresh from PlaybackState
use std::fmt;

use crate::playback::clock::format_clock;
use crate::playback::state::{DecodeStatus, PlaybackState, Transport};

pub const NOT_PLAYING: &str = "Not playing";
pub const DECODING: &str = "Loading file...";
pub const DECODE_FAILED: &str = "Could not play this file";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    NotPlaying,
    Decoding,
    Failed,
    Playing { current: String, total: String },
}

impl StatusLine {
    /// The current-time slot on its own
    pub fn current_time(&self) -> Option<&str> {
        match self {
            StatusLine::Playing { current, .. } => Some(current),
            _ => None,
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLine::NotPlaying => f.write_str(NOT_PLAYING),
            StatusLine::Decoding => f.write_str(DECODING),
            StatusLine::Failed => f.write_str(DECODE_FAILED),
            StatusLine::Playing { current, total } => write!(f, "{} // {}", current, total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub picker_visible: bool,
    pub filename: Option<String>,
    pub select_new_visible: bool,
    pub play_enabled: bool,
    pub stop_enabled: bool,
    pub speed_index: usize,
    pub status: StatusLine,
    pub about_visible: bool,
}

impl UiState {
    pub fn from_state(state: &PlaybackState) -> Self {
        let playing = state.transport.is_playing();
        let has_file = state.selected.is_some();
        let decoded = state.decode.audio().is_some();

        let status = match &state.transport {
            Transport::Playing(session) => {
                let elapsed = session.ticker.elapsed();
                // Before the first tick the slot reads "0:00"; every tick
                // rewrites it with a trailing space
                let current = if elapsed == 0 {
                    format_clock(0)
                } else {
                    format!("{} ", format_clock(elapsed))
                };
                StatusLine::Playing {
                    current,
                    total: format_clock(session.total_seconds()),
                }
            }
            Transport::Idle => match state.decode {
                DecodeStatus::Pending => StatusLine::Decoding,
                DecodeStatus::Failed(_) => StatusLine::Failed,
                DecodeStatus::Empty | DecodeStatus::Ready(_) => StatusLine::NotPlaying,
            },
        };

        Self {
            picker_visible: !has_file,
            filename: state.selected.as_ref().map(|f| f.display_name().to_string()),
            select_new_visible: has_file,
            play_enabled: decoded && !playing,
            stop_enabled: playing,
            speed_index: state.speed().index(),
            status,
            about_visible: state.about_visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::buffer::DecodedAudio;

    #[test]
    fn fresh_state_shows_only_the_picker() {
        let view = UiState::from_state(&PlaybackState::new(None));
        assert!(view.picker_visible);
        assert!(!view.select_new_visible);
        assert!(!view.play_enabled);
        assert!(!view.stop_enabled);
        assert_eq!(view.speed_index, 2);
        assert_eq!(view.status.to_string(), NOT_PLAYING);
        assert_eq!(view.status.current_time(), None);
    }

    #[test]
    fn play_waits_for_decoded_audio() {
        let mut state = PlaybackState::new(None);
        state.decode = DecodeStatus::Pending;
        let pending = UiState::from_state(&state);
        assert!(!pending.play_enabled);
        assert_eq!(pending.status, StatusLine::Decoding);

        state.decode = DecodeStatus::Ready(DecodedAudio::new(vec![0.0; 10], 10, 1));
        assert!(UiState::from_state(&state).play_enabled);

        state.decode = DecodeStatus::Failed("bad header".into());
        assert!(!UiState::from_state(&state).play_enabled);
    }

    #[test]
    fn playing_line_joins_current_and_total() {
        let line = StatusLine::Playing {
            current: "1:05 ".into(),
            total: "4:00".into(),
        };
        assert_eq!(line.to_string(), "1:05  // 4:00");
        assert_eq!(line.current_time(), Some("1:05 "));
    }
}
