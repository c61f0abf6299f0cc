// The single value object holding everything the player knows
use crate::audio::buffer::DecodedAudio;
use crate::file::SelectedFile;
use crate::platform::SessionHandle;
use crate::playback::speed::PlaybackSpeed;
use crate::playback::ticker::{ProgressTicker, SessionId};

pub enum DecodeStatus {
    /// Nothing selected yet
    Empty,
    Pending,
    Ready(DecodedAudio),
    Failed(String),
}

impl DecodeStatus {
    pub fn audio(&self) -> Option<&DecodedAudio> {
        match self {
            DecodeStatus::Ready(audio) => Some(audio),
            _ => None,
        }
    }
}

pub struct ActiveSession {
    pub id: SessionId,
    pub speed: PlaybackSpeed,
    pub effective_duration: f64,
    pub handle: Box<dyn SessionHandle>,
    pub ticker: ProgressTicker,
}

impl ActiveSession {
    /// Whole seconds shown as the total, also the ticker's target
    pub fn total_seconds(&self) -> u64 {
        self.ticker.target()
    }
}

pub enum Transport {
    Idle,
    Playing(ActiveSession),
}

impl Transport {
    pub fn is_playing(&self) -> bool {
        matches!(self, Transport::Playing(_))
    }

    pub fn session(&self) -> Option<&ActiveSession> {
        match self {
            Transport::Playing(session) => Some(session),
            Transport::Idle => None,
        }
    }
}

pub struct PlaybackState {
    pub selected: Option<SelectedFile>,
    /// Bumped on every selection so late decode results can be recognised
    pub file_generation: u64,
    pub decode: DecodeStatus,
    pub transport: Transport,
    pub speed_index: Option<usize>,
    pub about_visible: bool,
}

impl PlaybackState {
    pub fn new(speed_index: Option<usize>) -> Self {
        Self {
            selected: None,
            file_generation: 0,
            decode: DecodeStatus::Empty,
            transport: Transport::Idle,
            speed_index,
            about_visible: false,
        }
    }

    pub fn speed(&self) -> PlaybackSpeed {
        PlaybackSpeed::resolve(self.speed_index)
    }
}
