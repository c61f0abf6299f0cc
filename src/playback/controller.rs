// Playback controller: owns the PlaybackState and applies every user action
// and timer event to it. All methods run on the UI thread; decode work leaves
// it through DecodeRequest and comes back through finish_decode.

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::audio::buffer::DecodedAudio;
use crate::error::{PlayerError, Result};
use crate::file::{FileLocation, SelectedFile};
use crate::platform::{AudioPlatform, AwaitableDecoder, SessionHandle};
use crate::playback::clock::effective_duration;
use crate::playback::speed::SPEED_OPTIONS;
use crate::playback::state::{ActiveSession, DecodeStatus, PlaybackState, Transport};
use crate::playback::ticker::{ProgressTicker, SessionId, TickOutcome, TickScheduler};
use crate::playback::view::UiState;

/// Fetch-and-decode work for one selection, safe to run off the UI thread
pub struct DecodeRequest {
    generation: u64,
    location: FileLocation,
    decoder: Arc<dyn AwaitableDecoder>,
}

impl DecodeRequest {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn run(self) -> DecodeOutcome {
        let result = match self.location.fetch().await {
            Ok(bytes) => self.decoder.decode(bytes, self.location.extension_hint()).await,
            Err(e) => Err(e),
        };
        DecodeOutcome {
            generation: self.generation,
            result,
        }
    }
}

pub struct DecodeOutcome {
    pub generation: u64,
    pub result: Result<DecodedAudio>,
}

pub struct PlaybackController {
    platform: AudioPlatform,
    scheduler: Box<dyn TickScheduler>,
    state: PlaybackState,
    /// A completed session still playing out its queued tail
    draining: Option<Box<dyn SessionHandle>>,
    next_session: u64,
}

impl PlaybackController {
    pub fn new(
        platform: AudioPlatform,
        scheduler: Box<dyn TickScheduler>,
        default_speed_index: Option<usize>,
    ) -> Self {
        let speed_index = default_speed_index.filter(|i| *i < SPEED_OPTIONS.len());
        Self {
            platform,
            scheduler,
            state: PlaybackState::new(speed_index),
            draining: None,
            next_session: 0,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn view(&self) -> UiState {
        UiState::from_state(&self.state)
    }

    /// Replace the current selection with the first chosen file and return
    /// the decode work for it. Choosing nothing leaves everything as it was.
    pub fn select_file(&mut self, choices: Vec<PathBuf>) -> Option<DecodeRequest> {
        let Some(file) = SelectedFile::from_choices(&choices) else {
            debug!("File picker closed without a selection");
            return None;
        };

        // The old buffer is about to be superseded
        self.stop();

        info!("Selected {}", file.location().path().display());
        self.state.selected = Some(file);
        self.state.file_generation += 1;
        self.state.decode = DecodeStatus::Empty;

        self.begin_decode()
    }

    /// Mark the current selection as decoding and hand out the work
    pub fn begin_decode(&mut self) -> Option<DecodeRequest> {
        let location = self.state.selected.as_ref()?.location().clone();
        self.state.decode = DecodeStatus::Pending;

        Some(DecodeRequest {
            generation: self.state.file_generation,
            location,
            decoder: self.platform.decoder(),
        })
    }

    pub fn finish_decode(&mut self, outcome: DecodeOutcome) {
        if outcome.generation != self.state.file_generation {
            debug!(
                "Dropping decode result for superseded selection {} (current {})",
                outcome.generation, self.state.file_generation
            );
            return;
        }

        match outcome.result {
            Ok(audio) => {
                info!(
                    "Decoded {:.1}s of audio ({} ch @ {} Hz)",
                    audio.native_duration_seconds(),
                    audio.channels(),
                    audio.sample_rate()
                );
                self.state.decode = DecodeStatus::Ready(audio);
            }
            Err(e) => {
                error!("Could not decode selected file: {}", e);
                self.state.decode = DecodeStatus::Failed(e.to_string());
            }
        }
    }

    /// Decode the current selection and wait for it
    pub async fn decode(&mut self) {
        if let Some(request) = self.begin_decode() {
            let outcome = request.run().await;
            self.finish_decode(outcome);
        }
    }

    /// Takes effect on the next Play
    pub fn select_speed(&mut self, index: usize) {
        if index < SPEED_OPTIONS.len() {
            self.state.speed_index = Some(index);
        } else {
            warn!("Ignoring unknown speed option {}", index);
        }
    }

    pub fn speed_index(&self) -> usize {
        self.state.speed().index()
    }

    /// Start a fresh session from the beginning of the decoded buffer. Any
    /// session already playing is halted first.
    pub fn play(&mut self) -> Result<SessionId> {
        let audio = match self.state.decode.audio() {
            Some(audio) => audio.clone(),
            None => {
                warn!("Play pressed with no decoded audio");
                return Err(PlayerError::NotReady);
            }
        };

        self.stop();

        let speed = self.state.speed();
        let rate = speed.multiplier();
        let mut handle = self.platform.create_session(audio.clone(), rate)?;
        handle.start()?;

        self.next_session += 1;
        let id = SessionId(self.next_session);
        let effective = effective_duration(audio.native_duration_seconds(), rate);
        let target = effective.floor() as u64;
        let timer = self.scheduler.start(id);

        info!(
            "Session {} playing at {} ({:.1}s effective)",
            id,
            speed.label(),
            effective
        );

        self.state.transport = Transport::Playing(ActiveSession {
            id,
            speed,
            effective_duration: effective,
            handle,
            ticker: ProgressTicker::new(id, target, timer),
        });

        Ok(id)
    }

    /// Halt the active session. Returns false when nothing was playing.
    pub fn stop(&mut self) -> bool {
        self.halt_draining();
        match std::mem::replace(&mut self.state.transport, Transport::Idle) {
            Transport::Playing(mut session) => {
                session.handle.stop();
                info!("Session {} stopped at {}s", session.id, session.ticker.elapsed());
                // Dropping the session cancels its ticker
                true
            }
            Transport::Idle => false,
        }
    }

    /// One second of progress for `session`. Ticks for any other session are
    /// ignored and return None.
    pub fn tick(&mut self, session: SessionId) -> Option<TickOutcome> {
        let active = match &mut self.state.transport {
            Transport::Playing(active) if active.id == session => active,
            _ => {
                debug!("Ignoring tick from stale session {}", session);
                return None;
            }
        };

        let outcome = active.ticker.tick();
        if outcome == TickOutcome::Completed {
            info!("Session {} completed", session);
            self.complete();
        }

        Some(outcome)
    }

    /// Natural end: the same state as Stop, but output already queued is
    /// allowed to reach the device. The next Play, Stop or selection halts it.
    fn complete(&mut self) {
        self.halt_draining();
        if let Transport::Playing(session) =
            std::mem::replace(&mut self.state.transport, Transport::Idle)
        {
            let ActiveSession { id, mut handle, .. } = session;
            if handle.is_finished() {
                handle.stop();
            } else {
                debug!("Session {} reached its length with output still queued", id);
                self.draining = Some(handle);
            }
        }
    }

    fn halt_draining(&mut self) {
        if let Some(mut handle) = self.draining.take() {
            handle.stop();
        }
    }

    pub fn open_about(&mut self) {
        self.state.about_visible = true;
    }

    pub fn close_about(&mut self) {
        self.state.about_visible = false;
    }

    pub fn toggle_about(&mut self) {
        self.state.about_visible = !self.state.about_visible;
    }
}
