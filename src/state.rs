// Application state management
use std::path::PathBuf;

use eframe::egui;
use log::{error, warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::platform::AudioPlatform;
use crate::playback::{DecodeOutcome, DecodeRequest, PlaybackController, SessionId, TokioTickScheduler};
use crate::settings::AppSettings;

/// Work finished off the UI thread, delivered back to it in order
pub enum AppEvent {
    Decoded(DecodeOutcome),
    Tick(SessionId),
}

pub struct AppState {
    pub controller: PlaybackController,
    pub settings: AppSettings,
    config_dir: PathBuf,
    runtime: Handle,
    events: UnboundedSender<AppEvent>,
    repaint: egui::Context,
}

impl AppState {
    pub fn new(
        ctx: egui::Context,
        runtime: Handle,
        settings: AppSettings,
        config_dir: PathBuf,
    ) -> (Self, UnboundedReceiver<AppEvent>) {
        let (events, receiver) = unbounded_channel();

        let tick_events = events.clone();
        let tick_ctx = ctx.clone();
        let scheduler = TokioTickScheduler::new(runtime.clone(), move |session| {
            let delivered = tick_events.send(AppEvent::Tick(session)).is_ok();
            tick_ctx.request_repaint();
            delivered
        });

        let controller = PlaybackController::new(
            AudioPlatform::native(settings.playback.volume),
            Box::new(scheduler),
            Some(settings.playback.default_speed_index),
        );

        let state = Self {
            controller,
            settings,
            config_dir,
            runtime,
            events,
            repaint: ctx,
        };
        (state, receiver)
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Decoded(outcome) => self.controller.finish_decode(outcome),
            AppEvent::Tick(session) => {
                self.controller.tick(session);
            }
        }
    }

    pub fn choose_files(&mut self, choices: Vec<PathBuf>) {
        if let Some(request) = self.controller.select_file(choices) {
            self.spawn_decode(request);
        }
    }

    fn spawn_decode(&self, request: DecodeRequest) {
        let events = self.events.clone();
        let ctx = self.repaint.clone();
        self.runtime.spawn(async move {
            let outcome = request.run().await;
            if events.send(AppEvent::Decoded(outcome)).is_err() {
                warn!("Window closed before decode finished");
            }
            ctx.request_repaint();
        });
    }

    pub fn play(&mut self) {
        if let Err(e) = self.controller.play() {
            error!("Could not start playback: {}", e);
        }
    }

    pub fn stop(&mut self) {
        self.controller.stop();
    }

    /// Apply the speed choice and remember it for next launch
    pub fn select_speed(&mut self, index: usize) {
        self.controller.select_speed(index);
        let chosen = self.controller.speed_index();
        if self.settings.playback.default_speed_index == chosen {
            return;
        }
        self.settings.playback.default_speed_index = chosen;
        if let Err(e) = self.settings.save(&self.config_dir) {
            warn!("Failed to save settings: {}", e);
        }
    }
}
