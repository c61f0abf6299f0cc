// VaporPlay - local audio player with selectable playback speed
// Module declarations
pub mod audio;
pub mod error;
pub mod file;
pub mod platform;
pub mod playback;
pub mod settings;
mod state;
mod ui;

use anyhow::{anyhow, Context};
use eframe::egui;
use log::{info, warn};

use settings::AppSettings;
use state::AppState;
use ui::app::VaporPlayApp;

pub use error::{PlayerError, Result};

pub fn run() -> anyhow::Result<()> {
    let config_dir = settings::config_dir();
    let settings = AppSettings::load(&config_dir).unwrap_or_else(|e| {
        warn!("Ignoring unreadable settings: {}", e);
        AppSettings::default()
    });

    // Decode tasks and tickers run here; the window keeps the main thread
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let handle = runtime.handle().clone();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([
            settings.interface.window_width,
            settings.interface.window_height,
        ]),
        ..Default::default()
    };

    info!("Starting VaporPlay (settings in {:?})", config_dir);
    eframe::run_native(
        "VaporPlay",
        native_options,
        Box::new(move |cc| {
            let (state, events) = AppState::new(cc.egui_ctx.clone(), handle, settings, config_dir);
            Ok(Box::new(VaporPlayApp::new(state, events)))
        }),
    )
    .map_err(|e| anyhow!("window error: {}", e))?;

    runtime.shutdown_background();
    Ok(())
}
