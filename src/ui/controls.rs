// Widget rows. Each returns what the user asked for; nothing here touches
// playback state directly.
use std::path::PathBuf;

use eframe::egui;

use crate::file::SUPPORTED_EXTENSIONS;
use crate::playback::{UiState, SPEED_OPTIONS};

const ABOUT_TEXT: &str = "VaporPlay plays a local audio file at 0.5x, 0.8x, 1.0x or 1.25x. \
Slower speeds lower the pitch, faster speeds raise it.";

fn pick_audio_file() -> Vec<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Audio", SUPPORTED_EXTENSIONS)
        .pick_file()
        .into_iter()
        .collect()
}

/// Picker button, or the chosen filename with a "Select new file" button
pub fn file_row(ui: &mut egui::Ui, view: &UiState) -> Option<Vec<PathBuf>> {
    let mut choices = None;

    ui.horizontal(|ui| {
        if view.picker_visible && ui.button("Choose audio file...").clicked() {
            choices = Some(pick_audio_file());
        }
        if let Some(name) = &view.filename {
            ui.label(egui::RichText::new(name).strong());
        }
        if view.select_new_visible && ui.button("Select new file").clicked() {
            choices = Some(pick_audio_file());
        }
    });

    choices
}

pub fn speed_row(ui: &mut egui::Ui, view: &UiState) -> Option<usize> {
    let mut chosen = None;

    ui.horizontal(|ui| {
        ui.label("Speed:");
        for speed in SPEED_OPTIONS {
            if ui
                .radio(view.speed_index == speed.index(), speed.label())
                .clicked()
            {
                chosen = Some(speed.index());
            }
        }
    });

    chosen
}

/// (play clicked, stop clicked)
pub fn transport_row(ui: &mut egui::Ui, view: &UiState) -> (bool, bool) {
    ui.horizontal(|ui| {
        let play = ui
            .add_enabled(view.play_enabled, egui::Button::new("Play"))
            .clicked();
        let stop = ui
            .add_enabled(view.stop_enabled, egui::Button::new("Stop"))
            .clicked();
        (play, stop)
    })
    .inner
}

/// Returns true when the user acknowledged the overlay
pub fn about_window(ctx: &egui::Context) -> bool {
    let mut acknowledged = false;

    egui::Window::new("About")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            ui.label(ABOUT_TEXT);
            ui.add_space(6.0);
            if ui.button("OK").clicked() {
                acknowledged = true;
            }
        });

    acknowledged
}
