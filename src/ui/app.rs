use eframe::egui;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::state::{AppEvent, AppState};
use crate::ui::controls::{about_window, file_row, speed_row, transport_row};

pub struct VaporPlayApp {
    pub state: AppState,
    events: UnboundedReceiver<AppEvent>,
}

impl VaporPlayApp {
    pub fn new(state: AppState, events: UnboundedReceiver<AppEvent>) -> Self {
        Self { state, events }
    }
}

impl eframe::App for VaporPlayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Background results are applied here, one at a time, before drawing
        while let Ok(event) = self.events.try_recv() {
            self.state.handle_event(event);
        }

        let view = self.state.controller.view();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("VaporPlay");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("About").clicked() {
                        self.state.controller.open_about();
                    }
                });
            });
            ui.separator();

            if let Some(choices) = file_row(ui, &view) {
                self.state.choose_files(choices);
            }
            ui.add_space(8.0);

            if let Some(index) = speed_row(ui, &view) {
                self.state.select_speed(index);
            }
            ui.add_space(8.0);

            let (play, stop) = transport_row(ui, &view);
            if play {
                self.state.play();
            }
            if stop {
                self.state.stop();
            }
            ui.add_space(8.0);

            ui.label(view.status.to_string());
        });

        if view.about_visible && about_window(ctx) {
            self.state.controller.close_about();
        }
    }
}
