use eframe::egui;

use data_sweeper::SweeperConfig;

use crate::state::AppState;
use crate::ui::{file_view, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DataSweeperApp {
    pub state: AppState,
}

impl DataSweeperApp {
    pub fn new(config: SweeperConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for DataSweeperApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: uploaded files ----
        egui::SidePanel::left("file_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: the active file ----
        egui::CentralPanel::default().show(ctx, |ui| {
            file_view::central_panel(ui, &mut self.state);
        });
    }
}
