mod app;
mod color;
mod state;
mod ui;

use anyhow::{Context, Result};
use app::DataSweeperApp;
use data_sweeper::SweeperConfig;
use eframe::egui;

fn main() -> Result<()> {
    env_logger::init();

    let config = SweeperConfig::from_env().context("loading settings")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Data Sweeper",
        options,
        Box::new(|_cc| Ok(Box::new(DataSweeperApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("failed to start the UI: {e}"))
}
