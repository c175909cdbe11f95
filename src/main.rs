//! ENADE 2022 Dashboard - performance and socioeconomic profile explorer
//!
//! Loads the ENADE star schema from CSV files, joins dimensions onto the
//! performance fact table and displays the aggregates as interactive charts.

mod analysis;
mod charts;
mod config;
mod dashboard;
mod data;
mod gui;
mod stats;

use anyhow::anyhow;
use config::DatasetConfig;
use eframe::egui;
use gui::DashboardApp;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = DatasetConfig::from_env();
    match &config {
        Ok(config) => info!(data_dir = %config.data_dir.display(), "configuration loaded"),
        Err(e) => error!(error = %e, "invalid configuration"),
    }

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("Dashboard ENADE 2022"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Dashboard ENADE 2022",
        options,
        Box::new(move |cc| {
            Ok(Box::new(match config {
                Ok(config) => DashboardApp::new(cc, config),
                Err(e) => DashboardApp::failed(cc, e.to_string()),
            }))
        }),
    )
    .map_err(|e| anyhow!("{e}"))
}
