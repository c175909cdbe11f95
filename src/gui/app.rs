//! ENADE Dashboard Main Application
//! Main window with control panel and dashboard viewer.

use crate::charts::StaticChartRenderer;
use crate::config::DatasetConfig;
use crate::dashboard::Dashboard;
use crate::data::{DataLoader, LoadedTables, PipelineCache};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use egui::SidePanel;
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use tracing::{error, info, warn};

/// Table loading result from background thread
enum LoadResult {
    Complete(LoadedTables),
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    config: DatasetConfig,
    cache: PipelineCache,
    dashboard: Option<Dashboard>,
    /// Set when the dashboard cannot be built at all
    fatal: Option<String>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async table loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DatasetConfig) -> Self {
        let mut app = Self {
            config,
            cache: PipelineCache::new(),
            dashboard: None,
            fatal: None,
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
            load_rx: None,
            is_loading: false,
        };
        app.start_loading();
        app
    }

    /// App that only shows `message`, e.g. for an unusable configuration.
    pub fn failed(_cc: &eframe::CreationContext<'_>, message: String) -> Self {
        let mut control_panel = ControlPanel::new();
        control_panel.set_status(&format!("Error: {message}"));
        Self {
            config: DatasetConfig::default(),
            cache: PipelineCache::new(),
            dashboard: None,
            fatal: Some(message),
            control_panel,
            chart_viewer: ChartViewer::new(),
            load_rx: None,
            is_loading: false,
        }
    }

    /// Read every table in a background thread.
    fn start_loading(&mut self) {
        if self.is_loading {
            return;
        }
        self.is_loading = true;
        self.control_panel.set_status("Loading data...");

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let config = self.config.clone();

        thread::spawn(move || {
            let result = match DataLoader::new(&config).load_all() {
                Ok(tables) => LoadResult::Complete(tables),
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for table loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };
        match rx.try_recv() {
            Ok(LoadResult::Complete(tables)) => {
                self.is_loading = false;
                let tables = self.cache.insert_loaded(&self.config, tables);
                self.build_dashboard(&tables);
            }
            Ok(LoadResult::Error(message)) => {
                self.is_loading = false;
                self.fail(message);
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => {
                self.load_rx = Some(rx);
            }
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                self.is_loading = false;
                self.fail("Loader thread stopped unexpectedly".to_string());
            }
        }
    }

    fn build_dashboard(&mut self, tables: &LoadedTables) {
        match Dashboard::from_tables(&self.config, tables, &mut self.cache) {
            Ok(dashboard) => {
                self.control_panel.update_courses(dashboard.courses.ready());
                self.control_panel.export_enabled = true;
                self.control_panel.set_status(&format!(
                    "Ready: {} participants",
                    dashboard
                        .overview
                        .ready()
                        .map(|o| o.summary.count)
                        .unwrap_or(0)
                ));
                self.dashboard = Some(dashboard);
            }
            Err(e) => self.fail(e.to_string()),
        }
    }

    fn fail(&mut self, message: String) {
        error!(%message, "dashboard unavailable");
        self.control_panel.set_status(&format!("Error: {message}"));
        self.dashboard = None;
        self.fatal = Some(message);
    }

    /// Export the current charts as PNG files into a chosen folder
    fn handle_export_png(&mut self) {
        let Some(dashboard) = &self.dashboard else {
            self.control_panel.set_status("No charts to export");
            return;
        };

        let Some(dir) = rfd::FileDialog::new()
            .set_title("Export charts")
            .pick_folder()
        else {
            return; // User cancelled
        };

        let threshold = self.control_panel.settings.min_participants;
        match StaticChartRenderer::export_dashboard(dashboard, threshold, &dir) {
            Ok(files) => {
                info!(count = files.len(), "png export finished");
                self.control_panel
                    .set_status(&format!("Exported {} charts to {}", files.len(), dir.display()));
                if let Err(e) = open::that(&dir) {
                    warn!(error = %e, "could not open export folder");
                }
            }
            Err(e) => {
                self.control_panel.set_status(&format!("Export Error: {e}"));
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        let courses = self.dashboard.as_ref().and_then(|d| d.courses.ready());
        let mut action = ControlPanelAction::None;
        SidePanel::left("control_panel")
            .resizable(true)
            .default_width(300.0)
            .min_width(260.0)
            .show(ctx, |ui| {
                action = self.control_panel.show(ui, courses);
            });

        if action == ControlPanelAction::ExportPng {
            self.handle_export_png();
        }

        // Central panel - Dashboard
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(
                ui,
                self.dashboard.as_ref(),
                self.fatal.as_deref(),
                &self.control_panel.settings,
            );
        });
    }
}
