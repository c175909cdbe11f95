//! Control Panel Widget
//! Left side panel with the interactive filters and export controls.

use crate::analysis::{CourseTable, ThresholdBounds, THRESHOLD_STEP};
use egui::{Color32, ComboBox, RichText};

/// User selections that re-slice the loaded data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserSettings {
    /// Minimum participants for a course to appear in the boxplot
    pub min_participants: usize,
    pub selected_course: Option<String>,
}

/// Left side control panel with filters, export and status.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub bounds: Option<ThresholdBounds>,
    pub status: String,
    pub export_enabled: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            settings: UserSettings::default(),
            bounds: None,
            status: "Loading data...".to_string(),
            export_enabled: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the filters for a freshly built course table.
    pub fn update_courses(&mut self, courses: Option<&CourseTable>) {
        self.bounds = courses.and_then(CourseTable::threshold_bounds);
        self.settings.min_participants = self.bounds.map(|b| b.default).unwrap_or(0);
        self.settings.selected_course = courses
            .and_then(|c| c.course_names().first().map(|name| name.to_string()));
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui, courses: Option<&CourseTable>) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📊 ENADE 2022")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Análise Detalhada")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Course Filters =====
        ui.label(RichText::new("🎓 Filtros de Curso").size(14.0).strong());
        ui.add_space(5.0);

        match (self.bounds, courses) {
            (Some(bounds), Some(courses)) => {
                ui.label("Filtrar cursos com mínimo de participantes:");
                ui.add(
                    egui::Slider::new(&mut self.settings.min_participants, bounds.min..=bounds.max)
                        .step_by(THRESHOLD_STEP as f64),
                );

                ui.add_space(10.0);
                ui.label("Selecione um curso para análise detalhada:");
                let selected = self.settings.selected_course.clone().unwrap_or_default();
                ComboBox::from_id_salt("selected_course")
                    .width(ui.available_width())
                    .selected_text(selected.as_str())
                    .show_ui(ui, |ui| {
                        for name in courses.course_names() {
                            if ui.selectable_label(selected == name, name).clicked() {
                                self.settings.selected_course = Some(name.to_string());
                            }
                        }
                    });
            }
            _ => {
                ui.label(RichText::new("Sem dados de curso").color(Color32::GRAY));
            }
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled, |ui| {
                let button = egui::Button::new(RichText::new("🖼 Export PNG").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportPng;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status =====
        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Exported") || self.status.contains("Ready") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    ExportPng,
}
