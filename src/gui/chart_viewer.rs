//! Chart Viewer Widget
//! Central scrollable panel drawing every dashboard section with egui_plot.

use crate::analysis::CourseTable;
use crate::charts::{ChartPlotter, RACE_COLORS, SEX_COLORS};
use crate::dashboard::{Dashboard, Section};
use crate::gui::control_panel::UserSettings;
use crate::stats::{format_count, MetricDelta, ScoreSummary};
use egui::{Color32, RichText, ScrollArea};

const SECTION_SPACING: f32 = 20.0;
const WARNING_COLOR: Color32 = Color32::from_rgb(255, 193, 7);
const POSITIVE_COLOR: Color32 = Color32::from_rgb(40, 167, 69);
const NEGATIVE_COLOR: Color32 = Color32::from_rgb(220, 53, 69);

/// Scrollable dashboard display.
#[derive(Default)]
pub struct ChartViewer;

impl ChartViewer {
    pub fn new() -> Self {
        Self
    }

    /// Draw the dashboard, or the fatal message that replaced it.
    pub fn show(
        &self,
        ui: &mut egui::Ui,
        dashboard: Option<&Dashboard>,
        fatal: Option<&str>,
        settings: &UserSettings,
    ) {
        if let Some(message) = fatal {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new(format!("❌ {message}")).size(18.0).color(NEGATIVE_COLOR));
            });
            return;
        }
        let Some(dashboard) = dashboard else {
            ui.centered_and_justified(|ui| {
                ui.spinner();
            });
            return;
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                Self::draw_header(ui, dashboard);
                Self::draw_overview(ui, dashboard);
                Self::draw_demographics(ui, dashboard);
                Self::draw_socioeconomic(ui, dashboard);
                Self::draw_courses(ui, dashboard, settings);

                ui.add_space(SECTION_SPACING);
                ui.separator();
                ui.label(
                    RichText::new("Dashboard ENADE 2022 • Dados: INEP")
                        .size(11.0)
                        .color(Color32::GRAY),
                );
            });
    }

    fn draw_header(ui: &mut egui::Ui, dashboard: &Dashboard) {
        ui.heading(
            RichText::new(format!("📊 Análise de Desempenho ENADE {}", dashboard.target_year))
                .size(26.0)
                .strong(),
        );
        ui.label(
            RichText::new("Exploração das notas e do perfil socioeconômico dos participantes")
                .color(Color32::GRAY),
        );
        for notice in &dashboard.notices {
            Self::warning(ui, notice);
        }
        ui.add_space(SECTION_SPACING);
    }

    fn draw_overview(ui: &mut egui::Ui, dashboard: &Dashboard) {
        Self::section_title(ui, "📈 Visão Geral do Desempenho");
        match &dashboard.overview {
            Section::Ready(overview) => {
                Self::summary_row(ui, &overview.summary, None);
                ui.add_space(10.0);
                ui.label(RichText::new("Distribuição das Notas").strong());
                ChartPlotter::draw_histogram(ui, &overview.histogram);
            }
            Section::Unavailable(message) => Self::warning(ui, message),
        }
        ui.add_space(SECTION_SPACING);
    }

    fn draw_demographics(ui: &mut egui::Ui, dashboard: &Dashboard) {
        Self::section_title(ui, "👥 Perfil Demográfico");
        ui.columns(2, |cols| {
            cols[0].label(RichText::new("Distribuição por Sexo").strong());
            match &dashboard.sex {
                Section::Ready(shares) if !shares.is_empty() => {
                    ChartPlotter::draw_pie(&mut cols[0], "sex_pie", shares, &SEX_COLORS)
                }
                Section::Ready(_) => Self::info(&mut cols[0], "Sem participantes por sexo"),
                Section::Unavailable(message) => Self::warning(&mut cols[0], message),
            }

            cols[1].label(RichText::new("Distribuição por Cor/Raça").strong());
            match &dashboard.race {
                Section::Ready(shares) if !shares.is_empty() => {
                    ChartPlotter::draw_pie(&mut cols[1], "race_pie", shares, &RACE_COLORS)
                }
                Section::Ready(_) => Self::info(&mut cols[1], "Sem participantes por cor/raça"),
                Section::Unavailable(message) => Self::warning(&mut cols[1], message),
            }
        });

        ui.add_space(10.0);
        ui.label(RichText::new("Distribuição de Idade").strong());
        match &dashboard.age {
            Section::Ready(counts) => ChartPlotter::draw_age_bars(ui, counts),
            Section::Unavailable(message) => Self::warning(ui, message),
        }
        ui.add_space(SECTION_SPACING);
    }

    fn draw_socioeconomic(ui: &mut egui::Ui, dashboard: &Dashboard) {
        Self::section_title(ui, "💰 Perfil Socioeconômico");
        ui.columns(2, |cols| {
            cols[0].label(RichText::new("Renda Familiar Mensal").strong());
            match &dashboard.income {
                Section::Ready(brackets) if !brackets.is_empty() => {
                    ChartPlotter::draw_income_bars(&mut cols[0], brackets)
                }
                Section::Ready(_) => Self::info(&mut cols[0], "Sem faixas de renda com participantes"),
                Section::Unavailable(message) => Self::warning(&mut cols[0], message),
            }

            cols[1].label(RichText::new("Escolaridade dos Pais x Mães").strong());
            match &dashboard.education {
                Section::Ready(butterfly) if !butterfly.rows.is_empty() => {
                    ChartPlotter::draw_butterfly(&mut cols[1], butterfly)
                }
                Section::Ready(_) => Self::info(&mut cols[1], "Sem colunas de escolaridade"),
                Section::Unavailable(message) => Self::warning(&mut cols[1], message),
            }
        });
        ui.add_space(SECTION_SPACING);
    }

    fn draw_courses(ui: &mut egui::Ui, dashboard: &Dashboard, settings: &UserSettings) {
        Self::section_title(ui, "🎓 Desempenho por Curso");
        let courses = match &dashboard.courses {
            Section::Ready(courses) => courses,
            Section::Unavailable(message) => {
                Self::warning(ui, message);
                return;
            }
        };
        if courses.is_empty() {
            Self::info(ui, "Nenhum curso com notas disponíveis");
            return;
        }

        let threshold = settings.min_participants;
        ui.label(
            RichText::new(format!(
                "Distribuição das Notas por Curso (≥ {threshold} participantes)"
            ))
            .strong(),
        );
        let boxes = courses.boxplots(threshold);
        if boxes.is_empty() {
            Self::info(
                ui,
                &format!("Nenhum curso com pelo menos {threshold} participantes"),
            );
        } else {
            ChartPlotter::draw_course_boxplots(ui, &boxes);
        }

        ui.add_space(10.0);
        if let Some(course) = settings.selected_course.as_deref() {
            Self::draw_course_detail(ui, dashboard, courses, course);
        }
    }

    fn draw_course_detail(
        ui: &mut egui::Ui,
        dashboard: &Dashboard,
        courses: &CourseTable,
        course: &str,
    ) {
        ui.label(RichText::new(format!("Análise Detalhada: {course}")).size(16.0).strong());
        match courses.detail(course) {
            Some(summary) => {
                let overall = dashboard.overview.ready().map(|o| &o.summary);
                Self::summary_row(ui, &summary, overall);
            }
            None => Self::info(ui, "Curso sem notas para detalhar"),
        }
    }

    /// Participant count followed by the five score statistics.
    fn summary_row(ui: &mut egui::Ui, summary: &ScoreSummary, overall: Option<&ScoreSummary>) {
        let metrics = summary.deltas_against(overall);
        ui.horizontal_wrapped(|ui| {
            Self::metric_card(ui, "Nº de Participantes", &format_count(summary.count), None);
            for MetricDelta { label, value, delta } in &metrics {
                Self::metric_card(ui, label, &format!("{value:.2}"), delta.as_deref());
            }
        });
    }

    fn metric_card(ui: &mut egui::Ui, label: &str, value: &str, delta: Option<&str>) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.0, Color32::from_gray(90)))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.set_min_width(140.0);
                ui.vertical(|ui| {
                    ui.label(RichText::new(label).size(12.0).color(Color32::GRAY));
                    ui.label(RichText::new(value).size(22.0).strong());
                    if let Some(delta) = delta {
                        let color = if delta.starts_with('-') {
                            NEGATIVE_COLOR
                        } else {
                            POSITIVE_COLOR
                        };
                        ui.label(RichText::new(delta).size(12.0).color(color));
                    }
                });
            });
    }

    fn section_title(ui: &mut egui::Ui, title: &str) {
        ui.label(RichText::new(title).size(20.0).strong());
        ui.separator();
        ui.add_space(5.0);
    }

    fn warning(ui: &mut egui::Ui, message: &str) {
        ui.label(RichText::new(format!("⚠ {message}")).color(WARNING_COLOR));
    }

    fn info(ui: &mut egui::Ui, message: &str) {
        ui.label(RichText::new(format!("ℹ {message}")).color(Color32::GRAY));
    }
}
