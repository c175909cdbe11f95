//! Chart Plotter Module
//! Draws the dashboard charts interactively using egui_plot.

use super::label_at;
use crate::analysis::{BoxplotStats, Butterfly, CategoryShare, HistogramBin, IncomeBracket, Parent};
use egui::{Color32, RichText};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Plot, PlotPoint, PlotPoints, Polygon, Text,
};
use std::f64::consts::TAU;

pub const HISTOGRAM_COLOR: Color32 = Color32::from_rgb(76, 175, 80);
pub const AGE_COLOR: Color32 = Color32::from_rgb(23, 190, 207);
pub const INCOME_COLOR: Color32 = Color32::from_rgb(148, 103, 189);
pub const MOTHER_COLOR: Color32 = Color32::from_rgb(31, 119, 180);
pub const FATHER_COLOR: Color32 = Color32::from_rgb(255, 127, 14);

pub const SEX_COLORS: [(&str, Color32); 3] = [
    ("Masculino", Color32::from_rgb(123, 104, 238)),
    ("Feminino", Color32::from_rgb(238, 130, 238)),
    ("Não Informado", Color32::from_rgb(211, 211, 211)),
];

pub const RACE_COLORS: [(&str, Color32); 6] = [
    ("Branca", Color32::from_rgb(255, 222, 173)),
    ("Preta", Color32::from_rgb(139, 69, 19)),
    ("Parda", Color32::from_rgb(205, 133, 63)),
    ("Amarela", Color32::from_rgb(244, 164, 96)),
    ("Indigena", Color32::from_rgb(218, 165, 32)),
    ("Não Declarada", Color32::from_rgb(211, 211, 211)),
];

/// Fallback colors for categories without a fixed color
pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(31, 119, 180),
    Color32::from_rgb(255, 127, 14),
    Color32::from_rgb(44, 160, 44),
    Color32::from_rgb(214, 39, 40),
    Color32::from_rgb(148, 103, 189),
    Color32::from_rgb(140, 86, 75),
    Color32::from_rgb(227, 119, 194),
    Color32::from_rgb(127, 127, 127),
    Color32::from_rgb(188, 189, 34),
    Color32::from_rgb(23, 190, 207),
];

const VIRIDIS: [Color32; 5] = [
    Color32::from_rgb(68, 1, 84),
    Color32::from_rgb(59, 82, 139),
    Color32::from_rgb(33, 145, 140),
    Color32::from_rgb(94, 201, 98),
    Color32::from_rgb(253, 231, 37),
];

const PIE_INNER: f64 = 0.5;
const PIE_OUTER: f64 = 1.0;
const PIE_LABEL: f64 = 1.2;

/// Creates the dashboard charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Fixed color for a category, or a palette color by position.
    pub fn category_color(scale: &[(&str, Color32)], category: &str, index: usize) -> Color32 {
        scale
            .iter()
            .find(|(name, _)| *name == category)
            .map(|(_, color)| *color)
            .unwrap_or(PALETTE[index % PALETTE.len()])
    }

    /// Viridis color for `t` in [0, 1].
    pub fn viridis(t: f64) -> Color32 {
        let t = t.clamp(0.0, 1.0) * (VIRIDIS.len() - 1) as f64;
        let i = (t.floor() as usize).min(VIRIDIS.len() - 2);
        let frac = (t - i as f64) as f32;
        let (a, b) = (VIRIDIS[i], VIRIDIS[i + 1]);
        let lerp = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * frac).round() as u8;
        Color32::from_rgb(lerp(a.r(), b.r()), lerp(a.g(), b.g()), lerp(a.b(), b.b()))
    }

    /// Score distribution, one bar per bin.
    pub fn draw_histogram(ui: &mut egui::Ui, bins: &[HistogramBin]) {
        let bars: Vec<Bar> = bins
            .iter()
            .map(|b| {
                Bar::new((b.start + b.end) / 2.0, b.count as f64)
                    .width(b.end - b.start)
                    .name(format!("{:.1} - {:.1}", b.start, b.end))
            })
            .collect();

        Plot::new("score_histogram")
            .height(300.0)
            .x_axis_label("Nota Total")
            .y_axis_label("Número de Participantes")
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .color(HISTOGRAM_COLOR.gamma_multiply(0.7))
                        .name("Participantes"),
                );
            });
    }

    /// Donut chart with percentage labels around it.
    pub fn draw_pie(
        ui: &mut egui::Ui,
        id: &str,
        shares: &[CategoryShare],
        scale: &[(&str, Color32)],
    ) {
        Plot::new(id)
            .height(260.0)
            .data_aspect(1.0)
            .show_axes([false, false])
            .show_grid(false)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .legend(Legend::default())
            .include_x(-1.5)
            .include_x(1.5)
            .include_y(-1.4)
            .include_y(1.4)
            .show(ui, |plot_ui| {
                let mut start = 0.0;
                for (i, share) in shares.iter().enumerate() {
                    let sweep = share.percent * TAU;
                    let color = Self::category_color(scale, &share.category, i);
                    plot_ui.polygon(
                        Polygon::new(Self::donut_slice(start, sweep))
                            .fill_color(color)
                            .stroke(egui::Stroke::new(1.0, Color32::WHITE))
                            .name(&share.category),
                    );

                    let mid = start + sweep / 2.0;
                    let (x, y) = Self::polar(PIE_LABEL, mid);
                    plot_ui.text(
                        Text::new(
                            PlotPoint::new(x, y),
                            RichText::new(format!("{:.1}%", share.percent * 100.0)).size(12.0),
                        )
                        .color(Color32::BLACK),
                    );
                    start += sweep;
                }
            });
    }

    /// Clockwise from 12 o'clock, like a stacked theta encoding.
    fn polar(radius: f64, angle: f64) -> (f64, f64) {
        (radius * angle.sin(), radius * angle.cos())
    }

    fn donut_slice(start: f64, sweep: f64) -> PlotPoints {
        let steps = ((sweep / TAU) * 96.0).ceil().max(2.0) as usize;
        let outer = (0..=steps)
            .map(|k| Self::polar(PIE_OUTER, start + sweep * k as f64 / steps as f64));
        let inner = (0..=steps)
            .rev()
            .map(|k| Self::polar(PIE_INNER, start + sweep * k as f64 / steps as f64));
        outer.chain(inner).map(|(x, y)| [x, y]).collect()
    }

    /// Vertical bars over categorical labels, in the given order.
    pub fn draw_category_bars(
        ui: &mut egui::Ui,
        id: &str,
        labels: &[String],
        values: &[f64],
        color: Color32,
        x_label: &str,
        y_label: &str,
    ) {
        let bars: Vec<Bar> = values
            .iter()
            .zip(labels)
            .enumerate()
            .map(|(i, (&v, label))| Bar::new(i as f64, v).width(0.7).name(label))
            .collect();
        let x_labels = labels.to_vec();

        Plot::new(id)
            .height(300.0)
            .x_axis_label(x_label)
            .y_axis_label(y_label)
            .allow_scroll(false)
            .x_axis_formatter(move |mark, _range| label_at(&x_labels, mark.value))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(color));
            });
    }

    pub fn draw_age_bars(ui: &mut egui::Ui, counts: &[(String, usize)]) {
        let labels: Vec<String> = counts.iter().map(|(l, _)| l.clone()).collect();
        let values: Vec<f64> = counts.iter().map(|(_, c)| *c as f64).collect();
        Self::draw_category_bars(
            ui,
            "age_bars",
            &labels,
            &values,
            AGE_COLOR,
            "Faixa Etária",
            "Quantidade",
        );
    }

    pub fn draw_income_bars(ui: &mut egui::Ui, brackets: &[IncomeBracket]) {
        let labels: Vec<String> = brackets.iter().map(|b| b.label.clone()).collect();
        let values: Vec<f64> = brackets.iter().map(|b| b.quantity).collect();
        Self::draw_category_bars(
            ui,
            "income_bars",
            &labels,
            &values,
            INCOME_COLOR.gamma_multiply(0.8),
            "Faixa de Renda (Salários Mínimos)",
            "Número de Estudantes",
        );
    }

    /// Mirrored horizontal bars: fathers left of zero, mothers right.
    pub fn draw_butterfly(ui: &mut egui::Ui, butterfly: &Butterfly) {
        let levels = butterfly.level_order.clone();
        let position = |level: &str| levels.iter().position(|l| l == level).unwrap_or(0) as f64;

        let bars_for = |parent: Parent| -> Vec<Bar> {
            butterfly
                .rows
                .iter()
                .filter(|r| r.parent == parent)
                .map(|r| {
                    Bar::new(position(&r.level), r.signed)
                        .width(0.7)
                        .name(format!("{} · {}: {:.0}", parent.label(), r.level, r.quantity))
                })
                .collect()
        };
        let fathers = bars_for(Parent::Father);
        let mothers = bars_for(Parent::Mother);
        let y_labels = butterfly.level_order.clone();
        let max = butterfly.max_quantity.max(1.0);

        Plot::new("parent_education")
            .height(300.0)
            .x_axis_label("Quantidade")
            .allow_scroll(false)
            .legend(Legend::default())
            .include_x(-max)
            .include_x(max)
            .x_axis_formatter(|mark, _range| format!("{:.0}", mark.value.abs()))
            .y_axis_formatter(move |mark, _range| label_at(&y_labels, mark.value))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(
                    BarChart::new(fathers)
                        .horizontal()
                        .color(FATHER_COLOR)
                        .name(Parent::Father.label()),
                );
                plot_ui.bar_chart(
                    BarChart::new(mothers)
                        .horizontal()
                        .color(MOTHER_COLOR)
                        .name(Parent::Mother.label()),
                );
            });
    }

    /// One min-max box per course, colored by participant count.
    pub fn draw_course_boxplots(ui: &mut egui::Ui, boxes: &[BoxplotStats]) {
        let x_labels: Vec<String> = boxes.iter().map(|b| b.course.clone()).collect();
        let (lo, hi) = boxes
            .iter()
            .fold((usize::MAX, 0), |(lo, hi), b| (lo.min(b.count), hi.max(b.count)));

        Plot::new("course_boxplots")
            .height(500.0)
            .y_axis_label("Distribuição da Nota Total")
            .allow_scroll(false)
            .x_axis_formatter(move |mark, _range| label_at(&x_labels, mark.value))
            .show(ui, |plot_ui| {
                for (i, b) in boxes.iter().enumerate() {
                    let t = if hi > lo {
                        (b.count - lo) as f64 / (hi - lo) as f64
                    } else {
                        0.5
                    };
                    let color = Self::viridis(t);
                    let elem = BoxElem::new(i as f64, BoxSpread::new(b.min, b.q1, b.median, b.q3, b.max))
                        .box_width(0.5)
                        .fill(color.gamma_multiply(0.6))
                        .stroke(egui::Stroke::new(1.5, color))
                        .name(format!(
                            "{}\nNº Participantes: {}\nMediana: {:.2}\nQ1: {:.2}  Q3: {:.2}\nMín: {:.2}  Máx: {:.2}",
                            b.course, b.count, b.median, b.q1, b.q3, b.min, b.max
                        ));
                    plot_ui.box_plot(BoxPlot::new(vec![elem]).name(&b.course));
                }
            });
    }
}
