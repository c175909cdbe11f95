//! Charts module - interactive and static chart rendering

mod plotter;
mod renderer;

pub use plotter::{ChartPlotter, RACE_COLORS, SEX_COLORS};
pub use renderer::StaticChartRenderer;

/// Category label at an integer axis position, empty between positions.
pub(crate) fn label_at(labels: &[String], value: f64) -> String {
    let idx = value.round();
    if (value - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}
