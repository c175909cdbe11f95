//! Static Chart Renderer
//! Writes the dashboard charts to PNG files with plotters.

use super::label_at;
use crate::analysis::{Butterfly, HistogramBin, Parent};
use crate::dashboard::Dashboard;
use plotters::prelude::*;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::info;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 700;

const HISTOGRAM_RGB: RGBColor = RGBColor(76, 175, 80);
const AGE_RGB: RGBColor = RGBColor(23, 190, 207);
const INCOME_RGB: RGBColor = RGBColor(148, 103, 189);
const SEX_RGB: RGBColor = RGBColor(123, 104, 238);
const RACE_RGB: RGBColor = RGBColor(205, 133, 63);
const COURSE_RGB: RGBColor = RGBColor(59, 82, 139);
const FATHER_RGB: RGBColor = RGBColor(255, 127, 14);
const MOTHER_RGB: RGBColor = RGBColor(31, 119, 180);

type RenderResult<T> = Result<T, Box<dyn Error>>;

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render every available section into `dir`; returns the written files.
    ///
    /// Course means only include courses with at least `threshold` participants.
    pub fn export_dashboard(
        dashboard: &Dashboard,
        threshold: usize,
        dir: &Path,
    ) -> RenderResult<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::new();

        if let Some(overview) = dashboard.overview.ready() {
            let path = dir.join("distribuicao_notas.png");
            Self::render_histogram(&overview.histogram, &path)?;
            written.push(path);
        }
        if let Some(shares) = dashboard.sex.ready() {
            let path = dir.join("sexo.png");
            let (labels, values): (Vec<String>, Vec<f64>) = shares
                .iter()
                .map(|s| (s.category.clone(), s.quantity))
                .unzip();
            Self::render_bars("Distribuição por Sexo", &labels, &values, SEX_RGB, &path)?;
            written.push(path);
        }
        if let Some(shares) = dashboard.race.ready() {
            let path = dir.join("cor_raca.png");
            let (labels, values): (Vec<String>, Vec<f64>) = shares
                .iter()
                .map(|s| (s.category.clone(), s.quantity))
                .unzip();
            Self::render_bars("Distribuição por Cor/Raça", &labels, &values, RACE_RGB, &path)?;
            written.push(path);
        }
        if let Some(counts) = dashboard.age.ready() {
            let path = dir.join("idade.png");
            let (labels, values): (Vec<String>, Vec<f64>) = counts
                .iter()
                .map(|(l, c)| (l.clone(), *c as f64))
                .unzip();
            Self::render_bars("Distribuição de Idade", &labels, &values, AGE_RGB, &path)?;
            written.push(path);
        }
        if let Some(brackets) = dashboard.income.ready() {
            let path = dir.join("renda.png");
            let (labels, values): (Vec<String>, Vec<f64>) = brackets
                .iter()
                .map(|b| (b.label.clone(), b.quantity))
                .unzip();
            Self::render_bars("Renda Familiar Mensal", &labels, &values, INCOME_RGB, &path)?;
            written.push(path);
        }
        if let Some(butterfly) = dashboard.education.ready() {
            let path = dir.join("escolaridade_pais.png");
            Self::render_butterfly(butterfly, &path)?;
            written.push(path);
        }
        if let Some(courses) = dashboard.courses.ready() {
            let path = dir.join("media_por_curso.png");
            let (labels, values): (Vec<String>, Vec<f64>) = courses
                .courses_at_least(threshold)
                .iter()
                .map(|s| (s.course.clone(), s.mean))
                .unzip();
            Self::render_bars("Nota Média por Curso", &labels, &values, COURSE_RGB, &path)?;
            written.push(path);
        }

        info!(files = written.len(), dir = %dir.display(), "charts exported");
        Ok(written)
    }

    pub fn render_histogram(bins: &[HistogramBin], path: &Path) -> RenderResult<()> {
        let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
            return Ok(());
        };
        let y_max = bins.iter().map(|b| b.count).max().unwrap_or(1).max(1) as f64 * 1.1;

        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption("Distribuição das Notas", ("sans-serif", 28))
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(first.start..last.end, 0.0..y_max)?;
        chart
            .configure_mesh()
            .x_desc("Nota Total")
            .y_desc("Número de Participantes")
            .draw()?;
        chart.draw_series(bins.iter().map(|b| {
            Rectangle::new(
                [(b.start, 0.0), (b.end, b.count as f64)],
                HISTOGRAM_RGB.mix(0.7).filled(),
            )
        }))?;
        root.present()?;
        Ok(())
    }

    /// Vertical bars over categorical labels.
    pub fn render_bars(
        title: &str,
        labels: &[String],
        values: &[f64],
        color: RGBColor,
        path: &Path,
    ) -> RenderResult<()> {
        let n = labels.len().max(1) as f64;
        let y_max = values.iter().copied().fold(0.0, f64::max).max(1.0) * 1.1;
        let format_label = |x: &f64| label_at(labels, *x);

        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 28))
            .margin(15)
            .x_label_area_size(120)
            .y_label_area_size(80)
            .build_cartesian_2d(-0.5..n - 0.5, 0.0..y_max)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len().max(1))
            .x_label_formatter(&format_label)
            .draw()?;
        chart.draw_series(values.iter().enumerate().map(|(i, &v)| {
            let x = i as f64;
            Rectangle::new([(x - 0.35, 0.0), (x + 0.35, v)], color.filled())
        }))?;
        root.present()?;
        Ok(())
    }

    /// Mirrored horizontal bars, fathers to the left.
    pub fn render_butterfly(butterfly: &Butterfly, path: &Path) -> RenderResult<()> {
        let max = butterfly.max_quantity.max(1.0);
        let n = butterfly.level_order.len().max(1) as f64;
        let format_level = |y: &f64| label_at(&butterfly.level_order, *y);
        let format_abs = |x: &f64| format!("{:.0}", x.abs());

        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption("Escolaridade dos Pais x Mães", ("sans-serif", 28))
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(200)
            .build_cartesian_2d(-max..max, -0.5..n - 0.5)?;
        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(butterfly.level_order.len().max(1))
            .y_label_formatter(&format_level)
            .x_label_formatter(&format_abs)
            .x_desc("Quantidade")
            .draw()?;

        for (parent, color) in [(Parent::Father, FATHER_RGB), (Parent::Mother, MOTHER_RGB)] {
            chart
                .draw_series(butterfly.rows.iter().filter(|r| r.parent == parent).map(|r| {
                    let y = butterfly
                        .level_order
                        .iter()
                        .position(|l| *l == r.level)
                        .unwrap_or(0) as f64;
                    Rectangle::new([(0.0, y - 0.35), (r.signed, y + 0.35)], color.filled())
                }))?
                .label(parent.label())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
        root.present()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_histogram_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.png");
        StaticChartRenderer::render_histogram(&[], &path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_label_at() {
        let labels = vec!["Até 1 SM".to_string(), "Não Sabe".to_string()];
        assert_eq!(label_at(&labels, 0.0), "Até 1 SM");
        assert_eq!(label_at(&labels, 0.4), "");
        assert_eq!(label_at(&labels, 2.0), "");
    }
}
