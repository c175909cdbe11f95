//! Overall score statistics and the score histogram.

use crate::data::DataProcessor;
use crate::stats::{ScoreSummary, StatsCalculator};
use polars::prelude::*;

const MAX_BINS: usize = 40;

/// Overall performance section.
#[derive(Debug, Clone)]
pub struct Overview {
    pub summary: ScoreSummary,
    pub histogram: Vec<HistogramBin>,
}

impl Overview {
    /// `None` when the score column is absent or holds no values.
    pub fn from_frame(df: &DataFrame, score_col: &str) -> Option<Self> {
        let scores = score_values(df, score_col)?;
        if scores.is_empty() {
            return None;
        }
        Some(Self {
            summary: StatsCalculator::summarize(&scores),
            histogram: histogram(&scores, MAX_BINS),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Non-missing values of the score column, or `None` if the column is absent.
pub fn score_values(df: &DataFrame, score_col: &str) -> Option<Vec<f64>> {
    df.get_column_index(score_col)?;
    let values = DataProcessor::f64_values(df, score_col).ok()?;
    Some(values.into_iter().flatten().collect())
}

/// Equal-width bins on "nice" boundaries, at most about `max_bins` of them.
pub fn histogram(values: &[f64], max_bins: usize) -> Vec<HistogramBin> {
    let Some(min) = values.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = values.iter().copied().fold(min, f64::max);

    let step = if max > min {
        nice_step(max - min, max_bins)
    } else {
        1.0
    };
    let start = (min / step).floor() * step;
    let n_bins = (((max - start) / step).floor() as usize + 1).max(1);

    let mut bins: Vec<HistogramBin> = (0..n_bins)
        .map(|i| HistogramBin {
            start: start + i as f64 * step,
            end: start + (i + 1) as f64 * step,
            count: 0,
        })
        .collect();
    for &v in values {
        let idx = (((v - start) / step).floor() as usize).min(n_bins - 1);
        bins[idx].count += 1;
    }

    // The last bin only exists to hold `max` when it sits on a boundary
    if bins.len() > 1 && bins.last().is_some_and(|b| b.count == 0) {
        bins.pop();
    }
    bins
}

pub fn nice_step(range: f64, target_steps: usize) -> f64 {
    let raw_step = range / target_steps as f64;
    let magnitude = 10f64.powf(raw_step.log10().floor());
    let normalized = raw_step / magnitude;

    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };

    nice * magnitude
}
