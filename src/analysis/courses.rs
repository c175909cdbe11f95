//! Per-course score statistics, participant threshold and course detail.

use crate::data::{DataProcessor, ProcessorError};
use crate::stats::{ScoreSummary, StatsCalculator};
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Lowest default threshold, regardless of course sizes.
const MIN_DEFAULT_THRESHOLD: usize = 10;
pub const THRESHOLD_STEP: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct CourseStats {
    pub course: String,
    pub mean: f64,
    pub median: f64,
    pub count: usize,
}

/// Five-number summary drawn as one box (whiskers at min/max).
#[derive(Debug, Clone, PartialEq)]
pub struct BoxplotStats {
    pub course: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Slider limits for the minimum-participants filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdBounds {
    pub min: usize,
    pub max: usize,
    pub default: usize,
}

/// Scores grouped by course description.
#[derive(Debug, Clone, Default)]
pub struct CourseTable {
    /// Sorted by mean score, descending
    pub stats: Vec<CourseStats>,
    scores: BTreeMap<String, Vec<f64>>,
}

impl CourseTable {
    /// Group a course-joined frame. Rows without a course or a score are ignored.
    pub fn from_frame(
        df: &DataFrame,
        course_col: &str,
        score_col: &str,
    ) -> Result<Self, ProcessorError> {
        let courses = DataProcessor::text_values(df, course_col)?;
        let scores = DataProcessor::f64_values(df, score_col)?;

        let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for (course, score) in courses.into_iter().zip(scores) {
            if let (Some(course), Some(score)) = (course, score) {
                grouped.entry(course).or_default().push(score);
            }
        }
        Ok(Self::from_groups(grouped))
    }

    pub fn from_groups(scores: BTreeMap<String, Vec<f64>>) -> Self {
        let mut stats: Vec<CourseStats> = scores
            .par_iter()
            .map(|(course, values)| CourseStats {
                course: course.clone(),
                mean: values.iter().sum::<f64>() / values.len() as f64,
                median: StatsCalculator::median(values),
                count: values.len(),
            })
            .collect();
        stats.sort_by(|a, b| {
            b.mean
                .total_cmp(&a.mean)
                .then_with(|| a.course.cmp(&b.course))
        });
        Self { stats, scores }
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Selector options: every course, best mean first.
    pub fn course_names(&self) -> Vec<&str> {
        self.stats.iter().map(|s| s.course.as_str()).collect()
    }

    pub fn scores(&self, course: &str) -> Option<&[f64]> {
        self.scores.get(course).map(Vec::as_slice)
    }

    /// Slider bounds: [smallest course, p95 of course sizes], default
    /// max(10, p10 of course sizes) kept inside the bounds.
    pub fn threshold_bounds(&self) -> Option<ThresholdBounds> {
        let counts: Vec<f64> = self.stats.iter().map(|s| s.count as f64).collect();
        let min = self.stats.iter().map(|s| s.count).min()?;
        let max = (StatsCalculator::quantile(&counts, 0.95) as usize).max(min);
        let p10 = StatsCalculator::quantile(&counts, 0.10) as usize;
        let default = MIN_DEFAULT_THRESHOLD.max(p10).clamp(min, max);
        Some(ThresholdBounds { min, max, default })
    }

    /// Courses with at least `threshold` participants, in mean order.
    pub fn courses_at_least(&self, threshold: usize) -> Vec<&CourseStats> {
        self.stats.iter().filter(|s| s.count >= threshold).collect()
    }

    /// Box statistics of the courses passing `threshold`, highest median first.
    pub fn boxplots(&self, threshold: usize) -> Vec<BoxplotStats> {
        let mut boxes: Vec<BoxplotStats> = self
            .courses_at_least(threshold)
            .into_iter()
            .filter_map(|s| {
                let values = self.scores(&s.course)?;
                let summary = StatsCalculator::summarize(values);
                Some(BoxplotStats {
                    course: s.course.clone(),
                    count: s.count,
                    min: summary.min,
                    q1: StatsCalculator::quantile(values, 0.25),
                    median: summary.median,
                    q3: StatsCalculator::quantile(values, 0.75),
                    max: summary.max,
                })
            })
            .collect();
        boxes.sort_by(|a, b| b.median.total_cmp(&a.median));
        boxes
    }

    /// Full statistics of one course, `None` for an unknown or empty course.
    pub fn detail(&self, course: &str) -> Option<ScoreSummary> {
        let values = self.scores(course)?;
        if values.is_empty() {
            return None;
        }
        Some(StatsCalculator::summarize(values))
    }
}
