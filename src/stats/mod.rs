//! Stats module - descriptive statistics

mod calculator;

pub use calculator::{format_count, MetricDelta, ScoreSummary, StatsCalculator};
