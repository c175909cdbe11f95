//! Analysis module - per-section aggregate tables

mod courses;
mod demographics;
mod education;
mod labels;
mod overview;

pub use courses::{BoxplotStats, CourseTable, ThresholdBounds, THRESHOLD_STEP};
pub use demographics::{
    age_counts, income_brackets, race_shares, sex_shares, CategoryShare, IncomeBracket,
};
pub use education::{parent_education, Butterfly, Parent};
pub use overview::{HistogramBin, Overview};
