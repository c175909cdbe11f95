//! Data Processor Module
//! Column sums, value counts and the rule-driven wide-to-long reshape.

use polars::prelude::*;
use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Invalid reshape pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Reshape pattern needs two capture groups, found {0}")]
    CaptureGroups(usize),
}

/// Extraction rule for a wide-to-long reshape.
///
/// Column names matching the pattern become long rows; capture group 1 is
/// the category, capture group 2 the subcategory.
#[derive(Debug, Clone)]
pub struct MeltRule {
    pattern: Regex,
}

impl MeltRule {
    pub fn new(pattern: &str) -> Result<Self, ProcessorError> {
        let pattern = Regex::new(pattern)?;
        let groups = pattern.captures_len() - 1;
        if groups != 2 {
            return Err(ProcessorError::CaptureGroups(groups));
        }
        Ok(Self { pattern })
    }

    /// Split a column name into (category, subcategory).
    pub fn extract(&self, column: &str) -> Option<(String, String)> {
        let caps = self.pattern.captures(column)?;
        Some((caps.get(1)?.as_str().to_string(), caps.get(2)?.as_str().to_string()))
    }
}

/// One row of a reshaped table.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRecord {
    pub category: String,
    pub subcategory: String,
    pub value: f64,
}

/// Handles data aggregation and transformation operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Names of the columns starting with `prefix`, in table order.
    pub fn columns_with_prefix(df: &DataFrame, prefix: &str) -> Vec<String> {
        df.get_column_names()
            .iter()
            .filter(|name| name.starts_with(prefix))
            .map(|name| name.to_string())
            .collect()
    }

    /// Sum of a column as Float64; unparseable values count as missing.
    pub fn column_sum(df: &DataFrame, column: &str) -> Result<f64, ProcessorError> {
        let values = df
            .column(column)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        Ok(values.f64()?.sum().unwrap_or(0.0))
    }

    /// Sum every listed column that exists, keeping the given order.
    pub fn sum_columns(
        df: &DataFrame,
        columns: &[String],
    ) -> Result<Vec<(String, f64)>, ProcessorError> {
        columns
            .iter()
            .filter(|c| df.get_column_index(c).is_some())
            .map(|c| Ok((c.clone(), Self::column_sum(df, c)?)))
            .collect()
    }

    /// Column values rendered as text; nulls stay `None`.
    pub fn text_values(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>, ProcessorError> {
        let as_text = df
            .column(column)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        Ok(as_text
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect())
    }

    /// Column values as Float64; unparseable values become `None`.
    pub fn f64_values(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>, ProcessorError> {
        let values = df
            .column(column)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        Ok(values.f64()?.into_iter().collect())
    }

    /// Occurrences of each distinct non-null value, most frequent first.
    pub fn value_counts(df: &DataFrame, column: &str) -> Result<Vec<(String, usize)>, ProcessorError> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for value in Self::text_values(df, column)?.into_iter().flatten() {
            *counts.entry(value).or_default() += 1;
        }

        let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(counts)
    }

    /// Sum every column matched by `rule` and emit one long record per column.
    ///
    /// Output order follows the column order of the table.
    pub fn melt_sums(df: &DataFrame, rule: &MeltRule) -> Result<Vec<LongRecord>, ProcessorError> {
        let mut records = Vec::new();
        for name in df.get_column_names() {
            if let Some((category, subcategory)) = rule.extract(name.as_str()) {
                records.push(LongRecord {
                    category,
                    subcategory,
                    value: Self::column_sum(df, name.as_str())?,
                });
            }
        }
        Ok(records)
    }
}
