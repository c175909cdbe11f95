//! Demographic count tables: sex, race/color, age and income brackets.

use super::labels::title_case;
use crate::data::{DataProcessor, ProcessorError};
use polars::prelude::*;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

const SEX_COLUMNS: [(&str, &str); 3] = [
    ("QTD_MASCULINO", "Masculino"),
    ("QTD_FEMININO", "Feminino"),
    ("QTD_N_INFORMADO", "Não Informado"),
];

static INCOME_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+[\.,]?\d*)").expect("static pattern"));

/// One slice of a pie chart.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub category: String,
    pub quantity: f64,
    /// Share of the retained total, in [0, 1]
    pub percent: f64,
}

/// Drop zero counts and attach each category's share of what is left.
fn to_shares(counts: Vec<(String, f64)>) -> Vec<CategoryShare> {
    let kept: Vec<(String, f64)> = counts.into_iter().filter(|(_, q)| *q > 0.0).collect();
    let total: f64 = kept.iter().map(|(_, q)| q).sum();
    kept.into_iter()
        .map(|(category, quantity)| CategoryShare {
            category,
            quantity,
            percent: quantity / total,
        })
        .collect()
}

/// Participants per sex, summed over the pre-aggregated sex table.
pub fn sex_shares(sexo: &DataFrame) -> Result<Vec<CategoryShare>, ProcessorError> {
    let columns: Vec<String> = SEX_COLUMNS.iter().map(|(c, _)| c.to_string()).collect();
    let sums = DataProcessor::sum_columns(sexo, &columns)?;
    let counts = sums
        .into_iter()
        .filter_map(|(column, total)| {
            SEX_COLUMNS
                .iter()
                .find(|(c, _)| *c == column)
                .map(|(_, label)| (label.to_string(), total))
        })
        .collect();
    Ok(to_shares(counts))
}

/// `QTD_NAO_DECLARADA` -> `Não Declarada`
pub fn race_label(column: &str) -> String {
    let label = column.replacen("QTD_", "", 1).replace('_', " ");
    title_case(&label).replace("Nao ", "Não ")
}

/// Participants per race/color over every `QTD_` column of the color table.
pub fn race_shares(cor: &DataFrame) -> Result<Vec<CategoryShare>, ProcessorError> {
    let columns = DataProcessor::columns_with_prefix(cor, "QTD_");
    let counts = DataProcessor::sum_columns(cor, &columns)?
        .into_iter()
        .map(|(column, total)| (race_label(&column), total))
        .collect();
    Ok(to_shares(counts))
}

/// Raw occurrences of each age bracket label, most frequent first.
pub fn age_counts(idade: &DataFrame, label_col: &str) -> Option<Vec<(String, usize)>> {
    idade.get_column_index(label_col)?;
    DataProcessor::value_counts(idade, label_col).ok()
}

/// Ordering key for income labels: numeric brackets ascending, then labels
/// without a number, then "unknown".
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum IncomeSortKey {
    Numeric(f64),
    Unnumbered,
    Unknown,
}

pub fn income_sort_key(label: &str) -> IncomeSortKey {
    if label.contains("Não Sabe") || label.contains("Não Informado") {
        return IncomeSortKey::Unknown;
    }
    INCOME_NUMBER
        .captures(label)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
        .map(IncomeSortKey::Numeric)
        .unwrap_or(IncomeSortKey::Unnumbered)
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncomeBracket {
    pub label: String,
    pub quantity: f64,
    pub sort_key: IncomeSortKey,
}

/// `QTD_RENDA_ATE 1 SM` -> `Até 1 SM`
pub fn income_label(column: &str) -> String {
    column
        .replacen("QTD_RENDA_", "", 1)
        .replace('_', " a ")
        .replace("ATE ", "Até ")
        .replace("ACIMA DE ", "Acima de ")
}

/// Non-zero income bracket totals in semantic order.
pub fn income_brackets(renda: &DataFrame) -> Result<Vec<IncomeBracket>, ProcessorError> {
    let columns = DataProcessor::columns_with_prefix(renda, "QTD_RENDA");
    let mut brackets: Vec<IncomeBracket> = DataProcessor::sum_columns(renda, &columns)?
        .into_iter()
        .filter(|(_, quantity)| *quantity > 0.0)
        .map(|(column, quantity)| {
            let label = income_label(&column);
            IncomeBracket {
                sort_key: income_sort_key(&label),
                label,
                quantity,
            }
        })
        .collect();
    brackets.sort_by(|a, b| {
        a.sort_key
            .partial_cmp(&b.sort_key)
            .unwrap_or(Ordering::Equal)
    });
    Ok(brackets)
}
