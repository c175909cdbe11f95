//! Parental education reshaped for a mirrored (butterfly) bar chart.

use super::labels::title_case;
use crate::data::{DataProcessor, MeltRule, ProcessorError};
use polars::prelude::*;
use std::collections::BTreeMap;

pub const PARENT_EDUCATION_PATTERN: &str = r"QTD_(PAI|MAE)_(.+)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parent {
    Father,
    Mother,
}

impl Parent {
    fn from_code(code: &str) -> Option<Self> {
        match code {
            "PAI" => Some(Parent::Father),
            "MAE" => Some(Parent::Mother),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Parent::Father => "PAI",
            Parent::Mother => "MAE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ButterflyRow {
    pub parent: Parent,
    pub level: String,
    pub quantity: f64,
    /// Father counts negated, mother counts as-is
    pub signed: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Butterfly {
    pub rows: Vec<ButterflyRow>,
    /// Levels by total count, ascending
    pub level_order: Vec<String>,
    /// Largest single count; the x domain is [-max, max]
    pub max_quantity: f64,
}

/// Sum the `QTD_(PAI|MAE)_*` columns and reshape them to one row per
/// (parent, level).
pub fn parent_education(escolaridade: &DataFrame) -> Result<Butterfly, ProcessorError> {
    let rule = MeltRule::new(PARENT_EDUCATION_PATTERN)?;
    let rows: Vec<ButterflyRow> = DataProcessor::melt_sums(escolaridade, &rule)?
        .into_iter()
        .filter(|r| r.value > 0.0)
        .filter_map(|r| {
            let parent = Parent::from_code(&r.category)?;
            let signed = match parent {
                Parent::Father => -r.value,
                Parent::Mother => r.value,
            };
            Some(ButterflyRow {
                parent,
                level: title_case(&r.subcategory.replace('_', " ")),
                quantity: r.value,
                signed,
            })
        })
        .collect();

    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for row in &rows {
        *totals.entry(row.level.as_str()).or_default() += row.quantity;
    }
    let mut order: Vec<(&str, f64)> = totals.into_iter().collect();
    order.sort_by(|a, b| a.1.abs().total_cmp(&b.1.abs()));
    let level_order = order.into_iter().map(|(level, _)| level.to_string()).collect();

    let max_quantity = rows.iter().map(|r| r.quantity).fold(0.0, f64::max);
    Ok(Butterfly {
        rows,
        level_order,
        max_quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escolaridade() -> DataFrame {
        DataFrame::new(vec![
            Column::new("ESCOLARIDADE_KEY".into(), vec![1i64, 2]),
            Column::new("QTD_PAI_ENSINO_MEDIO".into(), vec![100i64, 20]),
            Column::new("QTD_MAE_ENSINO_MEDIO".into(), vec![100i64, 50]),
            Column::new("QTD_PAI_SUPERIOR".into(), vec![10i64, 5]),
            Column::new("QTD_MAE_SUPERIOR".into(), vec![0i64, 0]),
            Column::new("QTD_TOTAL".into(), vec![1i64, 1]),
        ])
        .unwrap()
    }

    #[test]
    fn test_father_negative_mother_positive() {
        let butterfly = parent_education(&escolaridade()).unwrap();
        let medio: Vec<&ButterflyRow> = butterfly
            .rows
            .iter()
            .filter(|r| r.level == "Ensino Medio")
            .collect();

        assert_eq!(medio.len(), 2);
        assert_eq!(medio[0].parent, Parent::Father);
        assert_eq!(medio[0].signed, -120.0);
        assert_eq!(medio[1].parent, Parent::Mother);
        assert_eq!(medio[1].signed, 150.0);
    }

    #[test]
    fn test_zero_rows_dropped_and_levels_ordered() {
        let butterfly = parent_education(&escolaridade()).unwrap();
        assert_eq!(butterfly.rows.len(), 3);
        assert_eq!(butterfly.level_order, vec!["Superior", "Ensino Medio"]);
        assert_eq!(butterfly.max_quantity, 150.0);
    }
}
