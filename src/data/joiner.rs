//! Dimension Joiner Module
//! Left-joins the fact table to one dimension table on its declared key pair.

use crate::config::DatasetConfig;
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum JoinError {
    #[error("Type conversion for merge '{dim}' failed: {cast} / {text}")]
    Coercion {
        dim: String,
        cast: PolarsError,
        text: PolarsError,
    },
    #[error("Merge between fact and dimension {file} failed: {source}")]
    Merge { file: String, source: PolarsError },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// How a join request was resolved.
#[derive(Debug)]
pub enum JoinStatus {
    /// Keys were compatible (possibly after casting the foreign key).
    Joined,
    /// Both key columns were cast to text before joining.
    JoinedAsText,
    /// A precondition was not met; the frame is the unjoined fact table.
    Skipped(String),
    /// The join failed; the frame is empty.
    Failed(JoinError),
}

#[derive(Debug)]
pub struct JoinOutcome {
    pub frame: DataFrame,
    pub status: JoinStatus,
}

impl JoinOutcome {
    fn skipped(frame: DataFrame, reason: String) -> Self {
        warn!(%reason, "join skipped");
        Self {
            frame,
            status: JoinStatus::Skipped(reason),
        }
    }

    fn failed(err: JoinError) -> Self {
        error!(error = %err, "join failed");
        Self {
            frame: DataFrame::default(),
            status: JoinStatus::Failed(err),
        }
    }

    /// User-facing message for degraded outcomes.
    pub fn message(&self) -> Option<String> {
        match &self.status {
            JoinStatus::Joined | JoinStatus::JoinedAsText => None,
            JoinStatus::Skipped(reason) => Some(reason.clone()),
            JoinStatus::Failed(err) => Some(err.to_string()),
        }
    }
}

/// Left outer join of `fact` with the dimension `dim_key`, using the foreign
/// key registered for `fact_key`.
///
/// Never fails: unmet preconditions return the fact table unchanged (or an
/// empty frame when there is no fact table), join errors return an empty frame.
pub fn merge_fact(
    config: &DatasetConfig,
    dims: &HashMap<String, DataFrame>,
    fact: Option<&DataFrame>,
    dim_key: &str,
    fact_key: &str,
) -> JoinOutcome {
    let (Some(fact), Some(dim), Some(spec), Some(fk)) = (
        fact,
        dims.get(dim_key),
        config.tables.get(dim_key),
        config.foreign_key(fact_key),
    ) else {
        return JoinOutcome::skipped(
            fact.cloned().unwrap_or_default(),
            format!("Insufficient data to merge dimension '{dim_key}'"),
        );
    };

    let pk = match spec.primary_key.as_deref() {
        Some(pk) if dim.get_column_index(pk).is_some() => pk,
        _ => {
            return JoinOutcome::skipped(
                fact.clone(),
                format!("Dimension '{dim_key}' has no usable primary key"),
            )
        }
    };
    if fact.get_column_index(fk).is_none() {
        return JoinOutcome::skipped(
            fact.clone(),
            format!("Foreign key '{fk}' not found in fact table"),
        );
    }

    let (left, right, status) = match align_key_types(fact, dim, fk, pk, dim_key) {
        Ok(aligned) => aligned,
        Err(err) => return JoinOutcome::failed(err),
    };

    if let Some(name) = colliding_column(&left, &right, pk) {
        return JoinOutcome::failed(duplicate_column(&spec.file_name, &name));
    }

    let joined = left
        .lazy()
        .join(
            right.lazy(),
            [col(fk)],
            [col(pk)],
            JoinArgs::new(JoinType::Left),
        )
        .collect();

    match joined {
        Ok(frame) => {
            let duplicate = {
                let mut seen = HashSet::new();
                frame
                    .get_column_names()
                    .into_iter()
                    .find(|n| !seen.insert(*n))
                    .map(|n| n.to_string())
            };
            match duplicate {
                Some(name) => JoinOutcome::failed(duplicate_column(&spec.file_name, &name)),
                None => JoinOutcome { frame, status },
            }
        }
        Err(source) => JoinOutcome::failed(JoinError::Merge {
            file: spec.file_name.clone(),
            source,
        }),
    }
}

/// First name that would appear twice in the joined frame. Dimension columns
/// already present in the fact get the `_right` suffix.
fn colliding_column(left: &DataFrame, right: &DataFrame, pk: &str) -> Option<String> {
    let mut seen: HashSet<String> = left
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect();
    for name in right.get_column_names() {
        if name.as_str() == pk {
            continue;
        }
        let output = if seen.contains(name.as_str()) {
            format!("{name}_right")
        } else {
            name.to_string()
        };
        if !seen.insert(output.clone()) {
            return Some(output);
        }
    }
    None
}

fn duplicate_column(file: &str, name: &str) -> JoinError {
    JoinError::Merge {
        file: file.to_string(),
        source: PolarsError::Duplicate(
            format!("column '{name}' would appear twice in the merged table").into(),
        ),
    }
}

/// Make the key columns comparable: cast the foreign key to the primary key's
/// type, or both to text when that cast fails.
fn align_key_types(
    fact: &DataFrame,
    dim: &DataFrame,
    fk: &str,
    pk: &str,
    dim_key: &str,
) -> Result<(DataFrame, DataFrame, JoinStatus), JoinError> {
    let fk_col = fact.column(fk)?.as_materialized_series();
    let pk_dtype = dim.column(pk)?.dtype().clone();

    if fk_col.dtype() == &pk_dtype {
        return Ok((fact.clone(), dim.clone(), JoinStatus::Joined));
    }

    let cast = match fk_col.strict_cast(&pk_dtype) {
        Ok(converted) => {
            let mut left = fact.clone();
            left.with_column(converted)?;
            return Ok((left, dim.clone(), JoinStatus::Joined));
        }
        Err(e) => e,
    };

    let as_text = |frame: &DataFrame, name: &str| -> PolarsResult<DataFrame> {
        let text = frame
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let mut out = frame.clone();
        out.with_column(text)?;
        Ok(out)
    };

    match as_text(fact, fk).and_then(|left| Ok((left, as_text(dim, pk)?))) {
        Ok((left, right)) => {
            warn!(fk, pk, "merge keys converted to text");
            Ok((left, right, JoinStatus::JoinedAsText))
        }
        Err(text) => Err(JoinError::Coercion {
            dim: dim_key.to_string(),
            cast,
            text,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> HashMap<String, DataFrame> {
        let curso = DataFrame::new(vec![
            Column::new("CURSO_KEY".into(), vec![1i64, 2]),
            Column::new("DESC_CURSO".into(), vec!["Direito", "Medicina"]),
        ])
        .unwrap();
        HashMap::from([("curso".to_string(), curso)])
    }

    fn fact() -> DataFrame {
        DataFrame::new(vec![
            Column::new("NOTA_TOTAL".into(), vec![50.0, 60.0, 70.0, 80.0]),
            Column::new("D_CURSO_CURSO_KEY".into(), vec![Some(1i64), Some(2), Some(9), None]),
        ])
        .unwrap()
    }

    fn descriptions(frame: &DataFrame) -> Vec<Option<String>> {
        frame
            .column("DESC_CURSO")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    #[test]
    fn test_left_join_preserves_fact_cardinality() {
        let config = DatasetConfig::default();
        let fact = fact();
        let out = merge_fact(&config, &dims(), Some(&fact), "curso", "curso");

        assert!(matches!(out.status, JoinStatus::Joined));
        assert_eq!(out.frame.height(), fact.height());
        let mut desc = descriptions(&out.frame);
        desc.sort();
        assert_eq!(
            desc,
            vec![
                None,
                None,
                Some("Direito".to_string()),
                Some("Medicina".to_string())
            ]
        );
    }

    #[test]
    fn test_foreign_key_cast_to_primary_key_type() {
        let config = DatasetConfig::default();
        let fact = DataFrame::new(vec![
            Column::new("NOTA_TOTAL".into(), vec![50.0, 60.0]),
            Column::new("D_CURSO_CURSO_KEY".into(), vec![1.0f64, 2.0]),
        ])
        .unwrap();
        let out = merge_fact(&config, &dims(), Some(&fact), "curso", "curso");

        assert!(matches!(out.status, JoinStatus::Joined));
        assert_eq!(out.frame.height(), 2);
        assert_eq!(descriptions(&out.frame).iter().flatten().count(), 2);
    }

    #[test]
    fn test_text_fallback_when_cast_fails() {
        let config = DatasetConfig::default();
        let fact = DataFrame::new(vec![
            Column::new("NOTA_TOTAL".into(), vec![50.0, 60.0]),
            Column::new("D_CURSO_CURSO_KEY".into(), vec!["1", "X"]),
        ])
        .unwrap();
        let out = merge_fact(&config, &dims(), Some(&fact), "curso", "curso");

        assert!(matches!(out.status, JoinStatus::JoinedAsText));
        assert_eq!(out.frame.height(), 2);
        assert_eq!(descriptions(&out.frame).iter().flatten().count(), 1);
    }

    #[test]
    fn test_missing_foreign_key_returns_fact_unchanged() {
        let config = DatasetConfig::default();
        let fact = fact().drop("D_CURSO_CURSO_KEY").unwrap();
        let out = merge_fact(&config, &dims(), Some(&fact), "curso", "curso");

        assert!(matches!(out.status, JoinStatus::Skipped(_)));
        assert_eq!(out.frame.width(), 1);
        assert_eq!(out.frame.height(), 4);
    }

    #[test]
    fn test_column_name_collision_fails_merge() {
        let config = DatasetConfig::default();
        let fact = DataFrame::new(vec![
            Column::new("NOTA_TOTAL".into(), vec![50.0, 60.0]),
            Column::new("D_CURSO_CURSO_KEY".into(), vec![1i64, 2]),
            Column::new("DESC_CURSO".into(), vec!["a", "b"]),
            Column::new("DESC_CURSO_right".into(), vec!["c", "d"]),
        ])
        .unwrap();
        let out = merge_fact(&config, &dims(), Some(&fact), "curso", "curso");

        assert!(matches!(out.status, JoinStatus::Failed(JoinError::Merge { .. })));
        assert_eq!(out.frame.height(), 0);
        let message = out.message().unwrap();
        assert!(message.contains("CURSO.csv"), "{message}");
        assert!(message.contains("DESC_CURSO_right"), "{message}");
    }

    #[test]
    fn test_suffixed_dimension_column_is_not_a_collision() {
        let config = DatasetConfig::default();
        let fact = DataFrame::new(vec![
            Column::new("D_CURSO_CURSO_KEY".into(), vec![1i64, 2]),
            Column::new("DESC_CURSO".into(), vec!["a", "b"]),
        ])
        .unwrap();
        let out = merge_fact(&config, &dims(), Some(&fact), "curso", "curso");

        assert!(matches!(out.status, JoinStatus::Joined));
        assert!(out.frame.get_column_index("DESC_CURSO_right").is_some());
    }

    #[test]
    fn test_failed_coercion_is_reported() {
        let err = JoinError::Coercion {
            dim: "curso".to_string(),
            cast: PolarsError::ComputeError("cannot cast".into()),
            text: PolarsError::ComputeError("cannot stringify".into()),
        };
        let out = JoinOutcome::failed(err);

        assert_eq!(out.frame.height(), 0);
        let message = out.message().unwrap();
        assert!(message.contains("'curso'"), "{message}");
        assert!(message.contains("cannot cast"), "{message}");
    }

    #[test]
    fn test_absent_dimension_or_fact() {
        let config = DatasetConfig::default();
        let fact = fact();
        let out = merge_fact(&config, &dims(), Some(&fact), "renda", "renda");
        assert_eq!(out.frame.height(), 4);
        assert!(out.message().is_some());

        let out = merge_fact(&config, &dims(), None, "curso", "curso");
        assert_eq!(out.frame.height(), 0);
    }
}
