//! Lenient Numeric Coercion
//! Text-to-number conversion that reports failures instead of raising them.

use polars::prelude::*;

/// A successfully parsed number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    pub fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(v) => v as f64,
            Numeric::Float(v) => v,
        }
    }
}

/// Outcome of coercing one text value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coerced<'a> {
    Parsed(Numeric),
    Unchanged(&'a str),
}

/// Parse a single value. Surrounding whitespace is ignored.
pub fn coerce_value(text: &str) -> Coerced<'_> {
    let trimmed = text.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Coerced::Parsed(Numeric::Int(v));
    }
    match trimmed.parse::<f64>() {
        Ok(v) if !trimmed.is_empty() => Coerced::Parsed(Numeric::Float(v)),
        _ => Coerced::Unchanged(text),
    }
}

/// Convert a text column to numbers when every non-null value parses.
///
/// A single unparseable value leaves the whole column as text. Columns that
/// are already non-text are returned as they are.
pub fn coerce_lenient(column: &Column) -> Column {
    if column.dtype() != &DataType::String {
        return column.clone();
    }
    let Ok(ca) = column.as_materialized_series().str() else {
        return column.clone();
    };

    let mut parsed: Vec<Option<Numeric>> = Vec::with_capacity(ca.len());
    for value in ca.into_iter() {
        match value.map(coerce_value) {
            None => parsed.push(None),
            Some(Coerced::Parsed(n)) => parsed.push(Some(n)),
            Some(Coerced::Unchanged(_)) => return column.clone(),
        }
    }

    if parsed.iter().all(Option::is_none) {
        return column.clone();
    }

    let name = column.name().clone();
    let all_int = parsed
        .iter()
        .flatten()
        .all(|n| matches!(n, Numeric::Int(_)));
    if all_int {
        let values: Vec<Option<i64>> = parsed
            .into_iter()
            .map(|n| match n {
                Some(Numeric::Int(v)) => Some(v),
                _ => None,
            })
            .collect();
        Column::new(name, values)
    } else {
        let values: Vec<Option<f64>> = parsed.into_iter().map(|n| n.map(Numeric::as_f64)).collect();
        Column::new(name, values)
    }
}

/// Convert a column to Float64, treating unparseable or non-finite values as missing.
pub fn coerce_or_missing(column: &Column) -> PolarsResult<Column> {
    let name = column.name().clone();
    let values: Vec<Option<f64>> = if column.dtype() == &DataType::String {
        column
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|v| match v.map(coerce_value) {
                Some(Coerced::Parsed(n)) => Some(n.as_f64()),
                _ => None,
            })
            .collect()
    } else {
        let cast = column.as_materialized_series().cast(&DataType::Float64)?;
        cast.f64()?.into_iter().collect()
    };

    let values = values
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect::<Vec<_>>();
    Ok(Column::new(name, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_column(values: &[Option<&str>]) -> Column {
        Column::new("c".into(), values.to_vec())
    }

    #[test]
    fn test_coerce_value_tags_outcome() {
        assert_eq!(coerce_value(" 42 "), Coerced::Parsed(Numeric::Int(42)));
        assert_eq!(coerce_value("4.5"), Coerced::Parsed(Numeric::Float(4.5)));
        assert_eq!(coerce_value("N/A"), Coerced::Unchanged("N/A"));
        assert_eq!(coerce_value(""), Coerced::Unchanged(""));
    }

    #[test]
    fn test_lenient_integer_column() {
        let col = coerce_lenient(&text_column(&[Some("1"), None, Some("3")]));
        assert_eq!(col.dtype(), &DataType::Int64);
        let values: Vec<Option<i64>> = col.i64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(1), None, Some(3)]);
    }

    #[test]
    fn test_lenient_mixed_numeric_becomes_float() {
        let col = coerce_lenient(&text_column(&[Some("1"), Some("2.5")]));
        assert_eq!(col.dtype(), &DataType::Float64);
    }

    #[test]
    fn test_lenient_keeps_text_on_any_failure() {
        let original = text_column(&[Some("1"), Some("abc")]);
        let col = coerce_lenient(&original);
        assert_eq!(col.dtype(), &DataType::String);
        let values: Vec<Option<&str>> = col.str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("1"), Some("abc")]);
    }

    #[test]
    fn test_or_missing_nulls_failures() {
        let col = coerce_or_missing(&text_column(&[Some("50"), Some("N/A"), Some("70.5"), Some("inf")]))
            .unwrap();
        let values: Vec<Option<f64>> = col.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(50.0), None, Some(70.5), None]);
    }
}
