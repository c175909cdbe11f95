//! Star-Schema Loader Module
//! Reads every declared table from semicolon-delimited CSV using Polars.

use crate::config::{DatasetConfig, TableSpec};
use crate::data::coerce::{coerce_lenient, coerce_or_missing};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Source file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: PolarsError },
    #[error("Failed to prepare table: {0}")]
    CsvError(#[from] PolarsError),
}

/// Every dimension table keyed by logical name, plus the fact table.
#[derive(Debug, Clone)]
pub struct LoadedTables {
    pub dims: HashMap<String, DataFrame>,
    pub fact: DataFrame,
}

impl LoadedTables {
    pub fn dim(&self, name: &str) -> Option<&DataFrame> {
        self.dims.get(name)
    }
}

/// Loads the star schema described by a [`DatasetConfig`].
pub struct DataLoader<'a> {
    config: &'a DatasetConfig,
}

impl<'a> DataLoader<'a> {
    pub fn new(config: &'a DatasetConfig) -> Self {
        Self { config }
    }

    /// Load all tables. Any missing or unreadable file aborts the whole load.
    pub fn load_all(&self) -> Result<LoadedTables, LoaderError> {
        let mut dims = HashMap::new();
        let mut fact = None;

        for (name, spec) in &self.config.tables {
            let mut df = self.load_table(spec)?;
            if *name == self.config.fact_table {
                self.prepare_fact(&mut df)?;
                info!(table = %name, rows = df.height(), "fact table ready");
                fact = Some(df);
            } else {
                if let Some(pk) = spec.primary_key.as_deref() {
                    coerce_key_column(&mut df, pk)?;
                }
                dims.insert(name.clone(), df);
            }
        }

        // validate() guarantees the fact table is declared
        let fact = fact.unwrap_or_default();
        Ok(LoadedTables { dims, fact })
    }

    /// Read one table and apply header/value cleaning and type inference.
    pub fn load_table(&self, spec: &TableSpec) -> Result<DataFrame, LoaderError> {
        let path = self.config.path_of(spec);
        let mut df = read_csv(&path)?;

        clean_headers(&mut df)?;
        let columns: Vec<Column> = df
            .get_columns()
            .iter()
            .map(|col| coerce_lenient(&strip_quotes(col)))
            .collect();
        let df = DataFrame::new(columns)?;

        info!(
            file = %spec.file_name,
            rows = df.height(),
            columns = df.width(),
            "table loaded"
        );
        Ok(df)
    }

    /// Coerce foreign keys leniently and the score strictly, dropping rows
    /// whose score is missing.
    fn prepare_fact(&self, df: &mut DataFrame) -> Result<(), LoaderError> {
        for fk in self.config.fact_foreign_keys.values() {
            coerce_key_column(df, fk)?;
        }

        let score_col = self.config.score_col.as_str();
        if df.get_column_index(score_col).is_none() {
            return Ok(());
        }
        let score = coerce_or_missing(df.column(score_col)?)?;
        let mask = score.as_materialized_series().is_not_null();
        df.with_column(score)?;

        let before = df.height();
        *df = df.filter(&mask)?;
        debug!(dropped = before - df.height(), "rows without a numeric score removed");
        Ok(())
    }
}

fn read_csv(path: &Path) -> Result<DataFrame, LoaderError> {
    if !path.exists() {
        return Err(LoaderError::NotFound(path.to_path_buf()));
    }

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(b';')
                .with_quote_char(Some(b'"'))
                .with_encoding(CsvEncoding::Utf8),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|source| LoaderError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Trim header names and drop stray quote characters from them.
fn clean_headers(df: &mut DataFrame) -> PolarsResult<()> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| clean_text(name.as_str()))
        .collect();
    df.set_column_names(names)
}

fn clean_text(text: &str) -> String {
    text.replace('"', "").trim().to_string()
}

/// For text columns with embedded quote characters, strip them from every value.
fn strip_quotes(column: &Column) -> Column {
    let Ok(ca) = column.as_materialized_series().str() else {
        return column.clone();
    };
    if !ca.into_iter().flatten().any(|v| v.contains('"')) {
        return column.clone();
    }
    let values: Vec<Option<String>> = ca.into_iter().map(|v| v.map(clean_text)).collect();
    Column::new(column.name().clone(), values)
}

/// Numeric coercion of a key column, leaving it untouched when it does not parse.
fn coerce_key_column(df: &mut DataFrame, name: &str) -> PolarsResult<()> {
    if df.get_column_index(name).is_none() {
        return Ok(());
    }
    let coerced = coerce_lenient(df.column(name)?);
    df.with_column(coerced)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableSpec;
    use std::collections::BTreeMap;

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    fn config_for(dir: &Path) -> DatasetConfig {
        let mut tables = BTreeMap::new();
        tables.insert(
            "desempenho".to_string(),
            TableSpec {
                file_name: "DESEMPENHO.csv".to_string(),
                primary_key: None,
            },
        );
        tables.insert(
            "tempo".to_string(),
            TableSpec {
                file_name: "TEMPO.csv".to_string(),
                primary_key: Some("TEMPO_KEY".to_string()),
            },
        );
        DatasetConfig {
            data_dir: dir.to_path_buf(),
            tables,
            ..DatasetConfig::default()
        }
    }

    #[test]
    fn test_fact_rows_without_score_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "DESEMPENHO.csv",
            "\"NOTA_TOTAL\";\"D_TEMPO_TEMPO_KEY\"\n50;1\nN/A;1\n70;1\n;1\n",
        );
        write(dir.path(), "TEMPO.csv", "TEMPO_KEY;ANO\n1;2022\n");

        let config = config_for(dir.path());
        let tables = DataLoader::new(&config).load_all().unwrap();

        assert_eq!(tables.fact.height(), 2);
        let scores: Vec<Option<f64>> = tables
            .fact
            .column("NOTA_TOTAL")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(scores, vec![Some(50.0), Some(70.0)]);
        assert_eq!(
            tables.fact.column("D_TEMPO_TEMPO_KEY").unwrap().dtype(),
            &DataType::Int64
        );
    }

    #[test]
    fn test_headers_and_values_are_dequoted() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "DESEMPENHO.csv", "NOTA_TOTAL\n1\n");
        write(
            dir.path(),
            "TEMPO.csv",
            " TEMPO_KEY ;DESC\n1;\"\"\"Primeiro\"\" \"\n2;Segundo\n",
        );

        let config = config_for(dir.path());
        let tables = DataLoader::new(&config).load_all().unwrap();
        let tempo = tables.dim("tempo").unwrap();

        assert!(tempo.get_column_index("TEMPO_KEY").is_some());
        assert_eq!(tempo.column("TEMPO_KEY").unwrap().dtype(), &DataType::Int64);
        let desc: Vec<Option<&str>> = tempo.column("DESC").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(desc, vec![Some("Primeiro"), Some("Segundo")]);
    }

    #[test]
    fn test_unparseable_key_is_left_as_text() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "DESEMPENHO.csv", "NOTA_TOTAL\n1\n");
        write(dir.path(), "TEMPO.csv", "TEMPO_KEY;ANO\nA1;2022\n2;2022\n");

        let config = config_for(dir.path());
        let tables = DataLoader::new(&config).load_all().unwrap();
        let tempo = tables.dim("tempo").unwrap();
        assert_eq!(tempo.column("TEMPO_KEY").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "DESEMPENHO.csv", "NOTA_TOTAL\n1\n");

        let config = config_for(dir.path());
        let err = DataLoader::new(&config).load_all().unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(path) if path.ends_with("TEMPO.csv")));
    }
}
