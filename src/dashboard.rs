//! Dashboard Pipeline
//! Load -> join -> year filter -> per-section aggregation.

use crate::analysis::{
    age_counts, income_brackets, parent_education, race_shares, sex_shares, Butterfly,
    CategoryShare, CourseTable, IncomeBracket, Overview,
};
use crate::config::{DatasetConfig, AGE_LABEL_COL, COURSE_DESC_COL};
use crate::data::{DataProcessor, FactView, LoadedTables, LoaderError, PipelineCache, ProcessorError};
use polars::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

/// Conditions that stop the whole dashboard.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Load(#[from] LoaderError),
    #[error("Fact table (desempenho) could not be loaded or is empty")]
    EmptyFact,
    #[error("No performance data available for year {0}")]
    NoRowsForYear(i64),
    #[error("Year filter failed: {0}")]
    Filter(#[from] PolarsError),
    #[error("Year filter failed: {0}")]
    Processor(#[from] ProcessorError),
}

/// A dashboard section: its data, or why it cannot be shown.
#[derive(Debug, Clone)]
pub enum Section<T> {
    Ready(T),
    Unavailable(String),
}

impl<T> Section<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(value) => Some(value),
            Section::Unavailable(_) => None,
        }
    }

    fn from_result(result: Result<T, ProcessorError>, section: &str) -> Self {
        match result {
            Ok(value) => Section::Ready(value),
            Err(e) => Section::unavailable(format!("{section}: {e}")),
        }
    }

    fn unavailable(message: String) -> Self {
        warn!(%message, "section skipped");
        Section::Unavailable(message)
    }
}

/// Every table the presentation layer draws from.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub target_year: i64,
    /// Non-fatal notices about the data as a whole
    pub notices: Vec<String>,
    pub overview: Section<Overview>,
    pub sex: Section<Vec<CategoryShare>>,
    pub race: Section<Vec<CategoryShare>>,
    pub age: Section<Vec<(String, usize)>>,
    pub income: Section<Vec<IncomeBracket>>,
    pub education: Section<Butterfly>,
    pub courses: Section<CourseTable>,
}

impl Dashboard {
    /// Run the whole pipeline, loading through `cache`.
    pub fn build(config: &DatasetConfig, cache: &mut PipelineCache) -> Result<Self, PipelineError> {
        let tables = cache.load(config)?;
        Self::from_tables(config, &tables, cache)
    }

    /// Run the pipeline on tables that are already loaded.
    pub fn from_tables(
        config: &DatasetConfig,
        tables: &LoadedTables,
        cache: &mut PipelineCache,
    ) -> Result<Self, PipelineError> {
        if tables.fact.height() == 0 {
            return Err(PipelineError::EmptyFact);
        }

        let mut notices = Vec::new();
        let fact = FactView::loaded(config, tables);
        let year_view = Self::filter_year(config, tables, &fact, cache, &mut notices)?;
        info!(rows = year_view.frame().height(), year = config.target_year, "year filter applied");

        let courses = Self::course_section(config, tables, &year_view, cache);

        Ok(Self {
            target_year: config.target_year,
            notices,
            overview: match Overview::from_frame(year_view.frame(), &config.score_col) {
                Some(overview) => Section::Ready(overview),
                None => Section::unavailable(format!(
                    "Cannot compute performance statistics (column '{}' missing or empty)",
                    config.score_col
                )),
            },
            sex: Self::dim_section(tables, "sexo", "Sex distribution", sex_shares),
            race: Self::dim_section(tables, "cor", "Race/color distribution", race_shares),
            age: match tables.dim("idade").and_then(|df| age_counts(df, AGE_LABEL_COL)) {
                Some(counts) => Section::Ready(counts),
                None => Section::unavailable(format!(
                    "Age data unavailable (column '{AGE_LABEL_COL}' missing)"
                )),
            },
            income: match tables.dim("renda") {
                Some(df) if df.height() > 0 => {
                    if DataProcessor::columns_with_prefix(df, "QTD_RENDA").is_empty() {
                        Section::unavailable(
                            "No 'QTD_RENDA*' column found in income data".to_string(),
                        )
                    } else {
                        Section::from_result(income_brackets(df), "Income")
                    }
                }
                _ => Section::unavailable("Income data not available".to_string()),
            },
            education: Self::dim_section(tables, "escolaridade", "Parental education", parent_education),
            courses,
        })
    }

    fn dim_section<T>(
        tables: &LoadedTables,
        dim: &str,
        title: &str,
        build: impl Fn(&DataFrame) -> Result<T, ProcessorError>,
    ) -> Section<T> {
        match tables.dim(dim) {
            Some(df) => Section::from_result(build(df), title),
            None => Section::unavailable(format!("{title}: dimension '{dim}' not loaded")),
        }
    }

    /// Rows of the target year; the whole fact table when the year column is absent.
    fn filter_year(
        config: &DatasetConfig,
        tables: &LoadedTables,
        fact: &FactView,
        cache: &mut PipelineCache,
        notices: &mut Vec<String>,
    ) -> Result<FactView, PipelineError> {
        let merged = cache.join(config, tables, fact, "tempo", "tempo");
        if let Some(message) = merged.message() {
            notices.push(message);
        }

        let year_col = config.year_col.as_str();
        let filtered = if merged.frame.get_column_index(year_col).is_some() {
            let years = DataProcessor::f64_values(&merged.frame, year_col)?;
            let target = config.target_year as f64;
            let mask: Vec<bool> = years.iter().map(|y| *y == Some(target)).collect();
            let mask = BooleanChunked::new("year_mask".into(), mask);
            let frame = merged.frame.filter(&mask)?;
            fact.derive(&format!("{year_col}={}", config.target_year), frame)
        } else {
            let message = format!(
                "Column '{year_col}' not found after merging with TEMPO; showing all fact rows"
            );
            warn!(%message);
            notices.push(message);
            fact.clone()
        };

        if filtered.frame().height() == 0 {
            return Err(PipelineError::NoRowsForYear(config.target_year));
        }
        Ok(filtered)
    }

    fn course_section(
        config: &DatasetConfig,
        tables: &LoadedTables,
        year_view: &FactView,
        cache: &mut PipelineCache,
    ) -> Section<CourseTable> {
        let merged = cache.join(config, tables, year_view, "curso", "curso");
        let frame = &merged.frame;
        let has_columns = frame.height() > 0
            && frame.get_column_index(COURSE_DESC_COL).is_some()
            && frame.get_column_index(&config.score_col).is_some();
        if !has_columns {
            return Section::unavailable(match merged.message() {
                Some(reason) => format!("Course performance cannot be shown: {reason}"),
                None => format!(
                    "Course performance cannot be shown: columns '{COURSE_DESC_COL}', '{}' missing after merging with CURSO",
                    config.score_col
                ),
            });
        }

        match CourseTable::from_frame(frame, COURSE_DESC_COL, &config.score_col) {
            Ok(table) if !table.is_empty() => Section::Ready(table),
            Ok(_) => Section::unavailable("No course has valid scores".to_string()),
            Err(e) => Section::unavailable(format!("Course statistics: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    fn write_schema(dir: &Path, fact: &str) {
        write(dir, "DESEMPENHO.csv", fact);
        write(dir, "TEMPO.csv", "TEMPO_KEY;ANO\n1;2022\n2;2021\n");
        write(
            dir,
            "CURSO.csv",
            "CURSO_KEY;DESC_CURSO\n1;\"Direito\"\n2;\"Medicina\"\n",
        );
        write(
            dir,
            "SEXO.csv",
            "SEXO_KEY;QTD_MASCULINO;QTD_FEMININO;QTD_N_INFORMADO\n1;1;1;0\n",
        );
        write(dir, "IDADE.csv", "IDADE_KEY;IDADE\n1;20-24\n2;25-29\n3;20-24\n");
        write(
            dir,
            "RENDA.csv",
            "RENDA_KEY;QTD_RENDA_ATE 1 SM;QTD_RENDA_NÃO SABE\n1;2;1\n",
        );
        write(dir, "COR.csv", "COR_KEY;QTD_BRANCA;QTD_PARDA\n1;1;1\n");
        write(
            dir,
            "ESCOLARIDADE.csv",
            "ESCOLARIDADE_KEY;QTD_PAI_SUPERIOR;QTD_MAE_SUPERIOR\n1;120;150\n",
        );
    }

    fn config_for(dir: &Path) -> DatasetConfig {
        DatasetConfig {
            data_dir: dir.to_path_buf(),
            ..DatasetConfig::default()
        }
    }

    #[test]
    fn test_end_to_end_scores() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(
            dir.path(),
            "NOTA_TOTAL;D_TEMPO_TEMPO_KEY;D_CURSO_CURSO_KEY;D_IDADE_IDADE_KEY\n50;1;1;1\nN/A;1;1;2\n70;1;2;3\n",
        );
        let config = config_for(dir.path());
        let mut cache = PipelineCache::new();
        let dashboard = Dashboard::build(&config, &mut cache).unwrap();

        let overview = dashboard.overview.ready().unwrap();
        assert_eq!(overview.summary.count, 2);
        assert!((overview.summary.mean - 60.0).abs() < 1e-9);
        assert!(dashboard.notices.is_empty());

        let courses = dashboard.courses.ready().unwrap();
        assert_eq!(courses.course_names(), vec!["Medicina", "Direito"]);

        let butterfly = dashboard.education.ready().unwrap();
        let signed: Vec<f64> = butterfly.rows.iter().map(|r| r.signed).collect();
        assert_eq!(signed, vec![-120.0, 150.0]);

        assert_eq!(dashboard.sex.ready().unwrap().len(), 2);
        assert_eq!(dashboard.age.ready().unwrap()[0], ("20-24".to_string(), 2));
        assert_eq!(dashboard.income.ready().unwrap()[0].label, "Até 1 SM");
    }

    #[test]
    fn test_year_filter_drops_other_years() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(
            dir.path(),
            "NOTA_TOTAL;D_TEMPO_TEMPO_KEY;D_CURSO_CURSO_KEY;D_IDADE_IDADE_KEY\n50;1;1;1\n90;2;1;1\n",
        );
        let config = config_for(dir.path());
        let dashboard = Dashboard::build(&config, &mut PipelineCache::new()).unwrap();
        assert_eq!(dashboard.overview.ready().unwrap().summary.count, 1);
    }

    #[test]
    fn test_no_rows_for_target_year_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(
            dir.path(),
            "NOTA_TOTAL;D_TEMPO_TEMPO_KEY;D_CURSO_CURSO_KEY;D_IDADE_IDADE_KEY\n50;2;1;1\n",
        );
        let config = config_for(dir.path());
        let err = Dashboard::build(&config, &mut PipelineCache::new()).unwrap_err();
        assert!(matches!(err, PipelineError::NoRowsForYear(2022)));
    }

    #[test]
    fn test_missing_file_halts_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let err = Dashboard::build(&config, &mut PipelineCache::new()).unwrap_err();
        assert!(matches!(err, PipelineError::Load(LoaderError::NotFound(_))));
    }

    #[test]
    fn test_course_merge_failure_is_shown_in_section() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(
            dir.path(),
            "NOTA_TOTAL;D_TEMPO_TEMPO_KEY;D_CURSO_CURSO_KEY;DESC_CURSO;DESC_CURSO_right\n50;1;1;x;y\n",
        );
        let config = config_for(dir.path());
        let dashboard = Dashboard::build(&config, &mut PipelineCache::new()).unwrap();

        assert_eq!(dashboard.overview.ready().unwrap().summary.count, 1);
        match &dashboard.courses {
            Section::Unavailable(message) => {
                assert!(message.contains("CURSO.csv"), "{message}");
                assert!(message.contains("DESC_CURSO_right"), "{message}");
            }
            Section::Ready(_) => panic!("course section should be unavailable"),
        }
    }

    #[test]
    fn test_missing_dimension_columns_degrade_sections() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(
            dir.path(),
            "NOTA_TOTAL;D_TEMPO_TEMPO_KEY;D_IDADE_IDADE_KEY\n50;1;1\n",
        );
        write(dir.path(), "RENDA.csv", "RENDA_KEY;OUTRA\n1;2\n");
        let config = config_for(dir.path());
        let dashboard = Dashboard::build(&config, &mut PipelineCache::new()).unwrap();

        assert!(dashboard.overview.ready().is_some());
        assert!(matches!(dashboard.courses, Section::Unavailable(_)));
        assert!(matches!(dashboard.income, Section::Unavailable(_)));
    }
}
