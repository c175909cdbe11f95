//! Dataset Configuration Module
//! Logical table names, source files and key columns of the ENADE star schema.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a JSON file that replaces the defaults.
pub const CONFIG_ENV: &str = "ENADE_DASHBOARD_CONFIG";
/// Environment variable overriding only the data directory.
pub const DATA_DIR_ENV: &str = "ENADE_DATA_DIR";

pub const TARGET_YEAR: i64 = 2022;
pub const SCORE_COL: &str = "NOTA_TOTAL";
pub const YEAR_COL: &str = "ANO";
pub const COURSE_DESC_COL: &str = "DESC_CURSO";
pub const AGE_LABEL_COL: &str = "IDADE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Config declares no fact table '{0}'")]
    MissingFact(String),
}

/// One source table of the star schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableSpec {
    pub file_name: String,
    #[serde(default)]
    pub primary_key: Option<String>,
}

impl TableSpec {
    fn new(file_name: &str, primary_key: Option<&str>) -> Self {
        Self {
            file_name: file_name.to_string(),
            primary_key: primary_key.map(str::to_string),
        }
    }
}

/// Complete description of the dataset; its hash keys the load cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub data_dir: PathBuf,
    /// Logical name -> source table
    pub tables: BTreeMap<String, TableSpec>,
    /// Logical name of the fact table inside `tables`
    pub fact_table: String,
    /// Fact-side logical name -> foreign-key column in the fact table
    pub fact_foreign_keys: BTreeMap<String, String>,
    pub score_col: String,
    pub year_col: String,
    pub target_year: i64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        let tables = [
            ("tempo", TableSpec::new("TEMPO.csv", Some("TEMPO_KEY"))),
            ("curso", TableSpec::new("CURSO.csv", Some("CURSO_KEY"))),
            ("desempenho", TableSpec::new("DESEMPENHO.csv", None)),
            ("sexo", TableSpec::new("SEXO.csv", Some("SEXO_KEY"))),
            ("idade", TableSpec::new("IDADE.csv", Some("IDADE_KEY"))),
            ("renda", TableSpec::new("RENDA.csv", Some("RENDA_KEY"))),
            ("cor", TableSpec::new("COR.csv", Some("COR_KEY"))),
            (
                "escolaridade",
                TableSpec::new("ESCOLARIDADE.csv", Some("ESCOLARIDADE_KEY")),
            ),
        ]
        .into_iter()
        .map(|(name, spec)| (name.to_string(), spec))
        .collect();

        let fact_foreign_keys = [
            ("tempo", "D_TEMPO_TEMPO_KEY"),
            ("curso", "D_CURSO_CURSO_KEY"),
            ("idade", "D_IDADE_IDADE_KEY"),
        ]
        .into_iter()
        .map(|(name, fk)| (name.to_string(), fk.to_string()))
        .collect();

        Self {
            data_dir: PathBuf::from("."),
            tables,
            fact_table: "desempenho".to_string(),
            fact_foreign_keys,
            score_col: SCORE_COL.to_string(),
            year_col: YEAR_COL.to_string(),
            target_year: TARGET_YEAR,
        }
    }
}

impl DatasetConfig {
    /// Defaults, replaced by the JSON file named in `ENADE_DASHBOARD_CONFIG`
    /// and then by `ENADE_DATA_DIR` when those are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_json_file(Path::new(&path))?,
            None => Self::default(),
        };
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tables.contains_key(&self.fact_table) {
            Ok(())
        } else {
            Err(ConfigError::MissingFact(self.fact_table.clone()))
        }
    }

    pub fn foreign_key(&self, fact_name: &str) -> Option<&str> {
        self.fact_foreign_keys.get(fact_name).map(String::as_str)
    }

    pub fn path_of(&self, spec: &TableSpec) -> PathBuf {
        self.data_dir.join(&spec.file_name)
    }

    /// Stable identity of the whole configuration.
    pub fn cache_key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mapping_matches_star_schema() {
        let config = DatasetConfig::default();
        assert_eq!(config.tables.len(), 8);
        assert_eq!(config.tables["curso"].primary_key.as_deref(), Some("CURSO_KEY"));
        assert_eq!(config.tables["desempenho"].primary_key, None);
        assert_eq!(config.foreign_key("tempo"), Some("D_TEMPO_TEMPO_KEY"));
        assert_eq!(config.foreign_key("sexo"), None);
        assert_eq!(config.target_year, 2022);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cache_key_tracks_content() {
        let a = DatasetConfig::default();
        let mut b = DatasetConfig::default();
        assert_eq!(a.cache_key(), b.cache_key());
        b.target_year = 2021;
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_json_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = DatasetConfig::default();
        config.data_dir = PathBuf::from("/data/enade");
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        let loaded = DatasetConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_json_override_rejects_missing_fact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = DatasetConfig::default();
        config.fact_table = "nope".to_string();
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        let err = DatasetConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFact(_)));
    }
}
