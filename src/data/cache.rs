//! Pipeline Cache Module
//! Memoizes loaded tables and join results by the identity of their inputs.

use crate::config::DatasetConfig;
use crate::data::joiner::{merge_fact, JoinOutcome};
use crate::data::loader::{DataLoader, LoadedTables, LoaderError};
use polars::prelude::*;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use tracing::debug;

/// A fact frame together with a stable identity of how it was produced.
#[derive(Debug, Clone)]
pub struct FactView {
    id: u64,
    frame: DataFrame,
}

impl FactView {
    /// The fact table as loaded for `config`.
    pub fn loaded(config: &DatasetConfig, tables: &LoadedTables) -> Self {
        Self {
            id: config.cache_key(),
            frame: tables.fact.clone(),
        }
    }

    /// A view derived from this one; `tag` must describe the derivation.
    pub fn derive(&self, tag: &str, frame: DataFrame) -> Self {
        let mut hasher = DefaultHasher::new();
        self.id.hash(&mut hasher);
        tag.hash(&mut hasher);
        Self {
            id: hasher.finish(),
            frame,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct JoinKey {
    config: u64,
    fact: u64,
    dim_key: String,
    fact_key: String,
}

/// Process-wide memo table; entries live until the cache is dropped.
#[derive(Default)]
pub struct PipelineCache {
    loads: HashMap<u64, Arc<LoadedTables>>,
    joins: HashMap<JoinKey, Arc<JoinOutcome>>,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every table of `config`, once. Failures are not cached.
    pub fn load(&mut self, config: &DatasetConfig) -> Result<Arc<LoadedTables>, LoaderError> {
        let key = config.cache_key();
        if let Some(tables) = self.loads.get(&key) {
            debug!(key, "load cache hit");
            return Ok(Arc::clone(tables));
        }
        let tables = DataLoader::new(config).load_all()?;
        Ok(self.insert_loaded(config, tables))
    }

    /// Register tables loaded elsewhere (e.g. on a background thread).
    pub fn insert_loaded(&mut self, config: &DatasetConfig, tables: LoadedTables) -> Arc<LoadedTables> {
        let tables = Arc::new(tables);
        self.loads.insert(config.cache_key(), Arc::clone(&tables));
        tables
    }

    /// Memoized [`merge_fact`].
    pub fn join(
        &mut self,
        config: &DatasetConfig,
        tables: &LoadedTables,
        fact: &FactView,
        dim_key: &str,
        fact_key: &str,
    ) -> Arc<JoinOutcome> {
        let key = JoinKey {
            config: config.cache_key(),
            fact: fact.id(),
            dim_key: dim_key.to_string(),
            fact_key: fact_key.to_string(),
        };
        if let Some(outcome) = self.joins.get(&key) {
            debug!(dim_key, fact_key, "join cache hit");
            return Arc::clone(outcome);
        }
        debug!(dim_key, fact_key, "join cache miss");
        let outcome = Arc::new(merge_fact(
            config,
            &tables.dims,
            Some(fact.frame()),
            dim_key,
            fact_key,
        ));
        self.joins.insert(key, Arc::clone(&outcome));
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (tempfile::TempDir, DatasetConfig) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("DESEMPENHO.csv"),
            "NOTA_TOTAL;D_CURSO_CURSO_KEY\n50;1\n70;2\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("CURSO.csv"), "CURSO_KEY;DESC_CURSO\n1;A\n2;B\n").unwrap();

        let mut config = DatasetConfig::default();
        config.data_dir = dir.path().to_path_buf();
        config
            .tables
            .retain(|name, _| name == "desempenho" || name == "curso");
        (dir, config)
    }

    #[test]
    fn test_load_is_memoized() {
        let (_dir, config) = fixture();
        let mut cache = PipelineCache::new();
        let first = cache.load(&config).unwrap();
        let second = cache.load(&config).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.fact.height(), 2);
    }

    #[test]
    fn test_join_is_memoized_per_fact_identity() {
        let (_dir, config) = fixture();
        let mut cache = PipelineCache::new();
        let tables = cache.load(&config).unwrap();
        let fact = FactView::loaded(&config, &tables);

        let a = cache.join(&config, &tables, &fact, "curso", "curso");
        let b = cache.join(&config, &tables, &fact, "curso", "curso");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.message().is_none());

        let sliced = fact.derive("head", fact.frame().head(Some(1)));
        assert_ne!(sliced.id(), fact.id());
        let c = cache.join(&config, &tables, &sliced, "curso", "curso");
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(c.frame.height(), 1);
    }
}
