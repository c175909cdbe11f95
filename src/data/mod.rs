//! Data module - star-schema loading, joining and reshaping

mod cache;
mod coerce;
mod joiner;
mod loader;
mod processor;

pub use cache::{FactView, PipelineCache};
pub use loader::{DataLoader, LoadedTables, LoaderError};
pub use processor::{DataProcessor, MeltRule, ProcessorError};
