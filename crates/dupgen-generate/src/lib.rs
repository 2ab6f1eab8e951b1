//! Record and duplicate generation engine for dupgen.
//!
//! This crate consumes a [`dupgen_config::ValidatedConfig`] to produce a
//! deterministic (seeded) set of original records plus corrupted duplicates,
//! and writes them as CSV together with their true links.

pub mod corruption;
pub mod distribution;
pub mod duplicate;
pub mod engine;
pub mod errors;
pub mod model;
pub mod original;
pub mod output;
pub mod resources;
pub mod sampling;

pub use corruption::{
    CharacterErrorModel, Rule, RuleChange, RuleInterpreter, RuleScope, error_position,
};
pub use distribution::DuplicateCountDistribution;
pub use duplicate::{DuplicateBatch, DuplicateRecordFactory, Modification, ModificationLog};
pub use engine::{GenerationEngine, GenerationResult};
pub use errors::{GenerationError, ResourceLoadError};
pub use model::{GenerateOptions, GenerationIssue, GenerationReport};
pub use original::OriginalRecordFactory;
pub use output::csv::{CsvLayout, write_records_csv, write_true_links_csv};
pub use resources::{
    FrequencyPool, KeyedTable, ResourceLoader, ResourceTables, SourceLine, bundled_data_dir,
};
pub use sampling::ValueSampler;
