//! Configuration contracts and validation for dupgen.
//!
//! Raw configuration files (JSON or TOML) deserialize into [`ConfigFile`];
//! [`FieldSpecValidator`] turns them, together with the run's
//! [`GeneratorParams`], into an immutable [`ValidatedConfig`] that the
//! generation crate consumes.

pub mod defaults;
pub mod errors;
pub mod load;
pub mod model;
pub mod params;
pub mod schema;
pub mod spec;
pub mod validate;

pub use defaults::default_config;
pub use errors::{ConfigurationError, ValidationIssue};
pub use load::{load_config, parse_config_json, parse_config_toml};
pub use model::{
    AreaCodes, AttributeConfig, CategoryMix, ConfigFile, DateBound, DependList, FieldSwapConfig,
    IdentifierFormat, TypoProbabilities,
};
pub use params::{CorruptionCategory, DistributionKind, GeneratorParams, ModificationMode};
pub use schema::config_json_schema;
pub use spec::{CharRange, FieldKind, FieldSpec, FieldSwap, OcrProbabilities, Operation};
pub use validate::{FieldSelection, FieldSpecValidator, ValidatedConfig, validate_config};

/// Tolerance applied to every "probabilities sum to 1" check.
pub const PROBABILITY_TOLERANCE: f64 = 0.001;
