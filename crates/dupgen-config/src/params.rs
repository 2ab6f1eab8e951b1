use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationError;

/// Distribution of the number of duplicates per original record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DistributionKind {
    Uniform,
    Poisson,
    Zipf,
}

impl FromStr for DistributionKind {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "uni" | "uniform" => Ok(Self::Uniform),
            "poi" | "poisson" => Ok(Self::Poisson),
            "zip" | "zipf" => Ok(Self::Zipf),
            other => Err(ConfigurationError::global(
                "distribution",
                format!("unknown distribution '{other}' (expected uniform, poisson or zipf)"),
            )),
        }
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uniform => "uniform",
            Self::Poisson => "poisson",
            Self::Zipf => "zipf",
        };
        f.write_str(name)
    }
}

/// Family of errors injected into a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CorruptionCategory {
    Typographical,
    Phonetic,
    Ocr,
}

impl CorruptionCategory {
    /// Short tag used on the command line and in reports.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Typographical => "typ",
            Self::Phonetic => "pho",
            Self::Ocr => "ocr",
        }
    }
}

impl FromStr for CorruptionCategory {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "typ" | "typographical" => Ok(Self::Typographical),
            "pho" | "phonetic" => Ok(Self::Phonetic),
            "ocr" => Ok(Self::Ocr),
            other => Err(ConfigurationError::global(
                "type_modification",
                format!("unknown modification type '{other}' (expected typ, pho, ocr or all)"),
            )),
        }
    }
}

impl fmt::Display for CorruptionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Which categories a run may inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModificationMode {
    /// Every duplicate uses the same category.
    Only(CorruptionCategory),
    /// A category is drawn per source record from the configured mix.
    All,
}

impl FromStr for ModificationMode {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        value.parse().map(Self::Only)
    }
}

impl fmt::Display for ModificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Only(category) => write!(f, "{category}"),
            Self::All => f.write_str("all"),
        }
    }
}

/// Size and budget parameters of a generation run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeneratorParams {
    pub num_org_records: u64,
    pub num_dup_records: u64,
    /// Upper bound of duplicates derived from one original (1..=9).
    pub max_num_dups: u32,
    /// Upper bound of modifications applied to one field of a duplicate.
    pub max_num_field_modifi: u32,
    /// Upper bound of modifications applied to a whole duplicate.
    pub max_num_record_modifi: u32,
    pub distribution: DistributionKind,
    pub modification: ModificationMode,
}

impl GeneratorParams {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.num_org_records == 0 {
            return Err(ConfigurationError::global(
                "num_org_records",
                "number of original records must be positive",
            ));
        }
        if !(1..=9).contains(&self.max_num_dups) {
            return Err(ConfigurationError::global(
                "max_num_dups",
                format!(
                    "maximal number of duplicates per record must be between 1 and 9, got {}",
                    self.max_num_dups
                ),
            ));
        }
        if self.max_num_field_modifi == 0 {
            return Err(ConfigurationError::global(
                "max_num_field_modifi",
                "maximal number of modifications per field must be positive",
            ));
        }
        if self.max_num_record_modifi == 0 {
            return Err(ConfigurationError::global(
                "max_num_record_modifi",
                "maximal number of modifications per record must be positive",
            ));
        }
        if self.max_num_record_modifi < self.max_num_field_modifi {
            return Err(ConfigurationError::global(
                "max_num_record_modifi",
                format!(
                    "maximal modifications per record ({}) must not be smaller than per field ({})",
                    self.max_num_record_modifi, self.max_num_field_modifi
                ),
            ));
        }
        Ok(())
    }
}
