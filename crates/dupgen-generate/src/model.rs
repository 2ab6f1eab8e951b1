use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::resources::bundled_data_dir;

/// Options for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Seed of the run's random generator; drawn and reported when absent.
    pub seed: Option<u64>,
    /// Value pinned on the locale field of every original record.
    pub locale: Option<String>,
    /// Year used to turn ages into birth years; defaults to the current year.
    pub current_year: Option<i32>,
    /// Consecutive collisions tolerated while building one original record.
    pub max_attempts_record: u32,
    /// Collisions tolerated per duplicate source before its slots are abandoned.
    pub max_retry_duplicates: u32,
    /// Unproductive modification attempts tolerated per duplicate.
    pub max_retry_modifications: u32,
    /// Directory holding frequency, misspelling, lookup and rule files.
    pub data_dir: PathBuf,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            seed: None,
            locale: None,
            current_year: None,
            max_attempts_record: 1000,
            max_retry_duplicates: 10,
            max_retry_modifications: 10,
            data_dir: bundled_data_dir(),
        }
    }
}

/// Structured generation issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationIssue {
    pub level: String,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

impl GenerationIssue {
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: "warning".to_string(),
            code: code.into(),
            message: message.into(),
            path: None,
            record_id: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_record(mut self, record_id: impl ToString) -> Self {
        self.record_id = Some(record_id.to_string());
        self
    }
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub seed: u64,
    pub originals_requested: u64,
    pub originals_generated: u64,
    /// Original records discarded because they collided.
    pub original_retries: u64,
    pub duplicates_requested: u64,
    pub duplicates_generated: u64,
    /// Duplicates discarded because they collided.
    pub duplicate_retries: u64,
    /// Duplicate slots given up after exhausting their retries.
    pub abandoned_slots: u64,
    pub sources_used: u64,
    pub category_usage: BTreeMap<String, u64>,
    pub operation_usage: BTreeMap<String, u64>,
    pub warnings_by_code: BTreeMap<String, u64>,
    pub warnings: Vec<GenerationIssue>,
    pub duration_ms: u64,
}

impl GenerationReport {
    pub fn new(run_id: String, seed: u64) -> Self {
        Self {
            run_id,
            seed,
            originals_requested: 0,
            originals_generated: 0,
            original_retries: 0,
            duplicates_requested: 0,
            duplicates_generated: 0,
            duplicate_retries: 0,
            abandoned_slots: 0,
            sources_used: 0,
            category_usage: BTreeMap::new(),
            operation_usage: BTreeMap::new(),
            warnings_by_code: BTreeMap::new(),
            warnings: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn record_category(&mut self, code: &str) {
        *self.category_usage.entry(code.to_string()).or_insert(0) += 1;
    }

    pub fn record_operation(&mut self, name: &str) {
        *self.operation_usage.entry(name.to_string()).or_insert(0) += 1;
    }

    pub fn record_warning(&mut self, issue: GenerationIssue) {
        *self.warnings_by_code.entry(issue.code.clone()).or_insert(0) += 1;
        self.warnings.push(issue);
    }
}
