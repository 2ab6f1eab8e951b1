use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};

use dupgen_config::GeneratorParams;
use dupgen_generate::GenerationReport;
use serde::Serialize;

use super::{RegistryError, RegistryResult};

/// Files written by a `generate` run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutputs {
    pub records: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub true_links: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

/// JSON summary of a `generate` run: inputs, outputs and the engine report.
#[derive(Debug, Serialize)]
pub struct RunManifest<'a> {
    pub run_id: &'a str,
    pub started_at: String,
    pub finished_at: String,
    pub params: &'a GeneratorParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<&'a Path>,
    pub data_dir: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub culture: Option<&'a str>,
    pub fields: Vec<&'a str>,
    pub outputs: RunOutputs,
    pub report: &'a GenerationReport,
}

/// Write pretty JSON, creating parent directories as needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> RegistryResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    serde_json::to_writer_pretty(file, value).map_err(RegistryError::from)
}
