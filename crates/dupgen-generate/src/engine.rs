use std::collections::BTreeMap;
use std::time::Instant;

use dupgen_config::ValidatedConfig;
use dupgen_core::{
    Record, RecordId, TrueLink, UniquenessRegistry, true_link_groups, true_link_pairs,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use crate::duplicate::{DuplicateBatch, DuplicateRecordFactory, ModificationLog};
use crate::errors::GenerationError;
use crate::model::{GenerateOptions, GenerationIssue, GenerationReport};
use crate::original::OriginalRecordFactory;
use crate::resources::ResourceLoader;

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub originals: Vec<Record>,
    pub duplicates: Vec<Record>,
    /// One log per duplicate, aligned with `duplicates`.
    pub logs: Vec<ModificationLog>,
    pub report: GenerationReport,
}

impl GenerationResult {
    /// Originals followed by duplicates.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.originals.iter().chain(self.duplicates.iter())
    }

    pub fn record_ids(&self) -> Vec<RecordId> {
        self.records().map(Record::id).collect()
    }

    /// Record ids grouped by originating original.
    pub fn true_link_groups(&self) -> BTreeMap<u64, Vec<RecordId>> {
        true_link_groups(&self.record_ids())
    }

    /// Every pair of records describing the same entity.
    pub fn true_links(&self) -> Vec<TrueLink> {
        true_link_pairs(&self.record_ids())
    }
}

/// Entry point for generating originals and duplicates from a validated
/// configuration.
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn run(&self, config: &ValidatedConfig) -> Result<GenerationResult, GenerationError> {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let seed = self.options.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let params = &config.params;

        let mut report = GenerationReport::new(run_id.clone(), seed);
        for issue in &config.warnings {
            report.record_warning(
                GenerationIssue::warning(issue.code.clone(), issue.message.clone())
                    .with_path(issue.path.clone()),
            );
        }

        info!(
            run_id = %run_id,
            seed,
            originals = params.num_org_records,
            duplicates = params.num_dup_records,
            distribution = %params.distribution,
            modification = %params.modification,
            fields = config.fields.len(),
            "generation started"
        );

        let outcome = self.generate(config, &mut rng, &mut report);
        report.duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok((originals, batch)) => {
                info!(
                    run_id = %run_id,
                    originals = report.originals_generated,
                    duplicates = report.duplicates_generated,
                    original_retries = report.original_retries,
                    duplicate_retries = report.duplicate_retries,
                    abandoned_slots = report.abandoned_slots,
                    warnings = report.warnings.len(),
                    duration_ms = report.duration_ms,
                    "generation completed"
                );
                Ok(GenerationResult {
                    originals,
                    duplicates: batch.records,
                    logs: batch.logs,
                    report,
                })
            }
            Err(err) => {
                warn!(run_id = %run_id, error = %err, "generation failed");
                Err(err)
            }
        }
    }

    fn generate(
        &self,
        config: &ValidatedConfig,
        rng: &mut ChaCha8Rng,
        report: &mut GenerationReport,
    ) -> Result<(Vec<Record>, DuplicateBatch), GenerationError> {
        let loader = ResourceLoader::new(self.options.data_dir.clone());
        let tables = loader.load_tables(config, rng)?;
        let mut registry = UniquenessRegistry::new();

        let phase_start = Instant::now();
        let originals = OriginalRecordFactory::new(config, &tables, &self.options)
            .generate(&mut registry, report, rng)?;
        info!(
            generated = originals.len(),
            retries = report.original_retries,
            duration_ms = phase_start.elapsed().as_millis() as u64,
            "original records generated"
        );

        let phase_start = Instant::now();
        let factory = DuplicateRecordFactory::new(config, &tables, &self.options)?;
        let batch = factory.generate(&originals, &mut registry, report, rng)?;
        info!(
            generated = batch.records.len(),
            retries = report.duplicate_retries,
            sources = report.sources_used,
            duration_ms = phase_start.elapsed().as_millis() as u64,
            "duplicate records generated"
        );

        Ok((originals, batch))
    }
}
