use std::collections::BTreeMap;

use dupgen_config::{
    CorruptionCategory, FieldSpec, FieldSwap, ModificationMode, Operation, ValidatedConfig,
};
use dupgen_core::{Record, RecordId, UniquenessRegistry};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::corruption::{CharacterErrorModel, RuleInterpreter};
use crate::distribution::DuplicateCountDistribution;
use crate::errors::GenerationError;
use crate::model::{GenerateOptions, GenerationIssue, GenerationReport};
use crate::resources::ResourceTables;
use crate::sampling::{ValueSampler, roll};

/// A single change applied to a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    pub field: String,
    pub operation: String,
    pub before: String,
    pub after: String,
}

/// Modifications applied while deriving one duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModificationLog {
    pub record_id: RecordId,
    pub source_id: RecordId,
    pub category: CorruptionCategory,
    /// Counted modifications of the whole record.
    pub record_modifications: u32,
    /// Counted modifications per field.
    pub field_modifications: BTreeMap<String, u32>,
    pub modifications: Vec<Modification>,
}

impl ModificationLog {
    fn new(record_id: RecordId, source_id: RecordId, category: CorruptionCategory) -> Self {
        Self {
            record_id,
            source_id,
            category,
            record_modifications: 0,
            field_modifications: BTreeMap::new(),
            modifications: Vec::new(),
        }
    }

    pub fn field_count(&self, field: &str) -> u32 {
        self.field_modifications.get(field).copied().unwrap_or(0)
    }

    fn push(&mut self, field: &str, operation: &str, before: &str, after: &str) {
        self.modifications.push(Modification {
            field: field.to_string(),
            operation: operation.to_string(),
            before: before.to_string(),
            after: after.to_string(),
        });
    }
}

/// Accepted duplicates with the log of each one, in generation order.
#[derive(Debug, Clone, Default)]
pub struct DuplicateBatch {
    pub records: Vec<Record>,
    pub logs: Vec<ModificationLog>,
}

/// Derives corrupted duplicates from original records.
#[derive(Debug)]
pub struct DuplicateRecordFactory<'a> {
    config: &'a ValidatedConfig,
    tables: &'a ResourceTables,
    sampler: ValueSampler<'a>,
    typos: CharacterErrorModel,
    counts: DuplicateCountDistribution,
    max_retry_duplicates: u32,
    max_retry_modifications: u32,
}

impl<'a> DuplicateRecordFactory<'a> {
    pub fn new(
        config: &'a ValidatedConfig,
        tables: &'a ResourceTables,
        options: &GenerateOptions,
    ) -> Result<Self, GenerationError> {
        Ok(Self {
            config,
            tables,
            sampler: ValueSampler::new(tables, &config.missing_value),
            typos: CharacterErrorModel::new(config.typo),
            counts: DuplicateCountDistribution::new(&config.params)?,
            max_retry_duplicates: options.max_retry_duplicates.max(1),
            max_retry_modifications: options.max_retry_modifications.max(1),
        })
    }

    pub fn counts(&self) -> &DuplicateCountDistribution {
        &self.counts
    }

    /// Generate up to `num_dup_records` duplicates from `originals`.
    ///
    /// Every original serves as a source at most once. Running out of
    /// sources or of retries for a source is reported, not an error.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        originals: &[Record],
        registry: &mut UniquenessRegistry,
        report: &mut GenerationReport,
        rng: &mut R,
    ) -> Result<DuplicateBatch, GenerationError> {
        let requested = self.config.params.num_dup_records;
        let mut batch = DuplicateBatch::default();
        let mut unused: Vec<usize> = (0..originals.len()).collect();
        report.duplicates_requested = requested;

        while (batch.records.len() as u64) < requested {
            if unused.is_empty() {
                let generated = batch.records.len() as u64;
                warn!(generated, requested, "no unused original left to duplicate");
                report.record_warning(GenerationIssue::warning(
                    "sources_exhausted",
                    format!(
                        "every original was used as a source; \
                         {generated} of {requested} duplicates generated"
                    ),
                ));
                break;
            }

            let source = &originals[unused.swap_remove(rng.random_range(0..unused.len()))];
            let category = self.draw_category(rng);
            let wanted = self.counts.sample(rng);

            let mut produced = 0_u32;
            let mut retries = 0_u32;
            while produced < wanted
                && (batch.records.len() as u64) < requested
                && retries < self.max_retry_duplicates
            {
                let id = RecordId::duplicate(source.id().index, produced);
                let (candidate, log) = self.build(source, id, category, rng)?;
                if !registry.insert(&candidate) {
                    retries += 1;
                    report.duplicate_retries += 1;
                    debug!(record_id = %id, retries, "duplicate collided");
                    continue;
                }

                debug!(
                    record_id = %id,
                    source = %source.id(),
                    category = %category,
                    modifications = log.record_modifications,
                    "duplicate accepted"
                );
                report.record_category(category.code());
                for modification in &log.modifications {
                    report.record_operation(&modification.operation);
                }
                batch.records.push(candidate);
                batch.logs.push(log);
                produced += 1;
            }

            if produced > 0 {
                report.sources_used += 1;
            }
            if produced < wanted && retries >= self.max_retry_duplicates {
                let remaining = requested - batch.records.len() as u64;
                let abandoned = u64::from(wanted - produced).min(remaining);
                report.abandoned_slots += abandoned;
                warn!(source = %source.id(), abandoned, retries, "duplicate retries exhausted");
                report.record_warning(
                    GenerationIssue::warning(
                        "duplicate_retries_exhausted",
                        format!("{abandoned} duplicate slots abandoned after {retries} collisions"),
                    )
                    .with_record(source.id()),
                );
            }
        }

        report.duplicates_generated = batch.records.len() as u64;
        Ok(batch)
    }

    fn draw_category<R: Rng + ?Sized>(&self, rng: &mut R) -> CorruptionCategory {
        match self.config.params.modification {
            ModificationMode::Only(category) => category,
            ModificationMode::All => self
                .config
                .categories
                .select(rng)
                .copied()
                .unwrap_or(CorruptionCategory::Typographical),
        }
    }

    /// One candidate duplicate of `source`; not registered.
    pub fn build<R: Rng + ?Sized>(
        &self,
        source: &Record,
        id: RecordId,
        category: CorruptionCategory,
        rng: &mut R,
    ) -> Result<(Record, ModificationLog), GenerationError> {
        let mut record = source.with_id(id);
        let mut log = ModificationLog::new(id, source.id(), category);

        if self.config.params.max_num_record_modifi > 1
            && category == CorruptionCategory::Typographical
        {
            self.swap_fields(&mut record, &mut log, rng);
        }
        self.modify_fields(source, &mut record, &mut log, category, rng)?;

        Ok((record, log))
    }

    fn swap_fields<R: Rng + ?Sized>(
        &self,
        record: &mut Record,
        log: &mut ModificationLog,
        rng: &mut R,
    ) {
        let max_record = self.config.params.max_num_record_modifi;
        let max_field = self.config.params.max_num_field_modifi;
        let mut pairs: Vec<&FieldSwap> = self.config.swaps.iter().collect();
        pairs.shuffle(rng);

        for pair in pairs {
            if self.is_locale(&pair.left) || self.is_locale(&pair.right) {
                continue;
            }
            if !roll(rng, pair.prob) || log.record_modifications + 2 > max_record {
                continue;
            }
            if log.field_count(&pair.left) >= max_field || log.field_count(&pair.right) >= max_field
            {
                continue;
            }
            let (Some(left), Some(right)) = (record.get(&pair.left), record.get(&pair.right))
            else {
                continue;
            };
            if left == right {
                continue;
            }
            let (left, right) = (left.to_string(), right.to_string());
            record.swap(&pair.left, &pair.right);

            log.record_modifications += 2;
            *log.field_modifications.entry(pair.left.clone()).or_insert(0) += 1;
            *log.field_modifications.entry(pair.right.clone()).or_insert(0) += 1;
            log.push(&pair.left, "field_swap", &left, &right);
            log.push(&pair.right, "field_swap", &right, &left);
        }
    }

    fn is_locale(&self, field: &str) -> bool {
        self.config.locale_field.as_deref() == Some(field)
    }

    /// Eligible field drawn in proportion to its select probability.
    /// The locale field is never eligible.
    fn pick_field<R: Rng + ?Sized>(&self, log: &ModificationLog, rng: &mut R) -> Option<usize> {
        let max_field = self.config.params.max_num_field_modifi;
        let eligible: Vec<(usize, f64)> = self
            .config
            .field_selection
            .probabilities()
            .into_iter()
            .filter(|(idx, _)| {
                self.config.fields.get(**idx).is_some_and(|field| {
                    !self.is_locale(&field.name) && log.field_count(&field.name) < max_field
                })
            })
            .map(|(idx, weight)| (*idx, weight))
            .collect();

        let total: f64 = eligible.iter().map(|(_, weight)| weight).sum();
        if eligible.is_empty() || total <= 0.0 {
            return None;
        }
        let mut draw = rng.random::<f64>() * total;
        for (idx, weight) in &eligible {
            if draw < *weight {
                return Some(*idx);
            }
            draw -= weight;
        }
        eligible.last().map(|(idx, _)| *idx)
    }

    fn modify_fields<R: Rng + ?Sized>(
        &self,
        source: &Record,
        record: &mut Record,
        log: &mut ModificationLog,
        category: CorruptionCategory,
        rng: &mut R,
    ) -> Result<(), GenerationError> {
        let max_record = self.config.params.max_num_record_modifi;
        let max_field = self.config.params.max_num_field_modifi;
        let missing = self.config.missing_value.as_str();
        let mut unproductive = 0_u32;

        while log.record_modifications < max_record && unproductive < self.max_retry_modifications {
            let Some(field) = self
                .pick_field(log, rng)
                .and_then(|idx| self.config.fields.get(idx))
            else {
                break;
            };
            let name = field.name.as_str();
            let todo = rng
                .random_range(1..=max_field)
                .min(max_record - log.record_modifications)
                .min(max_field - log.field_count(name));
            let original = source.get(name).unwrap_or(missing).to_string();

            let mut productive = false;
            for _ in 0..todo {
                let before = record.get(name).unwrap_or(missing).to_string();
                let Some((operation, after)) = self.modify_value(field, &before, category, rng)?
                else {
                    continue;
                };
                if after == before {
                    continue;
                }

                let counter = log.field_modifications.entry(name.to_string()).or_insert(0);
                if before == original {
                    *counter = 1;
                } else {
                    *counter += 1;
                }
                log.record_modifications += 1;
                log.push(name, operation, &before, &after);
                record.set(name, after);
                productive = true;
            }

            if !productive {
                unproductive += 1;
            }
        }

        Ok(())
    }

    /// Corrupted value for `current`, with the name of the operation used.
    fn modify_value<R: Rng + ?Sized>(
        &self,
        field: &FieldSpec,
        current: &str,
        category: CorruptionCategory,
        rng: &mut R,
    ) -> Result<Option<(&'static str, String)>, GenerationError> {
        let is_missing = current == self.config.missing_value;
        match category {
            CorruptionCategory::Typographical => {
                self.typographical(field, current, is_missing, rng)
            }
            CorruptionCategory::Phonetic => {
                if is_missing || !roll(rng, field.pho_prob) {
                    return Ok(None);
                }
                let value = rewrite(&self.tables.phonetic, current, rng);
                Ok(value.map(|value| ("phonetic_rule", value)))
            }
            CorruptionCategory::Ocr => {
                if is_missing {
                    return Ok(None);
                }
                Ok(self.ocr(field, current, rng))
            }
        }
    }

    fn typographical<R: Rng + ?Sized>(
        &self,
        field: &FieldSpec,
        current: &str,
        is_missing: bool,
        rng: &mut R,
    ) -> Result<Option<(&'static str, String)>, GenerationError> {
        let Some(operation) = field.operations.select(rng).copied() else {
            return Ok(None);
        };
        if is_missing != (operation == Operation::NewValue) {
            return Ok(None);
        }

        let range = field.char_range;
        let changed = match operation {
            Operation::Misspell => self
                .tables
                .misspellings
                .get(&field.name)
                .and_then(|table| table.choose(&current.to_lowercase(), rng))
                .map(str::to_string),
            Operation::ValueSwap | Operation::NewValue => Some(self.sampler.sample(field, rng)?),
            Operation::Missing => Some(self.config.missing_value.clone()),
            Operation::WordSwap => self.typos.swap_words(current, rng),
            Operation::Substitute => self.typos.substitute(current, range, rng),
            Operation::Insert => self.typos.insert(current, range, rng),
            Operation::Delete => self.typos.delete(current, rng),
            Operation::Transpose => self.typos.transpose(current, rng),
            Operation::SpaceInsert => self.typos.insert_space(current, rng),
            Operation::SpaceDelete => self.typos.delete_space(current, rng),
        };
        Ok(changed.map(|value| (operation.as_str(), value)))
    }

    /// Rule rewrite first; only when it changed nothing, the blank-glyph
    /// and space fallbacks are tried in order with independent draws.
    fn ocr<R: Rng + ?Sized>(
        &self,
        field: &FieldSpec,
        current: &str,
        rng: &mut R,
    ) -> Option<(&'static str, String)> {
        if roll(rng, field.ocr.rule)
            && let Some(value) = rewrite(&self.tables.ocr, current, rng)
            && value != current
        {
            return Some(("ocr_rule", value));
        }
        if roll(rng, field.ocr.fail)
            && let Some(value) = self.typos.blank_character(current, rng)
        {
            return Some(("ocr_fail", value));
        }
        if roll(rng, field.ocr.insert_space)
            && let Some(value) = self.typos.insert_space(current, rng)
        {
            return Some(("ocr_space_insert", value));
        }
        if roll(rng, field.ocr.delete_space)
            && let Some(value) = self.typos.delete_space(current, rng)
        {
            return Some(("ocr_space_delete", value));
        }
        None
    }
}

/// Apply one uniformly chosen candidate change of the rule table.
fn rewrite<R: Rng + ?Sized>(rules: &RuleInterpreter, value: &str, rng: &mut R) -> Option<String> {
    let changes = rules.transform(value);
    changes.choose(rng).map(|change| change.apply(value))
}
