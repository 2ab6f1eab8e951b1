use chrono::Datelike;
use dupgen_config::{FieldKind, FieldSpec, ValidatedConfig};
use dupgen_core::{DateParts, Record, RecordId, UniquenessRegistry, epoch_to_date, is_leap_year};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::debug;

use crate::errors::GenerationError;
use crate::model::{GenerateOptions, GenerationReport};
use crate::resources::ResourceTables;
use crate::sampling::{ValueSampler, date, phone_digits, roll};

/// Builds clean original records.
#[derive(Debug)]
pub struct OriginalRecordFactory<'a> {
    config: &'a ValidatedConfig,
    tables: &'a ResourceTables,
    sampler: ValueSampler<'a>,
    locale: Option<&'a str>,
    current_year: i32,
    max_attempts: u32,
}

impl<'a> OriginalRecordFactory<'a> {
    pub fn new(
        config: &'a ValidatedConfig,
        tables: &'a ResourceTables,
        options: &'a GenerateOptions,
    ) -> Self {
        Self {
            config,
            tables,
            sampler: ValueSampler::new(tables, &config.missing_value),
            locale: options.locale.as_deref(),
            current_year: options
                .current_year
                .unwrap_or_else(|| chrono::Utc::now().year()),
            max_attempts: options.max_attempts_record.max(1),
        }
    }

    /// Generate the requested number of unique originals, registering each.
    ///
    /// Fails with [`GenerationError::Stall`] after `max_attempts_record`
    /// consecutive collisions.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        registry: &mut UniquenessRegistry,
        report: &mut GenerationReport,
        rng: &mut R,
    ) -> Result<Vec<Record>, GenerationError> {
        let requested = self.config.params.num_org_records;
        let mut records = Vec::with_capacity(requested as usize);
        let mut consecutive = 0_u32;
        report.originals_requested = requested;

        while (records.len() as u64) < requested {
            let record = self.build(records.len() as u64, rng)?;
            if registry.insert(&record) {
                records.push(record);
                consecutive = 0;
                continue;
            }

            report.original_retries += 1;
            consecutive += 1;
            debug!(record_id = %record.id(), consecutive, "original record collided");
            if consecutive >= self.max_attempts {
                report.originals_generated = records.len() as u64;
                return Err(GenerationError::Stall {
                    generated: records.len() as u64,
                    requested,
                    attempts: consecutive,
                });
            }
        }

        report.originals_generated = records.len() as u64;
        Ok(records)
    }

    /// One candidate original with the given index; not registered.
    pub fn build<R: Rng + ?Sized>(
        &self,
        index: u64,
        rng: &mut R,
    ) -> Result<Record, GenerationError> {
        let mut record = Record::new(RecordId::original(index));

        for field in &self.config.fields {
            let is_locale = self.config.locale_field.as_deref() == Some(field.name.as_str());
            if !is_locale && roll(rng, field.miss_prob()) {
                record.set(field.name.clone(), self.config.missing_value.clone());
                continue;
            }

            let value = match &field.kind {
                FieldKind::Frequency { .. } => match self.locale {
                    Some(locale) if is_locale => locale.to_string(),
                    _ => {
                        let value = self.sampler.sample(field, rng)?;
                        self.resolve_dependency(&record, field, rng).unwrap_or(value)
                    }
                },
                FieldKind::Date {
                    start_epoch,
                    end_epoch,
                } => self.birth_date(&mut record, field, *start_epoch, *end_epoch, rng)?,
                FieldKind::Phone {
                    area_codes,
                    num_digits,
                } => {
                    let area_code = match self.resolve_dependency(&record, field, rng) {
                        Some(code) => code,
                        None => area_codes.choose(rng).cloned().unwrap_or_default(),
                    };
                    format!("{area_code}{}", phone_digits(*num_digits, rng))
                }
                FieldKind::Identifier { .. } | FieldKind::Other { .. } => {
                    self.sampler.sample(field, rng)?
                }
            };
            record.set(field.name.clone(), value);
        }

        Ok(record)
    }

    /// Lookup-table replacement conditioned on earlier fields, drawn with
    /// the field's `depend_prob`.
    fn resolve_dependency<R: Rng + ?Sized>(
        &self,
        record: &Record,
        field: &FieldSpec,
        rng: &mut R,
    ) -> Option<String> {
        if field.depends_on.is_empty() || !roll(rng, field.depend_prob) {
            return None;
        }
        let key = self.dependency_key(record, field)?;
        let table = self.tables.lookups.get(&field.name)?;
        table.choose(&key, rng).map(str::to_string)
    }

    /// Present dependency values with spaces removed, lower-cased and
    /// joined by `-`.
    pub fn dependency_key(&self, record: &Record, field: &FieldSpec) -> Option<String> {
        let parts: Vec<String> = field
            .depends_on
            .iter()
            .filter_map(|name| record.get(name))
            .filter(|value| *value != self.config.missing_value)
            .map(|value| value.replace(' ', "").to_lowercase())
            .collect();
        if parts.is_empty() {
            return None;
        }
        Some(parts.join("-"))
    }

    /// Date value; a date depending on an age field may take its year from
    /// the age and may re-roll the age afterwards.
    fn birth_date<R: Rng + ?Sized>(
        &self,
        record: &mut Record,
        field: &FieldSpec,
        start: i64,
        end: i64,
        rng: &mut R,
    ) -> Result<String, GenerationError> {
        let Some(age_field) = field.depends_on.first() else {
            return date(start, end, rng);
        };

        let day = if end > start {
            rng.random_range(start..end)
        } else {
            start
        };
        let drawn = epoch_to_date(day)?;
        if !roll(rng, field.depend_prob) {
            return Ok(drawn.to_compact_string());
        }
        let Some(age) = record
            .get(age_field)
            .filter(|value| *value != self.config.missing_value)
            .and_then(|value| value.trim().parse::<i32>().ok())
        else {
            return Ok(drawn.to_compact_string());
        };

        let year = self.current_year - age;
        let day = if drawn.month == 2 && drawn.day == 29 && !is_leap_year(year) {
            28
        } else {
            drawn.day
        };
        let value = DateParts::new(day, drawn.month, year).to_compact_string();

        if let Some(age_spec) = self.config.field(age_field)
            && roll(rng, 1.0 - age_spec.depend_prob)
            && let Some(pool) = self.tables.frequencies.get(age_field)
            && let Some(rerolled) = pool.sample(rng)
        {
            debug!(field = %age_field, age, rerolled, "age re-rolled after birth year override");
            record.set(age_field.clone(), rerolled.to_string());
        }

        Ok(value)
    }
}
