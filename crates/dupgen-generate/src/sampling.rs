use std::path::PathBuf;

use dupgen_config::{FieldKind, FieldSpec, IdentifierFormat};
use dupgen_core::epoch_to_date;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::errors::{GenerationError, ResourceLoadError};
use crate::resources::ResourceTables;

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `true` with probability `prob`; never for 0.0, always for 1.0.
pub(crate) fn roll<R: Rng + ?Sized>(rng: &mut R, prob: f64) -> bool {
    prob > 0.0 && rng.random::<f64>() < prob
}

/// Draws fresh field values by field kind, ignoring dependencies.
#[derive(Debug, Clone, Copy)]
pub struct ValueSampler<'a> {
    tables: &'a ResourceTables,
    missing_value: &'a str,
}

impl<'a> ValueSampler<'a> {
    pub fn new(tables: &'a ResourceTables, missing_value: &'a str) -> Self {
        Self {
            tables,
            missing_value,
        }
    }

    /// Fresh value for `field`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        field: &FieldSpec,
        rng: &mut R,
    ) -> Result<String, GenerationError> {
        match &field.kind {
            FieldKind::Frequency { freq_file } => self.frequency(&field.name, freq_file, rng),
            FieldKind::Date {
                start_epoch,
                end_epoch,
            } => date(*start_epoch, *end_epoch, rng),
            FieldKind::Phone {
                area_codes,
                num_digits,
            } => {
                let area_code = area_codes
                    .choose(rng)
                    .map(String::as_str)
                    .unwrap_or_default();
                Ok(format!("{area_code}{}", phone_digits(*num_digits, rng)))
            }
            FieldKind::Identifier {
                start_id,
                end_id,
                format,
            } => Ok(identifier(*start_id, *end_id, format.as_ref(), rng)),
            FieldKind::Other { value } => Ok(value
                .clone()
                .unwrap_or_else(|| self.missing_value.to_string())),
        }
    }

    /// Uniform value of a field's frequency pool.
    pub fn frequency<R: Rng + ?Sized>(
        &self,
        field: &str,
        freq_file: &str,
        rng: &mut R,
    ) -> Result<String, GenerationError> {
        self.tables
            .frequencies
            .get(field)
            .and_then(|pool| pool.sample(rng))
            .map(str::to_string)
            .ok_or_else(|| {
                GenerationError::Resource(ResourceLoadError::Invalid {
                    path: PathBuf::from(freq_file),
                    message: format!("no frequency values loaded for field '{field}'"),
                })
            })
    }
}

/// Uniform epoch day in `[start, end)` rendered `yyyymmdd`.
pub fn date<R: Rng + ?Sized>(start: i64, end: i64, rng: &mut R) -> Result<String, GenerationError> {
    let day = if end > start {
        rng.random_range(start..end)
    } else {
        start
    };
    Ok(epoch_to_date(day)?.to_compact_string())
}

/// Zero-padded block of `num_digits` digits.
///
/// The block is drawn from `[min, 10^n - 1]` where `min` is the number made
/// of `1 + round_half_even(n / 2)` ones, so short numbers are avoided.
pub fn phone_digits<R: Rng + ?Sized>(num_digits: u32, rng: &mut R) -> String {
    let num_digits = num_digits.clamp(1, 18);
    let ones = 1 + (num_digits as f64 / 2.0).round_ties_even() as u32;
    let min = (10_u64.pow(ones) - 1) / 9;
    let max = 10_u64.pow(num_digits) - 1;
    let block = rng.random_range(min.min(max)..=max);
    format!("{block:0width$}", width = num_digits as usize)
}

/// Uniform identifier in `[start, end)` with optional cosmetic formatting.
pub fn identifier<R: Rng + ?Sized>(
    start: i64,
    end: i64,
    format: Option<&IdentifierFormat>,
    rng: &mut R,
) -> String {
    let number = if end > start {
        rng.random_range(start..end)
    } else {
        start
    };
    match format {
        None => number.to_string(),
        Some(IdentifierFormat::LetterSuffix { count }) => {
            let suffix: String = (0..*count)
                .filter_map(|_| UPPERCASE.choose(rng).map(|byte| *byte as char))
                .collect();
            format!("{number}{suffix}")
        }
        Some(IdentifierFormat::CategoryPrefix {
            prefixes,
            separator,
        }) => match prefixes.choose(rng) {
            Some(prefix) => format!("{}{separator}{number}", prefix.to_uppercase()),
            None => number.to_string(),
        },
    }
}
