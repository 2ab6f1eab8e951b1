use dupgen_config::{DistributionKind, GeneratorParams};
use dupgen_core::CumulativeTable;
use rand::Rng;

use crate::errors::GenerationError;

const ZIPF_THETA: f64 = 0.5;

/// Distribution of the number of duplicates derived from one original.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateCountDistribution {
    kind: DistributionKind,
    max: u32,
    table: CumulativeTable<u32>,
}

impl DuplicateCountDistribution {
    pub fn new(params: &GeneratorParams) -> Result<Self, GenerationError> {
        let max = params.max_num_dups.max(1);
        let weights = match params.distribution {
            DistributionKind::Uniform => uniform_weights(max),
            DistributionKind::Poisson => {
                let lambda = 1.0
                    + params.num_dup_records as f64 / params.num_org_records.max(1) as f64;
                poisson_weights(max, lambda)
            }
            DistributionKind::Zipf => zipf_weights(max),
        };
        let table = CumulativeTable::from_weights((1..=max).zip(weights))?;
        Ok(Self {
            kind: params.distribution,
            max,
            table,
        })
    }

    pub fn kind(&self) -> DistributionKind {
        self.kind
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn table(&self) -> &CumulativeTable<u32> {
        &self.table
    }

    /// Number of duplicates in `[1, max]`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        self.table.select(rng).copied().unwrap_or(1).clamp(1, self.max)
    }
}

fn normalize(weights: Vec<f64>) -> Vec<f64> {
    let sum: f64 = weights.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        let count = weights.len().max(1) as f64;
        return vec![1.0 / count; weights.len()];
    }
    weights.into_iter().map(|weight| weight / sum).collect()
}

fn uniform_weights(max: u32) -> Vec<f64> {
    vec![1.0 / max as f64; max as usize]
}

/// Poisson masses for `i` in `0..max`; count `k` takes the mass of `i = k - 1`.
fn poisson_weights(max: u32, lambda: f64) -> Vec<f64> {
    // exp(-lambda) cancels under normalization; i! is built up term by term.
    let mut weights = Vec::with_capacity(max as usize);
    let mut term = 1.0_f64;
    for i in 0..max {
        if i > 0 {
            term *= lambda / i as f64;
        }
        weights.push(term);
    }
    normalize(weights)
}

/// Zipf weights `1 / i^(1 - theta)`; the Zipf constant cancels under
/// normalization over the retained terms.
fn zipf_weights(max: u32) -> Vec<f64> {
    let weights = (1..=max)
        .map(|i| 1.0 / (i as f64).powf(1.0 - ZIPF_THETA))
        .collect();
    normalize(weights)
}
