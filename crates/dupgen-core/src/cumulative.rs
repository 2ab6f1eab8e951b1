use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Weighted selection table of `(item, cumulative lower bound)` pairs.
///
/// The first bound is always 0.0 and bounds increase strictly: items with a
/// zero weight are never entered, so they can never be selected. A draw `r`
/// in `[0, 1)` selects the last entry whose bound is `<= r`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeTable<T> {
    entries: Vec<(T, f64)>,
}

impl<T> CumulativeTable<T> {
    /// Build a table from `(item, weight)` pairs, keeping their order.
    pub fn from_weights<I>(weights: I) -> Result<Self>
    where
        I: IntoIterator<Item = (T, f64)>,
    {
        let mut entries = Vec::new();
        let mut bound = 0.0_f64;

        for (item, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::InvalidWeights(format!(
                    "weight {weight} is not a finite, non-negative number"
                )));
            }
            if weight == 0.0 {
                continue;
            }
            entries.push((item, bound));
            bound += weight;
        }

        if let Some((_, last)) = entries.last()
            && *last >= 1.0
        {
            return Err(Error::InvalidWeights(format!(
                "last cumulative bound {last} must stay below 1.0"
            )));
        }

        Ok(Self { entries })
    }

    /// Table that always selects `item`.
    pub fn single(item: T) -> Self {
        Self {
            entries: vec![(item, 0.0)],
        }
    }

    pub fn entries(&self) -> &[(T, f64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(item, _)| item)
    }

    /// Item of the last entry whose bound is `<= draw`.
    pub fn select_at(&self, draw: f64) -> Option<&T> {
        self.entries
            .iter()
            .rev()
            .find(|(_, bound)| *bound <= draw)
            .map(|(item, _)| item)
    }

    /// Draw a uniform value in `[0, 1)` and select with it.
    ///
    /// Returns `None` only for an empty table.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&T> {
        if self.entries.is_empty() {
            return None;
        }
        let draw: f64 = rng.random();
        self.select_at(draw)
    }

    /// Probability mass of each entry under uniform draws in `[0, 1)`.
    pub fn probabilities(&self) -> Vec<(&T, f64)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, (item, bound))| {
                let upper = self
                    .entries
                    .get(idx + 1)
                    .map(|(_, next)| *next)
                    .unwrap_or(1.0);
                (item, upper - bound)
            })
            .collect()
    }
}
