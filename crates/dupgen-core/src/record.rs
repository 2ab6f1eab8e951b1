use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Whether a record is an original or the `k`-th duplicate of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Original,
    Duplicate(u32),
}

/// Synthetic record identifier: `rec-<n>-org` or `rec-<n>-dup-<k>`.
///
/// Records sharing `index` describe the same entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId {
    pub index: u64,
    pub kind: RecordKind,
}

impl RecordId {
    pub fn original(index: u64) -> Self {
        Self {
            index,
            kind: RecordKind::Original,
        }
    }

    pub fn duplicate(index: u64, number: u32) -> Self {
        Self {
            index,
            kind: RecordKind::Duplicate(number),
        }
    }

    pub fn is_original(&self) -> bool {
        self.kind == RecordKind::Original
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RecordKind::Original => write!(f, "rec-{}-org", self.index),
            RecordKind::Duplicate(number) => write!(f, "rec-{}-dup-{}", self.index, number),
        }
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
        let pattern = PATTERN
            .get_or_init(|| Regex::new(r"^rec-(\d+)-(?:(org)|dup-(\d+))$").ok())
            .as_ref()
            .ok_or_else(|| Error::InvalidRecordId("record id pattern unavailable".to_string()))?;

        let invalid = || Error::InvalidRecordId(value.to_string());
        let captures = pattern.captures(value.trim()).ok_or_else(invalid)?;
        let index = captures[1].parse::<u64>().map_err(|_| invalid())?;

        if captures.get(2).is_some() {
            return Ok(Self::original(index));
        }
        let number = captures
            .get(3)
            .ok_or_else(invalid)?
            .as_str()
            .parse::<u32>()
            .map_err(|_| invalid())?;
        Ok(Self::duplicate(index, number))
    }
}

impl TryFrom<String> for RecordId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecordId> for String {
    fn from(value: RecordId) -> Self {
        value.to_string()
    }
}

/// A generated record: field values keyed by field name plus its id.
///
/// Missing values are stored as the run's missing sentinel so every
/// configured field is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    id: RecordId,
    values: BTreeMap<String, String>,
}

impl Record {
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            values: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn with_id(&self, id: RecordId) -> Self {
        Self {
            id,
            values: self.values.clone(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// Store a value, returning the previous one.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(field.into(), value.into())
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Swap the values of two fields. Returns false when either is absent.
    pub fn swap(&mut self, left: &str, right: &str) -> bool {
        let (Some(a), Some(b)) = (self.values.get(left).cloned(), self.values.get(right).cloned())
        else {
            return false;
        };
        self.values.insert(left.to_string(), b);
        self.values.insert(right.to_string(), a);
        true
    }

    /// Canonical form of the field values, excluding the id.
    ///
    /// Pairs are sorted by field name and length-prefixed, so two records
    /// share a key exactly when their field-value mappings are equal.
    pub fn canonical_key(&self) -> String {
        let mut key = String::new();
        for (field, value) in &self.values {
            key.push_str(&format!("{}:{}={}:{};", field.len(), field, value.len(), value));
        }
        key
    }
}

/// Run-wide registry of canonical record keys.
#[derive(Debug, Default, Clone)]
pub struct UniquenessRegistry {
    seen: HashSet<String>,
}

impl UniquenessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the record's key; returns false if it was already present.
    pub fn insert(&mut self, record: &Record) -> bool {
        self.seen.insert(record.canonical_key())
    }

    pub fn contains(&self, record: &Record) -> bool {
        self.seen.contains(&record.canonical_key())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
