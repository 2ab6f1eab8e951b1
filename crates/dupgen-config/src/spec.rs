use std::fmt;

use dupgen_core::CumulativeTable;
use serde::{Deserialize, Serialize};

use crate::model::IdentifierFormat;

/// Typographical modification applied to a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Insert,
    Delete,
    Substitute,
    Transpose,
    ValueSwap,
    WordSwap,
    SpaceInsert,
    SpaceDelete,
    Missing,
    Misspell,
    NewValue,
}

impl Operation {
    /// Canonical order used to build operation tables; matches the
    /// discriminant order.
    pub const ALL: [Operation; 11] = [
        Operation::Insert,
        Operation::Delete,
        Operation::Substitute,
        Operation::Transpose,
        Operation::ValueSwap,
        Operation::WordSwap,
        Operation::SpaceInsert,
        Operation::SpaceDelete,
        Operation::Missing,
        Operation::Misspell,
        Operation::NewValue,
    ];

    /// Configuration key holding this operation's probability.
    pub fn config_key(&self) -> &'static str {
        match self {
            Operation::Insert => "ins_prob",
            Operation::Delete => "del_prob",
            Operation::Substitute => "sub_prob",
            Operation::Transpose => "trans_prob",
            Operation::ValueSwap => "val_swap_prob",
            Operation::WordSwap => "wrd_swap_prob",
            Operation::SpaceInsert => "spc_ins_prob",
            Operation::SpaceDelete => "spc_del_prob",
            Operation::Missing => "miss_prob",
            Operation::Misspell => "misspell_prob",
            Operation::NewValue => "new_val_prob",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Delete => "delete",
            Operation::Substitute => "substitute",
            Operation::Transpose => "transpose",
            Operation::ValueSwap => "value_swap",
            Operation::WordSwap => "word_swap",
            Operation::SpaceInsert => "space_insert",
            Operation::SpaceDelete => "space_delete",
            Operation::Missing => "missing",
            Operation::Misspell => "misspell",
            Operation::NewValue => "new_value",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Characters a field may be corrupted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharRange {
    Alpha,
    Digit,
    Alphanumeric,
}

/// How a field's values are synthesized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Frequency {
        freq_file: String,
    },
    Date {
        start_epoch: i64,
        end_epoch: i64,
    },
    Phone {
        area_codes: Vec<String>,
        num_digits: u32,
    },
    Identifier {
        start_id: i64,
        end_id: i64,
        format: Option<IdentifierFormat>,
    },
    Other {
        value: Option<String>,
    },
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Frequency { .. } => "frequency",
            FieldKind::Date { .. } => "date",
            FieldKind::Phone { .. } => "phone",
            FieldKind::Identifier { .. } => "identifier",
            FieldKind::Other { .. } => "other",
        }
    }
}

/// Probabilities driving OCR corruption of a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrProbabilities {
    /// Rule-table pass.
    pub rule: f64,
    /// A character is read as a blank.
    pub fail: f64,
    pub insert_space: f64,
    pub delete_space: f64,
}

/// Validated, immutable description of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub char_range: CharRange,
    pub select_prob: f64,
    /// Earlier fields this one depends on, in declaration order.
    pub depends_on: Vec<String>,
    pub depend_prob: f64,
    /// Probability of every operation, in [`Operation::ALL`] order.
    pub operation_probs: [f64; 11],
    pub operations: CumulativeTable<Operation>,
    pub pho_prob: f64,
    pub ocr: OcrProbabilities,
    pub misspell_file: Option<String>,
    pub lookup_file: Option<String>,
}

impl FieldSpec {
    pub fn probability(&self, operation: Operation) -> f64 {
        self.operation_probs[operation as usize]
    }

    /// Probability that an original value is left missing.
    pub fn miss_prob(&self) -> f64 {
        self.probability(Operation::Missing)
    }
}

/// Pair of fields whose values may be exchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSwap {
    pub left: String,
    pub right: String,
    pub prob: f64,
}
