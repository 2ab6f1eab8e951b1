//! Core record contracts and helpers for dupgen.
//!
//! This crate defines the record model shared by the configuration,
//! generation and CLI crates, the weighted selection table used for every
//! random choice driven by configured probabilities, and the epoch-day
//! calendar used by date fields.

pub mod cumulative;
pub mod dates;
pub mod error;
pub mod links;
pub mod record;

pub use cumulative::CumulativeTable;
pub use dates::{
    DateParts, date_to_epoch, days_in_month, epoch_to_date, first_day_of_year, is_leap_year,
};
pub use error::{Error, Result};
pub use links::{TrueLink, true_link_groups, true_link_pairs};
pub use record::{Record, RecordId, RecordKind, UniquenessRegistry};

/// Column name reserved for record identifiers in outputs.
pub const RECORD_ID_FIELD: &str = "rec_id";
