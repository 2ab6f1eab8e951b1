use thiserror::Error;

/// Core error type shared across dupgen crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A calendar value cannot be converted.
    #[error("invalid date: {0}")]
    InvalidDate(String),
    /// A record identifier does not follow the `rec-<n>-org` / `rec-<n>-dup-<k>` shape.
    #[error("invalid record id: {0}")]
    InvalidRecordId(String),
    /// A selection table cannot be built from the given weights.
    #[error("invalid weights: {0}")]
    InvalidWeights(String),
}

/// Convenience alias for results returned by dupgen crates.
pub type Result<T> = std::result::Result<T, Error>;
