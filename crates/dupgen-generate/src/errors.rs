use std::path::PathBuf;

use thiserror::Error;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Resource(#[from] ResourceLoadError),
    #[error(transparent)]
    Core(#[from] dupgen_core::Error),
    /// Original records kept colliding with already generated ones.
    #[error("generation stalled after {attempts} colliding originals ({generated}/{requested})")]
    Stall {
        generated: u64,
        requested: u64,
        attempts: u32,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// A data file could not be read or parsed.
#[derive(Debug, Error)]
pub enum ResourceLoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}:{line}: {message}", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("{}: {message}", .path.display())]
    Invalid { path: PathBuf, message: String },
    #[error("resource cache poisoned")]
    CachePoisoned,
}
