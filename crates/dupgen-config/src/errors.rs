use thiserror::Error;

/// Rejected configuration, naming the offending field (if any) and key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid configuration ({}): {message}", location(.field.as_deref(), .key))]
pub struct ConfigurationError {
    pub field: Option<String>,
    pub key: String,
    pub message: String,
}

impl ConfigurationError {
    /// Error attached to a single attribute.
    pub fn field(field: impl Into<String>, key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            key: key.into(),
            message: message.into(),
        }
    }

    /// Error attached to a top-level key or generation parameter.
    pub fn global(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: None,
            key: key.into(),
            message: message.into(),
        }
    }
}

fn location(field: Option<&str>, key: &str) -> String {
    match field {
        Some(field) => format!("field '{field}', key '{key}'"),
        None => format!("key '{key}'"),
    }
}

/// Non-fatal finding produced while validating a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub code: String,
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(code: impl Into<String>, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            path: path.into(),
            message: message.into(),
        }
    }
}
