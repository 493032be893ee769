//! Error types for criteria compilation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by [`Compiler::compile`](crate::Compiler::compile).
///
/// All variants are terminal for the compile call: there is no partial
/// fragment and nothing to retry with the same input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CriteriaError {
    /// Malformed tree or malformed literal value
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// No translator in the catalog handles the criterion
    #[error("Unsupported operator '{operator}' for field '{field}'")]
    UnsupportedOperator { operator: String, field: String },

    /// A translator broke its own matches/render contract
    #[error("Internal compiler error in translator '{translator}': {message}")]
    Internal { translator: String, message: String },
}

impl CriteriaError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unsupported(operator: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnsupportedOperator {
            operator: operator.into(),
            field: field.into(),
        }
    }

    /// True for errors that point at a bug rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

/// Result type for criteria compilation
pub type CriteriaResult<T> = Result<T, CriteriaError>;

/// Errors raised while loading a [`CompilerConfig`](crate::CompilerConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
