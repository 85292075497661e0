//! Error types for postgrest-query.
//!
//! Building and rendering parameters never fails. Errors only come from
//! reading text back in: query strings, JSON parameter files and config.

use thiserror::Error;

/// The main error type for postgrest-query operations.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Failed to parse a query string or one of its values.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// Unknown operator prefix in a filter value.
    #[error("Invalid operator: '{0}'")]
    InvalidOperator(String),

    /// Value that does not fit the directive it belongs to.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parameter file error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl QueryError {
    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }
}

/// Result type alias for postgrest-query operations.
pub type QueryResult<T> = Result<T, QueryError>;
