//! Error types for the reshape and metrics engine.
//!
//! This module defines one error type per layer:
//!
//! - [`ReshapeError`] - Engine errors (lookup, window, shape, adjacent period)
//! - [`CsvError`] - CSV decoding and loading errors
//! - [`ConfigError`] - Environment configuration errors
//! - [`DashboardError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::models::Period;

// =============================================================================
// Engine Errors
// =============================================================================

/// Errors raised by the reshape, ranking and correlation operations.
///
/// All of them are local and recoverable by the caller: the operations are
/// deterministic, so retrying with the same input yields the same error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReshapeError {
    /// Requested entity, category or column is absent after filtering.
    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },

    /// Requested period window lies outside the available period columns.
    #[error("Period window {start}..={end} is outside available columns {first}..={last}")]
    Range {
        start: Period,
        end: Period,
        first: Period,
        last: Period,
    },

    /// Requested period is not one of the table's columns.
    #[error("Period {0} is not a column of this table")]
    UnknownPeriod(Period),

    /// Operation expected a different number of rows or labels.
    #[error("Expected {expected}, got {actual}")]
    Shape { expected: String, actual: usize },

    /// A delta needs a value at this period and there is none.
    #[error("No value for period {period}")]
    MissingPeriod { period: Period },

    /// Table violates a structural invariant.
    #[error("Invalid table: {0}")]
    InvalidTable(String),
}

impl ReshapeError {
    pub fn not_found(what: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            key: key.into(),
        }
    }

    pub fn shape(expected: impl Into<String>, actual: usize) -> Self {
        Self::Shape {
            expected: expected.into(),
            actual,
        }
    }

    /// Whether the error means "nothing to show" rather than a bad request.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// =============================================================================
// CSV Loading Errors
// =============================================================================

/// Errors during CSV decoding and typed loading.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid CSV format.
    #[error("Invalid CSV format: {0}")]
    Parse(#[from] csv::Error),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// Required column absent from the header.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A cell could not be read as the expected type.
    #[error("Line {line}, column '{column}' (value '{value}'): {message}")]
    InvalidCell {
        line: usize,
        column: String,
        value: String,
        message: String,
    },

    /// Loaded rows violate a table invariant.
    #[error("Invalid table: {0}")]
    Table(#[from] ReshapeError),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    /// Country code allow-list could not be read.
    #[error("Cannot read country codes from {path}: {source}")]
    CountryCodes {
        path: String,
        source: std::io::Error,
    },
}

// =============================================================================
// Dashboard Errors (top-level)
// =============================================================================

/// Top-level error returned by loading and the report pipeline.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// CSV loading error.
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: CsvError,
    },

    /// Engine error.
    #[error("{0}")]
    Reshape(#[from] ReshapeError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl DashboardError {
    pub fn csv(path: impl Into<String>, source: CsvError) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Loading or pipeline error.
    #[error("Dashboard error: {0}")]
    Dashboard(#[from] DashboardError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for ServerError {
    fn from(e: std::io::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for engine operations.
pub type ReshapeResult<T> = Result<T, ReshapeError>;

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for loading and pipeline operations.
pub type DashboardResult<T> = Result<T, DashboardError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let reshape = ReshapeError::not_found("entity", "Indonesia");
        let top: DashboardError = reshape.into();
        assert!(top.to_string().contains("Indonesia"));

        let csv = DashboardError::csv("gdp.csv", CsvError::EmptyFile);
        let msg = csv.to_string();
        assert!(msg.contains("gdp.csv"));
        assert!(msg.contains("empty"));
    }

    #[test]
    fn test_missing_period_format() {
        let err = ReshapeError::MissingPeriod {
            period: Period::new(2009),
        };
        assert_eq!(err.to_string(), "No value for period 2009");
    }

    #[test]
    fn test_not_found_classification() {
        assert!(ReshapeError::not_found("sector", "X").is_not_found());
        assert!(!ReshapeError::UnknownPeriod(Period::new(1999)).is_not_found());
    }
}
