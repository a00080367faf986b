//! Error types for the Steam ETL transform stage.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`FieldError`] - a raw cell the string parsers cannot make sense of
//! - [`SchemaError`] - a missing column or a value of the wrong shape
//! - [`CsvError`] - reading and decoding the raw extract
//! - [`SinkError`] - handing the table set to the load collaborator
//! - [`ConfigError`] - environment settings
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Conversions are `From` implementations so `?` works across layers.
//! An empty dimension or junction table is never an error.

use thiserror::Error;

// =============================================================================
// Field Parsing Errors
// =============================================================================

/// A single raw cell that failed to parse.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldError {
    /// Owners interval without a `" .. "` separator or with non-numeric bounds.
    #[error("Malformed owners interval: '{value}'")]
    OwnersInterval { value: String },

    /// Tag mapping still unparseable after quote repair.
    #[error("Malformed tag mapping '{value}': {message}")]
    Tags { value: String, message: String },

    /// Numeric cell with non-numeric content.
    #[error("Column '{column}' holds a non-numeric value: '{value}'")]
    Number { column: String, value: String },
}

// =============================================================================
// Schema Errors
// =============================================================================

/// An assumption about the raw extract's shape does not hold.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    /// Expected column absent from the header row.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Non-nullable column holds a null.
    #[error("Line {line}: column '{column}' must not be empty")]
    MissingValue { line: usize, column: String },

    /// Row is not the object shape the parser produces.
    #[error("Unexpected shape for '{column}': {message}")]
    Shape { column: String, message: String },
}

// =============================================================================
// CSV Reading Errors
// =============================================================================

/// Errors while reading the raw extract.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode bytes with the detected encoding.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Invalid CSV format.
    #[error("Invalid CSV format at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Load Errors
// =============================================================================

/// Errors from a [`crate::load::TableSink`].
#[derive(Debug, Error)]
pub enum SinkError {
    /// IO error.
    #[error("Sink IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV writer error.
    #[error("Sink CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Manifest serialization error.
    #[error("Sink JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while reading settings from the environment.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Required variable not set.
    #[error("Missing environment variable {0}")]
    MissingVar(&'static str),

    /// Variable set but unusable.
    #[error("Invalid value for {name}: {message}")]
    InvalidVar { name: &'static str, message: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// Returned by [`crate::transform::pipeline::transform_csv`] and friends. Any of these
/// aborts the whole run; no partial table set is produced.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV reading error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Schema assumption violated.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Malformed field value.
    #[error("Field error: {0}")]
    Field(#[from] FieldError),

    /// Load collaborator failed.
    #[error("Load error: {0}")]
    Sink(#[from] SinkError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for field parsers.
pub type FieldResult<T> = Result<T, FieldError>;

/// Result type for schema checks.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for CSV reading.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for sinks.
pub type SinkResult<T> = Result<T, SinkError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // CsvError -> PipelineError
        let csv_err = CsvError::EmptyFile;
        let pipeline_err: PipelineError = csv_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // SchemaError -> PipelineError
        let schema_err = SchemaError::MissingColumn("publisher".into());
        let pipeline_err: PipelineError = schema_err.into();
        assert!(pipeline_err.to_string().contains("publisher"));

        // FieldError -> PipelineError
        let field_err = FieldError::OwnersInterval { value: "lots".into() };
        let pipeline_err: PipelineError = field_err.into();
        assert!(pipeline_err.to_string().contains("lots"));
    }

    #[test]
    fn test_missing_value_format() {
        let err = SchemaError::MissingValue {
            line: 7,
            column: "appid".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Line 7"));
        assert!(msg.contains("appid"));
    }

    #[test]
    fn test_tags_error_format() {
        let err = FieldError::Tags {
            value: "{'x'".into(),
            message: "EOF while parsing".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("{'x'"));
        assert!(msg.contains("EOF"));
    }
}
