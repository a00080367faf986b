//! # SteamETL - transform stage of the Steam analytics ETL
//!
//! SteamETL turns the flat, string-encoded app extract (SteamSpy + Steam store
//! data) into a normalized schema for the analytics dashboard: one fact table
//! plus a dimension and junction table per multi-valued column.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Raw CSV    │────▶│   Parser    │────▶│  Transform  │────▶│  TableSink  │
//! │ (extract)   │     │  (auto-enc) │     │ (12 steps)  │     │ (clean CSV) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use steametl::{transform_csv, CsvDirSink, TableSink, TransformOptions};
//! use std::path::Path;
//!
//! let output = transform_csv(Path::new("raw/steam_app_data.csv"), TransformOptions::default())?;
//! CsvDirSink::new("clean").load(&output.tables)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Raw and cleaned app records
//! - [`parser`] - CSV parsing with auto-detection
//! - [`transform`] - Field parsers, language mapping, normalization, pipeline
//! - [`tables`] - The table set and its materialization
//! - [`load`] - Sinks for the load stage
//! - [`config`] - Environment settings
//! - [`logging`] - Tracing setup

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod load;
pub mod tables;

// Runtime
pub mod config;
pub mod logging;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, CsvError, FieldError, PipelineError, PipelineResult, SchemaError, SinkError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{App, RawAppRecord, APP_COLUMNS, REQUIRED_COLUMNS};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_csv,
    parse_csv_file_auto, ParseResult,
};

// =============================================================================
// Re-exports - Field parsers and normalization
// =============================================================================

pub use transform::{
    normalize_json_column, normalize_language, normalize_list_column, parse_comma_list,
    parse_language_list, parse_owners_interval, parse_tag_weighted_list, ColumnSpec, Dimension,
    Junction, LanguageNormalizer, Link, WeightedLink, CANONICAL_LANGUAGES,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    transform_bytes, transform_csv, transform_parsed, transform_records, AppRecordTransformer,
    CsvInfo, TransformOptions, TransformOutput, TransformStats,
};

// =============================================================================
// Re-exports - Tables and load
// =============================================================================

pub use load::{CsvDirSink, LoadReport, MemorySink, TableReport, TableSink};
pub use tables::{Cell, Table, TableSet, TABLE_NAMES};

// =============================================================================
// Re-exports - Runtime
// =============================================================================

pub use config::Settings;
pub use logging::init_logging;
