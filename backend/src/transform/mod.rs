//! Transformation module.
//!
//! This module turns the raw extract into the normalized schema:
//! - Fields: parsers for string-encoded cells
//! - Language: canonical language mapping
//! - Normalizer: dimension + junction decomposition
//! - Pipeline: the record-level transform

pub mod fields;
pub mod language;
pub mod normalizer;
pub mod pipeline;

pub use fields::{
    parse_comma_list, parse_language_list, parse_owners_interval, parse_tag_weighted_list,
};
pub use language::{normalize_language, LanguageNormalizer, CANONICAL_LANGUAGES};
pub use normalizer::{
    normalize_json_column, normalize_list_column, take_column, ColumnSpec, Dimension, Junction,
    Link, WeightedLink,
};
pub use pipeline::*;
