//! High-level transform API: raw extract in, normalized table set out.
//!
//! Steps run strictly in order, each on the previous step's output:
//!
//! 1. load the raw extract
//! 2. drop rows without name, developer or publisher
//! 3. rename `appid` to `id_app`
//! 4. cents to dollars, minutes to hours (2 decimals)
//! 5. drop price outliers
//! 6. drop duplicate `id_app`s, keeping the first
//! 7. split owners into `owners_min`/`owners_max`
//! 8. genres -> `genres` + `apps_genres`
//! 9. languages -> `languages` + `apps_languages`, plus `normalized_language`
//! 10. tags -> `tags` + `apps_tags` (with count)
//! 11. project the fact table onto its final columns
//! 12. return the table set
//!
//! Any error aborts the run; there is no partial table set.
//!
//! # Example
//!
//! ```rust,ignore
//! use steametl::transform::pipeline::{transform_csv, TransformOptions};
//! use std::path::Path;
//!
//! let output = transform_csv(
//!     Path::new("datasets/raw/steam_app_data.csv"),
//!     TransformOptions::default(),
//! )?;
//! println!("{} apps", output.tables.apps.len());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

use super::fields::{
    parse_comma_list, parse_language_list, parse_owners_interval, parse_tag_weighted_list,
};
use super::language::LanguageNormalizer;
use super::normalizer::{
    normalize_json_column, normalize_list_column, take_column, ColumnSpec, NULL_MARKER,
};
use crate::error::{FieldError, FieldResult, PipelineResult};
use crate::models::{check_columns, App, RawAppRecord};
use crate::parser::{parse_bytes_auto, parse_csv_file_auto, ParseResult};
use crate::tables::TableSet;

/// Naming for the genre decomposition.
pub const GENRES: ColumnSpec = ColumnSpec {
    fact_id_column: "id_app",
    list_column: "genre",
    dimension_table: "genres",
    dimension_id_column: "id_genre",
    value_column: "genre",
    junction_table: "apps_genres",
};

/// Naming for the language decomposition.
pub const LANGUAGES: ColumnSpec = ColumnSpec {
    fact_id_column: "id_app",
    list_column: "languages",
    dimension_table: "languages",
    dimension_id_column: "id_language",
    value_column: "language",
    junction_table: "apps_languages",
};

/// Naming for the tag decomposition.
pub const TAGS: ColumnSpec = ColumnSpec {
    fact_id_column: "id_app",
    list_column: "tags",
    dimension_table: "tags",
    dimension_id_column: "id_tag",
    value_column: "tag",
    junction_table: "apps_tags",
};

/// Default ceiling for `price_usd`; anything above is treated as bogus.
pub const DEFAULT_MAX_PRICE_USD: f64 = 1500.0;

/// Options for the transform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformOptions {
    /// Rows with `price_usd` above this are dropped
    pub max_price_usd: f64,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            max_price_usd: DEFAULT_MAX_PRICE_USD,
        }
    }
}

/// Row accounting for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    pub rows_read: usize,
    pub missing_required: usize,
    pub price_outliers: usize,
    pub duplicates: usize,
    pub rows_kept: usize,
}

impl TransformStats {
    pub fn summary(&self) -> String {
        format!(
            "Read {} rows: {} kept, {} missing name/developer/publisher, {} price outliers, {} duplicates",
            self.rows_read, self.rows_kept, self.missing_required, self.price_outliers, self.duplicates
        )
    }
}

/// CSV file information
#[derive(Debug, Clone, Serialize)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Result of a complete transform run
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// The seven normalized tables
    pub tables: TableSet,
    /// Row accounting
    pub stats: TransformStats,
    /// CSV parsing metadata, when the input came from CSV
    pub csv_info: Option<CsvInfo>,
}

/// Transform a raw extract CSV file.
pub fn transform_csv(path: &Path, options: TransformOptions) -> PipelineResult<TransformOutput> {
    info!(path = %path.display(), "Reading raw extract");
    let parse_result = parse_csv_file_auto(path)?;
    transform_parsed(parse_result, options)
}

/// Same as [`transform_csv`] but from raw bytes.
pub fn transform_bytes(bytes: &[u8], options: TransformOptions) -> PipelineResult<TransformOutput> {
    let parse_result = parse_bytes_auto(bytes)?;
    transform_parsed(parse_result, options)
}

/// Transform already-parsed CSV data.
pub fn transform_parsed(
    parse_result: ParseResult,
    options: TransformOptions,
) -> PipelineResult<TransformOutput> {
    info!(
        encoding = %parse_result.encoding,
        delimiter = ?parse_result.delimiter,
        rows = parse_result.records.len(),
        columns = parse_result.headers.len(),
        "Parsed raw extract"
    );
    check_columns(&parse_result.headers)?;

    let csv_info = CsvInfo {
        encoding: parse_result.encoding.clone(),
        delimiter: parse_result.delimiter,
        headers: parse_result.headers.clone(),
        row_count: parse_result.records.len(),
    };

    let records = parse_result
        .records
        .iter()
        .enumerate()
        .map(|(idx, row)| RawAppRecord::from_row(row, idx + 2))
        .collect::<PipelineResult<Vec<_>>>()?;

    let mut output = AppRecordTransformer::new(options).transform(records)?;
    output.csv_info = Some(csv_info);
    Ok(output)
}

/// Transform typed raw records with the given options.
pub fn transform_records(
    records: Vec<RawAppRecord>,
    options: TransformOptions,
) -> PipelineResult<TransformOutput> {
    AppRecordTransformer::new(options).transform(records)
}

/// Runs the record-level pipeline.
///
/// Holds no state between runs; every call builds its tables from scratch.
#[derive(Debug, Clone)]
pub struct AppRecordTransformer {
    options: TransformOptions,
    languages: LanguageNormalizer,
}

impl Default for AppRecordTransformer {
    fn default() -> Self {
        Self::new(TransformOptions::default())
    }
}

/// A row after filtering and unit conversion; list columns still raw.
#[derive(Debug, Clone)]
struct CleanRecord {
    id_app: i64,
    name: String,
    developer: String,
    publisher: String,
    owners: Option<String>,
    average_forever_hs: Option<f64>,
    average_2weeks_hs: Option<f64>,
    median_forever_hs: Option<f64>,
    median_2weeks_hs: Option<f64>,
    peak_ccu_yesterday: Option<i64>,
    /// NaN when the extract has no price; the outlier filter drops it.
    price_usd: f64,
    initial_price_usd: Option<f64>,
    discount: Option<f64>,
    genre: Option<String>,
    languages: Option<String>,
    tags: Option<String>,
}

/// A fact row with its multi-valued columns parsed but not yet decomposed.
#[derive(Debug, Clone)]
struct StagedApp {
    app: App,
    genre: Vec<String>,
    languages: Vec<String>,
    tags: Vec<(String, i64)>,
}

impl AppRecordTransformer {
    pub fn new(options: TransformOptions) -> Self {
        Self {
            options,
            languages: LanguageNormalizer::default(),
        }
    }

    /// Use a custom canonical language list.
    pub fn with_language_normalizer(mut self, languages: LanguageNormalizer) -> Self {
        self.languages = languages;
        self
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Run steps 2-12 over one raw extract.
    pub fn transform(&self, records: Vec<RawAppRecord>) -> PipelineResult<TransformOutput> {
        let mut stats = TransformStats {
            rows_read: records.len(),
            ..TransformStats::default()
        };

        // Steps 2-4: required fields, rename, unit conversion
        let cleaned: Vec<CleanRecord> = records.into_iter().filter_map(clean_record).collect();
        stats.missing_required = stats.rows_read - cleaned.len();
        info!(
            kept = cleaned.len(),
            dropped = stats.missing_required,
            "Filtered rows missing name, developer or publisher"
        );

        // Step 5: outliers
        let max_price = self.options.max_price_usd;
        let before = cleaned.len();
        let priced: Vec<CleanRecord> = cleaned
            .into_iter()
            .filter(|r| {
                let keep = r.price_usd <= max_price;
                if !keep {
                    debug!(id_app = r.id_app, price_usd = r.price_usd, "Dropping price outlier");
                }
                keep
            })
            .collect();
        stats.price_outliers = before - priced.len();
        info!(max_price, dropped = stats.price_outliers, "Removed price outliers");

        // Step 6: duplicates
        let before = priced.len();
        let mut seen = HashSet::new();
        let unique: Vec<CleanRecord> = priced
            .into_iter()
            .filter(|r| seen.insert(r.id_app))
            .collect();
        stats.duplicates = before - unique.len();
        stats.rows_kept = unique.len();
        info!(dropped = stats.duplicates, "Removed duplicate apps");

        // Steps 7-10 (parsing half)
        let mut staged = unique
            .into_iter()
            .map(stage_record)
            .collect::<FieldResult<Vec<StagedApp>>>()?;

        // Step 8
        let genre_column = take_column(&mut staged, |s| s.app.id_app, |s| &mut s.genre);
        let (genres, apps_genres) = normalize_list_column(genre_column, GENRES);
        log_decomposition(&GENRES, genres.len(), apps_genres.len());

        // Step 9
        let language_column = take_column(&mut staged, |s| s.app.id_app, |s| &mut s.languages);
        let (mut languages, apps_languages) = normalize_list_column(language_column, LANGUAGES);
        languages.derive("normalized_language", |label| self.languages.normalize(label));
        log_decomposition(&LANGUAGES, languages.len(), apps_languages.len());

        // Step 10
        let tag_column = take_column(&mut staged, |s| s.app.id_app, |s| &mut s.tags);
        let (tags, apps_tags) = normalize_json_column(tag_column, TAGS);
        log_decomposition(&TAGS, tags.len(), apps_tags.len());

        // Steps 11-12
        let apps: Vec<App> = staged.into_iter().map(|s| s.app).collect();
        info!("{}", stats.summary());

        Ok(TransformOutput {
            tables: TableSet {
                apps,
                genres,
                apps_genres,
                languages,
                apps_languages,
                tags,
                apps_tags,
            },
            stats,
            csv_info: None,
        })
    }
}

fn log_decomposition(spec: &ColumnSpec, dimension_rows: usize, junction_rows: usize) {
    if dimension_rows == 0 || junction_rows == 0 {
        warn!(
            dimension = spec.dimension_table,
            junction = spec.junction_table,
            "Decomposition produced an empty table"
        );
    }
    info!(
        column = spec.list_column,
        dimension = spec.dimension_table,
        dimension_rows,
        junction = spec.junction_table,
        junction_rows,
        "Normalized column"
    );
}

fn clean_record(raw: RawAppRecord) -> Option<CleanRecord> {
    let (Some(name), Some(developer), Some(publisher)) = (raw.name, raw.developer, raw.publisher)
    else {
        debug!(appid = raw.appid, "Dropping row without name, developer or publisher");
        return None;
    };

    Some(CleanRecord {
        id_app: raw.appid,
        name,
        developer,
        publisher,
        owners: raw.owners,
        average_forever_hs: raw.average_forever.map(minutes_to_hours),
        average_2weeks_hs: raw.average_2weeks.map(minutes_to_hours),
        median_forever_hs: raw.median_forever.map(minutes_to_hours),
        median_2weeks_hs: raw.median_2weeks.map(minutes_to_hours),
        peak_ccu_yesterday: raw.ccu,
        price_usd: raw.price.map(cents_to_dollars).unwrap_or(f64::NAN),
        initial_price_usd: raw.initialprice.map(cents_to_dollars),
        discount: raw.discount,
        genre: raw.genre,
        languages: raw.languages,
        tags: raw.tags,
    })
}

fn stage_record(record: CleanRecord) -> FieldResult<StagedApp> {
    let owners = record.owners.as_deref().unwrap_or(NULL_MARKER);
    let (owners_min, owners_max) = parse_owners_interval(owners)?;
    let owners_min = parse_owner_bound(&owners_min, owners)?;
    let owners_max = parse_owner_bound(&owners_max, owners)?;

    let genre = parse_comma_list(record.genre.as_deref().unwrap_or(NULL_MARKER));
    let languages = parse_language_list(record.languages.as_deref().unwrap_or(NULL_MARKER));
    let tags = parse_tag_weighted_list(record.tags.as_deref().unwrap_or(""))?;

    Ok(StagedApp {
        app: App {
            id_app: record.id_app,
            name: record.name,
            developer: record.developer,
            publisher: record.publisher,
            owners_min,
            owners_max,
            average_forever_hs: record.average_forever_hs,
            average_2weeks_hs: record.average_2weeks_hs,
            median_forever_hs: record.median_forever_hs,
            median_2weeks_hs: record.median_2weeks_hs,
            peak_ccu_yesterday: record.peak_ccu_yesterday,
            price_usd: record.price_usd,
            initial_price_usd: record.initial_price_usd,
            discount: record.discount,
        },
        genre,
        languages,
        tags,
    })
}

fn parse_owner_bound(bound: &str, interval: &str) -> FieldResult<u64> {
    bound
        .trim()
        .parse::<u64>()
        .map_err(|_| FieldError::OwnersInterval {
            value: interval.to_string(),
        })
}

fn cents_to_dollars(cents: f64) -> f64 {
    cents / 100.0
}

fn minutes_to_hours(minutes: f64) -> f64 {
    (minutes / 60.0 * 100.0).round() / 100.0
}
