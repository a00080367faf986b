//! Domain models for the Steam ETL transform stage.
//!
//! - [`RawAppRecord`] - one row of the raw extract, typed but not yet cleaned
//! - [`App`] - one row of the `apps` fact table
//! - [`REQUIRED_COLUMNS`] - the columns the extract must carry
//!
//! Dimension and junction rows live in [`crate::transform::normalizer`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FieldError, FieldResult, PipelineResult, SchemaError, SchemaResult};

// =============================================================================
// Raw extract
// =============================================================================

/// Columns the extraction collaborator writes for every scraped app.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "appid",
    "name",
    "developer",
    "publisher",
    "owners",
    "average_forever",
    "average_2weeks",
    "median_forever",
    "median_2weeks",
    "ccu",
    "price",
    "initialprice",
    "discount",
    "tags",
    "languages",
    "genre",
];

/// Check that every required column is present in the header row.
pub fn check_columns(headers: &[String]) -> SchemaResult<()> {
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(SchemaError::MissingColumn((*column).to_string()));
        }
    }
    Ok(())
}

/// One raw app as scraped: numbers coerced, strings untouched.
///
/// `None` stands for an empty cell. Prices are in cents and playtimes in
/// minutes, exactly as the upstream API reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAppRecord {
    pub appid: i64,
    pub name: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    /// Interval string, e.g. `"1,000,000 .. 2,000,000"`.
    pub owners: Option<String>,
    pub average_forever: Option<f64>,
    pub average_2weeks: Option<f64>,
    pub median_forever: Option<f64>,
    pub median_2weeks: Option<f64>,
    pub ccu: Option<i64>,
    pub price: Option<f64>,
    pub initialprice: Option<f64>,
    pub discount: Option<f64>,
    /// Single-quoted pseudo-JSON mapping of tag to vote count.
    pub tags: Option<String>,
    /// Comma list with markup artifacts.
    pub languages: Option<String>,
    /// Comma list.
    pub genre: Option<String>,
}

impl RawAppRecord {
    /// Coerce one parsed CSV row into a typed record.
    ///
    /// `line` is only used for error messages.
    pub fn from_row(row: &Value, line: usize) -> PipelineResult<Self> {
        let obj = row.as_object().ok_or_else(|| SchemaError::Shape {
            column: "<row>".to_string(),
            message: format!("line {line} is not an object"),
        })?;

        let appid = integer_cell("appid", cell(obj, "appid"))?.ok_or_else(|| {
            SchemaError::MissingValue {
                line,
                column: "appid".to_string(),
            }
        })?;

        Ok(Self {
            appid,
            name: text_cell(cell(obj, "name")),
            developer: text_cell(cell(obj, "developer")),
            publisher: text_cell(cell(obj, "publisher")),
            owners: text_cell(cell(obj, "owners")),
            average_forever: number_cell("average_forever", cell(obj, "average_forever"))?,
            average_2weeks: number_cell("average_2weeks", cell(obj, "average_2weeks"))?,
            median_forever: number_cell("median_forever", cell(obj, "median_forever"))?,
            median_2weeks: number_cell("median_2weeks", cell(obj, "median_2weeks"))?,
            ccu: integer_cell("ccu", cell(obj, "ccu"))?,
            price: number_cell("price", cell(obj, "price"))?,
            initialprice: number_cell("initialprice", cell(obj, "initialprice"))?,
            discount: number_cell("discount", cell(obj, "discount"))?,
            tags: text_cell(cell(obj, "tags")),
            languages: text_cell(cell(obj, "languages")),
            genre: text_cell(cell(obj, "genre")),
        })
    }
}

static NULL: Value = Value::Null;

fn cell<'a>(obj: &'a Map<String, Value>, column: &str) -> &'a Value {
    obj.get(column).unwrap_or(&NULL)
}

fn text_cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Parse a numeric cell, `None` for null.
pub fn number_cell(column: &str, value: &Value) -> FieldResult<Option<f64>> {
    let malformed = || FieldError::Number {
        column: column.to_string(),
        value: value.to_string(),
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or_else(malformed),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed.parse::<f64>().map(Some).map_err(|_| malformed())
        }
        _ => Err(malformed()),
    }
}

/// Parse an integer cell. Integral floats (`"5.0"`) are accepted.
pub fn integer_cell(column: &str, value: &Value) -> FieldResult<Option<i64>> {
    if let Value::String(s) = value {
        if let Ok(v) = s.trim().parse::<i64>() {
            return Ok(Some(v));
        }
    }
    if let Value::Number(n) = value {
        if let Some(v) = n.as_i64() {
            return Ok(Some(v));
        }
    }
    match number_cell(column, value)? {
        None => Ok(None),
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
        Some(_) => Err(FieldError::Number {
            column: column.to_string(),
            value: value.to_string(),
        }),
    }
}

// =============================================================================
// Fact table
// =============================================================================

/// One row of the `apps` fact table, in final column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    pub id_app: i64,
    pub name: String,
    pub developer: String,
    pub publisher: String,
    pub owners_min: u64,
    pub owners_max: u64,
    pub average_forever_hs: Option<f64>,
    pub average_2weeks_hs: Option<f64>,
    pub median_forever_hs: Option<f64>,
    pub median_2weeks_hs: Option<f64>,
    pub peak_ccu_yesterday: Option<i64>,
    pub price_usd: f64,
    pub initial_price_usd: Option<f64>,
    pub discount: Option<f64>,
}

/// Column order of the `apps` table.
pub const APP_COLUMNS: &[&str] = &[
    "id_app",
    "name",
    "developer",
    "publisher",
    "owners_min",
    "owners_max",
    "average_forever_hs",
    "average_2weeks_hs",
    "median_forever_hs",
    "median_2weeks_hs",
    "peak_ccu_yesterday",
    "price_usd",
    "initial_price_usd",
    "discount",
];

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_row() -> Value {
        json!({
            "appid": "10", "name": "Game A", "developer": "Dev", "publisher": "Pub",
            "owners": "0 .. 20,000", "average_forever": "120", "average_2weeks": "0",
            "median_forever": "60", "median_2weeks": "0", "ccu": "5", "price": "999",
            "initialprice": "1999", "discount": "50", "tags": "{'Indie': 10}",
            "languages": "English", "genre": "Action, Indie"
        })
    }

    #[test]
    fn test_from_row() {
        let record = RawAppRecord::from_row(&full_row(), 2).unwrap();

        assert_eq!(record.appid, 10);
        assert_eq!(record.name.as_deref(), Some("Game A"));
        assert_eq!(record.average_forever, Some(120.0));
        assert_eq!(record.ccu, Some(5));
        assert_eq!(record.price, Some(999.0));
        assert_eq!(record.genre.as_deref(), Some("Action, Indie"));
    }

    #[test]
    fn test_null_cells_become_none() {
        let mut row = full_row();
        row["developer"] = Value::Null;
        row["ccu"] = Value::Null;

        let record = RawAppRecord::from_row(&row, 2).unwrap();
        assert_eq!(record.developer, None);
        assert_eq!(record.ccu, None);
    }

    #[test]
    fn test_missing_appid_is_schema_error() {
        let mut row = full_row();
        row["appid"] = Value::Null;

        let err = RawAppRecord::from_row(&row, 4).unwrap_err();
        assert!(err.to_string().contains("Line 4"));
    }

    #[test]
    fn test_non_numeric_price_is_field_error() {
        let mut row = full_row();
        row["price"] = json!("free");

        let err = RawAppRecord::from_row(&row, 2).unwrap_err();
        assert!(err.to_string().contains("price"));
    }

    #[test]
    fn test_integer_cell_accepts_integral_float() {
        assert_eq!(integer_cell("ccu", &json!("5.0")).unwrap(), Some(5));
        assert!(integer_cell("ccu", &json!("5.5")).is_err());
        assert_eq!(integer_cell("ccu", &json!(7)).unwrap(), Some(7));
    }

    #[test]
    fn test_integer_cell_rejects_out_of_range() {
        let err = integer_cell("ccu", &json!("1e30")).unwrap_err();
        assert!(matches!(err, FieldError::Number { .. }));
        assert!(integer_cell("appid", &json!(-1e19)).is_err());
        assert_eq!(integer_cell("ccu", &json!("-4e3")).unwrap(), Some(-4000));
    }

    #[test]
    fn test_check_columns() {
        let mut headers: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        assert!(check_columns(&headers).is_ok());

        headers.retain(|h| h != "publisher");
        assert_eq!(
            check_columns(&headers),
            Err(SchemaError::MissingColumn("publisher".to_string()))
        );
    }
}
