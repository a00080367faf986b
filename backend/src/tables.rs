//! The normalized table set and its row-oriented materialization.
//!
//! [`TableSet`] keeps the seven tables typed. [`TableSet::tables`] flattens
//! them into named [`Table`]s with a fixed column list, which is what a
//! [`crate::load::TableSink`] consumes.

use std::fmt;

use serde::Serialize;

use crate::models::{App, APP_COLUMNS};
use crate::transform::normalizer::{Dimension, Junction, Link, WeightedLink};

/// Table names in the order the load stage receives them.
pub const TABLE_NAMES: [&str; 7] = [
    "apps",
    "apps_genres",
    "genres",
    "apps_languages",
    "languages",
    "apps_tags",
    "tags",
];

/// One cell of a materialized table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Int(v) => write!(f, "{v}"),
            // Debug keeps the trailing ".0" on integral floats
            Cell::Float(v) => write!(f, "{v:?}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Int(v)
    }
}

impl From<u64> for Cell {
    fn from(v: u64) -> Self {
        i64::try_from(v).map(Cell::Int).unwrap_or(Cell::Float(v as f64))
    }
}

impl From<usize> for Cell {
    fn from(v: usize) -> Self {
        Cell::from(v as u64)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Float(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Cell::Null)
    }
}

/// A named, row-oriented table with a fixed column set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }
}

impl From<&Dimension> for Table {
    fn from(dimension: &Dimension) -> Self {
        let spec = dimension.spec;
        let mut columns = vec![spec.dimension_id_column, spec.value_column];
        columns.extend(dimension.derived.iter().map(|d| d.name.as_str()));

        let mut table = Table::new(spec.dimension_table, &columns);
        for (idx, row) in dimension.rows.iter().enumerate() {
            let mut cells = vec![Cell::from(row.id), Cell::from(row.value.as_str())];
            cells.extend(
                dimension
                    .derived
                    .iter()
                    .map(|d| Cell::from(d.values[idx].as_str())),
            );
            table.rows.push(cells);
        }
        table
    }
}

impl From<&Junction<Link>> for Table {
    fn from(junction: &Junction<Link>) -> Self {
        let spec = junction.spec;
        let mut table = Table::new(
            spec.junction_table,
            &[spec.fact_id_column, spec.dimension_id_column],
        );
        table.rows = junction
            .rows
            .iter()
            .map(|link| vec![Cell::from(link.fact_id), Cell::from(link.dimension_id)])
            .collect();
        table
    }
}

impl From<&Junction<WeightedLink>> for Table {
    fn from(junction: &Junction<WeightedLink>) -> Self {
        let spec = junction.spec;
        let mut table = Table::new(
            spec.junction_table,
            &[spec.fact_id_column, spec.dimension_id_column, "count"],
        );
        table.rows = junction
            .rows
            .iter()
            .map(|link| {
                vec![
                    Cell::from(link.fact_id),
                    Cell::from(link.dimension_id),
                    Cell::from(link.count),
                ]
            })
            .collect();
        table
    }
}

fn apps_table(apps: &[App]) -> Table {
    let mut table = Table::new("apps", APP_COLUMNS);
    table.rows = apps
        .iter()
        .map(|app| {
            vec![
                Cell::from(app.id_app),
                Cell::from(app.name.as_str()),
                Cell::from(app.developer.as_str()),
                Cell::from(app.publisher.as_str()),
                Cell::from(app.owners_min),
                Cell::from(app.owners_max),
                Cell::from(app.average_forever_hs),
                Cell::from(app.average_2weeks_hs),
                Cell::from(app.median_forever_hs),
                Cell::from(app.median_2weeks_hs),
                Cell::from(app.peak_ccu_yesterday),
                Cell::from(app.price_usd),
                Cell::from(app.initial_price_usd),
                Cell::from(app.discount),
            ]
        })
        .collect();
    table
}

/// The complete output of one transform run.
///
/// Owned outright: sinks receive a reference or a clone, never shared
/// mutable state.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSet {
    pub apps: Vec<App>,
    pub genres: Dimension,
    pub apps_genres: Junction<Link>,
    pub languages: Dimension,
    pub apps_languages: Junction<Link>,
    pub tags: Dimension,
    pub apps_tags: Junction<WeightedLink>,
}

impl TableSet {
    /// Materialize all seven tables in [`TABLE_NAMES`] order.
    pub fn tables(&self) -> Vec<Table> {
        vec![
            apps_table(&self.apps),
            Table::from(&self.apps_genres),
            Table::from(&self.genres),
            Table::from(&self.apps_languages),
            Table::from(&self.languages),
            Table::from(&self.apps_tags),
            Table::from(&self.tags),
        ]
    }

    /// Row count per table, in [`TABLE_NAMES`] order.
    pub fn summary(&self) -> Vec<(&'static str, usize)> {
        let counts = [
            self.apps.len(),
            self.apps_genres.len(),
            self.genres.len(),
            self.apps_languages.len(),
            self.languages.len(),
            self.apps_tags.len(),
            self.tags.len(),
        ];
        TABLE_NAMES.iter().copied().zip(counts).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Null.to_string(), "");
        assert_eq!(Cell::Int(42).to_string(), "42");
        assert_eq!(Cell::Float(2.0).to_string(), "2.0");
        assert_eq!(Cell::Float(9.99).to_string(), "9.99");
        assert_eq!(Cell::from("Indie").to_string(), "Indie");
    }

    #[test]
    fn test_cell_from_option() {
        assert_eq!(Cell::from(None::<f64>), Cell::Null);
        assert_eq!(Cell::from(Some(3_i64)), Cell::Int(3));
    }

    #[test]
    fn test_table_column_lookup() {
        let mut table = Table::new("genres", &["id_genre", "genre"]);
        table.rows.push(vec![Cell::Int(0), Cell::from("Action")]);
        table.rows.push(vec![Cell::Int(1), Cell::from("Indie")]);

        let genres = table.column("genre").unwrap();
        assert_eq!(genres, vec![&Cell::from("Action"), &Cell::from("Indie")]);
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn test_table_names_order() {
        assert_eq!(TABLE_NAMES[0], "apps");
        assert_eq!(TABLE_NAMES.len(), 7);
    }
}
