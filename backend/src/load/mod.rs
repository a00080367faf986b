//! Hand-off to the load stage.
//!
//! A [`TableSink`] receives a finished [`TableSet`] and delivers it somewhere.
//! The database loader lives outside this crate; [`CsvDirSink`] writes the
//! clean CSV files it bulk-loads, and [`MemorySink`] keeps a copy in memory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::SinkResult;
use crate::tables::{Table, TableSet};

/// Manifest file written next to the table files.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Receives the output of one successful transform run.
pub trait TableSink {
    fn load(&mut self, tables: &TableSet) -> SinkResult<LoadReport>;
}

/// One delivered table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReport {
    pub name: String,
    pub rows: usize,
    pub columns: Vec<String>,
}

/// What a sink delivered. Also the content of `manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Unique identifier of this delivery
    pub run_id: String,
    /// RFC 3339 timestamp
    pub generated_at: String,
    /// Tables in load order
    pub tables: Vec<TableReport>,
}

impl LoadReport {
    pub fn new(tables: &[Table]) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            tables: tables
                .iter()
                .map(|t| TableReport {
                    name: t.name.clone(),
                    rows: t.len(),
                    columns: t.columns.clone(),
                })
                .collect(),
        }
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

/// Writes each table to `<dir>/<table>.csv` plus a `manifest.json`.
///
/// Existing files with the same names are replaced, so a rerun leaves the
/// directory holding exactly the latest snapshot.
#[derive(Debug, Clone)]
pub struct CsvDirSink {
    dir: PathBuf,
}

impl CsvDirSink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the CSV file for `table`.
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.csv"))
    }

    fn write_table(&self, table: &Table) -> SinkResult<()> {
        let path = self.table_path(&table.name);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(&table.columns)?;
        for row in &table.rows {
            writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        writer.flush()?;
        debug!(path = %path.display(), rows = table.len(), "Wrote table");
        Ok(())
    }
}

impl TableSink for CsvDirSink {
    fn load(&mut self, tables: &TableSet) -> SinkResult<LoadReport> {
        fs::create_dir_all(&self.dir)?;

        let tables = tables.tables();
        for table in &tables {
            self.write_table(table)?;
        }

        let report = LoadReport::new(&tables);
        let manifest = serde_json::to_string_pretty(&report)?;
        fs::write(self.dir.join(MANIFEST_FILE), manifest)?;

        info!(
            dir = %self.dir.display(),
            run_id = %report.run_id,
            tables = report.tables.len(),
            rows = report.total_rows(),
            "Tables written"
        );
        Ok(report)
    }
}

/// Keeps a copy of the last delivered table set.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    last: Option<TableSet>,
    loads: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&TableSet> {
        self.last.as_ref()
    }

    /// Number of deliveries so far
    pub fn loads(&self) -> usize {
        self.loads
    }
}

impl TableSink for MemorySink {
    fn load(&mut self, tables: &TableSet) -> SinkResult<LoadReport> {
        self.last = Some(tables.clone());
        self.loads += 1;
        Ok(LoadReport::new(&tables.tables()))
    }
}
