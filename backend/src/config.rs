//! Environment settings.
//!
//! Read once at start-up, after `.env` has been loaded with `dotenvy`:
//!
//! - `DATASETS_FOLDER`: root of the dataset tree. The raw extract is read
//!   from `<DATASETS_FOLDER>/raw/steam_app_data.csv` and the clean tables
//!   are written to `<DATASETS_FOLDER>/clean`.
//! - `LOGS_FOLDER` (optional): where the JSON log files go.
//!
//! The transform itself never reads these; only the CLI does.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DATASETS_FOLDER: &str = "DATASETS_FOLDER";
pub const LOGS_FOLDER: &str = "LOGS_FOLDER";

/// File name of the raw extract inside `<DATASETS_FOLDER>/raw`.
pub const RAW_EXTRACT_FILE: &str = "steam_app_data.csv";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub datasets_folder: Option<PathBuf>,
    pub logs_folder: Option<PathBuf>,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            datasets_folder: path(DATASETS_FOLDER),
            logs_folder: path(LOGS_FOLDER),
        }
    }

    fn datasets_folder(&self) -> Result<&Path, ConfigError> {
        let folder = self
            .datasets_folder
            .as_deref()
            .ok_or(ConfigError::MissingVar(DATASETS_FOLDER))?;
        if folder.is_file() {
            return Err(ConfigError::InvalidVar {
                name: DATASETS_FOLDER,
                message: format!("{} is a file, not a directory", folder.display()),
            });
        }
        Ok(folder)
    }

    /// `<DATASETS_FOLDER>/raw/steam_app_data.csv`
    pub fn raw_extract_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.datasets_folder()?.join("raw").join(RAW_EXTRACT_FILE))
    }

    /// `<DATASETS_FOLDER>/clean`
    pub fn clean_dir(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.datasets_folder()?.join("clean"))
    }

    /// `explicit` when given, otherwise the derived raw extract path.
    pub fn resolve_input(&self, explicit: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        match explicit {
            Some(path) => Ok(path),
            None => self.raw_extract_path(),
        }
    }

    /// `explicit` when given, otherwise the derived clean directory.
    pub fn resolve_output(&self, explicit: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        match explicit {
            Some(path) => Ok(path),
            None => self.clean_dir(),
        }
    }
}
