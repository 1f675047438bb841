//! Ingestion of Sensor Logger exports.
//!
//! This module turns a ZIP export into two sample sequences:
//! - `archive`: extraction and case-insensitive table discovery
//! - `table`: CSV loading with header resolution and timestamp coercion
//! - `label`: activity inference from recording names

pub mod archive;
pub mod label;
pub mod table;

use crate::core::AlignError;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Re-export commonly used types
pub use archive::{extract_archive, find_csv_case_insensitive, locate_sensor_tables, SensorTables};
pub use label::Activity;
pub use table::{load_sensor_csv, read_sensor_csv, SensorTable};

/// Errors raised while reading an export.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read archive {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("malformed CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(
        "could not find accelerometer/gyroscope CSVs in {} (accelerometer found: {accelerometer}, gyroscope found: {gyroscope})",
        .dir.display()
    )]
    MissingSensorTables {
        dir: PathBuf,
        accelerometer: bool,
        gyroscope: bool,
    },

    #[error("missing required columns in {}. Found: {found:?}", .path.display())]
    MissingColumns { path: PathBuf, found: Vec<String> },

    #[error("invalid timestamp {value:?} at {}:{line}: {source}", .path.display())]
    InvalidTimestamp {
        path: PathBuf,
        line: u64,
        value: String,
        #[source]
        source: AlignError,
    },

    #[error("invalid {column} value {value:?} at {}:{line}", .path.display())]
    InvalidValue {
        path: PathBuf,
        line: u64,
        column: &'static str,
        value: String,
    },
}

impl IngestError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        IngestError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
