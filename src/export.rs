//! Combined table export.
//!
//! Column order is fixed: `timestamp`, accelerometer `x,y,z`, gyroscope
//! `x,y,z`, then the activity label. Rows without a gyroscope match get
//! empty gyroscope cells.

use crate::core::AlignedRow;
use crate::ingest::Activity;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Header of the combined table.
pub const COMBINED_HEADER: [&str; 8] = [
    "timestamp", "acc_x", "acc_y", "acc_z", "gyr_x", "gyr_y", "gyr_z", "activity",
];

/// Errors raised while writing a combined table.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Write `rows` as a combined CSV file, creating parent directories.
///
/// Returns the number of data rows written.
pub fn write_combined_csv(
    path: &Path,
    rows: &[AlignedRow],
    activity: Activity,
) -> Result<usize, ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = File::create(path).map_err(io_err)?;

    let written = write_combined(file, rows, activity)?;
    debug!(path = %path.display(), rows = written, "wrote combined table");
    Ok(written)
}

/// Write `rows` as combined CSV to any writer.
pub fn write_combined<W: Write>(
    writer: W,
    rows: &[AlignedRow],
    activity: Activity,
) -> Result<usize, ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(COMBINED_HEADER)?;

    let label = activity.as_str();
    for row in rows {
        let acc = row.primary;
        let gyr = row.secondary.map(|s| s.value);

        wtr.write_record([
            row.timestamp.to_string(),
            cell(Some(acc.x)),
            cell(Some(acc.y)),
            cell(Some(acc.z)),
            cell(gyr.map(|g| g.x)),
            cell(gyr.map(|g| g.y)),
            cell(gyr.map(|g| g.z)),
            label.to_string(),
        ])?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(rows.len())
}

/// Absent and NaN values are both written as empty cells.
fn cell(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => v.to_string(),
        _ => String::new(),
    }
}
