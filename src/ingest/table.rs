//! Sensor table loading.
//!
//! A Sensor Logger table has a timestamp column plus `x`, `y`, `z` and
//! usually a few extras (`seconds_elapsed`, ...). Header names are matched
//! after trimming and lower-casing; extra columns are ignored.

use crate::core::sample::{timestamp_from_f64, Sample, Vec3};
use crate::ingest::IngestError;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Accepted names for the timestamp column, in priority order.
const TIME_COLUMNS: [&str; 3] = ["time", "timestamp", "ts"];

/// Samples read from one table.
#[derive(Debug, Clone, Default)]
pub struct SensorTable {
    pub samples: Vec<Sample>,
    /// Rows skipped because their timestamp was empty or not numeric
    pub dropped_rows: usize,
}

/// Load a sensor table from disk.
pub fn load_sensor_csv(path: &Path) -> Result<SensorTable, IngestError> {
    let file = File::open(path).map_err(|e| IngestError::io(path, e))?;
    read_sensor_csv(file, path)
}

/// Read a sensor table from any reader. `source` is only used in errors.
pub fn read_sensor_csv<R: Read>(reader: R, source: &Path) -> Result<SensorTable, IngestError> {
    let csv_err = |e: csv::Error| IngestError::Csv {
        path: source.to_path_buf(),
        source: e,
    };

    // Recordings cut off mid-write end in a short row; its missing cells are empty.
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    let columns = Columns::resolve(&headers).ok_or_else(|| IngestError::MissingColumns {
        path: source.to_path_buf(),
        found: headers.clone(),
    })?;

    let mut table = SensorTable::default();
    for record in rdr.records() {
        let record = record.map_err(csv_err)?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();

        let Some(timestamp) = parse_timestamp(field(columns.time), source, line)? else {
            table.dropped_rows += 1;
            continue;
        };

        let value = Vec3::new(
            parse_component(field(columns.x), "x", source, line)?,
            parse_component(field(columns.y), "y", source, line)?,
            parse_component(field(columns.z), "z", source, line)?,
        );
        table.samples.push(Sample::new(timestamp, value));
    }

    debug!(
        source = %source.display(),
        samples = table.samples.len(),
        dropped = table.dropped_rows,
        "loaded sensor table"
    );
    Ok(table)
}

/// Indices of the required columns.
struct Columns {
    time: usize,
    x: usize,
    y: usize,
    z: usize,
}

impl Columns {
    fn resolve(headers: &[String]) -> Option<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        Some(Self {
            time: TIME_COLUMNS.iter().find_map(|n| find(*n))?,
            x: find("x")?,
            y: find("y")?,
            z: find("z")?,
        })
    }
}

/// `Ok(None)` means the row carries no usable timestamp and is skipped.
fn parse_timestamp(raw: &str, source: &Path, line: u64) -> Result<Option<i64>, IngestError> {
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(ts) = raw.parse::<i64>() {
        return Ok(Some(ts));
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => timestamp_from_f64(v).map(Some).map_err(|e| {
            IngestError::InvalidTimestamp {
                path: source.to_path_buf(),
                line,
                value: raw.to_string(),
                source: e,
            }
        }),
        _ => Ok(None),
    }
}

/// Empty cells become NaN; the value is otherwise passed through untouched.
fn parse_component(
    raw: &str,
    column: &'static str,
    source: &Path,
    line: u64,
) -> Result<f64, IngestError> {
    if raw.is_empty() {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>().map_err(|_| IngestError::InvalidValue {
        path: source.to_path_buf(),
        line,
        column,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(data: &str) -> Result<SensorTable, IngestError> {
        read_sensor_csv(data.as_bytes(), Path::new("Accelerometer.csv"))
    }

    #[test]
    fn test_sensor_logger_layout() {
        let table = read(
            "time,seconds_elapsed,z,y,x\n\
             1700000000000000000,0.0,9.81,0.1,-0.2\n\
             1700000000010000000,0.01,9.80,0.2,-0.1\n",
        )
        .unwrap();

        assert_eq!(table.dropped_rows, 0);
        assert_eq!(table.samples.len(), 2);
        assert_eq!(table.samples[0].timestamp, 1_700_000_000_000_000_000);
        assert_eq!(table.samples[0].value, Vec3::new(-0.2, 0.1, 9.81));
        assert_eq!(table.samples[1].timestamp, 1_700_000_000_010_000_000);
    }

    #[test]
    fn test_header_aliases_are_normalized() {
        let table = read(" TimeStamp , X ,Y, z \n5,1,2,3\n").unwrap();
        assert_eq!(table.samples, vec![Sample::new(5, Vec3::new(1.0, 2.0, 3.0))]);

        let table = read("ts,x,y,z\n7,0,0,0\n").unwrap();
        assert_eq!(table.samples[0].timestamp, 7);
    }

    #[test]
    fn test_time_column_priority() {
        let table = read("ts,time,x,y,z\n1,2,0,0,0\n").unwrap();
        assert_eq!(table.samples[0].timestamp, 2);
    }

    #[test]
    fn test_missing_columns() {
        match read("time,x,y\n1,2,3\n") {
            Err(IngestError::MissingColumns { found, .. }) => {
                assert_eq!(found, vec!["time", "x", "y"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_unusable_timestamps_are_dropped() {
        let table = read(
            "time,x,y,z\n\
             ,1,1,1\n\
             abc,2,2,2\n\
             nan,3,3,3\n\
             10,4,4,4\n",
        )
        .unwrap();

        assert_eq!(table.dropped_rows, 3);
        assert_eq!(table.samples.len(), 1);
        assert_eq!(table.samples[0].timestamp, 10);
    }

    #[test]
    fn test_float_timestamps() {
        let table = read("time,x,y,z\n1.5e3,0,0,0\n").unwrap();
        assert_eq!(table.samples[0].timestamp, 1500);

        // Float notation goes through f64: digits past 2^53 are rounded,
        // while plain integers keep every nanosecond.
        let table = read(
            "time,x,y,z\n1.700000000123456789e18,0,0,0\n1700000000123456789,0,0,0\n",
        )
        .unwrap();
        assert_eq!(table.samples[0].timestamp, 1_700_000_000_123_456_768);
        assert_eq!(table.samples[1].timestamp, 1_700_000_000_123_456_789);

        match read("time,x,y,z\n12.25,0,0,0\n") {
            Err(IngestError::InvalidTimestamp { line, value, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(value, "12.25");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_empty_component_is_nan() {
        let table = read("time,x,y,z\n1,,2,3\n").unwrap();
        assert!(table.samples[0].value.x.is_nan());
        assert_eq!(table.samples[0].value.y, 2.0);
    }

    #[test]
    fn test_short_row_is_padded() {
        let table = read("time,x,y,z
1,0,0,0
2,0.5
3
").unwrap();

        assert_eq!(table.dropped_rows, 0);
        assert_eq!(table.samples.len(), 3);
        assert_eq!(table.samples[1].timestamp, 2);
        assert_eq!(table.samples[1].value.x, 0.5);
        assert!(table.samples[1].value.y.is_nan());
        assert!(table.samples[1].value.z.is_nan());
        assert!(table.samples[2].value.x.is_nan());

        // A row cut before its timestamp column is dropped, not an error.
        let table = read("x,y,z,time
1,2,3,10
1,2
").unwrap();
        assert_eq!(table.samples.len(), 1);
        assert_eq!(table.dropped_rows, 1);
    }

    #[test]
    fn test_non_numeric_component_is_error() {
        let err = read("time,x,y,z\n1,0,oops,3\n").unwrap_err();
        assert!(matches!(err, IngestError::InvalidValue { column: "y", .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Gyroscope.csv");
        std::fs::write(&path, "time,x,y,z\n3,0.5,0.25,0.125\n").unwrap();

        let table = load_sensor_csv(&path).unwrap();
        assert_eq!(table.samples, vec![Sample::new(3, Vec3::new(0.5, 0.25, 0.125))]);

        let missing = load_sensor_csv(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(missing, IngestError::Io { .. }));
    }
}
