//! Archive extraction and sensor table discovery.
//!
//! Sensor Logger exports one CSV per sensor at the top level of a ZIP
//! archive. File names vary in case between app versions, and some exports
//! only carry the uncalibrated tables.

use crate::ingest::IngestError;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const ACCELEROMETER: &str = "Accelerometer.csv";
const ACCELEROMETER_UNCALIBRATED: &str = "AccelerometerUncalibrated.csv";
const GYROSCOPE: &str = "Gyroscope.csv";
const GYROSCOPE_UNCALIBRATED: &str = "GyroscopeUncalibrated.csv";

/// Paths of the two tables needed for alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorTables {
    pub accelerometer: PathBuf,
    pub gyroscope: PathBuf,
}

/// Extract every entry of `archive` into `dest`.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<(), IngestError> {
    let file = File::open(archive).map_err(|e| IngestError::io(archive, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| IngestError::Archive {
        path: archive.to_path_buf(),
        source: e,
    })?;

    debug!(archive = %archive.display(), entries = zip.len(), "extracting archive");
    std::fs::create_dir_all(dest).map_err(|e| IngestError::io(dest, e))?;

    zip.extract(dest).map_err(|e| IngestError::Archive {
        path: archive.to_path_buf(),
        source: e,
    })
}

/// Find the first top-level file in `dir` matching any of `candidates`.
///
/// Exact case-insensitive name matches are tried first (in candidate
/// order), then case-insensitive substring matches. Directory entries are
/// visited in sorted order so the result does not depend on the filesystem.
pub fn find_csv_case_insensitive(
    dir: &Path,
    candidates: &[&str],
) -> Result<Option<PathBuf>, IngestError> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map_err(|e| IngestError::io(dir, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    names.sort();

    let lowered: Vec<(String, &String)> = names.iter().map(|n| (n.to_lowercase(), n)).collect();

    for cand in candidates {
        let cand = cand.to_lowercase();
        if let Some((_, name)) = lowered.iter().find(|(low, _)| *low == cand) {
            return Ok(Some(dir.join(name)));
        }
    }

    for cand in candidates {
        let cand = cand.to_lowercase();
        if let Some((_, name)) = lowered.iter().find(|(low, _)| low.contains(&cand)) {
            return Ok(Some(dir.join(name)));
        }
    }

    Ok(None)
}

/// Locate the accelerometer and gyroscope tables in an extracted export.
///
/// Calibrated tables are preferred; each sensor falls back to its
/// uncalibrated table on its own.
pub fn locate_sensor_tables(dir: &Path) -> Result<SensorTables, IngestError> {
    let accelerometer = locate_one(dir, ACCELEROMETER, ACCELEROMETER_UNCALIBRATED)?;
    let gyroscope = locate_one(dir, GYROSCOPE, GYROSCOPE_UNCALIBRATED)?;

    match (accelerometer, gyroscope) {
        (Some(accelerometer), Some(gyroscope)) => Ok(SensorTables {
            accelerometer,
            gyroscope,
        }),
        (acc, gyr) => Err(IngestError::MissingSensorTables {
            dir: dir.to_path_buf(),
            accelerometer: acc.is_some(),
            gyroscope: gyr.is_some(),
        }),
    }
}

fn locate_one(dir: &Path, calibrated: &str, uncalibrated: &str) -> Result<Option<PathBuf>, IngestError> {
    if let Some(path) = find_csv_case_insensitive(dir, &[calibrated])? {
        return Ok(Some(path));
    }

    let fallback = find_csv_case_insensitive(dir, &[uncalibrated])?;
    if let Some(ref path) = fallback {
        warn!(
            table = calibrated,
            using = %path.display(),
            "calibrated table missing, falling back to uncalibrated"
        );
    }
    Ok(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), "time,x,y,z\n").unwrap();
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "ACCELEROMETER.CSV");
        touch(dir.path(), "Gyroscope.csv");

        let found = find_csv_case_insensitive(dir.path(), &["accelerometer.csv"]).unwrap();
        assert_eq!(found, Some(dir.path().join("ACCELEROMETER.CSV")));
    }

    #[test]
    fn test_substring_fallback() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "phone_gyroscope.csv");

        let found = find_csv_case_insensitive(dir.path(), &["Gyroscope.csv"]).unwrap();
        assert_eq!(found, Some(dir.path().join("phone_gyroscope.csv")));

        let missing = find_csv_case_insensitive(dir.path(), &["Magnetometer.csv"]).unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn test_directories_are_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("Accelerometer.csv")).unwrap();

        let found = find_csv_case_insensitive(dir.path(), &["Accelerometer.csv"]).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_calibrated_tables_preferred() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Accelerometer.csv");
        touch(dir.path(), "AccelerometerUncalibrated.csv");
        touch(dir.path(), "Gyroscope.csv");

        let tables = locate_sensor_tables(dir.path()).unwrap();
        assert_eq!(tables.accelerometer, dir.path().join("Accelerometer.csv"));
        assert_eq!(tables.gyroscope, dir.path().join("Gyroscope.csv"));
    }

    #[test]
    fn test_uncalibrated_fallback() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Accelerometer.csv");
        touch(dir.path(), "GyroscopeUncalibrated.csv");

        let tables = locate_sensor_tables(dir.path()).unwrap();
        assert_eq!(
            tables.gyroscope,
            dir.path().join("GyroscopeUncalibrated.csv")
        );
    }

    #[test]
    fn test_missing_table_reports_which() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Accelerometer.csv");

        match locate_sensor_tables(dir.path()) {
            Err(IngestError::MissingSensorTables {
                accelerometer,
                gyroscope,
                ..
            }) => {
                assert!(accelerometer);
                assert!(!gyroscope);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_extract_archive() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("rec.zip");
        {
            let file = File::create(&zip_path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("Accelerometer.csv", options).unwrap();
            zip.write_all(b"time,x,y,z\n1,0,0,0\n").unwrap();
            zip.finish().unwrap();
        }

        let out = dir.path().join("out");
        extract_archive(&zip_path, &out).unwrap();

        let content = std::fs::read_to_string(out.join("Accelerometer.csv")).unwrap();
        assert!(content.starts_with("time,x,y,z"));
    }

    #[test]
    fn test_extract_rejects_non_zip() {
        let dir = TempDir::new().unwrap();
        let bogus = dir.path().join("bogus.zip");
        std::fs::write(&bogus, b"not a zip").unwrap();

        let err = extract_archive(&bogus, dir.path()).unwrap_err();
        assert!(matches!(err, IngestError::Archive { .. }));
    }
}
