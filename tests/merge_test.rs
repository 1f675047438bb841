//! Integration tests for archive merging

mod merge_tests {
    use sensor_merge::history::{create_shared_log_with_persistence, read_persisted};
    use sensor_merge::pipeline::{discover_archives, run_batch, BatchOptions};
    use sensor_merge::Tolerance;
    use std::fs::File;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::AtomicBool;
    use tempfile::TempDir;

    /// Sensor Logger layout: nanosecond `time`, `seconds_elapsed`, then `z,y,x`.
    fn sensor_table(start_ns: i64, step_ns: i64, count: usize, scale: f64) -> String {
        let mut out = String::from("time,seconds_elapsed,z,y,x\n");
        for i in 0..count {
            let ts = start_ns + i as i64 * step_ns;
            let v = i as f64 * scale;
            out.push_str(&format!("{ts},{},{v},{v},{v}\n", (ts - start_ns) as f64 / 1e9));
        }
        out
    }

    fn write_archive(dir: &Path, name: &str, files: &[(&str, String)]) -> PathBuf {
        let path = dir.join(name);
        let mut zip = zip::ZipWriter::new(File::create(&path).expect("create archive"));
        for (entry, content) in files {
            zip.start_file(*entry, zip::write::SimpleFileOptions::default())
                .expect("start entry");
            zip.write_all(content.as_bytes()).expect("write entry");
        }
        zip.finish().expect("finish archive");
        path
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut rdr = csv::Reader::from_path(path).expect("open combined csv");
        rdr.records()
            .map(|r| r.expect("record").iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_batch_merges_every_archive() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();

        // 100 Hz accelerometer, 50 Hz gyroscope offset by 1 ms.
        write_archive(
            input.path(),
            "Walking_2024-03-01.zip",
            &[
                ("Accelerometer.csv", sensor_table(0, 10_000_000, 50, 1.0)),
                ("Gyroscope.csv", sensor_table(1_000_000, 20_000_000, 25, 0.5)),
            ],
        );
        // Uncalibrated tables only, lower-case names.
        write_archive(
            input.path(),
            "standing_02.zip",
            &[
                ("accelerometeruncalibrated.csv", sensor_table(0, 10_000_000, 10, 1.0)),
                ("gyroscopeuncalibrated.csv", sensor_table(0, 10_000_000, 10, 2.0)),
            ],
        );
        // No gyroscope at all.
        write_archive(
            input.path(),
            "still_03.zip",
            &[("Accelerometer.csv", sensor_table(0, 10_000_000, 5, 1.0))],
        );

        let archives = discover_archives(input.path(), "*.zip").unwrap();
        assert_eq!(archives.len(), 3);

        let options = BatchOptions {
            output_dir: output.path().to_path_buf(),
            tolerance: Tolerance::default(),
            jobs: 3,
        };
        let log = create_shared_log_with_persistence(state.path().join("history.json"));
        let running = AtomicBool::new(true);

        let report = run_batch(&archives, &options, &log, &running, |_, _| {});

        assert_eq!(report.successes.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].archive.ends_with("still_03.zip"));
        assert!(report
            .failures[0]
            .error
            .to_string()
            .contains("could not find accelerometer/gyroscope CSVs"));

        let walking = read_rows(&output.path().join("Walking_2024-03-01_combined.csv"));
        assert_eq!(walking.len(), 50);
        // Even rows sit 1 ms from a gyroscope sample, odd rows 9 ms or more.
        for (i, row) in walking.iter().enumerate() {
            assert_eq!(row.len(), 8);
            assert_eq!(row[0], (i as i64 * 10_000_000).to_string());
            assert_eq!(row[7], "walking");
            if i % 2 == 0 {
                assert_eq!(row[4], (i as f64 / 2.0 * 0.5).to_string(), "row {i}");
            } else {
                assert!(row[4..7].iter().all(String::is_empty), "row {i}");
            }
        }

        let standing = read_rows(&output.path().join("standing_02_combined.csv"));
        assert_eq!(standing.len(), 10);
        assert!(standing.iter().all(|r| r[7] == "standing" && !r[4].is_empty()));

        log.save().unwrap();
        let persisted = read_persisted(&state.path().join("history.json")).unwrap();
        assert_eq!(persisted.archives_succeeded, 2);
        assert_eq!(persisted.archives_failed, 1);
        assert_eq!(persisted.rows_written, 60);
        assert_eq!(persisted.rows_matched, 25 + 10);
    }

    #[test]
    fn test_zero_tolerance_only_matches_exact_timestamps() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();

        write_archive(
            input.path(),
            "jumping.zip",
            &[
                ("Accelerometer.csv", sensor_table(0, 5, 6, 1.0)),
                ("Gyroscope.csv", sensor_table(0, 10, 3, 1.0)),
            ],
        );

        let archive = input.path().join("jumping.zip");
        let outcome = sensor_merge::process_archive(&archive, output.path(), Tolerance::ZERO)
            .expect("merge archive");

        // Accelerometer at 0,5,...,25; gyroscope at 0,10,20.
        assert_eq!(outcome.summary.rows, 6);
        assert_eq!(outcome.summary.matched, 3);
        assert_eq!(outcome.summary.max_offset_ns, Some(0));
    }
}
