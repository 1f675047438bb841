//! Archive processing and batch orchestration.
//!
//! One archive is independent of every other, so a batch hands archives to
//! a fixed pool of worker threads over a channel and collects the outcomes.
//! A failing archive is reported and the batch moves on.

use crate::core::{AlignedRow, AlignmentSummary, Sample, Tolerance};
use crate::export::{write_combined_csv, ExportError};
use crate::history::SharedProcessingLog;
use crate::ingest::{
    extract_archive, load_sensor_csv, locate_sensor_tables, Activity, IngestError,
};
use crossbeam_channel::unbounded;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors for a single archive.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("cannot create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("invalid archive pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("cannot list archives: {0}")]
    Glob(#[from] glob::GlobError),
}

/// Settings shared by every archive of a batch.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    pub tolerance: Tolerance,
    /// Worker threads, at least 1
    pub jobs: usize,
}

/// Result of merging one archive.
#[derive(Debug, Clone)]
pub struct ArchiveOutcome {
    pub archive: PathBuf,
    pub output: PathBuf,
    pub activity: Activity,
    pub summary: AlignmentSummary,
    /// Rows dropped from either table for lack of a usable timestamp
    pub dropped_rows: usize,
}

/// An archive that could not be merged.
#[derive(Debug)]
pub struct BatchFailure {
    pub archive: PathBuf,
    pub error: PipelineError,
}

/// Outcome of a whole batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub successes: Vec<ArchiveOutcome>,
    pub failures: Vec<BatchFailure>,
    /// Archives never started because the batch was interrupted
    pub skipped: Vec<PathBuf>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }

    /// Human-readable summary block.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Summary:\n  Success: {}\n  Failures: {}",
            self.successes.len(),
            self.failures.len()
        );
        for failure in &self.failures {
            out.push_str(&format!(
                "\n   - {}: {}",
                display_name(&failure.archive),
                failure.error
            ));
        }
        if !self.skipped.is_empty() {
            out.push_str(&format!("\n  Skipped: {}", self.skipped.len()));
        }
        out
    }
}

/// List archives in `input_dir` matching `pattern`, sorted.
pub fn discover_archives(input_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, PipelineError> {
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&input_dir.to_string_lossy()),
        pattern
    );
    let paths = glob::glob(&full).map_err(|source| PipelineError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut archives = Vec::new();
    for entry in paths {
        let path = entry?;
        if path.is_file() {
            archives.push(path);
        }
    }
    archives.sort();

    debug!(dir = %input_dir.display(), pattern, found = archives.len(), "discovered archives");
    Ok(archives)
}

/// Output file name for an archive: `<stem>_combined.csv`.
pub fn combined_file_name(archive: &Path) -> String {
    format!("{}_combined.csv", archive_stem(archive))
}

/// Align two loaded tables, accelerometer as primary.
pub fn align_tables(
    accelerometer: Vec<Sample>,
    gyroscope: Vec<Sample>,
    tolerance: Tolerance,
) -> Vec<AlignedRow> {
    #[cfg(feature = "parallel")]
    {
        crate::core::align_par(accelerometer, gyroscope, tolerance)
    }
    #[cfg(not(feature = "parallel"))]
    {
        crate::core::align(accelerometer, gyroscope, tolerance)
    }
}

/// Extract one archive, align its tables and write the combined CSV.
pub fn process_archive(
    archive: &Path,
    output_dir: &Path,
    tolerance: Tolerance,
) -> Result<ArchiveOutcome, PipelineError> {
    let stem = archive_stem(archive);
    let activity = Activity::infer_from_name(&stem);

    // Removed when dropped, on every return path.
    let scratch = tempfile::TempDir::new().map_err(PipelineError::Scratch)?;
    extract_archive(archive, scratch.path())?;

    let tables = locate_sensor_tables(scratch.path())?;
    let acc = load_sensor_csv(&tables.accelerometer)?;
    let gyr = load_sensor_csv(&tables.gyroscope)?;
    let dropped_rows = acc.dropped_rows + gyr.dropped_rows;
    if dropped_rows > 0 {
        warn!(
            archive = %archive.display(),
            dropped = dropped_rows,
            "rows without usable timestamps were dropped"
        );
    }

    let rows = align_tables(acc.samples, gyr.samples, tolerance);
    let summary = AlignmentSummary::from_rows(&rows);

    let output = output_dir.join(combined_file_name(archive));
    write_combined_csv(&output, &rows, activity)?;

    info!(
        archive = %archive.display(),
        output = %output.display(),
        %activity,
        rows = summary.rows,
        matched = summary.matched,
        "merged archive"
    );

    Ok(ArchiveOutcome {
        archive: archive.to_path_buf(),
        output,
        activity,
        summary,
        dropped_rows,
    })
}

/// Process `archives` on `options.jobs` worker threads.
///
/// `on_result` runs on the calling thread as each archive finishes. Workers
/// stop taking new archives once `running` is cleared; the archives they
/// never started are reported as skipped.
pub fn run_batch<F>(
    archives: &[PathBuf],
    options: &BatchOptions,
    log: &SharedProcessingLog,
    running: &AtomicBool,
    mut on_result: F,
) -> BatchReport
where
    F: FnMut(&Path, Result<&ArchiveOutcome, &PipelineError>),
{
    let jobs = options.jobs.clamp(1, archives.len().max(1));
    let (job_tx, job_rx) = unbounded::<(usize, &Path)>();
    let (result_tx, result_rx) = unbounded();

    for (idx, archive) in archives.iter().enumerate() {
        // The receiver is alive until the scope below ends.
        let _ = job_tx.send((idx, archive.as_path()));
    }
    drop(job_tx);

    let mut results: Vec<Option<Result<ArchiveOutcome, PipelineError>>> =
        archives.iter().map(|_| None).collect();

    std::thread::scope(|scope| {
        for worker in 0..jobs {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                while let Ok((idx, archive)) = job_rx.recv() {
                    if !running.load(Ordering::SeqCst) {
                        debug!(worker, "batch interrupted, worker exiting");
                        break;
                    }
                    let result = process_archive(archive, &options.output_dir, options.tolerance);
                    match &result {
                        Ok(outcome) => log.record_archive(
                            outcome.summary.rows as u64,
                            outcome.summary.matched as u64,
                        ),
                        Err(_) => log.record_failure(),
                    }
                    if result_tx.send((idx, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        for (idx, result) in result_rx.iter() {
            on_result(archives[idx].as_path(), result.as_ref());
            results[idx] = Some(result);
        }
    });

    let mut report = BatchReport::default();
    for (archive, result) in archives.iter().zip(results) {
        match result {
            Some(Ok(outcome)) => report.successes.push(outcome),
            Some(Err(error)) => report.failures.push(BatchFailure {
                archive: archive.clone(),
                error,
            }),
            None => report.skipped.push(archive.clone()),
        }
    }
    report
}

fn archive_stem(archive: &Path) -> String {
    archive
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string())
}

/// File name for messages, falling back to the full path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
