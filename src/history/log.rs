//! Cumulative processing statistics.
//!
//! Counters are updated from worker threads while a batch runs and can be
//! persisted so `sensor-merge status` reports totals across runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Processing statistics for the current run plus any loaded history.
#[derive(Debug)]
pub struct ProcessingLog {
    /// Archives merged successfully
    archives_succeeded: AtomicU64,
    /// Archives that failed
    archives_failed: AtomicU64,
    /// Combined rows written
    rows_written: AtomicU64,
    /// Rows that found a gyroscope match
    rows_matched: AtomicU64,
    /// Identifier of this run
    run_id: Uuid,
    /// Run start time
    run_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl ProcessingLog {
    /// Create a new processing log.
    pub fn new() -> Self {
        Self {
            archives_succeeded: AtomicU64::new(0),
            archives_failed: AtomicU64::new(0),
            rows_written: AtomicU64::new(0),
            rows_matched: AtomicU64::new(0),
            run_id: Uuid::new_v4(),
            run_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a processing log with persistence.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        // Try to load existing stats
        if let Err(e) = log.load() {
            warn!("could not load previous processing stats: {e}");
        }

        log
    }

    /// Record a merged archive and its row counts.
    pub fn record_archive(&self, rows: u64, matched: u64) {
        self.archives_succeeded.fetch_add(1, Ordering::Relaxed);
        self.rows_written.fetch_add(rows, Ordering::Relaxed);
        self.rows_matched.fetch_add(matched, Ordering::Relaxed);
    }

    /// Record a failed archive.
    pub fn record_failure(&self) {
        self.archives_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Get the current statistics.
    pub fn stats(&self) -> ProcessingStats {
        ProcessingStats {
            archives_succeeded: self.archives_succeeded.load(Ordering::Relaxed),
            archives_failed: self.archives_failed.load(Ordering::Relaxed),
            rows_written: self.rows_written.load(Ordering::Relaxed),
            rows_matched: self.rows_matched.load(Ordering::Relaxed),
            run_id: self.run_id,
            run_start: self.run_start,
            run_duration_secs: (Utc::now() - self.run_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Processing Statistics:\n\
             - Archives merged: {}\n\
             - Archives failed: {}\n\
             - Rows written: {}\n\
             - Rows with gyroscope match: {} ({:.1}%)\n\
             - Run duration: {} seconds",
            stats.archives_succeeded,
            stats.archives_failed,
            stats.rows_written,
            stats.rows_matched,
            stats.match_rate() * 100.0,
            stats.run_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                archives_succeeded: stats.archives_succeeded,
                archives_failed: stats.archives_failed,
                rows_written: stats.rows_written,
                rows_matched: stats.rows_matched,
                last_run_id: Some(stats.run_id),
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let persisted = read_persisted(path)?;

                self.archives_succeeded
                    .store(persisted.archives_succeeded, Ordering::Relaxed);
                self.archives_failed
                    .store(persisted.archives_failed, Ordering::Relaxed);
                self.rows_written
                    .store(persisted.rows_written, Ordering::Relaxed);
                self.rows_matched
                    .store(persisted.rows_matched, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.archives_succeeded.store(0, Ordering::Relaxed);
        self.archives_failed.store(0, Ordering::Relaxed);
        self.rows_written.store(0, Ordering::Relaxed);
        self.rows_matched.store(0, Ordering::Relaxed);
    }
}

impl Default for ProcessingLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of processing statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub archives_succeeded: u64,
    pub archives_failed: u64,
    pub rows_written: u64,
    pub rows_matched: u64,
    pub run_id: Uuid,
    pub run_start: DateTime<Utc>,
    pub run_duration_secs: u64,
}

impl ProcessingStats {
    /// Matched fraction of all written rows, 0 when nothing was written.
    pub fn match_rate(&self) -> f64 {
        if self.rows_written == 0 {
            0.0
        } else {
            self.rows_matched as f64 / self.rows_written as f64
        }
    }
}

/// Stats format for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedStats {
    pub archives_succeeded: u64,
    pub archives_failed: u64,
    pub rows_written: u64,
    pub rows_matched: u64,
    #[serde(default)]
    pub last_run_id: Option<Uuid>,
    pub last_updated: DateTime<Utc>,
}

/// Read persisted stats without creating a log.
pub fn read_persisted(path: &std::path::Path) -> Result<PersistedStats, std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(std::io::Error::other)
}

/// Thread-safe shared processing log.
pub type SharedProcessingLog = Arc<ProcessingLog>;

/// Create a new shared processing log.
pub fn create_shared_log() -> SharedProcessingLog {
    Arc::new(ProcessingLog::new())
}

/// Create a new shared processing log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedProcessingLog {
    Arc::new(ProcessingLog::with_persistence(path))
}
