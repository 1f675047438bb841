//! Processing history for sensor-merge.
//!
//! Tracks what each run produced so totals can be reviewed across runs.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, read_persisted, PersistedStats,
    ProcessingLog, ProcessingStats, SharedProcessingLog,
};
