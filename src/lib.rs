//! sensor-merge - nearest-timestamp alignment of phone motion recordings.
//!
//! This library turns Sensor Logger exports (one ZIP per recording, with
//! separate accelerometer and gyroscope tables) into a single time-aligned
//! table per recording, ready for activity labeling and model training.
//!
//! # Alignment Guarantees
//!
//! - **Left join**: every accelerometer sample produces exactly one row
//! - **Bounded**: a gyroscope sample is attached only within the tolerance
//! - **Nearest**: the closest gyroscope sample wins, the earlier one on ties
//! - **No guessing**: unmatched rows carry no gyroscope values at all
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        sensor-merge                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │   Ingest    │──▶│   Aligner   │──▶│   Export    │       │
//! │  │ (zip, csv)  │   │  (nearest)  │   │   (csv)     │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         ▲                                    │              │
//! │         │                                    ▼              │
//! │  ┌─────────────┐                     ┌─────────────┐       │
//! │  │  Pipeline   │────────────────────▶│  History    │       │
//! │  │  (workers)  │                     │    Log      │       │
//! │  └─────────────┘                     └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use sensor_merge::core::{align, Sample, Tolerance, Vec3};
//!
//! let acc = vec![
//!     Sample::new(0, Vec3::new(1.0, 1.0, 1.0)),
//!     Sample::new(10, Vec3::new(2.0, 2.0, 2.0)),
//! ];
//! let gyr = vec![Sample::new(1, Vec3::new(9.0, 9.0, 9.0))];
//!
//! let rows = align(acc, gyr, Tolerance::from_nanos(2).unwrap());
//! assert_eq!(rows.len(), 2);
//! assert!(rows[0].secondary.is_some());
//! assert!(rows[1].secondary.is_none());
//! ```

pub mod config;
pub mod core;
pub mod export;
pub mod history;
pub mod ingest;
pub mod pipeline;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use core::{align, AlignError, AlignedRow, AlignmentSummary, Sample, Tolerance, Vec3};
pub use export::{write_combined_csv, ExportError};
pub use history::{ProcessingLog, ProcessingStats, SharedProcessingLog};
pub use ingest::{Activity, IngestError};
pub use pipeline::{process_archive, run_batch, BatchOptions, BatchReport, PipelineError};

#[cfg(feature = "parallel")]
pub use core::align_par;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
