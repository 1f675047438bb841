//! Alignment core.
//!
//! This module contains:
//! - Sample, tolerance and output row types
//! - The nearest-timestamp aligner
//! - Match statistics over aligned output
//!
//! Nothing in here performs I/O.

pub mod aligner;
pub mod sample;
pub mod summary;

// Re-export commonly used types
#[cfg(feature = "parallel")]
pub use aligner::align_par;
pub use aligner::align;
pub use sample::{AlignError, AlignedRow, Sample, Tolerance, Vec3};
pub use summary::AlignmentSummary;
