//! Timestamped sensor sample types.
//!
//! Timestamps are integer nanoseconds with an arbitrary origin. Samples and
//! tolerances are validated when they are built, so the aligner itself only
//! ever sees well-formed input.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Three-axis reading (accelerometer or gyroscope).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A single sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Nanoseconds since an arbitrary origin
    pub timestamp: i64,
    /// Measured vector
    pub value: Vec3,
}

impl Sample {
    pub const fn new(timestamp: i64, value: Vec3) -> Self {
        Self { timestamp, value }
    }

    /// Build a sample from a timestamp that arrived as a float.
    ///
    /// Rejects NaN, infinities, values outside the `i64` range and values
    /// with a fractional part instead of rounding them somewhere.
    pub fn from_raw_timestamp(timestamp: f64, value: Vec3) -> Result<Self, AlignError> {
        Ok(Self::new(timestamp_from_f64(timestamp)?, value))
    }
}

/// Convert a float timestamp to integer nanoseconds.
pub(crate) fn timestamp_from_f64(raw: f64) -> Result<i64, AlignError> {
    if !raw.is_finite() {
        return Err(AlignError::NonFiniteTimestamp(raw));
    }
    if raw.fract() != 0.0 {
        return Err(AlignError::FractionalTimestamp(raw));
    }
    // 2^63 itself is not representable, hence the strict upper bound.
    if raw < i64::MIN as f64 || raw >= i64::MAX as f64 {
        return Err(AlignError::TimestampOutOfRange(raw));
    }
    Ok(raw as i64)
}

/// Maximum allowed distance between matched timestamps, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tolerance(u64);

impl Tolerance {
    /// Exact timestamp equality only.
    pub const ZERO: Tolerance = Tolerance(0);

    pub fn from_nanos(nanos: i64) -> Result<Self, AlignError> {
        u64::try_from(nanos)
            .map(Tolerance)
            .map_err(|_| AlignError::NegativeTolerance(nanos))
    }

    /// Milliseconds as typed on the command line, e.g. `2.0` or `0.5`.
    ///
    /// Sub-nanosecond remainders are truncated.
    pub fn from_millis(millis: f64) -> Result<Self, AlignError> {
        if !millis.is_finite() {
            return Err(AlignError::NonFiniteTolerance(millis));
        }
        if millis < 0.0 {
            return Err(AlignError::NegativeToleranceMillis(millis));
        }
        Ok(Tolerance((millis * 1_000_000.0) as u64))
    }

    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    pub fn as_millis_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }
}

impl Default for Tolerance {
    /// 2 ms, the Sensor Logger default.
    fn default() -> Self {
        Tolerance(2_000_000)
    }
}

/// One output row: a primary sample plus its nearest secondary sample, if
/// one lies within tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedRow {
    /// Timestamp of the primary sample
    pub timestamp: i64,
    /// Primary vector
    pub primary: Vec3,
    /// Matched secondary sample, with its own timestamp
    pub secondary: Option<Sample>,
}

impl AlignedRow {
    /// Absolute distance to the matched secondary sample in nanoseconds.
    pub fn offset_nanos(&self) -> Option<u64> {
        self.secondary
            .map(|s| self.timestamp.abs_diff(s.timestamp))
    }

    pub fn is_matched(&self) -> bool {
        self.secondary.is_some()
    }
}

/// Malformed alignment input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlignError {
    #[error("invalid input: timestamp {0} is not finite")]
    NonFiniteTimestamp(f64),

    #[error("invalid input: timestamp {0} has a fractional nanosecond part")]
    FractionalTimestamp(f64),

    #[error("invalid input: timestamp {0} does not fit in 64-bit nanoseconds")]
    TimestampOutOfRange(f64),

    #[error("invalid input: tolerance must be non-negative, got {0} ns")]
    NegativeTolerance(i64),

    #[error("invalid input: tolerance must be non-negative, got {0} ms")]
    NegativeToleranceMillis(f64),

    #[error("invalid input: tolerance {0} is not finite")]
    NonFiniteTolerance(f64),
}
