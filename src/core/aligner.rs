//! Nearest-timestamp left join of two sensor sequences.
//!
//! Every primary sample produces exactly one output row. The secondary sample
//! closest in time is attached when it lies within the tolerance; otherwise
//! the row carries no secondary data at all.
//!
//! Both inputs are sorted first, then a single forward scan keeps two cursors
//! into the secondary sequence:
//!
//! - `low`: first sample with `ts >= primary_ts - tolerance`
//! - `next`: first sample with `ts >= primary_ts`
//!
//! Both only move forward as primary timestamps increase, so the join is
//! O(n + m) after sorting. The candidates for a primary sample are
//! `next - 1` (the latest sample before it, if not already behind `low`) and
//! `next` (if not beyond `primary_ts + tolerance`). Equidistant candidates
//! resolve to the earlier one. When several secondary samples share the
//! winning timestamp, the forward candidate is the first of them in sorted
//! order and the backward candidate the last.

use crate::core::sample::{AlignedRow, Sample, Tolerance};
use tracing::debug;

/// Align `secondary` onto `primary` by nearest timestamp within `tolerance`.
///
/// Inputs are taken by value and sorted in place; the returned rows follow
/// the sorted primary order. Secondary samples are never consumed, so one
/// secondary sample may be the match for several primary samples.
pub fn align(
    mut primary: Vec<Sample>,
    mut secondary: Vec<Sample>,
    tolerance: Tolerance,
) -> Vec<AlignedRow> {
    sort_by_timestamp(&mut primary);
    sort_by_timestamp(&mut secondary);

    let rows = align_sorted(&primary, &secondary, tolerance);
    log_result(&rows, secondary.len(), tolerance);
    rows
}

/// Same result as [`align`], with sorting and the scan spread over the rayon
/// thread pool.
#[cfg(feature = "parallel")]
pub fn align_par(
    mut primary: Vec<Sample>,
    mut secondary: Vec<Sample>,
    tolerance: Tolerance,
) -> Vec<AlignedRow> {
    use rayon::prelude::*;

    /// Primary samples per scan chunk.
    const CHUNK_LEN: usize = 64 * 1024;

    rayon::join(
        || primary.par_sort_by_key(|s| s.timestamp),
        || secondary.par_sort_by_key(|s| s.timestamp),
    );

    let rows: Vec<AlignedRow> = primary
        .par_chunks(CHUNK_LEN)
        .flat_map_iter(|chunk| align_sorted(chunk, &secondary, tolerance))
        .collect();

    log_result(&rows, secondary.len(), tolerance);
    rows
}

/// Stable, so duplicated timestamps keep their input order.
fn sort_by_timestamp(samples: &mut [Sample]) {
    samples.sort_by_key(|s| s.timestamp);
}

/// Scan already sorted inputs.
///
/// `primary` may be any contiguous slice of a sorted sequence: the first
/// cursor position is found by binary search, which lets chunks of one
/// primary sequence be scanned independently.
fn align_sorted(primary: &[Sample], secondary: &[Sample], tolerance: Tolerance) -> Vec<AlignedRow> {
    let tol = tolerance.as_nanos();
    let mut rows = Vec::with_capacity(primary.len());

    let mut low = match primary.first() {
        Some(first) => {
            let lower = first.timestamp.saturating_sub_unsigned(tol);
            secondary.partition_point(|s| s.timestamp < lower)
        }
        None => return rows,
    };
    let mut next = low;

    for p in primary {
        let lower = p.timestamp.saturating_sub_unsigned(tol);
        while low < secondary.len() && secondary[low].timestamp < lower {
            low += 1;
        }
        next = next.max(low);
        while next < secondary.len() && secondary[next].timestamp < p.timestamp {
            next += 1;
        }

        // Everything in low..next lies in [ts - tol, ts).
        let before = (next > low).then(|| secondary[next - 1]);
        let after = secondary
            .get(next)
            .copied()
            .filter(|s| s.timestamp.abs_diff(p.timestamp) <= tol);

        rows.push(AlignedRow {
            timestamp: p.timestamp,
            primary: p.value,
            secondary: nearest(p.timestamp, before, after),
        });
    }

    rows
}

/// Pick the closer candidate; ties go to `before`.
fn nearest(ts: i64, before: Option<Sample>, after: Option<Sample>) -> Option<Sample> {
    match (before, after) {
        (Some(b), Some(a)) => {
            if b.timestamp.abs_diff(ts) <= a.timestamp.abs_diff(ts) {
                Some(b)
            } else {
                Some(a)
            }
        }
        (b, a) => b.or(a),
    }
}

fn log_result(rows: &[AlignedRow], secondary_len: usize, tolerance: Tolerance) {
    debug!(
        primary = rows.len(),
        secondary = secondary_len,
        matched = rows.iter().filter(|r| r.is_matched()).count(),
        tolerance_ns = tolerance.as_nanos(),
        "aligned sequences"
    );
}
