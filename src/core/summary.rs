//! Match statistics over an aligned sequence.

use crate::core::sample::AlignedRow;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// How well the secondary stream covered the primary one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlignmentSummary {
    /// Output rows (always the primary length)
    pub rows: usize,
    /// Rows with a secondary match
    pub matched: usize,
    /// Mean absolute offset of matched rows in nanoseconds
    pub mean_offset_ns: Option<f64>,
    /// Standard deviation of the absolute offset (needs two matches)
    pub std_offset_ns: Option<f64>,
    /// Largest absolute offset of a matched row
    pub max_offset_ns: Option<u64>,
}

impl AlignmentSummary {
    pub fn from_rows(rows: &[AlignedRow]) -> Self {
        let offsets: Vec<u64> = rows.iter().filter_map(AlignedRow::offset_nanos).collect();
        let as_f64: Vec<f64> = offsets.iter().map(|&o| o as f64).collect();

        let finite = |v: f64| v.is_finite().then_some(v);

        Self {
            rows: rows.len(),
            matched: offsets.len(),
            mean_offset_ns: if as_f64.is_empty() {
                None
            } else {
                finite(as_f64.iter().mean())
            },
            std_offset_ns: if as_f64.len() < 2 {
                None
            } else {
                finite(as_f64.iter().std_dev())
            },
            max_offset_ns: offsets.iter().copied().max(),
        }
    }

    /// Fraction of rows that found a match, 0 for an empty sequence.
    pub fn match_rate(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.matched as f64 / self.rows as f64
        }
    }

    pub fn unmatched(&self) -> usize {
        self.rows - self.matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sample::{Sample, Vec3};

    fn row(ts: i64, matched_at: Option<i64>) -> AlignedRow {
        AlignedRow {
            timestamp: ts,
            primary: Vec3::default(),
            secondary: matched_at.map(|m| Sample::new(m, Vec3::default())),
        }
    }

    #[test]
    fn test_summary_statistics() {
        let rows = vec![row(0, Some(2)), row(10, Some(6)), row(20, None), row(30, Some(30))];

        let summary = AlignmentSummary::from_rows(&rows);

        assert_eq!(summary.rows, 4);
        assert_eq!(summary.matched, 3);
        assert_eq!(summary.unmatched(), 1);
        assert!((summary.match_rate() - 0.75).abs() < 1e-12);
        assert!((summary.mean_offset_ns.unwrap() - 2.0).abs() < 1e-12);
        // Offsets 2, 4, 0: sample standard deviation is 2.
        assert!((summary.std_offset_ns.unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(summary.max_offset_ns, Some(4));
    }

    #[test]
    fn test_summary_without_matches() {
        let summary = AlignmentSummary::from_rows(&[row(0, None)]);
        assert_eq!(summary.matched, 0);
        assert_eq!(summary.mean_offset_ns, None);
        assert_eq!(summary.std_offset_ns, None);
        assert_eq!(summary.max_offset_ns, None);

        let empty = AlignmentSummary::from_rows(&[]);
        assert_eq!(empty.match_rate(), 0.0);
    }
}
