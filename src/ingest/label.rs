//! Activity labels inferred from recording names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Activity performed during a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Walking,
    Standing,
    Jumping,
    Still,
    Unknown,
}

impl Activity {
    /// Recognised labels, in matching priority order.
    pub const KNOWN: [Activity; 4] = [
        Activity::Walking,
        Activity::Standing,
        Activity::Jumping,
        Activity::Still,
    ];

    /// Infer the activity from a file stem such as `Walking_2024-03-01`.
    ///
    /// The first known label contained in the name (case-insensitive) wins.
    pub fn infer_from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        Self::KNOWN
            .into_iter()
            .find(|a| lower.contains(a.as_str()))
            .unwrap_or(Activity::Unknown)
    }

    /// Parse a label given explicitly, e.g. on the command line.
    ///
    /// Accepts anything [`infer_from_name`](Self::infer_from_name) recognises
    /// plus `unknown` itself. `None` means the label matched nothing.
    pub fn from_label(label: &str) -> Option<Self> {
        if label.trim().eq_ignore_ascii_case(Activity::Unknown.as_str()) {
            return Some(Activity::Unknown);
        }
        match Self::infer_from_name(label) {
            Activity::Unknown => None,
            activity => Some(activity),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::Walking => "walking",
            Activity::Standing => "standing",
            Activity::Jumping => "jumping",
            Activity::Still => "still",
            Activity::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
