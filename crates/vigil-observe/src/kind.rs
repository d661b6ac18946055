//! Watcher kinds and handles

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::ObserveError;

/// The four kinds of platform watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatcherKind {
    /// Intersection with the viewport or a root element
    Visibility,
    /// Content box size changes
    Size,
    /// DOM tree changes
    Mutation,
    /// Timing and metrics entries
    #[serde(rename = "performance")]
    PerformanceEntry,
}

impl WatcherKind {
    pub const ALL: [WatcherKind; 4] = [
        WatcherKind::Visibility,
        WatcherKind::Size,
        WatcherKind::Mutation,
        WatcherKind::PerformanceEntry,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WatcherKind::Visibility => "visibility",
            WatcherKind::Size => "size",
            WatcherKind::Mutation => "mutation",
            WatcherKind::PerformanceEntry => "performance",
        }
    }

    /// Whether watchers of this kind observe elements rather than entry types
    pub fn observes_targets(self) -> bool {
        !matches!(self, WatcherKind::PerformanceEntry)
    }
}

impl fmt::Display for WatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatcherKind {
    type Err = ObserveError;

    /// Accepts the canonical names plus the platform constructor aliases
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "visibility" | "intersection" => Ok(WatcherKind::Visibility),
            "size" | "resize" => Ok(WatcherKind::Size),
            "mutation" => Ok(WatcherKind::Mutation),
            "performance" | "performance-entry" => Ok(WatcherKind::PerformanceEntry),
            _ => Err(ObserveError::UnsupportedKind(s.to_string())),
        }
    }
}

/// Opaque watcher identifier, rendered as `watcher_<sequence>_<kind>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatcherHandle {
    sequence: u64,
    kind: WatcherKind,
}

impl WatcherHandle {
    pub(crate) fn new(sequence: u64, kind: WatcherKind) -> Self {
        Self { sequence, kind }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn kind(&self) -> WatcherKind {
        self.kind
    }
}

impl fmt::Display for WatcherHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watcher_{}_{}", self.sequence, self.kind)
    }
}

impl Serialize for WatcherHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
