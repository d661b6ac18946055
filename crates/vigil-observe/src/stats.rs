//! Registry statistics and the memory estimate

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{WatcherHandle, WatcherKind};

/// Heuristic byte costs behind the memory estimate
///
/// The numbers are illustrative; only the additive shape is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    pub per_watcher: usize,
    pub per_target: usize,
    pub per_entry_type: usize,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            per_watcher: 1024,
            per_target: 128,
            per_entry_type: 64,
        }
    }
}

impl CostModel {
    pub fn watcher_cost(&self, targets: usize, entry_types: usize) -> usize {
        self.per_watcher + targets * self.per_target + entry_types * self.per_entry_type
    }
}

/// Estimated memory held by live watchers. For display only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemoryEstimate {
    pub total_bytes: usize,
    pub by_kind: BTreeMap<WatcherKind, usize>,
}

impl MemoryEstimate {
    /// Total in kilobytes with two decimals, e.g. `"1.25 KB"`
    pub fn display(&self) -> String {
        format!("{:.2} KB", self.total_bytes as f64 / 1024.0)
    }
}

/// Snapshot returned by [`ObserverRegistry::stats`](crate::ObserverRegistry::stats)
///
/// `by_kind` always lists all four kinds, including those with no watchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub by_kind: BTreeMap<WatcherKind, usize>,
    pub memory: MemoryEstimate,
}

impl RegistryStats {
    pub fn count(&self, kind: WatcherKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Read-only view of one live watcher
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatcherInfo {
    pub handle: WatcherHandle,
    pub kind: WatcherKind,
    pub created_at_ms: u64,
    pub target_count: usize,
    pub entry_types: Vec<String>,
}
