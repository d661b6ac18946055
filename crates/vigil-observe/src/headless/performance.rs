//! Headless performance timeline and watcher

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use vigil_dom::NodeId;

use crate::{
    ObserveOptions, PerformanceEntry, PlatformError, PlatformWatcher, WatcherCallback, WatcherKind,
};

/// Entry types the timeline records
pub const SUPPORTED_ENTRY_TYPES: &[&str] = &[
    "event",
    "first-input",
    "largest-contentful-paint",
    "layout-shift",
    "longtask",
    "mark",
    "measure",
    "navigation",
    "paint",
    "resource",
];

const BUFFER_LIMIT: usize = 250;

/// Recorded entries, replayed to `buffered` observations
#[derive(Debug, Default)]
pub struct PerformanceTimeline {
    entries: Vec<PerformanceEntry>,
}

impl PerformanceTimeline {
    pub(crate) fn push(&mut self, entry: PerformanceEntry) {
        self.entries.push(entry);

        // Limit buffer size
        if self.entries.len() > BUFFER_LIMIT {
            self.entries.remove(0);
        }
    }

    pub fn entries_by_type(&self, entry_type: &str) -> Vec<PerformanceEntry> {
        self.entries
            .iter()
            .filter(|e| e.entry_type == entry_type)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(crate) struct PerformanceCore {
    callback: WatcherCallback,
    entry_types: BTreeSet<String>,
    pending: Vec<PerformanceEntry>,
    connected: bool,
}

impl PerformanceCore {
    pub(crate) fn new(callback: WatcherCallback) -> Self {
        Self {
            callback,
            entry_types: BTreeSet::new(),
            pending: Vec::new(),
            connected: true,
        }
    }

    pub(crate) fn offer(&mut self, entry: &PerformanceEntry) {
        if self.connected && self.entry_types.contains(&entry.entry_type) {
            self.pending.push(entry.clone());
        }
    }

    pub(crate) fn take_delivery(&mut self) -> Option<(WatcherCallback, Vec<PerformanceEntry>)> {
        if !self.connected || self.pending.is_empty() {
            return None;
        }
        Some((Rc::clone(&self.callback), std::mem::take(&mut self.pending)))
    }
}

pub(crate) struct PerformanceWatcher {
    pub(crate) core: Rc<RefCell<PerformanceCore>>,
    pub(crate) timeline: Rc<RefCell<PerformanceTimeline>>,
}

impl PlatformWatcher for PerformanceWatcher {
    fn observe(&mut self, _target: Option<NodeId>, options: &ObserveOptions) -> Result<(), PlatformError> {
        let entry_types = options.subscribed_entry_types();
        if entry_types.is_empty() {
            return Err(PlatformError::InvalidOptions("an entry type is required".into()));
        }

        let mut core = self.core.borrow_mut();
        if !core.connected {
            return Err(PlatformError::Disconnected);
        }

        for entry_type in entry_types {
            if !SUPPORTED_ENTRY_TYPES.contains(&entry_type.as_str()) {
                tracing::warn!("Ignoring unsupported entry type '{}'", entry_type);
                continue;
            }
            if options.buffered {
                let replay = self.timeline.borrow().entries_by_type(&entry_type);
                core.pending.extend(replay);
            }
            core.entry_types.insert(entry_type);
        }
        Ok(())
    }

    fn unobserve(&mut self, _target: NodeId) -> Result<(), PlatformError> {
        Err(PlatformError::UnsupportedOperation {
            kind: WatcherKind::PerformanceEntry,
            operation: "unobserve",
        })
    }

    fn disconnect(&mut self) -> Result<(), PlatformError> {
        let mut core = self.core.borrow_mut();
        core.entry_types.clear();
        core.pending.clear();
        core.connected = false;
        Ok(())
    }

    fn take_records(&mut self) -> Result<usize, PlatformError> {
        Ok(std::mem::take(&mut self.core.borrow_mut().pending).len())
    }
}
