//! Notification payloads
//!
//! The records a platform hands to watcher callbacks, one family per
//! [`WatcherKind`](crate::WatcherKind).

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use vigil_dom::{DOMRect, NodeId};

use crate::WatcherKind;

/// Visibility (intersection) entry
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityEntry {
    pub target: NodeId,
    pub bounding_client_rect: DOMRect,
    pub intersection_rect: DOMRect,
    pub root_bounds: Option<DOMRect>,
    pub intersection_ratio: f64,
    pub is_intersecting: bool,
    pub time: f64,
}

/// Observed element size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeObserverSize {
    pub inline_size: f64,
    pub block_size: f64,
}

/// Size (resize) entry
#[derive(Debug, Clone, PartialEq)]
pub struct SizeEntry {
    pub target: NodeId,
    pub content_rect: DOMRect,
    pub content_box_size: Vec<ResizeObserverSize>,
    pub border_box_size: Vec<ResizeObserverSize>,
}

/// Mutation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationType {
    Attributes,
    CharacterData,
    ChildList,
}

/// Mutation record
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    pub fn attribute(target: NodeId, name: &str, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: Some(name.to_string()),
            old_value,
        }
    }

    pub fn child_list(target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes: added,
            removed_nodes: removed,
            attribute_name: None,
            old_value: None,
        }
    }

    pub fn character_data(target: NodeId, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::CharacterData,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: None,
            old_value,
        }
    }
}

/// Performance timeline entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceEntry {
    pub name: String,
    pub entry_type: String,
    pub start_time: f64,
    pub duration: f64,
    /// Shift score for `layout-shift` entries
    pub value: f64,
    pub had_recent_input: bool,
    /// Handler start for `first-input` entries
    pub processing_start: Option<f64>,
}

impl PerformanceEntry {
    pub fn new(name: &str, entry_type: &str, start_time: f64, duration: f64) -> Self {
        Self {
            name: name.to_string(),
            entry_type: entry_type.to_string(),
            start_time,
            duration,
            ..Default::default()
        }
    }

    pub fn paint(name: &str, start_time: f64) -> Self {
        Self::new(name, "paint", start_time, 0.0)
    }

    pub fn layout_shift(value: f64, had_recent_input: bool, start_time: f64) -> Self {
        Self {
            value,
            had_recent_input,
            ..Self::new("", "layout-shift", start_time, 0.0)
        }
    }

    pub fn largest_contentful_paint(start_time: f64) -> Self {
        Self::new("", "largest-contentful-paint", start_time, 0.0)
    }

    pub fn first_input(name: &str, start_time: f64, processing_start: f64) -> Self {
        Self {
            processing_start: Some(processing_start),
            ..Self::new(name, "first-input", start_time, 0.0)
        }
    }
}

/// What a platform delivers to a watcher callback
#[derive(Debug, Clone, Copy)]
pub enum Notification<'a> {
    Visibility(&'a [VisibilityEntry]),
    /// Size watchers are called once per changed element
    Size(&'a SizeEntry),
    Mutation(&'a [MutationRecord]),
    Performance(&'a [PerformanceEntry]),
}

impl Notification<'_> {
    pub fn kind(&self) -> WatcherKind {
        match self {
            Notification::Visibility(_) => WatcherKind::Visibility,
            Notification::Size(_) => WatcherKind::Size,
            Notification::Mutation(_) => WatcherKind::Mutation,
            Notification::Performance(_) => WatcherKind::PerformanceEntry,
        }
    }
}

/// Caller-owned callback; watcher records only keep a reference to it
pub type WatcherCallback = Rc<dyn Fn(Notification<'_>)>;
