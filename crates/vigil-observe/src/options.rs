//! Watcher and observation options

use serde::{Deserialize, Serialize};
use vigil_dom::NodeId;

/// Construction options, fixed for the lifetime of a watcher
///
/// Only visibility watchers take construction options; the other kinds
/// ignore them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Root element (None = viewport)
    pub root: Option<NodeId>,
    /// CSS margin around the root, e.g. `"0px 0px -50px 0px"`
    pub root_margin: String,
    /// Ratios at which the callback fires
    pub threshold: Vec<f64>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            root: None,
            root_margin: "0px".to_string(),
            threshold: vec![0.0],
        }
    }
}

impl WatcherConfig {
    pub fn visibility(root_margin: &str, threshold: f64) -> Self {
        Self {
            root: None,
            root_margin: root_margin.to_string(),
            threshold: vec![threshold],
        }
    }
}

/// Mutation observer options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: bool,
    pub character_data: bool,
    pub subtree: bool,
    pub attribute_old_value: bool,
    pub character_data_old_value: bool,
    pub attribute_filter: Option<Vec<String>>,
}

impl MutationObserverInit {
    /// `{ childList: true, subtree: true }`
    pub fn dynamic_content() -> Self {
        Self {
            child_list: true,
            subtree: true,
            ..Default::default()
        }
    }
}

/// Per-observation options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserveOptions {
    pub mutation: MutationObserverInit,
    /// Single performance entry type; wins over `entry_types`
    pub entry_type: Option<String>,
    pub entry_types: Vec<String>,
    /// Replay entries recorded before the subscription
    pub buffered: bool,
}

impl ObserveOptions {
    pub fn entry_type(entry_type: &str) -> Self {
        Self {
            entry_type: Some(entry_type.to_string()),
            ..Default::default()
        }
    }

    pub fn entry_types<I, S>(entry_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entry_types: entry_types.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn mutation(init: MutationObserverInit) -> Self {
        Self {
            mutation: init,
            ..Default::default()
        }
    }

    pub fn buffered(mut self, buffered: bool) -> Self {
        self.buffered = buffered;
        self
    }

    /// Entry types this observation subscribes to
    pub fn subscribed_entry_types(&self) -> Vec<String> {
        match &self.entry_type {
            Some(entry_type) => vec![entry_type.clone()],
            None => self.entry_types.clone(),
        }
    }

    /// Options for one entry type, as issued per platform observe call
    pub(crate) fn for_entry_type(&self, entry_type: &str) -> Self {
        Self {
            entry_type: Some(entry_type.to_string()),
            entry_types: Vec::new(),
            ..self.clone()
        }
    }
}
