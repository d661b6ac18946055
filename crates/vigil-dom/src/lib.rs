//! Vigil DOM - Observation targets
//!
//! A small element arena standing in for the page the observers watch.
//! Elements carry a tag, attributes and inline style, which is all the
//! observer builders ever read or mutate.

mod dataset;
mod document;
mod geometry;

pub use dataset::DOMStringMap;
pub use document::{Document, Element};
pub use geometry::DOMRect;

use serde::{Deserialize, Serialize};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Build an id from its raw arena index
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Raw arena index
    pub fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// DOM error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
}
