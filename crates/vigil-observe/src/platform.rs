//! Platform observation API
//!
//! The registry never observes anything itself. It asks an
//! [`ObservationPlatform`] for watchers and drives them through
//! [`PlatformWatcher`].

use serde::Serialize;
use vigil_dom::NodeId;

use crate::{ObserveOptions, PlatformError, WatcherCallback, WatcherConfig, WatcherKind};

/// A live platform watcher
pub trait PlatformWatcher {
    /// Start observing. Performance watchers ignore `target` and read the
    /// entry type from `options`.
    fn observe(&mut self, target: Option<NodeId>, options: &ObserveOptions) -> Result<(), PlatformError>;

    /// Stop observing one target
    fn unobserve(&mut self, target: NodeId) -> Result<(), PlatformError>;

    /// Stop observing everything and release delivery resources
    fn disconnect(&mut self) -> Result<(), PlatformError>;

    /// Drain records queued but not yet delivered, returning how many were taken
    fn take_records(&mut self) -> Result<usize, PlatformError>;
}

/// Host environment capable of constructing watchers
pub trait ObservationPlatform {
    /// Whether the host exposes this kind of watcher
    fn supports(&self, kind: WatcherKind) -> bool;

    /// Construct a watcher of `kind` that reports through `callback`
    fn construct(
        &self,
        kind: WatcherKind,
        config: &WatcherConfig,
        callback: WatcherCallback,
    ) -> Result<Box<dyn PlatformWatcher>, PlatformError>;
}

/// Which watcher kinds a platform exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupportMatrix {
    pub visibility: bool,
    pub size: bool,
    pub mutation: bool,
    pub performance: bool,
}

impl SupportMatrix {
    pub fn supports(&self, kind: WatcherKind) -> bool {
        match kind {
            WatcherKind::Visibility => self.visibility,
            WatcherKind::Size => self.size,
            WatcherKind::Mutation => self.mutation,
            WatcherKind::PerformanceEntry => self.performance,
        }
    }
}

/// Capability query for callers that want to branch before creating a watcher
pub fn support_matrix(platform: &dyn ObservationPlatform) -> SupportMatrix {
    SupportMatrix {
        visibility: platform.supports(WatcherKind::Visibility),
        size: platform.supports(WatcherKind::Size),
        mutation: platform.supports(WatcherKind::Mutation),
        performance: platform.supports(WatcherKind::PerformanceEntry),
    }
}
