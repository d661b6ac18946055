//! Vigil Observe - Observer lifecycle registry
//!
//! Creates, tracks and tears down platform watchers (visibility, size,
//! mutation and performance-entry) so none of them leak and their combined
//! cost stays inspectable.
//!
//! # Modules
//! - [`ObserverRegistry`] owns every watcher and reacts to page teardown
//! - [`ObservationPlatform`] is the host API the registry drives
//! - [`builders`] wraps common page patterns (scroll reveal, lazy load, breakpoints)
//! - [`headless`] is an in-process platform for hosts without a browser
//! - [`WebVitalsMonitor`] collects Core Web Vitals through the registry

mod config;
mod entries;
mod error;
mod kind;
mod lifecycle;
mod options;
mod platform;
mod registry;
mod stats;
mod vitals;

pub mod builders;
pub mod headless;

pub use config::RegistryConfig;
pub use entries::{
    MutationRecord, MutationType, Notification, PerformanceEntry, ResizeObserverSize, SizeEntry,
    VisibilityEntry, WatcherCallback,
};
pub use error::{ObserveError, PlatformError, Result};
pub use kind::{WatcherHandle, WatcherKind};
pub use lifecycle::{LifecycleEvent, PageLifecycle, VisibilityState};
pub use options::{MutationObserverInit, ObserveOptions, WatcherConfig};
pub use platform::{ObservationPlatform, PlatformWatcher, SupportMatrix, support_matrix};
pub use registry::{ObserverRegistry, WeakRegistry};
pub use stats::{CostModel, MemoryEstimate, RegistryStats, WatcherInfo};
pub use vitals::{WebVitals, WebVitalsMonitor};

pub use builders::{
    LazyLoadOptions, ScrollRevealOptions, SharedDocument, dynamic_content, lazy_load,
    responsive_breakpoints, responsive_resize, scroll_reveal,
};
pub use headless::HeadlessPlatform;
