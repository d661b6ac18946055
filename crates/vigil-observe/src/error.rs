//! Error types

use crate::{WatcherHandle, WatcherKind};

/// Registry error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ObserveError {
    #[error("Unsupported watcher kind: {0}")]
    UnsupportedKind(String),

    #[error("Failed to construct {kind} watcher: {source}")]
    PlatformConstruction {
        kind: WatcherKind,
        source: PlatformError,
    },

    #[error("Watcher {0} not found")]
    UnknownHandle(WatcherHandle),
}

/// Error reported by the platform observation API
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("{0} watchers are not available on this platform")]
    NotSupported(WatcherKind),

    #[error("Invalid observation target")]
    InvalidTarget,

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("{operation} is not supported by {kind} watchers")]
    UnsupportedOperation {
        kind: WatcherKind,
        operation: &'static str,
    },

    #[error("Watcher is disconnected")]
    Disconnected,

    #[error("Platform failure: {0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, ObserveError>;
