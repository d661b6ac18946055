//! Web vitals monitor
//!
//! Core Web Vitals collected through performance-entry watchers:
//! CLS, LCP, FID and FCP.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use crate::{
    Notification, ObserveOptions, ObserverRegistry, PerformanceEntry, Result,
    WatcherCallback, WatcherConfig, WatcherHandle, WatcherKind,
};

/// Collected metrics, in milliseconds except for CLS
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WebVitals {
    /// Cumulative layout shift
    pub cls: f64,
    pub cls_entries: usize,
    /// Largest contentful paint
    pub lcp: Option<f64>,
    /// First input delay
    pub fid: Option<f64>,
    /// First contentful paint
    pub fcp: Option<f64>,
}

type Metrics = Rc<RefCell<WebVitals>>;

fn record_layout_shift(metrics: &Metrics, entries: &[PerformanceEntry]) {
    let mut m = metrics.borrow_mut();
    for entry in entries.iter().filter(|e| !e.had_recent_input) {
        m.cls += entry.value;
        m.cls_entries += 1;
    }
}

fn record_lcp(metrics: &Metrics, entries: &[PerformanceEntry]) {
    if let Some(last) = entries.last() {
        metrics.borrow_mut().lcp = Some(last.start_time);
    }
}

fn record_fid(metrics: &Metrics, entries: &[PerformanceEntry]) {
    let mut m = metrics.borrow_mut();
    if m.fid.is_some() {
        return;
    }
    if let Some(first) = entries.first() {
        if let Some(processing_start) = first.processing_start {
            m.fid = Some(processing_start - first.start_time);
        }
    }
}

fn record_fcp(metrics: &Metrics, entries: &[PerformanceEntry]) {
    let mut m = metrics.borrow_mut();
    if m.fcp.is_some() {
        return;
    }
    if let Some(entry) = entries.iter().find(|e| e.name == "first-contentful-paint") {
        m.fcp = Some(entry.start_time);
    }
}

type Recorder = fn(&Metrics, &[PerformanceEntry]);

const MONITORS: [(&str, &str, Recorder); 4] = [
    ("CLS", "layout-shift", record_layout_shift),
    ("LCP", "largest-contentful-paint", record_lcp),
    ("FID", "first-input", record_fid),
    ("FCP", "paint", record_fcp),
];

/// Performance watchers feeding a [`WebVitals`] snapshot
pub struct WebVitalsMonitor {
    registry: ObserverRegistry,
    handles: Vec<WatcherHandle>,
    metrics: Metrics,
}

impl WebVitalsMonitor {
    /// Install one buffered watcher per metric.
    ///
    /// Metrics the platform cannot observe are logged and skipped.
    pub fn install(registry: &ObserverRegistry) -> Self {
        let metrics: Metrics = Rc::default();
        let mut handles = Vec::new();

        for (metric, entry_type, recorder) in MONITORS {
            match Self::watch(registry, &metrics, entry_type, recorder) {
                Ok(Some(handle)) => handles.push(handle),
                Ok(None) => tracing::info!("{} monitoring not supported", metric),
                Err(err) => tracing::info!("{} monitoring not supported: {}", metric, err),
            }
        }

        Self {
            registry: registry.clone(),
            handles,
            metrics,
        }
    }

    fn watch(
        registry: &ObserverRegistry,
        metrics: &Metrics,
        entry_type: &str,
        recorder: Recorder,
    ) -> Result<Option<WatcherHandle>> {
        let sink = Rc::clone(metrics);
        let callback: WatcherCallback = Rc::new(move |notification: Notification<'_>| {
            if let Notification::Performance(entries) = notification {
                recorder(&sink, entries);
            }
        });

        let handle = registry.create_watcher(WatcherKind::PerformanceEntry, WatcherConfig::default(), callback)?;
        let options = ObserveOptions::entry_type(entry_type).buffered(true);
        if registry.observe_target(handle, None, &options)? {
            Ok(Some(handle))
        } else {
            registry.disconnect_watcher(handle);
            Ok(None)
        }
    }

    pub fn metrics(&self) -> WebVitals {
        self.metrics.borrow().clone()
    }

    pub fn handles(&self) -> &[WatcherHandle] {
        &self.handles
    }

    /// Log the current snapshot
    pub fn log_metrics(&self) -> WebVitals {
        let metrics = self.metrics();
        tracing::info!(
            "Web vitals: CLS={:.3} LCP={:?} FID={:?} FCP={:?}",
            metrics.cls,
            metrics.lcp,
            metrics.fid,
            metrics.fcp
        );
        metrics
    }

    /// Disconnect every watcher the monitor installed
    pub fn uninstall(self) -> usize {
        self.handles
            .iter()
            .filter(|&&h| self.registry.disconnect_watcher(h))
            .count()
    }
}
