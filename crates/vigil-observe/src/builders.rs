//! Convenience builders
//!
//! Common page patterns expressed as a `create_watcher` call plus, where a
//! target is known up front, an `observe_target` call. None of them keep
//! state of their own.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use vigil_dom::{DOMStringMap, Document, NodeId};

use crate::{
    MutationObserverInit, MutationRecord, Notification, ObserveOptions, ObserverRegistry, Result,
    SizeEntry, VisibilityEntry, WatcherCallback, WatcherConfig, WatcherHandle, WatcherKind,
    WeakRegistry,
};

/// Document shared between the host and watcher callbacks
pub type SharedDocument = Rc<RefCell<Document>>;

/// Breakpoint reported when no minimum width is satisfied
pub const DEFAULT_BREAKPOINT: &str = "default";

/// Dataset key holding a lazy image's deferred source (`data-src`)
const DEFERRED_SOURCE_KEY: &str = "src";

/// Scroll reveal options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollRevealOptions {
    pub threshold: f64,
    pub root_margin: String,
}

impl Default for ScrollRevealOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: "0px 0px -50px 0px".to_string(),
        }
    }
}

/// Lazy load options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LazyLoadOptions {
    pub root_margin: String,
    pub threshold: f64,
}

impl Default for LazyLoadOptions {
    fn default() -> Self {
        Self {
            root_margin: "200px".to_string(),
            threshold: 0.1,
        }
    }
}

/// Stop watching `target` on whichever watcher currently observes it
fn release_target(registry: &WeakRegistry, target: NodeId) {
    let Some(registry) = registry.upgrade() else {
        return;
    };
    let Some(handle) = registry.find_handle_by_target(target) else {
        return;
    };
    match registry.unobserve_target(handle, target) {
        Ok(true) => {}
        Ok(false) => tracing::debug!("{} kept observing {} after it fired", handle, target),
        Err(err) => tracing::debug!("Releasing {} failed: {}", target, err),
    }
}

/// Visibility watcher that runs `on_visible` once per target as it scrolls in
fn one_shot_visibility<F>(
    registry: &ObserverRegistry,
    config: WatcherConfig,
    on_visible: F,
) -> Result<WatcherHandle>
where
    F: Fn(&VisibilityEntry) + 'static,
{
    let weak = registry.downgrade();
    let callback: WatcherCallback = Rc::new(move |notification: Notification<'_>| {
        let Notification::Visibility(entries) = notification else {
            return;
        };
        for entry in entries.iter().filter(|e| e.is_intersecting) {
            on_visible(entry);
            release_target(&weak, entry.target);
        }
    });
    registry.create_watcher(WatcherKind::Visibility, config, callback)
}

/// Reveal elements as they scroll into view.
///
/// Intersecting targets get `opacity: 1` and `transform: translateY(0)`
/// and are then unobserved.
pub fn scroll_reveal(
    registry: &ObserverRegistry,
    document: SharedDocument,
    options: &ScrollRevealOptions,
) -> Result<WatcherHandle> {
    let config = WatcherConfig::visibility(&options.root_margin, options.threshold);
    one_shot_visibility(registry, config, move |entry| {
        let mut document = document.borrow_mut();
        let revealed = document
            .set_style(entry.target, "opacity", "1")
            .and_then(|()| document.set_style(entry.target, "transform", "translateY(0)"));
        if let Err(err) = revealed {
            tracing::warn!("Scroll reveal skipped: {}", err);
        }
    })
}

/// Deferred source from the element's dataset
fn deferred_source(document: &Document, target: NodeId) -> Option<String> {
    document
        .dataset(target)?
        .get(DEFERRED_SOURCE_KEY)
        .map(str::to_string)
}

/// Swap `data-src` into `src` as images approach the viewport, then unobserve them
pub fn lazy_load(
    registry: &ObserverRegistry,
    document: SharedDocument,
    options: &LazyLoadOptions,
) -> Result<WatcherHandle> {
    let config = WatcherConfig::visibility(&options.root_margin, options.threshold);
    one_shot_visibility(registry, config, move |entry| {
        let mut document = document.borrow_mut();
        let Some(src) = deferred_source(&document, entry.target) else {
            return;
        };
        let deferred_attribute = DOMStringMap::to_attribute_name(DEFERRED_SOURCE_KEY);
        let promoted = document
            .set_attribute(entry.target, "src", &src)
            .and_then(|()| document.remove_attribute(entry.target, &deferred_attribute));
        match promoted {
            Ok(_) => tracing::debug!("Lazy loaded {} from {}", entry.target, src),
            Err(err) => tracing::warn!("Lazy load skipped: {}", err),
        }
    })
}

/// Name of the breakpoint with the highest minimum width not above `width`.
/// Among equal minimums the last one listed wins.
pub fn current_breakpoint(breakpoints: &[(String, f64)], width: f64) -> &str {
    breakpoints
        .iter()
        .filter(|(_, min_width)| *min_width <= width)
        .fold(None::<&(String, f64)>, |best, candidate| match best {
            Some(b) if b.1 > candidate.1 => Some(b),
            _ => Some(candidate),
        })
        .map(|(name, _)| name.as_str())
        .unwrap_or(DEFAULT_BREAKPOINT)
}

/// Watch `target` and report `(width, breakpoint, entry)` on every size change
pub fn responsive_breakpoints<F>(
    registry: &ObserverRegistry,
    target: NodeId,
    breakpoints: Vec<(String, f64)>,
    report: F,
) -> Result<WatcherHandle>
where
    F: Fn(f64, &str, &SizeEntry) + 'static,
{
    let callback: WatcherCallback = Rc::new(move |notification: Notification<'_>| {
        if let Notification::Size(entry) = notification {
            let width = entry.content_rect.width;
            report(width, current_breakpoint(&breakpoints, width), entry);
        }
    });

    let handle = registry.create_watcher(WatcherKind::Size, WatcherConfig::default(), callback)?;
    if !registry.observe_target(handle, Some(target), &ObserveOptions::default())? {
        tracing::warn!("Breakpoint watcher {} could not observe {}", handle, target);
    }
    Ok(handle)
}

/// Plain size watcher; the caller observes targets itself
pub fn responsive_resize<F>(registry: &ObserverRegistry, callback: F) -> Result<WatcherHandle>
where
    F: Fn(&SizeEntry) + 'static,
{
    let callback: WatcherCallback = Rc::new(move |notification: Notification<'_>| {
        if let Notification::Size(entry) = notification {
            callback(entry);
        }
    });
    registry.create_watcher(WatcherKind::Size, WatcherConfig::default(), callback)
}

/// Mutation watcher over dynamically inserted content under `target`
pub fn dynamic_content<F>(
    registry: &ObserverRegistry,
    target: NodeId,
    init: Option<MutationObserverInit>,
    callback: F,
) -> Result<WatcherHandle>
where
    F: Fn(&[MutationRecord]) + 'static,
{
    let callback: WatcherCallback = Rc::new(move |notification: Notification<'_>| {
        if let Notification::Mutation(records) = notification {
            callback(records);
        }
    });

    let handle = registry.create_watcher(WatcherKind::Mutation, WatcherConfig::default(), callback)?;
    let options = ObserveOptions::mutation(init.unwrap_or_else(MutationObserverInit::dynamic_content));
    if !registry.observe_target(handle, Some(target), &options)? {
        tracing::warn!("Dynamic content watcher {} could not observe {}", handle, target);
    }
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakpoints() -> Vec<(String, f64)> {
        vec![
            ("mobile".to_string(), 0.0),
            ("tablet".to_string(), 600.0),
            ("desktop".to_string(), 1024.0),
        ]
    }

    #[test]
    fn test_current_breakpoint() {
        let bp = breakpoints();
        assert_eq!(current_breakpoint(&bp, 800.0), "tablet");
        assert_eq!(current_breakpoint(&bp, 1200.0), "desktop");
        assert_eq!(current_breakpoint(&bp, 300.0), "mobile");
        assert_eq!(current_breakpoint(&bp, 600.0), "tablet");
    }

    #[test]
    fn test_breakpoint_order_independent() {
        let mut bp = breakpoints();
        bp.reverse();
        assert_eq!(current_breakpoint(&bp, 800.0), "tablet");
    }

    #[test]
    fn test_default_breakpoint() {
        let bp = vec![("wide".to_string(), 1440.0)];
        assert_eq!(current_breakpoint(&bp, 1000.0), DEFAULT_BREAKPOINT);
        assert_eq!(current_breakpoint(&[], 1000.0), DEFAULT_BREAKPOINT);
    }

    #[test]
    fn test_breakpoint_tie_takes_last() {
        let bp = vec![
            ("tablet".to_string(), 600.0),
            ("phablet".to_string(), 600.0),
            ("mobile".to_string(), 0.0),
        ];
        assert_eq!(current_breakpoint(&bp, 700.0), "phablet");
    }

    #[test]
    fn test_deferred_source_comes_from_dataset() {
        let mut document = Document::new("https://example.com/");
        let img = document.create_element("img");
        document.set_attribute(img, "src", "/placeholder.png").unwrap();
        assert_eq!(deferred_source(&document, img), None);

        document.set_attribute(img, "data-src", "/photos/2.jpg").unwrap();
        assert_eq!(deferred_source(&document, img), Some("/photos/2.jpg".to_string()));
        assert_eq!(deferred_source(&document, NodeId::from_raw(99)), None);
    }

    #[test]
    fn test_option_defaults() {
        assert_eq!(ScrollRevealOptions::default().root_margin, "0px 0px -50px 0px");
        assert_eq!(LazyLoadOptions::default().root_margin, "200px");
    }
}
