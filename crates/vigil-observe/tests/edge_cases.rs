//! Edge case tests for vigil-observe
//!
//! Unsupported platforms, rejected options and callbacks that reach back
//! into the registry.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use vigil_dom::{DOMRect, Document, NodeId};
use vigil_observe::{
    HeadlessPlatform, LifecycleEvent, MutationObserverInit, Notification, ObserveError,
    ObserveOptions, ObserverRegistry, PageLifecycle, PlatformError, RegistryConfig,
    ScrollRevealOptions, WatcherCallback, WatcherConfig, WatcherKind, WebVitalsMonitor,
    responsive_resize, scroll_reveal,
};

fn noop() -> WatcherCallback {
    Rc::new(|_: Notification<'_>| {})
}

fn registry_on(platform: HeadlessPlatform) -> (ObserverRegistry, Rc<HeadlessPlatform>, PageLifecycle) {
    let platform = Rc::new(platform);
    let lifecycle = PageLifecycle::new();
    let registry = ObserverRegistry::new(platform.clone(), &lifecycle);
    (registry, platform, lifecycle)
}

#[test]
fn test_unsupported_kind_on_platform() {
    let (registry, _, _) = registry_on(HeadlessPlatform::new().without(WatcherKind::Size));

    let err = registry
        .create_watcher(WatcherKind::Size, WatcherConfig::default(), noop())
        .unwrap_err();
    assert!(matches!(
        err,
        ObserveError::PlatformConstruction {
            kind: WatcherKind::Size,
            source: PlatformError::NotSupported(WatcherKind::Size),
        }
    ));
    assert!(registry.is_empty());

    // Builders surface the same error
    assert!(responsive_resize(&registry, |_| {}).is_err());

    // A failed construction does not consume a sequence number
    let handle = registry.create_watcher(WatcherKind::Mutation, WatcherConfig::default(), noop()).unwrap();
    assert_eq!(handle.sequence(), 1);
}

#[test]
fn test_unsupported_kind_name() {
    let (registry, _, _) = registry_on(HeadlessPlatform::new());
    let err = registry
        .create_named_watcher("battery", WatcherConfig::default(), noop())
        .unwrap_err();
    assert_eq!(err, ObserveError::UnsupportedKind("battery".to_string()));

    let handle = registry
        .create_named_watcher("resize", WatcherConfig::default(), noop())
        .unwrap();
    assert_eq!(handle.kind(), WatcherKind::Size);
}

#[test]
fn test_invalid_visibility_config() {
    let (registry, _, _) = registry_on(HeadlessPlatform::new());

    let bad_margin = WatcherConfig::visibility("10em", 0.0);
    assert!(matches!(
        registry.create_watcher(WatcherKind::Visibility, bad_margin, noop()),
        Err(ObserveError::PlatformConstruction { source: PlatformError::InvalidOptions(_), .. })
    ));

    let bad_threshold = WatcherConfig::visibility("0px", 1.5);
    assert!(registry.create_watcher(WatcherKind::Visibility, bad_threshold, noop()).is_err());
    assert!(registry.is_empty());
}

#[test]
fn test_mutation_unobserve_keeps_target() {
    let (registry, _, _) = registry_on(HeadlessPlatform::new());
    let handle = registry.create_watcher(WatcherKind::Mutation, WatcherConfig::default(), noop()).unwrap();
    let target = NodeId::from_raw(2);

    let options = ObserveOptions::mutation(MutationObserverInit::dynamic_content());
    assert!(registry.observe_target(handle, Some(target), &options).unwrap());

    // Mutation watchers cannot drop a single target
    assert_eq!(registry.unobserve_target(handle, target), Ok(false));
    assert_eq!(registry.observed_targets(handle), Some(vec![target]));
    assert_eq!(registry.find_handle_by_target(target), Some(handle));
}

#[test]
fn test_mutation_options_that_observe_nothing() {
    let (registry, _, _) = registry_on(HeadlessPlatform::new());
    let handle = registry.create_watcher(WatcherKind::Mutation, WatcherConfig::default(), noop()).unwrap();
    let target = NodeId::from_raw(0);

    let empty = ObserveOptions::mutation(MutationObserverInit::default());
    assert_eq!(registry.observe_target(handle, Some(target), &empty), Ok(false));
    assert_eq!(registry.observed_targets(handle), Some(Vec::new()));
}

#[test]
fn test_reentrant_callback_disconnects_itself() {
    let (registry, platform, _) = registry_on(HeadlessPlatform::new());
    let target = NodeId::from_raw(1);
    let slot: Rc<Cell<Option<vigil_observe::WatcherHandle>>> = Rc::new(Cell::new(None));

    let weak = registry.downgrade();
    let own = Rc::clone(&slot);
    let callback: WatcherCallback = Rc::new(move |_: Notification<'_>| {
        if let (Some(registry), Some(handle)) = (weak.upgrade(), own.get()) {
            assert!(registry.disconnect_watcher(handle));
        }
    });

    let handle = registry.create_watcher(WatcherKind::Size, WatcherConfig::default(), callback).unwrap();
    slot.set(Some(handle));
    registry.observe_target(handle, Some(target), &ObserveOptions::default()).unwrap();

    let rects = HashMap::from([(target, DOMRect::from_xywh(0.0, 0.0, 300.0, 200.0))]);
    platform.update_layout(DOMRect::from_xywh(0.0, 0.0, 800.0, 600.0), &rects, 0.0);
    assert_eq!(platform.deliver(), 1);
    assert!(registry.is_empty());
}

#[test]
fn test_reentrant_callback_creates_watcher() {
    let (registry, platform, _) = registry_on(HeadlessPlatform::new());
    let created = Rc::new(RefCell::new(Vec::new()));

    let weak = registry.downgrade();
    let sink = Rc::clone(&created);
    let callback: WatcherCallback = Rc::new(move |_: Notification<'_>| {
        if let Some(registry) = weak.upgrade() {
            let handle = registry
                .create_watcher(WatcherKind::Mutation, WatcherConfig::default(), Rc::new(|_: Notification<'_>| {}))
                .unwrap();
            sink.borrow_mut().push(handle);
        }
    });

    let handle = registry.create_watcher(WatcherKind::PerformanceEntry, WatcherConfig::default(), callback).unwrap();
    registry.observe_target(handle, None, &ObserveOptions::entry_type("mark")).unwrap();

    platform.emit_performance(vigil_observe::PerformanceEntry::new("ready", "mark", 5.0, 0.0));
    assert_eq!(platform.deliver(), 1);
    assert_eq!(created.borrow().len(), 1);
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_unknown_entry_types_are_ignored() {
    let (registry, _, _) = registry_on(HeadlessPlatform::new());
    let handle = registry.create_watcher(WatcherKind::PerformanceEntry, WatcherConfig::default(), noop()).unwrap();

    assert_eq!(registry.observe_target(handle, None, &ObserveOptions::default()), Ok(false));
    assert!(registry.observe_target(handle, None, &ObserveOptions::entry_type("not-a-type")).unwrap());
}

#[test]
fn test_vitals_without_performance_support() {
    let (registry, _, _) = registry_on(HeadlessPlatform::new().without(WatcherKind::PerformanceEntry));
    let monitor = WebVitalsMonitor::install(&registry);
    assert!(monitor.handles().is_empty());
    assert_eq!(monitor.uninstall(), 0);
    assert!(registry.is_empty());
}

#[test]
fn test_custom_cost_model() {
    let platform = Rc::new(HeadlessPlatform::new());
    let lifecycle = PageLifecycle::new();
    let config = RegistryConfig::from_json(r#"{ "cost_model": { "per_watcher": 100 } }"#).unwrap();
    let registry = ObserverRegistry::with_config(platform, &lifecycle, config);

    let handle = registry.create_watcher(WatcherKind::Size, WatcherConfig::default(), noop()).unwrap();
    registry.observe_target(handle, Some(NodeId::from_raw(0)), &ObserveOptions::default()).unwrap();

    // per_target keeps its default of 128
    assert_eq!(registry.stats().memory.total_bytes, 228);
}

#[test]
fn test_teardown_after_registry_dropped() {
    let (registry, platform, lifecycle) = registry_on(HeadlessPlatform::new());
    registry.create_watcher(WatcherKind::Size, WatcherConfig::default(), noop()).unwrap();
    drop(registry);

    // Dropping the registry drops its watchers; the listeners stay harmless
    assert_eq!(platform.live_watchers(), 0);
    assert_eq!(lifecycle.dispatch(LifecycleEvent::BeforeUnload), 1);
}

#[test]
fn test_sequence_continues_after_teardown() {
    let (registry, _, lifecycle) = registry_on(HeadlessPlatform::new());
    registry.create_watcher(WatcherKind::Size, WatcherConfig::default(), noop()).unwrap();
    registry.create_watcher(WatcherKind::Size, WatcherConfig::default(), noop()).unwrap();

    lifecycle.dispatch(LifecycleEvent::BeforeUnload);
    assert!(registry.is_empty());

    let handle = registry.create_watcher(WatcherKind::Visibility, WatcherConfig::default(), noop()).unwrap();
    assert_eq!(handle.to_string(), "watcher_3_visibility");
}

#[test]
fn test_self_unobserve_on_shared_target() {
    let (registry, platform, _) = registry_on(HeadlessPlatform::new());
    let document = Rc::new(RefCell::new(Document::new("https://example.com/")));
    let card = document.borrow_mut().create_element("article");

    // The older mutation watcher is found first and cannot drop one target
    let mutation = registry.create_watcher(WatcherKind::Mutation, WatcherConfig::default(), noop()).unwrap();
    let options = ObserveOptions::mutation(MutationObserverInit::dynamic_content());
    assert!(registry.observe_target(mutation, Some(card), &options).unwrap());

    let reveal = scroll_reveal(&registry, Rc::clone(&document), &ScrollRevealOptions::default()).unwrap();
    assert!(registry.observe_target(reveal, Some(card), &ObserveOptions::default()).unwrap());

    let rects = HashMap::from([(card, DOMRect::from_xywh(0.0, 100.0, 600.0, 200.0))]);
    platform.update_layout(DOMRect::from_xywh(0.0, 0.0, 1280.0, 720.0), &rects, 0.0);
    assert_eq!(platform.deliver(), 1);

    assert_eq!(document.borrow().style(card, "opacity"), Some("1"));
    assert_eq!(registry.observed_targets(mutation), Some(vec![card]));
    assert_eq!(registry.observed_targets(reveal), Some(vec![card]));
}
