//! Vigil demo
//!
//! Drives a headless page through a scroll: gallery images lazy load,
//! sections reveal, the hero reports its breakpoint, and web vitals are
//! collected. Set `RUST_LOG=debug` for the registry's own logging.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing_subscriber::EnvFilter;
use vigil_dom::{DOMRect, Document};
use vigil_observe::{
    HeadlessPlatform, LazyLoadOptions, LifecycleEvent, MutationRecord, ObserveOptions,
    ObserverRegistry, PageLifecycle, PerformanceEntry, RegistryConfig, ScrollRevealOptions,
    WebVitalsMonitor, builders,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let platform = Rc::new(HeadlessPlatform::new());
    let lifecycle = PageLifecycle::new();
    let registry = ObserverRegistry::with_config(platform.clone(), &lifecycle, RegistryConfig::default());

    let document = Rc::new(RefCell::new(Document::new("https://ctv.example/")));
    let (hero, services, gallery, images) = {
        let mut doc = document.borrow_mut();
        let hero = doc.create_element("header");
        let services = doc.create_element("section");
        let gallery = doc.create_element("div");
        let images: Vec<_> = (0..3)
            .map(|i| {
                let img = doc.create_element("img");
                doc.set_attribute(img, "data-src", &format!("/gallery/weld-{}.jpg", i))
                    .map(|()| img)
            })
            .collect::<Result<_, _>>()?;
        (hero, services, gallery, images)
    };

    let vitals = WebVitalsMonitor::install(&registry);

    let reveal = builders::scroll_reveal(&registry, Rc::clone(&document), &ScrollRevealOptions::default())?;
    registry.observe_target(reveal, Some(services), &ObserveOptions::default())?;

    let lazy = builders::lazy_load(&registry, Rc::clone(&document), &LazyLoadOptions::default())?;
    for &img in &images {
        registry.observe_target(lazy, Some(img), &ObserveOptions::default())?;
    }

    let breakpoints = vec![
        ("mobile".to_string(), 0.0),
        ("tablet".to_string(), 600.0),
        ("desktop".to_string(), 1024.0),
    ];
    builders::responsive_breakpoints(&registry, hero, breakpoints, |width, breakpoint, _| {
        tracing::info!("Hero is {}px wide ({})", width, breakpoint);
    })?;

    builders::dynamic_content(&registry, gallery, None, |records| {
        tracing::info!("Gallery changed: {} records", records.len());
    })?;

    tracing::info!("Stats after setup: {}", registry.stats().to_json()?);

    // Initial paint with the page scrolled to the top
    platform.emit_performance(PerformanceEntry::paint("first-contentful-paint", 180.0));
    platform.emit_performance(PerformanceEntry::largest_contentful_paint(420.0));
    let viewport = DOMRect::from_xywh(0.0, 0.0, 1280.0, 720.0);
    let mut rects = HashMap::from([
        (hero, DOMRect::from_xywh(0.0, 0.0, 1280.0, 500.0)),
        (services, DOMRect::from_xywh(0.0, 900.0, 1280.0, 600.0)),
        (images[0], DOMRect::from_xywh(0.0, 1600.0, 400.0, 300.0)),
        (images[1], DOMRect::from_xywh(420.0, 1600.0, 400.0, 300.0)),
        (images[2], DOMRect::from_xywh(0.0, 2600.0, 400.0, 300.0)),
    ]);
    platform.update_layout(viewport, &rects, 500.0);
    platform.deliver();

    // Scroll down by 1000px
    for rect in rects.values_mut() {
        rect.y -= 1000.0;
    }
    platform.update_layout(viewport, &rects, 1500.0);
    platform.emit_performance(PerformanceEntry::layout_shift(0.02, false, 1500.0));
    platform.emit_performance(PerformanceEntry::first_input("click", 1600.0, 1614.0));
    platform.record_mutation(MutationRecord::child_list(gallery, images.clone(), Vec::new()));
    platform.deliver();

    {
        let doc = document.borrow();
        tracing::info!("Services opacity: {:?}", doc.style(services, "opacity"));
        for &img in &images {
            tracing::info!("{} src: {:?}", img, doc.get_attribute(img, "src"));
        }
    }

    vitals.log_metrics();
    let stats = registry.stats();
    tracing::info!("{} watchers live, estimated {}", stats.total, stats.memory.display());

    lifecycle.dispatch(LifecycleEvent::PageHide);
    tracing::info!("Watchers after pagehide: {}", registry.len());
    Ok(())
}
