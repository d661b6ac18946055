//! Headless platform
//!
//! An in-process [`ObservationPlatform`] for hosts without a browser. The
//! host feeds it layout, mutations and performance entries, then calls
//! [`HeadlessPlatform::deliver`] to run the watcher callbacks.

mod intersection;
mod mutation;
mod performance;
mod resize;

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::{Rc, Weak};

use vigil_dom::{DOMRect, NodeId};

use crate::{
    MutationRecord, Notification, ObservationPlatform, PerformanceEntry, PlatformError,
    PlatformWatcher, WatcherCallback, WatcherConfig, WatcherKind,
};

use intersection::{IntersectionCore, IntersectionWatcher};
use mutation::{MutationCore, MutationWatcher};
use performance::{PerformanceCore, PerformanceWatcher};
use resize::{ResizeCore, ResizeWatcher};

pub use performance::{PerformanceTimeline, SUPPORTED_ENTRY_TYPES};

#[derive(Clone)]
enum Slot {
    Visibility(Weak<RefCell<IntersectionCore>>),
    Size(Weak<RefCell<ResizeCore>>),
    Mutation(Weak<RefCell<MutationCore>>),
    Performance(Weak<RefCell<PerformanceCore>>),
}

impl Slot {
    fn is_alive(&self) -> bool {
        match self {
            Slot::Visibility(w) => w.strong_count() > 0,
            Slot::Size(w) => w.strong_count() > 0,
            Slot::Mutation(w) => w.strong_count() > 0,
            Slot::Performance(w) => w.strong_count() > 0,
        }
    }
}

/// In-process observation platform
#[derive(Default)]
pub struct HeadlessPlatform {
    disabled: RefCell<BTreeSet<WatcherKind>>,
    slots: RefCell<Vec<Slot>>,
    timeline: Rc<RefCell<PerformanceTimeline>>,
}

impl HeadlessPlatform {
    /// Platform supporting every watcher kind
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform lacking `kind`
    pub fn without(self, kind: WatcherKind) -> Self {
        self.disable(kind);
        self
    }

    pub fn disable(&self, kind: WatcherKind) {
        self.disabled.borrow_mut().insert(kind);
    }

    pub fn enable(&self, kind: WatcherKind) {
        self.disabled.borrow_mut().remove(&kind);
    }

    /// Watchers constructed and not yet dropped
    pub fn live_watchers(&self) -> usize {
        self.slots.borrow().iter().filter(|s| s.is_alive()).count()
    }

    fn live_slots(&self) -> Vec<Slot> {
        let mut slots = self.slots.borrow_mut();
        slots.retain(Slot::is_alive);
        slots.clone()
    }

    /// Recompute intersections and sizes from a new layout
    pub fn update_layout(&self, viewport: DOMRect, element_rects: &HashMap<NodeId, DOMRect>, time: f64) {
        for slot in self.live_slots() {
            match slot {
                Slot::Visibility(w) => {
                    if let Some(core) = w.upgrade() {
                        core.borrow_mut().check_intersections(viewport, element_rects, time);
                    }
                }
                Slot::Size(w) => {
                    if let Some(core) = w.upgrade() {
                        core.borrow_mut().check_sizes(element_rects);
                    }
                }
                Slot::Mutation(_) | Slot::Performance(_) => {}
            }
        }
    }

    /// Report a DOM mutation to every mutation watcher
    pub fn record_mutation(&self, record: MutationRecord) {
        for slot in self.live_slots() {
            if let Slot::Mutation(w) = slot {
                if let Some(core) = w.upgrade() {
                    core.borrow_mut().record(&record);
                }
            }
        }
    }

    /// Add an entry to the timeline and offer it to performance watchers
    pub fn emit_performance(&self, entry: PerformanceEntry) {
        for slot in self.live_slots() {
            if let Slot::Performance(w) = slot {
                if let Some(core) = w.upgrade() {
                    core.borrow_mut().offer(&entry);
                }
            }
        }
        self.timeline.borrow_mut().push(entry);
    }

    pub fn timeline(&self) -> std::cell::Ref<'_, PerformanceTimeline> {
        self.timeline.borrow()
    }

    /// Run callbacks for everything queued, in watcher creation order.
    ///
    /// No internal borrow is held while a callback runs, so callbacks may
    /// re-enter the registry. Returns the number of callback invocations.
    pub fn deliver(&self) -> usize {
        let mut invoked = 0;

        for slot in self.live_slots() {
            match slot {
                Slot::Visibility(w) => {
                    let batch = w.upgrade().and_then(|core| core.borrow_mut().take_delivery());
                    if let Some((callback, entries)) = batch {
                        callback(Notification::Visibility(&entries));
                        invoked += 1;
                    }
                }
                Slot::Size(w) => {
                    let batch = w.upgrade().and_then(|core| core.borrow_mut().take_delivery());
                    if let Some((callback, entries)) = batch {
                        for entry in &entries {
                            callback(Notification::Size(entry));
                            invoked += 1;
                        }
                    }
                }
                Slot::Mutation(w) => {
                    let batch = w.upgrade().and_then(|core| core.borrow_mut().take_delivery());
                    if let Some((callback, records)) = batch {
                        callback(Notification::Mutation(&records));
                        invoked += 1;
                    }
                }
                Slot::Performance(w) => {
                    let batch = w.upgrade().and_then(|core| core.borrow_mut().take_delivery());
                    if let Some((callback, entries)) = batch {
                        callback(Notification::Performance(&entries));
                        invoked += 1;
                    }
                }
            }
        }

        invoked
    }
}

impl ObservationPlatform for HeadlessPlatform {
    fn supports(&self, kind: WatcherKind) -> bool {
        !self.disabled.borrow().contains(&kind)
    }

    fn construct(
        &self,
        kind: WatcherKind,
        config: &WatcherConfig,
        callback: WatcherCallback,
    ) -> Result<Box<dyn PlatformWatcher>, PlatformError> {
        if !self.supports(kind) {
            return Err(PlatformError::NotSupported(kind));
        }

        let (slot, watcher): (Slot, Box<dyn PlatformWatcher>) = match kind {
            WatcherKind::Visibility => {
                let core = Rc::new(RefCell::new(IntersectionCore::new(config, callback)?));
                (Slot::Visibility(Rc::downgrade(&core)), Box::new(IntersectionWatcher { core }))
            }
            WatcherKind::Size => {
                let core = Rc::new(RefCell::new(ResizeCore::new(callback)));
                (Slot::Size(Rc::downgrade(&core)), Box::new(ResizeWatcher { core }))
            }
            WatcherKind::Mutation => {
                let core = Rc::new(RefCell::new(MutationCore::new(callback)));
                (Slot::Mutation(Rc::downgrade(&core)), Box::new(MutationWatcher { core }))
            }
            WatcherKind::PerformanceEntry => {
                let core = Rc::new(RefCell::new(PerformanceCore::new(callback)));
                (
                    Slot::Performance(Rc::downgrade(&core)),
                    Box::new(PerformanceWatcher {
                        core,
                        timeline: Rc::clone(&self.timeline),
                    }),
                )
            }
        };

        self.slots.borrow_mut().push(slot);
        Ok(watcher)
    }
}

impl std::fmt::Debug for HeadlessPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessPlatform")
            .field("disabled", &self.disabled.borrow())
            .field("live_watchers", &self.live_watchers())
            .field("timeline", &self.timeline.borrow().len())
            .finish()
    }
}
