//! Headless visibility watcher
//!
//! Intersection against the viewport (or a root element), grown or shrunk
//! by the root margin.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use vigil_dom::{DOMRect, NodeId};

use crate::{
    ObserveOptions, PlatformError, PlatformWatcher, VisibilityEntry, WatcherCallback, WatcherConfig,
};

/// One side of a root margin
#[derive(Debug, Clone, Copy, PartialEq)]
enum MarginValue {
    Px(f64),
    Percent(f64),
}

impl MarginValue {
    fn parse(token: &str) -> Option<Self> {
        if let Some(px) = token.strip_suffix("px") {
            px.parse().ok().map(MarginValue::Px)
        } else if let Some(pct) = token.strip_suffix('%') {
            pct.parse().ok().map(MarginValue::Percent)
        } else if token == "0" {
            Some(MarginValue::Px(0.0))
        } else {
            None
        }
    }

    fn resolve(self, basis: f64) -> f64 {
        match self {
            MarginValue::Px(px) => px,
            MarginValue::Percent(pct) => basis * pct / 100.0,
        }
    }
}

/// CSS-style margin: top, right, bottom, left
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RootMargin([MarginValue; 4]);

impl RootMargin {
    /// Parse 1-4 space separated `px`/`%` values with CSS shorthand rules
    pub(crate) fn parse(s: &str) -> Result<Self, PlatformError> {
        let values = s
            .split_whitespace()
            .map(MarginValue::parse)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| PlatformError::InvalidOptions(format!("root margin '{}'", s)))?;

        let sides = match values.as_slice() {
            [] => [MarginValue::Px(0.0); 4],
            [all] => [*all; 4],
            [v, h] => [*v, *h, *v, *h],
            [t, h, b] => [*t, *h, *b, *h],
            [t, r, b, l] => [*t, *r, *b, *l],
            _ => return Err(PlatformError::InvalidOptions(format!("root margin '{}'", s))),
        };
        Ok(Self(sides))
    }

    fn apply(&self, root: DOMRect) -> DOMRect {
        let [t, r, b, l] = self.0;
        root.expand(
            t.resolve(root.height),
            r.resolve(root.width),
            b.resolve(root.height),
            l.resolve(root.width),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LastState {
    threshold_index: usize,
    is_intersecting: bool,
}

pub(crate) struct IntersectionCore {
    callback: WatcherCallback,
    root: Option<NodeId>,
    root_margin: RootMargin,
    thresholds: Vec<f64>,
    observed: BTreeMap<NodeId, Option<LastState>>,
    pending: Vec<VisibilityEntry>,
    connected: bool,
}

impl IntersectionCore {
    pub(crate) fn new(config: &WatcherConfig, callback: WatcherCallback) -> Result<Self, PlatformError> {
        let root_margin = RootMargin::parse(&config.root_margin)?;

        let mut thresholds = if config.threshold.is_empty() {
            vec![0.0]
        } else {
            config.threshold.clone()
        };
        if thresholds.iter().any(|t| !(0.0..=1.0).contains(t)) {
            return Err(PlatformError::InvalidOptions("thresholds must be in [0, 1]".into()));
        }
        thresholds.sort_by(|a, b| a.total_cmp(b));
        thresholds.dedup();

        Ok(Self {
            callback,
            root: config.root,
            root_margin,
            thresholds,
            observed: BTreeMap::new(),
            pending: Vec::new(),
            connected: true,
        })
    }

    /// Queue entries for targets whose threshold index or intersecting state changed
    pub(crate) fn check_intersections(
        &mut self,
        viewport: DOMRect,
        element_rects: &HashMap<NodeId, DOMRect>,
        time: f64,
    ) {
        if !self.connected {
            return;
        }

        let root_rect = match self.root {
            Some(root) => match element_rects.get(&root) {
                Some(rect) => *rect,
                None => return,
            },
            None => viewport,
        };
        let root_bounds = self.root_margin.apply(root_rect);

        for (node, last) in &mut self.observed {
            let Some(rect) = element_rects.get(node) else {
                continue;
            };

            let intersection = rect.intersection(&root_bounds);
            let is_intersecting = intersection.is_some();
            let ratio = match intersection {
                Some(i) if rect.area() > 0.0 => i.area() / rect.area(),
                _ => 0.0,
            };
            let threshold_index = if is_intersecting {
                self.thresholds.iter().filter(|&&t| ratio >= t).count()
            } else {
                0
            };

            let state = LastState {
                threshold_index,
                is_intersecting,
            };
            if *last == Some(state) {
                continue;
            }
            *last = Some(state);

            self.pending.push(VisibilityEntry {
                target: *node,
                bounding_client_rect: *rect,
                intersection_rect: intersection.unwrap_or_default(),
                root_bounds: Some(root_bounds),
                intersection_ratio: ratio,
                is_intersecting,
                time,
            });
        }
    }

    pub(crate) fn take_delivery(&mut self) -> Option<(WatcherCallback, Vec<VisibilityEntry>)> {
        if !self.connected || self.pending.is_empty() {
            return None;
        }
        Some((Rc::clone(&self.callback), std::mem::take(&mut self.pending)))
    }

    pub(crate) fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }
}

pub(crate) struct IntersectionWatcher {
    pub(crate) core: Rc<RefCell<IntersectionCore>>,
}

impl PlatformWatcher for IntersectionWatcher {
    fn observe(&mut self, target: Option<NodeId>, _options: &ObserveOptions) -> Result<(), PlatformError> {
        let target = target.ok_or(PlatformError::InvalidTarget)?;
        let mut core = self.core.borrow_mut();
        if !core.connected {
            return Err(PlatformError::Disconnected);
        }
        core.observed.entry(target).or_insert(None);
        Ok(())
    }

    fn unobserve(&mut self, target: NodeId) -> Result<(), PlatformError> {
        let mut core = self.core.borrow_mut();
        core.observed.remove(&target);
        core.pending.retain(|e| e.target != target);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), PlatformError> {
        let mut core = self.core.borrow_mut();
        core.observed.clear();
        core.pending.clear();
        core.connected = false;
        Ok(())
    }

    fn take_records(&mut self) -> Result<usize, PlatformError> {
        Ok(std::mem::take(&mut self.core.borrow_mut().pending).len())
    }
}
