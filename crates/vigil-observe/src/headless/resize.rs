//! Headless size watcher

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use vigil_dom::{DOMRect, NodeId};

use crate::{
    ObserveOptions, PlatformError, PlatformWatcher, ResizeObserverSize, SizeEntry, WatcherCallback,
};

pub(crate) struct ResizeCore {
    callback: WatcherCallback,
    /// Last reported (width, height) per target
    observed: BTreeMap<NodeId, Option<(f64, f64)>>,
    pending: Vec<SizeEntry>,
    connected: bool,
}

impl ResizeCore {
    pub(crate) fn new(callback: WatcherCallback) -> Self {
        Self {
            callback,
            observed: BTreeMap::new(),
            pending: Vec::new(),
            connected: true,
        }
    }

    /// Queue entries for targets whose size changed since the last check
    pub(crate) fn check_sizes(&mut self, element_rects: &HashMap<NodeId, DOMRect>) {
        if !self.connected {
            return;
        }

        for (node, last_size) in &mut self.observed {
            let Some(rect) = element_rects.get(node) else {
                continue;
            };
            let (width, height) = (rect.width, rect.height);

            let changed = match *last_size {
                Some((lw, lh)) => (lw - width).abs() > 0.01 || (lh - height).abs() > 0.01,
                None => true,
            };
            if !changed {
                continue;
            }
            *last_size = Some((width, height));

            let size = ResizeObserverSize {
                inline_size: width,
                block_size: height,
            };
            tracing::trace!("{} resized to {}x{}", node, width, height);

            self.pending.push(SizeEntry {
                target: *node,
                content_rect: DOMRect::from_xywh(0.0, 0.0, width, height),
                content_box_size: vec![size],
                border_box_size: vec![size],
            });
        }
    }

    pub(crate) fn take_delivery(&mut self) -> Option<(WatcherCallback, Vec<SizeEntry>)> {
        if !self.connected || self.pending.is_empty() {
            return None;
        }
        Some((Rc::clone(&self.callback), std::mem::take(&mut self.pending)))
    }
}

pub(crate) struct ResizeWatcher {
    pub(crate) core: Rc<RefCell<ResizeCore>>,
}

impl PlatformWatcher for ResizeWatcher {
    fn observe(&mut self, target: Option<NodeId>, _options: &ObserveOptions) -> Result<(), PlatformError> {
        let target = target.ok_or(PlatformError::InvalidTarget)?;
        let mut core = self.core.borrow_mut();
        if !core.connected {
            return Err(PlatformError::Disconnected);
        }
        core.observed.insert(target, None);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Notification;

    #[test]
    fn test_resize_change_detection() {
        let core = Rc::new(RefCell::new(ResizeCore::new(Rc::new(|_: Notification<'_>| {}))));
        let mut watcher = ResizeWatcher { core: Rc::clone(&core) };
        let node = NodeId::from_raw(1);

        watcher.observe(Some(node), &ObserveOptions::default()).unwrap();

        let mut rects = HashMap::new();
        rects.insert(node, DOMRect::from_xywh(0.0, 0.0, 100.0, 200.0));
        core.borrow_mut().check_sizes(&rects);

        let (_, entries) = core.borrow_mut().take_delivery().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content_rect.width, 100.0);

        // Sub-threshold jitter is ignored
        rects.insert(node, DOMRect::from_xywh(0.0, 0.0, 100.005, 200.0));
        core.borrow_mut().check_sizes(&rects);
        assert!(core.borrow_mut().take_delivery().is_none());
    }

    #[test]
    fn test_sizes_mirror_layout_rect() {
        let core = Rc::new(RefCell::new(ResizeCore::new(Rc::new(|_: Notification<'_>| {}))));
        let mut watcher = ResizeWatcher { core: Rc::clone(&core) };
        let node = NodeId::from_raw(4);
        watcher.observe(Some(node), &ObserveOptions::default()).unwrap();

        let rects = HashMap::from([(node, DOMRect::from_xywh(30.0, 40.0, 320.0, 180.0))]);
        core.borrow_mut().check_sizes(&rects);

        let (_, entries) = core.borrow_mut().take_delivery().unwrap();
        let entry = &entries[0];
        assert_eq!(entry.content_rect, DOMRect::from_xywh(0.0, 0.0, 320.0, 180.0));
        assert_eq!(entry.content_box_size, entry.border_box_size);
        assert_eq!(entry.content_box_size[0].inline_size, 320.0);
        assert_eq!(entry.content_box_size[0].block_size, 180.0);
    }

    #[test]
    fn test_observe_requires_target() {
        let core = Rc::new(RefCell::new(ResizeCore::new(Rc::new(|_: Notification<'_>| {}))));
        let mut watcher = ResizeWatcher { core };
        assert_eq!(
            watcher.observe(None, &ObserveOptions::default()),
            Err(PlatformError::InvalidTarget)
        );
    }
}
