//! Headless mutation watcher
//!
//! The arena has no tree structure, so `subtree` observations only match
//! records targeting the observed node itself.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use vigil_dom::NodeId;

use crate::{
    MutationObserverInit, MutationRecord, MutationType, ObserveOptions, PlatformError,
    PlatformWatcher, WatcherCallback, WatcherKind,
};

/// Apply the implied flags and reject option sets that observe nothing
fn normalize(mut init: MutationObserverInit) -> Result<MutationObserverInit, PlatformError> {
    if init.attribute_old_value || init.attribute_filter.is_some() {
        init.attributes = true;
    }
    if init.character_data_old_value {
        init.character_data = true;
    }
    if !(init.child_list || init.attributes || init.character_data) {
        return Err(PlatformError::InvalidOptions(
            "one of child_list, attributes or character_data must be set".into(),
        ));
    }
    Ok(init)
}

pub(crate) struct MutationCore {
    callback: WatcherCallback,
    observations: BTreeMap<NodeId, MutationObserverInit>,
    pending: Vec<MutationRecord>,
    connected: bool,
}

impl MutationCore {
    pub(crate) fn new(callback: WatcherCallback) -> Self {
        Self {
            callback,
            observations: BTreeMap::new(),
            pending: Vec::new(),
            connected: true,
        }
    }

    /// Queue a mutation if any observation wants it
    pub(crate) fn record(&mut self, mutation: &MutationRecord) {
        if !self.connected {
            return;
        }

        let Some(options) = self.observations.get(&mutation.target) else {
            return;
        };

        let wanted = match mutation.mutation_type {
            MutationType::Attributes => {
                options.attributes
                    && match (&options.attribute_filter, &mutation.attribute_name) {
                        (Some(filter), Some(attr)) => filter.contains(attr),
                        _ => true,
                    }
            }
            MutationType::CharacterData => options.character_data,
            MutationType::ChildList => options.child_list,
        };
        if !wanted {
            return;
        }

        let keep_old_value = match mutation.mutation_type {
            MutationType::Attributes => options.attribute_old_value,
            MutationType::CharacterData => options.character_data_old_value,
            MutationType::ChildList => false,
        };
        let mut record = mutation.clone();
        if !keep_old_value {
            record.old_value = None;
        }
        self.pending.push(record);
    }

    pub(crate) fn take_delivery(&mut self) -> Option<(WatcherCallback, Vec<MutationRecord>)> {
        if !self.connected || self.pending.is_empty() {
            return None;
        }
        Some((Rc::clone(&self.callback), std::mem::take(&mut self.pending)))
    }
}

pub(crate) struct MutationWatcher {
    pub(crate) core: Rc<RefCell<MutationCore>>,
}

impl PlatformWatcher for MutationWatcher {
    fn observe(&mut self, target: Option<NodeId>, options: &ObserveOptions) -> Result<(), PlatformError> {
        let target = target.ok_or(PlatformError::InvalidTarget)?;
        let init = normalize(options.mutation.clone())?;
        let mut core = self.core.borrow_mut();
        if !core.connected {
            return Err(PlatformError::Disconnected);
        }
        core.observations.insert(target, init);
        Ok(())
    }

    fn unobserve(&mut self, _target: NodeId) -> Result<(), PlatformError> {
        Err(PlatformError::UnsupportedOperation {
            kind: WatcherKind::Mutation,
            operation: "unobserve",
        })
    }

    fn disconnect(&mut self) -> Result<(), PlatformError> {
        let mut core = self.core.borrow_mut();
        core.observations.clear();
        core.pending.clear();
        core.connected = false;
        Ok(())
    }

    fn take_records(&mut self) -> Result<usize, PlatformError> {
        Ok(std::mem::take(&mut self.core.borrow_mut().pending).len())
    }
}
