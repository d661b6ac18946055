//! Observer registry
//!
//! Owns every platform watcher the page creates, tracks what each one is
//! observing and tears all of them down when the page goes away.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::{Rc, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

use vigil_dom::NodeId;

use crate::{
    LifecycleEvent, MemoryEstimate, ObservationPlatform, ObserveError, ObserveOptions, PageLifecycle,
    PlatformError, PlatformWatcher, RegistryConfig, RegistryStats, Result, WatcherCallback,
    WatcherConfig, WatcherHandle, WatcherInfo, WatcherKind, support_matrix,
};

/// One live watcher
struct WatcherRecord {
    handle: WatcherHandle,
    kind: WatcherKind,
    /// `None` while checked out for a platform call
    instance: Option<Box<dyn PlatformWatcher>>,
    config: WatcherConfig,
    callback: WatcherCallback,
    observed_targets: BTreeSet<NodeId>,
    observed_entry_types: BTreeSet<String>,
    created_at: SystemTime,
}

impl WatcherRecord {
    fn info(&self) -> WatcherInfo {
        WatcherInfo {
            handle: self.handle,
            kind: self.kind,
            created_at_ms: self
                .created_at
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or_default(),
            target_count: self.observed_targets.len(),
            entry_types: self.observed_entry_types.iter().cloned().collect(),
        }
    }
}

/// Performance watchers drain queued entries before disconnecting
fn shutdown(handle: WatcherHandle, instance: &mut dyn PlatformWatcher) -> std::result::Result<(), PlatformError> {
    if handle.kind() == WatcherKind::PerformanceEntry {
        match instance.take_records() {
            Ok(0) => {}
            Ok(drained) => tracing::debug!("Drained {} pending entries from {}", drained, handle),
            Err(err) => tracing::warn!("Failed to drain {}: {}", handle, err),
        }
    }
    instance.disconnect()
}

fn finish_disconnect(handle: WatcherHandle, instance: &mut dyn PlatformWatcher) {
    match shutdown(handle, instance) {
        Ok(()) => tracing::info!("Disconnected {} watcher {}", handle.kind(), handle),
        Err(err) => tracing::error!(
            "Failed to disconnect {}: {}; removed from registry anyway",
            handle,
            err
        ),
    }
}

struct RegistryState {
    platform: Rc<dyn ObservationPlatform>,
    config: RegistryConfig,
    records: BTreeMap<WatcherHandle, WatcherRecord>,
    sequence: u64,
}

/// Central authority for platform watchers
///
/// Cloning yields another handle to the same registry. Callbacks that need
/// to reach back into the registry should hold a [`WeakRegistry`].
#[derive(Clone)]
pub struct ObserverRegistry {
    state: Rc<RefCell<RegistryState>>,
}

/// Non-owning registry reference
#[derive(Clone)]
pub struct WeakRegistry {
    state: Weak<RefCell<RegistryState>>,
}

impl WeakRegistry {
    pub fn upgrade(&self) -> Option<ObserverRegistry> {
        self.state.upgrade().map(|state| ObserverRegistry { state })
    }
}

impl ObserverRegistry {
    /// Create a registry and subscribe it to the page teardown signals
    pub fn new(platform: Rc<dyn ObservationPlatform>, lifecycle: &PageLifecycle) -> Self {
        Self::with_config(platform, lifecycle, RegistryConfig::default())
    }

    pub fn with_config(
        platform: Rc<dyn ObservationPlatform>,
        lifecycle: &PageLifecycle,
        config: RegistryConfig,
    ) -> Self {
        if config.log_support_on_init {
            tracing::info!("Platform watcher support: {:?}", support_matrix(platform.as_ref()));
        }

        let registry = Self {
            state: Rc::new(RefCell::new(RegistryState {
                platform,
                config,
                records: BTreeMap::new(),
                sequence: 0,
            })),
        };
        registry.install_teardown(lifecycle);

        tracing::info!("Observer registry initialized");
        registry
    }

    fn install_teardown(&self, lifecycle: &PageLifecycle) {
        for event in [LifecycleEvent::BeforeUnload, LifecycleEvent::PageHide] {
            let weak = self.downgrade();
            lifecycle.add_listener(event, move |event| {
                if let Some(registry) = weak.upgrade() {
                    let count = registry.disconnect_all();
                    tracing::debug!("{:?} tore down {} watchers", event, count);
                }
            });
        }
    }

    pub fn downgrade(&self) -> WeakRegistry {
        WeakRegistry {
            state: Rc::downgrade(&self.state),
        }
    }

    /// Construct a platform watcher and start tracking it
    pub fn create_watcher(
        &self,
        kind: WatcherKind,
        config: WatcherConfig,
        callback: WatcherCallback,
    ) -> Result<WatcherHandle> {
        let platform = Rc::clone(&self.state.borrow().platform);
        let instance = platform
            .construct(kind, &config, Rc::clone(&callback))
            .map_err(|source| {
                tracing::error!("Failed to create {} watcher: {}", kind, source);
                ObserveError::PlatformConstruction { kind, source }
            })?;

        let mut state = self.state.borrow_mut();
        state.sequence += 1;
        let handle = WatcherHandle::new(state.sequence, kind);
        state.records.insert(
            handle,
            WatcherRecord {
                handle,
                kind,
                instance: Some(instance),
                config,
                callback,
                observed_targets: BTreeSet::new(),
                observed_entry_types: BTreeSet::new(),
                created_at: SystemTime::now(),
            },
        );

        tracing::info!("Created {} watcher {}", kind, handle);
        Ok(handle)
    }

    /// Create a watcher from a kind name such as `"intersection"` or `"performance"`
    pub fn create_named_watcher(
        &self,
        kind: &str,
        config: WatcherConfig,
        callback: WatcherCallback,
    ) -> Result<WatcherHandle> {
        let kind = kind.parse::<WatcherKind>().inspect_err(|err| tracing::error!("{}", err))?;
        self.create_watcher(kind, config, callback)
    }

    fn require(&self, handle: WatcherHandle) -> Result<()> {
        if self.contains(handle) {
            Ok(())
        } else {
            Err(ObserveError::UnknownHandle(handle))
        }
    }

    /// Run `call` against the platform instance of `handle` with no registry
    /// borrow held, so notifications raised inside the call may re-enter the
    /// registry. `Ok(None)` means an outer call already has the instance.
    fn with_instance<T>(
        &self,
        handle: WatcherHandle,
        call: impl FnOnce(&mut dyn PlatformWatcher) -> T,
    ) -> Result<Option<T>> {
        let checked_out = self
            .state
            .borrow_mut()
            .records
            .get_mut(&handle)
            .ok_or(ObserveError::UnknownHandle(handle))?
            .instance
            .take();
        let Some(mut instance) = checked_out else {
            tracing::warn!("{} is busy in another platform call", handle);
            return Ok(None);
        };

        let output = call(instance.as_mut());

        let orphan = match self.state.borrow_mut().records.get_mut(&handle) {
            Some(record) => {
                record.instance = Some(instance);
                None
            }
            None => Some(instance),
        };
        // Disconnected from inside the call
        if let Some(mut instance) = orphan {
            finish_disconnect(handle, instance.as_mut());
        }
        Ok(Some(output))
    }

    /// Observe `target` (or, for performance watchers, the entry types in
    /// `options`). Platform failures are logged and reported as `Ok(false)`.
    pub fn observe_target(
        &self,
        handle: WatcherHandle,
        target: Option<NodeId>,
        options: &ObserveOptions,
    ) -> Result<bool> {
        self.require(handle)?;
        if handle.kind().observes_targets() {
            self.observe_node(handle, target, options)
        } else {
            self.observe_entry_types(handle, options)
        }
    }

    fn observe_node(
        &self,
        handle: WatcherHandle,
        target: Option<NodeId>,
        options: &ObserveOptions,
    ) -> Result<bool> {
        let Some(target) = target else {
            tracing::warn!("{} watcher {} needs a target to observe", handle.kind(), handle);
            return Ok(false);
        };

        match self.with_instance(handle, |instance| instance.observe(Some(target), options))? {
            Some(Ok(())) => {
                let tracked = self
                    .state
                    .borrow_mut()
                    .records
                    .get_mut(&handle)
                    .map(|record| record.observed_targets.insert(target))
                    .is_some();
                tracing::debug!("{} now observing {}", handle, target);
                Ok(tracked)
            }
            Some(Err(err)) => {
                tracing::error!("Failed to observe {} with {}: {}", target, handle, err);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    fn observe_entry_types(&self, handle: WatcherHandle, options: &ObserveOptions) -> Result<bool> {
        let entry_types = options.subscribed_entry_types();
        if entry_types.is_empty() {
            tracing::warn!("{} was given no entry types to observe", handle);
            return Ok(false);
        }

        let outcome = self.with_instance(handle, |instance| {
            let mut subscribed = Vec::new();
            for entry_type in entry_types {
                if let Err(err) = instance.observe(None, &options.for_entry_type(&entry_type)) {
                    return (subscribed, Some((entry_type, err)));
                }
                subscribed.push(entry_type);
            }
            (subscribed, None)
        })?;
        let Some((subscribed, failure)) = outcome else {
            return Ok(false);
        };

        let mut state = self.state.borrow_mut();
        let Some(record) = state.records.get_mut(&handle) else {
            return Ok(false);
        };
        record.observed_entry_types.extend(subscribed);

        if let Some((entry_type, err)) = failure {
            tracing::error!("Failed to observe {} entries with {}: {}", entry_type, handle, err);
            return Ok(false);
        }
        tracing::debug!(
            "{} now observing: {}",
            handle,
            record.observed_entry_types.iter().cloned().collect::<Vec<_>>().join(", ")
        );
        Ok(true)
    }

    /// Stop observing `target`. A target the watcher is not tracking yields `Ok(false)`.
    pub fn unobserve_target(&self, handle: WatcherHandle, target: NodeId) -> Result<bool> {
        let tracked = self
            .state
            .borrow()
            .records
            .get(&handle)
            .ok_or(ObserveError::UnknownHandle(handle))?
            .observed_targets
            .contains(&target);
        if !tracked {
            tracing::debug!("{} is not observing {}", handle, target);
            return Ok(false);
        }

        match self.with_instance(handle, |instance| instance.unobserve(target))? {
            Some(Ok(())) => {
                if let Some(record) = self.state.borrow_mut().records.get_mut(&handle) {
                    record.observed_targets.remove(&target);
                }
                tracing::debug!("{} stopped observing {}", handle, target);
                Ok(true)
            }
            Some(Err(err)) => {
                tracing::error!("Failed to unobserve {} with {}: {}", target, handle, err);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    /// Disconnect a watcher and forget it.
    ///
    /// The record is removed even when the platform disconnect fails.
    /// Returns `false` only for unknown handles.
    pub fn disconnect_watcher(&self, handle: WatcherHandle) -> bool {
        let removed = self.state.borrow_mut().records.remove(&handle);
        let Some(record) = removed else {
            tracing::warn!("Watcher {} not found for disconnection", handle);
            return false;
        };

        match record.instance {
            Some(mut instance) => finish_disconnect(handle, instance.as_mut()),
            None => tracing::debug!("{} disconnects once its platform call returns", handle),
        }
        true
    }

    /// Disconnect every watcher of `kind`, returning how many were removed
    pub fn disconnect_all_by_kind(&self, kind: WatcherKind) -> usize {
        let handles: Vec<WatcherHandle> = self
            .state
            .borrow()
            .records
            .keys()
            .filter(|h| h.kind() == kind)
            .copied()
            .collect();

        let count = handles
            .into_iter()
            .filter(|&h| self.disconnect_watcher(h))
            .count();
        tracing::info!("Cleaned up {} {} watchers", count, kind);
        count
    }

    /// Disconnect everything, returning the number of watchers that were live
    pub fn disconnect_all(&self) -> usize {
        let handles: Vec<WatcherHandle> = self.state.borrow().records.keys().copied().collect();
        let count = handles.len();

        for handle in handles {
            self.disconnect_watcher(handle);
        }

        if count > 0 {
            tracing::info!("Cleaned up {} watchers", count);
        }
        count
    }

    pub fn stats(&self) -> RegistryStats {
        let state = self.state.borrow();
        let cost_model = state.config.cost_model;

        let mut by_kind: BTreeMap<WatcherKind, usize> =
            WatcherKind::ALL.iter().map(|&k| (k, 0)).collect();
        let mut memory = MemoryEstimate {
            total_bytes: 0,
            by_kind: WatcherKind::ALL.iter().map(|&k| (k, 0)).collect(),
        };

        for record in state.records.values() {
            let cost = cost_model.watcher_cost(
                record.observed_targets.len(),
                record.observed_entry_types.len(),
            );
            *by_kind.entry(record.kind).or_default() += 1;
            *memory.by_kind.entry(record.kind).or_default() += cost;
            memory.total_bytes += cost;
        }

        RegistryStats {
            total: state.records.len(),
            by_kind,
            memory,
        }
    }

    /// First watcher, in creation order, currently observing `target`
    pub fn find_handle_by_target(&self, target: NodeId) -> Option<WatcherHandle> {
        self.state
            .borrow()
            .records
            .values()
            .find(|r| r.observed_targets.contains(&target))
            .map(|r| r.handle)
    }

    pub fn watchers_by_kind(&self, kind: WatcherKind) -> Vec<WatcherInfo> {
        self.state
            .borrow()
            .records
            .values()
            .filter(|r| r.kind == kind)
            .map(WatcherRecord::info)
            .collect()
    }

    pub fn watcher_info(&self, handle: WatcherHandle) -> Option<WatcherInfo> {
        self.state.borrow().records.get(&handle).map(WatcherRecord::info)
    }

    /// Targets currently observed by `handle`
    pub fn observed_targets(&self, handle: WatcherHandle) -> Option<Vec<NodeId>> {
        self.state
            .borrow()
            .records
            .get(&handle)
            .map(|r| r.observed_targets.iter().copied().collect())
    }

    /// Construction options `handle` was created with
    pub fn watcher_config(&self, handle: WatcherHandle) -> Option<WatcherConfig> {
        self.state.borrow().records.get(&handle).map(|r| r.config.clone())
    }

    /// The caller callback `handle` reports through
    pub fn callback(&self, handle: WatcherHandle) -> Option<WatcherCallback> {
        self.state
            .borrow()
            .records
            .get(&handle)
            .map(|r| Rc::clone(&r.callback))
    }

    pub fn contains(&self, handle: WatcherHandle) -> bool {
        self.state.borrow().records.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.state.borrow().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().records.is_empty()
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ObserverRegistry")
            .field("watchers", &state.records.keys().map(|h| h.to_string()).collect::<Vec<_>>())
            .field("sequence", &state.sequence)
            .finish()
    }
}
