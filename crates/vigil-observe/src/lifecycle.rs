//! Page lifecycle
//!
//! Tracks document visibility and fans teardown signals out to listeners.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Visibility state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityState {
    #[default]
    Visible,
    Hidden,
}

/// Lifecycle events raised by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// Page or process is about to unload
    BeforeUnload,
    /// Page is being hidden, possibly for teardown
    PageHide,
    /// Page was shown again (e.g. restored from the back/forward cache)
    PageShow,
}

type Listener = Rc<dyn Fn(LifecycleEvent)>;

/// Lifecycle signal source
#[derive(Default)]
pub struct PageLifecycle {
    listeners: RefCell<Vec<(LifecycleEvent, Listener)>>,
    state: Cell<VisibilityState>,
}

impl PageLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one event; there is no unsubscribe
    pub fn add_listener<F>(&self, event: LifecycleEvent, listener: F)
    where
        F: Fn(LifecycleEvent) + 'static,
    {
        self.listeners.borrow_mut().push((event, Rc::new(listener)));
    }

    /// Raise an event, returning how many listeners ran
    pub fn dispatch(&self, event: LifecycleEvent) -> usize {
        match event {
            LifecycleEvent::PageHide => self.state.set(VisibilityState::Hidden),
            LifecycleEvent::PageShow => self.state.set(VisibilityState::Visible),
            LifecycleEvent::BeforeUnload => {}
        }

        // Listeners may subscribe more listeners while running
        let matching: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(e, _)| *e == event)
            .map(|(_, l)| Rc::clone(l))
            .collect();

        tracing::debug!("Dispatching {:?} to {} listeners", event, matching.len());
        for listener in &matching {
            listener(event);
        }
        matching.len()
    }

    pub fn visibility_state(&self) -> VisibilityState {
        self.state.get()
    }

    pub fn is_hidden(&self) -> bool {
        self.state.get() == VisibilityState::Hidden
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl std::fmt::Debug for PageLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageLifecycle")
            .field("listeners", &self.listener_count())
            .field("state", &self.state.get())
            .finish()
    }
}
