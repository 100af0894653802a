//! Observable container for the application state shared by every widget.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use vizion_widget_api::{Metadata, ResultsState, SearchState};

use crate::client::SearchError;

/// Everything widgets read to render.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    pub widgets: SearchState,
    pub metadata: Vec<Metadata>,
    pub results: Option<ResultsState>,
    pub error: Option<SearchError>,
    pub searching: bool,
    pub is_search_stalled: bool,
    pub searching_for_query_suggestions: bool,
    pub searching_for_locations: bool,
    pub results_query_suggestions: Option<serde_json::Value>,
    pub results_locations: Option<serde_json::Value>,
}

type Listener = Rc<dyn Fn()>;

struct StoreInner {
    state: RefCell<Rc<AppState>>,
    listeners: RefCell<Vec<(u64, Listener)>>,
    next_listener: Cell<u64>,
}

/// Single-threaded store holding exactly one [`AppState`].
///
/// Every [`set_state`](Self::set_state) replaces the whole state and notifies
/// every listener synchronously. Listeners receive no arguments and re-read the
/// state through [`get_state`](Self::get_state).
#[derive(Clone)]
pub struct Store {
    inner: Rc<StoreInner>,
}

impl Store {
    #[must_use]
    pub fn new(initial: AppState) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                state: RefCell::new(Rc::new(initial)),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
            }),
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn get_state(&self) -> Rc<AppState> {
        Rc::clone(&self.inner.state.borrow())
    }

    /// Replace the state and notify every listener.
    pub fn set_state(&self, next: AppState) {
        *self.inner.state.borrow_mut() = Rc::new(next);
        // Listeners may subscribe or unsubscribe while being notified.
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener();
        }
    }

    /// Copy the current state, apply `update` and store the result.
    pub fn update(&self, update: impl FnOnce(&mut AppState)) {
        let mut next = AppState::clone(&self.get_state());
        update(&mut next);
        self.set_state(next);
    }

    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Subscription {
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id.wrapping_add(1));
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        Subscription {
            id,
            store: Rc::downgrade(&self.inner),
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.inner.state.borrow())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Handle returned by [`Store::subscribe`].
///
/// Dropping the handle keeps the listener registered.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    store: Weak<StoreInner>,
}

impl Subscription {
    /// Remove the listener this handle was created for. Further calls do
    /// nothing.
    pub fn unsubscribe(&self) {
        let Some(store) = self.store.upgrade() else {
            return;
        };
        store
            .listeners
            .borrow_mut()
            .retain(|(id, _)| *id != self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(store: &Store) -> (Rc<Cell<usize>>, Subscription) {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let subscription = store.subscribe(move || seen.set(seen.get() + 1));
        (calls, subscription)
    }

    #[test]
    fn set_state_replaces_and_notifies_everyone() {
        let store = Store::new(AppState::default());
        let (first, _a) = counter(&store);
        let (second, _b) = counter(&store);

        store.set_state(AppState {
            searching: true,
            ..AppState::default()
        });

        assert!(store.get_state().searching);
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn snapshots_are_not_affected_by_later_updates() {
        let store = Store::new(AppState::default());
        let before = store.get_state();
        store.update(|state| state.is_search_stalled = true);

        assert!(!before.is_search_stalled);
        assert!(store.get_state().is_search_stalled);
    }

    #[test]
    fn unsubscribing_twice_leaves_other_listeners_alone() {
        let store = Store::new(AppState::default());
        let (removed, subscription) = counter(&store);
        let (kept, _kept) = counter(&store);

        subscription.unsubscribe();
        subscription.unsubscribe();
        store.set_state(AppState::default());

        assert_eq!(removed.get(), 0);
        assert_eq!(kept.get(), 1);
        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn unsubscribe_after_store_is_dropped_is_a_no_op() {
        let store = Store::new(AppState::default());
        let (_, subscription) = counter(&store);
        drop(store);
        subscription.unsubscribe();
    }

    #[test]
    fn listeners_can_read_state_while_notified() {
        let store = Store::new(AppState::default());
        let observed = Rc::new(Cell::new(false));
        let reader = store.clone();
        let sink = Rc::clone(&observed);
        let _subscription = store.subscribe(move || sink.set(reader.get_state().searching));

        store.update(|state| state.searching = true);

        assert!(observed.get());
    }
}
