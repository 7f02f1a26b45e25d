//! Observable state cells.
//!
//! A cell holds one value and a list of subscribers. Subscribers run after the value has
//! changed; writing an equal value is silent. Cells are single-threaded.

use std::cell::{Cell, RefCell};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Box<dyn FnMut(&T)>;

pub struct Observable<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<(SubscriptionId, Callback<T>)>>,
    next_id: Cell<u64>,
}

impl<T: Default + Clone + PartialEq> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value.borrow())
            .field("subscribers", &self.subscribers.borrow().len())
            .finish()
    }
}

impl<T: Clone + PartialEq> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
            subscribers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    pub fn subscribe(&self, f: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscribers.borrow_mut().push((id, Box::new(f)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.borrow_mut();
        let before = subs.len();
        subs.retain(|(sid, _)| *sid != id);
        subs.len() != before
    }

    /// Replaces the value. Returns whether it changed (and subscribers ran).
    pub(crate) fn set(&self, value: T) -> bool {
        {
            let mut current = self.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value;
        }
        self.notify();
        true
    }

    fn notify(&self) {
        let snapshot = self.get();
        // Callbacks may subscribe or read cells; run them with the list detached.
        let mut running = std::mem::take(&mut *self.subscribers.borrow_mut());
        for (_, f) in running.iter_mut() {
            f(&snapshot);
        }
        let mut subs = self.subscribers.borrow_mut();
        running.append(&mut subs);
        *subs = running;
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
