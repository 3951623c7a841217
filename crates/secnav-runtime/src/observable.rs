#![forbid(unsafe_code)]

//! Observable navigator outputs.
//!
//! [`Observable<T>`] is how a renderer follows `current_active_id` and the
//! indicator geometry without polling: it holds the latest value, a version
//! counter, and weakly held subscriber callbacks.
//!
//! # Invariants
//!
//! 1. `version` increments by exactly 1 on each value-changing `set`.
//! 2. `set(v)` where `v == current` is a no-op: no version bump, no callback.
//! 3. Subscribers are notified in registration order.
//! 4. Dropping a [`Subscription`] stops its callback; dead entries are pruned
//!    on the next notification.
//!
//! # Failure Modes
//!
//! - **Re-entrant set**: a subscriber may call `set` on the same observable;
//!   no borrow is held while callbacks run, so the nested change notifies
//!   after the outer one completes its own callback.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

struct ObservableInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<CallbackWeak<T>>,
}

/// A shared, versioned value with change notification.
///
/// Cloning creates a second handle to the same value and subscribers.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value. Returns `true` and notifies if it changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return false;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
        true
    }

    /// Call `callback` with each new value until the guard is dropped.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Drop every subscriber. Used at teardown so no callback outlives the
    /// navigator.
    pub fn clear_subscribers(&self) {
        self.inner.borrow_mut().subscribers.clear();
    }

    fn notify(&self) {
        let callbacks: Vec<CallbackRc<T>> = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            inner.subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        if callbacks.is_empty() {
            return;
        }
        let value = self.get();
        let _span = tracing::trace_span!("observable.notify", subscribers = callbacks.len())
            .entered();
        for cb in &callbacks {
            cb(&value);
        }
    }
}

/// RAII guard for a subscriber callback.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn equal_set_is_a_no_op() {
        let obs = Observable::new(Some("ch1".to_string()));
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = obs.subscribe(move |_| h.set(h.get() + 1));
        assert!(!obs.set(Some("ch1".into())));
        assert_eq!(obs.version(), 0);
        assert!(obs.set(Some("ch2".into())));
        assert_eq!(obs.version(), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn dropped_subscription_stops_callbacks() {
        let obs = Observable::new(0u32);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let sub = obs.subscribe(move |v| s.borrow_mut().push(*v));
        obs.set(1);
        drop(sub);
        obs.set(2);
        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn notifies_in_registration_order() {
        let obs = Observable::new(0u32);
        let order = Rc::new(RefCell::new(Vec::new()));
        let (a, b) = (Rc::clone(&order), Rc::clone(&order));
        let _s1 = obs.subscribe(move |_| a.borrow_mut().push("first"));
        let _s2 = obs.subscribe(move |_| b.borrow_mut().push("second"));
        obs.set(7);
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn clones_share_state() {
        let obs = Observable::new(1u8);
        let other = obs.clone();
        other.set(2);
        assert_eq!(obs.get(), 2);
        assert_eq!(obs.with(|v| *v + 1), 3);
    }

    #[test]
    fn clear_subscribers_silences_everything() {
        let obs = Observable::new(0u32);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = obs.subscribe(move |_| h.set(h.get() + 1));
        obs.clear_subscribers();
        obs.set(1);
        assert_eq!(hits.get(), 0);
    }
}
