//! Listener registries with RAII unsubscription.
//!
//! Listeners are called in registration order. Dispatch works on a snapshot
//! of the registry, so a listener may subscribe, unsubscribe or trigger
//! another notification without deadlocking.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

struct ListenerList<F: ?Sized> {
    next_id: u64,
    entries: Vec<(u64, Arc<F>)>,
}

/// An ordered set of listeners of type `F` (usually a `dyn Fn(..)`).
pub struct Listeners<F: ?Sized> {
    inner: Arc<Mutex<ListenerList<F>>>,
}

impl<F: ?Sized + Send + Sync + 'static> Listeners<F> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ListenerList {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a listener; it stays registered while the returned
    /// [`Subscription`] is alive.
    pub fn add(&self, listener: Arc<F>) -> Subscription {
        let id = {
            let mut list = self.inner.lock();
            let id = list.next_id;
            list.next_id += 1;
            list.entries.push((id, listener));
            id
        };

        let weak: Weak<Mutex<ListenerList<F>>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock().entries.retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// The currently registered listeners, in registration order.
    pub fn snapshot(&self) -> Vec<Arc<F>> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every listener.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }
}

impl<F: ?Sized + Send + Sync + 'static> Default for Listeners<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps a listener registered; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Unsubscribe now.
    pub fn unsubscribe(mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }

    /// Keep the listener registered for the lifetime of its registry.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
