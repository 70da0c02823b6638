//! The property channel.
//!
//! A [`PropChannel`] carries a mounted component's props from the host to the
//! foreign framework. It is ordered and multicast, and it buffers nothing:
//! a subscriber only sees values sent after it subscribed. Once completed,
//! a channel stays completed; the converter replaces it on the next mount.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use piral_core::{Listeners, Subscription};
use tokio::sync::mpsc;

/// What a subscriber observes.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal<T> {
    Next(T),
    Complete,
}

type Listener<T> = dyn Fn(&Signal<T>) + Send + Sync;

struct Inner<T: 'static> {
    listeners: Listeners<Listener<T>>,
    completed: AtomicBool,
    // Serializes delivery so subscribers see sends in call order.
    delivery: ReentrantMutex<()>,
}

/// A push-based, multicast stream of props.
///
/// Clones share the same channel.
pub struct PropChannel<T: 'static> {
    inner: Arc<Inner<T>>,
}

impl<T: Clone + Send + Sync + 'static> PropChannel<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                listeners: Listeners::new(),
                completed: AtomicBool::new(false),
                delivery: ReentrantMutex::new(()),
            }),
        }
    }

    /// Deliver `value` to the current subscribers.
    ///
    /// Returns `false` if the channel is already completed; the value is dropped.
    pub fn send(&self, value: T) -> bool {
        let _delivery = self.inner.delivery.lock();
        if self.is_completed() {
            tracing::debug!("dropping props sent to a completed channel");
            return false;
        }
        let signal = Signal::Next(value);
        for listener in self.inner.listeners.snapshot() {
            listener(&signal);
        }
        true
    }

    /// Signal that no more values follow. Idempotent.
    pub fn complete(&self) {
        let _delivery = self.inner.delivery.lock();
        if self.inner.completed.swap(true, Ordering::SeqCst) {
            return;
        }
        for listener in self.inner.listeners.snapshot() {
            listener(&Signal::Complete);
        }
        self.inner.listeners.clear();
    }

    pub fn is_completed(&self) -> bool {
        self.inner.completed.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Observe every value sent from now on.
    ///
    /// Subscribing to a completed channel only yields [`Signal::Complete`].
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Signal<T>) + Send + Sync + 'static,
    {
        if self.is_completed() {
            listener(&Signal::Complete);
            return Subscription::new(|| {});
        }
        self.inner.listeners.add(Arc::new(listener))
    }

    /// The values sent from now on as an async stream, which ends on completion.
    pub fn stream(&self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let tx = Mutex::new(Some(tx));
        self.subscribe(move |signal| match signal {
            Signal::Next(value) => {
                if let Some(tx) = tx.lock().as_ref() {
                    // The receiver may be gone; the channel does not care.
                    let _ = tx.send(value.clone());
                }
            }
            Signal::Complete => {
                tx.lock().take();
            }
        })
        .detach();
        rx
    }
}

impl<T: Clone + Send + Sync + 'static> Default for PropChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Clone for PropChannel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> std::fmt::Debug for PropChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropChannel")
            .field("completed", &self.inner.completed.load(Ordering::SeqCst))
            .finish()
    }
}
