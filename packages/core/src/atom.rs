//! The state container.
//!
//! An [`Atom`] holds exactly one published [`GlobalState`] snapshot. Reads
//! clone an `Arc` and never observe a half-merged state. Writes go through
//! [`Atom::update`], which queues the update function and lets a single
//! writer drain the queue in invocation order:
//!
//! - an update issued from inside another update (or from a listener) on the
//!   same thread is queued and applied right after the current one
//! - updates from other threads wait for the active writer, which may apply
//!   them on their behalf; either way they are applied before `update`
//!   returns to their caller
//!
//! [`Atom::update_then`] additionally runs a follow-up once its update has
//! been published and every listener has seen the result.

use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, RwLock};

use crate::state::{GlobalState, StatePatch};
use crate::subscription::{Listeners, Subscription};

type Updater = Box<dyn FnOnce(&GlobalState) -> StatePatch + Send>;
type FollowUp = Box<dyn FnOnce(&Arc<GlobalState>) + Send>;
type StateListener = dyn Fn(&Arc<GlobalState>) + Send + Sync;

pub struct Atom {
    current: RwLock<Arc<GlobalState>>,
    queue: Mutex<VecDeque<(Updater, Option<FollowUp>)>>,
    draining: ReentrantMutex<Cell<bool>>,
    listeners: Listeners<StateListener>,
}

/// Resets the draining flag even if an update function panics.
struct DrainFlag<'a>(&'a Cell<bool>);

impl Drop for DrainFlag<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Atom {
    pub fn new(initial: GlobalState) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            queue: Mutex::new(VecDeque::new()),
            draining: ReentrantMutex::new(Cell::new(false)),
            listeners: Listeners::new(),
        }
    }

    /// The current snapshot.
    pub fn read(&self) -> Arc<GlobalState> {
        self.current.read().clone()
    }

    /// Derive a patch from the current snapshot and publish the merged result.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&GlobalState) -> StatePatch + Send + 'static,
    {
        self.enqueue(Box::new(f), None);
        self.drain();
    }

    /// Like [`Atom::update`], then call `then` with the snapshot current
    /// after the update, once listeners were notified.
    pub fn update_then<F, T>(&self, f: F, then: T)
    where
        F: FnOnce(&GlobalState) -> StatePatch + Send + 'static,
        T: FnOnce(&Arc<GlobalState>) + Send + 'static,
    {
        self.enqueue(Box::new(f), Some(Box::new(then)));
        self.drain();
    }

    /// Queue an update without applying it.
    pub(crate) fn enqueue(&self, f: Updater, then: Option<FollowUp>) {
        self.queue.lock().push_back((f, then));
    }

    /// Apply every queued update.
    ///
    /// Returns `false` when called from inside a running drain on this
    /// thread: the queue is then left to that drain.
    pub(crate) fn drain(&self) -> bool {
        let guard = self.draining.lock();
        if guard.get() {
            return false;
        }
        guard.set(true);
        let _flag = DrainFlag(&*guard);

        loop {
            let next = self.queue.lock().pop_front();
            let Some((updater, then)) = next else { break };

            let previous = self.read();
            let patch = updater(&previous);
            if !patch.is_empty() {
                let published = Arc::new(patch.apply(&previous));
                *self.current.write() = published.clone();

                for listener in self.listeners.snapshot() {
                    listener(&published);
                }
            }

            if let Some(then) = then {
                then(&self.read());
            }
        }
        true
    }

    /// Call `listener` with every newly published snapshot.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<GlobalState>) + Send + Sync + 'static,
    {
        self.listeners.add(Arc::new(listener))
    }
}

impl Default for Atom {
    fn default() -> Self {
        Self::new(GlobalState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AppState, PiletMetadata};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn set_loading(loading: bool) -> impl FnOnce(&GlobalState) -> StatePatch + Send {
        move |s: &GlobalState| {
            StatePatch::none().app(AppState {
                loading,
                ..s.app.clone()
            })
        }
    }

    #[test]
    fn update_publishes_new_snapshot() {
        let atom = Atom::default();
        let before = atom.read();
        atom.update(set_loading(true));
        let after = atom.read();

        assert!(!before.app.loading);
        assert!(after.app.loading);
    }

    #[test]
    fn snapshot_changes_all_fields_of_an_update_at_once() {
        let atom = Atom::default();
        let before = atom.read();

        atom.update(|s| {
            let mut modules = s.modules.clone();
            modules.push(PiletMetadata::new("a", "1.0.0"));
            StatePatch::none()
                .modules(modules)
                .app(AppState {
                    loading: true,
                    ..s.app.clone()
                })
        });

        // The old snapshot is untouched, the new one has both changes.
        assert!(before.modules.is_empty() && !before.app.loading);
        let after = atom.read();
        assert_eq!(after.modules.len(), 1);
        assert!(after.app.loading);
    }

    #[test]
    fn empty_patch_publishes_nothing() {
        let atom = Atom::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let _sub = atom.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        let before = atom.read();
        atom.update(|_| StatePatch::none());
        assert!(Arc::ptr_eq(&before, &atom.read()));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn reentrant_update_is_applied_after_the_current_one() {
        let atom = Arc::new(Atom::default());
        let inner = atom.clone();

        atom.update(move |s| {
            // Queued: it must see the result of this outer update.
            inner.update(|s| {
                let mut modules = s.modules.clone();
                modules.push(PiletMetadata::new("second", "1.0.0"));
                StatePatch::none().modules(modules)
            });
            let mut modules = s.modules.clone();
            modules.push(PiletMetadata::new("first", "1.0.0"));
            StatePatch::none().modules(modules)
        });

        let names: Vec<_> = atom.read().modules.iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn listener_may_update_reentrantly() {
        let atom = Arc::new(Atom::default());
        let inner = atom.clone();
        let _sub = atom.subscribe(move |state| {
            if state.app.loading {
                inner.update(set_loading(false));
            }
        });

        atom.update(set_loading(true));
        assert!(!atom.read().app.loading);
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let atom = Arc::new(Atom::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let atom = atom.clone();
                std::thread::spawn(move || {
                    for j in 0..25 {
                        atom.update(move |s| {
                            let mut modules = s.modules.clone();
                            modules.push(PiletMetadata::new(format!("{}-{}", i, j), "1"));
                            StatePatch::none().modules(modules)
                        });
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(atom.read().modules.len(), 200);
    }

    #[test]
    fn follow_up_runs_after_listeners() {
        let atom = Arc::new(Atom::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = seen.clone();
        let _sub = atom.subscribe(move |state| {
            log.lock().push(format!("listener {}", state.app.loading));
        });

        let log = seen.clone();
        atom.update_then(set_loading(true), move |state| {
            log.lock().push(format!("then {}", state.app.loading));
        });

        assert_eq!(*seen.lock(), vec!["listener true", "then true"]);
    }

    #[test]
    fn queued_follow_up_waits_for_its_update() {
        let atom = Arc::new(Atom::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let inner = atom.clone();
        let log = seen.clone();
        let _sub = atom.subscribe(move |state| {
            if state.app.loading {
                let log = log.clone();
                inner.update_then(set_loading(false), move |state| {
                    log.lock().push(state.app.loading);
                });
                // Not applied yet: this listener runs inside the drain.
                assert!(inner.read().app.loading);
            }
        });

        atom.update(set_loading(true));
        assert_eq!(*seen.lock(), vec![false]);
    }

    #[test]
    fn update_is_visible_when_it_returns() {
        let atom = Atom::default();
        for _ in 0..3 {
            atom.update(|s| {
                let mut modules = s.modules.clone();
                modules.push(PiletMetadata::default());
                StatePatch::none().modules(modules)
            });
        }
        assert_eq!(atom.read().modules.len(), 3);
    }
}
