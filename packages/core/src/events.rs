//! Host-wide events.
//!
//! The core emits events for things external collaborators react to, most
//! notably `store-data`, which the persistence layer observes to save
//! `local` and `session` items. Pilets may emit custom events as well.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::state::{DataStoreTarget, PiletMetadata};
use crate::subscription::{Listeners, Subscription};
use crate::value::Value;

pub const STORE_DATA: &str = "store-data";
pub const LOAD_PILET: &str = "load-pilet";
pub const UNLOAD_PILET: &str = "unload-pilet";

/// Payload of a `store-data` event. A `Null` value means the item was removed.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreDataEvent {
    pub name: String,
    pub value: Value,
    pub owner: Option<String>,
    pub target: DataStoreTarget,
    pub expires: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PiralEvent {
    StoreData(StoreDataEvent),
    LoadPilet(PiletMetadata),
    UnloadPilet { name: String },
    Custom { name: String, payload: Value },
}

impl PiralEvent {
    pub fn name(&self) -> &str {
        match self {
            PiralEvent::StoreData(_) => STORE_DATA,
            PiralEvent::LoadPilet(_) => LOAD_PILET,
            PiralEvent::UnloadPilet { .. } => UNLOAD_PILET,
            PiralEvent::Custom { name, .. } => name,
        }
    }
}

type Handler = dyn Fn(&PiralEvent) + Send + Sync;

/// Synchronous, name-keyed event emitter. Clones share their handlers.
#[derive(Clone, Default)]
pub struct EventEmitter {
    handlers: Arc<Mutex<BTreeMap<String, Arc<Listeners<Handler>>>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `handler` for every event named `name`.
    pub fn on<F>(&self, name: &str, handler: F) -> Subscription
    where
        F: Fn(&PiralEvent) + Send + Sync + 'static,
    {
        let listeners = self
            .handlers
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Listeners::new()))
            .clone();
        listeners.add(Arc::new(handler))
    }

    /// Deliver `event` to its handlers in registration order.
    pub fn emit(&self, event: &PiralEvent) {
        let listeners = self.handlers.lock().get(event.name()).cloned();
        if let Some(listeners) = listeners {
            for handler in listeners.snapshot() {
                handler(event);
            }
        }
    }

    pub fn handler_count(&self, name: &str) -> usize {
        self.handlers
            .lock()
            .get(name)
            .map(|listeners| listeners.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_reaches_only_matching_handlers() {
        let emitter = EventEmitter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        let _a = emitter.on("greet", move |e| s.lock().push(e.name().to_string()));
        let s = seen.clone();
        let _b = emitter.on(UNLOAD_PILET, move |e| s.lock().push(e.name().to_string()));

        emitter.emit(&PiralEvent::Custom {
            name: "greet".to_string(),
            payload: Value::Null,
        });

        assert_eq!(*seen.lock(), vec!["greet"]);
    }

    #[test]
    fn dropped_handler_stops_receiving() {
        let emitter = EventEmitter::new();
        let sub = emitter.on(STORE_DATA, |_| panic!("must not be called"));
        assert_eq!(emitter.handler_count(STORE_DATA), 1);
        drop(sub);

        emitter.emit(&PiralEvent::StoreData(StoreDataEvent {
            name: "x".to_string(),
            value: Value::Null,
            owner: None,
            target: DataStoreTarget::Memory,
            expires: None,
        }));
        assert_eq!(emitter.handler_count(STORE_DATA), 0);
    }
}
