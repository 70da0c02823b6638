//! The host instance a debug shell drives.
//!
//! Time is a [`ManualClock`] so expiration can be stepped through with
//! `advance`. When the configuration names a `persist_dir`, stored shared
//! data is restored at startup and every later write is persisted.

use std::sync::Arc;

use piral_converter::{Converter, Disposer, Drivers, RunResult, Signal};
use piral_core::{
    pilet, ComponentType, DataOptions, Instance, InstanceConfig, ManualClock, PiletError,
    PiletMetadata, Subscription, Value,
};
use piral_persist::DataPersister;

use crate::DebugError;

pub struct DebugSession {
    instance: Instance,
    clock: ManualClock,
    converter: Converter,
    _persistence: Option<Subscription>,
}

impl DebugSession {
    pub fn new(config: InstanceConfig) -> Result<Self, DebugError> {
        let clock = ManualClock::starting_now();
        let converter = Converter::from_config(&config)?;
        let persist_dir = config.persist_dir.clone();
        let instance = Instance::with_clock(config, Arc::new(clock.clone()));

        let persistence = match persist_dir {
            Some(dir) => {
                let persister = DataPersister::with_local_dir(&dir)?;
                persister.restore(instance.context())?;
                tracing::info!(dir = %dir.display(), "persisting shared data");
                Some(persister.attach(instance.context()))
            }
            None => None,
        };

        Ok(Self {
            instance,
            clock,
            converter,
            _persistence: persistence,
        })
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Load a pilet described by its metadata alone.
    ///
    /// The metadata's `custom` field scripts the setup:
    ///
    /// ```json
    /// {
    ///   "name": "about",
    ///   "version": "1.0.0",
    ///   "custom": {
    ///     "pages": { "/about": "About us" },
    ///     "extensions": { "menu": "About" },
    ///     "data": { "greeting": "hello" },
    ///     "fail": "boom"
    ///   }
    /// }
    /// ```
    ///
    /// Pages render their text statically, extensions go through the
    /// converter and show their label next to the params they receive.
    /// A `fail` message makes setup fail after registering everything else.
    pub fn load_scripted(&self, meta: PiletMetadata) -> Result<(), PiletError> {
        let script = meta.custom.clone();
        let extensions: Vec<(String, ComponentType)> = entries(&script, "extensions")
            .map(|(slot, label)| {
                let name = format!("{}:{}", meta.name, slot);
                (slot, self.converter.convert(&name, labelled(label)))
            })
            .collect();

        let module = pilet(meta.clone(), move |api| {
            for (route, text) in entries(&script, "pages") {
                let name = format!("{}{}", api.meta().name, route);
                api.register_page(&route, ComponentType::text(&name, "main", &text))?;
            }
            for (slot, component) in &extensions {
                api.register_extension(slot, component.clone())?;
            }
            if let Some(Value::Map(data)) = script.get("data") {
                for (name, value) in data {
                    api.set_data(name, value.clone(), DataOptions::default())?;
                }
            }
            match script.get("fail").and_then(Value::as_str) {
                Some(message) => Err(PiletError::Setup {
                    name: api.meta().name.clone(),
                    message: message.to_string(),
                }),
                None => Ok(()),
            }
        });
        self.instance.load_pilet(&module)
    }
}

/// String entries of the map at `key`.
fn entries(script: &Value, key: &str) -> impl Iterator<Item = (String, String)> {
    let map = match script.get(key) {
        Some(Value::Map(map)) => map.clone(),
        _ => Default::default(),
    };
    map.into_iter()
        .map(|(k, v)| (k, v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string())))
}

/// A foreign run loop rendering `label` and the params it was given.
fn labelled(label: String) -> impl Fn(Drivers) -> RunResult + Send + Sync + 'static {
    move |drivers: Drivers| -> RunResult {
        let dom = drivers.dom.clone();
        let label = label.clone();
        let sub = drivers.props.subscribe(move |signal| match signal {
            Signal::Next(props) => {
                let params = props.get("params").cloned().unwrap_or_default();
                dom.set_text(label.clone());
                dom.set_attribute("data-params", params.to_string());
            }
            Signal::Complete => dom.clear_children(),
        });
        Ok(Disposer::new(move || drop(sub)))
    }
}
