//! A running host instance.
//!
//! The [`Instance`] owns the context handle and the API objects of loaded
//! pilets, and is the entry point for loading and unloading them.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::config::InstanceConfig;
use crate::context::GlobalStateContext;
use crate::error::{ActionError, PiletError};
use crate::pilet::{Pilet, PiletApi};

pub struct Instance {
    ctx: Arc<GlobalStateContext>,
    config: InstanceConfig,
    pilets: Mutex<BTreeMap<String, PiletApi>>,
}

impl Instance {
    pub fn new(config: InstanceConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: InstanceConfig, clock: Arc<dyn Clock>) -> Self {
        let ctx = GlobalStateContext::new(config.initial_state(), clock);
        Self {
            ctx: Arc::new(ctx),
            config,
            pilets: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn context(&self) -> &Arc<GlobalStateContext> {
        &self.ctx
    }

    pub fn config(&self) -> &InstanceConfig {
        &self.config
    }

    /// Names of the loaded pilets, sorted.
    pub fn loaded_pilets(&self) -> Vec<String> {
        self.pilets.lock().keys().cloned().collect()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.pilets.lock().contains_key(name)
    }

    /// Add the pilet's metadata and run its setup.
    ///
    /// If setup fails, whatever it registered is undone and the metadata is
    /// removed again.
    pub fn load_pilet(&self, pilet: &dyn Pilet) -> Result<(), PiletError> {
        let meta = pilet.metadata();
        let name = meta.name.clone();
        if self.is_loaded(&name) {
            return Err(PiletError::AlreadyLoaded(name));
        }

        self.ctx.add_pilet(meta.clone())?;
        let mut api = PiletApi::new(self.ctx.clone(), meta);

        if let Err(err) = pilet.setup(&mut api) {
            tracing::warn!(pilet = %name, error = %err, "pilet setup failed, rolling back");
            api.teardown()?;
            self.ctx.remove_pilet(&name)?;
            return Err(match err {
                PiletError::Setup { .. } => err,
                other => PiletError::Setup {
                    name,
                    message: other.to_string(),
                },
            });
        }

        tracing::info!(pilet = %name, version = %api.meta().version, "pilet loaded");
        self.pilets.lock().insert(name, api);
        Ok(())
    }

    /// Undo everything the pilet registered and remove its metadata.
    pub fn unload_pilet(&self, name: &str) -> Result<(), PiletError> {
        let mut api = self
            .pilets
            .lock()
            .remove(name)
            .ok_or_else(|| PiletError::NotLoaded(name.to_string()))?;

        api.teardown()?;
        self.ctx.remove_pilet(name)?;
        tracing::info!(pilet = %name, "pilet unloaded");
        Ok(())
    }

    /// Set the layout that matches a viewport of `width` pixels.
    pub fn resize(&self, width: u32) -> Result<(), ActionError> {
        self.ctx
            .change_layout(self.config.breakpoints.layout_for_width(width))
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new(InstanceConfig::default())
    }
}
