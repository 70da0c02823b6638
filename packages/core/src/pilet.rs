//! The per-pilet API surface.
//!
//! A [`PiletApi`] is handed to a pilet's setup. It forwards to the context's
//! actions with the pilet's name as data owner and remembers everything the
//! pilet registered, so [`PiletApi::teardown`] can undo it on unload.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use crate::component::ComponentType;
use crate::context::GlobalStateContext;
use crate::error::{ActionError, PiletError};
use crate::events::PiralEvent;
use crate::state::{
    DataStoreTarget, ExtensionRegistration, PageRegistration, PiletMetadata, PortalEntry,
    Reference,
};
use crate::subscription::Subscription;
use crate::value::Value;

/// A loadable module.
pub trait Pilet: Send + Sync {
    fn metadata(&self) -> PiletMetadata;

    /// Register the pilet's pages, extensions and data.
    fn setup(&self, api: &mut PiletApi) -> Result<(), PiletError>;
}

/// A [`Pilet`] made of metadata and a setup closure.
pub struct FnPilet<F> {
    meta: PiletMetadata,
    setup: F,
}

/// Create a pilet from its metadata and a setup closure.
pub fn pilet<F>(meta: PiletMetadata, setup: F) -> FnPilet<F>
where
    F: Fn(&mut PiletApi) -> Result<(), PiletError> + Send + Sync,
{
    FnPilet { meta, setup }
}

impl<F> Pilet for FnPilet<F>
where
    F: Fn(&mut PiletApi) -> Result<(), PiletError> + Send + Sync,
{
    fn metadata(&self) -> PiletMetadata {
        self.meta.clone()
    }

    fn setup(&self, api: &mut PiletApi) -> Result<(), PiletError> {
        (self.setup)(api)
    }
}

/// Options for [`PiletApi::set_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataOptions {
    pub target: DataStoreTarget,
    /// Lifetime relative to the write; `None` never expires.
    pub expires: Option<Duration>,
}

impl DataOptions {
    pub fn target(target: DataStoreTarget) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn expires_in(mut self, duration: Duration) -> Self {
        self.expires = Some(duration);
        self
    }
}

#[derive(Default)]
struct Registrations {
    pages: BTreeMap<String, ComponentType>,
    extensions: Vec<(String, Reference)>,
    data: BTreeSet<String>,
    portals: BTreeSet<String>,
    subscriptions: Vec<Subscription>,
}

pub struct PiletApi {
    ctx: Arc<GlobalStateContext>,
    meta: PiletMetadata,
    registered: Registrations,
}

impl PiletApi {
    pub fn new(ctx: Arc<GlobalStateContext>, meta: PiletMetadata) -> Self {
        Self {
            ctx,
            meta,
            registered: Registrations::default(),
        }
    }

    pub fn meta(&self) -> &PiletMetadata {
        &self.meta
    }

    /// The host context, e.g. for defining actions.
    pub fn context(&self) -> &Arc<GlobalStateContext> {
        &self.ctx
    }

    pub fn register_page(&mut self, route: &str, component: ComponentType) -> Result<(), ActionError> {
        self.register_page_with_meta(route, component, Value::Null)
    }

    pub fn register_page_with_meta(
        &mut self,
        route: &str,
        component: ComponentType,
        meta: Value,
    ) -> Result<(), ActionError> {
        self.ctx.register_page(
            route,
            PageRegistration {
                component: component.clone(),
                meta,
            },
        )?;
        self.registered.pages.insert(route.to_string(), component);
        Ok(())
    }

    pub fn unregister_page(&mut self, route: &str) -> Result<(), ActionError> {
        self.ctx.unregister_page(route)?;
        self.registered.pages.remove(route);
        Ok(())
    }

    pub fn register_extension(
        &mut self,
        name: &str,
        component: ComponentType,
    ) -> Result<Reference, ActionError> {
        self.register_extension_with_defaults(name, component, Value::Null)
    }

    pub fn register_extension_with_defaults(
        &mut self,
        name: &str,
        component: ComponentType,
        defaults: Value,
    ) -> Result<Reference, ActionError> {
        let registration = ExtensionRegistration {
            defaults,
            ..ExtensionRegistration::new(component)
        };
        let reference = registration.reference;
        self.ctx.register_extension(name, registration)?;
        self.registered.extensions.push((name.to_string(), reference));
        Ok(reference)
    }

    pub fn unregister_extension(&mut self, name: &str, reference: Reference) -> Result<(), ActionError> {
        self.ctx.unregister_extension(name, reference)?;
        self.registered
            .extensions
            .retain(|(n, r)| !(n == name && *r == reference));
        Ok(())
    }

    pub fn get_data(&self, name: &str) -> Result<Option<Value>, ActionError> {
        self.ctx.read_data_value(name)
    }

    /// Write a shared data item owned by this pilet. `Value::Null` releases it.
    pub fn set_data(&mut self, name: &str, value: Value, options: DataOptions) -> Result<bool, ActionError> {
        let release = value.is_null();
        let accepted = self.ctx.try_write_data_item(
            name,
            value,
            Some(self.meta.name.as_str()),
            options.target,
            options.expires,
        )?;
        if accepted {
            if release {
                self.registered.data.remove(name);
            } else {
                self.registered.data.insert(name.to_string());
            }
        }
        Ok(accepted)
    }

    pub fn show_portal(&mut self, id: &str, entry: PortalEntry) -> Result<(), ActionError> {
        self.ctx.show_portal(id, entry)?;
        self.registered.portals.insert(id.to_string());
        Ok(())
    }

    pub fn emit(&self, name: &str, payload: Value) {
        self.ctx.emit(&PiralEvent::Custom {
            name: name.to_string(),
            payload,
        });
    }

    /// Listen to host events until the pilet is unloaded.
    pub fn on<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&PiralEvent) + Send + Sync + 'static,
    {
        let subscription = self.ctx.on(name, handler);
        self.registered.subscriptions.push(subscription);
    }

    /// Undo every registration made through this API.
    pub fn teardown(&mut self) -> Result<(), ActionError> {
        let registered = std::mem::take(&mut self.registered);
        drop(registered.subscriptions);

        let pages = self.ctx.read_state().components.pages.clone();
        for (route, component) in &registered.pages {
            // The route may have been taken over by someone else since.
            if pages.get(route).is_some_and(|p| p.component.ptr_eq(component)) {
                self.ctx.unregister_page(route)?;
            }
        }
        for (name, reference) in &registered.extensions {
            self.ctx.unregister_extension(name, *reference)?;
        }
        for name in &registered.data {
            let target = self
                .ctx
                .read_data_item(name)?
                .map(|item| item.target)
                .unwrap_or_default();
            // Rejected if the item expired and was claimed by another owner.
            self.ctx.try_write_data_item(
                name,
                Value::Null,
                Some(self.meta.name.as_str()),
                target,
                None,
            )?;
        }
        for id in &registered.portals {
            self.ctx.destroy_portal(id)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for PiletApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PiletApi")
            .field("pilet", &self.meta.name)
            .field("pages", &self.registered.pages.keys().collect::<Vec<_>>())
            .field("extensions", &self.registered.extensions.len())
            .field("data", &self.registered.data)
            .finish()
    }
}
