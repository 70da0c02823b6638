//! Rendering of extension slots.
//!
//! An [`ExtensionSlot`] is the read side of `components.extensions`: it mounts
//! one component per registration into the host container, keeps the mounted
//! set in sync with the registry on every render and tracks the rendered
//! fragments in the portal table.

use std::sync::Arc;

use uuid::Uuid;

use crate::component::Component;
use crate::context::GlobalStateContext;
use crate::element::{Element, PORTAL_ID_ATTRIBUTE};
use crate::error::{ActionError, ComponentError};
use crate::state::{ExtensionRegistration, PortalEntry, Reference};
use crate::value::Value;

/// Attribute naming the registration a fragment element belongs to.
pub const EXTENSION_REF_ATTRIBUTE: &str = "data-extension-ref";

struct Mounted {
    reference: Reference,
    element: Element,
    component: Box<dyn Component>,
}

pub struct ExtensionSlot {
    ctx: Arc<GlobalStateContext>,
    name: String,
    portal_id: String,
    container: Element,
    mounted: Vec<Mounted>,
}

impl ExtensionSlot {
    /// Create a slot for the extension `name`, rendering into `container`.
    pub fn new(ctx: Arc<GlobalStateContext>, name: &str, container: Element) -> Self {
        let portal_id = format!("{}:{}", name, Uuid::new_v4());
        container.set_attribute(PORTAL_ID_ATTRIBUTE, portal_id.as_str());
        Self {
            ctx,
            name: name.to_string(),
            portal_id,
            container,
            mounted: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn portal_id(&self) -> &str {
        &self.portal_id
    }

    pub fn container(&self) -> &Element {
        &self.container
    }

    /// Number of currently mounted fragments.
    pub fn len(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty()
    }

    /// Bring the mounted fragments in line with the current registrations.
    ///
    /// Every component receives `{ "params": defaults ⊕ params }` as props.
    /// Survivors are updated, removed registrations are unmounted and new
    /// ones are mounted after the survivors.
    pub fn render(&mut self, params: &Value) -> Result<(), ComponentError> {
        let registrations = self
            .ctx
            .read_state()
            .components
            .extensions
            .get(&self.name)
            .cloned()
            .unwrap_or_default();

        let mut previous = std::mem::take(&mut self.mounted);
        let before = previous.len();
        previous.retain_mut(|m| {
            let keep = registrations.iter().any(|r| r.reference == m.reference);
            if !keep {
                m.component.unmount();
                self.container.remove_child(&m.element);
            }
            keep
        });
        let removed = previous.len() != before;

        let result = self.reconcile(&registrations, &mut previous, removed, params);
        if result.is_err() {
            // Survivors not reached yet stay mounted so teardown can remove them.
            self.mounted.append(&mut previous);
        }
        result
    }

    fn reconcile(
        &mut self,
        registrations: &[ExtensionRegistration],
        previous: &mut Vec<Mounted>,
        removed: bool,
        params: &Value,
    ) -> Result<(), ComponentError> {
        if removed {
            // Portal entries can only be cleared as a whole.
            self.ctx.destroy_portal(&self.portal_id)?;
            for m in previous.iter() {
                self.ctx.show_portal(&self.portal_id, self.entry(m))?;
            }
        }

        for registration in registrations {
            let props = props(&registration.defaults, params);
            let position = previous
                .iter()
                .position(|m| m.reference == registration.reference);
            match position {
                Some(index) => {
                    let mut m = previous.remove(index);
                    let updated = m.component.update(&m.element, &props);
                    self.mounted.push(m);
                    updated?;
                }
                None => {
                    let element = self.container.append_child(Element::new("div"));
                    element.set_attribute(EXTENSION_REF_ATTRIBUTE, registration.reference.to_string());
                    let mut component = registration.component.instantiate();
                    if let Err(err) = component.mount(&element, &props) {
                        self.container.remove_child(&element);
                        return Err(err);
                    }
                    let m = Mounted {
                        reference: registration.reference,
                        element,
                        component,
                    };
                    tracing::debug!(slot = %self.name, reference = %m.reference, "extension mounted");
                    let entry = self.entry(&m);
                    self.mounted.push(m);
                    self.ctx.show_portal(&self.portal_id, entry)?;
                }
            }
        }
        Ok(())
    }

    /// Unmount every fragment and clear the slot's portal.
    pub fn teardown(&mut self) -> Result<(), ActionError> {
        for mut m in self.mounted.drain(..) {
            m.component.unmount();
            self.container.remove_child(&m.element);
        }
        tracing::debug!(slot = %self.name, "extension slot torn down");
        self.ctx.destroy_portal(&self.portal_id)
    }

    fn entry(&self, m: &Mounted) -> PortalEntry {
        PortalEntry {
            key: m.reference.to_string(),
            element: m.element.clone(),
        }
    }
}

fn props(defaults: &Value, params: &Value) -> Value {
    let mut props = Value::map();
    props.insert("params", defaults.merged(params));
    props
}
