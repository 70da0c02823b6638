//! The uniform component contract.
//!
//! Every mountable unit, whether written against the host directly or
//! converted from a foreign UI framework, implements [`Component`]. The
//! rendering layer decides when to call `mount`, `update` and `unmount` and
//! provides the element to mount into.

use std::fmt;
use std::sync::Arc;

use crate::element::Element;
use crate::error::ComponentError;
use crate::value::Value;

/// A mountable unit of UI.
pub trait Component: Send {
    /// Render into `element` with the initial props.
    fn mount(&mut self, element: &Element, props: &Value) -> Result<(), ComponentError>;

    /// Push new props to a mounted instance.
    fn update(&mut self, element: &Element, props: &Value) -> Result<(), ComponentError>;

    /// Tear the instance down and free its resources.
    fn unmount(&mut self);
}

type Factory = dyn Fn() -> Box<dyn Component> + Send + Sync;

/// A named component factory, as stored in registrations.
///
/// Each mount point instantiates its own [`Component`], so the same
/// registration can be rendered in several places at once.
#[derive(Clone)]
pub struct ComponentType {
    name: Arc<str>,
    factory: Arc<Factory>,
}

impl ComponentType {
    pub fn new<F>(name: &str, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Component> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            factory: Arc::new(factory),
        }
    }

    /// A component that renders a single element holding `text`.
    pub fn text(name: &str, tag: &str, text: &str) -> Self {
        let tag = tag.to_string();
        let text = text.to_string();
        Self::new(name, move || {
            Box::new(StaticComponent {
                tag: tag.clone(),
                text: text.clone(),
                rendered: None,
            })
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create a fresh, unmounted instance.
    pub fn instantiate(&self) -> Box<dyn Component> {
        (self.factory)()
    }

    /// Check whether both handles share the same factory.
    pub fn ptr_eq(&self, other: &ComponentType) -> bool {
        Arc::ptr_eq(&self.factory, &other.factory)
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentType({})", self.name)
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// Renders `<tag>text</tag>` into a child of the host element.
struct StaticComponent {
    tag: String,
    text: String,
    rendered: Option<(Element, Element)>,
}

impl Component for StaticComponent {
    fn mount(&mut self, element: &Element, _props: &Value) -> Result<(), ComponentError> {
        if self.rendered.is_some() {
            return Err(ComponentError::AlreadyMounted(self.tag.clone()));
        }
        let child = element.append_child(Element::new(self.tag.as_str()));
        child.set_text(self.text.as_str());
        self.rendered = Some((element.clone(), child));
        Ok(())
    }

    fn update(&mut self, _element: &Element, _props: &Value) -> Result<(), ComponentError> {
        match self.rendered {
            Some(_) => Ok(()),
            None => Err(ComponentError::NotMounted(self.tag.clone())),
        }
    }

    fn unmount(&mut self) {
        if let Some((host, child)) = self.rendered.take() {
            host.remove_child(&child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_component_lifecycle() {
        let ty = ComponentType::text("Loader", "div", "Loading...");
        let host = Element::new("main");
        let mut instance = ty.instantiate();

        instance.mount(&host, &Value::Null).unwrap();
        assert_eq!(host.to_markup(), "<main><div>Loading...</div></main>");
        assert!(instance.mount(&host, &Value::Null).is_err());

        instance.update(&host, &Value::Null).unwrap();
        instance.unmount();
        assert!(host.children().is_empty());
        assert!(instance.update(&host, &Value::Null).is_err());
    }

    #[test]
    fn equality_is_factory_identity() {
        let a = ComponentType::text("A", "div", "a");
        let b = ComponentType::text("A", "div", "a");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(format!("{:?}", a), "ComponentType(A)");
    }
}
