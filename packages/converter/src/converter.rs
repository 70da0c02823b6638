//! Conversion of foreign entry points into host components.
//!
//! A foreign entry point ([`ForeignMain`]) is started against a pair of
//! drivers: a nested element it may render into freely, and the
//! [`PropChannel`] through which the host pushes props. The converted
//! [`ForeignComponent`] maps the host's mount/update/unmount calls onto
//! that pair.

use std::sync::Arc;

use piral_core::{Component, ComponentError, ComponentType, Element, InstanceConfig, Value};
use serde::{Deserialize, Serialize};

use crate::channel::PropChannel;
use crate::error::Result;
use crate::extension;

/// Tag of the element a foreign component is rendered into.
///
/// Foreign frameworks take over their root element and may drop attributes
/// the host keeps on it, so they always get a nested element of their own.
pub const HOST_TAG: &str = "slot";

/// What a foreign run loop is started with.
#[derive(Debug, Clone)]
pub struct Drivers {
    /// The nested element to render into.
    pub dom: Element,
    /// Props pushed by the host, starting with the initial props.
    pub props: PropChannel<Value>,
}

/// Releases whatever a foreign run loop holds. Runs at most once.
#[must_use = "dropping a Disposer disposes immediately"]
pub struct Disposer {
    dispose: Option<Box<dyn FnOnce() + Send>>,
}

impl Disposer {
    pub fn new(dispose: impl FnOnce() + Send + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    /// A disposer with nothing to release.
    pub fn noop() -> Self {
        Self { dispose: None }
    }

    pub fn dispose(mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl Drop for Disposer {
    fn drop(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl std::fmt::Debug for Disposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposer")
            .field("pending", &self.dispose.is_some())
            .finish()
    }
}

/// Outcome of starting a foreign run loop.
pub type RunResult = std::result::Result<Disposer, ComponentError>;

/// The entry point of a component written against a foreign framework.
///
/// `run` starts the framework's run loop. Errors are handed to the host's
/// error boundary as they are.
pub trait ForeignMain: Send + Sync {
    fn run(&self, drivers: Drivers) -> RunResult;
}

impl<F> ForeignMain for F
where
    F: Fn(Drivers) -> RunResult + Send + Sync,
{
    fn run(&self, drivers: Drivers) -> RunResult {
        self(drivers)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterOptions {
    /// Tag name of the placeholder element emitted for extension slots.
    pub root_name: String,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            root_name: "slot".to_string(),
        }
    }
}

impl ConverterOptions {
    /// Read options from the `converter` section of a host configuration.
    pub fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value.to_json())?)
    }
}

/// Turns foreign entry points into [`ComponentType`]s.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConverterOptions,
}

impl Converter {
    pub fn new(options: ConverterOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &InstanceConfig) -> Result<Self> {
        Ok(Self::new(ConverterOptions::from_value(&config.converter)?))
    }

    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }

    /// Wrap `main`; every mount point gets its own [`ForeignComponent`].
    pub fn convert<M>(&self, name: &str, main: M) -> ComponentType
    where
        M: ForeignMain + 'static,
    {
        let main: Arc<dyn ForeignMain> = Arc::new(main);
        let component_name = name.to_string();
        ComponentType::new(name, move || {
            Box::new(ForeignComponent::new(&component_name, main.clone()))
        })
    }

    /// The placeholder a foreign component renders to request the extension
    /// slot `name`.
    pub fn extension(&self, name: &str, params: &Value) -> Element {
        extension::placeholder(&self.options.root_name, name, params)
    }
}

struct Mounted {
    host: Element,
    nested: Element,
    disposer: Disposer,
}

/// A foreign entry point behind the host's component contract.
pub struct ForeignComponent {
    name: String,
    main: Arc<dyn ForeignMain>,
    props: PropChannel<Value>,
    mounted: Option<Mounted>,
}

impl ForeignComponent {
    pub fn new(name: &str, main: Arc<dyn ForeignMain>) -> Self {
        Self {
            name: name.to_string(),
            main,
            props: PropChannel::new(),
            mounted: None,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// The channel the next or current mount uses.
    pub fn channel(&self) -> &PropChannel<Value> {
        &self.props
    }
}

impl Component for ForeignComponent {
    fn mount(&mut self, element: &Element, props: &Value) -> std::result::Result<(), ComponentError> {
        if self.mounted.is_some() {
            return Err(ComponentError::AlreadyMounted(self.name.clone()));
        }

        let nested = element.append_child(Element::new(HOST_TAG));
        let drivers = Drivers {
            dom: nested.clone(),
            props: self.props.clone(),
        };
        let disposer = match self.main.run(drivers) {
            Ok(disposer) => disposer,
            Err(err) => {
                element.remove_child(&nested);
                return Err(err);
            }
        };
        self.mounted = Some(Mounted {
            host: element.clone(),
            nested,
            disposer,
        });
        tracing::debug!(component = %self.name, "foreign component mounted");

        // The run loop is subscribed by now, so the initial props are seen.
        self.props.send(props.clone());
        Ok(())
    }

    fn update(&mut self, _element: &Element, props: &Value) -> std::result::Result<(), ComponentError> {
        if self.mounted.is_none() {
            return Err(ComponentError::NotMounted(self.name.clone()));
        }
        self.props.send(props.clone());
        Ok(())
    }

    fn unmount(&mut self) {
        let Some(mounted) = self.mounted.take() else {
            return;
        };
        self.props.complete();
        mounted.disposer.dispose();
        mounted.host.remove_child(&mounted.nested);
        self.props = PropChannel::new();
        tracing::debug!(component = %self.name, "foreign component unmounted");
    }
}

impl Drop for ForeignComponent {
    fn drop(&mut self) {
        self.unmount();
    }
}
