//! The global state snapshot and everything it holds.
//!
//! A [`GlobalState`] is never mutated in place once published. Actions derive
//! a [`StatePatch`] from the current snapshot and the [`Atom`](crate::Atom)
//! merges it into the next one.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::component::ComponentType;
use crate::element::Element;
use crate::value::Value;

/// The layout class the application is currently rendered in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutType {
    Mobile,
    Tablet,
    #[default]
    Desktop,
}

impl std::str::FromStr for LayoutType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mobile" => Ok(LayoutType::Mobile),
            "tablet" => Ok(LayoutType::Tablet),
            "desktop" => Ok(LayoutType::Desktop),
            other => Err(format!("unknown layout: {}", other)),
        }
    }
}

impl fmt::Display for LayoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LayoutType::Mobile => "mobile",
            LayoutType::Tablet => "tablet",
            LayoutType::Desktop => "desktop",
        };
        f.write_str(s)
    }
}

/// Maximum widths (inclusive) of the mobile and tablet layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Breakpoints {
    pub mobile: u32,
    pub tablet: u32,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self {
            mobile: 480,
            tablet: 990,
        }
    }
}

impl Breakpoints {
    pub fn layout_for_width(&self, width: u32) -> LayoutType {
        if width <= self.mobile {
            LayoutType::Mobile
        } else if width <= self.tablet {
            LayoutType::Tablet
        } else {
            LayoutType::Desktop
        }
    }
}

/// Component slots the host fills in for app-level rendering.
#[derive(Debug, Clone)]
pub struct AppComponents {
    /// The progress indicator renderer.
    pub loader: ComponentType,
    /// The error renderer.
    pub error_info: ComponentType,
    /// The router context.
    pub router: ComponentType,
}

impl Default for AppComponents {
    fn default() -> Self {
        Self {
            loader: ComponentType::text("Loader", "div", "Loading..."),
            error_info: ComponentType::text("ErrorInfo", "div", "Something went wrong."),
            router: ComponentType::text("Router", "div", ""),
        }
    }
}

/// State of the application shell itself.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Information for the layout computation.
    pub layout: LayoutType,
    /// Whether a background loading activity is in progress.
    pub loading: bool,
    pub components: AppComponents,
    /// The exact application routes provided by the host.
    pub routes: BTreeMap<String, ComponentType>,
}

#[derive(Debug, Clone)]
pub struct PageRegistration {
    pub component: ComponentType,
    pub meta: Value,
}

impl PageRegistration {
    pub fn new(component: ComponentType) -> Self {
        Self {
            component,
            meta: Value::Null,
        }
    }
}

/// Identity token of an extension registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference(Uuid);

impl Reference {
    /// Create a new, unique reference.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for Reference {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ExtensionRegistration {
    pub component: ComponentType,
    pub reference: Reference,
    /// Params every rendering starts from; slot params override them.
    pub defaults: Value,
}

impl ExtensionRegistration {
    pub fn new(component: ComponentType) -> Self {
        Self {
            component,
            reference: Reference::new(),
            defaults: Value::Null,
        }
    }
}

/// Registered pages and extensions.
#[derive(Debug, Clone, Default)]
pub struct ComponentsState {
    pub pages: BTreeMap<String, PageRegistration>,
    pub extensions: BTreeMap<String, Vec<ExtensionRegistration>>,
}

/// Metadata of a loaded pilet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PiletMetadata {
    pub name: String,
    pub version: String,
    /// Names of the API surface the pilet exposes.
    pub api: Vec<String>,
    pub custom: Value,
}

impl PiletMetadata {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }
}

/// A mounted fragment tracked under a portal id.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalEntry {
    pub key: String,
    pub element: Element,
}

/// Where a shared data item should live beyond this process's memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataStoreTarget {
    #[default]
    Memory,
    Local,
    Session,
}

impl std::str::FromStr for DataStoreTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(DataStoreTarget::Memory),
            "local" => Ok(DataStoreTarget::Local),
            "session" => Ok(DataStoreTarget::Session),
            other => Err(format!("unknown data target: {}", other)),
        }
    }
}

/// A named, owned, optionally expiring value shared across pilets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedDataItem {
    pub value: Value,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub target: DataStoreTarget,
    /// Absolute expiry as Unix milliseconds; `None` never expires.
    #[serde(default)]
    pub expires: Option<i64>,
}

impl SharedDataItem {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }
}

pub type Pages = BTreeMap<String, PageRegistration>;
pub type Extensions = BTreeMap<String, Vec<ExtensionRegistration>>;
pub type Portals = BTreeMap<String, Vec<PortalEntry>>;
pub type DataMap = BTreeMap<String, SharedDataItem>;

/// One immutable snapshot of everything the host knows.
#[derive(Debug, Clone, Default)]
pub struct GlobalState {
    pub app: AppState,
    pub components: ComponentsState,
    /// Loaded pilets in load order.
    pub modules: Vec<PiletMetadata>,
    /// The mounted fragments per portal id.
    pub portals: Portals,
    pub data: DataMap,
    /// Branches owned by module-defined actions.
    pub custom: BTreeMap<String, Value>,
}

/// Replacement values for top-level branches of [`GlobalState`].
///
/// The merge is shallow: a branch that is set replaces the previous one
/// wholesale, branches left at `None` are carried over.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub app: Option<AppState>,
    pub components: Option<ComponentsState>,
    pub modules: Option<Vec<PiletMetadata>>,
    pub portals: Option<Portals>,
    pub data: Option<DataMap>,
    pub custom: Option<BTreeMap<String, Value>>,
}

impl StatePatch {
    /// A patch that changes nothing.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn app(mut self, app: AppState) -> Self {
        self.app = Some(app);
        self
    }

    pub fn components(mut self, components: ComponentsState) -> Self {
        self.components = Some(components);
        self
    }

    pub fn modules(mut self, modules: Vec<PiletMetadata>) -> Self {
        self.modules = Some(modules);
        self
    }

    pub fn portals(mut self, portals: Portals) -> Self {
        self.portals = Some(portals);
        self
    }

    pub fn data(mut self, data: DataMap) -> Self {
        self.data = Some(data);
        self
    }

    pub fn custom(mut self, custom: BTreeMap<String, Value>) -> Self {
        self.custom = Some(custom);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.app.is_none()
            && self.components.is_none()
            && self.modules.is_none()
            && self.portals.is_none()
            && self.data.is_none()
            && self.custom.is_none()
    }

    /// Build the next snapshot from `previous`.
    pub fn apply(self, previous: &GlobalState) -> GlobalState {
        GlobalState {
            app: self.app.unwrap_or_else(|| previous.app.clone()),
            components: self
                .components
                .unwrap_or_else(|| previous.components.clone()),
            modules: self.modules.unwrap_or_else(|| previous.modules.clone()),
            portals: self.portals.unwrap_or_else(|| previous.portals.clone()),
            data: self.data.unwrap_or_else(|| previous.data.clone()),
            custom: self.custom.unwrap_or_else(|| previous.custom.clone()),
        }
    }
}
