//! Piral Core: the host runtime's state layer
//!
//! This crate holds everything a host application and its pilets share:
//! - `Atom`: the single source of truth, one immutable `GlobalState` at a time
//! - `GlobalStateContext`: the atom plus a name-keyed, runtime-extensible action table
//! - shared data with ownership and expiration (`tryWriteDataItem`)
//! - page, extension, module and portal registries
//! - `Component`: the uniform mount/update/unmount contract
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use piral_core::{DataStoreTarget, GlobalStateContext, Value};
//!
//! let ctx = Arc::new(GlobalStateContext::default());
//! let ok = ctx
//!     .try_write_data_item("theme", Value::from("dark"), Some("shell"), DataStoreTarget::Memory, None)
//!     .unwrap();
//! assert!(ok);
//! assert_eq!(ctx.read_data_value("theme").unwrap(), Some(Value::from("dark")));
//! ```

pub mod actions;
mod atom;
mod clock;
mod component;
mod config;
mod context;
mod element;
mod error;
pub mod events;
mod instance;
mod pilet;
mod slot;
mod state;
mod subscription;
mod value;
mod view;

pub use actions::{action, may_write, names, ActionFn, Args, Payload};
pub use atom::Atom;
pub use clock::{Clock, ManualClock, SystemClock};
pub use component::{Component, ComponentType};
pub use config::InstanceConfig;
pub use context::GlobalStateContext;
pub use element::{Element, PORTAL_ID_ATTRIBUTE};
pub use error::{ActionError, ComponentError, ConfigError, PiletError, Result};
pub use events::{EventEmitter, PiralEvent, StoreDataEvent};
pub use instance::Instance;
pub use pilet::{pilet, DataOptions, FnPilet, Pilet, PiletApi};
pub use slot::{ExtensionSlot, EXTENSION_REF_ATTRIBUTE};
pub use state::{
    AppComponents, AppState, Breakpoints, ComponentsState, DataMap, DataStoreTarget,
    ExtensionRegistration, Extensions, GlobalState, LayoutType, PageRegistration, Pages,
    PiletMetadata, PortalEntry, Portals, Reference, SharedDataItem, StatePatch,
};
pub use subscription::{Listeners, Subscription};
pub use value::Value;
pub use view::{resolve_view, ErrorKind, View};
