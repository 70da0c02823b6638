//! The action dispatch layer.
//!
//! Actions are named functions resolved at call time from a mutable table on
//! the [`GlobalStateContext`]. A later definition under the same name replaces
//! the earlier one, which lets a pilet wrap or shadow a built-in action. All
//! actions share one signature: they receive the context and an [`Args`] list
//! of [`Payload`]s and return a `Payload`.

use std::sync::Arc;
use std::time::Duration;

use crate::context::GlobalStateContext;
use crate::error::{ActionError, Result};
use crate::state::{
    DataStoreTarget, ExtensionRegistration, LayoutType, PageRegistration, PiletMetadata,
    PortalEntry, Reference, SharedDataItem,
};
use crate::value::Value;

mod app;
mod components;
mod data;
mod pilets;
mod portal;

pub use data::may_write;
pub(crate) use data::DataLedger;

/// Names of the built-in actions.
pub mod names {
    pub const READ_DATA_VALUE: &str = "readDataValue";
    pub const READ_DATA_ITEM: &str = "readDataItem";
    pub const TRY_WRITE_DATA_ITEM: &str = "tryWriteDataItem";
    pub const WRITE_DATA_ITEM: &str = "writeDataItem";
    pub const CHANGE_LAYOUT: &str = "changeLayout";
    pub const SET_LOADING: &str = "setLoading";
    pub const SET_CUSTOM: &str = "setCustom";
    pub const REGISTER_PAGE: &str = "registerPage";
    pub const UNREGISTER_PAGE: &str = "unregisterPage";
    pub const REGISTER_EXTENSION: &str = "registerExtension";
    pub const UNREGISTER_EXTENSION: &str = "unregisterExtension";
    pub const SHOW_PORTAL: &str = "showPortal";
    pub const DESTROY_PORTAL: &str = "destroyPortal";
    pub const ADD_PILET: &str = "addPilet";
    pub const REMOVE_PILET: &str = "removePilet";
}

/// An argument to, or the result of, an action.
#[derive(Debug, Clone)]
pub enum Payload {
    Unit,
    Bool(bool),
    Text(String),
    Value(Value),
    Duration(Duration),
    Layout(LayoutType),
    Target(DataStoreTarget),
    Item(SharedDataItem),
    Page(PageRegistration),
    Extension(ExtensionRegistration),
    Reference(Reference),
    Portal(PortalEntry),
    Pilet(PiletMetadata),
}

impl From<&str> for Payload {
    fn from(v: &str) -> Self {
        Payload::Text(v.to_string())
    }
}

impl From<String> for Payload {
    fn from(v: String) -> Self {
        Payload::Text(v)
    }
}

impl From<bool> for Payload {
    fn from(v: bool) -> Self {
        Payload::Bool(v)
    }
}

impl From<Value> for Payload {
    fn from(v: Value) -> Self {
        Payload::Value(v)
    }
}

impl<T: Into<Payload>> From<Option<T>> for Payload {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Payload::Unit)
    }
}

/// The positional arguments of one action call.
#[derive(Debug, Clone)]
pub struct Args {
    action: String,
    items: Vec<Payload>,
}

macro_rules! required {
    ($(#[$doc:meta])* $fn_name:ident, $variant:ident, $ty:ty, $expected:literal) => {
        $(#[$doc])*
        pub fn $fn_name(&self, index: usize) -> Result<&$ty> {
            match self.items.get(index) {
                Some(Payload::$variant(v)) => Ok(v),
                _ => Err(self.invalid(index, $expected)),
            }
        }
    };
}

impl Args {
    pub fn new(action: impl Into<String>, items: Vec<Payload>) -> Self {
        Self {
            action: action.into(),
            items,
        }
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn items(&self) -> &[Payload] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn invalid(&self, index: usize, expected: &'static str) -> ActionError {
        ActionError::InvalidArgument {
            action: self.action.clone(),
            index,
            expected,
        }
    }

    required!(text, Text, String, "text");
    required!(value, Value, Value, "value");
    required!(layout, Layout, LayoutType, "layout");
    required!(target, Target, DataStoreTarget, "data store target");
    required!(page, Page, PageRegistration, "page registration");
    required!(extension, Extension, ExtensionRegistration, "extension registration");
    required!(reference, Reference, Reference, "reference");
    required!(portal, Portal, PortalEntry, "portal entry");
    required!(pilet, Pilet, PiletMetadata, "pilet metadata");

    pub fn boolean(&self, index: usize) -> Result<bool> {
        match self.items.get(index) {
            Some(Payload::Bool(b)) => Ok(*b),
            _ => Err(self.invalid(index, "bool")),
        }
    }

    /// Text argument where `Unit`, a missing argument or `""` mean "none".
    pub fn opt_text(&self, index: usize) -> Result<Option<&str>> {
        match self.items.get(index) {
            None | Some(Payload::Unit) => Ok(None),
            Some(Payload::Text(s)) if s.is_empty() => Ok(None),
            Some(Payload::Text(s)) => Ok(Some(s)),
            _ => Err(self.invalid(index, "optional text")),
        }
    }

    pub fn opt_duration(&self, index: usize) -> Result<Option<Duration>> {
        match self.items.get(index) {
            None | Some(Payload::Unit) => Ok(None),
            Some(Payload::Duration(d)) => Ok(Some(*d)),
            _ => Err(self.invalid(index, "optional duration")),
        }
    }

    pub fn opt_item(&self, index: usize) -> Result<Option<&SharedDataItem>> {
        match self.items.get(index) {
            None | Some(Payload::Unit) => Ok(None),
            Some(Payload::Item(item)) => Ok(Some(item)),
            _ => Err(self.invalid(index, "optional shared data item")),
        }
    }
}

/// A dynamically defined action.
pub type ActionFn = Arc<dyn Fn(&GlobalStateContext, Args) -> Result<Payload> + Send + Sync>;

/// Wrap a closure as an [`ActionFn`].
pub fn action<F>(f: F) -> ActionFn
where
    F: Fn(&GlobalStateContext, Args) -> Result<Payload> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The actions every context starts with.
pub fn base_actions() -> Vec<(&'static str, ActionFn)> {
    vec![
        (names::READ_DATA_VALUE, action(data::read_data_value)),
        (names::READ_DATA_ITEM, action(data::read_data_item)),
        (names::TRY_WRITE_DATA_ITEM, action(data::try_write_data_item)),
        (names::WRITE_DATA_ITEM, action(data::write_data_item)),
        (names::CHANGE_LAYOUT, action(app::change_layout)),
        (names::SET_LOADING, action(app::set_loading)),
        (names::SET_CUSTOM, action(app::set_custom)),
        (names::REGISTER_PAGE, action(components::register_page)),
        (names::UNREGISTER_PAGE, action(components::unregister_page)),
        (names::REGISTER_EXTENSION, action(components::register_extension)),
        (names::UNREGISTER_EXTENSION, action(components::unregister_extension)),
        (names::SHOW_PORTAL, action(portal::show_portal)),
        (names::DESTROY_PORTAL, action(portal::destroy_portal)),
        (names::ADD_PILET, action(pilets::add_pilet)),
        (names::REMOVE_PILET, action(pilets::remove_pilet)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opt_text_treats_empty_as_none() {
        let args = Args::new(
            "x",
            vec![Payload::from(""), Payload::Unit, Payload::from("owner")],
        );
        assert_eq!(args.opt_text(0).unwrap(), None);
        assert_eq!(args.opt_text(1).unwrap(), None);
        assert_eq!(args.opt_text(2).unwrap(), Some("owner"));
        assert_eq!(args.opt_text(3).unwrap(), None);
    }

    #[test]
    fn wrong_shape_is_an_invalid_argument() {
        let args = Args::new("registerPage", vec![Payload::Bool(true)]);
        let err = args.text(0).unwrap_err();
        assert!(matches!(
            err,
            ActionError::InvalidArgument {
                index: 0,
                expected: "text",
                ..
            }
        ));
        assert!(args.page(1).is_err());
    }

    #[test]
    fn base_action_names_are_unique() {
        let actions = base_actions();
        let mut names: Vec<_> = actions.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), actions.len());
    }
}
