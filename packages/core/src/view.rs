//! Route resolution.
//!
//! Decides which component the shell shows for a path. Rendering it is left
//! to the host's layout.

use std::fmt;

use crate::component::ComponentType;
use crate::state::GlobalState;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Loading the pilets failed.
    Loading,
    /// No route matches the path.
    NotFound,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Loading => write!(f, "loading"),
            ErrorKind::NotFound => write!(f, "not_found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Loader(ComponentType),
    Error {
        kind: ErrorKind,
        message: Option<String>,
        component: ComponentType,
    },
    Page {
        path: String,
        component: ComponentType,
        meta: Value,
    },
}

impl View {
    /// The component to render.
    pub fn component(&self) -> &ComponentType {
        match self {
            View::Loader(component) => component,
            View::Error { component, .. } => component,
            View::Page { component, .. } => component,
        }
    }
}

/// Pick what to show for `path`.
///
/// Nothing but the loader is shown until loading finished; a loading error
/// then replaces every route. Host routes in `app.routes` win over pilet
/// pages with the same path.
pub fn resolve_view(state: &GlobalState, loaded: bool, error: Option<&str>, path: &str) -> View {
    let components = &state.app.components;
    if !loaded {
        return View::Loader(components.loader.clone());
    }
    if let Some(message) = error {
        return View::Error {
            kind: ErrorKind::Loading,
            message: Some(message.to_string()),
            component: components.error_info.clone(),
        };
    }
    if let Some(component) = state.app.routes.get(path) {
        return View::Page {
            path: path.to_string(),
            component: component.clone(),
            meta: Value::Null,
        };
    }
    match state.components.pages.get(path) {
        Some(page) => View::Page {
            path: path.to_string(),
            component: page.component.clone(),
            meta: page.meta.clone(),
        },
        None => View::Error {
            kind: ErrorKind::NotFound,
            message: None,
            component: components.error_info.clone(),
        },
    }
}
