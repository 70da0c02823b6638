//! Page and extension registry actions.
//!
//! Removing something that is not registered is a silent no-op: pilets are
//! loaded and unloaded asynchronously, so double removal is expected.

use super::{Args, Payload};
use crate::context::GlobalStateContext;
use crate::error::Result;
use crate::state::{ComponentsState, StatePatch};

pub(super) fn register_page(ctx: &GlobalStateContext, args: Args) -> Result<Payload> {
    let route = args.text(0)?.clone();
    let registration = args.page(1)?.clone();
    ctx.state().update(move |s| {
        let mut pages = s.components.pages.clone();
        pages.insert(route, registration);
        StatePatch::none().components(ComponentsState {
            pages,
            ..s.components.clone()
        })
    });
    Ok(Payload::Unit)
}

pub(super) fn unregister_page(ctx: &GlobalStateContext, args: Args) -> Result<Payload> {
    let route = args.text(0)?.clone();
    ctx.state().update(move |s| {
        if !s.components.pages.contains_key(&route) {
            return StatePatch::none();
        }
        let mut pages = s.components.pages.clone();
        pages.remove(&route);
        StatePatch::none().components(ComponentsState {
            pages,
            ..s.components.clone()
        })
    });
    Ok(Payload::Unit)
}

pub(super) fn register_extension(ctx: &GlobalStateContext, args: Args) -> Result<Payload> {
    let name = args.text(0)?.clone();
    let registration = args.extension(1)?.clone();
    ctx.state().update(move |s| {
        let mut extensions = s.components.extensions.clone();
        extensions.entry(name).or_default().push(registration);
        StatePatch::none().components(ComponentsState {
            extensions,
            ..s.components.clone()
        })
    });
    Ok(Payload::Unit)
}

/// Removes every registration under `name` carrying `reference`, keeping the
/// order of the rest. A slot left without registrations is dropped.
pub(super) fn unregister_extension(ctx: &GlobalStateContext, args: Args) -> Result<Payload> {
    let name = args.text(0)?.clone();
    let reference = *args.reference(1)?;
    ctx.state().update(move |s| {
        let Some(current) = s.components.extensions.get(&name) else {
            return StatePatch::none();
        };
        if !current.iter().any(|r| r.reference == reference) {
            return StatePatch::none();
        }

        let remaining: Vec<_> = current
            .iter()
            .filter(|r| r.reference != reference)
            .cloned()
            .collect();
        let mut extensions = s.components.extensions.clone();
        if remaining.is_empty() {
            extensions.remove(&name);
        } else {
            extensions.insert(name, remaining);
        }
        StatePatch::none().components(ComponentsState {
            extensions,
            ..s.components.clone()
        })
    });
    Ok(Payload::Unit)
}
