//! Portal table actions.

use super::{Args, Payload};
use crate::context::GlobalStateContext;
use crate::error::Result;
use crate::state::StatePatch;

/// Append a mounted fragment to `portals[id]`.
pub(super) fn show_portal(ctx: &GlobalStateContext, args: Args) -> Result<Payload> {
    let id = args.text(0)?.clone();
    let entry = args.portal(1)?.clone();
    tracing::debug!(portal = %id, key = %entry.key, "showing portal entry");
    ctx.state().update(move |s| {
        let mut portals = s.portals.clone();
        portals.entry(id).or_default().push(entry);
        StatePatch::none().portals(portals)
    });
    Ok(Payload::Unit)
}

/// Drop every fragment of `portals[id]`.
pub(super) fn destroy_portal(ctx: &GlobalStateContext, args: Args) -> Result<Payload> {
    let id = args.text(0)?.clone();
    tracing::debug!(portal = %id, "destroying portal");
    ctx.state().update(move |s| {
        if !s.portals.contains_key(&id) {
            return StatePatch::none();
        }
        let mut portals = s.portals.clone();
        portals.remove(&id);
        StatePatch::none().portals(portals)
    });
    Ok(Payload::Unit)
}
