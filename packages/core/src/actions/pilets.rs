//! Module metadata actions.

use super::{Args, Payload};
use crate::context::GlobalStateContext;
use crate::error::Result;
use crate::events::PiralEvent;
use crate::state::StatePatch;

/// Append the metadata, or replace an entry with the same name in place.
pub(super) fn add_pilet(ctx: &GlobalStateContext, args: Args) -> Result<Payload> {
    let meta = args.pilet(0)?.clone();
    {
        let meta = meta.clone();
        ctx.state().update(move |s| {
            let mut modules = s.modules.clone();
            match modules.iter_mut().find(|m| m.name == meta.name) {
                Some(existing) => *existing = meta,
                None => modules.push(meta),
            }
            StatePatch::none().modules(modules)
        });
    }
    ctx.emit(&PiralEvent::LoadPilet(meta));
    Ok(Payload::Unit)
}

pub(super) fn remove_pilet(ctx: &GlobalStateContext, args: Args) -> Result<Payload> {
    let name = args.text(0)?.clone();
    if !ctx.read_state().modules.iter().any(|m| m.name == name) {
        return Ok(Payload::Unit);
    }
    {
        let name = name.clone();
        ctx.state().update(move |s| {
            let modules: Vec<_> = s
                .modules
                .iter()
                .filter(|m| m.name != name)
                .cloned()
                .collect();
            if modules.len() == s.modules.len() {
                return StatePatch::none();
            }
            StatePatch::none().modules(modules)
        });
    }
    ctx.emit(&PiralEvent::UnloadPilet { name });
    Ok(Payload::Unit)
}
