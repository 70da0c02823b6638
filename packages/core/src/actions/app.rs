//! App-level actions: layout, loading flag and custom state branches.

use super::{Args, Payload};
use crate::context::GlobalStateContext;
use crate::error::Result;
use crate::state::{AppState, StatePatch};

pub(super) fn change_layout(ctx: &GlobalStateContext, args: Args) -> Result<Payload> {
    let layout = *args.layout(0)?;
    ctx.state().update(move |s| {
        if s.app.layout == layout {
            return StatePatch::none();
        }
        StatePatch::none().app(AppState {
            layout,
            ..s.app.clone()
        })
    });
    Ok(Payload::Unit)
}

pub(super) fn set_loading(ctx: &GlobalStateContext, args: Args) -> Result<Payload> {
    let loading = args.boolean(0)?;
    ctx.state().update(move |s| {
        if s.app.loading == loading {
            return StatePatch::none();
        }
        StatePatch::none().app(AppState {
            loading,
            ..s.app.clone()
        })
    });
    Ok(Payload::Unit)
}

/// `setCustom(key, value)`; a `Null` value removes the branch.
pub(super) fn set_custom(ctx: &GlobalStateContext, args: Args) -> Result<Payload> {
    let key = args.text(0)?.clone();
    let value = args.value(1)?.clone();
    ctx.state().update(move |s| {
        if value.is_null() && !s.custom.contains_key(&key) {
            return StatePatch::none();
        }
        let mut custom = s.custom.clone();
        if value.is_null() {
            custom.remove(&key);
        } else {
            custom.insert(key, value);
        }
        StatePatch::none().custom(custom)
    });
    Ok(Payload::Unit)
}
