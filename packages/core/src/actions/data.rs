//! Shared data actions and the ownership protocol.
//!
//! A write to a name succeeds when the name is free, when its current item
//! has expired, or when the writer already owns it. Writing `Null` deletes
//! the item under the same rule. Expiration is only evaluated here, at write
//! time: reads return an expired item's stale value until a write replaces it.
//!
//! Writes are decided against the [`DataLedger`] first and the published
//! state second. A write issued while an update is running (from a state
//! listener, say) is queued behind it, but its result already accounts for
//! every write queued before it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{Args, Payload};
use crate::context::GlobalStateContext;
use crate::error::Result;
use crate::events::{PiralEvent, StoreDataEvent};
use crate::state::{GlobalState, SharedDataItem, StatePatch};

/// Check the ownership rule for a write by `owner` at time `now`.
pub fn may_write(existing: Option<&SharedDataItem>, owner: Option<&str>, now: i64) -> bool {
    match existing {
        None => true,
        Some(item) => item.is_expired(now) || item.owner.as_deref() == owner,
    }
}

/// Absolute expiry of an item written at `now`. An expiration too large
/// to represent means the item never expires.
pub(crate) fn expiry(now: i64, expiration: Duration) -> Option<i64> {
    i64::try_from(expiration.as_millis())
        .ok()
        .and_then(|ms| now.checked_add(ms))
}

/// Data writes that were decided but may not be published yet.
#[derive(Debug, Default)]
pub(crate) struct DataLedger {
    next: u64,
    pending: BTreeMap<String, (u64, Option<SharedDataItem>)>,
}

impl DataLedger {
    /// The item `name` holds once every decided write is applied.
    fn current(&self, state: &GlobalState, name: &str) -> Option<SharedDataItem> {
        match self.pending.get(name) {
            Some((_, item)) => item.clone(),
            None => state.data.get(name).cloned(),
        }
    }

    fn record(&mut self, name: &str, item: Option<SharedDataItem>) -> u64 {
        self.next += 1;
        self.pending.insert(name.to_string(), (self.next, item));
        self.next
    }

    /// Forget the write `seq` once it is published, unless a later one
    /// for the same name is still pending.
    fn settle(&mut self, name: &str, seq: u64) {
        if self.pending.get(name).is_some_and(|(pending, _)| *pending == seq) {
            self.pending.remove(name);
        }
    }
}

pub(super) fn read_data_value(ctx: &GlobalStateContext, args: Args) -> Result<Payload> {
    let name = args.text(0)?;
    Ok(ctx
        .read_state()
        .data
        .get(name)
        .map(|item| Payload::Value(item.value.clone()))
        .unwrap_or(Payload::Unit))
}

pub(super) fn read_data_item(ctx: &GlobalStateContext, args: Args) -> Result<Payload> {
    let name = args.text(0)?;
    Ok(ctx
        .read_state()
        .data
        .get(name)
        .map(|item| Payload::Item(item.clone()))
        .unwrap_or(Payload::Unit))
}

pub(super) fn try_write_data_item(ctx: &GlobalStateContext, args: Args) -> Result<Payload> {
    let name = args.text(0)?.clone();
    let value = args.value(1)?.clone();
    let owner = args.opt_text(2)?.map(str::to_string);
    let target = *args.target(3)?;
    let expiration = args.opt_duration(4)?;

    let now = ctx.now();
    let item = (!value.is_null()).then(|| SharedDataItem {
        value,
        owner: owner.clone(),
        target,
        expires: expiration.and_then(|d| expiry(now, d)),
    });

    let ledger = ctx.data_ledger();
    let mut guard = ledger.lock();
    let existing = guard.current(&ctx.read_state(), &name);

    if !may_write(existing.as_ref(), owner.as_deref(), now) {
        drop(guard);
        let holder = existing.and_then(|item| item.owner);
        tracing::warn!(
            name = %name,
            owner = ?owner,
            holder = ?holder,
            "rejected shared data write: item belongs to another owner"
        );
        return Ok(Payload::Bool(false));
    }
    if item.is_none() && existing.is_none() {
        // Nothing to release.
        return Ok(Payload::Bool(true));
    }

    let event = StoreDataEvent {
        name: name.clone(),
        value: item.as_ref().map(|i| i.value.clone()).unwrap_or_default(),
        owner,
        target,
        expires: item.as_ref().and_then(|i| i.expires),
    };
    commit(ctx, &mut guard, name, item, event);
    drop(guard);

    ctx.state().drain();
    Ok(Payload::Bool(true))
}

pub(super) fn write_data_item(ctx: &GlobalStateContext, args: Args) -> Result<Payload> {
    let name = args.text(0)?.clone();
    let item = args.opt_item(1)?.cloned();

    let ledger = ctx.data_ledger();
    let mut guard = ledger.lock();
    if item.is_none() && guard.current(&ctx.read_state(), &name).is_none() {
        return Ok(Payload::Unit);
    }

    let event = match &item {
        Some(item) => StoreDataEvent {
            name: name.clone(),
            value: item.value.clone(),
            owner: item.owner.clone(),
            target: item.target,
            expires: item.expires,
        },
        None => StoreDataEvent {
            name: name.clone(),
            value: Default::default(),
            owner: None,
            target: Default::default(),
            expires: None,
        },
    };
    commit(ctx, &mut guard, name, item, event);
    drop(guard);

    ctx.state().drain();
    Ok(Payload::Unit)
}

/// Record a decided write and queue it. Once it is published the ledger
/// entry is settled and `event` is emitted.
///
/// The caller holds the ledger lock, so writes are queued in the order
/// they were decided.
fn commit(
    ctx: &GlobalStateContext,
    ledger: &mut DataLedger,
    name: String,
    item: Option<SharedDataItem>,
    event: StoreDataEvent,
) {
    let seq = ledger.record(&name, item.clone());
    let shared: Arc<Mutex<DataLedger>> = ctx.data_ledger().clone();
    let events = ctx.events().clone();
    let key = name.clone();

    ctx.state().enqueue(
        Box::new(move |s: &GlobalState| {
            let mut data = s.data.clone();
            match item {
                Some(item) => data.insert(name, item),
                None => data.remove(&name),
            };
            StatePatch::none().data(data)
        }),
        Some(Box::new(move |_: &Arc<GlobalState>| {
            shared.lock().settle(&key, seq);
            events.emit(&PiralEvent::StoreData(event));
        })),
    );
}
