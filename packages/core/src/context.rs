//! The global state context.
//!
//! [`GlobalStateContext`] bundles the [`Atom`], the action table, the event
//! emitter and the clock. It has process-wide lifetime and is passed around
//! as an `Arc` handle; nothing in this crate keeps it in a global.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::actions::{base_actions, names, ActionFn, Args, DataLedger, Payload};
use crate::atom::Atom;
use crate::clock::{Clock, SystemClock};
use crate::error::{ActionError, Result};
use crate::events::{EventEmitter, PiralEvent};
use crate::state::{
    DataStoreTarget, ExtensionRegistration, GlobalState, LayoutType, PageRegistration,
    PiletMetadata, PortalEntry, Reference, SharedDataItem,
};
use crate::subscription::Subscription;
use crate::value::Value;

pub struct GlobalStateContext {
    state: Atom,
    actions: RwLock<BTreeMap<String, ActionFn>>,
    events: EventEmitter,
    clock: Arc<dyn Clock>,
    data_ledger: Arc<Mutex<DataLedger>>,
}

impl GlobalStateContext {
    /// Create a context holding `initial`, with the built-in actions defined.
    pub fn new(initial: GlobalState, clock: Arc<dyn Clock>) -> Self {
        let actions = base_actions()
            .into_iter()
            .map(|(name, f)| (name.to_string(), f))
            .collect();
        Self {
            state: Atom::new(initial),
            actions: RwLock::new(actions),
            events: EventEmitter::new(),
            clock,
            data_ledger: Arc::default(),
        }
    }

    pub fn state(&self) -> &Atom {
        &self.state
    }

    /// The current snapshot.
    pub fn read_state(&self) -> Arc<GlobalState> {
        self.state.read()
    }

    /// Re-render hook: `listener` sees every published snapshot.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<GlobalState>) + Send + Sync + 'static,
    {
        self.state.subscribe(listener)
    }

    pub(crate) fn data_ledger(&self) -> &Arc<Mutex<DataLedger>> {
        &self.data_ledger
    }

    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    pub fn on<F>(&self, name: &str, handler: F) -> Subscription
    where
        F: Fn(&PiralEvent) + Send + Sync + 'static,
    {
        self.events.on(name, handler)
    }

    pub fn emit(&self, event: &PiralEvent) {
        self.events.emit(event);
    }

    /// Current time in Unix milliseconds.
    pub fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Define (or redefine) a named action. The last definition wins.
    pub fn define_action(&self, name: &str, action: ActionFn) {
        if self.actions.write().insert(name.to_string(), action).is_some() {
            tracing::debug!(action = name, "action redefined");
        }
    }

    pub fn define_actions<I, N>(&self, actions: I)
    where
        I: IntoIterator<Item = (N, ActionFn)>,
        N: AsRef<str>,
    {
        for (name, action) in actions {
            self.define_action(name.as_ref(), action);
        }
    }

    /// The handler currently bound to `name`.
    pub fn action(&self, name: &str) -> Option<ActionFn> {
        self.actions.read().get(name).cloned()
    }

    pub fn action_names(&self) -> Vec<String> {
        self.actions.read().keys().cloned().collect()
    }

    /// Invoke the action bound to `name`.
    pub fn dispatch(&self, name: &str, items: Vec<Payload>) -> Result<Payload> {
        // Resolve first: the action may itself define or dispatch actions.
        let action = self
            .action(name)
            .ok_or_else(|| ActionError::UnknownAction(name.to_string()))?;
        tracing::debug!(action = name, "dispatching action");
        action(self, Args::new(name, items))
    }

    pub fn read_data_value(&self, name: &str) -> Result<Option<Value>> {
        match self.dispatch(names::READ_DATA_VALUE, vec![name.into()])? {
            Payload::Value(value) => Ok(Some(value)),
            Payload::Unit => Ok(None),
            _ => Err(unexpected(names::READ_DATA_VALUE, "value")),
        }
    }

    pub fn read_data_item(&self, name: &str) -> Result<Option<SharedDataItem>> {
        match self.dispatch(names::READ_DATA_ITEM, vec![name.into()])? {
            Payload::Item(item) => Ok(Some(item)),
            Payload::Unit => Ok(None),
            _ => Err(unexpected(names::READ_DATA_ITEM, "shared data item")),
        }
    }

    /// Write `value` under `name` if `owner` may; `Value::Null` releases it.
    pub fn try_write_data_item(
        &self,
        name: &str,
        value: Value,
        owner: Option<&str>,
        target: DataStoreTarget,
        expiration: Option<Duration>,
    ) -> Result<bool> {
        let items = vec![
            name.into(),
            Payload::Value(value),
            owner.into(),
            Payload::Target(target),
            expiration.map(Payload::Duration).unwrap_or(Payload::Unit),
        ];
        match self.dispatch(names::TRY_WRITE_DATA_ITEM, items)? {
            Payload::Bool(accepted) => Ok(accepted),
            _ => Err(unexpected(names::TRY_WRITE_DATA_ITEM, "bool")),
        }
    }

    /// Write or delete (`None`) an item without the ownership check.
    pub fn write_data_item(&self, name: &str, item: Option<SharedDataItem>) -> Result<()> {
        let item = item.map(Payload::Item).unwrap_or(Payload::Unit);
        self.dispatch(names::WRITE_DATA_ITEM, vec![name.into(), item])
            .map(drop)
    }

    pub fn change_layout(&self, layout: LayoutType) -> Result<()> {
        self.dispatch(names::CHANGE_LAYOUT, vec![Payload::Layout(layout)])
            .map(drop)
    }

    pub fn set_loading(&self, loading: bool) -> Result<()> {
        self.dispatch(names::SET_LOADING, vec![loading.into()])
            .map(drop)
    }

    pub fn set_custom(&self, key: &str, value: Value) -> Result<()> {
        self.dispatch(names::SET_CUSTOM, vec![key.into(), value.into()])
            .map(drop)
    }

    pub fn register_page(&self, route: &str, registration: PageRegistration) -> Result<()> {
        self.dispatch(
            names::REGISTER_PAGE,
            vec![route.into(), Payload::Page(registration)],
        )
        .map(drop)
    }

    pub fn unregister_page(&self, route: &str) -> Result<()> {
        self.dispatch(names::UNREGISTER_PAGE, vec![route.into()])
            .map(drop)
    }

    pub fn register_extension(&self, name: &str, registration: ExtensionRegistration) -> Result<()> {
        self.dispatch(
            names::REGISTER_EXTENSION,
            vec![name.into(), Payload::Extension(registration)],
        )
        .map(drop)
    }

    pub fn unregister_extension(&self, name: &str, reference: Reference) -> Result<()> {
        self.dispatch(
            names::UNREGISTER_EXTENSION,
            vec![name.into(), Payload::Reference(reference)],
        )
        .map(drop)
    }

    pub fn show_portal(&self, id: &str, entry: PortalEntry) -> Result<()> {
        self.dispatch(names::SHOW_PORTAL, vec![id.into(), Payload::Portal(entry)])
            .map(drop)
    }

    pub fn destroy_portal(&self, id: &str) -> Result<()> {
        self.dispatch(names::DESTROY_PORTAL, vec![id.into()])
            .map(drop)
    }

    pub fn add_pilet(&self, meta: PiletMetadata) -> Result<()> {
        self.dispatch(names::ADD_PILET, vec![Payload::Pilet(meta)])
            .map(drop)
    }

    pub fn remove_pilet(&self, name: &str) -> Result<()> {
        self.dispatch(names::REMOVE_PILET, vec![name.into()])
            .map(drop)
    }
}

impl Default for GlobalStateContext {
    fn default() -> Self {
        Self::new(GlobalState::default(), Arc::new(SystemClock))
    }
}

fn unexpected(action: &str, expected: &'static str) -> ActionError {
    ActionError::UnexpectedPayload {
        action: action.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::action;
    use crate::clock::ManualClock;
    use crate::component::ComponentType;
    use crate::element::Element;
    use crate::events::STORE_DATA;
    use parking_lot::Mutex;

    fn context() -> (GlobalStateContext, ManualClock) {
        let clock = ManualClock::new(1_000);
        let ctx = GlobalStateContext::new(GlobalState::default(), Arc::new(clock.clone()));
        (ctx, clock)
    }

    fn page(name: &str) -> PageRegistration {
        PageRegistration::new(ComponentType::text(name, "div", name))
    }

    fn extension(name: &str) -> ExtensionRegistration {
        ExtensionRegistration::new(ComponentType::text(name, "div", name))
    }

    #[test]
    fn second_owner_is_rejected_while_first_is_unexpired() {
        let (ctx, _) = context();
        let first = ctx
            .try_write_data_item("user", Value::from("v1"), Some("a"), DataStoreTarget::Memory, None)
            .unwrap();
        let second = ctx
            .try_write_data_item("user", Value::from("v2"), Some("b"), DataStoreTarget::Memory, None)
            .unwrap();

        assert!(first);
        assert!(!second);
        assert_eq!(ctx.read_data_value("user").unwrap(), Some(Value::from("v1")));
    }

    #[test]
    fn owner_may_overwrite_its_item() {
        let (ctx, _) = context();
        ctx.try_write_data_item("k", Value::from(1i64), Some("a"), DataStoreTarget::Memory, None)
            .unwrap();
        assert!(ctx
            .try_write_data_item("k", Value::from(2i64), Some("a"), DataStoreTarget::Memory, None)
            .unwrap());
        assert_eq!(ctx.read_data_value("k").unwrap(), Some(Value::from(2i64)));
    }

    #[test]
    fn expired_item_can_be_claimed_by_another_owner() {
        let (ctx, clock) = context();
        ctx.try_write_data_item(
            "k",
            Value::from(1i64),
            Some("a"),
            DataStoreTarget::Memory,
            Some(Duration::ZERO),
        )
        .unwrap();

        clock.advance(Duration::from_millis(1));
        assert!(ctx
            .try_write_data_item("k", Value::from(2i64), Some("b"), DataStoreTarget::Memory, None)
            .unwrap());
        let item = ctx.read_data_item("k").unwrap().unwrap();
        assert_eq!(item.owner.as_deref(), Some("b"));
    }

    #[test]
    fn expires_is_relative_to_the_clock() {
        let (ctx, _) = context();
        ctx.try_write_data_item(
            "k",
            Value::from(1i64),
            None,
            DataStoreTarget::Session,
            Some(Duration::from_secs(2)),
        )
        .unwrap();
        let item = ctx.read_data_item("k").unwrap().unwrap();
        assert_eq!(item.expires, Some(3_000));
        assert_eq!(item.target, DataStoreTarget::Session);
    }

    #[test]
    fn reads_return_stale_values_until_a_write_prunes() {
        let (ctx, clock) = context();
        ctx.try_write_data_item(
            "k",
            Value::from("old"),
            Some("a"),
            DataStoreTarget::Memory,
            Some(Duration::from_millis(10)),
        )
        .unwrap();
        clock.advance(Duration::from_secs(1));

        assert_eq!(ctx.read_data_value("k").unwrap(), Some(Value::from("old")));
    }

    #[test]
    fn release_by_owner_removes_item() {
        let (ctx, _) = context();
        ctx.try_write_data_item("k", Value::from(1i64), Some("a"), DataStoreTarget::Memory, None)
            .unwrap();

        assert!(!ctx
            .try_write_data_item("k", Value::Null, Some("b"), DataStoreTarget::Memory, None)
            .unwrap());
        assert!(ctx.read_data_value("k").unwrap().is_some());

        assert!(ctx
            .try_write_data_item("k", Value::Null, Some("a"), DataStoreTarget::Memory, None)
            .unwrap());
        assert_eq!(ctx.read_data_value("k").unwrap(), None);
    }

    #[test]
    fn empty_owner_counts_as_no_owner() {
        let (ctx, _) = context();
        assert!(ctx
            .try_write_data_item("k", Value::from(1i64), Some(""), DataStoreTarget::Memory, None)
            .unwrap());
        assert!(ctx
            .try_write_data_item("k", Value::from(2i64), None, DataStoreTarget::Memory, None)
            .unwrap());
        assert!(!ctx
            .try_write_data_item("k", Value::from(3i64), Some("a"), DataStoreTarget::Memory, None)
            .unwrap());
    }

    #[test]
    fn successful_writes_emit_store_data() {
        let (ctx, _) = context();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let _sub = ctx.on(STORE_DATA, move |e| {
            if let PiralEvent::StoreData(e) = e {
                s.lock().push((e.name.clone(), e.value.clone()));
            }
        });

        ctx.try_write_data_item("k", Value::from(1i64), Some("a"), DataStoreTarget::Local, None)
            .unwrap();
        ctx.try_write_data_item("k", Value::from(2i64), Some("b"), DataStoreTarget::Local, None)
            .unwrap();

        assert_eq!(*seen.lock(), vec![("k".to_string(), Value::from(1i64))]);
    }

    #[test]
    fn extensions_keep_registration_order() {
        let (ctx, _) = context();
        let (e1, e2, e3) = (extension("E1"), extension("E2"), extension("E3"));
        for e in [&e1, &e2, &e3] {
            ctx.register_extension("x", e.clone()).unwrap();
        }

        let refs = |ctx: &GlobalStateContext| -> Vec<Reference> {
            ctx.read_state().components.extensions["x"]
                .iter()
                .map(|r| r.reference)
                .collect()
        };
        assert_eq!(refs(&ctx), vec![e1.reference, e2.reference, e3.reference]);

        ctx.unregister_extension("x", e2.reference).unwrap();
        assert_eq!(refs(&ctx), vec![e1.reference, e3.reference]);
    }

    #[test]
    fn unregistering_unknown_extension_is_a_noop() {
        let (ctx, _) = context();
        let before = ctx.read_state();
        ctx.unregister_extension("missing", Reference::new()).unwrap();
        assert!(Arc::ptr_eq(&before, &ctx.read_state()));
    }

    #[test]
    fn last_extension_removal_drops_the_slot() {
        let (ctx, _) = context();
        let e = extension("E");
        ctx.register_extension("x", e.clone()).unwrap();
        ctx.unregister_extension("x", e.reference).unwrap();
        assert!(!ctx.read_state().components.extensions.contains_key("x"));
    }

    #[test]
    fn registering_a_route_again_replaces_it() {
        let (ctx, _) = context();
        let second = page("second");
        ctx.register_page("/home", page("first")).unwrap();
        ctx.register_page("/home", second.clone()).unwrap();

        let state = ctx.read_state();
        assert_eq!(state.components.pages.len(), 1);
        assert_eq!(state.components.pages["/home"].component, second.component);
    }

    #[test]
    fn unregistering_a_page_twice_is_idempotent() {
        let (ctx, _) = context();
        ctx.register_page("/home", page("home")).unwrap();
        ctx.unregister_page("/home").unwrap();
        let after_first = ctx.read_state();

        ctx.unregister_page("/home").unwrap();
        ctx.unregister_page("/never").unwrap();
        assert!(Arc::ptr_eq(&after_first, &ctx.read_state()));
        assert!(after_first.components.pages.is_empty());
    }

    #[test]
    fn layout_and_loading_replace_app_fields() {
        let (ctx, _) = context();
        ctx.change_layout(LayoutType::Mobile).unwrap();
        ctx.set_loading(true).unwrap();

        let state = ctx.read_state();
        assert_eq!(state.app.layout, LayoutType::Mobile);
        assert!(state.app.loading);
    }

    #[test]
    fn portals_append_in_mount_order_and_destroy_clears() {
        let (ctx, _) = context();
        let a = PortalEntry {
            key: "a".to_string(),
            element: Element::new("slot"),
        };
        let b = PortalEntry {
            key: "b".to_string(),
            element: Element::new("slot"),
        };
        ctx.show_portal("p", a.clone()).unwrap();
        ctx.show_portal("p", b.clone()).unwrap();
        assert_eq!(ctx.read_state().portals["p"], vec![a, b]);

        ctx.destroy_portal("p").unwrap();
        assert!(!ctx.read_state().portals.contains_key("p"));
        ctx.destroy_portal("p").unwrap();
    }

    #[test]
    fn pilets_are_appended_and_removed() {
        let (ctx, _) = context();
        ctx.add_pilet(PiletMetadata::new("a", "1.0.0")).unwrap();
        ctx.add_pilet(PiletMetadata::new("b", "1.0.0")).unwrap();
        ctx.add_pilet(PiletMetadata::new("a", "1.1.0")).unwrap();

        let versions: Vec<_> = ctx
            .read_state()
            .modules
            .iter()
            .map(|m| format!("{}@{}", m.name, m.version))
            .collect();
        assert_eq!(versions, vec!["a@1.1.0", "b@1.0.0"]);

        ctx.remove_pilet("a").unwrap();
        ctx.remove_pilet("a").unwrap();
        assert_eq!(ctx.read_state().modules.len(), 1);
    }

    #[test]
    fn custom_state_is_set_and_removed() {
        let (ctx, _) = context();
        ctx.set_custom("feature", Value::from(true)).unwrap();
        assert_eq!(ctx.read_state().custom["feature"], Value::from(true));
        ctx.set_custom("feature", Value::Null).unwrap();
        assert!(ctx.read_state().custom.is_empty());
    }

    #[test]
    fn defined_action_can_be_dispatched() {
        let (ctx, _) = context();
        ctx.define_action(
            "double",
            action(|_, args| {
                let n = args.value(0)?.as_i64().ok_or(args.invalid(0, "integer"))?;
                Ok(Payload::Value(Value::from(n * 2)))
            }),
        );

        let result = ctx.dispatch("double", vec![Value::from(21i64).into()]).unwrap();
        assert!(matches!(result, Payload::Value(Value::Integer(42))));
    }

    #[test]
    fn later_definition_wins_and_typed_helpers_follow_it() {
        let (ctx, _) = context();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let original = ctx.action(names::SET_LOADING).unwrap();

        let c = calls.clone();
        ctx.define_actions([(
            names::SET_LOADING,
            action(move |ctx, args| {
                c.lock().push(args.boolean(0)?);
                original(ctx, args)
            }),
        )]);

        ctx.set_loading(true).unwrap();
        assert_eq!(*calls.lock(), vec![true]);
        assert!(ctx.read_state().app.loading);
    }

    #[test]
    fn action_may_trigger_another_action() {
        let (ctx, _) = context();
        ctx.define_action(
            "storeAndFlag",
            action(|ctx, args| {
                let name = args.text(0)?.clone();
                ctx.set_loading(true)?;
                let ok = ctx.try_write_data_item(
                    &name,
                    Value::from(1i64),
                    None,
                    DataStoreTarget::Memory,
                    None,
                )?;
                ctx.set_loading(false)?;
                Ok(Payload::Bool(ok))
            }),
        );

        let result = ctx.dispatch("storeAndFlag", vec!["n".into()]).unwrap();
        assert!(matches!(result, Payload::Bool(true)));
        let state = ctx.read_state();
        assert!(!state.app.loading);
        assert!(state.data.contains_key("n"));
    }

    #[test]
    fn unknown_action_is_an_error() {
        let (ctx, _) = context();
        let err = ctx.dispatch("nope", vec![]).unwrap_err();
        assert!(matches!(err, ActionError::UnknownAction(name) if name == "nope"));
    }

    #[test]
    fn wrong_argument_shape_is_an_error() {
        let (ctx, _) = context();
        let err = ctx
            .dispatch(names::REGISTER_PAGE, vec!["/x".into(), Payload::Bool(true)])
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidArgument { index: 1, .. }));
    }

    #[test]
    fn subscribers_see_each_published_snapshot() {
        let (ctx, _) = context();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let _sub = ctx.subscribe(move |state| s.lock().push(state.app.loading));

        ctx.set_loading(true).unwrap();
        ctx.set_loading(true).unwrap();
        ctx.set_loading(false).unwrap();
        assert_eq!(*seen.lock(), vec![true, false]);
    }
}
