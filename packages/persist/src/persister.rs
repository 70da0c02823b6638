//! Keeps `local` and `session` shared data items in their stores.
//!
//! The core treats an item's target as an opaque hint. The [`DataPersister`]
//! observes `store-data` events and mirrors every item to the store of its
//! tier; [`DataPersister::restore`] brings the stored items back at startup.

use std::path::Path;
use std::sync::Arc;

use piral_core::events::STORE_DATA;
use piral_core::{
    DataStoreTarget, GlobalStateContext, PiralEvent, SharedDataItem, StoreDataEvent, Subscription,
};

use crate::error::Result;
use crate::local_disk::LocalDiskStore;
use crate::memory::SessionStore;
use crate::store::ItemStore;

#[derive(Clone)]
pub struct DataPersister {
    local: Arc<dyn ItemStore>,
    session: Arc<dyn ItemStore>,
}

impl DataPersister {
    pub fn new(local: Arc<dyn ItemStore>, session: Arc<dyn ItemStore>) -> Self {
        Self { local, session }
    }

    /// Keep both tiers in memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(SessionStore::new()), Arc::new(SessionStore::new()))
    }

    /// Keep `local` items under `dir` and `session` items in memory.
    pub fn with_local_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let local = LocalDiskStore::create(dir.as_ref())?;
        Ok(Self::new(Arc::new(local), Arc::new(SessionStore::new())))
    }

    /// Persist every shared data write until the subscription is dropped.
    pub fn attach(&self, ctx: &GlobalStateContext) -> Subscription {
        let persister = self.clone();
        ctx.on(STORE_DATA, move |event| {
            if let PiralEvent::StoreData(event) = event {
                if let Err(err) = persister.persist(event) {
                    tracing::warn!(name = %event.name, error = %err, "failed to persist shared data");
                }
            }
        })
    }

    /// Mirror one write. An item lives in at most one tier; deletions and
    /// `memory` items remove it from both.
    pub fn persist(&self, event: &StoreDataEvent) -> Result<()> {
        let item = SharedDataItem {
            value: event.value.clone(),
            owner: event.owner.clone(),
            target: event.target,
            expires: event.expires,
        };
        match (event.value.is_null(), event.target) {
            (false, DataStoreTarget::Local) => {
                self.session.remove(&event.name)?;
                self.local.save(&event.name, &item)
            }
            (false, DataStoreTarget::Session) => {
                self.local.remove(&event.name)?;
                self.session.save(&event.name, &item)
            }
            _ => {
                self.local.remove(&event.name)?;
                self.session.remove(&event.name)
            }
        }
    }

    /// Write unexpired stored items into `ctx` and drop expired ones.
    ///
    /// Returns the number of restored items.
    pub fn restore(&self, ctx: &GlobalStateContext) -> Result<usize> {
        let now = ctx.now();
        let mut restored = 0;
        for store in [&self.local, &self.session] {
            for (name, item) in store.load_all()? {
                if item.is_expired(now) {
                    tracing::debug!(name = %name, "dropping expired stored item");
                    store.remove(&name)?;
                    continue;
                }
                ctx.write_data_item(&name, Some(item))?;
                restored += 1;
            }
        }
        tracing::info!(restored, "restored shared data");
        Ok(restored)
    }
}
