//! Session tier: items that live as long as the process.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use piral_core::SharedDataItem;

use crate::error::Result;
use crate::store::ItemStore;

/// An in-memory [`ItemStore`].
#[derive(Debug, Default)]
pub struct SessionStore {
    items: Mutex<BTreeMap<String, SharedDataItem>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl ItemStore for SessionStore {
    fn load_all(&self) -> Result<BTreeMap<String, SharedDataItem>> {
        Ok(self.items.lock().clone())
    }

    fn save(&self, name: &str, item: &SharedDataItem) -> Result<()> {
        self.items.lock().insert(name.to_string(), item.clone());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.items.lock().remove(name);
        Ok(())
    }
}
