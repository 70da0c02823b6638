use std::collections::BTreeMap;

use piral_core::SharedDataItem;

use crate::error::Result;

/// Storage for one persistence tier.
pub trait ItemStore: Send + Sync {
    /// Every stored item by name.
    fn load_all(&self) -> Result<BTreeMap<String, SharedDataItem>>;

    fn save(&self, name: &str, item: &SharedDataItem) -> Result<()>;

    /// Remove `name`; removing a missing item is not an error.
    fn remove(&self, name: &str) -> Result<()>;
}
