//! Persistence for shared data items.
//!
//! The core only records an item's target tier. This crate is the collaborator
//! that acts on it:
//! - `local` items are written to a [`LocalDiskStore`], one JSON file each
//! - `session` items are kept in a [`SessionStore`] for the process lifetime
//! - `memory` items are never persisted
//!
//! ```rust
//! use piral_core::{DataStoreTarget, GlobalStateContext, Value};
//! use piral_persist::DataPersister;
//!
//! let ctx = GlobalStateContext::default();
//! let persister = DataPersister::in_memory();
//! let _attached = persister.attach(&ctx);
//! ctx.try_write_data_item("theme", Value::from("dark"), None, DataStoreTarget::Local, None)
//!     .unwrap();
//! ```

pub mod error;
pub mod local_disk;
pub mod memory;
pub mod persister;
pub mod store;

pub use error::{PersistError, Result};
pub use local_disk::LocalDiskStore;
pub use memory::SessionStore;
pub use persister::DataPersister;
pub use store::ItemStore;
