//! Piral: a host runtime for micro frontends.
//!
//! A host application owns one global state. Independently built modules
//! (pilets) register pages and extensions into it, share data under
//! ownership rules, and bring components written against other UI
//! frameworks through converters.
//!
//! - [`core`]: state container, action table, shared data, registries, pilet loading
//! - [`converter`]: foreign components behind the uniform component contract
//! - [`persist`]: `local` and `session` shared data beyond the process
//!
//! ```rust
//! use piral::core::{pilet, DataOptions, Instance, PiletMetadata, Value};
//!
//! let instance = Instance::default();
//! let about = pilet(PiletMetadata::new("about", "1.0.0"), |api| {
//!     api.set_data("greeting", Value::from("hello"), DataOptions::default())?;
//!     Ok(())
//! });
//! instance.load_pilet(&about).unwrap();
//!
//! let ctx = instance.context();
//! assert_eq!(ctx.read_data_value("greeting").unwrap(), Some(Value::from("hello")));
//!
//! instance.unload_pilet("about").unwrap();
//! assert_eq!(ctx.read_data_value("greeting").unwrap(), None);
//! ```

pub use piral_converter as converter;
pub use piral_core as core;
pub use piral_persist as persist;

pub use piral_core::{GlobalStateContext, Instance, InstanceConfig, Pilet, PiletApi, Value};
