//! # Piral Converter
//!
//! Lets components written against a foreign UI framework live in a Piral
//! host. The host only knows the uniform [`Component`](piral_core::Component)
//! contract; a [`Converter`] adapts a foreign entry point to it.
//!
//! ## Lifecycle
//!
//! - **mount**: a nested `<slot>` element is appended to the host element,
//!   the foreign run loop is started with that element and a fresh
//!   [`PropChannel`], then the initial props are pushed.
//! - **update**: the new props are pushed into the same channel, in call order.
//! - **unmount**: the channel completes, the run loop is disposed, the nested
//!   element is removed and a new channel is prepared for the next mount.
//!
//! ```rust
//! use piral_converter::{Converter, Disposer, Drivers, RunResult, Signal};
//! use piral_core::{Element, Value};
//!
//! let converter = Converter::default();
//! let greeting = converter.convert("Greeting", |drivers: Drivers| -> RunResult {
//!     let dom = drivers.dom.clone();
//!     let sub = drivers.props.subscribe(move |signal| {
//!         if let Signal::Next(props) = signal {
//!             dom.set_text(format!("Hello, {}", props.get("name").and_then(Value::as_str).unwrap_or("?")));
//!         }
//!     });
//!     Ok(Disposer::new(move || drop(sub)))
//! });
//!
//! let host = Element::new("div");
//! let mut component = greeting.instantiate();
//! let mut props = Value::map();
//! props.insert("name", Value::from("Ada"));
//! component.mount(&host, &props).unwrap();
//! assert_eq!(host.to_markup(), "<div><slot>Hello, Ada</slot></div>");
//! component.unmount();
//! ```

pub mod channel;
pub mod converter;
pub mod error;
pub mod extension;

pub use channel::{PropChannel, Signal};
pub use converter::{
    Converter, ConverterOptions, Disposer, Drivers, ForeignComponent, ForeignMain, RunResult,
    HOST_TAG,
};
pub use error::{ConverterError, Result};
pub use extension::{find_placeholders, ExtensionRequest};
