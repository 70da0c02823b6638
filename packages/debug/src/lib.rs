//! # piral-debug
//!
//! An interactive shell around a Piral host instance.
//!
//! The shell loads pilets from plain metadata, writes and releases shared
//! data under any owner, steps a manual clock to watch items expire, and
//! prints every part of the global state.
//!
//! ## Usage
//!
//! ```bash
//! piral-debug --config host.json
//!
//! # Inside the shell:
//! > load {"name": "about", "version": "1.0.0", "custom": {"pages": {"/about": "About"}}}
//! > write theme "dark" --owner shell --expires 5000
//! > advance 6000
//! > write theme "light" --owner other
//! > view /about
//! ```

pub mod commands;
pub mod completer;
pub mod highlighter;
pub mod host;
pub mod io;
pub mod repl;
pub mod session;

use std::path::Path;

use thiserror::Error;

use piral_core::{ConfigError, InstanceConfig};

pub use host::KeyMap;
pub use repl::{run, Exit, ReplCore};
pub use session::DebugSession;

/// Errors that keep the shell from starting.
#[derive(Debug, Error)]
pub enum DebugError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Converter(#[from] piral_converter::ConverterError),

    #[error(transparent)]
    Persist(#[from] piral_persist::PersistError),

    #[error(transparent)]
    Host(#[from] io::HostError),
}

/// Read the instance configuration, or use the defaults without a file.
pub fn load_config(path: Option<&Path>) -> Result<InstanceConfig, DebugError> {
    match path {
        Some(path) => Ok(InstanceConfig::from_path(path)?),
        None => Ok(InstanceConfig::default()),
    }
}
