//! Error types for the core layer.
//!
//! Rejected state mutations (ownership conflicts, removing something that is
//! not registered) are not errors: they surface as `false` or as silent
//! no-ops. The types here cover programming errors at the dynamic action
//! boundary, component lifecycle failures and configuration problems.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while dispatching an action by name.
#[derive(Debug, Error)]
pub enum ActionError {
    /// No action with this name is defined.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// An argument was missing or had the wrong shape.
    #[error("invalid argument {index} for action '{action}': expected {expected}")]
    InvalidArgument {
        action: String,
        index: usize,
        expected: &'static str,
    },

    /// The action returned a payload the typed caller did not expect.
    #[error("action '{action}' returned an unexpected payload, expected {expected}")]
    UnexpectedPayload {
        action: String,
        expected: &'static str,
    },

    /// A module-defined action failed.
    #[error("action '{action}' failed: {message}")]
    Failed { action: String, message: String },
}

/// Errors raised by a component while mounting or updating.
///
/// These propagate to the host's error boundary untouched.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// `mount` was called on an instance that is still mounted.
    #[error("component '{0}' is already mounted")]
    AlreadyMounted(String),

    /// `update` was called on an instance that is not mounted.
    #[error("component '{0}' is not mounted")]
    NotMounted(String),

    /// The component's own rendering failed.
    #[error("component '{component}' failed: {message}")]
    Render { component: String, message: String },

    /// A state action failed while rendering.
    #[error(transparent)]
    Action(#[from] ActionError),
}

/// Errors raised while loading or unloading a pilet.
#[derive(Debug, Error)]
pub enum PiletError {
    /// A pilet with this name is already loaded.
    #[error("pilet already loaded: {0}")]
    AlreadyLoaded(String),

    /// No pilet with this name is loaded.
    #[error("pilet not loaded: {0}")]
    NotLoaded(String),

    /// The pilet's setup failed; its registrations were rolled back.
    #[error("setup of pilet '{name}' failed: {message}")]
    Setup { name: String, message: String },

    #[error(transparent)]
    Action(#[from] ActionError),
}

/// Errors raised while reading host configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type alias for action dispatch.
pub type Result<T> = std::result::Result<T, ActionError>;
