//! Error types for component conversion.
//!
//! Failures of the foreign framework itself are not wrapped here: they reach
//! the host as the [`ComponentError`] its run loop returned.

use piral_core::ComponentError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConverterError {
    /// The converter options in the configuration are malformed.
    #[error("invalid converter options: {0}")]
    Options(#[from] serde_json::Error),
}

impl From<ConverterError> for ComponentError {
    fn from(err: ConverterError) -> Self {
        ComponentError::Render {
            component: "converter".to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConverterError>;
