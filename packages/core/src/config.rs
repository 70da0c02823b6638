//! Host instance configuration.
//!
//! Configuration is a JSON document; every field is optional.
//!
//! ```json
//! {
//!   "layout": "desktop",
//!   "breakpoints": { "mobile": 480, "tablet": 990 },
//!   "data": { "theme": { "value": "dark", "target": "local" } },
//!   "persist_dir": "/var/lib/piral",
//!   "converter": { "root_name": "slot" }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::state::{AppState, Breakpoints, GlobalState, LayoutType, SharedDataItem};
use crate::value::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    pub layout: LayoutType,
    pub loading: bool,
    pub breakpoints: Breakpoints,
    /// Shared data present from the start.
    pub data: BTreeMap<String, SharedDataItem>,
    /// Where `local` shared data items are stored, if anywhere.
    pub persist_dir: Option<PathBuf>,
    /// Options for component converters, read by the converter crate.
    pub converter: Value,
}

impl InstanceConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// The first snapshot of a host built from this configuration.
    pub fn initial_state(&self) -> GlobalState {
        GlobalState {
            app: AppState {
                layout: self.layout,
                loading: self.loading,
                ..AppState::default()
            },
            data: self.data.clone(),
            ..GlobalState::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DataStoreTarget;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let config = InstanceConfig::from_json_str("{}").unwrap();
        assert_eq!(config, InstanceConfig::default());
        assert_eq!(config.breakpoints.mobile, 480);
        assert_eq!(config.breakpoints.tablet, 990);
    }

    #[test]
    fn full_document_parses() {
        let config = InstanceConfig::from_json_str(
            r#"{
                "layout": "mobile",
                "loading": true,
                "breakpoints": { "mobile": 320, "tablet": 800 },
                "data": { "theme": { "value": "dark", "owner": "shell", "target": "local" } },
                "persist_dir": "/tmp/piral",
                "converter": { "root_name": "piral-slot" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.layout, LayoutType::Mobile);
        assert!(config.loading);
        assert_eq!(config.breakpoints.layout_for_width(700), LayoutType::Tablet);
        let theme = &config.data["theme"];
        assert_eq!(theme.value, Value::from("dark"));
        assert_eq!(theme.owner.as_deref(), Some("shell"));
        assert_eq!(theme.target, DataStoreTarget::Local);
        assert_eq!(config.persist_dir, Some(PathBuf::from("/tmp/piral")));
        assert_eq!(
            config.converter.get("root_name"),
            Some(&Value::from("piral-slot"))
        );
    }

    #[test]
    fn initial_state_carries_app_fields_and_data() {
        let config = InstanceConfig::from_json_str(
            r#"{ "layout": "tablet", "data": { "x": { "value": 1 } } }"#,
        )
        .unwrap();
        let state = config.initial_state();
        assert_eq!(state.app.layout, LayoutType::Tablet);
        assert_eq!(state.data["x"].value, Value::from(1i64));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = InstanceConfig::from_json_str(r#"{ "layout": "huge" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "loading": true }}"#).unwrap();
        let config = InstanceConfig::from_path(file.path()).unwrap();
        assert!(config.loading);

        let missing = InstanceConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
