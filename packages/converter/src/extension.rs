//! Extension placeholders.
//!
//! A foreign component cannot render host extension slots itself. Instead it
//! emits a placeholder element naming the slot; the host finds placeholders
//! in the rendered tree and mounts an [`ExtensionSlot`](piral_core::ExtensionSlot)
//! into each.

use piral_core::{Element, Value};

pub const EXTENSION_NAME_ATTRIBUTE: &str = "data-extension-name";
pub const EXTENSION_PARAMS_ATTRIBUTE: &str = "data-extension-params";

/// A `root_name` element requesting the extension slot `name`.
pub fn placeholder(root_name: &str, name: &str, params: &Value) -> Element {
    let element = Element::new(root_name);
    element.set_attribute(EXTENSION_NAME_ATTRIBUTE, name);
    element.set_attribute(EXTENSION_PARAMS_ATTRIBUTE, params.to_string());
    element
}

/// A placeholder found in a rendered tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionRequest {
    pub element: Element,
    pub name: String,
    pub params: Value,
}

/// Collect the placeholders below `root`, in document order.
pub fn find_placeholders(root: &Element) -> Vec<ExtensionRequest> {
    let mut found = Vec::new();
    collect(root, &mut found);
    found
}

fn collect(element: &Element, found: &mut Vec<ExtensionRequest>) {
    if let Some(name) = element.attribute(EXTENSION_NAME_ATTRIBUTE) {
        let params = match element.attribute(EXTENSION_PARAMS_ATTRIBUTE) {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                tracing::warn!(extension = %name, error = %err, "ignoring malformed extension params");
                Value::Null
            }),
            None => Value::Null,
        };
        found.push(ExtensionRequest {
            element: element.clone(),
            name,
            params,
        });
    }
    for child in element.children() {
        collect(&child, found);
    }
}
