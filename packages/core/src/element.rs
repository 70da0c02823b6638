//! Host element tree.
//!
//! Components never own the host's markup directly: the host hands them an
//! [`Element`] to mount into, and keeps its own bookkeeping attributes (such
//! as `data-portal-id`) on that element. An `Element` is a cheap, clonable
//! handle; clones refer to the same node.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Attribute carrying the portal a container element belongs to.
pub const PORTAL_ID_ATTRIBUTE: &str = "data-portal-id";

#[derive(Debug, Default)]
struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    children: Vec<Element>,
    text: Option<String>,
}

/// Handle to a node in the host element tree.
#[derive(Clone)]
pub struct Element {
    node: Arc<Mutex<Node>>,
}

impl Element {
    /// Create a detached element with the given tag name.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            node: Arc::new(Mutex::new(Node {
                tag: tag.into(),
                ..Node::default()
            })),
        }
    }

    pub fn tag(&self) -> String {
        self.node.lock().tag.clone()
    }

    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.node.lock().attributes.insert(name.into(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.node.lock().attributes.get(name).cloned()
    }

    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        self.node.lock().attributes.remove(name)
    }

    /// Drop every attribute of this element.
    pub fn clear_attributes(&self) {
        self.node.lock().attributes.clear();
    }

    pub fn attributes(&self) -> BTreeMap<String, String> {
        self.node.lock().attributes.clone()
    }

    /// Append `child` and return a handle to it.
    pub fn append_child(&self, child: Element) -> Element {
        self.node.lock().children.push(child.clone());
        child
    }

    /// Remove `child` if it is a direct child of this element.
    pub fn remove_child(&self, child: &Element) -> bool {
        let mut node = self.node.lock();
        let before = node.children.len();
        node.children.retain(|c| !c.ptr_eq(child));
        node.children.len() != before
    }

    pub fn children(&self) -> Vec<Element> {
        self.node.lock().children.clone()
    }

    pub fn clear_children(&self) {
        self.node.lock().children.clear();
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.node.lock().text = Some(text.into());
    }

    pub fn text(&self) -> Option<String> {
        self.node.lock().text.clone()
    }

    /// Check whether two handles refer to the same node.
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Serialize the subtree to a markup string.
    pub fn to_markup(&self) -> String {
        let node = self.node.lock();
        let mut out = format!("<{}", node.tag);
        for (name, value) in &node.attributes {
            out.push_str(&format!(" {}=\"{}\"", name, escape(value, true)));
        }
        out.push('>');
        if let Some(text) = &node.text {
            out.push_str(&escape(text, false));
        }
        for child in &node.children {
            out.push_str(&child.to_markup());
        }
        out.push_str(&format!("</{}>", node.tag));
        out
    }
}

/// Escape markup-significant characters. Quotes only matter inside
/// attribute values.
fn escape(raw: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Element({})", self.to_markup())
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_node() {
        let el = Element::new("div");
        let other = el.clone();
        other.set_attribute("id", "root");
        assert_eq!(el.attribute("id").as_deref(), Some("root"));
        assert!(el.ptr_eq(&other));
    }

    #[test]
    fn append_and_remove_child() {
        let parent = Element::new("div");
        let child = parent.append_child(Element::new("slot"));
        assert_eq!(parent.children().len(), 1);

        assert!(parent.remove_child(&child));
        assert!(parent.children().is_empty());
        assert!(!parent.remove_child(&child));
    }

    #[test]
    fn markup_includes_attributes_and_children() {
        let parent = Element::new("div");
        parent.set_attribute(PORTAL_ID_ATTRIBUTE, "p1");
        let child = parent.append_child(Element::new("span"));
        child.set_text("hi");

        assert_eq!(
            parent.to_markup(),
            "<div data-portal-id=\"p1\"><span>hi</span></div>"
        );
    }

    #[test]
    fn markup_escapes_attribute_values_and_text() {
        let el = Element::new("div");
        el.set_attribute("data-params", r#"{"q":"a&b"}"#);
        el.set_attribute("title", "\"><script>");
        el.set_text("1 < 2 & \"3\"");

        assert_eq!(
            el.to_markup(),
            concat!(
                r#"<div data-params="{&quot;q&quot;:&quot;a&amp;b&quot;}" "#,
                r#"title="&quot;>&lt;script>">1 &lt; 2 &amp; "3"</div>"#
            )
        );
    }

    #[test]
    fn distinct_elements_are_not_equal() {
        assert_ne!(Element::new("a"), Element::new("a"));
    }
}
