use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tag name used for text nodes
pub const TEXT_TAG: &str = "#text";

/// Represents a DOM node in a page snapshot
///
/// Elements carry their attributes plus the live form state the page exposes as
/// properties (`value`, `checked`, `selected`), which can differ from the markup.
/// Text nodes use the tag `#text` and keep their content in `text_content`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// HTML tag name (e.g., "div", "input", "#text")
    pub tag_name: String,

    /// Element attributes (e.g., id, class, name, etc.)
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Content of a text node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Child nodes in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,

    /// Live value of input, textarea and select elements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Live checked state of radio and checkbox inputs
    #[serde(default)]
    pub checked: bool,

    /// Live selected state of option elements
    #[serde(default)]
    pub selected: bool,

    /// Whether the element is rendered
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

fn default_visible() -> bool {
    true
}

impl ElementNode {
    /// Create a new ElementNode
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: HashMap::new(),
            text_content: None,
            children: Vec::new(),
            value: None,
            checked: false,
            selected: false,
            is_visible: true,
        }
    }

    /// Create a text node
    pub fn text(content: impl Into<String>) -> Self {
        let mut node = Self::new(TEXT_TAG);
        node.text_content = Some(content.into());
        node
    }

    /// Builder method: set attributes
    pub fn with_attributes(mut self, attributes: HashMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Builder method: add one attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_attribute(key, value);
        self
    }

    /// Builder method: append a text child
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Self::text(text));
        self
    }

    /// Builder method: set children
    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children = children;
        self
    }

    /// Builder method: append a child
    pub fn with_child(mut self, child: ElementNode) -> Self {
        self.children.push(child);
        self
    }

    /// Builder method: set the live value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Builder method: set the checked state
    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    /// Builder method: set the selected state
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Builder method: set visibility
    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.is_visible = visible;
        self
    }

    /// Add a single attribute
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Add a child node
    pub fn add_child(&mut self, child: ElementNode) {
        self.children.push(child);
    }

    /// Get attribute value by key
    pub fn get_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)
    }

    /// Iterate over the class names
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace())
            .into_iter()
            .flatten()
    }

    /// Check if element has a specific class
    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes().any(|c| c == class_name)
    }

    /// Get element ID
    pub fn id(&self) -> Option<&String> {
        self.attributes.get("id")
    }

    /// Get the `name` attribute
    pub fn name(&self) -> Option<&String> {
        self.attributes.get("name")
    }

    /// Check if element is a specific tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Whether this is a text node
    pub fn is_text(&self) -> bool {
        self.tag_name == TEXT_TAG
    }

    /// Lowercased `type` of an input element; absent types read as "text"
    pub fn input_type(&self) -> Option<String> {
        if !self.is_tag("input") {
            return None;
        }
        Some(
            self.get_attribute("type")
                .map(|t| t.to_ascii_lowercase())
                .unwrap_or_else(|| "text".to_string()),
        )
    }

    /// Radio or checkbox input
    pub fn is_choice_input(&self) -> bool {
        matches!(self.input_type().as_deref(), Some("radio") | Some("checkbox"))
    }

    /// Text input, textarea or select
    pub fn is_text_entry(&self) -> bool {
        self.is_tag("textarea")
            || self.is_tag("select")
            || matches!(self.input_type().as_deref(), Some("text"))
    }

    /// Any input, textarea or select
    pub fn is_form_control(&self) -> bool {
        self.is_tag("input") || self.is_tag("textarea") || self.is_tag("select")
    }

    /// Remove script, style and noscript subtrees
    pub fn simplify(&mut self) {
        self.children.retain(|child| {
            !matches!(child.tag_name.as_str(), "script" | "style" | "noscript")
        });

        for child in &mut self.children {
            child.simplify();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_node_creation() {
        let mut attrs = HashMap::new();
        attrs.insert("id".to_string(), "q12:3_answer0".to_string());
        attrs.insert("class".to_string(), "form-check-input".to_string());

        let element = ElementNode::new("INPUT")
            .with_attributes(attrs)
            .with_attribute("type", "radio")
            .with_value("0")
            .with_checked(true);

        assert_eq!(element.tag_name, "input");
        assert_eq!(element.id(), Some(&"q12:3_answer0".to_string()));
        assert_eq!(element.value.as_deref(), Some("0"));
        assert!(element.checked);
        assert!(element.is_visible);
        assert!(element.is_choice_input());
    }

    #[test]
    fn test_has_class() {
        let mut element = ElementNode::new("span");
        element.add_attribute("class", "drop  place3 group1");

        assert!(element.has_class("drop"));
        assert!(element.has_class("place3"));
        assert!(!element.has_class("place"));
        assert_eq!(element.classes().count(), 3);
    }

    #[test]
    fn test_input_kinds() {
        let untyped = ElementNode::new("input");
        assert_eq!(untyped.input_type().as_deref(), Some("text"));
        assert!(untyped.is_text_entry());

        let hidden = ElementNode::new("input").with_attribute("type", "HIDDEN");
        assert_eq!(hidden.input_type().as_deref(), Some("hidden"));
        assert!(!hidden.is_text_entry());
        assert!(hidden.is_form_control());

        assert!(ElementNode::new("select").is_text_entry());
        assert_eq!(ElementNode::new("div").input_type(), None);
    }

    #[test]
    fn test_simplify() {
        let mut parent = ElementNode::new("div")
            .with_child(ElementNode::new("p").with_text("Content"))
            .with_child(ElementNode::new("script").with_text("M.util.init()"))
            .with_child(ElementNode::new("style").with_text(".que { color: red; }"))
            .with_child(ElementNode::new("span").with_text("More content"));

        parent.simplify();

        assert_eq!(parent.children.len(), 2);
        assert!(parent.children[0].is_tag("p"));
        assert!(parent.children[1].is_tag("span"));
    }

    #[test]
    fn test_serialization_defaults() {
        let json = r##"{"tag_name":"span","attributes":{"class":"drop place1"},"children":[{"tag_name":"#text","text_content":"x"}]}"##;
        let node: ElementNode = serde_json::from_str(json).unwrap();

        assert!(node.is_visible);
        assert!(!node.checked);
        assert!(node.children[0].is_text());

        let round: ElementNode = serde_json::from_str(&serde_json::to_string(&node).unwrap()).unwrap();
        assert_eq!(node, round);
    }
}
