//! View element type.
//!
//! A view element exposes four kinds of consumable facets: its name, each
//! attribute, each class and each style property. Classes and styles are
//! kept apart from plain attributes so they can be matched and consumed
//! one by one.

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::id::NodeId;

use super::{ViewChildren, ViewNode, ViewText};

/// Element in a view tree.
#[derive(Debug, Clone)]
pub struct ViewElement {
    pub id: NodeId,
    /// Tag name, e.g. `p` or `strong`.
    pub name: CompactString,
    /// Plain attributes as ordered key-value pairs. `class` and `style`
    /// never appear here; they are unpacked into the fields below.
    pub attrs: Vec<(CompactString, String)>,
    /// Class names in declaration order, deduplicated.
    pub classes: Vec<CompactString>,
    /// Style properties as ordered property-value pairs.
    pub styles: Vec<(CompactString, String)>,
    /// Child nodes.
    pub children: ViewChildren,
}

impl ViewElement {
    /// Create an element with the given tag name.
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            attrs: Vec::new(),
            classes: Vec::new(),
            styles: Vec::new(),
            children: SmallVec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Attribute access
    // ─────────────────────────────────────────────────────────────────────

    /// Get attribute value by name.
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Check if an attribute exists.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == name)
    }

    /// Set an attribute value (update if it exists, add otherwise).
    ///
    /// `class` and `style` values are unpacked into [`Self::classes`] and
    /// [`Self::styles`] instead of being stored verbatim.
    pub fn set_attr(&mut self, name: impl Into<CompactString>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if name == "class" {
            for class in value.split_whitespace() {
                self.add_class(class);
            }
            return;
        }
        if name == "style" {
            for decl in value.split(';') {
                if let Some((prop, val)) = decl.split_once(':') {
                    self.set_style(prop.trim(), val.trim());
                }
            }
            return;
        }
        if let Some(attr) = self.attrs.iter_mut().find(|(k, _)| *k == name) {
            attr.1 = value;
        } else {
            self.attrs.push((name, value));
        }
    }

    /// Add a class name (no-op if already present).
    pub fn add_class(&mut self, class: impl Into<CompactString>) {
        let class = class.into();
        if !self.classes.contains(&class) {
            self.classes.push(class);
        }
    }

    /// Check if a class is present.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Set a style property.
    pub fn set_style(&mut self, prop: impl Into<CompactString>, value: impl Into<String>) {
        let prop = prop.into();
        let value = value.into();
        if let Some(style) = self.styles.iter_mut().find(|(k, _)| *k == prop) {
            style.1 = value;
        } else {
            self.styles.push((prop, value));
        }
    }

    /// Get a style property value.
    pub fn get_style(&self, prop: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|(k, _)| k == prop)
            .map(|(_, v)| v.as_str())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Builder API
    // ─────────────────────────────────────────────────────────────────────

    /// Set an attribute, builder style.
    pub fn attr(mut self, name: impl Into<CompactString>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Add a class, builder style.
    pub fn class(mut self, class: impl Into<CompactString>) -> Self {
        self.add_class(class);
        self
    }

    /// Set a style property, builder style.
    pub fn style(mut self, prop: impl Into<CompactString>, value: impl Into<String>) -> Self {
        self.set_style(prop, value);
        self
    }

    /// Append a child node, builder style.
    pub fn child(mut self, node: impl Into<ViewNode>) -> Self {
        self.children.push(node.into());
        self
    }

    /// Append a text child, builder style.
    pub fn text(mut self, data: impl Into<String>) -> Self {
        self.children.push(ViewNode::Text(ViewText::new(data)));
        self
    }

    // ─────────────────────────────────────────────────────────────────────
    // Other helpers
    // ─────────────────────────────────────────────────────────────────────

    /// Check if the element has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Iterate over direct child elements.
    pub fn children_elements(&self) -> impl Iterator<Item = &ViewElement> {
        self.children.iter().filter_map(|n| n.as_element())
    }
}

impl PartialEq for ViewElement {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.attrs == other.attrs
            && self.classes == other.classes
            && self.styles == other.styles
            && self.children == other.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_builder() {
        let elem = ViewElement::new("div")
            .attr("data-foo", "bar")
            .class("wide")
            .style("color", "red")
            .child(ViewElement::new("span"))
            .text("Hello");

        assert_eq!(elem.name, "div");
        assert_eq!(elem.get_attr("data-foo"), Some("bar"));
        assert!(elem.has_class("wide"));
        assert_eq!(elem.get_style("color"), Some("red"));
        assert_eq!(elem.child_count(), 2);
    }

    #[test]
    fn test_class_and_style_attrs_are_unpacked() {
        let elem = ViewElement::new("p")
            .attr("class", "a b  c")
            .attr("style", "margin-top: 2em; color: blue");

        assert!(elem.attrs.is_empty());
        assert_eq!(elem.classes, vec!["a", "b", "c"]);
        assert_eq!(elem.get_style("margin-top"), Some("2em"));
        assert_eq!(elem.get_style("color"), Some("blue"));
    }

    #[test]
    fn test_set_attr_updates_in_place() {
        let mut elem = ViewElement::new("a");
        elem.set_attr("href", "/one");
        elem.set_attr("href", "/two");
        assert_eq!(elem.attrs.len(), 1);
        assert_eq!(elem.get_attr("href"), Some("/two"));
    }

    #[test]
    fn test_duplicate_classes_collapse() {
        let elem = ViewElement::new("p").class("x").class("x");
        assert_eq!(elem.classes.len(), 1);
    }
}
