//! View tree types.
//!
//! The view tree is the semantic/presentational side of the conversion:
//! elements with attributes, classes and styles, text nodes, and a
//! document fragment as root container. During one conversion pass the
//! tree is read-only to converters; only the one-time cleanup pre-pass
//! may mutate it.

mod element;
mod text;

pub use element::ViewElement;
pub use text::ViewText;

use smallvec::SmallVec;

use crate::id::NodeId;

/// Node in a view tree.
#[derive(Debug, Clone)]
pub enum ViewNode {
    Element(Box<ViewElement>),
    Text(ViewText),
    Fragment(Box<ViewFragment>),
}

impl ViewNode {
    /// Check if this is an element node.
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self, ViewNode::Element(_))
    }

    /// Check if this is a text node.
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, ViewNode::Text(_))
    }

    /// Get as element reference.
    #[inline]
    pub fn as_element(&self) -> Option<&ViewElement> {
        match self {
            ViewNode::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get as text reference.
    #[inline]
    pub fn as_text(&self) -> Option<&ViewText> {
        match self {
            ViewNode::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Children of this node; empty for text nodes.
    pub fn children(&self) -> &[ViewNode] {
        match self {
            ViewNode::Element(e) => &e.children,
            ViewNode::Fragment(f) => &f.children,
            ViewNode::Text(_) => &[],
        }
    }

    /// Mutable children of this node, if it can have any.
    pub fn children_mut(&mut self) -> Option<&mut ViewChildren> {
        match self {
            ViewNode::Element(e) => Some(&mut e.children),
            ViewNode::Fragment(f) => Some(&mut f.children),
            ViewNode::Text(_) => None,
        }
    }
}

impl From<ViewElement> for ViewNode {
    fn from(e: ViewElement) -> Self {
        ViewNode::Element(Box::new(e))
    }
}

impl From<ViewText> for ViewNode {
    fn from(t: ViewText) -> Self {
        ViewNode::Text(t)
    }
}

impl From<ViewFragment> for ViewNode {
    fn from(f: ViewFragment) -> Self {
        ViewNode::Fragment(Box::new(f))
    }
}

// Identity (NodeId) is deliberately excluded from equality: two trees with
// the same shape and payload compare equal.
impl PartialEq for ViewNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ViewNode::Element(a), ViewNode::Element(b)) => a == b,
            (ViewNode::Text(a), ViewNode::Text(b)) => a == b,
            (ViewNode::Fragment(a), ViewNode::Fragment(b)) => a == b,
            _ => false,
        }
    }
}

/// Type alias for view children collections.
pub type ViewChildren = SmallVec<[ViewNode; 8]>;

/// Root container for a view tree.
#[derive(Debug, Clone)]
pub struct ViewFragment {
    pub id: NodeId,
    pub children: ViewChildren,
}

impl ViewFragment {
    /// Create an empty fragment.
    pub fn new() -> Self {
        Self {
            id: NodeId::next(),
            children: SmallVec::new(),
        }
    }

    /// Append a child node, builder style.
    pub fn child(mut self, node: impl Into<ViewNode>) -> Self {
        self.children.push(node.into());
        self
    }

    /// Concatenated text content of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut buf = String::new();
        for child in &self.children {
            collect_text(child, &mut buf);
        }
        buf
    }
}

impl Default for ViewFragment {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ViewFragment {
    fn eq(&self, other: &Self) -> bool {
        self.children == other.children
    }
}

fn collect_text(node: &ViewNode, buf: &mut String) {
    match node {
        ViewNode::Text(t) => buf.push_str(&t.data),
        ViewNode::Element(e) => {
            for child in &e.children {
                collect_text(child, buf);
            }
        }
        ViewNode::Fragment(f) => {
            for child in &f.children {
                collect_text(child, buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_text_content() {
        let frag = ViewFragment::new()
            .child(ViewElement::new("p").text("Hello "))
            .child(ViewText::new("world"));
        assert_eq!(frag.text_content(), "Hello world");
    }

    #[test]
    fn test_structural_equality_ignores_identity() {
        let a = ViewFragment::new().child(ViewElement::new("p").text("x"));
        let b = ViewFragment::new().child(ViewElement::new("p").text("x"));
        assert_eq!(a, b);

        let c = ViewFragment::new().child(ViewElement::new("q").text("x"));
        assert_ne!(a, c);
    }
}
