//! Model document fragment.
//!
//! The self-contained product of one conversion pass: the converted
//! subtree plus the marker map reconstructed from in-tree sentinels.

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::{ModelChildren, ModelNode, Range};

/// Root container for a converted model subtree.
#[derive(Debug, Clone, Default)]
pub struct ModelFragment {
    /// Child nodes.
    pub children: ModelChildren,
    /// Markers reconstructed during the pass, keyed by marker name. A
    /// collapsed range denotes a point marker.
    pub markers: FxHashMap<CompactString, Range>,
}

impl ModelFragment {
    /// Create an empty fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fragment from an existing child list.
    pub fn from_children(children: impl IntoIterator<Item = ModelNode>) -> Self {
        Self {
            children: children.into_iter().collect(),
            markers: FxHashMap::default(),
        }
    }

    /// Check if the fragment holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// First child, if any.
    pub fn first_child(&self) -> Option<&ModelNode> {
        self.children.first()
    }

    /// Concatenated text content of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut buf = String::new();
        let mut stack: SmallVec<[&ModelNode; 8]> = self.children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            match node {
                ModelNode::Text(t) => buf.push_str(&t.data),
                ModelNode::Element(e) => stack.extend(e.children.iter().rev()),
            }
        }
        buf
    }
}

impl PartialEq for ModelFragment {
    fn eq(&self, other: &Self) -> bool {
        self.children == other.children && self.markers == other.markers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelElement, ModelText};

    #[test]
    fn test_text_content() {
        let frag = ModelFragment::from_children([
            ModelNode::from(ModelElement::new("paragraph").child(ModelText::new("Foo"))),
            ModelNode::from(ModelText::new("bar")),
        ]);
        assert_eq!(frag.text_content(), "Foobar");
    }

    #[test]
    fn test_empty() {
        assert!(ModelFragment::new().is_empty());
        assert!(ModelFragment::new().first_child().is_none());
    }
}
