//! Model tree types: nodes, positions, ranges, fragments.
//!
//! The model tree is the abstract, schema-governed side of the
//! conversion. Elements carry ordered attribute maps; text carries its
//! own attributes. Positions address points between nodes with `char`
//! granularity inside text (see [`position`]).

mod element;
mod fragment;
mod position;
mod text;

pub use element::{ModelElement, OffsetSlot};
pub use fragment::ModelFragment;
pub use position::{OffsetPath, Position, Range};
pub use text::ModelText;

use smallvec::SmallVec;

/// Reserved name of the transient marker sentinel element.
pub const MARKER_ELEMENT: &str = "$marker";

/// Attribute on a sentinel element holding the marker name.
pub const MARKER_NAME_ATTRIBUTE: &str = "data-name";

/// Schema item name standing in for text nodes.
pub const TEXT_ITEM: &str = "$text";

/// Node in a model tree - either Element or Text.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelNode {
    Element(Box<ModelElement>),
    Text(ModelText),
}

impl ModelNode {
    /// Check if this is an element node.
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self, ModelNode::Element(_))
    }

    /// Check if this is a text node.
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, ModelNode::Text(_))
    }

    /// Get as element reference.
    #[inline]
    pub fn as_element(&self) -> Option<&ModelElement> {
        match self {
            ModelNode::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get as mutable element reference.
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ModelElement> {
        match self {
            ModelNode::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get as text reference.
    #[inline]
    pub fn as_text(&self) -> Option<&ModelText> {
        match self {
            ModelNode::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Get as mutable text reference.
    #[inline]
    pub fn as_text_mut(&mut self) -> Option<&mut ModelText> {
        match self {
            ModelNode::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Width of this node in its parent's offset space.
    pub fn unit_len(&self) -> usize {
        match self {
            ModelNode::Element(_) => 1,
            ModelNode::Text(t) => t.unit_len(),
        }
    }
}

impl From<ModelElement> for ModelNode {
    fn from(e: ModelElement) -> Self {
        ModelNode::Element(Box::new(e))
    }
}

impl From<ModelText> for ModelNode {
    fn from(t: ModelText) -> Self {
        ModelNode::Text(t)
    }
}

/// Type alias for model children collections.
pub type ModelChildren = SmallVec<[ModelNode; 8]>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_len() {
        assert_eq!(ModelNode::from(ModelElement::new("x")).unit_len(), 1);
        assert_eq!(ModelNode::from(ModelText::new("abc")).unit_len(), 3);
    }
}
