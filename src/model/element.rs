//! Model element type and offset arithmetic.
//!
//! All position resolution in the conversion writer goes through the
//! offset helpers here. Inside an element, a child element is one offset
//! unit wide and a text child is as wide as its `char` count.

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::attr::AttrValue;
use crate::id::NodeId;

use super::{ModelChildren, ModelNode};

/// Where an offset lands within an element's child list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetSlot {
    /// On a boundary before the child at this index (index may equal the
    /// child count, meaning the end of the element).
    Before(usize),
    /// Strictly inside the text child at this index, at the given inner
    /// `char` offset.
    InText(usize, usize),
}

/// Element in a model tree.
#[derive(Debug, Clone)]
pub struct ModelElement {
    pub id: NodeId,
    /// Element name, e.g. `paragraph`.
    pub name: CompactString,
    /// Ordered key-value attribute map.
    pub attrs: Vec<(CompactString, AttrValue)>,
    /// Child nodes.
    pub children: ModelChildren,
}

impl ModelElement {
    /// Create an element with the given name.
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            attrs: Vec::new(),
            children: SmallVec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Attribute access
    // ─────────────────────────────────────────────────────────────────────

    /// Get an attribute value by key.
    pub fn get_attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Set an attribute value (update if present, add otherwise).
    pub fn set_attr(&mut self, key: impl Into<CompactString>, value: AttrValue) {
        let key = key.into();
        if let Some(attr) = self.attrs.iter_mut().find(|(k, _)| *k == key) {
            attr.1 = value;
        } else {
            self.attrs.push((key, value));
        }
    }

    /// Set an attribute, builder style.
    pub fn attr(mut self, key: impl Into<CompactString>, value: impl Into<AttrValue>) -> Self {
        self.set_attr(key, value.into());
        self
    }

    /// Append a child, builder style.
    pub fn child(mut self, node: impl Into<ModelNode>) -> Self {
        self.children.push(node.into());
        self
    }

    // ─────────────────────────────────────────────────────────────────────
    // Offset arithmetic
    // ─────────────────────────────────────────────────────────────────────

    /// Total width of the child list in offset units.
    pub fn max_offset(&self) -> usize {
        self.children.iter().map(ModelNode::unit_len).sum()
    }

    /// Offset of the child at the given index.
    pub fn offset_of_child(&self, index: usize) -> usize {
        self.children[..index].iter().map(ModelNode::unit_len).sum()
    }

    /// Locate an offset within the child list. Returns `None` if the
    /// offset exceeds [`Self::max_offset`].
    pub fn locate_offset(&self, offset: usize) -> Option<OffsetSlot> {
        let mut acc = 0;
        for (i, child) in self.children.iter().enumerate() {
            if offset == acc {
                return Some(OffsetSlot::Before(i));
            }
            let width = child.unit_len();
            if offset < acc + width {
                // Interior of this child; only text has interior offsets
                // since elements are one unit wide.
                return Some(OffsetSlot::InText(i, offset - acc));
            }
            acc += width;
        }
        (offset == acc).then_some(OffsetSlot::Before(self.children.len()))
    }

    /// Resolve an offset to a child index for insertion, splitting a text
    /// child in two when the offset falls inside it. Returns `None` if the
    /// offset is out of bounds.
    pub fn insertion_index(&mut self, offset: usize) -> Option<usize> {
        match self.locate_offset(offset)? {
            OffsetSlot::Before(i) => Some(i),
            OffsetSlot::InText(i, inner) => {
                let tail = match &mut self.children[i] {
                    ModelNode::Text(t) => ModelNode::Text(t.split_at_unit(inner)),
                    ModelNode::Element(_) => return None,
                };
                self.children.insert(i + 1, tail);
                Some(i + 1)
            }
        }
    }

    /// Split this element at an offset, keeping the head children in place
    /// and returning the tail as a new element with the same name and
    /// attributes (and a fresh identity). A text child straddling the
    /// offset is split along with the element.
    pub fn split_off_at(&mut self, offset: usize) -> Option<ModelElement> {
        let index = self.insertion_index(offset)?;
        let tail_children: ModelChildren = self.children.drain(index..).collect();
        let mut tail = ModelElement::new(self.name.clone());
        tail.attrs = self.attrs.clone();
        tail.children = tail_children;
        Some(tail)
    }

    /// Check if the element has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl PartialEq for ModelElement {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.attrs == other.attrs && self.children == other.children
    }
}
