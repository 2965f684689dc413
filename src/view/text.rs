//! View text node type.

use crate::id::NodeId;

/// Text node in a view tree.
#[derive(Debug, Clone)]
pub struct ViewText {
    pub id: NodeId,
    /// Text content.
    pub data: String,
}

impl ViewText {
    /// Create a new text node.
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            id: NodeId::next(),
            data: data.into(),
        }
    }

    /// Check if the content is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check if the content is only whitespace.
    pub fn is_whitespace(&self) -> bool {
        self.data.trim().is_empty()
    }
}

impl PartialEq for ViewText {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_node() {
        let text = ViewText::new("  hi  ");
        assert!(!text.is_empty());
        assert!(!text.is_whitespace());
        assert!(ViewText::new("   ").is_whitespace());
    }
}
