//! Model text node type.

use compact_str::CompactString;

use crate::attr::AttrValue;

/// Text node in a model tree. Unlike view text, model text carries its own
/// attribute map (e.g. `bold=true`).
#[derive(Debug, Clone, PartialEq)]
pub struct ModelText {
    /// Text content.
    pub data: String,
    /// Ordered key-value attribute map.
    pub attrs: Vec<(CompactString, AttrValue)>,
}

impl ModelText {
    /// Create a new text node without attributes.
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            attrs: Vec::new(),
        }
    }

    /// Length in offset units (`char` count, not bytes).
    pub fn unit_len(&self) -> usize {
        self.data.chars().count()
    }

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

    /// Split this node at a `char` offset, keeping the head in place and
    /// returning the tail as a new node with the same attributes.
    pub fn split_at_unit(&mut self, at: usize) -> ModelText {
        let byte = self
            .data
            .char_indices()
            .nth(at)
            .map(|(b, _)| b)
            .unwrap_or(self.data.len());
        let tail = self.data.split_off(byte);
        ModelText {
            data: tail,
            attrs: self.attrs.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_at_unit() {
        let mut text = ModelText::new("foobar");
        text.set_attr("bold", AttrValue::Bool(true));
        let tail = text.split_at_unit(3);
        assert_eq!(text.data, "foo");
        assert_eq!(tail.data, "bar");
        assert_eq!(tail.get_attr("bold"), Some(&AttrValue::Bool(true)));
    }

    #[test]
    fn test_split_multibyte() {
        let mut text = ModelText::new("aßc");
        let tail = text.split_at_unit(2);
        assert_eq!(text.data, "aß");
        assert_eq!(tail.data, "c");
        assert_eq!(text.unit_len(), 2);
    }
}
