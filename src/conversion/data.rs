//! Conversion context and per-item listener data.

use compact_str::CompactString;

use crate::attr::AttrValue;
use crate::model::{ModelElement, Position, Range};

/// One element of the simulated ancestor chain a conversion runs inside.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextItem {
    /// Element name.
    pub name: CompactString,
    /// Attributes, visible to schema attribute checks on the scaffold.
    pub attrs: Vec<(CompactString, AttrValue)>,
}

impl ContextItem {
    /// Context element with a bare name.
    pub fn named(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    /// Attach an attribute, builder style.
    pub fn attr(mut self, key: impl Into<CompactString>, value: impl Into<AttrValue>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    pub(crate) fn instantiate(&self) -> ModelElement {
        let mut el = ModelElement::new(self.name.clone());
        for (key, value) in &self.attrs {
            el.set_attr(key.clone(), value.clone());
        }
        el
    }
}

impl From<&str> for ContextItem {
    fn from(name: &str) -> Self {
        ContextItem::named(name)
    }
}

/// Ancestor chain for a conversion pass, outermost first.
///
/// The chain is materialized as a temporary scaffold so schema checks see
/// real ancestry; it never appears in the output fragment. An empty
/// context is treated as `["$root"]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionContext {
    items: Vec<ContextItem>,
}

impl ConversionContext {
    /// Plain `$root` context, the common case.
    pub fn root() -> Self {
        Self::of(["$root"])
    }

    /// Context from an ordered list of items, outermost first.
    pub fn of(items: impl IntoIterator<Item = impl Into<ContextItem>>) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    pub(crate) fn items(&self) -> &[ContextItem] {
        &self.items
    }
}

/// Mutable envelope threaded through every listener fired for one view
/// item.
///
/// A listener that converts the item records the produced range in
/// `model_range` and moves `cursor` to where the *next* sibling should be
/// converted. Listeners observing `model_range` already set treat the item
/// as handled and refine or skip, rather than convert again.
#[derive(Debug, Clone)]
pub struct ConversionData {
    /// Where conversion output for this item should be placed.
    pub cursor: Position,
    /// Model range produced for this item, once some listener converts it.
    pub model_range: Option<Range>,
}

impl ConversionData {
    /// Fresh envelope with an unset range.
    pub fn at(cursor: Position) -> Self {
        Self {
            cursor,
            model_range: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_of_strs() {
        let ctx = ConversionContext::of(["$root", "blockQuote"]);
        assert_eq!(ctx.items().len(), 2);
        assert_eq!(ctx.items()[1].name, "blockQuote");
    }

    #[test]
    fn test_context_item_attrs() {
        let item = ContextItem::named("listItem").attr("listType", "bulleted");
        let el = item.instantiate();
        assert_eq!(el.get_attr("listType").and_then(AttrValue::as_str), Some("bulleted"));
    }
}
