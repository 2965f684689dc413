//! Schema: the policy oracle deciding where model nodes and attributes
//! are allowed.
//!
//! The conversion core consults the schema but never owns document
//! policy: callers register items (`paragraph` allowed in `$root`, `bold`
//! allowed on `$text`, ...) before running conversions. Marker sentinels
//! are allowed everywhere since they are removed before the fragment is
//! handed back.

use compact_str::CompactString;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::model::{MARKER_ELEMENT, TEXT_ITEM};

/// Declarative definition of one schema item.
#[derive(Debug, Clone, Default)]
pub struct SchemaItemDef {
    /// Parent element names this item may appear in.
    pub allowed_in: Vec<CompactString>,
    /// Attribute keys this item may carry.
    pub allowed_attributes: Vec<CompactString>,
}

impl SchemaItemDef {
    /// Start an empty definition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow this item inside the given parent.
    pub fn allowed_in(mut self, parent: impl Into<CompactString>) -> Self {
        self.allowed_in.push(parent.into());
        self
    }

    /// Allow an attribute key on this item.
    pub fn allows_attribute(mut self, key: impl Into<CompactString>) -> Self {
        self.allowed_attributes.push(key.into());
        self
    }
}

#[derive(Debug, Default)]
struct SchemaItem {
    allowed_in: FxHashSet<CompactString>,
    allowed_attributes: FxHashSet<CompactString>,
}

/// Registry of schema items.
#[derive(Debug, Default)]
pub struct Schema {
    items: FxHashMap<CompactString, SchemaItem>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item definition. Re-registering a name extends the
    /// existing item.
    pub fn register(&mut self, name: impl Into<CompactString>, def: SchemaItemDef) {
        let item = self.items.entry(name.into()).or_default();
        item.allowed_in.extend(def.allowed_in);
        item.allowed_attributes.extend(def.allowed_attributes);
    }

    /// Register `$text` as allowed inside the given parents.
    pub fn register_text(&mut self, allowed_in: &[&str]) {
        let mut def = SchemaItemDef::new();
        for parent in allowed_in {
            def = def.allowed_in(*parent);
        }
        self.register(TEXT_ITEM, def);
    }

    /// May `child` appear as a child of the innermost ancestor in
    /// `ancestors`? Sentinel elements are allowed everywhere.
    pub fn check_child(&self, ancestors: &[CompactString], child: &str) -> bool {
        if child == MARKER_ELEMENT {
            return true;
        }
        let Some(parent) = ancestors.last() else {
            return false;
        };
        self.items
            .get(child)
            .is_some_and(|item| item.allowed_in.contains(parent.as_str()))
    }

    /// May the item `name` carry the attribute `key`? Text nodes are
    /// checked under the `$text` item name.
    pub fn check_attribute(&self, name: &str, key: &str) -> bool {
        self.items
            .get(name)
            .is_some_and(|item| item.allowed_attributes.contains(key))
    }

    /// Nearest ancestor (including the innermost, i.e. the current parent)
    /// that accepts `child`. Returns how many levels up it sits: `0` means
    /// the current parent already qualifies. `None` when no ancestor does.
    pub fn find_allowed_parent(&self, ancestors: &[CompactString], child: &str) -> Option<usize> {
        if child == MARKER_ELEMENT {
            return Some(0);
        }
        let item = self.items.get(child)?;
        ancestors
            .iter()
            .rev()
            .position(|name| item.allowed_in.contains(name.as_str()))
    }
}
