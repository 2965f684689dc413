//! Upcast dispatcher: event routing, depth-first traversal, and the
//! listener-facing conversion API.
//!
//! Listeners register against a statically typed event kind (a named
//! element, the element fallback, text, or document fragment) with a
//! priority. For each view item the dispatcher fires every applicable
//! listener, highest priority first and registration order within a
//! priority; element events merge the name-specific and fallback buckets
//! into one ordering. Listeners always run to completion; the consumable
//! ledger and the `model_range` guard, not an early stop, are what keep
//! two converters from both handling one item.
//!
//! The dispatcher itself is immutable during a pass. Everything mutable
//! lives in [`PassState`], created inside `convert()` and dropped when it
//! returns, so a dispatcher survives a failed pass untouched.

use compact_str::CompactString;
use rustc_hash::FxHashMap;

use crate::attr::AttrValue;
use crate::consumable::{Consumable, Facet};
use crate::error::{ConversionError, ConversionResult};
use crate::model::{
    ModelElement, ModelFragment, ModelText, Position, Range, TEXT_ITEM,
};
use crate::priority::Priority;
use crate::schema::Schema;
use crate::view::ViewNode;

use super::data::{ConversionContext, ConversionData};
use super::pass::{PassState, SplitResult, extract_markers};

/// Boxed upcast listener.
///
/// A listener receives the view item being dispatched, the shared data
/// envelope, and the conversion API. Returning an error aborts the whole
/// pass.
pub type UpcastListener =
    Box<dyn Fn(&ViewNode, &mut ConversionData, &mut ConversionApi<'_>) -> ConversionResult<()>>;

/// Boxed cleanup listener, run against the mutable input tree once before
/// conversion starts.
pub type CleanupListener = Box<dyn Fn(&mut ViewNode)>;

struct Listener {
    priority: Priority,
    seq: u64,
    f: UpcastListener,
}

struct Cleanup {
    priority: Priority,
    seq: u64,
    f: CleanupListener,
}

/// Event registry plus traversal engine for view-to-model conversion.
pub struct UpcastDispatcher {
    element: FxHashMap<CompactString, Vec<Listener>>,
    element_fallback: Vec<Listener>,
    text: Vec<Listener>,
    fragment: Vec<Listener>,
    cleanup: Vec<Cleanup>,
    next_seq: u64,
}

impl UpcastDispatcher {
    /// Dispatcher with the default low-priority converters installed:
    /// text insertion, and convert-children-in-place for fragments and
    /// unhandled elements.
    pub fn new() -> Self {
        let mut dispatcher = Self {
            element: FxHashMap::default(),
            element_fallback: Vec::new(),
            text: Vec::new(),
            fragment: Vec::new(),
            cleanup: Vec::new(),
            next_seq: 0,
        };
        dispatcher.on_text(Priority::Lowest, convert_text);
        dispatcher.on_element_fallback(Priority::Lowest, convert_children_in_place);
        dispatcher.on_fragment(Priority::Lowest, convert_children_in_place);
        dispatcher
    }

    // ─────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────

    /// Listen for elements with an exact name.
    pub fn on_element(
        &mut self,
        name: impl Into<CompactString>,
        priority: Priority,
        f: impl Fn(&ViewNode, &mut ConversionData, &mut ConversionApi<'_>) -> ConversionResult<()>
        + 'static,
    ) {
        let listener = self.listener(priority, f);
        insert_sorted(self.element.entry(name.into()).or_default(), listener);
    }

    /// Listen for every element regardless of name. Fallback listeners
    /// share one ordering with name-specific ones.
    pub fn on_element_fallback(
        &mut self,
        priority: Priority,
        f: impl Fn(&ViewNode, &mut ConversionData, &mut ConversionApi<'_>) -> ConversionResult<()>
        + 'static,
    ) {
        let listener = self.listener(priority, f);
        insert_sorted(&mut self.element_fallback, listener);
    }

    /// Listen for text nodes.
    pub fn on_text(
        &mut self,
        priority: Priority,
        f: impl Fn(&ViewNode, &mut ConversionData, &mut ConversionApi<'_>) -> ConversionResult<()>
        + 'static,
    ) {
        let listener = self.listener(priority, f);
        insert_sorted(&mut self.text, listener);
    }

    /// Listen for the document fragment root.
    pub fn on_fragment(
        &mut self,
        priority: Priority,
        f: impl Fn(&ViewNode, &mut ConversionData, &mut ConversionApi<'_>) -> ConversionResult<()>
        + 'static,
    ) {
        let listener = self.listener(priority, f);
        insert_sorted(&mut self.fragment, listener);
    }

    /// Register a cleanup listener, run once against the whole input tree
    /// before the consumable ledger is seeded. The only place the view
    /// tree may be mutated.
    pub fn on_cleanup(&mut self, priority: Priority, f: impl Fn(&mut ViewNode) + 'static) {
        let seq = self.bump_seq();
        let cleanup = Cleanup {
            priority,
            seq,
            f: Box::new(f),
        };
        let at = self
            .cleanup
            .partition_point(|c| c.priority.rank() >= cleanup.priority.rank());
        self.cleanup.insert(at, cleanup);
    }

    fn listener(
        &mut self,
        priority: Priority,
        f: impl Fn(&ViewNode, &mut ConversionData, &mut ConversionApi<'_>) -> ConversionResult<()>
        + 'static,
    ) -> Listener {
        Listener {
            priority,
            seq: self.bump_seq(),
            f: Box::new(f),
        }
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    // ─────────────────────────────────────────────────────────────────────
    // Conversion
    // ─────────────────────────────────────────────────────────────────────

    /// Run one conversion pass over a view tree.
    ///
    /// Cleanup listeners run first (the one mutation window), then the
    /// consumable ledger is seeded, then the tree is converted depth
    /// first. On success the split-part sweep and marker extraction run
    /// before the fragment is returned. All pass state is local, so the
    /// dispatcher can be reused after success and failure alike.
    pub fn convert(
        &self,
        root: &mut ViewNode,
        context: &ConversionContext,
        schema: &Schema,
    ) -> ConversionResult<ModelFragment> {
        for cleanup in &self.cleanup {
            (cleanup.f)(root);
        }

        let mut state = PassState::new(context);
        let mut consumable = Consumable::from_view(root);
        let cursor = state.initial_cursor();
        let mut api = ConversionApi {
            dispatcher: self,
            schema,
            consumable: &mut consumable,
            state: &mut state,
        };
        api.convert_item(root, cursor)?;

        state.remove_empty_split_parts();
        let mut fragment = ModelFragment::from_children(state.take_output()?);
        extract_markers(&mut fragment)?;
        Ok(fragment)
    }

    fn dispatch(
        &self,
        item: &ViewNode,
        data: &mut ConversionData,
        api: &mut ConversionApi<'_>,
    ) -> ConversionResult<()> {
        match item {
            ViewNode::Element(el) => {
                let named = self
                    .element
                    .get(el.name.as_str())
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                let mut merged: Vec<&Listener> =
                    named.iter().chain(self.element_fallback.iter()).collect();
                merged.sort_by_key(|l| (std::cmp::Reverse(l.priority.rank()), l.seq));
                for listener in merged {
                    (listener.f)(item, data, api)?;
                }
            }
            ViewNode::Text(_) => {
                for listener in &self.text {
                    (listener.f)(item, data, api)?;
                }
            }
            ViewNode::Fragment(_) => {
                for listener in &self.fragment {
                    (listener.f)(item, data, api)?;
                }
            }
        }
        Ok(())
    }
}

impl Default for UpcastDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep a bucket ordered by descending priority, registration order within
/// equal priority.
fn insert_sorted(bucket: &mut Vec<Listener>, listener: Listener) {
    let at = bucket.partition_point(|l| l.priority.rank() >= listener.priority.rank());
    bucket.insert(at, listener);
}

fn event_name(item: &ViewNode) -> String {
    match item {
        ViewNode::Element(el) => format!("element:{}", el.name),
        ViewNode::Text(_) => "text".to_string(),
        ViewNode::Fragment(_) => "documentFragment".to_string(),
    }
}

// =============================================================================
// Conversion API
// =============================================================================

/// Capabilities handed to upcast listeners: recursive conversion, the
/// consumable ledger, schema queries, and the model tree writer.
pub struct ConversionApi<'a> {
    dispatcher: &'a UpcastDispatcher,
    schema: &'a Schema,
    /// Consumable ledger for the current pass.
    pub consumable: &'a mut Consumable,
    state: &'a mut PassState,
}

impl ConversionApi<'_> {
    /// Schema governing this pass.
    pub fn schema(&self) -> &Schema {
        self.schema
    }

    /// Scratch store shared by all listeners of the current pass.
    pub fn store(&mut self) -> &mut FxHashMap<CompactString, AttrValue> {
        &mut self.state.store
    }

    /// Convert one view item at a cursor position.
    ///
    /// Fires all applicable listeners, then validates the range they left
    /// behind; a set but unresolvable (or inverted) range aborts the pass.
    /// An unset range means the item produced nothing; the returned cursor
    /// is then unchanged.
    pub fn convert_item(
        &mut self,
        item: &ViewNode,
        cursor: Position,
    ) -> ConversionResult<(Option<Range>, Position)> {
        let mut data = ConversionData::at(cursor);
        let dispatcher = self.dispatcher;
        dispatcher.dispatch(item, &mut data, self)?;
        if let Some(range) = &data.model_range {
            self.state
                .validate_range(range)
                .map_err(|reason| ConversionError::invalid_range(event_name(item), reason))?;
        }
        Ok((data.model_range, data.cursor))
    }

    /// Convert all children of a view node, threading the cursor through.
    /// Returns the range spanning everything the children produced
    /// (collapsed at the initial cursor when they produced nothing) and
    /// the final cursor.
    pub fn convert_children(
        &mut self,
        parent: &ViewNode,
        cursor: Position,
    ) -> ConversionResult<(Range, Position)> {
        let mut spanning = Range::collapsed_at(cursor.clone());
        let mut cursor = cursor;
        for child in parent.children() {
            let (range, next) = self.convert_item(child, cursor)?;
            if let Some(range) = range {
                spanning = spanning.joined(&range);
            }
            cursor = next;
        }
        Ok((spanning, cursor))
    }

    /// Names of the ancestor chain enclosing a position, outermost first.
    pub fn ancestors_at(&self, pos: &Position) -> ConversionResult<Vec<CompactString>> {
        self.state.ancestors_at(pos)
    }

    /// Schema-directed placement; see [`PassState::split_to_allowed_parent`].
    pub fn split_to_allowed_parent(
        &mut self,
        child_name: &str,
        pos: &Position,
    ) -> ConversionResult<Option<SplitResult>> {
        self.state.split_to_allowed_parent(self.schema, child_name, pos)
    }

    /// Insert a model element at a position.
    pub fn insert_element(&mut self, element: ModelElement, pos: &Position) -> ConversionResult<()> {
        self.state.insert_element(element, pos)
    }

    /// Insert a model text node at a position, merging with a compatible
    /// neighbor.
    pub fn insert_text(&mut self, text: ModelText, pos: &Position) -> ConversionResult<()> {
        self.state.insert_text(text, pos)
    }

    /// Apply an attribute across a range, wherever the schema permits it.
    /// Returns the number of nodes that received the attribute.
    pub fn set_attribute_in_range(
        &mut self,
        key: &str,
        value: &AttrValue,
        range: &Range,
    ) -> ConversionResult<usize> {
        self.state.set_attribute_in_range(self.schema, key, value, range)
    }
}

// =============================================================================
// Default converters
// =============================================================================

/// Lowest-priority text converter: insert the text at the cursor when the
/// schema allows text there and the node is still unconsumed.
fn convert_text(
    item: &ViewNode,
    data: &mut ConversionData,
    api: &mut ConversionApi<'_>,
) -> ConversionResult<()> {
    let ViewNode::Text(text) = item else {
        return Ok(());
    };
    if data.model_range.is_some() {
        return Ok(());
    }
    let ancestors = api.ancestors_at(&data.cursor)?;
    if !api.schema().check_child(&ancestors, TEXT_ITEM) {
        return Ok(());
    }
    if !api.consumable.consume_if_testable(text.id, &[Facet::Name]) {
        return Ok(());
    }

    let width = text.data.chars().count();
    api.insert_text(ModelText::new(&text.data), &data.cursor)?;
    let start = data.cursor.clone();
    let end = start.advanced(width);
    data.model_range = Some(Range::new(start, end.clone()));
    data.cursor = end;
    Ok(())
}

/// Lowest-priority structural fallback: convert the children where the
/// item itself stands, so unhandled containers dissolve but their content
/// survives.
fn convert_children_in_place(
    item: &ViewNode,
    data: &mut ConversionData,
    api: &mut ConversionApi<'_>,
) -> ConversionResult<()> {
    if data.model_range.is_some() {
        return Ok(());
    }
    if let ViewNode::Element(el) = item {
        if !api.consumable.consume_if_testable(el.id, &[Facet::Name]) {
            return Ok(());
        }
    }
    let (range, cursor) = api.convert_children(item, data.cursor.clone())?;
    data.model_range = Some(range);
    data.cursor = cursor;
    Ok(())
}
