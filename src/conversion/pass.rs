//! Per-pass conversion state and tree writer.
//!
//! One `convert()` call owns exactly one `PassState`: the scaffold model
//! tree (context ancestor chain plus everything converted so far), the
//! registry of split-off shells to sweep after the pass, and the scratch
//! store listeners may use to coordinate. All of it is dropped when the
//! pass returns, success or failure, so the dispatcher stays stateless
//! between calls.
//!
//! Positions handed to the writer are offset paths relative to the
//! scaffold root (the outermost context element).

use std::collections::hash_map::Entry;

use compact_str::CompactString;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::attr::AttrValue;
use crate::error::{ConversionError, ConversionResult};
use crate::id::NodeId;
use crate::model::{
    MARKER_ELEMENT, MARKER_NAME_ATTRIBUTE, ModelChildren, ModelElement, ModelFragment, ModelNode,
    ModelText, OffsetPath, OffsetSlot, Position, Range, TEXT_ITEM,
};
use crate::schema::Schema;

use super::data::ConversionContext;

/// Result of a schema-directed split.
///
/// `position` is where the caller may now insert its node. When ancestors
/// were split, [`SplitResult::cursor_parent`] names the position where
/// conversion of the *following* siblings should continue, so they land
/// next to, not inside, the just-inserted node.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitResult {
    /// Legal insertion point for the node the split was requested for.
    pub position: Position,
    /// How many ancestors were physically split (`0` = none).
    pub split_levels: usize,
}

impl SplitResult {
    /// Position where sibling conversion continues after exactly one
    /// element has been inserted at [`SplitResult::position`]: the start
    /// of the innermost trailing split half. `None` when nothing was
    /// split.
    pub fn cursor_parent(&self) -> Option<Position> {
        if self.split_levels == 0 {
            return None;
        }
        let mut pos = self.position.advanced(1);
        for _ in 0..self.split_levels {
            pos = pos.descended(0);
        }
        Some(pos)
    }
}

/// Mutable state owned by one conversion pass.
pub(crate) struct PassState {
    root: ModelElement,
    context_depth: usize,
    split_parts: FxHashSet<NodeId>,
    pub(crate) store: FxHashMap<CompactString, AttrValue>,
}

impl PassState {
    /// Build the context ancestor chain as real (temporary) model nodes so
    /// that schema checks see correct ancestry. An empty context defaults
    /// to a bare `$root`.
    pub(crate) fn new(context: &ConversionContext) -> Self {
        let items = context.items();
        let mut root = match items.first() {
            Some(item) => item.instantiate(),
            None => ModelElement::new("$root"),
        };
        let mut cur = &mut root;
        for item in items.iter().skip(1) {
            cur.children.push(ModelNode::from(item.instantiate()));
            let Some(ModelNode::Element(next)) = cur.children.last_mut() else {
                unreachable!("just pushed an element child");
            };
            cur = next;
        }
        Self {
            root,
            context_depth: items.len().max(1),
            split_parts: FxHashSet::default(),
            store: FxHashMap::default(),
        }
    }

    /// Cursor at the start of the innermost context element.
    pub(crate) fn initial_cursor(&self) -> Position {
        Position::at(std::iter::repeat_n(0, self.context_depth))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Position resolution
    // ─────────────────────────────────────────────────────────────────────

    fn descend<'t>(
        root: &'t ModelElement,
        descent: &[usize],
    ) -> ConversionResult<&'t ModelElement> {
        let mut cur = root;
        for &offset in descent {
            match cur.locate_offset(offset) {
                Some(OffsetSlot::Before(idx)) => match cur.children.get(idx) {
                    Some(ModelNode::Element(e)) => cur = e,
                    _ => return Err(invalid_position(descent, "offset is not at an element")),
                },
                _ => return Err(invalid_position(descent, "offset out of bounds")),
            }
        }
        Ok(cur)
    }

    fn descend_mut<'t>(
        root: &'t mut ModelElement,
        descent: &[usize],
    ) -> ConversionResult<&'t mut ModelElement> {
        let mut cur = root;
        for &offset in descent {
            match cur.locate_offset(offset) {
                Some(OffsetSlot::Before(idx)) => match cur.children.get_mut(idx) {
                    Some(ModelNode::Element(e)) => cur = e,
                    _ => return Err(invalid_position(descent, "offset is not at an element")),
                },
                _ => return Err(invalid_position(descent, "offset out of bounds")),
            }
        }
        Ok(cur)
    }

    /// Names of the ancestor chain enclosing a position, outermost first.
    pub(crate) fn ancestors_at(&self, pos: &Position) -> ConversionResult<Vec<CompactString>> {
        let descent = parent_descent(&pos.path);
        let mut names = vec![self.root.name.clone()];
        let mut cur = &self.root;
        for (depth, &offset) in descent.iter().enumerate() {
            match cur.locate_offset(offset) {
                Some(OffsetSlot::Before(idx)) => match cur.children.get(idx) {
                    Some(ModelNode::Element(e)) => {
                        names.push(e.name.clone());
                        cur = e;
                    }
                    _ => {
                        return Err(invalid_position(
                            &descent[..=depth],
                            "offset is not at an element",
                        ));
                    }
                },
                _ => return Err(invalid_position(&descent[..=depth], "offset out of bounds")),
            }
        }
        Ok(names)
    }

    fn resolve_position(&self, pos: &Position) -> Result<(), String> {
        if pos.path.is_empty() {
            return Err("empty offset path".into());
        }
        let descent = parent_descent(&pos.path);
        let parent = Self::descend(&self.root, descent).map_err(|e| e.to_string())?;
        match parent.locate_offset(pos.offset()) {
            Some(_) => Ok(()),
            None => Err(format!(
                "offset {} exceeds parent width {}",
                pos.offset(),
                parent.max_offset()
            )),
        }
    }

    /// Check that a listener-produced range resolves against the tree.
    pub(crate) fn validate_range(&self, range: &Range) -> Result<(), String> {
        self.resolve_position(&range.start)
            .map_err(|e| format!("start: {e}"))?;
        self.resolve_position(&range.end)
            .map_err(|e| format!("end: {e}"))?;
        if range.end < range.start {
            return Err("end precedes start".into());
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Writing
    // ─────────────────────────────────────────────────────────────────────

    /// Insert an element at a position, splitting a straddled text node if
    /// necessary.
    pub(crate) fn insert_element(
        &mut self,
        element: ModelElement,
        pos: &Position,
    ) -> ConversionResult<()> {
        let descent = parent_descent(&pos.path);
        let offset = pos.offset();
        let parent = Self::descend_mut(&mut self.root, descent)?;
        let idx = parent
            .insertion_index(offset)
            .ok_or_else(|| invalid_position(&pos.path, "offset out of bounds"))?;
        parent.children.insert(idx, ModelNode::from(element));
        Ok(())
    }

    /// Insert a text node at a position, merging with an adjacent text
    /// sibling that carries the same attributes.
    pub(crate) fn insert_text(&mut self, text: ModelText, pos: &Position) -> ConversionResult<()> {
        let descent = parent_descent(&pos.path);
        let offset = pos.offset();
        let parent = Self::descend_mut(&mut self.root, descent)?;
        let idx = parent
            .insertion_index(offset)
            .ok_or_else(|| invalid_position(&pos.path, "offset out of bounds"))?;
        if idx > 0 {
            if let Some(ModelNode::Text(prev)) = parent.children.get_mut(idx - 1) {
                if prev.attrs == text.attrs {
                    prev.data.push_str(&text.data);
                    return Ok(());
                }
            }
        }
        parent.children.insert(idx, ModelNode::Text(text));
        Ok(())
    }

    /// Schema-directed placement: find the nearest ancestor accepting
    /// `child_name` and split everything in between.
    ///
    /// Returns `None` (node must be dropped) when no ancestor qualifies or
    /// when the qualifying ancestor lies outside the context scaffold;
    /// conversion never splits the scaffold itself.
    pub(crate) fn split_to_allowed_parent(
        &mut self,
        schema: &Schema,
        child_name: &str,
        pos: &Position,
    ) -> ConversionResult<Option<SplitResult>> {
        let ancestors = self.ancestors_at(pos)?;
        let Some(levels) = schema.find_allowed_parent(&ancestors, child_name) else {
            return Ok(None);
        };
        if levels == 0 {
            return Ok(Some(SplitResult {
                position: pos.clone(),
                split_levels: 0,
            }));
        }
        // Chain indices 0..context_depth are scaffold elements; every
        // element to be split must sit below the scaffold.
        let qualifying = ancestors.len() - 1 - levels;
        if qualifying + 1 < self.context_depth {
            return Ok(None);
        }

        let mut path = pos.path.clone();
        for _ in 0..levels {
            let n = path.len();
            let split_offset = path[n - 1];
            let elem_offset = path[n - 2];
            let parent = Self::descend_mut(&mut self.root, &path[..n - 2])?;
            let Some(OffsetSlot::Before(idx)) = parent.locate_offset(elem_offset) else {
                return Err(invalid_position(&path, "split point out of bounds"));
            };
            let Some(ModelNode::Element(elem)) = parent.children.get_mut(idx) else {
                return Err(invalid_position(&path, "split point is not inside an element"));
            };
            let Some(tail) = elem.split_off_at(split_offset) else {
                return Err(invalid_position(&path, "split offset out of bounds"));
            };
            let head_id = elem.id;
            let tail_id = tail.id;
            parent.children.insert(idx + 1, ModelNode::from(tail));
            // Both halves may end up empty; record them for the post-pass
            // sweep.
            self.split_parts.insert(head_id);
            self.split_parts.insert(tail_id);
            path.pop();
            let n = path.len();
            path[n - 1] = elem_offset + 1;
        }
        Ok(Some(SplitResult {
            position: Position { path },
            split_levels: levels,
        }))
    }

    /// Apply an attribute to every node in the range the schema permits it
    /// on. Returns how many nodes actually received the attribute.
    pub(crate) fn set_attribute_in_range(
        &mut self,
        schema: &Schema,
        key: &str,
        value: &AttrValue,
        range: &Range,
    ) -> ConversionResult<usize> {
        let mut targets: Vec<OffsetPath> = Vec::new();
        collect_in_range(&self.root, &mut SmallVec::new(), range, &mut targets);

        let mut applied = 0;
        for path in targets {
            let descent = parent_descent(&path);
            let offset = path[path.len() - 1];
            let parent = Self::descend_mut(&mut self.root, descent)?;
            let Some(OffsetSlot::Before(idx)) = parent.locate_offset(offset) else {
                continue;
            };
            match parent.children.get_mut(idx) {
                Some(ModelNode::Element(e)) if schema.check_attribute(&e.name, key) => {
                    e.set_attr(key, value.clone());
                    applied += 1;
                }
                Some(ModelNode::Text(t)) if schema.check_attribute(TEXT_ITEM, key) => {
                    t.set_attr(key, value.clone());
                    applied += 1;
                }
                _ => {}
            }
        }
        Ok(applied)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Post-pass
    // ─────────────────────────────────────────────────────────────────────

    /// Fixed-point sweep over the split-part registry: delete every
    /// registered element that ended up empty, and re-scan, since deleting
    /// a child can empty its former container.
    pub(crate) fn remove_empty_split_parts(&mut self) {
        while sweep(&mut self.root, &mut self.split_parts) {}
    }

    /// Move the converted content (children of the innermost context
    /// element) out of the scaffold.
    pub(crate) fn take_output(&mut self) -> ConversionResult<ModelChildren> {
        let descent: Vec<usize> = vec![0; self.context_depth - 1];
        let innermost = Self::descend_mut(&mut self.root, &descent)?;
        Ok(std::mem::take(&mut innermost.children))
    }
}

fn parent_descent(path: &[usize]) -> &[usize] {
    &path[..path.len().saturating_sub(1)]
}

fn invalid_position(path: &[usize], reason: &str) -> ConversionError {
    ConversionError::InvalidPosition {
        path: path.to_vec(),
        reason: reason.to_string(),
    }
}

fn collect_in_range(
    elem: &ModelElement,
    base: &mut OffsetPath,
    range: &Range,
    out: &mut Vec<OffsetPath>,
) {
    let mut offset = 0;
    for child in &elem.children {
        base.push(offset);
        let pos = Position { path: base.clone() };
        if range.contains(&pos) {
            out.push(base.clone());
        }
        if let ModelNode::Element(e) = child {
            collect_in_range(e, base, range, out);
        }
        base.pop();
        offset += child.unit_len();
    }
}

/// One removal sweep; true if anything was deleted. Deleted ids leave the
/// registry so they can never be re-considered.
fn sweep(elem: &mut ModelElement, parts: &mut FxHashSet<NodeId>) -> bool {
    let mut removed = false;
    for child in elem.children.iter_mut() {
        if let ModelNode::Element(e) = child {
            removed |= sweep(e, parts);
        }
    }
    let before = elem.children.len();
    elem.children.retain(|child| match child {
        ModelNode::Element(e) if e.is_empty() && parts.contains(&e.id) => {
            parts.remove(&e.id);
            false
        }
        _ => true,
    });
    removed || elem.children.len() != before
}

// =============================================================================
// Marker extraction
// =============================================================================

/// Fold marker sentinels left in the fragment into its marker map.
///
/// The first occurrence of a name opens a collapsed range at the sentinel
/// position; the second closes it there. Adjacent text nodes separated
/// only by a sentinel are merged back together. A name occurring a third
/// time is rejected.
pub(crate) fn extract_markers(fragment: &mut ModelFragment) -> ConversionResult<()> {
    let mut found: FxHashMap<CompactString, (Range, u8)> = FxHashMap::default();
    let mut path: OffsetPath = SmallVec::new();
    fold_sentinels(&mut fragment.children, &mut path, &mut found)?;
    fragment.markers = found.into_iter().map(|(name, (range, _))| (name, range)).collect();
    Ok(())
}

fn fold_sentinels(
    children: &mut ModelChildren,
    path: &mut OffsetPath,
    found: &mut FxHashMap<CompactString, (Range, u8)>,
) -> ConversionResult<()> {
    let old = std::mem::take(children);
    let mut offset = 0;
    for node in old {
        match node {
            ModelNode::Element(e) if e.name == MARKER_ELEMENT => {
                // Sentinels are zero-width: they contribute nothing to the
                // offsets recorded for positions after them.
                let Some(name) = e
                    .get_attr(MARKER_NAME_ATTRIBUTE)
                    .and_then(AttrValue::as_str)
                    .map(CompactString::from)
                else {
                    continue;
                };
                let mut pos_path = path.clone();
                pos_path.push(offset);
                let pos = Position { path: pos_path };
                match found.entry(name) {
                    Entry::Vacant(entry) => {
                        entry.insert((Range::collapsed_at(pos), 1));
                    }
                    Entry::Occupied(mut entry) => {
                        if entry.get().1 > 1 {
                            return Err(ConversionError::DuplicateMarker {
                                name: entry.key().to_string(),
                            });
                        }
                        let (range, count) = entry.get_mut();
                        range.end = pos;
                        *count = 2;
                    }
                }
            }
            ModelNode::Text(t) => {
                let width = t.unit_len();
                if let Some(ModelNode::Text(prev)) = children.last_mut() {
                    if prev.attrs == t.attrs {
                        prev.data.push_str(&t.data);
                        offset += width;
                        continue;
                    }
                }
                children.push(ModelNode::Text(t));
                offset += width;
            }
            ModelNode::Element(mut e) => {
                path.push(offset);
                fold_sentinels(&mut e.children, path, found)?;
                path.pop();
                children.push(ModelNode::Element(e));
                offset += 1;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::data::ContextItem;

    fn state_for(context: &[&str]) -> PassState {
        let ctx = ConversionContext::of(context.iter().map(|n| ContextItem::named(*n)));
        PassState::new(&ctx)
    }

    fn block_schema() -> Schema {
        use crate::schema::SchemaItemDef;
        let mut schema = Schema::new();
        schema.register("paragraph", SchemaItemDef::new().allowed_in("$root"));
        schema.register("aside", SchemaItemDef::new().allowed_in("$root"));
        schema.register_text(&["paragraph"]);
        schema
    }

    #[test]
    fn test_initial_cursor_depth() {
        assert_eq!(state_for(&["$root"]).initial_cursor(), Position::at([0]));
        assert_eq!(
            state_for(&["$root", "blockQuote"]).initial_cursor(),
            Position::at([0, 0])
        );
    }

    #[test]
    fn test_insert_and_ancestors() {
        let mut state = state_for(&["$root"]);
        state
            .insert_element(ModelElement::new("paragraph"), &Position::at([0]))
            .unwrap();
        state
            .insert_text(ModelText::new("hi"), &Position::at([0, 0]))
            .unwrap();

        let names = state.ancestors_at(&Position::at([0, 1])).unwrap();
        assert_eq!(names, vec!["$root", "paragraph"]);
    }

    #[test]
    fn test_text_merging_on_insert() {
        let mut state = state_for(&["$root"]);
        state
            .insert_element(ModelElement::new("paragraph"), &Position::at([0]))
            .unwrap();
        state
            .insert_text(ModelText::new("ab"), &Position::at([0, 0]))
            .unwrap();
        state
            .insert_text(ModelText::new("cd"), &Position::at([0, 2]))
            .unwrap();

        let out = state.take_output().unwrap();
        assert_eq!(out.len(), 1);
        let para = out[0].as_element().unwrap();
        assert_eq!(para.children.len(), 1);
        assert_eq!(para.children[0].as_text().unwrap().data, "abcd");
    }

    #[test]
    fn test_split_within_scope() {
        let schema = block_schema();
        let mut state = state_for(&["$root"]);
        state
            .insert_element(ModelElement::new("paragraph"), &Position::at([0]))
            .unwrap();
        state
            .insert_text(ModelText::new("ab"), &Position::at([0, 0]))
            .unwrap();

        // `aside` is not allowed in `paragraph`; cursor sits mid-text.
        let split = state
            .split_to_allowed_parent(&schema, "aside", &Position::at([0, 1]))
            .unwrap()
            .expect("$root accepts aside");
        assert_eq!(split.position, Position::at([1]));
        assert_eq!(split.split_levels, 1);
        assert_eq!(split.cursor_parent(), Some(Position::at([2, 0])));

        // Two paragraph halves, "a" and "b".
        let out = state.take_output().unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].as_element().unwrap().children[0].as_text().unwrap().data, "a");
        assert_eq!(out[1].as_element().unwrap().children[0].as_text().unwrap().data, "b");
    }

    #[test]
    fn test_split_refuses_scaffold() {
        let schema = block_schema();
        // Context pretends we are already inside a paragraph. `aside` only
        // fits in $root, and the scaffold is never split: refuse.
        let mut state = state_for(&["$root", "paragraph"]);
        let none = state
            .split_to_allowed_parent(&schema, "aside", &Position::at([0, 0]))
            .unwrap();
        assert!(none.is_none());

        // Text is allowed right at the cursor: no split needed.
        let direct = state
            .split_to_allowed_parent(&schema, "$text", &Position::at([0, 0]))
            .unwrap()
            .unwrap();
        assert_eq!(direct.split_levels, 0);
        assert_eq!(direct.position, Position::at([0, 0]));
    }

    #[test]
    fn test_remove_empty_split_parts_fixed_point() {
        let schema = block_schema();
        let mut state = state_for(&["$root"]);
        state
            .insert_element(ModelElement::new("paragraph"), &Position::at([0]))
            .unwrap();

        // Splitting an empty paragraph leaves two empty shells.
        let split = state
            .split_to_allowed_parent(&schema, "aside", &Position::at([0, 0]))
            .unwrap()
            .unwrap();
        state
            .insert_element(ModelElement::new("aside"), &split.position)
            .unwrap();
        state.remove_empty_split_parts();

        let out = state.take_output().unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_element().unwrap().name, "aside");
    }

    #[test]
    fn test_marker_extraction_merges_text() {
        let sentinel = |name: &str| {
            ModelElement::new(MARKER_ELEMENT).attr(MARKER_NAME_ATTRIBUTE, name)
        };
        let para = ModelElement::new("paragraph")
            .child(ModelText::new("fo"))
            .child(sentinel("comment:a"))
            .child(ModelText::new("oba"))
            .child(sentinel("comment:a"))
            .child(ModelText::new("r"));
        let mut frag = ModelFragment::from_children([ModelNode::from(para)]);

        extract_markers(&mut frag).unwrap();
        assert_eq!(frag.text_content(), "foobar");
        let range = &frag.markers["comment:a"];
        assert_eq!(range.start, Position::at([0, 2]));
        assert_eq!(range.end, Position::at([0, 5]));

        let para = frag.children[0].as_element().unwrap();
        assert_eq!(para.children.len(), 1, "text nodes merged back");
    }

    #[test]
    fn test_single_sentinel_collapses() {
        let sentinel = ModelElement::new(MARKER_ELEMENT).attr(MARKER_NAME_ATTRIBUTE, "here");
        let mut frag = ModelFragment::from_children([
            ModelNode::from(ModelText::new("ab")),
            ModelNode::from(sentinel),
            ModelNode::from(ModelText::new("cd")),
        ]);
        extract_markers(&mut frag).unwrap();
        let range = &frag.markers["here"];
        assert!(range.is_collapsed());
        assert_eq!(range.start, Position::at([2]));
    }

    #[test]
    fn test_third_sentinel_rejected() {
        let sentinel = |n: &str| ModelElement::new(MARKER_ELEMENT).attr(MARKER_NAME_ATTRIBUTE, n);
        let mut frag = ModelFragment::from_children([
            ModelNode::from(sentinel("x")),
            ModelNode::from(sentinel("x")),
            ModelNode::from(sentinel("x")),
        ]);
        let err = extract_markers(&mut frag).unwrap_err();
        assert!(matches!(err, ConversionError::DuplicateMarker { .. }));
    }

    #[test]
    fn test_validate_range() {
        let mut state = state_for(&["$root"]);
        state
            .insert_element(ModelElement::new("paragraph"), &Position::at([0]))
            .unwrap();
        assert!(state
            .validate_range(&Range::new(Position::at([0]), Position::at([1])))
            .is_ok());
        assert!(state
            .validate_range(&Range::new(Position::at([0]), Position::at([5])))
            .is_err());
        let backwards = Range {
            start: Position::at([1]),
            end: Position::at([0]),
        };
        assert!(state.validate_range(&backwards).is_err());
    }
}
