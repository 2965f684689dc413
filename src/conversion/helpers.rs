//! Upcast helper factories.
//!
//! Each factory lowers a declarative definition into one dispatcher
//! listener per view form. Every listener follows the same discipline:
//! guard on `model_range`, match, test the ledger, build the model side
//! (which may abstain), place it, and only then consume. A converter
//! that ends up contributing nothing leaves the view item untouched for
//! whoever runs next.

use compact_str::CompactString;

use crate::attr::AttrValue;
use crate::consumable::Facet;
use crate::error::ConversionResult;
use crate::matcher::{MatchValue, Matcher, Pattern};
use crate::model::{MARKER_ELEMENT, MARKER_NAME_ATTRIBUTE, ModelElement, Range};
use crate::priority::Priority;
use crate::view::{ViewElement, ViewNode};

use super::data::ConversionData;
use super::definition::{
    AttrValueSpec, AttributeDefinition, AttributeMapping, ConverterDefinition, MarkerDefinition,
    MarkerName, ModelSpec, ViewSpec,
};
use super::dispatcher::{ConversionApi, UpcastDispatcher};

/// Register a matched view element as a fresh model element.
///
/// The element is placed through the schema-directed split, its children
/// are converted inside it, and the cursor continues after it (or inside
/// the trailing split half when ancestors were split). Elements the
/// schema accepts nowhere are dropped silently, children and all.
pub fn element_to_element(dispatcher: &mut UpcastDispatcher, definition: ConverterDefinition) {
    let priority = definition.priority.unwrap_or(Priority::Normal);
    for view in std::iter::once(&definition.view).chain(&definition.alternative_view) {
        let matcher = view.matcher();
        let model = definition.model.clone();
        register(dispatcher, view, priority, move |el, item, data, api| {
            convert_element(&matcher, &model, el, item, data, api)
        });
    }
}

fn convert_element(
    matcher: &Matcher,
    model: &ModelSpec,
    el: &ViewElement,
    item: &ViewNode,
    data: &mut ConversionData,
    api: &mut ConversionApi<'_>,
) -> ConversionResult<()> {
    let Some(matched) = matcher.match_element(el) else {
        return Ok(());
    };
    // Converting the element always claims its name, even when the
    // pattern matched on other facets only.
    let facets = with_name(matched.facets());
    if !api.consumable.test(el.id, &facets) {
        return Ok(());
    }
    let Some(model_el) = model.build(el) else {
        return Ok(());
    };
    let name = model_el.name.clone();
    let Some(split) = api.split_to_allowed_parent(&name, &data.cursor)? else {
        return Ok(());
    };
    api.consumable.consume(el.id, &facets);
    api.insert_element(model_el, &split.position)?;

    let inside = split.position.descended(0);
    let (_, child_cursor) = api.convert_children(item, inside)?;
    let end = child_cursor.parent().advanced(1);
    let continuation = split.cursor_parent();
    let range = Range::new(split.position, end);
    data.cursor = continuation.unwrap_or_else(|| range.end.clone());
    data.model_range = Some(range);
    Ok(())
}

/// Register a matched view element as an attribute on the model content
/// produced from its children.
///
/// When a higher-priority converter already produced a range for the item
/// the attribute is applied to that range; otherwise the children are
/// converted in place first. The match is consumed only if the attribute
/// actually landed on at least one node.
pub fn element_to_attribute(dispatcher: &mut UpcastDispatcher, definition: AttributeDefinition) {
    let priority = definition.priority.unwrap_or(Priority::Low);
    for view in std::iter::once(&definition.view).chain(&definition.alternative_view) {
        let matcher = view.matcher();
        let key = definition.key.clone();
        let value = definition.value.clone();
        register(dispatcher, view, priority, move |el, item, data, api| {
            let Some(matched) = matcher.match_element(el) else {
                return Ok(());
            };
            let facets = with_name(matched.facets());
            if !api.consumable.test(el.id, &facets) {
                return Ok(());
            }
            let Some(value) = resolve_value(&value, el, None) else {
                return Ok(());
            };
            apply_attribute(&key, &value, el, &facets, item, data, api)
        });
    }
}

/// Register a view attribute, on any element, as a model attribute on
/// that element's conversion output.
///
/// Registered on the element fallback event so it composes with whatever
/// converter handles the element itself.
pub fn attribute_to_attribute(dispatcher: &mut UpcastDispatcher, mapping: AttributeMapping) {
    let priority = mapping.priority.unwrap_or(Priority::Low);
    let view_key = mapping.view_key.clone();
    let pattern = Pattern::any().with_attribute(
        mapping.view_key.clone(),
        mapping.view_value.clone().unwrap_or(MatchValue::Any),
    );
    let matcher = Matcher::single(pattern);
    let model_key = mapping.model_key.clone();
    let value = mapping.value.clone();

    dispatcher.on_element_fallback(priority, move |item, data, api| {
        let ViewNode::Element(el) = item else {
            return Ok(());
        };
        let Some(matched) = matcher.match_element(el) else {
            return Ok(());
        };
        // Unlike element conversion this claims only the attribute facet;
        // the element's name stays available.
        let facets = matched.facets();
        if !api.consumable.test(el.id, &facets) {
            return Ok(());
        }
        let Some(value) = resolve_value(&value, el, Some(&view_key)) else {
            return Ok(());
        };
        apply_attribute(&model_key, &value, el, &facets, item, data, api)
    });
}

/// Register a matched view element as a marker sentinel. The sentinel is
/// folded into the fragment's marker map after the pass.
pub fn element_to_marker(dispatcher: &mut UpcastDispatcher, definition: MarkerDefinition) {
    let name = definition.name.clone();
    let model = ModelSpec::compute(move |el| {
        let marker_name = match &name {
            MarkerName::Literal(n) => Some(n.clone()),
            MarkerName::Compute(f) => f(el),
        }?;
        Some(
            ModelElement::new(MARKER_ELEMENT)
                .attr(MARKER_NAME_ATTRIBUTE, marker_name.to_string()),
        )
    });
    element_to_element(
        dispatcher,
        ConverterDefinition {
            model,
            view: definition.view,
            alternative_view: definition.alternative_view,
            priority: definition.priority,
        },
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Shared plumbing
// ─────────────────────────────────────────────────────────────────────────

/// Route a listener to the right event: an exact element name when the
/// view spec pins one down, the element fallback otherwise.
fn register(
    dispatcher: &mut UpcastDispatcher,
    view: &ViewSpec,
    priority: Priority,
    f: impl Fn(&ViewElement, &ViewNode, &mut ConversionData, &mut ConversionApi<'_>) -> ConversionResult<()>
    + 'static,
) {
    let listener = move |item: &ViewNode,
                         data: &mut ConversionData,
                         api: &mut ConversionApi<'_>|
          -> ConversionResult<()> {
        let ViewNode::Element(el) = item else {
            return Ok(());
        };
        if data.model_range.is_some() {
            return Ok(());
        }
        f(el, item, data, api)
    };
    match view.element_name() {
        Some(name) => dispatcher.on_element(name, priority, listener),
        None => dispatcher.on_element_fallback(priority, listener),
    }
}

fn with_name(mut facets: Vec<Facet>) -> Vec<Facet> {
    if !facets.contains(&Facet::Name) {
        facets.push(Facet::Name);
    }
    facets
}

fn resolve_value(
    spec: &AttrValueSpec,
    el: &ViewElement,
    view_key: Option<&CompactString>,
) -> Option<AttrValue> {
    match spec {
        AttrValueSpec::Literal(value) => Some(value.clone()),
        AttrValueSpec::CopyView => {
            let key = view_key?;
            el.get_attr(key).map(|v| AttrValue::Str(v.to_string()))
        }
        AttrValueSpec::Compute(f) => f(el),
    }
}

/// Common tail of the attribute converters: ensure a range exists
/// (converting children in place when it does not), set the attribute
/// wherever the schema allows, and consume only on actual effect.
fn apply_attribute(
    key: &str,
    value: &AttrValue,
    el: &ViewElement,
    facets: &[Facet],
    item: &ViewNode,
    data: &mut ConversionData,
    api: &mut ConversionApi<'_>,
) -> ConversionResult<()> {
    if data.model_range.is_none() {
        let (range, cursor) = api.convert_children(item, data.cursor.clone())?;
        data.model_range = Some(range);
        data.cursor = cursor;
    }
    let Some(range) = data.model_range.clone() else {
        return Ok(());
    };
    let applied = api.set_attribute_in_range(key, value, &range)?;
    if applied > 0 {
        api.consumable.consume(el.id, facets);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::data::ConversionContext;
    use crate::model::{ModelNode, Position};
    use crate::schema::{Schema, SchemaItemDef};
    use crate::view::ViewFragment;

    fn rich_schema() -> Schema {
        let mut schema = Schema::new();
        schema.register("paragraph", SchemaItemDef::new().allowed_in("$root"));
        schema.register(
            "$text",
            SchemaItemDef::new()
                .allowed_in("paragraph")
                .allows_attribute("bold")
                .allows_attribute("linkHref"),
        );
        schema
    }

    fn convert(
        dispatcher: &UpcastDispatcher,
        root: impl Into<ViewNode>,
        schema: &Schema,
    ) -> crate::model::ModelFragment {
        let mut root = root.into();
        dispatcher
            .convert(&mut root, &ConversionContext::root(), schema)
            .unwrap()
    }

    #[test]
    fn test_element_to_element() {
        let mut dispatcher = UpcastDispatcher::new();
        element_to_element(&mut dispatcher, ConverterDefinition::new("paragraph", "p"));

        let root = ViewFragment::new().child(ViewElement::new("p").text("hi"));
        let frag = convert(&dispatcher, root, &rich_schema());
        let para = frag.children[0].as_element().unwrap();
        assert_eq!(para.name, "paragraph");
        assert_eq!(frag.text_content(), "hi");
    }

    #[test]
    fn test_alternative_views_converge() {
        let mut dispatcher = UpcastDispatcher::new();
        element_to_attribute(
            &mut dispatcher,
            AttributeDefinition::new("bold", "strong").alternative("b"),
        );
        element_to_element(&mut dispatcher, ConverterDefinition::new("paragraph", "p"));

        let schema = rich_schema();
        let via_strong = convert(
            &dispatcher,
            ViewFragment::new().child(ViewElement::new("p").child(ViewElement::new("strong").text("x"))),
            &schema,
        );
        let via_b = convert(
            &dispatcher,
            ViewFragment::new().child(ViewElement::new("p").child(ViewElement::new("b").text("x"))),
            &schema,
        );
        assert_eq!(via_strong, via_b);

        let para = via_strong.children[0].as_element().unwrap();
        let text = para.children[0].as_text().unwrap();
        assert_eq!(text.get_attr("bold").and_then(AttrValue::as_bool), Some(true));
    }

    #[test]
    fn test_attribute_rejected_by_schema_leaves_facets() {
        let mut dispatcher = UpcastDispatcher::new();
        element_to_element(&mut dispatcher, ConverterDefinition::new("paragraph", "p"));
        element_to_attribute(&mut dispatcher, AttributeDefinition::new("shout", "em"));

        // Schema does not allow `shout` anywhere: the <em> must dissolve
        // without consuming, and its text must still come through.
        let frag = convert(
            &dispatcher,
            ViewFragment::new().child(ViewElement::new("p").child(ViewElement::new("em").text("x"))),
            &rich_schema(),
        );
        assert_eq!(frag.text_content(), "x");
        let para = frag.children[0].as_element().unwrap();
        assert!(para.children[0].as_text().unwrap().attrs.is_empty());
    }

    #[test]
    fn test_attribute_to_attribute() {
        let mut dispatcher = UpcastDispatcher::new();
        element_to_element(&mut dispatcher, ConverterDefinition::new("paragraph", "p"));
        attribute_to_attribute(&mut dispatcher, AttributeMapping::new("href", "linkHref"));

        let frag = convert(
            &dispatcher,
            ViewFragment::new().child(
                ViewElement::new("p")
                    .child(ViewElement::new("a").attr("href", "/x").text("link")),
            ),
            &rich_schema(),
        );
        let para = frag.children[0].as_element().unwrap();
        let text = para.children[0].as_text().unwrap();
        assert_eq!(
            text.get_attr("linkHref").and_then(AttrValue::as_str),
            Some("/x")
        );
    }

    #[test]
    fn test_element_to_marker() {
        let mut dispatcher = UpcastDispatcher::new();
        element_to_element(&mut dispatcher, ConverterDefinition::new("paragraph", "p"));
        element_to_marker(
            &mut dispatcher,
            MarkerDefinition::name_from(
                Pattern::named("comment-start").with_attribute("name", MatchValue::Any),
                |el| el.get_attr("name").map(CompactString::from),
            ),
        );

        let frag = convert(
            &dispatcher,
            ViewFragment::new().child(
                ViewElement::new("p")
                    .text("ab")
                    .child(ViewElement::new("comment-start").attr("name", "c1"))
                    .text("cd"),
            ),
            &rich_schema(),
        );
        assert_eq!(frag.text_content(), "abcd");
        let range = &frag.markers["c1"];
        assert!(range.is_collapsed());
        assert_eq!(range.start, Position::at([0, 2]));
        // The sentinel is gone and the text is one node again.
        let para = frag.children[0].as_element().unwrap();
        assert!(matches!(para.children.as_slice(), [ModelNode::Text(_)]));
    }

    #[test]
    fn test_priority_override() {
        let mut dispatcher = UpcastDispatcher::new();
        element_to_element(&mut dispatcher, ConverterDefinition::new("paragraph", "p"));
        element_to_element(
            &mut dispatcher,
            ConverterDefinition::new("fancyParagraph", Pattern::named("p").with_class("fancy"))
                .priority(Priority::High),
        );

        let mut schema = rich_schema();
        schema.register("fancyParagraph", SchemaItemDef::new().allowed_in("$root"));

        let frag = convert(
            &dispatcher,
            ViewFragment::new().child(ViewElement::new("p").class("fancy")),
            &schema,
        );
        assert_eq!(frag.children[0].as_element().unwrap().name, "fancyParagraph");

        // Plain paragraphs still take the normal route.
        let frag = convert(&dispatcher, ViewFragment::new().child(ViewElement::new("p")), &schema);
        assert_eq!(frag.children[0].as_element().unwrap().name, "paragraph");
    }
}
