//! Structural model-to-view rendering.
//!
//! The registry holds one concrete view template per model element name
//! and one rule per model attribute key, derived from the same converter
//! definitions that drive the upcast. Rendering always reproduces the
//! primary view form; alternative upcast forms converge on it.

use compact_str::CompactString;
use rustc_hash::FxHashMap;

use crate::model::{MARKER_ELEMENT, ModelFragment, ModelNode};
use crate::view::{ViewChildren, ViewElement, ViewFragment, ViewNode, ViewText};

/// Concrete, instantiable view element shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewTemplate {
    /// Element name.
    pub name: CompactString,
    /// Fixed attributes.
    pub attrs: Vec<(CompactString, String)>,
    /// Fixed classes.
    pub classes: Vec<CompactString>,
    /// Fixed style properties.
    pub styles: Vec<(CompactString, String)>,
}

impl ViewTemplate {
    /// Template with a bare element name.
    pub fn named(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            classes: Vec::new(),
            styles: Vec::new(),
        }
    }

    /// Materialize a fresh view element from this template.
    pub fn instantiate(&self) -> ViewElement {
        let mut el = ViewElement::new(self.name.clone());
        for (key, value) in &self.attrs {
            el.set_attr(key.clone(), value.clone());
        }
        for class in &self.classes {
            el.classes.push(class.clone());
        }
        for (prop, value) in &self.styles {
            el.styles.push((prop.clone(), value.clone()));
        }
        el
    }
}

/// How a model attribute is rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrRule {
    /// Wrap text carrying the attribute in an instance of this template
    /// (`bold` -> `<strong>`).
    WrapText(ViewTemplate),
    /// Copy the value onto the element's view as this view attribute
    /// (`linkHref` -> `href`).
    ToViewAttr(CompactString),
}

/// Registry of downcast rules.
#[derive(Debug, Clone, Default)]
pub struct DowncastRegistry {
    elements: FxHashMap<CompactString, ViewTemplate>,
    attributes: FxHashMap<CompactString, AttrRule>,
}

impl DowncastRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render model elements with this name from the given template.
    pub fn register_element(&mut self, model_name: impl Into<CompactString>, template: ViewTemplate) {
        self.elements.insert(model_name.into(), template);
    }

    /// Render this model attribute key with the given rule.
    pub fn register_attribute(&mut self, key: impl Into<CompactString>, rule: AttrRule) {
        self.attributes.insert(key.into(), rule);
    }

    /// Render a model fragment as a view fragment.
    ///
    /// Elements without a registered template dissolve into their
    /// children; marker sentinels (which extraction normally removes
    /// before a fragment reaches callers) render as nothing.
    pub fn downcast(&self, fragment: &ModelFragment) -> ViewFragment {
        let mut out = ViewFragment::new();
        for child in &fragment.children {
            self.downcast_node(child, &mut out.children);
        }
        out
    }

    fn downcast_node(&self, node: &ModelNode, out: &mut ViewChildren) {
        match node {
            ModelNode::Element(el) if el.name == MARKER_ELEMENT => {}
            ModelNode::Element(el) => match self.elements.get(el.name.as_str()) {
                Some(template) => {
                    let mut view = template.instantiate();
                    for (key, value) in &el.attrs {
                        if let Some(AttrRule::ToViewAttr(view_key)) =
                            self.attributes.get(key.as_str())
                        {
                            view.set_attr(view_key.clone(), value.to_string());
                        }
                    }
                    for child in &el.children {
                        self.downcast_node(child, &mut view.children);
                    }
                    out.push(ViewNode::from(view));
                }
                None => {
                    for child in &el.children {
                        self.downcast_node(child, out);
                    }
                }
            },
            ModelNode::Text(text) => {
                let mut view = ViewNode::Text(ViewText::new(&text.data));
                // Wrappers nest in attribute order, innermost first. Copied
                // attributes land on the outermost wrapper afterwards, so
                // their relative order against wrap rules does not matter.
                for (key, _) in &text.attrs {
                    if let Some(AttrRule::WrapText(template)) = self.attributes.get(key.as_str()) {
                        let mut wrapper = template.instantiate();
                        wrapper.children.push(view);
                        view = ViewNode::from(wrapper);
                    }
                }
                for (key, value) in &text.attrs {
                    if let Some(AttrRule::ToViewAttr(view_key)) = self.attributes.get(key.as_str())
                    {
                        if let ViewNode::Element(wrapper) = &mut view {
                            wrapper.set_attr(view_key.clone(), value.to_string());
                        }
                    }
                }
                out.push(view);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::AttrValue;
    use crate::model::{ModelElement, ModelText};

    fn registry() -> DowncastRegistry {
        let mut registry = DowncastRegistry::new();
        registry.register_element("paragraph", ViewTemplate::named("p"));
        registry.register_attribute("bold", AttrRule::WrapText(ViewTemplate::named("strong")));
        registry.register_attribute("linkHref", AttrRule::ToViewAttr("href".into()));
        registry
    }

    #[test]
    fn test_element_and_wrapped_text() {
        let mut bold = ModelText::new("hot");
        bold.set_attr("bold", AttrValue::Bool(true));
        let frag = ModelFragment::from_children([ModelNode::from(
            ModelElement::new("paragraph")
                .child(ModelText::new("a "))
                .child(bold),
        )]);

        let view = registry().downcast(&frag);
        let p = view.children[0].as_element().unwrap();
        assert_eq!(p.name, "p");
        assert_eq!(p.children.len(), 2);
        let strong = p.children[1].as_element().unwrap();
        assert_eq!(strong.name, "strong");
        assert_eq!(view.text_content(), "a hot");
    }

    #[test]
    fn test_unknown_element_dissolves() {
        let frag = ModelFragment::from_children([ModelNode::from(
            ModelElement::new("mystery").child(ModelText::new("x")),
        )]);
        let view = registry().downcast(&frag);
        assert!(view.children[0].is_text());
    }

    #[test]
    fn test_link_on_wrapped_text() {
        let mut text = ModelText::new("go");
        text.set_attr("bold", AttrValue::Bool(true));
        text.set_attr("linkHref", AttrValue::Str("/x".into()));
        let frag = ModelFragment::from_children([ModelNode::from(text)]);

        let view = registry().downcast(&frag);
        let strong = view.children[0].as_element().unwrap();
        assert_eq!(strong.get_attr("href"), Some("/x"));
    }
}
