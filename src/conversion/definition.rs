//! Declarative converter definitions.
//!
//! A definition pairs a view side (what to match) with a model side (what
//! to produce). The helper factories in [`super::helpers`] lower these
//! into registered dispatcher listeners; the [`super::Conversion`] facade
//! additionally derives downcast rules from them.

use std::fmt;
use std::rc::Rc;

use compact_str::CompactString;

use crate::attr::AttrValue;
use crate::matcher::{MatchValue, Matcher, Pattern};
use crate::model::ModelElement;
use crate::priority::Priority;
use crate::view::ViewElement;

use super::downcast::ViewTemplate;

/// What a converter produces on the model side.
#[derive(Clone)]
pub enum ModelSpec {
    /// A fresh, attribute-less element with this name.
    Name(CompactString),
    /// A clone of this template element.
    Element(ModelElement),
    /// Computed per match; returning `None` abstains, leaving the view
    /// item for lower-priority converters.
    Compute(Rc<dyn Fn(&ViewElement) -> Option<ModelElement>>),
}

impl ModelSpec {
    /// Compute the model element per matched view element.
    pub fn compute(f: impl Fn(&ViewElement) -> Option<ModelElement> + 'static) -> Self {
        ModelSpec::Compute(Rc::new(f))
    }

    pub(crate) fn build(&self, view: &ViewElement) -> Option<ModelElement> {
        match self {
            ModelSpec::Name(name) => Some(ModelElement::new(name.clone())),
            ModelSpec::Element(template) => Some(template.clone()),
            ModelSpec::Compute(f) => f(view),
        }
    }

    /// Model element name, when statically known.
    pub(crate) fn element_name(&self) -> Option<CompactString> {
        match self {
            ModelSpec::Name(name) => Some(name.clone()),
            ModelSpec::Element(template) => Some(template.name.clone()),
            ModelSpec::Compute(_) => None,
        }
    }
}

impl fmt::Debug for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSpec::Name(name) => f.debug_tuple("Name").field(name).finish(),
            ModelSpec::Element(el) => f.debug_tuple("Element").field(el).finish(),
            ModelSpec::Compute(_) => f.write_str("Compute(..)"),
        }
    }
}

impl From<&str> for ModelSpec {
    fn from(name: &str) -> Self {
        ModelSpec::Name(name.into())
    }
}

impl From<ModelElement> for ModelSpec {
    fn from(el: ModelElement) -> Self {
        ModelSpec::Element(el)
    }
}

/// What a converter matches on the view side.
#[derive(Debug, Clone)]
pub enum ViewSpec {
    /// Match by exact element name.
    Name(CompactString),
    /// Match by full pattern.
    Pattern(Pattern),
}

impl ViewSpec {
    pub(crate) fn matcher(&self) -> Matcher {
        match self {
            ViewSpec::Name(name) => Matcher::single(Pattern::named(name.as_str())),
            ViewSpec::Pattern(pattern) => Matcher::single(pattern.clone()),
        }
    }

    /// Exact element name this spec is keyed on, when it has one. Specs
    /// without it register on the element fallback event instead.
    pub(crate) fn element_name(&self) -> Option<CompactString> {
        match self {
            ViewSpec::Name(name) => Some(name.clone()),
            ViewSpec::Pattern(pattern) => match &pattern.name {
                Some(MatchValue::Exact(name)) => Some(name.as_str().into()),
                _ => None,
            },
        }
    }

    /// A concrete, instantiable view shape, when every constraint is an
    /// exact value. Patterns with regexes, predicates or wildcards have no
    /// single concrete form and yield `None`.
    pub(crate) fn template(&self) -> Option<ViewTemplate> {
        match self {
            ViewSpec::Name(name) => Some(ViewTemplate::named(name.clone())),
            ViewSpec::Pattern(pattern) => {
                let Some(MatchValue::Exact(name)) = &pattern.name else {
                    return None;
                };
                let mut template = ViewTemplate::named(name.as_str());
                for constraint in &pattern.classes {
                    let MatchValue::Exact(class) = constraint else {
                        return None;
                    };
                    template.classes.push(class.as_str().into());
                }
                for (key, constraint) in &pattern.attributes {
                    let MatchValue::Exact(value) = constraint else {
                        return None;
                    };
                    template.attrs.push((key.clone(), value.clone()));
                }
                for (prop, constraint) in &pattern.styles {
                    let MatchValue::Exact(value) = constraint else {
                        return None;
                    };
                    template.styles.push((prop.clone(), value.clone()));
                }
                Some(template)
            }
        }
    }
}

impl From<&str> for ViewSpec {
    fn from(name: &str) -> Self {
        ViewSpec::Name(name.into())
    }
}

impl From<Pattern> for ViewSpec {
    fn from(pattern: Pattern) -> Self {
        ViewSpec::Pattern(pattern)
    }
}

/// Element-to-element converter definition.
#[derive(Debug, Clone)]
pub struct ConverterDefinition {
    /// Model side.
    pub model: ModelSpec,
    /// Primary view form; the one a downcast reproduces.
    pub view: ViewSpec,
    /// Additional view forms converging on the same model shape.
    pub alternative_view: Vec<ViewSpec>,
    /// Listener priority; `None` means the helper's default.
    pub priority: Option<Priority>,
}

impl ConverterDefinition {
    /// Definition from a model and primary view spec.
    pub fn new(model: impl Into<ModelSpec>, view: impl Into<ViewSpec>) -> Self {
        Self {
            model: model.into(),
            view: view.into(),
            alternative_view: Vec::new(),
            priority: None,
        }
    }

    /// Add an alternative view form.
    pub fn alternative(mut self, view: impl Into<ViewSpec>) -> Self {
        self.alternative_view.push(view.into());
        self
    }

    /// Override the listener priority.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// How an attribute value is obtained from the matched view element.
#[derive(Clone)]
pub enum AttrValueSpec {
    /// Fixed value.
    Literal(AttrValue),
    /// Copy the matched view attribute's value verbatim. Only meaningful
    /// for attribute mappings, which know which view key was matched.
    CopyView,
    /// Computed per match; `None` abstains.
    Compute(Rc<dyn Fn(&ViewElement) -> Option<AttrValue>>),
}

impl AttrValueSpec {
    /// Compute the value per matched view element.
    pub fn compute(f: impl Fn(&ViewElement) -> Option<AttrValue> + 'static) -> Self {
        AttrValueSpec::Compute(Rc::new(f))
    }
}

impl fmt::Debug for AttrValueSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValueSpec::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            AttrValueSpec::CopyView => f.write_str("CopyView"),
            AttrValueSpec::Compute(_) => f.write_str("Compute(..)"),
        }
    }
}

impl From<AttrValue> for AttrValueSpec {
    fn from(value: AttrValue) -> Self {
        AttrValueSpec::Literal(value)
    }
}

impl From<&str> for AttrValueSpec {
    fn from(value: &str) -> Self {
        AttrValueSpec::Literal(value.into())
    }
}

impl From<bool> for AttrValueSpec {
    fn from(value: bool) -> Self {
        AttrValueSpec::Literal(value.into())
    }
}

impl From<i64> for AttrValueSpec {
    fn from(value: i64) -> Self {
        AttrValueSpec::Literal(value.into())
    }
}

/// Element-to-attribute converter definition: a matched view element
/// becomes an attribute on the model content produced from its children.
#[derive(Debug, Clone)]
pub struct AttributeDefinition {
    /// Model attribute key to set.
    pub key: CompactString,
    /// Value to set it to.
    pub value: AttrValueSpec,
    /// Primary view form.
    pub view: ViewSpec,
    /// Additional view forms.
    pub alternative_view: Vec<ViewSpec>,
    /// Listener priority; `None` means the helper's default.
    pub priority: Option<Priority>,
}

impl AttributeDefinition {
    /// Definition setting `key = true` for elements matching `view`.
    pub fn new(key: impl Into<CompactString>, view: impl Into<ViewSpec>) -> Self {
        Self {
            key: key.into(),
            value: AttrValueSpec::Literal(AttrValue::Bool(true)),
            view: view.into(),
            alternative_view: Vec::new(),
            priority: None,
        }
    }

    /// Override the attribute value.
    pub fn value(mut self, value: impl Into<AttrValueSpec>) -> Self {
        self.value = value.into();
        self
    }

    /// Add an alternative view form.
    pub fn alternative(mut self, view: impl Into<ViewSpec>) -> Self {
        self.alternative_view.push(view.into());
        self
    }

    /// Override the listener priority.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Attribute-to-attribute converter definition: a view attribute on any
/// element becomes a model attribute on that element's conversion output.
#[derive(Debug, Clone)]
pub struct AttributeMapping {
    /// View attribute key to match.
    pub view_key: CompactString,
    /// Optional constraint on the view attribute's value.
    pub view_value: Option<MatchValue>,
    /// Model attribute key to set.
    pub model_key: CompactString,
    /// Value to set; defaults to copying the view value.
    pub value: AttrValueSpec,
    /// Listener priority; `None` means the helper's default.
    pub priority: Option<Priority>,
}

impl AttributeMapping {
    /// Map a view attribute key to a model attribute key, copying values.
    pub fn new(view_key: impl Into<CompactString>, model_key: impl Into<CompactString>) -> Self {
        Self {
            view_key: view_key.into(),
            view_value: None,
            model_key: model_key.into(),
            value: AttrValueSpec::CopyView,
            priority: None,
        }
    }

    /// Constrain the view attribute's value.
    pub fn view_value(mut self, value: impl Into<MatchValue>) -> Self {
        self.view_value = Some(value.into());
        self
    }

    /// Override the model attribute value.
    pub fn value(mut self, value: impl Into<AttrValueSpec>) -> Self {
        self.value = value.into();
        self
    }

    /// Override the listener priority.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// How a marker name is obtained from the matched view element.
#[derive(Clone)]
pub enum MarkerName {
    /// Fixed name.
    Literal(CompactString),
    /// Computed per match; `None` abstains.
    Compute(Rc<dyn Fn(&ViewElement) -> Option<CompactString>>),
}

impl fmt::Debug for MarkerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerName::Literal(name) => f.debug_tuple("Literal").field(name).finish(),
            MarkerName::Compute(_) => f.write_str("Compute(..)"),
        }
    }
}

impl From<&str> for MarkerName {
    fn from(name: &str) -> Self {
        MarkerName::Literal(name.into())
    }
}

/// Element-to-marker converter definition: a matched view element becomes
/// a marker sentinel, later folded into the fragment's marker map.
#[derive(Debug, Clone)]
pub struct MarkerDefinition {
    /// Marker name (or how to derive it from the matched element).
    pub name: MarkerName,
    /// Primary view form.
    pub view: ViewSpec,
    /// Additional view forms.
    pub alternative_view: Vec<ViewSpec>,
    /// Listener priority; `None` means the helper's default.
    pub priority: Option<Priority>,
}

impl MarkerDefinition {
    /// Definition from a marker name and view spec.
    pub fn new(name: impl Into<MarkerName>, view: impl Into<ViewSpec>) -> Self {
        Self {
            name: name.into(),
            view: view.into(),
            alternative_view: Vec::new(),
            priority: None,
        }
    }

    /// Derive the marker name from the matched element.
    pub fn name_from(view: impl Into<ViewSpec>, f: impl Fn(&ViewElement) -> Option<CompactString> + 'static) -> Self {
        Self {
            name: MarkerName::Compute(Rc::new(f)),
            view: view.into(),
            alternative_view: Vec::new(),
            priority: None,
        }
    }

    /// Add an alternative view form.
    pub fn alternative(mut self, view: impl Into<ViewSpec>) -> Self {
        self.alternative_view.push(view.into());
        self
    }

    /// Override the listener priority.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_spec_element_name() {
        assert_eq!(ViewSpec::from("p").element_name().as_deref(), Some("p"));
        let pattern = ViewSpec::from(Pattern::named("div").with_class("quote"));
        assert_eq!(pattern.element_name().as_deref(), Some("div"));
        let nameless = ViewSpec::from(Pattern::any().with_class("quote"));
        assert_eq!(nameless.element_name(), None);
    }

    #[test]
    fn test_view_spec_template_requires_exact_constraints() {
        let concrete = ViewSpec::from(Pattern::named("span").with_class("fancy"));
        let template = concrete.template().unwrap();
        assert_eq!(template.name, "span");
        assert_eq!(template.classes, vec!["fancy"]);

        let wildcard = ViewSpec::from(Pattern::named("span").with_attribute("data-x", MatchValue::Any));
        assert!(wildcard.template().is_none());
    }

    #[test]
    fn test_model_spec_build() {
        let spec = ModelSpec::from("paragraph");
        let el = spec.build(&ViewElement::new("p")).unwrap();
        assert_eq!(el.name, "paragraph");

        let abstaining = ModelSpec::compute(|_| None);
        assert!(abstaining.build(&ViewElement::new("p")).is_none());
    }
}
