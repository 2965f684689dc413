//! Bidirectional conversion: upcast dispatching, downcast rendering, and
//! the facade registering both directions from one definition.

mod data;
mod definition;
mod dispatcher;
mod downcast;
pub mod helpers;
mod pass;

pub use data::{ContextItem, ConversionContext, ConversionData};
pub use definition::{
    AttrValueSpec, AttributeDefinition, AttributeMapping, ConverterDefinition, MarkerDefinition,
    MarkerName, ModelSpec, ViewSpec,
};
pub use dispatcher::{CleanupListener, ConversionApi, UpcastDispatcher, UpcastListener};
pub use downcast::{AttrRule, DowncastRegistry, ViewTemplate};
pub use pass::SplitResult;

use crate::error::ConversionResult;
use crate::model::ModelFragment;
use crate::schema::Schema;
use crate::view::{ViewFragment, ViewNode};

/// Both conversion directions behind one registration surface.
///
/// Registering a definition wires the upcast listeners and, when the
/// primary view form is concrete, the downcast rule that reproduces it.
/// Custom listeners can still be attached directly via [`Conversion::upcast`].
pub struct Conversion {
    /// View-to-model dispatcher; open for direct listener registration.
    pub upcast: UpcastDispatcher,
    downcast: DowncastRegistry,
}

impl Conversion {
    /// Conversion with only the default upcast converters installed.
    pub fn new() -> Self {
        Self {
            upcast: UpcastDispatcher::new(),
            downcast: DowncastRegistry::new(),
        }
    }

    /// Matched view elements become model elements; model elements render
    /// as the primary view form.
    pub fn element_to_element(&mut self, definition: ConverterDefinition) -> &mut Self {
        if let (Some(model_name), Some(template)) =
            (definition.model.element_name(), definition.view.template())
        {
            self.downcast.register_element(model_name, template);
        }
        helpers::element_to_element(&mut self.upcast, definition);
        self
    }

    /// Matched view elements become a model attribute on their content;
    /// text carrying the attribute renders wrapped in the primary view
    /// form.
    pub fn element_to_attribute(&mut self, definition: AttributeDefinition) -> &mut Self {
        if let Some(template) = definition.view.template() {
            self.downcast
                .register_attribute(definition.key.clone(), AttrRule::WrapText(template));
        }
        helpers::element_to_attribute(&mut self.upcast, definition);
        self
    }

    /// A view attribute maps to a model attribute and back.
    pub fn attribute_to_attribute(&mut self, mapping: AttributeMapping) -> &mut Self {
        self.downcast.register_attribute(
            mapping.model_key.clone(),
            AttrRule::ToViewAttr(mapping.view_key.clone()),
        );
        helpers::attribute_to_attribute(&mut self.upcast, mapping);
        self
    }

    /// Matched view elements become markers. Markers live in the fragment
    /// marker map, not the node tree, so nothing is registered for the
    /// downcast.
    pub fn element_to_marker(&mut self, definition: MarkerDefinition) -> &mut Self {
        helpers::element_to_marker(&mut self.upcast, definition);
        self
    }

    /// Run one upcast pass. See [`UpcastDispatcher::convert`].
    pub fn convert(
        &self,
        root: &mut ViewNode,
        context: &ConversionContext,
        schema: &Schema,
    ) -> ConversionResult<ModelFragment> {
        self.upcast.convert(root, context, schema)
    }

    /// Render a model fragment back to a view fragment.
    pub fn downcast(&self, fragment: &ModelFragment) -> ViewFragment {
        self.downcast.downcast(fragment)
    }
}

impl Default for Conversion {
    fn default() -> Self {
        Self::new()
    }
}
