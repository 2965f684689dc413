//! Prelude module for common imports.
//!
//! ```
//! use treecast::prelude::*;
//! ```

// View types
pub use crate::view::{ViewChildren, ViewElement, ViewFragment, ViewNode, ViewText};

// Model types
pub use crate::model::{
    ModelChildren, ModelElement, ModelFragment, ModelNode, ModelText, OffsetPath, Position, Range,
};

// Schema
pub use crate::schema::{Schema, SchemaItemDef};

// Matching
pub use crate::matcher::{MatchResult, MatchValue, Matcher, Pattern};

// Consumables
pub use crate::consumable::{Consumable, Facet};

// Conversion
pub use crate::conversion::{
    AttrRule, AttrValueSpec, AttributeDefinition, AttributeMapping, ContextItem, Conversion,
    ConversionApi, ConversionContext, ConversionData, ConverterDefinition, DowncastRegistry,
    MarkerDefinition, MarkerName, ModelSpec, SplitResult, UpcastDispatcher, ViewSpec, ViewTemplate,
};

// Attributes
pub use crate::attr::AttrValue;

// Priorities
pub use crate::priority::Priority;

// Identity
pub use crate::id::NodeId;

// Error
pub use crate::error::{ConversionError, ConversionResult};
