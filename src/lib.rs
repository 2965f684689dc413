//! treecast - Bidirectional View/Model Tree Conversion
//!
//! ## Core Concepts
//!
//! **Two trees, one engine**: a *view* tree (semantic markup: names,
//! attributes, classes, styles) and a *model* tree (abstract,
//! schema-governed content). Upcast converts view to model through
//! registered listeners; downcast renders the model back from the same
//! definitions.
//!
//! **Consumable ledger**: every view node exposes discrete facets (name,
//! each attribute, class, style) that converters claim at most once, so
//! independently registered converters compose without double-handling.
//!
//! **Schema-directed placement**: content that is not allowed at the
//! cursor is either hoisted by splitting ancestors until an allowing
//! parent is found, or silently dropped.
//!
//! ## Modules
//! - `view`: view tree types (`ViewElement`, `ViewText`, `ViewFragment`)
//! - `model`: model tree types, positions, ranges, fragments
//! - `schema`: where model items and attributes are allowed
//! - `matcher`: declarative patterns over view elements
//! - `consumable`: the per-pass facet ledger
//! - `conversion`: dispatcher, helper factories, downcast, facade
//!
//! ## Usage
//!
//! ```
//! use treecast::prelude::*;
//!
//! let mut schema = Schema::new();
//! schema.register("paragraph", SchemaItemDef::new().allowed_in("$root"));
//! schema.register_text(&["paragraph"]);
//!
//! let mut conversion = Conversion::new();
//! conversion.element_to_element(ConverterDefinition::new("paragraph", "p"));
//!
//! let mut view = ViewNode::from(
//!     ViewFragment::new().child(ViewElement::new("p").text("Hello")),
//! );
//! let fragment = conversion
//!     .convert(&mut view, &ConversionContext::root(), &schema)
//!     .unwrap();
//! assert_eq!(fragment.text_content(), "Hello");
//! ```

// =============================================================================
// Core modules
// =============================================================================

/// View tree types
pub mod view;

/// Model tree types: nodes, positions, ranges, fragments
pub mod model;

/// Schema: allowed children and attributes
pub mod schema;

/// Declarative view-element patterns
pub mod matcher;

/// Per-pass consumable facet ledger
pub mod consumable;

/// Conversion engine: dispatcher, helpers, downcast, facade
pub mod conversion;

/// Model attribute values
pub mod attr;

/// Listener priorities
pub mod priority;

/// Node identity
pub mod id;

/// Error types
pub mod error;

/// Prelude for common imports
pub mod prelude;
