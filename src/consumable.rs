//! Per-pass consumable ledger.
//!
//! Prevents two independent converters from both claiming the same view
//! facet. The ledger is built fresh for every conversion pass by walking
//! the input tree once and seeding every node with its full facet set;
//! a facet can be consumed at most once.
//!
//! `test` followed by `consume` is a usage contract, not a runtime guard:
//! the ledger does not enforce that callers tested first.

use compact_str::CompactString;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::id::NodeId;
use crate::view::ViewNode;

/// One discrete claimable piece of a view node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Facet {
    /// The element (or text) name.
    Name,
    /// One attribute, by key.
    Attribute(CompactString),
    /// One class name.
    Class(CompactString),
    /// One style property.
    Style(CompactString),
}

/// Ledger of still-unconsumed facets, keyed by node id.
#[derive(Debug, Default)]
pub struct Consumable {
    remaining: FxHashMap<NodeId, FxHashSet<Facet>>,
}

impl Consumable {
    /// Build the ledger for a view tree, seeding every node with its full
    /// facet set.
    pub fn from_view(root: &ViewNode) -> Self {
        let mut ledger = Self::default();
        ledger.seed(root);
        ledger
    }

    fn seed(&mut self, node: &ViewNode) {
        match node {
            ViewNode::Element(el) => {
                let mut facets = FxHashSet::default();
                facets.insert(Facet::Name);
                facets.extend(el.attrs.iter().map(|(k, _)| Facet::Attribute(k.clone())));
                facets.extend(el.classes.iter().map(|c| Facet::Class(c.clone())));
                facets.extend(el.styles.iter().map(|(k, _)| Facet::Style(k.clone())));
                self.remaining.insert(el.id, facets);
                for child in &el.children {
                    self.seed(child);
                }
            }
            ViewNode::Text(t) => {
                let mut facets = FxHashSet::default();
                facets.insert(Facet::Name);
                self.remaining.insert(t.id, facets);
            }
            ViewNode::Fragment(f) => {
                for child in &f.children {
                    self.seed(child);
                }
            }
        }
    }

    /// True only if *every* requested facet is still unconsumed for the
    /// node. Never mutates the ledger.
    pub fn test(&self, node: NodeId, facets: &[Facet]) -> bool {
        let Some(remaining) = self.remaining.get(&node) else {
            return false;
        };
        facets.iter().all(|f| remaining.contains(f))
    }

    /// Mark facets consumed. Idempotent: consuming an already-consumed
    /// facet is a no-op.
    pub fn consume(&mut self, node: NodeId, facets: &[Facet]) {
        if let Some(remaining) = self.remaining.get_mut(&node) {
            for facet in facets {
                remaining.remove(facet);
            }
        }
    }

    /// Test-then-consume convenience; returns whether consumption happened.
    pub fn consume_if_testable(&mut self, node: NodeId, facets: &[Facet]) -> bool {
        if self.test(node, facets) {
            self.consume(node, facets);
            true
        } else {
            false
        }
    }
}
