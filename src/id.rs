//! Process-unique node identity.
//!
//! Every view node and every model element carries a `NodeId` assigned at
//! creation time. The consumable ledger and the split-part registry key
//! nodes by id instead of holding references into the trees, which keeps
//! the per-pass bookkeeping free of borrow entanglement with the trees
//! themselves.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-unique node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a fresh id.
    pub fn next() -> Self {
        NodeId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value, mainly useful for debugging output.
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = NodeId::next();
        let b = NodeId::next();
        assert_ne!(a, b);
        assert!(b.as_raw() > a.as_raw());
    }
}
