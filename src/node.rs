//! The DAG vertex. A [`Node`] is an `Arc`-shared, immutable-after-creation
//! handle: its parents are fixed at construction, so cycles are structurally
//! impossible.
//!
//! Node identity is by interning, not by structural content: two nodes with
//! the same parents and the same [`OpKey`](crate::operator::OpKey) are
//! guaranteed to be the very same `Arc` by [`crate::identity::obtain_node`].
//! Everywhere else in the crate, nodes are compared and hashed by
//! [`NodeId`], never by content.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::operator::OperatorKind;
use crate::value::ValueKind;

/// Process-wide unique identifier, assigned in construction order. Used by
/// `coalign`'s stable canonical ordering and as the key for per-evaluation
/// state maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

pub(crate) fn next_node_id() -> NodeId {
    NodeId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

/// The data behind a [`Node`] handle. Never mutated after
/// [`crate::identity::obtain_node`] returns it.
pub struct NodeData {
    pub id: NodeId,
    pub parents: Vec<Node>,
    pub kind: OperatorKind,
    pub value_kind: ValueKind,
}

impl std::fmt::Debug for NodeData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("parents", &self.parents.iter().map(|p| p.id).collect::<Vec<_>>())
            .field("kind", &self.kind)
            .finish()
    }
}

/// A DAG vertex. Cheap to clone (an `Arc` bump); shared across every caller
/// holding a reference to it, possibly across concurrent `evaluate` calls.
pub type Node = Arc<NodeData>;

/// Is `node` a constant source (used by constant-propagation constructors)?
pub fn constant_value(node: &Node) -> Option<&crate::value::Value> {
    match &node.kind {
        OperatorKind::Source(crate::operator::SourceSpec::Constant(v)) => Some(v),
        _ => None,
    }
}
