//! The process-wide [`IdentityMap`]: a bijection between `(parent ids,
//! operator key)` tuples and interned [`Node`]s. Every non-
//! source node constructor funnels through [`obtain_node`], which is the
//! single place new `Node`s are created.
//!
//! Backed by `dashmap`, already part of renoir's dependency stack, which
//! gives sharded internal locking: lookups on one shard do not block
//! inserts on another, giving exclusive-insert/shared-lookup behavior
//! closely enough without hand-rolling a
//! read-write lock around a plain `HashMap`.

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::node::{next_node_id, Node, NodeData};
use crate::operator::OperatorKind;
use crate::value::ValueKind;

type Key = (Vec<crate::node::NodeId>, crate::operator::OpKey);

static IDENTITY_MAP: Lazy<DashMap<Key, Node>> = Lazy::new(DashMap::new);

/// Intern a node with the given `parents` and `kind`, returning the
/// existing node if one with the same parents (by id) and the same
/// operator key already exists, or creating and inserting a new one
/// otherwise.
pub fn obtain_node(
    parents: Vec<Node>,
    kind: OperatorKind,
    value_kind: ValueKind,
) -> Node {
    let ids: Vec<_> = parents.iter().map(|p| p.id).collect();
    let op_key = kind.op_key();
    let key = (ids, op_key);

    if let Some(existing) = IDENTITY_MAP.get(&key) {
        tracing::trace!(node_id = existing.id.0, "identity map hit");
        return existing.clone();
    }

    let node = std::sync::Arc::new(NodeData {
        id: next_node_id(),
        parents,
        kind,
        value_kind,
    });
    tracing::debug!(node_id = node.id.0, "interned new node");
    // Another thread may have raced us between the `get` miss and here;
    // `entry().or_insert_with` makes the final decision atomically.
    let entry = IDENTITY_MAP.entry(key).or_insert_with(|| node.clone());
    entry.clone()
}

/// Number of interned nodes, process-wide. Mostly useful for tests and
/// diagnostics.
pub fn interned_count() -> usize {
    IDENTITY_MAP.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::SourceSpec;
    use crate::value::Value;

    #[test]
    fn interning_is_idempotent() {
        let a = obtain_node(
            vec![],
            OperatorKind::Source(SourceSpec::Constant(Value::Scalar(3.0))),
            ValueKind::Scalar,
        );
        let b = obtain_node(
            vec![],
            OperatorKind::Source(SourceSpec::Constant(Value::Scalar(3.0))),
            ValueKind::Scalar,
        );
        assert!(std::sync::Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn distinct_keys_are_distinct_nodes() {
        let a = obtain_node(
            vec![],
            OperatorKind::Source(SourceSpec::Constant(Value::Scalar(3.0))),
            ValueKind::Scalar,
        );
        let b = obtain_node(
            vec![],
            OperatorKind::Source(SourceSpec::Constant(Value::Scalar(4.0))),
            ValueKind::Scalar,
        );
        assert!(!std::sync::Arc::ptr_eq(&a, &b));
    }
}
