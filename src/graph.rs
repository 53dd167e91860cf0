//! Graph utilities: ancestor enumeration and topological
//! ordering, used by the scheduler to walk a DAG parents-before-children.

use std::collections::HashSet;

use crate::node::{Node, NodeId};

/// All ancestors of `root`, including `root` itself, ordered so every
/// node's parents precede it. Nodes are immutable and acyclic by
/// construction (interning can only ever attach new parents, never rewire
/// existing ones, so no cycle can form), so a plain post-order DFS is a
/// valid topological sort.
pub fn topological_order(root: &Node) -> Vec<Node> {
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut order = Vec::new();
    visit(root, &mut visited, &mut order);
    order
}

fn visit(node: &Node, visited: &mut HashSet<NodeId>, order: &mut Vec<Node>) {
    if !visited.insert(node.id) {
        return;
    }
    for parent in &node.parents {
        visit(parent, visited, order);
    }
    order.push(node.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{arithmetic, source};

    #[test]
    fn parents_precede_children() {
        let a = source::pulse(1, 1.0).unwrap();
        let b = source::pulse(1, 2.0).unwrap();
        let sum = arithmetic::add(a.clone(), b.clone()).unwrap();
        let order = topological_order(&sum);
        let pos = |id: NodeId| order.iter().position(|n| n.id == id).unwrap();
        assert!(pos(a.id) < pos(sum.id));
        assert!(pos(b.id) < pos(sum.id));
    }

    #[test]
    fn shared_ancestor_appears_once() {
        let a = source::pulse(1, 1.0).unwrap();
        let both = arithmetic::add(a.clone(), a.clone()).unwrap();
        let order = topological_order(&both);
        let count = order.iter().filter(|n| n.id == a.id).count();
        assert_eq!(count, 1);
    }

    #[test]
    fn root_with_no_parents_is_its_own_order() {
        let c = source::constant(1.0);
        let order = topological_order(&c);
        assert_eq!(order.len(), 1);
        assert_eq!(order[0].id, c.id);
    }
}
