//! Circuit validation.

use std::collections::HashMap;

use crate::error::{GateDiagError, Result};

use super::graph::Node;
use super::types::{NodeDef, NodeId};

/// Resolve the fan-in names of `def` to node ids and check its arity.
///
/// Checks:
/// - Every referenced input is defined somewhere in the netlist
/// - The number of inputs matches the fixed arity of the gate kind
pub(crate) fn resolve_fanin(def: &NodeDef, node_map: &HashMap<String, NodeId>) -> Result<Vec<NodeId>> {
    let expected = def.kind.arity();
    if def.inputs.len() != expected {
        return Err(GateDiagError::ArityMismatch {
            node: def.name.clone(),
            kind: def.kind.to_string(),
            expected,
            actual: def.inputs.len(),
        });
    }

    def.inputs
        .iter()
        .map(|reference| {
            node_map
                .get(reference)
                .copied()
                .ok_or_else(|| GateDiagError::UndefinedNode {
                    node: def.name.clone(),
                    reference: reference.clone(),
                })
        })
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Find a cycle in the fan-in graph using DFS coloring.
///
/// Returns the node ids along the cycle, starting and ending at the same
/// node, or `None` if the graph is acyclic. Uses an explicit stack so deep
/// netlists cannot overflow the call stack.
pub(crate) fn find_cycle(nodes: &[Node]) -> Option<Vec<NodeId>> {
    let mut color = vec![Color::White; nodes.len()];
    // (node, index of the next fan-in edge to follow)
    let mut stack: Vec<(NodeId, usize)> = Vec::new();

    for start in 0..nodes.len() {
        if color[start] != Color::White {
            continue;
        }
        color[start] = Color::Gray;
        stack.push((NodeId(start), 0));

        while let Some(top) = stack.last_mut() {
            let (id, next) = *top;
            let fanin = &nodes[id.0].fanin;
            if next < fanin.len() {
                top.1 += 1;
                let child = fanin[next];
                match color[child.0] {
                    Color::White => {
                        color[child.0] = Color::Gray;
                        stack.push((child, 0));
                    }
                    Color::Gray => {
                        let from = stack.iter().position(|(n, _)| *n == child).unwrap_or(0);
                        let mut path: Vec<NodeId> = stack[from..].iter().map(|(n, _)| *n).collect();
                        path.push(child);
                        return Some(path);
                    }
                    Color::Black => {}
                }
            } else {
                color[id.0] = Color::Black;
                stack.pop();
            }
        }
    }

    None
}

/// Nodes that feed no other node, in declaration order.
pub(crate) fn sinks(nodes: &[Node]) -> Vec<NodeId> {
    let mut consumed = vec![false; nodes.len()];
    for node in nodes {
        for &input in &node.fanin {
            consumed[input.0] = true;
        }
    }
    consumed
        .iter()
        .enumerate()
        .filter(|(_, &used)| !used)
        .map(|(idx, _)| NodeId(idx))
        .collect()
}

/// Post-order of every node reachable from `root`, fan-in before fan-out.
///
/// The graph must already be known to be acyclic.
pub(crate) fn reachable_topological_order(nodes: &[Node], root: NodeId) -> Vec<NodeId> {
    let mut visited = vec![false; nodes.len()];
    let mut order = Vec::new();
    let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
    visited[root.0] = true;

    while let Some(top) = stack.last_mut() {
        let (id, next) = *top;
        let fanin = &nodes[id.0].fanin;
        if next < fanin.len() {
            top.1 += 1;
            let child = fanin[next];
            if !visited[child.0] {
                visited[child.0] = true;
                stack.push((child, 0));
            }
        } else {
            order.push(id);
            stack.pop();
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::GateKind;

    fn node(name: &str, kind: GateKind, fanin: &[usize]) -> Node {
        Node {
            name: name.to_string(),
            kind,
            fanin: fanin.iter().map(|&i| NodeId(i)).collect(),
        }
    }

    #[test]
    fn test_find_cycle() {
        let nodes = vec![
            node("A", GateKind::Input, &[]),
            node("X", GateKind::And, &[0, 2]),
            node("Y", GateKind::Not, &[1]),
        ];
        let cycle = find_cycle(&nodes).unwrap();
        assert_eq!(cycle.first(), cycle.last());
        assert!(cycle.contains(&NodeId(1)));
        assert!(cycle.contains(&NodeId(2)));
    }

    #[test]
    fn test_acyclic_diamond() {
        let nodes = vec![
            node("A", GateKind::Input, &[]),
            node("X", GateKind::Not, &[0]),
            node("Y", GateKind::Not, &[0]),
            node("Z", GateKind::And, &[1, 2]),
        ];
        assert!(find_cycle(&nodes).is_none());
        assert_eq!(sinks(&nodes), vec![NodeId(3)]);

        let order = reachable_topological_order(&nodes, NodeId(3));
        assert_eq!(order.len(), 4);
        assert_eq!(order.last(), Some(&NodeId(3)));
        assert_eq!(order[0], NodeId(0));
    }

    #[test]
    fn test_resolve_fanin_arity() {
        let mut map = HashMap::new();
        map.insert("A".to_string(), NodeId(0));
        let def = NodeDef::gate("X", GateKind::And, ["A"]);
        let err = resolve_fanin(&def, &map).unwrap_err();
        assert!(matches!(err, GateDiagError::ArityMismatch { expected: 2, actual: 1, .. }));

        let def = NodeDef::gate("Y", GateKind::Not, ["Q"]);
        let err = resolve_fanin(&def, &map).unwrap_err();
        assert!(matches!(err, GateDiagError::UndefinedNode { ref reference, .. } if reference == "Q"));
    }
}
