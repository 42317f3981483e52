//! Circuit graph structure.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use super::types::{GateKind, NodeDef, NodeId};
use super::validate::{find_cycle, reachable_topological_order, resolve_fanin, sinks};
use crate::dsl::NetlistAst;
use crate::error::{GateDiagError, Result};

/// A node of a built circuit with its fan-in resolved to ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    /// Node identifier
    pub name: String,
    /// Node kind
    pub kind: GateKind,
    /// Ordered fan-in node ids
    pub fanin: Vec<NodeId>,
}

/// An immutable, validated combinational gate network.
///
/// Built once through [`Circuit::build`] and shared by reference with every
/// evaluation, sweep and diagnosis operation.
#[derive(Debug, Clone)]
pub struct Circuit {
    /// All nodes in declaration order, indexed by [`NodeId`]
    nodes: Vec<Node>,

    /// Mapping from node names to node IDs
    node_map: HashMap<String, NodeId>,

    /// Input node IDs in declaration order
    inputs: Vec<NodeId>,

    /// Designated output node
    output: NodeId,

    /// Nodes reachable from the output, fan-in first
    topo_order: Vec<NodeId>,
}

impl Circuit {
    /// Build a circuit from a node list.
    ///
    /// When `output` is `None` the unique sink of the graph becomes the
    /// output. Fails with a configuration error naming the offending node on
    /// duplicate identifiers, dangling references, wrong arity or cycles.
    pub fn build(defs: Vec<NodeDef>, output: Option<&str>) -> Result<Self> {
        let mut node_map = HashMap::with_capacity(defs.len());
        for (idx, def) in defs.iter().enumerate() {
            if node_map.insert(def.name.clone(), NodeId(idx)).is_some() {
                return Err(GateDiagError::DuplicateNode {
                    name: def.name.clone(),
                });
            }
        }

        let nodes = defs
            .into_iter()
            .map(|def| {
                let fanin = resolve_fanin(&def, &node_map)?;
                Ok(Node {
                    name: def.name,
                    kind: def.kind,
                    fanin,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(cycle) = find_cycle(&nodes) {
            let path: Vec<String> = cycle.iter().map(|id| nodes[id.0].name.clone()).collect();
            return Err(GateDiagError::CycleDetected {
                node: path[0].clone(),
                path,
            });
        }

        let output = match output {
            Some(name) => node_map
                .get(name)
                .copied()
                .ok_or_else(|| GateDiagError::UndefinedNode {
                    node: ".output".to_string(),
                    reference: name.to_string(),
                })?,
            None => {
                let candidates = sinks(&nodes);
                match candidates.as_slice() {
                    [] => return Err(GateDiagError::MissingOutput),
                    [only] => *only,
                    many => {
                        return Err(GateDiagError::AmbiguousOutput {
                            candidates: many.iter().map(|id| nodes[id.0].name.clone()).collect(),
                        })
                    }
                }
            }
        };

        let inputs = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == GateKind::Input)
            .map(|(idx, _)| NodeId(idx))
            .collect();

        let topo_order = reachable_topological_order(&nodes, output);

        debug!(
            nodes = nodes.len(),
            reachable = topo_order.len(),
            output = %nodes[output.0].name,
            "built circuit"
        );

        Ok(Circuit {
            nodes,
            node_map,
            inputs,
            output,
            topo_order,
        })
    }

    /// Build a circuit from a parsed netlist.
    pub fn from_ast(ast: NetlistAst) -> Result<Self> {
        Self::build(ast.nodes, ast.output.as_deref())
    }

    /// Get a node by id.
    ///
    /// Panics if the id was not issued by this circuit.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Find a node ID by name.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.node_map.get(name).copied()
    }

    /// Get the name of a node.
    pub fn node_name(&self, node: NodeId) -> &str {
        &self.nodes[node.0].name
    }

    /// The designated output node.
    pub fn output(&self) -> NodeId {
        self.output
    }

    /// Input nodes in declaration order.
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Gate (non-input) nodes in declaration order.
    pub fn gates(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind.is_gate())
            .map(|(idx, _)| NodeId(idx))
    }

    /// Nodes reachable from the output in topological order (fan-in first,
    /// output last).
    pub fn topological_order(&self) -> &[NodeId] {
        &self.topo_order
    }

    /// Whether `node` can influence the output.
    pub fn reaches_output(&self, node: NodeId) -> bool {
        self.topo_order.contains(&node)
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(idx, n)| (NodeId(idx), n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::reference_circuit;

    #[test]
    fn test_reference_circuit_shape() {
        let circuit = reference_circuit();
        assert_eq!(circuit.len(), 5);
        assert_eq!(circuit.node_name(circuit.output()), "Z");
        let inputs: Vec<&str> = circuit.inputs().iter().map(|&id| circuit.node_name(id)).collect();
        assert_eq!(inputs, vec!["A", "B"]);
        let gates: Vec<&str> = circuit.gates().map(|id| circuit.node_name(id)).collect();
        assert_eq!(gates, vec!["X", "Y", "Z"]);
        assert_eq!(circuit.topological_order().last(), Some(&circuit.output()));
    }

    #[test]
    fn test_unique_sink_is_output() {
        let circuit = Circuit::build(
            vec![
                NodeDef::input("A"),
                NodeDef::gate("N", GateKind::Not, ["A"]),
            ],
            None,
        )
        .unwrap();
        assert_eq!(circuit.node_name(circuit.output()), "N");
    }

    #[test]
    fn test_ambiguous_output() {
        let err = Circuit::build(
            vec![
                NodeDef::input("A"),
                NodeDef::gate("N1", GateKind::Not, ["A"]),
                NodeDef::gate("N2", GateKind::Not, ["A"]),
            ],
            None,
        )
        .unwrap_err();
        match err {
            GateDiagError::AmbiguousOutput { candidates } => assert_eq!(candidates, vec!["N1", "N2"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cycle_rejected() {
        let err = Circuit::build(
            vec![
                NodeDef::input("A"),
                NodeDef::gate("X", GateKind::And, ["A", "Y"]),
                NodeDef::gate("Y", GateKind::Not, ["X"]),
            ],
            Some("Y"),
        )
        .unwrap_err();
        assert!(matches!(err, GateDiagError::CycleDetected { .. }));
    }

    #[test]
    fn test_duplicate_and_dangling() {
        let err = Circuit::build(vec![NodeDef::input("A"), NodeDef::input("A")], None).unwrap_err();
        assert!(matches!(err, GateDiagError::DuplicateNode { ref name } if name == "A"));

        let err = Circuit::build(
            vec![NodeDef::input("A"), NodeDef::gate("X", GateKind::Or, ["A", "B"])],
            Some("X"),
        )
        .unwrap_err();
        assert!(matches!(err, GateDiagError::UndefinedNode { ref node, .. } if node == "X"));

        let err = Circuit::build(vec![NodeDef::input("A")], Some("Q")).unwrap_err();
        assert!(matches!(err, GateDiagError::UndefinedNode { .. }));
    }

    #[test]
    fn test_dead_logic_not_reachable() {
        let circuit = Circuit::build(
            vec![
                NodeDef::input("A"),
                NodeDef::gate("DEAD", GateKind::Not, ["A"]),
                NodeDef::gate("OUT", GateKind::Not, ["A"]),
            ],
            Some("OUT"),
        )
        .unwrap();
        let dead = circuit.find_node("DEAD").unwrap();
        assert!(!circuit.reaches_output(dead));
        assert!(circuit.reaches_output(circuit.find_node("A").unwrap()));
    }
}
