//! Fault-aware evaluation of a single circuit run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::circuit::{Bit, Circuit, GateKind, NodeId};
use crate::error::{GateDiagError, Result};

/// Values for the input nodes of one run, keyed by input name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputAssignment {
    values: BTreeMap<String, Bit>,
}

impl InputAssignment {
    /// Create an empty assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an input value, returning the previous one.
    pub fn set(&mut self, name: impl Into<String>, bit: Bit) -> Option<Bit> {
        self.values.insert(name.into(), bit)
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, bit: Bit) -> Self {
        self.set(name, bit);
        self
    }

    pub fn get(&self, name: &str) -> Option<Bit> {
        self.values.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Bit)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check that every assigned name is an input node of `circuit`.
    pub fn check_against(&self, circuit: &Circuit) -> Result<()> {
        for name in self.values.keys() {
            match circuit.find_node(name) {
                Some(id) if circuit.node(id).kind == GateKind::Input => {}
                _ => return Err(GateDiagError::UnknownInput { node: name.clone() }),
            }
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<(S, Bit)> for InputAssignment {
    fn from_iter<T: IntoIterator<Item = (S, Bit)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl std::fmt::Display for InputAssignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (name, bit) in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{}={}", name, bit)?;
            first = false;
        }
        Ok(())
    }
}

/// A single stuck-at fault on a gate output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaultSpec {
    node: NodeId,
    stuck: Bit,
}

impl FaultSpec {
    /// Fault the gate named `name` to `stuck`.
    ///
    /// The node must exist and must not be an input.
    pub fn new(circuit: &Circuit, name: &str, stuck: Bit) -> Result<Self> {
        let node = circuit
            .find_node(name)
            .ok_or_else(|| GateDiagError::invalid_fault(name, "node does not exist"))?;
        Self::at(circuit, node, stuck)
    }

    /// Fault the gate with id `node` to `stuck`.
    pub fn at(circuit: &Circuit, node: NodeId, stuck: Bit) -> Result<Self> {
        if node.0 >= circuit.len() {
            return Err(GateDiagError::invalid_fault(node.to_string(), "node does not exist"));
        }
        if !circuit.node(node).kind.is_gate() {
            return Err(GateDiagError::invalid_fault(
                circuit.node_name(node),
                "stuck-at faults apply to gate outputs, not inputs",
            ));
        }
        Ok(Self { node, stuck })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn stuck(&self) -> Bit {
        self.stuck
    }
}

/// Value of every node visited during one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationLog {
    values: Vec<Option<Bit>>,
    output: NodeId,
    output_bit: Bit,
}

impl EvaluationLog {
    /// Value of `node`, or `None` if the run never visited it.
    pub fn get(&self, node: NodeId) -> Option<Bit> {
        self.values.get(node.0).copied().flatten()
    }

    /// The designated output node.
    pub fn output(&self) -> NodeId {
        self.output
    }

    /// Value of the designated output.
    pub fn output_bit(&self) -> Bit {
        self.output_bit
    }

    /// Visited nodes with their values, in id order.
    pub fn visited(&self) -> impl Iterator<Item = (NodeId, Bit)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(idx, v)| v.map(|bit| (NodeId(idx), bit)))
    }

    /// Number of slots, equal to the node count of the producing circuit.
    pub(crate) fn slots(&self) -> usize {
        self.values.len()
    }

    /// Name-keyed copy of the log.
    pub fn to_named(&self, circuit: &Circuit) -> BTreeMap<String, Bit> {
        self.visited()
            .map(|(id, bit)| (circuit.node_name(id).to_string(), bit))
            .collect()
    }
}

/// Evaluates a circuit for one input assignment and optional fault.
///
/// Holds only a shared reference to the circuit, so one evaluator can be
/// used from many threads at once; every call owns its own value table.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'c> {
    circuit: &'c Circuit,
}

impl<'c> Evaluator<'c> {
    pub fn new(circuit: &'c Circuit) -> Self {
        Self { circuit }
    }

    pub fn circuit(&self) -> &'c Circuit {
        self.circuit
    }

    /// Evaluate every node reachable from the output.
    ///
    /// Nodes are visited in topological order, so each node is computed
    /// exactly once after its fan-in. The faulted node's natural value is
    /// replaced by the stuck bit before it is recorded, which is what every
    /// downstream consumer then reads.
    pub fn evaluate(&self, assignment: &InputAssignment, fault: Option<FaultSpec>) -> Result<EvaluationLog> {
        let circuit = self.circuit;
        let mut values: Vec<Option<Bit>> = vec![None; circuit.len()];

        for &id in circuit.topological_order() {
            let node = circuit.node(id);
            let natural = match node.kind {
                GateKind::Input => assignment
                    .get(&node.name)
                    .ok_or_else(|| GateDiagError::MissingInputValue {
                        node: node.name.clone(),
                    })?,
                kind => node
                    .fanin
                    .iter()
                    .map(|f| values[f.0])
                    .collect::<Option<Vec<Bit>>>()
                    .and_then(|bits| kind.apply(&bits))
                    .ok_or_else(|| GateDiagError::ArityMismatch {
                        node: node.name.clone(),
                        kind: kind.to_string(),
                        expected: kind.arity(),
                        actual: node.fanin.len(),
                    })?,
            };

            let value = match fault {
                Some(f) if f.node == id => f.stuck,
                _ => natural,
            };
            values[id.0] = Some(value);
        }

        let output = circuit.output();
        let output_bit = values[output.0].ok_or(GateDiagError::MissingOutput)?;

        Ok(EvaluationLog {
            values,
            output,
            output_bit,
        })
    }

    /// Evaluate and return only the output bit.
    pub fn output(&self, assignment: &InputAssignment, fault: Option<FaultSpec>) -> Result<Bit> {
        Ok(self.evaluate(assignment, fault)?.output_bit())
    }
}

/// Evaluate `circuit` once for `assignment`, optionally with a stuck-at fault.
pub fn simulate(circuit: &Circuit, assignment: &InputAssignment, fault: Option<FaultSpec>) -> Result<EvaluationLog> {
    Evaluator::new(circuit).evaluate(assignment, fault)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{reference_circuit, NodeDef};
    use Bit::{One, Zero};

    fn inputs(a: Bit, b: Bit) -> InputAssignment {
        InputAssignment::new().with("A", a).with("B", b)
    }

    #[test]
    fn test_reference_truth_table() {
        let circuit = reference_circuit();
        let cases = [(Zero, Zero, One), (Zero, One, One), (One, Zero, Zero), (One, One, One)];
        for (a, b, z) in cases {
            let log = simulate(&circuit, &inputs(a, b), None).unwrap();
            assert_eq!(log.output_bit(), z, "A={a} B={b}");
        }
    }

    #[test]
    fn test_fault_injection_propagates() {
        let circuit = reference_circuit();
        let fault = FaultSpec::new(&circuit, "X", Zero).unwrap();
        let log = simulate(&circuit, &inputs(One, One), Some(fault)).unwrap();

        let named = log.to_named(&circuit);
        assert_eq!(named["X"], Zero);
        assert_eq!(named["Y"], Zero);
        assert_eq!(named["Z"], Zero);
        assert_eq!(named["A"], One);
    }

    #[test]
    fn test_fault_on_input_rejected() {
        let circuit = reference_circuit();
        let err = FaultSpec::new(&circuit, "A", One).unwrap_err();
        assert!(matches!(err, GateDiagError::InvalidFault { .. }));
        assert!(FaultSpec::new(&circuit, "Q", One).is_err());
    }

    #[test]
    fn test_missing_input_value() {
        let circuit = reference_circuit();
        let partial = InputAssignment::new().with("A", One);
        let err = simulate(&circuit, &partial, None).unwrap_err();
        assert!(matches!(err, GateDiagError::MissingInputValue { ref node } if node == "B"));
    }

    #[test]
    fn test_deterministic() {
        let circuit = reference_circuit();
        let fault = FaultSpec::new(&circuit, "Y", One).ok();
        let first = simulate(&circuit, &inputs(One, Zero), fault).unwrap();
        for _ in 0..5 {
            assert_eq!(simulate(&circuit, &inputs(One, Zero), fault).unwrap(), first);
        }
    }

    #[test]
    fn test_unreachable_input_not_required() {
        let circuit = Circuit::build(
            vec![
                NodeDef::input("A"),
                NodeDef::input("UNUSED"),
                NodeDef::gate("N", GateKind::Not, ["A"]),
            ],
            Some("N"),
        )
        .unwrap();
        let log = simulate(&circuit, &InputAssignment::new().with("A", Zero), None).unwrap();
        assert_eq!(log.output_bit(), One);
        assert_eq!(log.get(circuit.find_node("UNUSED").unwrap()), None);
    }

    #[test]
    fn test_check_against() {
        let circuit = reference_circuit();
        assert!(inputs(One, Zero).check_against(&circuit).is_ok());
        let bad = inputs(One, Zero).with("X", One);
        assert!(matches!(
            bad.check_against(&circuit),
            Err(GateDiagError::UnknownInput { .. })
        ));
        assert_eq!(inputs(One, Zero).to_string(), "A=1,B=0");
    }
}
