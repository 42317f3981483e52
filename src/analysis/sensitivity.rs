//! Per-gate stuck-at sensitivity.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::circuit::{Bit, Circuit, NodeId};
use crate::error::Result;
use crate::sim::{FaultSimulator, FaultSpec, InputSpace, SweepOptions};

/// Observability of faults on one gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateSensitivity {
    /// Gate name
    pub gate: String,
    /// Gate id in the analysed circuit
    pub node: NodeId,
    /// Output mismatches with the gate stuck at 0
    pub stuck_at_0: usize,
    /// Output mismatches with the gate stuck at 1
    pub stuck_at_1: usize,
    /// Number of trials (assignments x 2 stuck values)
    pub trials: usize,
    /// Fraction of trials with an output mismatch, in [0, 1]
    pub score: f64,
}

impl GateSensitivity {
    pub fn mismatches(&self) -> usize {
        self.stuck_at_0 + self.stuck_at_1
    }
}

/// Sensitivity of every gate, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensitivityReport {
    gates: Vec<GateSensitivity>,
    assignments: usize,
}

impl SensitivityReport {
    /// Score of the named gate.
    pub fn score(&self, gate: &str) -> Option<f64> {
        self.get(gate).map(|g| g.score)
    }

    pub fn get(&self, gate: &str) -> Option<&GateSensitivity> {
        self.gates.iter().find(|g| g.gate == gate)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GateSensitivity> {
        self.gates.iter()
    }

    /// Number of input assignments each gate was tested with.
    pub fn assignments(&self) -> usize {
        self.assignments
    }

    /// Gate name to score.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.gates.iter().map(|g| (g.gate.clone(), g.score)).collect()
    }
}

/// Exhaustive stuck-at sensitivity over an input space.
#[derive(Debug, Clone)]
pub struct SensitivityAnalyzer<'c> {
    circuit: &'c Circuit,
    simulator: FaultSimulator<'c>,
    options: SweepOptions,
}

impl<'c> SensitivityAnalyzer<'c> {
    pub fn new(circuit: &'c Circuit) -> Self {
        Self::with_options(circuit, SweepOptions::default())
    }

    pub fn with_options(circuit: &'c Circuit, options: SweepOptions) -> Self {
        Self {
            circuit,
            simulator: FaultSimulator::with_options(circuit, options.clone()),
            options,
        }
    }

    /// Score every gate against every assignment of `space` with both
    /// stuck values.
    ///
    /// Healthy outputs are computed once and reused for all faults. A gate
    /// that cannot reach the output scores 0.
    pub fn analyze(&self, space: &InputSpace) -> Result<SensitivityReport> {
        if space.is_empty() {
            warn!("sensitivity analysis over an empty input space, every score is 0");
        }

        let healthy = self.simulator.outputs(space, None)?;

        let mut gates = Vec::new();
        for node in self.circuit.gates() {
            self.options.check()?;

            let mut mismatches = [0usize; 2];
            for (slot, stuck) in Bit::ALL.into_iter().enumerate() {
                let fault = FaultSpec::at(self.circuit, node, stuck)?;
                mismatches[slot] = self
                    .simulator
                    .outputs(space, Some(fault))?
                    .iter()
                    .zip(&healthy)
                    .filter(|(faulty, expected)| faulty != expected)
                    .count();
            }

            let trials = space.len() * 2;
            let score = if trials == 0 {
                0.0
            } else {
                (mismatches[0] + mismatches[1]) as f64 / trials as f64
            };

            let gate = self.circuit.node_name(node).to_string();
            debug!(gate = %gate, stuck_at_0 = mismatches[0], stuck_at_1 = mismatches[1], score, "gate sensitivity");

            gates.push(GateSensitivity {
                gate,
                node,
                stuck_at_0: mismatches[0],
                stuck_at_1: mismatches[1],
                trials,
                score,
            });
        }

        info!(gates = gates.len(), assignments = space.len(), "sensitivity analysis complete");

        Ok(SensitivityReport {
            gates,
            assignments: space.len(),
        })
    }
}

/// Score every gate of `circuit` over `space`.
pub fn analyze_sensitivity(circuit: &Circuit, space: &InputSpace) -> Result<SensitivityReport> {
    SensitivityAnalyzer::new(circuit).analyze(space)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{reference_circuit, GateKind, NodeDef};
    use crate::error::GateDiagError;
    use crate::sim::CancelToken;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference_scores() {
        let circuit = reference_circuit();
        let space = InputSpace::exhaustive(&circuit).unwrap();
        let report = analyze_sensitivity(&circuit, &space).unwrap();

        // Healthy Z over (00,01,10,11) = 1,1,0,1
        // X/0: flips 11 only; X/1: flips 10 only
        let x = report.get("X").unwrap();
        assert_eq!((x.stuck_at_0, x.stuck_at_1, x.trials), (1, 1, 8));
        assert_relative_eq!(x.score, 0.25);

        // Y/0: flips 00, 01; Y/1: flips 10
        let y = report.get("Y").unwrap();
        assert_eq!((y.stuck_at_0, y.stuck_at_1), (2, 1));
        assert_relative_eq!(y.score, 0.375);

        // Z is the output itself: /0 flips three ones, /1 flips the zero
        let z = report.get("Z").unwrap();
        assert_eq!((z.stuck_at_0, z.stuck_at_1), (3, 1));
        assert_relative_eq!(z.score, 0.5);

        assert_eq!(report.to_map().len(), 3);
        assert!(report.score("A").is_none());
    }

    #[test]
    fn test_dead_logic_scores_zero() {
        let circuit = Circuit::build(
            vec![
                NodeDef::input("A"),
                NodeDef::input("B"),
                NodeDef::gate("DEAD", GateKind::Or, ["A", "B"]),
                NodeDef::gate("OUT", GateKind::And, ["A", "B"]),
            ],
            Some("OUT"),
        )
        .unwrap();
        let space = InputSpace::exhaustive(&circuit).unwrap();
        let report = analyze_sensitivity(&circuit, &space).unwrap();
        assert_eq!(report.score("DEAD"), Some(0.0));
        for gate in report.iter() {
            assert!((0.0..=1.0).contains(&gate.score));
        }
    }

    #[test]
    fn test_empty_space() {
        let circuit = reference_circuit();
        let report = analyze_sensitivity(&circuit, &InputSpace::default()).unwrap();
        assert!(report.iter().all(|g| g.score == 0.0 && g.trials == 0));
    }

    #[test]
    fn test_cancelled_analysis() {
        let circuit = reference_circuit();
        let space = InputSpace::exhaustive(&circuit).unwrap();
        let token = CancelToken::new();
        token.cancel();
        let analyzer = SensitivityAnalyzer::with_options(&circuit, SweepOptions::new().with_cancel(token));
        assert!(matches!(analyzer.analyze(&space), Err(GateDiagError::Cancelled)));
    }
}
