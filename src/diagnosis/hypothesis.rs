//! Fault hypotheses and observations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::circuit::{Bit, Circuit};
use crate::error::{GateDiagError, Result};
use crate::sim::{FaultSpec, InputAssignment};

/// A candidate explanation: one gate stuck at one value.
///
/// Written as `<gate>_<bit>`, e.g. `X_0` for gate `X` stuck at 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FaultHypothesis {
    pub gate: String,
    pub stuck: Bit,
}

impl FaultHypothesis {
    pub fn new(gate: impl Into<String>, stuck: Bit) -> Self {
        Self {
            gate: gate.into(),
            stuck,
        }
    }

    /// Every gate of `circuit` with both stuck values.
    pub fn all_for(circuit: &Circuit) -> Vec<Self> {
        circuit
            .gates()
            .flat_map(|id| Bit::ALL.map(|stuck| Self::new(circuit.node_name(id), stuck)))
            .collect()
    }

    /// Resolve this hypothesis to a fault on `circuit`.
    pub fn to_fault(&self, circuit: &Circuit) -> Result<FaultSpec> {
        FaultSpec::new(circuit, &self.gate, self.stuck).map_err(|e| match e {
            GateDiagError::InvalidFault { message, .. } => {
                GateDiagError::unknown_hypothesis(self.to_string(), message)
            }
            other => other,
        })
    }
}

impl fmt::Display for FaultHypothesis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.gate, self.stuck)
    }
}

impl FromStr for FaultHypothesis {
    type Err = GateDiagError;

    fn from_str(s: &str) -> Result<Self> {
        let (gate, bit) = s
            .trim()
            .rsplit_once('_')
            .ok_or_else(|| GateDiagError::unknown_hypothesis(s, "expected <gate>_<0|1>"))?;
        if gate.is_empty() {
            return Err(GateDiagError::unknown_hypothesis(s, "missing gate name"));
        }
        let stuck = bit
            .parse::<Bit>()
            .map_err(|message| GateDiagError::unknown_hypothesis(s, message))?;
        Ok(Self::new(gate, stuck))
    }
}

impl From<FaultHypothesis> for String {
    fn from(h: FaultHypothesis) -> Self {
        h.to_string()
    }
}

impl TryFrom<String> for FaultHypothesis {
    type Error = GateDiagError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// An input assignment together with the output bit seen on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub assignment: InputAssignment,
    pub observed: Bit,
}

impl Observation {
    pub fn new(assignment: InputAssignment, observed: Bit) -> Self {
        Self { assignment, observed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::reference_circuit;

    #[test]
    fn test_parse_and_display() {
        let h: FaultHypothesis = "X_0".parse().unwrap();
        assert_eq!(h, FaultHypothesis::new("X", Bit::Zero));
        assert_eq!(h.to_string(), "X_0");

        // Gate names may themselves contain underscores
        let h: FaultHypothesis = "carry_out_1".parse().unwrap();
        assert_eq!(h.gate, "carry_out");
        assert_eq!(h.stuck, Bit::One);

        assert!("X".parse::<FaultHypothesis>().is_err());
        assert!("X_2".parse::<FaultHypothesis>().is_err());
        assert!("_1".parse::<FaultHypothesis>().is_err());
    }

    #[test]
    fn test_all_for_reference() {
        let circuit = reference_circuit();
        let names: Vec<String> = FaultHypothesis::all_for(&circuit)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, vec!["X_0", "X_1", "Y_0", "Y_1", "Z_0", "Z_1"]);
    }

    #[test]
    fn test_to_fault_rejects_inputs() {
        let circuit = reference_circuit();
        assert!(FaultHypothesis::new("X", Bit::One).to_fault(&circuit).is_ok());
        let err = FaultHypothesis::new("A", Bit::One).to_fault(&circuit).unwrap_err();
        assert!(matches!(err, GateDiagError::UnknownHypothesis { ref hypothesis, .. } if hypothesis == "A_1"));
    }
}
