//! Core types for gate network representation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A unique identifier for a node in a built circuit.
///
/// Ids are dense indices in declaration order and are only meaningful for
/// the [`Circuit`](super::Circuit) that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// A single logic level, serialized as `0` / `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Bit {
    Zero,
    One,
}

impl Bit {
    /// Both logic levels, `Zero` first.
    pub const ALL: [Bit; 2] = [Bit::Zero, Bit::One];

    /// Numeric value of the bit.
    pub fn as_u8(self) -> u8 {
        match self {
            Bit::Zero => 0,
            Bit::One => 1,
        }
    }

    /// Convert a `0`/`1` integer into a bit.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Bit::Zero),
            1 => Some(Bit::One),
            _ => None,
        }
    }

    pub fn is_one(self) -> bool {
        self == Bit::One
    }
}

impl From<bool> for Bit {
    fn from(value: bool) -> Self {
        if value {
            Bit::One
        } else {
            Bit::Zero
        }
    }
}

impl From<Bit> for u8 {
    fn from(bit: Bit) -> u8 {
        bit.as_u8()
    }
}

impl TryFrom<u8> for Bit {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Bit::from_u8(value).ok_or_else(|| format!("expected 0 or 1, got {}", value))
    }
}

impl std::ops::Not for Bit {
    type Output = Bit;

    fn not(self) -> Bit {
        match self {
            Bit::Zero => Bit::One,
            Bit::One => Bit::Zero,
        }
    }
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

impl FromStr for Bit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(Bit::Zero),
            "1" => Ok(Bit::One),
            other => Err(format!("expected 0 or 1, got '{}'", other)),
        }
    }
}

/// Node kinds supported by the gate network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateKind {
    /// Primary input, value comes from the input assignment
    Input,
    /// Two-input AND
    And,
    /// Two-input OR
    Or,
    /// Inverter
    Not,
}

impl GateKind {
    /// Parse a gate kind from its netlist keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_uppercase().as_str() {
            "INPUT" => Some(Self::Input),
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            "NOT" => Some(Self::Not),
            _ => None,
        }
    }

    /// Get the required number of fan-in nodes for this kind.
    pub fn arity(&self) -> usize {
        match self {
            Self::Input => 0,
            Self::And | Self::Or => 2,
            Self::Not => 1,
        }
    }

    /// Whether this node is a gate (and therefore can be stuck-at faulted).
    pub fn is_gate(&self) -> bool {
        !matches!(self, Self::Input)
    }

    /// Apply the gate function to already evaluated fan-in values.
    ///
    /// Inputs carry no function of their own; callers read them from the
    /// assignment instead. Fan-in length is guaranteed by circuit validation.
    pub fn apply(&self, fanin: &[Bit]) -> Option<Bit> {
        match (self, fanin) {
            (Self::And, [a, b]) => Some(Bit::from(a.is_one() && b.is_one())),
            (Self::Or, [a, b]) => Some(Bit::from(a.is_one() || b.is_one())),
            (Self::Not, [a]) => Some(!*a),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Input => "INPUT",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Declarative description of one node, as written in a netlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDef {
    /// Node identifier
    pub name: String,
    /// Node kind
    pub kind: GateKind,
    /// Ordered fan-in identifiers (empty for inputs)
    pub inputs: Vec<String>,
}

impl NodeDef {
    /// Declare a primary input.
    pub fn input(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: GateKind::Input,
            inputs: Vec::new(),
        }
    }

    /// Declare a gate with the given fan-in.
    pub fn gate<I, S>(name: impl Into<String>, kind: GateKind, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind,
            inputs: inputs.into_iter().map(Into::into).collect(),
        }
    }
}
