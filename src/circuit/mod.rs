//! Gate network representation and validation.
//!
//! This module provides the immutable description of a combinational
//! circuit. A [`Circuit`] is built once from a list of [`NodeDef`]s (or a
//! parsed netlist), validated for dangling references, arity and cycles,
//! and then passed by reference into every simulation and diagnosis
//! operation.

mod graph;
mod types;
mod validate;

pub use graph::{Circuit, Node};
pub use types::*;

/// The reference circuit `X = AND(A,B)`, `Y = NOT(A)`, `Z = OR(X,Y)`.
#[cfg(test)]
pub(crate) fn reference_circuit() -> Circuit {
    Circuit::build(
        vec![
            NodeDef::input("A"),
            NodeDef::input("B"),
            NodeDef::gate("X", GateKind::And, ["A", "B"]),
            NodeDef::gate("Y", GateKind::Not, ["A"]),
            NodeDef::gate("Z", GateKind::Or, ["X", "Y"]),
        ],
        Some("Z"),
    )
    .unwrap()
}
