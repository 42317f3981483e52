//! Fault-aware logic simulation.
//!
//! This module provides the evaluation engine and the sweep driver built on
//! top of it:
//!
//! - [`Evaluator`] / [`simulate`] evaluate one run of a circuit for an
//!   [`InputAssignment`], optionally overriding one gate with a stuck-at
//!   [`FaultSpec`]
//! - [`FaultSimulator`] / [`sweep_faults`] repeat that over an
//!   [`InputSpace`] and diff healthy against faulty runs
//!
//! ## Fault injection
//!
//! A faulted gate still computes its natural value, which is then replaced
//! by the stuck bit before it is recorded. Downstream gates read only the
//! recorded value, so the fault propagates towards the output while nodes
//! upstream of, or independent of, the faulted gate are untouched.
//!
//! Every run owns its value table and the circuit is shared read-only, so
//! trials are independent. With the `parallel` feature, sweeps spread the
//! input space across a rayon thread pool and keep results in input order.

mod evaluator;
mod sweep;

pub use evaluator::{simulate, EvaluationLog, Evaluator, FaultSpec, InputAssignment};
pub use sweep::{
    diff_logs, sweep_faults, CancelToken, FaultSimulator, InputSpace, LogDiff, NodeDiff, SweepComparison,
    SweepOptions,
};
