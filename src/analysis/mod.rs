//! Aggregate analyses built on fault sweeps.
//!
//! ## Sensitivity
//!
//! For every gate `g` and stuck value `v`, the circuit is simulated over the
//! whole input space with `g` stuck at `v`, and each output is compared with
//! the healthy run of the same assignment:
//!
//! ```text
//! score(g) = mismatches(g/0) + mismatches(g/1)
//!            ---------------------------------
//!                  2 * |input space|
//! ```
//!
//! - score = 1.0: every fault on the gate is visible at the output
//! - score = 0.0: the gate is fully masked (or dead logic)
//!
//! The computation is exhaustive, not sampled.

mod sensitivity;

pub use sensitivity::{analyze_sensitivity, GateSensitivity, SensitivityAnalyzer, SensitivityReport};
