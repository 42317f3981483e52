//! Bayesian stuck-at fault diagnosis.
//!
//! Given a [`Prior`] over [`FaultHypothesis`]es and a stream of
//! [`Observation`]s (inputs applied to the device and the output bit it
//! produced), the [`BayesianDiagnoser`] infers which gate is most likely
//! stuck.
//!
//! ## Update rule
//!
//! For each observation `(inputs, z)` and every tracked hypothesis `h`:
//!
//! 1. Simulate the circuit on `inputs` with `h` injected
//! 2. `L(h) = match_weight` if the simulated output equals `z`, else
//!    `mismatch_weight`
//! 3. `P(h) <- P(h) * L(h) / sum_k P(k) * L(k)`
//!
//! Because `mismatch_weight > 0`, no hypothesis is ever eliminated, only
//! suppressed, and the final posterior does not depend on observation
//! order beyond floating-point rounding.

mod diagnoser;
mod distribution;
mod hypothesis;

pub use diagnoser::{diagnose, BayesianDiagnoser};
pub use distribution::{LikelihoodModel, PosteriorDistribution, Prior};
pub use hypothesis::{FaultHypothesis, Observation};
