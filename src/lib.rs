//! # Gatediag Core
//!
//! Stuck-at fault simulation and Bayesian fault diagnosis for combinational
//! gate networks.
//!
//! This library provides:
//! - A small DSL for describing gate netlists
//! - Fault-aware evaluation of arbitrary acyclic AND/OR/NOT networks
//! - Healthy-versus-faulty sweeps over an input space
//! - Exhaustive per-gate sensitivity analysis
//! - Sequential Bayesian inference of the most likely stuck-at fault from
//!   observed input/output pairs
//!
//! ## Architecture
//!
//! The library is organized into several modules, leaves first:
//!
//! - [`circuit`] - Immutable circuit model and validation
//! - [`sim`] - Evaluator and fault sweeps
//! - [`analysis`] - Sensitivity analysis built on sweeps
//! - [`diagnosis`] - Bayesian diagnoser using the evaluator as its likelihood oracle
//! - [`dsl`] - Parser for the netlist description language
//! - [`report`] - Text/JSON rendering (CLI only)
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! gatediag circuit.gd sensitivity
//! gatediag circuit.gd diagnose --observe "A=1,B=1:0" --observe "A=0,B=0:1"
//! ```
//!
//! ### Library
//!
//! ```
//! use gatediag_core::{circuit::Circuit, diagnosis, dsl};
//!
//! let ast = dsl::parse(".input A B\nX = AND(A, B)\nY = NOT(A)\nZ = OR(X, Y)").unwrap();
//! let circuit = Circuit::from_ast(ast).unwrap();
//!
//! let prior = diagnosis::Prior::uniform(&circuit).unwrap();
//! let observation = dsl::parse_observation("A=1,B=1:0").unwrap();
//! let posterior = diagnosis::diagnose(&circuit, prior, &[observation], Default::default()).unwrap();
//! assert!(posterior.probability("X_0").unwrap() > 0.3);
//! ```
//!
//! ### WASM
//!
//! ```javascript
//! import { WasmDiagnoser } from 'gatediag_core';
//!
//! const diag = new WasmDiagnoser(netlist);
//! diag.observe("A=1,B=1:0");
//! console.log(diag.posterior_json());
//! ```

pub mod analysis;
pub mod circuit;
pub mod diagnosis;
pub mod dsl;
pub mod error;
pub mod sim;

#[cfg(feature = "cli")]
pub mod report;

// Re-export main types for convenience
pub use analysis::{analyze_sensitivity, SensitivityReport};
pub use circuit::{Bit, Circuit, GateKind, NodeDef};
pub use diagnosis::{diagnose, BayesianDiagnoser, LikelihoodModel, Observation, PosteriorDistribution, Prior};
pub use error::{ErrorKind, GateDiagError, Result};
pub use sim::{simulate, sweep_faults, FaultSpec, InputAssignment, InputSpace};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmDiagnoser;

/// Default likelihood of an observation the hypothesis predicts
pub const DEFAULT_MATCH_WEIGHT: f64 = 1.0;

/// Default likelihood of an observation the hypothesis contradicts
pub const DEFAULT_MISMATCH_WEIGHT: f64 = 0.01;

/// Allowed deviation of a prior's total from 1
pub const PRIOR_SUM_TOLERANCE: f64 = 1e-6;

/// Largest input count [`InputSpace::exhaustive`] will enumerate (2^24 runs)
pub const MAX_EXHAUSTIVE_INPUTS: usize = 24;
