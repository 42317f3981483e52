//! WASM bindings for Gatediag Core.
//!
//! This module exposes the diagnoser to JavaScript so a test bench running in
//! the browser can feed observations one by one and display the posterior.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmDiagnoser } from 'gatediag_core';
//!
//! await init();
//!
//! const netlist = `
//!   .input A B
//!   X = AND(A, B)
//!   Y = NOT(A)
//!   Z = OR(X, Y)
//! `;
//!
//! const diag = new WasmDiagnoser(netlist);
//! diag.observe("A=1,B=1:0");
//! console.log(diag.most_likely(), JSON.parse(diag.posterior_json()));
//! ```

use wasm_bindgen::prelude::*;

use crate::analysis::analyze_sensitivity;
use crate::circuit::Circuit;
use crate::diagnosis::{BayesianDiagnoser, LikelihoodModel, PosteriorDistribution, Prior};
use crate::dsl;
use crate::error::GateDiagError;
use crate::sim::InputSpace;

fn to_js(e: GateDiagError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Sequential Bayesian diagnoser over a netlist.
///
/// The circuit is owned here; each observation runs through a short-lived
/// [`BayesianDiagnoser`] whose posterior becomes the next prior.
#[wasm_bindgen]
pub struct WasmDiagnoser {
    circuit: Circuit,
    posterior: PosteriorDistribution,
    model: LikelihoodModel,
    observations: usize,
}

#[wasm_bindgen]
impl WasmDiagnoser {
    /// Create a diagnoser with a uniform prior and default likelihood weights.
    ///
    /// # Example
    /// ```javascript
    /// const diag = new WasmDiagnoser(netlist);
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new(netlist: &str) -> Result<WasmDiagnoser, JsValue> {
        Self::with_weights(netlist, crate::DEFAULT_MATCH_WEIGHT, crate::DEFAULT_MISMATCH_WEIGHT)
    }

    /// Create a diagnoser with custom likelihood weights.
    ///
    /// # Arguments
    /// * `netlist` - The circuit in netlist DSL format
    /// * `match_weight` - Likelihood of an observation the hypothesis predicts
    /// * `mismatch_weight` - Likelihood of an observation it contradicts
    #[wasm_bindgen]
    pub fn with_weights(netlist: &str, match_weight: f64, mismatch_weight: f64) -> Result<WasmDiagnoser, JsValue> {
        let ast = dsl::parse(netlist).map_err(to_js)?;
        let circuit = Circuit::from_ast(ast).map_err(to_js)?;
        let model = LikelihoodModel::new(match_weight, mismatch_weight).map_err(to_js)?;
        let prior = Prior::uniform(&circuit).map_err(to_js)?;
        let posterior = BayesianDiagnoser::with_model(&circuit, prior, model)
            .map_err(to_js)?
            .into_posterior();

        Ok(WasmDiagnoser {
            circuit,
            posterior,
            model,
            observations: 0,
        })
    }

    /// Incorporate one observation such as `"A=1,B=1:0"`.
    ///
    /// On error the posterior is left as it was.
    #[wasm_bindgen]
    pub fn observe(&mut self, observation: &str) -> Result<(), JsValue> {
        let observation = dsl::parse_observation(observation).map_err(to_js)?;
        let prior = Prior::from(self.posterior.clone());
        let mut diagnoser = BayesianDiagnoser::with_model(&self.circuit, prior, self.model).map_err(to_js)?;
        diagnoser.update(&observation).map_err(to_js)?;
        self.posterior = diagnoser.into_posterior();
        self.observations += 1;
        Ok(())
    }

    /// Number of observations incorporated so far.
    #[wasm_bindgen(getter)]
    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Current posterior as a JSON object mapping `"<gate>_<bit>"` to probability.
    #[wasm_bindgen]
    pub fn posterior_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.posterior).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Probability of one hypothesis, or `undefined` if it is not tracked.
    #[wasm_bindgen]
    pub fn probability(&self, hypothesis: &str) -> Option<f64> {
        self.posterior.probability(hypothesis)
    }

    /// Name of the most probable hypothesis.
    #[wasm_bindgen]
    pub fn most_likely(&self) -> Option<String> {
        self.posterior
            .most_likely()
            .map(|(hypothesis, _)| hypothesis.to_string())
    }

    /// Exhaustive sensitivity scores as a JSON object mapping gate to score.
    #[wasm_bindgen]
    pub fn sensitivity_json(&self) -> Result<String, JsValue> {
        let space = InputSpace::exhaustive(&self.circuit).map_err(to_js)?;
        let report = analyze_sensitivity(&self.circuit, &space).map_err(to_js)?;
        serde_json::to_string(&report.to_map()).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
