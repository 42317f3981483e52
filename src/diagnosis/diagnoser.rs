//! Sequential Bayesian update over stuck-at hypotheses.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, warn};

use super::distribution::{LikelihoodModel, PosteriorDistribution, Prior};
use super::hypothesis::{FaultHypothesis, Observation};
use crate::circuit::Circuit;
use crate::error::{GateDiagError, Result};
use crate::sim::{Evaluator, FaultSpec};

/// Below this total the posterior mass is treated as zero.
const UNDERFLOW_THRESHOLD: f64 = f64::MIN_POSITIVE;

/// Smallest probability a tracked hypothesis may hold after an update.
const PROBABILITY_FLOOR: f64 = f64::MIN_POSITIVE;

/// Maintains a posterior over a fixed set of fault hypotheses.
///
/// Each [`update`](Self::update) simulates every hypothesis on the
/// observation's inputs, weights it by the [`LikelihoodModel`], and
/// renormalizes. Updates are one-way; a failed update leaves the posterior
/// exactly as it was.
#[derive(Debug, Clone)]
pub struct BayesianDiagnoser<'c> {
    evaluator: Evaluator<'c>,
    model: LikelihoodModel,
    /// Resolved faults, in the same order as the posterior's keys
    faults: Vec<FaultSpec>,
    posterior: PosteriorDistribution,
    observations: usize,
}

impl<'c> BayesianDiagnoser<'c> {
    /// Create a diagnoser with the default likelihood model.
    pub fn new(circuit: &'c Circuit, prior: Prior) -> Result<Self> {
        Self::with_model(circuit, prior, LikelihoodModel::default())
    }

    /// Create a diagnoser with a custom likelihood model.
    ///
    /// Every hypothesis must name a gate of `circuit`.
    pub fn with_model(circuit: &'c Circuit, prior: Prior, model: LikelihoodModel) -> Result<Self> {
        model.validate()?;
        let faults = prior
            .iter()
            .map(|(hypothesis, _)| hypothesis.to_fault(circuit))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            hypotheses = faults.len(),
            match_weight = model.match_weight,
            mismatch_weight = model.mismatch_weight,
            "created diagnoser"
        );

        Ok(Self {
            evaluator: Evaluator::new(circuit),
            model,
            faults,
            posterior: PosteriorDistribution::from_prior(prior),
            observations: 0,
        })
    }

    /// Current posterior.
    pub fn posterior(&self) -> &PosteriorDistribution {
        &self.posterior
    }

    pub fn into_posterior(self) -> PosteriorDistribution {
        self.posterior
    }

    pub fn model(&self) -> LikelihoodModel {
        self.model
    }

    /// Number of observations successfully applied.
    pub fn observations_seen(&self) -> usize {
        self.observations
    }

    /// Incorporate one observation and return the new posterior.
    ///
    /// Fails with [`GateDiagError::LikelihoodUnderflow`] if the weighted
    /// mass underflows to zero; on any error the posterior is left
    /// untouched. Probabilities that would underflow are floored at
    /// [`f64::MIN_POSITIVE`] and the distribution renormalized, so every
    /// hypothesis stays strictly positive.
    pub fn update(&mut self, observation: &Observation) -> Result<&PosteriorDistribution> {
        let likelihoods = self.likelihoods(observation)?;

        let weighted: Vec<f64> = self
            .posterior
            .iter()
            .zip(&likelihoods)
            .map(|((_, p), l)| p * l)
            .collect();
        let total: f64 = weighted.iter().sum();

        if !total.is_finite() || total < UNDERFLOW_THRESHOLD {
            warn!(total, observation = %observation.assignment, "posterior mass underflow");
            return Err(GateDiagError::LikelihoodUnderflow {
                observations: self.observations + 1,
                total,
            });
        }

        let mut normalized: Vec<f64> = weighted.iter().map(|w| (w / total).max(PROBABILITY_FLOOR)).collect();
        let clamped_total: f64 = normalized.iter().sum();
        if clamped_total != 1.0 {
            for p in &mut normalized {
                *p = (*p / clamped_total).max(PROBABILITY_FLOOR);
            }
        }

        for (slot, value) in self.posterior.values_mut().zip(normalized) {
            *slot = value;
        }
        self.observations += 1;

        debug!(
            observation = %observation.assignment,
            observed = %observation.observed,
            total,
            "posterior updated"
        );

        Ok(&self.posterior)
    }

    /// Apply observations in order, stopping at the first failure.
    pub fn update_all<'o, I>(&mut self, observations: I) -> Result<&PosteriorDistribution>
    where
        I: IntoIterator<Item = &'o Observation>,
    {
        for observation in observations {
            self.update(observation)?;
        }
        Ok(&self.posterior)
    }

    /// Likelihood of `observation` under every hypothesis, in key order.
    fn likelihoods(&self, observation: &Observation) -> Result<Vec<f64>> {
        let score = |fault: &FaultSpec| -> Result<f64> {
            let predicted = self.evaluator.output(&observation.assignment, Some(*fault))?;
            Ok(self.model.likelihood(predicted == observation.observed))
        };

        #[cfg(feature = "parallel")]
        {
            self.faults.par_iter().map(score).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.faults.iter().map(score).collect()
        }
    }

    /// Hypotheses tracked by this diagnoser.
    pub fn hypotheses(&self) -> impl Iterator<Item = &FaultHypothesis> {
        self.posterior.iter().map(|(h, _)| h)
    }
}

/// Run `observations` through a fresh diagnoser and return the posterior.
pub fn diagnose(
    circuit: &Circuit,
    prior: Prior,
    observations: &[Observation],
    model: LikelihoodModel,
) -> Result<PosteriorDistribution> {
    let mut diagnoser = BayesianDiagnoser::with_model(circuit, prior, model)?;
    diagnoser.update_all(observations)?;
    Ok(diagnoser.into_posterior())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{reference_circuit, Bit};
    use crate::sim::InputAssignment;
    use approx::assert_relative_eq;
    use Bit::{One, Zero};

    fn h(s: &str) -> FaultHypothesis {
        s.parse().unwrap()
    }

    fn obs(a: Bit, b: Bit, z: Bit) -> Observation {
        Observation::new(InputAssignment::new().with("A", a).with("B", b), z)
    }

    fn four_way_prior() -> Prior {
        Prior::new(["X_0", "X_1", "Y_0", "Y_1"].map(|s| (h(s), 0.25))).unwrap()
    }

    #[test]
    fn test_reference_diagnosis() {
        let circuit = reference_circuit();
        let mut diagnoser = BayesianDiagnoser::new(&circuit, four_way_prior()).unwrap();
        let posterior = diagnoser.update(&obs(One, One, Zero)).unwrap();

        assert_relative_eq!(posterior.probability("X_0").unwrap(), 0.25 / 0.2575, epsilon = 1e-12);
        assert_relative_eq!(posterior.probability("X_0").unwrap(), 0.9706, epsilon = 1e-4);
        for other in ["X_1", "Y_0", "Y_1"] {
            assert_relative_eq!(posterior.probability(other).unwrap(), 0.0098, epsilon = 1e-4);
        }
        assert_eq!(posterior.most_likely().unwrap().0, &h("X_0"));
        assert_eq!(diagnoser.observations_seen(), 1);
    }

    #[test]
    fn test_normalization_invariant() {
        let circuit = reference_circuit();
        let mut diagnoser = BayesianDiagnoser::new(&circuit, Prior::uniform(&circuit).unwrap()).unwrap();
        let stream = [
            obs(One, One, Zero),
            obs(Zero, Zero, One),
            obs(One, Zero, Zero),
            obs(One, One, Zero),
            obs(Zero, One, One),
        ];
        for o in &stream {
            let posterior = diagnoser.update(o).unwrap();
            assert_relative_eq!(posterior.total(), 1.0, epsilon = 1e-9);
            assert!(posterior.iter().all(|(_, p)| p > 0.0));
        }
    }

    #[test]
    fn test_order_independence() {
        let circuit = reference_circuit();
        let o1 = obs(One, One, Zero);
        let o2 = obs(Zero, Zero, One);
        let model = LikelihoodModel::default();

        let forward = diagnose(&circuit, four_way_prior(), &[o1.clone(), o2.clone()], model).unwrap();
        let backward = diagnose(&circuit, four_way_prior(), &[o2, o1], model).unwrap();

        for (hypothesis, p) in forward.iter() {
            assert_relative_eq!(p, backward.get(hypothesis).unwrap(), epsilon = 1e-12);
        }
        // Y_0 predicts Z=0 for A=0,B=0 and is suppressed further
        assert!(forward.probability("Y_0").unwrap() < forward.probability("X_1").unwrap());
    }

    #[test]
    fn test_underflow_leaves_state_unchanged() {
        let circuit = reference_circuit();
        let prior = Prior::new([(h("X_1"), 0.5), (h("Y_1"), 0.5)]).unwrap();
        let model = LikelihoodModel::new(1.0, 1e-320).unwrap();
        let mut diagnoser = BayesianDiagnoser::with_model(&circuit, prior, model).unwrap();
        let before = diagnoser.posterior().clone();

        // Both hypotheses force Z=1, so Z=0 is explained by neither
        let err = diagnoser.update(&obs(One, Zero, Zero)).unwrap_err();
        assert!(matches!(err, GateDiagError::LikelihoodUnderflow { observations: 1, .. }));
        assert_eq!(diagnoser.posterior(), &before);
        assert_eq!(diagnoser.observations_seen(), 0);
    }

    #[test]
    fn test_missing_input_leaves_state_unchanged() {
        let circuit = reference_circuit();
        let mut diagnoser = BayesianDiagnoser::new(&circuit, four_way_prior()).unwrap();
        let partial = Observation::new(InputAssignment::new().with("A", One), Zero);
        assert!(matches!(
            diagnoser.update(&partial),
            Err(GateDiagError::MissingInputValue { .. })
        ));
        assert_eq!(diagnoser.posterior().probability("X_0"), Some(0.25));
    }

    #[test]
    fn test_unknown_hypothesis_rejected() {
        let circuit = reference_circuit();
        let prior = Prior::new([(h("Q_0"), 0.5), (h("X_1"), 0.5)]).unwrap();
        let err = BayesianDiagnoser::new(&circuit, prior).unwrap_err();
        assert!(matches!(err, GateDiagError::UnknownHypothesis { .. }));
    }

    #[test]
    fn test_posterior_as_next_prior() {
        let circuit = reference_circuit();
        let o1 = obs(One, One, Zero);
        let o2 = obs(Zero, Zero, One);
        let model = LikelihoodModel::default();

        let step = diagnose(&circuit, four_way_prior(), std::slice::from_ref(&o1), model).unwrap();
        let chained = diagnose(&circuit, Prior::from(step), &[o2.clone()], model).unwrap();
        let direct = diagnose(&circuit, four_way_prior(), &[o1, o2], model).unwrap();
        for (hypothesis, p) in direct.iter() {
            assert_relative_eq!(p, chained.get(hypothesis).unwrap(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_long_consistent_stream_stays_positive() {
        let circuit = reference_circuit();
        let stream = vec![obs(One, One, Zero); 200];
        let mut diagnoser = BayesianDiagnoser::new(&circuit, four_way_prior()).unwrap();
        for o in &stream {
            let posterior = diagnoser.update(o).unwrap();
            assert_relative_eq!(posterior.total(), 1.0, epsilon = 1e-9);
            assert!(posterior.iter().all(|(_, p)| p > 0.0));
        }
        assert_eq!(diagnoser.observations_seen(), 200);
        assert_eq!(diagnoser.posterior().most_likely().unwrap().0, &h("X_0"));

        let posterior = diagnose(&circuit, four_way_prior(), &stream, LikelihoodModel::default()).unwrap();
        assert_relative_eq!(posterior.probability("X_0").unwrap(), 1.0, epsilon = 1e-9);
        assert!(posterior.probability("Y_1").unwrap() >= f64::MIN_POSITIVE);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_likelihoods_match_sequential() {
        let circuit = reference_circuit();
        let diagnoser = BayesianDiagnoser::new(&circuit, Prior::uniform(&circuit).unwrap()).unwrap();
        let evaluator = Evaluator::new(&circuit);
        let model = diagnoser.model();
        for o in [obs(One, One, Zero), obs(Zero, Zero, One), obs(One, Zero, One)] {
            let expected: Vec<f64> = diagnoser
                .faults
                .iter()
                .map(|f| model.likelihood(evaluator.output(&o.assignment, Some(*f)).unwrap() == o.observed))
                .collect();
            assert_eq!(diagnoser.likelihoods(&o).unwrap(), expected);
        }
    }
}
