//! Prior and posterior distributions over fault hypotheses, and the
//! likelihood model used to move between them.

use std::collections::BTreeMap;

use serde::Serialize;

use super::hypothesis::FaultHypothesis;
use crate::circuit::Circuit;
use crate::error::{GateDiagError, Result};
use crate::{DEFAULT_MATCH_WEIGHT, DEFAULT_MISMATCH_WEIGHT, PRIOR_SUM_TOLERANCE};

/// Likelihood weights for an observation given a hypothesis.
///
/// A hypothesis whose simulated output matches the observation is weighted
/// by `match_weight`, otherwise by `mismatch_weight`. The mismatch weight
/// models sensor noise and must stay above zero so a single noisy
/// observation never eliminates a hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LikelihoodModel {
    pub match_weight: f64,
    pub mismatch_weight: f64,
}

impl Default for LikelihoodModel {
    fn default() -> Self {
        Self {
            match_weight: DEFAULT_MATCH_WEIGHT,
            mismatch_weight: DEFAULT_MISMATCH_WEIGHT,
        }
    }
}

impl LikelihoodModel {
    /// Create a validated model.
    pub fn new(match_weight: f64, mismatch_weight: f64) -> Result<Self> {
        let model = Self {
            match_weight,
            mismatch_weight,
        };
        model.validate()?;
        Ok(model)
    }

    /// Check `match_weight > mismatch_weight > 0`, both finite.
    pub fn validate(&self) -> Result<()> {
        let fail = |message: &str| GateDiagError::InvalidLikelihood {
            match_weight: self.match_weight,
            mismatch_weight: self.mismatch_weight,
            message: message.to_string(),
        };
        if !self.match_weight.is_finite() || !self.mismatch_weight.is_finite() {
            return Err(fail("weights must be finite"));
        }
        if self.mismatch_weight <= 0.0 {
            return Err(fail("mismatch weight must be greater than zero"));
        }
        if self.match_weight <= self.mismatch_weight {
            return Err(fail("match weight must exceed mismatch weight"));
        }
        Ok(())
    }

    /// Weight for a hypothesis whose prediction did or did not match.
    pub fn likelihood(&self, matched: bool) -> f64 {
        if matched {
            self.match_weight
        } else {
            self.mismatch_weight
        }
    }
}

fn check_entry(hypothesis: &FaultHypothesis, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(GateDiagError::InvalidPrior {
            hypothesis: hypothesis.to_string(),
            value,
        });
    }
    Ok(())
}

fn collect_entries<I>(entries: I) -> Result<BTreeMap<FaultHypothesis, f64>>
where
    I: IntoIterator<Item = (FaultHypothesis, f64)>,
{
    let mut map = BTreeMap::new();
    for (hypothesis, value) in entries {
        check_entry(&hypothesis, value)?;
        // Repeated hypotheses accumulate
        *map.entry(hypothesis).or_insert(0.0) += value;
    }
    if map.is_empty() {
        return Err(GateDiagError::EmptyHypothesisSet);
    }
    Ok(map)
}

/// A validated starting distribution over a fixed set of hypotheses.
///
/// Every probability is strictly positive and the total is 1 within
/// [`PRIOR_SUM_TOLERANCE`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Prior {
    probabilities: BTreeMap<FaultHypothesis, f64>,
}

impl Prior {
    /// Use the given probabilities as-is; they must already sum to 1.
    pub fn new<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (FaultHypothesis, f64)>,
    {
        let probabilities = collect_entries(entries)?;
        let sum: f64 = probabilities.values().sum();
        if (sum - 1.0).abs() > PRIOR_SUM_TOLERANCE {
            return Err(GateDiagError::PriorNotNormalized { sum });
        }
        Ok(Self { probabilities })
    }

    /// Normalize positive raw weights into a prior.
    pub fn from_weights<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (FaultHypothesis, f64)>,
    {
        let mut probabilities = collect_entries(entries)?;
        let sum: f64 = probabilities.values().sum();
        if !sum.is_finite() {
            return Err(GateDiagError::PriorNotNormalized { sum });
        }
        for (hypothesis, value) in probabilities.iter_mut() {
            *value /= sum;
            // Extreme weight ratios can underflow an entry to zero
            check_entry(hypothesis, *value)?;
        }
        Ok(Self { probabilities })
    }

    /// Equal probability for every gate of `circuit` stuck at 0 or 1.
    pub fn uniform(circuit: &Circuit) -> Result<Self> {
        let hypotheses = FaultHypothesis::all_for(circuit);
        if hypotheses.is_empty() {
            return Err(GateDiagError::EmptyHypothesisSet);
        }
        let p = 1.0 / hypotheses.len() as f64;
        Ok(Self {
            probabilities: hypotheses.into_iter().map(|h| (h, p)).collect(),
        })
    }

    pub fn get(&self, hypothesis: &FaultHypothesis) -> Option<f64> {
        self.probabilities.get(hypothesis).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FaultHypothesis, f64)> {
        self.probabilities.iter().map(|(h, p)| (h, *p))
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}

/// A posterior is a valid prior for the next round of evidence.
impl From<PosteriorDistribution> for Prior {
    fn from(posterior: PosteriorDistribution) -> Self {
        Self {
            probabilities: posterior.probabilities,
        }
    }
}

/// Probability of each hypothesis after some number of observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PosteriorDistribution {
    probabilities: BTreeMap<FaultHypothesis, f64>,
}

impl PosteriorDistribution {
    pub(crate) fn from_prior(prior: Prior) -> Self {
        Self {
            probabilities: prior.probabilities,
        }
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut f64> {
        self.probabilities.values_mut()
    }

    pub fn get(&self, hypothesis: &FaultHypothesis) -> Option<f64> {
        self.probabilities.get(hypothesis).copied()
    }

    /// Probability of a hypothesis written as `<gate>_<bit>`.
    pub fn probability(&self, hypothesis: &str) -> Option<f64> {
        let hypothesis: FaultHypothesis = hypothesis.parse().ok()?;
        self.get(&hypothesis)
    }

    /// Hypotheses in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&FaultHypothesis, f64)> {
        self.probabilities.iter().map(|(h, p)| (h, *p))
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// Sum of all probabilities.
    pub fn total(&self) -> f64 {
        self.probabilities.values().sum()
    }

    /// Hypotheses from most to least probable; ties keep key order.
    pub fn ranked(&self) -> Vec<(&FaultHypothesis, f64)> {
        let mut ranked: Vec<_> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// The single most probable hypothesis.
    pub fn most_likely(&self) -> Option<(&FaultHypothesis, f64)> {
        self.ranked().into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{reference_circuit, Bit};
    use approx::assert_relative_eq;

    fn h(s: &str) -> FaultHypothesis {
        s.parse().unwrap()
    }

    #[test]
    fn test_likelihood_validation() {
        assert!(LikelihoodModel::new(1.0, 0.01).is_ok());
        assert!(LikelihoodModel::new(1.0, 0.0).is_err());
        assert!(LikelihoodModel::new(0.5, 0.5).is_err());
        assert!(LikelihoodModel::new(f64::INFINITY, 0.5).is_err());
        let model = LikelihoodModel::default();
        assert_eq!(model.likelihood(true), 1.0);
        assert_eq!(model.likelihood(false), 0.01);
    }

    #[test]
    fn test_prior_must_sum_to_one() {
        let err = Prior::new([(h("X_0"), 0.005), (h("X_1"), 0.005)]).unwrap_err();
        assert!(matches!(err, GateDiagError::PriorNotNormalized { .. }));

        let prior = Prior::from_weights([(h("X_0"), 0.005), (h("X_1"), 0.015)]).unwrap();
        assert_relative_eq!(prior.get(&h("X_0")).unwrap(), 0.25);
        assert_relative_eq!(prior.get(&h("X_1")).unwrap(), 0.75);
    }

    #[test]
    fn test_prior_rejects_bad_entries() {
        assert!(matches!(Prior::new(Vec::<(FaultHypothesis, f64)>::new()), Err(GateDiagError::EmptyHypothesisSet)));
        assert!(matches!(
            Prior::new([(h("X_0"), 1.0), (h("X_1"), 0.0)]),
            Err(GateDiagError::InvalidPrior { .. })
        ));
        assert!(matches!(
            Prior::from_weights([(h("X_0"), f64::NAN)]),
            Err(GateDiagError::InvalidPrior { .. })
        ));
        assert!(matches!(
            Prior::from_weights([(h("X_0"), 1e-300), (h("X_1"), 1e300)]),
            Err(GateDiagError::InvalidPrior { ref hypothesis, value }) if hypothesis == "X_0" && value == 0.0
        ));
    }

    #[test]
    fn test_uniform_prior() {
        let prior = Prior::uniform(&reference_circuit()).unwrap();
        assert_eq!(prior.len(), 6);
        let total: f64 = prior.iter().map(|(_, p)| p).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
        assert_relative_eq!(prior.get(&FaultHypothesis::new("Y", Bit::One)).unwrap(), 1.0 / 6.0);
    }

    #[test]
    fn test_ranked() {
        let prior = Prior::new([(h("X_0"), 0.2), (h("Y_1"), 0.5), (h("Y_0"), 0.3)]).unwrap();
        let posterior = PosteriorDistribution::from_prior(prior);
        let order: Vec<String> = posterior.ranked().iter().map(|(h, _)| h.to_string()).collect();
        assert_eq!(order, vec!["Y_1", "Y_0", "X_0"]);
        assert_eq!(posterior.most_likely().unwrap().0, &h("Y_1"));
        assert_relative_eq!(posterior.probability("Y_0").unwrap(), 0.3);
    }
}
