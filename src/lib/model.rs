use crate::error::EstimatorError;
use crate::trial::Trial;
use log::debug;
use rand_distr::Beta as BetaSampler;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Beta as BetaDistribution, ContinuousCDF};

/// Beta distribution shape parameters, used both as prior and posterior
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Beta {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for Beta {
    /// Uniform prior, alpha=1.0, beta=1.0
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 1.0,
        }
    }
}

impl Beta {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    pub fn validate(&self, field: &'static str) -> Result<(), EstimatorError> {
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(EstimatorError::invalid_input(
                field,
                format!("alpha must be positive and finite, got {}", self.alpha),
            ));
        }
        if !(self.beta.is_finite() && self.beta > 0.0) {
            return Err(EstimatorError::invalid_input(
                field,
                format!("beta must be positive and finite, got {}", self.beta),
            ));
        }
        Ok(())
    }

    /// Conjugate update with the successes and failures of `trial`
    pub fn posterior(&self, trial: &Trial) -> Self {
        let posterior = Self {
            alpha: self.alpha + trial.successes as f64,
            beta: self.beta + trial.failures() as f64,
        };
        debug!(
            "Posterior: α = {:.3}, β = {:.3}, mean: {:.4}",
            posterior.alpha,
            posterior.beta,
            posterior.mean()
        );
        posterior
    }

    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    pub fn standard_deviation(&self) -> f64 {
        let total = self.alpha + self.beta;
        (self.alpha * self.beta / (total * total * (total + 1.0))).sqrt()
    }

    /// Equal-tailed credible interval holding `level` of the mass
    pub fn credible_interval(&self, level: f64) -> Result<(f64, f64), EstimatorError> {
        if !(level > 0.0 && level < 1.0) {
            return Err(EstimatorError::invalid_input(
                "level",
                format!("credible level must lie in (0, 1), got {level}"),
            ));
        }
        let dist = BetaDistribution::new(self.alpha, self.beta)
            .map_err(|e| EstimatorError::numeric_instability(e.to_string()))?;
        let tail = (1.0 - level) / 2.0;
        Ok((dist.inverse_cdf(tail), dist.inverse_cdf(1.0 - tail)))
    }

    pub fn sampler(&self) -> Result<BetaSampler<f64>, EstimatorError> {
        BetaSampler::new(self.alpha, self.beta).map_err(|e| {
            EstimatorError::numeric_instability(format!(
                "cannot sample Beta({}, {}): {}",
                self.alpha, self.beta, e
            ))
        })
    }
}
