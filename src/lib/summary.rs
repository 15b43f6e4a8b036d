use crate::error::EstimatorError;
use crate::model::Beta;
use crate::trial::Trial;
use serde::Serialize;
use statrs::statistics::{Data, OrderStatistics, Statistics};

pub const CREDIBLE_LEVEL: f64 = 0.95;

/// Closed-form moments of one variant's posterior conversion rate
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PosteriorSummary {
    pub mean: f64,
    pub std_dev: f64,
    /// Equal-tailed interval holding `CREDIBLE_LEVEL` of the posterior mass
    pub credible_interval: (f64, f64),
}

impl PosteriorSummary {
    pub fn new(posterior: &Beta) -> Result<Self, EstimatorError> {
        Ok(Self {
            mean: posterior.mean(),
            std_dev: posterior.standard_deviation(),
            credible_interval: posterior.credible_interval(CREDIBLE_LEVEL)?,
        })
    }
}

/// Descriptive statistics of the difference sample, in percentage points
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DifferenceSummary {
    pub observed_lift: f64,
    pub mean_lift: f64,
    /// n - 1 standard deviation, NaN for a single sample
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Equal-tailed interval holding `CREDIBLE_LEVEL` of the sample
    pub credible_interval: (f64, f64),
    pub posterior_a: PosteriorSummary,
    pub posterior_b: PosteriorSummary,
}

impl DifferenceSummary {
    pub fn new(
        difference: &[f64],
        trials: (&Trial, &Trial),
        posteriors: (&Beta, &Beta),
    ) -> Result<Self, EstimatorError> {
        let (trial_a, trial_b) = trials;
        let (posterior_a, posterior_b) = posteriors;
        let tail = (1.0 - CREDIBLE_LEVEL) / 2.0;
        let mut data = Data::new(difference.to_vec());
        let credible_interval = (data.quantile(tail), data.quantile(1.0 - tail));
        Ok(Self {
            observed_lift: 100.0 * (trial_b.observed_rate() - trial_a.observed_rate()),
            mean_lift: Statistics::mean(difference),
            std_dev: Statistics::std_dev(difference),
            min: Statistics::min(difference),
            max: Statistics::max(difference),
            credible_interval,
            posterior_a: PosteriorSummary::new(posterior_a)?,
            posterior_b: PosteriorSummary::new(posterior_b)?,
        })
    }
}
