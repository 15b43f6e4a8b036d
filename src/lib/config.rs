use crate::error::EstimatorError;
use crate::model::Beta;
use crate::trial::Trial;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SEED: u64 = 47;
pub const DEFAULT_SAMPLE_COUNT: usize = 50_000;
pub const DEFAULT_POINTS_PER_UNIT: usize = 100;
/// Upper bound on density grid points, and on grid points per unit
pub const MAX_GRID_POINTS: usize = 10_000_000;
pub const MAX_HISTOGRAM_BINS: i64 = 1_000_000;

/// Settings for the kernel density step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    /// Grid points per percentage point
    pub points_per_unit: usize,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            points_per_unit: DEFAULT_POINTS_PER_UNIT,
        }
    }
}

impl DensityConfig {
    pub fn validate(&self) -> Result<(), EstimatorError> {
        if !(1..=MAX_GRID_POINTS).contains(&self.points_per_unit) {
            return Err(EstimatorError::invalid_input(
                "points_per_unit",
                format!(
                    "grid resolution must lie in [1, {}], got {}",
                    MAX_GRID_POINTS, self.points_per_unit
                ),
            ));
        }
        Ok(())
    }
}

/// Unit-width histogram bins with edges `start, start + 1, ..., end`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub start: i64,
    pub end: i64,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self { start: -5, end: 12 }
    }
}

impl HistogramConfig {
    pub fn validate(&self) -> Result<(), EstimatorError> {
        match self.end.checked_sub(self.start) {
            Some(bins) if (1..=MAX_HISTOGRAM_BINS).contains(&bins) => Ok(()),
            _ => Err(EstimatorError::invalid_input(
                "histogram",
                format!(
                    "end edge ({}) must exceed start edge ({}) by 1 to {} bins",
                    self.end, self.start, MAX_HISTOGRAM_BINS
                ),
            )),
        }
    }
}

/// Caller-supplied inputs for one estimation run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub trial_a: Trial,
    pub trial_b: Trial,
    pub prior_a: Beta,
    pub prior_b: Beta,
    pub sample_count: usize,
    /// `None` seeds the random source from OS entropy
    pub seed: Option<u64>,
    pub density: Option<DensityConfig>,
    pub histogram: Option<HistogramConfig>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            trial_a: Trial::new(300, 1000),
            trial_b: Trial::new(340, 1000),
            prior_a: Beta::default(),
            prior_b: Beta::default(),
            sample_count: DEFAULT_SAMPLE_COUNT,
            seed: Some(DEFAULT_SEED),
            density: Some(DensityConfig::default()),
            histogram: Some(HistogramConfig::default()),
        }
    }
}

impl EstimatorConfig {
    pub fn new(trial_a: Trial, trial_b: Trial) -> Self {
        Self {
            trial_a,
            trial_b,
            ..Self::default()
        }
    }

    pub fn with_priors(mut self, prior_a: Beta, prior_b: Beta) -> Self {
        self.prior_a = prior_a;
        self.prior_b = prior_b;
        self
    }

    pub fn with_sample_count(mut self, sample_count: usize) -> Self {
        self.sample_count = sample_count;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_density(mut self, density: Option<DensityConfig>) -> Self {
        self.density = density;
        self
    }

    pub fn with_histogram(mut self, histogram: Option<HistogramConfig>) -> Self {
        self.histogram = histogram;
        self
    }

    /// Total number of users across both variants
    pub fn total_users(&self) -> u64 {
        self.trial_a.total.saturating_add(self.trial_b.total)
    }

    /// Parse a (possibly partial) JSON document, missing fields take the defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Error parsing estimator configuration")
    }
}
