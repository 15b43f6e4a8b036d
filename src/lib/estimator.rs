use crate::config::EstimatorConfig;
use crate::error::EstimatorError;
use crate::histogram::Histogram;
use crate::kde::{DensityGrid, GaussianKde};
use crate::model::Beta;
use crate::summary::DifferenceSummary;
use itertools::Itertools;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Distribution;
use serde::Serialize;
use std::time::Instant;

/// What happened to the optional density step
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum DensityOutcome {
    NotRequested,
    Estimated(DensityGrid),
    /// Numeric instability in the density step, the rest of the result is still valid
    Skipped(EstimatorError),
}

impl DensityOutcome {
    pub fn grid(&self) -> Option<&DensityGrid> {
        match self {
            DensityOutcome::Estimated(grid) => Some(grid),
            _ => None,
        }
    }
}

/// Result of one estimation run
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PosteriorDifference {
    /// Configuration the run was made with
    pub config: EstimatorConfig,
    pub posterior_a: Beta,
    pub posterior_b: Beta,
    /// `100 * (pB[i] - pA[i])`, percentage points
    pub difference: Vec<f64>,
    /// Fraction of `difference` strictly above zero
    pub win_probability: f64,
    pub density: DensityOutcome,
    pub histogram: Option<Histogram>,
    pub summary: DifferenceSummary,
}

fn validate(config: &EstimatorConfig) -> Result<(), EstimatorError> {
    config.trial_a.validate("trial_a")?;
    config.trial_b.validate("trial_b")?;
    config.prior_a.validate("prior_a")?;
    config.prior_b.validate("prior_b")?;
    if config.sample_count < 1 {
        return Err(EstimatorError::DegenerateSample {
            sample_count: config.sample_count,
        });
    }
    if let Some(density) = &config.density {
        density.validate()?;
    }
    if let Some(histogram) = &config.histogram {
        histogram.validate()?;
    }
    Ok(())
}

/// Run the estimator with a random source built from `config.seed`
pub fn estimate(config: &EstimatorConfig) -> Result<PosteriorDifference, EstimatorError> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    estimate_with_rng(config, &mut rng)
}

/// Run the estimator drawing from a caller-owned random source
pub fn estimate_with_rng<R: Rng + ?Sized>(
    config: &EstimatorConfig,
    rng: &mut R,
) -> Result<PosteriorDifference, EstimatorError> {
    let timer = Instant::now();
    validate(config)?;
    info!(
        "Estimating posterior difference from {} simulations",
        config.sample_count
    );

    let posterior_a = config.prior_a.posterior(&config.trial_a);
    let posterior_b = config.prior_b.posterior(&config.trial_b);

    let sample_a = draw_samples(&posterior_a, config.sample_count, rng)?;
    let sample_b = draw_samples(&posterior_b, config.sample_count, rng)?;
    let difference = difference(&sample_a, &sample_b);
    let win_probability = win_probability(&difference);
    info!(
        "Probability that B has a higher conversion than A: {:.4}",
        win_probability
    );

    let density = match &config.density {
        None => DensityOutcome::NotRequested,
        Some(density_config) => {
            match GaussianKde::fit(&difference)
                .and_then(|kde| kde.grid(density_config.points_per_unit))
            {
                Ok(grid) => DensityOutcome::Estimated(grid),
                Err(e @ EstimatorError::NumericInstability { .. }) => {
                    warn!("Skipping density estimate: {}", e);
                    DensityOutcome::Skipped(e)
                }
                Err(e) => return Err(e),
            }
        }
    };

    let histogram = config
        .histogram
        .as_ref()
        .map(|histogram_config| Histogram::from_samples(&difference, histogram_config))
        .transpose()?;

    let summary = DifferenceSummary::new(
        &difference,
        (&config.trial_a, &config.trial_b),
        (&posterior_a, &posterior_b),
    )?;
    debug!(
        "Mean lift: {:.3} pp, 95% interval: [{:.3}, {:.3}]",
        summary.mean_lift, summary.credible_interval.0, summary.credible_interval.1
    );
    info!("Finished estimation in {:?}", timer.elapsed());

    Ok(PosteriorDifference {
        config: config.clone(),
        posterior_a,
        posterior_b,
        difference,
        win_probability,
        density,
        histogram,
        summary,
    })
}

/// `count` independent draws from `posterior`
pub fn draw_samples<R: Rng + ?Sized>(
    posterior: &Beta,
    count: usize,
    rng: &mut R,
) -> Result<Vec<f64>, EstimatorError> {
    let sampler = posterior.sampler()?;
    Ok((0..count).map(|_| sampler.sample(rng)).collect())
}

/// Elementwise `100 * (b - a)`. Panics if the samples differ in length.
pub fn difference(sample_a: &[f64], sample_b: &[f64]) -> Vec<f64> {
    sample_a
        .iter()
        .zip_eq(sample_b.iter())
        .map(|(a, b)| 100.0 * (b - a))
        .collect()
}

pub fn win_probability(difference: &[f64]) -> f64 {
    if difference.is_empty() {
        return 0.0;
    }
    difference.iter().filter(|&&d| d > 0.0).count() as f64 / difference.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DensityConfig, HistogramConfig};
    use crate::trial::Trial;
    use rand::RngCore;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn small_config(sample_count: usize) -> EstimatorConfig {
        EstimatorConfig::default()
            .with_sample_count(sample_count)
            .with_density(Some(DensityConfig { points_per_unit: 10 }))
    }

    #[test]
    fn test_default_scenario() {
        init_logging();
        let config = EstimatorConfig::default().with_density(None);
        let result = estimate(&config).unwrap();
        assert_eq!(result.posterior_a, Beta::new(301.0, 701.0));
        assert_eq!(result.posterior_b, Beta::new(341.0, 661.0));
        assert_eq!(result.difference.len(), 50_000);
        // 34% vs 30%, analytic P(B > A) is about 0.97
        assert!(result.win_probability > 0.90, "p = {}", result.win_probability);
        assert!(result.win_probability < 0.995, "p = {}", result.win_probability);
        assert!((result.summary.mean_lift - 3.99).abs() < 0.1);
        assert_eq!(result.density, DensityOutcome::NotRequested);
        let histogram = result.histogram.unwrap();
        assert!(histogram.total() <= 50_000);
        assert!(histogram.total() > 49_000);
    }

    #[test]
    fn test_reproducible_with_seed() {
        let config = small_config(2_000);
        let first = estimate(&config).unwrap();
        let second = estimate(&config).unwrap();
        assert_eq!(first.difference, second.difference);
        assert_eq!(first.win_probability, second.win_probability);
        assert_eq!(first, second);

        let other = estimate(&config.clone().with_seed(Some(48))).unwrap();
        assert_ne!(first.difference, other.difference);
    }

    #[test]
    fn test_caller_owned_rng() {
        let config = small_config(500);
        let mut rng = StdRng::seed_from_u64(47);
        let from_rng = estimate_with_rng(&config, &mut rng).unwrap();
        let from_seed = estimate(&config).unwrap();
        assert_eq!(from_rng.difference, from_seed.difference);

        // The same rng continues its stream on the next run
        let next = estimate_with_rng(&config, &mut rng).unwrap();
        assert_ne!(from_rng.difference, next.difference);
    }

    #[test]
    fn test_unseeded_run() {
        let config = small_config(200).with_seed(None);
        let result = estimate(&config).unwrap();
        assert_eq!(result.difference.len(), 200);
        assert!((0.0..=1.0).contains(&result.win_probability));
    }

    #[test]
    fn test_symmetric_inputs() {
        let sample_count = 40_000;
        let config = EstimatorConfig::new(Trial::new(120, 400), Trial::new(120, 400))
            .with_sample_count(sample_count)
            .with_density(None)
            .with_histogram(None);
        let result = estimate(&config).unwrap();
        // Four standard errors of a fair coin fraction
        let tolerance = 4.0 * 0.5 / (sample_count as f64).sqrt();
        assert!(
            (result.win_probability - 0.5).abs() < tolerance,
            "p = {}",
            result.win_probability
        );
        assert!(result.histogram.is_none());
    }

    #[test]
    fn test_win_probability_bounds() {
        for (xa, na, xb, nb) in [(0, 1, 1, 1), (1, 1, 0, 1), (0, 10, 0, 10), (999, 1000, 1, 1000)] {
            let config = EstimatorConfig::new(Trial::new(xa, na), Trial::new(xb, nb))
                .with_sample_count(1_000)
                .with_density(None);
            let result = estimate(&config).unwrap();
            assert!((0.0..=1.0).contains(&result.win_probability));
        }
        // B is overwhelmingly worse
        let config = EstimatorConfig::new(Trial::new(999, 1000), Trial::new(1, 1000))
            .with_sample_count(1_000)
            .with_density(None);
        assert_eq!(estimate(&config).unwrap().win_probability, 0.0);
    }

    #[test]
    fn test_density_grid() {
        let result = estimate(&small_config(5_000)).unwrap();
        let grid = result.density.grid().unwrap();
        let area = grid.integrate();
        assert!((area - 1.0).abs() < 0.02, "area = {area}");
        let low = result.summary.min.floor();
        let high = result.summary.max.ceil();
        assert_eq!(grid.points.first().unwrap().x, low);
        assert_eq!(grid.len(), 1 + 10 * (high - low) as usize);
        // Smoothed mass above zero follows the empirical win probability
        assert!((grid.non_negative_mass() - result.win_probability).abs() < 0.02);
    }

    #[test]
    fn test_density_skipped_for_single_sample() {
        init_logging();
        let result = estimate(&small_config(1)).unwrap();
        assert_eq!(result.difference.len(), 1);
        assert!(result.win_probability == 0.0 || result.win_probability == 1.0);
        assert!(matches!(
            result.density,
            DensityOutcome::Skipped(EstimatorError::NumericInstability { .. })
        ));
        assert!(result.density.grid().is_none());
    }

    #[test]
    fn test_invalid_inputs() {
        let config = EstimatorConfig::new(Trial::new(11, 10), Trial::new(3, 10));
        assert!(matches!(
            estimate(&config),
            Err(EstimatorError::InvalidInput { field: "trial_a", .. })
        ));
        let config = EstimatorConfig::new(Trial::new(1, 10), Trial::new(0, 0));
        assert!(matches!(
            estimate(&config),
            Err(EstimatorError::InvalidInput { field: "trial_b", .. })
        ));
        let config = EstimatorConfig::default().with_priors(Beta::new(0.0, 1.0), Beta::default());
        assert!(matches!(
            estimate(&config),
            Err(EstimatorError::InvalidInput { field: "prior_a", .. })
        ));
        let config = EstimatorConfig::default().with_priors(Beta::default(), Beta::new(1.0, -0.5));
        assert!(matches!(
            estimate(&config),
            Err(EstimatorError::InvalidInput { field: "prior_b", .. })
        ));
        let config = EstimatorConfig::default()
            .with_histogram(Some(HistogramConfig { start: 2, end: 1 }))
            .with_sample_count(10);
        assert!(matches!(
            estimate(&config),
            Err(EstimatorError::InvalidInput { field: "histogram", .. })
        ));
    }

    #[test]
    fn test_invalid_density_resolution() {
        for points_per_unit in [0, usize::MAX / 2] {
            let config = EstimatorConfig::default()
                .with_sample_count(100)
                .with_density(Some(DensityConfig { points_per_unit }));
            assert!(matches!(
                estimate(&config),
                Err(EstimatorError::InvalidInput { field: "points_per_unit", .. })
            ));
        }
    }

    #[test]
    fn test_config_rejected_before_sampling() {
        let configs = [
            EstimatorConfig::default().with_density(Some(DensityConfig { points_per_unit: 0 })),
            EstimatorConfig::default().with_histogram(Some(HistogramConfig { start: 2, end: 1 })),
        ];
        for config in configs {
            let mut rng = StdRng::seed_from_u64(47);
            assert!(estimate_with_rng(&config, &mut rng).is_err());
            // No draws were taken from the random source
            let mut fresh = StdRng::seed_from_u64(47);
            assert_eq!(rng.next_u64(), fresh.next_u64());
        }
    }

    #[test]
    fn test_result_keeps_config() {
        let config = small_config(300);
        let result = estimate(&config).unwrap();
        assert_eq!(result.config, config);
        assert_eq!(result.config.sample_count, result.difference.len());
    }

    #[test]
    fn test_degenerate_sample() {
        let config = EstimatorConfig::default().with_sample_count(0);
        assert_eq!(
            estimate(&config),
            Err(EstimatorError::DegenerateSample { sample_count: 0 })
        );
    }

    #[test]
    fn test_difference_and_win_probability() {
        let diff = difference(&[0.30, 0.40, 0.25], &[0.35, 0.40, 0.20]);
        assert_eq!(diff.len(), 3);
        assert!((diff[0] - 5.0).abs() < 1e-9);
        assert_eq!(diff[1], 0.0);
        assert!((diff[2] + 5.0).abs() < 1e-9);
        // Ties do not count as wins
        assert!((win_probability(&diff) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(win_probability(&[]), 0.0);
    }
}
