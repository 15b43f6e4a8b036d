use crate::config::MAX_GRID_POINTS;
use crate::error::EstimatorError;
use log::debug;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::f64::consts::PI;

/// One evaluated grid point of the density estimate
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DensityPoint {
    pub x: f64,
    pub density: f64,
    /// `x >= 0`, selects the fill colour when rendering
    pub non_negative: bool,
}

/// Density estimate evaluated on an evenly spaced grid, sorted by `x`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DensityGrid {
    pub bandwidth: f64,
    pub points: Vec<DensityPoint>,
}

impl DensityGrid {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Trapezoidal integral over the whole grid
    pub fn integrate(&self) -> f64 {
        trapezoid(&self.points)
    }

    /// Trapezoidal integral over the non-negative part of the grid
    pub fn non_negative_mass(&self) -> f64 {
        let (_, non_negative) = self.split_by_sign();
        trapezoid(non_negative)
    }

    /// Split into the points with `x < 0` and the points with `x >= 0`
    pub fn split_by_sign(&self) -> (&[DensityPoint], &[DensityPoint]) {
        let split = self.points.partition_point(|p| !p.non_negative);
        self.points.split_at(split)
    }
}

fn trapezoid(points: &[DensityPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| (w[1].x - w[0].x) * (w[0].density + w[1].density) / 2.0)
        .sum()
}

/// Gaussian kernel density estimate with bandwidth from Scott's rule
#[derive(Clone, Debug)]
pub struct GaussianKde<'a> {
    samples: &'a [f64],
    bandwidth: f64,
}

impl<'a> GaussianKde<'a> {
    pub fn fit(samples: &'a [f64]) -> Result<Self, EstimatorError> {
        if samples.len() < 2 {
            return Err(EstimatorError::numeric_instability(format!(
                "density estimation needs at least two samples, got {}",
                samples.len()
            )));
        }
        let bandwidth = scott_bandwidth(samples);
        if !bandwidth.is_finite() || bandwidth <= 0.0 {
            return Err(EstimatorError::numeric_instability(format!(
                "sample variance gives an unusable bandwidth ({bandwidth})"
            )));
        }
        debug!(
            "Fitted Gaussian KDE on {} samples, bandwidth: {:.5}",
            samples.len(),
            bandwidth
        );
        Ok(Self { samples, bandwidth })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let h = self.bandwidth;
        let sum: f64 = self
            .samples
            .iter()
            .map(|&s| {
                let z = (x - s) / h;
                (-0.5 * z * z).exp()
            })
            .sum();
        sum / ((2.0 * PI).sqrt() * h * self.samples.len() as f64)
    }

    /// Evaluate on `[floor(min), ceil(max)]` with `points_per_unit` points per unit
    pub fn grid(&self, points_per_unit: usize) -> Result<DensityGrid, EstimatorError> {
        let min: f64 = Statistics::min(self.samples);
        let max: f64 = Statistics::max(self.samples);
        let (low, high) = (min.floor(), max.ceil());
        if !low.is_finite() || !high.is_finite() {
            return Err(EstimatorError::numeric_instability(
                "sample range is not finite",
            ));
        }
        let num = grid_size(points_per_unit, high - low)?;
        let xs = linspace(low, high, num);
        debug!(
            "Evaluating density on {} points over [{}, {}]",
            xs.len(),
            low,
            high
        );
        let points = xs
            .into_iter()
            .map(|x| DensityPoint {
                x,
                density: self.evaluate(x),
                non_negative: x >= 0.0,
            })
            .collect();
        Ok(DensityGrid {
            bandwidth: self.bandwidth,
            points,
        })
    }
}

/// `1 + points_per_unit * span`, bounded by `MAX_GRID_POINTS`
fn grid_size(points_per_unit: usize, span: f64) -> Result<usize, EstimatorError> {
    let too_large = || {
        EstimatorError::invalid_input(
            "points_per_unit",
            format!(
                "{points_per_unit} points per unit over a span of {span} exceeds {MAX_GRID_POINTS} grid points"
            ),
        )
    };
    if points_per_unit < 1 {
        return Err(EstimatorError::invalid_input(
            "points_per_unit",
            "grid resolution must be at least one point per unit",
        ));
    }
    if span > MAX_GRID_POINTS as f64 {
        return Err(too_large());
    }
    points_per_unit
        .checked_mul(span as usize)
        .and_then(|n| n.checked_add(1))
        .filter(|&n| n <= MAX_GRID_POINTS)
        .ok_or_else(too_large)
}

/// Scott's rule, `std_dev * n^(-1/5)` with the n - 1 standard deviation
pub fn scott_bandwidth(samples: &[f64]) -> f64 {
    let n = samples.len() as f64;
    let std_dev: f64 = Statistics::std_dev(samples);
    std_dev * n.powf(-0.2)
}

/// `num` evenly spaced values from `start` to `end`, both included
fn linspace(start: f64, end: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let span = end - start;
            let div = (num - 1) as f64;
            (0..num).map(|i| start + span * i as f64 / div).collect()
        }
    }
}
