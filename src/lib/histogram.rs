use crate::config::HistogramConfig;
use crate::error::EstimatorError;
use serde::Serialize;

/// Counts of the difference sample over unit-width bins.
///
/// Bins are half-open `[edge_i, edge_{i+1})` except the last one, which also
/// holds values equal to the final edge. Values outside the edges are dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Histogram {
    pub edges: Vec<i64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn from_samples(
        samples: &[f64],
        config: &HistogramConfig,
    ) -> Result<Self, EstimatorError> {
        config.validate()?;
        let edges: Vec<i64> = (config.start..=config.end).collect();
        let n_bins = edges.len() - 1;
        let (start, end) = (config.start as f64, config.end as f64);

        let mut counts = vec![0usize; n_bins];
        for &value in samples {
            if !(start..=end).contains(&value) {
                continue;
            }
            let bin = ((value - start).floor() as usize).min(n_bins - 1);
            counts[bin] += 1;
        }
        Ok(Self { edges, counts })
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// `(left edge, right edge, count)` for every bin
    pub fn bins(&self) -> impl Iterator<Item = (i64, i64, usize)> + '_ {
        self.edges
            .windows(2)
            .zip(self.counts.iter())
            .map(|(w, &count)| (w[0], w[1], count))
    }
}
