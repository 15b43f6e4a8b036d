use crate::error::EstimatorError;
use serde::{Deserialize, Serialize};

/// Observed conversions for one variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    pub successes: u64,
    pub total: u64,
}

impl Trial {
    pub fn new(successes: u64, total: u64) -> Self {
        Self { successes, total }
    }

    /// Check `0 < total` and `successes <= total`. `field` names the variant in the error.
    pub fn validate(&self, field: &'static str) -> Result<(), EstimatorError> {
        if self.total == 0 {
            return Err(EstimatorError::invalid_input(
                field,
                "total must be positive",
            ));
        }
        if self.successes > self.total {
            return Err(EstimatorError::invalid_input(
                field,
                format!(
                    "successes ({}) exceed total ({})",
                    self.successes, self.total
                ),
            ));
        }
        Ok(())
    }

    pub fn failures(&self) -> u64 {
        self.total.saturating_sub(self.successes)
    }

    pub fn observed_rate(&self) -> f64 {
        self.successes as f64 / self.total as f64
    }
}
