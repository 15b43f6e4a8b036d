pub mod annotation;
pub mod config;
pub mod error;
pub mod estimator;
pub mod histogram;
pub mod kde;
pub mod model;
pub mod render;
pub mod summary;
pub mod trial;

pub use config::EstimatorConfig;
pub use error::EstimatorError;
pub use estimator::{DensityOutcome, PosteriorDifference, estimate, estimate_with_rng};
