//! Type definitions for the churn scoring pipeline

pub mod prediction;
pub mod profile;

pub use prediction::{PredictionResult, ScoringResponse};
pub use profile::CustomerProfile;
