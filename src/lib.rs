//! Churn Scoring Pipeline Library
//!
//! Scores a bank customer's probability of attrition and turns it into a
//! retention risk tier and recommended action.

pub mod config;
pub mod consumer;
pub mod error;
pub mod feature_engineer;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod producer;
pub mod risk;
pub mod types;
pub mod validator;
pub mod worker;

pub use config::AppConfig;
pub use consumer::RequestConsumer;
pub use error::{ErrorKind, InferenceError};
pub use feature_engineer::{FeatureEngineer, FeatureVector};
pub use models::{Classifier, ModelLoader, OnnxClassifier};
pub use pipeline::InferenceOrchestrator;
pub use producer::ResponsePublisher;
pub use risk::{ChurnStatus, RiskClassifier, RiskTier};
pub use types::{CustomerProfile, PredictionResult, ScoringResponse};
pub use validator::ProfileValidator;
pub use worker::WorkerPool;
