//! Churn classifier contract and its ONNX implementation

pub mod classifier;
pub mod loader;
pub mod onnx;

pub use classifier::Classifier;
pub use loader::ModelLoader;
pub use onnx::OnnxClassifier;
