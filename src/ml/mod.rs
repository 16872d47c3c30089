//! Model training, evaluation and full-map classification

pub mod classify;
pub mod evaluate;
pub mod forest;

// Re-export main types
pub use classify::{ClassifiedRaster, MapClassifier};
pub use evaluate::{ConfusionMatrix, Evaluator};
pub use forest::{RandomForestModel, RandomForestParams, RandomForestTrainer};
