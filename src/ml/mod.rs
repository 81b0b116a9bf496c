pub mod inference;
pub mod ml_model;

#[cfg(feature = "ml")]
pub use inference::InferenceEngine;
#[cfg(feature = "ml")]
pub use ml_model::{ModelConfig, SketchCnn};
