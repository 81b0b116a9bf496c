pub mod config;
pub mod inference_config;
pub mod model_metadata;
pub mod model_storage;

pub use config::{AppConfig, CanvasSettings, ModelSettings};
#[cfg(feature = "ml")]
pub use inference_config::InferenceConfig;
#[cfg(feature = "ml")]
pub use model_metadata::ModelMetadata;
#[cfg(feature = "ml")]
pub use model_storage::{
    load_metadata, load_model_binary, load_model_with_metadata, print_metadata_info,
    save_model_with_metadata,
};
