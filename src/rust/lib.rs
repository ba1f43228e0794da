//! Trains and serves a classifier that assigns comma-separated keyword lists
//! to one of a fixed set of package categories.
//!
//! The pipeline has three stages:
//! 1. [`DatasetBuilder`] turns a `category;keywords` CSV file into a
//!    directory-per-category tree of text files
//! 2. [`Trainer`] learns a multi-hot [`Vectorizer`] and a small dense
//!    network from the training tree, evaluates it on the test tree, and the
//!    result is persisted with [`ModelManager`]
//! 3. [`Classifier`] reloads the artifact and classifies single inputs
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use category_classifier::{pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::default();
//! pipeline::run(&config)?;
//!
//! let prediction = pipeline::predict(&config, "firewall,vpn")?;
//! println!("Predicted category: {}", prediction.label);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod dataset;
pub mod model_manager;
pub mod pipeline;

pub use classifier::{
    Classifier, ClassifierError, ClassifierInfo, Network, Prediction, Splitter, Standardization, Trainer,
    TrainingReport, Vectorizer,
};
pub use config::{PipelineConfig, CATEGORIES, VOCABULARY_SIZE};
pub use dataset::{BuildSummary, DatasetBuilder, DatasetError, LabeledDataset};
pub use model_manager::{ModelArtifact, ModelError, ModelManager};

pub fn init_logger() {
    env_logger::init();
}
