mod error;
mod vectorizer;
mod model;
mod optimizer;
mod utils;
pub mod trainer;
#[allow(clippy::module_inception)]
mod classifier;

pub use error::ClassifierError;
pub use vectorizer::{Splitter, Standardization, Vectorizer};
pub use model::{Activation, BatchStats, Dense, Network};
pub use optimizer::RmsProp;
pub use trainer::{EpochStats, Trainer, TrainingReport};
pub use classifier::{Classifier, Prediction};

/// Information about the configuration of a trained classifier
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierInfo {
    /// Number of classes the classifier predicts
    pub num_classes: usize,
    /// Labels of the classes, in output order
    pub class_labels: Vec<String>,
    /// Number of tokens actually learned by the vectorizer
    pub vocabulary_size: usize,
    /// Width of the multi-hot input vectors
    pub input_dim: usize,
    /// Width of the hidden layer
    pub hidden_units: usize,
}
