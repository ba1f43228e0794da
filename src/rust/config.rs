use std::env;
use std::path::{Path, PathBuf};

/// Ordered category labels. The index of a label is its position in the
/// classifier's output vector.
pub const CATEGORIES: [&str; 9] = [
    "0-unknown",
    "1-ai-machine-learning",
    "2-database",
    "3-integration-delivery",
    "4-monitoring-logging",
    "5-networking",
    "6-security",
    "7-storage",
    "8-streaming-messaging",
];

/// Maximum number of tokens kept in the vocabulary, and the width of the
/// multi-hot vectors produced by the vectorizer.
pub const VOCABULARY_SIZE: usize = 2500;

pub const DATA_DIR_ENV: &str = "CATEGORY_CLASSIFIER_DATA";
pub const MODEL_DIR_ENV: &str = "CATEGORY_CLASSIFIER_MODEL";

/// Configuration shared by every stage of the pipeline.
///
/// The defaults reproduce the fixed layout the pipeline has always used:
/// CSV inputs under `data/csv`, generated trees under `data/generated` and
/// the model artifact in `model`.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub train_csv: PathBuf,
    pub test_csv: PathBuf,
    pub train_dir: PathBuf,
    pub test_dir: PathBuf,
    pub model_dir: PathBuf,
    pub vocabulary_size: usize,
    pub hidden_units: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    /// Seed for weight initialization and the one-time shuffle of the
    /// training set.
    pub seed: u64,
    pub categories: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::with_data_root("data", "model")
    }
}

impl PipelineConfig {
    /// Builds a configuration whose CSV inputs and generated trees live under
    /// `data_root`.
    pub fn with_data_root<P: AsRef<Path>, M: AsRef<Path>>(data_root: P, model_dir: M) -> Self {
        let data_root = data_root.as_ref();
        Self {
            train_csv: data_root.join("csv").join("train.csv"),
            test_csv: data_root.join("csv").join("test.csv"),
            train_dir: data_root.join("generated").join("train"),
            test_dir: data_root.join("generated").join("test"),
            model_dir: model_dir.as_ref().to_path_buf(),
            vocabulary_size: VOCABULARY_SIZE,
            hidden_units: 32,
            epochs: 30,
            batch_size: 32,
            learning_rate: 0.001,
            seed: 1337,
            categories: CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Returns the default configuration, relocated by the
    /// `CATEGORY_CLASSIFIER_DATA` and `CATEGORY_CLASSIFIER_MODEL` environment
    /// variables when they are set.
    pub fn from_env() -> Self {
        let data_root = env::var(DATA_DIR_ENV).unwrap_or_else(|_| "data".to_string());
        let model_dir = env::var(MODEL_DIR_ENV).unwrap_or_else(|_| "model".to_string());
        Self::with_data_root(data_root, model_dir)
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_model_dir<P: AsRef<Path>>(mut self, model_dir: P) -> Self {
        self.model_dir = model_dir.as_ref().to_path_buf();
        self
    }

    /// Position of `label` in the configured category list.
    pub fn category_index(&self, label: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == label)
    }
}
