//! End-to-end steps: rebuild the dataset trees, train and persist a model,
//! and classify single inputs against the persisted model.

use anyhow::{Context, Result};

use crate::classifier::{Classifier, Prediction, Trainer, TrainingReport};
use crate::config::PipelineConfig;
use crate::dataset::{self, LabeledDataset};
use crate::model_manager::ModelManager;

/// Rebuilds both dataset trees from their CSV files.
pub fn build_data_trees(config: &PipelineConfig) -> Result<()> {
    dataset::build_data_trees(config).context("Failed to build dataset trees")?;
    Ok(())
}

/// Loads the dataset trees, trains a fresh classifier, evaluates it on the
/// test tree and overwrites the model directory with it.
///
/// The classes are the configured categories, so the output width does not
/// depend on which categories the training tree happens to contain.
pub fn build_model(config: &PipelineConfig) -> Result<TrainingReport> {
    let train = LabeledDataset::from_directory_with_categories(&config.train_dir, &config.categories, config.seed)
        .with_context(|| format!("Failed to load training data from {:?}", config.train_dir))?;
    let test = LabeledDataset::from_directory_with_classes(&config.test_dir, train.class_names(), config.seed)
        .with_context(|| format!("Failed to load test data from {:?}", config.test_dir))?;

    let (classifier, report) = Trainer::new(config).train(&train, &test)?;

    ModelManager::new(&config.model_dir)
        .save(&classifier)
        .with_context(|| format!("Failed to save model to {:?}", config.model_dir))?;
    Ok(report)
}

/// Rebuilds the trees, then trains, evaluates and persists a model.
pub fn run(config: &PipelineConfig) -> Result<TrainingReport> {
    build_data_trees(config)?;
    build_model(config)
}

/// Loads the persisted model and classifies `raw_text`.
pub fn predict(config: &PipelineConfig, raw_text: &str) -> Result<Prediction> {
    let classifier = load_classifier(config)?;
    let prediction = classifier.predict(raw_text)?;
    log::info!("Probabilities: {}", prediction.probabilities);
    log::info!("Predicted category: {}", prediction.label);
    Ok(prediction)
}

/// Loads the persisted model for callers that classify many inputs.
pub fn load_classifier(config: &PipelineConfig) -> Result<Classifier> {
    ModelManager::new(&config.model_dir)
        .load()
        .with_context(|| format!("Failed to load model from {:?}", config.model_dir))
}
