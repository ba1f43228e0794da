use std::time::Instant;

use ndarray::s;

use super::classifier::Classifier;
use super::error::ClassifierError;
use super::model::Network;
use super::optimizer::RmsProp;
use super::vectorizer::Vectorizer;
use crate::config::PipelineConfig;
use crate::dataset::LabeledDataset;

/// Loss and accuracy over the training set for one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochStats {
    pub epoch: usize,
    pub loss: f32,
    pub accuracy: f32,
}

/// Summary of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub train_examples: usize,
    pub test_examples: usize,
    pub vocabulary_size: usize,
    pub epochs: Vec<EpochStats>,
    pub test_loss: f32,
    pub test_accuracy: f32,
}

/// Fits the vectorizer and the network on a training set, then evaluates the
/// result once on a held-out test set.
#[derive(Debug, Clone)]
pub struct Trainer {
    config: PipelineConfig,
}

impl Trainer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self { config: config.clone() }
    }

    /// Trains a fresh classifier for the configured number of epochs.
    ///
    /// The vocabulary is learned from `train` only. `test` must be labeled
    /// against the same class names as `train`.
    ///
    /// # Errors
    /// - `TrainingError` if either dataset is empty or their classes differ
    /// - `VectorizerError` if the vocabulary cannot be built
    pub fn train(
        &self,
        train: &LabeledDataset,
        test: &LabeledDataset,
    ) -> Result<(Classifier, TrainingReport), ClassifierError> {
        if train.is_empty() || test.is_empty() {
            return Err(ClassifierError::TrainingError("Training and test sets must not be empty".into()));
        }
        if train.class_names() != test.class_names() {
            return Err(ClassifierError::TrainingError(format!(
                "Test classes {:?} differ from training classes {:?}",
                test.class_names(),
                train.class_names()
            )));
        }

        let start = Instant::now();
        let vectorizer = Vectorizer::adapt(train.texts(), self.config.vocabulary_size)?;

        // Vectorized once and reused by every epoch.
        let x_train = vectorizer.transform_batch(train.texts());
        let y_train = train.one_hot_labels();

        let mut network = Network::new(
            vectorizer.output_dim(),
            self.config.hidden_units,
            train.class_names().len(),
            self.config.seed,
        );
        let mut optimizer = RmsProp::new(self.config.learning_rate, network.layers());
        let batch_size = self.config.batch_size.max(1);

        log::info!(
            "Training on {} examples, {} classes, {} epochs, batch size {}",
            train.len(),
            train.class_names().len(),
            self.config.epochs,
            batch_size
        );

        let mut epochs = Vec::with_capacity(self.config.epochs);
        for epoch in 1..=self.config.epochs {
            let mut stats = super::model::BatchStats::default();
            let mut begin = 0;
            while begin < train.len() {
                let end = (begin + batch_size).min(train.len());
                stats.merge(network.train_batch(
                    x_train.slice(s![begin..end, ..]),
                    y_train.slice(s![begin..end, ..]),
                    &mut optimizer,
                ));
                begin = end;
            }
            log::info!(
                "Epoch {}/{} - loss: {:.4} - accuracy: {:.4}",
                epoch,
                self.config.epochs,
                stats.loss(),
                stats.accuracy()
            );
            epochs.push(EpochStats {
                epoch,
                loss: stats.loss(),
                accuracy: stats.accuracy(),
            });
        }

        let x_test = vectorizer.transform_batch(test.texts());
        let y_test = test.one_hot_labels();
        let evaluation = network.evaluate(x_test.view(), y_test.view(), batch_size);
        log::info!(
            "Test loss: {:.4} - test accuracy: {:.3} (trained in {:.2?})",
            evaluation.loss(),
            evaluation.accuracy(),
            start.elapsed()
        );

        let report = TrainingReport {
            train_examples: train.len(),
            test_examples: test.len(),
            vocabulary_size: vectorizer.vocabulary().len(),
            epochs,
            test_loss: evaluation.loss(),
            test_accuracy: evaluation.accuracy(),
        };
        let classifier = Classifier::new(train.class_names().to_vec(), vectorizer, network)?;
        Ok((classifier, report))
    }
}
