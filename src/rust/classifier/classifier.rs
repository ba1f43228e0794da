use std::path::Path;

use ndarray::{Array1, Axis};

use super::error::ClassifierError;
use super::model::Network;
use super::utils::argmax;
use super::vectorizer::Vectorizer;
use super::ClassifierInfo;
use crate::model_manager::ModelManager;

/// A trained keyword classifier: the frozen vectorizer, the network and the
/// class names that give meaning to each output index.
///
/// The classifier owns plain data only, so it is `Send + Sync` and can be
/// shared through `Arc`:
/// ```rust,no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use category_classifier::Classifier;
/// use std::sync::Arc;
/// use std::thread;
///
/// let classifier = Arc::new(Classifier::load("model")?);
/// let shared = Arc::clone(&classifier);
/// thread::spawn(move || {
///     shared.predict("prometheus,grafana").unwrap();
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    class_names: Vec<String>,
    vectorizer: Vectorizer,
    network: Network,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

/// Result of classifying one input.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Label with the highest probability
    pub label: String,
    /// Index of `label` in the class list
    pub index: usize,
    /// Probability of every class, in class-list order
    pub probabilities: Array1<f32>,
}

impl Prediction {
    /// Probability of the predicted label.
    pub fn confidence(&self) -> f32 {
        self.probabilities[self.index]
    }
}

impl Classifier {
    /// Assembles a classifier, checking that the vectorizer width matches
    /// the network input and that there is one class name per output.
    pub fn new(class_names: Vec<String>, vectorizer: Vectorizer, network: Network) -> Result<Self, ClassifierError> {
        if vectorizer.output_dim() != network.input_dim() {
            return Err(ClassifierError::ModelError(format!(
                "Vectorizer produces {} features but the network expects {}",
                vectorizer.output_dim(),
                network.input_dim()
            )));
        }
        if class_names.len() != network.output_dim() {
            return Err(ClassifierError::ModelError(format!(
                "{} class names for {} network outputs",
                class_names.len(),
                network.output_dim()
            )));
        }
        Ok(Self {
            class_names,
            vectorizer,
            network,
        })
    }

    /// Loads the artifact stored in `model_dir`.
    pub fn load<P: AsRef<Path>>(model_dir: P) -> Result<Self, ClassifierError> {
        Ok(ModelManager::new(model_dir).load()?)
    }

    /// Writes this classifier to `model_dir`, replacing any previous artifact.
    pub fn save<P: AsRef<Path>>(&self, model_dir: P) -> Result<(), ClassifierError> {
        ModelManager::new(model_dir).save(self)?;
        Ok(())
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn vectorizer(&self) -> &Vectorizer {
        &self.vectorizer
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Returns information about the classifier's configuration
    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            num_classes: self.class_names.len(),
            class_labels: self.class_names.clone(),
            vocabulary_size: self.vectorizer.vocabulary().len(),
            input_dim: self.network.input_dim(),
            hidden_units: self.network.layers().first().map_or(0, |l| l.units()),
        }
    }

    /// Classifies one raw keyword string.
    ///
    /// The text is not validated: an empty string or one made only of
    /// unknown tokens encodes to all zeros and still gets a prediction.
    ///
    /// # Example
    /// ```rust,no_run
    /// # use category_classifier::Classifier;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let classifier = Classifier::load("model")?;
    /// let prediction = classifier.predict("firewall,vpn")?;
    /// println!("{} ({:.2})", prediction.label, prediction.confidence());
    /// # Ok(())
    /// # }
    /// ```
    pub fn predict(&self, text: &str) -> Result<Prediction, ClassifierError> {
        let input = self.vectorizer.transform(text).insert_axis(Axis(0));
        let probabilities = self.network.forward(input.view()).index_axis_move(Axis(0), 0);

        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(ClassifierError::PredictionError(format!(
                "Non-finite probabilities for input '{}'",
                text
            )));
        }

        let index = argmax(probabilities.view());
        Ok(Prediction {
            label: self.class_names[index].clone(),
            index,
            probabilities,
        })
    }

    /// Pairs each class name with its probability, most likely first.
    pub fn ranked_scores(&self, prediction: &Prediction) -> Vec<(String, f32)> {
        let mut scores: Vec<(String, f32)> = self
            .class_names
            .iter()
            .cloned()
            .zip(prediction.probabilities.iter().cloned())
            .collect();
        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn untrained() -> Classifier {
        let vectorizer = Vectorizer::adapt(&["firewall,vpn", "disk,raid"], 16).unwrap();
        let network = Network::new(16, 4, 3, 11);
        let classes = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        Classifier::new(classes, vectorizer, network).unwrap()
    }

    #[test]
    fn test_prediction_is_distribution() {
        let classifier = untrained();
        let prediction = classifier.predict("firewall,vpn").unwrap();
        assert_eq!(prediction.probabilities.len(), 3);
        assert!((prediction.probabilities.sum() - 1.0).abs() < 1e-5);
        assert!(prediction.probabilities.iter().all(|&p| p >= 0.0));
        assert_eq!(prediction.label, classifier.class_names()[prediction.index]);
    }

    #[test]
    fn test_empty_input_still_predicts() {
        let classifier = untrained();
        let prediction = classifier.predict("").unwrap();
        // All-zero input with zero biases gives a uniform distribution.
        for &p in prediction.probabilities.iter() {
            assert!((p - 1.0 / 3.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_repeated_prediction_identical() {
        let classifier = untrained();
        let first = classifier.predict("disk,raid,vpn").unwrap();
        let second = classifier.predict("disk,raid,vpn").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let vectorizer = Vectorizer::adapt(&["a,b"], 8).unwrap();
        let network = Network::new(16, 4, 2, 0);
        let result = Classifier::new(vec!["x".into(), "y".into()], vectorizer.clone(), network);
        assert!(matches!(result, Err(ClassifierError::ModelError(_))));

        let network = Network::new(8, 4, 2, 0);
        let result = Classifier::new(vec!["x".into()], vectorizer, network);
        assert!(matches!(result, Err(ClassifierError::ModelError(_))));
    }

    #[test]
    fn test_ranked_scores_sorted() {
        let classifier = untrained();
        let prediction = classifier.predict("vpn").unwrap();
        let scores = classifier.ranked_scores(&prediction);
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[0].0, prediction.label);
        assert!(scores.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn test_info() {
        let info = untrained().info();
        assert_eq!(info.num_classes, 3);
        assert_eq!(info.input_dim, 16);
        assert_eq!(info.hidden_units, 4);
        assert_eq!(info.vocabulary_size, 4);
    }
}
