use std::collections::{BTreeMap, HashMap};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;

/// Standardization applied to the whole input string before splitting.
///
/// Serialized by name with the vectorizer so a loaded artifact always
/// applies the rule it was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Standardization {
    /// Lowercase, then strip leading and trailing whitespace
    LowerAndStrip,
}

impl Standardization {
    pub fn apply(&self, text: &str) -> String {
        match self {
            Self::LowerAndStrip => text.to_lowercase().trim().to_string(),
        }
    }
}

/// Rule turning a standardized string into tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Splitter {
    /// Split on every occurrence of the separator character
    Separator(char),
}

impl Splitter {
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        match self {
            Self::Separator(sep) => text.split(*sep).collect(),
        }
    }
}

/// Learns a vocabulary from keyword lists and encodes text as multi-hot
/// vectors over it.
///
/// Text goes through three steps, identically at fit and transform time:
/// 1. Standardize (lowercase, strip surrounding whitespace)
/// 2. Split on commas
/// 3. Set index `i` to 1.0 when vocabulary token `i` is present
///
/// Tokens outside the vocabulary are dropped. The output width is always
/// `max_tokens`, even when fewer tokens were learned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VectorizerState", into = "VectorizerState")]
pub struct Vectorizer {
    standardization: Standardization,
    splitter: Splitter,
    max_tokens: usize,
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
}

#[derive(Serialize, Deserialize)]
struct VectorizerState {
    standardization: Standardization,
    splitter: Splitter,
    max_tokens: usize,
    vocabulary: Vec<String>,
}

impl TryFrom<VectorizerState> for Vectorizer {
    type Error = ClassifierError;

    fn try_from(state: VectorizerState) -> Result<Self, Self::Error> {
        Self::from_vocabulary(state.standardization, state.splitter, state.max_tokens, state.vocabulary)
    }
}

impl From<Vectorizer> for VectorizerState {
    fn from(v: Vectorizer) -> Self {
        Self {
            standardization: v.standardization,
            splitter: v.splitter,
            max_tokens: v.max_tokens,
            vocabulary: v.vocabulary,
        }
    }
}

impl Vectorizer {
    /// Fits a vectorizer on `texts`.
    ///
    /// Tokens are ranked by how often they occur across all texts, ties
    /// broken alphabetically, and the first `max_tokens` are kept.
    pub fn adapt<S: AsRef<str>>(texts: &[S], max_tokens: usize) -> Result<Self, ClassifierError> {
        if max_tokens == 0 {
            return Err(ClassifierError::VectorizerError("max_tokens must be greater than 0".into()));
        }
        if texts.is_empty() {
            return Err(ClassifierError::VectorizerError("Cannot adapt on an empty corpus".into()));
        }

        let standardization = Standardization::LowerAndStrip;
        let splitter = Splitter::Separator(',');

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for text in texts {
            let standardized = standardization.apply(text.as_ref());
            for token in splitter.split(&standardized) {
                *counts.entry(token.to_string()).or_insert(0) += 1;
            }
        }

        // BTreeMap iteration is alphabetical, and the sort is stable.
        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        let vocabulary: Vec<String> = ranked.into_iter().take(max_tokens).map(|(t, _)| t).collect();

        log::info!("Vectorizer adapted on {} texts, vocabulary size {}", texts.len(), vocabulary.len());
        Self::from_vocabulary(standardization, splitter, max_tokens, vocabulary)
    }

    /// Rebuilds a vectorizer from a frozen vocabulary.
    pub fn from_vocabulary(
        standardization: Standardization,
        splitter: Splitter,
        max_tokens: usize,
        vocabulary: Vec<String>,
    ) -> Result<Self, ClassifierError> {
        if vocabulary.len() > max_tokens {
            return Err(ClassifierError::VectorizerError(format!(
                "Vocabulary has {} tokens, max is {}",
                vocabulary.len(),
                max_tokens
            )));
        }
        let mut index = HashMap::with_capacity(vocabulary.len());
        for (i, token) in vocabulary.iter().enumerate() {
            if index.insert(token.clone(), i).is_some() {
                return Err(ClassifierError::VectorizerError(format!("Duplicate vocabulary token '{}'", token)));
            }
        }
        Ok(Self {
            standardization,
            splitter,
            max_tokens,
            vocabulary,
            index,
        })
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Width of the vectors produced by `transform`.
    pub fn output_dim(&self) -> usize {
        self.max_tokens
    }

    pub fn standardize(&self, text: &str) -> String {
        self.standardization.apply(text)
    }

    /// Standardized tokens of `text`, before vocabulary lookup.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let standardized = self.standardize(text);
        self.splitter.split(&standardized).into_iter().map(String::from).collect()
    }

    pub fn transform(&self, text: &str) -> Array1<f32> {
        let mut encoded = Array1::zeros(self.max_tokens);
        for token in self.tokens(text) {
            if let Some(&i) = self.index.get(&token) {
                encoded[i] = 1.0;
            }
        }
        encoded
    }

    /// Encodes every text as one row of a `[texts.len(), max_tokens]` matrix.
    pub fn transform_batch<S: AsRef<str>>(&self, texts: &[S]) -> Array2<f32> {
        let mut batch = Array2::zeros((texts.len(), self.max_tokens));
        for (mut row, text) in batch.rows_mut().into_iter().zip(texts) {
            row.assign(&self.transform(text.as_ref()));
        }
        batch
    }
}
