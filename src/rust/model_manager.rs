use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::classifier::{Classifier, ClassifierError, Network, Vectorizer};

/// Version of the on-disk artifact layout written by this crate.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

const ARTIFACT_FILE: &str = "model.artifact";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("No model found at {0:?}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Hash mismatch: expected {expected}, got {actual} for {path:?}")]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
    #[error("Artifact format version {found} is not supported (expected {expected})")]
    IncompatibleFormat { found: u32, expected: u32 },
    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),
}

impl From<ClassifierError> for ModelError {
    fn from(err: ClassifierError) -> Self {
        ModelError::InvalidArtifact(err.to_string())
    }
}

/// Everything needed to rebuild a classifier: class names, the frozen
/// vectorizer (vocabulary plus its standardization and split rules) and the
/// network weights.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub class_names: Vec<String>,
    pub vectorizer: Vectorizer,
    pub network: Network,
}

impl From<&Classifier> for ModelArtifact {
    fn from(classifier: &Classifier) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            class_names: classifier.class_names().to_vec(),
            vectorizer: classifier.vectorizer().clone(),
            network: classifier.network().clone(),
        }
    }
}

/// Reads and writes the classifier artifact kept in a single model directory.
///
/// The artifact is one file, `model.artifact`: a line holding the hex SHA-256
/// of the payload, followed by the JSON payload. Saving replaces it with a
/// single rename, so the checksum and the payload are always from the same
/// save.
#[derive(Debug, Clone)]
pub struct ModelManager {
    model_dir: PathBuf,
}

impl ModelManager {
    pub fn new<P: AsRef<Path>>(model_dir: P) -> Self {
        Self {
            model_dir: model_dir.as_ref().to_path_buf(),
        }
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    pub fn get_artifact_path(&self) -> PathBuf {
        self.model_dir.join(ARTIFACT_FILE)
    }

    pub fn is_model_saved(&self) -> bool {
        let artifact_path = self.get_artifact_path();
        log::debug!("Checking for saved model:");
        log::debug!("  Artifact path: {:?} (exists: {})", artifact_path, artifact_path.exists());
        artifact_path.is_file()
    }

    /// Serializes `classifier` and replaces the artifact in the model
    /// directory. Returns the artifact's SHA-256.
    pub fn save(&self, classifier: &Classifier) -> Result<String, ModelError> {
        fs::create_dir_all(&self.model_dir)?;

        let payload = serde_json::to_vec(&ModelArtifact::from(classifier))?;
        let hash = sha256_hex(&payload);

        let mut bytes = Vec::with_capacity(hash.len() + 1 + payload.len());
        bytes.extend_from_slice(hash.as_bytes());
        bytes.push(b'\n');
        bytes.extend_from_slice(&payload);

        let artifact_path = self.get_artifact_path();
        log::info!("Writing {} bytes to {:?}", bytes.len(), artifact_path);
        self.write_atomically(&artifact_path, &bytes)?;

        log::info!("Model saved to {:?} (sha256 {})", self.model_dir, hash);
        Ok(hash)
    }

    /// Reads, verifies and rebuilds the saved classifier.
    ///
    /// # Errors
    /// - `NotFound` when no artifact was saved in the model directory
    /// - `HashMismatch` when the artifact does not match its checksum
    /// - `IncompatibleFormat` when it was written by another format version
    /// - `InvalidArtifact` when its parts do not fit together
    pub fn load(&self) -> Result<Classifier, ModelError> {
        if !self.is_model_saved() {
            return Err(ModelError::NotFound(self.model_dir.clone()));
        }

        let artifact_path = self.get_artifact_path();
        let bytes = fs::read(&artifact_path)?;
        let payload = self.verify_bytes(&bytes)?;

        let artifact: ModelArtifact = serde_json::from_slice(payload)?;
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelError::IncompatibleFormat {
                found: artifact.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }

        let classifier = Classifier::new(artifact.class_names, artifact.vectorizer, artifact.network)?;
        log::info!(
            "Loaded model from {:?}: {} classes, vocabulary of {} tokens",
            self.model_dir,
            classifier.class_names().len(),
            classifier.vectorizer().vocabulary().len()
        );
        Ok(classifier)
    }

    /// Returns whether the saved artifact matches its checksum.
    pub fn verify_model(&self) -> Result<bool, ModelError> {
        if !self.is_model_saved() {
            log::info!("No saved model in {:?}", self.model_dir);
            return Ok(false);
        }
        let bytes = fs::read(self.get_artifact_path())?;
        match self.verify_bytes(&bytes) {
            Ok(_) => Ok(true),
            Err(ModelError::HashMismatch { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn remove_model(&self) -> Result<(), ModelError> {
        let path = self.get_artifact_path();
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Checks the artifact against its checksum line and returns the payload.
    fn verify_bytes<'a>(&self, bytes: &'a [u8]) -> Result<&'a [u8], ModelError> {
        let (header, payload) = split_checksum(bytes);
        let expected = String::from_utf8_lossy(header).trim().to_string();
        let actual = sha256_hex(payload);
        log::debug!("Calculated hash: {}", actual);
        log::debug!("Expected hash:   {}", expected);
        if actual != expected {
            log::error!("Model hash mismatch: expected {}, got {}", expected, actual);
            return Err(ModelError::HashMismatch {
                path: self.get_artifact_path(),
                expected,
                actual,
            });
        }
        Ok(payload)
    }

    /// Writes through a temporary file in the model directory so readers
    /// never see a partially written file.
    fn write_atomically(&self, path: &Path, bytes: &[u8]) -> Result<(), ModelError> {
        let mut file = tempfile::NamedTempFile::new_in(&self.model_dir)?;
        file.write_all(bytes)?;
        file.flush()?;
        file.persist(path).map_err(|e| ModelError::IoError(e.error))?;
        Ok(())
    }
}

/// Splits at the first newline. Without one the whole input is payload and the
/// checksum is empty, which never matches.
fn split_checksum(bytes: &[u8]) -> (&[u8], &[u8]) {
    match bytes.iter().position(|&b| b == b'\n') {
        Some(i) => (&bytes[..i], &bytes[i + 1..]),
        None => (&bytes[..0], bytes),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn classifier() -> Classifier {
        let vectorizer = Vectorizer::adapt(&["firewall,vpn", "disk,raid"], 32).unwrap();
        let network = Network::new(32, 4, 2, 5);
        Classifier::new(vec!["6-security".into(), "7-storage".into()], vectorizer, network).unwrap()
    }

    #[test]
    fn test_save_and_load() -> Result<(), ModelError> {
        let dir = tempdir()?;
        let manager = ModelManager::new(dir.path().join("model"));
        assert!(!manager.is_model_saved());

        let original = classifier();
        let hash = manager.save(&original)?;
        assert_eq!(hash.len(), 64);
        assert!(manager.is_model_saved());
        assert!(manager.verify_model()?);

        let loaded = manager.load()?;
        assert_eq!(loaded, original);
        Ok(())
    }

    #[test]
    fn test_missing_model() {
        let manager = ModelManager::new("/nonexistent/model/dir");
        assert!(matches!(manager.load(), Err(ModelError::NotFound(_))));
        assert!(!manager.verify_model().unwrap());
    }

    #[test]
    fn test_corrupted_artifact_detected() -> Result<(), ModelError> {
        let dir = tempdir()?;
        let manager = ModelManager::new(dir.path());
        manager.save(&classifier())?;

        fs::write(manager.get_artifact_path(), "corrupted data")?;
        assert!(!manager.verify_model()?);
        assert!(matches!(manager.load(), Err(ModelError::HashMismatch { .. })));
        Ok(())
    }

    #[test]
    fn test_incompatible_format_version() -> Result<(), ModelError> {
        let dir = tempdir()?;
        let manager = ModelManager::new(dir.path());
        let mut artifact = ModelArtifact::from(&classifier());
        artifact.format_version = 99;
        let payload = serde_json::to_vec(&artifact)?;
        let mut bytes = format!("{}\n", sha256_hex(&payload)).into_bytes();
        bytes.extend_from_slice(&payload);
        fs::write(manager.get_artifact_path(), &bytes)?;

        assert!(matches!(
            manager.load(),
            Err(ModelError::IncompatibleFormat { found: 99, expected: 1 })
        ));
        Ok(())
    }

    #[test]
    fn test_save_overwrites_and_remove() -> Result<(), ModelError> {
        let dir = tempdir()?;
        let manager = ModelManager::new(dir.path());
        let first = manager.save(&classifier())?;

        let vectorizer = Vectorizer::adapt(&["kafka,nats"], 32).unwrap();
        let other = Classifier::new(
            vec!["8-streaming-messaging".into(), "0-unknown".into()],
            vectorizer,
            Network::new(32, 4, 2, 6),
        )
        .unwrap();
        let second = manager.save(&other)?;
        assert_ne!(first, second);
        assert_eq!(manager.load()?, other);

        manager.remove_model()?;
        assert!(!manager.is_model_saved());
        Ok(())
    }

    #[test]
    fn test_artifact_is_a_single_file() -> Result<(), ModelError> {
        let dir = tempdir()?;
        let manager = ModelManager::new(dir.path());
        manager.save(&classifier())?;
        let hash = manager.save(&classifier())?;

        let entries: Vec<PathBuf> = fs::read_dir(dir.path())?.map(|e| e.map(|e| e.path())).collect::<Result<_, _>>()?;
        assert_eq!(entries, vec![manager.get_artifact_path()]);

        let bytes = fs::read(manager.get_artifact_path())?;
        let (header, payload) = split_checksum(&bytes);
        assert_eq!(header, hash.as_bytes());
        assert_eq!(sha256_hex(payload), hash);
        Ok(())
    }

    #[test]
    fn test_tampered_payload_detected() -> Result<(), ModelError> {
        let dir = tempdir()?;
        let manager = ModelManager::new(dir.path());
        manager.save(&classifier())?;

        let mut bytes = fs::read(manager.get_artifact_path())?;
        let last = bytes.len() - 2;
        bytes[last] = if bytes[last] == b'1' { b'2' } else { b'1' };
        fs::write(manager.get_artifact_path(), &bytes)?;

        assert!(!manager.verify_model()?);
        assert!(matches!(manager.load(), Err(ModelError::HashMismatch { .. })));
        Ok(())
    }
}
