//! Persisted model artifact: the frozen vocabulary and fitted model, plus
//! metadata about the run that produced them.
//!
//! File layout: an 8-byte magic tag, a little-endian `u32` format version,
//! the SHA-256 digest of the payload, then the bincode-encoded payload. The
//! digest is checked before the payload is decoded.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::classifier::{Classifier, ClassifierError, LogisticRegression, SolverReport};
use crate::config::TrainingConfig;
use crate::features::Vocabulary;

const MAGIC: &[u8; 8] = b"SHLFSORT";
const DIGEST_LEN: usize = 32;
const HEADER_LEN: usize = MAGIC.len() + 4 + DIGEST_LEN;

/// Artifact format written by this version of the crate.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Encoding error: {0}")]
    EncodingError(#[from] bincode::Error),
    #[error("Not a model artifact (bad header)")]
    BadHeader,
    #[error("Unsupported artifact version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
    #[error("Invalid model: {0}")]
    InvalidModel(#[from] ClassifierError),
}

/// What is known about the run that produced an artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Rows of the augmented corpus the model was fitted on
    pub training_rows: usize,
    /// Configuration of the training run, when one was used
    pub config: Option<TrainingConfig>,
    /// Solver outcome, when available
    pub solver: Option<SolverReport>,
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    metadata: &'a ArtifactMetadata,
    vocabulary: &'a Vocabulary,
    model: &'a LogisticRegression,
}

#[derive(Deserialize)]
struct Payload {
    metadata: ArtifactMetadata,
    vocabulary: Vocabulary,
    model: LogisticRegression,
}

/// A classifier bundled with its metadata, ready to be written to or read
/// from disk. Read-only once created.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    classifier: Classifier,
    metadata: ArtifactMetadata,
}

impl ModelArtifact {
    pub fn new(classifier: Classifier, metadata: ArtifactMetadata) -> Self {
        Self { classifier, metadata }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    pub fn into_classifier(self) -> Classifier {
        self.classifier
    }

    /// Encodes the artifact into its on-disk byte layout.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        let payload = bincode::serialize(&PayloadRef {
            metadata: &self.metadata,
            vocabulary: self.classifier.vocabulary(),
            model: self.classifier.model(),
        })?;

        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&Sha256::digest(&payload));
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    /// Decodes an artifact, checking header, version, and digest first.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let payload = checked_payload(bytes)?;
        let decoded: Payload = bincode::deserialize(payload)?;
        let classifier = Classifier::from_parts(decoded.vocabulary, decoded.model)?;
        Ok(Self {
            classifier,
            metadata: decoded.metadata,
        })
    }

    /// Writes the artifact to `path`, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ArtifactError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            log::info!("Creating parent directory: {:?}", parent);
            fs::create_dir_all(parent)?;
        }
        log::info!("Writing {} bytes to {:?}", bytes.len(), path);
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Reads and validates an artifact from `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        log::info!("Read {} bytes from {:?}", bytes.len(), path);
        let artifact = Self::from_bytes(&bytes)?;
        log::info!(
            "Loaded model artifact: {} classes, {} vocabulary terms",
            artifact.classifier.classes().len(),
            artifact.classifier.vocabulary().len()
        );
        Ok(artifact)
    }

    /// Checks header, version, and digest of the file at `path` without
    /// decoding the payload. Returns `Ok(false)` for a missing or damaged
    /// file; only unexpected IO failures are errors.
    pub fn verify<P: AsRef<Path>>(path: P) -> Result<bool, ArtifactError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("Artifact {:?} does not exist", path);
            return Ok(false);
        }
        let bytes = fs::read(path)?;
        match checked_payload(&bytes) {
            Ok(_) => Ok(true),
            Err(e) => {
                log::warn!("Artifact {:?} failed verification: {}", path, e);
                Ok(false)
            }
        }
    }
}

/// Saves a classifier with empty metadata.
pub fn save_classifier<P: AsRef<Path>>(classifier: &Classifier, path: P) -> Result<(), ArtifactError> {
    ModelArtifact::new(classifier.clone(), ArtifactMetadata::default()).save(path)
}

/// Loads just the classifier from an artifact file.
pub fn load_classifier<P: AsRef<Path>>(path: P) -> Result<Classifier, ArtifactError> {
    ModelArtifact::load(path).map(ModelArtifact::into_classifier)
}

fn checked_payload(bytes: &[u8]) -> Result<&[u8], ArtifactError> {
    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(ArtifactError::BadHeader);
    }
    let (header, payload) = bytes.split_at(HEADER_LEN);

    let mut version = [0u8; 4];
    version.copy_from_slice(&header[MAGIC.len()..MAGIC.len() + 4]);
    let found = u32::from_le_bytes(version);
    if found != FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedVersion {
            found,
            supported: FORMAT_VERSION,
        });
    }

    let expected = to_hex(&header[MAGIC.len() + 4..]);
    let actual = format!("{:x}", Sha256::digest(payload));
    if expected != actual {
        log::error!("Artifact hash mismatch: expected {}, got {}", expected, actual);
        return Err(ArtifactError::HashMismatch { expected, actual });
    }
    Ok(payload)
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
