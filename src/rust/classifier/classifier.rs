use std::collections::HashMap;

use ndarray::Array1;

use super::error::ClassifierError;
use super::model::LogisticRegression;
use super::utils::argmax;
use crate::features::{SparseVector, Vocabulary};
use crate::text::normalize;

/// A fitted product classifier: a frozen vocabulary plus the logistic
/// regression trained on it.
///
/// # Thread Safety
///
/// The classifier is immutable after construction and is `Send + Sync`, so a
/// loaded instance can be shared behind an `Arc` by concurrent readers.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use shelfsort::Classifier;
///
/// let classifier = Classifier::builder()
///     .add_example("whole milk", "Dairy ||| Milk ||| Whole Milk")?
///     .add_example("sourdough bread", "Bakery ||| Bread ||| Sourdough")?
///     .build()?;
///
/// let (label, confidence) = classifier.predict("Whole Milk 1L")?;
/// println!("{} ({:.2})", label, confidence);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    vocabulary: Vocabulary,
    model: LogisticRegression,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    #[allow(dead_code)]
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Pairs a vocabulary with a model fitted on it.
    ///
    /// Fails if the model was fitted on a different number of features.
    pub fn from_parts(
        vocabulary: Vocabulary,
        model: LogisticRegression,
    ) -> Result<Self, ClassifierError> {
        if vocabulary.len() != model.n_features() {
            return Err(ClassifierError::BuildError(format!(
                "Vocabulary has {} terms but the model expects {} features",
                vocabulary.len(),
                model.n_features()
            )));
        }
        Ok(Self { vocabulary, model })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn model(&self) -> &LogisticRegression {
        &self.model
    }

    /// Joined composite labels, in probability-vector order
    pub fn classes(&self) -> &[String] {
        self.model.classes()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            num_classes: self.model.n_classes(),
            class_labels: self.model.classes().to_vec(),
            vocabulary_size: self.vocabulary.len(),
            ngram_range: self.vocabulary.ngram_range(),
        }
    }

    /// Normalizes a raw item name and maps it through the frozen vocabulary.
    pub fn transform(&self, item_name: &str) -> SparseVector {
        self.vocabulary.transform(&normalize(item_name))
    }

    /// Probability of every class for a raw item name, aligned with
    /// [`Classifier::classes`].
    pub fn predict_proba(&self, item_name: &str) -> Result<Array1<f32>, ClassifierError> {
        self.model.predict_proba(&self.transform(item_name))
    }

    /// Predicts the joined composite label of a raw item name together with
    /// its probability.
    ///
    /// Empty or entirely unknown names are valid input; they are scored on
    /// the class priors alone.
    pub fn predict(&self, item_name: &str) -> Result<(String, f32), ClassifierError> {
        let probs = self.predict_proba(item_name)?;
        argmax(&probs)
            .map(|(i, p)| (self.classes()[i].clone(), p))
            .ok_or_else(|| ClassifierError::PredictionError("Classifier has no classes".into()))
    }

    /// Class label to probability map for a raw item name.
    pub fn scores(&self, item_name: &str) -> Result<HashMap<String, f32>, ClassifierError> {
        let probs = self.predict_proba(item_name)?;
        Ok(self.classes().iter().cloned().zip(probs.iter().copied()).collect())
    }
}
