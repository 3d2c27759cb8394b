use log::info;

use super::classifier::Classifier;
use super::error::ClassifierError;
use super::model::{LogisticRegression, SolverReport};
use crate::config::{FeatureConfig, SolverConfig};
use crate::corpus::{CompositeLabel, TrainingCorpus};
use crate::features::VocabularyBuilder;
use crate::text::normalize;

/// A builder that collects labeled training texts and fits a [`Classifier`].
///
/// Fitting happens once, in [`ClassifierBuilder::build`], which consumes the
/// builder. The resulting classifier holds a frozen vocabulary and cannot be
/// re-fitted.
#[derive(Default, Debug)]
pub struct ClassifierBuilder {
    texts: Vec<String>,
    labels: Vec<String>,
    feature_config: FeatureConfig,
    solver_config: SolverConfig,
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use shelfsort::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the n-gram range and vocabulary cap
    pub fn with_feature_config(mut self, config: FeatureConfig) -> Self {
        self.feature_config = config;
        self
    }

    /// Sets the logistic regression solver parameters
    pub fn with_solver_config(mut self, config: SolverConfig) -> Self {
        self.solver_config = config;
        self
    }

    /// Adds one training text with its joined composite label.
    ///
    /// The text is normalized on the way in; normalization is idempotent, so
    /// already-clean corpus text passes through unchanged.
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or
    ///   a `ValidationError` if the label does not split into exactly three
    ///   category levels.
    ///
    /// # Example
    /// ```
    /// use shelfsort::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new()
    ///     .add_example("whole milk 1l", "Dairy ||| Milk ||| Whole Milk");
    /// assert!(builder.is_ok());
    /// ```
    pub fn add_example(
        mut self,
        text: impl AsRef<str>,
        label: impl Into<String>,
    ) -> Result<Self, ClassifierError> {
        let label = label.into();
        CompositeLabel::parse(&label)?;
        self.texts.push(normalize(text.as_ref()));
        self.labels.push(label);
        Ok(self)
    }

    /// Adds every sample of an augmented corpus.
    pub fn add_corpus(mut self, corpus: &TrainingCorpus) -> Result<Self, ClassifierError> {
        self.texts.reserve(corpus.len());
        self.labels.reserve(corpus.len());
        for sample in corpus.samples() {
            self = self.add_example(&sample.text, sample.label.as_str())?;
        }
        Ok(self)
    }

    /// Number of examples collected so far
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Fits the vocabulary and the model and returns the frozen classifier.
    ///
    /// # Returns
    /// * `Result<Classifier, ClassifierError>` - The fitted classifier, or an error if:
    ///   - No examples have been added
    ///   - The examples contain no tokens at all
    ///   - The feature or solver configuration is invalid
    pub fn build(self) -> Result<Classifier, ClassifierError> {
        self.build_with_report().map(|(classifier, _)| classifier)
    }

    /// Like [`ClassifierBuilder::build`], also returning the solver outcome.
    pub fn build_with_report(self) -> Result<(Classifier, SolverReport), ClassifierError> {
        if self.texts.is_empty() {
            return Err(ClassifierError::BuildError(
                "At least one example must be added".to_string(),
            ));
        }
        self.solver_config.validate()?;

        info!("Fitting classifier on {} examples", self.texts.len());
        let vocabulary = VocabularyBuilder::new(self.feature_config).fit(&self.texts)?;
        let features = vocabulary.transform_batch(&self.texts);
        let (model, report) =
            LogisticRegression::fit(&features, &self.labels, vocabulary.len(), &self.solver_config)?;

        let classifier = Classifier::from_parts(vocabulary, model)?;
        Ok((classifier, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder_fails() {
        let result = ClassifierBuilder::new().build();
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_label_validation() {
        assert!(ClassifierBuilder::new().add_example("milk", "Dairy").is_err());
        assert!(ClassifierBuilder::new()
            .add_example("milk", "Dairy ||| Milk ||| Whole ||| Extra")
            .is_err());
        assert!(ClassifierBuilder::new()
            .add_example("milk", "Dairy ||| Milk ||| Whole")
            .is_ok());
    }

    #[test]
    fn test_texts_are_normalized() {
        let builder = ClassifierBuilder::new()
            .add_example("Whole MILK 3%", "Dairy ||| Milk ||| Whole")
            .unwrap();
        assert_eq!(builder.texts, vec!["whole milk"]);
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_only_empty_texts_fail() {
        let result = ClassifierBuilder::new()
            .add_example("123", "Dairy ||| Milk ||| Whole")
            .and_then(|b| b.add_example("!!", "Bakery ||| Bread ||| White"))
            .and_then(|b| b.build());
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_invalid_solver_config() {
        let result = ClassifierBuilder::new()
            .with_solver_config(SolverConfig::default().with_max_iter(0))
            .add_example("milk", "Dairy ||| Milk ||| Whole")
            .and_then(|b| b.build());
        assert!(matches!(result, Err(ClassifierError::ValidationError(_))));
    }
}
