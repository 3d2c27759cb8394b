mod error;
mod model;
mod lbfgs;
#[allow(clippy::module_inception)]
mod classifier;
pub mod builder;
pub(crate) mod utils;

pub use error::ClassifierError;
pub use model::{LogisticRegression, SolverReport};
pub use classifier::Classifier;
pub use builder::ClassifierBuilder;

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierInfo {
    /// Number of composite labels the classifier was fitted on
    pub num_classes: usize,
    /// Joined composite labels, in probability-vector order
    pub class_labels: Vec<String>,
    /// Number of n-gram terms in the frozen vocabulary
    pub vocabulary_size: usize,
    /// Smallest and largest n-gram order
    pub ngram_range: (usize, usize),
}

impl std::fmt::Display for ClassifierInfo {
    /// One-line summary with counts only; the full label list is in `class_labels`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} classes, {} vocabulary terms, n-grams {}..={}",
            self.num_classes, self.vocabulary_size, self.ngram_range.0, self.ngram_range.1
        )
    }
}
