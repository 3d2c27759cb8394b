//! A product-category classifier: item names in, three-level
//! `general ||| sub ||| specific` categories out.
//!
//! Names are normalized, vectorized with TF-IDF over word n-grams against a
//! frozen vocabulary, and scored by a multinomial logistic regression. At
//! inference time a top-class probability below the confidence threshold
//! yields `Unknown ||| Unknown ||| Unknown`.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use shelfsort::{Classifier, SolverConfig};
//!
//! let classifier = Classifier::builder()
//!     .with_solver_config(SolverConfig::default().with_max_iter(300))
//!     .add_example("Orange Juice 1L", "Beverages ||| Juice ||| Orange")?
//!     .add_example("Apple Juice 2L", "Beverages ||| Juice ||| Apple")?
//!     .add_example("Paper Towels x6", "Household ||| Paper ||| Towels")?
//!     .build()?;
//!
//! let (label, confidence) = classifier.predict("paper towels")?;
//! println!("Predicted {} ({:.2})", label, confidence);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! A built [`Classifier`] is immutable and can be shared across threads using `Arc`:
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use shelfsort::{Classifier, SolverConfig};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let classifier = Arc::new(Classifier::builder()
//!     .with_solver_config(SolverConfig::default().with_max_iter(200))
//!     .add_example("rye bread", "Bakery ||| Bread ||| Rye")?
//!     .add_example("whole milk", "Dairy ||| Milk ||| Whole")?
//!     .build()?);
//!
//! let mut handles = vec![];
//! for _ in 0..3 {
//!     let classifier = Arc::clone(&classifier);
//!     handles.push(thread::spawn(move || {
//!         classifier.predict("milk").unwrap();
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod augment;
pub mod classifier;
pub mod config;
pub mod corpus;
pub mod dataset;
pub mod features;
pub mod inference;
pub mod metrics;
pub mod text;
pub mod training;

pub use artifact::{ArtifactError, ArtifactMetadata, ModelArtifact};
pub use classifier::{Classifier, ClassifierBuilder, ClassifierError, ClassifierInfo, SolverReport};
pub use config::{FeatureConfig, SolverConfig, TrainingConfig, DEFAULT_CONFIDENCE_THRESHOLD};
pub use corpus::{CompositeLabel, LabeledRecord, TrainingCorpus, LABEL_DELIMITER};
pub use dataset::DatasetError;
pub use features::{SparseVector, Vocabulary, VocabularyBuilder};
pub use inference::{classify, ItemRecord, PredictionRecord};
pub use metrics::ClassificationReport;
pub use text::normalize;
pub use training::{train, TrainingOutcome};

pub fn init_logger() {
    env_logger::init();
}
