//! A full training run: augment, split, fit, evaluate.

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::artifact::{ArtifactMetadata, ModelArtifact};
use crate::classifier::{Classifier, ClassifierError, SolverReport};
use crate::config::TrainingConfig;
use crate::corpus::{build_corpus, train_test_split, LabeledRecord, TrainingCorpus};
use crate::metrics::ClassificationReport;

/// Everything a training run produces.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    /// Metrics on the held-out part of the augmented corpus
    pub report: ClassificationReport,
    pub solver: SolverReport,
}

/// Trains a classifier on `records` according to `config`.
///
/// The same seed always yields the same corpus, split, and model.
pub fn train(
    records: &[LabeledRecord],
    config: &TrainingConfig,
) -> Result<TrainingOutcome, ClassifierError> {
    if records.is_empty() {
        return Err(ClassifierError::ValidationError(
            "Training dataset is empty".into(),
        ));
    }
    if config.passes == 0 {
        return Err(ClassifierError::ValidationError(
            "At least one augmentation pass is required".into(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let corpus = build_corpus(records, config.passes, &mut rng)?;
    let (train_set, test_set) = train_test_split(corpus, config.test_size, config.seed)?;
    info!(
        "Split corpus into {} training and {} test rows",
        train_set.len(),
        test_set.len()
    );

    let (classifier, solver) = Classifier::builder()
        .with_feature_config(config.features.clone())
        .with_solver_config(config.solver.clone())
        .add_corpus(&train_set)?
        .build_with_report()?;

    let report = evaluate(&classifier, &test_set)?;
    info!("Held-out accuracy: {:.4}", report.accuracy);

    let metadata = ArtifactMetadata {
        training_rows: train_set.len(),
        config: Some(config.clone()),
        solver: Some(solver),
    };
    Ok(TrainingOutcome {
        artifact: ModelArtifact::new(classifier, metadata),
        report,
        solver,
    })
}

/// Scores `classifier` on a labeled corpus by exact composite-label match.
pub fn evaluate(
    classifier: &Classifier,
    corpus: &TrainingCorpus,
) -> Result<ClassificationReport, ClassifierError> {
    let predicted = corpus
        .texts()
        .into_iter()
        .map(|text| classifier.predict(text).map(|(label, _)| label))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ClassificationReport::new(&corpus.labels(), &predicted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;

    fn records() -> Vec<LabeledRecord> {
        vec![
            LabeledRecord::new("Whole Milk 3% 1L", "Dairy", "Milk", "Whole Milk"),
            LabeledRecord::new("Whole Milk 1% 2L", "Dairy", "Milk", "Whole Milk"),
            LabeledRecord::new("Rye Bread Sliced", "Bakery", "Bread", "Rye"),
            LabeledRecord::new("Rye Bread Loaf", "Bakery", "Bread", "Rye"),
        ]
    }

    fn config() -> TrainingConfig {
        TrainingConfig::default()
            .with_passes(5)
            .with_solver(SolverConfig::default().with_max_iter(300))
    }

    #[test]
    fn test_train_produces_metadata() {
        let outcome = train(&records(), &config()).unwrap();
        let metadata = outcome.artifact.metadata();
        assert_eq!(metadata.training_rows, 16);
        assert_eq!(metadata.config.as_ref(), Some(&config()));
        assert_eq!(outcome.report.total_support, 4);
        assert_eq!(outcome.artifact.classifier().classes().len(), 2);
    }

    #[test]
    fn test_training_is_reproducible() {
        let a = train(&records(), &config()).unwrap();
        let b = train(&records(), &config()).unwrap();
        assert_eq!(a.artifact, b.artifact);
        assert_eq!(a.report, b.report);
    }

    #[test]
    fn test_rejects_empty_and_zero_passes() {
        assert!(train(&[], &config()).is_err());
        assert!(train(&records(), &config().with_passes(0)).is_err());
    }
}
