//! Batch inference with a confidence threshold and an "Unknown" fallback.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::classifier::{Classifier, ClassifierError};
use crate::corpus::CompositeLabel;

/// One item to classify. The id is passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub item_id: String,
    pub item_name: Option<String>,
}

impl ItemRecord {
    pub fn new(item_id: impl Into<String>, item_name: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            item_name: Some(item_name.into()),
        }
    }
}

/// The category assigned to one item.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub item_id: String,
    /// The predicted label, or [`CompositeLabel::unknown`] below the threshold
    pub label: CompositeLabel,
    /// Top-class probability the threshold was compared against
    pub confidence: f32,
}

/// Accepts `predicted` when `confidence >= threshold`, otherwise falls back to
/// the unknown label. The returned label always has exactly three levels.
pub fn apply_threshold(
    predicted: &str,
    confidence: f32,
    threshold: f32,
) -> Result<CompositeLabel, ClassifierError> {
    if confidence >= threshold {
        CompositeLabel::parse(predicted)
    } else {
        Ok(CompositeLabel::unknown())
    }
}

/// Classifies every item in input order.
///
/// Missing names are treated as empty; names made only of digits and
/// punctuation normalize to nothing and are still classified.
pub fn classify(
    classifier: &Classifier,
    items: &[ItemRecord],
    threshold: f32,
) -> Result<Vec<PredictionRecord>, ClassifierError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ClassifierError::ValidationError(format!(
            "Confidence threshold must be within [0, 1], got {}",
            threshold
        )));
    }

    let mut predictions = Vec::with_capacity(items.len());
    let mut withheld = 0usize;
    for item in items {
        let name = item.item_name.as_deref().unwrap_or_default();
        let (predicted, confidence) = classifier.predict(name)?;
        let label = apply_threshold(&predicted, confidence, threshold)?;
        if confidence < threshold {
            withheld += 1;
            debug!(
                "Withheld prediction for {} ({:.4} < {})",
                item.item_id, confidence, threshold
            );
        }
        predictions.push(PredictionRecord {
            item_id: item.item_id.clone(),
            label,
            confidence,
        });
    }

    info!(
        "Classified {} items ({} below confidence threshold {})",
        predictions.len(),
        withheld,
        threshold
    );
    Ok(predictions)
}
