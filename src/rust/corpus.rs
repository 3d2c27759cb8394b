//! Labeled records, composite labels, and the augmented training corpus.

use std::fmt;

use log::info;
use rand::seq::SliceRandom;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::augment::augment;
use crate::classifier::ClassifierError;
use crate::text::normalize_opt;

/// Separator between the three category levels of a composite label.
pub const LABEL_DELIMITER: &str = " ||| ";

/// Category name used at every level when a prediction is withheld.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// One row of the labeled product catalog.
///
/// Fields are optional because they come straight from a delimited file;
/// [`CompositeLabel::from_record`] enforces the category hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabeledRecord {
    pub item_name: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub specific_category: Option<String>,
}

impl LabeledRecord {
    pub fn new(
        item_name: impl Into<String>,
        category: impl Into<String>,
        subcategory: impl Into<String>,
        specific_category: impl Into<String>,
    ) -> Self {
        Self {
            item_name: Some(item_name.into()),
            category: Some(category.into()),
            subcategory: Some(subcategory.into()),
            specific_category: Some(specific_category.into()),
        }
    }
}

/// A three-level category hierarchy flattened into a single training target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompositeLabel {
    pub general: String,
    pub sub: String,
    pub specific: String,
}

impl CompositeLabel {
    /// Creates a label, rejecting components that would not survive a
    /// [`join`](Self::join) / [`parse`](Self::parse) round trip: any component
    /// containing the delimiter, or a first or second level ending in `" |||"`.
    pub fn new(
        general: impl Into<String>,
        sub: impl Into<String>,
        specific: impl Into<String>,
    ) -> Result<Self, ClassifierError> {
        let label = Self {
            general: general.into(),
            sub: sub.into(),
            specific: specific.into(),
        };
        for part in [&label.general, &label.sub, &label.specific] {
            if part.contains(LABEL_DELIMITER) {
                return Err(ClassifierError::ValidationError(format!(
                    "Category '{}' contains the reserved delimiter '{}'",
                    part, LABEL_DELIMITER
                )));
            }
        }
        // " |||" followed by the delimiter reads as the delimiter one character early.
        for part in [&label.general, &label.sub] {
            if part.ends_with(LABEL_DELIMITER.trim_end()) {
                return Err(ClassifierError::ValidationError(format!(
                    "Category '{}' ends with '{}' and would make the label ambiguous",
                    part,
                    LABEL_DELIMITER.trim_end()
                )));
            }
        }
        Ok(label)
    }

    /// The fallback label emitted for low-confidence predictions.
    pub fn unknown() -> Self {
        Self {
            general: UNKNOWN_CATEGORY.to_string(),
            sub: UNKNOWN_CATEGORY.to_string(),
            specific: UNKNOWN_CATEGORY.to_string(),
        }
    }

    /// Builds the label of a training record.
    ///
    /// Fails if any level of the hierarchy is missing; partial hierarchies
    /// cannot form a composite label.
    pub fn from_record(record: &LabeledRecord) -> Result<Self, ClassifierError> {
        let field = |value: &Option<String>, name: &str| {
            value.clone().ok_or_else(|| {
                ClassifierError::ValidationError(format!(
                    "Record {:?} is missing '{}'",
                    record.item_name.as_deref().unwrap_or_default(),
                    name
                ))
            })
        };
        Self::new(
            field(&record.category, "category")?,
            field(&record.subcategory, "subcategory")?,
            field(&record.specific_category, "specific_category")?,
        )
    }

    /// Joins the three levels with [`LABEL_DELIMITER`].
    pub fn join(&self) -> String {
        [self.general.as_str(), self.sub.as_str(), self.specific.as_str()].join(LABEL_DELIMITER)
    }

    /// Splits a joined label; anything other than exactly three parts is an error.
    pub fn parse(joined: &str) -> Result<Self, ClassifierError> {
        let parts: Vec<&str> = joined.split(LABEL_DELIMITER).collect();
        match parts.as_slice() {
            [general, sub, specific] => Ok(Self {
                general: general.to_string(),
                sub: sub.to_string(),
                specific: specific.to_string(),
            }),
            _ => Err(ClassifierError::ValidationError(format!(
                "Composite label '{}' has {} parts, expected 3",
                joined,
                parts.len()
            ))),
        }
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::unknown()
    }
}

impl fmt::Display for CompositeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.join())
    }
}

/// One (augmented text, composite label) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub text: String,
    pub label: String,
}

/// The augmented training corpus. Row order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingCorpus {
    samples: Vec<Sample>,
}

impl TrainingCorpus {
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.label.as_str()).collect()
    }
}

/// Expands `records` into `passes` independently augmented copies.
///
/// Every record is validated before any augmentation happens, so a single
/// record with a partial hierarchy rejects the whole dataset.
pub fn build_corpus<R: Rng + ?Sized>(
    records: &[LabeledRecord],
    passes: usize,
    rng: &mut R,
) -> Result<TrainingCorpus, ClassifierError> {
    let prepared = records
        .iter()
        .map(|record| {
            let label = CompositeLabel::from_record(record)?.join();
            Ok((normalize_opt(record.item_name.as_deref()), label))
        })
        .collect::<Result<Vec<_>, ClassifierError>>()?;

    let mut samples = Vec::with_capacity(prepared.len() * passes);
    for _ in 0..passes {
        for (text, label) in &prepared {
            samples.push(Sample {
                text: augment(text, rng),
                label: label.clone(),
            });
        }
    }
    info!(
        "Built training corpus: {} records x {} passes = {} samples",
        records.len(),
        passes,
        samples.len()
    );
    Ok(TrainingCorpus { samples })
}

/// Shuffles the corpus with `seed` and holds out `ceil(n * test_size)` rows.
///
/// Returns `(train, test)`.
pub fn train_test_split(
    corpus: TrainingCorpus,
    test_size: f64,
    seed: u64,
) -> Result<(TrainingCorpus, TrainingCorpus), ClassifierError> {
    if !(0.0..1.0).contains(&test_size) {
        return Err(ClassifierError::ValidationError(format!(
            "test_size must be in [0, 1), got {}",
            test_size
        )));
    }
    let n = corpus.len();
    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test >= n && n > 0 {
        return Err(ClassifierError::ValidationError(format!(
            "test_size {} leaves no training rows out of {}",
            test_size, n
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let mut slots: Vec<Option<Sample>> = corpus.samples.into_iter().map(Some).collect();
    let mut take = |idx: &usize| slots[*idx].take();
    let test: Vec<Sample> = order[..n_test].iter().filter_map(&mut take).collect();
    let train: Vec<Sample> = order[n_test..].iter().filter_map(&mut take).collect();
    Ok((TrainingCorpus::from_samples(train), TrainingCorpus::from_samples(test)))
}
