//! Held-out evaluation: accuracy and a per-class precision/recall/F1 report.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Fraction of positions where `predicted` equals `truth`. Empty input gives 0.
pub fn accuracy<S: AsRef<str>, T: AsRef<str>>(truth: &[S], predicted: &[T]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let hits = truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| (*t).as_ref() == (*p).as_ref())
        .count();
    hits as f64 / truth.len() as f64
}

/// Precision, recall, F1 and support for one class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class metrics over the union of true and predicted labels, plus
/// accuracy and macro / support-weighted averages. Zero denominators count
/// as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: (f64, f64, f64),
    pub weighted_avg: (f64, f64, f64),
    pub total_support: usize,
}

impl ClassificationReport {
    pub fn new<S: AsRef<str>, T: AsRef<str>>(truth: &[S], predicted: &[T]) -> Self {
        // label -> (true positives, predicted count, actual count)
        let mut counts: BTreeMap<&str, (usize, usize, usize)> = BTreeMap::new();
        let labels: BTreeSet<&str> = truth
            .iter()
            .map(AsRef::as_ref)
            .chain(predicted.iter().map(AsRef::as_ref))
            .collect();
        for label in labels {
            counts.insert(label, (0, 0, 0));
        }
        for (t, p) in truth.iter().zip(predicted) {
            let (t, p) = (t.as_ref(), p.as_ref());
            if let Some(entry) = counts.get_mut(t) {
                entry.2 += 1;
                if t == p {
                    entry.0 += 1;
                }
            }
            if let Some(entry) = counts.get_mut(p) {
                entry.1 += 1;
            }
        }

        let classes: Vec<ClassMetrics> = counts
            .into_iter()
            .map(|(label, (tp, predicted, actual))| {
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, actual);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label: label.to_string(),
                    precision,
                    recall,
                    f1,
                    support: actual,
                }
            })
            .collect();

        let total_support: usize = classes.iter().map(|c| c.support).sum();
        let k = classes.len().max(1) as f64;
        let macro_avg = (
            classes.iter().map(|c| c.precision).sum::<f64>() / k,
            classes.iter().map(|c| c.recall).sum::<f64>() / k,
            classes.iter().map(|c| c.f1).sum::<f64>() / k,
        );
        let weight = |f: fn(&ClassMetrics) -> f64| {
            if total_support == 0 {
                0.0
            } else {
                classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total_support as f64
            }
        };
        let weighted_avg = (weight(|c| c.precision), weight(|c| c.recall), weight(|c| c.f1));

        Self {
            accuracy: accuracy(truth, predicted),
            classes,
            macro_avg,
            weighted_avg,
            total_support,
        }
    }

    pub fn class(&self, label: &str) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.label == label)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.chars().count())
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}\n",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.total_support
        )?;
        for (name, (p, r, f1)) in [("macro avg", self.macro_avg), ("weighted avg", self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, p, r, f1, self.total_support
            )?;
        }
        Ok(())
    }
}
