//! TF-IDF features over word n-grams.
//!
//! Fitting and transforming are split across two types. [`VocabularyBuilder`]
//! consumes itself in [`VocabularyBuilder::fit`] and hands back a frozen
//! [`Vocabulary`], which can only transform. Nothing can re-fit a vocabulary
//! once it exists.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::classifier::utils::normalize_vector;
use crate::classifier::ClassifierError;
use crate::config::FeatureConfig;

/// A sparse, L2-normalized feature vector with indices in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<usize>,
    pub values: Vec<f32>,
}

impl SparseVector {
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }
}

/// Contiguous word n-grams of every order in `min_n..=max_n`.
pub fn ngrams(text: &str, (min_n, max_n): (usize, usize)) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut grams = Vec::new();
    for n in min_n..=max_n.min(words.len()) {
        grams.extend(words.windows(n).map(|w| w.join(" ")));
    }
    grams
}

/// Learns a vocabulary from a training corpus.
#[derive(Debug, Clone, Default)]
pub struct VocabularyBuilder {
    config: FeatureConfig,
}

impl VocabularyBuilder {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Counts n-grams over `texts`, keeps the `max_features` most frequent
    /// terms, and computes smoothed IDF weights for them.
    ///
    /// Ties in frequency are broken by term order so fitting is deterministic.
    pub fn fit<S: AsRef<str>>(self, texts: &[S]) -> Result<Vocabulary, ClassifierError> {
        self.config.validate()?;

        // term -> (total count, document frequency)
        let mut stats: HashMap<String, (u64, u64)> = HashMap::new();
        for text in texts {
            let grams = ngrams(text.as_ref(), self.config.ngram_range);
            let mut seen = HashSet::with_capacity(grams.len());
            for gram in grams {
                let first = seen.insert(gram.clone());
                let entry = stats.entry(gram).or_insert((0, 0));
                entry.0 += 1;
                if first {
                    entry.1 += 1;
                }
            }
        }

        if stats.is_empty() {
            return Err(ClassifierError::BuildError(
                "Empty vocabulary: training texts contain no tokens".into(),
            ));
        }

        let observed = stats.len();
        let mut ranked: Vec<(String, (u64, u64))> = stats.into_iter().collect();
        if ranked.len() > self.config.max_features {
            ranked.sort_unstable_by(|a, b| match b.1 .0.cmp(&a.1 .0) {
                Ordering::Equal => a.0.cmp(&b.0),
                other => other,
            });
            ranked.truncate(self.config.max_features);
        }
        ranked.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let n_docs = texts.len() as f32;
        let mut terms = Vec::with_capacity(ranked.len());
        let mut idf = Vec::with_capacity(ranked.len());
        for (term, (_, df)) in ranked {
            terms.push(term);
            idf.push(((1.0 + n_docs) / (1.0 + df as f32)).ln() + 1.0);
        }

        info!(
            "Fitted vocabulary: {} of {} observed n-grams kept (cap {})",
            terms.len(),
            observed,
            self.config.max_features
        );
        Ok(Vocabulary {
            terms,
            idf,
            ngram_range: self.config.ngram_range,
        })
    }
}

/// A frozen n-gram vocabulary with IDF weights. Transform-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Sorted; a term's position is its feature index.
    terms: Vec<String>,
    idf: Vec<f32>,
    ngram_range: (usize, usize),
}

impl Vocabulary {
    /// Number of feature dimensions.
    pub fn len(&self) -> usize {
        self.idf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    pub fn ngram_range(&self) -> (usize, usize) {
        self.ngram_range
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.terms.binary_search_by(|t| t.as_str().cmp(term)).ok()
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.index_of(term).map(|i| self.idf[i])
    }

    /// Maps already-normalized text to a TF-IDF vector.
    ///
    /// N-grams outside the vocabulary are ignored; a text with no known
    /// n-grams yields an empty vector.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for gram in ngrams(text, self.ngram_range) {
            if let Some(idx) = self.index_of(&gram) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f32)> = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();
        entries.sort_unstable_by_key(|&(idx, _)| idx);

        let (indices, mut values): (Vec<usize>, Vec<f32>) = entries.into_iter().unzip();
        normalize_vector(&mut values);
        SparseVector { indices, values }
    }

    pub fn transform_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<SparseVector> {
        let rows: Vec<SparseVector> = texts.iter().map(|t| self.transform(t.as_ref())).collect();
        debug!("Transformed {} texts into {} dimensions", rows.len(), self.len());
        rows
    }
}
