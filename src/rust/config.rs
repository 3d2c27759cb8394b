use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierError;

/// Minimum top-class probability required to accept a prediction.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.05;

/// Settings for n-gram extraction and vocabulary sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Smallest and largest n-gram order, inclusive
    pub ngram_range: (usize, usize),
    /// Upper bound on the number of vocabulary terms kept
    pub max_features: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            ngram_range: (1, 4),
            max_features: 1_200_000,
        }
    }
}

impl FeatureConfig {
    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        self.ngram_range = (min_n, max_n);
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ClassifierError> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ClassifierError::ValidationError(format!(
                "Invalid n-gram range ({}, {})",
                min_n, max_n
            )));
        }
        if self.max_features == 0 {
            return Err(ClassifierError::ValidationError(
                "max_features must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Settings for the logistic regression solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Iteration cap; the solver stops here even if it has not converged
    pub max_iter: usize,
    /// Stop once the largest absolute gradient entry falls below this
    pub tol: f32,
    /// Inverse L2 regularization strength
    pub c: f32,
    /// Number of correction pairs kept by the L-BFGS solver
    pub history: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iter: 120_000,
            tol: 1e-4,
            c: 1.0,
            history: 10,
        }
    }
}

impl SolverConfig {
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tol(mut self, tol: f32) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_c(mut self, c: f32) -> Self {
        self.c = c;
        self
    }

    pub fn with_history(mut self, history: usize) -> Self {
        self.history = history;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ClassifierError> {
        if self.max_iter == 0 || self.history == 0 {
            return Err(ClassifierError::ValidationError(format!(
                "max_iter and history must be greater than zero, got {} and {}",
                self.max_iter, self.history
            )));
        }
        if !(self.c > 0.0) || !(self.tol >= 0.0) {
            return Err(ClassifierError::ValidationError(format!(
                "Solver parameters out of range: c={}, tol={}",
                self.c, self.tol
            )));
        }
        Ok(())
    }
}

/// Everything a training run needs besides the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of augmented copies of the dataset
    pub passes: usize,
    /// Fraction of the augmented corpus held out for evaluation
    pub test_size: f64,
    /// Seed for augmentation and the train/test split
    pub seed: u64,
    pub features: FeatureConfig,
    pub solver: SolverConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            passes: 10,
            test_size: 0.2,
            seed: 42,
            features: FeatureConfig::default(),
            solver: SolverConfig::default(),
        }
    }
}

impl TrainingConfig {
    pub fn with_passes(mut self, passes: usize) -> Self {
        self.passes = passes;
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_features(mut self, features: FeatureConfig) -> Self {
        self.features = features;
        self
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }
}
