use std::collections::BTreeSet;

use log::{info, warn};
use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::lbfgs::Lbfgs;
use super::utils::{argmax, softmax};
use crate::config::SolverConfig;
use crate::features::SparseVector;

/// Outcome of a solver run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverReport {
    /// Gradient steps taken
    pub iterations: usize,
    /// Whether the gradient tolerance was reached before the iteration cap
    pub converged: bool,
    /// Regularized mean cross-entropy at the last evaluated point
    pub final_loss: f32,
}

/// Multinomial logistic regression over sparse features.
///
/// One weight column and one bias per class seen during fitting. Classes are
/// kept in sorted order, so the same training labels always map to the same
/// column indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    classes: Vec<String>,
    /// Shape `(n_features, n_classes)`
    weights: Array2<f32>,
    bias: Array1<f32>,
}

impl LogisticRegression {
    /// Fits the model by L-BFGS on L2-regularized mean cross-entropy.
    ///
    /// Stops when the largest absolute gradient entry drops below
    /// `config.tol` or after `config.max_iter` steps, whichever comes first.
    /// Hitting the cap is logged, not an error.
    pub fn fit<S: AsRef<str>>(
        features: &[SparseVector],
        labels: &[S],
        n_features: usize,
        config: &SolverConfig,
    ) -> Result<(Self, SolverReport), ClassifierError> {
        config.validate()?;
        if features.is_empty() {
            return Err(ClassifierError::BuildError("No training samples".into()));
        }
        if features.len() != labels.len() {
            return Err(ClassifierError::BuildError(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if let Some(row) = features.iter().position(|x| !Self::fits_dimension(x, n_features)) {
            return Err(ClassifierError::BuildError(format!(
                "Feature row {} exceeds {} dimensions",
                row, n_features
            )));
        }

        let classes: Vec<String> = labels
            .iter()
            .map(|l| l.as_ref().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let targets: Vec<usize> = labels
            .iter()
            .map(|l| classes.binary_search_by(|c| c.as_str().cmp(l.as_ref())))
            .collect::<Result<_, _>>()
            .map_err(|_| ClassifierError::BuildError("Label lookup failed".into()))?;

        let n_classes = classes.len();
        info!(
            "Fitting logistic regression: {} samples, {} features, {} classes",
            features.len(),
            n_features,
            n_classes
        );

        let objective = CrossEntropy {
            features,
            targets: &targets,
            n_classes,
            n_weights: n_features * n_classes,
            reg: 1.0 / (f64::from(config.c) * features.len() as f64),
        };
        let solver = Lbfgs {
            max_iter: config.max_iter,
            tol: f64::from(config.tol),
            history: config.history,
        };
        let (theta, report) = solver.minimize(
            |theta, grad| objective.evaluate(theta, grad),
            Array1::zeros(objective.n_weights + n_classes),
        );

        if report.converged {
            info!(
                "Solver converged after {} iterations (loss {:.6})",
                report.iterations, report.final_loss
            );
        } else {
            warn!(
                "Solver stopped after {} of {} iterations without converging (loss {:.6})",
                report.iterations, config.max_iter, report.final_loss
            );
        }

        let weights = Array2::from_shape_fn((n_features, n_classes), |(j, c)| {
            theta[j * n_classes + c] as f32
        });
        let bias = Array1::from_shape_fn(n_classes, |c| theta[objective.n_weights + c] as f32);
        Ok((
            Self {
                classes,
                weights,
                bias,
            },
            report,
        ))
    }

    /// Sorted class labels; column `i` of every probability vector belongs to
    /// `classes()[i]`.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.weights.nrows()
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Probability of each class for one feature row. Sums to 1.
    pub fn predict_proba(&self, x: &SparseVector) -> Result<Array1<f32>, ClassifierError> {
        if !Self::fits_dimension(x, self.n_features()) {
            return Err(ClassifierError::PredictionError(format!(
                "Feature vector exceeds the model's {} dimensions",
                self.n_features()
            )));
        }
        Ok(softmax(&self.scores(x)))
    }

    /// The most probable class and its probability.
    pub fn predict(&self, x: &SparseVector) -> Result<(&str, f32), ClassifierError> {
        let probs = self.predict_proba(x)?;
        argmax(&probs)
            .map(|(i, p)| (self.classes[i].as_str(), p))
            .ok_or_else(|| ClassifierError::PredictionError("Model has no classes".into()))
    }

    fn scores(&self, x: &SparseVector) -> Array1<f32> {
        let mut scores = self.bias.clone();
        for (j, v) in x.iter() {
            scores.scaled_add(v, &self.weights.row(j));
        }
        scores
    }

    fn fits_dimension(x: &SparseVector, n_features: usize) -> bool {
        x.indices.iter().all(|&j| j < n_features)
    }
}

/// Mean cross-entropy plus `reg / 2 * ||W||^2` over a flat parameter vector:
/// row-major `(n_features, n_classes)` weights followed by one bias per
/// class. The bias is not regularized.
struct CrossEntropy<'a> {
    features: &'a [SparseVector],
    targets: &'a [usize],
    n_classes: usize,
    n_weights: usize,
    reg: f64,
}

impl CrossEntropy<'_> {
    fn evaluate(&self, theta: &Array1<f64>, grad: &mut Array1<f64>) -> f64 {
        let k = self.n_classes;
        let bias = self.n_weights;
        grad.fill(0.0);

        let mut loss = 0.0;
        let mut probs = vec![0.0f64; k];
        for (x, &y) in self.features.iter().zip(self.targets) {
            for (c, p) in probs.iter_mut().enumerate() {
                *p = theta[bias + c];
            }
            for (j, v) in x.iter() {
                let row = j * k;
                for (c, p) in probs.iter_mut().enumerate() {
                    *p += f64::from(v) * theta[row + c];
                }
            }

            let max = probs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mut total = 0.0;
            for p in probs.iter_mut() {
                *p = (*p - max).exp();
                total += *p;
            }
            for p in probs.iter_mut() {
                *p /= total;
            }

            loss -= probs[y].max(f64::MIN_POSITIVE).ln();
            probs[y] -= 1.0;
            for (j, v) in x.iter() {
                let row = j * k;
                for (c, r) in probs.iter().enumerate() {
                    grad[row + c] += f64::from(v) * r;
                }
            }
            for (c, r) in probs.iter().enumerate() {
                grad[bias + c] += r;
            }
        }

        let n = self.features.len() as f64;
        *grad /= n;
        let weights = theta.slice(s![..bias]);
        grad.slice_mut(s![..bias]).scaled_add(self.reg, &weights);
        loss / n + 0.5 * self.reg * weights.dot(&weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot(index: usize) -> SparseVector {
        SparseVector {
            indices: vec![index],
            values: vec![1.0],
        }
    }

    fn toy() -> (Vec<SparseVector>, Vec<&'static str>) {
        let features = vec![one_hot(0), one_hot(0), one_hot(1), one_hot(1), one_hot(2)];
        let labels = vec!["a", "a", "b", "b", "c"];
        (features, labels)
    }

    #[test]
    fn test_fit_separates_classes() {
        let (features, labels) = toy();
        let config = SolverConfig::default().with_max_iter(2_000);
        let (model, report) = LogisticRegression::fit(&features, &labels, 3, &config).unwrap();
        assert!(report.iterations > 0);
        assert_eq!(model.classes(), &["a", "b", "c"]);
        for (x, label) in features.iter().zip(&labels) {
            assert_eq!(model.predict(x).unwrap().0, *label);
        }
    }

    #[test]
    fn test_default_solver_converges_on_many_classes() {
        // 8 classes, each with a private feature plus shared noisy ones
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for class in 0..8usize {
            for shared in 0..3usize {
                let mut indices = vec![class, 8 + (class + shared) % 4];
                indices.sort_unstable();
                features.push(SparseVector {
                    indices,
                    values: vec![0.8, 0.6],
                });
                labels.push(format!("class {}", class));
            }
        }
        let config = SolverConfig::default();
        let (model, report) = LogisticRegression::fit(&features, &labels, 12, &config).unwrap();
        assert!(report.converged, "{:?}", report);
        assert!(report.iterations < 1_000, "{:?}", report);
        for (x, label) in features.iter().zip(&labels) {
            assert_eq!(model.predict(x).unwrap().0, label.as_str());
        }
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (features, labels) = toy();
        let config = SolverConfig::default().with_max_iter(200);
        let (model, _) = LogisticRegression::fit(&features, &labels, 3, &config).unwrap();
        for x in features.iter().chain([&SparseVector::default()]) {
            let probs = model.predict_proba(x).unwrap();
            assert_eq!(probs.len(), 3);
            assert!((probs.sum() - 1.0).abs() < 1e-5);
            assert!(probs.iter().all(|&p| p >= 0.0));
        }
    }

    #[test]
    fn test_iteration_cap_is_respected() {
        let (features, labels) = toy();
        let config = SolverConfig::default().with_max_iter(3).with_tol(0.0);
        let (_, report) = LogisticRegression::fit(&features, &labels, 3, &config).unwrap();
        assert_eq!(report.iterations, 3);
        assert!(!report.converged);
    }

    #[test]
    fn test_single_class_converges_immediately() {
        let features = vec![one_hot(0), one_hot(1)];
        let (model, report) =
            LogisticRegression::fit(&features, &["only", "only"], 2, &SolverConfig::default())
                .unwrap();
        assert!(report.converged);
        assert_eq!(model.predict(&one_hot(1)).unwrap(), ("only", 1.0));
    }

    #[test]
    fn test_mismatched_inputs_are_rejected() {
        let (features, _) = toy();
        let config = SolverConfig::default();
        assert!(LogisticRegression::fit(&features, &["a"], 3, &config).is_err());
        assert!(LogisticRegression::fit(&features, &["a"; 5], 2, &config).is_err());
        assert!(LogisticRegression::fit::<&str>(&[], &[], 3, &config).is_err());
    }

    #[test]
    fn test_out_of_range_feature_at_predict() {
        let (features, labels) = toy();
        let config = SolverConfig::default().with_max_iter(10);
        let (model, _) = LogisticRegression::fit(&features, &labels, 3, &config).unwrap();
        assert!(matches!(
            model.predict_proba(&one_hot(3)),
            Err(ClassifierError::PredictionError(_))
        ));
    }
}
