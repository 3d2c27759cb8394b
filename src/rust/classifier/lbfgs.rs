//! Limited-memory BFGS with a backtracking (Armijo) line search.

use std::collections::VecDeque;

use log::{debug, warn};
use ndarray::Array1;

use super::model::SolverReport;

/// Sufficient-decrease constant of the Armijo condition
const ARMIJO: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 40;
/// Correction pairs with `s·y` at or below this are skipped
const CURVATURE_EPS: f64 = 1e-12;

/// One `(s, y, 1 / s·y)` correction pair.
type Correction = (Array1<f64>, Array1<f64>, f64);

pub(crate) struct Lbfgs {
    pub max_iter: usize,
    /// Stop once `max |grad|` falls below this
    pub tol: f64,
    pub history: usize,
}

impl Lbfgs {
    /// Minimizes `objective` starting from `x`.
    ///
    /// `objective(x, grad)` returns the loss at `x` and writes its gradient
    /// into `grad`. Returns the last accepted point.
    pub(crate) fn minimize<F>(&self, mut objective: F, mut x: Array1<f64>) -> (Array1<f64>, SolverReport)
    where
        F: FnMut(&Array1<f64>, &mut Array1<f64>) -> f64,
    {
        let mut grad = Array1::zeros(x.len());
        let mut next_grad = Array1::zeros(x.len());
        let mut loss = objective(&x, &mut grad);
        let mut pairs: VecDeque<Correction> = VecDeque::with_capacity(self.history);
        let mut report = SolverReport {
            iterations: 0,
            converged: false,
            final_loss: loss as f32,
        };

        while report.iterations < self.max_iter {
            let max_grad = max_abs(&grad);
            if max_grad < self.tol {
                report.converged = true;
                break;
            }

            let mut direction = two_loop(&grad, &pairs);
            let mut slope = grad.dot(&direction);
            if !(slope < 0.0) {
                pairs.clear();
                direction = -&grad;
                slope = -grad.dot(&grad);
            }

            let mut step = 1.0;
            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                let candidate = &x + &(&direction * step);
                let candidate_loss = objective(&candidate, &mut next_grad);
                if candidate_loss <= loss + ARMIJO * step * slope {
                    accepted = Some((candidate, candidate_loss));
                    break;
                }
                step *= 0.5;
            }

            let Some((candidate, candidate_loss)) = accepted else {
                if pairs.is_empty() {
                    warn!(
                        "Line search made no progress at iteration {} (max gradient {:.3e})",
                        report.iterations, max_grad
                    );
                    break;
                }
                // Retry from the same point along the steepest descent direction.
                pairs.clear();
                continue;
            };

            let s = &candidate - &x;
            let y = &next_grad - &grad;
            let sy = s.dot(&y);
            if sy > CURVATURE_EPS {
                if pairs.len() == self.history {
                    pairs.pop_front();
                }
                if self.history > 0 {
                    pairs.push_back((s, y, 1.0 / sy));
                }
            }

            x = candidate;
            std::mem::swap(&mut grad, &mut next_grad);
            loss = candidate_loss;
            report.iterations += 1;
            report.final_loss = loss as f32;
            if report.iterations % 50 == 0 {
                debug!(
                    "iteration {}: loss {:.6}, max gradient {:.3e}",
                    report.iterations, loss, max_grad
                );
            }
        }

        if !report.converged && max_abs(&grad) < self.tol {
            report.converged = true;
        }
        (x, report)
    }
}

/// Two-loop recursion: the quasi-Newton descent direction `-H·grad`.
fn two_loop(grad: &Array1<f64>, pairs: &VecDeque<Correction>) -> Array1<f64> {
    let mut q = grad.clone();
    let mut alphas = Vec::with_capacity(pairs.len());
    for (s, y, rho) in pairs.iter().rev() {
        let alpha = rho * s.dot(&q);
        q.scaled_add(-alpha, y);
        alphas.push(alpha);
    }
    if let Some((s, y, _)) = pairs.back() {
        q *= s.dot(y) / y.dot(y);
    }
    for ((s, y, rho), alpha) in pairs.iter().zip(alphas.iter().rev()) {
        let beta = rho * y.dot(&q);
        q.scaled_add(alpha - beta, s);
    }
    q.mapv_inplace(|v| -v);
    q
}

/// Largest absolute entry; NaN propagates.
fn max_abs(v: &Array1<f64>) -> f64 {
    v.iter().fold(0.0, |m: f64, &g| {
        if g.is_nan() || g.abs() > m {
            g.abs()
        } else {
            m
        }
    })
}
