use log::{debug, info, warn};
use ndarray::{ArrayView1, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{Error, Result};
use crate::{Matrix, Vector};

/// Minimizes `(1/n) Σ ½(w·xᵢ - yᵢ)² + (λ/2)‖w‖²`.
///
/// Each epoch visits every sample once in shuffled order. Training stops when
/// the duality gap relative to the primal objective drops below `tolerance`,
/// or after `max_iter` epochs, in which case the last iterate is kept.
#[derive(Clone, Debug)]
pub struct SdcaRegressor {
    pub coefficients: Option<Vector>,
    pub intercept: Option<f64>,
    pub n_iter: Option<usize>,
    pub converged: Option<bool>,
    pub duality_gap: Option<f64>,
    l2_regularization: f64,
    max_iter: usize,
    tolerance: f64,
    fit_intercept: bool,
    random_state: u64,
}

struct Solution {
    weights: Vector,
    n_iter: usize,
    converged: bool,
    gap: f64,
}

impl SdcaRegressor {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            n_iter: None,
            converged: None,
            duality_gap: None,
            l2_regularization: 0.1,
            max_iter: 25,
            tolerance: 1e-3,
            fit_intercept: true,
            random_state: 0,
        }
    }

    pub fn l2_regularization(mut self, l2_regularization: f64) -> Self {
        if !(l2_regularization > 0.0) {
            panic!("l2_regularization must be positive, got {}", l2_regularization);
        }
        self.l2_regularization = l2_regularization;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        if max_iter == 0 {
            panic!("max_iter must be > 0");
        }
        self.max_iter = max_iter;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        if tolerance < 0.0 {
            panic!("tolerance must be non-negative, got {}", tolerance);
        }
        self.tolerance = tolerance;
        self
    }

    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    pub fn fit(&mut self, x: &Matrix, y: &Vector) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(Error::DimensionMismatch(format!(
                "X has {} samples but y has {}",
                x.nrows(),
                y.len()
            )));
        }

        if x.nrows() == 0 {
            return Err(Error::EmptyDataset);
        }

        let (solution, intercept) = if self.fit_intercept {
            self.fit_with_intercept(x, y)?
        } else {
            (self.coordinate_ascent(x, y), 0.0)
        };

        if solution.converged {
            info!(
                "SDCA converged after {} epochs (relative gap {:.3e})",
                solution.n_iter, solution.gap
            );
        } else {
            warn!(
                "SDCA stopped at max_iter={} without converging (relative gap {:.3e} > {})",
                solution.n_iter, solution.gap, self.tolerance
            );
        }

        self.coefficients = Some(solution.weights);
        self.intercept = Some(intercept);
        self.n_iter = Some(solution.n_iter);
        self.converged = Some(solution.converged);
        self.duality_gap = Some(solution.gap);
        Ok(())
    }

    pub fn predict(&self, x: &Matrix) -> Result<Vector> {
        let coeffs = self.fitted_coefficients(x.ncols())?;
        let intercept = self.intercept.unwrap_or(0.0);

        Ok(x.dot(coeffs) + intercept)
    }

    pub fn predict_one(&self, x: ArrayView1<f64>) -> Result<f64> {
        let coeffs = self.fitted_coefficients(x.len())?;
        let intercept = self.intercept.unwrap_or(0.0);

        Ok(x.dot(coeffs) + intercept)
    }

    pub fn score(&self, x: &Matrix, y: &Vector) -> Result<f64> {
        let y_pred = self.predict(x)?;
        crate::metrics::r2_score(y, &y_pred)
    }

    fn fitted_coefficients(&self, n_features: usize) -> Result<&Vector> {
        let coeffs = self
            .coefficients
            .as_ref()
            .ok_or(Error::NotFitted("SdcaRegressor"))?;

        if n_features != coeffs.len() {
            return Err(Error::DimensionMismatch(format!(
                "Number of features in X ({}) doesn't match training data ({})",
                n_features,
                coeffs.len()
            )));
        }
        Ok(coeffs)
    }

    fn fit_with_intercept(&self, x: &Matrix, y: &Vector) -> Result<(Solution, f64)> {
        let y_mean = y.mean().ok_or(Error::EmptyDataset)?;
        let x_means = x.mean_axis(Axis(0)).ok_or(Error::EmptyDataset)?;

        let mut x_centered = x.clone();
        for mut row in x_centered.axis_iter_mut(Axis(0)) {
            row -= &x_means;
        }
        let y_centered = y - y_mean;

        let solution = self.coordinate_ascent(&x_centered, &y_centered);
        let intercept = y_mean - solution.weights.dot(&x_means);

        Ok((solution, intercept))
    }

    fn coordinate_ascent(&self, x: &Matrix, y: &Vector) -> Solution {
        let n_samples = x.nrows();
        let lambda_n = self.l2_regularization * n_samples as f64;

        let sq_norms: Vector = x.rows().into_iter().map(|row| row.dot(&row)).collect();
        let mut alpha = Vector::zeros(n_samples);
        let mut weights = Vector::zeros(x.ncols());

        let mut order: Vec<usize> = (0..n_samples).collect();
        let mut rng = StdRng::seed_from_u64(self.random_state);

        let mut gap = f64::INFINITY;
        for epoch in 1..=self.max_iter {
            order.shuffle(&mut rng);

            for &i in &order {
                let row = x.row(i);
                let residual = y[i] - row.dot(&weights) - alpha[i];
                let delta = residual / (1.0 + sq_norms[i] / lambda_n);

                alpha[i] += delta;
                weights.scaled_add(delta / lambda_n, &row);
            }

            gap = self.relative_duality_gap(x, y, &weights, &alpha);
            debug!("SDCA epoch {}: relative duality gap {:.6e}", epoch, gap);

            if gap < self.tolerance {
                return Solution {
                    weights,
                    n_iter: epoch,
                    converged: true,
                    gap,
                };
            }
        }

        Solution {
            weights,
            n_iter: self.max_iter,
            converged: false,
            gap,
        }
    }

    // w is kept equal to (1/λn) Σ αᵢ xᵢ, so both objectives share the norm term.
    fn relative_duality_gap(
        &self,
        x: &Matrix,
        y: &Vector,
        weights: &Vector,
        alpha: &Vector,
    ) -> f64 {
        let n = y.len() as f64;
        let regularizer = 0.5 * self.l2_regularization * weights.dot(weights);

        let residuals = x.dot(weights) - y;
        let primal = residuals.dot(&residuals) / (2.0 * n) + regularizer;
        let dual = (alpha.dot(y) - 0.5 * alpha.dot(alpha)) / n - regularizer;

        (primal - dual).max(0.0) / primal.max(f64::EPSILON)
    }
}

impl Default for SdcaRegressor {
    fn default() -> Self {
        Self::new()
    }
}
