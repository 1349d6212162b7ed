use crate::Vector;
use crate::error::{Error, Result};

/// Regression quality on a labeled set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegressionMetrics {
    pub mean_absolute_error: f64,
    pub mean_squared_error: f64,
    pub root_mean_squared_error: f64,
    /// Mean squared loss, `½ · MSE`, the quantity the solver minimizes.
    pub loss_function: f64,
    pub r_squared: f64,
}

impl RegressionMetrics {
    pub fn compute(y_true: &Vector, y_pred: &Vector) -> Result<Self> {
        let mse = mean_squared_error(y_true, y_pred)?;

        Ok(Self {
            mean_absolute_error: mean_absolute_error(y_true, y_pred)?,
            mean_squared_error: mse,
            root_mean_squared_error: mse.sqrt(),
            loss_function: 0.5 * mse,
            r_squared: r2_score(y_true, y_pred)?,
        })
    }
}

fn check_lengths(y_true: &Vector, y_pred: &Vector) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(Error::DimensionMismatch(
            "y_true and y_pred must have the same length".to_string(),
        ));
    }
    if y_true.is_empty() {
        return Err(Error::EmptyDataset);
    }
    Ok(())
}

pub fn mean_squared_error(y_true: &Vector, y_pred: &Vector) -> Result<f64> {
    check_lengths(y_true, y_pred)?;

    let diff = y_true - y_pred;
    Ok(diff.dot(&diff) / diff.len() as f64)
}

pub fn root_mean_squared_error(y_true: &Vector, y_pred: &Vector) -> Result<f64> {
    mean_squared_error(y_true, y_pred).map(f64::sqrt)
}

pub fn mean_absolute_error(y_true: &Vector, y_pred: &Vector) -> Result<f64> {
    check_lengths(y_true, y_pred)?;

    let diff = y_true - y_pred;
    Ok(diff.mapv(f64::abs).sum() / diff.len() as f64)
}

pub fn r2_score(y_true: &Vector, y_pred: &Vector) -> Result<f64> {
    check_lengths(y_true, y_pred)?;

    let y_mean = y_true.sum() / y_true.len() as f64;
    let ss_res = (y_true - y_pred).mapv(|x| x * x).sum();
    let ss_tot = y_true.mapv(|x| (x - y_mean) * (x - y_mean)).sum();

    if ss_tot == 0.0 {
        return Ok(1.0); // Perfect prediction when variance is zero
    }

    Ok(1.0 - ss_res / ss_tot)
}
