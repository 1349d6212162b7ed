//! Linear models for regression.
//!
//! This module provides:
//! - `SdcaRegressor`: L2-regularized least squares solved by Stochastic Dual
//!   Coordinate Ascent
//!
//! # Examples
//!
//! ```rust
//! use taxi_fare::SdcaRegressor;
//! use ndarray::array;
//!
//! let x = array![[1.0], [2.0], [3.0], [4.0]];
//! let y = array![2.0, 4.0, 6.0, 8.0];
//!
//! let mut model = SdcaRegressor::new().l2_regularization(0.01).max_iter(100);
//! model.fit(&x, &y).unwrap();
//! let predictions = model.predict(&x).unwrap();
//! assert_eq!(predictions.len(), 4);
//! ```

mod sdca;

pub use sdca::SdcaRegressor;
