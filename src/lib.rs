pub use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

pub mod dataset;
pub mod error;
pub mod linear_model;
pub mod metrics;
pub mod pipeline;
pub mod prediction;
pub mod preprocessing;

pub use dataset::{TaxiDataset, TaxiTrip};
pub use error::{Error, Result};
pub use linear_model::SdcaRegressor;
pub use metrics::RegressionMetrics;
pub use pipeline::{FareModel, FarePipeline, PipelineOptions, TripFeaturizer};
pub use prediction::{FarePrediction, PredictionEngine};
pub use preprocessing::{OneHotEncoder, StandardScaler};

pub type Vector = Array1<f64>;
pub type Matrix = Array2<f64>;
