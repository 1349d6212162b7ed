//! The fare model: featurization, scaling and the SDCA regressor, fitted
//! together on the training subset and frozen afterwards.

use log::info;
use ndarray::ArrayViewMut1;

use crate::dataset::{TaxiDataset, TaxiTrip};
use crate::error::Result;
use crate::linear_model::SdcaRegressor;
use crate::metrics::RegressionMetrics;
use crate::preprocessing::{OneHotEncoder, StandardScaler};
use crate::{Matrix, Vector};

pub const NUMERIC_FEATURES: [&str; 4] = [
    "rate_code",
    "passenger_count",
    "trip_time_in_secs",
    "trip_distance",
];

#[derive(Clone, Debug, PartialEq)]
pub struct PipelineOptions {
    /// Share of rows held out for evaluation.
    pub test_fraction: f64,
    /// Seeds both the train/test split and the solver's sample order.
    pub seed: u64,
    pub max_iter: usize,
    pub tolerance: f64,
    pub l2_regularization: f64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 0,
            max_iter: 25,
            tolerance: 1e-3,
            l2_regularization: 0.1,
        }
    }
}

/// Turns a trip into `[numeric fields..., vendor one-hot..., payment one-hot...]`.
#[derive(Clone, Debug, Default)]
pub struct TripFeaturizer {
    vendor: OneHotEncoder,
    payment: OneHotEncoder,
}

impl TripFeaturizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, trips: &TaxiDataset) -> Result<()> {
        self.vendor.fit(trips.iter().map(|t| t.vendor_id.as_str()))?;
        self.payment.fit(trips.iter().map(|t| t.payment_type.as_str()))?;
        Ok(())
    }

    pub fn vendor_encoder(&self) -> &OneHotEncoder {
        &self.vendor
    }

    pub fn payment_encoder(&self) -> &OneHotEncoder {
        &self.payment
    }

    pub fn n_features(&self) -> usize {
        NUMERIC_FEATURES.len() + self.vendor.n_categories() + self.payment.n_categories()
    }

    pub fn feature_names(&self) -> Vec<String> {
        let categorical = |prefix: &str, encoder: &OneHotEncoder| -> Vec<String> {
            encoder
                .vocabulary()
                .unwrap_or_default()
                .iter()
                .map(|value| format!("{}={}", prefix, value))
                .collect()
        };

        NUMERIC_FEATURES
            .iter()
            .map(|name| name.to_string())
            .chain(categorical("vendor_id", &self.vendor))
            .chain(categorical("payment_type", &self.payment))
            .collect()
    }

    pub fn transform(&self, trip: &TaxiTrip) -> Result<Vector> {
        let mut features = Vector::zeros(self.n_features());
        self.write_row(trip, features.view_mut())?;
        Ok(features)
    }

    pub fn transform_batch(&self, trips: &TaxiDataset) -> Result<Matrix> {
        let mut features = Matrix::zeros((trips.len(), self.n_features()));
        for (trip, row) in trips.iter().zip(features.rows_mut()) {
            self.write_row(trip, row)?;
        }
        Ok(features)
    }

    fn write_row(&self, trip: &TaxiTrip, mut out: ArrayViewMut1<f64>) -> Result<()> {
        out[0] = trip.rate_code;
        out[1] = trip.passenger_count;
        out[2] = trip.trip_time_in_secs;
        out[3] = trip.trip_distance;

        let vendor_end = NUMERIC_FEATURES.len() + self.vendor.n_categories();
        let (vendor, payment) = out
            .slice_mut(ndarray::s![NUMERIC_FEATURES.len()..])
            .split_at(ndarray::Axis(0), vendor_end - NUMERIC_FEATURES.len());

        self.vendor.encode_into(&trip.vendor_id, vendor)?;
        self.payment.encode_into(&trip.payment_type, payment)?;
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct FarePipeline {
    options: PipelineOptions,
}

impl FarePipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn fit(&self, train: &TaxiDataset) -> Result<FareModel> {
        let mut featurizer = TripFeaturizer::new();
        featurizer.fit(train)?;

        let features = featurizer.transform_batch(train)?;
        let labels = train.labels();

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&features)?;

        let mut regressor = SdcaRegressor::new()
            .l2_regularization(self.options.l2_regularization)
            .max_iter(self.options.max_iter)
            .tolerance(self.options.tolerance)
            .random_state(self.options.seed);
        regressor.fit(&scaled, &labels)?;

        info!(
            "fitted fare model on {} trips with {} features",
            train.len(),
            featurizer.n_features()
        );

        Ok(FareModel {
            featurizer,
            scaler,
            regressor,
        })
    }
}

/// A fitted fare model. Immutable; every prediction goes through the same
/// vocabularies and scaler statistics learned at fit time.
#[derive(Clone, Debug)]
pub struct FareModel {
    featurizer: TripFeaturizer,
    scaler: StandardScaler,
    regressor: SdcaRegressor,
}

impl FareModel {
    pub fn featurizer(&self) -> &TripFeaturizer {
        &self.featurizer
    }

    pub fn regressor(&self) -> &SdcaRegressor {
        &self.regressor
    }

    pub fn predict(&self, trip: &TaxiTrip) -> Result<f64> {
        let features = self.featurizer.transform(trip)?;
        let scaled = self.scaler.transform_row(features.view())?;
        self.regressor.predict_one(scaled.view())
    }

    pub fn predict_batch(&self, trips: &TaxiDataset) -> Result<Vector> {
        let features = self.featurizer.transform_batch(trips)?;
        let scaled = self.scaler.transform(&features)?;
        self.regressor.predict(&scaled)
    }

    pub fn evaluate(&self, test: &TaxiDataset) -> Result<RegressionMetrics> {
        let predictions = self.predict_batch(test)?;
        RegressionMetrics::compute(&test.labels(), &predictions)
    }
}
