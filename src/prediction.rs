use std::fmt;
use std::time::{Duration, Instant};

use log::debug;

use crate::dataset::TaxiTrip;
use crate::error::Result;
use crate::pipeline::FareModel;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FarePrediction {
    pub fare_amount: f64,
    pub elapsed: Duration,
}

impl FarePrediction {
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }
}

impl fmt::Display for FarePrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "The predicted fare amount: ${:.2}", self.fare_amount)?;
        write!(f, "Prediction took {} ms", self.elapsed_ms())
    }
}

/// Single-record predictions against a fitted model, with latency.
#[derive(Clone, Copy, Debug)]
pub struct PredictionEngine<'a> {
    model: &'a FareModel,
}

impl<'a> PredictionEngine<'a> {
    pub fn new(model: &'a FareModel) -> Self {
        Self { model }
    }

    pub fn predict(&self, trip: &TaxiTrip) -> Result<FarePrediction> {
        let start = Instant::now();
        let fare_amount = self.model.predict(trip)?;
        let elapsed = start.elapsed();

        debug!("predicted {:.4} for {:?} in {:?}", fare_amount, trip, elapsed);
        Ok(FarePrediction {
            fare_amount,
            elapsed,
        })
    }
}
