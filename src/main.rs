use std::env;
use std::path::PathBuf;

use env_logger::{Builder, Env};
use log::info;
use taxi_fare::{FarePipeline, PipelineOptions, PredictionEngine, TaxiDataset, TaxiTrip};

const DATA_FILE: &str = "taxi-fare-train.csv";

// Next to the executable first, then the working directory.
fn data_path() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DATA_FILE)))
        .filter(|path| path.is_file())
        .unwrap_or_else(|| PathBuf::from(DATA_FILE))
}

fn example_trips() -> Vec<TaxiTrip> {
    vec![
        TaxiTrip::query("VTS", 1.0, 6.0, 900.0, 5.0, "CRD"),
        TaxiTrip::query("CMT", 2.0, 2.0, 1200.0, 7.0, "CRD"),
        TaxiTrip::query("CMT", 1.0, 3.0, 297.0, 15.0, "CSH"),
    ]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    Builder::from_env(Env::default().default_filter_or("warn")).init();

    let options = PipelineOptions::default();
    let path = data_path();
    info!("reading trips from {}", path.display());

    let data = TaxiDataset::from_csv(&path)?;
    let (train, test) = data.train_test_split(options.test_fraction, options.seed)?;

    let model = FarePipeline::new(options).fit(&train)?;

    let metrics = model.evaluate(&test)?;
    println!("RMS error: {}", metrics.root_mean_squared_error);
    println!("RSquared: {}\n", metrics.r_squared);

    let engine = PredictionEngine::new(&model);
    for trip in example_trips() {
        let prediction = engine.predict(&trip)?;
        println!("{}\n", prediction);
    }

    Ok(())
}
