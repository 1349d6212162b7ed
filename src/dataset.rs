use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Column names in file order. The loader reads by position only.
pub const COLUMNS: [&str; 7] = [
    "vendor_id",
    "rate_code",
    "passenger_count",
    "trip_time_in_secs",
    "trip_distance",
    "payment_type",
    "fare_amount",
];

const NUMERIC_INDICES: [usize; 5] = [1, 2, 3, 4, 6];

/// One row of the taxi fare file.
///
/// Prediction inputs use the same type; `fare_amount` is ignored there.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaxiTrip {
    pub vendor_id: String,
    pub rate_code: f64,
    pub passenger_count: f64,
    pub trip_time_in_secs: f64,
    pub trip_distance: f64,
    pub payment_type: String,
    pub fare_amount: f64,
}

impl TaxiTrip {
    /// Builds an unlabeled trip for prediction.
    pub fn query(
        vendor_id: &str,
        rate_code: f64,
        passenger_count: f64,
        trip_time_in_secs: f64,
        trip_distance: f64,
        payment_type: &str,
    ) -> Self {
        Self {
            vendor_id: vendor_id.to_string(),
            rate_code,
            passenger_count,
            trip_time_in_secs,
            trip_distance,
            payment_type: payment_type.to_string(),
            fare_amount: 0.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaxiDataset {
    pub trips: Vec<TaxiTrip>,
}

impl TaxiDataset {
    pub fn new(trips: Vec<TaxiTrip>) -> Self {
        Self { trips }
    }

    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_reader(file)?;
        info!("loaded {} trips from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut trips = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            let line = record.position().map_or(idx as u64 + 1, |p| p.line());

            if record.len() != COLUMNS.len() {
                return Err(Error::FieldCount {
                    line,
                    expected: COLUMNS.len(),
                    found: record.len(),
                });
            }

            match record.deserialize::<TaxiTrip>(None) {
                Ok(trip) => match diagnose(&record, line) {
                    Some(err) => return Err(err),
                    None => trips.push(trip),
                },
                Err(_) if idx == 0 && looks_like_header(&record) => {
                    debug!("skipping header line: {:?}", record);
                }
                Err(err) => return Err(diagnose(&record, line).unwrap_or(Error::Csv(err))),
            }
        }

        if trips.is_empty() {
            return Err(Error::EmptyDataset);
        }

        Ok(Self { trips })
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TaxiTrip> {
        self.trips.iter()
    }

    pub fn labels(&self) -> crate::Vector {
        self.trips.iter().map(|t| t.fare_amount).collect()
    }

    /// Partitions the rows into `(train, test)` subsets.
    ///
    /// Rows are assigned by a shuffle seeded from `seed`; each subset keeps
    /// the relative order the rows had in `self`.
    pub fn train_test_split(&self, test_fraction: f64, seed: u64) -> Result<(Self, Self)> {
        let (train_idx, test_idx) = split_indices(self.len(), test_fraction, seed)?;

        let pick = |indices: &[usize]| -> Self {
            Self::new(indices.iter().map(|&i| self.trips[i].clone()).collect())
        };
        let (train, test) = (pick(&train_idx), pick(&test_idx));

        info!(
            "split {} trips into {} train / {} test (seed {})",
            self.len(),
            train.len(),
            test.len(),
            seed
        );
        Ok((train, test))
    }
}

impl<'a> IntoIterator for &'a TaxiDataset {
    type Item = &'a TaxiTrip;
    type IntoIter = std::slice::Iter<'a, TaxiTrip>;

    fn into_iter(self) -> Self::IntoIter {
        self.trips.iter()
    }
}

/// Returns sorted `(train, test)` row indices for `n_samples` rows.
pub fn split_indices(
    n_samples: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(Error::InvalidParameter(format!(
            "test_fraction must be between 0 and 1, got {}",
            test_fraction
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = (n_samples as f64 * test_fraction).round() as usize;
    let mut test = indices[..n_test].to_vec();
    let mut train = indices[n_test..].to_vec();
    test.sort_unstable();
    train.sort_unstable();

    Ok((train, test))
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

// A header has no number in any numeric column.
fn looks_like_header(record: &StringRecord) -> bool {
    NUMERIC_INDICES
        .iter()
        .all(|&i| record.get(i).is_some_and(|value| value.parse::<f64>().is_err()))
}

// Names the first numeric column that is not a finite number.
fn diagnose(record: &StringRecord, line: u64) -> Option<Error> {
    NUMERIC_INDICES.iter().find_map(|&i| {
        let value = record.get(i)?;
        match parse_finite(value) {
            Some(_) => None,
            None => Some(Error::Parse {
                line,
                column: COLUMNS[i],
                value: value.to_string(),
            }),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
CMT,1,1,1271,3.8,CRD,17.5
CMT,1,1,474,1.5,CRD,8
VTS,1,1,637,1.4,CSH,8.5
VTS,2,5,1500,18.43,CRD,52
CMT,1,2,181,0.6,CSH,4.5
";

    #[test]
    fn test_load_positional_rows() {
        let dataset = TaxiDataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 5);

        let first = &dataset.trips[0];
        assert_eq!(first.vendor_id, "CMT");
        assert_eq!(first.rate_code, 1.0);
        assert_eq!(first.trip_time_in_secs, 1271.0);
        assert_eq!(first.payment_type, "CRD");
        assert_eq!(first.fare_amount, 17.5);

        assert_eq!(dataset.labels().len(), 5);
    }

    #[test]
    fn test_load_skips_leading_header() {
        let input = format!("{}\n{}", COLUMNS.join(","), SAMPLE);
        let dataset = TaxiDataset::from_reader(input.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 5);
        assert_eq!(dataset.trips[0].vendor_id, "CMT");
    }

    #[test]
    fn test_load_rejects_non_numeric_value() {
        let input = "CMT,1,1,1271,3.8,CRD,17.5\nVTS,1,two,637,1.4,CSH,8.5\n";
        let err = TaxiDataset::from_reader(input.as_bytes()).unwrap_err();
        match err {
            Error::Parse { line, column, value } => {
                assert_eq!(line, 2);
                assert_eq!(column, "passenger_count");
                assert_eq!(value, "two");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_rejects_non_finite_value() {
        for bad in ["NaN", "inf", "-inf"] {
            let input = format!("{}VTS,1,1,{},2.0,CRD,7\n", SAMPLE, bad);
            let err = TaxiDataset::from_reader(input.as_bytes()).unwrap_err();
            match err {
                Error::Parse { line, column, value } => {
                    assert_eq!(line, 6);
                    assert_eq!(column, "trip_time_in_secs");
                    assert_eq!(value, bad);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_load_rejects_non_finite_label() {
        let input = "CMT,1,1,1271,3.8,CRD,NaN\n";
        let err = TaxiDataset::from_reader(input.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, column: "fare_amount", .. }));
    }

    #[test]
    fn test_load_rejects_malformed_first_row() {
        let input = format!("CMT,1,1,abc,3.8,CRD,oops\n{}", SAMPLE);
        let err = TaxiDataset::from_reader(input.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, column: "trip_time_in_secs", .. }));
    }

    #[test]
    fn test_load_rejects_wrong_field_count() {
        let input = "CMT,1,1,1271,3.8,CRD,17.5\nVTS,1,1,637,1.4,CSH\n";
        let err = TaxiDataset::from_reader(input.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            Error::FieldCount { line: 2, expected: 7, found: 6 }
        ));
    }

    #[test]
    fn test_load_rejects_header_after_first_line() {
        let input = format!("{}{}\n", SAMPLE, COLUMNS.join(","));
        assert!(TaxiDataset::from_reader(input.as_bytes()).is_err());
    }

    #[test]
    fn test_load_empty_input() {
        let err = TaxiDataset::from_reader("".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::EmptyDataset));
    }

    #[test]
    fn test_from_csv_missing_file() {
        let err = TaxiDataset::from_csv("does/not/exist.csv").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_from_csv_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let dataset = TaxiDataset::from_csv(file.path()).unwrap();
        assert_eq!(dataset.len(), 5);
    }

    #[test]
    fn test_train_test_split_sizes() {
        let (train, test) = split_indices(100, 0.2, 0).unwrap();
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
    }

    #[test]
    fn test_train_test_split_is_disjoint_and_complete() {
        let (train, test) = split_indices(57, 0.2, 0).unwrap();
        let mut all: Vec<usize> = train.iter().chain(test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..57).collect::<Vec<_>>());
    }

    #[test]
    fn test_train_test_split_is_deterministic() {
        let dataset = TaxiDataset::from_reader(SAMPLE.repeat(10).as_bytes()).unwrap();

        let (train_a, test_a) = dataset.train_test_split(0.2, 0).unwrap();
        let (train_b, test_b) = dataset.train_test_split(0.2, 0).unwrap();
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);

        let (a, _) = split_indices(1000, 0.2, 0).unwrap();
        let (b, _) = split_indices(1000, 0.2, 1).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_train_test_split_invalid_fraction() {
        let dataset = TaxiDataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert!(dataset.train_test_split(0.0, 0).is_err());
        assert!(dataset.train_test_split(1.0, 0).is_err());
    }
}
