use std::collections::HashMap;

use ndarray::{ArrayView1, ArrayViewMut1, Axis};

use crate::error::{Error, Result};
use crate::{Matrix, Vector};

/// Maps a categorical column onto indicator vectors.
///
/// The vocabulary is every distinct non-empty value seen by `fit`, in order
/// of first appearance. Values outside it encode as all zeros.
#[derive(Clone, Debug, Default)]
pub struct OneHotEncoder {
    vocabulary: Option<Vec<String>>,
    index: HashMap<String, usize>,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit<'a, I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut vocabulary = Vec::new();
        let mut index = HashMap::new();

        for value in values.into_iter().map(str::trim) {
            if value.is_empty() || index.contains_key(value) {
                continue;
            }
            index.insert(value.to_string(), vocabulary.len());
            vocabulary.push(value.to_string());
        }

        self.vocabulary = Some(vocabulary);
        self.index = index;
        Ok(())
    }

    pub fn vocabulary(&self) -> Option<&[String]> {
        self.vocabulary.as_deref()
    }

    pub fn n_categories(&self) -> usize {
        self.vocabulary.as_ref().map_or(0, Vec::len)
    }

    /// Position of `value` in the vocabulary, if it was seen during fit.
    pub fn category_index(&self, value: &str) -> Option<usize> {
        self.index.get(value.trim()).copied()
    }

    pub fn transform(&self, value: &str) -> Result<Vector> {
        let mut encoded = Vector::zeros(self.fitted_len()?);
        self.encode_into(value, encoded.view_mut())?;
        Ok(encoded)
    }

    /// Writes the encoding of `value` into `out`, which must be zeroed and
    /// exactly `n_categories()` long.
    pub fn encode_into(&self, value: &str, mut out: ArrayViewMut1<f64>) -> Result<()> {
        let n = self.fitted_len()?;
        if out.len() != n {
            return Err(Error::DimensionMismatch(format!(
                "encoding buffer has {} slots, vocabulary has {}",
                out.len(),
                n
            )));
        }
        if let Some(i) = self.category_index(value) {
            out[i] = 1.0;
        }
        Ok(())
    }

    fn fitted_len(&self) -> Result<usize> {
        self.vocabulary
            .as_ref()
            .map(Vec::len)
            .ok_or(Error::NotFitted("OneHotEncoder"))
    }
}

#[derive(Clone, Debug, Default)]
pub struct StandardScaler {
    mean: Option<Vector>,
    scale: Option<Vector>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, data: &Matrix) -> Result<()> {
        let mean = data.mean_axis(Axis(0)).ok_or(Error::EmptyDataset)?;
        // Constant columns are only centered.
        let scale = data
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 1e-10 { s } else { 1.0 });

        self.mean = Some(mean);
        self.scale = Some(scale);
        Ok(())
    }

    pub fn transform(&self, data: &Matrix) -> Result<Matrix> {
        let mut result = data.clone();
        for row in result.axis_iter_mut(Axis(0)) {
            self.apply(row)?;
        }
        Ok(result)
    }

    pub fn transform_row(&self, row: ArrayView1<f64>) -> Result<Vector> {
        let mut result = row.to_owned();
        self.apply(result.view_mut())?;
        Ok(result)
    }

    pub fn fit_transform(&mut self, data: &Matrix) -> Result<Matrix> {
        self.fit(data)?;
        self.transform(data)
    }

    pub fn mean(&self) -> Option<&Vector> {
        self.mean.as_ref()
    }

    pub fn scale(&self) -> Option<&Vector> {
        self.scale.as_ref()
    }

    fn apply(&self, mut row: ArrayViewMut1<f64>) -> Result<()> {
        let mean = self.mean.as_ref().ok_or(Error::NotFitted("StandardScaler"))?;
        let scale = self.scale.as_ref().ok_or(Error::NotFitted("StandardScaler"))?;

        if row.len() != mean.len() {
            return Err(Error::DimensionMismatch(format!(
                "row has {} features, scaler was fitted on {}",
                row.len(),
                mean.len()
            )));
        }

        row -= mean;
        row /= scale;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_one_hot_vocabulary_in_first_seen_order() {
        let mut encoder = OneHotEncoder::new();
        encoder.fit(["VTS", "CMT", "VTS", " CMT ", "DDS"]).unwrap();

        assert_eq!(encoder.vocabulary().unwrap(), ["VTS", "CMT", "DDS"]);
        assert_eq!(encoder.transform("CMT").unwrap(), array![0.0, 1.0, 0.0]);
        assert_eq!(encoder.transform("DDS").unwrap(), array![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_one_hot_unknown_and_missing_values_are_zero() {
        let mut encoder = OneHotEncoder::new();
        encoder.fit(["CRD", "", "CSH"]).unwrap();

        assert_eq!(encoder.n_categories(), 2);
        assert_eq!(encoder.transform("NOC").unwrap(), array![0.0, 0.0]);
        assert_eq!(encoder.transform("").unwrap(), array![0.0, 0.0]);
    }

    #[test]
    fn test_one_hot_not_fitted() {
        let encoder = OneHotEncoder::new();
        assert!(matches!(
            encoder.transform("CRD"),
            Err(Error::NotFitted("OneHotEncoder"))
        ));
    }

    #[test]
    fn test_one_hot_encode_into_wrong_length() {
        let mut encoder = OneHotEncoder::new();
        encoder.fit(["CRD", "CSH"]).unwrap();

        let mut buffer = Vector::zeros(3);
        assert!(encoder.encode_into("CRD", buffer.view_mut()).is_err());
    }

    #[test]
    fn test_standard_scaler() {
        let data = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let mut scaler = StandardScaler::new();

        let scaled = scaler.fit_transform(&data).unwrap();
        assert_eq!(scaled.shape(), data.shape());

        let means = scaled.mean_axis(Axis(0)).unwrap();
        let stds = scaled.std_axis(Axis(0), 0.0);
        for j in 0..2 {
            assert_abs_diff_eq!(means[j], 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(stds[j], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_standard_scaler_constant_column() {
        let data = array![[1.0, 7.0], [3.0, 7.0]];
        let mut scaler = StandardScaler::new();

        let scaled = scaler.fit_transform(&data).unwrap();
        assert!(scaled.iter().all(|v| v.is_finite()));
        assert_abs_diff_eq!(scaled[(0, 1)], 0.0);
        assert_abs_diff_eq!(scaled[(1, 1)], 0.0);
    }

    #[test]
    fn test_standard_scaler_transform_row_matches_batch() {
        let data = array![[1.0, 10.0], [2.0, 30.0], [4.0, 20.0]];
        let mut scaler = StandardScaler::new();
        let batch = scaler.fit_transform(&data).unwrap();

        let row = scaler.transform_row(data.row(1)).unwrap();
        assert_eq!(row, batch.row(1));
    }

    #[test]
    fn test_standard_scaler_not_fitted() {
        let scaler = StandardScaler::new();
        assert!(scaler.transform(&array![[1.0]]).is_err());
    }
}
