//! Contiguous dataset storage for classification.
//!
//! The training loop operates on slices to avoid per-step allocations.
//! `Dataset` couples a row-major feature matrix `X` with integer class
//! labels `y` and validates both at construction, so the hot path can rely
//! on their shapes without re-checking.

use crate::{Error, Result};

/// A supervised classification dataset: features `X` and labels `y`.
///
/// Stored as a contiguous row-major buffer plus a label vector:
/// - `inputs.len() == len * input_dim`
/// - `labels.len() == len`, every label in `[0, n_classes)`
#[derive(Debug, Clone)]
pub struct Dataset {
    inputs: Vec<f64>,
    labels: Vec<usize>,
    len: usize,
    input_dim: usize,
    n_classes: usize,
}

impl Dataset {
    /// Build a dataset from a flat `(len, input_dim)` feature buffer and a
    /// label vector.
    pub fn from_flat(
        inputs: Vec<f64>,
        labels: Vec<usize>,
        input_dim: usize,
        n_classes: usize,
    ) -> Result<Self> {
        if input_dim == 0 {
            return Err(Error::InvalidData("input_dim must be > 0".to_owned()));
        }
        if n_classes == 0 {
            return Err(Error::InvalidData("n_classes must be > 0".to_owned()));
        }
        if inputs.len() % input_dim != 0 {
            return Err(Error::InvalidShape(format!(
                "inputs length {} is not divisible by input_dim {input_dim}",
                inputs.len()
            )));
        }

        let len = inputs.len() / input_dim;
        if labels.len() != len {
            return Err(Error::InvalidShape(format!(
                "X has {len} samples but y has {}",
                labels.len()
            )));
        }
        if let Some(&bad) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(Error::InvalidData(format!(
                "label {bad} is out of range for {n_classes} classes"
            )));
        }

        Ok(Self {
            inputs,
            labels,
            len,
            input_dim,
            n_classes,
        })
    }

    /// Build a dataset from per-sample feature rows.
    ///
    /// This is a convenience constructor (it copies into contiguous storage).
    pub fn from_rows(inputs: &[Vec<f64>], labels: &[usize], n_classes: usize) -> Result<Self> {
        if inputs.is_empty() {
            return Err(Error::InvalidData("inputs must not be empty".to_owned()));
        }

        let input_dim = inputs[0].len();
        for (i, row) in inputs.iter().enumerate() {
            if row.len() != input_dim {
                return Err(Error::InvalidShape(format!(
                    "input row {i} has len {}, expected {input_dim}",
                    row.len()
                )));
            }
        }

        let mut flat = Vec::with_capacity(inputs.len() * input_dim);
        for row in inputs {
            flat.extend_from_slice(row);
        }

        Self::from_flat(flat, labels.to_vec(), input_dim, n_classes)
    }

    #[inline]
    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    /// Returns true if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    /// Returns the per-sample feature dimension.
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[inline]
    /// Returns the number of classes the labels are drawn from.
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    #[inline]
    /// Returns the `idx`-th feature row (shape: `(input_dim,)`).
    ///
    /// Panics if `idx >= len`.
    pub fn input(&self, idx: usize) -> &[f64] {
        let start = idx * self.input_dim;
        &self.inputs[start..start + self.input_dim]
    }

    #[inline]
    /// Returns the `idx`-th label.
    ///
    /// Panics if `idx >= len`.
    pub fn label(&self, idx: usize) -> usize {
        self.labels[idx]
    }

    #[inline]
    /// Returns the whole feature matrix as a flat row-major slice.
    pub fn inputs_flat(&self) -> &[f64] {
        &self.inputs
    }

    #[inline]
    /// Returns all labels.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// One-hot encodes the labels into a `(len, n_classes)` matrix.
    pub fn one_hot(&self) -> Vec<f64> {
        one_hot(&self.labels, self.n_classes)
    }
}

/// One-hot encodes integer labels into a flat row-major `(labels.len(),
/// n_classes)` indicator matrix: row `i` is all zeros except a single 1 at
/// column `labels[i]`.
///
/// Panics if any label is `>= n_classes`.
pub fn one_hot(labels: &[usize], n_classes: usize) -> Vec<f64> {
    let mut out = vec![0.0; labels.len() * n_classes];
    for (i, &label) in labels.iter().enumerate() {
        assert!(
            label < n_classes,
            "label {label} is out of range for {n_classes} classes"
        );
        out[i * n_classes + label] = 1.0;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_flat_validates_shapes() {
        let ok = Dataset::from_flat(vec![0.0, 1.0, 2.0, 3.0], vec![0, 1], 2, 2);
        assert!(ok.is_ok());

        // Not divisible by input_dim.
        let err = Dataset::from_flat(vec![0.0, 1.0, 2.0], vec![0], 2, 2);
        assert!(matches!(err, Err(Error::InvalidShape(_))));

        // X/y sample counts differ.
        let err = Dataset::from_flat(vec![0.0, 1.0, 2.0, 3.0], vec![0], 2, 2);
        assert!(matches!(err, Err(Error::InvalidShape(_))));
    }

    #[test]
    fn from_flat_rejects_out_of_range_labels() {
        let err = Dataset::from_flat(vec![0.0, 1.0], vec![3], 2, 2);
        assert!(matches!(err, Err(Error::InvalidData(_))));
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let rows = vec![vec![0.0, 1.0], vec![2.0]];
        let err = Dataset::from_rows(&rows, &[0, 1], 2);
        assert!(matches!(err, Err(Error::InvalidShape(_))));
    }

    #[test]
    fn one_hot_has_single_one_per_row() {
        let labels = [2_usize, 0, 1, 1];
        let mat = one_hot(&labels, 3);
        assert_eq!(mat.len(), 4 * 3);

        for (i, &label) in labels.iter().enumerate() {
            let row = &mat[i * 3..(i + 1) * 3];
            let ones = row.iter().filter(|&&v| v == 1.0).count();
            let zeros = row.iter().filter(|&&v| v == 0.0).count();
            assert_eq!(ones, 1);
            assert_eq!(zeros, 2);
            assert_eq!(row[label], 1.0);
        }
    }

    #[test]
    fn dataset_accessors_return_rows() {
        let data =
            Dataset::from_flat(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![0, 2, 1], 2, 3).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.input(1), &[3.0, 4.0]);
        assert_eq!(data.label(1), 2);
        assert_eq!(data.one_hot()[..3], [1.0, 0.0, 0.0]);
    }
}
