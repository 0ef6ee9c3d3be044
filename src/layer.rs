//! A single dense layer transition: weights, biases, and their update rule.

use rand::Rng;

use crate::matmul::gemm_f64;
use crate::{Error, Result};

/// One layer transition of the network.
///
/// Weights are stored row-major with shape `(in_dim, out_dim)`, so a batch
/// `(rows, in_dim)` maps to pre-activations via `z = x W + b`. Biases have
/// shape `(out_dim,)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    in_dim: usize,
    out_dim: usize,
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl Layer {
    /// Create a layer with every weight *and* bias entry drawn uniformly
    /// from `[-bound, bound]`.
    pub fn new_with_rng<R: Rng + ?Sized>(
        in_dim: usize,
        out_dim: usize,
        bound: f64,
        rng: &mut R,
    ) -> Self {
        let mut weights = vec![0.0; in_dim * out_dim];
        for w in &mut weights {
            *w = rng.gen_range(-bound..=bound);
        }
        let mut biases = vec![0.0; out_dim];
        for b in &mut biases {
            *b = rng.gen_range(-bound..=bound);
        }

        Self {
            in_dim,
            out_dim,
            weights,
            biases,
        }
    }

    /// Rebuild a layer from stored parameters, validating shapes and
    /// finiteness.
    pub fn from_parts(
        in_dim: usize,
        out_dim: usize,
        weights: Vec<f64>,
        biases: Vec<f64>,
    ) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(Error::InvalidData(format!(
                "layer dims must be > 0, got in_dim={in_dim} out_dim={out_dim}"
            )));
        }
        let expected_w = in_dim
            .checked_mul(out_dim)
            .ok_or_else(|| Error::InvalidData("layer weight shape overflow".to_owned()))?;
        if weights.len() != expected_w {
            return Err(Error::InvalidData(format!(
                "weights length {} does not match in_dim * out_dim ({in_dim} * {out_dim})",
                weights.len()
            )));
        }
        if biases.len() != out_dim {
            return Err(Error::InvalidData(format!(
                "biases length {} does not match out_dim {out_dim}",
                biases.len()
            )));
        }
        if weights.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "weights must contain only finite values".to_owned(),
            ));
        }
        if biases.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "biases must contain only finite values".to_owned(),
            ));
        }

        Ok(Self {
            in_dim,
            out_dim,
            weights,
            biases,
        })
    }

    #[inline]
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    #[inline]
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    #[inline]
    /// Row-major `(in_dim, out_dim)` weight matrix.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    #[inline]
    pub fn weights_mut(&mut self) -> &mut [f64] {
        &mut self.weights
    }

    #[inline]
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    #[inline]
    pub fn biases_mut(&mut self) -> &mut [f64] {
        &mut self.biases
    }

    /// Pre-activation forward pass for a batch: `out = input W + b`.
    ///
    /// The activation (or softmax) is applied by the caller.
    ///
    /// Shape contract:
    /// - `input.len() == rows * in_dim`
    /// - `out.len() == rows * out_dim`
    #[inline]
    pub fn linear_batch(&self, input: &[f64], rows: usize, out: &mut [f64]) {
        debug_assert_eq!(input.len(), rows * self.in_dim);
        debug_assert_eq!(out.len(), rows * self.out_dim);

        // Broadcast the bias into every output row, then accumulate the
        // matrix product on top of it.
        for row in out.chunks_exact_mut(self.out_dim) {
            row.copy_from_slice(&self.biases);
        }
        gemm_f64(
            rows,
            self.out_dim,
            self.in_dim,
            1.0,
            input,
            self.in_dim,
            1,
            &self.weights,
            self.out_dim,
            1,
            1.0,
            out,
            self.out_dim,
            1,
        );
    }

    /// Gradient-descent update from this layer's cached inputs and error
    /// signals, applied in place:
    ///
    /// - `W -= lr * (input^T deltas + reg_term)`
    /// - `b -= lr * column_sums(deltas)`
    ///
    /// The L2 term is the column-sum form: every entry in column `j` is
    /// shifted by `lr * reg_lambda * sum_rows(W[:, j])`, not the entrywise
    /// `lr * reg_lambda * W[i][j]`. Column sums are taken from the weights
    /// as they were before this update.
    ///
    /// Gradients are summed over the batch, not averaged; scale `lr` if a
    /// per-sample-normalized step is wanted.
    ///
    /// Shape contract:
    /// - `input.len() == rows * in_dim`
    /// - `deltas.len() == rows * out_dim`
    pub fn apply_update(&mut self, input: &[f64], deltas: &[f64], rows: usize, lr: f64, reg_lambda: f64) {
        debug_assert_eq!(input.len(), rows * self.in_dim);
        debug_assert_eq!(deltas.len(), rows * self.out_dim);

        // L2 term first, column by column, so no scratch is needed: the
        // per-column sum is read out before any entry in that column moves,
        // and the data term below commutes with it.
        if reg_lambda != 0.0 {
            for j in 0..self.out_dim {
                let mut col = 0.0_f64;
                for i in 0..self.in_dim {
                    col += self.weights[i * self.out_dim + j];
                }
                let adj = lr * reg_lambda * col;
                for i in 0..self.in_dim {
                    self.weights[i * self.out_dim + j] -= adj;
                }
            }
        }

        // W -= lr * input^T deltas, with the transpose expressed via strides.
        gemm_f64(
            self.in_dim,
            self.out_dim,
            rows,
            -lr,
            input,
            1,
            self.in_dim,
            deltas,
            self.out_dim,
            1,
            1.0,
            &mut self.weights,
            self.out_dim,
            1,
        );

        for j in 0..self.out_dim {
            let mut col = 0.0_f64;
            for row in deltas.chunks_exact(self.out_dim) {
                col += row[j];
            }
            self.biases[j] -= lr * col;
        }
    }
}
