//! The classifier itself: parameter storage, forward and backward engines,
//! and the shape-checked evaluation API.
//!
//! The hot path (`forward_batch` / `backward_batch`) treats shape mismatches
//! as programmer error and panics via `assert!`; the convenience surface
//! (`predict`, `compute_loss`, `score`, `fit`) validates inputs and returns
//! [`Result`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::activation::softmax_rows;
use crate::loss::{cross_entropy_mean, l2_penalty};
use crate::matmul::gemm_f64;
use crate::metrics::accuracy;
use crate::{Dataset, Error, Layer, MlpConfig, Result};

/// A softmax MLP classifier.
///
/// Construction validates the configuration but allocates no parameters;
/// they are created by [`Mlp::fit`](crate::Mlp) (or one of the
/// `initialize_*` methods) and mutated in place, one mini-batch at a time.
#[derive(Debug, Clone)]
pub struct Mlp {
    cfg: MlpConfig,
    layers: Vec<Layer>,
}

/// Reusable per-batch activation buffers, one per non-input layer.
///
/// The output of the most recent forward pass lives inside the scratch.
/// Buffers are resized whenever the row count changes (e.g. for a short
/// final batch), not reallocated per step.
#[derive(Debug, Clone)]
pub struct BatchScratch {
    /// Output widths of each non-input layer, fixed by the model topology.
    widths: Vec<usize>,
    acts: Vec<Vec<f64>>,
    rows: usize,
}

/// Reusable per-batch error-signal buffers, shaped like the activations.
///
/// Contents are fully overwritten by every backward call; nothing carries
/// over between batches.
#[derive(Debug, Clone)]
pub struct DeltaScratch {
    widths: Vec<usize>,
    bufs: Vec<Vec<f64>>,
    rows: usize,
}

impl Mlp {
    /// Validate `cfg` and wrap it in an unparameterized model.
    pub fn new(cfg: MlpConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            layers: Vec::new(),
        })
    }

    /// Rebuild a model from a config and explicit layers (e.g. loaded from
    /// disk), validating that the layer chain matches the configured
    /// topology.
    pub fn from_parts(cfg: MlpConfig, layers: Vec<Layer>) -> Result<Self> {
        cfg.validate()?;

        let widths = cfg.layer_widths();
        if layers.len() != widths.len() - 1 {
            return Err(Error::InvalidData(format!(
                "expected {} layers for this topology, got {}",
                widths.len() - 1,
                layers.len()
            )));
        }
        for (i, (layer, w)) in layers.iter().zip(widths.windows(2)).enumerate() {
            if layer.in_dim() != w[0] || layer.out_dim() != w[1] {
                return Err(Error::InvalidData(format!(
                    "layer {i} has shape ({}, {}), expected ({}, {})",
                    layer.in_dim(),
                    layer.out_dim(),
                    w[0],
                    w[1]
                )));
            }
        }

        Ok(Self { cfg, layers })
    }

    #[inline]
    pub fn config(&self) -> &MlpConfig {
        &self.cfg
    }

    #[inline]
    /// True once parameters exist (after `fit` or an initializer).
    pub fn is_initialized(&self) -> bool {
        !self.layers.is_empty()
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn layer(&self, idx: usize) -> Option<&Layer> {
        self.layers.get(idx)
    }

    #[inline]
    pub fn layer_mut(&mut self, idx: usize) -> Option<&mut Layer> {
        self.layers.get_mut(idx)
    }

    /// Create fresh parameters from a deterministic seed.
    pub fn initialize_with_seed(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        self.initialize_with_rng(&mut rng);
    }

    /// Create fresh parameters, discarding any existing ones.
    ///
    /// For each consecutive pair of layer widths the uniform bound comes
    /// from the configured activation's fan-in/fan-out rule; weights and
    /// biases are then drawn from `[-bound, bound]` using `rng` alone, so
    /// one seed reproduces the whole initialization.
    pub fn initialize_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let widths = self.cfg.layer_widths();
        self.layers.clear();
        self.layers.reserve(widths.len() - 1);
        for w in widths.windows(2) {
            let bound = self.cfg.activation.init_bound(w[0], w[1]);
            self.layers.push(Layer::new_with_rng(w[0], w[1], bound, rng));
        }
    }

    /// Allocate activation buffers sized for the configured batch size.
    pub fn scratch(&self) -> BatchScratch {
        BatchScratch::with_rows(&self.cfg, self.cfg.batch_size)
    }

    /// Allocate error-signal buffers sized for the configured batch size.
    pub fn delta_scratch(&self) -> DeltaScratch {
        DeltaScratch::with_rows(&self.cfg, self.cfg.batch_size)
    }

    /// Forward pass over a batch.
    ///
    /// Fills `scratch` with every layer's post-activation output (hidden
    /// layers through the configured activation, the output layer through
    /// row-wise softmax) and returns the `(rows, n_classes)` probability
    /// matrix, which is the last scratch buffer.
    ///
    /// Shape contract (panics on violation):
    /// - the model is initialized
    /// - `input.len() == rows * input_dim`, `rows > 0`
    /// - `scratch` was built for this model's topology
    pub fn forward_batch<'a>(
        &self,
        input: &[f64],
        rows: usize,
        scratch: &'a mut BatchScratch,
    ) -> &'a [f64] {
        assert!(
            self.is_initialized(),
            "model has no parameters; call fit or an initializer first"
        );
        assert!(rows > 0, "forward_batch requires at least one row");
        assert_eq!(
            input.len(),
            rows * self.cfg.input_dim,
            "input len {} does not match rows * input_dim ({rows} * {})",
            input.len(),
            self.cfg.input_dim
        );
        scratch.ensure_rows(&self.cfg, rows);

        let n_layers = self.layers.len();
        for (idx, layer) in self.layers.iter().enumerate() {
            if idx == 0 {
                layer.linear_batch(input, rows, &mut scratch.acts[0]);
            } else {
                // Borrow the previous output immutably and the current one
                // mutably.
                let (left, right) = scratch.acts.split_at_mut(idx);
                layer.linear_batch(&left[idx - 1], rows, &mut right[0]);
            }

            let out = &mut scratch.acts[idx];
            if idx + 1 < n_layers {
                let act = self.cfg.activation;
                for v in out.iter_mut() {
                    *v = act.forward(*v);
                }
            } else {
                softmax_rows(out, rows, self.cfg.n_classes);
            }
        }

        scratch.output()
    }

    /// Backward pass and in-place parameter update for one batch.
    ///
    /// You must call `forward_batch` first with the same `input` and
    /// `scratch`. `labels` holds each row's true class.
    ///
    /// The output error signal is the softmax output minus the one-hot
    /// target, formed by subtracting 1 at each row's true-class column.
    /// This shortcut is exact for the softmax + cross-entropy pairing only
    /// and must not be reused for other pairings. Hidden error
    /// signals propagate through the transposed weights and the activation
    /// derivative evaluated on the cached outputs. Each layer then takes a
    /// gradient-descent step (see [`Layer::apply_update`]); the configured
    /// momentum coefficient is deliberately not used.
    ///
    /// Shape contract (panics on violation):
    /// - `labels.len() == scratch.rows()`
    /// - `input` is the batch given to the preceding `forward_batch`
    /// - `deltas` was built for this model's topology
    pub fn backward_batch(
        &mut self,
        input: &[f64],
        labels: &[usize],
        scratch: &BatchScratch,
        deltas: &mut DeltaScratch,
    ) {
        assert!(
            self.is_initialized(),
            "model has no parameters; call fit or an initializer first"
        );
        let rows = scratch.rows;
        assert!(rows > 0, "backward_batch requires at least one row");
        assert_eq!(
            labels.len(),
            rows,
            "labels len {} does not match batch rows {rows}",
            labels.len()
        );
        assert_eq!(
            input.len(),
            rows * self.cfg.input_dim,
            "input len {} does not match rows * input_dim ({rows} * {})",
            input.len(),
            self.cfg.input_dim
        );
        deltas.ensure_rows(&self.cfg, rows);

        let n_layers = self.layers.len();
        let n_classes = self.cfg.n_classes;
        let activation = self.cfg.activation;
        let lr = self.cfg.lr;
        let reg_lambda = self.cfg.reg_lambda;

        // Output error signal: probabilities minus the one-hot target.
        {
            let probs = &scratch.acts[n_layers - 1];
            let d_out = &mut deltas.bufs[n_layers - 1];
            d_out.copy_from_slice(probs);
            for (s, &label) in labels.iter().enumerate() {
                d_out[s * n_classes + label] -= 1.0;
            }
        }

        // Hidden error signals, from the output back toward the input:
        // delta_l = (delta_{l+1} W_{l+1}^T) * act'(a_{l+1}).
        for l in (0..n_layers - 1).rev() {
            let next = &self.layers[l + 1];
            let (left, right) = deltas.bufs.split_at_mut(l + 1);
            let d_cur = &mut left[l];
            let d_next = &right[0];

            gemm_f64(
                rows,
                next.in_dim(),
                next.out_dim(),
                1.0,
                d_next,
                next.out_dim(),
                1,
                next.weights(),
                1,
                next.out_dim(),
                0.0,
                d_cur,
                next.in_dim(),
                1,
            );

            for (d, &a) in d_cur.iter_mut().zip(&scratch.acts[l]) {
                *d *= activation.grad_from_output(a);
            }
        }

        // Per-layer updates; each layer reads its own cached input and
        // error signal, so the order does not matter.
        for l in 0..n_layers {
            let layer_input: &[f64] = if l == 0 { input } else { &scratch.acts[l - 1] };
            self.layers[l].apply_update(layer_input, &deltas.bufs[l], rows, lr, reg_lambda);
        }
    }

    /// Per-class probabilities for a flat row-major `(rows, input_dim)`
    /// input matrix. Each returned row sums to 1.
    ///
    /// This is a pure function of the current parameters: it produces
    /// exactly the bytes `forward_batch` would.
    pub fn predict(&self, inputs: &[f64]) -> Result<Vec<f64>> {
        self.require_fitted()?;
        if inputs.is_empty() {
            return Err(Error::InvalidData("inputs must not be empty".to_owned()));
        }
        let input_dim = self.cfg.input_dim;
        if inputs.len() % input_dim != 0 {
            return Err(Error::InvalidShape(format!(
                "inputs length {} is not divisible by input_dim {input_dim}",
                inputs.len()
            )));
        }

        let rows = inputs.len() / input_dim;
        let mut scratch = BatchScratch::with_rows(&self.cfg, rows);
        let probs = self.forward_batch(inputs, rows, &mut scratch);
        Ok(probs.to_vec())
    }

    /// Regularized mean cross-entropy over a whole dataset:
    /// `-1/n * sum(one_hot * ln(probs)) + reg_lambda/2 * sum(w^2)`.
    ///
    /// Probabilities are floored before the logarithm so the result is
    /// always finite.
    pub fn compute_loss(&self, data: &Dataset) -> Result<f64> {
        self.require_fitted()?;
        self.check_dataset(data)?;

        let rows = data.len();
        let mut scratch = BatchScratch::with_rows(&self.cfg, rows);
        let probs = self.forward_batch(data.inputs_flat(), rows, &mut scratch);

        let one_hot = data.one_hot();
        let mut loss = cross_entropy_mean(probs, &one_hot, rows, self.cfg.n_classes);
        loss += self.cfg.reg_lambda / 2.0 * l2_penalty(self.layers.iter().map(Layer::weights));
        Ok(loss)
    }

    /// Classification accuracy over a dataset, in `[0, 1]`.
    pub fn score(&self, data: &Dataset) -> Result<f64> {
        self.require_fitted()?;
        self.check_dataset(data)?;

        let rows = data.len();
        let mut scratch = BatchScratch::with_rows(&self.cfg, rows);
        let probs = self.forward_batch(data.inputs_flat(), rows, &mut scratch);
        Ok(accuracy(probs, data.labels(), self.cfg.n_classes))
    }

    #[inline]
    fn require_fitted(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(Error::NotFitted)
        }
    }

    pub(crate) fn check_dataset(&self, data: &Dataset) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InvalidData("dataset must not be empty".to_owned()));
        }
        if data.input_dim() != self.cfg.input_dim {
            return Err(Error::InvalidShape(format!(
                "dataset input_dim {} does not match model input_dim {}",
                data.input_dim(),
                self.cfg.input_dim
            )));
        }
        if data.n_classes() != self.cfg.n_classes {
            return Err(Error::InvalidShape(format!(
                "dataset has {} classes, model expects {}",
                data.n_classes(),
                self.cfg.n_classes
            )));
        }
        Ok(())
    }
}

impl BatchScratch {
    pub(crate) fn with_rows(cfg: &MlpConfig, rows: usize) -> Self {
        let widths: Vec<usize> = cfg.layer_widths()[1..].to_vec();
        let acts = widths.iter().map(|w| vec![0.0; rows * w]).collect();
        Self { widths, acts, rows }
    }

    fn ensure_rows(&mut self, cfg: &MlpConfig, rows: usize) {
        // Cheap, allocation-free topology check: this runs on every batch.
        assert!(
            widths_match(&self.widths, cfg),
            "scratch was built for a different topology"
        );
        if self.rows != rows {
            for (buf, w) in self.acts.iter_mut().zip(&self.widths) {
                buf.resize(rows * w, 0.0);
            }
            self.rows = rows;
        }
    }

    #[inline]
    /// Rows the buffers are currently shaped for.
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    /// Post-activation output of the `idx`-th non-input layer, shape
    /// `(rows, width)`.
    pub fn activation(&self, idx: usize) -> &[f64] {
        &self.acts[idx]
    }

    #[inline]
    /// The output-layer probabilities from the most recent forward pass.
    pub fn output(&self) -> &[f64] {
        self.acts
            .last()
            .expect("scratch must have at least one buffer")
            .as_slice()
    }
}

impl DeltaScratch {
    pub(crate) fn with_rows(cfg: &MlpConfig, rows: usize) -> Self {
        let widths: Vec<usize> = cfg.layer_widths()[1..].to_vec();
        let bufs = widths.iter().map(|w| vec![0.0; rows * w]).collect();
        Self { widths, bufs, rows }
    }

    fn ensure_rows(&mut self, cfg: &MlpConfig, rows: usize) {
        assert!(
            widths_match(&self.widths, cfg),
            "delta scratch was built for a different topology"
        );
        if self.rows != rows {
            for (buf, w) in self.bufs.iter_mut().zip(&self.widths) {
                buf.resize(rows * w, 0.0);
            }
            self.rows = rows;
        }
    }
}

/// True when `widths` equals the non-input layer widths of `cfg`, checked
/// without building the width list.
fn widths_match(widths: &[usize], cfg: &MlpConfig) -> bool {
    let hidden = &cfg.hidden_layers;
    widths.len() == hidden.len() + 1
        && widths[..hidden.len()] == hidden[..]
        && widths[hidden.len()] == cfg.n_classes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Activation;

    fn small_config() -> MlpConfig {
        let mut cfg = MlpConfig::new(2, 2);
        cfg.hidden_layers = vec![3, 3];
        cfg.activation = Activation::Sigmoid;
        cfg.lr = 1e-2;
        cfg.reg_lambda = 0.0;
        cfg.batch_size = 4;
        cfg
    }

    /// Sum over the batch of `-ln p[true class]`, the objective whose
    /// gradient the backward pass descends (it carries no 1/n factor).
    fn batch_objective(mlp: &Mlp, input: &[f64], labels: &[usize], rows: usize) -> f64 {
        let mut scratch = BatchScratch::with_rows(mlp.config(), rows);
        let probs = mlp.forward_batch(input, rows, &mut scratch);
        let k = mlp.config().n_classes;
        labels
            .iter()
            .enumerate()
            .map(|(s, &label)| -probs[s * k + label].ln())
            .sum()
    }

    fn assert_close(analytic: f64, numeric: f64, abs_tol: f64, rel_tol: f64) {
        let diff = (analytic - numeric).abs();
        let scale = analytic.abs().max(numeric.abs()).max(1.0);
        assert!(
            diff <= abs_tol || diff / scale <= rel_tol,
            "analytic={analytic} numeric={numeric} diff={diff}"
        );
    }

    #[test]
    fn seeded_init_is_deterministic() {
        let mut a = Mlp::new(small_config()).unwrap();
        let mut b = Mlp::new(small_config()).unwrap();
        a.initialize_with_seed(123);
        b.initialize_with_seed(123);

        let input = [0.3, -0.7, 0.1, 0.9];
        let out_a = a.predict(&input).unwrap();
        let out_b = b.predict(&input).unwrap();
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn forward_rows_are_probability_distributions() {
        let mut mlp = Mlp::new(small_config()).unwrap();
        mlp.initialize_with_seed(7);

        let input = [0.5, -1.2, 3.0, 0.0, -0.4, 0.8];
        let mut scratch = mlp.scratch();
        let probs = mlp.forward_batch(&input, 3, &mut scratch);

        for row in probs.chunks_exact(2) {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }

    #[test]
    fn predict_requires_parameters() {
        let mlp = Mlp::new(small_config()).unwrap();
        assert!(matches!(mlp.predict(&[0.0, 0.0]), Err(Error::NotFitted)));
    }

    #[test]
    fn update_matches_numeric_gradient() {
        let mut mlp = Mlp::new(small_config()).unwrap();
        mlp.initialize_with_seed(0);

        let input = [0.3, -0.7, 1.1, 0.2, -0.5, 0.9, 0.0, 0.4];
        let labels = [0_usize, 1, 1, 0];
        let rows = 4;
        let lr = mlp.config().lr;

        let before = mlp.clone();

        let mut scratch = mlp.scratch();
        let mut deltas = mlp.delta_scratch();
        mlp.forward_batch(&input, rows, &mut scratch);
        mlp.backward_batch(&input, &labels, &scratch, &mut deltas);

        let eps = 1e-6;
        let abs_tol = 1e-6;
        let rel_tol = 1e-4;
        let mut probe = before.clone();

        for layer_idx in 0..before.num_layers() {
            let w_len = before.layer(layer_idx).unwrap().weights().len();
            for p in 0..w_len {
                let orig = before.layer(layer_idx).unwrap().weights()[p];

                probe.layer_mut(layer_idx).unwrap().weights_mut()[p] = orig + eps;
                let plus = batch_objective(&probe, &input, &labels, rows);
                probe.layer_mut(layer_idx).unwrap().weights_mut()[p] = orig - eps;
                let minus = batch_objective(&probe, &input, &labels, rows);
                probe.layer_mut(layer_idx).unwrap().weights_mut()[p] = orig;

                let numeric = (plus - minus) / (2.0 * eps);
                let applied = (orig - mlp.layer(layer_idx).unwrap().weights()[p]) / lr;
                assert_close(applied, numeric, abs_tol, rel_tol);
            }

            let b_len = before.layer(layer_idx).unwrap().biases().len();
            for p in 0..b_len {
                let orig = before.layer(layer_idx).unwrap().biases()[p];

                probe.layer_mut(layer_idx).unwrap().biases_mut()[p] = orig + eps;
                let plus = batch_objective(&probe, &input, &labels, rows);
                probe.layer_mut(layer_idx).unwrap().biases_mut()[p] = orig - eps;
                let minus = batch_objective(&probe, &input, &labels, rows);
                probe.layer_mut(layer_idx).unwrap().biases_mut()[p] = orig;

                let numeric = (plus - minus) / (2.0 * eps);
                let applied = (orig - mlp.layer(layer_idx).unwrap().biases()[p]) / lr;
                assert_close(applied, numeric, abs_tol, rel_tol);
            }
        }
    }

    #[test]
    fn scratch_adapts_to_shorter_batches() {
        let mut mlp = Mlp::new(small_config()).unwrap();
        mlp.initialize_with_seed(1);

        let mut scratch = mlp.scratch();
        let full = [0.1; 8];
        let probs = mlp.forward_batch(&full, 4, &mut scratch);
        assert_eq!(probs.len(), 4 * 2);

        // A short final batch shrinks the buffers; output shape follows.
        let short = [0.1; 2];
        let probs = mlp.forward_batch(&short, 1, &mut scratch);
        assert_eq!(probs.len(), 2);
        assert_eq!(scratch.rows(), 1);
    }

    #[test]
    fn from_parts_rejects_mismatched_topology() {
        let cfg = small_config();
        let mut donor = Mlp::new(cfg.clone()).unwrap();
        donor.initialize_with_seed(5);

        let mut layers: Vec<Layer> = (0..donor.num_layers())
            .map(|i| donor.layer(i).unwrap().clone())
            .collect();
        assert!(Mlp::from_parts(cfg.clone(), layers.clone()).is_ok());

        layers.pop();
        assert!(Mlp::from_parts(cfg, layers).is_err());
    }

    #[test]
    #[should_panic]
    fn forward_panics_on_input_shape_mismatch() {
        let mut mlp = Mlp::new(small_config()).unwrap();
        mlp.initialize_with_seed(0);
        let mut scratch = mlp.scratch();
        // 3 values cannot be a (rows, 2) batch for rows = 2.
        mlp.forward_batch(&[0.0; 3], 2, &mut scratch);
    }
}
