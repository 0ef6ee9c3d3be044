//! Mini-batch gradient-descent training loop.
//!
//! `fit` is the "batteries included" API: it validates shapes up front,
//! initializes parameters, and then drives the forward/backward engines
//! over contiguous mini-batches, epoch by epoch. All randomness (weight
//! initialization and epoch shuffling) flows through one generator, so a
//! single seed reproduces a training run exactly.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::mlp::{BatchScratch, DeltaScratch};
use crate::{Dataset, Error, Mlp, Result};

/// Full-dataset metrics recorded at a reporting epoch.
///
/// These are diagnostics, not part of the optimization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    pub epoch: usize,
    pub loss: f64,
    pub accuracy: f64,
}

/// One entry per reporting epoch (epoch 0, then every `report_every`).
#[derive(Debug, Clone, Default)]
pub struct FitReport {
    pub epochs: Vec<EpochReport>,
}

impl FitReport {
    /// Loss at the last reporting epoch.
    pub fn final_loss(&self) -> Option<f64> {
        self.epochs.last().map(|e| e.loss)
    }

    /// Accuracy at the last reporting epoch.
    pub fn final_accuracy(&self) -> Option<f64> {
        self.epochs.last().map(|e| e.accuracy)
    }
}

impl Mlp {
    /// Train on `data` for `max_epochs` epochs with a deterministic seed.
    ///
    /// The seed controls *all* sampling for the run: parameter
    /// initialization and, when `shuffle` is set, the joint permutation of
    /// `X` and `y` drawn each epoch. Existing parameters are discarded and
    /// re-initialized.
    pub fn fit(
        &mut self,
        data: &Dataset,
        max_epochs: usize,
        shuffle: bool,
        seed: u64,
    ) -> Result<FitReport> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.fit_with_rng(data, max_epochs, shuffle, &mut rng)
    }

    /// Train using a caller-owned random generator.
    ///
    /// Each epoch partitions the (possibly shuffled) dataset into
    /// contiguous mini-batches of the configured size; the last batch may
    /// be shorter, and a batch size beyond the dataset size degrades to one
    /// batch per epoch. Batches run forward then backward, mutating the
    /// parameters in place sequentially. At epochs where
    /// `epoch % report_every == 0`, loss and accuracy over the full dataset
    /// are recorded into the returned report.
    pub fn fit_with_rng<R: Rng + ?Sized>(
        &mut self,
        data: &Dataset,
        max_epochs: usize,
        shuffle: bool,
        rng: &mut R,
    ) -> Result<FitReport> {
        self.check_dataset(data)?;
        if max_epochs == 0 {
            return Err(Error::InvalidConfig("max_epochs must be > 0".to_owned()));
        }

        self.initialize_with_rng(rng);

        let n = data.len();
        let input_dim = data.input_dim();
        let batch_size = self.config().batch_size;
        let report_every = self.config().report_every;
        let max_rows = batch_size.min(n);

        let mut scratch = BatchScratch::with_rows(self.config(), max_rows);
        let mut deltas = DeltaScratch::with_rows(self.config(), max_rows);

        // Shuffling permutes indices and gathers rows into reused buffers;
        // unshuffled epochs slice the dataset directly.
        let mut order: Vec<usize> = (0..n).collect();
        let mut batch_inputs = vec![0.0_f64; max_rows * input_dim];
        let mut batch_labels = vec![0_usize; max_rows];

        let mut report = FitReport::default();

        for epoch in 0..max_epochs {
            if shuffle {
                order.shuffle(rng);
            }

            let mut start = 0;
            while start < n {
                let rows = (n - start).min(batch_size);

                if shuffle {
                    for (slot, &src) in order[start..start + rows].iter().enumerate() {
                        batch_inputs[slot * input_dim..(slot + 1) * input_dim]
                            .copy_from_slice(data.input(src));
                        batch_labels[slot] = data.label(src);
                    }
                    let inputs = &batch_inputs[..rows * input_dim];
                    let labels = &batch_labels[..rows];
                    self.forward_batch(inputs, rows, &mut scratch);
                    self.backward_batch(inputs, labels, &scratch, &mut deltas);
                } else {
                    let inputs = &data.inputs_flat()[start * input_dim..(start + rows) * input_dim];
                    let labels = &data.labels()[start..start + rows];
                    self.forward_batch(inputs, rows, &mut scratch);
                    self.backward_batch(inputs, labels, &scratch, &mut deltas);
                }

                start += rows;
            }

            if epoch % report_every == 0 {
                report.epochs.push(EpochReport {
                    epoch,
                    loss: self.compute_loss(data)?,
                    accuracy: self.score(data)?,
                });
            }
        }

        Ok(report)
    }
}
