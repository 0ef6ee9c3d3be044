//! A small from-scratch softmax MLP classifier.
//!
//! `mlp-classifier` implements a dense feed-forward network with
//! configurable hidden layers, a softmax output, cross-entropy loss, and
//! mini-batch gradient-descent training with L2 regularization. It is
//! designed to be easy to read while keeping the per-batch hot path
//! allocation-free.
//!
//! # Design goals
//!
//! - Predictable performance: reuse buffers ([`BatchScratch`] /
//!   [`DeltaScratch`]) instead of allocating per step.
//! - Clear contracts: shapes are explicit and validated at the API
//!   boundary; configuration is validated before a model can exist.
//! - Reproducibility: one seed drives every random draw of a training run
//!   (initialization and shuffling alike).
//!
//! # Panics vs `Result`
//!
//! This crate intentionally exposes two layers of API:
//!
//! - Low-level hot path (panics on misuse):
//!   [`Mlp::forward_batch`], [`Mlp::backward_batch`].
//!   Shape mismatches are treated as programmer error and will panic via
//!   `assert!`.
//! - High-level convenience APIs (shape-checked):
//!   [`Mlp::fit`], [`Mlp::predict`], [`Mlp::compute_loss`], [`Mlp::score`].
//!   These validate inputs and return [`Result`].
//!
//! # Data layout and shapes
//!
//! - Scalars are `f64`.
//! - [`Dataset`] stores samples contiguously in row-major layout; labels
//!   are `usize` class indices.
//! - Layer weights are row-major with shape `(in_dim, out_dim)`; biases
//!   have shape `(out_dim,)`.
//! - Batched inputs/outputs are flat row-major buffers:
//!   - inputs: `(rows, input_dim)` as `rows * input_dim` scalars
//!   - probabilities: `(rows, n_classes)` as `rows * n_classes` scalars
//!
//! # Quick start
//!
//! ```rust
//! use mlp_classifier::{Activation, Dataset, Mlp, MlpConfig};
//!
//! # fn main() -> mlp_classifier::Result<()> {
//! let xs = vec![
//!     vec![0.0, 0.0],
//!     vec![0.2, 0.1],
//!     vec![1.0, 0.9],
//!     vec![0.8, 1.0],
//! ];
//! let ys = [0, 0, 1, 1];
//! let train = Dataset::from_rows(&xs, &ys, 2)?;
//!
//! let mut cfg = MlpConfig::new(2, 2);
//! cfg.hidden_layers = vec![8];
//! cfg.activation = Activation::Tanh;
//! cfg.lr = 0.1;
//! cfg.batch_size = 4;
//!
//! let mut mlp = Mlp::new(cfg)?;
//! let report = mlp.fit(&train, 50, true, 0)?;
//! assert!(report.final_loss().unwrap().is_finite());
//!
//! let acc = mlp.score(&train)?;
//! assert!((0.0..=1.0).contains(&acc));
//! # Ok(())
//! # }
//! ```
//!
//! # A note on momentum
//!
//! [`MlpConfig`] accepts a momentum coefficient for API compatibility, but
//! the update rule is plain gradient descent: the coefficient is validated
//! and then ignored. See the field docs on [`MlpConfig::momentum`].

pub mod activation;
pub mod config;
pub mod data;
pub mod error;
pub mod layer;
pub mod loss;
pub(crate) mod matmul;
pub mod metrics;
pub mod mlp;
pub mod train;

#[cfg(feature = "serde")]
pub mod serde_model;

pub use activation::{softmax_rows, Activation};
pub use config::{MlpConfig, OutputKind};
pub use data::{one_hot, Dataset};
pub use error::{Error, Result};
pub use layer::Layer;
pub use loss::LossKind;
pub use metrics::{accuracy, argmax};
pub use mlp::{BatchScratch, DeltaScratch, Mlp};
pub use train::{EpochReport, FitReport};
