//! Network and training configuration.
//!
//! `MlpConfig` describes the whole classifier up front: topology, activation
//! choice, and every training hyperparameter. The config is immutable once a
//! model is built from it; `Mlp::new` runs [`MlpConfig::validate`] so that no
//! partially-configured model can exist.

use crate::{Activation, Error, LossKind, Result};

/// Output-layer kind. Only softmax is supported; unsupported kinds are
/// unrepresentable rather than rejected at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OutputKind {
    #[default]
    Softmax,
}

/// Immutable description of a softmax MLP classifier.
///
/// Start from [`MlpConfig::new`] (which fills in the default
/// hyperparameters) and override public fields as needed:
///
/// ```rust
/// use mlp_classifier::{Activation, MlpConfig};
///
/// let mut cfg = MlpConfig::new(64, 10);
/// cfg.hidden_layers = vec![128];
/// cfg.activation = Activation::Tanh;
/// cfg.lr = 0.01;
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MlpConfig {
    /// Number of input features.
    pub input_dim: usize,
    /// Number of output classes.
    pub n_classes: usize,
    /// Widths of the hidden layers, in order. Must be non-empty.
    pub hidden_layers: Vec<usize>,
    /// Hidden-layer activation.
    pub activation: Activation,
    /// Output-layer kind (softmax).
    pub output: OutputKind,
    /// Training loss (cross-entropy).
    pub loss: LossKind,
    /// Learning rate applied to the summed batch gradient.
    pub lr: f64,
    /// L2 regularization coefficient.
    pub reg_lambda: f64,
    /// Momentum coefficient. Accepted for API compatibility; the update
    /// rule is plain gradient descent and never applies momentum.
    pub momentum: f64,
    /// Mini-batch size. May exceed the dataset size, in which case each
    /// epoch degrades to a single batch.
    pub batch_size: usize,
    /// Evaluate full-dataset loss/accuracy every `report_every` epochs
    /// (epoch 0 always reports).
    pub report_every: usize,
}

impl MlpConfig {
    /// A config with the default hyperparameters for the given input
    /// dimension and class count: one hidden layer of 128 sigmoid units,
    /// `lr = 1e-3`, `reg_lambda = 1e-4`, `momentum = 0.9`, batch size 200,
    /// reporting every epoch.
    pub fn new(input_dim: usize, n_classes: usize) -> Self {
        Self {
            input_dim,
            n_classes,
            hidden_layers: vec![128],
            activation: Activation::Sigmoid,
            output: OutputKind::Softmax,
            loss: LossKind::CrossEntropy,
            lr: 1e-3,
            reg_lambda: 1e-4,
            momentum: 0.9,
            batch_size: 200,
            report_every: 1,
        }
    }

    /// Check every field, returning the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.input_dim == 0 {
            return Err(Error::InvalidConfig("input_dim must be > 0".to_owned()));
        }
        if self.n_classes == 0 {
            return Err(Error::InvalidConfig("n_classes must be > 0".to_owned()));
        }
        if self.hidden_layers.is_empty() {
            return Err(Error::InvalidConfig(
                "hidden_layers must not be empty".to_owned(),
            ));
        }
        if self.hidden_layers.contains(&0) {
            return Err(Error::InvalidConfig(
                "all hidden layer widths must be > 0".to_owned(),
            ));
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "lr must be finite and > 0, got {}",
                self.lr
            )));
        }
        if !(self.reg_lambda.is_finite() && self.reg_lambda >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "reg_lambda must be finite and >= 0, got {}",
                self.reg_lambda
            )));
        }
        if !(self.momentum.is_finite() && (0.0..1.0).contains(&self.momentum)) {
            return Err(Error::InvalidConfig(format!(
                "momentum must be finite and in [0, 1), got {}",
                self.momentum
            )));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".to_owned()));
        }
        if self.report_every == 0 {
            return Err(Error::InvalidConfig("report_every must be > 0".to_owned()));
        }
        Ok(())
    }

    /// Layer widths from input to output: `input_dim`, each hidden width,
    /// `n_classes`.
    pub(crate) fn layer_widths(&self) -> Vec<usize> {
        let mut widths = Vec::with_capacity(self.hidden_layers.len() + 2);
        widths.push(self.input_dim);
        widths.extend_from_slice(&self.hidden_layers);
        widths.push(self.n_classes);
        widths
    }
}
