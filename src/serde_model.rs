//! Model serialization/deserialization (feature: `serde`).
//!
//! This module defines a versioned, stable on-disk JSON format for [`Mlp`].
//!
//! Design notes:
//! - Internal `Mlp`/`Layer` structs are not serialized directly, to keep
//!   the file format stable even if the internal representation changes.
//! - Deserialization validates the format version, the layer chain against
//!   the stored configuration, parameter lengths, and that all parameters
//!   are finite.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Layer, Mlp, MlpConfig, Result};

pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedMlp {
    pub format_version: u32,
    pub config: MlpConfig,
    pub layers: Vec<SerializedLayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedLayer {
    pub in_dim: usize,
    pub out_dim: usize,
    /// Row-major `(in_dim, out_dim)`.
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
}

impl From<&Mlp> for SerializedMlp {
    fn from(model: &Mlp) -> Self {
        let mut layers = Vec::with_capacity(model.num_layers());
        for i in 0..model.num_layers() {
            let layer = model.layer(i).expect("layer idx must be valid");
            layers.push(SerializedLayer {
                in_dim: layer.in_dim(),
                out_dim: layer.out_dim(),
                weights: layer.weights().to_vec(),
                biases: layer.biases().to_vec(),
            });
        }
        Self {
            format_version: MODEL_FORMAT_VERSION,
            config: model.config().clone(),
            layers,
        }
    }
}

impl TryFrom<SerializedMlp> for Mlp {
    type Error = Error;

    fn try_from(value: SerializedMlp) -> std::result::Result<Self, Self::Error> {
        if value.format_version != MODEL_FORMAT_VERSION {
            return Err(Error::InvalidData(format!(
                "unsupported model format_version {}; expected {MODEL_FORMAT_VERSION}",
                value.format_version
            )));
        }

        let mut layers = Vec::with_capacity(value.layers.len());
        for (i, layer) in value.layers.into_iter().enumerate() {
            // Layer::from_parts performs shape validation and finiteness checks.
            let l = Layer::from_parts(layer.in_dim, layer.out_dim, layer.weights, layer.biases)
                .map_err(|e| Error::InvalidData(format!("layer {i} invalid: {e}")))?;
            layers.push(l);
        }

        // from_parts re-validates the config and checks the chain against it.
        Mlp::from_parts(value.config, layers)
    }
}

impl Mlp {
    /// Serialize the model to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        self.require_parameters()?;
        let ser = SerializedMlp::from(self);
        serde_json::to_string_pretty(&ser)
            .map_err(|e| Error::InvalidData(format!("failed to serialize model: {e}")))
    }

    /// Serialize the model to a compact JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        self.require_parameters()?;
        let ser = SerializedMlp::from(self);
        serde_json::to_string(&ser)
            .map_err(|e| Error::InvalidData(format!("failed to serialize model: {e}")))
    }

    /// Parse a model from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let ser: SerializedMlp = serde_json::from_str(s)
            .map_err(|e| Error::InvalidData(format!("failed to parse model json: {e}")))?;
        ser.try_into()
    }

    /// Save the model to a JSON file (pretty-printed).
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let s = self.to_json_string_pretty()?;
        let p = path.as_ref();
        std::fs::write(p, s)
            .map_err(|e| Error::InvalidData(format!("failed to write {}: {e}", p.display())))?;
        Ok(())
    }

    /// Load a model from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::InvalidData(format!("failed to read {}: {e}", p.display())))?;
        Self::from_json_str(&s)
    }

    fn require_parameters(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(Error::NotFitted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Activation, Dataset};

    fn trained_model() -> (Mlp, Dataset) {
        let xs = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.2],
            vec![1.0, 0.9],
            vec![0.9, 1.0],
        ];
        let data = Dataset::from_rows(&xs, &[0, 0, 1, 1], 2).unwrap();

        let mut cfg = MlpConfig::new(2, 2);
        cfg.hidden_layers = vec![4];
        cfg.activation = Activation::Tanh;
        cfg.lr = 0.1;
        cfg.batch_size = 4;
        cfg.report_every = 10;

        let mut mlp = Mlp::new(cfg).unwrap();
        mlp.fit(&data, 20, false, 3).unwrap();
        (mlp, data)
    }

    #[test]
    fn json_round_trip_preserves_predictions() {
        let (mlp, data) = trained_model();

        let json = mlp.to_json_string_pretty().unwrap();
        let loaded = Mlp::from_json_str(&json).unwrap();

        let a = mlp.predict(data.inputs_flat()).unwrap();
        let b = loaded.predict(data.inputs_flat()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_unknown_version() {
        let (mlp, _) = trained_model();
        let mut ser = SerializedMlp::from(&mlp);
        ser.format_version = 999;
        let json = serde_json::to_string(&ser).unwrap();

        let err = Mlp::from_json_str(&json).unwrap_err();
        assert!(format!("{err}").contains("format_version"));
    }

    #[test]
    fn rejects_non_finite_parameters() {
        let (mlp, _) = trained_model();
        let mut ser = SerializedMlp::from(&mlp);
        ser.layers[0].weights[0] = f64::NAN;
        let json = serde_json::to_string(&ser);
        // serde_json maps NaN to null, which fails to parse back as f64;
        // a hand-edited payload would still hit the finiteness check in
        // Layer::from_parts.
        if let Ok(json) = json {
            assert!(Mlp::from_json_str(&json).is_err());
        }
    }

    #[test]
    fn rejects_layer_chain_that_contradicts_config() {
        let (mlp, _) = trained_model();
        let mut ser = SerializedMlp::from(&mlp);
        ser.layers.pop();
        let json = serde_json::to_string(&ser).unwrap();
        assert!(Mlp::from_json_str(&json).is_err());
    }

    #[test]
    fn serializing_an_unfitted_model_fails() {
        let mlp = Mlp::new(MlpConfig::new(2, 2)).unwrap();
        assert!(matches!(mlp.to_json_string(), Err(Error::NotFitted)));
    }
}
