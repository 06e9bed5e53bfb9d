//! Candle model loading and inference
//!
//! Handles:
//! - Loading a bincode weight bundle (config + named tensors)
//! - Running the encoder/decoder forward pass on a whole beam at once
//! - M1 Metal GPU acceleration support

use crate::error::{Error, Result};
use crate::llm::oracle::{Logits, ScoringOracle};
use candle_core::{Device, Tensor};
use candle_nn::{Embedding, Linear, Module};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Metadata about the model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub vocab_size: usize,
    pub hidden_size: usize,
    /// Encoder width; decoder inputs are one shorter
    pub context_len: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            vocab_size: 76,
            hidden_size: 128,
            context_len: 25,
        }
    }
}

/// One named, flattened tensor
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TensorData {
    pub name: String,
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

/// On-disk weight file
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelBundle {
    pub config: ModelConfig,
    pub tensors: Vec<TensorData>,
}

impl ModelBundle {
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, bincode::serialize(self)?)?;
        Ok(())
    }

    fn tensor(&self, name: &str, device: &Device) -> Result<Tensor> {
        let entry = self
            .tensors
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::MissingTensor(name.to_string()))?;
        Ok(Tensor::from_vec(
            entry.data.clone(),
            entry.shape.as_slice(),
            device,
        )?)
    }
}

fn select_device() -> Device {
    // Use Metal GPU on macOS, fallback to CPU
    #[cfg(target_os = "macos")]
    let device = Device::new_metal(0).unwrap_or(Device::Cpu);
    #[cfg(not(target_os = "macos"))]
    let device = Device::Cpu;
    device
}

/// Encoder/decoder scorer backed by candle tensors
pub struct Model {
    config: ModelConfig,
    device: Device,
    /// (vocab_size, hidden_size)
    encoder_embedding: Embedding,
    /// (vocab_size, hidden_size)
    decoder_embedding: Embedding,
    /// hidden_size -> vocab_size
    output: Linear,
}

impl Model {
    /// Load model from a bincode weights file
    pub fn load(weights_path: &Path) -> Result<Self> {
        let file_size = fs::metadata(weights_path)?.len();
        tracing::info!(path = ?weights_path, bytes = file_size, "loading model");

        let weights_bytes = fs::read(weights_path)?;
        let bundle: ModelBundle = bincode::deserialize(&weights_bytes)?;
        let model = Self::from_bundle(&bundle, select_device())?;

        tracing::info!(
            vocab_size = model.config.vocab_size,
            hidden_size = model.config.hidden_size,
            context_len = model.config.context_len,
            parameters = model.parameter_count(),
            device = ?model.device,
            "model loaded"
        );
        Ok(model)
    }

    pub fn from_bundle(bundle: &ModelBundle, device: Device) -> Result<Self> {
        let config = bundle.config.clone();
        let encoder_embedding = Embedding::new(
            bundle.tensor("encoder_embedding", &device)?,
            config.hidden_size,
        );
        let decoder_embedding = Embedding::new(
            bundle.tensor("decoder_embedding", &device)?,
            config.hidden_size,
        );
        let output = Linear::new(
            bundle.tensor("output.weight", &device)?,
            Some(bundle.tensor("output.bias", &device)?),
        );

        Ok(Model {
            config,
            device,
            encoder_embedding,
            decoder_embedding,
            output,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Get model size (number of parameters)
    pub fn parameter_count(&self) -> usize {
        let embed = self.config.vocab_size * self.config.hidden_size;
        let output = self.config.hidden_size * self.config.vocab_size + self.config.vocab_size;
        2 * embed + output
    }

    fn batch_tensor(&self, rows: &[Vec<u32>], width: usize) -> Result<Tensor> {
        let mut flat = Vec::with_capacity(rows.len() * width);
        for row in rows {
            if row.len() != width {
                return Err(Error::OracleShape(format!(
                    "row of {} tokens, model expects {}",
                    row.len(),
                    width
                )));
            }
            flat.extend_from_slice(row);
        }
        Ok(Tensor::from_vec(flat, (rows.len(), width), &self.device)?)
    }

    /// Forward pass: (batch, context_len) x (batch, context_len - 1)
    /// -> (batch, context_len - 1, vocab_size)
    fn forward(&self, encoder: &Tensor, decoder: &Tensor) -> candle_core::Result<Tensor> {
        // Average pooling over the encoder sequence: (batch, 1, hidden)
        let pooled = self.encoder_embedding.forward(encoder)?.mean_keepdim(1)?;

        let hidden = self
            .decoder_embedding
            .forward(decoder)?
            .broadcast_add(&pooled)?
            .relu()?;

        self.output.forward(&hidden)
    }
}

impl ScoringOracle for Model {
    fn context_len(&self) -> usize {
        self.config.context_len
    }

    fn vocab_size(&self) -> usize {
        self.config.vocab_size
    }

    fn score(&self, encoder: &[Vec<u32>], decoder: &[Vec<u32>]) -> Result<Logits> {
        if encoder.len() != decoder.len() {
            return Err(Error::OracleShape(format!(
                "{} encoder rows vs {} decoder rows",
                encoder.len(),
                decoder.len()
            )));
        }
        let width = self.config.context_len;
        let encoder = self.batch_tensor(encoder, width)?;
        let decoder = self.batch_tensor(decoder, width.saturating_sub(1))?;

        let logits = self.forward(&encoder, &decoder)?;
        Logits::from_nested(logits.to_vec3::<f32>()?)
    }
}
