// engine.rs — Sentence encoding with candle BERT.
//
// `SentenceEncoder` is the shared forward path: batch tokenize (padded to the
// longest text, truncated at MAX_TOKENS), run BERT, average the hidden states
// over real tokens. The trainer drives it with trainable weights; the
// inference engine wraps it around a memory-mapped checkpoint.

use std::path::Path;

use anyhow::{anyhow, ensure, Context};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};

use crate::config;
use crate::embeddings::cache::{Embedder, ModelLoader};

pub struct SentenceEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    hidden_size: usize,
}

impl SentenceEncoder {
    pub fn new(model: BertModel, tokenizer: Tokenizer, device: Device, hidden_size: usize) -> Self {
        Self {
            model,
            tokenizer,
            device,
            hidden_size,
        }
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Mean-pooled F32 sentence vectors, one row per text: [batch, hidden].
    pub fn pooled(&self, texts: Vec<&str>) -> anyhow::Result<Tensor> {
        ensure!(!texts.is_empty(), "nothing to encode");
        let encodings = self
            .tokenizer
            .encode_batch(texts, true)
            .map_err(|e| anyhow!("tokenize batch: {e}"))?;

        let rows = encodings.len();
        let width = encodings[0].get_ids().len();
        let mut ids: Vec<u32> = Vec::with_capacity(rows * width);
        let mut mask: Vec<u32> = Vec::with_capacity(rows * width);
        for enc in &encodings {
            ids.extend_from_slice(enc.get_ids());
            mask.extend_from_slice(enc.get_attention_mask());
        }

        let ids = Tensor::from_vec(ids, (rows, width), &self.device)?;
        let mask = Tensor::from_vec(mask, (rows, width), &self.device)?;
        let segments = ids.zeros_like()?;

        let hidden = self.model.forward(&ids, &segments, Some(&mask))?;
        mean_pooling(&hidden.to_dtype(DType::F32)?, &mask)
    }
}

/// Inference-side encoder over a fine-tuned (or base) checkpoint directory.
pub struct EmbeddingEngine {
    encoder: SentenceEncoder,
}

impl EmbeddingEngine {
    /// Open `model_dir` (model.safetensors, config.json, tokenizer.json) on CPU.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let bert_config = read_bert_config(model_dir)?;
        log::info!(
            "BERT checkpoint: {} layers, {} heads, hidden size {}",
            bert_config.num_hidden_layers,
            bert_config.num_attention_heads,
            bert_config.hidden_size,
        );

        let device = Device::Cpu;
        let weights = model_dir.join(config::embedding::WEIGHTS_FILE);
        // SAFETY: the checkpoint is not modified while the process is running.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[&weights], DType::F32, &device) }
            .with_context(|| format!("map {}", weights.display()))?;
        let model = BertModel::load(vb, &bert_config).context("build BERT model")?;
        let tokenizer = load_tokenizer(model_dir)?;

        Ok(Self {
            encoder: SentenceEncoder::new(model, tokenizer, device, bert_config.hidden_size),
        })
    }

    pub fn dims(&self) -> usize {
        self.encoder.hidden_size()
    }

    pub fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        ensure!(!text.is_empty(), "cannot embed empty text");
        let pooled = l2_normalize(&self.encoder.pooled(vec![text])?)?;
        let vector: Vec<f32> = pooled.squeeze(0)?.to_vec1()?;
        ensure!(
            vector.len() == self.dims(),
            "encoder produced {} values, config says {}",
            vector.len(),
            self.dims()
        );
        Ok(vector)
    }
}

impl Embedder for EmbeddingEngine {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        EmbeddingEngine::embed(self, text)
    }
}

/// Loads `EmbeddingEngine`s for the model cache.
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineLoader;

impl ModelLoader for EngineLoader {
    type Model = EmbeddingEngine;

    fn load(&self, model_dir: &Path) -> anyhow::Result<EmbeddingEngine> {
        EmbeddingEngine::load(model_dir)
    }
}

pub(crate) fn read_bert_config(model_dir: &Path) -> anyhow::Result<BertConfig> {
    let path = model_dir.join(config::embedding::CONFIG_FILE);
    let raw = std::fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
}

/// Tokenizer padded to the batch's longest text and truncated at MAX_TOKENS.
pub(crate) fn load_tokenizer(model_dir: &Path) -> anyhow::Result<Tokenizer> {
    let path = model_dir.join(config::embedding::TOKENIZER_FILE);
    let mut tokenizer = Tokenizer::from_file(&path).map_err(|e| anyhow!("load {}: {e}", path.display()))?;
    tokenizer.with_padding(Some(PaddingParams::default()));
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: config::embedding::MAX_TOKENS,
            ..Default::default()
        }))
        .map_err(|e| anyhow!("configure truncation: {e}"))?;
    Ok(tokenizer)
}

/// Average of `hidden` [batch, seq, dim] over positions where `mask` [batch, seq] is 1.
pub(crate) fn mean_pooling(hidden: &Tensor, mask: &Tensor) -> anyhow::Result<Tensor> {
    let weights = mask.to_dtype(hidden.dtype())?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&weights)?.sum(1)?;
    // All-padding rows would divide by zero.
    let counts = weights.sum(1)?.clamp(1e-9, f64::MAX)?;
    Ok(summed.broadcast_div(&counts)?)
}

/// Scale each row of a [batch, dim] tensor to unit length.
pub(crate) fn l2_normalize(rows: &Tensor) -> anyhow::Result<Tensor> {
    let lengths = rows.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12, f64::MAX)?;
    Ok(rows.broadcast_div(&lengths)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooling_skips_padding_positions() {
        let cpu = Device::Cpu;
        // one row, three positions, two dims; the last position is padding
        let hidden = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 100.0, 100.0], (1, 3, 2), &cpu).unwrap();
        let mask = Tensor::from_vec(vec![1u32, 1, 0], (1, 3), &cpu).unwrap();
        let pooled: Vec<Vec<f32>> = mean_pooling(&hidden, &mask).unwrap().to_vec2().unwrap();
        assert_eq!(pooled, vec![vec![2.0, 3.0]]);
    }

    #[test]
    fn rows_are_scaled_to_unit_length() {
        let t = Tensor::from_vec(vec![3.0f32, 4.0, 0.0, 2.0], (2, 2), &Device::Cpu).unwrap();
        let n: Vec<Vec<f32>> = l2_normalize(&t).unwrap().to_vec2().unwrap();
        assert!((n[0][0] - 0.6).abs() < 1e-6);
        assert!((n[0][1] - 0.8).abs() < 1e-6);
        assert!((n[1][1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn absent_directory_does_not_load() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EmbeddingEngine::load(&dir.path().join("absent")).is_err());
    }
}
