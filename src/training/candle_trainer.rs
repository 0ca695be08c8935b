// candle_trainer.rs — Fine-tunes the BERT sentence embedder on labeled pairs.
//
// Objective: cosine-similarity regression. Both texts of a pair go through the
// shared encoder, are mean-pooled, and the MSE between their cosine and the
// label is minimized with AdamW. Batches are reshuffled each epoch with a
// seeded generator; the learning rate warms up linearly, then decays linearly.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, bail, Context};
use candle_core::{DType, Device, Tensor};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use candle_transformers::models::bert::BertModel;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config;
use crate::embeddings::engine::{load_tokenizer, read_bert_config, SentenceEncoder};
use crate::pairs::TrainingPair;
use crate::training::trainer::{warmup_linear_lr, LossObjective, TrainOutcome, Trainer, TrainingPlan};

pub struct CandleTrainer {
    base_model_dir: PathBuf,
    device: Device,
}

impl CandleTrainer {
    pub fn new(base_model_dir: impl Into<PathBuf>, device: Device) -> Self {
        Self {
            base_model_dir: base_model_dir.into(),
            device,
        }
    }
}

fn batch_loss(encoder: &SentenceEncoder, batch: &[&TrainingPair]) -> anyhow::Result<Tensor> {
    let a = encoder.pooled(batch.iter().map(|p| p.text_a.as_str()).collect())?;
    let b = encoder.pooled(batch.iter().map(|p| p.text_b.as_str()).collect())?;
    let labels: Vec<f32> = batch.iter().map(|p| p.label).collect();
    let labels = Tensor::from_vec(labels, batch.len(), encoder.device())?;
    cosine_similarity_loss(&a, &b, &labels)
}

/// Example-weighted mean loss over `pairs`; None when there is nothing to evaluate.
fn evaluate(encoder: &SentenceEncoder, pairs: &[TrainingPair], batch_size: usize) -> anyhow::Result<Option<f32>> {
    if pairs.is_empty() {
        return Ok(None);
    }
    let mut weighted = 0.0f64;
    for chunk in pairs.chunks(batch_size) {
        let refs: Vec<&TrainingPair> = chunk.iter().collect();
        let loss = batch_loss(encoder, &refs)?.to_scalar::<f32>()?;
        weighted += loss as f64 * chunk.len() as f64;
    }
    Ok(Some((weighted / pairs.len() as f64) as f32))
}

impl Trainer for CandleTrainer {
    fn fit(&mut self, plan: &TrainingPlan<'_>) -> anyhow::Result<TrainOutcome> {
        let settings = plan.settings;
        if settings.loss != LossObjective::CosineSimilarity {
            bail!("unsupported loss objective {:?}", settings.loss);
        }
        if plan.train.is_empty() {
            bail!("no training pairs");
        }
        let batch_size = settings.batch_size.max(1);

        let dtype = if settings.mixed_precision && !self.device.is_cpu() {
            DType::BF16
        } else {
            DType::F32
        };

        let bert_config = read_bert_config(&self.base_model_dir)?;
        let tokenizer = load_tokenizer(&self.base_model_dir)?;

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, dtype, &self.device);
        let model = BertModel::load(vb, &bert_config).context("build BERT model")?;
        load_pretrained(&varmap, &self.base_model_dir.join(config::embedding::WEIGHTS_FILE), &self.device)?;
        log::info!(
            "Loaded {} parameter tensors from {} ({:?})",
            varmap.all_vars().len(),
            self.base_model_dir.display(),
            dtype
        );

        let encoder = SentenceEncoder::new(model, tokenizer, self.device.clone(), bert_config.hidden_size);

        let mut opt = AdamW::new(
            varmap.all_vars(),
            ParamsAdamW {
                lr: settings.learning_rate,
                ..Default::default()
            },
        )?;

        let steps_per_epoch = plan.train.len().div_ceil(batch_size);
        let total_steps = steps_per_epoch * settings.epochs;
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let mut order: Vec<usize> = (0..plan.train.len()).collect();
        let mut step = 0usize;
        let mut final_train_loss = None;
        let mut final_validation_loss = None;

        for epoch in 0..settings.epochs {
            let epoch_started = Instant::now();
            order.shuffle(&mut rng);
            let mut epoch_loss = 0.0f64;

            for (batch_idx, idxs) in order.chunks(batch_size).enumerate() {
                opt.set_learning_rate(warmup_linear_lr(
                    step,
                    settings.warmup_steps,
                    total_steps,
                    settings.learning_rate,
                ));

                let batch: Vec<&TrainingPair> = idxs.iter().map(|&i| &plan.train[i]).collect();
                let loss = batch_loss(&encoder, &batch)?;
                opt.backward_step(&loss)?;

                let value = loss.to_scalar::<f32>()?;
                epoch_loss += value as f64 * batch.len() as f64;
                step += 1;

                if (batch_idx + 1) % 50 == 0 {
                    log::info!(
                        "   epoch {}/{} step {}/{} loss {:.4}",
                        epoch + 1,
                        settings.epochs,
                        batch_idx + 1,
                        steps_per_epoch,
                        value
                    );
                }
            }

            let train_loss = (epoch_loss / plan.train.len() as f64) as f32;
            final_train_loss = Some(train_loss);
            final_validation_loss = evaluate(&encoder, plan.validation, batch_size)?;
            log::info!(
                "   epoch {}/{} done in {:.1}s: train loss {:.4}, validation loss {}",
                epoch + 1,
                settings.epochs,
                epoch_started.elapsed().as_secs_f64(),
                train_loss,
                final_validation_loss.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"))
            );
        }

        save_checkpoint(&varmap, &self.base_model_dir, plan.output_dir)?;

        Ok(TrainOutcome {
            embedding_dimension: bert_config.hidden_size,
            final_train_loss,
            final_validation_loss,
        })
    }
}

/// MSE between row-wise cosine(a, b) and `labels`.
pub fn cosine_similarity_loss(a: &Tensor, b: &Tensor, labels: &Tensor) -> anyhow::Result<Tensor> {
    let cos = row_cosine(a, b)?;
    Ok((cos - labels)?.sqr()?.mean_all()?)
}

/// Cosine similarity per row of two [batch, hidden] tensors.
pub fn row_cosine(a: &Tensor, b: &Tensor) -> anyhow::Result<Tensor> {
    let dot = (a * b)?.sum(1)?;
    let norm_a = a.sqr()?.sum(1)?.sqrt()?;
    let norm_b = b.sqr()?.sum(1)?.sqrt()?;
    let denom = (norm_a * norm_b)?.clamp(1e-8, f64::MAX)?;
    Ok((dot / denom)?)
}

/// Copy pretrained weights into the var map, casting to each var's dtype.
fn load_pretrained(varmap: &VarMap, weights: &Path, device: &Device) -> anyhow::Result<()> {
    let tensors = candle_core::safetensors::load(weights, device)
        .with_context(|| format!("load weights from {}", weights.display()))?;
    let vars = varmap.data().lock().map_err(|_| anyhow!("var map lock poisoned"))?;

    let mut missing = Vec::new();
    for (name, var) in vars.iter() {
        let source = tensors.get(name).or_else(|| tensors.get(&format!("bert.{name}")));
        match source {
            Some(t) => var
                .set(&t.to_dtype(var.dtype())?)
                .with_context(|| format!("set {name}"))?,
            None => missing.push(name.clone()),
        }
    }

    if !missing.is_empty() {
        missing.sort();
        bail!("pretrained checkpoint is missing {} tensors, e.g. {}", missing.len(), missing[0]);
    }
    Ok(())
}

/// Write F32 weights plus the tokenizer and config next to them.
fn save_checkpoint(varmap: &VarMap, base_model_dir: &Path, output_dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(output_dir)?;

    let tensors: HashMap<String, Tensor> = {
        let vars = varmap.data().lock().map_err(|_| anyhow!("var map lock poisoned"))?;
        let mut out = HashMap::with_capacity(vars.len());
        for (name, var) in vars.iter() {
            out.insert(name.clone(), var.as_tensor().to_dtype(DType::F32)?);
        }
        out
    };

    let weights_path = output_dir.join(config::embedding::WEIGHTS_FILE);
    candle_core::safetensors::save(&tensors, &weights_path)
        .with_context(|| format!("write {}", weights_path.display()))?;

    for name in [config::embedding::TOKENIZER_FILE, config::embedding::CONFIG_FILE] {
        let from = base_model_dir.join(name);
        let to = output_dir.join(name);
        fs::copy(&from, &to).with_context(|| format!("copy {} -> {}", from.display(), to.display()))?;
    }

    log::info!("Saved fine-tuned checkpoint to {}", output_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::trainer::TrainerSettings;

    fn tensor(rows: &[[f32; 2]]) -> Tensor {
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        Tensor::from_vec(flat, (rows.len(), 2), &Device::Cpu).unwrap()
    }

    #[test]
    fn row_cosine_matches_geometry() {
        let a = tensor(&[[1.0, 0.0], [1.0, 1.0], [1.0, 0.0]]);
        let b = tensor(&[[2.0, 0.0], [-1.0, -1.0], [0.0, 3.0]]);
        let cos: Vec<f32> = row_cosine(&a, &b).unwrap().to_vec1().unwrap();
        assert!((cos[0] - 1.0).abs() < 1e-6);
        assert!((cos[1] + 1.0).abs() < 1e-6);
        assert!(cos[2].abs() < 1e-6);
    }

    #[test]
    fn loss_is_zero_when_cosine_matches_label() {
        let a = tensor(&[[1.0, 0.0], [1.0, 0.0]]);
        let b = tensor(&[[1.0, 0.0], [0.0, 1.0]]);
        let labels = Tensor::from_vec(vec![1.0f32, 0.0], 2, &Device::Cpu).unwrap();
        let loss = cosine_similarity_loss(&a, &b, &labels).unwrap().to_scalar::<f32>().unwrap();
        assert!(loss.abs() < 1e-6);

        let wrong = Tensor::from_vec(vec![0.0f32, 1.0], 2, &Device::Cpu).unwrap();
        let loss = cosine_similarity_loss(&a, &b, &wrong).unwrap().to_scalar::<f32>().unwrap();
        assert!((loss - 1.0).abs() < 1e-6);
    }

    #[test]
    fn missing_base_model_fails_before_training() {
        let dir = tempfile::tempdir().unwrap();
        let settings = TrainerSettings {
            base_model: "all-MiniLM-L6-v2".into(),
            epochs: 1,
            batch_size: 2,
            warmup_steps: 0,
            learning_rate: 2e-5,
            mixed_precision: false,
            loss: LossObjective::CosineSimilarity,
            seed: 42,
        };
        let pairs = vec![TrainingPair::new("a", "b", 1.0)];
        let plan = TrainingPlan {
            train: &pairs,
            validation: &[],
            settings: &settings,
            output_dir: dir.path(),
        };
        let mut trainer = CandleTrainer::new(dir.path().join("no-base-model"), Device::Cpu);
        assert!(trainer.fit(&plan).is_err());
        assert!(!dir.path().join("model.safetensors").exists());
    }
}
