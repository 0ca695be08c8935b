// orchestrator.rs — Train/validation split, trainer configuration and run metadata.
//
// The orchestrator never touches model parameters: it validates the pair
// count, splits in order, derives the trainer settings from the hardware
// profile, blocks on the trainer and records the outcome.

use std::path::Path;
use std::time::Instant;

use crate::config;
use crate::errors::PipelineError;
use crate::pairs::TrainingPair;
use crate::training::device::HardwareProfile;
use crate::training::metadata::{write_metadata, ModelRunMetadata};
use crate::training::trainer::{LossObjective, Trainer, TrainerSettings, TrainingPlan};

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub base_model: String,
    pub hardware: HardwareProfile,
    pub epochs: usize,
    pub learning_rate: f64,
    pub train_split: f64,
    pub min_pairs: usize,
    pub seed: u64,
}

impl OrchestratorConfig {
    pub fn for_hardware(hardware: HardwareProfile) -> Self {
        Self {
            base_model: config::embedding::BASE_MODEL_NAME.to_string(),
            hardware,
            epochs: config::training::EPOCHS,
            learning_rate: config::training::LEARNING_RATE,
            train_split: config::training::TRAIN_SPLIT,
            min_pairs: config::training::MIN_TRAINING_PAIRS,
            seed: config::RANDOM_SEED,
        }
    }

    pub fn settings_for(&self, train_examples: usize) -> TrainerSettings {
        TrainerSettings {
            base_model: self.base_model.clone(),
            epochs: self.epochs,
            batch_size: self.hardware.batch_size(),
            warmup_steps: warmup_steps(train_examples),
            learning_rate: self.learning_rate,
            mixed_precision: self.hardware.mixed_precision(),
            loss: LossObjective::CosineSimilarity,
            seed: self.seed,
        }
    }
}

/// min(100, train_examples / 10)
pub fn warmup_steps(train_examples: usize) -> usize {
    config::training::WARMUP_STEPS_CAP.min(train_examples / config::training::WARMUP_STEPS_DIVISOR)
}

/// Fails with `InsufficientTrainingData` when fewer than `required` pairs exist.
pub fn check_pair_count(found: usize, required: usize) -> Result<(), PipelineError> {
    if found < required {
        log::error!("❌ Not enough training examples ({found}). Need at least {required}.");
        return Err(PipelineError::InsufficientTrainingData { found, required });
    }
    Ok(())
}

/// Ordered split at `ratio`; no shuffling here.
pub fn split_train_val(pairs: &[TrainingPair], ratio: f64) -> (&[TrainingPair], &[TrainingPair]) {
    let split_at = ((pairs.len() as f64) * ratio).floor() as usize;
    pairs.split_at(split_at.min(pairs.len()))
}

pub struct TrainingOrchestrator<T: Trainer> {
    trainer: T,
    config: OrchestratorConfig,
}

impl<T: Trainer> TrainingOrchestrator<T> {
    pub fn new(trainer: T, config: OrchestratorConfig) -> Self {
        Self { trainer, config }
    }

    pub fn trainer(&self) -> &T {
        &self.trainer
    }

    /// Train on `pairs` and persist `model_info.json` into `output_dir`.
    pub fn run(
        &mut self,
        pairs: &[TrainingPair],
        training_recipes: usize,
        output_dir: &Path,
    ) -> Result<ModelRunMetadata, PipelineError> {
        check_pair_count(pairs.len(), self.config.min_pairs)?;

        let (train, validation) = split_train_val(pairs, self.config.train_split);
        log::info!(
            "📊 Train examples: {}, Validation examples: {}",
            train.len(),
            validation.len()
        );

        let settings = self.config.settings_for(train.len());
        std::fs::create_dir_all(output_dir)?;

        log::info!("🚀 Starting training...");
        log::info!("   Base model: {}", settings.base_model);
        log::info!("   Output directory: {}", output_dir.display());
        log::info!("   Device: {}", self.config.hardware.label());
        log::info!("   Epochs: {}", settings.epochs);
        log::info!("   Batch size: {}", settings.batch_size);
        log::info!("   Warmup steps: {}", settings.warmup_steps);
        log::info!("   Mixed precision: {}", settings.mixed_precision);
        log::info!("   Training examples: {}", train.len());

        let plan = TrainingPlan {
            train,
            validation,
            settings: &settings,
            output_dir,
        };

        let started = Instant::now();
        let outcome = self.trainer.fit(&plan).map_err(PipelineError::Training)?;
        let elapsed = started.elapsed().as_secs_f64();
        log::info!("✅ Training complete! Model saved to {}", output_dir.display());
        if let Some(loss) = outcome.final_train_loss {
            log::info!("   Final train loss: {loss:.4}");
        }
        match outcome.final_validation_loss {
            Some(loss) => log::info!("   Final validation loss: {loss:.4}"),
            None => log::info!("   No validation examples"),
        }
        log::info!(
            "⏱️  Training took {:.1} minutes ({:.2} hours)",
            elapsed / 60.0,
            elapsed / 3600.0
        );

        let metadata = ModelRunMetadata {
            base_model: settings.base_model.clone(),
            training_recipes,
            training_examples: pairs.len(),
            epochs: settings.epochs,
            batch_size: settings.batch_size,
            embedding_dimension: outcome.embedding_dimension,
        };
        write_metadata(output_dir, &metadata).map_err(PipelineError::Metadata)?;

        Ok(metadata)
    }
}
