// trainer.rs — The seam between the orchestrator and the parameter-update engine.

use std::path::Path;

use crate::pairs::TrainingPair;

/// Objective handed to the trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossObjective {
    /// MSE between cosine(embed(a), embed(b)) and the pair label.
    CosineSimilarity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainerSettings {
    pub base_model: String,
    pub epochs: usize,
    pub batch_size: usize,
    pub warmup_steps: usize,
    pub learning_rate: f64,
    pub mixed_precision: bool,
    pub loss: LossObjective,
    /// Seed for per-epoch batch shuffling.
    pub seed: u64,
}

/// Everything a trainer needs for one run.
pub struct TrainingPlan<'a> {
    pub train: &'a [TrainingPair],
    pub validation: &'a [TrainingPair],
    pub settings: &'a TrainerSettings,
    pub output_dir: &'a Path,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainOutcome {
    pub embedding_dimension: usize,
    pub final_train_loss: Option<f32>,
    pub final_validation_loss: Option<f32>,
}

/// Fine-tunes the embedder on a pair stream and writes model artifacts to
/// `plan.output_dir`. Blocks until training completes.
pub trait Trainer {
    fn fit(&mut self, plan: &TrainingPlan<'_>) -> anyhow::Result<TrainOutcome>;
}

impl<T: Trainer + ?Sized> Trainer for &mut T {
    fn fit(&mut self, plan: &TrainingPlan<'_>) -> anyhow::Result<TrainOutcome> {
        (**self).fit(plan)
    }
}

/// Learning rate at `step`: linear warmup to `peak`, then linear decay to zero.
pub fn warmup_linear_lr(step: usize, warmup_steps: usize, total_steps: usize, peak: f64) -> f64 {
    if warmup_steps > 0 && step < warmup_steps {
        return peak * (step + 1) as f64 / warmup_steps as f64;
    }
    let decay_span = total_steps.saturating_sub(warmup_steps).max(1);
    let into_decay = step.saturating_sub(warmup_steps);
    peak * (1.0 - into_decay as f64 / decay_span as f64).max(0.0)
}
