// errors.rs — Error taxonomy shared by the training pipeline and the inference CLI.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced at the pipeline and inference boundaries.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Recipe CSV not found! Tried:\n{}", format_tried(.tried))]
    DataSourceNotFound { tried: Vec<PathBuf> },

    #[error("Not enough training examples: got {found}, need at least {required}")]
    InsufficientTrainingData { found: usize, required: usize },

    #[error("Model not found at {}. Please train the model first.", .path.display())]
    ModelNotFound { path: PathBuf },

    #[error("Failed to load model: {reason}")]
    ModelLoadFailure { reason: String },

    #[error("No text provided")]
    MissingInput,

    #[error("embedding dimension mismatch: model_info.json says {expected}, model produced {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("training failed: {0:#}")]
    Training(anyhow::Error),

    #[error("failed to persist model metadata: {0:#}")]
    Metadata(anyhow::Error),

    #[error("corpus read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

fn format_tried(tried: &[PathBuf]) -> String {
    tried
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n")
}
