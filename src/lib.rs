// lib.rs — Recipe embedding pipeline: corpus ingestion, pair synthesis,
// fine-tuning and single-text inference.

pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod errors;
pub mod logging;
pub mod pairs;
pub mod protocol;
pub mod training;

use std::path::{Path, PathBuf};

pub use errors::PipelineError;

/// Project root: `$RECIPE_EMBEDDER_ROOT` when set and non-empty, else the working directory.
pub fn project_root() -> anyhow::Result<PathBuf> {
    if let Ok(v) = std::env::var(config::paths::ROOT_ENV_VAR) {
        if !v.is_empty() {
            return Ok(PathBuf::from(v));
        }
    }
    Ok(std::env::current_dir()?)
}

/// Fine-tuned model directory under `root`.
pub fn model_dir(root: &Path) -> PathBuf {
    root.join(config::paths::MODEL_DIR_REL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_dir_is_under_root() {
        assert_eq!(
            model_dir(Path::new("/srv/app")),
            PathBuf::from("/srv/app/models/recipe-embedder")
        );
    }
}
