// metadata.rs — model_info.json, the durable contract between training and inference.
//
// Written with the same tmp-then-rename discipline as the base model download,
// so a concurrent reader sees either the previous file or the complete new one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRunMetadata {
    pub base_model: String,
    pub training_recipes: usize,
    pub training_examples: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub embedding_dimension: usize,
}

pub fn metadata_path(model_dir: &Path) -> PathBuf {
    model_dir.join(config::paths::MODEL_INFO_FILE)
}

/// Persist metadata next to the model artifacts. Returns the final path.
pub fn write_metadata(model_dir: &Path, meta: &ModelRunMetadata) -> anyhow::Result<PathBuf> {
    let dest = metadata_path(model_dir);
    let body = serde_json::to_vec_pretty(meta).context("failed serializing model metadata")?;

    let tmp_path = dest.with_extension("json.tmp");
    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;
    file.write_all(&body)?;
    file.flush()?;
    file.sync_all()
        .with_context(|| format!("failed to sync {}", tmp_path.display()))?;
    drop(file);

    fs::rename(&tmp_path, &dest)
        .with_context(|| format!("failed to rename {} -> {}", tmp_path.display(), dest.display()))?;

    log::info!("📝 Model info saved to {}", dest.display());
    Ok(dest)
}

/// Read metadata if the file exists.
pub fn read_metadata(model_dir: &Path) -> anyhow::Result<Option<ModelRunMetadata>> {
    let path = metadata_path(model_dir);
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let meta = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(Some(meta))
}
