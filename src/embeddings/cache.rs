// cache.rs — Process-lifetime model cache for single-text embedding requests.
//
// State machine: Unloaded -> (first request) -> Ready | Failed.
// The load runs at most once, even under concurrent first requests
// (OnceLock single-flight). Failed is terminal: a broken model directory
// does not heal within the process, so every later call gets the same error.
// Reads after initialization take no lock.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config;
use crate::errors::PipelineError;
use crate::training::metadata::read_metadata;

/// Anything that turns text into an embedding vector.
pub trait Embedder {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Builds an embedder from an (opaque) model directory.
pub trait ModelLoader {
    type Model: Embedder;

    fn load(&self, model_dir: &Path) -> anyhow::Result<Self::Model>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Unloaded,
    Ready,
    Failed,
}

#[derive(Debug, Clone)]
enum LoadFailure {
    NotFound(PathBuf),
    Load(String),
}

struct Loaded<M> {
    model: M,
    expected_dims: Option<usize>,
}

pub struct ModelCache<L: ModelLoader> {
    model_dir: PathBuf,
    loader: L,
    slot: OnceLock<Result<Loaded<L::Model>, LoadFailure>>,
}

impl<L: ModelLoader> ModelCache<L> {
    pub fn new(model_dir: impl Into<PathBuf>, loader: L) -> Self {
        Self {
            model_dir: model_dir.into(),
            loader,
            slot: OnceLock::new(),
        }
    }

    pub fn state(&self) -> CacheState {
        match self.slot.get() {
            None => CacheState::Unloaded,
            Some(Ok(_)) => CacheState::Ready,
            Some(Err(_)) => CacheState::Failed,
        }
    }

    /// Embed one text; the result is always unit length.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        if text.is_empty() {
            return Err(PipelineError::MissingInput);
        }

        let loaded = self.loaded()?;
        let raw = loaded
            .model
            .embed(text)
            .map_err(|e| PipelineError::Embedding(format!("{e:#}")))?;

        if let Some(expected) = loaded.expected_dims {
            if raw.len() != expected {
                return Err(PipelineError::DimensionMismatch {
                    expected,
                    actual: raw.len(),
                });
            }
        }

        normalize_unit(raw)
    }

    fn loaded(&self) -> Result<&Loaded<L::Model>, PipelineError> {
        match self.slot.get_or_init(|| self.load_once()) {
            Ok(loaded) => Ok(loaded),
            Err(LoadFailure::NotFound(path)) => Err(PipelineError::ModelNotFound { path: path.clone() }),
            Err(LoadFailure::Load(reason)) => Err(PipelineError::ModelLoadFailure {
                reason: reason.clone(),
            }),
        }
    }

    fn load_once(&self) -> Result<Loaded<L::Model>, LoadFailure> {
        if !self.model_dir.is_dir() {
            log::error!("Model directory missing: {}", self.model_dir.display());
            return Err(LoadFailure::NotFound(self.model_dir.clone()));
        }

        let expected_dims = match read_metadata(&self.model_dir) {
            Ok(Some(meta)) => Some(meta.embedding_dimension),
            Ok(None) => {
                log::debug!("No {} next to the model, skipping dimension check", config::paths::MODEL_INFO_FILE);
                None
            }
            Err(e) => return Err(LoadFailure::Load(format!("{e:#}"))),
        };

        log::info!("Loading embedding model from {}", self.model_dir.display());
        match self.loader.load(&self.model_dir) {
            Ok(model) => Ok(Loaded { model, expected_dims }),
            Err(e) => {
                log::error!("Model load failed: {:?}", e);
                Err(LoadFailure::Load(format!("{e:#}")))
            }
        }
    }
}

/// Scale `v` to unit L2 norm.
pub fn normalize_unit(mut v: Vec<f32>) -> Result<Vec<f32>, PipelineError> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if !norm.is_finite() || norm < config::embedding::UNIT_NORM_EPSILON {
        return Err(PipelineError::Embedding(format!("cannot normalize vector with norm {norm}")));
    }
    for x in &mut v {
        *x /= norm;
    }
    Ok(v)
}
