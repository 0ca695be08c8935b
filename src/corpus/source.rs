// source.rs — Locates the recipe corpus under the project root.

use std::path::{Path, PathBuf};

use crate::config;
use crate::errors::PipelineError;

/// Return the first existing corpus candidate, in priority order.
pub fn locate_corpus(project_root: &Path) -> Result<PathBuf, PipelineError> {
    locate_first(project_root, config::paths::CSV_CANDIDATES)
}

pub fn locate_first(project_root: &Path, candidates: &[&str]) -> Result<PathBuf, PipelineError> {
    let tried: Vec<PathBuf> = candidates.iter().map(|name| project_root.join(name)).collect();

    match tried.iter().find(|p| p.is_file()) {
        Some(found) => {
            log::info!("📖 Using local CSV file: {}", found.display());
            Ok(found.clone())
        }
        None => Err(PipelineError::DataSourceNotFound { tried }),
    }
}
