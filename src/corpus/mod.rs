// corpus/ — Recipe dataset ingestion.
//
// Provides:
// - Corpus file discovery under the project root
// - Chunked, sampled CSV loading
// - Column alias resolution and recipe normalization
// - Descriptive text preparation for the embedder

pub mod literal;
pub mod loader;
pub mod record;
pub mod source;
pub mod text_prep;

pub use loader::{CorpusLoader, LoaderConfig};
pub use record::{normalize, NormalizedRecipe, RawRecord};

/// Normalize every raw row, logging progress for large corpora.
pub fn normalize_all(rows: Vec<RawRecord>) -> Vec<NormalizedRecipe> {
    let total = rows.len();
    let mut out = Vec::with_capacity(total);
    for (i, raw) in rows.into_iter().enumerate() {
        out.push(normalize(&raw));
        let done = i + 1;
        if done % crate::config::corpus::PROGRESS_EVERY_RECORDS == 0 || done == total {
            log::info!("   Processed {}/{} recipes...", done, total);
        }
    }
    out
}
