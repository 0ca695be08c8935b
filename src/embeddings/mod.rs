// embeddings/ — Local sentence embedding engine using candle (pure Rust).
//
// Provides:
// - Base model download + SHA256 verification
// - BERT inference with mean pooling
// - The process-lifetime model cache behind the inference CLI

pub mod cache;
pub mod download;
pub mod engine;

pub use cache::{CacheState, Embedder, ModelCache, ModelLoader};
pub use engine::{EmbeddingEngine, EngineLoader};
