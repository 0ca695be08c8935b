// train_model.rs — Build the recipe pair corpus and fine-tune the embedder.
//
// Takes no flags. Reads the recipe CSV from the project root, writes the
// fine-tuned model plus model_info.json to <root>/models/recipe-embedder.

use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use flexi_logger::Duplicate;

use recipe_embedder::corpus::{self, source::locate_corpus, CorpusLoader, LoaderConfig};
use recipe_embedder::embeddings::download::ensure_base_model;
use recipe_embedder::embeddings::{EngineLoader, ModelCache};
use recipe_embedder::pairs::PairSynthesizer;
use recipe_embedder::training::orchestrator::check_pair_count;
use recipe_embedder::training::{select_device, CandleTrainer, OrchestratorConfig, TrainingOrchestrator};
use recipe_embedder::{config, logging, model_dir, project_root};

fn main() -> ExitCode {
    let root = match project_root() {
        Ok(root) => root,
        Err(e) => {
            eprintln!("[train_model] cannot determine project root: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let _logger = match logging::init_logging(&root, config::logging::TRAIN_LOG_BASENAME, Duplicate::Info) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("[train_model] logging disabled: {e:#}");
            None
        }
    };

    if std::env::args().len() > 1 {
        log::warn!("train_model takes no arguments; ignoring them");
    }

    match run(&root) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("❌ {e:#}");
            eprintln!("[train_model] {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(root: &Path) -> anyhow::Result<()> {
    let total_started = Instant::now();

    let csv_path = locate_corpus(root)?;
    log::info!("📂 Loading recipes from {}", csv_path.display());
    let load_started = Instant::now();
    let loader = CorpusLoader::new(LoaderConfig::default());
    let rows = loader.load(&csv_path)?;
    log::info!(
        "✅ Loaded {} recipes in {:.1} minutes",
        rows.len(),
        load_started.elapsed().as_secs_f64() / 60.0
    );

    let recipes = corpus::normalize_all(rows);
    let pairs = PairSynthesizer::default().synthesize(&recipes);
    // Before any device setup or base model download.
    check_pair_count(pairs.len(), config::training::MIN_TRAINING_PAIRS)?;

    let (device, hardware) = select_device();
    let base_model_dir = ensure_base_model(root).context("base model unavailable")?;
    let output_dir = model_dir(root);

    let trainer = CandleTrainer::new(base_model_dir, device);
    let mut orchestrator = TrainingOrchestrator::new(trainer, OrchestratorConfig::for_hardware(hardware));
    let metadata = orchestrator.run(&pairs, recipes.len(), &output_dir)?;

    log::info!("🧪 Testing model...");
    let cache = ModelCache::new(&output_dir, EngineLoader);
    let embedding = cache.embed(config::training::SMOKE_TEST_TEXT)?;
    let preview: Vec<String> = embedding.iter().take(5).map(|v| format!("{v:.4}")).collect();
    log::info!("   Test embedding shape: ({},)", embedding.len());
    log::info!("   First 5 values: [{}]", preview.join(", "));

    log::info!("{}", "=".repeat(60));
    log::info!("🎉 Training finished");
    log::info!("   Recipes: {}", metadata.training_recipes);
    log::info!("   Training examples: {}", metadata.training_examples);
    log::info!("   Embedding dimension: {}", metadata.embedding_dimension);
    log::info!("   Model directory: {}", output_dir.display());
    log::info!(
        "⏱️  Total time: {:.1} minutes",
        total_started.elapsed().as_secs_f64() / 60.0
    );
    log::info!("{}", "=".repeat(60));
    Ok(())
}
