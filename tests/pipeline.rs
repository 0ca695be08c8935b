// Corpus -> pairs -> orchestrator, with a recording trainer standing in for candle.

use std::fs;
use std::path::Path;

use recipe_embedder::corpus::{self, CorpusLoader, LoaderConfig};
use recipe_embedder::pairs::{PairSynthesizer, TrainingPair};
use recipe_embedder::training::{
    read_metadata, HardwareProfile, OrchestratorConfig, TrainOutcome, Trainer, TrainingOrchestrator, TrainingPlan,
};
use recipe_embedder::PipelineError;

#[derive(Default)]
struct RecordingTrainer {
    calls: usize,
    train_seen: Vec<TrainingPair>,
    validation_seen: usize,
    batch_size: usize,
}

impl Trainer for RecordingTrainer {
    fn fit(&mut self, plan: &TrainingPlan<'_>) -> anyhow::Result<TrainOutcome> {
        self.calls += 1;
        self.train_seen = plan.train.to_vec();
        self.validation_seen = plan.validation.len();
        self.batch_size = plan.settings.batch_size;
        Ok(TrainOutcome {
            embedding_dimension: 384,
            final_train_loss: Some(0.1),
            final_validation_loss: None,
        })
    }
}

fn write_corpus(dir: &Path) -> std::path::PathBuf {
    let mut csv = String::from("title,ingredients,directions,cuisine\n");
    for cuisine in ["Italian", "Mexican", "Thai"] {
        for i in 0..5 {
            csv.push_str(&format!(
                "{cuisine} dish {i},\"['salt', 'oil', 'item{i}']\",\"['Cook.', 'Serve.']\",{cuisine}\n"
            ));
        }
    }
    let path = dir.join("recipes_data.csv");
    fs::write(&path, csv).unwrap();
    path
}

#[test]
fn small_corpus_trains_on_cohort_pairs_only() {
    let root = tempfile::tempdir().unwrap();
    let csv = write_corpus(root.path());
    assert_eq!(corpus::source::locate_corpus(root.path()).unwrap(), csv);

    let rows = CorpusLoader::new(LoaderConfig::default()).load(&csv).unwrap();
    assert_eq!(rows.len(), 15);
    let recipes = corpus::normalize_all(rows);
    assert_eq!(recipes[0].ingredients, "salt, oil, item0");
    assert_eq!(recipes[0].instructions, "Cook. Serve.");

    let pairs = PairSynthesizer::default().synthesize(&recipes);
    // 5 members per cuisine, forward window 2: 4 + 3 = 7 pairs per cohort.
    assert_eq!(pairs.len(), 21);
    assert!(pairs.iter().all(|p| p.label == 1.0));

    let out = root.path().join("models/recipe-embedder");
    let mut trainer = RecordingTrainer::default();
    let meta = TrainingOrchestrator::new(&mut trainer, OrchestratorConfig::for_hardware(HardwareProfile::Cpu))
        .run(&pairs, recipes.len(), &out)
        .unwrap();

    assert_eq!(trainer.calls, 1);
    assert_eq!(trainer.train_seen.len(), 16);
    assert_eq!(trainer.validation_seen, 5);
    assert_eq!(trainer.train_seen[..], pairs[..16]);
    assert_eq!(trainer.batch_size, 32);

    assert_eq!(meta.training_recipes, 15);
    assert_eq!(meta.training_examples, 21);
    assert_eq!(read_metadata(&out).unwrap(), Some(meta));
}

#[test]
fn too_few_pairs_never_reach_the_trainer() {
    let root = tempfile::tempdir().unwrap();
    let csv = root.path().join("recipes.csv");
    fs::write(&csv, "title,ingredients,cuisine\nA,eggs,French\nB,eggs,French\nC,rice,Thai\n").unwrap();

    let recipes = corpus::normalize_all(CorpusLoader::new(LoaderConfig::default()).load(&csv).unwrap());
    let pairs = PairSynthesizer::default().synthesize(&recipes);

    let mut trainer = RecordingTrainer::default();
    let err = TrainingOrchestrator::new(&mut trainer, OrchestratorConfig::for_hardware(HardwareProfile::Cpu))
        .run(&pairs, recipes.len(), &root.path().join("out"))
        .unwrap_err();

    assert!(matches!(err, PipelineError::InsufficientTrainingData { required: 10, .. }));
    assert_eq!(trainer.calls, 0);
    assert!(!root.path().join("out/model_info.json").exists());
}

#[test]
fn missing_corpus_lists_every_candidate() {
    let root = tempfile::tempdir().unwrap();
    match corpus::source::locate_corpus(root.path()) {
        Err(PipelineError::DataSourceNotFound { tried }) => {
            assert_eq!(tried, vec![root.path().join("recipes_data.csv"), root.path().join("recipes.csv")]);
        }
        other => panic!("expected DataSourceNotFound, got {other:?}"),
    }
}
