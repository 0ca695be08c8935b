// training/ — Fine-tuning orchestration and the candle trainer behind it.

pub mod candle_trainer;
pub mod device;
pub mod metadata;
pub mod orchestrator;
pub mod trainer;

pub use candle_trainer::CandleTrainer;
pub use device::{select_device, HardwareProfile};
pub use metadata::{read_metadata, write_metadata, ModelRunMetadata};
pub use orchestrator::{OrchestratorConfig, TrainingOrchestrator};
pub use trainer::{LossObjective, TrainOutcome, Trainer, TrainerSettings, TrainingPlan};
