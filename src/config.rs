// IMPORTANT:
// Keep ALL numeric values centralized here (repo rule: no hardcoded numeric values scattered around).

// NOTE: VERSION must stay in sync with the `version` field in Cargo.toml.
pub const VERSION: &str = "0.1.0";

/// Fixed seed shared by every sampling step (loader and pair synthesis).
pub const RANDOM_SEED: u64 = 42;

pub mod paths {
    // Overrides the project root (defaults to the current working directory).
    pub const ROOT_ENV_VAR: &str = "RECIPE_EMBEDDER_ROOT";

    pub const MODEL_DIR_REL: &str = "models/recipe-embedder";
    pub const MODEL_INFO_FILE: &str = "model_info.json";

    // Corpus candidates, tried in order under the project root.
    pub const CSV_CANDIDATES: &[&str] = &["recipes_data.csv", "recipes.csv"];
}

pub mod logging {
    pub const LOG_DIR_REL: &str = "logs";
    pub const TRAIN_LOG_BASENAME: &str = "train_model";
    pub const EMBED_LOG_BASENAME: &str = "recipe_embed";

    pub const DEFAULT_LEVEL: &str = "info";
    pub const LOG_ROTATE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
    pub const LOG_ROTATE_KEEP_FILES: usize = 5;
}

pub mod corpus {
    pub const MAX_RECORDS: usize = 50_000;
    pub const SAMPLE_RECORDS: bool = true;

    // Files above this size are streamed in chunks instead of read at once.
    pub const CHUNK_THRESHOLD_BYTES: u64 = 100 * 1024 * 1024;
    pub const CHUNK_ROWS: usize = 20_000;

    // Rough row density used to estimate the total row count from file size.
    pub const ESTIMATED_ROWS_PER_MB: f64 = 1000.0;

    // Accumulate this multiple of MAX_RECORDS before the final exact sample.
    pub const EARLY_STOP_FACTOR: f64 = 1.2;

    pub const INSTRUCTIONS_CHAR_BUDGET: usize = 500;
    pub const PROGRESS_EVERY_RECORDS: usize = 10_000;
}

pub mod pairs {
    pub const PAIRS_PER_CUISINE: usize = 20;
    pub const COHORT_FORWARD_NEIGHBOURS: usize = 2;
    pub const COHORT_LABEL: f32 = 1.0;

    pub const TARGET_EXAMPLES_CAP: usize = 5000;
    pub const TARGET_EXAMPLES_DIVISOR: usize = 100;

    pub const SIMILARITY_SAMPLE_CAP: usize = 2000;
    pub const SIMILARITY_SAMPLE_DIVISOR: usize = 50;
    pub const SIMILARITY_WINDOW: usize = 4;

    pub const OVERLAP_THRESHOLD: f32 = 0.15;
    pub const OVERLAP_LABEL_SCALE: f32 = 1.5;

    pub const PROGRESS_EVERY_ANCHORS: usize = 500;
}

pub mod training {
    pub const MIN_TRAINING_PAIRS: usize = 10;
    pub const TRAIN_SPLIT: f64 = 0.8;
    pub const EPOCHS: usize = 2;
    pub const LEARNING_RATE: f64 = 2e-5;

    pub const ACCELERATOR_BATCH_SIZE: usize = 128;
    pub const CPU_BATCH_SIZE: usize = 32;

    pub const WARMUP_STEPS_CAP: usize = 100;
    pub const WARMUP_STEPS_DIVISOR: usize = 10;

    pub const SMOKE_TEST_TEXT: &str = "chicken pasta with tomatoes";
}

pub mod embedding {
    pub const BASE_MODEL_NAME: &str = "all-MiniLM-L6-v2";
    pub const BASE_MODEL_DIMS: usize = 384;

    // Max word-piece tokens for all-MiniLM-L6-v2 (model context limit is 256).
    pub const MAX_TOKENS: usize = 256;

    // Local base model storage (relative to the project root).
    pub const BASE_MODEL_DIR_REL: &str = "models/base/all-MiniLM-L6-v2";

    pub const MODEL_DOWNLOAD_BASE: &str =
        "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";
    pub const DOWNLOAD_TIMEOUT_SECS: u64 = 90;

    // SHA256 hashes for integrity verification
    pub const MODEL_SAFETENSORS_SHA256: &str =
        "53aa51172d142c89d9012cce15ae4d6cc0ca6895895114379cacb4fab128d9db";
    pub const TOKENIZER_JSON_SHA256: &str =
        "be50c3628f2bf5bb5e3a7f17b1f74611b2561a3a27eeab05e5aa30f411572037";
    pub const CONFIG_JSON_SHA256: &str =
        "953f9c0d463486b10a6871cc2fd59f223b2c70184f49815e7efbcab5d8908b41";

    pub const WEIGHTS_FILE: &str = "model.safetensors";
    pub const TOKENIZER_FILE: &str = "tokenizer.json";
    pub const CONFIG_FILE: &str = "config.json";

    pub const UNIT_NORM_EPSILON: f32 = 1e-12;
}
