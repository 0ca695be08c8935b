// logging.rs — File logging with rotation, one log file per binary.

use std::path::{Path, PathBuf};

use anyhow::Context;
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};

use crate::config;

/// Start file logging under `<root>/logs/<basename>`.
///
/// The level comes from `RUST_LOG` when set, else `info`. `duplicate` picks
/// what is mirrored to stderr; stdout is never written. The returned handle
/// must stay alive for the process lifetime so buffered lines get flushed.
pub fn init_logging(project_root: &Path, basename: &str, duplicate: Duplicate) -> anyhow::Result<LoggerHandle> {
    let log_dir = log_dir(project_root)?;

    let handle = Logger::try_with_env_or_str(config::logging::DEFAULT_LEVEL)?
        .log_to_file(FileSpec::default().directory(&log_dir).basename(basename))
        .rotate(
            Criterion::Size(config::logging::LOG_ROTATE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(config::logging::LOG_ROTATE_KEEP_FILES),
        )
        .duplicate_to_stderr(duplicate)
        .format_for_files(flexi_logger::detailed_format)
        .format_for_stderr(flexi_logger::default_format)
        .start()
        .context("failed to start logger")?;

    log::info!("{}", "=".repeat(60));
    log::info!("{} starting (version {})", basename, config::VERSION);
    log::info!("Platform: {}", std::env::consts::OS);
    log::info!("Project root: {}", project_root.display());
    log::info!("{}", "=".repeat(60));

    Ok(handle)
}

fn log_dir(project_root: &Path) -> anyhow::Result<PathBuf> {
    let dir = project_root.join(config::logging::LOG_DIR_REL);
    std::fs::create_dir_all(&dir).with_context(|| format!("failed creating log dir {}", dir.display()))?;
    Ok(dir)
}
