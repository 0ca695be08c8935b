// main.rs — recipe_embed: print the embedding of one text as a JSON line.
//
// Usage: recipe_embed "<text>"
//
// stdout carries exactly one JSON document: {"embedding":[...],"dimension":N}
// on success (exit 0) or {"error":"..."} on failure (exit 1). Diagnostics go
// to the log file; only warnings and errors are mirrored to stderr.

use std::io::stdout;
use std::process::ExitCode;

use flexi_logger::Duplicate;

use recipe_embedder::embeddings::{EngineLoader, ModelCache};
use recipe_embedder::protocol::{write_json_line, EmbedResponse, ErrorResponse};
use recipe_embedder::{config, logging, model_dir, project_root, PipelineError};

fn main() -> ExitCode {
    let root = match project_root() {
        Ok(root) => root,
        Err(e) => return respond_error(&format!("cannot determine project root: {e}")),
    };

    // The JSON contract holds even when the log directory is unwritable.
    let _logger = match logging::init_logging(&root, config::logging::EMBED_LOG_BASENAME, Duplicate::Warn) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("[recipe_embed] logging disabled: {e:#}");
            None
        }
    };

    let mut args = std::env::args().skip(1);
    let Some(text) = args.next() else {
        log::warn!("No text argument given");
        return respond_error(&PipelineError::MissingInput.to_string());
    };
    let extra = args.count();
    if extra > 0 {
        log::warn!("Ignoring {extra} extra argument(s); quote the text to embed it as one string");
    }

    let cache = ModelCache::new(model_dir(&root), EngineLoader);
    match cache.embed(&text) {
        Ok(embedding) => {
            log::info!("Embedded {} chars into {} dims", text.chars().count(), embedding.len());
            match write_json_line(&mut stdout().lock(), &EmbedResponse::new(embedding)) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    log::error!("Failed writing response: {e:#}");
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => {
            log::error!("Embedding failed: {e}");
            respond_error(&e.to_string())
        }
    }
}

fn respond_error(message: &str) -> ExitCode {
    if let Err(e) = write_json_line(&mut stdout().lock(), &ErrorResponse::new(message)) {
        eprintln!("[recipe_embed] failed writing error response: {e:#}");
    }
    ExitCode::FAILURE
}
