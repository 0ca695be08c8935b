// download.rs — Base model download with SHA256 verification.
//
// Fine-tuning starts from the pretrained all-MiniLM-L6-v2 checkpoint. Files are
// fetched on first training run and cached under <root>/models/base/.
// Each file is verified against a pinned SHA256 before it is moved into place.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use sha2::{Digest, Sha256};

use crate::config;

/// Files making up a loadable checkpoint, with their pinned digests.
const BASE_MODEL_FILES: &[(&str, &str)] = &[
    (config::embedding::WEIGHTS_FILE, config::embedding::MODEL_SAFETENSORS_SHA256),
    (config::embedding::TOKENIZER_FILE, config::embedding::TOKENIZER_JSON_SHA256),
    (config::embedding::CONFIG_FILE, config::embedding::CONFIG_JSON_SHA256),
];

/// Returns the local base model directory (<root>/models/base/all-MiniLM-L6-v2/).
pub fn base_model_dir(project_root: &Path) -> PathBuf {
    project_root.join(config::embedding::BASE_MODEL_DIR_REL)
}

/// Check if all required model files exist in `dir`.
pub fn model_files_exist(dir: &Path) -> bool {
    BASE_MODEL_FILES.iter().all(|(name, _)| dir.join(name).exists())
}

/// Download all base model files if not already cached. Returns the directory path.
pub fn ensure_base_model(project_root: &Path) -> anyhow::Result<PathBuf> {
    let dir = base_model_dir(project_root);

    if model_files_exist(&dir) {
        log::info!("Base model files already cached at {}", dir.display());
        return Ok(dir);
    }

    log::info!("Downloading base model {} to {}", config::embedding::BASE_MODEL_NAME, dir.display());
    fs::create_dir_all(&dir).with_context(|| format!("failed to create model dir {}", dir.display()))?;

    let base = config::embedding::MODEL_DOWNLOAD_BASE;
    for (name, sha) in BASE_MODEL_FILES {
        let dest = dir.join(name);
        if dest.exists() {
            continue;
        }
        download_and_verify(&format!("{base}/{name}"), &dest, sha)?;
    }

    log::info!("Base model download complete");
    Ok(dir)
}

/// Download a file from URL and verify its SHA256 hash.
fn download_and_verify(url: &str, dest: &Path, expected_sha256: &str) -> anyhow::Result<()> {
    let filename = dest.file_name().unwrap_or_default().to_string_lossy();
    log::info!("Downloading {} from {}", filename, url);

    let resp = ureq::get(url)
        .timeout(std::time::Duration::from_secs(config::embedding::DOWNLOAD_TIMEOUT_SECS))
        .call()
        .with_context(|| format!("failed to download {url}"))?;

    let status = resp.status();
    if status != 200 {
        bail!("HTTP {status} downloading {url}");
    }

    // Read body into memory (model is ~87 MB, fits in RAM)
    let mut body = Vec::new();
    resp.into_reader()
        .read_to_end(&mut body)
        .with_context(|| format!("failed to read response body for {url}"))?;

    verify_sha256(&body, expected_sha256).with_context(|| format!("integrity check for {filename}"))?;
    write_atomically(dest, &body)
}

/// Compare the SHA256 of `body` with the expected lowercase hex digest.
pub fn verify_sha256(body: &[u8], expected_sha256: &str) -> anyhow::Result<()> {
    let mut hasher = Sha256::new();
    hasher.update(body);
    let actual_hash = hex::encode(hasher.finalize());

    if actual_hash != expected_sha256 {
        bail!("SHA256 mismatch: expected {}, got {}", expected_sha256, actual_hash);
    }

    log::info!("SHA256 verified ({})", &actual_hash[..12]);
    Ok(())
}

/// Write to .tmp, then rename over `dest`.
pub fn write_atomically(dest: &Path, body: &[u8]) -> anyhow::Result<()> {
    let tmp_path = dest.with_extension("tmp");
    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;
    file.write_all(body)?;
    file.flush()?;
    drop(file);

    fs::rename(&tmp_path, dest)
        .with_context(|| format!("failed to rename {} -> {}", tmp_path.display(), dest.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_check() {
        // sha256("abc")
        let digest = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
        assert!(verify_sha256(b"abc", digest).is_ok());
        assert!(verify_sha256(b"abd", digest).is_err());
    }

    #[test]
    fn cached_model_is_not_downloaded_again() {
        let root = tempfile::tempdir().unwrap();
        let dir = base_model_dir(root.path());
        fs::create_dir_all(&dir).unwrap();
        for (name, _) in BASE_MODEL_FILES {
            fs::write(dir.join(name), b"cached").unwrap();
        }
        assert!(model_files_exist(&dir));
        assert_eq!(ensure_base_model(root.path()).unwrap(), dir);
    }

    #[test]
    fn atomic_write_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("config.json");
        write_atomically(&dest, b"{}").unwrap();
        write_atomically(&dest, b"{\"a\":1}").unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"{\"a\":1}");
        assert!(!dir.path().join("config.tmp").exists());
    }
}
