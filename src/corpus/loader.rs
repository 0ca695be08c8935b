// loader.rs — Memory-bounded CSV ingestion with seeded sampling.
//
// Small files are read whole. Files above the chunk threshold are streamed
// CHUNK_ROWS at a time; each chunk is down-sampled at a ratio estimated from
// the file size (rows-per-MB heuristic, deliberately approximate) and reading
// stops once EARLY_STOP_FACTOR x max_records rows are buffered. Both paths end
// with one exact uniform sample down to max_records.
//
// Peak residency is one chunk plus the accumulated buffer, never the file.

use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::config;
use crate::corpus::record::RawRecord;
use crate::errors::PipelineError;

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub max_records: usize,
    pub sample: bool,
    pub chunk_threshold_bytes: u64,
    pub chunk_rows: usize,
    pub estimated_rows_per_mb: f64,
    pub early_stop_factor: f64,
    pub seed: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_records: config::corpus::MAX_RECORDS,
            sample: config::corpus::SAMPLE_RECORDS,
            chunk_threshold_bytes: config::corpus::CHUNK_THRESHOLD_BYTES,
            chunk_rows: config::corpus::CHUNK_ROWS,
            estimated_rows_per_mb: config::corpus::ESTIMATED_ROWS_PER_MB,
            early_stop_factor: config::corpus::EARLY_STOP_FACTOR,
            seed: config::RANDOM_SEED,
        }
    }
}

impl LoaderConfig {
    pub fn with_limits(max_records: usize, sample: bool) -> Self {
        Self {
            max_records,
            sample,
            ..Self::default()
        }
    }
}

pub struct CorpusLoader {
    config: LoaderConfig,
}

impl CorpusLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Load up to `max_records` raw rows from the CSV at `path`.
    pub fn load(&self, path: &Path) -> Result<Vec<RawRecord>, PipelineError> {
        let meta = match std::fs::metadata(path) {
            Ok(m) if m.is_file() => m,
            _ => {
                return Err(PipelineError::DataSourceNotFound {
                    tried: vec![path.to_path_buf()],
                })
            }
        };

        let cfg = &self.config;
        let mut rng = StdRng::seed_from_u64(cfg.seed);

        let size_bytes = meta.len();
        let size_mb = size_bytes as f64 / (1024.0 * 1024.0);
        log::info!("📖 Loading recipes from {}", path.display());
        log::info!("   File size: {:.2} MB", size_mb);

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers = reader.headers()?.clone();

        let mut rows = if size_bytes > cfg.chunk_threshold_bytes {
            log::info!("   Large file detected, reading in chunks and sampling...");
            self.read_chunked(&mut reader, &headers, size_mb, &mut rng)?
        } else {
            let mut all = Vec::new();
            for result in reader.records() {
                all.push(RawRecord::from_csv(&headers, &result?));
            }
            all
        };

        if cfg.sample && rows.len() > cfg.max_records {
            log::info!("📊 Final sampling: {} from {} loaded...", cfg.max_records, rows.len());
            rows = sample_exact(rows, cfg.max_records, &mut rng);
        }

        log::info!("✅ Loaded {} recipes for training", rows.len());
        Ok(rows)
    }

    fn read_chunked(
        &self,
        reader: &mut csv::Reader<std::fs::File>,
        headers: &csv::StringRecord,
        size_mb: f64,
        rng: &mut StdRng,
    ) -> Result<Vec<RawRecord>, PipelineError> {
        let cfg = &self.config;
        let ratio = chunk_sample_ratio(cfg.max_records, size_mb, cfg.estimated_rows_per_mb);
        let stop_at = (cfg.max_records as f64 * cfg.early_stop_factor).ceil() as usize;
        log::debug!("   Chunk sample ratio {:.4}, early stop at {} rows", ratio, stop_at);

        let mut accumulated: Vec<RawRecord> = Vec::new();
        let mut records = reader.records();
        let mut chunks_read = 0usize;

        loop {
            let mut chunk = Vec::with_capacity(cfg.chunk_rows);
            for result in records.by_ref().take(cfg.chunk_rows) {
                chunk.push(RawRecord::from_csv(headers, &result?));
            }
            if chunk.is_empty() {
                break;
            }
            chunks_read += 1;

            if cfg.sample && ratio < 1.0 {
                let keep = (chunk.len() as f64 * ratio).round() as usize;
                chunk = sample_exact(chunk, keep, rng);
            }
            accumulated.extend(chunk);

            if cfg.sample && accumulated.len() >= stop_at {
                log::info!(
                    "   Buffered {} rows after {} chunks, stopping early",
                    accumulated.len(),
                    chunks_read
                );
                break;
            }
        }

        Ok(accumulated)
    }
}

/// Convenience wrapper using default thresholds.
pub fn load(path: &Path, max_records: usize, sample: bool) -> Result<Vec<RawRecord>, PipelineError> {
    CorpusLoader::new(LoaderConfig::with_limits(max_records, sample)).load(path)
}

/// Per-chunk keep ratio from the estimated total row count.
pub fn chunk_sample_ratio(max_records: usize, size_mb: f64, rows_per_mb: f64) -> f64 {
    let estimated_rows = size_mb * rows_per_mb;
    if estimated_rows <= 0.0 {
        return 1.0;
    }
    (max_records as f64 / estimated_rows).min(1.0)
}

/// Uniform sample of exactly `n` rows (or all rows when fewer), without replacement.
pub fn sample_exact<T>(rows: Vec<T>, n: usize, rng: &mut StdRng) -> Vec<T> {
    if n >= rows.len() {
        return rows;
    }
    let picks = index::sample(rng, rows.len(), n);
    let mut slots: Vec<Option<T>> = rows.into_iter().map(Some).collect();
    picks.into_iter().filter_map(|i| slots[i].take()).collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_csv(rows: usize) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "title,ingredients,directions").unwrap();
        for i in 0..rows {
            writeln!(f, "Recipe {i},\"['salt', 'item{i}']\",Cook {i}").unwrap();
        }
        f.flush().unwrap();
        f
    }

    fn titles(rows: &[RawRecord]) -> Vec<String> {
        rows.iter().map(|r| r.get("title").unwrap().to_string()).collect()
    }

    #[test]
    fn missing_file_is_data_source_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("nope.csv"), 10, true).unwrap_err();
        assert!(matches!(err, PipelineError::DataSourceNotFound { .. }));
    }

    #[test]
    fn small_file_is_sampled_to_exact_limit() {
        let f = write_csv(120);
        let rows = load(f.path(), 50, true).unwrap();
        assert_eq!(rows.len(), 50);

        let mut unique = titles(&rows);
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 50);
    }

    #[test]
    fn small_file_below_limit_is_returned_whole() {
        let f = write_csv(7);
        let rows = load(f.path(), 50, true).unwrap();
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0].get("ingredients"), Some("['salt', 'item0']"));
    }

    #[test]
    fn sampling_disabled_keeps_everything() {
        let f = write_csv(80);
        let rows = load(f.path(), 10, false).unwrap();
        assert_eq!(rows.len(), 80);
    }

    #[test]
    fn sampling_is_deterministic() {
        let f = write_csv(200);
        let a = titles(&load(f.path(), 30, true).unwrap());
        let b = titles(&load(f.path(), 30, true).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn chunked_mode_stops_early_and_samples_exactly() {
        let f = write_csv(1000);
        let cfg = LoaderConfig {
            max_records: 100,
            sample: true,
            chunk_threshold_bytes: 0,
            chunk_rows: 50,
            // Tiny estimate keeps the per-chunk ratio at 1.0.
            estimated_rows_per_mb: 1.0,
            ..LoaderConfig::default()
        };
        let rows = CorpusLoader::new(cfg).load(f.path()).unwrap();
        assert_eq!(rows.len(), 100);

        // Early stop at 120 rows means nothing past the third chunk was read.
        let max_seen = rows
            .iter()
            .map(|r| r.get("title").unwrap().trim_start_matches("Recipe ").parse::<usize>().unwrap())
            .max()
            .unwrap();
        assert!(max_seen < 150, "read past early stop: {max_seen}");
    }

    #[test]
    fn chunked_mode_downsamples_each_chunk() {
        let f = write_csv(400);
        let size_mb = std::fs::metadata(f.path()).unwrap().len() as f64 / (1024.0 * 1024.0);
        // Estimate 2000 rows in the file -> keep ratio 0.05 for max_records = 100.
        let cfg = LoaderConfig {
            max_records: 100,
            sample: true,
            chunk_threshold_bytes: 0,
            chunk_rows: 100,
            estimated_rows_per_mb: 2000.0 / size_mb,
            ..LoaderConfig::default()
        };
        let rows = CorpusLoader::new(cfg).load(f.path()).unwrap();
        assert_eq!(rows.len(), 20);
        assert!(rows.len() <= 100);
    }

    #[test]
    fn chunk_ratio_is_capped_at_one() {
        assert_eq!(chunk_sample_ratio(50_000, 10.0, 1000.0), 1.0);
        assert!((chunk_sample_ratio(50_000, 500.0, 1000.0) - 0.1).abs() < 1e-12);
        assert_eq!(chunk_sample_ratio(10, 0.0, 1000.0), 1.0);
    }

    #[test]
    fn sample_exact_without_replacement() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut picked = sample_exact((0..100).collect::<Vec<_>>(), 40, &mut rng);
        assert_eq!(picked.len(), 40);
        picked.sort();
        picked.dedup();
        assert_eq!(picked.len(), 40);
    }
}
