// similarity.rs — Stage B: graded pairs from ingredient overlap.
//
// A seeded sample of recipes is scanned in sample order; each anchor is
// compared with the next `window` sampled recipes using token-set Jaccard
// over lowercased ingredients. Pairs above the threshold get a scaled label.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::index;

use crate::config;
use crate::corpus::NormalizedRecipe;
use crate::pairs::{SynthesisConfig, TrainingPair};

/// Whitespace token set of an already-lowercased ingredient string.
pub fn token_set(ingredients_lower: &str) -> HashSet<&str> {
    ingredients_lower.split_whitespace().collect()
}

/// |A ∩ B| / |A ∪ B|; 0.0 when both sets are empty.
pub fn jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f32 / union as f32
}

/// Label for an overlap score, capped at 1.0.
pub fn overlap_label(overlap: f32, scale: f32) -> f32 {
    (overlap * scale).min(1.0)
}

/// Append similarity pairs to `pairs` until it holds `target` entries or the
/// sample is exhausted. Returns the number of pairs added.
pub fn extend_with_similar(
    records: &[NormalizedRecipe],
    cfg: &SynthesisConfig,
    target: usize,
    rng: &mut StdRng,
    pairs: &mut Vec<TrainingPair>,
) -> usize {
    let total = records.len();
    let sample_size = cfg.similarity_sample_size(total);
    log::info!("   Sampling {} recipes for similarity matching...", sample_size);
    if sample_size < 2 {
        return 0;
    }

    let sampled = index::sample(rng, total, sample_size).into_vec();
    let sets: Vec<HashSet<&str>> = sampled
        .iter()
        .map(|&idx| token_set(&records[idx].ingredients_lower))
        .collect();

    let mut created = 0usize;
    'anchors: for i in 0..sampled.len() {
        if pairs.len() >= target {
            break;
        }

        let end = (i + 1 + cfg.similarity_window).min(sampled.len());
        for j in (i + 1)..end {
            if pairs.len() >= target {
                break 'anchors;
            }
            if sets[i].is_empty() || sets[j].is_empty() {
                continue;
            }

            let overlap = jaccard(&sets[i], &sets[j]);
            if overlap > cfg.overlap_threshold {
                pairs.push(TrainingPair::new(
                    &records[sampled[i]].descriptive_text,
                    &records[sampled[j]].descriptive_text,
                    overlap_label(overlap, cfg.overlap_label_scale),
                ));
                created += 1;
            }
        }

        if (i + 1) % config::pairs::PROGRESS_EVERY_ANCHORS == 0 {
            log::info!("   Created {} pairs so far...", pairs.len());
        }
    }

    log::info!("   Created {} additional pairs from ingredient similarity", created);
    created
}
