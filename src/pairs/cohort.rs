// cohort.rs — Stage A: positive pairs from recipes sharing a cuisine tag.
//
// Each cohort contributes a bounded sample (2 x pairs_per_cuisine indices);
// every sampled recipe is paired with at most `forward_neighbours` of the
// recipes sampled after it, never with itself and never across cohorts.
// The generator is reseeded before every pairable cohort, so a cohort's sample
// does not depend on the cohorts before it. Stage B continues from the state
// the last cohort left behind.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::corpus::NormalizedRecipe;
use crate::pairs::{SynthesisConfig, TrainingPair};

/// A cuisine tag and the record indices carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cohort {
    pub cuisine: String,
    pub members: Vec<usize>,
}

/// Group record indices by non-empty cuisine, in first-seen order.
pub fn group_by_cuisine(records: &[NormalizedRecipe]) -> Vec<Cohort> {
    let mut slot_of: HashMap<&str, usize> = HashMap::new();
    let mut cohorts: Vec<Cohort> = Vec::new();

    for (idx, recipe) in records.iter().enumerate() {
        let cuisine = recipe.cuisine.as_str();
        if cuisine.trim().is_empty() {
            continue;
        }
        let slot = *slot_of.entry(cuisine).or_insert_with(|| {
            cohorts.push(Cohort {
                cuisine: cuisine.to_string(),
                members: Vec::new(),
            });
            cohorts.len() - 1
        });
        cohorts[slot].members.push(idx);
    }

    cohorts
}

/// Sampled record indices for one cohort (empty when the cohort is too small to pair).
pub fn sample_cohort(cohort: &Cohort, cfg: &SynthesisConfig, rng: &mut StdRng) -> Vec<usize> {
    let n = cohort.members.len();
    if n < 2 {
        return Vec::new();
    }
    let amount = n.min(cfg.pairs_per_cuisine * 2);
    index::sample(rng, n, amount)
        .into_iter()
        .map(|pos| cohort.members[pos])
        .collect()
}

/// Index pairs over a sampled cohort: each position links to its next `forward` positions.
pub fn forward_index_pairs(sampled: &[usize], forward: usize) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for i in 0..sampled.len().saturating_sub(1) {
        let end = (i + 1 + forward).min(sampled.len());
        for j in (i + 1)..end {
            out.push((sampled[i], sampled[j]));
        }
    }
    out
}

pub fn cohort_pairs(
    records: &[NormalizedRecipe],
    cfg: &SynthesisConfig,
    rng: &mut StdRng,
) -> Vec<TrainingPair> {
    let cohorts = group_by_cuisine(records);
    log::info!("   Found {} cuisine groups", cohorts.len());

    let mut pairs = Vec::new();
    for cohort in &cohorts {
        if cohort.members.len() < 2 {
            continue;
        }
        *rng = StdRng::seed_from_u64(cfg.seed);
        let sampled = sample_cohort(cohort, cfg, rng);
        for (a, b) in forward_index_pairs(&sampled, cfg.forward_neighbours) {
            pairs.push(TrainingPair::new(
                &records[a].descriptive_text,
                &records[b].descriptive_text,
                cfg.cohort_label,
            ));
        }
    }

    log::info!("   Created {} cuisine-based pairs", pairs.len());
    pairs
}
