// file: src/sampler.rs
// description: Shared sampling policy: penalty revision, nucleus/top-k candidate selection, weighted draw.
// author: cipher-rc5

use anyhow::Result;
use rand::distributions::WeightedIndex;
use rand::Rng;

use crate::config::GenerationConfig;
use crate::frequency::FrequencyTracker;

/// Nucleus sampling only ever considers this many of the highest-probability
/// ids, regardless of vocabulary size. Fixed compute bound, not derived from
/// the vocabulary.
pub const NUCLEUS_CANDIDATE_LIMIT: usize = 5000;

/// Produce exactly one vocabulary id from raw per-position scores.
///
/// The scores are revised with the frequency/presence penalties, mapped to
/// probability space with base-10 exponentiation (the scores are treated as
/// log10-probabilities, deliberately not softmaxed), filtered to a nucleus
/// or top-k candidate set, renormalized, and drawn from categorically.
/// Consumes the caller's RNG exactly once.
pub fn sample_next_token<R: Rng + ?Sized>(
    log_probs: &[f32],
    tracker: &FrequencyTracker,
    config: &GenerationConfig,
    rng: &mut R,
) -> Result<u32> {
    anyhow::ensure!(
        log_probs.len() == config.vocab_size,
        "expected {} logits, got {}",
        config.vocab_size,
        log_probs.len()
    );

    let mut probs = Vec::with_capacity(log_probs.len());
    for (i, &score) in log_probs.iter().enumerate() {
        let (freq, presence) =
            tracker.penalty_bonus(i as u32, config.frequency_penalty, config.presence_penalty);
        probs.push(10f32.powf(score - freq - presence));
    }

    let (candidates, weights) = if config.uses_nucleus() {
        nucleus_candidates(&probs, config.top_p)
    } else {
        top_k_candidates(&probs, config.top_k_num)
    };

    let dist = WeightedIndex::new(&weights)?;
    Ok(candidates[rng.sample(&dist)])
}

/// Nucleus (top-p) candidate selection over the truncated head of the
/// distribution. `top_p_num` is the number of positions in the cumulative
/// sum that exceed `top_p`; when the distribution is too flat for the
/// truncated mass to cross the threshold, all candidates are kept.
fn nucleus_candidates(probs: &[f32], top_p: f32) -> (Vec<u32>, Vec<f32>) {
    let limit = NUCLEUS_CANDIDATE_LIMIT.min(probs.len());
    let order = descending_order(probs, limit);

    let mut cumsum = 0.0f32;
    let mut top_p_num = 0usize;
    for &idx in &order {
        cumsum += probs[idx];
        if cumsum > top_p {
            top_p_num += 1;
        }
    }
    if top_p_num == 0 {
        top_p_num = limit;
    }

    let candidates: Vec<u32> = order[..top_p_num].iter().map(|&i| i as u32).collect();
    let selected: Vec<f32> = order[..top_p_num].iter().map(|&i| probs[i]).collect();
    (candidates, renormalize(selected))
}

/// Top-k candidate selection. A candidate set whose probabilities underflow
/// to an exact zero sum falls back to a uniform draw over the same k ids
/// rather than erroring.
fn top_k_candidates(probs: &[f32], k: usize) -> (Vec<u32>, Vec<f32>) {
    let order = descending_order(probs, k);
    let candidates: Vec<u32> = order.iter().map(|&i| i as u32).collect();
    let selected: Vec<f32> = order.iter().map(|&i| probs[i]).collect();

    if selected.iter().sum::<f32>() == 0.0 {
        let uniform = 1.0 / k as f32;
        return (candidates, vec![uniform; k]);
    }
    (candidates, renormalize(selected))
}

/// Indices of the `take` largest probabilities, descending, with ties broken
/// by ascending index so the ordering is deterministic.
fn descending_order(probs: &[f32], take: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..probs.len()).collect();
    order.sort_by(|&a, &b| {
        probs[b]
            .partial_cmp(&probs[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    order.truncate(take);
    order
}

fn renormalize(mut weights: Vec<f32>) -> Vec<f32> {
    let total: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= total;
    }
    weights
}
