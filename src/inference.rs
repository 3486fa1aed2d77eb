// file: src/inference.rs
// description: Full-recompute and incremental decoding loops over a padded sequence buffer.
// author: cipher-rc5

use anyhow::{Context, Result};
use rand::Rng;
use tracing::debug;

use crate::benchmark::GenerationTimer;
use crate::config::GenerationConfig;
use crate::frequency::FrequencyTracker;
use crate::model::{IncrementalLanguageModel, LanguageModel};
use crate::sampler::sample_next_token;

/// Pad sentinel. Id 0 is reserved as padding and must not be a legitimate
/// output token.
pub const PAD_TOKEN: u32 = 0;

/// Why a generation loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndToken,
    LengthLimit,
}

/// Fixed-capacity token buffer: the caller's prefix plus the generated
/// suffix, right-padded with `PAD_TOKEN` out to `seq_length`. Mutated only
/// by appending one id at `valid_length`.
#[derive(Debug, Clone)]
pub struct SequenceBuffer {
    ids: Vec<u32>,
    valid_length: usize,
}

impl SequenceBuffer {
    pub fn from_prefix(origin_inputs: &[u32], seq_length: usize) -> Result<Self> {
        anyhow::ensure!(
            origin_inputs.len() <= seq_length,
            "prefix length {} exceeds seq_length {}",
            origin_inputs.len(),
            seq_length
        );
        let mut ids = vec![PAD_TOKEN; seq_length];
        ids[..origin_inputs.len()].copy_from_slice(origin_inputs);
        Ok(Self {
            ids,
            valid_length: origin_inputs.len(),
        })
    }

    pub fn push(&mut self, id: u32) {
        self.ids[self.valid_length] = id;
        self.valid_length += 1;
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn valid_length(&self) -> usize {
        self.valid_length
    }

    /// Inference position: index of the last valid token, pinned to 0 for
    /// an empty prefix.
    pub fn current_index(&self) -> usize {
        self.valid_length.saturating_sub(1)
    }

    /// All tokens up to the count of non-pad entries (trailing-pad trim).
    pub fn trimmed(&self) -> Vec<u32> {
        let length = self.ids.iter().filter(|&&id| id != PAD_TOKEN).count();
        self.ids[..length].to_vec()
    }
}

/// Full-recompute text generation: the model re-evaluates the entire padded
/// buffer at every step. O(length) inference work per step.
///
/// Stop policy (shared with [`generate_increment`]): the stop check runs
/// before the append, so the token that triggers the stop — the end token,
/// or whatever is sampled at the final position — is never written to the
/// buffer and never recorded in the frequency table.
pub fn generate<M, R>(
    model: &mut M,
    origin_inputs: &[u32],
    config: &GenerationConfig,
    rng: &mut R,
) -> Result<Vec<u32>>
where
    M: LanguageModel + ?Sized,
    R: Rng + ?Sized,
{
    config.validate()?;
    let mut buffer = SequenceBuffer::from_prefix(origin_inputs, config.seq_length)?;
    let target_length = config.target_length(buffer.valid_length());
    let mut tracker = FrequencyTracker::new(config.vocab_size);
    debug!("input ids: {:?}", buffer.ids());

    let timer = GenerationTimer::start("generate");
    let initial_length = buffer.valid_length();

    while buffer.valid_length() < target_length {
        let log_probs = model
            .predict(buffer.ids(), buffer.current_index())
            .context("model predict failed")?;
        let next = sample_next_token(&log_probs, &tracker, config, rng)?;

        if next == config.end_token || buffer.valid_length() == target_length - 1 {
            let reason = if next == config.end_token {
                StopReason::EndToken
            } else {
                StopReason::LengthLimit
            };
            debug!(?reason, valid_length = buffer.valid_length(), "stopping");
            break;
        }

        tracker.record(next);
        buffer.push(next);
    }

    timer.finish(buffer.valid_length() - initial_length);
    Ok(buffer.trimmed())
}

/// Incremental text generation: one full-prefix priming call, then a
/// single-token inference call per step, with the model carrying its cache
/// between calls. O(1) amortized inference work per step.
///
/// Same check-before-append stop policy as [`generate`].
pub fn generate_increment<M, R>(
    model: &mut M,
    origin_inputs: &[u32],
    config: &GenerationConfig,
    rng: &mut R,
) -> Result<Vec<u32>>
where
    M: IncrementalLanguageModel + ?Sized,
    R: Rng + ?Sized,
{
    config.validate()?;
    let mut buffer = SequenceBuffer::from_prefix(origin_inputs, config.seq_length)?;
    let target_length = config.target_length(buffer.valid_length());
    let mut tracker = FrequencyTracker::new(config.vocab_size);
    let mut outputs: Vec<u32> = origin_inputs.to_vec();
    debug!("input ids: {:?}", buffer.ids());

    let timer = GenerationTimer::start("generate_increment");
    let initial_length = buffer.valid_length();

    // Prime once over the whole padded buffer. Every later call steps on a
    // single token with `use_past` set; the handle must not be re-primed.
    let mut log_probs = model
        .predict_full(
            buffer.ids(),
            buffer.current_index(),
            buffer.current_index(),
            false,
        )
        .context("model priming call failed")?;

    while buffer.valid_length() < target_length {
        let next = sample_next_token(&log_probs, &tracker, config, rng)?;

        if next == config.end_token || buffer.valid_length() == target_length - 1 {
            let reason = if next == config.end_token {
                StopReason::EndToken
            } else {
                StopReason::LengthLimit
            };
            debug!(?reason, valid_length = buffer.valid_length(), "stopping");
            break;
        }

        tracker.record(next);
        buffer.push(next);
        outputs.push(next);

        log_probs = model
            .predict_next(next, 0, buffer.valid_length() - 1, true)
            .context("model step call failed")?;
    }

    timer.finish(outputs.len() - initial_length);
    Ok(outputs)
}
