// file: src/model.rs
// description: Capability traits for the black-box language model consumed by the decoders.
// author: cipher-rc5

use anyhow::Result;

/// Full-recompute inference over the whole (padded) sequence.
///
/// Implementations own whatever tensor runtime backs them; the decoders only
/// need per-position scores. Returned vectors must have `vocab_size`
/// entries and are treated as log10-probabilities by the sampler. Failures
/// are fatal to the generation call and are never retried.
pub trait LanguageModel {
    /// Score the position `current_index` given the entire padded buffer
    /// (always `seq_length` ids, pad included).
    fn predict(&mut self, input_ids: &[u32], current_index: usize) -> Result<Vec<f32>>;
}

/// Incremental inference: one full-prefix priming call, then one call per
/// newly sampled token, with the model carrying its own cache between
/// calls. The handle is stateful and non-reentrant for the duration of one
/// generation call, and must not be re-primed mid-call.
pub trait IncrementalLanguageModel {
    /// Priming call over the whole padded buffer. `use_past` is false here
    /// and true on every subsequent `predict_next`.
    fn predict_full(
        &mut self,
        input_ids: &[u32],
        current_index: usize,
        batch_valid_length: usize,
        use_past: bool,
    ) -> Result<Vec<f32>>;

    /// Single-token step. `token` is the newest sampled id,
    /// `current_index` is relative to the one-token input (always 0), and
    /// `batch_valid_length` is the absolute position of that token.
    fn predict_next(
        &mut self,
        token: u32,
        current_index: usize,
        batch_valid_length: usize,
        use_past: bool,
    ) -> Result<Vec<f32>>;
}
