// file: src/frequency.rs
// description: Per-generation repetition counts feeding the penalty terms of the sampler.
// author: cipher-rc5

/// Occurrence counts for every vocabulary id, one table per generation
/// call. Counts only ever grow: a token is recorded exactly once each time
/// it is emitted, and nothing is ever removed.
#[derive(Debug, Clone)]
pub struct FrequencyTracker {
    counts: Vec<u32>,
}

impl FrequencyTracker {
    pub fn new(vocab_size: usize) -> Self {
        Self {
            counts: vec![0; vocab_size],
        }
    }

    pub fn record(&mut self, id: u32) {
        if let Some(count) = self.counts.get_mut(id as usize) {
            *count += 1;
        }
    }

    pub fn count(&self, id: u32) -> u32 {
        self.counts.get(id as usize).copied().unwrap_or(0)
    }

    /// Penalty terms for one id: `(count * frequency_penalty,
    /// presence_penalty if the id has appeared at all)`.
    pub fn penalty_bonus(
        &self,
        id: u32,
        frequency_penalty: f32,
        presence_penalty: f32,
    ) -> (f32, f32) {
        let count = self.count(id);
        let presence = if count > 0 { presence_penalty } else { 0.0 };
        (count as f32 * frequency_penalty, presence)
    }
}
