use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

/// Decoding configuration for one generation call.
///
/// `top_p == 1.0` selects top-k sampling; `top_p < 1.0` selects nucleus
/// sampling. The two modes are mutually exclusive and never combined.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub frequency_penalty: f32,
    #[serde(default)]
    pub presence_penalty: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(alias = "top_k", default = "default_top_k_num")]
    pub top_k_num: usize,
    #[serde(alias = "max_new_tokens", default = "default_max_generate_length")]
    pub max_generate_length: usize,
    #[serde(alias = "max_position_embeddings")]
    pub seq_length: usize,
    #[serde(alias = "eod_token", alias = "eos_token_id")]
    pub end_token: u32,
    pub vocab_size: usize,
}

fn default_top_p() -> f32 {
    1.0
}

fn default_top_k_num() -> usize {
    3
}

fn default_max_generate_length() -> usize {
    128
}

impl GenerationConfig {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open generation config at {:?}", path))?;
        let config: GenerationConfig = serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse generation config at {:?}", path))?;
        Ok(config)
    }

    /// Rejects configurations the decoders cannot run under. Called at the
    /// entry of both generation functions.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.vocab_size > 0, "vocab_size must be positive");
        anyhow::ensure!(self.seq_length > 0, "seq_length must be positive");
        anyhow::ensure!(
            self.max_generate_length > 0,
            "max_generate_length must be positive"
        );
        anyhow::ensure!(
            self.frequency_penalty >= 0.0,
            "frequency_penalty must be non-negative, got {}",
            self.frequency_penalty
        );
        anyhow::ensure!(
            self.presence_penalty >= 0.0,
            "presence_penalty must be non-negative, got {}",
            self.presence_penalty
        );
        anyhow::ensure!(
            self.top_p > 0.0 && self.top_p <= 1.0,
            "top_p must be in (0, 1], got {}",
            self.top_p
        );
        anyhow::ensure!(self.top_k_num >= 1, "top_k_num must be positive");
        anyhow::ensure!(
            self.top_k_num <= self.vocab_size,
            "top_k_num {} exceeds vocab_size {}",
            self.top_k_num,
            self.vocab_size
        );
        anyhow::ensure!(
            (self.end_token as usize) < self.vocab_size,
            "end_token {} is outside the vocabulary (vocab_size {})",
            self.end_token,
            self.vocab_size
        );
        Ok(())
    }

    /// Total sequence length this call may reach. A prefix plus
    /// `max_generate_length` that would overrun `seq_length` is clamped,
    /// not rejected.
    pub fn target_length(&self, valid_length: usize) -> usize {
        (valid_length + self.max_generate_length).min(self.seq_length)
    }

    pub fn uses_nucleus(&self) -> bool {
        self.top_p < 1.0
    }
}
