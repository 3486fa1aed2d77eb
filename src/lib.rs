pub mod benchmark;
pub mod config;
pub mod frequency;
pub mod inference;
pub mod model;
pub mod sampler;

pub use benchmark::{GenerationStats, GenerationTimer};
pub use config::GenerationConfig;
pub use frequency::FrequencyTracker;
pub use inference::{generate, generate_increment, SequenceBuffer, StopReason, PAD_TOKEN};
pub use model::{IncrementalLanguageModel, LanguageModel};
pub use sampler::{sample_next_token, NUCLEUS_CANDIDATE_LIMIT};
