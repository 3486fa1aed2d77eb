// file: demos/stub_generation.rs
// description: Drives both decoders against a deterministic stub model from the command line.
// author: cipher-rc5

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::Level;

use oxidized_textgen::{
    generate, generate_increment, GenerationConfig, IncrementalLanguageModel, LanguageModel,
};

#[derive(Parser, Debug)]
#[command(about = "Run the decoding loops against a stub model")]
struct Args {
    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, default_value_t = 0.9, help = "1.0 selects top-k mode")]
    top_p: f32,

    #[arg(long, default_value_t = 5)]
    top_k_num: usize,

    #[arg(long, default_value_t = 32)]
    max_tokens: usize,

    #[arg(long, default_value_t = 1.0)]
    frequency_penalty: f32,

    #[arg(long, default_value_t = 0.5)]
    presence_penalty: f32,

    #[arg(long)]
    verbose: bool,
}

const VOCAB_SIZE: usize = 128;
const SEQ_LENGTH: usize = 256;
const END_TOKEN: u32 = 1;

/// Toy model: a smooth bump of probability mass that wanders through the
/// vocabulary as calls accumulate. Enough structure for the sampler to do
/// real work, no tensors required.
struct WanderingBumpModel {
    calls: usize,
}

impl WanderingBumpModel {
    fn logits(&mut self) -> Vec<f32> {
        let center = (self.calls * 17 + 29) % VOCAB_SIZE;
        self.calls += 1;
        (0..VOCAB_SIZE)
            .map(|i| {
                let distance = (i as f32 - center as f32).abs();
                -distance / 16.0
            })
            .collect()
    }
}

impl LanguageModel for WanderingBumpModel {
    fn predict(&mut self, _input_ids: &[u32], _current_index: usize) -> Result<Vec<f32>> {
        Ok(self.logits())
    }
}

impl IncrementalLanguageModel for WanderingBumpModel {
    fn predict_full(
        &mut self,
        _input_ids: &[u32],
        _current_index: usize,
        _batch_valid_length: usize,
        _use_past: bool,
    ) -> Result<Vec<f32>> {
        Ok(self.logits())
    }

    fn predict_next(
        &mut self,
        _token: u32,
        _current_index: usize,
        _batch_valid_length: usize,
        _use_past: bool,
    ) -> Result<Vec<f32>> {
        Ok(self.logits())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_target(false)
        .init();

    let config = GenerationConfig {
        frequency_penalty: args.frequency_penalty,
        presence_penalty: args.presence_penalty,
        top_p: args.top_p,
        top_k_num: args.top_k_num,
        max_generate_length: args.max_tokens,
        seq_length: SEQ_LENGTH,
        end_token: END_TOKEN,
        vocab_size: VOCAB_SIZE,
    };
    let prefix = [64u32, 32, 96];

    let mut model = WanderingBumpModel { calls: 0 };
    let mut rng = StdRng::seed_from_u64(args.seed);
    let full = generate(&mut model, &prefix, &config, &mut rng)?;
    println!("full-recompute: {:?}", full);

    let mut model = WanderingBumpModel { calls: 0 };
    let mut rng = StdRng::seed_from_u64(args.seed);
    let incremental = generate_increment(&mut model, &prefix, &config, &mut rng)?;
    println!("incremental:    {:?}", incremental);

    Ok(())
}
