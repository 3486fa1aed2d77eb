use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

use oxidized_textgen::{
    generate, generate_increment, GenerationConfig, IncrementalLanguageModel, LanguageModel,
};

fn config(
    vocab_size: usize,
    seq_length: usize,
    max_generate_length: usize,
    end_token: u32,
) -> GenerationConfig {
    GenerationConfig {
        frequency_penalty: 0.0,
        presence_penalty: 0.0,
        top_p: 1.0,
        top_k_num: 1,
        max_generate_length,
        seq_length,
        end_token,
        vocab_size,
    }
}

/// Stub model that emits a fixed script of tokens (one per inference call,
/// in order) and then the end token forever. With `top_k_num = 1` the
/// sampler follows the script deterministically.
struct ScriptedModel {
    script: Vec<u32>,
    end_token: u32,
    vocab_size: usize,
    calls: usize,
    priming_calls: usize,
}

impl ScriptedModel {
    fn new(script: Vec<u32>, end_token: u32, vocab_size: usize) -> Self {
        Self {
            script,
            end_token,
            vocab_size,
            calls: 0,
            priming_calls: 0,
        }
    }

    fn next_logits(&mut self) -> Vec<f32> {
        let favored = self
            .script
            .get(self.calls)
            .copied()
            .unwrap_or(self.end_token);
        self.calls += 1;
        let mut log_probs = vec![-30.0; self.vocab_size];
        log_probs[favored as usize] = 0.0;
        log_probs
    }
}

impl LanguageModel for ScriptedModel {
    fn predict(&mut self, _input_ids: &[u32], _current_index: usize) -> Result<Vec<f32>> {
        Ok(self.next_logits())
    }
}

impl IncrementalLanguageModel for ScriptedModel {
    fn predict_full(
        &mut self,
        _input_ids: &[u32],
        _current_index: usize,
        _batch_valid_length: usize,
        use_past: bool,
    ) -> Result<Vec<f32>> {
        assert!(!use_past, "priming call must not set use_past");
        self.priming_calls += 1;
        assert_eq!(self.priming_calls, 1, "handle was re-primed");
        Ok(self.next_logits())
    }

    fn predict_next(
        &mut self,
        _token: u32,
        current_index: usize,
        _batch_valid_length: usize,
        use_past: bool,
    ) -> Result<Vec<f32>> {
        assert!(use_past, "step call must set use_past");
        assert_eq!(current_index, 0, "step input is a single token");
        Ok(self.next_logits())
    }
}

/// Stub with mildly uneven logits so nucleus sampling has real choices.
struct SlopedModel {
    vocab_size: usize,
}

impl SlopedModel {
    fn logits(&self) -> Vec<f32> {
        (0..self.vocab_size).map(|i| -(i as f32) / 8.0).collect()
    }
}

impl LanguageModel for SlopedModel {
    fn predict(&mut self, _input_ids: &[u32], _current_index: usize) -> Result<Vec<f32>> {
        Ok(self.logits())
    }
}

impl IncrementalLanguageModel for SlopedModel {
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

#[test]
fn full_recompute_scripted_example() -> Result<()> {
    // origin [5, 9], seq_length 8, max_generate_length 3, end_token 0:
    // the script yields 3 and 7, then the end token stops the loop.
    let mut model = ScriptedModel::new(vec![3, 7], 0, 16);
    let cfg = config(16, 8, 3, 0);
    let mut rng = StdRng::seed_from_u64(0);
    let out = generate(&mut model, &[5, 9], &cfg, &mut rng)?;
    assert_eq!(out, vec![5, 9, 3, 7]);
    Ok(())
}

#[test]
fn incremental_scripted_example() -> Result<()> {
    let mut model = ScriptedModel::new(vec![3, 7], 0, 16);
    let cfg = config(16, 8, 3, 0);
    let mut rng = StdRng::seed_from_u64(0);
    let out = generate_increment(&mut model, &[5, 9], &cfg, &mut rng)?;
    assert_eq!(out, vec![5, 9, 3, 7]);
    Ok(())
}

#[test]
fn decoders_agree_on_scripted_output() -> Result<()> {
    let script = vec![4u32, 11, 2, 4, 9, 13];
    let cfg = config(16, 32, 10, 1);

    let mut full = ScriptedModel::new(script.clone(), 1, 16);
    let mut rng_a = StdRng::seed_from_u64(5);
    let a = generate(&mut full, &[7, 8], &cfg, &mut rng_a)?;

    let mut incr = ScriptedModel::new(script, 1, 16);
    let mut rng_b = StdRng::seed_from_u64(5);
    let b = generate_increment(&mut incr, &[7, 8], &cfg, &mut rng_b)?;

    assert_eq!(a, b);
    Ok(())
}

#[test]
fn end_token_is_never_appended() -> Result<()> {
    // The model favors the end token from the first step: the output must
    // be exactly the prefix, with the stopping token excluded.
    let mut model = ScriptedModel::new(vec![], 2, 8);
    let cfg = config(8, 16, 8, 2);
    let mut rng = StdRng::seed_from_u64(0);
    let out = generate(&mut model, &[5, 6], &cfg, &mut rng)?;
    assert_eq!(out, vec![5, 6]);
    assert_eq!(model.calls, 1);
    Ok(())
}

#[test]
fn output_respects_length_bounds() -> Result<()> {
    let cfg = config(16, 12, 100, 1);
    let script: Vec<u32> = (0..64).map(|i| 3 + (i % 5) as u32).collect();

    let mut model = ScriptedModel::new(script.clone(), 1, 16);
    let mut rng = StdRng::seed_from_u64(0);
    let out = generate(&mut model, &[9, 9, 9], &cfg, &mut rng)?;
    assert!(out.len() <= cfg.seq_length);
    assert!(out.len() >= 3);
    assert_eq!(&out[..3], &[9, 9, 9]);
    // target_length clamps to seq_length, and the sample at the final
    // position is discarded, so at most seq_length - 1 - 3 tokens are added.
    assert_eq!(out.len(), cfg.seq_length - 1);

    let mut incr = ScriptedModel::new(script, 1, 16);
    let mut rng = StdRng::seed_from_u64(0);
    let out = generate_increment(&mut incr, &[9, 9, 9], &cfg, &mut rng)?;
    assert_eq!(out.len(), cfg.seq_length - 1);
    Ok(())
}

#[test]
fn prefix_filling_the_buffer_generates_nothing() -> Result<()> {
    let mut model = ScriptedModel::new(vec![3, 4], 0, 8);
    let cfg = config(8, 4, 8, 0);
    let mut rng = StdRng::seed_from_u64(0);
    let out = generate(&mut model, &[5, 6, 7, 5], &cfg, &mut rng)?;
    assert_eq!(out, vec![5, 6, 7, 5]);
    assert_eq!(model.calls, 0, "model must not be invoked");
    Ok(())
}

#[test]
fn oversized_prefix_is_rejected() {
    let mut model = ScriptedModel::new(vec![], 0, 8);
    let cfg = config(8, 4, 8, 0);
    let mut rng = StdRng::seed_from_u64(0);
    assert!(generate(&mut model, &[1, 2, 3, 4, 5], &cfg, &mut rng).is_err());
}

#[test]
fn invalid_config_is_rejected_at_entry() {
    let mut model = ScriptedModel::new(vec![], 0, 8);
    let mut cfg = config(8, 16, 8, 0);
    cfg.top_k_num = 9; // exceeds vocab_size
    let mut rng = StdRng::seed_from_u64(0);
    assert!(generate(&mut model, &[5], &cfg, &mut rng).is_err());
    assert_eq!(model.calls, 0);
}

#[test]
fn nucleus_generation_is_deterministic_under_a_fixed_seed() -> Result<()> {
    let mut cfg = config(64, 48, 32, 0);
    cfg.top_p = 0.9;
    cfg.frequency_penalty = 0.8;
    cfg.presence_penalty = 0.4;

    let mut model_a = SlopedModel { vocab_size: 64 };
    let mut rng_a = StdRng::seed_from_u64(1234);
    let a = generate(&mut model_a, &[10, 20, 30], &cfg, &mut rng_a)?;

    let mut model_b = SlopedModel { vocab_size: 64 };
    let mut rng_b = StdRng::seed_from_u64(1234);
    let b = generate(&mut model_b, &[10, 20, 30], &cfg, &mut rng_b)?;

    assert_eq!(a, b);

    let mut model_c = SlopedModel { vocab_size: 64 };
    let mut rng_c = StdRng::seed_from_u64(1234);
    let c = generate_increment(&mut model_c, &[10, 20, 30], &cfg, &mut rng_c)?;
    let mut model_d = SlopedModel { vocab_size: 64 };
    let mut rng_d = StdRng::seed_from_u64(1234);
    let d = generate_increment(&mut model_d, &[10, 20, 30], &cfg, &mut rng_d)?;
    assert_eq!(c, d);
    Ok(())
}

#[test]
fn model_failure_propagates() {
    struct FailingModel;
    impl LanguageModel for FailingModel {
        fn predict(&mut self, _input_ids: &[u32], _current_index: usize) -> Result<Vec<f32>> {
            anyhow::bail!("device lost")
        }
    }
    let cfg = config(8, 16, 8, 0);
    let mut rng = StdRng::seed_from_u64(0);
    let err = generate(&mut FailingModel, &[5], &cfg, &mut rng).unwrap_err();
    assert!(format!("{:#}", err).contains("device lost"));
}
