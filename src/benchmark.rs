// file: src/benchmark.rs
// description: Timing and throughput logging for generation loops.
// author: cipher-rc5

use std::time::{Duration, Instant};
use tracing::info;

/// Wall-clock timer for one generation call. `finish` logs the token
/// throughput of the decode loop at info level.
pub struct GenerationTimer {
    start: Instant,
    operation: &'static str,
}

pub struct GenerationStats {
    pub operation: &'static str,
    pub tokens_generated: usize,
    pub duration: Duration,
    pub tokens_per_second: f64,
}

impl GenerationTimer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    pub fn finish(self, tokens_generated: usize) -> GenerationStats {
        let duration = self.start.elapsed();
        let tokens_per_second = if duration.as_secs_f64() > 0.0 {
            tokens_generated as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        info!(
            "{}: {} tokens in {:?} ({:.2} tokens/sec)",
            self.operation, tokens_generated, duration, tokens_per_second
        );

        GenerationStats {
            operation: self.operation,
            tokens_generated,
            duration,
            tokens_per_second,
        }
    }
}
