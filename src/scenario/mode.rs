//! Execution mode selection.
//!
//! Worklet concurrency is claimed to be independent of the execution mode,
//! so groups that do not pin a mode get one picked at random. The random
//! source is seeded and the seed is logged, which makes any run replayable.

use super::entities::ExecutionMode;
use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of execution modes for groups that leave it unspecified
#[derive(Debug, Clone)]
pub enum ExecutionModeStrategy {
    /// Always the same mode
    Fixed(ExecutionMode),

    /// Uniform choice among all modes
    Seeded { seed: u64, rng: ChaCha8Rng },
}

impl ExecutionModeStrategy {
    pub fn fixed(mode: ExecutionMode) -> Self {
        ExecutionModeStrategy::Fixed(mode)
    }

    pub fn seeded(seed: u64) -> Self {
        info!("Execution mode seed: {}", seed);
        ExecutionModeStrategy::Seeded {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Seeded from OS entropy; the seed is still logged
    pub fn from_entropy() -> Self {
        Self::seeded(rand::random())
    }

    pub fn seed(&self) -> Option<u64> {
        match self {
            ExecutionModeStrategy::Fixed(_) => None,
            ExecutionModeStrategy::Seeded { seed, .. } => Some(*seed),
        }
    }

    /// Mode for the next group: the requested one, else the strategy's pick
    pub fn pick(&mut self, requested: Option<ExecutionMode>) -> ExecutionMode {
        if let Some(mode) = requested {
            return mode;
        }

        match self {
            ExecutionModeStrategy::Fixed(mode) => *mode,
            ExecutionModeStrategy::Seeded { rng, .. } => {
                ExecutionMode::ALL[rng.gen_range(0..ExecutionMode::ALL.len())]
            }
        }
    }
}
