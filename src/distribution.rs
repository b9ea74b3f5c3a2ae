//! Initialization Distributions
//!
//! `Distribution` values seed `state` and `genes` tensors at `init_state`.
//! Sampling is the only place randomness enters the core; the step kernel
//! itself is deterministic.

use rand::Rng;
use rand_distr::{Distribution as _, Normal as NormalDist, Uniform as UniformDist};
use serde::{Deserialize, Serialize};

/// A scalar sampling distribution used to initialize a state var or gene column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Distribution {
    Const { value: f32 },
    Uniform { low: f32, high: f32 },
    Normal { mean: f32, std: f32 },
}

impl Distribution {
    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        match self {
            Distribution::Const { value } => *value,
            Distribution::Uniform { low, high } => {
                if low >= high {
                    *low
                } else {
                    UniformDist::new(*low, *high).sample(rng)
                }
            }
            Distribution::Normal { mean, std } => {
                if *std <= 0.0 {
                    *mean
                } else {
                    NormalDist::new(*mean, *std)
                        .expect("validated std > 0")
                        .sample(rng)
                }
            }
        }
    }
}
