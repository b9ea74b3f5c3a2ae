//! # Phenotype Engine (C4)
//!
//! A shallow MLP: `gene_len -> hidden_len` (ReLU), then one linear head per
//! parameter group sized `hidden_len -> |params_g|`, followed by the
//! group's activation. Head column order matches the IR's group parameter
//! order. Constructed once from the IR; weights are read-only across steps.

use crate::ir::{Activation, OutputIR};
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use std::collections::HashMap;

struct Head {
    weights: Array2<f32>,
    bias: Array1<f32>,
    activation: Activation,
}

/// Stateless across steps: `forward` never mutates `self`.
pub struct Phenotype {
    hidden_weights: Array2<f32>,
    hidden_bias: Array1<f32>,
    heads: HashMap<String, Head>,
}

impl Phenotype {
    /// Build a phenotype engine from an IR's `constants` and `groups`,
    /// initializing weights with a small uniform spread (the IR fixes
    /// shapes and activations; weight values are the one thing it leaves
    /// to the caller, the same way a fresh model is initialized before any
    /// training/evolution has touched it).
    pub fn new(ir: &OutputIR, rng: &mut impl Rng) -> Self {
        let gene_len = ir.constants.gene_len;
        let hidden_len = ir.constants.hidden_len;
        let bound = 1.0 / (gene_len.max(1) as f32).sqrt();

        let hidden_weights = Array2::from_shape_fn((gene_len, hidden_len), |_| {
            rng.gen_range(-bound..bound)
        });
        let hidden_bias = Array1::zeros(hidden_len);

        let heads = ir
            .groups
            .iter()
            .map(|(name, group)| {
                let out_dim = group.params.len().max(1);
                let head_bound = 1.0 / (hidden_len.max(1) as f32).sqrt();
                let weights = Array2::from_shape_fn((hidden_len, out_dim), |_| {
                    rng.gen_range(-head_bound..head_bound)
                });
                let bias = Array1::zeros(out_dim);
                (name.clone(), Head { weights, bias, activation: group.activation })
            })
            .collect();

        Phenotype { hidden_weights, hidden_bias, heads }
    }

    /// `genes: [N, gene_len] -> { group -> [N, |params_g|] }`.
    pub fn forward(&self, genes: &Array2<f32>) -> HashMap<String, Array2<f32>> {
        let hidden = genes.dot(&self.hidden_weights) + &self.hidden_bias;
        let hidden = hidden.mapv(|v| v.max(0.0));

        self.heads
            .iter()
            .map(|(name, head)| {
                let raw = hidden.dot(&head.weights) + &head.bias;
                (name.clone(), apply_activation(raw, head.activation))
            })
            .collect()
    }
}

fn apply_activation(raw: Array2<f32>, activation: Activation) -> Array2<f32> {
    match activation {
        Activation::None => raw,
        Activation::Tanh => raw.mapv(f32::tanh),
        Activation::Sigmoid => raw.mapv(|v| 1.0 / (1.0 + (-v).exp())),
        Activation::Softmax => {
            let mut out = raw;
            for mut row in out.axis_iter_mut(Axis(0)) {
                let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                row.mapv_inplace(|v| (v - max).exp());
                let sum: f32 = row.iter().sum();
                if sum > 0.0 {
                    row.mapv_inplace(|v| v / sum);
                }
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Constants, GroupIR, InitializationIR};
    use crate::distribution::Distribution;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    fn ir_with_group(activation: Activation, params: Vec<&str>) -> OutputIR {
        let mut groups = HashMap::new();
        groups.insert(
            "G".to_string(),
            GroupIR { activation, params: params.into_iter().map(String::from).collect() },
        );
        OutputIR {
            state_vars: vec![],
            constants: Constants { n_agents: 5, gene_len: 4, hidden_len: 6 },
            grid_config: None,
            groups,
            boundary_conditions: vec![],
            initialization: InitializationIR {
                state: HashMap::new(),
                genes: Distribution::Const { value: 0.0 },
            },
            operations: vec![],
        }
    }

    #[test]
    fn softmax_head_rows_sum_to_one() {
        let ir = ir_with_group(Activation::Softmax, vec!["metabolism", "move_cost"]);
        let mut rng = StdRng::seed_from_u64(42);
        let phenotype = Phenotype::new(&ir, &mut rng);
        let genes = Array2::from_shape_fn((5, 4), |_| rng.gen_range(-1.0..1.0));
        let out = phenotype.forward(&genes);
        let g = &out["G"];
        for row in g.axis_iter(Axis(0)) {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "row sum {sum} not ~1.0");
        }
    }

    #[test]
    fn head_output_shape_matches_param_count() {
        let ir = ir_with_group(Activation::None, vec!["a", "b", "c"]);
        let mut rng = StdRng::seed_from_u64(1);
        let phenotype = Phenotype::new(&ir, &mut rng);
        let genes = Array2::<f32>::zeros((5, 4));
        let out = phenotype.forward(&genes);
        assert_eq!(out["G"].dim(), (5, 3));
    }
}
