//! # Step Driver (C6)
//!
//! Owns one simulation's state and genes, constructs the phenotype engine
//! once from the IR, and advances time one step at a time: `params =
//! phenotype(genes)`, `state = update(state, params)`, boundary
//! application. Exposes a step counter and a `snapshot` hook for an
//! external replay writer.

use crate::error::{EvolimoError, EvolimoResult};
use crate::ir::OutputIR;
use crate::runtime::update::{self, StepOutcome};
use crate::runtime::Phenotype;
use ndarray::Array2;
use rand::Rng;
use std::collections::HashMap;

/// Samples one state column per `state_vars` entry from its `initialization`
/// distribution, `[n_agents, 1]` each.
pub fn init_state(ir: &OutputIR, rng: &mut impl Rng) -> HashMap<String, Array2<f32>> {
    let n = ir.constants.n_agents;
    ir.state_vars
        .iter()
        .map(|sv| {
            let dist = &ir.initialization.state[sv];
            let column = Array2::from_shape_fn((n, 1), |_| dist.sample(rng));
            (sv.clone(), column)
        })
        .collect()
}

/// Samples the `[n_agents, gene_len]` gene tensor from `initialization.genes`.
pub fn init_genes(ir: &OutputIR, rng: &mut impl Rng) -> Array2<f32> {
    let n = ir.constants.n_agents;
    let gene_len = ir.constants.gene_len;
    Array2::from_shape_fn((n, gene_len), |_| ir.initialization.genes.sample(rng))
}

/// Constructs a [`Phenotype`] from an IR's groups and constants.
pub fn make_phenotype(ir: &OutputIR, rng: &mut impl Rng) -> Phenotype {
    Phenotype::new(ir, rng)
}

/// Owns state/genes/phenotype for one simulation and advances it one step
/// at a time. The phenotype's weights never change after construction; only
/// `state` and `step_count` mutate across `step()` calls.
pub struct Driver {
    ir: OutputIR,
    phenotype: Phenotype,
    genes: Array2<f32>,
    state: HashMap<String, Array2<f32>>,
    step_count: usize,
    strict_capacity: bool,
}

impl Driver {
    pub fn new(ir: OutputIR, rng: &mut impl Rng) -> Self {
        let genes = init_genes(&ir, rng);
        let state = init_state(&ir, rng);
        let phenotype = Phenotype::new(&ir, rng);
        Driver { ir, phenotype, genes, state, step_count: 0, strict_capacity: false }
    }

    /// In strict mode, a grid cell overflowing capacity during this step
    /// raises `EvolimoError::CapacityOverflow` instead of the default
    /// silent-drop-and-count behavior.
    pub fn with_strict_capacity(mut self, strict: bool) -> Self {
        self.strict_capacity = strict;
        self
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn snapshot(&self) -> &HashMap<String, Array2<f32>> {
        &self.state
    }

    pub fn ir(&self) -> &OutputIR {
        &self.ir
    }

    /// Advances the simulation by exactly one step.
    pub fn step(&mut self) -> EvolimoResult<StepOutcome> {
        let params = self.phenotype.forward(&self.genes);
        let (next_state, outcome) = update::step(&self.ir, &self.state, &params)?;
        if self.strict_capacity && outcome.grid_stats.dropped > 0 {
            return Err(EvolimoError::CapacityOverflow(outcome.grid_stats.dropped));
        }
        self.state = next_state;
        self.step_count += 1;
        Ok(outcome)
    }
}
