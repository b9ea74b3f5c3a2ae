//! # Definition Surface (C2)
//!
//! The user-facing bundle a compiler run consumes: declared state-var
//! order, parameter group activations, per-state-variable dynamics rules,
//! boundary conditions, initialization distributions, an optional grid
//! configuration, and an optional visual mapping. This is the thing users
//! author; `compiler::Compiler` turns it into an [`crate::ir::OutputIR`].

use crate::distribution::Distribution;
use crate::expr::Expr;
use crate::ir::{Activation, BoundaryKind, GridConfig};
use crate::visual::VisualMapping;
use std::collections::HashMap;

/// One per-state-variable dynamics rule: `target_state <- expr`.
pub struct Rule {
    pub target_state: String,
    pub expr: Expr,
}

impl Rule {
    pub fn new(target_state: impl Into<String>, expr: Expr) -> Self {
        Rule { target_state: target_state.into(), expr }
    }
}

/// Declared shape of a genetic parameter group. The member parameter ids
/// themselves are discovered by walking `ref_param` nodes across all rules;
/// this struct only fixes the group's activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterGroupConfig {
    pub activation: Activation,
}

/// A boundary condition applied to one state var after the step kernel runs.
pub struct BoundaryDef {
    pub target_state: String,
    pub kind: BoundaryKind,
    pub range: [f32; 2],
}

impl BoundaryDef {
    pub fn new(target_state: impl Into<String>, kind: BoundaryKind, range: [f32; 2]) -> Self {
        BoundaryDef { target_state: target_state.into(), kind, range }
    }
}

/// Initial-value distributions for every state var plus the gene tensor.
pub struct Initialization {
    pub state: HashMap<String, Distribution>,
    pub genes: Distribution,
}

/// The complete, user-authored description of one simulation's dynamics.
pub struct Definition {
    pub n_agents: usize,
    pub gene_len: usize,
    pub hidden_len: usize,
    /// Declared state-var order; any state var referenced but not listed
    /// here is appended (by the compiler) in lexical order.
    pub state_var_order: Vec<String>,
    pub parameter_groups: HashMap<String, ParameterGroupConfig>,
    pub rules: Vec<Rule>,
    pub boundaries: Vec<BoundaryDef>,
    pub initialization: Initialization,
    pub grid_config: Option<GridConfig>,
    pub visual_mapping: Option<VisualMapping>,
}
