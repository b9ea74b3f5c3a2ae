//! The JSON IR (`OutputIR`)
//!
//! This is the stable handoff between the compiler and the runtime: a flat,
//! topologically-ordered operation list plus the metadata the runtime needs
//! to allocate tensors and extract columns before executing it. Every field
//! here round-trips through `serde_json` unchanged -- this is the wire
//! format, not an internal convenience type.

use crate::distribution::Distribution;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Elementwise/structural operation kind. Tag strings match the vocabulary
/// used throughout `spec.md` so an IR dumped to JSON reads the same way the
/// design document describes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    RefState,
    RefParam,
    RefAux,
    Const,
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Ge,
    Where,
    Sqrt,
    Relu,
    Neg,
    Transpose,
    Sum,
    Cat,
    Slice,
    GridScatter,
    Stencil,
    GridGather,
    /// Terminal assignment of a rule's compiled expression to its target
    /// state var, or an auto pass-through for an unwritten state var.
    Assign,
    /// Sentinel terminal op inside `kernel_operations` naming the stencil
    /// kernel's result.
    KernelOutput,
}

/// Which group a `ref_param` op drew its column from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamInfo {
    pub id: String,
    pub group: String,
}

/// A single SSA-style assignment in the flattened, deduplicated op stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub target: String,
    pub op: OpKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param_info: Option<ParamInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keepdim: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim0: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim1: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stencil_range: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_operations: Option<Vec<Operation>>,
}

impl Operation {
    /// Minimal constructor filling every optional field with `None`/empty.
    pub fn new(target: impl Into<String>, op: OpKind, args: Vec<String>) -> Self {
        Operation {
            target: target.into(),
            op,
            args,
            value: None,
            param_info: None,
            dim: None,
            keepdim: None,
            dim0: None,
            dim1: None,
            stencil_range: None,
            start: None,
            len: None,
            kernel_operations: None,
        }
    }
}

/// Activation applied at a phenotype head after its linear layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Softmax,
    Tanh,
    Sigmoid,
    None,
}

/// A named genetic parameter group and its column layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupIR {
    pub activation: Activation,
    /// Lexicographically sorted parameter ids; column order matches this list.
    pub params: Vec<String>,
}

/// Boundary condition kind applied to a state var after the op stream runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryKind {
    Torus,
    Clamp,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub target_state: String,
    pub kind: BoundaryKind,
    pub range: [f32; 2],
}

/// Fixed-capacity uniform grid parameters for the stencil path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
    pub capacity: usize,
    pub cell_size: [f32; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializationIR {
    pub state: HashMap<String, Distribution>,
    pub genes: Distribution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constants {
    pub n_agents: usize,
    pub gene_len: usize,
    pub hidden_len: usize,
}

/// The compiler's complete output: everything the runtime needs to allocate
/// tensors, build the phenotype engine, and execute one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputIR {
    pub state_vars: Vec<String>,
    pub constants: Constants,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_config: Option<GridConfig>,
    pub groups: HashMap<String, GroupIR>,
    pub boundary_conditions: Vec<Boundary>,
    pub initialization: InitializationIR,
    pub operations: Vec<Operation>,
}
