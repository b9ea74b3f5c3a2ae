//! # Runtime (C4)
//!
//! The tensor-backed interpreter that executes one [`crate::ir::OutputIR`]
//! step: extract columns, walk the flattened op stream, re-concatenate
//! state columns, apply boundary conditions.

pub mod phenotype;
pub mod tensor;
pub mod update;

pub use phenotype::Phenotype;
pub use tensor::{Env, Tensor};
pub use update::{apply_boundaries, extract_columns, run_ops, step, StepOutcome};
