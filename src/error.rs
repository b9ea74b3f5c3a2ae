//! Error Types
//!
//! Typed errors for the three failure domains named in the runtime contract:
//! definition-time (compile) errors, shape errors raised by the tensor
//! interpreter, and I/O errors around the JSON IR handoff. Capacity overflow
//! in the grid path is deliberately not represented here -- it is a soft
//! metric, not an error (see `grid::GridStats`).

use thiserror::Error;

/// Errors raised while compiling a [`crate::definition::Definition`] into an
/// [`crate::ir::OutputIR`]. All are fatal and abort compilation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DefinitionError {
    /// A `ref_param` cited a group not present in `PARAMETER_GROUPS`.
    #[error("unknown parameter group: {0}")]
    UnknownParameterGroup(String),

    /// A state var appears in `state_vars` with no `initialization.state` entry.
    #[error("missing initialization for state var: {0}")]
    MissingInitialization(String),

    /// An expression tag could not be lowered by the compiler.
    #[error("unknown expression kind: {0}")]
    UnknownExpressionKind(String),

    /// A `stencil` node was built without a kernel body.
    #[error("stencil node for state var {0} has no kernel")]
    StencilWithoutKernel(String),

    /// `STATE_VAR_ORDER` or a rule's `target_state` named the same var twice.
    #[error("duplicate state var: {0}")]
    DuplicateStateVar(String),

    /// A rule used `grid_scatter`/`stencil`/`grid_gather` but the definition
    /// declared no `grid_config`.
    #[error("grid operation present but no grid_config was declared")]
    MissingGridConfig,
}

/// Errors raised by the runtime interpreter while executing an op stream.
/// Fatal: they abort the current step.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("broadcast mismatch: left shape {left:?}, right shape {right:?}")]
    BroadcastMismatch { left: Vec<usize>, right: Vec<usize> },

    #[error("transpose dim out of range: dim {dim}, rank {rank}")]
    TransposeDimOutOfRange { dim: usize, rank: usize },

    #[error("slice out of bounds: start {start}, len {len}, size {size}")]
    SliceOutOfBounds { start: usize, len: usize, size: usize },

    #[error("concat shape mismatch at dim {dim}: {shapes:?}")]
    ConcatShapeMismatch { dim: usize, shapes: Vec<Vec<usize>> },

    #[error("operation referenced unknown variable: {0}")]
    UnknownVariable(String),
}

/// Top-level error type unifying the crate's failure domains.
#[derive(Error, Debug)]
pub enum EvolimoError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    /// Only raised in strict mode (`Driver::with_strict_capacity`); by
    /// default capacity overflow is a soft counter, not an error.
    #[error("grid capacity overflow: {0} agent(s) dropped this step")]
    CapacityOverflow(usize),
}

pub type EvolimoResult<T> = Result<T, EvolimoError>;
