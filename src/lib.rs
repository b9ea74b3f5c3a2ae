//! # Evolimo core
//!
//! A declarative agent-simulation compiler and tensor runtime:
//!
//! ```text
//! Definition (expr trees)  -->  Compiler  -->  OutputIR (JSON)  -->  Driver
//!      expr::Expr               compiler            ir::OutputIR       driver::Driver
//! ```
//!
//! Users build a [`definition::Definition`] out of [`expr::Expr`] trees,
//! [`compiler::compile`] turns it into a flat, deduplicated [`ir::OutputIR`],
//! [`ir_io`] round-trips that IR through JSON, and [`driver::Driver`] drives
//! it forward one step at a time over the [`runtime`] tensor interpreter and
//! [`grid`] spatial engine.

pub mod compiler;
pub mod config;
pub mod definition;
pub mod demos;
pub mod distribution;
pub mod driver;
pub mod error;
pub mod expr;
pub mod grid;
pub mod ir;
pub mod ir_io;
pub mod runtime;
pub mod visual;

pub use compiler::compile;
pub use definition::Definition;
pub use driver::Driver;
pub use error::{DefinitionError, EvolimoError, EvolimoResult, ShapeError};
pub use ir::OutputIR;
