//! # Compiler (C3)
//!
//! Turns a [`Definition`] into a deterministic [`OutputIR`]: topological
//! flattening with structural-hash CSE, parameter collection, state-var
//! ordering, pass-through generation for unwritten state vars, and
//! initialization-coverage validation.
//!
//! ```text
//! Definition (Expr trees) -> [Compiler] -> OutputIR (flat op list) -> Runtime
//! ```

pub mod cse;
pub mod params;
pub mod state_vars;

use crate::definition::Definition;
use crate::error::DefinitionError;
use crate::expr::{self, Expr};
use crate::ir::{
    Boundary, Constants, GroupIR, InitializationIR, Operation, OpKind, OutputIR, ParamInfo,
};
use cse::canonicalize;
use std::collections::{HashMap, HashSet};

/// Compiles one [`Definition`] into an [`OutputIR`]. Not reused across
/// definitions -- each compilation gets a fresh memo and temp counter.
pub struct Compiler<'a> {
    definition: &'a Definition,
    temp_counter: usize,
    memo: HashMap<String, String>,
    operations: Vec<Operation>,
}

impl<'a> Compiler<'a> {
    pub fn new(definition: &'a Definition) -> Self {
        Compiler {
            definition,
            temp_counter: 0,
            memo: HashMap::new(),
            operations: Vec::new(),
        }
    }

    pub fn compile(mut self) -> Result<OutputIR, DefinitionError> {
        let state_vars = state_vars::collect_state_vars(self.definition);
        let collected_params = params::collect_parameters(self.definition)?;

        let mut assigned: HashSet<String> = HashSet::new();
        for rule in &self.definition.rules {
            if !assigned.insert(rule.target_state.clone()) {
                return Err(DefinitionError::DuplicateStateVar(rule.target_state.clone()));
            }
            let value_var = self.compile_expr(&rule.expr)?;
            self.operations.push(Operation::new(
                rule.target_state.clone(),
                OpKind::Assign,
                vec![value_var],
            ));
        }

        for sv in &state_vars {
            if !assigned.contains(sv) {
                self.operations.push(Operation::new(
                    sv.clone(),
                    OpKind::Assign,
                    vec![format!("s_{sv}")],
                ));
            }
        }

        for sv in &state_vars {
            if !self.definition.initialization.state.contains_key(sv) {
                return Err(DefinitionError::MissingInitialization(sv.clone()));
            }
        }

        if self.definition.grid_config.is_none()
            && self.operations.iter().any(|op| {
                matches!(op.op, OpKind::GridScatter | OpKind::Stencil | OpKind::GridGather)
            })
        {
            return Err(DefinitionError::MissingGridConfig);
        }

        let groups: HashMap<String, GroupIR> = self
            .definition
            .parameter_groups
            .iter()
            .map(|(name, cfg)| {
                let params = collected_params.get(name).cloned().unwrap_or_default();
                (name.clone(), GroupIR { activation: cfg.activation, params })
            })
            .collect();

        let boundary_conditions = self
            .definition
            .boundaries
            .iter()
            .map(|b| Boundary {
                target_state: b.target_state.clone(),
                kind: b.kind,
                range: b.range,
            })
            .collect();

        let initialization = InitializationIR {
            state: state_vars
                .iter()
                .map(|sv| (sv.clone(), self.definition.initialization.state[sv].clone()))
                .collect(),
            genes: self.definition.initialization.genes.clone(),
        };

        Ok(OutputIR {
            state_vars,
            constants: Constants {
                n_agents: self.definition.n_agents,
                gene_len: self.definition.gene_len,
                hidden_len: self.definition.hidden_len,
            },
            grid_config: self.definition.grid_config,
            groups,
            boundary_conditions,
            initialization,
            operations: self.operations,
        })
    }

    fn fresh_temp(&mut self) -> String {
        let name = format!("temp_{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<String, DefinitionError> {
        let key = canonicalize(expr);
        if let Some(name) = self.memo.get(&key) {
            return Ok(name.clone());
        }

        let name = match expr {
            Expr::RefState { id } => {
                let name = format!("s_{id}");
                self.operations.push(Operation::new(name.clone(), OpKind::RefState, vec![]));
                name
            }
            Expr::RefParam { id, group } => {
                let name = format!("p_{id}");
                let mut op = Operation::new(name.clone(), OpKind::RefParam, vec![]);
                op.param_info = Some(ParamInfo { id: id.clone(), group: group.clone() });
                self.operations.push(op);
                name
            }
            Expr::RefAux { id } => {
                // Aux bindings are pre-bound by the stencil driver at runtime
                // (center/neighbor); no op is emitted, the name is the id itself.
                return Ok(id.clone());
            }
            Expr::Const { value } => {
                let name = self.fresh_temp();
                let mut op = Operation::new(name.clone(), OpKind::Const, vec![]);
                op.value = Some(*value);
                self.operations.push(op);
                name
            }
            Expr::Add { left, right } => self.compile_binary(OpKind::Add, left, right)?,
            Expr::Sub { left, right } => self.compile_binary(OpKind::Sub, left, right)?,
            Expr::Mul { left, right } => self.compile_binary(OpKind::Mul, left, right)?,
            Expr::Div { left, right } => self.compile_binary(OpKind::Div, left, right)?,
            Expr::Lt { left, right } => self.compile_binary(OpKind::Lt, left, right)?,
            Expr::Gt { left, right } => self.compile_binary(OpKind::Gt, left, right)?,
            Expr::Ge { left, right } => self.compile_binary(OpKind::Ge, left, right)?,
            Expr::Where { cond, true_val, false_val } => {
                let cond_var = self.compile_expr(cond)?;
                let true_var = self.compile_expr(true_val)?;
                let false_var = self.compile_expr(false_val)?;
                let name = self.fresh_temp();
                self.operations.push(Operation::new(
                    name.clone(),
                    OpKind::Where,
                    vec![cond_var, true_var, false_var],
                ));
                name
            }
            Expr::Sqrt { value } => self.compile_unary(OpKind::Sqrt, value)?,
            Expr::Relu { value } => self.compile_unary(OpKind::Relu, value)?,
            Expr::Neg { value } => self.compile_unary(OpKind::Neg, value)?,
            Expr::Transpose { value, dim0, dim1 } => {
                let value_var = self.compile_expr(value)?;
                let name = self.fresh_temp();
                let mut op = Operation::new(name.clone(), OpKind::Transpose, vec![value_var]);
                op.dim0 = Some(*dim0);
                op.dim1 = Some(*dim1);
                self.operations.push(op);
                name
            }
            Expr::Sum { value, dim, keepdim } => {
                let value_var = self.compile_expr(value)?;
                let name = self.fresh_temp();
                let mut op = Operation::new(name.clone(), OpKind::Sum, vec![value_var]);
                op.dim = Some(*dim);
                op.keepdim = Some(*keepdim);
                self.operations.push(op);
                name
            }
            Expr::Cat { values, dim } => {
                let mut arg_vars = Vec::with_capacity(values.len());
                for v in values {
                    arg_vars.push(self.compile_expr(v)?);
                }
                let name = self.fresh_temp();
                let mut op = Operation::new(name.clone(), OpKind::Cat, arg_vars);
                op.dim = Some(*dim);
                self.operations.push(op);
                name
            }
            Expr::Slice { value, dim, start, len } => {
                let value_var = self.compile_expr(value)?;
                let name = self.fresh_temp();
                let mut op = Operation::new(name.clone(), OpKind::Slice, vec![value_var]);
                op.dim = Some(*dim);
                op.start = Some(*start);
                op.len = Some(*len);
                self.operations.push(op);
                name
            }
            Expr::GridScatter { value, x, y } => {
                let value_var = self.compile_expr(value)?;
                let x_var = self.compile_expr(x)?;
                let y_var = self.compile_expr(y)?;
                let name = self.fresh_temp();
                self.operations.push(Operation::new(
                    name.clone(),
                    OpKind::GridScatter,
                    vec![value_var, x_var, y_var],
                ));
                name
            }
            Expr::GridGather { value, x, y } => {
                let value_var = self.compile_expr(value)?;
                let x_var = self.compile_expr(x)?;
                let y_var = self.compile_expr(y)?;
                let name = self.fresh_temp();
                self.operations.push(Operation::new(
                    name.clone(),
                    OpKind::GridGather,
                    vec![value_var, x_var, y_var],
                ));
                name
            }
            Expr::Stencil { value, range, kernel } => {
                let value_var = self.compile_expr(value)?;

                let center = expr::ref_aux("center");
                let neighbor = expr::ref_aux("neighbor");
                let body = kernel(center, neighbor);

                let mut sub = Compiler {
                    definition: self.definition,
                    temp_counter: 0,
                    memo: HashMap::new(),
                    operations: Vec::new(),
                };
                let body_var = sub.compile_expr(&body)?;
                let mut kernel_operations = sub.operations;
                kernel_operations.push(Operation::new(
                    "kernel_output",
                    OpKind::KernelOutput,
                    vec![body_var],
                ));

                let name = self.fresh_temp();
                let mut op = Operation::new(name.clone(), OpKind::Stencil, vec![value_var]);
                op.stencil_range = Some(*range);
                op.kernel_operations = Some(kernel_operations);
                self.operations.push(op);
                name
            }
        };

        self.memo.insert(key, name.clone());
        Ok(name)
    }

    fn compile_binary(
        &mut self,
        op_kind: OpKind,
        left: &Expr,
        right: &Expr,
    ) -> Result<String, DefinitionError> {
        let left_var = self.compile_expr(left)?;
        let right_var = self.compile_expr(right)?;
        let name = self.fresh_temp();
        self.operations
            .push(Operation::new(name.clone(), op_kind, vec![left_var, right_var]));
        Ok(name)
    }

    fn compile_unary(&mut self, op_kind: OpKind, value: &Expr) -> Result<String, DefinitionError> {
        let value_var = self.compile_expr(value)?;
        let name = self.fresh_temp();
        self.operations.push(Operation::new(name.clone(), op_kind, vec![value_var]));
        Ok(name)
    }
}

/// Compile every definition module discovered as a `(name, Definition)` pair
/// into its `OutputIR`. Definition discovery (reading a `definitions/`
/// directory into parsed `Definition` values) is left to the caller --
/// this crate compiles in-memory definitions, not source files.
pub fn compile(definition: &Definition) -> Result<OutputIR, DefinitionError> {
    Compiler::new(definition).compile()
}
