//! Op-stream interpreter (C4 step 3/4)
//!
//! Walks a flattened [`Operation`] list against an [`Env`], dispatching on
//! [`OpKind`]. `ref_state`/`ref_param` ops don't compute anything -- their
//! named column was already placed in the `Env` by [`extract_columns`]; the
//! interpreter only has to check it's there. `assign`/`kernel_output` are
//! plain aliases. Everything else is either an elementwise broadcast, a
//! reshape, or a grid-engine call.

use crate::error::ShapeError;
use crate::grid::{self, GridStats};
use crate::ir::{Boundary, BoundaryKind, GridConfig, GroupIR, OpKind, Operation, OutputIR};
use crate::runtime::tensor::{broadcast_binary, broadcast_where, Env, Tensor};
use ndarray::{s, Array2, Axis};
use std::collections::HashMap;

/// Pre-populates an `Env` with `s_<id>` columns from the current state and
/// `p_<id>` columns sliced out of each group's phenotype output. Mirrors the
/// "extract columns" step the spec describes before any op runs.
pub fn extract_columns(
    ir: &OutputIR,
    state: &HashMap<String, Array2<f32>>,
    params: &HashMap<String, Array2<f32>>,
) -> Result<Env, ShapeError> {
    let mut env = Env::default();

    for sv in &ir.state_vars {
        let column = state
            .get(sv)
            .ok_or_else(|| ShapeError::UnknownVariable(format!("s_{sv}")))?;
        env.insert(format!("s_{sv}"), Tensor::D2(column.clone()));
    }

    for (group_name, group) in &ir.groups {
        let Some(columns) = params.get(group_name) else {
            continue;
        };
        bind_group_params(&mut env, group, columns);
    }

    Ok(env)
}

fn bind_group_params(env: &mut Env, group: &GroupIR, columns: &Array2<f32>) {
    for (idx, id) in group.params.iter().enumerate() {
        let column = columns.column(idx).insert_axis(Axis(1)).to_owned();
        env.insert(format!("p_{id}"), Tensor::D2(column));
    }
}

/// Runs a flattened op list against `env`, writing each op's result under
/// its `target` name. `grid_config` is required whenever the stream
/// contains a grid op; absence there is a compile-time error
/// (`DefinitionError::MissingGridConfig`), so reaching one here with no
/// config is an invariant violation, not a normal failure path.
pub fn run_ops(
    ops: &[Operation],
    env: &mut Env,
    grid_config: Option<&GridConfig>,
) -> Result<(), ShapeError> {
    for op in ops {
        if let Some(tensor) = eval_op(op, env, grid_config)? {
            env.insert(op.target.clone(), tensor);
        }
    }
    Ok(())
}

fn eval_op(
    op: &Operation,
    env: &mut Env,
    grid_config: Option<&GridConfig>,
) -> Result<Option<Tensor>, ShapeError> {
    match op.op {
        OpKind::RefState | OpKind::RefParam => {
            env.get(&op.target)?;
            Ok(None)
        }
        OpKind::RefAux => Ok(None),
        OpKind::Const => {
            let value = op.value.unwrap_or(0.0) as f32;
            Ok(Some(Tensor::D2(Array2::from_elem((1, 1), value))))
        }
        OpKind::Add => binary(env, op, |a, b| a + b),
        OpKind::Sub => binary(env, op, |a, b| a - b),
        OpKind::Mul => binary(env, op, |a, b| a * b),
        OpKind::Div => binary(env, op, |a, b| a / b),
        OpKind::Lt => binary(env, op, |a, b| if a < b { 1.0 } else { 0.0 }),
        OpKind::Gt => binary(env, op, |a, b| if a > b { 1.0 } else { 0.0 }),
        OpKind::Ge => binary(env, op, |a, b| if a >= b { 1.0 } else { 0.0 }),
        OpKind::Where => {
            let cond = env.get_d2(&op.args[0])?;
            let t = env.get_d2(&op.args[1])?;
            let f = env.get_d2(&op.args[2])?;
            Ok(Some(Tensor::D2(broadcast_where(cond, t, f)?)))
        }
        OpKind::Sqrt => unary(env, op, f32::sqrt),
        OpKind::Relu => unary(env, op, |v| v.max(0.0)),
        OpKind::Neg => unary(env, op, |v| -v),
        OpKind::Transpose => {
            let value = env.get_d2(&op.args[0])?;
            let dim0 = op.dim0.unwrap_or(0);
            let dim1 = op.dim1.unwrap_or(1);
            if dim0 >= 2 || dim1 >= 2 {
                let rank = 2;
                let dim = dim0.max(dim1);
                return Err(ShapeError::TransposeDimOutOfRange { dim, rank });
            }
            let out = if dim0 == dim1 { value.clone() } else { value.t().to_owned() };
            Ok(Some(Tensor::D2(out)))
        }
        OpKind::Sum => {
            let value = env.get_d2(&op.args[0])?;
            let dim = op.dim.unwrap_or(0);
            if dim >= 2 {
                return Err(ShapeError::TransposeDimOutOfRange { dim, rank: 2 });
            }
            // keepdim has no separate representation here: the reduced axis
            // is always kept at size 1 since there is no rank-1 tensor type.
            let reduced = value.sum_axis(Axis(dim)).insert_axis(Axis(dim));
            Ok(Some(Tensor::D2(reduced)))
        }
        OpKind::Cat => {
            let values = op
                .args
                .iter()
                .map(|name| env.get_d2(name))
                .collect::<Result<Vec<_>, _>>()?;
            let dim = op.dim.unwrap_or(0);
            Ok(Some(Tensor::D2(cat2(&values, dim)?)))
        }
        OpKind::Slice => {
            let value = env.get_d2(&op.args[0])?;
            let dim = op.dim.unwrap_or(0);
            let start = op.start.unwrap_or(0);
            let len = op.len.unwrap_or(0);
            let size = value.shape()[dim];
            if start + len > size {
                return Err(ShapeError::SliceOutOfBounds { start, len, size });
            }
            let sliced = if dim == 0 {
                value.slice(s![start..start + len, ..]).to_owned()
            } else {
                value.slice(s![.., start..start + len]).to_owned()
            };
            Ok(Some(Tensor::D2(sliced)))
        }
        OpKind::GridScatter => {
            let value = env.get_d2(&op.args[0])?;
            let x = env.get_d2(&op.args[1])?;
            let y = env.get_d2(&op.args[2])?;
            let config = grid_config.expect("grid op reached runtime with no grid_config");
            let (grid_tensor, index, dropped) = grid::scatter(value, x, y, config);
            env.dropped += dropped;
            env.last_scatter = Some(index);
            Ok(Some(Tensor::D4(grid_tensor)))
        }
        OpKind::Stencil => {
            let value = env.get_d4(&op.args[0])?.clone();
            let range = op.stencil_range.expect("stencil op missing range");
            let kernel_ops = op
                .kernel_operations
                .as_ref()
                .expect("stencil op missing kernel_operations");
            let scatter_index = env
                .last_scatter
                .as_ref()
                .expect("stencil with no prior grid_scatter");
            let occupancy = scatter_index.occupancy.clone();
            let cell_to_agent = scatter_index.cell_to_agent.clone();
            // Only `s_<id>`/`p_<id>` columns are reachable from inside a
            // kernel body (via `RefState`/`RefParam`); everything else a
            // kernel needs comes through the `center`/`neighbor` aux
            // bindings. Each is sliced down to the row of the agent
            // occupying the center cell -- a bare ref inside a kernel is
            // the center agent's value, never an unrelated agent's.
            let agent_vars: HashMap<String, Array2<f32>> = env
                .vars
                .iter()
                .filter_map(|(name, tensor)| match tensor {
                    Tensor::D2(arr) if name.starts_with("s_") || name.starts_with("p_") => {
                        Some((name.clone(), arr.clone()))
                    }
                    _ => None,
                })
                .collect();
            let out = grid::stencil(
                &value,
                &occupancy,
                range,
                |center_cell, center, _neighbor_cell, neighbor| {
                    let mut sub = Env::default();
                    sub.insert("center", Tensor::D2(center.insert_axis(Axis(0)).to_owned()));
                    sub.insert("neighbor", Tensor::D2(neighbor.insert_axis(Axis(0)).to_owned()));
                    let agent = cell_to_agent
                        .get(&center_cell)
                        .expect("occupied center slot has a recorded agent");
                    for (name, column) in &agent_vars {
                        let row = column.row(*agent).insert_axis(Axis(0)).to_owned();
                        sub.insert(name.clone(), Tensor::D2(row));
                    }
                    run_ops(kernel_ops, &mut sub, grid_config)
                        .expect("kernel op stream is well-formed");
                    sub.get_d2("kernel_output")
                        .expect("kernel stream produces kernel_output")
                        .row(0)
                        .to_owned()
                },
            );
            Ok(Some(Tensor::D4(out)))
        }
        OpKind::GridGather => {
            let grid_tensor = env.get_d4(&op.args[0])?;
            Ok(Some(Tensor::D2(grid::gather(
                grid_tensor,
                env.last_scatter
                    .as_ref()
                    .expect("grid_gather with no prior grid_scatter"),
            ))))
        }
        OpKind::Assign | OpKind::KernelOutput => Ok(Some(env.get(&op.args[0])?.clone())),
    }
}

fn binary(
    env: &Env,
    op: &Operation,
    f: impl Fn(f32, f32) -> f32,
) -> Result<Option<Tensor>, ShapeError> {
    let left = env.get_d2(&op.args[0])?;
    let right = env.get_d2(&op.args[1])?;
    Ok(Some(Tensor::D2(broadcast_binary(left, right, f)?)))
}

fn unary(env: &Env, op: &Operation, f: impl Fn(f32) -> f32) -> Result<Option<Tensor>, ShapeError> {
    let value = env.get_d2(&op.args[0])?;
    Ok(Some(Tensor::D2(value.mapv(f))))
}

fn cat2(values: &[&Array2<f32>], dim: usize) -> Result<Array2<f32>, ShapeError> {
    let other_dim = 1 - dim;
    let other_size = values[0].shape()[other_dim];
    if !values.iter().all(|v| v.shape()[other_dim] == other_size) {
        return Err(ShapeError::ConcatShapeMismatch {
            dim,
            shapes: values.iter().map(|v| v.shape().to_vec()).collect(),
        });
    }
    let total: usize = values.iter().map(|v| v.shape()[dim]).sum();
    let shape = if dim == 0 { (total, other_size) } else { (other_size, total) };
    let mut out = Array2::<f32>::zeros(shape);
    let mut offset = 0;
    for v in values {
        let len = v.shape()[dim];
        if dim == 0 {
            out.slice_mut(s![offset..offset + len, ..]).assign(v);
        } else {
            out.slice_mut(s![.., offset..offset + len]).assign(v);
        }
        offset += len;
    }
    Ok(out)
}

/// Applies every boundary condition to its target state column, in place.
pub fn apply_boundaries(state: &mut HashMap<String, Array2<f32>>, boundaries: &[Boundary]) {
    for b in boundaries {
        let Some(column) = state.get_mut(&b.target_state) else { continue };
        let [low, high] = b.range;
        match b.kind {
            BoundaryKind::None => {}
            BoundaryKind::Clamp => column.mapv_inplace(|v| v.clamp(low, high)),
            BoundaryKind::Torus => {
                let span = high - low;
                if span > 0.0 {
                    column.mapv_inplace(|v| low + (v - low).rem_euclid(span));
                }
            }
        }
    }
}

/// What one `step` call produces besides the new state: grid capacity-
/// overflow stats accumulated across every `grid_scatter` op that ran.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepOutcome {
    pub grid_stats: GridStats,
}

/// Runs one full simulation step: extract columns, execute the op stream,
/// collect the resulting state columns (an `assign` op's target *is* the
/// state var name), apply boundary conditions.
pub fn step(
    ir: &OutputIR,
    state: &HashMap<String, Array2<f32>>,
    params: &HashMap<String, Array2<f32>>,
) -> Result<(HashMap<String, Array2<f32>>, StepOutcome), ShapeError> {
    let mut env = extract_columns(ir, state, params)?;
    run_ops(&ir.operations, &mut env, ir.grid_config.as_ref())?;

    let mut next_state = HashMap::new();
    for sv in &ir.state_vars {
        next_state.insert(sv.clone(), env.get_d2(sv)?.clone());
    }
    apply_boundaries(&mut next_state, &ir.boundary_conditions);

    let outcome = StepOutcome { grid_stats: GridStats { dropped: env.dropped } };
    Ok((next_state, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::definition::{Definition, Initialization, ParameterGroupConfig, Rule};
    use crate::distribution::Distribution;
    use crate::expr::*;
    use crate::ir::Activation;
    use ndarray::array;
    use std::collections::HashMap;

    fn drag_definition() -> Definition {
        Definition {
            n_agents: 1,
            gene_len: 1,
            hidden_len: 1,
            state_var_order: vec!["vel_x".to_string()],
            parameter_groups: HashMap::from([(
                "PHYSICS".to_string(),
                ParameterGroupConfig { activation: Activation::None },
            )]),
            rules: vec![Rule::new(
                "vel_x",
                sub(
                    ref_state("vel_x"),
                    mul(ref_state("vel_x"), ref_param("drag", "PHYSICS")),
                ),
            )],
            boundaries: vec![],
            initialization: Initialization {
                state: HashMap::from([("vel_x".to_string(), Distribution::Const { value: 1.0 })]),
                genes: Distribution::Const { value: 0.0 },
            },
            grid_config: None,
            visual_mapping: None,
        }
    }

    #[test]
    fn drag_decay_matches_hand_computation() {
        let def = drag_definition();
        let ir = compile(&def).unwrap();
        let mut state = HashMap::new();
        state.insert("vel_x".to_string(), array![[1.0_f32]]);
        let mut params = HashMap::new();
        params.insert("PHYSICS".to_string(), array![[0.1_f32]]);

        let mut vel = 1.0_f32;
        for _ in 0..10 {
            let (next, _) = step(&ir, &state, &params).unwrap();
            vel = next["vel_x"][[0, 0]];
            state = next;
        }
        // vel_{n+1} = vel_n - vel_n * 0.1 = vel_n * 0.9
        let expected = 0.9_f32.powi(10);
        assert!((vel - expected).abs() < 1e-4, "got {vel}, expected {expected}");
    }

    #[test]
    fn nan_passes_through_update_unchanged_rather_than_panicking() {
        let def = drag_definition();
        let ir = compile(&def).unwrap();
        let mut state = HashMap::new();
        state.insert("vel_x".to_string(), array![[f32::NAN]]);
        let mut params = HashMap::new();
        params.insert("PHYSICS".to_string(), array![[0.1_f32]]);

        let (next, _) = step(&ir, &state, &params).unwrap();
        assert!(next["vel_x"][[0, 0]].is_nan());
    }

    #[test]
    fn pass_through_state_var_is_unchanged() {
        let def = Definition {
            n_agents: 1,
            gene_len: 1,
            hidden_len: 1,
            state_var_order: vec!["energy".to_string()],
            parameter_groups: HashMap::new(),
            rules: vec![],
            boundaries: vec![],
            initialization: Initialization {
                state: HashMap::from([(
                    "energy".to_string(),
                    Distribution::Const { value: 100.0 },
                )]),
                genes: Distribution::Const { value: 0.0 },
            },
            grid_config: None,
            visual_mapping: None,
        };
        let ir = compile(&def).unwrap();
        let mut state = HashMap::new();
        state.insert("energy".to_string(), array![[100.0_f32]]);
        let params = HashMap::new();
        for _ in 0..5 {
            let (next, _) = step(&ir, &state, &params).unwrap();
            assert_eq!(next["energy"][[0, 0]], 100.0);
            state = next;
        }
    }

    #[test]
    fn torus_boundary_wraps_position() {
        let mut state = HashMap::new();
        state.insert("pos_x".to_string(), array![[30.0_f32]]);
        let boundaries = vec![Boundary {
            target_state: "pos_x".to_string(),
            kind: BoundaryKind::Torus,
            range: [-10.0, 10.0],
        }];
        apply_boundaries(&mut state, &boundaries);
        // ((30 - (-10)) mod 20) + (-10) = -10
        assert!((state["pos_x"][[0, 0]] - (-10.0)).abs() < 1e-4);
    }

    #[test]
    fn conditional_rule_picks_branch_by_sign() {
        let def = Definition {
            n_agents: 2,
            gene_len: 1,
            hidden_len: 1,
            state_var_order: vec!["pos_x".to_string(), "size".to_string()],
            parameter_groups: HashMap::new(),
            rules: vec![Rule::new(
                "size",
                where_(gt(ref_state("pos_x"), constant(0.0)), constant(1.0), constant(0.0)),
            )],
            boundaries: vec![],
            initialization: Initialization {
                state: HashMap::from([
                    ("pos_x".to_string(), Distribution::Const { value: 0.0 }),
                    ("size".to_string(), Distribution::Const { value: 0.0 }),
                ]),
                genes: Distribution::Const { value: 0.0 },
            },
            grid_config: None,
            visual_mapping: None,
        };
        let ir = compile(&def).unwrap();
        let mut state = HashMap::new();
        state.insert("pos_x".to_string(), array![[1.0_f32], [-1.0]]);
        state.insert("size".to_string(), array![[0.0_f32], [0.0]]);
        let params = HashMap::new();
        let (next, _) = step(&ir, &state, &params).unwrap();
        assert_eq!(next["size"][[0, 0]], 1.0);
        assert_eq!(next["size"][[1, 0]], 0.0);
    }
}
