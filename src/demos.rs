//! # Demo definitions
//!
//! A handful of [`Definition`]s built from the expression builder, one per
//! published end-to-end scenario. Used by the `evolimo-compile`/`evolimo-step`
//! binaries as the built-in "definitions directory" (Evolimo definitions are
//! authored in Rust, not loaded from disk) and by the integration tests that
//! check those scenarios' numeric claims.

use crate::definition::{BoundaryDef, Definition, Initialization, ParameterGroupConfig, Rule};
use crate::distribution::Distribution;
use crate::expr::*;
use crate::ir::{Activation, BoundaryKind, GridConfig};
use std::collections::HashMap;

/// `vel_x <- vel_x - vel_x*drag*dt`, `pos_x` pass-through. `drag` and `dt`
/// are fixed constants here, not phenotype-derived parameters, matching the
/// published scenario's exact decay claim.
pub fn drag_only_1d() -> Definition {
    Definition {
        n_agents: 4,
        gene_len: 4,
        hidden_len: 8,
        state_var_order: vec!["pos_x".to_string(), "vel_x".to_string()],
        parameter_groups: HashMap::new(),
        rules: vec![Rule::new(
            "vel_x",
            sub(
                ref_state("vel_x"),
                mul(mul(ref_state("vel_x"), constant(0.5)), constant(0.1)),
            ),
        )],
        boundaries: vec![BoundaryDef::new("pos_x", BoundaryKind::None, [0.0, 0.0])],
        initialization: Initialization {
            state: HashMap::from([
                ("pos_x".to_string(), Distribution::Const { value: 0.0 }),
                ("vel_x".to_string(), Distribution::Const { value: 1.0 }),
            ]),
            genes: Distribution::Const { value: 0.5 },
        },
        grid_config: None,
        visual_mapping: None,
    }
}

/// `pos_x <- pos_x + 30`, torus-wrapped to `[-10, 10)`.
pub fn torus_wrap() -> Definition {
    Definition {
        n_agents: 5,
        gene_len: 2,
        hidden_len: 4,
        state_var_order: vec!["pos_x".to_string()],
        parameter_groups: HashMap::new(),
        rules: vec![Rule::new("pos_x", add(ref_state("pos_x"), constant(30.0)))],
        boundaries: vec![BoundaryDef::new("pos_x", BoundaryKind::Torus, [-10.0, 10.0])],
        initialization: Initialization {
            state: HashMap::from([(
                "pos_x".to_string(),
                Distribution::Uniform { low: -10.0, high: 10.0 },
            )]),
            genes: Distribution::Const { value: 0.0 },
        },
        grid_config: None,
        visual_mapping: None,
    }
}

/// 10 agents on a torus grid, gravitational stencil with `range=1`. Force on
/// a pair is `(neighbor_pos - center_pos) * g_strength / (dist^2 + eps)`,
/// antisymmetric by construction, so the stencil's pairwise sum conserves
/// momentum to floating-point tolerance.
pub fn grid_gravity() -> Definition {
    let scattered = grid_scatter(
        cat(vec![ref_state("pos_x"), ref_state("pos_y")], 1),
        ref_state("pos_x"),
        ref_state("pos_y"),
    );
    let forces = stencil(scattered, 1, |center, neighbor| {
        let diff = sub(neighbor, center);
        let dist_sq = add(sum(mul(diff.clone(), diff.clone()), 1, true), constant(1e-3));
        let strength = div(ref_param("g_strength", "GRAVITY"), dist_sq);
        mul(diff, strength)
    });
    let gathered = grid_gather(forces, ref_state("pos_x"), ref_state("pos_y"));

    Definition {
        n_agents: 10,
        gene_len: 4,
        hidden_len: 8,
        state_var_order: vec![
            "pos_x".to_string(),
            "pos_y".to_string(),
            "vel_x".to_string(),
            "vel_y".to_string(),
        ],
        parameter_groups: HashMap::from([(
            "GRAVITY".to_string(),
            ParameterGroupConfig { activation: Activation::None },
        )]),
        rules: vec![
            Rule::new(
                "vel_x",
                add(ref_state("vel_x"), slice(gathered.clone(), 1, 0, 1)),
            ),
            Rule::new("vel_y", add(ref_state("vel_y"), slice(gathered, 1, 1, 1))),
            Rule::new("pos_x", add(ref_state("pos_x"), ref_state("vel_x"))),
            Rule::new("pos_y", add(ref_state("pos_y"), ref_state("vel_y"))),
        ],
        boundaries: vec![
            BoundaryDef::new("pos_x", BoundaryKind::Torus, [0.0, 10.0]),
            BoundaryDef::new("pos_y", BoundaryKind::Torus, [0.0, 10.0]),
        ],
        initialization: Initialization {
            state: HashMap::from([
                ("pos_x".to_string(), Distribution::Uniform { low: 0.0, high: 10.0 }),
                ("pos_y".to_string(), Distribution::Uniform { low: 0.0, high: 10.0 }),
                ("vel_x".to_string(), Distribution::Const { value: 0.0 }),
                ("vel_y".to_string(), Distribution::Const { value: 0.0 }),
            ]),
            genes: Distribution::Const { value: 0.5 },
        },
        grid_config: Some(GridConfig { width: 5, height: 5, capacity: 4, cell_size: [2.0, 2.0] }),
        visual_mapping: None,
    }
}

/// Every demo definition, paired with the name its IR is written under.
pub fn registry() -> Vec<(&'static str, Definition)> {
    vec![
        ("drag_only_1d", drag_only_1d()),
        ("torus_wrap", torus_wrap()),
        ("grid_gravity", grid_gravity()),
    ]
}
