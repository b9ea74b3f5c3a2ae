//! Parameter collection (compiler step 2)
//!
//! Walks every rule's expression -- including the synthetic expansion of
//! each `stencil.kernel(center,neighbor)`, so parameters referenced only
//! inside a neighborhood kernel are still collected -- and accumulates
//! parameter ids per group. Each group's list is sorted lexicographically;
//! an unknown group is a hard compile error.

use crate::definition::Definition;
use crate::error::DefinitionError;
use crate::expr::Expr;
use std::collections::{BTreeMap, BTreeSet};

pub fn collect_parameters(
    definition: &Definition,
) -> Result<BTreeMap<String, Vec<String>>, DefinitionError> {
    let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for rule in &definition.rules {
        walk_params(&rule.expr, definition, &mut groups)?;
    }

    Ok(groups
        .into_iter()
        .map(|(group, ids)| (group, ids.into_iter().collect()))
        .collect())
}

fn walk_params(
    expr: &Expr,
    definition: &Definition,
    groups: &mut BTreeMap<String, BTreeSet<String>>,
) -> Result<(), DefinitionError> {
    match expr {
        Expr::RefParam { id, group } => {
            if !definition.parameter_groups.contains_key(group) {
                return Err(DefinitionError::UnknownParameterGroup(group.clone()));
            }
            groups.entry(group.clone()).or_default().insert(id.clone());
            Ok(())
        }
        Expr::RefState { .. } | Expr::RefAux { .. } | Expr::Const { .. } => Ok(()),
        Expr::Add { left, right }
        | Expr::Sub { left, right }
        | Expr::Mul { left, right }
        | Expr::Div { left, right }
        | Expr::Lt { left, right }
        | Expr::Gt { left, right }
        | Expr::Ge { left, right } => {
            walk_params(left, definition, groups)?;
            walk_params(right, definition, groups)
        }
        Expr::Where { cond, true_val, false_val } => {
            walk_params(cond, definition, groups)?;
            walk_params(true_val, definition, groups)?;
            walk_params(false_val, definition, groups)
        }
        Expr::Sqrt { value } | Expr::Relu { value } | Expr::Neg { value } => {
            walk_params(value, definition, groups)
        }
        Expr::Transpose { value, .. } | Expr::Sum { value, .. } | Expr::Slice { value, .. } => {
            walk_params(value, definition, groups)
        }
        Expr::Cat { values, .. } => {
            for v in values {
                walk_params(v, definition, groups)?;
            }
            Ok(())
        }
        Expr::GridScatter { value, x, y } | Expr::GridGather { value, x, y } => {
            walk_params(value, definition, groups)?;
            walk_params(x, definition, groups)?;
            walk_params(y, definition, groups)
        }
        Expr::Stencil { value, kernel, .. } => {
            walk_params(value, definition, groups)?;
            let center = crate::expr::ref_aux("center");
            let neighbor = crate::expr::ref_aux("neighbor");
            walk_params(&kernel(center, neighbor), definition, groups)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{Initialization, ParameterGroupConfig, Rule};
    use crate::distribution::Distribution;
    use crate::expr::*;
    use crate::ir::Activation;
    use std::collections::HashMap;

    fn def_with_groups(groups: &[&str], rules: Vec<Rule>) -> Definition {
        Definition {
            n_agents: 1,
            gene_len: 1,
            hidden_len: 1,
            state_var_order: vec![],
            parameter_groups: groups
                .iter()
                .map(|g| (g.to_string(), ParameterGroupConfig { activation: Activation::None }))
                .collect(),
            rules,
            boundaries: vec![],
            initialization: Initialization { state: HashMap::new(), genes: Distribution::Const { value: 0.0 } },
            grid_config: None,
            visual_mapping: None,
        }
    }

    #[test]
    fn collects_and_sorts_params_within_group() {
        let rules = vec![Rule::new(
            "x",
            add(ref_param("zeta", "G"), ref_param("alpha", "G")),
        )];
        let def = def_with_groups(&["G"], rules);
        let params = collect_parameters(&def).unwrap();
        assert_eq!(params["G"], vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn unknown_group_is_fatal() {
        let rules = vec![Rule::new("x", ref_param("alpha", "MISSING"))];
        let def = def_with_groups(&[], rules);
        let err = collect_parameters(&def).unwrap_err();
        assert_eq!(err, DefinitionError::UnknownParameterGroup("MISSING".to_string()));
    }

    #[test]
    fn collects_params_referenced_only_inside_stencil_kernel() {
        let rules = vec![Rule::new(
            "x",
            stencil(ref_state("pos_x"), 1, |c, n| {
                mul(sub(n, c), ref_param("strength", "G"))
            }),
        )];
        let def = def_with_groups(&["G"], rules);
        let params = collect_parameters(&def).unwrap();
        assert_eq!(params["G"], vec!["strength".to_string()]);
    }
}
