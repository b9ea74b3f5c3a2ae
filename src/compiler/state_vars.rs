//! State-var collection (compiler step 1)
//!
//! `state_vars` is every declared `STATE_VAR_ORDER` entry, in declared
//! order (a var the user declares belongs in the state tensor whether or
//! not any rule happens to touch it -- an unreferenced var is exactly the
//! pass-through case), followed by any state var referenced by a rule but
//! absent from `STATE_VAR_ORDER`, appended in lexicographic order. The
//! result is a pure function of `STATE_VAR_ORDER` and the set of
//! referenced state vars: reordering unrelated rules never perturbs it.

use crate::definition::Definition;
use crate::expr::Expr;
use std::collections::BTreeSet;

pub fn collect_state_vars(definition: &Definition) -> Vec<String> {
    let mut referenced: BTreeSet<String> = BTreeSet::new();

    for rule in &definition.rules {
        referenced.insert(rule.target_state.clone());
        walk_refs(&rule.expr, &mut referenced);
    }

    let declared_order = &definition.state_var_order;
    let mut ordered: Vec<String> = declared_order.clone();

    let declared: BTreeSet<&String> = declared_order.iter().collect();
    for name in &referenced {
        if !declared.contains(name) {
            ordered.push(name.clone());
        }
    }

    ordered
}

fn walk_refs(expr: &Expr, out: &mut BTreeSet<String>) {
    match expr {
        Expr::RefState { id } => {
            out.insert(id.clone());
        }
        Expr::RefParam { .. } | Expr::RefAux { .. } | Expr::Const { .. } => {}
        Expr::Add { left, right }
        | Expr::Sub { left, right }
        | Expr::Mul { left, right }
        | Expr::Div { left, right }
        | Expr::Lt { left, right }
        | Expr::Gt { left, right }
        | Expr::Ge { left, right } => {
            walk_refs(left, out);
            walk_refs(right, out);
        }
        Expr::Where { cond, true_val, false_val } => {
            walk_refs(cond, out);
            walk_refs(true_val, out);
            walk_refs(false_val, out);
        }
        Expr::Sqrt { value } | Expr::Relu { value } | Expr::Neg { value } => {
            walk_refs(value, out);
        }
        Expr::Transpose { value, .. } | Expr::Sum { value, .. } | Expr::Slice { value, .. } => {
            walk_refs(value, out);
        }
        Expr::Cat { values, .. } => {
            for v in values {
                walk_refs(v, out);
            }
        }
        Expr::GridScatter { value, x, y } | Expr::GridGather { value, x, y } => {
            walk_refs(value, out);
            walk_refs(x, out);
            walk_refs(y, out);
        }
        Expr::Stencil { value, kernel, .. } => {
            walk_refs(value, out);
            let center = crate::expr::ref_aux("center");
            let neighbor = crate::expr::ref_aux("neighbor");
            walk_refs(&kernel(center, neighbor), out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Rule;
    use crate::expr::*;

    fn def_with(order: Vec<&str>, rules: Vec<Rule>) -> Definition {
        Definition {
            n_agents: 1,
            gene_len: 1,
            hidden_len: 1,
            state_var_order: order.into_iter().map(String::from).collect(),
            parameter_groups: Default::default(),
            rules,
            boundaries: vec![],
            initialization: crate::definition::Initialization {
                state: Default::default(),
                genes: crate::distribution::Distribution::Const { value: 0.0 },
            },
            grid_config: None,
            visual_mapping: None,
        }
    }

    #[test]
    fn declared_order_preserved_then_lexical_remainder() {
        let rules = vec![
            Rule::new("pos_x", add(ref_state("pos_x"), ref_state("vel_x"))),
            Rule::new("energy", ref_state("energy")),
        ];
        let def = def_with(vec!["vel_x", "pos_x"], rules);
        let vars = collect_state_vars(&def);
        // declared order first, then undeclared-but-referenced in lexical order
        assert_eq!(vars, vec!["vel_x", "pos_x", "energy"]);
    }

    #[test]
    fn reordering_unrelated_rules_does_not_perturb_column_order() {
        let rules_a = vec![
            Rule::new("a", ref_state("a")),
            Rule::new("b", ref_state("b")),
        ];
        let rules_b = vec![
            Rule::new("b", ref_state("b")),
            Rule::new("a", ref_state("a")),
        ];
        let def_a = def_with(vec!["a", "b"], rules_a);
        let def_b = def_with(vec!["a", "b"], rules_b);
        assert_eq!(collect_state_vars(&def_a), collect_state_vars(&def_b));
    }
}
