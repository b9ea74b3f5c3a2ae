//! Common Subexpression Elimination
//!
//! CSE is structural: a canonical serialization of a subtree is the memo
//! key, so two syntactically identical subtrees collapse to the same
//! intermediate variable regardless of where they appear. For `stencil`
//! nodes the canonical form includes the *expanded* kernel body (the result
//! of invoking the kernel closure once with `center`/`neighbor` aux
//! bindings), so two stencils with differently-shaped-but-equivalent
//! closures still dedup correctly, and two stencils that merely look similar
//! but differ in kernel body do not.

use crate::expr::Expr;
use std::fmt::Write as _;

/// Produce a canonical string form of `expr` suitable for use as a CSE memo
/// key. Not meant to be human-readable beyond debugging; only structural
/// equality matters.
pub fn canonicalize(expr: &Expr) -> String {
    let mut out = String::new();
    write_canonical(expr, &mut out);
    out
}

fn write_canonical(expr: &Expr, out: &mut String) {
    match expr {
        Expr::RefState { id } => {
            let _ = write!(out, "ref_state({id})");
        }
        Expr::RefParam { id, group } => {
            let _ = write!(out, "ref_param({id},{group})");
        }
        Expr::RefAux { id } => {
            let _ = write!(out, "ref_aux({id})");
        }
        Expr::Const { value } => {
            let _ = write!(out, "const({value})");
        }
        Expr::Add { left, right } => write_binary(out, "add", left, right),
        Expr::Sub { left, right } => write_binary(out, "sub", left, right),
        Expr::Mul { left, right } => write_binary(out, "mul", left, right),
        Expr::Div { left, right } => write_binary(out, "div", left, right),
        Expr::Lt { left, right } => write_binary(out, "lt", left, right),
        Expr::Gt { left, right } => write_binary(out, "gt", left, right),
        Expr::Ge { left, right } => write_binary(out, "ge", left, right),
        Expr::Where { cond, true_val, false_val } => {
            out.push_str("where(");
            write_canonical(cond, out);
            out.push(',');
            write_canonical(true_val, out);
            out.push(',');
            write_canonical(false_val, out);
            out.push(')');
        }
        Expr::Sqrt { value } => write_unary(out, "sqrt", value),
        Expr::Relu { value } => write_unary(out, "relu", value),
        Expr::Neg { value } => write_unary(out, "neg", value),
        Expr::Transpose { value, dim0, dim1 } => {
            out.push_str("transpose(");
            write_canonical(value, out);
            let _ = write!(out, ",{dim0},{dim1})");
        }
        Expr::Sum { value, dim, keepdim } => {
            out.push_str("sum(");
            write_canonical(value, out);
            let _ = write!(out, ",{dim},{keepdim})");
        }
        Expr::Cat { values, dim } => {
            out.push_str("cat([");
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(v, out);
            }
            let _ = write!(out, "],{dim})");
        }
        Expr::Slice { value, dim, start, len } => {
            out.push_str("slice(");
            write_canonical(value, out);
            let _ = write!(out, ",{dim},{start},{len})");
        }
        Expr::GridScatter { value, x, y } => {
            out.push_str("grid_scatter(");
            write_canonical(value, out);
            out.push(',');
            write_canonical(x, out);
            out.push(',');
            write_canonical(y, out);
            out.push(')');
        }
        Expr::Stencil { value, range, kernel } => {
            let center = crate::expr::ref_aux("center");
            let neighbor = crate::expr::ref_aux("neighbor");
            let body = kernel(center, neighbor);
            out.push_str("stencil(");
            write_canonical(value, out);
            let _ = write!(out, ",{range},");
            write_canonical(&body, out);
            out.push(')');
        }
        Expr::GridGather { value, x, y } => {
            out.push_str("grid_gather(");
            write_canonical(value, out);
            out.push(',');
            write_canonical(x, out);
            out.push(',');
            write_canonical(y, out);
            out.push(')');
        }
    }
}

fn write_binary(out: &mut String, tag: &str, left: &Expr, right: &Expr) {
    out.push_str(tag);
    out.push('(');
    write_canonical(left, out);
    out.push(',');
    write_canonical(right, out);
    out.push(')');
}

fn write_unary(out: &mut String, tag: &str, value: &Expr) {
    out.push_str(tag);
    out.push('(');
    write_canonical(value, out);
    out.push(')');
}
