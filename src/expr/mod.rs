//! # Expression Builder
//!
//! The symbolic DSL: an immutable AST of tensor-valued operations over
//! state/parameter references, built through pure constructors. Each
//! operator returns a freshly allocated node; no validation happens here
//! beyond the node's own shape -- semantic checks (unknown groups, missing
//! initialization) belong to the compiler.
//!
//! `stencil` is the one non-pure-data constructor: it carries a
//! host-language closure `(center, neighbor) -> Expr` that the compiler
//! expands, during flattening, into a self-contained nested op list. The
//! runtime never invokes a closure -- by the time an `Expr` tree reaches the
//! compiler's output, every stencil kernel is plain data.
//!
//! ```
//! use evolimo_core::expr::*;
//!
//! // vel_x <- vel_x - vel_x * drag * dt
//! let drag = ref_param("drag", "PHYSICS");
//! let dt = constant(0.1);
//! let decayed = sub(ref_state("vel_x"), mul(mul(ref_state("vel_x"), drag), dt));
//! ```

use std::rc::Rc;

/// A kernel body used by [`Expr::Stencil`]; takes the compiled `center` and
/// `neighbor` aux bindings and returns the per-pair contribution expression.
pub type StencilKernel = Rc<dyn Fn(Expr, Expr) -> Expr>;

/// Immutable expression tree node.
#[derive(Clone)]
pub enum Expr {
    RefState { id: String },
    RefParam { id: String, group: String },
    RefAux { id: String },
    Const { value: f64 },
    Add { left: Rc<Expr>, right: Rc<Expr> },
    Sub { left: Rc<Expr>, right: Rc<Expr> },
    Mul { left: Rc<Expr>, right: Rc<Expr> },
    Div { left: Rc<Expr>, right: Rc<Expr> },
    Lt { left: Rc<Expr>, right: Rc<Expr> },
    Gt { left: Rc<Expr>, right: Rc<Expr> },
    Ge { left: Rc<Expr>, right: Rc<Expr> },
    Where { cond: Rc<Expr>, true_val: Rc<Expr>, false_val: Rc<Expr> },
    Sqrt { value: Rc<Expr> },
    Relu { value: Rc<Expr> },
    Neg { value: Rc<Expr> },
    Transpose { value: Rc<Expr>, dim0: usize, dim1: usize },
    Sum { value: Rc<Expr>, dim: usize, keepdim: bool },
    Cat { values: Vec<Rc<Expr>>, dim: usize },
    Slice { value: Rc<Expr>, dim: usize, start: usize, len: usize },
    GridScatter { value: Rc<Expr>, x: Rc<Expr>, y: Rc<Expr> },
    Stencil { value: Rc<Expr>, range: usize, kernel: StencilKernel },
    GridGather { value: Rc<Expr>, x: Rc<Expr>, y: Rc<Expr> },
}

pub fn ref_state(id: impl Into<String>) -> Expr {
    Expr::RefState { id: id.into() }
}

pub fn ref_param(id: impl Into<String>, group: impl Into<String>) -> Expr {
    Expr::RefParam { id: id.into(), group: group.into() }
}

pub fn ref_aux(id: impl Into<String>) -> Expr {
    Expr::RefAux { id: id.into() }
}

pub fn constant(value: f64) -> Expr {
    Expr::Const { value }
}

macro_rules! binary_ctor {
    ($name:ident, $variant:ident) => {
        pub fn $name(left: Expr, right: Expr) -> Expr {
            Expr::$variant { left: Rc::new(left), right: Rc::new(right) }
        }
    };
}

binary_ctor!(add, Add);
binary_ctor!(sub, Sub);
binary_ctor!(mul, Mul);
binary_ctor!(div, Div);
binary_ctor!(lt, Lt);
binary_ctor!(gt, Gt);
binary_ctor!(ge, Ge);

pub fn where_(cond: Expr, true_val: Expr, false_val: Expr) -> Expr {
    Expr::Where {
        cond: Rc::new(cond),
        true_val: Rc::new(true_val),
        false_val: Rc::new(false_val),
    }
}

macro_rules! unary_ctor {
    ($name:ident, $variant:ident) => {
        pub fn $name(value: Expr) -> Expr {
            Expr::$variant { value: Rc::new(value) }
        }
    };
}

unary_ctor!(sqrt, Sqrt);
unary_ctor!(relu, Relu);
unary_ctor!(neg, Neg);

pub fn transpose(value: Expr, dim0: usize, dim1: usize) -> Expr {
    Expr::Transpose { value: Rc::new(value), dim0, dim1 }
}

pub fn sum(value: Expr, dim: usize, keepdim: bool) -> Expr {
    Expr::Sum { value: Rc::new(value), dim, keepdim }
}

pub fn cat(values: Vec<Expr>, dim: usize) -> Expr {
    Expr::Cat { values: values.into_iter().map(Rc::new).collect(), dim }
}

pub fn slice(value: Expr, dim: usize, start: usize, len: usize) -> Expr {
    Expr::Slice { value: Rc::new(value), dim, start, len }
}

pub fn grid_scatter(value: Expr, x: Expr, y: Expr) -> Expr {
    Expr::GridScatter { value: Rc::new(value), x: Rc::new(x), y: Rc::new(y) }
}

pub fn stencil(value: Expr, range: usize, kernel: impl Fn(Expr, Expr) -> Expr + 'static) -> Expr {
    Expr::Stencil { value: Rc::new(value), range, kernel: Rc::new(kernel) }
}

pub fn grid_gather(value: Expr, x: Expr, y: Expr) -> Expr {
    Expr::GridGather { value: Rc::new(value), x: Rc::new(x), y: Rc::new(y) }
}
