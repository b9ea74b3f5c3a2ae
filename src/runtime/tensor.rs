//! Named-tensor environment and broadcasting helpers
//!
//! The interpreter works over two concrete tensor ranks: `D2` for
//! per-agent scalar/vector columns (`[N, D]`, including the degenerate
//! `[1, D]` used when a stencil kernel is evaluated for a single pair) and
//! `D4` for the grid intermediates (`[H, W, C, D]`). Every op in the
//! flattened stream reads and writes named entries in this map.

use crate::error::ShapeError;
use ndarray::{Array2, Array4, Zip};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub enum Tensor {
    D2(Array2<f32>),
    D4(Array4<f32>),
}

impl Tensor {
    pub fn as_d2(&self) -> Result<&Array2<f32>, ShapeError> {
        match self {
            Tensor::D2(a) => Ok(a),
            Tensor::D4(a) => Err(ShapeError::BroadcastMismatch {
                left: a.shape().to_vec(),
                right: vec![],
            }),
        }
    }

    pub fn as_d4(&self) -> Result<&Array4<f32>, ShapeError> {
        match self {
            Tensor::D4(a) => Ok(a),
            Tensor::D2(a) => Err(ShapeError::BroadcastMismatch {
                left: a.shape().to_vec(),
                right: vec![],
            }),
        }
    }
}

/// The named-tensor map the interpreter reads and writes as it walks an op
/// stream, plus the grid engine's side channel: the particle-slot map
/// recorded by the most recent `grid_scatter`, consumed by the matching
/// `grid_gather`, and the running capacity-overflow counter.
#[derive(Default)]
pub struct Env {
    pub vars: HashMap<String, Tensor>,
    pub last_scatter: Option<crate::grid::ScatterIndex>,
    pub dropped: usize,
}

impl Env {
    pub fn get(&self, name: &str) -> Result<&Tensor, ShapeError> {
        self.vars
            .get(name)
            .ok_or_else(|| ShapeError::UnknownVariable(name.to_string()))
    }

    pub fn get_d2(&self, name: &str) -> Result<&Array2<f32>, ShapeError> {
        self.get(name)?.as_d2()
    }

    pub fn get_d4(&self, name: &str) -> Result<&Array4<f32>, ShapeError> {
        self.get(name)?.as_d4()
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor) {
        self.vars.insert(name.into(), tensor);
    }
}

/// Elementwise binary op on two `[N, D]` tensors, broadcasting size-1 axes
/// following numpy/ndarray rules.
pub fn broadcast_binary(
    a: &Array2<f32>,
    b: &Array2<f32>,
    f: impl Fn(f32, f32) -> f32,
) -> Result<Array2<f32>, ShapeError> {
    let shape = broadcast_shape(a.dim(), b.dim())?;
    let av = a
        .broadcast(shape)
        .ok_or_else(|| mismatch(a.dim(), b.dim()))?;
    let bv = b
        .broadcast(shape)
        .ok_or_else(|| mismatch(a.dim(), b.dim()))?;
    Ok(Zip::from(&av).and(&bv).map_collect(|&x, &y| f(x, y)))
}

/// `where(c,t,f) = c*t + (1-c)*f`, broadcasting all three operands to a
/// common shape.
pub fn broadcast_where(
    c: &Array2<f32>,
    t: &Array2<f32>,
    f: &Array2<f32>,
) -> Result<Array2<f32>, ShapeError> {
    let rows = c.dim().0.max(t.dim().0).max(f.dim().0);
    let cols = c.dim().1.max(t.dim().1).max(f.dim().1);
    let shape = (rows, cols);
    let cv = c.broadcast(shape).ok_or_else(|| mismatch(c.dim(), t.dim()))?;
    let tv = t.broadcast(shape).ok_or_else(|| mismatch(t.dim(), f.dim()))?;
    let fv = f.broadcast(shape).ok_or_else(|| mismatch(c.dim(), f.dim()))?;
    Ok(Zip::from(&cv)
        .and(&tv)
        .and(&fv)
        .map_collect(|&cc, &tt, &ff| cc * tt + (1.0 - cc) * ff))
}

fn broadcast_shape(a: (usize, usize), b: (usize, usize)) -> Result<(usize, usize), ShapeError> {
    let rows_ok = a.0 == b.0 || a.0 == 1 || b.0 == 1;
    let cols_ok = a.1 == b.1 || a.1 == 1 || b.1 == 1;
    if rows_ok && cols_ok {
        Ok((a.0.max(b.0), a.1.max(b.1)))
    } else {
        Err(mismatch(a, b))
    }
}

fn mismatch(a: (usize, usize), b: (usize, usize)) -> ShapeError {
    ShapeError::BroadcastMismatch { left: vec![a.0, a.1], right: vec![b.0, b.1] }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn broadcasts_column_against_scalar() {
        let col = array![[1.0_f32], [2.0], [3.0]];
        let scalar = array![[10.0_f32]];
        let out = broadcast_binary(&col, &scalar, |a, b| a + b).unwrap();
        assert_eq!(out, array![[11.0_f32], [12.0], [13.0]]);
    }

    #[test]
    fn incompatible_shapes_error() {
        let a = array![[1.0_f32, 2.0], [3.0, 4.0]];
        let b = array![[1.0_f32, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        assert!(broadcast_binary(&a, &b, |x, y| x + y).is_err());
    }
}
