//! # Spatial Grid Engine (C5)
//!
//! The fixed-capacity uniform grid backing the three stencil-based
//! interaction ops: particle->cell assignment (`scatter`), padded
//! torus-wrapped neighborhood reduction (`stencil`), and particle re-gather
//! (`gather`). Reduces O(N^2) neighbor interactions to near-linear cost by
//! bucketing agents into `[H, W]` cells of capacity `C` and only pairing
//! agents within `range` cells of each other.
//!
//! Grid intermediates are rebuilt every step and never persist across
//! steps; only the slot map from the most recent `scatter` survives long
//! enough to be consumed by the matching `gather`.

use crate::ir::GridConfig;
use ndarray::{Array1, Array2, Array4, ArrayView1};
use std::collections::HashMap;

/// Per-agent cell/slot assignment recorded by [`scatter`]; `None` means the
/// agent's cell was already at capacity and it was dropped for this step.
/// `occupancy` records, per cell, how many of its `capacity` slots are real
/// agents -- `stencil` uses it to skip contributions from empty padding
/// slots rather than treating their zeroed value as a real neighbor.
/// `cell_to_agent` is the reverse of `slots`, letting a stencil kernel
/// recover which agent occupies a given `(cy,cx,slot)` it is evaluating.
#[derive(Debug, Clone)]
pub struct ScatterIndex {
    pub slots: Vec<Option<(usize, usize, usize)>>,
    pub occupancy: Array2<usize>,
    pub cell_to_agent: HashMap<(usize, usize, usize), usize>,
}

/// Capacity-overflow counter for one step's grid pass. Not an error: a full
/// cell silently drops the excess agent, and this is the caller's only
/// visibility into how often that happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridStats {
    pub dropped: usize,
}

/// `[N,D] -> [H,W,C,D]`. Cell index is clamped into range; the caller is
/// responsible for normalizing `x`/`y` into grid-local coordinates (the
/// origin is implicit). Particles beyond a cell's capacity are dropped in
/// agent-iteration order -- the documented, deterministic overflow policy.
pub fn scatter(
    value: &Array2<f32>,
    x: &Array2<f32>,
    y: &Array2<f32>,
    config: &GridConfig,
) -> (Array4<f32>, ScatterIndex, usize) {
    let n = value.nrows();
    let d = value.ncols();
    let mut grid = Array4::<f32>::zeros((config.height, config.width, config.capacity, d));
    let mut counters = Array2::<usize>::zeros((config.height, config.width));
    let mut slots = Vec::with_capacity(n);
    let mut cell_to_agent = HashMap::with_capacity(n);
    let mut dropped = 0usize;

    for i in 0..n {
        let cx = cell_index(x[[i, 0]], config.cell_size[0], config.width);
        let cy = cell_index(y[[i, 0]], config.cell_size[1], config.height);
        let slot = counters[[cy, cx]];
        if slot < config.capacity {
            for k in 0..d {
                grid[[cy, cx, slot, k]] = value[[i, k]];
            }
            counters[[cy, cx]] += 1;
            slots.push(Some((cy, cx, slot)));
            cell_to_agent.insert((cy, cx, slot), i);
        } else {
            dropped += 1;
            slots.push(None);
        }
    }

    (grid, ScatterIndex { slots, occupancy: counters, cell_to_agent }, dropped)
}

fn cell_index(coord: f32, cell_size: f32, count: usize) -> usize {
    let raw = (coord / cell_size).floor() as isize;
    raw.clamp(0, count as isize - 1) as usize
}

/// `[H,W,C,D] -> [H,W,C,D]`. Builds a torus-padded `[H+2R,W+2R,C,D]` ghost
/// border, then for each lexically-ordered offset `(dy,dx)` in
/// `[-R..=R]^2` accumulates `kernel(center, neighbor)` into every center
/// slot from every neighbor slot in that shifted cell, skipping the
/// `(dy=dx=0, c=c')` self-pair and any neighbor slot beyond that cell's
/// recorded `occupancy` (an empty slot is padding, not a zero-valued
/// agent). Neighbor-slot iteration is ascending, so the accumulation order
/// -- and therefore floating-point results -- is fixed. Only occupied
/// center slots are visited, so `kernel` is never invoked for a center
/// that isn't a real agent. Each value is paired with its unpadded,
/// torus-wrapped `(y, x, slot)` cell address so the caller can recover
/// which agent it belongs to.
pub fn stencil(
    grid: &Array4<f32>,
    occupancy: &Array2<usize>,
    range: usize,
    kernel: impl Fn(
        (usize, usize, usize),
        ArrayView1<f32>,
        (usize, usize, usize),
        ArrayView1<f32>,
    ) -> Array1<f32>,
) -> Array4<f32> {
    let (h, w, c, d) = grid.dim();
    let r = range;
    let padded = build_torus_padding(grid, r);
    let padded_occupancy = build_torus_padding_2d(occupancy, r);

    let mut out = Array4::<f32>::zeros((h, w, c, d));

    for dy in -(r as isize)..=(r as isize) {
        for dx in -(r as isize)..=(r as isize) {
            for y in 0..h {
                for x in 0..w {
                    let py = (y as isize + r as isize + dy) as usize;
                    let px = (x as isize + r as isize + dx) as usize;
                    let live = padded_occupancy[[py, px]];
                    let sy = (y as isize + dy).rem_euclid(h as isize) as usize;
                    let sx = (x as isize + dx).rem_euclid(w as isize) as usize;
                    for center_slot in 0..occupancy[[y, x]] {
                        let center = grid.slice(ndarray::s![y, x, center_slot, ..]);
                        for neighbor_slot in 0..live {
                            if dy == 0 && dx == 0 && center_slot == neighbor_slot {
                                continue;
                            }
                            let neighbor = padded.slice(ndarray::s![py, px, neighbor_slot, ..]);
                            let contribution = kernel(
                                (y, x, center_slot),
                                center,
                                (sy, sx, neighbor_slot),
                                neighbor,
                            );
                            let mut dest = out.slice_mut(ndarray::s![y, x, center_slot, ..]);
                            dest += &contribution;
                        }
                    }
                }
            }
        }
    }

    out
}

fn build_torus_padding(grid: &Array4<f32>, r: usize) -> Array4<f32> {
    let (h, w, c, d) = grid.dim();
    let mut padded = Array4::<f32>::zeros((h + 2 * r, w + 2 * r, c, d));
    for py in 0..h + 2 * r {
        let sy = (py as isize - r as isize).rem_euclid(h as isize) as usize;
        for px in 0..w + 2 * r {
            let sx = (px as isize - r as isize).rem_euclid(w as isize) as usize;
            let src = grid.slice(ndarray::s![sy, sx, .., ..]);
            padded.slice_mut(ndarray::s![py, px, .., ..]).assign(&src);
        }
    }
    padded
}

fn build_torus_padding_2d(grid: &Array2<usize>, r: usize) -> Array2<usize> {
    let (h, w) = grid.dim();
    let mut padded = Array2::<usize>::zeros((h + 2 * r, w + 2 * r));
    for py in 0..h + 2 * r {
        let sy = (py as isize - r as isize).rem_euclid(h as isize) as usize;
        for px in 0..w + 2 * r {
            let sx = (px as isize - r as isize).rem_euclid(w as isize) as usize;
            padded[[py, px]] = grid[[sy, sx]];
        }
    }
    padded
}

/// `[H,W,C,D] -> [N,D]`. Reverses the slot map recorded by the last
/// `scatter`; agents dropped at scatter time read back zeros.
pub fn gather(grid: &Array4<f32>, index: &ScatterIndex) -> Array2<f32> {
    let d = grid.dim().3;
    let n = index.slots.len();
    let mut out = Array2::<f32>::zeros((n, d));
    for (i, slot) in index.slots.iter().enumerate() {
        if let Some((cy, cx, s)) = slot {
            for k in 0..d {
                out[[i, k]] = grid[[*cy, *cx, *s, k]];
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn config(w: usize, h: usize, capacity: usize) -> GridConfig {
        GridConfig { width: w, height: h, capacity, cell_size: [1.0, 1.0] }
    }

    #[test]
    fn round_trip_identity_with_no_stencil() {
        let value = array![[1.0_f32], [2.0], [3.0]];
        let x = array![[0.5_f32], [1.5], [2.5]];
        let y = array![[0.5_f32], [0.5], [0.5]];
        let cfg = config(4, 4, 4);
        let (grid, index, dropped) = scatter(&value, &x, &y, &cfg);
        assert_eq!(dropped, 0);
        let out = gather(&grid, &index);
        assert_eq!(out, value);
    }

    #[test]
    fn overflow_beyond_capacity_is_dropped_and_reads_zero() {
        let value = array![[1.0_f32], [2.0], [3.0]];
        let x = array![[0.5_f32], [0.5], [0.5]];
        let y = array![[0.5_f32], [0.5], [0.5]];
        let cfg = config(2, 2, 2);
        let (_grid, index, dropped) = scatter(&value, &x, &y, &cfg);
        assert_eq!(dropped, 1);
        assert!(index.slots[2].is_none());
        let gathered = gather(&Array4::<f32>::zeros((2, 2, 2, 1)), &index);
        assert_eq!(gathered[[2, 0]], 0.0);
    }

    #[test]
    fn stencil_symmetry_sums_to_zero() {
        // 2 particles in a torus, k(c,n) = n - c: Newton's-third-law-style
        // pairwise sum should cancel to zero.
        let value = array![[1.0_f32], [5.0]];
        let x = array![[0.5_f32], [1.5]];
        let y = array![[0.5_f32], [0.5]];
        let cfg = config(2, 1, 2);
        let (grid, index, _) = scatter(&value, &x, &y, &cfg);
        let stenciled = stencil(&grid, &index.occupancy, 1, |_c, center, _n, neighbor| &neighbor - &center);
        let out = gather(&stenciled, &index);
        let total: f32 = out.sum();
        assert!(total.abs() < 1e-4, "expected ~0, got {total}");
    }

    #[test]
    fn empty_neighbor_slots_do_not_contribute() {
        // A single particle alone in a torus: every neighbor cell is empty,
        // so a stencil that would otherwise amplify a center-only kernel
        // must contribute nothing at all.
        let value = array![[7.0_f32]];
        let x = array![[0.5_f32]];
        let y = array![[0.5_f32]];
        let cfg = config(4, 4, 4);
        let (grid, index, _) = scatter(&value, &x, &y, &cfg);
        let stenciled = stencil(&grid, &index.occupancy, 1, |_c, center, _n, _neighbor| center.to_owned());
        let out = gather(&stenciled, &index);
        assert_eq!(out[[0, 0]], 0.0);
    }
}
