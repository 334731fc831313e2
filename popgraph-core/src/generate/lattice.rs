//! Regular lattices: linear, square, cubic, honeycomb and triangular.
//!
//! Neighbourhoods are enumerated in closed form from coordinate offsets.
//! Periodic boundaries wrap around; fixed boundaries drop neighbours that
//! fall outside the array, so boundary nodes end up with fewer links.

use rand::RngCore;

use super::{GenerationFailure, integer_root, nearest};
use crate::{
    descriptor::{Boundary, Family, GeometryDescriptor},
    store::AdjacencyStore,
};

const MIN_SIDE: usize = 3;
const MIN_STAGGERED_SIDE: usize = 4;

pub(super) fn feasible_linear(descriptor: &mut GeometryDescriptor) {
    let params = &mut descriptor.params;
    if params.linear_left == params.linear_right {
        let reach = params.linear_left.max(1);
        params.linear_left = reach;
        params.linear_right = reach;
    }
    let span = params.linear_left + params.linear_right;
    descriptor.size = descriptor.size.max(span + 1);
    descriptor.connectivity = span as f64;
    descriptor.directed = params.linear_left != params.linear_right;
    descriptor.regular = descriptor.boundary == Boundary::Periodic;
}

pub(super) fn generate_linear(
    descriptor: &GeometryDescriptor,
    store: &mut AdjacencyStore,
    _rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let size = descriptor.size;
    let (left, right) = descriptor.linear_span();
    for node in 0..size {
        for step in 1..=right {
            if let Some(target) = shift(node, step as isize, size, descriptor.boundary) {
                store.add_link(node, target);
            }
        }
        for step in 1..=left {
            if let Some(target) = shift(node, -(step as isize), size, descriptor.boundary) {
                store.add_link(node, target);
            }
        }
    }
    Ok(())
}

/// Admissible square neighbourhood sizes for a lattice of side `side`:
/// von Neumann (4) plus every full `(2r+1)^2 - 1` block that fits.
pub(crate) fn square_candidates(side: usize) -> Vec<usize> {
    block_candidates(4, side, 2)
}

/// Admissible cubic neighbourhood sizes for a lattice of side `side`.
pub(crate) fn cubic_candidates(side: usize) -> Vec<usize> {
    block_candidates(6, side, 3)
}

fn block_candidates(axial: usize, side: usize, dim: u32) -> Vec<usize> {
    std::iter::once(axial)
        .chain(
            (1..)
                .map(|r: usize| 2 * r + 1)
                .take_while(|&width| width <= side)
                .map(|width| width.pow(dim) - 1),
        )
        .collect()
}

pub(super) fn feasible_square(descriptor: &mut GeometryDescriptor) {
    let side = integer_root(descriptor.size, 2, true).max(MIN_SIDE);
    let k = match descriptor.family {
        Family::VonNeumann => 4,
        Family::Moore => 8,
        _ => nearest(&square_candidates(side), descriptor.connectivity).unwrap_or(4),
    };
    descriptor.size = side * side;
    descriptor.connectivity = k as f64;
    descriptor.directed = false;
    descriptor.regular = descriptor.boundary == Boundary::Periodic;
}

pub(super) fn generate_square(
    descriptor: &GeometryDescriptor,
    store: &mut AdjacencyStore,
    _rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let side = integer_root(descriptor.size, 2, true);
    let offsets = block_offsets(descriptor.connectivity as usize, 2);
    fill_offsets(store, side, 2, &offsets, descriptor.boundary, 0);
    Ok(())
}

pub(super) fn feasible_cubic(descriptor: &mut GeometryDescriptor) {
    let side = integer_root(descriptor.size, 3, true).max(MIN_SIDE);
    let k = nearest(&cubic_candidates(side), descriptor.connectivity).unwrap_or(6);
    descriptor.size = side * side * side;
    descriptor.connectivity = k as f64;
    descriptor.directed = false;
    descriptor.regular = descriptor.boundary == Boundary::Periodic;
}

pub(super) fn generate_cubic(
    descriptor: &GeometryDescriptor,
    store: &mut AdjacencyStore,
    _rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let side = integer_root(descriptor.size, 3, true);
    let offsets = block_offsets(descriptor.connectivity as usize, 3);
    fill_offsets(store, side, 3, &offsets, descriptor.boundary, 0);
    Ok(())
}

pub(super) fn feasible_honeycomb(descriptor: &mut GeometryDescriptor) {
    feasible_staggered(descriptor, 6);
}

pub(super) fn feasible_triangular(descriptor: &mut GeometryDescriptor) {
    feasible_staggered(descriptor, 3);
}

fn feasible_staggered(descriptor: &mut GeometryDescriptor, k: usize) {
    let mut side = integer_root(descriptor.size, 2, true).max(MIN_STAGGERED_SIDE);
    if side % 2 == 1 {
        side += 1;
    }
    descriptor.size = side * side;
    descriptor.connectivity = k as f64;
    descriptor.directed = false;
    descriptor.regular = descriptor.boundary == Boundary::Periodic;
}

/// Hexagonal coordination on a square array: rows are staggered so even rows
/// reach up/down to the left and odd rows to the right.
pub(super) fn generate_honeycomb(
    descriptor: &GeometryDescriptor,
    store: &mut AdjacencyStore,
    _rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let side = integer_root(descriptor.size, 2, true);
    let boundary = descriptor.boundary;
    for y in 0..side {
        let diagonal = if y % 2 == 0 { -1 } else { 1 };
        for x in 0..side {
            let node = y * side + x;
            let offsets = [(-1, 0), (1, 0), (0, -1), (0, 1), (diagonal, -1), (diagonal, 1)];
            for (dx, dy) in offsets {
                if let Some(target) = planar(x, y, dx, dy, side, boundary) {
                    store.add_link(node, target);
                }
            }
        }
    }
    Ok(())
}

/// Three-fold coordination: left and right neighbours plus one vertical link
/// whose direction alternates with the parity of `x + y`.
pub(super) fn generate_triangular(
    descriptor: &GeometryDescriptor,
    store: &mut AdjacencyStore,
    _rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let side = integer_root(descriptor.size, 2, true);
    let boundary = descriptor.boundary;
    for y in 0..side {
        for x in 0..side {
            let node = y * side + x;
            let vertical = if (x + y) % 2 == 0 { 1 } else { -1 };
            for (dx, dy) in [(-1, 0), (1, 0), (0, vertical)] {
                if let Some(target) = planar(x, y, dx, dy, side, boundary) {
                    store.add_link(node, target);
                }
            }
        }
    }
    Ok(())
}

/// Von Neumann square lattice of side `side` whose node indices start at
/// `offset`; used for hierarchy leaf groups.
pub(crate) fn fill_square_block(
    store: &mut AdjacencyStore,
    side: usize,
    boundary: Boundary,
    offset: usize,
) {
    let offsets = block_offsets(4, 2);
    fill_offsets(store, side, 2, &offsets, boundary, offset);
}

fn block_offsets(k: usize, dim: u32) -> Vec<[isize; 3]> {
    let axial = if dim == 2 { 4 } else { 6 };
    if k == axial {
        return (0..dim as usize)
            .flat_map(|axis| {
                [-1, 1].map(|sign| {
                    let mut offset = [0; 3];
                    offset[axis] = sign;
                    offset
                })
            })
            .collect();
    }
    let width = integer_root(k + 1, dim, true);
    let radius = (width / 2) as isize;
    let span = -radius..=radius;
    let depth = if dim == 3 { span.clone() } else { 0..=0 };
    let mut offsets = Vec::with_capacity(k);
    for dz in depth {
        for dy in span.clone() {
            for dx in span.clone() {
                if (dx, dy, dz) != (0, 0, 0) {
                    offsets.push([dx, dy, dz]);
                }
            }
        }
    }
    offsets
}

fn fill_offsets(
    store: &mut AdjacencyStore,
    side: usize,
    dim: u32,
    offsets: &[[isize; 3]],
    boundary: Boundary,
    base: usize,
) {
    let depth = if dim == 3 { side } else { 1 };
    for z in 0..depth {
        for y in 0..side {
            for x in 0..side {
                let node = base + (z * side + y) * side + x;
                for [dx, dy, dz] in offsets {
                    let target = shift(x, *dx, side, boundary).and_then(|tx| {
                        let ty = shift(y, *dy, side, boundary)?;
                        let tz = if dim == 3 { shift(z, *dz, side, boundary)? } else { 0 };
                        Some(base + (tz * side + ty) * side + tx)
                    });
                    if let Some(target) = target {
                        store.add_link(node, target);
                    }
                }
            }
        }
    }
}

fn planar(x: usize, y: usize, dx: isize, dy: isize, side: usize, boundary: Boundary) -> Option<usize> {
    let tx = shift(x, dx, side, boundary)?;
    let ty = shift(y, dy, side, boundary)?;
    Some(ty * side + tx)
}

fn shift(coord: usize, delta: isize, side: usize, boundary: Boundary) -> Option<usize> {
    let moved = coord as isize + delta;
    let side = side as isize;
    match boundary {
        Boundary::Periodic => Some(moved.rem_euclid(side) as usize),
        Boundary::Fixed => (0..side).contains(&moved).then_some(moved as usize),
    }
}
