//! Hierarchical demes.
//!
//! A hierarchy is a tree of units: the top level holds `levels[0]` units,
//! each of which holds `levels[1]` sub-units, and so on down to leaf groups
//! that are either complete graphs or von Neumann square lattices. Within
//! every parent unit the representative (first node) of each child unit is
//! linked to the representatives of its siblings.

use rand::RngCore;

use super::{GenerationFailure, integer_root, lattice::fill_square_block};
use crate::{
    descriptor::{Boundary, GeometryDescriptor, HierarchyLeaf},
    store::AdjacencyStore,
};

const MIN_COMPLETE_LEAF: usize = 2;
const MIN_SQUARE_SIDE: usize = 3;

pub(super) fn feasible(descriptor: &mut GeometryDescriptor) {
    let levels: Vec<usize> = descriptor
        .params
        .hierarchy
        .iter()
        .copied()
        .filter(|&units| units > 1)
        .collect();
    let units: usize = levels.iter().product();
    let requested_leaf = (descriptor.size as f64 / units as f64).round() as usize;
    let leaf = match descriptor.params.hierarchy_leaf {
        HierarchyLeaf::Complete => requested_leaf.max(MIN_COMPLETE_LEAF),
        HierarchyLeaf::Square => {
            let side = integer_root(requested_leaf, 2, true).max(MIN_SQUARE_SIDE);
            side * side
        }
    };
    let size = units * leaf;
    let edges = edge_count(&levels, leaf, descriptor.params.hierarchy_leaf, descriptor.boundary);
    descriptor.regular = levels.is_empty()
        && (descriptor.params.hierarchy_leaf == HierarchyLeaf::Complete
            || descriptor.boundary == Boundary::Periodic);
    descriptor.params.hierarchy = levels;
    descriptor.size = size;
    descriptor.connectivity = 2.0 * edges as f64 / size as f64;
    descriptor.directed = false;
}

fn edge_count(levels: &[usize], leaf: usize, kind: HierarchyLeaf, boundary: Boundary) -> usize {
    let mut parents = 1;
    let mut bridges = 0;
    for &units in levels {
        bridges += parents * units * (units - 1) / 2;
        parents *= units;
    }
    let per_leaf = match kind {
        HierarchyLeaf::Complete => leaf * (leaf - 1) / 2,
        HierarchyLeaf::Square => {
            let side = integer_root(leaf, 2, true);
            match boundary {
                Boundary::Periodic => 2 * leaf,
                Boundary::Fixed => 2 * side * (side - 1),
            }
        }
    };
    bridges + parents * per_leaf
}

/// Number of nodes in a leaf group of `descriptor`.
pub(crate) fn leaf_size(descriptor: &GeometryDescriptor) -> usize {
    let units: usize = descriptor.params.hierarchy.iter().product();
    descriptor.size / units.max(1)
}

pub(super) fn generate(
    descriptor: &GeometryDescriptor,
    store: &mut AdjacencyStore,
    _rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let leaf = Leaf {
        size: leaf_size(descriptor),
        kind: descriptor.params.hierarchy_leaf,
        boundary: descriptor.boundary,
    };
    fill_unit(store, &descriptor.params.hierarchy, leaf, 0);
    Ok(())
}

#[derive(Clone, Copy)]
struct Leaf {
    size: usize,
    kind: HierarchyLeaf,
    boundary: Boundary,
}

/// Builds the unit rooted at `offset` and returns its representative.
fn fill_unit(store: &mut AdjacencyStore, levels: &[usize], leaf: Leaf, offset: usize) -> usize {
    let Some((&units, rest)) = levels.split_first() else {
        match leaf.kind {
            HierarchyLeaf::Complete => {
                for a in offset..offset + leaf.size {
                    for b in (a + 1)..offset + leaf.size {
                        store.add_edge(a, b);
                    }
                }
            }
            HierarchyLeaf::Square => {
                let side = integer_root(leaf.size, 2, true);
                fill_square_block(store, side, leaf.boundary, offset);
            }
        }
        return offset;
    };
    let child_size = rest.iter().product::<usize>() * leaf.size;
    let representatives: Vec<usize> = (0..units)
        .map(|child| fill_unit(store, rest, leaf, offset + child * child_size))
        .collect();
    for (i, &a) in representatives.iter().enumerate() {
        for &b in &representatives[i + 1..] {
            store.add_edge(a, b);
        }
    }
    offset
}

/// Number of levels that must be climbed before `a` and `b` share a unit:
/// `0` within the same leaf group and `levels.len()` across top-level units.
pub(crate) fn level_between(descriptor: &GeometryDescriptor, a: usize, b: usize) -> usize {
    let levels = &descriptor.params.hierarchy;
    let leaf = leaf_size(descriptor).max(1);
    let mut unit = descriptor.size.max(1);
    for (depth, &units) in levels.iter().enumerate() {
        unit /= units;
        if a / unit != b / unit {
            return levels.len() - depth;
        }
    }
    debug_assert_eq!(unit, leaf);
    0
}
