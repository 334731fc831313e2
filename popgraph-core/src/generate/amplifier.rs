//! Three-tier strong amplifiers and suppressors of selection.
//!
//! Both families partition the population into core, middle and leaf tiers
//! whose sizes are polynomials in a unit parameter `u`; the unit is chosen as
//! the largest one whose population fits the requested size.

use rand::RngCore;

use super::GenerationFailure;
use crate::{descriptor::GeometryDescriptor, store::AdjacencyStore};

const MIN_AMPLIFIER_UNIT: usize = 3;
const MIN_SUPPRESSOR_UNIT: usize = 2;

fn amplifier_size(unit: usize) -> usize {
    unit.pow(3) + 2 * unit.pow(2)
}

fn suppressor_size(unit: usize) -> usize {
    unit.pow(4) + unit.pow(3) + unit.pow(2)
}

fn largest_unit(size: usize, min: usize, formula: fn(usize) -> usize) -> usize {
    let mut unit = min;
    while formula(unit + 1) <= size {
        unit += 1;
    }
    unit
}

/// Unit parameter of an amplifier whose size has already been resolved.
fn amplifier_unit(size: usize) -> usize {
    largest_unit(size, MIN_AMPLIFIER_UNIT, amplifier_size)
}

fn suppressor_unit(size: usize) -> usize {
    largest_unit(size, MIN_SUPPRESSOR_UNIT, suppressor_size)
}

pub(super) fn feasible_amplifier(descriptor: &mut GeometryDescriptor) {
    let unit = amplifier_unit(descriptor.size);
    let size = amplifier_size(unit);
    let edges = 2 * unit.pow(3) + unit.pow(2) * (unit / 2);
    descriptor.size = size;
    descriptor.connectivity = 2.0 * edges as f64 / size as f64;
    descriptor.directed = false;
    descriptor.regular = false;
}

/// Core `[0, u²)`, middle `[u², 2u²)` and leaves `[2u², u³ + 2u²)`.
///
/// Leaf `i` attaches to middle `⌊i/u⌋`, middle `j` attaches to the `u` core
/// nodes starting at `j·u (mod u²)` and the core is a circulant graph linking
/// each node to its `⌊u/2⌋` successors.
pub(super) fn generate_amplifier(
    descriptor: &GeometryDescriptor,
    store: &mut AdjacencyStore,
    _rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let unit = amplifier_unit(descriptor.size);
    let core = unit * unit;
    let middle = core;
    let leaves = 2 * core;
    for leaf in 0..unit.pow(3) {
        store.add_edge(leaves + leaf, middle + leaf / unit);
    }
    for j in 0..core {
        for t in 0..unit {
            store.add_edge(middle + j, (j * unit + t) % core);
        }
    }
    for c in 0..core {
        for step in 1..=unit / 2 {
            store.add_edge(c, (c + step) % core);
        }
    }
    Ok(())
}

pub(super) fn feasible_suppressor(descriptor: &mut GeometryDescriptor) {
    let unit = suppressor_unit(descriptor.size);
    let size = suppressor_size(unit);
    let core = unit * unit;
    let edges = core * (core - 1) / 2 + unit.pow(3) + unit.pow(5);
    descriptor.size = size;
    descriptor.connectivity = 2.0 * edges as f64 / size as f64;
    descriptor.directed = false;
    descriptor.regular = false;
}

/// Core clique of `u²` nodes; `u²` middle blocks of `u` nodes and `u²` leaf
/// blocks of `u²` nodes. Core `c` links to all of middle block `c`, and every
/// leaf of block `b` links to all of middle block `b`.
pub(super) fn generate_suppressor(
    descriptor: &GeometryDescriptor,
    store: &mut AdjacencyStore,
    _rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let unit = suppressor_unit(descriptor.size);
    let core = unit * unit;
    let middle = core;
    let leaves = core + unit.pow(3);
    for a in 0..core {
        for b in (a + 1)..core {
            store.add_edge(a, b);
        }
    }
    for block in 0..core {
        let middle_block = middle + block * unit;
        for m in middle_block..middle_block + unit {
            store.add_edge(block, m);
            let leaf_block = leaves + block * core;
            for leaf in leaf_block..leaf_block + core {
                store.add_edge(leaf, m);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Family;
    use rand::{SeedableRng, rngs::SmallRng};
    use rstest::rstest;

    fn run(family: Family, size: usize) -> (GeometryDescriptor, AdjacencyStore) {
        let mut descriptor = GeometryDescriptor::new(family).with_size(size);
        let ops = super::super::ops(family);
        (ops.feasible)(&mut descriptor);
        let mut store = AdjacencyStore::new(descriptor.size());
        let mut rng = SmallRng::seed_from_u64(11);
        (ops.generate)(&descriptor, &mut store, &mut rng).expect("deterministic family");
        (descriptor, store)
    }

    #[rstest]
    #[case(Family::StrongAmplifier, 1, 45)]
    #[case(Family::StrongAmplifier, 100, 96)]
    #[case(Family::StrongAmplifier, 200, 175)]
    #[case(Family::StrongSuppressor, 1, 28)]
    #[case(Family::StrongSuppressor, 200, 117)]
    fn sizes_follow_unit_polynomials(
        #[case] family: Family,
        #[case] requested: usize,
        #[case] size: usize,
    ) {
        let (descriptor, store) = run(family, requested);
        assert_eq!(descriptor.size(), size);
        assert!(store.is_connected());
        assert!(store.is_symmetric());
        assert!((store.stats().avg_total - descriptor.connectivity()).abs() < 1e-9);
    }

    #[test]
    fn amplifier_leaves_have_degree_one() {
        let (_, store) = run(Family::StrongAmplifier, 45);
        assert!((18..45).all(|leaf| store.out_degree(leaf) == 1));
    }
}
