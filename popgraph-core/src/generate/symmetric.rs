//! Hand-coded symmetric graphs of fixed size.
//!
//! Most are described in LCF notation: a Hamiltonian cycle `0..n` plus one
//! chord per node given as a signed jump. Tietze and the icosahedron have
//! no compact LCF form and are listed explicitly.

use rand::RngCore;

use super::GenerationFailure;
use crate::{
    descriptor::{Family, GeometryDescriptor},
    store::AdjacencyStore,
};

const FRUCHT: [isize; 12] = [-5, -2, -4, 2, 5, -2, 2, 5, -2, -5, 4, 2];
const FRANKLIN: [isize; 2] = [5, -5];
const HEAWOOD: [isize; 2] = [5, -5];
const DODECAHEDRON: [isize; 10] = [10, 7, 4, -4, -7, 10, -4, 7, -7, 4];
const DESARGUES: [isize; 4] = [5, -5, 9, -9];

const TIETZE: [(usize, usize); 18] = [
    (0, 10),
    (10, 11),
    (11, 0),
    (0, 1),
    (10, 4),
    (11, 5),
    (1, 2),
    (2, 3),
    (3, 4),
    (1, 6),
    (2, 7),
    (3, 8),
    (4, 9),
    (5, 7),
    (7, 9),
    (9, 6),
    (6, 8),
    (8, 5),
];

/// Fixed population size and degree of a hand-coded family.
pub(crate) const fn shape(family: Family) -> (usize, usize) {
    match family {
        Family::Heawood => (14, 3),
        Family::Icosahedron => (12, 5),
        Family::Dodecahedron | Family::Desargues => (20, 3),
        _ => (12, 3),
    }
}

pub(super) fn feasible(descriptor: &mut GeometryDescriptor) {
    let (size, degree) = shape(descriptor.family);
    descriptor.size = size;
    descriptor.connectivity = degree as f64;
    descriptor.directed = false;
    descriptor.regular = true;
}

pub(super) fn generate(
    descriptor: &GeometryDescriptor,
    store: &mut AdjacencyStore,
    _rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let size = descriptor.size;
    match descriptor.family {
        Family::Frucht => lcf(store, size, &FRUCHT),
        Family::Franklin => lcf(store, size, &FRANKLIN),
        Family::Heawood => lcf(store, size, &HEAWOOD),
        Family::Dodecahedron => lcf(store, size, &DODECAHEDRON),
        Family::Desargues => lcf(store, size, &DESARGUES),
        Family::Tietze => {
            for (a, b) in TIETZE {
                store.add_edge(a, b);
            }
        }
        Family::Icosahedron => icosahedron(store),
        _ => return Err(GenerationFailure::new("not a hand-coded family")),
    }
    Ok(())
}

fn lcf(store: &mut AdjacencyStore, size: usize, jumps: &[isize]) {
    let n = size as isize;
    for node in 0..size {
        store.add_edge(node, (node + 1) % size);
        let jump = jumps[node % jumps.len()];
        let target = (node as isize + jump).rem_euclid(n) as usize;
        store.add_edge(node, target);
    }
}

/// Apex `0`, upper pentagon `1..=5`, lower pentagon `6..=10`, apex `11`.
fn icosahedron(store: &mut AdjacencyStore) {
    for j in 0..5 {
        let upper = 1 + j;
        let upper_next = 1 + (j + 1) % 5;
        let lower = 6 + j;
        let lower_next = 6 + (j + 1) % 5;
        store.add_edge(0, upper);
        store.add_edge(upper, upper_next);
        store.add_edge(upper, lower);
        store.add_edge(upper, lower_next);
        store.add_edge(lower, lower_next);
        store.add_edge(lower, 11);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};
    use rstest::rstest;

    #[rstest]
    #[case(Family::Frucht)]
    #[case(Family::Tietze)]
    #[case(Family::Franklin)]
    #[case(Family::Heawood)]
    #[case(Family::Icosahedron)]
    #[case(Family::Dodecahedron)]
    #[case(Family::Desargues)]
    fn hand_coded_graphs_are_regular(#[case] family: Family) {
        let mut descriptor = GeometryDescriptor::new(family).with_size(1000);
        feasible(&mut descriptor);
        let (size, degree) = shape(family);
        assert_eq!(descriptor.size(), size);
        let mut store = AdjacencyStore::new(size);
        let mut rng = SmallRng::seed_from_u64(0);
        generate(&descriptor, &mut store, &mut rng).expect("hand-coded graphs never fail");
        assert!((0..size).all(|node| store.out_degree(node) == degree));
        assert!(store.is_symmetric());
        assert!(store.is_connected());
    }
}
