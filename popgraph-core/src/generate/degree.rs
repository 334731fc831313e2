//! Degree-constrained random graphs built with the configuration model.
//!
//! Construction starts from a spanning tree so the result is connected,
//! then pairs the remaining degree stubs at random. Stubs that would form a
//! self-loop or a duplicate link are resolved by swapping with a random
//! existing edge. Termination is only bounded empirically: an attempt that
//! gets stuck reports a [`GenerationFailure`] and the caller retries.

use std::iter;

use rand::{
    Rng, RngCore,
    distributions::{Distribution, WeightedIndex},
    seq::SliceRandom,
};

use super::GenerationFailure;
use crate::{descriptor::GeometryDescriptor, store::AdjacencyStore};

const MIN_SIZE: usize = 3;
const MIN_DEGREE: f64 = 2.0;
const SWAP_DRAWS_PER_NODE: usize = 16;
const ADJUST_DRAWS_PER_NODE: usize = 256;
const DEFAULT_EXPONENT: f64 = 2.5;

pub(super) fn feasible_regular(descriptor: &mut GeometryDescriptor) {
    let size = descriptor.size.max(MIN_SIZE);
    let mut k = (descriptor.connectivity.round().max(0.0) as usize).clamp(2, size - 1);
    if (k * size) % 2 == 1 {
        if k < size - 1 {
            k += 1;
        } else {
            k -= 1;
        }
    }
    descriptor.size = size;
    descriptor.connectivity = k as f64;
    descriptor.directed = false;
    descriptor.regular = true;
}

pub(super) fn generate_regular(
    descriptor: &GeometryDescriptor,
    store: &mut AdjacencyStore,
    rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let k = descriptor.connectivity as usize;
    // stub pairing cannot close the last free pairs of a near-complete graph
    if k + 1 >= descriptor.size {
        return super::generate_complete(descriptor, store, rng);
    }
    let degrees = vec![k; descriptor.size];
    configuration(&degrees, store, rng)
}

/// Total number of stubs of a scale-free graph: `k·N` rounded to an even
/// count that a simple graph on `size` nodes can hold.
fn stub_total(connectivity: f64, size: usize) -> usize {
    let mut total = (connectivity * size as f64).round() as usize;
    if total % 2 == 1 {
        if total < size * (size - 1) {
            total += 1;
        } else {
            total -= 1;
        }
    }
    total
}

pub(super) fn feasible_power_law(descriptor: &mut GeometryDescriptor) {
    let size = descriptor.size.max(MIN_SIZE);
    let k = descriptor.connectivity.clamp(MIN_DEGREE, (size - 1) as f64);
    if descriptor.params.exponent <= 1.0 || !descriptor.params.exponent.is_finite() {
        descriptor.params.exponent = DEFAULT_EXPONENT;
    }
    descriptor.size = size;
    descriptor.connectivity = stub_total(k, size) as f64 / size as f64;
    descriptor.directed = false;
    descriptor.regular = false;
}

pub(super) fn generate_power_law(
    descriptor: &GeometryDescriptor,
    store: &mut AdjacencyStore,
    rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let total = stub_total(descriptor.connectivity, descriptor.size);
    let degrees = power_law_sequence(descriptor.size, total, descriptor.params.exponent, rng)?;
    configuration(&degrees, store, rng)
}

/// Samples `size` degrees with `P(k) ∝ k^-exponent`, rescales them to the
/// requested mean and nudges single nodes until the degrees sum to `total`.
///
/// Degrees are capped at the structural cut-off `√(total)` (but never below
/// the mean) so that hubs remain realisable in a simple graph.
fn power_law_sequence(
    size: usize,
    total: usize,
    exponent: f64,
    rng: &mut dyn RngCore,
) -> Result<Vec<usize>, GenerationFailure> {
    let mean = total as f64 / size as f64;
    let cap = ((total as f64).sqrt().ceil() as usize)
        .max(mean.ceil() as usize + 1)
        .min(size - 1);
    let weights: Vec<f64> = (1..=cap).map(|d| (d as f64).powf(-exponent)).collect();
    let distribution = WeightedIndex::new(&weights)
        .map_err(|_| GenerationFailure::new("degenerate degree distribution"))?;
    let mut degrees: Vec<usize> = (0..size).map(|_| distribution.sample(rng) + 1).collect();
    let sampled: usize = degrees.iter().sum();
    let scale = total as f64 / sampled as f64;
    for degree in &mut degrees {
        *degree = ((*degree as f64 * scale).round() as usize).clamp(1, cap);
    }
    let mut sum: usize = degrees.iter().sum();
    let mut draws = 0;
    while sum != total {
        draws += 1;
        if draws > ADJUST_DRAWS_PER_NODE * size {
            return Err(GenerationFailure::new("degree sequence could not be balanced"));
        }
        let node = rng.gen_range(0..size);
        if sum < total && degrees[node] < cap {
            degrees[node] += 1;
            sum += 1;
        } else if sum > total && degrees[node] > 1 {
            degrees[node] -= 1;
            sum -= 1;
        }
    }
    Ok(degrees)
}

/// Realises `degrees` as a connected simple graph.
pub(crate) fn configuration(
    degrees: &[usize],
    store: &mut AdjacencyStore,
    rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let size = degrees.len();
    if size == 0 {
        return Ok(());
    }
    if degrees.iter().any(|&d| d == 0 || d >= size) {
        return Err(GenerationFailure::new("degree outside [1, N)"));
    }
    let mut residual = degrees.to_vec();
    spanning_tree(degrees, &mut residual, store, rng)?;

    let mut stubs: Vec<usize> = residual
        .iter()
        .enumerate()
        .flat_map(|(node, &count)| iter::repeat_n(node, count))
        .collect();
    if stubs.len() % 2 == 1 {
        return Err(GenerationFailure::new("odd number of degree stubs"));
    }
    stubs.shuffle(rng);
    let mut stuck = Vec::new();
    for pair in stubs.chunks_exact(2) {
        let (a, b) = (pair[0], pair[1]);
        if a != b && !store.contains_link(a, b) {
            store.add_edge(a, b);
        } else {
            stuck.push((a, b));
        }
    }
    for (u, v) in stuck {
        resolve_stuck_pair(store, u, v, rng)?;
    }
    if store.is_connected() {
        Ok(())
    } else {
        Err(GenerationFailure::new("configuration model left the graph disconnected"))
    }
}

/// Attaches nodes in descending degree order, each to a random connected
/// node that still has free stubs.
fn spanning_tree(
    degrees: &[usize],
    residual: &mut [usize],
    store: &mut AdjacencyStore,
    rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let mut order: Vec<usize> = (0..degrees.len()).collect();
    order.shuffle(rng);
    order.sort_by(|&a, &b| degrees[b].cmp(&degrees[a]));
    let mut open = vec![order[0]];
    for &node in &order[1..] {
        if open.is_empty() {
            return Err(GenerationFailure::new("spanning tree ran out of stubs"));
        }
        let slot = rng.gen_range(0..open.len());
        let anchor = open[slot];
        store.add_edge(node, anchor);
        residual[anchor] -= 1;
        residual[node] -= 1;
        if residual[anchor] == 0 {
            open.swap_remove(slot);
        }
        if residual[node] > 0 {
            open.push(node);
        }
    }
    Ok(())
}

/// Places the stub pair `(u, v)` by exchanging it with a random edge `x–y`:
/// `x–y` is replaced by `u–x` and `v–y`, which keeps every degree intact.
fn resolve_stuck_pair(
    store: &mut AdjacencyStore,
    u: usize,
    v: usize,
    rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let size = store.len();
    for _ in 0..SWAP_DRAWS_PER_NODE * size {
        let x = rng.gen_range(0..size);
        let neighbours = store.out_neighbours(x);
        if neighbours.is_empty() {
            continue;
        }
        let y = neighbours[rng.gen_range(0..neighbours.len())];
        if [u, v].contains(&x) || [u, v].contains(&y) {
            continue;
        }
        if store.contains_link(u, x) || store.contains_link(v, y) {
            continue;
        }
        store.remove_edge(x, y);
        store.add_edge(u, x);
        store.add_edge(v, y);
        return Ok(());
    }
    Err(GenerationFailure::new("stuck stub pair could not be placed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Family;
    use proptest::prelude::*;
    use rand::{SeedableRng, rngs::SmallRng};
    use rstest::rstest;

    #[rstest]
    #[case(3.0, 21, 4.0)]
    #[case(3.0, 20, 3.0)]
    #[case(40.0, 10, 9.0)]
    #[case(0.0, 10, 2.0)]
    fn regular_degree_is_parity_corrected(
        #[case] requested: f64,
        #[case] size: usize,
        #[case] resolved: f64,
    ) {
        let mut descriptor = GeometryDescriptor::new(Family::RandomRegular)
            .with_size(size)
            .with_connectivity(requested);
        feasible_regular(&mut descriptor);
        assert_eq!(descriptor.connectivity(), resolved);
    }

    #[rstest]
    #[case(5, 5)]
    #[case(6, 6)]
    #[case(8, 8)]
    #[case(12, 12)]
    fn complete_degree_regular_graphs_do_not_fall_back(#[case] k: usize, #[case] size: usize) {
        for seed in 0..10 {
            let mut descriptor = GeometryDescriptor::new(Family::RandomRegular)
                .with_size(size)
                .with_connectivity(k as f64);
            feasible_regular(&mut descriptor);
            let resolved = descriptor.connectivity() as usize;
            assert_eq!(resolved, size - 1);
            let mut store = AdjacencyStore::new(descriptor.size());
            store.set_undirected(true);
            let mut rng = SmallRng::seed_from_u64(seed);
            let report = crate::generate::populate(&mut descriptor, &mut store, &mut rng);
            assert!(!report.fell_back, "g{k} on {size} nodes fell back");
            assert_eq!(report.attempts, 1);
            assert!((0..size).all(|node| store.out_degree(node) == resolved));
        }
    }

    #[test]
    fn stub_total_is_even() {
        assert_eq!(stub_total(2.5, 11), 28);
        assert_eq!(stub_total(4.0, 500), 2000);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn random_regular_graphs_are_simple_and_regular(
            k in 3_usize..6,
            size in 20_usize..60,
            seed in any::<u64>(),
        ) {
            prop_assume!((k * size) % 2 == 0);
            let degrees = vec![k; size];
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut built = None;
            for _ in 0..super::super::MAX_ATTEMPTS {
                let mut store = AdjacencyStore::new(size);
                if configuration(&degrees, &mut store, &mut rng).is_ok() {
                    built = Some(store);
                    break;
                }
            }
            let store = built.expect("regular graph within the retry budget");
            prop_assert!((0..size).all(|node| store.out_degree(node) == k));
            prop_assert!(store.is_symmetric());
            prop_assert!(store.is_connected());
        }
    }

    #[test]
    fn power_law_sequence_hits_total() {
        let mut rng = SmallRng::seed_from_u64(99);
        let degrees = power_law_sequence(500, 2000, 2.5, &mut rng).expect("sequence");
        assert_eq!(degrees.iter().sum::<usize>(), 2000);
        assert!(degrees.iter().all(|&d| (1..500).contains(&d)));
    }
}
