//! Connected random graphs with a prescribed number of links.

use rand::{Rng, RngCore, seq::SliceRandom};

use super::GenerationFailure;
use crate::{descriptor::GeometryDescriptor, store::AdjacencyStore};

const MIN_SIZE: usize = 3;
const DRAWS_PER_LINK: usize = 64;

pub(super) fn feasible_undirected(descriptor: &mut GeometryDescriptor) {
    let size = descriptor.size.max(MIN_SIZE);
    let edges = (descriptor.connectivity * size as f64 / 2.0).round() as usize;
    let edges = edges.clamp(size - 1, size * (size - 1) / 2);
    descriptor.size = size;
    descriptor.connectivity = 2.0 * edges as f64 / size as f64;
    descriptor.directed = false;
    descriptor.regular = false;
}

/// Spanning tree grown from two pools (each unconnected node attaches to a
/// random member of the connected pool), topped up with random edges.
pub(super) fn generate_undirected(
    descriptor: &GeometryDescriptor,
    store: &mut AdjacencyStore,
    rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let size = descriptor.size;
    let target = (descriptor.connectivity * size as f64 / 2.0).round() as usize;
    let mut order: Vec<usize> = (0..size).collect();
    order.shuffle(rng);
    for joined in 1..size {
        let anchor = order[rng.gen_range(0..joined)];
        store.add_edge(order[joined], anchor);
    }
    let mut edges = size.saturating_sub(1);
    let mut draws = 0;
    let budget = DRAWS_PER_LINK * target.max(1);
    while edges < target {
        draws += 1;
        if draws > budget {
            return Err(GenerationFailure::new("random graph ran out of draws"));
        }
        let a = rng.gen_range(0..size);
        let b = rng.gen_range(0..size);
        if a != b && store.add_edge(a, b) {
            edges += 1;
        }
    }
    Ok(())
}

pub(super) fn feasible_directed(descriptor: &mut GeometryDescriptor) {
    let size = descriptor.size.max(MIN_SIZE);
    let arcs = (descriptor.connectivity * size as f64).round() as usize;
    let arcs = arcs.clamp(size, size * (size - 1));
    descriptor.size = size;
    descriptor.connectivity = arcs as f64 / size as f64;
    descriptor.directed = true;
    descriptor.regular = false;
}

/// Random directed Hamiltonian cycle (so the graph is strongly connected)
/// topped up with random arcs.
pub(super) fn generate_directed(
    descriptor: &GeometryDescriptor,
    store: &mut AdjacencyStore,
    rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let size = descriptor.size;
    let target = (descriptor.connectivity * size as f64).round() as usize;
    let mut order: Vec<usize> = (0..size).collect();
    order.shuffle(rng);
    for (i, &node) in order.iter().enumerate() {
        store.add_link(node, order[(i + 1) % size]);
    }
    let mut arcs = size;
    let mut draws = 0;
    let budget = DRAWS_PER_LINK * target.max(1);
    while arcs < target {
        draws += 1;
        if draws > budget {
            return Err(GenerationFailure::new("directed random graph ran out of draws"));
        }
        let from = rng.gen_range(0..size);
        let to = rng.gen_range(0..size);
        if from != to && store.add_link(from, to) {
            arcs += 1;
        }
    }
    Ok(())
}
