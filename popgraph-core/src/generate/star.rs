//! Hub-centred families: star, wheel and superstar.

use rand::RngCore;

use super::GenerationFailure;
use crate::{descriptor::GeometryDescriptor, store::AdjacencyStore};

const MIN_STAR: usize = 3;
const MIN_WHEEL: usize = 4;
const MIN_AMPLIFICATION: usize = 3;

pub(super) fn feasible_star(descriptor: &mut GeometryDescriptor) {
    let size = descriptor.size.max(MIN_STAR);
    descriptor.size = size;
    descriptor.connectivity = 2.0 * (size - 1) as f64 / size as f64;
    descriptor.directed = false;
    descriptor.regular = false;
}

pub(super) fn generate_star(
    descriptor: &GeometryDescriptor,
    store: &mut AdjacencyStore,
    _rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    for leaf in 1..descriptor.size {
        store.add_edge(0, leaf);
    }
    Ok(())
}

pub(super) fn feasible_wheel(descriptor: &mut GeometryDescriptor) {
    let size = descriptor.size.max(MIN_WHEEL);
    descriptor.size = size;
    descriptor.connectivity = 4.0 * (size - 1) as f64 / size as f64;
    descriptor.directed = false;
    descriptor.regular = false;
}

pub(super) fn generate_wheel(
    descriptor: &GeometryDescriptor,
    store: &mut AdjacencyStore,
    _rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let rim = descriptor.size - 1;
    for i in 0..rim {
        store.add_edge(0, i + 1);
        store.add_edge(i + 1, (i + 1) % rim + 1);
    }
    Ok(())
}

/// Superstar layout: hub `0`, then one block per petal holding its reservoir
/// nodes followed by its chain of `amplification - 2` nodes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Petals {
    count: usize,
    reservoir: usize,
    chain: usize,
}

impl Petals {
    fn of(descriptor: &GeometryDescriptor) -> Self {
        let count = descriptor.params.petals.max(1);
        let chain = descriptor.params.amplification.max(MIN_AMPLIFICATION) - 2;
        let reservoir = (descriptor.size.saturating_sub(1) / count)
            .saturating_sub(chain)
            .max(1);
        Self {
            count,
            reservoir,
            chain,
        }
    }

    fn block(self) -> usize {
        self.reservoir + self.chain
    }

    fn size(self) -> usize {
        1 + self.count * self.block()
    }

    fn arcs(self) -> usize {
        self.count * (2 * self.reservoir + self.chain)
    }
}

pub(super) fn feasible_superstar(descriptor: &mut GeometryDescriptor) {
    let petals = Petals::of(descriptor);
    descriptor.params.petals = petals.count;
    descriptor.params.amplification = petals.chain + 2;
    descriptor.size = petals.size();
    descriptor.connectivity = petals.arcs() as f64 / descriptor.size as f64;
    descriptor.directed = true;
    descriptor.regular = false;
}

/// Hub feeds every reservoir node, reservoirs feed the head of their chain,
/// chains run in sequence and the tail of each chain feeds the hub.
pub(super) fn generate_superstar(
    descriptor: &GeometryDescriptor,
    store: &mut AdjacencyStore,
    _rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let petals = Petals::of(descriptor);
    for petal in 0..petals.count {
        let base = 1 + petal * petals.block();
        let head = base + petals.reservoir;
        for node in base..head {
            store.add_link(0, node);
            store.add_link(node, head);
        }
        let tail = head + petals.chain - 1;
        for node in head..tail {
            store.add_link(node, node + 1);
        }
        store.add_link(tail, 0);
    }
    Ok(())
}
