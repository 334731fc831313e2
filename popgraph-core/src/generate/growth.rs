//! Scale-free graphs grown by preferential attachment.
//!
//! Both variants start from a small complete core and attach every new node
//! with `m` links, so the nominal connectivity is `2m`. The Klemm–Eguíluz
//! variant routes attachment through a bounded pool of active nodes, which
//! yields high clustering.

use rand::{
    Rng, RngCore,
    distributions::{Distribution, WeightedIndex},
};

use super::GenerationFailure;
use crate::{descriptor::GeometryDescriptor, store::AdjacencyStore};

const PREFERENTIAL_DRAWS: usize = 16;

fn links_per_node(connectivity: f64) -> usize {
    ((connectivity / 2.0).round().max(1.0)) as usize
}

fn feasible_growth(descriptor: &mut GeometryDescriptor) -> usize {
    let m = links_per_node(descriptor.connectivity);
    descriptor.size = descriptor.size.max(m + 2);
    descriptor.connectivity = (2 * m) as f64;
    descriptor.directed = false;
    descriptor.regular = false;
    m
}

pub(super) fn feasible_barabasi_albert(descriptor: &mut GeometryDescriptor) {
    feasible_growth(descriptor);
}

pub(super) fn feasible_klemm(descriptor: &mut GeometryDescriptor) {
    feasible_growth(descriptor);
    descriptor.params.klemm_mixing = descriptor.params.klemm_mixing.clamp(0.0, 1.0);
}

fn complete_core(store: &mut AdjacencyStore, core: usize, endpoints: &mut Vec<usize>) {
    for a in 0..core {
        for b in (a + 1)..core {
            store.add_edge(a, b);
            endpoints.extend([a, b]);
        }
    }
}

/// Draws a node with probability proportional to its degree, skipping
/// `exclude`. Gives up after a bounded number of draws.
fn preferential(endpoints: &[usize], exclude: &[usize], rng: &mut dyn RngCore) -> Option<usize> {
    if endpoints.is_empty() {
        return None;
    }
    (0..PREFERENTIAL_DRAWS)
        .map(|_| endpoints[rng.gen_range(0..endpoints.len())])
        .find(|candidate| !exclude.contains(candidate))
}

pub(super) fn generate_barabasi_albert(
    descriptor: &GeometryDescriptor,
    store: &mut AdjacencyStore,
    rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let m = links_per_node(descriptor.connectivity);
    let mut endpoints = Vec::with_capacity(2 * m * descriptor.size);
    complete_core(store, m + 1, &mut endpoints);
    for node in (m + 1)..descriptor.size {
        let mut targets = Vec::with_capacity(m);
        while targets.len() < m {
            let target = preferential(&endpoints, &targets, rng)
                .ok_or(GenerationFailure::new("preferential attachment stalled"))?;
            targets.push(target);
        }
        for target in targets {
            store.add_edge(node, target);
            endpoints.extend([node, target]);
        }
    }
    Ok(())
}

/// Each new node links to every active node, or with probability `mixing`
/// to a degree-proportional pick instead. It then joins the active pool and
/// one older active node retires with probability `∝ 1/(m + k)`.
pub(super) fn generate_klemm(
    descriptor: &GeometryDescriptor,
    store: &mut AdjacencyStore,
    rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    let m = links_per_node(descriptor.connectivity);
    let mixing = descriptor.params.klemm_mixing;
    let mut endpoints = Vec::with_capacity(2 * m * descriptor.size);
    complete_core(store, m, &mut endpoints);
    let mut active: Vec<usize> = (0..m).collect();
    for node in m..descriptor.size {
        let mut targets = Vec::with_capacity(m);
        for &anchor in &active {
            let mut target = anchor;
            if targets.contains(&anchor) || rng.gen_bool(mixing) {
                if let Some(pick) = preferential(&endpoints, &targets, rng) {
                    target = pick;
                }
            }
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        while targets.len() < m {
            let pick = rng.gen_range(0..node);
            if !targets.contains(&pick) {
                targets.push(pick);
            }
        }
        for &target in &targets {
            store.add_edge(node, target);
            endpoints.extend([node, target]);
        }
        let weights: Vec<f64> = active
            .iter()
            .map(|&a| 1.0 / (m + store.out_degree(a)) as f64)
            .collect();
        let retire = WeightedIndex::new(&weights)
            .map_err(|_| GenerationFailure::new("active pool has no retirement weights"))?
            .sample(rng);
        active[retire] = node;
    }
    Ok(())
}
