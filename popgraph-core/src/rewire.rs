//! Degree-preserving rewiring and random link additions.
//!
//! Rewiring exchanges the endpoints of two random edges, `a–b, c–d` becoming
//! `a–d, c–b`, so every node keeps its degree. Swaps that would create a
//! self-loop or a duplicate link are rejected, and swaps that disconnect the
//! graph are reverted.

use std::collections::VecDeque;

use rand::{Rng, RngCore};

use crate::store::AdjacencyStore;

/// Upper bound on draws per requested operation before giving up.
const DRAWS_PER_OPERATION: usize = 32;

/// Summary of a rewiring pass.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RewireReport {
    /// Number of swaps derived from the rewiring probability.
    pub requested: usize,
    /// Number of swaps that were applied.
    pub swapped: usize,
    /// Number of candidate swaps that were rejected or reverted.
    pub rejected: usize,
}

/// Number of swaps for `edges` undirected edges at probability `p`.
///
/// The fraction `min(1, -ln(1 - p))` caps the expected share of untouched
/// edges at `1/e`.
#[must_use]
pub fn swap_count(edges: usize, probability: f64) -> usize {
    if probability <= 0.0 {
        return 0;
    }
    let fraction = (-(1.0 - probability.min(1.0)).ln()).min(1.0);
    (edges as f64 * fraction + 0.5).floor() as usize
}

/// Rewires an undirected, connected `store` with probability `probability`.
pub(crate) fn rewire_undirected(
    store: &mut AdjacencyStore,
    probability: f64,
    rng: &mut dyn RngCore,
) -> RewireReport {
    let mut edges: Vec<(usize, usize)> = store.links().filter(|&(a, b)| a < b).collect();
    let requested = swap_count(edges.len(), probability);
    let mut report = RewireReport {
        requested,
        ..RewireReport::default()
    };
    if edges.len() < 2 {
        return report;
    }
    let budget = DRAWS_PER_OPERATION * requested;
    let mut draws = 0;
    while report.swapped < requested && draws < budget {
        draws += 1;
        let first = rng.gen_range(0..edges.len());
        let second = rng.gen_range(0..edges.len());
        if first == second {
            continue;
        }
        let (a, b) = edges[first];
        let (mut c, mut d) = edges[second];
        if rng.gen_bool(0.5) {
            std::mem::swap(&mut c, &mut d);
        }
        if a == d || c == b || store.contains_link(a, d) || store.contains_link(c, b) {
            report.rejected += 1;
            continue;
        }
        store.remove_edge(a, b);
        store.remove_edge(c, d);
        store.add_edge(a, d);
        store.add_edge(c, b);
        if reaches_all(store, a, &[b, c, d]) {
            edges[first] = (a.min(d), a.max(d));
            edges[second] = (c.min(b), c.max(b));
            report.swapped += 1;
        } else {
            store.remove_edge(a, d);
            store.remove_edge(c, b);
            store.add_edge(a, b);
            store.add_edge(c, d);
            report.rejected += 1;
        }
    }
    #[cfg(feature = "metrics")]
    metrics::counter!("rewire_swaps_rejected").increment(report.rejected as u64);
    report
}

/// Removing two edges from a connected graph leaves at most three
/// components, each holding one of the four endpoints, so connectivity after
/// a swap only depends on whether the endpoints can still reach each other.
fn reaches_all(store: &AdjacencyStore, start: usize, targets: &[usize]) -> bool {
    let mut pending: Vec<usize> = targets.iter().copied().filter(|&t| t != start).collect();
    pending.dedup();
    let mut visited = vec![false; store.len()];
    let mut queue = VecDeque::from([start]);
    visited[start] = true;
    while let Some(node) = queue.pop_front() {
        pending.retain(|&t| t != node);
        if pending.is_empty() {
            return true;
        }
        for &next in store.out_neighbours(node) {
            if !visited[next] {
                visited[next] = true;
                queue.push_back(next);
            }
        }
    }
    pending.is_empty()
}

/// Adds `round(p · edges)` random undirected edges.
pub(crate) fn add_undirected(
    store: &mut AdjacencyStore,
    probability: f64,
    rng: &mut dyn RngCore,
) -> usize {
    let target = (probability.max(0.0) * store.edge_count() as f64 + 0.5).floor() as usize;
    add_random(store, target, rng, AdjacencyStore::add_edge)
}

/// Adds `round(p · links)` random one-way arcs.
pub(crate) fn add_directed(
    store: &mut AdjacencyStore,
    probability: f64,
    rng: &mut dyn RngCore,
) -> usize {
    let target = (probability.max(0.0) * store.link_count() as f64 + 0.5).floor() as usize;
    add_random(store, target, rng, AdjacencyStore::add_link)
}

fn add_random(
    store: &mut AdjacencyStore,
    target: usize,
    rng: &mut dyn RngCore,
    insert: fn(&mut AdjacencyStore, usize, usize) -> bool,
) -> usize {
    let size = store.len();
    if size < 2 {
        return 0;
    }
    let mut added = 0;
    let mut draws = 0;
    while added < target && draws < DRAWS_PER_OPERATION * target {
        draws += 1;
        let a = rng.gen_range(0..size);
        let b = rng.gen_range(0..size);
        if a != b && insert(store, a, b) {
            added += 1;
        }
    }
    added
}
