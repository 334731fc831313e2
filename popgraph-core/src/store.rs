//! Adjacency storage for population structures.
//!
//! Every node keeps an outgoing and an incoming neighbour list. Undirected
//! links are stored as a pair of arcs so both lists stay meaningful for all
//! families. Aggregate degree statistics are computed lazily and dropped on
//! every mutation.

use std::{collections::VecDeque, sync::OnceLock};

use crate::error::{GeometryError, Result};

/// Minimum, maximum and average degrees of a population structure.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DegreeStats {
    /// Smallest out-degree.
    pub min_out: usize,
    /// Largest out-degree.
    pub max_out: usize,
    /// Average out-degree.
    pub avg_out: f64,
    /// Smallest in-degree.
    pub min_in: usize,
    /// Largest in-degree.
    pub max_in: usize,
    /// Average in-degree.
    pub avg_in: f64,
    /// Smallest total degree.
    pub min_total: usize,
    /// Largest total degree.
    pub max_total: usize,
    /// Average total degree.
    pub avg_total: f64,
}

/// Outgoing and incoming neighbour lists for a fixed number of nodes.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyStore {
    out: Vec<Vec<usize>>,
    inc: Vec<Vec<usize>>,
    self_loops: bool,
    undirected: bool,
    stats: OnceLock<DegreeStats>,
}

impl PartialEq for AdjacencyStore {
    fn eq(&self, other: &Self) -> bool {
        self.out == other.out
            && self.inc == other.inc
            && self.self_loops == other.self_loops
            && self.undirected == other.undirected
    }
}

impl AdjacencyStore {
    /// Creates an empty store for `size` nodes.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            out: vec![Vec::new(); size],
            inc: vec![Vec::new(); size],
            self_loops: false,
            undirected: true,
            stats: OnceLock::new(),
        }
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.out.len()
    }

    /// Returns `true` when the store holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Whether self-loops may be inserted.
    #[must_use]
    pub fn allows_self_loops(&self) -> bool {
        self.self_loops
    }

    pub(crate) fn set_self_loops(&mut self, allowed: bool) {
        self.self_loops = allowed;
    }

    /// Whether every link is mirrored by its reverse.
    #[must_use]
    pub fn is_undirected(&self) -> bool {
        self.undirected
    }

    pub(crate) fn set_undirected(&mut self, undirected: bool) {
        self.undirected = undirected;
    }

    /// Adds the arc `from -> to`, returning `false` when it already exists,
    /// would be an inadmissible self-loop, or an endpoint is out of range.
    pub fn add_link(&mut self, from: usize, to: usize) -> bool {
        if from >= self.len() || to >= self.len() {
            return false;
        }
        if from == to && !self.self_loops {
            return false;
        }
        if self.out[from].contains(&to) {
            return false;
        }
        self.out[from].push(to);
        self.inc[to].push(from);
        self.stats.take();
        true
    }

    /// Adds both arcs between `a` and `b`. Returns `true` if either arc was new.
    pub fn add_edge(&mut self, a: usize, b: usize) -> bool {
        let forward = self.add_link(a, b);
        let backward = self.add_link(b, a);
        forward || backward
    }

    /// Checked variant of [`AdjacencyStore::add_link`].
    ///
    /// # Errors
    /// Returns [`GeometryError::NodeOutOfRange`] for indices beyond the store
    /// and [`GeometryError::SelfLoopNotPermitted`] for forbidden loops.
    pub fn try_add_link(&mut self, from: usize, to: usize) -> Result<bool> {
        let size = self.len();
        for node in [from, to] {
            if node >= size {
                return Err(GeometryError::NodeOutOfRange { node, size });
            }
        }
        if from == to && !self.self_loops {
            return Err(GeometryError::SelfLoopNotPermitted { node: from });
        }
        Ok(self.add_link(from, to))
    }

    /// Removes the arc `from -> to`, returning whether it was present.
    pub fn remove_link(&mut self, from: usize, to: usize) -> bool {
        let Some(targets) = self.out.get_mut(from) else {
            return false;
        };
        let Some(pos) = targets.iter().position(|&n| n == to) else {
            return false;
        };
        targets.swap_remove(pos);
        if let Some(sources) = self.inc.get_mut(to) {
            if let Some(back) = sources.iter().position(|&n| n == from) {
                sources.swap_remove(back);
            }
        }
        self.stats.take();
        true
    }

    /// Removes both arcs between `a` and `b`.
    pub fn remove_edge(&mut self, a: usize, b: usize) -> bool {
        let forward = self.remove_link(a, b);
        let backward = self.remove_link(b, a);
        forward || backward
    }

    /// Returns `true` when `from -> to` is present.
    #[must_use]
    pub fn contains_link(&self, from: usize, to: usize) -> bool {
        self.out.get(from).is_some_and(|targets| targets.contains(&to))
    }

    /// Outgoing neighbours of `node`; empty for out-of-range indices.
    #[must_use]
    pub fn out_neighbours(&self, node: usize) -> &[usize] {
        self.out.get(node).map_or(&[], Vec::as_slice)
    }

    /// Incoming neighbours of `node`; empty for out-of-range indices.
    #[must_use]
    pub fn in_neighbours(&self, node: usize) -> &[usize] {
        self.inc.get(node).map_or(&[], Vec::as_slice)
    }

    /// Out-degree of `node`.
    #[must_use]
    pub fn out_degree(&self, node: usize) -> usize {
        self.out_neighbours(node).len()
    }

    /// In-degree of `node`.
    #[must_use]
    pub fn in_degree(&self, node: usize) -> usize {
        self.in_neighbours(node).len()
    }

    /// Total degree of `node`: the out-degree for undirected stores and
    /// out + in otherwise.
    #[must_use]
    pub fn total_degree(&self, node: usize) -> usize {
        if self.undirected {
            self.out_degree(node)
        } else {
            self.out_degree(node) + self.in_degree(node)
        }
    }

    /// Number of stored arcs.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.out.iter().map(Vec::len).sum()
    }

    /// Number of undirected edges, counting each mirrored pair once.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        if self.undirected {
            self.link_count() / 2
        } else {
            self.link_count()
        }
    }

    /// Iterates over all stored arcs as `(from, to)` pairs.
    pub fn links(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.out
            .iter()
            .enumerate()
            .flat_map(|(from, targets)| targets.iter().map(move |&to| (from, to)))
    }

    /// Drops every link while keeping the node count.
    pub fn clear_links(&mut self) {
        self.out.iter_mut().for_each(Vec::clear);
        self.inc.iter_mut().for_each(Vec::clear);
        self.stats.take();
    }

    /// Removes all self-loops and returns how many were dropped.
    pub(crate) fn strip_self_loops(&mut self) -> usize {
        let mut removed = 0;
        for node in 0..self.len() {
            if self.remove_link(node, node) {
                removed += 1;
            }
        }
        removed
    }

    /// Replaces the outgoing lists wholesale and rebuilds the incoming lists.
    pub(crate) fn replace_outgoing(&mut self, out: Vec<Vec<usize>>) {
        let mut inc = vec![Vec::new(); out.len()];
        for (from, targets) in out.iter().enumerate() {
            for &to in targets {
                inc[to].push(from);
            }
        }
        self.out = out;
        self.inc = inc;
        self.stats.take();
    }

    /// Returns `true` when every arc has a matching reverse arc.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        self.links().all(|(from, to)| self.contains_link(to, from))
    }

    /// Returns `true` when every node is reachable from node 0 ignoring link
    /// direction.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.weakly_connected_from(0) == self.len()
    }

    /// Counts nodes reachable from `start` ignoring link direction.
    #[must_use]
    pub(crate) fn weakly_connected_from(&self, start: usize) -> usize {
        if start >= self.len() {
            return 0;
        }
        let mut visited = vec![false; self.len()];
        let mut queue = VecDeque::from([start]);
        visited[start] = true;
        let mut seen = 1;
        while let Some(node) = queue.pop_front() {
            let neighbours = self.out[node].iter().chain(self.inc[node].iter());
            for &next in neighbours {
                if !visited[next] {
                    visited[next] = true;
                    seen += 1;
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    /// Returns `true` when every node can reach every other along arcs.
    #[must_use]
    pub fn is_strongly_connected(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        self.reach(0, &self.out) == self.len() && self.reach(0, &self.inc) == self.len()
    }

    fn reach(&self, start: usize, lists: &[Vec<usize>]) -> usize {
        let mut visited = vec![false; self.len()];
        let mut queue = VecDeque::from([start]);
        visited[start] = true;
        let mut seen = 1;
        while let Some(node) = queue.pop_front() {
            for &next in &lists[node] {
                if !visited[next] {
                    visited[next] = true;
                    seen += 1;
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    /// Lazily computed degree statistics.
    #[must_use]
    pub fn stats(&self) -> DegreeStats {
        *self.stats.get_or_init(|| self.compute_stats())
    }

    fn compute_stats(&self) -> DegreeStats {
        let size = self.len();
        if size == 0 {
            return DegreeStats::default();
        }
        let (min_out, max_out, sum_out) = summarise((0..size).map(|n| self.out_degree(n)));
        let (min_in, max_in, sum_in) = summarise((0..size).map(|n| self.in_degree(n)));
        let (min_total, max_total, sum_total) =
            summarise((0..size).map(|n| self.total_degree(n)));
        let denom = size as f64;
        DegreeStats {
            min_out,
            max_out,
            avg_out: sum_out as f64 / denom,
            min_in,
            max_in,
            avg_in: sum_in as f64 / denom,
            min_total,
            max_total,
            avg_total: sum_total as f64 / denom,
        }
    }
}

fn summarise(degrees: impl Iterator<Item = usize>) -> (usize, usize, usize) {
    degrees.fold((usize::MAX, 0, 0), |(lo, hi, sum), d| {
        (lo.min(d), hi.max(d), sum + d)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn path(size: usize) -> AdjacencyStore {
        let mut store = AdjacencyStore::new(size);
        for node in 1..size {
            store.add_edge(node - 1, node);
        }
        store
    }

    #[test]
    fn duplicate_and_self_links_are_rejected() {
        let mut store = AdjacencyStore::new(3);
        assert!(store.add_link(0, 1));
        assert!(!store.add_link(0, 1));
        assert!(!store.add_link(2, 2));
        assert_eq!(store.link_count(), 1);
        assert_eq!(store.in_neighbours(1), &[0]);
    }

    #[test]
    fn self_loops_are_accepted_when_enabled() {
        let mut store = AdjacencyStore::new(2);
        store.set_self_loops(true);
        assert!(store.add_link(1, 1));
        assert_eq!(store.strip_self_loops(), 1);
        assert_eq!(store.link_count(), 0);
    }

    #[rstest]
    #[case(5, 0, GeometryError::NodeOutOfRange { node: 5, size: 3 })]
    #[case(1, 1, GeometryError::SelfLoopNotPermitted { node: 1 })]
    fn checked_insertion_reports_errors(
        #[case] from: usize,
        #[case] to: usize,
        #[case] expected: GeometryError,
    ) {
        let mut store = AdjacencyStore::new(3);
        assert_eq!(store.try_add_link(from, to), Err(expected));
    }

    #[test]
    fn removal_updates_both_lists() {
        let mut store = path(3);
        assert!(store.remove_edge(0, 1));
        assert!(store.out_neighbours(0).is_empty());
        assert!(store.in_neighbours(0).is_empty());
        assert!(!store.is_connected());
    }

    #[test]
    fn stats_are_invalidated_on_mutation() {
        let mut store = path(4);
        let before = store.stats();
        assert_eq!(before.min_total, 1);
        assert_eq!(before.max_total, 2);
        store.add_edge(0, 3);
        let after = store.stats();
        assert_eq!(after.min_total, 2);
        assert!((after.avg_total - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_queries_are_empty() {
        let store = path(2);
        assert!(store.out_neighbours(9).is_empty());
        assert_eq!(store.in_degree(9), 0);
    }

    #[test]
    fn strong_connectivity_requires_directed_cycle() {
        let mut store = AdjacencyStore::new(3);
        store.set_undirected(false);
        store.add_link(0, 1);
        store.add_link(1, 2);
        assert!(store.is_connected());
        assert!(!store.is_strongly_connected());
        store.add_link(2, 0);
        assert!(store.is_strongly_connected());
    }
}
