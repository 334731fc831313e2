//! Structural consistency checks for generated geometries.
//!
//! The checker is surfaced via [`Geometry::invariants`] so tests and
//! debugging sessions can assert graph health after generation or rewiring
//! without reimplementing traversal logic. It is not run on the hot path.

use std::collections::{HashSet, VecDeque};

use thiserror::Error;
use tracing::warn;

use crate::geometry::Geometry;

/// Enumerates the structural invariants of a geometry.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GeometryInvariant {
    /// No node links to itself unless inter-species loops are enabled.
    NoSelfLoops,
    /// No ordered pair of nodes is linked twice.
    NoDuplicateLinks,
    /// Every outgoing link is mirrored in the target's incoming list.
    Backlinks,
    /// Undirected geometries have a symmetric neighbour relation.
    Symmetry,
    /// Regular geometries give every node the declared connectivity.
    Regularity,
    /// Every node is reachable ignoring link direction.
    Connectivity,
}

impl GeometryInvariant {
    /// Returns all invariants in evaluation order.
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::NoSelfLoops,
            Self::NoDuplicateLinks,
            Self::Backlinks,
            Self::Symmetry,
            Self::Regularity,
            Self::Connectivity,
        ]
    }
}

/// Reports an invariant violation surfaced by [`InvariantChecker`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum InvariantViolation {
    /// A node links to itself.
    #[error("node {node} links to itself")]
    SelfLoop {
        /// Offending node.
        node: usize,
    },
    /// A link appears more than once in a node's outgoing list.
    #[error("link {from}->{to} is stored more than once")]
    DuplicateLink {
        /// Source node.
        from: usize,
        /// Target node.
        to: usize,
    },
    /// An outgoing link lacks the matching incoming entry, or vice versa.
    #[error("link {from}->{to} is missing from the incoming list of {to}")]
    MissingBacklink {
        /// Source node.
        from: usize,
        /// Target node.
        to: usize,
    },
    /// An undirected geometry holds a one-way link.
    #[error("undirected link {from}->{to} has no reverse link")]
    Asymmetric {
        /// Source node.
        from: usize,
        /// Target node.
        to: usize,
    },
    /// A node of a regular geometry has the wrong degree.
    #[error("node {node} has degree {degree}, expected {expected}")]
    Irregular {
        /// Offending node.
        node: usize,
        /// Observed out-degree.
        degree: usize,
        /// Declared connectivity.
        expected: usize,
    },
    /// Part of the population cannot be reached.
    #[error("only {reachable} of {size} nodes are reachable")]
    Disconnected {
        /// Nodes reachable from node 0.
        reachable: usize,
        /// Population size.
        size: usize,
    },
}

/// Helper returned by [`Geometry::invariants`] to run structural checks.
#[derive(Debug)]
pub struct InvariantChecker<'geometry> {
    geometry: &'geometry Geometry,
}

impl<'geometry> InvariantChecker<'geometry> {
    pub(crate) fn new(geometry: &'geometry Geometry) -> Self {
        Self { geometry }
    }

    /// Runs all invariants, returning the first violation encountered.
    ///
    /// # Errors
    /// Returns the first [`InvariantViolation`] found.
    pub fn check_all(&self) -> Result<(), InvariantViolation> {
        self.check_many(GeometryInvariant::all())
    }

    /// Runs a custom subset of invariants in the provided order.
    ///
    /// # Errors
    /// Returns the first [`InvariantViolation`] found.
    pub fn check_many(
        &self,
        invariants: impl IntoIterator<Item = GeometryInvariant>,
    ) -> Result<(), InvariantViolation> {
        self.run_with_mode(invariants, EvaluationMode::FailFast)
    }

    /// Runs a single invariant.
    ///
    /// # Errors
    /// Returns the first [`InvariantViolation`] found.
    pub fn check(&self, invariant: GeometryInvariant) -> Result<(), InvariantViolation> {
        self.check_many([invariant])
    }

    /// Executes every invariant and returns the full set of violations.
    #[must_use]
    pub fn collect_all(&self) -> Vec<InvariantViolation> {
        self.collect_many(GeometryInvariant::all())
    }

    /// Executes the selected invariants and returns every violation found.
    #[must_use]
    pub fn collect_many(
        &self,
        invariants: impl IntoIterator<Item = GeometryInvariant>,
    ) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();
        let _ = self.run_with_mode(invariants, EvaluationMode::Collect(&mut violations));
        violations
    }

    /// Collects every violation and logs each one as a warning. Returns the
    /// number of violations found.
    pub fn log_violations(&self) -> usize {
        let violations = self.collect_all();
        for violation in &violations {
            warn!(
                family = %self.geometry.family(),
                violation = %violation,
                "geometry invariant violated"
            );
        }
        violations.len()
    }

    fn run_with_mode(
        &self,
        invariants: impl IntoIterator<Item = GeometryInvariant>,
        mut mode: EvaluationMode<'_>,
    ) -> Result<(), InvariantViolation> {
        for invariant in invariants {
            self.dispatch(invariant, &mut mode)?;
        }
        Ok(())
    }

    fn dispatch(
        &self,
        invariant: GeometryInvariant,
        mode: &mut EvaluationMode<'_>,
    ) -> Result<(), InvariantViolation> {
        if self.geometry.is_well_mixed() {
            return Ok(());
        }
        match invariant {
            GeometryInvariant::NoSelfLoops => self.self_loops(mode),
            GeometryInvariant::NoDuplicateLinks => self.duplicates(mode),
            GeometryInvariant::Backlinks => self.backlinks(mode),
            GeometryInvariant::Symmetry => self.symmetry(mode),
            GeometryInvariant::Regularity => self.regularity(mode),
            GeometryInvariant::Connectivity => self.connectivity(mode),
        }
    }

    fn self_loops(&self, mode: &mut EvaluationMode<'_>) -> Result<(), InvariantViolation> {
        let store = self.geometry.store();
        if store.allows_self_loops() {
            return Ok(());
        }
        for node in 0..store.len() {
            if store.out_neighbours(node).contains(&node) {
                mode.record(InvariantViolation::SelfLoop { node })?;
            }
        }
        Ok(())
    }

    fn duplicates(&self, mode: &mut EvaluationMode<'_>) -> Result<(), InvariantViolation> {
        let store = self.geometry.store();
        for from in 0..store.len() {
            let mut seen = HashSet::new();
            for &to in store.out_neighbours(from) {
                if !seen.insert(to) {
                    mode.record(InvariantViolation::DuplicateLink { from, to })?;
                }
            }
        }
        Ok(())
    }

    fn backlinks(&self, mode: &mut EvaluationMode<'_>) -> Result<(), InvariantViolation> {
        let store = self.geometry.store();
        for from in 0..store.len() {
            for &to in store.out_neighbours(from) {
                if !store.in_neighbours(to).contains(&from) {
                    mode.record(InvariantViolation::MissingBacklink { from, to })?;
                }
            }
        }
        for to in 0..store.len() {
            for &from in store.in_neighbours(to) {
                if !store.out_neighbours(from).contains(&to) {
                    mode.record(InvariantViolation::MissingBacklink { from, to })?;
                }
            }
        }
        Ok(())
    }

    fn symmetry(&self, mode: &mut EvaluationMode<'_>) -> Result<(), InvariantViolation> {
        if !self.geometry.is_undirected() {
            return Ok(());
        }
        let store = self.geometry.store();
        for (from, to) in store.links() {
            if !store.contains_link(to, from) {
                mode.record(InvariantViolation::Asymmetric { from, to })?;
            }
        }
        Ok(())
    }

    fn regularity(&self, mode: &mut EvaluationMode<'_>) -> Result<(), InvariantViolation> {
        if !self.geometry.is_regular() {
            return Ok(());
        }
        let store = self.geometry.store();
        let loops = usize::from(store.allows_self_loops());
        let expected = self.geometry.connectivity().round() as usize + loops;
        for node in 0..store.len() {
            let degree = store.out_degree(node);
            if degree != expected {
                mode.record(InvariantViolation::Irregular {
                    node,
                    degree,
                    expected,
                })?;
            }
        }
        Ok(())
    }

    fn connectivity(&self, mode: &mut EvaluationMode<'_>) -> Result<(), InvariantViolation> {
        let store = self.geometry.store();
        let size = store.len();
        if size == 0 {
            return Ok(());
        }
        let mut visited = vec![false; size];
        let mut queue = VecDeque::from([0]);
        visited[0] = true;
        let mut reachable = 1;
        while let Some(node) = queue.pop_front() {
            let neighbours = store
                .out_neighbours(node)
                .iter()
                .chain(store.in_neighbours(node));
            for &next in neighbours {
                if !visited[next] {
                    visited[next] = true;
                    reachable += 1;
                    queue.push_back(next);
                }
            }
        }
        if reachable < size {
            mode.record(InvariantViolation::Disconnected { reachable, size })?;
        }
        Ok(())
    }
}

enum EvaluationMode<'a> {
    FailFast,
    Collect(&'a mut Vec<InvariantViolation>),
}

impl EvaluationMode<'_> {
    fn record(&mut self, violation: InvariantViolation) -> Result<(), InvariantViolation> {
        match self {
            Self::FailFast => Err(violation),
            Self::Collect(sink) => {
                sink.push(violation);
                Ok(())
            }
        }
    }
}
