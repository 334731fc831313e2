//! The population structure shared with the simulation.
//!
//! A [`Geometry`] couples a [`GeometryDescriptor`] with the
//! [`AdjacencyStore`] generated from it. It runs the feasibility check,
//! drives generation and the optional rewiring passes, and answers the
//! neighbourhood queries the simulation uses to pick interaction partners.
//! Well-mixed populations keep no explicit links: every other node is a
//! neighbour.

use rand::RngCore;
use tracing::{debug, info, instrument, warn};

use crate::{
    descriptor::{Family, GeometryDescriptor},
    error::{GeometryError, Result},
    feasibility::{FeasibilityReport, check_feasibility},
    generate::{self, hierarchy},
    invariants::InvariantChecker,
    rewire::{self, RewireReport},
    store::{AdjacencyStore, DegreeStats},
};

/// Selects which degree a histogram counts.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DegreeKind {
    /// Outgoing links.
    Out,
    /// Incoming links.
    In,
    /// Out-degree for undirected graphs, out + in otherwise.
    Total,
}

/// Outcome of [`Geometry::init`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InitReport {
    /// Parameter corrections applied before generation.
    pub feasibility: FeasibilityReport,
    /// Generator attempts consumed.
    pub attempts: usize,
    /// Generation failed and the population fell back to well-mixed.
    pub fell_back: bool,
    /// Result of the rewiring pass, when one ran.
    pub rewire: Option<RewireReport>,
    /// Number of random links added.
    pub added: usize,
}

impl InitReport {
    /// Returns `true` when the host simulation must reset because the
    /// population size changed.
    #[must_use]
    pub fn requires_reset(&self) -> bool {
        self.feasibility.requires_reset()
    }
}

/// Population structure: descriptor, links and lifecycle flags.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub(crate) descriptor: GeometryDescriptor,
    pub(crate) store: AdjacencyStore,
    pub(crate) rewired: bool,
    pub(crate) valid: bool,
    pub(crate) interspecies: bool,
}

impl Geometry {
    /// Creates an empty geometry for `descriptor`. Call [`Geometry::init`] to
    /// populate it.
    ///
    /// # Errors
    /// Returns [`GeometryError::ZeroSize`] when the descriptor has no nodes.
    ///
    /// # Examples
    /// ```
    /// use popgraph_core::{Geometry, GeometryDescriptor};
    /// use rand::{SeedableRng, rngs::SmallRng};
    ///
    /// let mut geometry = Geometry::new(GeometryDescriptor::parse("w").with_size(12))?;
    /// let mut rng = SmallRng::seed_from_u64(1);
    /// geometry.init(&mut rng);
    /// assert!(geometry.is_valid());
    /// assert_eq!(geometry.out_degree(0), 11);
    /// # Ok::<(), popgraph_core::GeometryError>(())
    /// ```
    pub fn new(descriptor: GeometryDescriptor) -> Result<Self> {
        if descriptor.size == 0 {
            return Err(GeometryError::ZeroSize);
        }
        let store = AdjacencyStore::new(descriptor.size);
        Ok(Self {
            descriptor,
            store,
            rewired: false,
            valid: false,
            interspecies: false,
        })
    }

    /// Runs the feasibility check on the descriptor and reallocates the
    /// store when the population size changed.
    pub fn check_feasibility(&mut self) -> FeasibilityReport {
        let report = check_feasibility(&mut self.descriptor);
        if report.requires_regeneration() {
            self.valid = false;
        }
        if self.store.len() != self.descriptor.size {
            self.store = AdjacencyStore::new(self.descriptor.size);
        }
        report
    }

    /// Checks feasibility, generates the links and applies the requested
    /// rewiring and link additions.
    #[instrument(
        name = "geometry.init",
        skip(self, rng),
        fields(descriptor = %self.descriptor, size = self.descriptor.size)
    )]
    pub fn init(&mut self, rng: &mut impl RngCore) -> InitReport {
        let feasibility = self.check_feasibility();
        let (attempts, fell_back) = self.generate(rng);
        let rewire = (self.descriptor.rewire > 0.0).then(|| self.rewire(rng));
        let added = if self.descriptor.add > 0.0 {
            self.add_links(rng)
        } else {
            0
        };
        InitReport {
            feasibility,
            attempts,
            fell_back,
            rewire,
            added,
        }
    }

    /// Populates the store from scratch for the current (feasible)
    /// descriptor. Returns the attempts consumed and whether generation fell
    /// back to a well-mixed population.
    #[instrument(
        name = "geometry.generate",
        skip(self, rng),
        fields(family = %self.descriptor.family, size = self.descriptor.size)
    )]
    pub fn generate(&mut self, rng: &mut impl RngCore) -> (usize, bool) {
        if self.store.len() != self.descriptor.size {
            self.store = AdjacencyStore::new(self.descriptor.size);
        }
        self.store.set_undirected(!self.descriptor.directed);
        self.store.set_self_loops(self.interspecies);
        let report = generate::populate(&mut self.descriptor, &mut self.store, rng);
        if self.interspecies {
            self.add_self_loops();
        }
        self.rewired = false;
        self.valid = true;
        debug!(
            links = self.store.link_count(),
            attempts = report.attempts,
            "geometry generated"
        );
        (report.attempts, report.fell_back)
    }

    /// Drops all links and marks the geometry invalid.
    pub fn reset(&mut self) {
        self.store = AdjacencyStore::new(0);
        self.rewired = false;
        self.valid = false;
    }

    /// Performs degree-preserving rewiring with the descriptor's rewiring
    /// probability. Directed geometries and families that do not admit
    /// rewiring are left untouched.
    #[instrument(
        name = "geometry.rewire",
        skip(self, rng),
        fields(family = %self.descriptor.family, probability = self.descriptor.rewire)
    )]
    pub fn rewire(&mut self, rng: &mut impl RngCore) -> RewireReport {
        let probability = self.descriptor.rewire;
        if probability <= 0.0 {
            debug!("rewiring probability is zero; nothing to do");
            return RewireReport::default();
        }
        if !self.descriptor.family.allows_rewiring() {
            warn!(family = %self.descriptor.family, "family does not support rewiring");
            return RewireReport::default();
        }
        if !self.store.is_undirected() {
            warn!(family = %self.descriptor.family, "rewiring directed graphs is not supported");
            return RewireReport::default();
        }
        let loops = self.store.strip_self_loops();
        let report = rewire::rewire_undirected(&mut self.store, probability, rng);
        if loops > 0 {
            self.add_self_loops();
        }
        if report.swapped > 0 {
            self.rewired = true;
        }
        info!(
            requested = report.requested,
            swapped = report.swapped,
            rejected = report.rejected,
            "rewiring complete"
        );
        report
    }

    /// Adds random links with the descriptor's addition probability. The
    /// geometry stops being regular; on directed geometries the new links
    /// are one-way.
    pub fn add_links(&mut self, rng: &mut impl RngCore) -> usize {
        let probability = self.descriptor.add;
        if probability <= 0.0 {
            debug!("link addition probability is zero; nothing to do");
            return 0;
        }
        if !self.descriptor.family.allows_rewiring() {
            warn!(family = %self.descriptor.family, "family does not support adding links");
            return 0;
        }
        let added = if self.store.is_undirected() {
            rewire::add_undirected(&mut self.store, probability, rng)
        } else {
            rewire::add_directed(&mut self.store, probability, rng)
        };
        if added > 0 {
            self.descriptor.regular = false;
            self.rewired = true;
            self.descriptor.connectivity = self.store.stats().avg_out;
        }
        added
    }

    /// Clone used for interactions. With inter-species interactions every
    /// node is additionally linked to itself (the individual at the same
    /// index of the other species).
    #[must_use]
    pub fn derive_interaction_geometry(&self, interspecies: bool) -> Self {
        let mut derived = self.clone();
        derived.interspecies = interspecies;
        if interspecies {
            derived.add_self_loops();
        } else {
            derived.remove_self_loops();
        }
        derived
    }

    /// Clone used for reproduction; never contains self-loops.
    #[must_use]
    pub fn derive_reproduction_geometry(&self) -> Self {
        let mut derived = self.clone();
        derived.interspecies = false;
        derived.remove_self_loops();
        derived
    }

    fn add_self_loops(&mut self) {
        self.store.set_self_loops(true);
        if self.descriptor.family == Family::WellMixed {
            return;
        }
        for node in 0..self.store.len() {
            self.store.add_link(node, node);
        }
    }

    fn remove_self_loops(&mut self) {
        self.store.strip_self_loops();
        self.store.set_self_loops(false);
    }

    /// Descriptor after feasibility corrections.
    #[must_use]
    pub fn descriptor(&self) -> &GeometryDescriptor {
        &self.descriptor
    }

    /// Underlying adjacency lists.
    #[must_use]
    pub fn store(&self) -> &AdjacencyStore {
        &self.store
    }

    /// Graph family.
    #[must_use]
    pub fn family(&self) -> Family {
        self.descriptor.family
    }

    /// Population size.
    #[must_use]
    pub fn size(&self) -> usize {
        self.descriptor.size
    }

    /// Resolved connectivity.
    #[must_use]
    pub fn connectivity(&self) -> f64 {
        self.descriptor.connectivity
    }

    /// Returns `true` for the implicit well-mixed structure.
    #[must_use]
    pub fn is_well_mixed(&self) -> bool {
        self.descriptor.family == Family::WellMixed
    }

    /// Whether every link has a reverse link.
    #[must_use]
    pub fn is_undirected(&self) -> bool {
        !self.descriptor.directed && self.store.is_undirected()
    }

    /// Whether every node has the resolved connectivity.
    #[must_use]
    pub fn is_regular(&self) -> bool {
        self.descriptor.regular
    }

    /// Whether node positions are implied by a lattice.
    #[must_use]
    pub fn is_lattice(&self) -> bool {
        self.descriptor.family.is_lattice() && !self.rewired
    }

    /// Whether rewiring or link additions changed the generated graph.
    #[must_use]
    pub fn is_rewired(&self) -> bool {
        self.rewired
    }

    /// Whether the links reflect the current descriptor.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether the graph cannot be rebuilt from its descriptor alone.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.descriptor.family.is_random() || self.rewired
    }

    /// Whether self-loops link each node to its counterpart in the other
    /// species.
    #[must_use]
    pub fn is_interspecies(&self) -> bool {
        self.interspecies
    }

    /// Out-degree of `node`.
    #[must_use]
    pub fn out_degree(&self, node: usize) -> usize {
        if self.is_well_mixed() {
            return self.implicit_degree(node);
        }
        self.store.out_degree(node)
    }

    /// In-degree of `node`.
    #[must_use]
    pub fn in_degree(&self, node: usize) -> usize {
        if self.is_well_mixed() {
            return self.implicit_degree(node);
        }
        self.store.in_degree(node)
    }

    fn implicit_degree(&self, node: usize) -> usize {
        if node >= self.size() {
            return 0;
        }
        let others = self.size() - 1;
        if self.interspecies { others + 1 } else { others }
    }

    /// Outgoing neighbours of `node`. Empty for well-mixed populations, whose
    /// neighbourhood is implicit.
    #[must_use]
    pub fn out_neighbours(&self, node: usize) -> &[usize] {
        self.store.out_neighbours(node)
    }

    /// Incoming neighbours of `node`.
    #[must_use]
    pub fn in_neighbours(&self, node: usize) -> &[usize] {
        self.store.in_neighbours(node)
    }

    /// Returns `true` when `b` is an outgoing neighbour of `a`.
    #[must_use]
    pub fn is_neighbour(&self, a: usize, b: usize) -> bool {
        if self.is_well_mixed() {
            return a < self.size() && b < self.size() && (a != b || self.interspecies);
        }
        self.store.contains_link(a, b)
    }

    /// Aggregate degree statistics.
    #[must_use]
    pub fn stats(&self) -> DegreeStats {
        if self.is_well_mixed() {
            let degree = self.implicit_degree(0);
            let avg = degree as f64;
            return DegreeStats {
                min_out: degree,
                max_out: degree,
                avg_out: avg,
                min_in: degree,
                max_in: degree,
                avg_in: avg,
                min_total: degree,
                max_total: degree,
                avg_total: avg,
            };
        }
        self.store.stats()
    }

    /// Number of nodes per degree: entry `d` counts the nodes of degree `d`.
    #[must_use]
    pub fn degree_histogram(&self, kind: DegreeKind) -> Vec<usize> {
        let degree_of = |node: usize| match kind {
            DegreeKind::Out => self.out_degree(node),
            DegreeKind::In => self.in_degree(node),
            DegreeKind::Total if self.is_undirected() || self.is_well_mixed() => {
                self.out_degree(node)
            }
            DegreeKind::Total => self.out_degree(node) + self.in_degree(node),
        };
        let mut histogram = Vec::new();
        for node in 0..self.size() {
            let degree = degree_of(node);
            if histogram.len() <= degree {
                histogram.resize(degree + 1, 0);
            }
            histogram[degree] += 1;
        }
        histogram
    }

    /// For hierarchical geometries, the number of levels separating `a` and
    /// `b` (`0` within the same leaf group). `None` for other families or
    /// out-of-range nodes.
    #[must_use]
    pub fn hierarchy_level(&self, a: usize, b: usize) -> Option<usize> {
        if self.descriptor.family != Family::Hierarchy || a >= self.size() || b >= self.size() {
            return None;
        }
        Some(hierarchy::level_between(&self.descriptor, a, b))
    }

    /// Structural consistency checks.
    #[must_use]
    pub fn invariants(&self) -> InvariantChecker<'_> {
        InvariantChecker::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};
    use rstest::{fixture, rstest};

    #[fixture]
    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    fn built(text: &str, size: usize, rng: &mut SmallRng) -> Geometry {
        let mut geometry =
            Geometry::new(GeometryDescriptor::parse(text).with_size(size)).expect("non-empty");
        let _ = geometry.init(rng);
        geometry
    }

    #[test]
    fn zero_size_is_rejected() {
        let err = Geometry::new(GeometryDescriptor::parse("n")).expect_err("zero size");
        assert_eq!(err, GeometryError::ZeroSize);
    }

    #[rstest]
    fn well_mixed_neighbourhood_is_implicit(mut rng: SmallRng) {
        let geometry = built("M", 5, &mut rng);
        assert_eq!(geometry.out_degree(2), 4);
        assert!(geometry.is_neighbour(0, 4));
        assert!(!geometry.is_neighbour(3, 3));
        assert!(geometry.out_neighbours(0).is_empty());
        assert_eq!(geometry.stats().avg_total, 4.0);
    }

    #[rstest]
    fn interaction_geometry_gains_self_loops(mut rng: SmallRng) {
        let geometry = built("n", 16, &mut rng);
        let interaction = geometry.derive_interaction_geometry(true);
        assert!((0..16).all(|node| interaction.is_neighbour(node, node)));
        assert_eq!(interaction.out_degree(0), 5);
        let reproduction = interaction.derive_reproduction_geometry();
        assert!((0..16).all(|node| !reproduction.is_neighbour(node, node)));
        assert_eq!(reproduction.store(), geometry.store());
    }

    #[rstest]
    fn rewiring_marks_geometry_unique(mut rng: SmallRng) {
        let mut geometry = built("n", 100, &mut rng);
        assert!(geometry.is_lattice());
        assert!(!geometry.is_unique());
        geometry.descriptor.rewire = 0.2;
        let report = geometry.rewire(&mut rng);
        assert!(report.swapped > 0);
        assert!(geometry.is_rewired());
        assert!(geometry.is_unique());
        assert!(!geometry.is_lattice());
        assert!(geometry.is_regular());
    }

    #[rstest]
    fn directed_geometry_is_not_rewired(mut rng: SmallRng) {
        let mut geometry = built("R3", 30, &mut rng);
        geometry.descriptor.rewire = 0.5;
        assert_eq!(geometry.rewire(&mut rng), RewireReport::default());
    }

    #[rstest]
    fn adding_links_clears_regularity(mut rng: SmallRng) {
        let geometry = {
            let mut geometry = Geometry::new(
                GeometryDescriptor::parse("g4").with_size(50).with_add(0.1),
            )
            .expect("non-empty");
            let report = geometry.init(&mut rng);
            assert_eq!(report.added, 10);
            geometry
        };
        assert!(!geometry.is_regular());
        assert!(geometry.is_unique());
        assert!((geometry.connectivity() - 4.4).abs() < 1e-9);
    }

    #[rstest]
    fn histogram_counts_every_node(mut rng: SmallRng) {
        let geometry = built("s", 10, &mut rng);
        let histogram = geometry.degree_histogram(DegreeKind::Total);
        assert_eq!(histogram[1], 9);
        assert_eq!(histogram[9], 1);
        assert_eq!(histogram.iter().sum::<usize>(), 10);
    }

    #[rstest]
    fn hierarchy_level_only_for_hierarchies(mut rng: SmallRng) {
        let hierarchy = built("H2,3", 24, &mut rng);
        assert_eq!(hierarchy.hierarchy_level(0, 1), Some(0));
        assert_eq!(hierarchy.hierarchy_level(0, 12), Some(2));
        let lattice = built("n", 16, &mut rng);
        assert_eq!(lattice.hierarchy_level(0, 1), None);
    }

    #[rstest]
    fn reset_invalidates(mut rng: SmallRng) {
        let mut geometry = built("w", 8, &mut rng);
        geometry.reset();
        assert!(!geometry.is_valid());
        assert!(geometry.store().is_empty());
        let _ = geometry.init(&mut rng);
        assert!(geometry.is_valid());
        assert_eq!(geometry.store().len(), 8);
    }
}
