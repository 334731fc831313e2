//! Builder for fully initialised [`Geometry`] instances.
//!
//! Collects the descriptor, population size, rewiring knobs and the
//! inter-species flag, then runs the feasibility check and generation in one
//! step.

use rand::RngCore;

use crate::{
    Result,
    descriptor::GeometryDescriptor,
    geometry::{Geometry, InitReport},
};

/// Configures and constructs [`Geometry`] instances.
///
/// # Examples
/// ```
/// use popgraph_core::GeometryBuilder;
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let mut rng = SmallRng::seed_from_u64(7);
/// let geometry = GeometryBuilder::new()
///     .with_descriptor("n")
///     .with_size(99)
///     .build(&mut rng)
///     .expect("builder configuration is valid");
/// assert_eq!(geometry.size(), 100);
/// assert!(geometry.is_valid());
/// ```
#[derive(Clone, Debug, Default)]
pub struct GeometryBuilder {
    descriptor: GeometryDescriptor,
    size: Option<usize>,
    rewire: Option<f64>,
    add: Option<f64>,
    interspecies: bool,
}

impl GeometryBuilder {
    /// Creates a builder for a well-mixed population of unspecified size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `text` as the geometry descriptor. Unrecognised descriptors
    /// resolve to a well-mixed population during [`GeometryBuilder::build`].
    #[must_use]
    pub fn with_descriptor(mut self, text: &str) -> Self {
        self.descriptor = GeometryDescriptor::parse(text);
        self
    }

    /// Uses an already assembled descriptor.
    #[must_use]
    pub fn with_geometry_descriptor(mut self, descriptor: GeometryDescriptor) -> Self {
        self.descriptor = descriptor;
        self
    }

    /// Overrides the requested population size.
    ///
    /// # Examples
    /// ```
    /// use popgraph_core::GeometryBuilder;
    ///
    /// let builder = GeometryBuilder::new().with_size(64);
    /// assert_eq!(builder.size(), 64);
    /// ```
    #[must_use]
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    /// Returns the requested population size.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size.unwrap_or(self.descriptor.size())
    }

    /// Sets the rewiring probability.
    #[must_use]
    pub fn with_rewire(mut self, probability: f64) -> Self {
        self.rewire = Some(probability);
        self
    }

    /// Sets the link-addition probability.
    #[must_use]
    pub fn with_add(mut self, probability: f64) -> Self {
        self.add = Some(probability);
        self
    }

    /// Links every node to its counterpart in the other species.
    #[must_use]
    pub fn with_interspecies(mut self, interspecies: bool) -> Self {
        self.interspecies = interspecies;
        self
    }

    /// Returns the descriptor that [`GeometryBuilder::build`] will check.
    #[must_use]
    pub fn descriptor(&self) -> GeometryDescriptor {
        let mut descriptor = self.descriptor.clone().with_size(self.size());
        if let Some(rewire) = self.rewire {
            descriptor = descriptor.with_rewire(rewire);
        }
        if let Some(add) = self.add {
            descriptor = descriptor.with_add(add);
        }
        descriptor
    }

    /// Validates the configuration and generates the geometry.
    ///
    /// # Errors
    /// Returns [`crate::GeometryError::ZeroSize`] when no nodes were
    /// requested.
    pub fn build(self, rng: &mut impl RngCore) -> Result<Geometry> {
        self.build_with_report(rng).map(|(geometry, _)| geometry)
    }

    /// Like [`GeometryBuilder::build`], also returning the initialisation
    /// report.
    ///
    /// # Errors
    /// Returns [`crate::GeometryError::ZeroSize`] when no nodes were
    /// requested.
    pub fn build_with_report(self, rng: &mut impl RngCore) -> Result<(Geometry, InitReport)> {
        let mut geometry = Geometry::new(self.descriptor())?;
        geometry.interspecies = self.interspecies;
        let report = geometry.init(rng);
        Ok((geometry, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GeometryError, descriptor::Family};
    use rand::{SeedableRng, rngs::SmallRng};
    use rstest::{fixture, rstest};

    #[fixture]
    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(3)
    }

    #[rstest]
    fn zero_size_is_rejected(mut rng: SmallRng) {
        let err = GeometryBuilder::new()
            .with_descriptor("n")
            .build(&mut rng)
            .expect_err("size missing");
        assert_eq!(err, GeometryError::ZeroSize);
    }

    #[rstest]
    fn report_flags_size_changes(mut rng: SmallRng) {
        let (geometry, report) = GeometryBuilder::new()
            .with_descriptor("s")
            .with_size(2)
            .build_with_report(&mut rng)
            .expect("valid");
        assert!(report.requires_reset());
        assert_eq!(geometry.size(), 3);
        assert_eq!(geometry.family(), Family::Star);
    }

    #[rstest]
    fn interspecies_links_every_node_to_itself(mut rng: SmallRng) {
        let geometry = GeometryBuilder::new()
            .with_descriptor("n")
            .with_size(25)
            .with_interspecies(true)
            .build(&mut rng)
            .expect("valid");
        assert!(geometry.is_interspecies());
        assert!((0..25).all(|node| geometry.is_neighbour(node, node)));
        geometry.invariants().check_all().expect("consistent");
    }

    #[rstest]
    fn rewiring_is_applied(mut rng: SmallRng) {
        let (geometry, report) = GeometryBuilder::new()
            .with_descriptor("n")
            .with_size(400)
            .with_rewire(0.3)
            .build_with_report(&mut rng)
            .expect("valid");
        let rewire = report.rewire.expect("rewiring ran");
        assert!(rewire.swapped > 0);
        assert!(geometry.is_rewired());
        assert!(geometry.store().is_connected());
    }

    #[test]
    fn descriptor_carries_overrides() {
        let descriptor = GeometryBuilder::new()
            .with_descriptor("r3")
            .with_size(30)
            .with_add(0.5)
            .descriptor();
        assert_eq!(descriptor.size(), 30);
        assert_eq!(descriptor.add(), 0.5);
        assert_eq!(descriptor.family(), Family::RandomGraph);
    }
}
