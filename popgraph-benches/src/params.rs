//! Benchmark parameter types.
//!
//! Each type renders as a compact Criterion benchmark identifier.

use std::fmt;

use popgraph_core::{Geometry, GeometryBuilder};
use rand::{SeedableRng, rngs::SmallRng};

use crate::error::BenchSetupError;

/// A geometry descriptor and requested population size.
#[derive(Clone, Debug)]
pub struct GeometryBenchParams {
    /// Descriptor text, for example `r4` or `B3`.
    pub descriptor: &'static str,
    /// Requested population size.
    pub size: usize,
}

impl GeometryBenchParams {
    /// Builds the geometry described by these parameters from `seed`.
    ///
    /// # Errors
    /// Returns [`BenchSetupError::Geometry`] when the geometry cannot be
    /// constructed.
    pub fn build(&self, seed: u64) -> Result<Geometry, BenchSetupError> {
        let mut rng = SmallRng::seed_from_u64(seed);
        Ok(self.builder().build(&mut rng)?)
    }

    fn builder(&self) -> GeometryBuilder {
        GeometryBuilder::new()
            .with_descriptor(self.descriptor)
            .with_size(self.size)
    }
}

impl fmt::Display for GeometryBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},n={}", self.descriptor, self.size)
    }
}

/// Parameters for a rewiring benchmark run.
#[derive(Clone, Debug)]
pub struct RewireBenchParams {
    /// Geometry that gets rewired.
    pub geometry: GeometryBenchParams,
    /// Fraction of links to rewire.
    pub probability: f64,
}

impl RewireBenchParams {
    /// Builds and rewires the geometry from `seed`. The returned geometry
    /// keeps the rewiring probability, so calling [`Geometry::rewire`] on a
    /// clone repeats the pass.
    ///
    /// # Errors
    /// Returns [`BenchSetupError::Geometry`] when the geometry cannot be
    /// constructed.
    pub fn build(&self, seed: u64) -> Result<Geometry, BenchSetupError> {
        let mut rng = SmallRng::seed_from_u64(seed);
        Ok(self
            .geometry
            .builder()
            .with_rewire(self.probability)
            .build(&mut rng)?)
    }
}

impl fmt::Display for RewireBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},p={}", self.geometry, self.probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(GeometryBenchParams { descriptor: "r4", size: 100 }, "r4,n=100")]
    #[case(GeometryBenchParams { descriptor: "Hc2,5", size: 40 }, "Hc2,5,n=40")]
    fn geometry_params_render_as_identifiers(
        #[case] params: GeometryBenchParams,
        #[case] expected: &str,
    ) {
        assert_eq!(params.to_string(), expected);
    }

    #[test]
    fn rewire_params_include_probability() {
        let params = RewireBenchParams {
            geometry: GeometryBenchParams {
                descriptor: "n",
                size: 100,
            },
            probability: 0.25,
        };
        assert_eq!(params.to_string(), "n,n=100,p=0.25");
    }

    #[test]
    fn build_resolves_feasible_size() -> Result<(), BenchSetupError> {
        let geometry = GeometryBenchParams {
            descriptor: "n",
            size: 99,
        }
        .build(3)?;
        assert_eq!(geometry.size(), 100);
        Ok(())
    }
}
