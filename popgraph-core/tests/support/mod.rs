//! Helpers shared by the integration suites.

use popgraph_core::{Geometry, GeometryBuilder};
use rand::{SeedableRng, rngs::SmallRng};

#[must_use]
pub fn rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// Builds and initialises a geometry, panicking on misuse.
#[must_use]
pub fn build(descriptor: &str, size: usize, seed: u64) -> Geometry {
    GeometryBuilder::new()
        .with_descriptor(descriptor)
        .with_size(size)
        .build(&mut rng(seed))
        .expect("geometry configuration is valid")
}

/// Sorted outgoing lists of every node.
#[must_use]
pub fn sorted_links(geometry: &Geometry) -> Vec<Vec<usize>> {
    (0..geometry.size())
        .map(|node| {
            let mut out = geometry.out_neighbours(node).to_vec();
            out.sort_unstable();
            out
        })
        .collect()
}
