//! Persisted form of a geometry.
//!
//! Geometries that can be rebuilt from their descriptor (lattices,
//! hand-coded graphs, amplifiers and other deterministic families) are
//! stored as the descriptor alone. Unique geometries (random families, or
//! anything rewired) additionally store every node's outgoing neighbours;
//! incoming lists are reconstructed on load.

use rand::{SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};

use crate::{
    descriptor::{Family, GeometryDescriptor},
    error::{GeometryError, Result},
    geometry::Geometry,
    store::AdjacencyStore,
};

/// Serialisable snapshot of a [`Geometry`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodedGeometry {
    /// Descriptor in its textual form.
    pub descriptor: String,
    /// Population size.
    pub size: usize,
    /// Whether nodes are linked to their counterpart in the other species.
    #[serde(default)]
    pub interspecies: bool,
    /// Outgoing neighbours per node; present only for unique geometries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Vec<usize>>>,
}

impl Geometry {
    /// Captures the geometry in its persisted form.
    #[must_use]
    pub fn encode(&self) -> EncodedGeometry {
        let links = self.is_unique().then(|| {
            (0..self.size())
                .map(|node| self.store.out_neighbours(node).to_vec())
                .collect()
        });
        EncodedGeometry {
            descriptor: self.descriptor.to_string(),
            size: self.size(),
            interspecies: self.interspecies,
            links,
        }
    }

    /// Restores a geometry from its persisted form.
    ///
    /// # Errors
    /// Returns [`GeometryError::ZeroSize`] for empty encodings,
    /// [`GeometryError::UnknownDescriptor`] when a descriptor without links
    /// does not parse, [`GeometryError::EncodingSizeMismatch`] when the
    /// number of neighbour lists disagrees with `size`, and
    /// [`GeometryError::EncodedLinkOutOfRange`] for links to unknown nodes.
    pub fn decode(encoded: &EncodedGeometry) -> Result<Self> {
        let descriptor = GeometryDescriptor::parse(&encoded.descriptor).with_size(encoded.size);
        match &encoded.links {
            Some(links) => Self::decode_links(descriptor, encoded, links),
            None => Self::regenerate(descriptor, encoded),
        }
    }

    fn regenerate(descriptor: GeometryDescriptor, encoded: &EncodedGeometry) -> Result<Self> {
        if descriptor.family == Family::Invalid || descriptor.family.is_random() {
            return Err(GeometryError::UnknownDescriptor {
                descriptor: encoded.descriptor.clone(),
            });
        }
        let mut geometry = Self::new(descriptor)?;
        geometry.interspecies = encoded.interspecies;
        // deterministic families never draw from the generator
        let mut rng = SmallRng::seed_from_u64(0);
        let _ = geometry.init(&mut rng);
        Ok(geometry)
    }

    fn decode_links(
        mut descriptor: GeometryDescriptor,
        encoded: &EncodedGeometry,
        links: &[Vec<usize>],
    ) -> Result<Self> {
        let size = encoded.size;
        if size == 0 {
            return Err(GeometryError::ZeroSize);
        }
        if links.len() != size {
            return Err(GeometryError::EncodingSizeMismatch {
                expected: size,
                found: links.len(),
            });
        }
        for (node, targets) in links.iter().enumerate() {
            if let Some(&target) = targets.iter().find(|&&target| target >= size) {
                return Err(GeometryError::EncodedLinkOutOfRange { node, target, size });
            }
        }
        let mut store = AdjacencyStore::new(size);
        store.replace_outgoing(links.to_vec());
        store.set_self_loops(encoded.interspecies);
        let undirected = store.is_symmetric();
        store.set_undirected(undirected);
        let stats = store.stats();
        descriptor.directed = !undirected;
        descriptor.regular = stats.min_out == stats.max_out;
        descriptor.connectivity = if encoded.interspecies {
            stats.avg_out - 1.0
        } else {
            stats.avg_out
        };
        let rewired = !descriptor.family.is_random();
        Ok(Self {
            descriptor,
            store,
            rewired,
            valid: true,
            interspecies: encoded.interspecies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};
    use rstest::rstest;

    fn built(text: &str, size: usize, seed: u64) -> Geometry {
        let mut geometry =
            Geometry::new(GeometryDescriptor::parse(text).with_size(size)).expect("non-empty");
        let mut rng = SmallRng::seed_from_u64(seed);
        let _ = geometry.init(&mut rng);
        geometry
    }

    fn neighbour_sets(geometry: &Geometry) -> Vec<(Vec<usize>, Vec<usize>)> {
        (0..geometry.size())
            .map(|node| {
                let mut out = geometry.out_neighbours(node).to_vec();
                let mut inc = geometry.in_neighbours(node).to_vec();
                out.sort_unstable();
                inc.sort_unstable();
                (out, inc)
            })
            .collect()
    }

    #[rstest]
    #[case("r3", 60)]
    #[case("R2", 40)]
    #[case("B4", 80)]
    fn unique_geometries_round_trip(#[case] text: &str, #[case] size: usize) {
        let geometry = built(text, size, 13);
        let encoded = geometry.encode();
        assert!(encoded.links.is_some());
        let json = serde_json::to_string(&encoded).expect("serialise");
        let parsed: EncodedGeometry = serde_json::from_str(&json).expect("deserialise");
        let decoded = Geometry::decode(&parsed).expect("decode");
        assert_eq!(neighbour_sets(&decoded), neighbour_sets(&geometry));
        assert_eq!(decoded.is_undirected(), geometry.is_undirected());
    }

    #[rstest]
    #[case("nf", 49)]
    #[case("A", 45)]
    #[case("6", 20)]
    fn regeneratable_geometries_store_descriptor_only(#[case] text: &str, #[case] size: usize) {
        let geometry = built(text, size, 1);
        let encoded = geometry.encode();
        assert!(encoded.links.is_none());
        let decoded = Geometry::decode(&encoded).expect("regenerate");
        assert_eq!(decoded.store(), geometry.store());
    }

    #[test]
    fn size_mismatch_is_reported() {
        let encoded = EncodedGeometry {
            descriptor: "r4".into(),
            size: 3,
            interspecies: false,
            links: Some(vec![vec![1], vec![0]]),
        };
        assert_eq!(
            Geometry::decode(&encoded),
            Err(GeometryError::EncodingSizeMismatch {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn out_of_range_link_is_reported() {
        let encoded = EncodedGeometry {
            descriptor: "r4".into(),
            size: 2,
            interspecies: false,
            links: Some(vec![vec![1], vec![7]]),
        };
        let err = Geometry::decode(&encoded).expect_err("out of range");
        assert_eq!(err.code().as_str(), "GEOMETRY_ENCODED_LINK_OUT_OF_RANGE");
    }

    #[test]
    fn random_descriptor_without_links_is_rejected() {
        let encoded = EncodedGeometry {
            descriptor: "g3".into(),
            size: 20,
            interspecies: false,
            links: None,
        };
        assert!(matches!(
            Geometry::decode(&encoded),
            Err(GeometryError::UnknownDescriptor { .. })
        ));
    }
}
