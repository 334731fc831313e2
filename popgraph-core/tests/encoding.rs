//! Persisted geometries survive a JSON round trip.

mod support;

use popgraph_core::{EncodedGeometry, Geometry, GeometryBuilder, GeometryError};
use rstest::rstest;
use support::{build, rng, sorted_links};

fn round_trip(geometry: &Geometry) -> Geometry {
    let json = serde_json::to_string(&geometry.encode()).expect("encodes");
    let encoded: EncodedGeometry = serde_json::from_str(&json).expect("decodes");
    Geometry::decode(&encoded).expect("valid encoding")
}

#[rstest]
#[case("r4", 120)]
#[case("p3", 200)]
#[case("k4", 150)]
#[case("R2", 40)]
fn random_geometries_keep_their_links(#[case] descriptor: &str, #[case] size: usize) {
    let geometry = build(descriptor, size, 8);
    let restored = round_trip(&geometry);
    assert_eq!(sorted_links(&restored), sorted_links(&geometry));
    assert_eq!(restored.family(), geometry.family());
    assert!(restored.invariants().check_all().is_ok());
}

#[test]
fn rewired_lattice_is_stored_explicitly() {
    let geometry = GeometryBuilder::new()
        .with_descriptor("m")
        .with_size(100)
        .with_rewire(0.2)
        .build(&mut rng(4))
        .expect("valid configuration");
    let encoded = geometry.encode();
    assert!(encoded.links.is_some());
    let restored = round_trip(&geometry);
    assert!(restored.is_rewired());
    assert!(!restored.is_lattice());
    assert!(restored.is_regular());
    assert_eq!(sorted_links(&restored), sorted_links(&geometry));
}

#[rstest]
#[case("Hn2", 32)]
#[case("+3,4", 58)]
#[case("S", 28)]
#[case("7", 20)]
fn deterministic_geometries_are_regenerated(#[case] descriptor: &str, #[case] size: usize) {
    let geometry = build(descriptor, size, 8);
    let encoded = geometry.encode();
    assert!(encoded.links.is_none());
    assert_eq!(encoded.size, size);
    let restored = round_trip(&geometry);
    assert_eq!(restored.store(), geometry.store());
    assert!(!restored.is_unique());
}

#[test]
fn interspecies_flag_is_preserved() {
    let geometry = GeometryBuilder::new()
        .with_descriptor("r3")
        .with_size(30)
        .with_interspecies(true)
        .build(&mut rng(1))
        .expect("valid configuration");
    let restored = round_trip(&geometry);
    assert!(restored.is_interspecies());
    assert!((0..30).all(|node| restored.is_neighbour(node, node)));
    assert!((restored.connectivity() - geometry.connectivity()).abs() < 1e-9);
}

#[test]
fn truncated_encoding_is_rejected() {
    let geometry = build("r3", 30, 1);
    let mut encoded = geometry.encode();
    if let Some(links) = encoded.links.as_mut() {
        links.pop();
    }
    assert_eq!(
        Geometry::decode(&encoded),
        Err(GeometryError::EncodingSizeMismatch {
            expected: 30,
            found: 29
        })
    );
}
