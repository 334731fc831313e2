//! Rewiring and link additions through the public API.

mod support;

use popgraph_core::{GeometryBuilder, GeometryInvariant, swap_count};
use popgraph_test_support::tracing::capture;
use rstest::rstest;
use support::{build, rng};
use tracing::Level;

#[rstest]
#[case("n", 400, 0.05)]
#[case("m", 225, 0.3)]
#[case("t", 64, 1.0)]
#[case("g4", 200, 0.5)]
#[case("B3", 300, 0.2)]
fn rewiring_preserves_every_degree(
    #[case] descriptor: &str,
    #[case] size: usize,
    #[case] probability: f64,
) {
    let original = build(descriptor, size, 4);
    let (rewired, report) = GeometryBuilder::new()
        .with_descriptor(descriptor)
        .with_size(size)
        .with_rewire(probability)
        .build_with_report(&mut rng(4))
        .expect("valid configuration");
    let rewire = report.rewire.expect("rewiring ran");
    assert_eq!(rewire.requested, swap_count(original.store().edge_count(), probability));
    assert!(rewire.swapped > 0);
    assert!(rewired.is_unique());
    for node in 0..original.size() {
        assert_eq!(rewired.out_degree(node), original.out_degree(node));
    }
    rewired
        .invariants()
        .check_many([
            GeometryInvariant::NoSelfLoops,
            GeometryInvariant::NoDuplicateLinks,
            GeometryInvariant::Symmetry,
            GeometryInvariant::Connectivity,
        ])
        .expect("rewiring keeps the graph simple and connected");
}

#[test]
fn rewired_lattice_is_no_longer_a_lattice() {
    let geometry = GeometryBuilder::new()
        .with_descriptor("n")
        .with_size(100)
        .with_rewire(0.1)
        .build(&mut rng(1))
        .expect("valid configuration");
    assert!(geometry.is_rewired());
    assert!(!geometry.is_lattice());
    assert!(geometry.is_regular());
}

#[test]
fn interspecies_loops_survive_rewiring() {
    let geometry = GeometryBuilder::new()
        .with_descriptor("n")
        .with_size(64)
        .with_rewire(0.5)
        .with_interspecies(true)
        .build(&mut rng(2))
        .expect("valid configuration");
    assert!((0..64).all(|node| geometry.is_neighbour(node, node)));
    assert!(geometry.invariants().collect_all().is_empty());
}

#[test]
fn directed_rewiring_is_ignored_with_a_warning() {
    let ((geometry, report), layer) = capture(|| {
        GeometryBuilder::new()
            .with_descriptor("R3")
            .with_size(50)
            .with_rewire(0.4)
            .build_with_report(&mut rng(3))
            .expect("valid configuration")
    });
    assert_eq!(report.rewire.map(|r| r.swapped), Some(0));
    assert!(!geometry.is_rewired());
    assert!(layer.events_at(Level::WARN).iter().any(|event| {
        event.message() == Some("rewiring directed graphs is not supported")
    }));
}

#[rstest]
#[case("r4", 100, 0.25, 50)]
#[case("R2", 100, 0.1, 20)]
fn additions_add_the_requested_links(
    #[case] descriptor: &str,
    #[case] size: usize,
    #[case] probability: f64,
    #[case] expected: usize,
) {
    let (geometry, report) = GeometryBuilder::new()
        .with_descriptor(descriptor)
        .with_size(size)
        .with_add(probability)
        .build_with_report(&mut rng(6))
        .expect("valid configuration");
    assert_eq!(report.added, expected);
    assert!(!geometry.is_regular());
    assert!(geometry.invariants().check(GeometryInvariant::Backlinks).is_ok());
}
