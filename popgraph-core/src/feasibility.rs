//! Feasibility checking of geometry descriptors.
//!
//! The checker derives the nearest feasible size and connectivity for the
//! requested family, logs every substitution it makes and reports whether the
//! change is structural (the population size moved, so the host must reset)
//! or only requires regenerating the links. Running it again on an already
//! feasible descriptor is a no-op.

use tracing::{debug, warn};

use crate::{
    descriptor::{Family, GeometryDescriptor},
    generate::ops,
};

const CONNECTIVITY_TOLERANCE: f64 = 1e-9;

/// Outcome of [`check_feasibility`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[must_use]
pub struct FeasibilityReport {
    /// The family was substituted (only for unparseable descriptors).
    pub family_changed: bool,
    /// The population size was adjusted.
    pub size_changed: bool,
    /// The connectivity was adjusted.
    pub connectivity_changed: bool,
    /// Rewiring or link-addition probabilities were clamped or dropped.
    pub probabilities_changed: bool,
}

impl FeasibilityReport {
    /// Returns `true` when the population size changed and the simulation
    /// must be reset.
    #[must_use]
    pub fn requires_reset(&self) -> bool {
        self.size_changed
    }

    /// Returns `true` when the links must be regenerated.
    #[must_use]
    pub fn requires_regeneration(&self) -> bool {
        self.family_changed
            || self.size_changed
            || self.connectivity_changed
            || self.probabilities_changed
    }
}

/// Returns `true` for families whose connectivity is chosen by the user, so
/// adjustments to it deserve a warning rather than a debug note.
fn takes_connectivity(family: Family) -> bool {
    matches!(
        family,
        Family::Linear
            | Family::Square
            | Family::Cubic
            | Family::RandomGraph
            | Family::RandomDirected
            | Family::RandomRegular
            | Family::ScaleFree
            | Family::ScaleFreeBa
            | Family::ScaleFreeKlemm
    )
}

/// Adjusts `descriptor` to the nearest feasible parameters of its family.
///
/// # Examples
/// ```
/// use popgraph_core::{GeometryDescriptor, check_feasibility};
///
/// let mut descriptor = GeometryDescriptor::parse("n").with_size(99);
/// let report = check_feasibility(&mut descriptor);
/// assert!(report.requires_reset());
/// assert_eq!(descriptor.size(), 100);
/// assert!(!check_feasibility(&mut descriptor).requires_regeneration());
/// ```
pub fn check_feasibility(descriptor: &mut GeometryDescriptor) -> FeasibilityReport {
    let requested = descriptor.clone();
    if descriptor.family == Family::Invalid {
        warn!(
            requested = %requested,
            "unrecognised geometry; substituting a well-mixed population"
        );
        descriptor.family = Family::WellMixed;
    }
    (ops(descriptor.family).feasible)(descriptor);
    let probabilities_changed = sanitise_probabilities(descriptor);

    let report = FeasibilityReport {
        family_changed: descriptor.family != requested.family,
        size_changed: descriptor.size != requested.size,
        connectivity_changed: (descriptor.connectivity - requested.connectivity).abs()
            > CONNECTIVITY_TOLERANCE,
        probabilities_changed,
    };
    let family = descriptor.family;
    if report.size_changed {
        warn!(
            family = %family,
            requested = requested.size,
            resolved = descriptor.size,
            "population size adjusted to a feasible value"
        );
    }
    if report.connectivity_changed {
        if takes_connectivity(family) && !report.family_changed {
            warn!(
                family = %family,
                requested = requested.connectivity,
                resolved = descriptor.connectivity,
                "connectivity adjusted to a feasible value"
            );
        } else {
            debug!(
                family = %family,
                resolved = descriptor.connectivity,
                "connectivity derived from family"
            );
        }
    }
    report
}

fn sanitise_probabilities(descriptor: &mut GeometryDescriptor) -> bool {
    let before = (descriptor.rewire, descriptor.add);
    for probability in [&mut descriptor.rewire, &mut descriptor.add] {
        *probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
    }
    if !descriptor.family.allows_rewiring() && (descriptor.rewire > 0.0 || descriptor.add > 0.0) {
        warn!(
            family = %descriptor.family,
            rewire = descriptor.rewire,
            add = descriptor.add,
            "family does not support rewiring; probabilities dropped"
        );
        descriptor.rewire = 0.0;
        descriptor.add = 0.0;
    }
    // NaN never compares equal, so a sanitised NaN always counts as a change.
    before != (descriptor.rewire, descriptor.add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use popgraph_test_support::tracing::capture;
    use rstest::rstest;
    use tracing::Level;

    #[rstest]
    #[case("M", 10)]
    #[case("c", 10)]
    #[case("Hc4,5w0.2", 97)]
    #[case("l4", 3)]
    #[case("N20", 99)]
    #[case("C30", 70)]
    #[case("h", 70)]
    #[case("t", 70)]
    #[case("s", 2)]
    #[case("w", 2)]
    #[case("+3,4", 60)]
    #[case("A", 100)]
    #[case("S", 100)]
    #[case("4", 10)]
    #[case("r3.3", 77)]
    #[case("R1.5", 10)]
    #[case("g5", 31)]
    #[case("p3,2.2", 333)]
    #[case("B5", 50)]
    #[case("k3,0.4", 50)]
    #[case("?!", 10)]
    fn checker_is_idempotent(#[case] text: &str, #[case] size: usize) {
        let mut descriptor = GeometryDescriptor::parse(text).with_size(size);
        let _ = check_feasibility(&mut descriptor);
        let settled = descriptor.clone();
        let again = check_feasibility(&mut descriptor);
        assert!(!again.requires_regeneration(), "{text} oscillated: {again:?}");
        assert_eq!(descriptor, settled);
    }

    #[test]
    fn invalid_family_becomes_well_mixed() {
        let mut descriptor = GeometryDescriptor::parse("zzz").with_size(10);
        let report = check_feasibility(&mut descriptor);
        assert!(report.family_changed);
        assert!(!report.requires_reset());
        assert_eq!(descriptor.family(), Family::WellMixed);
        assert_eq!(descriptor.connectivity(), 9.0);
    }

    #[test]
    fn rewiring_is_dropped_for_complete_graphs() {
        let mut descriptor = GeometryDescriptor::parse("c")
            .with_size(10)
            .with_rewire(0.3)
            .with_add(2.0);
        let report = check_feasibility(&mut descriptor);
        assert!(report.probabilities_changed);
        assert_eq!(descriptor.rewire(), 0.0);
        assert_eq!(descriptor.add(), 0.0);
    }

    #[test]
    fn probabilities_are_clamped() {
        let mut descriptor = GeometryDescriptor::parse("n")
            .with_size(100)
            .with_rewire(-1.0)
            .with_add(f64::NAN);
        let report = check_feasibility(&mut descriptor);
        assert!(report.probabilities_changed);
        assert_eq!(descriptor.rewire(), 0.0);
        assert_eq!(descriptor.add(), 0.0);
    }

    #[test]
    fn size_correction_is_logged() {
        let (report, layer) = capture(|| {
            let mut descriptor = GeometryDescriptor::parse("N8").with_size(50);
            check_feasibility(&mut descriptor)
        });
        assert!(report.requires_reset());
        assert!(layer.events_at(Level::WARN).iter().any(|event| {
            event.field("requested") == Some("50") && event.field("resolved") == Some("49")
        }));
    }

    #[test]
    fn unsupported_rewiring_is_logged() {
        let (_, layer) = capture(|| {
            let mut descriptor = GeometryDescriptor::parse("M").with_size(10).with_rewire(0.5);
            check_feasibility(&mut descriptor)
        });
        assert!(layer.events_at(Level::WARN).iter().any(|event| {
            event.message() == Some("family does not support rewiring; probabilities dropped")
        }));
    }
}
