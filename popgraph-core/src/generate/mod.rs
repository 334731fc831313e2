//! Topology generators.
//!
//! Every family owns a feasibility routine, which adjusts the descriptor to
//! the nearest admissible parameters, and a generator, which fills an empty
//! [`AdjacencyStore`]. [`ops`] maps a [`Family`] onto that pair so each
//! family's logic stays isolated in its own module.

mod amplifier;
mod degree;
mod growth;
pub(crate) mod hierarchy;
mod lattice;
mod random;
mod star;
mod symmetric;

use rand::RngCore;
use tracing::error;

use crate::{
    descriptor::{Family, GeometryDescriptor},
    store::AdjacencyStore,
};

/// Number of attempts granted to stochastic generators before falling back
/// to a well-mixed population.
pub const MAX_ATTEMPTS: usize = 10;

/// Raised by a generator when a stochastic construction could not complete.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct GenerationFailure {
    pub(crate) reason: &'static str,
}

impl GenerationFailure {
    pub(crate) const fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

pub(crate) type FeasibleFn = fn(&mut GeometryDescriptor);
pub(crate) type GenerateFn =
    fn(&GeometryDescriptor, &mut AdjacencyStore, &mut dyn RngCore) -> Result<(), GenerationFailure>;

/// Feasibility and generation routines of a single family.
#[derive(Clone, Copy)]
pub(crate) struct FamilyOps {
    pub(crate) feasible: FeasibleFn,
    pub(crate) generate: GenerateFn,
}

/// Returns the routines responsible for `family`.
pub(crate) const fn ops(family: Family) -> FamilyOps {
    let (feasible, generate): (FeasibleFn, GenerateFn) = match family {
        Family::WellMixed | Family::Invalid => (feasible_well_mixed, generate_nothing),
        Family::Complete => (feasible_complete, generate_complete),
        Family::Hierarchy => (hierarchy::feasible, hierarchy::generate),
        Family::Linear => (lattice::feasible_linear, lattice::generate_linear),
        Family::VonNeumann | Family::Moore | Family::Square => {
            (lattice::feasible_square, lattice::generate_square)
        }
        Family::Cubic => (lattice::feasible_cubic, lattice::generate_cubic),
        Family::Honeycomb => (lattice::feasible_honeycomb, lattice::generate_honeycomb),
        Family::Triangular => (lattice::feasible_triangular, lattice::generate_triangular),
        Family::Star => (star::feasible_star, star::generate_star),
        Family::Wheel => (star::feasible_wheel, star::generate_wheel),
        Family::Superstar => (star::feasible_superstar, star::generate_superstar),
        Family::StrongAmplifier => (amplifier::feasible_amplifier, amplifier::generate_amplifier),
        Family::StrongSuppressor => {
            (amplifier::feasible_suppressor, amplifier::generate_suppressor)
        }
        Family::Frucht
        | Family::Tietze
        | Family::Franklin
        | Family::Heawood
        | Family::Icosahedron
        | Family::Dodecahedron
        | Family::Desargues => (symmetric::feasible, symmetric::generate),
        Family::RandomGraph => (random::feasible_undirected, random::generate_undirected),
        Family::RandomDirected => (random::feasible_directed, random::generate_directed),
        Family::RandomRegular => (degree::feasible_regular, degree::generate_regular),
        Family::ScaleFree => (degree::feasible_power_law, degree::generate_power_law),
        Family::ScaleFreeBa => (growth::feasible_barabasi_albert, growth::generate_barabasi_albert),
        Family::ScaleFreeKlemm => (growth::feasible_klemm, growth::generate_klemm),
    };
    FamilyOps { feasible, generate }
}

/// Result of [`populate`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct GenerationReport {
    pub(crate) attempts: usize,
    pub(crate) fell_back: bool,
}

/// Fills `store` for the (already feasible) `descriptor`.
///
/// Stochastic generators are retried up to [`MAX_ATTEMPTS`] times; when all
/// attempts fail the descriptor is replaced by a well-mixed population of the
/// same size and the failure is logged.
pub(crate) fn populate(
    descriptor: &mut GeometryDescriptor,
    store: &mut AdjacencyStore,
    rng: &mut dyn RngCore,
) -> GenerationReport {
    let generate = ops(descriptor.family).generate;
    populate_with(descriptor, store, rng, generate)
}

fn populate_with(
    descriptor: &mut GeometryDescriptor,
    store: &mut AdjacencyStore,
    rng: &mut dyn RngCore,
    generate: GenerateFn,
) -> GenerationReport {
    let family = descriptor.family;
    let attempts = if family.is_random() { MAX_ATTEMPTS } else { 1 };
    let mut last_failure = None;
    for attempt in 1..=attempts {
        store.clear_links();
        match generate(descriptor, store, rng) {
            Ok(()) => {
                return GenerationReport {
                    attempts: attempt,
                    fell_back: false,
                };
            }
            Err(failure) => {
                #[cfg(feature = "metrics")]
                metrics::counter!("geometry_generation_retries").increment(1);
                last_failure = Some(failure);
            }
        }
    }
    error!(
        family = %family,
        attempts,
        reason = last_failure.map_or("unknown", |f| f.reason),
        "generation failed; falling back to a well-mixed population"
    );
    store.clear_links();
    // well-mixed admits no rewiring, so the probabilities are not carried over
    *descriptor = GeometryDescriptor::new(Family::WellMixed).with_size(descriptor.size);
    feasible_well_mixed(descriptor);
    store.set_undirected(true);
    GenerationReport {
        attempts,
        fell_back: true,
    }
}

fn feasible_well_mixed(descriptor: &mut GeometryDescriptor) {
    descriptor.family = Family::WellMixed;
    descriptor.connectivity = descriptor.size.saturating_sub(1) as f64;
    descriptor.directed = false;
    descriptor.regular = true;
}

fn feasible_complete(descriptor: &mut GeometryDescriptor) {
    descriptor.size = descriptor.size.max(2);
    descriptor.connectivity = (descriptor.size - 1) as f64;
    descriptor.directed = false;
    descriptor.regular = true;
}

fn generate_nothing(
    _descriptor: &GeometryDescriptor,
    _store: &mut AdjacencyStore,
    _rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    Ok(())
}

fn generate_complete(
    descriptor: &GeometryDescriptor,
    store: &mut AdjacencyStore,
    _rng: &mut dyn RngCore,
) -> Result<(), GenerationFailure> {
    for a in 0..descriptor.size {
        for b in (a + 1)..descriptor.size {
            store.add_edge(a, b);
        }
    }
    Ok(())
}

/// Rounds `value` to the closest candidate, preferring the smaller one on
/// ties. Returns `None` for an empty candidate list.
pub(crate) fn nearest(candidates: &[usize], value: f64) -> Option<usize> {
    candidates.iter().copied().min_by(|&a, &b| {
        let da = (a as f64 - value).abs();
        let db = (b as f64 - value).abs();
        da.total_cmp(&db).then(a.cmp(&b))
    })
}

/// Largest integer whose `exp`-th power does not exceed `value`, or the
/// nearest one when `round` is set.
pub(crate) fn integer_root(value: usize, exp: u32, round: bool) -> usize {
    let approx = (value as f64).powf(1.0 / f64::from(exp));
    let mut root = if round { approx.round() } else { approx.floor() } as usize;
    if !round {
        while root > 0 && root.pow(exp) > value {
            root -= 1;
        }
        while (root + 1).pow(exp) <= value {
            root += 1;
        }
    }
    root
}
