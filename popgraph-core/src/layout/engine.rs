//! Relaxation loop and control protocol shared by both dimensions.

use std::{
    f64::consts::TAU,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use rand::{Rng, SeedableRng, rngs::SmallRng};
use tracing::{debug, info, instrument};

use super::{
    config::{LayoutConfig, SweepMode},
    forces::Forces,
    status::{LayoutListener, LayoutOutcome, LayoutProgress, LayoutStatus, Termination},
    vector::{Vec2, Vec3, Vector},
};
use crate::{error::LayoutError, geometry::Geometry};

/// Random offset added to the initial spiral so symmetric graphs can unfold.
const JITTER: f64 = 0.1;

/// Bounds of the degree-scaled node radius.
const MIN_RADIUS: f64 = 0.5;
const MAX_RADIUS: f64 = 4.0;

/// Cooperative cancellation flag for a running [`Layout`]. Clones share the
/// flag and can be moved to other threads.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Requests that the current run stops before its next relaxation step.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns `true` while a cancellation is pending.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::Relaxed)
    }
}

/// Force-directed layout of a geometry in the dimension of `V`.
///
/// # Examples
/// ```
/// use popgraph_core::{GeometryBuilder, Layout2D, LayoutConfig, LayoutStatus};
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let mut rng = SmallRng::seed_from_u64(1);
/// let geometry = GeometryBuilder::new()
///     .with_descriptor("w")
///     .with_size(12)
///     .build(&mut rng)?;
/// let mut layout = Layout2D::new(LayoutConfig::default().with_max_sweeps(200))
///     .expect("default configuration is valid");
/// let outcome = layout.run(&geometry, &mut ()).expect("non-empty geometry");
/// assert_eq!(outcome.status, LayoutStatus::HasLayout);
/// assert_eq!(layout.positions().len(), 12);
/// # Ok::<(), popgraph_core::GeometryError>(())
/// ```
#[derive(Debug)]
pub struct Layout<V: Vector> {
    config: LayoutConfig,
    rng: SmallRng,
    status: LayoutStatus,
    positions: Vec<V>,
    radii: Vec<f64>,
    neighbours: Vec<Vec<usize>>,
    links: usize,
    potential: f64,
    previous: f64,
    sweeps: usize,
    run_sweeps: usize,
    visible_links: usize,
    cancel: CancelHandle,
}

/// Planar layout.
pub type Layout2D = Layout<Vec2>;
/// Spatial layout.
pub type Layout3D = Layout<Vec3>;

impl<V: Vector> Layout<V> {
    /// Creates an idle layout.
    ///
    /// # Errors
    /// Returns [`LayoutError::InvalidConfig`] when `config` fails
    /// [`LayoutConfig::validate`].
    pub fn new(config: LayoutConfig) -> Result<Self, LayoutError> {
        config.validate()?;
        let rng = SmallRng::seed_from_u64(config.seed());
        Ok(Self {
            config,
            rng,
            status: LayoutStatus::NeedsLayout,
            positions: Vec::new(),
            radii: Vec::new(),
            neighbours: Vec::new(),
            links: 0,
            potential: 0.0,
            previous: 0.0,
            sweeps: 0,
            run_sweeps: 0,
            visible_links: 0,
            cancel: CancelHandle::default(),
        })
    }

    /// Current state.
    #[must_use]
    pub fn status(&self) -> LayoutStatus {
        self.status
    }

    /// Node positions; empty until a run has started.
    #[must_use]
    pub fn positions(&self) -> &[V] {
        &self.positions
    }

    /// Node radii, scaled by relative degree on heterogeneous graphs.
    #[must_use]
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    /// Sweeps performed since the positions were last initialised.
    #[must_use]
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    /// Total potential after the last sweep.
    #[must_use]
    pub fn potential(&self) -> f64 {
        self.potential
    }

    /// Links to draw; zero when the link count exceeds the display cap.
    #[must_use]
    pub fn visible_links(&self) -> usize {
        self.visible_links
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Handle that cancels the current or next run.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Marks existing positions stale after a topology change.
    pub fn invalidate(&mut self) {
        if self.status == LayoutStatus::HasLayout {
            self.status = LayoutStatus::AdjustLayout;
        }
    }

    /// Drops all positions.
    pub fn reset(&mut self) {
        self.status = LayoutStatus::NeedsLayout;
        self.positions.clear();
        self.radii.clear();
        self.neighbours.clear();
        self.links = 0;
        self.potential = 0.0;
        self.previous = 0.0;
        self.sweeps = 0;
        self.run_sweeps = 0;
        self.visible_links = 0;
    }

    /// Synchronises with `geometry` ahead of relaxation. Positions are
    /// (re)initialised when missing or when a fresh layout is needed; a
    /// changed neighbourhood turns an existing layout into
    /// [`LayoutStatus::AdjustLayout`].
    ///
    /// Hosts that schedule work themselves call this once, then drive
    /// [`Layout::step`] (or [`Layout::relax`] per node) and close the run
    /// with [`Layout::finish`].
    ///
    /// # Errors
    /// Returns [`LayoutError::EmptyGeometry`] when `geometry` holds no
    /// nodes.
    pub fn prepare(&mut self, geometry: &Geometry) -> Result<LayoutStatus, LayoutError> {
        let store = geometry.store();
        let size = store.len();
        if size == 0 {
            return Err(LayoutError::EmptyGeometry);
        }
        if geometry.is_well_mixed() || geometry.is_lattice() {
            self.reset();
            self.status = LayoutStatus::NoLayout;
            return Ok(self.status);
        }
        if size > self.config.max_display_nodes() {
            self.reset();
            self.status = LayoutStatus::HasMessage;
            return Ok(self.status);
        }
        let neighbours = undirected_neighbours(geometry);
        if self.positions.len() != size
            || matches!(
                self.status,
                LayoutStatus::NeedsLayout | LayoutStatus::NoLayout | LayoutStatus::HasMessage
            )
        {
            self.neighbours = neighbours;
            self.initialise(geometry.is_regular());
            self.status = LayoutStatus::NeedsLayout;
        } else if self.neighbours != neighbours {
            self.neighbours = neighbours;
            self.radii = scaled_radii(&self.neighbours, geometry.is_regular());
            self.status = LayoutStatus::AdjustLayout;
        }
        self.links = drawable_links(geometry);
        Ok(self.status)
    }

    fn initialise(&mut self, regular: bool) {
        let size = self.neighbours.len();
        let phase = self.rng.gen_range(0.0..TAU);
        let mut positions = Vec::with_capacity(size);
        positions.push(V::default());
        for node in 1..size {
            let jitter = V::random_unit(&mut self.rng) * JITTER;
            positions.push(V::spiral(node, size, phase) + jitter);
        }
        self.positions = positions;
        self.radii = scaled_radii(&self.neighbours, regular);
        self.sweeps = 0;
        self.potential = 0.0;
        self.visible_links = 0;
    }

    /// Moves `node` one step of size `dt` along its net force and returns
    /// the distance moved, or `None` for unknown nodes. A prepared layout
    /// enters [`LayoutStatus::InProgress`].
    pub fn relax(&mut self, node: usize, dt: f64) -> Option<f64> {
        if node >= self.positions.len() {
            return None;
        }
        if matches!(
            self.status,
            LayoutStatus::NeedsLayout | LayoutStatus::AdjustLayout
        ) {
            self.begin();
        }
        let forces = Forces::new::<V>(&self.neighbours, dt, self.config.max_step());
        let (step, _) = forces.step(node, &self.positions);
        let position = self.positions.get_mut(node)?;
        *position = *position + step;
        Some(step.length())
    }

    /// Relaxes the layout until the potential settles, the time budget or
    /// sweep limit runs out, or the run is cancelled.
    ///
    /// # Errors
    /// Returns [`LayoutError::EmptyGeometry`] when `geometry` holds no
    /// nodes.
    #[instrument(
        name = "layout.run",
        skip(self, geometry, listener),
        fields(size = geometry.size(), dim = V::DIM)
    )]
    pub fn run(
        &mut self,
        geometry: &Geometry,
        listener: &mut dyn LayoutListener,
    ) -> Result<LayoutOutcome, LayoutError> {
        let started = Instant::now();
        let status = self.prepare(geometry)?;
        if !status.needs_work() {
            let outcome = self.outcome(Termination::Skipped, 0, started);
            listener.on_complete(&outcome);
            return Ok(outcome);
        }
        Ok(self.relax_until_done(listener, started))
    }

    /// Perturbs every position by a random offset of length up to `quake`
    /// and relaxes again, to escape a local minimum.
    ///
    /// # Errors
    /// Returns [`LayoutError::InvalidConfig`] for a negative or non-finite
    /// `quake` and [`LayoutError::EmptyGeometry`] for an empty geometry.
    pub fn shake(
        &mut self,
        geometry: &Geometry,
        quake: f64,
        listener: &mut dyn LayoutListener,
    ) -> Result<LayoutOutcome, LayoutError> {
        if !quake.is_finite() || quake < 0.0 {
            return Err(LayoutError::InvalidConfig {
                field: "quake",
                reason: format!("must be non-negative and finite, got {quake}"),
            });
        }
        let started = Instant::now();
        let status = self.prepare(geometry)?;
        if matches!(status, LayoutStatus::NoLayout | LayoutStatus::HasMessage) {
            let outcome = self.outcome(Termination::Skipped, 0, started);
            listener.on_complete(&outcome);
            return Ok(outcome);
        }
        for position in &mut self.positions {
            let offset = V::random_unit(&mut self.rng) * (quake * self.rng.r#gen::<f64>());
            *position = *position + offset;
        }
        debug!(quake, "layout shaken");
        Ok(self.relax_until_done(listener, started))
    }

    /// Performs one full relaxation sweep and reports its progress. The
    /// first sweep after [`Layout::prepare`] enters
    /// [`LayoutStatus::InProgress`].
    ///
    /// Returns `None` when there is nothing to relax, or when a pending
    /// cancellation interrupted the sweep; the status then reverts to
    /// [`LayoutStatus::NeedsLayout`].
    pub fn step(&mut self) -> Option<LayoutProgress> {
        if !self.status.needs_work() || self.positions.is_empty() {
            return None;
        }
        if self.status != LayoutStatus::InProgress {
            self.begin();
        }
        let Some(potential) = self.sweep() else {
            self.status = LayoutStatus::NeedsLayout;
            debug!(sweeps = self.run_sweeps, "layout cancelled");
            return None;
        };
        #[cfg(feature = "metrics")]
        metrics::counter!("layout_sweeps").increment(1);
        self.run_sweeps += 1;
        self.sweeps += 1;
        self.potential = potential;
        let delta = relative_change(self.previous, potential);
        self.previous = potential;
        Some(LayoutProgress {
            sweep: self.run_sweeps,
            potential,
            delta,
            converged: delta < self.config.accuracy(),
        })
    }

    fn begin(&mut self) {
        self.status = LayoutStatus::InProgress;
        self.run_sweeps = 0;
        self.previous = Forces::new::<V>(&self.neighbours, self.config.dt(), self.config.max_step())
            .potential(&self.positions);
    }

    fn relax_until_done(
        &mut self,
        listener: &mut dyn LayoutListener,
        started: Instant,
    ) -> LayoutOutcome {
        self.begin();
        let termination = loop {
            let Some(progress) = self.step() else {
                break Termination::Cancelled;
            };
            listener.on_progress(&progress);
            if progress.converged {
                break Termination::Converged;
            }
            if started.elapsed() >= self.config.timeout() {
                break Termination::TimedOut;
            }
            if progress.sweep >= self.config.max_sweeps() {
                break Termination::SweepLimit;
            }
        };
        let sweeps = self.run_sweeps;
        if termination != Termination::Cancelled {
            self.finish();
            info!(
                sweeps,
                potential = self.potential,
                termination = ?termination,
                "layout finished"
            );
        }
        let outcome = self.outcome(termination, sweeps, started);
        listener.on_complete(&outcome);
        outcome
    }

    fn sweep(&mut self) -> Option<f64> {
        match self.config.sweep_mode() {
            SweepMode::Sequential => self.sweep_sequential(),
            SweepMode::Parallel => self.sweep_parallel(),
        }
    }

    fn sweep_sequential(&mut self) -> Option<f64> {
        let forces = Forces::new::<V>(&self.neighbours, self.config.dt(), self.config.max_step());
        let mut potential = 0.0;
        for node in 0..self.positions.len() {
            if self.cancel.take() {
                return None;
            }
            let (step, share) = forces.step(node, &self.positions);
            if let Some(position) = self.positions.get_mut(node) {
                *position = *position + step;
            }
            potential += share;
        }
        Some(potential)
    }

    #[cfg(feature = "parallel")]
    fn sweep_parallel(&mut self) -> Option<f64> {
        use rayon::prelude::*;

        if self.cancel.take() {
            return None;
        }
        let forces = Forces::new::<V>(&self.neighbours, self.config.dt(), self.config.max_step());
        let snapshot = &self.positions;
        let steps: Vec<(V, f64)> = (0..snapshot.len())
            .into_par_iter()
            .map(|node| forces.step(node, snapshot))
            .collect();
        let mut potential = 0.0;
        for (position, (step, share)) in self.positions.iter_mut().zip(steps) {
            *position = *position + step;
            potential += share;
        }
        Some(potential)
    }

    #[cfg(not(feature = "parallel"))]
    fn sweep_parallel(&mut self) -> Option<f64> {
        self.sweep_sequential()
    }

    /// Recentres the node cloud on the origin, recounts drawable links and
    /// marks the layout [`LayoutStatus::HasLayout`]. Layouts without
    /// positions, or that are not laid out by force, keep their status.
    pub fn finish(&mut self) -> LayoutStatus {
        if self.positions.is_empty()
            || matches!(self.status, LayoutStatus::NoLayout | LayoutStatus::HasMessage)
        {
            return self.status;
        }
        let sum = self
            .positions
            .iter()
            .fold(V::default(), |acc, &position| acc + position);
        let centroid = sum * (1.0 / self.positions.len() as f64);
        for position in &mut self.positions {
            *position = *position - centroid;
        }
        self.visible_links = if self.links <= self.config.max_links() {
            self.links
        } else {
            0
        };
        self.status = LayoutStatus::HasLayout;
        self.status
    }

    fn outcome(&self, termination: Termination, sweeps: usize, started: Instant) -> LayoutOutcome {
        LayoutOutcome {
            status: self.status,
            termination,
            sweeps,
            potential: self.potential,
            visible_links: self.visible_links,
            elapsed: started.elapsed(),
        }
    }
}

/// Neighbour lists ignoring direction and self-loops.
fn undirected_neighbours(geometry: &Geometry) -> Vec<Vec<usize>> {
    let store = geometry.store();
    (0..store.len())
        .map(|node| {
            let mut neighbours: Vec<usize> = store
                .out_neighbours(node)
                .iter()
                .chain(store.in_neighbours(node))
                .copied()
                .filter(|&other| other != node)
                .collect();
            neighbours.sort_unstable();
            neighbours.dedup();
            neighbours
        })
        .collect()
}

fn drawable_links(geometry: &Geometry) -> usize {
    let store = geometry.store();
    let loops = (0..store.len())
        .filter(|&node| store.contains_link(node, node))
        .count();
    let links = store.link_count() - loops;
    if geometry.is_undirected() {
        links / 2
    } else {
        links
    }
}

fn scaled_radii(neighbours: &[Vec<usize>], regular: bool) -> Vec<f64> {
    if regular || neighbours.is_empty() {
        return vec![1.0; neighbours.len()];
    }
    let total: usize = neighbours.iter().map(Vec::len).sum();
    let mean = (total as f64 / neighbours.len() as f64).max(1.0);
    neighbours
        .iter()
        .map(|list| (list.len() as f64 / mean).sqrt().clamp(MIN_RADIUS, MAX_RADIUS))
        .collect()
}

fn relative_change(previous: f64, current: f64) -> f64 {
    (previous - current).abs() / current.abs().max(f64::MIN_POSITIVE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GeometryBuilder, geometry::Geometry};
    use rand::rngs::SmallRng;
    use rstest::{fixture, rstest};
    use std::time::Duration;

    #[fixture]
    fn wheel() -> Geometry {
        let mut rng = SmallRng::seed_from_u64(12);
        GeometryBuilder::new()
            .with_descriptor("w")
            .with_size(12)
            .build(&mut rng)
            .expect("valid wheel")
    }

    fn config() -> LayoutConfig {
        LayoutConfig::default()
            .with_timeout(Duration::from_secs(60))
            .with_max_sweeps(4000)
            .with_seed(77)
    }

    #[rstest]
    fn runs_are_reproducible(wheel: Geometry) {
        let mut first = Layout2D::new(config()).expect("valid config");
        let mut second = Layout2D::new(config()).expect("valid config");
        let a = first.run(&wheel, &mut ()).expect("layout");
        let b = second.run(&wheel, &mut ()).expect("layout");
        assert!(matches!(
            a.termination,
            Termination::Converged | Termination::SweepLimit
        ));
        assert_eq!(a.sweeps, b.sweeps);
        assert!(a.sweeps <= 4000);
        assert_eq!(first.positions(), second.positions());
    }

    #[rstest]
    fn neighbours_end_up_closer(wheel: Geometry) {
        let mut layout = Layout2D::new(config()).expect("valid config");
        let _ = layout.run(&wheel, &mut ()).expect("layout");
        let positions = layout.positions();
        let (mut adjacent, mut adjacent_pairs) = (0.0, 0);
        let (mut distant, mut distant_pairs) = (0.0, 0);
        for a in 0..12 {
            for b in (a + 1)..12 {
                let distance = (positions[a] - positions[b]).length();
                if wheel.is_neighbour(a, b) {
                    adjacent += distance;
                    adjacent_pairs += 1;
                } else {
                    distant += distance;
                    distant_pairs += 1;
                }
            }
        }
        assert!(adjacent / f64::from(adjacent_pairs) < distant / f64::from(distant_pairs));
    }

    #[rstest]
    fn layout_is_recentred(wheel: Geometry) {
        let mut layout = Layout3D::new(config()).expect("valid config");
        let outcome = layout.run(&wheel, &mut ()).expect("layout");
        assert_eq!(outcome.status, LayoutStatus::HasLayout);
        let sum = layout
            .positions()
            .iter()
            .fold(Vec3::default(), |acc, &p| acc + p);
        assert!(sum.length() < 1e-9);
    }

    struct CancelOnFirstSweep {
        handle: CancelHandle,
        completed: Option<LayoutOutcome>,
    }

    impl LayoutListener for CancelOnFirstSweep {
        fn on_progress(&mut self, progress: &LayoutProgress) {
            if progress.sweep == 1 {
                self.handle.cancel();
            }
        }

        fn on_complete(&mut self, outcome: &LayoutOutcome) {
            self.completed = Some(*outcome);
        }
    }

    #[rstest]
    fn cancelling_reverts_to_needs_layout(wheel: Geometry) {
        let before = wheel.store().clone();
        let mut layout = Layout2D::new(config().with_accuracy(1e-12)).expect("valid config");
        let mut listener = CancelOnFirstSweep {
            handle: layout.cancel_handle(),
            completed: None,
        };
        let outcome = layout.run(&wheel, &mut listener).expect("layout");
        assert_eq!(outcome.termination, Termination::Cancelled);
        assert_eq!(outcome.status, LayoutStatus::NeedsLayout);
        assert_eq!(outcome.sweeps, 1);
        assert_eq!(layout.status(), LayoutStatus::NeedsLayout);
        assert_eq!(listener.completed, Some(outcome));
        assert!(!layout.cancel_handle().is_cancelled());
        assert_eq!(wheel.store(), &before);
    }

    #[test]
    fn unrewired_lattices_need_no_layout() {
        let mut rng = SmallRng::seed_from_u64(1);
        let lattice = GeometryBuilder::new()
            .with_descriptor("n")
            .with_size(25)
            .build(&mut rng)
            .expect("valid lattice");
        let mut layout = Layout2D::new(config()).expect("valid config");
        let outcome = layout.run(&lattice, &mut ()).expect("layout");
        assert_eq!(outcome.status, LayoutStatus::NoLayout);
        assert_eq!(outcome.termination, Termination::Skipped);
        assert!(layout.positions().is_empty());
    }

    #[rstest]
    fn oversized_geometries_only_show_a_message(wheel: Geometry) {
        let mut layout =
            Layout2D::new(config().with_max_display_nodes(10)).expect("valid config");
        let outcome = layout.run(&wheel, &mut ()).expect("layout");
        assert_eq!(outcome.status, LayoutStatus::HasMessage);
    }

    #[rstest]
    fn dense_graphs_hide_their_links(wheel: Geometry) {
        let mut capped = Layout2D::new(config().with_max_links(5)).expect("valid config");
        assert_eq!(capped.run(&wheel, &mut ()).expect("layout").visible_links, 0);
        let mut shown = Layout2D::new(config()).expect("valid config");
        assert_eq!(shown.run(&wheel, &mut ()).expect("layout").visible_links, 22);
    }

    #[rstest]
    fn empty_geometry_is_rejected(wheel: Geometry) {
        let mut emptied = wheel;
        emptied.reset();
        let mut layout = Layout2D::new(config()).expect("valid config");
        assert_eq!(
            layout.run(&emptied, &mut ()),
            Err(LayoutError::EmptyGeometry)
        );
    }

    #[rstest]
    fn topology_changes_request_adjustment(wheel: Geometry) {
        let mut layout = Layout2D::new(config().with_max_sweeps(50)).expect("valid config");
        let _ = layout.run(&wheel, &mut ()).expect("layout");
        assert_eq!(layout.status(), LayoutStatus::HasLayout);
        let unchanged = layout.run(&wheel, &mut ()).expect("layout");
        assert_eq!(unchanged.termination, Termination::Skipped);

        let mut changed = wheel;
        changed.store.add_edge(1, 6);
        assert_eq!(layout.prepare(&changed), Ok(LayoutStatus::AdjustLayout));
        layout.invalidate();
        let outcome = layout.run(&changed, &mut ()).expect("layout");
        assert_eq!(outcome.status, LayoutStatus::HasLayout);
        assert!(outcome.sweeps > 0);
    }

    #[rstest]
    fn shaking_relaxes_again(wheel: Geometry) {
        let mut layout = Layout2D::new(config().with_max_sweeps(100)).expect("valid config");
        let _ = layout.run(&wheel, &mut ()).expect("layout");
        let outcome = layout.shake(&wheel, 1.5, &mut ()).expect("shake");
        assert_eq!(outcome.status, LayoutStatus::HasLayout);
        assert!(outcome.sweeps > 0);
        assert!(matches!(
            layout.shake(&wheel, f64::NAN, &mut ()),
            Err(LayoutError::InvalidConfig { field: "quake", .. })
        ));
    }

    #[rstest]
    fn seeds_change_the_initial_spiral(wheel: Geometry) {
        let mut a = Layout2D::new(config().with_seed(1)).expect("valid config");
        let mut b = Layout2D::new(config().with_seed(2)).expect("valid config");
        let _ = a.prepare(&wheel).expect("prepare");
        let _ = b.prepare(&wheel).expect("prepare");
        assert_ne!(a.positions(), b.positions());
        assert_eq!(a.positions()[0], Vec2::default());
    }

    #[rstest]
    fn hubs_get_larger_radii(wheel: Geometry) {
        let mut layout = Layout2D::new(config()).expect("valid config");
        let _ = layout.prepare(&wheel).expect("prepare");
        assert!(layout.radii()[0] > layout.radii()[1]);
    }

    #[rstest]
    fn relax_moves_single_nodes(wheel: Geometry) {
        let mut layout = Layout2D::new(config()).expect("valid config");
        let _ = layout.prepare(&wheel).expect("prepare");
        assert!(layout.relax(3, 0.05).is_some_and(|moved| moved > 0.0));
        assert_eq!(layout.relax(99, 0.05), None);
    }

    #[rstest]
    fn host_driven_layout_reaches_has_layout(wheel: Geometry) {
        let mut layout = Layout2D::new(config()).expect("valid config");
        assert_eq!(layout.prepare(&wheel), Ok(LayoutStatus::NeedsLayout));
        for _ in 0..100 {
            for node in 0..12 {
                let _ = layout.relax(node, 0.05);
            }
        }
        assert_eq!(layout.status(), LayoutStatus::InProgress);

        let mut last = None;
        for _ in 0..4000 {
            let progress = layout.step().expect("sweep completes");
            last = Some(progress);
            if progress.converged {
                break;
            }
        }
        let last = last.expect("at least one sweep");
        assert!(last.sweep > 0);
        assert_eq!(layout.status(), LayoutStatus::InProgress);
        assert_eq!(layout.finish(), LayoutStatus::HasLayout);
        assert_eq!(layout.status(), LayoutStatus::HasLayout);
        assert_eq!(layout.visible_links(), 22);
        let sum = layout
            .positions()
            .iter()
            .fold(Vec2::default(), |acc, &p| acc + p);
        assert!(sum.length() < 1e-9);
        assert_eq!(layout.step(), None);
    }

    #[rstest]
    fn stepping_matches_run(wheel: Geometry) {
        let mut driven = Layout2D::new(config()).expect("valid config");
        let mut run = Layout2D::new(config()).expect("valid config");
        let outcome = run.run(&wheel, &mut ()).expect("layout");
        let _ = driven.prepare(&wheel).expect("prepare");
        let mut sweeps = 0;
        while let Some(progress) = driven.step() {
            sweeps = progress.sweep;
            if progress.converged || sweeps >= config().max_sweeps() {
                break;
            }
        }
        let _ = driven.finish();
        assert_eq!(sweeps, outcome.sweeps);
        assert_eq!(driven.positions(), run.positions());
    }

    #[test]
    fn finishing_skips_layouts_that_need_none() {
        let mut rng = SmallRng::seed_from_u64(1);
        let lattice = GeometryBuilder::new()
            .with_descriptor("n")
            .with_size(25)
            .build(&mut rng)
            .expect("valid lattice");
        let mut layout = Layout2D::new(config()).expect("valid config");
        assert_eq!(layout.prepare(&lattice), Ok(LayoutStatus::NoLayout));
        assert_eq!(layout.step(), None);
        assert_eq!(layout.finish(), LayoutStatus::NoLayout);
    }

    #[rstest]
    fn cancelled_step_reverts_to_needs_layout(wheel: Geometry) {
        let mut layout = Layout2D::new(config()).expect("valid config");
        let _ = layout.prepare(&wheel).expect("prepare");
        assert!(layout.step().is_some());
        layout.cancel_handle().cancel();
        assert_eq!(layout.step(), None);
        assert_eq!(layout.status(), LayoutStatus::NeedsLayout);
    }
}
