//! Layout engine driven end to end.

mod support;

use std::time::Duration;

use popgraph_core::{
    Layout2D, Layout3D, LayoutConfig, LayoutListener, LayoutOutcome, LayoutProgress,
    LayoutStatus, SweepMode, Termination, Vector,
};
use rstest::rstest;
use support::build;

#[derive(Default)]
struct Recorder {
    sweeps: Vec<usize>,
    completed: usize,
}

impl LayoutListener for Recorder {
    fn on_progress(&mut self, progress: &LayoutProgress) {
        self.sweeps.push(progress.sweep);
    }

    fn on_complete(&mut self, _outcome: &LayoutOutcome) {
        self.completed += 1;
    }
}

fn config(mode: SweepMode) -> LayoutConfig {
    LayoutConfig::default()
        .with_timeout(Duration::from_secs(30))
        .with_max_sweeps(300)
        .with_sweep_mode(mode)
}

#[rstest]
#[case(SweepMode::Sequential)]
#[case(SweepMode::Parallel)]
fn random_graph_is_laid_out(#[case] mode: SweepMode) {
    let geometry = build("r3", 60, 5);
    let mut layout = Layout2D::new(config(mode)).expect("valid config");
    let mut recorder = Recorder::default();
    let outcome = layout.run(&geometry, &mut recorder).expect("layout");
    assert_eq!(outcome.status, LayoutStatus::HasLayout);
    assert_ne!(outcome.termination, Termination::Cancelled);
    assert_eq!(recorder.sweeps.len(), outcome.sweeps);
    assert_eq!(recorder.completed, 1);
    assert_eq!(outcome.visible_links, geometry.store().edge_count());
    assert!(layout
        .positions()
        .iter()
        .all(|p| p.x.is_finite() && p.y.is_finite()));
}

#[test]
fn three_dimensional_layout_spreads_nodes() {
    let geometry = build("p3", 80, 2);
    let mut layout = Layout3D::new(config(SweepMode::Sequential)).expect("valid config");
    let outcome = layout.run(&geometry, &mut ()).expect("layout");
    assert_eq!(outcome.status, LayoutStatus::HasLayout);
    let spread = layout
        .positions()
        .iter()
        .map(|p| p.length())
        .fold(0.0_f64, f64::max);
    assert!(spread > 0.5);
    assert_eq!(layout.radii().len(), geometry.size());
}

#[test]
fn cancelling_from_another_thread_leaves_needs_layout() {
    let geometry = build("r4", 300, 1);
    let mut layout = Layout2D::new(
        LayoutConfig::default()
            .with_accuracy(1e-15)
            .with_max_sweeps(1_000_000)
            .with_timeout(Duration::from_secs(120)),
    )
    .expect("valid config");
    let handle = layout.cancel_handle();
    let before = geometry.store().clone();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        handle.cancel();
    });
    let outcome = layout.run(&geometry, &mut ()).expect("layout");
    canceller.join().expect("canceller thread");
    assert_eq!(outcome.termination, Termination::Cancelled);
    assert_eq!(layout.status(), LayoutStatus::NeedsLayout);
    assert_eq!(geometry.store(), &before);
}

#[test]
fn timeout_ends_the_run() {
    let geometry = build("r4", 400, 1);
    let mut layout = Layout2D::new(
        LayoutConfig::default()
            .with_accuracy(1e-15)
            .with_max_sweeps(1_000_000)
            .with_timeout(Duration::from_millis(30)),
    )
    .expect("valid config");
    let outcome = layout.run(&geometry, &mut ()).expect("layout");
    assert_eq!(outcome.termination, Termination::TimedOut);
    assert_eq!(outcome.status, LayoutStatus::HasLayout);
}

#[test]
fn well_mixed_population_needs_no_layout() {
    let geometry = build("M", 50, 1);
    let mut layout = Layout2D::new(LayoutConfig::default()).expect("valid config");
    assert_eq!(
        layout.run(&geometry, &mut ()).expect("layout").status,
        LayoutStatus::NoLayout
    );
}
