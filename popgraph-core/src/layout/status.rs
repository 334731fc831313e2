//! Layout state machine states and run outcomes.

use std::time::Duration;

use serde::Serialize;

/// Where a [`crate::Layout`] stands.
///
/// `NeedsLayout → InProgress → {HasLayout | NeedsLayout (cancelled)}`;
/// `HasLayout → AdjustLayout` when the topology changes; any state returns
/// to `NeedsLayout` on an explicit reset.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutStatus {
    /// Positions are implied by the geometry (unrewired lattices, well-mixed
    /// populations).
    NoLayout,
    /// Positions must be computed from scratch.
    #[default]
    NeedsLayout,
    /// A relaxation run is under way.
    InProgress,
    /// Positions exist but the topology changed since they were computed.
    AdjustLayout,
    /// Relaxation converged or ran out of time.
    HasLayout,
    /// The population is too large to display.
    HasMessage,
}

impl LayoutStatus {
    /// Returns `true` when [`crate::Layout::run`] would relax positions.
    #[must_use]
    pub const fn needs_work(self) -> bool {
        matches!(self, Self::NeedsLayout | Self::AdjustLayout | Self::InProgress)
    }
}

/// Why a relaxation run stopped.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    /// The potential-energy change fell below the accuracy threshold.
    Converged,
    /// The wall-clock budget elapsed.
    TimedOut,
    /// The configured sweep limit was reached.
    SweepLimit,
    /// A [`crate::CancelHandle`] interrupted the run.
    Cancelled,
    /// No relaxation was needed.
    Skipped,
}

/// Summary of one [`crate::Layout::run`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LayoutOutcome {
    /// Status after the run.
    pub status: LayoutStatus,
    /// Why the run stopped.
    pub termination: Termination,
    /// Sweeps completed in this run.
    pub sweeps: usize,
    /// Total potential energy after the last sweep.
    pub potential: f64,
    /// Links drawn; zero when the link count exceeds the display cap.
    pub visible_links: usize,
    /// Wall-clock time spent relaxing.
    #[serde(with = "millis")]
    pub elapsed: Duration,
}

/// Progress report delivered after every sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutProgress {
    /// Sweeps completed so far.
    pub sweep: usize,
    /// Total potential energy after this sweep.
    pub potential: f64,
    /// Relative change of the potential compared with the previous sweep.
    pub delta: f64,
    /// Whether `delta` fell below the configured accuracy.
    pub converged: bool,
}

/// Receives progress and completion callbacks from [`crate::Layout::run`].
pub trait LayoutListener {
    /// Called after each completed sweep.
    fn on_progress(&mut self, _progress: &LayoutProgress) {}

    /// Called once the run stops, whatever the reason.
    fn on_complete(&mut self, _outcome: &LayoutOutcome) {}
}

impl LayoutListener for () {}

mod millis {
    use std::time::Duration;

    use serde::Serializer;

    pub(super) fn serialize<S: Serializer>(
        duration: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}
