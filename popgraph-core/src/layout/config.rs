//! Tuning knobs for the layout engine.

use std::time::Duration;

use crate::error::LayoutError;

/// How a sweep visits the nodes.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum SweepMode {
    /// Nodes are relaxed one after another in place; runs are reproducible
    /// for a given seed.
    #[default]
    Sequential,
    /// Nodes are relaxed concurrently against a snapshot of the previous
    /// sweep. Falls back to [`SweepMode::Sequential`] without the
    /// `parallel` feature.
    Parallel,
}

/// Configuration of a [`crate::Layout`].
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use popgraph_core::{LayoutConfig, SweepMode};
///
/// let config = LayoutConfig::default()
///     .with_timeout(Duration::from_millis(250))
///     .with_seed(9)
///     .with_sweep_mode(SweepMode::Sequential);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.seed(), 9);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
    timeout: Duration,
    accuracy: f64,
    dt: f64,
    max_step: f64,
    seed: u64,
    sweep_mode: SweepMode,
    max_links: usize,
    max_display_nodes: usize,
    max_sweeps: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            accuracy: 1e-5,
            dt: 0.05,
            max_step: 0.5,
            seed: 0x1A70_0075,
            sweep_mode: SweepMode::Sequential,
            max_links: 10_000,
            max_display_nodes: 40_000,
            max_sweeps: 10_000,
        }
    }
}

impl LayoutConfig {
    /// Wall-clock budget of a run, checked between sweeps.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Relative potential-energy change below which a run has converged.
    #[must_use]
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Step size applied to the net force on a node.
    #[must_use]
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Upper bound on the displacement of a node in one step.
    #[must_use]
    pub fn with_max_step(mut self, max_step: f64) -> Self {
        self.max_step = max_step;
        self
    }

    /// Seed of the layout's private random source.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Selects sequential or parallel sweeps.
    #[must_use]
    pub fn with_sweep_mode(mut self, mode: SweepMode) -> Self {
        self.sweep_mode = mode;
        self
    }

    /// Link count above which no links are drawn.
    #[must_use]
    pub fn with_max_links(mut self, max_links: usize) -> Self {
        self.max_links = max_links;
        self
    }

    /// Node count above which no layout is attempted.
    #[must_use]
    pub fn with_max_display_nodes(mut self, max_display_nodes: usize) -> Self {
        self.max_display_nodes = max_display_nodes;
        self
    }

    /// Maximum sweeps of a single run.
    #[must_use]
    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    /// Returns the wall-clock budget.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the convergence threshold.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Returns the step size.
    #[must_use]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Returns the displacement bound.
    #[must_use]
    pub fn max_step(&self) -> f64 {
        self.max_step
    }

    /// Returns the seed of the private random source.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the sweep mode.
    #[must_use]
    pub fn sweep_mode(&self) -> SweepMode {
        self.sweep_mode
    }

    /// Returns the display cap on links.
    #[must_use]
    pub fn max_links(&self) -> usize {
        self.max_links
    }

    /// Returns the display cap on nodes.
    #[must_use]
    pub fn max_display_nodes(&self) -> usize {
        self.max_display_nodes
    }

    /// Returns the sweep limit.
    #[must_use]
    pub fn max_sweeps(&self) -> usize {
        self.max_sweeps
    }

    /// Checks every value against its admissible range.
    ///
    /// # Errors
    /// Returns [`LayoutError::InvalidConfig`] naming the first offending
    /// field.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.timeout.is_zero() {
            return Err(invalid("timeout", "must be longer than zero"));
        }
        for (field, value) in [
            ("accuracy", self.accuracy),
            ("dt", self.dt),
            ("max_step", self.max_step),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(field, format!("must be positive and finite, got {value}")));
            }
        }
        if self.max_sweeps == 0 {
            return Err(invalid("max_sweeps", "must be greater than zero"));
        }
        if self.max_display_nodes == 0 {
            return Err(invalid("max_display_nodes", "must be greater than zero"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> LayoutError {
    LayoutError::InvalidConfig {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_are_valid() {
        let config = LayoutConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_millis(5000));
        assert_eq!(config.max_links(), 10_000);
        assert_eq!(config.max_display_nodes(), 40_000);
    }

    #[rstest]
    #[case(LayoutConfig::default().with_timeout(Duration::ZERO), "timeout")]
    #[case(LayoutConfig::default().with_accuracy(0.0), "accuracy")]
    #[case(LayoutConfig::default().with_dt(f64::NAN), "dt")]
    #[case(LayoutConfig::default().with_max_step(-1.0), "max_step")]
    #[case(LayoutConfig::default().with_max_sweeps(0), "max_sweeps")]
    #[case(LayoutConfig::default().with_max_display_nodes(0), "max_display_nodes")]
    fn invalid_values_name_the_field(#[case] config: LayoutConfig, #[case] expected: &str) {
        match config.validate() {
            Err(LayoutError::InvalidConfig { field, .. }) => assert_eq!(field, expected),
            other => panic!("expected invalid config, got {other:?}"),
        }
    }
}
