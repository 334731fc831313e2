//! Benchmark setup error type.
//!
//! Lets setup functions propagate library failures with `?` instead of
//! panicking inside Criterion closures.

use popgraph_core::{GeometryError, LayoutError};

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Geometry construction failed.
    #[error("geometry construction failed: {0}")]
    Geometry(#[from] GeometryError),
    /// Layout configuration failed.
    #[error("layout setup failed: {0}")]
    Layout(#[from] LayoutError),
}
