//! Benchmark support crate for popgraph.
//!
//! Provides the parameter and setup types shared by the Criterion benchmarks
//! for geometry generation, degree-preserving rewiring and force-directed
//! layout.

pub mod error;
pub mod params;
