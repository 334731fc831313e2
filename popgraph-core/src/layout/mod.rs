//! Force-directed layout of a geometry in two or three dimensions.
//!
//! Both dimensions share one engine, generic over a small [`Vector`]
//! capability. Node 0 starts at the origin and the rest on a seeded spiral;
//! each sweep relaxes every node against pairwise repulsion and neighbour
//! attraction until the potential settles or the time budget runs out. The
//! engine owns its random source, so laying out a geometry never perturbs
//! the simulation's random stream.

mod config;
mod engine;
mod forces;
mod status;
mod vector;

pub use self::{
    config::{LayoutConfig, SweepMode},
    engine::{CancelHandle, Layout, Layout2D, Layout3D},
    status::{LayoutListener, LayoutOutcome, LayoutProgress, LayoutStatus, Termination},
    vector::{Vec2, Vec3, Vector},
};
