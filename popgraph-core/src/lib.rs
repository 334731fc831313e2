//! Popgraph core library.
//!
//! Generates the population structures an evolutionary simulation runs on:
//! a textual [`GeometryDescriptor`] names a graph family and its
//! parameters, [`check_feasibility`] snaps them to the nearest admissible
//! values, and [`Geometry`] generates, rewires and answers neighbourhood
//! queries on the resulting [`AdjacencyStore`]. [`Layout2D`] and
//! [`Layout3D`] position the nodes for display.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod descriptor;
mod encoding;
mod error;
mod feasibility;
mod generate;
mod geometry;
mod invariants;
mod layout;
mod rewire;
mod store;

pub use crate::{
    builder::GeometryBuilder,
    descriptor::{Boundary, Family, GeometryDescriptor, HierarchyLeaf},
    encoding::EncodedGeometry,
    error::{GeometryError, GeometryErrorCode, LayoutError, LayoutErrorCode, Result},
    feasibility::{FeasibilityReport, check_feasibility},
    generate::MAX_ATTEMPTS,
    geometry::{DegreeKind, Geometry, InitReport},
    invariants::{GeometryInvariant, InvariantChecker, InvariantViolation},
    layout::{
        CancelHandle, Layout, Layout2D, Layout3D, LayoutConfig, LayoutListener, LayoutOutcome,
        LayoutProgress, LayoutStatus, SweepMode, Termination, Vec2, Vec3, Vector,
    },
    rewire::{RewireReport, swap_count},
    store::{AdjacencyStore, DegreeStats},
};
