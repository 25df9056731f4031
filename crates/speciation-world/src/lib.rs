//! Geography for the speciation simulation.
//!
//! Species occupy locations; whether two occupied locations belong to the
//! same population depends on the adjacency between them. This crate
//! provides concrete adjacency graphs implementing
//! [`SpatialGraph`](speciation_types::SpatialGraph).
//!
//! # Modules
//!
//! - [`error`] -- Error types for graph construction.
//! - [`spatial_map`] -- [`SpatialMap`], an undirected graph over any ordered
//!   point type, with neighbor queries and connectivity checks.
//! - [`lattice`] -- Rectangular grids of [`GridPoint`] with 4- or
//!   8-neighbourhoods.

pub mod error;
pub mod lattice;
pub mod spatial_map;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use lattice::{GridPoint, Neighborhood, build_lattice};
pub use spatial_map::SpatialMap;
