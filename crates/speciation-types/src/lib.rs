//! Shared type definitions for the speciation simulation.
//!
//! This crate holds the vocabulary shared by every other crate in the
//! workspace: strongly-typed identifiers, the simulation date, and the
//! adjacency contract that spatial graphs implement.
//!
//! # Modules
//!
//! - [`ids`] -- Counter-backed identifier wrappers for species and branches
//! - [`graph`] -- The [`SpatialGraph`] contract answering neighbor queries

pub mod graph;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use graph::SpatialGraph;
pub use ids::{BranchId, SpeciesId};

/// A simulation date, measured in whole ticks since the start of the run.
pub type Date = u64;

/// A point in trait-space. The dimensionality is fixed for a given run.
pub type TraitVector = Vec<f64>;
