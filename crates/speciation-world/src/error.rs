//! Error types for the `speciation-world` crate.
//!
//! Points are generic, so errors carry their debug rendering rather than the
//! point itself.

/// Errors that can occur while building or editing a spatial graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// A point was not found in the graph.
    #[error("point not found: {0}")]
    PointNotFound(String),

    /// A point was inserted twice.
    #[error("duplicate point: {0}")]
    DuplicatePoint(String),

    /// An edge from a point to itself was requested.
    #[error("cannot connect point {0} to itself")]
    SelfLoop(String),

    /// A lattice needs at least one row and one column.
    #[error("lattice dimensions must be non-zero (got {width}x{height})")]
    EmptyLattice {
        /// Requested number of columns.
        width: u32,
        /// Requested number of rows.
        height: u32,
    },
}
