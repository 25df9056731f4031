//! Error types for the `speciation-phylogeny` crate.
//!
//! Queries that can legitimately come back empty (a missing group, disjoint
//! footprints, unrelated lineages) return empty values instead of errors.
//! The variants here cover contract violations by the caller and sampling
//! failures bubbled up from mutation.

use speciation_geometry::SamplingError;
use speciation_types::{BranchId, Date, SpeciesId};

/// Errors that can occur while editing the phylogenetic tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeError {
    /// No species with this identifier exists in the tree.
    #[error("species not found: {0}")]
    UnknownSpecies(SpeciesId),

    /// No branch with this key exists in the tree.
    #[error("branch not found: {0}")]
    UnknownBranch(BranchId),

    /// The species already carries an end date.
    #[error("species {species} was already retired at date {ended}")]
    AlreadyRetired {
        /// The species that was retired twice.
        species: SpeciesId,
        /// The end date stamped the first time.
        ended: Date,
    },

    /// A retired species cannot give rise to new lineages.
    #[error("cannot speciate from retired species {0}")]
    ParentRetired(SpeciesId),

    /// The tree was closed out by `finalize` and accepts no further edits.
    #[error("tree was finalized at date {0}")]
    Finalized(Date),

    /// The root owns the whole tree and cannot be detached from it.
    #[error("the root branch cannot be detached")]
    CannotDetachRoot,

    /// The identifier counter overflowed.
    #[error("identifier space exhausted")]
    IdentifiersExhausted,

    /// A mutation could not keep the traits inside the trait sphere.
    #[error(transparent)]
    Sampling(#[from] SamplingError),
}
