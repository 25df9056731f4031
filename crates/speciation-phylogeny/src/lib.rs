//! Phylogenetic tree and speciation bookkeeping for the speciation simulation.
//!
//! A run starts with one root species. As an external event driver moves
//! species around a spatial graph, each species tracks which of its occupied
//! locations form connected groups; an isolated group can be split off into
//! a new species attached to the tree. The tree records creation and end
//! dates so the final phylogeny can be rendered with branch lengths.
//!
//! # Modules
//!
//! - [`branch`] -- Tree nodes stored in an arena, with ancestry queries
//! - [`species`] -- Trait vectors, occupied locations, and group detection
//! - [`tree`] -- [`PhyloTree`], the owner of the phylogeny and the extant set
//! - [`newick`] -- Newick rendering with branch lengths
//! - [`record`] -- Per-species snapshots for external analysis
//! - [`config`] -- YAML configuration of the trait sphere and initial state
//! - [`error`] -- [`TreeError`] for structural failures

pub mod branch;
pub mod config;
pub mod error;
pub mod newick;
pub mod record;
pub mod species;
pub mod tree;

pub use branch::{Ancestors, Branch, BranchArena, NodeKind};
pub use config::{ConfigError, SamplingConfig, SpeciationConfig, TreeConfig};
pub use error::TreeError;
pub use record::SpeciesRecord;
pub use species::Species;
pub use tree::PhyloTree;
