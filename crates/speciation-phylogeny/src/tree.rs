//! The species tree: ownership of the phylogeny and speciation bookkeeping.
//!
//! [`PhyloTree`] owns every branch through its [`BranchArena`] and tracks
//! which species are still extant. The extant set holds identifiers only,
//! never branches, so retiring or detaching a lineage can never leave a
//! dangling reference behind.
//!
//! # Lifecycle
//!
//! 1. [`PhyloTree::new`] creates root species `s0` with the initial traits
//!    and no locations.
//! 2. The event driver moves species around the map, recomputes their
//!    groups, and calls [`PhyloTree::speciate`] for every group it splits
//!    off. Whether the parent keeps living (budding) or is closed with
//!    [`PhyloTree::retire`] (bifurcation) is the driver's decision.
//! 3. [`PhyloTree::prune_extinct`] retires species whose footprint emptied.
//! 4. [`PhyloTree::finalize`] closes every surviving lineage at the end of the
//!    run. After that the tree is read-only.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand::distr::Distribution;
use tracing::{debug, info};

use speciation_geometry::Hypersphere;
use speciation_types::{BranchId, Date, SpeciesId, TraitVector};

use crate::branch::{Branch, BranchArena, NodeKind};
use crate::config::SpeciationConfig;
use crate::error::TreeError;
use crate::newick;
use crate::record::SpeciesRecord;
use crate::species::Species;

/// A phylogeny of species over locations of type `P`.
#[derive(Debug, Clone)]
pub struct PhyloTree<P> {
    arena: BranchArena<P>,
    /// Where each species lives in the arena.
    index: BTreeMap<SpeciesId, BranchId>,
    /// Species with no end date yet.
    extant: BTreeSet<SpeciesId>,
    start_date: Date,
    /// Latest date seen by any dated operation; open branches are measured
    /// up to it.
    latest_date: Date,
    finalized_at: Option<Date>,
    next_species: SpeciesId,
}

impl<P> PhyloTree<P>
where
    P: Ord + Clone,
{
    /// Create a tree whose root is species `s0` with `initial_traits`, no
    /// locations, created at `start_date`.
    pub fn new(initial_traits: TraitVector, start_date: Date) -> Self {
        let root_species = SpeciesId::new(0);
        let arena = BranchArena::with_root(
            NodeKind::Species(Species::new(root_species, initial_traits)),
            start_date,
        );
        let mut index = BTreeMap::new();
        index.insert(root_species, arena.root());
        Self {
            arena,
            index,
            extant: BTreeSet::from([root_species]),
            start_date,
            latest_date: start_date,
            finalized_at: None,
            next_species: SpeciesId::new(1),
        }
    }

    /// Create a tree from the `tree` section of the configuration.
    pub fn from_config(config: &SpeciationConfig) -> Self {
        Self::new(config.tree.initial_traits.clone(), config.tree.start_date)
    }

    // -------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------

    /// Date the tree was started.
    pub const fn start_date(&self) -> Date {
        self.start_date
    }

    /// Latest date seen by a dated operation.
    pub const fn latest_date(&self) -> Date {
        self.latest_date
    }

    /// Date passed to [`PhyloTree::finalize`], if it was called.
    pub const fn finalized_at(&self) -> Option<Date> {
        self.finalized_at
    }

    /// Identifier of the root species.
    pub const fn root_species(&self) -> SpeciesId {
        SpeciesId::new(0)
    }

    /// The root branch.
    pub fn root(&self) -> Option<&Branch<P>> {
        self.arena.get(self.arena.root())
    }

    /// The branch storage.
    pub const fn arena(&self) -> &BranchArena<P> {
        &self.arena
    }

    /// Total number of species ever created, extinct ones included.
    pub const fn num_species(&self) -> u64 {
        self.next_species.into_inner()
    }

    /// Number of species still extant.
    pub fn extant_count(&self) -> usize {
        self.extant.len()
    }

    /// Whether `id` names an extant species.
    pub fn is_extant(&self, id: SpeciesId) -> bool {
        self.extant.contains(&id)
    }

    /// Identifiers of the extant species, in ascending order.
    pub fn extant_ids(&self) -> impl Iterator<Item = SpeciesId> + '_ {
        self.extant.iter().copied()
    }

    /// The extant species, in identifier order.
    pub fn extant(&self) -> impl Iterator<Item = &Species<P>> {
        self.extant.iter().filter_map(|id| self.species(*id))
    }

    /// Look up a species (extant or not) still present in the tree.
    pub fn species(&self, id: SpeciesId) -> Option<&Species<P>> {
        self.branch_of(id).and_then(Branch::as_species)
    }

    /// Look up a species mutably.
    pub fn species_mut(&mut self, id: SpeciesId) -> Option<&mut Species<P>> {
        let branch = *self.index.get(&id)?;
        self.arena.get_mut(branch).and_then(Branch::as_species_mut)
    }

    /// The branch carrying species `id`.
    pub fn branch_of(&self, id: SpeciesId) -> Option<&Branch<P>> {
        self.index.get(&id).and_then(|&branch| self.arena.get(branch))
    }

    // -------------------------------------------------------------------
    // Structural operations
    // -------------------------------------------------------------------

    /// Create a new species as a child of `parent`, starting from a copy of
    /// the parent's current traits, and add it to the extant set.
    ///
    /// The parent stays extant. Callers that model strict bifurcation retire
    /// it afterwards with [`PhyloTree::retire`]. Moving the isolated group's
    /// locations onto the new species is also left to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownSpecies`] if the parent does not exist,
    /// [`TreeError::ParentRetired`] if it already has an end date, or
    /// [`TreeError::Finalized`] once the tree has been closed.
    pub fn speciate(&mut self, parent: SpeciesId, date: Date) -> Result<SpeciesId, TreeError> {
        self.ensure_open()?;
        let parent_branch = *self.index.get(&parent).ok_or(TreeError::UnknownSpecies(parent))?;
        if !self.extant.contains(&parent) {
            return Err(TreeError::ParentRetired(parent));
        }
        let traits = self
            .species(parent)
            .map(|s| s.traits().to_vec())
            .ok_or(TreeError::UnknownSpecies(parent))?;

        self.attach_species(parent_branch, traits, date)
    }

    /// Create a new species with explicit traits under any branch, internal
    /// or species.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownBranch`] if the branch does not exist, or
    /// [`TreeError::Finalized`] once the tree has been closed.
    pub fn graft(&mut self, parent: BranchId, traits: TraitVector, date: Date) -> Result<SpeciesId, TreeError> {
        self.ensure_open()?;
        if self.arena.get(parent).is_none() {
            return Err(TreeError::UnknownBranch(parent));
        }
        self.attach_species(parent, traits, date)
    }

    /// Create an unlabelled internal branch under `parent` together with its
    /// first species, so the new branch is never a bare tip.
    ///
    /// Further species can join the clade with [`PhyloTree::graft`].
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownBranch`] if the parent does not exist,
    /// [`TreeError::IdentifiersExhausted`] if no identifier is left, or
    /// [`TreeError::Finalized`] once the tree has been closed.
    pub fn add_clade(
        &mut self,
        parent: BranchId,
        traits: TraitVector,
        date: Date,
    ) -> Result<(BranchId, SpeciesId), TreeError> {
        self.ensure_open()?;
        if self.next_species.next().is_none() {
            return Err(TreeError::IdentifiersExhausted);
        }
        let clade = self.arena.insert_child(parent, NodeKind::Internal, date)?;
        match self.attach_species(clade, traits, date) {
            Ok(species) => Ok((clade, species)),
            Err(err) => {
                self.arena.remove_subtree(clade)?;
                Err(err)
            }
        }
    }

    /// Stamp `date` as the end of species `id` and drop it from the extant
    /// set.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownSpecies`] if the species does not exist,
    /// or [`TreeError::AlreadyRetired`] if it already has an end date.
    pub fn retire(&mut self, id: SpeciesId, date: Date) -> Result<(), TreeError> {
        let branch_id = *self.index.get(&id).ok_or(TreeError::UnknownSpecies(id))?;
        let branch = self
            .arena
            .get_mut(branch_id)
            .ok_or(TreeError::UnknownSpecies(id))?;
        if let Some(ended) = branch.ended() {
            return Err(TreeError::AlreadyRetired { species: id, ended });
        }
        branch.set_ended(date);
        self.extant.remove(&id);
        self.observe(date);
        debug!(species = %id, date, "species retired");
        Ok(())
    }

    /// Retire every extant species whose footprint is empty and return their
    /// identifiers. Retired species keep their place in the tree.
    pub fn prune_extinct(&mut self, date: Date) -> BTreeSet<SpeciesId> {
        let extinct: BTreeSet<SpeciesId> = self
            .extant()
            .filter(|species| species.is_extinct())
            .map(Species::id)
            .collect();

        for &id in &extinct {
            if let Some(branch) = self.index.get(&id).and_then(|&b| self.arena.get_mut(b)) {
                branch.set_ended(date);
            }
            self.extant.remove(&id);
        }
        self.observe(date);

        if !extinct.is_empty() {
            info!(
                date,
                extinct = extinct.len(),
                extant = self.extant.len(),
                "extinct species pruned"
            );
        }
        extinct
    }

    /// Close every surviving lineage at `date` and return their identifiers.
    ///
    /// The extant set is empty afterwards and the tree accepts no further
    /// structural edits. Calling it again is a no-op returning an empty set.
    pub fn finalize(&mut self, date: Date) -> BTreeSet<SpeciesId> {
        if self.finalized_at.is_some() {
            return BTreeSet::new();
        }
        let survivors = std::mem::take(&mut self.extant);
        for &id in &survivors {
            if let Some(branch) = self.index.get(&id).and_then(|&b| self.arena.get_mut(b)) {
                branch.set_ended(date);
            }
        }
        self.observe(date);
        self.finalized_at = Some(date);
        info!(
            date,
            survivors = survivors.len(),
            total_species = self.num_species(),
            "tree finalized"
        );
        survivors
    }

    /// Remove the subtree under `branch`, destroying every species in it.
    /// Returns the identifiers of the species removed.
    ///
    /// Internal branches left without children are removed as well, so every
    /// tip of the tree stays a species.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::CannotDetachRoot`] for the root, or
    /// [`TreeError::UnknownBranch`] if the branch does not exist.
    pub fn detach(&mut self, branch: BranchId) -> Result<BTreeSet<SpeciesId>, TreeError> {
        let parent = self.arena.get(branch).and_then(Branch::parent);
        let mut removed = self.arena.remove_subtree(branch)?;

        let mut cursor = parent;
        while let Some(id) = cursor {
            let Some(node) = self.arena.get(id) else {
                break;
            };
            if !matches!(node.kind(), NodeKind::Internal) || !node.is_leaf() {
                break;
            }
            cursor = node.parent();
            removed.extend(self.arena.remove_subtree(id)?);
        }

        let species: BTreeSet<SpeciesId> = removed
            .iter()
            .filter_map(Branch::as_species)
            .map(Species::id)
            .collect();
        for id in &species {
            self.index.remove(id);
            self.extant.remove(id);
        }
        debug!(%branch, branches = removed.len(), species = species.len(), "subtree detached");
        Ok(species)
    }

    // -------------------------------------------------------------------
    // Evolution
    // -------------------------------------------------------------------

    /// Apply one mutation step to every extant species.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Sampling`] on the first species whose traits
    /// could not be kept inside the sphere; species visited before it keep
    /// their new traits.
    pub fn mutate_all<R, D>(&mut self, rng: &mut R, noise: &D, sphere: &Hypersphere) -> Result<(), TreeError>
    where
        R: Rng + ?Sized,
        D: Distribution<f64> + ?Sized,
    {
        let ids: Vec<SpeciesId> = self.extant.iter().copied().collect();
        for id in ids {
            if let Some(species) = self.species_mut(id) {
                species.mutate(rng, noise, sphere)?;
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Creation date of the most recent common ancestor of two species.
    ///
    /// Returns `None` if either species is unknown.
    pub fn most_recent_common_ancestor(&self, a: SpeciesId, b: SpeciesId) -> Option<Date> {
        let a = *self.index.get(&a)?;
        let b = *self.index.get(&b)?;
        self.arena.most_recent_common_ancestor(a, b)
    }

    /// Creation date of the most recent ancestor `id` shares with any of the
    /// species in `frontier`.
    ///
    /// Unknown frontier members are ignored; returns `None` if none remain
    /// or `id` is unknown.
    pub fn most_recent_common_ancestor_of_frontier(
        &self,
        id: SpeciesId,
        frontier: &BTreeSet<SpeciesId>,
    ) -> Option<Date> {
        let branch = *self.index.get(&id)?;
        let frontier: BTreeSet<BranchId> = frontier
            .iter()
            .filter_map(|member| self.index.get(member).copied())
            .collect();
        self.arena.most_recent_common_ancestor_of_frontier(branch, &frontier)
    }

    /// One descriptive record per extant species at `date`.
    pub fn records(&self, date: Date) -> Vec<SpeciesRecord> {
        self.extant().map(|species| species.record(date)).collect()
    }

    /// Render the whole tree in Newick form.
    ///
    /// Open branches are measured up to the finalize date if the tree was
    /// finalized, otherwise up to the latest date seen.
    pub fn render(&self) -> String {
        newick::render(&self.arena, self.now())
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    fn attach_species(&mut self, parent: BranchId, traits: TraitVector, date: Date) -> Result<SpeciesId, TreeError> {
        let id = self.next_species;
        let next = id.next().ok_or(TreeError::IdentifiersExhausted)?;
        let branch = self
            .arena
            .insert_child(parent, NodeKind::Species(Species::new(id, traits)), date)?;

        self.next_species = next;
        self.index.insert(id, branch);
        self.extant.insert(id);
        self.observe(date);
        debug!(species = %id, %parent, date, extant = self.extant.len(), "species created");
        Ok(id)
    }

    const fn ensure_open(&self) -> Result<(), TreeError> {
        match self.finalized_at {
            Some(date) => Err(TreeError::Finalized(date)),
            None => Ok(()),
        }
    }

    fn observe(&mut self, date: Date) {
        self.latest_date = self.latest_date.max(date);
    }

    fn now(&self) -> Date {
        self.finalized_at.unwrap_or(self.latest_date)
    }
}

impl<P> core::fmt::Display for PhyloTree<P>
where
    P: Ord + Clone,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.render())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
