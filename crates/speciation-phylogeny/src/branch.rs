//! Nodes of the phylogenetic tree and ancestry navigation.
//!
//! # Ownership
//!
//! Branches live in a [`BranchArena`] keyed by [`BranchId`]. A branch lists
//! the keys of the children it owns and keeps a non-owning key back to its
//! parent. Removing a branch removes its whole subtree; the parent key is
//! only ever read to walk towards the root, never to decide what to drop.
//!
//! # Node kinds
//!
//! Every node is either an unlabelled internal branch or a [`Species`]. No
//! third kind exists, so the distinction is a plain enum ([`NodeKind`]).

use std::collections::{BTreeMap, BTreeSet};

use speciation_types::{BranchId, Date};

use crate::error::TreeError;
use crate::species::Species;

// ---------------------------------------------------------------------------
// NodeKind / Branch
// ---------------------------------------------------------------------------

/// What a branch carries besides its position in the tree.
#[derive(Debug, Clone)]
pub enum NodeKind<P> {
    /// An unlabelled internal node grouping its children.
    Internal,
    /// A labelled lineage with traits and a spatial footprint.
    Species(Species<P>),
}

/// One node of the phylogeny.
#[derive(Debug, Clone)]
pub struct Branch<P> {
    id: BranchId,
    parent: Option<BranchId>,
    children: Vec<BranchId>,
    created: Date,
    ended: Option<Date>,
    kind: NodeKind<P>,
}

impl<P> Branch<P> {
    const fn new(id: BranchId, parent: Option<BranchId>, kind: NodeKind<P>, created: Date) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            created,
            ended: None,
            kind,
        }
    }

    /// Arena key of this branch.
    pub const fn id(&self) -> BranchId {
        self.id
    }

    /// Key of the parent branch, `None` for the root.
    pub const fn parent(&self) -> Option<BranchId> {
        self.parent
    }

    /// Keys of the owned children, in creation order.
    pub fn children(&self) -> &[BranchId] {
        &self.children
    }

    /// Date at which the branch was created.
    pub const fn created(&self) -> Date {
        self.created
    }

    /// Date at which the branch was retired, if it has been.
    pub const fn ended(&self) -> Option<Date> {
        self.ended
    }

    /// Whether this branch has no parent.
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether this branch has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The node payload.
    pub const fn kind(&self) -> &NodeKind<P> {
        &self.kind
    }

    /// The species carried by this branch, if it is a species node.
    pub const fn as_species(&self) -> Option<&Species<P>> {
        match &self.kind {
            NodeKind::Species(species) => Some(species),
            NodeKind::Internal => None,
        }
    }

    /// Mutable access to the species carried by this branch.
    pub const fn as_species_mut(&mut self) -> Option<&mut Species<P>> {
        match &mut self.kind {
            NodeKind::Species(species) => Some(species),
            NodeKind::Internal => None,
        }
    }

    /// Stamp the end date.
    pub(crate) const fn set_ended(&mut self, date: Date) {
        self.ended = Some(date);
    }

    /// Length of this branch: end date (or `now` while still open) minus the
    /// creation date, never negative.
    pub fn length(&self, now: Date) -> Date {
        self.ended.unwrap_or(now).saturating_sub(self.created)
    }
}

// ---------------------------------------------------------------------------
// BranchArena
// ---------------------------------------------------------------------------

/// Owning storage for every branch of one tree.
#[derive(Debug, Clone)]
pub struct BranchArena<P> {
    nodes: BTreeMap<BranchId, Branch<P>>,
    root: BranchId,
    next_id: BranchId,
}

impl<P> BranchArena<P> {
    /// Create an arena holding only a root branch.
    pub fn with_root(kind: NodeKind<P>, created: Date) -> Self {
        let root = BranchId::new(0);
        let mut nodes = BTreeMap::new();
        nodes.insert(root, Branch::new(root, None, kind, created));
        Self {
            nodes,
            root,
            next_id: BranchId::new(1),
        }
    }

    /// Key of the root branch.
    pub const fn root(&self) -> BranchId {
        self.root
    }

    /// Number of branches currently stored.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty. An arena always holds its root, so this is
    /// only `true` for an arena that was never constructed properly.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a branch.
    pub fn get(&self, id: BranchId) -> Option<&Branch<P>> {
        self.nodes.get(&id)
    }

    /// Look up a branch mutably.
    pub fn get_mut(&mut self, id: BranchId) -> Option<&mut Branch<P>> {
        self.nodes.get_mut(&id)
    }

    /// Iterate over all branches in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Branch<P>> {
        self.nodes.values()
    }

    /// Attach a new branch under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownBranch`] if the parent is missing, or
    /// [`TreeError::IdentifiersExhausted`] if the key counter overflows.
    pub fn insert_child(
        &mut self,
        parent: BranchId,
        kind: NodeKind<P>,
        created: Date,
    ) -> Result<BranchId, TreeError> {
        let id = self.next_id;
        let next = id.next().ok_or(TreeError::IdentifiersExhausted)?;
        let parent_branch = self
            .nodes
            .get_mut(&parent)
            .ok_or(TreeError::UnknownBranch(parent))?;
        parent_branch.children.push(id);
        self.nodes.insert(id, Branch::new(id, Some(parent), kind, created));
        self.next_id = next;
        Ok(id)
    }

    /// Remove a branch and everything below it, returning the removed
    /// branches (the subtree root first).
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::CannotDetachRoot`] for the root, or
    /// [`TreeError::UnknownBranch`] if the branch is missing.
    pub fn remove_subtree(&mut self, id: BranchId) -> Result<Vec<Branch<P>>, TreeError> {
        if id == self.root {
            return Err(TreeError::CannotDetachRoot);
        }
        let parent = self
            .nodes
            .get(&id)
            .ok_or(TreeError::UnknownBranch(id))?
            .parent;
        if let Some(parent_branch) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent_branch.children.retain(|&child| child != id);
        }

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(branch) = self.nodes.remove(&current) {
                stack.extend(branch.children.iter().rev().copied());
                removed.push(branch);
            }
        }
        Ok(removed)
    }

    // -------------------------------------------------------------------
    // Ancestry
    // -------------------------------------------------------------------

    /// Walk from `id` up to the root, starting with `id` itself.
    ///
    /// The walk is lazy and can be restarted by cloning the iterator. An
    /// unknown key yields an empty walk.
    pub fn ancestors(&self, id: BranchId) -> Ancestors<'_, P> {
        Ancestors {
            nodes: &self.nodes,
            next: Some(id),
        }
    }

    /// Whether `ancestor` lies on the path from `id` to the root (a branch
    /// is its own ancestor).
    pub fn is_ancestor(&self, ancestor: BranchId, id: BranchId) -> bool {
        self.ancestors(id).any(|b| b.id == ancestor)
    }

    /// Number of edges between `id` and the root, `None` for unknown keys.
    pub fn depth(&self, id: BranchId) -> Option<usize> {
        self.ancestors(id).count().checked_sub(1)
    }

    /// Creation date of the youngest branch that is an ancestor of both `a`
    /// and `b`.
    ///
    /// Returns `None` if either key is unknown.
    pub fn most_recent_common_ancestor(&self, a: BranchId, b: BranchId) -> Option<Date> {
        let lineage: BTreeSet<BranchId> = self.ancestors(a).map(Branch::id).collect();
        self.ancestors(b)
            .find(|branch| lineage.contains(&branch.id))
            .map(Branch::created)
    }

    /// Creation date of the youngest ancestor of `id` shared with any member
    /// of `frontier`. The closest frontier member wins.
    ///
    /// Returns `None` for an empty frontier or unknown keys.
    pub fn most_recent_common_ancestor_of_frontier(
        &self,
        id: BranchId,
        frontier: &BTreeSet<BranchId>,
    ) -> Option<Date> {
        let covered: BTreeSet<BranchId> = frontier
            .iter()
            .flat_map(|&member| self.ancestors(member).map(Branch::id))
            .collect();
        self.ancestors(id)
            .find(|branch| covered.contains(&branch.id))
            .map(Branch::created)
    }
}

/// Lazy walk from a branch up to the root. See [`BranchArena::ancestors`].
#[derive(Debug)]
pub struct Ancestors<'a, P> {
    nodes: &'a BTreeMap<BranchId, Branch<P>>,
    next: Option<BranchId>,
}

impl<P> Clone for Ancestors<'_, P> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            next: self.next,
        }
    }
}

impl<'a, P> Iterator for Ancestors<'a, P> {
    type Item = &'a Branch<P>;

    fn next(&mut self) -> Option<Self::Item> {
        let branch = self.nodes.get(&self.next?)?;
        self.next = branch.parent;
        Some(branch)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds:
    ///
    /// ```text
    /// root(0) ─┬─ a(5) ─┬─ c(8)
    ///          │        └─ d(9)
    ///          └─ b(6)
    /// ```
    fn make_arena() -> (BranchArena<u32>, [BranchId; 5]) {
        let mut arena = BranchArena::with_root(NodeKind::Internal, 0);
        let root = arena.root();
        let a = arena.insert_child(root, NodeKind::Internal, 5).unwrap_or(root);
        let b = arena.insert_child(root, NodeKind::Internal, 6).unwrap_or(root);
        let c = arena.insert_child(a, NodeKind::Internal, 8).unwrap_or(root);
        let d = arena.insert_child(a, NodeKind::Internal, 9).unwrap_or(root);
        (arena, [root, a, b, c, d])
    }

    #[test]
    fn insert_links_parent_and_child() {
        let (arena, [root, a, b, c, d]) = make_arena();
        assert_eq!(arena.len(), 5);
        assert_eq!(arena.get(root).map(|r| r.children().to_vec()), Some(vec![a, b]));
        assert_eq!(arena.get(c).and_then(Branch::parent), Some(a));
        assert!(arena.get(d).is_some_and(Branch::is_leaf));
        assert!(arena.get(root).is_some_and(Branch::is_root));
    }

    #[test]
    fn insert_under_unknown_parent_fails() {
        let (mut arena, _) = make_arena();
        let result = arena.insert_child(BranchId::new(99), NodeKind::Internal, 1);
        assert!(matches!(result, Err(TreeError::UnknownBranch(_))));
        assert_eq!(arena.len(), 5);
    }

    #[test]
    fn ancestors_walk_to_root() {
        let (arena, [root, a, _, c, _]) = make_arena();
        let chain: Vec<BranchId> = arena.ancestors(c).map(Branch::id).collect();
        assert_eq!(chain, vec![c, a, root]);
        assert_eq!(arena.depth(c), Some(2));
        assert!(arena.is_ancestor(a, c));
        assert!(arena.is_ancestor(c, c));
    }

    #[test]
    fn root_chain_has_length_one() {
        let (arena, [root, ..]) = make_arena();
        assert_eq!(arena.ancestors(root).count(), 1);
        assert_eq!(arena.depth(root), Some(0));
    }

    #[test]
    fn ancestors_are_restartable() {
        let (arena, [_, _, _, c, _]) = make_arena();
        let walk = arena.ancestors(c);
        let first: Vec<Date> = walk.clone().map(Branch::created).collect();
        let second: Vec<Date> = walk.map(Branch::created).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_branch_has_empty_chain() {
        let (arena, _) = make_arena();
        assert_eq!(arena.ancestors(BranchId::new(77)).count(), 0);
        assert_eq!(arena.depth(BranchId::new(77)), None);
    }

    #[test]
    fn mrca_of_siblings_is_parent() {
        let (arena, [_, _, b, c, d]) = make_arena();
        assert_eq!(arena.most_recent_common_ancestor(c, d), Some(5));
        assert_eq!(arena.most_recent_common_ancestor(c, b), Some(0));
        assert_eq!(arena.most_recent_common_ancestor(d, c), Some(5));
    }

    #[test]
    fn mrca_with_own_ancestor_is_that_ancestor() {
        let (arena, [_, a, _, c, _]) = make_arena();
        assert_eq!(arena.most_recent_common_ancestor(c, a), Some(5));
        assert_eq!(arena.most_recent_common_ancestor(c, c), Some(8));
    }

    #[test]
    fn frontier_picks_closest_member() {
        let (arena, [_, _, b, c, d]) = make_arena();
        let frontier: BTreeSet<BranchId> = [b, d].into_iter().collect();
        // d converges with c at a (5); b only at the root (0).
        assert_eq!(arena.most_recent_common_ancestor_of_frontier(c, &frontier), Some(5));
        let only_b: BTreeSet<BranchId> = [b].into_iter().collect();
        assert_eq!(arena.most_recent_common_ancestor_of_frontier(c, &only_b), Some(0));
        assert_eq!(arena.most_recent_common_ancestor_of_frontier(c, &BTreeSet::new()), None);
    }

    #[test]
    fn remove_subtree_drops_descendants() {
        let (mut arena, [root, a, b, c, d]) = make_arena();
        let removed = arena.remove_subtree(a).unwrap_or_default();
        let ids: Vec<BranchId> = removed.iter().map(Branch::id).collect();
        assert_eq!(ids, vec![a, c, d]);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(root).map(|r| r.children().to_vec()), Some(vec![b]));
        assert!(arena.get(c).is_none());
    }

    #[test]
    fn root_cannot_be_removed() {
        let (mut arena, [root, ..]) = make_arena();
        assert!(matches!(arena.remove_subtree(root), Err(TreeError::CannotDetachRoot)));
        assert!(matches!(
            arena.remove_subtree(BranchId::new(50)),
            Err(TreeError::UnknownBranch(_))
        ));
    }

    #[test]
    fn branch_length_uses_end_or_now() {
        let (mut arena, [_, a, ..]) = make_arena();
        assert_eq!(arena.get(a).map(|b| b.length(20)), Some(15));
        if let Some(branch) = arena.get_mut(a) {
            branch.set_ended(7);
        }
        assert_eq!(arena.get(a).map(|b| b.length(20)), Some(2));
        assert_eq!(arena.get(a).map(|b| b.length(0)), Some(2));
    }
}
