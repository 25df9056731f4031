//! Spatial graph: points as nodes, undirected adjacency as edges.
//!
//! The [`SpatialMap`] is the geographic backbone that species footprints are
//! laid over. It stores every point together with the set of points adjacent
//! to it: `BTreeMap<P, BTreeSet<P>>`. Edges are always stored in both
//! directions, so adjacency is symmetric by construction.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::Debug;

use speciation_types::SpatialGraph;

use crate::error::WorldError;

/// An undirected adjacency graph over an ordered point type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialMap<P> {
    /// Every point and the points adjacent to it.
    adjacency: BTreeMap<P, BTreeSet<P>>,
}

impl<P> SpatialMap<P>
where
    P: Ord + Clone + Debug,
{
    /// Create an empty map.
    pub const fn new() -> Self {
        Self {
            adjacency: BTreeMap::new(),
        }
    }

    // -------------------------------------------------------------------
    // Point operations
    // -------------------------------------------------------------------

    /// Add an isolated point.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicatePoint`] if the point already exists.
    pub fn add_point(&mut self, point: P) -> Result<(), WorldError> {
        if self.adjacency.contains_key(&point) {
            return Err(WorldError::DuplicatePoint(format!("{point:?}")));
        }
        self.adjacency.insert(point, BTreeSet::new());
        Ok(())
    }

    /// Remove a point together with every edge touching it.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::PointNotFound`] if the point is unknown.
    pub fn remove_point(&mut self, point: &P) -> Result<(), WorldError> {
        let Some(neighbors) = self.adjacency.remove(point) else {
            return Err(WorldError::PointNotFound(format!("{point:?}")));
        };
        for neighbor in &neighbors {
            if let Some(back) = self.adjacency.get_mut(neighbor) {
                back.remove(point);
            }
        }
        Ok(())
    }

    /// Whether the point exists in the map.
    pub fn contains(&self, point: &P) -> bool {
        self.adjacency.contains_key(point)
    }

    /// Return the number of points in the map.
    pub fn point_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Iterate over all points in ascending order.
    pub fn points(&self) -> impl Iterator<Item = &P> {
        self.adjacency.keys()
    }

    // -------------------------------------------------------------------
    // Edge operations
    // -------------------------------------------------------------------

    /// Connect two existing points. Connecting an already-adjacent pair is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::PointNotFound`] if either endpoint is missing,
    /// or [`WorldError::SelfLoop`] if both endpoints are the same point.
    pub fn connect(&mut self, a: &P, b: &P) -> Result<(), WorldError> {
        if a == b {
            return Err(WorldError::SelfLoop(format!("{a:?}")));
        }
        if !self.adjacency.contains_key(b) {
            return Err(WorldError::PointNotFound(format!("{b:?}")));
        }
        let Some(from_a) = self.adjacency.get_mut(a) else {
            return Err(WorldError::PointNotFound(format!("{a:?}")));
        };
        from_a.insert(b.clone());
        if let Some(from_b) = self.adjacency.get_mut(b) {
            from_b.insert(a.clone());
        }
        Ok(())
    }

    /// Remove the edge between two points. Returns `true` if an edge existed.
    pub fn disconnect(&mut self, a: &P, b: &P) -> bool {
        let removed = self
            .adjacency
            .get_mut(a)
            .is_some_and(|set| set.remove(b));
        if let Some(from_b) = self.adjacency.get_mut(b) {
            from_b.remove(a);
        }
        removed
    }

    /// Whether an edge joins the two points.
    pub fn are_adjacent(&self, a: &P, b: &P) -> bool {
        self.adjacency.get(a).is_some_and(|set| set.contains(b))
    }

    /// Return the number of undirected edges.
    pub fn edge_count(&self) -> usize {
        let endpoints: usize = self.adjacency.values().map(BTreeSet::len).sum();
        endpoints / 2
    }

    // -------------------------------------------------------------------
    // Graph queries
    // -------------------------------------------------------------------

    /// Return the points adjacent to `point`, in ascending order. Unknown
    /// points have no neighbors.
    pub fn neighbors(&self, point: &P) -> Vec<P> {
        self.adjacency
            .get(point)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Partition the map into connected components.
    ///
    /// Components are listed in order of their smallest point.
    pub fn components(&self) -> Vec<BTreeSet<P>> {
        let mut visited: BTreeSet<P> = BTreeSet::new();
        let mut components = Vec::new();

        for start in self.adjacency.keys() {
            if visited.contains(start) {
                continue;
            }
            let mut component = BTreeSet::new();
            let mut queue = VecDeque::new();
            visited.insert(start.clone());
            queue.push_back(start.clone());

            while let Some(current) = queue.pop_front() {
                if let Some(adjacent) = self.adjacency.get(&current) {
                    for neighbor in adjacent {
                        if visited.insert(neighbor.clone()) {
                            queue.push_back(neighbor.clone());
                        }
                    }
                }
                component.insert(current);
            }
            components.push(component);
        }

        components
    }

    /// Check whether every point is reachable from every other point.
    ///
    /// An empty map counts as connected.
    pub fn is_connected(&self) -> bool {
        self.components().len() <= 1
    }
}

impl<P> Default for SpatialMap<P>
where
    P: Ord + Clone + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P> SpatialGraph<P> for SpatialMap<P>
where
    P: Ord + Clone + Debug,
{
    fn neighbors(&self, point: &P) -> Vec<P> {
        Self::neighbors(self, point)
    }
}
