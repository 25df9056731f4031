//! Species: an evolving lineage with traits and a spatial footprint.
//!
//! A species keeps a trait vector (a point inside the trait sphere) and the
//! set of locations it occupies. Each occupied location is tagged with the
//! connected group it belongs to, so that geographically isolated
//! subpopulations can be detected and split off as new lineages.
//!
//! # Groups
//!
//! Group tags are recomputed on demand by [`Species::recompute_groups`],
//! which flood-fills the footprint over a [`SpatialGraph`]. Any change to the
//! footprint invalidates the cached group count ([`Species::num_groups`]
//! returns `None`) until the next recomputation. Group numbering follows
//! ascending location order but callers must not rely on a particular
//! numbering across recomputations; only the partition is stable.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand::distr::Distribution;
use tracing::debug;

use speciation_geometry::{Hypersphere, SamplingError};
use speciation_types::{Date, SpatialGraph, SpeciesId, TraitVector};

use crate::record::SpeciesRecord;

/// A labelled lineage of the phylogeny.
///
/// Species compare and order by identifier only; traits and footprint play
/// no part in equality.
#[derive(Debug, Clone)]
pub struct Species<P> {
    id: SpeciesId,
    traits: TraitVector,
    /// Occupied locations and their group tag (`None` until grouped).
    locations: BTreeMap<P, Option<usize>>,
    /// Cached group count, `None` while stale.
    groups: Option<usize>,
}

impl<P> Species<P> {
    /// Create a species with a starting trait vector and no locations.
    pub(crate) const fn new(id: SpeciesId, traits: TraitVector) -> Self {
        Self {
            id,
            traits,
            locations: BTreeMap::new(),
            groups: Some(0),
        }
    }

    /// Unique identifier.
    pub const fn id(&self) -> SpeciesId {
        self.id
    }

    /// Display name, `s` followed by the identifier.
    pub fn name(&self) -> String {
        format!("s{}", self.id)
    }

    // -------------------------------------------------------------------
    // Traits
    // -------------------------------------------------------------------

    /// Number of traits.
    pub fn num_traits(&self) -> usize {
        self.traits.len()
    }

    /// The trait vector.
    pub fn traits(&self) -> &[f64] {
        &self.traits
    }

    /// Mutable access to the trait vector. The length is fixed.
    pub fn traits_mut(&mut self) -> &mut [f64] {
        &mut self.traits
    }

    /// Value of the trait at `index`, `None` past the end.
    pub fn trait_at(&self, index: usize) -> Option<f64> {
        self.traits.get(index).copied()
    }

    /// Apply one step of the bounded random walk to the traits.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::DidNotConverge`] if no perturbed vector inside
    /// the sphere was found; the traits are unchanged in that case.
    pub fn mutate<R, D>(&mut self, rng: &mut R, noise: &D, sphere: &Hypersphere) -> Result<(), SamplingError>
    where
        R: Rng + ?Sized,
        D: Distribution<f64> + ?Sized,
    {
        sphere.perturb(&mut self.traits, rng, noise)
    }

    /// Number of trait positions at which the two species differ.
    ///
    /// Positions present in only one of the vectors count as differences.
    #[allow(clippy::float_cmp)] // Exact inequality is the definition of a trait difference.
    pub fn trait_difference_count(&self, other: &Self) -> usize {
        let differing = self
            .traits
            .iter()
            .zip(&other.traits)
            .filter(|(a, b)| a != b)
            .count();
        let unmatched = self.traits.len().abs_diff(other.traits.len());
        differing.saturating_add(unmatched)
    }

    /// Whether the two species carry identical trait vectors.
    pub fn shares_traits_with(&self, other: &Self) -> bool {
        self.trait_difference_count(other) == 0
    }

    // -------------------------------------------------------------------
    // Footprint
    // -------------------------------------------------------------------

    /// A species with no occupied location is extinct.
    pub fn is_extinct(&self) -> bool {
        self.locations.is_empty()
    }

    /// Number of occupied locations.
    pub fn footprint_size(&self) -> usize {
        self.locations.len()
    }

    /// Cached number of groups, `None` if the footprint changed since the
    /// last call to [`Species::recompute_groups`].
    pub const fn num_groups(&self) -> Option<usize> {
        self.groups
    }
}

impl<P> Species<P>
where
    P: Ord + Clone,
{
    /// Iterate over the occupied locations in ascending order.
    pub fn locations(&self) -> impl Iterator<Item = &P> {
        self.locations.keys()
    }

    /// Whether the species occupies `point`.
    pub fn is_in(&self, point: &P) -> bool {
        self.locations.contains_key(point)
    }

    /// Group tag of an occupied location, `None` if the location is not
    /// occupied or has not been grouped yet.
    pub fn group_of(&self, point: &P) -> Option<usize> {
        self.locations.get(point).copied().flatten()
    }

    /// Add a location to the footprint. Occupying a location twice is a
    /// no-op.
    pub fn occupy(&mut self, point: P) {
        if !self.locations.contains_key(&point) {
            self.locations.insert(point, None);
            self.groups = None;
        }
    }

    /// Add several locations to the footprint.
    pub fn occupy_all<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = P>,
    {
        for point in points {
            self.occupy(point);
        }
    }

    /// Remove a location from the footprint. Returns `true` if it was
    /// occupied. Emptying the footprint makes the species extinct.
    pub fn vacate(&mut self, point: &P) -> bool {
        let removed = self.locations.remove(point).is_some();
        if removed {
            self.groups = None;
        }
        removed
    }

    /// Partition the footprint into connected groups and return their count.
    ///
    /// Every occupied location not yet tagged seeds a flood fill over
    /// `graph`, restricted to this species' own locations. The fill uses an
    /// explicit stack, so deep footprints cannot overflow the call stack.
    /// The graph is expected to be symmetric.
    pub fn recompute_groups<G>(&mut self, graph: &G) -> usize
    where
        G: SpatialGraph<P> + ?Sized,
    {
        for tag in self.locations.values_mut() {
            *tag = None;
        }

        let seeds: Vec<P> = self.locations.keys().cloned().collect();
        let mut group: usize = 0;
        for seed in seeds {
            let Some(tag) = self.locations.get_mut(&seed) else {
                continue;
            };
            if tag.is_some() {
                continue;
            }
            *tag = Some(group);

            let mut stack = vec![seed];
            while let Some(current) = stack.pop() {
                for neighbor in graph.neighbors(&current) {
                    if let Some(tag) = self.locations.get_mut(&neighbor)
                        && tag.is_none()
                    {
                        *tag = Some(group);
                        stack.push(neighbor);
                    }
                }
            }
            group = group.saturating_add(1);
        }

        debug!(
            species = %self.id,
            locations = self.locations.len(),
            groups = group,
            "groups recomputed"
        );
        self.groups = Some(group);
        group
    }

    /// Remove every location tagged with `group` and return them.
    ///
    /// Returns an empty set if no location carries that tag. The cached group
    /// count is invalidated; call [`Species::recompute_groups`] before relying
    /// on group tags again.
    pub fn extract_group(&mut self, group: usize) -> BTreeSet<P> {
        let extracted: BTreeSet<P> = self
            .locations
            .iter()
            .filter(|(_, tag)| **tag == Some(group))
            .map(|(point, _)| point.clone())
            .collect();
        if extracted.is_empty() {
            return extracted;
        }

        self.locations.retain(|_, tag| *tag != Some(group));
        self.groups = None;
        debug!(
            species = %self.id,
            group,
            extracted = extracted.len(),
            remaining = self.locations.len(),
            "group extracted"
        );
        extracted
    }

    /// Locations occupied by both species.
    pub fn co_occurring_locations(&self, other: &Self) -> BTreeSet<P> {
        self.locations
            .keys()
            .filter(|point| other.locations.contains_key(*point))
            .cloned()
            .collect()
    }

    /// Snapshot of this species for external logging at `date`.
    pub fn record(&self, date: Date) -> SpeciesRecord {
        SpeciesRecord {
            id: self.id,
            name: self.name(),
            date,
            traits: self.traits.clone(),
            location_count: self.locations.len(),
            group_count: self.groups,
        }
    }
}

impl<P> PartialEq for Species<P> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<P> Eq for Species<P> {}

impl<P> PartialOrd for Species<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P> Ord for Species<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl<P> core::fmt::Display for Species<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "s{}", self.id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rand_distr::Normal;

    use super::*;

    /// Integers on a line, adjacent when they differ by one.
    struct Line;

    impl SpatialGraph<i32> for Line {
        fn neighbors(&self, point: &i32) -> Vec<i32> {
            [point.checked_sub(1), point.checked_add(1)]
                .into_iter()
                .flatten()
                .collect()
        }
    }

    fn make_species(id: u64, traits: &[f64]) -> Species<i32> {
        Species::new(SpeciesId::new(id), traits.to_vec())
    }

    #[test]
    fn new_species_is_extinct() {
        let s = make_species(0, &[0.0, 0.0]);
        assert!(s.is_extinct());
        assert_eq!(s.footprint_size(), 0);
        assert_eq!(s.num_groups(), Some(0));
        assert_eq!(s.name(), "s0");
    }

    #[test]
    fn occupy_is_idempotent() {
        let mut s = make_species(1, &[0.0]);
        s.occupy(4);
        s.occupy(4);
        s.occupy_all([5, 6, 4]);
        assert_eq!(s.footprint_size(), 3);
        assert!(s.is_in(&5));
        assert!(!s.is_extinct());
    }

    #[test]
    fn vacating_last_location_makes_extinct() {
        let mut s = make_species(1, &[0.0]);
        s.occupy(1);
        assert!(!s.vacate(&2));
        assert!(s.vacate(&1));
        assert!(s.is_extinct());
    }

    #[test]
    fn groups_are_connected_components() {
        let mut s = make_species(0, &[0.0]);
        s.occupy_all([1, 2, 3, 7, 8, 20]);
        assert_eq!(s.num_groups(), None);
        assert_eq!(s.recompute_groups(&Line), 3);
        assert_eq!(s.num_groups(), Some(3));

        assert_eq!(s.group_of(&1), s.group_of(&3));
        assert_eq!(s.group_of(&7), s.group_of(&8));
        assert_ne!(s.group_of(&1), s.group_of(&7));
        assert_ne!(s.group_of(&8), s.group_of(&20));
        // Every location is tagged with an id in [0, groups).
        assert!(s.locations().all(|p| s.group_of(p).is_some_and(|g| g < 3)));
    }

    #[test]
    fn groups_match_components_of_occupied_subgraph() {
        use speciation_world::{GridPoint, Neighborhood, SpatialMap, build_lattice};

        let map = build_lattice(12, 12, Neighborhood::Moore).unwrap_or_default();
        assert_eq!(map.point_count(), 144);

        for seed in 0..20 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let footprint: Vec<GridPoint> = map
                .points()
                .copied()
                .filter(|_| rng.random_bool(0.35))
                .collect();

            // The lattice restricted to the footprint.
            let mut occupied = SpatialMap::new();
            for point in &footprint {
                let _ = occupied.add_point(*point);
            }
            for a in &footprint {
                for b in &footprint {
                    if a < b && map.are_adjacent(a, b) {
                        let _ = occupied.connect(a, b);
                    }
                }
            }
            let components = occupied.components();

            let mut s: Species<GridPoint> = Species::new(SpeciesId::new(seed), vec![0.0]);
            s.occupy_all(footprint.iter().copied());
            assert_eq!(s.recompute_groups(&map), components.len(), "seed {seed}");

            let mut seen = BTreeSet::new();
            for component in &components {
                let tags: BTreeSet<Option<usize>> = component.iter().map(|p| s.group_of(p)).collect();
                assert_eq!(tags.len(), 1, "seed {seed}: component split across groups");
                assert!(tags.iter().all(Option::is_some));
                assert!(seen.is_disjoint(&tags), "seed {seed}: groups merged");
                seen.extend(tags);
            }
        }
    }

    #[test]
    fn partition_is_independent_of_insertion_order() {
        let mut forward = make_species(0, &[0.0]);
        forward.occupy_all([1, 2, 3, 10, 11]);
        let mut backward = make_species(1, &[0.0]);
        backward.occupy_all([11, 10, 3, 2, 1]);
        assert_eq!(forward.recompute_groups(&Line), backward.recompute_groups(&Line));
        assert_eq!(forward.extract_group(0), backward.extract_group(0));
    }

    #[test]
    fn long_footprint_does_not_recurse() {
        let mut s = make_species(0, &[0.0]);
        s.occupy_all(0..200_000);
        assert_eq!(s.recompute_groups(&Line), 1);
    }

    #[test]
    fn extract_group_removes_tagged_locations() {
        let mut s = make_species(0, &[0.0]);
        s.occupy_all([1, 2, 9]);
        assert_eq!(s.recompute_groups(&Line), 2);
        let isolated = s.group_of(&9).unwrap_or(usize::MAX);

        let popped = s.extract_group(isolated);
        assert_eq!(popped, BTreeSet::from([9]));
        assert_eq!(s.locations().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(s.num_groups(), None);

        // Second extraction of the same tag finds nothing.
        assert!(s.extract_group(isolated).is_empty());
    }

    #[test]
    fn extract_unknown_group_is_empty() {
        let mut s = make_species(0, &[0.0]);
        s.occupy_all([1, 2]);
        s.recompute_groups(&Line);
        assert!(s.extract_group(5).is_empty());
        assert_eq!(s.num_groups(), Some(1));
        assert_eq!(s.footprint_size(), 2);
    }

    #[test]
    fn trait_differences_count_positions() {
        let a = make_species(0, &[1.0, 2.0]);
        let b = make_species(1, &[1.0, 5.0]);
        assert_eq!(a.trait_difference_count(&b), 1);
        assert!(!a.shares_traits_with(&b));
        let c = make_species(2, &[1.0, 2.0]);
        assert!(a.shares_traits_with(&c));
        let d = make_species(3, &[1.0, 2.0, 3.0]);
        assert_eq!(a.trait_difference_count(&d), 1);
    }

    #[test]
    fn co_occurrence_is_intersection() {
        let mut a = make_species(0, &[0.0]);
        let mut b = make_species(1, &[0.0]);
        a.occupy_all([1, 2, 3]);
        b.occupy_all([3, 4]);
        assert_eq!(a.co_occurring_locations(&b), BTreeSet::from([3]));
        b.vacate(&3);
        assert!(a.co_occurring_locations(&b).is_empty());
    }

    #[test]
    fn species_order_by_identifier_only() {
        let a = make_species(1, &[0.4]);
        let b = make_species(1, &[-0.4]);
        let c = make_species(2, &[0.4]);
        assert_eq!(a, b);
        assert!(a < c);
        assert_eq!(c.to_string(), "s2");
    }

    #[test]
    fn mutation_stays_inside_sphere() {
        let sphere = Hypersphere::default();
        let noise = Normal::new(0.0, 0.05).ok();
        assert!(noise.is_some());
        let Some(noise) = noise else { return };
        let mut rng = SmallRng::seed_from_u64(11);
        let mut s = make_species(0, &[0.0, 0.0, 0.0]);
        for _ in 0..500 {
            assert!(s.mutate(&mut rng, &noise, &sphere).is_ok());
            assert!(sphere.contains(s.traits()));
        }
        assert_eq!(s.num_traits(), 3);
        assert_eq!(s.trait_at(3), None);
    }

    #[test]
    fn record_reflects_state() {
        let mut s = make_species(4, &[0.25, -0.5]);
        s.occupy_all([1, 3]);
        s.recompute_groups(&Line);
        let record = s.record(30);
        assert_eq!(record.name, "s4");
        assert_eq!(record.date, 30);
        assert_eq!(record.location_count, 2);
        assert_eq!(record.group_count, Some(2));
    }
}
