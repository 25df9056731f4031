//! Type-safe identifier wrappers around `u64` counters.
//!
//! Identifiers are handed out by a single monotonically increasing counter
//! owned by the phylogenetic tree, so they are never reused within one run.
//! Wrapping them prevents a species identifier from being used where a
//! branch key is expected (and vice versa).

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `u64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            /// Wrap a raw counter value.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Return the inner counter value.
            pub const fn into_inner(self) -> u64 {
                self.0
            }

            /// Return the identifier that follows this one, or `None` if the
            /// counter is exhausted.
            pub const fn next(self) -> Option<Self> {
                match self.0.checked_add(1) {
                    Some(raw) => Some(Self(raw)),
                    None => None,
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier of a species (a labelled lineage in the tree).
    ///
    /// Species are totally ordered by this identifier alone.
    SpeciesId
}

define_id! {
    /// Key of a node in the phylogenetic tree's arena.
    ///
    /// Every species occupies exactly one branch, but unlabelled internal
    /// branches have no species identifier.
    BranchId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_ordered_by_counter() {
        let a = SpeciesId::new(3);
        let b = SpeciesId::new(10);
        assert!(a < b);
        assert_eq!(a.next(), Some(SpeciesId::new(4)));
    }

    #[test]
    fn exhausted_counter_has_no_successor() {
        assert_eq!(BranchId::new(u64::MAX).next(), None);
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = SpeciesId::new(42);
        let json = serde_json::to_string(&original).ok();
        assert_eq!(json.as_deref(), Some("42"));
        let restored: Result<SpeciesId, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn id_display_matches_counter() {
        let id = BranchId::new(7);
        assert_eq!(id.to_string(), "7");
        assert_eq!(u64::from(id), 7);
    }
}
