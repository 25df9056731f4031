//! The spatial adjacency contract.
//!
//! The phylogeny never owns geography. It only asks "which locations touch
//! this one?" while flood-filling a species' footprint into connected
//! groups. Anything that can answer that question implements
//! [`SpatialGraph`].

/// Answers neighbor queries over an opaque, orderable location type.
///
/// Implementations may return locations the caller does not occupy; callers
/// restrict the answer to their own footprint. Unknown locations have no
/// neighbors.
pub trait SpatialGraph<P> {
    /// Return every location adjacent to `point`.
    fn neighbors(&self, point: &P) -> Vec<P>;
}

impl<P, G> SpatialGraph<P> for &G
where
    G: SpatialGraph<P> + ?Sized,
{
    fn neighbors(&self, point: &P) -> Vec<P> {
        (**self).neighbors(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Integers on a line, adjacent when they differ by one.
    struct Line;

    impl SpatialGraph<i64> for Line {
        fn neighbors(&self, point: &i64) -> Vec<i64> {
            [point.checked_sub(1), point.checked_add(1)]
                .into_iter()
                .flatten()
                .collect()
        }
    }

    #[test]
    fn references_forward_to_the_graph() {
        let line = Line;
        let by_ref: &Line = &line;
        assert_eq!(SpatialGraph::neighbors(&by_ref, &5), vec![4, 6]);
    }
}
