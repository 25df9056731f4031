//! Rectangular lattices of grid cells.
//!
//! A lattice is the usual landscape for spatially explicit speciation runs:
//! every cell is a location, and cells touch their orthogonal (von Neumann)
//! or orthogonal-plus-diagonal (Moore) neighbors. Edges of the grid do not
//! wrap around.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WorldError;
use crate::spatial_map::SpatialMap;

/// A cell on a rectangular lattice. Ordered by column, then row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    /// Column index, starting at zero on the western edge.
    pub x: u32,
    /// Row index, starting at zero on the northern edge.
    pub y: u32,
}

impl GridPoint {
    /// Create a grid point.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl core::fmt::Display for GridPoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Which surrounding cells count as adjacent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Neighborhood {
    /// North, south, east and west.
    #[default]
    VonNeumann,
    /// The four orthogonal cells plus the four diagonals.
    Moore,
}

impl Neighborhood {
    /// Column/row offsets of the cells considered adjacent.
    const fn offsets(self) -> &'static [(i64, i64)] {
        match self {
            Self::VonNeumann => &[(1, 0), (0, 1)],
            Self::Moore => &[(1, 0), (0, 1), (1, 1), (1, -1)],
        }
    }
}

/// Build a `width` x `height` lattice with the given neighbourhood.
///
/// Only "forward" offsets are walked; [`SpatialMap::connect`] stores each
/// edge in both directions.
///
/// # Errors
///
/// Returns [`WorldError::EmptyLattice`] if either dimension is zero.
pub fn build_lattice(
    width: u32,
    height: u32,
    neighborhood: Neighborhood,
) -> Result<SpatialMap<GridPoint>, WorldError> {
    if width == 0 || height == 0 {
        return Err(WorldError::EmptyLattice { width, height });
    }

    let mut map = SpatialMap::new();
    for x in 0..width {
        for y in 0..height {
            map.add_point(GridPoint::new(x, y))?;
        }
    }

    for x in 0..width {
        for y in 0..height {
            let here = GridPoint::new(x, y);
            for &(dx, dy) in neighborhood.offsets() {
                if let Some(there) = offset(here, dx, dy, width, height) {
                    map.connect(&here, &there)?;
                }
            }
        }
    }

    debug!(
        width,
        height,
        ?neighborhood,
        edges = map.edge_count(),
        "lattice built"
    );
    Ok(map)
}

/// Shift a point by `(dx, dy)`, returning `None` if it leaves the grid.
fn offset(point: GridPoint, dx: i64, dy: i64, width: u32, height: u32) -> Option<GridPoint> {
    let x = i64::from(point.x).checked_add(dx)?;
    let y = i64::from(point.y).checked_add(dy)?;
    let x = u32::try_from(x).ok().filter(|&x| x < width)?;
    let y = u32::try_from(y).ok().filter(|&y| y < height)?;
    Some(GridPoint::new(x, y))
}
