//! Error types for world construction.
//!
//! Queries never return these: a sweep always produces a usable result value.

use thiserror::Error;

use crate::cell::{CellId, SideId};

/// Result type alias for world construction.
pub type BuildResult<T> = Result<T, BuildError>;

/// Errors reported by [`WorldBuilder::build`](crate::world::WorldBuilder::build).
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    /// The world would exceed the cell capacity.
    #[error("too many cells: {count} (max {max})")]
    TooManyCells { count: usize, max: usize },

    /// A cell references a vertex that does not exist.
    #[error("cell {cell} references vertex {vertex}, but only {count} vertices exist")]
    VertexOutOfRange {
        cell: CellId,
        vertex: usize,
        count: usize,
    },

    /// A side points at a neighbor cell that does not exist.
    #[error("cell {cell} side {side:?} links to missing cell {neighbor}")]
    NeighborOutOfRange {
        cell: CellId,
        side: SideId,
        neighbor: CellId,
    },

    /// A side points at a neighbor that does not link back.
    #[error("cell {cell} side {side:?} links to cell {neighbor}, which has no link back")]
    OneWayLink {
        cell: CellId,
        side: SideId,
        neighbor: CellId,
    },

    /// A side references a wall record that does not exist.
    #[error("cell {cell} side {side:?} references missing wall {wall}")]
    WallOutOfRange {
        cell: CellId,
        side: SideId,
        wall: usize,
    },

    /// A side has (near) zero area, so no normal can be derived.
    #[error("cell {cell} side {side:?} is degenerate")]
    DegenerateSide { cell: CellId, side: SideId },
}
