/// Number of sides on every cell.
pub const SIDES_PER_CELL: usize = 6;

/// Number of corner vertices on every cell.
pub const VERTS_PER_CELL: usize = 8;

/// Upper bound on cells in one world.
///
/// `CellId` is a `u16`, and `u16::MAX` is kept free so it can never be confused
/// with a real cell in packed representations.
pub const MAX_CELLS: usize = u16::MAX as usize;

/// Upper bound on simultaneously live entities.
pub const MAX_ENTITIES: usize = 1 << 20;

/// Capacity of the cell path recorded by a query that asks for it.
pub const MAX_PATH_CELLS: usize = 100;

/// Capacity of the per-call ignore list.
pub const MAX_IGNORE_ENTITIES: usize = 32;
