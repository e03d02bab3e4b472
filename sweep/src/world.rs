//! The world context every query and movement call runs against.
//!
//! A [`World`] owns the static cell graph (vertices, cells, precomputed side
//! geometry), the mutable wall records, the entity table and the collision
//! matrix. It is built once through [`WorldBuilder`], which validates every
//! reference up front so queries never have to.

use crate::{
    cell::{
        Cell, CellId, Neighbor, SIDE_CORNERS, Side, SideId, WallId, box_corners,
        compute_side_geometry,
    },
    collision::{
        broad::{CellLocator, cell_aabb},
        filter::CollisionMatrix,
        types::Vec3,
    },
    constants::{MAX_CELLS, VERTS_PER_CELL},
    entity::EntityTable,
    error::{BuildError, BuildResult},
    wall::Wall,
};

pub struct World {
    vertices: Vec<Vec3>,
    cells: Vec<Cell>,
    walls: Vec<Wall>,
    locator: CellLocator,
    /// Live entities and their cell membership.
    pub entities: EntityTable,
    /// Which entity classes collide with each other and with walls.
    pub matrix: CollisionMatrix,
    /// Seconds since the level started. Drives projectile grace windows.
    pub game_time: f32,
}

impl World {
    #[inline]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id as usize)
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    #[inline]
    pub fn wall(&self, id: WallId) -> Option<&Wall> {
        self.walls.get(id as usize)
    }

    /// Mutable wall access for door and blast logic. Call between queries only.
    #[inline]
    pub fn wall_mut(&mut self, id: WallId) -> Option<&mut Wall> {
        self.walls.get_mut(id as usize)
    }

    /// Wall gating `side` of `cell`, if any.
    pub fn side_wall(&self, cell: CellId, side: SideId) -> Option<&Wall> {
        let id = self.cell(cell)?.side(side).wall?;
        self.wall(id)
    }

    #[inline]
    pub fn locator(&self) -> &CellLocator {
        &self.locator
    }

    /// Center of `cell`, or `None` if it does not exist.
    pub fn cell_center(&self, cell: CellId) -> Option<Vec3> {
        self.cell(cell).map(|c| c.center(&self.vertices))
    }

    #[inline]
    pub fn advance_time(&mut self, dt: f32) {
        self.game_time += dt;
    }
}

/// Incremental world construction.
///
/// Cells start with every side solid. Link them with [`connect`](Self::connect),
/// attach walls with [`set_wall`](Self::set_wall), then call [`build`](Self::build).
#[derive(Clone, Debug, Default)]
pub struct WorldBuilder {
    vertices: Vec<Vec3>,
    cells: Vec<Cell>,
    walls: Vec<Wall>,
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, p: Vec3) -> usize {
        self.vertices.push(p);
        self.vertices.len() - 1
    }

    /// Add a cell over existing vertices, in the corner layout of [`crate::cell`].
    pub fn add_cell(&mut self, verts: [usize; VERTS_PER_CELL]) -> CellId {
        self.cells.push(Cell {
            verts,
            sides: [Side::default(); 6],
        });
        // Out-of-range counts are reported by `build`.
        (self.cells.len() - 1).min(MAX_CELLS) as CellId
    }

    /// Add an axis-aligned box cell with its own 8 vertices.
    pub fn add_box(&mut self, min: Vec3, max: Vec3) -> CellId {
        let corners = box_corners(min, max);
        let base = self.vertices.len();
        self.vertices.extend_from_slice(&corners);
        self.add_cell(std::array::from_fn(|i| base + i))
    }

    /// Link two cells through the given sides, both ways.
    pub fn connect(&mut self, a: CellId, side_a: SideId, b: CellId, side_b: SideId) -> &mut Self {
        self.set_neighbor(a, side_a, Neighbor::Cell(b));
        self.set_neighbor(b, side_b, Neighbor::Cell(a));
        self
    }

    pub fn set_neighbor(&mut self, cell: CellId, side: SideId, neighbor: Neighbor) -> &mut Self {
        if let Some(s) = self.side_mut(cell, side) {
            s.neighbor = neighbor;
        }
        self
    }

    pub fn add_wall(&mut self, wall: Wall) -> WallId {
        self.walls.push(wall);
        (self.walls.len() - 1) as WallId
    }

    pub fn set_wall(&mut self, cell: CellId, side: SideId, wall: WallId) -> &mut Self {
        if let Some(s) = self.side_mut(cell, side) {
            s.wall = Some(wall);
        }
        self
    }

    pub fn set_transparent(&mut self, cell: CellId, side: SideId, transparent: bool) -> &mut Self {
        if let Some(s) = self.side_mut(cell, side) {
            s.transparent = transparent;
        }
        self
    }

    fn side_mut(&mut self, cell: CellId, side: SideId) -> Option<&mut Side> {
        self.cells
            .get_mut(cell as usize)
            .map(|c| &mut c.sides[side.index()])
    }

    /// Validate references, compute side splits and normals, and build the locator.
    pub fn build(self) -> BuildResult<World> {
        let Self {
            vertices,
            mut cells,
            walls,
        } = self;

        if cells.len() > MAX_CELLS {
            return Err(BuildError::TooManyCells {
                count: cells.len(),
                max: MAX_CELLS,
            });
        }

        for (index, cell) in cells.iter().enumerate() {
            let id = index as CellId;
            if let Some(&vertex) = cell.verts.iter().find(|&&v| v >= vertices.len()) {
                return Err(BuildError::VertexOutOfRange {
                    cell: id,
                    vertex,
                    count: vertices.len(),
                });
            }

            for side in SideId::ALL {
                let s = cell.side(side);
                if let Some(wall) = s.wall
                    && wall as usize >= walls.len()
                {
                    return Err(BuildError::WallOutOfRange {
                        cell: id,
                        side,
                        wall: wall as usize,
                    });
                }

                let Neighbor::Cell(neighbor) = s.neighbor else {
                    continue;
                };
                let Some(other) = cells.get(neighbor as usize) else {
                    return Err(BuildError::NeighborOutOfRange {
                        cell: id,
                        side,
                        neighbor,
                    });
                };
                let links_back = other
                    .sides
                    .iter()
                    .any(|back| back.neighbor == Neighbor::Cell(id));
                if !links_back {
                    return Err(BuildError::OneWayLink {
                        cell: id,
                        side,
                        neighbor,
                    });
                }
            }
        }

        for (index, cell) in cells.iter_mut().enumerate() {
            for side in SideId::ALL {
                let corners = SIDE_CORNERS[side.index()].map(|slot| vertices[cell.verts[slot]]);
                let (split, normals) =
                    compute_side_geometry(corners).ok_or(BuildError::DegenerateSide {
                        cell: index as CellId,
                        side,
                    })?;
                let s = &mut cell.sides[side.index()];
                s.split = split;
                s.normals = normals;
            }
        }

        let aabbs: Vec<_> = cells.iter().map(|c| cell_aabb(c, &vertices)).collect();
        let locator = CellLocator::build(&aabbs);

        log::info!(
            "world built: {} cells ({} located), {} vertices, {} walls",
            cells.len(),
            locator.len(),
            vertices.len(),
            walls.len()
        );

        Ok(World {
            entities: EntityTable::with_cells(cells.len()),
            vertices,
            cells,
            walls,
            locator,
            matrix: CollisionMatrix::default(),
            game_time: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::FaceSplit;
    use approx::assert_relative_eq;

    fn two_boxes() -> WorldBuilder {
        let mut b = WorldBuilder::new();
        let a = b.add_box(Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 10.0, 10.0));
        let c = b.add_box(Vec3::new(10.0, 0.0, 0.0), Vec3::new(20.0, 10.0, 10.0));
        b.connect(a, SideId::Right, c, SideId::Left);
        b
    }

    #[test]
    fn build_computes_inward_normals_and_links() {
        let world = two_boxes().build().unwrap();
        assert_eq!(world.cell_count(), 2);

        let cell = world.cell(0).unwrap();
        assert_eq!(cell.side(SideId::Right).neighbor, Neighbor::Cell(1));
        assert_eq!(cell.side(SideId::Right).split, FaceSplit::Quad);
        assert_relative_eq!(
            cell.side(SideId::Right).normals[0],
            -Vec3::x(),
            epsilon = 1.0e-6
        );
        assert_relative_eq!(
            world.cell_center(1).unwrap(),
            Vec3::new(15.0, 5.0, 5.0),
            epsilon = 1.0e-5
        );
        assert_eq!(world.entities.len(), 0);
    }

    #[test]
    fn one_way_link_is_rejected() {
        let mut b = WorldBuilder::new();
        let a = b.add_box(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let c = b.add_box(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        b.set_neighbor(a, SideId::Right, Neighbor::Cell(c));

        assert_eq!(
            b.build().err(),
            Some(BuildError::OneWayLink {
                cell: 0,
                side: SideId::Right,
                neighbor: 1
            })
        );
    }

    #[test]
    fn missing_references_are_rejected() {
        let mut b = WorldBuilder::new();
        let a = b.add_box(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        b.set_neighbor(a, SideId::Top, Neighbor::Cell(7));
        assert!(matches!(
            b.build(),
            Err(BuildError::NeighborOutOfRange { neighbor: 7, .. })
        ));

        let mut b = WorldBuilder::new();
        let a = b.add_box(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        b.set_wall(a, SideId::Top, 3);
        assert!(matches!(
            b.build(),
            Err(BuildError::WallOutOfRange { wall: 3, .. })
        ));

        let mut b = WorldBuilder::new();
        b.add_vertex(Vec3::zeros());
        b.add_cell([0, 0, 0, 0, 0, 0, 0, 12]);
        assert!(matches!(
            b.build(),
            Err(BuildError::VertexOutOfRange { vertex: 12, .. })
        ));
    }

    #[test]
    fn collapsed_cell_is_degenerate() {
        let mut b = WorldBuilder::new();
        let v = b.add_vertex(Vec3::zeros());
        b.add_cell([v; 8]);
        assert!(matches!(
            b.build(),
            Err(BuildError::DegenerateSide { cell: 0, .. })
        ));
    }

    #[test]
    fn wall_lookup_by_side() {
        let mut b = two_boxes();
        let w = b.add_wall(Wall::blastable(50.0));
        b.set_wall(0, SideId::Right, w);
        let mut world = b.build().unwrap();

        assert_eq!(world.side_wall(0, SideId::Right).unwrap().hit_points, 50.0);
        assert!(world.side_wall(0, SideId::Left).is_none());

        world.wall_mut(w).unwrap().hit_points = 0.0;
        assert_eq!(world.wall(w).unwrap().hit_points, 0.0);
    }
}
