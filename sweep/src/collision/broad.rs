use nalgebra as na;
use rapier3d::parry::{
    bounding_volume::Aabb,
    partitioning::{Bvh, BvhBuildStrategy},
};

use crate::{
    cell::{Cell, CellId, SideId},
    collision::{masks, sweep::VisitMarks, types::Vec3},
    world::World,
};

/// BVH over cell AABBs, built once with the world.
///
/// Only used as the global fallback of point location: the neighbor walk in
/// [`find_point_cell`] resolves almost every lookup without touching it.
pub struct CellLocator {
    bvh: Bvh,
    len: usize,
}

impl CellLocator {
    pub fn build(aabbs: &[Aabb]) -> Self {
        Self {
            bvh: Bvh::from_leaves(BvhBuildStrategy::Binned, aabbs),
            len: aabbs.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// First cell whose AABB contains `point` and that `accept` agrees with.
    pub fn find(&self, point: &Vec3, mut accept: impl FnMut(CellId) -> bool) -> Option<CellId> {
        let p = na::Point3::from(*point);
        let probe = Aabb::new(p, p);
        self.bvh
            .intersect_aabb(&probe)
            .map(|leaf| leaf as CellId)
            .find(|&cell| accept(cell))
    }
}

/// World-space AABB of a cell's corners.
pub fn cell_aabb(cell: &Cell, vertices: &[Vec3]) -> Aabb {
    let first = vertices[cell.verts[0]];
    let (mins, maxs) = cell.verts[1..]
        .iter()
        .fold((first, first), |(lo, hi), &v| {
            (lo.inf(&vertices[v]), hi.sup(&vertices[v]))
        });
    Aabb::new(na::Point3::from(mins), na::Point3::from(maxs))
}

/// Find the cell containing `point`, starting the search at `seed`.
///
/// Walks from `seed` through the sides `point` is behind, which resolves points
/// that drifted a few cells away. Falls back to testing every cell whose AABB
/// contains the point. `marks` is reset here.
pub fn find_point_cell(
    world: &World,
    marks: &mut VisitMarks,
    point: &Vec3,
    seed: CellId,
    max_visited: usize,
) -> Option<CellId> {
    marks.reset(world.cell_count());
    if world.cell(seed).is_some()
        && let Some(found) = walk_from(world, marks, point, seed, max_visited)
    {
        return Some(found);
    }

    let locator = world.locator();
    if locator.is_empty() {
        return None;
    }
    locator.find(point, |cell| masks::point_in_cell(world, cell, point))
}

fn walk_from(
    world: &World,
    marks: &mut VisitMarks,
    point: &Vec3,
    cell: CellId,
    max_visited: usize,
) -> Option<CellId> {
    if !marks.visit(cell) {
        return None;
    }
    let center = masks::get_seg_masks(world, cell, point, 0.0).center;
    if center == 0 {
        return Some(cell);
    }

    let sides = &world.cell(cell)?.sides;
    for side in SideId::ALL {
        if center & (1 << side.index()) == 0 {
            continue;
        }
        let Some(next) = sides[side.index()].neighbor.cell() else {
            continue;
        };
        if marks.is_visited(next) || marks.count() >= max_visited {
            continue;
        }
        if let Some(found) = walk_from(world, marks, point, next, max_visited) {
            return Some(found);
        }
    }
    None
}
