//! Per-cell containment masks.
//!
//! For a point and a radius, [`get_seg_masks`] reports which sub-faces, which
//! sides, and which side planes (ignoring the radius) the point is behind.
//! Bit layout:
//! - `face`:   bit `side * 2 + sub_face`
//! - `side`:   bit `side`
//! - `center`: bit `side`, radius ignored

use crate::{
    cell::{CellId, SideId},
    collision::{settings::PLANE_DIST_TOLERANCE, types::Vec3},
    world::World,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SegMasks {
    pub face: u16,
    pub side: u8,
    pub center: u8,
}

/// Bit of sub-face `face` of `side` in [`SegMasks::face`].
#[inline]
pub fn face_bit(side: SideId, face: usize) -> u16 {
    1 << (side.index() * 2 + face)
}

/// Masks of `point` against `cell`. A missing cell reports "outside everything".
pub fn get_seg_masks(world: &World, cell: CellId, point: &Vec3, radius: f32) -> SegMasks {
    let Some(c) = world.cell(cell) else {
        return SegMasks {
            face: u16::MAX,
            side: u8::MAX,
            center: u8::MAX,
        };
    };

    let mut masks = SegMasks::default();
    for side in SideId::ALL {
        for face in 0..c.side(side).split.face_count() {
            let d = c.face_polygon(world.vertices(), side, face).distance(point);
            if d - radius < -PLANE_DIST_TOLERANCE {
                masks.face |= face_bit(side, face);
                masks.side |= 1 << side.index();
            }
            if d < -PLANE_DIST_TOLERANCE {
                masks.center |= 1 << side.index();
            }
        }
    }
    masks
}

/// True if `point` lies inside `cell` (within the plane tolerance).
#[inline]
pub fn point_in_cell(world: &World, cell: CellId, point: &Vec3) -> bool {
    get_seg_masks(world, cell, point, 0.0).center == 0
}
