//! Cell graph data model.
//!
//! # Model
//! - A cell is a convex hexahedron addressed by a compact [`CellId`].
//! - Its 8 corners are indices into the world's shared vertex array.
//! - Each of its 6 sides renders as one quad or as two triangles, and carries one
//!   precomputed normal per sub-face. Normals point *into* the cell.
//!
//! # Corner layout
//! For an axis-aligned box the corners are ordered:
//!
//! ```text
//! 0 (-,-,-)  1 (+,-,-)  2 (+,+,-)  3 (-,+,-)
//! 4 (-,-,+)  5 (+,-,+)  6 (+,+,+)  7 (-,+,+)
//! ```
//!
//! [`SIDE_CORNERS`] lists each side's corners counter-clockwise as seen from inside
//! the cell. Every edge/inside test in `collision::narrow_phase` relies on that winding.

use crate::{
    collision::{settings::PLANE_DIST_TOLERANCE, types::Vec3},
    constants::{SIDES_PER_CELL, VERTS_PER_CELL},
};

/// Index of a cell in [`World::cells`](crate::world::World::cells).
pub type CellId = u16;

/// Index of a wall record in [`World::walls`](crate::world::World::walls).
pub type WallId = u16;

/// One of the six sides of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SideId {
    Left = 0,
    Top = 1,
    Right = 2,
    Bottom = 3,
    Back = 4,
    Front = 5,
}

impl SideId {
    pub const ALL: [SideId; SIDES_PER_CELL] = [
        SideId::Left,
        SideId::Top,
        SideId::Right,
        SideId::Bottom,
        SideId::Back,
        SideId::Front,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Option<SideId> {
        SideId::ALL.get(index).copied()
    }

    /// The side facing this one across the cell.
    #[inline]
    pub fn opposite(self) -> SideId {
        match self {
            SideId::Left => SideId::Right,
            SideId::Right => SideId::Left,
            SideId::Top => SideId::Bottom,
            SideId::Bottom => SideId::Top,
            SideId::Back => SideId::Front,
            SideId::Front => SideId::Back,
        }
    }
}

/// Corner slots of each side, counter-clockwise as seen from inside the cell.
pub const SIDE_CORNERS: [[usize; 4]; SIDES_PER_CELL] = [
    [0, 3, 7, 4], // Left   (-x)
    [3, 2, 6, 7], // Top    (+y)
    [1, 5, 6, 2], // Right  (+x)
    [0, 4, 5, 1], // Bottom (-y)
    [0, 1, 2, 3], // Back   (-z)
    [4, 7, 6, 5], // Front  (+z)
];

/// What lies on the far side of a cell side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Neighbor {
    /// Nothing: the side is a solid boundary.
    Solid,
    /// The outside of the level (e.g. open sky).
    External,
    /// Another cell.
    Cell(CellId),
}

impl Neighbor {
    #[inline]
    pub fn cell(self) -> Option<CellId> {
        match self {
            Neighbor::Cell(id) => Some(id),
            Neighbor::Solid | Neighbor::External => None,
        }
    }
}

/// How a side is broken into sub-faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FaceSplit {
    /// One planar quad.
    #[default]
    Quad,
    /// Two triangles sharing the diagonal between corner slots 0 and 2.
    Tri02,
    /// Two triangles sharing the diagonal between corner slots 1 and 3.
    Tri13,
}

const QUAD_SLOTS: [usize; 4] = [0, 1, 2, 3];
const TRI02_SLOTS: [[usize; 3]; 2] = [[0, 1, 2], [0, 2, 3]];
const TRI13_SLOTS: [[usize; 3]; 2] = [[0, 1, 3], [1, 2, 3]];

impl FaceSplit {
    #[inline]
    pub fn face_count(self) -> usize {
        match self {
            FaceSplit::Quad => 1,
            FaceSplit::Tri02 | FaceSplit::Tri13 => 2,
        }
    }

    /// Corner slots (into a [`SIDE_CORNERS`] row) bounding sub-face `face`, in winding order.
    #[inline]
    pub fn slots(self, face: usize) -> &'static [usize] {
        match self {
            FaceSplit::Quad => &QUAD_SLOTS,
            FaceSplit::Tri02 => &TRI02_SLOTS[face & 1],
            FaceSplit::Tri13 => &TRI13_SLOTS[face & 1],
        }
    }
}

/// One side of a cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Side {
    pub neighbor: Neighbor,
    /// Wall gating this side; `None` means the side is fully open.
    pub wall: Option<WallId>,
    /// The side's texture lets light through (grates, glass).
    pub transparent: bool,
    pub split: FaceSplit,
    /// Inward unit normal per sub-face. The second entry equals the first for quads.
    pub normals: [Vec3; 2],
}

impl Default for Side {
    fn default() -> Self {
        Self {
            neighbor: Neighbor::Solid,
            wall: None,
            transparent: false,
            split: FaceSplit::Quad,
            normals: [Vec3::zeros(); 2],
        }
    }
}

/// A convex hexahedral cell ("segment").
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    /// World vertex index of each corner, in the layout described at module level.
    pub verts: [usize; VERTS_PER_CELL],
    pub sides: [Side; SIDES_PER_CELL],
}

impl Cell {
    /// World vertex indices of `side`'s four corners, in winding order.
    #[inline]
    pub fn side_verts(&self, side: SideId) -> [usize; 4] {
        SIDE_CORNERS[side.index()].map(|slot| self.verts[slot])
    }

    #[inline]
    pub fn side(&self, side: SideId) -> &Side {
        &self.sides[side.index()]
    }

    /// Average of the 8 corners.
    pub fn center(&self, vertices: &[Vec3]) -> Vec3 {
        let sum = self
            .verts
            .iter()
            .fold(Vec3::zeros(), |acc, &v| acc + vertices[v]);
        sum / VERTS_PER_CELL as f32
    }

    /// Resolve sub-face `face` of `side` into world-space geometry.
    pub fn face_polygon(&self, vertices: &[Vec3], side: SideId, face: usize) -> FacePolygon {
        let s = self.side(side);
        let corners = self.side_verts(side);
        let slots = s.split.slots(face);

        let mut verts = [Vec3::zeros(); 4];
        let mut lowest = usize::MAX;
        for (i, &slot) in slots.iter().enumerate() {
            let index = corners[slot];
            verts[i] = vertices[index];
            lowest = lowest.min(index);
        }

        FacePolygon {
            verts,
            len: slots.len(),
            normal: s.normals[face & 1],
            // Lowest vertex index: every caller picks the same point for a given plane.
            plane_point: vertices[lowest],
        }
    }
}

/// World-space geometry of one sub-face: a triangle or a quad with its inward normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FacePolygon {
    pub verts: [Vec3; 4],
    /// 3 or 4.
    pub len: usize,
    pub normal: Vec3,
    pub plane_point: Vec3,
}

impl FacePolygon {
    /// Endpoints of edge `i` (from vertex `i` to vertex `i + 1`, wrapping).
    #[inline]
    pub fn edge(&self, i: usize) -> (Vec3, Vec3) {
        (self.verts[i], self.verts[(i + 1) % self.len])
    }

    /// Signed distance of `p` from the sub-face plane; positive is inside the cell.
    #[inline]
    pub fn distance(&self, p: &Vec3) -> f32 {
        self.normal.dot(&(p - self.plane_point))
    }
}

/// Choose the triangulation of a side and compute its inward normals.
///
/// A side whose corners lie within [`PLANE_DIST_TOLERANCE`] of a common plane stays a
/// quad. Otherwise it is split along the diagonal that keeps the cell convex, so a
/// point is outside the side as soon as it is behind either triangle.
///
/// Returns `None` for a degenerate (zero-area) side.
pub fn compute_side_geometry(corners: [Vec3; 4]) -> Option<(FaceSplit, [Vec3; 2])> {
    let [a, b, c, d] = corners;

    let quad_normal = (c - a).cross(&(d - b)).try_normalize(1.0e-12)?;
    let centroid = (a + b + c + d) * 0.25;
    let planar = corners
        .iter()
        .all(|p| quad_normal.dot(&(p - centroid)).abs() <= PLANE_DIST_TOLERANCE);
    if planar {
        return Some((FaceSplit::Quad, [quad_normal; 2]));
    }

    let tri_normal = |p: Vec3, q: Vec3, r: Vec3| (q - p).cross(&(r - q)).try_normalize(1.0e-12);

    let n_abc = tri_normal(a, b, c)?;
    if n_abc.dot(&(d - a)) >= 0.0 {
        // `d` folds inward relative to abc: the 0-2 diagonal is the convex split.
        let n_acd = tri_normal(a, c, d)?;
        Some((FaceSplit::Tri02, [n_abc, n_acd]))
    } else {
        let n_abd = tri_normal(a, b, d)?;
        let n_bcd = tri_normal(b, c, d)?;
        Some((FaceSplit::Tri13, [n_abd, n_bcd]))
    }
}

/// Corner positions of an axis-aligned box in the cell corner layout.
pub fn box_corners(min: Vec3, max: Vec3) -> [Vec3; VERTS_PER_CELL] {
    [
        Vec3::new(min.x, min.y, min.z),
        Vec3::new(max.x, min.y, min.z),
        Vec3::new(max.x, max.y, min.z),
        Vec3::new(min.x, max.y, min.z),
        Vec3::new(min.x, min.y, max.z),
        Vec3::new(max.x, min.y, max.z),
        Vec3::new(max.x, max.y, max.z),
        Vec3::new(min.x, max.y, max.z),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn side_points(corners: &[Vec3; 8], side: SideId) -> [Vec3; 4] {
        SIDE_CORNERS[side.index()].map(|slot| corners[slot])
    }

    #[test]
    fn opposite_is_an_involution() {
        for side in SideId::ALL {
            assert_ne!(side.opposite(), side);
            assert_eq!(side.opposite().opposite(), side);
        }
    }

    #[test]
    fn from_index_round_trips_and_rejects_out_of_range() {
        for side in SideId::ALL {
            assert_eq!(SideId::from_index(side.index()), Some(side));
        }
        assert_eq!(SideId::from_index(6), None);
    }

    #[test]
    fn box_sides_are_planar_quads_with_inward_normals() {
        let corners = box_corners(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
        let expected = [
            (SideId::Left, Vec3::x()),
            (SideId::Right, -Vec3::x()),
            (SideId::Bottom, Vec3::y()),
            (SideId::Top, -Vec3::y()),
            (SideId::Back, Vec3::z()),
            (SideId::Front, -Vec3::z()),
        ];

        for (side, normal) in expected {
            let (split, normals) =
                compute_side_geometry(side_points(&corners, side)).expect("non-degenerate");
            assert_eq!(split, FaceSplit::Quad, "{side:?}");
            assert_relative_eq!(normals[0], normal, epsilon = 1.0e-6);
        }
    }

    #[test]
    fn warped_side_is_split_along_the_convex_diagonal() {
        // Bottom side of a unit box with corner slot 3 pushed inward (up).
        let mut corners = side_points(
            &box_corners(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)),
            SideId::Bottom,
        );
        corners[3].y += 0.2;
        let (split, normals) = compute_side_geometry(corners).expect("non-degenerate");
        assert_eq!(split, FaceSplit::Tri02);
        assert!(normals[0].y > 0.9 && normals[1].y > 0.9);

        // Pushing the same corner outward flips the choice.
        corners[3].y -= 0.4;
        let (split, _) = compute_side_geometry(corners).expect("non-degenerate");
        assert_eq!(split, FaceSplit::Tri13);
    }

    #[test]
    fn collapsed_side_is_rejected() {
        let p = Vec3::new(1.0, 1.0, 1.0);
        assert!(compute_side_geometry([p, p, p, p]).is_none());
    }

    #[test]
    fn split_slots_keep_winding() {
        assert_eq!(FaceSplit::Quad.slots(0), &[0, 1, 2, 3]);
        assert_eq!(FaceSplit::Tri02.slots(1), &[0, 2, 3]);
        assert_eq!(FaceSplit::Tri13.slots(0), &[0, 1, 3]);
        assert_eq!(FaceSplit::Tri13.face_count(), 2);
    }
}
