use crate::{
    cell::FacePolygon,
    collision::{settings::PLANE_HIT_MAX_BACKTRACK, types::Vec3},
};

/// How a sphere touches a face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaceContact {
    None,
    /// The sphere's projection lands inside the face.
    Face,
    /// The sphere touches the interior of an edge.
    Edge,
    /// The sphere touches a vertex.
    Corner,
}

impl FaceContact {
    #[inline]
    pub fn is_hit(self) -> bool {
        self != FaceContact::None
    }
}

/// Where a sphere of `radius` moving from `p0` to `p1` first rests against a plane.
///
/// Returns the sphere center at contact. Rejects parallel motion and contact
/// past `p1`. A sphere already penetrating the plane and moving deeper is backed
/// out along its path by at most [`PLANE_HIT_MAX_BACKTRACK`] sweep lengths; one
/// penetrating further than that is held at `p0`.
pub fn find_plane_line_intersection(
    plane_point: &Vec3,
    normal: &Vec3,
    p0: &Vec3,
    p1: &Vec3,
    radius: f32,
) -> Option<Vec3> {
    let d = p1 - p0;
    let num = normal.dot(&(p0 - plane_point)) - radius;
    let den = -normal.dot(&d);
    if den == 0.0 {
        return None;
    }

    let mut t = num / den;
    if t > 1.0 {
        return None;
    }
    if t < -PLANE_HIT_MAX_BACKTRACK {
        if num >= 0.0 || den <= 0.0 {
            return None;
        }
        t = 0.0;
    }
    Some(p0 + d * t)
}

/// Projection axes for a face: drop the dominant normal axis and keep the two
/// others in an order that preserves the face winding.
#[inline]
fn projection_axes(normal: &Vec3) -> (usize, usize) {
    let a = normal.abs();
    let k = if a.x >= a.y && a.x >= a.z {
        0
    } else if a.y >= a.z {
        1
    } else {
        2
    };
    let (i, j) = match k {
        0 => (1, 2),
        1 => (2, 0),
        _ => (0, 1),
    };
    if normal[k] > 0.0 { (i, j) } else { (j, i) }
}

/// Bit `i` set when `point`, projected onto the face plane, lies outside edge `i`.
///
/// Zero means the projection is inside the face.
pub fn check_point_to_face(point: &Vec3, face: &FacePolygon) -> u8 {
    let (i, j) = projection_axes(&face.normal);
    let mut mask = 0u8;
    for e in 0..face.len {
        let (v0, v1) = face.edge(e);
        let edge = v1 - v0;
        let check = point - v0;
        if edge[i] * check[j] - edge[j] * check[i] < 0.0 {
            mask |= 1 << e;
        }
    }
    mask
}

/// Classify a sphere centered on the face plane against the face.
///
/// Outside the face, only the first violated edge is tested.
pub fn check_sphere_to_face(point: &Vec3, face: &FacePolygon, radius: f32) -> FaceContact {
    let mask = check_point_to_face(point, face);
    if mask == 0 {
        return FaceContact::Face;
    }

    let (v0, v1) = face.edge(mask.trailing_zeros() as usize);
    let edge = v1 - v0;
    let len_sq = edge.norm_squared();
    let t = if len_sq > 0.0 {
        (point - v0).dot(&edge) / len_sq
    } else {
        0.0
    };

    let (closest, contact) = if t <= 0.0 {
        (v0, FaceContact::Corner)
    } else if t >= 1.0 {
        (v1, FaceContact::Corner)
    } else {
        (v0 + edge * t, FaceContact::Edge)
    };

    if (point - closest).norm_squared() < radius * radius {
        contact
    } else {
        FaceContact::None
    }
}

/// Sphere center where a sweep from `p0` to `p1` first touches `face`, if it does.
pub fn check_line_to_face(p0: &Vec3, p1: &Vec3, face: &FacePolygon, radius: f32) -> Option<Vec3> {
    let hit = find_plane_line_intersection(&face.plane_point, &face.normal, p0, p1, radius)?;
    let on_plane = hit - face.normal * radius;
    check_sphere_to_face(&on_plane, face, radius)
        .is_hit()
        .then_some(hit)
}

/// Closest approach of two lines `p1 + t1·v1` and `p2 + t2·v2`.
///
/// Directions must be unit length. Returns `(t1, t2)`, or `None` for parallel lines.
pub fn check_line_to_line(p1: &Vec3, v1: &Vec3, p2: &Vec3, v2: &Vec3) -> Option<(f32, f32)> {
    let cross = v1.cross(v2);
    let mag_sq = cross.norm_squared();
    if mag_sq == 0.0 {
        return None;
    }
    let d = p2 - p1;
    let t1 = d.cross(v2).dot(&cross) / mag_sq;
    let t2 = d.cross(v1).dot(&cross) / mag_sq;
    Some((t1, t2))
}

/// Edge test for a sweep whose endpoints are both behind `face`.
///
/// Such a sweep can still clip the edge of the face it starts behind. It hits
/// when the sweep passes within `radius * edge_tolerance` of the first edge `p0`
/// is outside of. If `p0` projects inside the face, the plain test applies.
pub fn special_check_line_to_face(
    p0: &Vec3,
    p1: &Vec3,
    face: &FacePolygon,
    radius: f32,
    edge_tolerance: f32,
) -> Option<Vec3> {
    let mask = check_point_to_face(p0, face);
    if mask == 0 {
        return check_line_to_face(p0, p1, face, radius);
    }

    let (v0, v1) = face.edge(mask.trailing_zeros() as usize);
    let (edge_dir, edge_len) = unit_and_len(&(v1 - v0))?;
    let (move_dir, move_len) = unit_and_len(&(p1 - p0))?;

    let (edge_t, move_t) = check_line_to_line(&v0, &edge_dir, p0, &move_dir)?;
    if move_t < 0.0 || move_t > move_len + radius {
        return None;
    }

    let on_edge = v0 + edge_dir * edge_t.clamp(0.0, edge_len);
    let on_move = p0 + move_dir * move_t;
    if (on_move - on_edge).norm() < radius * edge_tolerance {
        Some(p0 + move_dir * (move_t - radius))
    } else {
        None
    }
}

#[inline]
fn unit_and_len(v: &Vec3) -> Option<(Vec3, f32)> {
    let len = v.norm();
    (len > 0.0).then(|| (v / len, len))
}

/// Distance along the sweep `p0 → p1` at which a sphere of `radius` first
/// touches a sphere of `target_radius` at `center`.
///
/// An overlap at `p0` counts as a hit at distance 0 only while moving toward
/// the target, so overlapping spheres can always separate.
pub fn check_vector_to_sphere(
    p0: &Vec3,
    p1: &Vec3,
    radius: f32,
    center: &Vec3,
    target_radius: f32,
) -> Option<f32> {
    let combined = radius + target_radius;
    let to_center = center - p0;

    let Some((dir, len)) = unit_and_len(&(p1 - p0)) else {
        return (to_center.norm() < combined).then_some(0.0);
    };

    let along = dir.dot(&to_center);
    if along < 0.0 || along > len + combined {
        return None;
    }

    let closest_sq = (to_center - dir * along).norm_squared();
    let combined_sq = combined * combined;
    if closest_sq >= combined_sq {
        return None;
    }

    let dist = along - (combined_sq - closest_sq).sqrt();
    if dist > len {
        None
    } else {
        Some(dist.max(0.0))
    }
}
