/*!
Core collision types and math aliases shared by the collision submodules.

This module contains no algorithms. It defines the data exchanged between:
- narrow_phase (face predicates)
- sweep (recursive cell traversal)
- query (the public sweep entry point)
- kinematic (slide/bounce movement loop)
*/

use nalgebra as na;

use crate::{
    bitmask_flags::BitmaskFlags,
    cell::{CellId, SideId},
    define_bitmask_flags,
    entity::EntityId,
};

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Point3 = na::Point3<f32>;

define_bitmask_flags!(QueryFlag, u8, {
    /// Test entities linked into the visited cells.
    CheckEntities,
    /// Render-and-see-through walls count as passable (line of sight).
    SeeThroughWalls,
    /// Record the cells crossed by the winning branch.
    CollectPath,
    /// Skip powerups during entity checks.
    IgnorePowerups,
});

/// Set of [`QueryFlag`]s.
pub type QueryFlags = BitmaskFlags<u8>;

define_bitmask_flags!(SweepNote, u8, {
    /// A branch hit the depth cap or visited budget and was treated as "no hit".
    RecursionLimit,
    /// The hit cell had to be resolved by a zero-radius re-sweep.
    ZeroRadiusRetry,
    /// No containing cell was found; `cell` is a best guess.
    UnresolvedCell,
});

/// Set of [`SweepNote`]s describing a degraded result.
pub type SweepNotes = BitmaskFlags<u8>;

/// What a sweep ran into first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum HitKind {
    #[default]
    None,
    Wall,
    Entity,
    /// `p0` is not inside the claimed start cell (or the cell does not exist).
    /// Re-locate the mover before retrying.
    BadStartPoint,
}

/// A specific sub-face of a specific cell side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FaceRef {
    pub cell: CellId,
    pub side: SideId,
    /// 0 for quads, 0 or 1 for triangulated sides.
    pub face: u8,
}

/// Input of a swept-sphere query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepQuery {
    pub p0: Vec3,
    pub p1: Vec3,
    /// Cell that must contain `p0`.
    pub start_cell: CellId,
    pub radius: f32,
    /// Entity performing the sweep. It never collides with itself, and its kind
    /// selects the collision-matrix row.
    pub mover: Option<EntityId>,
    pub flags: QueryFlags,
}

impl SweepQuery {
    #[inline]
    pub fn new(p0: Vec3, p1: Vec3, start_cell: CellId, radius: f32) -> Self {
        Self {
            p0,
            p1,
            start_cell,
            radius,
            mover: None,
            flags: QueryFlags::empty(),
        }
    }

    #[inline]
    pub fn with_mover(mut self, mover: EntityId) -> Self {
        self.mover = Some(mover);
        self
    }

    #[inline]
    pub fn with_flag(mut self, flag: QueryFlag) -> Self {
        self.flags.add(flag);
        self
    }
}

/// Output of a swept-sphere query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepResult {
    pub kind: HitKind,
    /// Sphere center at first contact, or `p1` when nothing was hit.
    pub point: Vec3,
    /// Cell containing `point`. `None` only when the start cell was out of range.
    pub cell: Option<CellId>,
    /// Face struck by a wall hit, with its owning cell.
    pub face: Option<FaceRef>,
    /// Inward normal of the struck sub-face (wall hits only, zero otherwise).
    pub normal: Vec3,
    /// Entity struck by an entity hit.
    pub entity: Option<EntityId>,
    pub notes: SweepNotes,
}

impl SweepResult {
    #[inline]
    pub fn bad_start(p0: Vec3, cell: Option<CellId>) -> Self {
        Self {
            kind: HitKind::BadStartPoint,
            point: p0,
            cell,
            face: None,
            normal: Vec3::zeros(),
            entity: None,
            notes: SweepNotes::empty(),
        }
    }

    /// True for wall and entity hits.
    #[inline]
    pub fn is_hit(&self) -> bool {
        matches!(self.kind, HitKind::Wall | HitKind::Entity)
    }
}

/// How a mover reacts to a wall hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Response {
    /// Remove the velocity component into the surface.
    Slide,
    /// Negate the velocity component into the surface.
    Bounce,
}

/// How a movement step ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveOutcome {
    /// All of the step's time was consumed (possibly after sliding).
    Completed,
    /// The iteration cap ran out with time left over.
    IterationsExhausted,
    /// The mover ran into an entity and stopped.
    Blocked,
    /// The mover was a projectile consumed by its impact (it is marked for
    /// removal), or it vanished mid-step.
    Terminated,
}

/// The last surface a movement step touched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveHit {
    pub kind: HitKind,
    pub point: Vec3,
    pub normal: Vec3,
    pub face: Option<FaceRef>,
    pub entity: Option<EntityId>,
}

/// Result of a movement step (after sweep-and-slide).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveResult {
    pub end_pos: Vec3,
    pub cell: CellId,
    /// Velocity after slide/bounce responses.
    pub velocity: Vec3,
    pub last_hit: Option<MoveHit>,
    pub outcome: MoveOutcome,
    /// Sweeps performed.
    pub iterations: u32,
    /// The mover was found outside its cell and re-located or nudged first.
    pub relocated: bool,
}
