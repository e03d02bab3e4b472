/*!
Sweep engine and movement-loop tolerances.

These constants centralize the parameters used by the segment sweep, the
object collision filter and the slide/bounce loop. Keeping them together
makes tuning easier and keeps replays deterministic across platforms.

Notes
- Distances are in world units, time in seconds.
- [`SweepSettings`] bundles the per-engine tunables; its `Default` uses the
  constants below. Override per engine if a game needs different values.
*/

/// Distance within which a point counts as lying on a face plane (world units).
///
/// Also the planarity threshold used to decide whether a side stays a quad.
pub const PLANE_DIST_TOLERANCE: f32 = 0.004;

/// Maximum nesting of cell-to-cell recursion in a single sweep.
pub const MAX_SWEEP_DEPTH: usize = 20;

/// Maximum number of cells one sweep may enter.
pub const MAX_VISITED_CELLS: usize = 100;

/// Fraction of the sweep radius within which an edge grazed by a sweep whose
/// endpoints are both behind the same face counts as hit.
///
/// Tighter than the radius so two near-parallel surfaces sliding past each
/// other do not register. Re-check the no-tunnelling tests before changing it.
pub const EDGE_HIT_TOLERANCE: f32 = 15.0 / 20.0;

/// How far before `p0` a radius-offset plane hit may land, in sweep lengths.
///
/// A sphere already penetrating a face and moving deeper is backed out along
/// its own path by at most this much. Deeper starts are held at `p0`.
pub const PLANE_HIT_MAX_BACKTRACK: f32 = 1.0;

/// Age after which a self-detonating projectile may collide with its parent and siblings.
pub const PROJECTILE_GRACE_SECS: f32 = 2.0;

/// Radius scale applied to robots that attack by contact, so they can reach their target.
pub const CONTACT_ROBOT_RADIUS_SCALE: f32 = 0.75;

/// Radius scale applied between two players so they can pass closely.
pub const PLAYER_PAIR_RADIUS_SCALE: f32 = 0.5;

/// Maximum number of sweep-and-response iterations per movement step.
pub const DEFAULT_MAX_ITERATIONS: u32 = 4;

/// Minimum squared movement threshold to consider a step meaningful.
pub const MIN_MOVE_SQ: f32 = 1.0e-8;

/// Step used when nudging a stuck entity toward its cell center.
pub const SNAP_STEP: f32 = 1.0 / 32.0;

/// Within this distance of the center, a stuck entity is moved there directly.
pub const SNAP_FULL_DISTANCE: f32 = 1.0;

/// Per-engine sweep tunables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepSettings {
    /// Recursion cap; clamped to [`MAX_SWEEP_DEPTH`].
    pub max_depth: usize,
    /// Visited-cell budget per sweep; clamped to [`MAX_VISITED_CELLS`].
    pub max_visited: usize,
    /// See [`EDGE_HIT_TOLERANCE`].
    pub edge_tolerance: f32,
    /// See [`PROJECTILE_GRACE_SECS`].
    pub projectile_grace_secs: f32,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            max_depth: MAX_SWEEP_DEPTH,
            max_visited: MAX_VISITED_CELLS,
            edge_tolerance: EDGE_HIT_TOLERANCE,
            projectile_grace_secs: PROJECTILE_GRACE_SECS,
        }
    }
}

impl SweepSettings {
    /// Copy with the caps clamped to the preallocated scratch sizes.
    #[inline]
    pub fn clamped(self) -> Self {
        Self {
            max_depth: self.max_depth.min(MAX_SWEEP_DEPTH),
            max_visited: self.max_visited.clamp(1, MAX_VISITED_CELLS),
            ..self
        }
    }
}
