/*!
Recursive cell traversal for the swept-sphere query.

Starting in the cell that contains `p0`, each step:
1. tests the entities linked into the cell,
2. finds the sub-faces `p1` ends up behind,
3. for each, intersects the sweep with the face; a passable face recurses
   into the neighbor, a blocking one becomes a wall-hit candidate,
4. keeps the candidate nearest to `p0`.

Each recursion level writes into its own preallocated [`Frame`], so no state
is saved or restored across levels and a sweep allocates nothing once the
scratch has been sized for the world.
*/

use crate::{
    cell::{CellId, SideId},
    collision::{
        filter::{GraceClock, should_collide},
        masks::{face_bit, get_seg_masks},
        narrow_phase::{check_line_to_face, check_vector_to_sphere, special_check_line_to_face},
        passability::resolve_passability,
        settings::{
            CONTACT_ROBOT_RADIUS_SCALE, MAX_SWEEP_DEPTH, PLAYER_PAIR_RADIUS_SCALE, SweepSettings,
        },
        types::{FaceRef, HitKind, QueryFlag, QueryFlags, SweepNote, SweepNotes, Vec3},
    },
    constants::MAX_PATH_CELLS,
    entity::{Entity, EntityClass, EntityId, EntityKind},
    world::World,
};

/// Generation-stamped visited set over cells.
///
/// Resetting bumps the stamp instead of clearing the buffer.
#[derive(Clone, Debug, Default)]
pub struct VisitMarks {
    stamps: Vec<u32>,
    current: u32,
    count: usize,
}

impl VisitMarks {
    /// Start a new visit over a world of `cell_count` cells.
    pub fn reset(&mut self, cell_count: usize) {
        if self.stamps.len() < cell_count {
            self.stamps.resize(cell_count, 0);
        }
        self.current = self.current.wrapping_add(1);
        if self.current == 0 {
            self.stamps.fill(0);
            self.current = 1;
        }
        self.count = 0;
    }

    /// Mark `cell`. Returns false if it was already visited or does not exist.
    #[inline]
    pub fn visit(&mut self, cell: CellId) -> bool {
        match self.stamps.get_mut(cell as usize) {
            Some(stamp) if *stamp != self.current => {
                *stamp = self.current;
                self.count += 1;
                true
            }
            _ => false,
        }
    }

    #[inline]
    pub fn is_visited(&self, cell: CellId) -> bool {
        self.stamps
            .get(cell as usize)
            .is_some_and(|&stamp| stamp == self.current)
    }

    /// Cells visited since the last reset.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }
}

/// Fixed-capacity list of cells.
#[derive(Clone, Copy, Debug)]
pub struct CellPath {
    cells: [CellId; MAX_PATH_CELLS],
    len: usize,
}

impl Default for CellPath {
    fn default() -> Self {
        Self {
            cells: [0; MAX_PATH_CELLS],
            len: 0,
        }
    }
}

impl CellPath {
    #[inline]
    pub fn as_slice(&self) -> &[CellId] {
        &self.cells[..self.len]
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// `head` followed by `tail`, truncated to capacity.
    fn set_prefixed(&mut self, head: CellId, tail: &CellPath) {
        self.cells[0] = head;
        let n = tail.len.min(MAX_PATH_CELLS - 1);
        self.cells[1..=n].copy_from_slice(&tail.cells[..n]);
        self.len = n + 1;
    }

    fn set_single(&mut self, cell: CellId) {
        self.cells[0] = cell;
        self.len = 1;
    }

    pub(crate) fn copy_from(&mut self, other: &CellPath) {
        self.cells[..other.len].copy_from_slice(&other.cells[..other.len]);
        self.len = other.len;
    }
}

/// Per-depth path buffers: the winning hit branch and the winning no-hit branch.
#[derive(Clone, Copy, Debug, Default)]
struct Frame {
    hit_path: CellPath,
    none_path: CellPath,
}

/// Preallocated scratch for one sweep engine.
#[derive(Clone, Debug)]
pub struct SweepScratch {
    pub(crate) marks: VisitMarks,
    frames: Vec<Frame>,
}

impl Default for SweepScratch {
    fn default() -> Self {
        Self {
            marks: VisitMarks::default(),
            frames: vec![Frame::default(); MAX_SWEEP_DEPTH + 1],
        }
    }
}

/// Best result of one branch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Candidate {
    pub kind: HitKind,
    pub point: Vec3,
    /// Distance from `p0` to `point`.
    pub dist: f32,
    /// Cell the hit was found in.
    pub cell: Option<CellId>,
    pub face: Option<FaceRef>,
    pub normal: Vec3,
    pub entity: Option<EntityId>,
}

impl Candidate {
    fn none() -> Candidate {
        Candidate {
            kind: HitKind::None,
            point: Vec3::zeros(),
            dist: f32::INFINITY,
            cell: None,
            face: None,
            normal: Vec3::zeros(),
            entity: None,
        }
    }

    #[inline]
    fn is_hit(&self) -> bool {
        self.kind != HitKind::None
    }
}

/// Result of a whole traversal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Traced {
    pub hit: Candidate,
    /// Deepest cell found to contain `p1` (no-hit sweeps only).
    pub end_cell: Option<CellId>,
    /// Deepest cell entered; the last-resort guess for an unresolved point.
    pub deepest: CellId,
    pub notes: SweepNotes,
}

/// One sweep's inputs.
pub(crate) struct SweepParams<'a> {
    pub p0: Vec3,
    pub p1: Vec3,
    pub start_cell: CellId,
    pub radius: f32,
    pub mover: Option<(EntityId, &'a Entity)>,
    pub flags: QueryFlags,
    pub ignore: &'a [EntityId],
}

struct Traversal<'a> {
    world: &'a World,
    settings: &'a SweepSettings,
    params: &'a SweepParams<'a>,
    scratch: &'a mut SweepScratch,
    wall_radius: f32,
    clock: GraceClock,
    notes: SweepNotes,
    deepest: (usize, CellId),
}

/// Run the traversal. The winning branch's path is left in `scratch` (see [`winning_path`]).
pub(crate) fn trace(
    world: &World,
    settings: &SweepSettings,
    scratch: &mut SweepScratch,
    params: &SweepParams<'_>,
) -> Traced {
    let wall_radius = match params.mover {
        Some((_, e)) if !world.matrix.collides_with_walls(e.kind.class()) => 0.0,
        _ => params.radius,
    };

    scratch.marks.reset(world.cell_count());
    let mut t = Traversal {
        world,
        settings,
        params,
        scratch,
        wall_radius,
        clock: GraceClock {
            now: world.game_time,
            grace_secs: settings.projectile_grace_secs,
        },
        notes: SweepNotes::empty(),
        deepest: (0, params.start_cell),
    };

    let (hit, end_cell) = t.visit(0, params.start_cell, None);
    Traced {
        hit,
        end_cell,
        deepest: t.deepest.1,
        notes: t.notes,
    }
}

/// Path of the winning branch of the last [`trace`].
pub(crate) fn winning_path(scratch: &SweepScratch, traced: &Traced) -> CellPath {
    let frame = &scratch.frames[0];
    if traced.hit.is_hit() {
        frame.hit_path
    } else {
        frame.none_path
    }
}

impl Traversal<'_> {
    #[inline]
    fn collect_path(&self) -> bool {
        self.params.flags.has(QueryFlag::CollectPath)
    }

    fn visit(&mut self, depth: usize, cell: CellId, entry: Option<CellId>) -> (Candidate, Option<CellId>) {
        self.scratch.marks.visit(cell);
        if depth > self.deepest.0 {
            self.deepest = (depth, cell);
        }

        let world = self.world;
        let (p0, p1) = (self.params.p0, self.params.p1);
        let mut best = Candidate::none();
        let mut end_cell = None;

        if self.collect_path() {
            let frame = &mut self.scratch.frames[depth];
            frame.hit_path.set_single(cell);
            frame.none_path.set_single(cell);
        }

        if self.params.flags.has(QueryFlag::CheckEntities) {
            self.check_entities(cell, &mut best);
        }

        let end = get_seg_masks(world, cell, &p1, self.wall_radius);
        if end.face != 0 {
            let start = get_seg_masks(world, cell, &p0, self.wall_radius);
            let Some(c) = world.cell(cell) else {
                return (best, None);
            };

            for side in SideId::ALL {
                if end.side & (1 << side.index()) == 0 {
                    continue;
                }
                let s = c.side(side);
                let neighbor = s.neighbor.cell();
                if entry.is_some() && neighbor == entry {
                    continue;
                }

                for face in 0..s.split.face_count() {
                    let bit = face_bit(side, face);
                    if end.face & bit == 0 {
                        continue;
                    }

                    let polygon = c.face_polygon(world.vertices(), side, face);
                    let hit = if start.face & bit != 0 {
                        special_check_line_to_face(
                            &p0,
                            &p1,
                            &polygon,
                            self.wall_radius,
                            self.settings.edge_tolerance,
                        )
                    } else {
                        check_line_to_face(&p0, &p1, &polygon, self.wall_radius)
                    };
                    let Some(hit_point) = hit else {
                        continue;
                    };

                    let pass = resolve_passability(world, cell, side);
                    let see_through = self.params.flags.has(QueryFlag::SeeThroughWalls)
                        && pass.should_render
                        && pass.can_see_through;

                    if let Some(next) = neighbor
                        && (pass.can_fly || see_through)
                    {
                        if self.scratch.marks.is_visited(next) {
                            continue;
                        }
                        if depth >= self.settings.max_depth
                            || self.scratch.marks.count() >= self.settings.max_visited
                        {
                            if !self.notes.has(SweepNote::RecursionLimit) {
                                log::warn!(
                                    "sweep limit reached at cell {cell} (depth {depth}); branch into {next} skipped"
                                );
                            }
                            self.notes.add(SweepNote::RecursionLimit);
                            continue;
                        }

                        let (sub, sub_end) = self.visit(depth + 1, next, Some(cell));
                        if sub.is_hit() {
                            if sub.dist < best.dist {
                                best = sub;
                                if self.collect_path() {
                                    let (lo, hi) = self.scratch.frames.split_at_mut(depth + 1);
                                    lo[depth].hit_path.set_prefixed(cell, &hi[0].hit_path);
                                }
                            }
                        } else if end_cell.is_none() && sub_end.is_some() {
                            end_cell = sub_end;
                            if self.collect_path() {
                                let (lo, hi) = self.scratch.frames.split_at_mut(depth + 1);
                                lo[depth].none_path.set_prefixed(cell, &hi[0].none_path);
                            }
                        }
                    } else {
                        let dist = (hit_point - p0).norm();
                        if dist < best.dist {
                            best = Candidate {
                                kind: HitKind::Wall,
                                point: hit_point,
                                dist,
                                cell: Some(cell),
                                face: Some(FaceRef {
                                    cell,
                                    side,
                                    face: face as u8,
                                }),
                                normal: polygon.normal,
                                entity: None,
                            };
                            if self.collect_path() {
                                self.scratch.frames[depth].hit_path.set_single(cell);
                            }
                        }
                    }
                }
            }
        }

        if best.is_hit() {
            return (best, None);
        }
        if end_cell.is_none() && end.center == 0 {
            end_cell = Some(cell);
        }
        (best, end_cell)
    }

    /// Entities run before walls, so an entity hit's path is the frame's initial `[cell]`.
    fn check_entities(&self, cell: CellId, best: &mut Candidate) {
        let params = self.params;
        let mover_kind = params.mover.map(|(_, e)| e.kind);

        for (id, target) in self.world.entities.in_cell(cell) {
            if target.marked_for_removal || params.ignore.contains(&id) {
                continue;
            }
            if params.flags.has(QueryFlag::IgnorePowerups)
                && target.kind.class() == EntityClass::Powerup
            {
                continue;
            }
            if let Some((mover_id, mover)) = params.mover {
                if mover_id == id
                    || !should_collide(&self.world.matrix, mover_id, mover, id, target, &self.clock)
                {
                    continue;
                }
            }

            let (radius, target_radius) = fudged_radii(mover_kind, params.radius, target);
            let Some(dist) =
                check_vector_to_sphere(&params.p0, &params.p1, radius, &target.position, target_radius)
            else {
                continue;
            };

            if dist < best.dist {
                let dir = (params.p1 - params.p0)
                    .try_normalize(0.0)
                    .unwrap_or_else(Vec3::zeros);
                *best = Candidate {
                    kind: HitKind::Entity,
                    point: params.p0 + dir * dist,
                    dist,
                    cell: Some(cell),
                    face: None,
                    normal: Vec3::zeros(),
                    entity: Some(id),
                };
            }
        }
    }
}

/// Mover and target radii after the contact-robot and player-pair reductions.
fn fudged_radii(mover: Option<EntityKind>, radius: f32, target: &Entity) -> (f32, f32) {
    let mover_is_player = matches!(mover, Some(EntityKind::Player));
    let target_is_player = target.kind == EntityKind::Player;

    let mut r = radius;
    if mover.is_some_and(|k| k.is_contact_robot()) {
        r *= CONTACT_ROBOT_RADIUS_SCALE;
    }
    if mover_is_player && target_is_player {
        r *= PLAYER_PAIR_RADIUS_SCALE;
    }

    let mut t = target.radius;
    if target.kind.is_contact_robot() {
        t *= CONTACT_ROBOT_RADIUS_SCALE;
    }
    if mover_is_player && target_is_player {
        t *= PLAYER_PAIR_RADIUS_SCALE;
    }
    (r, t)
}
