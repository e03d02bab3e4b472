use crate::{
    cell::{CellId, SideId},
    collision::{
        broad,
        masks::{face_bit, get_seg_masks, point_in_cell},
        narrow_phase::check_sphere_to_face,
        passability::resolve_passability,
        settings::SweepSettings,
        sweep::{CellPath, SweepParams, SweepScratch, VisitMarks, trace, winning_path},
        types::{HitKind, QueryFlag, SweepNote, SweepQuery, SweepResult, Vec3},
    },
    constants::MAX_IGNORE_ENTITIES,
    entity::EntityId,
    world::World,
};

/// Entry point for swept-sphere queries.
///
/// Owns all scratch memory, so steady-state queries do not allocate. Visited
/// marks grow only when a query runs against a world with more cells than any
/// before it.
#[derive(Clone, Debug)]
pub struct SweepEngine {
    settings: SweepSettings,
    scratch: SweepScratch,
    /// Separate marks so point location never disturbs a traversal's bookkeeping.
    locate_marks: VisitMarks,
    ignore: [EntityId; MAX_IGNORE_ENTITIES],
    ignore_len: usize,
    path: CellPath,
}

impl Default for SweepEngine {
    fn default() -> Self {
        Self::new(SweepSettings::default())
    }
}

impl SweepEngine {
    pub fn new(settings: SweepSettings) -> Self {
        Self {
            settings: settings.clamped(),
            scratch: SweepScratch::default(),
            locate_marks: VisitMarks::default(),
            ignore: [EntityId::from_bits(0); MAX_IGNORE_ENTITIES],
            ignore_len: 0,
            path: CellPath::default(),
        }
    }

    #[inline]
    pub fn settings(&self) -> &SweepSettings {
        &self.settings
    }

    /// Entities the next [`query`](Self::query) must ignore. Cleared after that query.
    ///
    /// Entries beyond the fixed capacity are dropped.
    pub fn set_ignore_list(&mut self, ids: &[EntityId]) {
        if ids.len() > MAX_IGNORE_ENTITIES {
            log::warn!(
                "ignore list of {} entities truncated to {MAX_IGNORE_ENTITIES}",
                ids.len()
            );
        }
        let n = ids.len().min(MAX_IGNORE_ENTITIES);
        self.ignore[..n].copy_from_slice(&ids[..n]);
        self.ignore_len = n;
    }

    /// Cells crossed by the winning branch of the last query run with
    /// [`QueryFlag::CollectPath`], starting with its start cell.
    #[inline]
    pub fn last_path(&self) -> &[CellId] {
        self.path.as_slice()
    }

    /// Sweep a sphere from `q.p0` to `q.p1` and report the first thing it hits.
    pub fn query(&mut self, world: &World, q: &SweepQuery) -> SweepResult {
        let ignore_len = std::mem::take(&mut self.ignore_len);
        self.path.clear();

        if world.cell(q.start_cell).is_none() {
            return SweepResult::bad_start(q.p0, None);
        }
        if !point_in_cell(world, q.start_cell, &q.p0) {
            return SweepResult::bad_start(q.p0, Some(q.start_cell));
        }

        let mover = q
            .mover
            .and_then(|id| world.entities.get(id).map(|e| (id, e)));
        let ignore = &self.ignore[..ignore_len];
        let mut params = SweepParams {
            p0: q.p0,
            p1: q.p1,
            start_cell: q.start_cell,
            radius: q.radius,
            mover,
            flags: q.flags,
            ignore,
        };

        let traced = trace(world, &self.settings, &mut self.scratch, &params);
        if q.flags.has(QueryFlag::CollectPath) {
            self.path.copy_from(&winning_path(&self.scratch, &traced));
        }

        let hit = traced.hit;
        let mut result = SweepResult {
            kind: hit.kind,
            point: if hit.kind == HitKind::None { q.p1 } else { hit.point },
            cell: None,
            face: hit.face,
            normal: hit.normal,
            entity: hit.entity,
            notes: traced.notes,
        };

        let max_visited = self.settings.max_visited;
        let claimed = if hit.kind == HitKind::None {
            traced.end_cell
        } else {
            hit.cell
        };
        result.cell = resolve_cell(
            world,
            &mut self.locate_marks,
            max_visited,
            claimed,
            &result.point,
            [Some(q.start_cell), result.face.map(|f| f.cell)],
        );

        if result.cell.is_none() {
            log::debug!(
                "hit point {:?} outside every cell; retrying with zero radius",
                result.point
            );
            result.notes.add(SweepNote::ZeroRadiusRetry);

            params.radius = 0.0;
            params.flags.remove(QueryFlag::CollectPath);
            let retry = trace(world, &self.settings, &mut self.scratch, &params);
            let hit = retry.hit;
            let (claimed, point) = if hit.kind == HitKind::None {
                (retry.end_cell, q.p1)
            } else {
                (hit.cell, hit.point)
            };
            let resolved = resolve_cell(
                world,
                &mut self.locate_marks,
                max_visited,
                claimed,
                &point,
                [Some(q.start_cell), hit.face.map(|f| f.cell)],
            );
            if let Some(cell) = resolved {
                result.kind = hit.kind;
                result.point = point;
                result.cell = Some(cell);
                result.face = hit.face;
                result.normal = hit.normal;
                result.entity = hit.entity;
            }
            result.notes.merge(retry.notes);
        }

        if result.cell.is_none() {
            log::warn!(
                "no cell contains {:?} (sweep from cell {}); using cell {}",
                result.point,
                q.start_cell,
                traced.deepest
            );
            result.notes.add(SweepNote::UnresolvedCell);
            result.cell = Some(traced.deepest);
        }

        result
    }

    /// Cell containing `point`, searching outward from `seed`.
    pub fn find_point_cell(&mut self, world: &World, point: &Vec3, seed: CellId) -> Option<CellId> {
        self.locate(world, point, seed)
    }

    fn locate(&mut self, world: &World, point: &Vec3, seed: CellId) -> Option<CellId> {
        broad::find_point_cell(
            world,
            &mut self.locate_marks,
            point,
            seed,
            self.settings.max_visited,
        )
    }

    /// True if a sphere at `point` in `cell` overlaps a face it cannot fly through.
    ///
    /// Faces the sphere pokes through into flyable neighbors are followed, so a
    /// sphere straddling a portal is checked against the walls of both cells.
    pub fn sphere_overlaps_wall(
        &mut self,
        world: &World,
        point: &Vec3,
        cell: CellId,
        radius: f32,
    ) -> bool {
        if world.cell(cell).is_none() {
            return false;
        }
        self.locate_marks.reset(world.cell_count());
        self.overlaps_from(world, point, cell, radius)
    }

    fn overlaps_from(&mut self, world: &World, point: &Vec3, cell: CellId, radius: f32) -> bool {
        self.locate_marks.visit(cell);
        let Some(c) = world.cell(cell) else {
            return false;
        };
        let masks = get_seg_masks(world, cell, point, radius);
        if masks.face == 0 {
            return false;
        }

        for side in SideId::ALL {
            let s = c.side(side);
            for face in 0..s.split.face_count() {
                if masks.face & face_bit(side, face) == 0 {
                    continue;
                }
                let polygon = c.face_polygon(world.vertices(), side, face);
                if !check_sphere_to_face(point, &polygon, radius).is_hit() {
                    continue;
                }

                let Some(next) = s.neighbor.cell() else {
                    return true;
                };
                if !resolve_passability(world, cell, side).can_fly {
                    return true;
                }
                if self.locate_marks.is_visited(next)
                    || self.locate_marks.count() >= self.settings.max_visited
                {
                    continue;
                }
                if self.overlaps_from(world, point, next, radius) {
                    return true;
                }
            }
        }
        false
    }
}

/// `claimed` if it contains `point`, else the first successful search from `seeds`.
fn resolve_cell(
    world: &World,
    marks: &mut VisitMarks,
    max_visited: usize,
    claimed: Option<CellId>,
    point: &Vec3,
    seeds: [Option<CellId>; 2],
) -> Option<CellId> {
    if let Some(cell) = claimed
        && point_in_cell(world, cell, point)
    {
        return Some(cell);
    }
    seeds
        .into_iter()
        .flatten()
        .find_map(|seed| broad::find_point_cell(world, marks, point, seed, max_visited))
}
