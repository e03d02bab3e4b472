use crate::{
    collision::{
        passability::resolve_passability,
        query::SweepEngine,
        settings::{DEFAULT_MAX_ITERATIONS, MIN_MOVE_SQ},
        types::{
            FaceRef, HitKind, MoveHit, MoveOutcome, MoveResult, QueryFlag, Response, SweepQuery,
            SweepResult, Vec3,
        },
    },
    constants::MAX_IGNORE_ENTITIES,
    entity::EntityId,
    movement,
    world::World,
};

/// Parameters for a single movement step.
///
/// - Movement is a velocity integrated over `dt` seconds.
/// - Each iteration sweeps the entity's sphere through the cell graph, moves
///   it to the first contact and reacts to what it struck.
/// - Wall contacts slide or bounce and keep going until the time runs out or
///   `max_iterations` sweeps have been spent (corners need several).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveRequest {
    pub entity: EntityId,
    /// World-space velocity (units per second).
    pub velocity: Vec3,
    /// Step duration in seconds.
    pub dt: f32,
    pub max_iterations: u32,
    /// Wall response. Bouncing projectiles always bounce.
    pub response: Response,
}

impl MoveRequest {
    #[inline]
    pub fn with_defaults(entity: EntityId, velocity: Vec3, dt: f32) -> Self {
        Self {
            entity,
            velocity,
            dt,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            response: Response::Slide,
        }
    }
}

/// A mover touching a wall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallContact {
    pub entity: EntityId,
    /// Sphere center at contact.
    pub point: Vec3,
    pub normal: Vec3,
    pub face: Option<FaceRef>,
    /// The struck side opens onto the outside of the level.
    pub external: bool,
    /// Velocity before the slide/bounce response.
    pub velocity: Vec3,
}

/// A mover touching another entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntityContact {
    pub entity: EntityId,
    pub target: EntityId,
    /// Mover's sphere center at contact.
    pub point: Vec3,
    pub velocity: Vec3,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntityHitResponse {
    /// The target still blocks the mover (e.g. it survived a persistent projectile).
    pub still_blocking: bool,
}

/// Gameplay hooks invoked as contacts happen.
///
/// Handlers may mutate walls and entities other than the mover; the mover's own
/// position is owned by the movement loop until it returns.
pub trait CollisionHandler {
    fn on_wall_hit(&mut self, _world: &mut World, _contact: &WallContact) {}

    fn on_entity_hit(&mut self, _world: &mut World, _contact: &EntityContact) -> EntityHitResponse {
        EntityHitResponse::default()
    }
}

/// Handler that ignores every contact.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHandler;

impl CollisionHandler for NoopHandler {}

/// Sweep-and-slide (or bounce) for one entity over one step.
///
/// Algorithm:
/// - Sweep from the current position to `position + velocity * remaining_dt`.
/// - No hit: commit the end point and finish.
/// - Wall: commit the contact point, consume time in proportion to the distance
///   travelled, remove (slide) or reflect (bounce) the velocity component into
///   the wall, and iterate.
/// - Entity: commit the contact point. Persistent projectiles remember the
///   target, ignore it from then on (across steps too) and continue. Other
///   projectiles are marked for removal and any other mover stops.
/// - Bad start: run the relocation ladder and sweep again from where it left
///   the entity.
///
/// Every commit relinks cell membership immediately. Returns `None` for a stale id.
pub fn move_entity(
    engine: &mut SweepEngine,
    world: &mut World,
    req: MoveRequest,
    handler: &mut impl CollisionHandler,
) -> Option<MoveResult> {
    let id = req.entity;
    let entity = world.entities.get(id)?;
    let mut pos = entity.position;
    let mut cell = entity.cell();
    let radius = entity.radius;
    let projectile = entity.kind.projectile().copied();
    let response = match projectile {
        Some(info) if info.bounces => Response::Bounce,
        _ => req.response,
    };

    let mut velocity = req.velocity;
    let mut remaining = req.dt.max(0.0);
    let mut already_hit = [id; MAX_IGNORE_ENTITIES];
    let mut hit_count = 0usize;
    if let Some(last) = projectile.and_then(|info| info.last_hit) {
        already_hit[0] = last;
        hit_count = 1;
    }
    let mut last_hit = None;
    let mut iterations = 0;
    let mut relocated = false;
    let mut outcome = MoveOutcome::Completed;

    loop {
        let delta = velocity * remaining;
        if remaining <= 0.0 || delta.norm_squared() <= MIN_MOVE_SQ {
            break;
        }
        if iterations >= req.max_iterations {
            outcome = MoveOutcome::IterationsExhausted;
            break;
        }

        engine.set_ignore_list(&already_hit[..hit_count]);
        let query = SweepQuery::new(pos, pos + delta, cell, radius)
            .with_mover(id)
            .with_flag(QueryFlag::CheckEntities);
        let r = engine.query(world, &query);
        iterations += 1;

        if r.kind == HitKind::BadStartPoint {
            let Some(found) = movement::relocate(engine, world, id) else {
                outcome = MoveOutcome::Terminated;
                break;
            };
            cell = found.cell();
            pos = world.entities.get(id).map_or(pos, |e| e.position);
            relocated = true;
            continue;
        }

        let travelled = travel_fraction(pos, &r, &delta);
        pos = r.point;
        cell = r.cell.unwrap_or(cell);
        world.entities.commit(id, pos, cell);

        match r.kind {
            HitKind::None | HitKind::BadStartPoint => break,
            HitKind::Wall => {
                remaining *= 1.0 - travelled;
                let before = velocity;
                let vn = velocity.dot(&r.normal);
                if vn < 0.0 {
                    velocity = match response {
                        Response::Slide => velocity - r.normal * vn,
                        Response::Bounce => velocity - r.normal * (2.0 * vn),
                    };
                }
                last_hit = Some(move_hit(&r));
                let external = r
                    .face
                    .is_some_and(|f| resolve_passability(world, f.cell, f.side).external);
                handler.on_wall_hit(
                    world,
                    &WallContact {
                        entity: id,
                        point: pos,
                        normal: r.normal,
                        face: r.face,
                        external,
                        velocity: before,
                    },
                );
            }
            HitKind::Entity => {
                remaining *= 1.0 - travelled;
                last_hit = Some(move_hit(&r));
                let Some(target) = r.entity else {
                    break;
                };
                let reply = handler.on_entity_hit(
                    world,
                    &EntityContact {
                        entity: id,
                        target,
                        point: pos,
                        velocity,
                    },
                );

                match projectile {
                    Some(info) if info.persistent && !reply.still_blocking => {
                        world.entities.record_projectile_hit(id, target);
                        if hit_count < MAX_IGNORE_ENTITIES {
                            already_hit[hit_count] = target;
                            hit_count += 1;
                        }
                    }
                    Some(_) => {
                        world.entities.mark_for_removal(id);
                        outcome = MoveOutcome::Terminated;
                        break;
                    }
                    None => {
                        outcome = MoveOutcome::Blocked;
                        break;
                    }
                }
            }
        }

        if world
            .entities
            .get(id)
            .is_none_or(|e| e.marked_for_removal)
        {
            outcome = MoveOutcome::Terminated;
            break;
        }
    }

    Some(MoveResult {
        end_pos: pos,
        cell,
        velocity,
        last_hit,
        outcome,
        iterations,
        relocated,
    })
}

/// Fraction of `delta` covered on the way to the sweep's end point, in `[0, 1]`.
fn travel_fraction(from: Vec3, r: &SweepResult, delta: &Vec3) -> f32 {
    let len_sq = delta.norm_squared();
    if len_sq <= 0.0 {
        return 1.0;
    }
    ((r.point - from).dot(delta) / len_sq).clamp(0.0, 1.0)
}

#[inline]
fn move_hit(r: &SweepResult) -> MoveHit {
    MoveHit {
        kind: r.kind,
        point: r.point,
        normal: r.normal,
        face: r.face,
        entity: r.entity,
    }
}
