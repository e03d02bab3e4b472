use crate::{
    cell::CellId,
    collision::{
        CollisionHandler, MoveRequest, MoveResult, SweepEngine,
        kinematic::move_entity,
        masks::point_in_cell,
        settings::{SNAP_FULL_DISTANCE, SNAP_STEP},
        types::Vec3,
    },
    entity::EntityId,
    world::World,
};

/// How a stuck entity was recovered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relocation {
    /// Its position lies in another cell; membership was moved there.
    Found(CellId),
    /// Its position is outside every reachable cell; it went back to its last committed position.
    Restored(CellId),
    /// Nothing else worked; it was moved toward its cell's center.
    Nudged(CellId),
}

impl Relocation {
    /// Cell the entity is linked into afterwards.
    #[inline]
    pub fn cell(self) -> CellId {
        match self {
            Relocation::Found(c) | Relocation::Restored(c) | Relocation::Nudged(c) => c,
        }
    }
}

/// Recover an entity whose position is not inside its cell.
///
/// Ladder:
/// 1) search for the cell containing its position,
/// 2) restore its last committed position,
/// 3) move it toward its cell's center by at most [`SNAP_STEP`] (straight to the
///    center when closer than [`SNAP_FULL_DISTANCE`]).
///
/// Returns `None` for a stale id.
pub fn relocate(engine: &mut SweepEngine, world: &mut World, id: EntityId) -> Option<Relocation> {
    let entity = world.entities.get(id)?;
    let (pos, last, cell) = (entity.position, entity.last_position, entity.cell());

    if let Some(found) = engine.find_point_cell(world, &pos, cell) {
        world.entities.relink(id, found);
        return Some(Relocation::Found(found));
    }

    if let Some(found) = engine.find_point_cell(world, &last, cell) {
        log::debug!("entity {id:?} restored to its last position in cell {found}");
        world.entities.commit(id, last, found);
        return Some(Relocation::Restored(found));
    }

    let nudged = snap_target(pos, world.cell_center(cell)?);
    log::warn!("entity {id:?} outside every cell; nudging toward the center of cell {cell}");
    world.entities.commit(id, nudged, cell);
    Some(Relocation::Nudged(cell))
}

/// Move one entity for one step.
///
/// An entity found outside its cell is relocated before it moves. Returns
/// `None` for a stale id.
pub fn step_entity(
    engine: &mut SweepEngine,
    world: &mut World,
    id: EntityId,
    velocity: Vec3,
    dt: f32,
    handler: &mut impl CollisionHandler,
) -> Option<MoveResult> {
    let entity = world.entities.get(id)?;
    if !point_in_cell(world, entity.cell(), &entity.position) {
        relocate(engine, world, id)?;
    }
    move_entity(engine, world, MoveRequest::with_defaults(id, velocity, dt), handler)
}

/// Where a stuck entity at `pos` moves when nudged toward `center`.
#[inline]
pub fn snap_target(pos: Vec3, center: Vec3) -> Vec3 {
    let to_center = center - pos;
    let dist = to_center.norm();
    if dist > SNAP_FULL_DISTANCE {
        pos + to_center * (SNAP_STEP / dist)
    } else {
        center
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cell::SideId,
        collision::{NoopHandler, types::MoveOutcome},
        entity::EntityKind,
        world::WorldBuilder,
    };
    use approx::assert_relative_eq;

    fn two_cells() -> World {
        let mut b = WorldBuilder::new();
        let a = b.add_box(Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0));
        let c = b.add_box(Vec3::new(10.0, 0.0, 0.0), Vec3::new(20.0, 10.0, 10.0));
        b.connect(a, SideId::Right, c, SideId::Left);
        b.build().unwrap()
    }

    #[test]
    fn relocate_finds_the_cell_that_holds_the_position() {
        let mut world = two_cells();
        let mut engine = SweepEngine::default();
        let id = world
            .entities
            .spawn(EntityKind::Player, Vec3::new(15.0, 5.0, 5.0), 1.0, 0, 0.0)
            .unwrap();

        assert_eq!(
            relocate(&mut engine, &mut world, id),
            Some(Relocation::Found(1))
        );
        assert_eq!(world.entities.get(id).unwrap().cell(), 1);
    }

    #[test]
    fn relocate_restores_last_position_then_nudges() {
        let mut world = two_cells();
        let mut engine = SweepEngine::default();
        let id = world
            .entities
            .spawn(EntityKind::Player, Vec3::new(5.0, 5.0, 5.0), 1.0, 0, 0.0)
            .unwrap();

        // Outside the level, with a valid last position.
        world.entities.commit(id, Vec3::new(-5.0, 5.0, 5.0), 0);
        assert_eq!(
            relocate(&mut engine, &mut world, id),
            Some(Relocation::Restored(0))
        );
        assert_relative_eq!(world.entities.get(id).unwrap().position, Vec3::new(5.0, 5.0, 5.0));

        // Both the position and the last position are outside.
        world.entities.commit(id, Vec3::new(-5.0, 5.0, 5.0), 0);
        world.entities.commit(id, Vec3::new(-6.0, 5.0, 5.0), 0);
        assert_eq!(
            relocate(&mut engine, &mut world, id),
            Some(Relocation::Nudged(0))
        );
        let pos = world.entities.get(id).unwrap().position;
        assert_relative_eq!(pos, Vec3::new(-6.0 + SNAP_STEP, 5.0, 5.0), epsilon = 1.0e-5);
    }

    #[test]
    fn snap_goes_straight_to_a_nearby_center() {
        let center = Vec3::new(5.0, 5.0, 5.0);
        assert_eq!(snap_target(Vec3::new(5.5, 5.0, 5.0), center), center);
        assert_relative_eq!(
            snap_target(Vec3::new(9.0, 5.0, 5.0), center),
            Vec3::new(9.0 - SNAP_STEP, 5.0, 5.0),
            epsilon = 1.0e-6
        );
    }

    #[test]
    fn step_entity_relocates_before_moving() {
        let mut world = two_cells();
        let mut engine = SweepEngine::default();
        let id = world
            .entities
            .spawn(EntityKind::Player, Vec3::new(15.0, 5.0, 5.0), 1.0, 0, 0.0)
            .unwrap();

        let result = step_entity(
            &mut engine,
            &mut world,
            id,
            Vec3::new(0.0, 0.0, 1.0),
            1.0,
            &mut NoopHandler,
        )
        .unwrap();
        assert_eq!(result.outcome, MoveOutcome::Completed);
        assert_eq!(result.cell, 1);
        assert_relative_eq!(result.end_pos, Vec3::new(15.0, 5.0, 6.0), epsilon = 1.0e-5);
    }

    #[test]
    fn stale_id_is_rejected() {
        let mut world = two_cells();
        let mut engine = SweepEngine::default();
        let id = world
            .entities
            .spawn(EntityKind::Debris, Vec3::new(5.0, 5.0, 5.0), 1.0, 0, 0.0)
            .unwrap();
        world.entities.despawn(id);

        assert!(relocate(&mut engine, &mut world, id).is_none());
        assert!(
            step_entity(&mut engine, &mut world, id, Vec3::x(), 1.0, &mut NoopHandler).is_none()
        );
    }
}
