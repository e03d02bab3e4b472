//! Which entity pairs may collide during a sweep.

use crate::entity::{Entity, EntityClass, EntityId};

/// Symmetric class-by-class collision table plus a per-class wall column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionMatrix {
    pairs: [[bool; EntityClass::COUNT]; EntityClass::COUNT],
    walls: [bool; EntityClass::COUNT],
}

impl Default for CollisionMatrix {
    fn default() -> Self {
        use EntityClass::*;

        let mut m = Self::empty();
        for class in EntityClass::ALL {
            m.set_walls(class, true);
        }
        m.set(Player, Player, true);
        m.set(Player, Robot, true);
        m.set(Player, Projectile, true);
        m.set(Player, Powerup, true);
        m.set(Robot, Robot, true);
        m.set(Robot, Projectile, true);
        m.set(Projectile, Projectile, true);
        m.set(Projectile, Debris, true);
        m
    }
}

impl CollisionMatrix {
    /// Nothing collides with anything.
    pub const fn empty() -> Self {
        Self {
            pairs: [[false; EntityClass::COUNT]; EntityClass::COUNT],
            walls: [false; EntityClass::COUNT],
        }
    }

    pub fn set(&mut self, a: EntityClass, b: EntityClass, enabled: bool) {
        self.pairs[a.index()][b.index()] = enabled;
        self.pairs[b.index()][a.index()] = enabled;
    }

    #[inline]
    pub fn collides(&self, a: EntityClass, b: EntityClass) -> bool {
        self.pairs[a.index()][b.index()]
    }

    pub fn set_walls(&mut self, class: EntityClass, enabled: bool) {
        self.walls[class.index()] = enabled;
    }

    #[inline]
    pub fn collides_with_walls(&self, class: EntityClass) -> bool {
        self.walls[class.index()]
    }
}

/// Timing inputs for [`are_related`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraceClock {
    pub now: f32,
    pub grace_secs: f32,
}

impl GraceClock {
    #[inline]
    fn expired(&self, e: &Entity) -> bool {
        self.now - e.spawned_at > self.grace_secs
    }
}

/// True if `a` and `b` must not collide because one fired the other, or both
/// were fired by the same parent.
///
/// Self-detonating projectiles (mines) lose the relation once the grace
/// window has passed, so a player can run into their own mine.
pub fn are_related(
    a_id: EntityId,
    a: &Entity,
    b_id: EntityId,
    b: &Entity,
    clock: &GraceClock,
) -> bool {
    if a_id == b_id {
        return true;
    }

    let pa = a.kind.projectile();
    let pb = b.kind.projectile();

    if let Some(info) = pa
        && info.parent == Some(b_id)
    {
        return !(info.self_detonating && clock.expired(a));
    }
    if let Some(info) = pb
        && info.parent == Some(a_id)
    {
        return !(info.self_detonating && clock.expired(b));
    }

    if let (Some(ia), Some(ib)) = (pa, pb)
        && ia.parent.is_some()
        && ia.parent == ib.parent
    {
        if ia.self_detonating || ib.self_detonating {
            return !(clock.expired(a) || clock.expired(b));
        }
        return true;
    }

    false
}

/// Whether `mover` may collide with `target`.
///
/// Applies the matrix, the relation rules and the robot rule: two robots only
/// collide when both attack by contact. Self, ignore-list and removal checks
/// belong to the caller.
pub fn should_collide(
    matrix: &CollisionMatrix,
    mover_id: EntityId,
    mover: &Entity,
    target_id: EntityId,
    target: &Entity,
    clock: &GraceClock,
) -> bool {
    let (mc, tc) = (mover.kind.class(), target.kind.class());
    if !matrix.collides(mc, tc) {
        return false;
    }
    if mc == EntityClass::Robot
        && tc == EntityClass::Robot
        && !(mover.kind.is_contact_robot() && target.kind.is_contact_robot())
    {
        return false;
    }
    !are_related(mover_id, mover, target_id, target, clock)
}
