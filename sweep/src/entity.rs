//! Dynamic entities and their per-cell membership lists.
//!
//! # Ids
//! An [`EntityId`] packs a slot index and a generation into one `u64`:
//!
//! - bits 0..=31  : slot index
//! - bits 32..=63 : generation
//!
//! Despawning bumps the slot's generation, so a stale id never resolves to the
//! entity that later reuses the slot (a projectile's parent reference stays safe
//! after the parent dies).
//!
//! # Membership
//! Every live entity is linked into exactly one cell through intrusive
//! `prev`/`next` links. The sweep walks these lists instead of scanning all
//! entities. Every position commit must relink immediately so later queries in
//! the same frame see consistent membership.

use crate::{
    cell::CellId,
    collision::types::Vec3,
    constants::MAX_ENTITIES,
};

/// Generational handle to an entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((index as u64) | ((generation as u64) << u32::BITS))
    }

    #[inline]
    pub fn index(self) -> u32 {
        (self.0 & u32::MAX as u64) as u32
    }

    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> u32::BITS) as u32
    }

    /// Packed form, suitable for replays and save data.
    #[inline]
    pub fn to_bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }
}

/// Coarse entity type used by the collision matrix.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EntityClass {
    Player = 0,
    Robot = 1,
    Projectile = 2,
    Powerup = 3,
    Debris = 4,
}

impl EntityClass {
    pub const COUNT: usize = 5;

    pub const ALL: [EntityClass; Self::COUNT] = [
        EntityClass::Player,
        EntityClass::Robot,
        EntityClass::Projectile,
        EntityClass::Powerup,
        EntityClass::Debris,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Projectile-specific fields the sweep needs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct ProjectileInfo {
    /// Entity that fired the projectile.
    pub parent: Option<EntityId>,
    /// Keeps flying after striking an entity.
    pub persistent: bool,
    /// Mines and similar: may hit their parent and siblings once the grace window passes.
    pub self_detonating: bool,
    /// Reflects off walls instead of sliding.
    pub bounces: bool,
    /// Last entity a persistent projectile passed through. Ignored by its
    /// sweeps until it strikes something else.
    pub last_hit: Option<EntityId>,
}

/// The engine's view of an entity's type. Gameplay-only data (AI state, weapon
/// stats) stays outside.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Robot {
        /// Attacks by touching its target; such robots may collide with each other.
        contact_attack: bool,
    },
    Projectile(ProjectileInfo),
    Powerup,
    Debris,
}

impl EntityKind {
    #[inline]
    pub fn class(&self) -> EntityClass {
        match self {
            EntityKind::Player => EntityClass::Player,
            EntityKind::Robot { .. } => EntityClass::Robot,
            EntityKind::Projectile(_) => EntityClass::Projectile,
            EntityKind::Powerup => EntityClass::Powerup,
            EntityKind::Debris => EntityClass::Debris,
        }
    }

    #[inline]
    pub fn projectile(&self) -> Option<&ProjectileInfo> {
        match self {
            EntityKind::Projectile(info) => Some(info),
            _ => None,
        }
    }

    #[inline]
    pub fn is_contact_robot(&self) -> bool {
        matches!(
            self,
            EntityKind::Robot {
                contact_attack: true
            }
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub kind: EntityKind,
    pub position: Vec3,
    /// Position before the most recent commit; used to recover stuck entities.
    pub last_position: Vec3,
    pub radius: f32,
    /// World time at spawn (seconds).
    pub spawned_at: f32,
    /// Skipped by sweeps; removed by [`EntityTable::remove_marked`].
    pub marked_for_removal: bool,
    cell: CellId,
    prev: Option<EntityId>,
    next: Option<EntityId>,
}

impl Entity {
    /// Cell whose membership list holds this entity.
    #[inline]
    pub fn cell(&self) -> CellId {
        self.cell
    }
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// Arena of entities plus the per-cell membership list heads.
#[derive(Clone, Debug, Default)]
pub struct EntityTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
    heads: Vec<Option<EntityId>>,
    live: usize,
}

impl EntityTable {
    pub fn with_cells(cell_count: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            heads: vec![None; cell_count],
            live: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Create an entity linked into `cell`.
    ///
    /// Returns `None` if `cell` does not exist or the table is full.
    pub fn spawn(
        &mut self,
        kind: EntityKind,
        position: Vec3,
        radius: f32,
        cell: CellId,
        now: f32,
    ) -> Option<EntityId> {
        if cell as usize >= self.heads.len() {
            return None;
        }

        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                if self.slots.len() >= MAX_ENTITIES {
                    return None;
                }
                self.slots.push(Slot {
                    generation: 0,
                    entity: None,
                });
                (self.slots.len() - 1) as u32
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.entity = Some(Entity {
            kind,
            position,
            last_position: position,
            radius,
            spawned_at: now,
            marked_for_removal: false,
            cell,
            prev: None,
            next: None,
        });
        let id = EntityId::new(index, slot.generation);

        self.link(id, cell);
        self.live += 1;
        Some(id)
    }

    /// Remove an entity, returning its final state. Stale ids return `None`.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.get(id)?;
        self.unlink(id);

        let slot = &mut self.slots[id.index() as usize];
        let entity = slot.entity.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.live -= 1;
        entity
    }

    #[inline]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.entity.as_ref()
    }

    #[inline]
    fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.entity.as_mut()
    }

    /// Move an entity to `position` inside `cell`, relinking membership.
    ///
    /// The previous position is kept as `last_position`.
    pub fn commit(&mut self, id: EntityId, position: Vec3, cell: CellId) -> bool {
        if cell as usize >= self.heads.len() {
            return false;
        }
        let Some(entity) = self.get_mut(id) else {
            return false;
        };
        entity.last_position = entity.position;
        entity.position = position;
        self.relink(id, cell)
    }

    /// Move an entity's membership to `cell` without touching its position.
    pub fn relink(&mut self, id: EntityId, cell: CellId) -> bool {
        if cell as usize >= self.heads.len() {
            return false;
        }
        let Some(entity) = self.get(id) else {
            return false;
        };
        if entity.cell == cell {
            return true;
        }
        self.unlink(id);
        self.link(id, cell);
        true
    }

    pub fn mark_for_removal(&mut self, id: EntityId) -> bool {
        match self.get_mut(id) {
            Some(entity) => {
                entity.marked_for_removal = true;
                true
            }
            None => false,
        }
    }

    /// Remember `target` as the last entity projectile `id` struck.
    ///
    /// Returns false for a stale id or a non-projectile.
    pub fn record_projectile_hit(&mut self, id: EntityId, target: EntityId) -> bool {
        match self.get_mut(id).map(|e| &mut e.kind) {
            Some(EntityKind::Projectile(info)) => {
                info.last_hit = Some(target);
                true
            }
            _ => false,
        }
    }

    /// Despawn every entity marked for removal. Returns how many were removed.
    pub fn remove_marked(&mut self) -> usize {
        let mut removed = 0;
        for index in 0..self.slots.len() {
            let slot = &self.slots[index];
            let marked = slot
                .entity
                .as_ref()
                .is_some_and(|entity| entity.marked_for_removal);
            if marked {
                let id = EntityId::new(index as u32, slot.generation);
                self.despawn(id);
                removed += 1;
            }
        }
        removed
    }

    /// Entities linked into `cell`, most recently linked first.
    pub fn in_cell(&self, cell: CellId) -> CellEntities<'_> {
        CellEntities {
            table: self,
            cursor: self.heads.get(cell as usize).copied().flatten(),
        }
    }

    fn link(&mut self, id: EntityId, cell: CellId) {
        let head = self.heads[cell as usize];
        if let Some(head) = head
            && let Some(first) = self.get_mut(head)
        {
            first.prev = Some(id);
        }
        if let Some(entity) = self.get_mut(id) {
            entity.cell = cell;
            entity.prev = None;
            entity.next = head;
        }
        self.heads[cell as usize] = Some(id);
    }

    fn unlink(&mut self, id: EntityId) {
        let Some(entity) = self.get(id) else {
            return;
        };
        let (cell, prev, next) = (entity.cell, entity.prev, entity.next);

        match prev {
            Some(prev) => {
                if let Some(p) = self.get_mut(prev) {
                    p.next = next;
                }
            }
            None => self.heads[cell as usize] = next,
        }
        if let Some(next) = next
            && let Some(n) = self.get_mut(next)
        {
            n.prev = prev;
        }
        if let Some(entity) = self.get_mut(id) {
            entity.prev = None;
            entity.next = None;
        }
    }
}

/// Iterator over one cell's membership list.
pub struct CellEntities<'a> {
    table: &'a EntityTable,
    cursor: Option<EntityId>,
}

impl<'a> Iterator for CellEntities<'a> {
    type Item = (EntityId, &'a Entity);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let entity = self.table.get(id)?;
        self.cursor = entity.next;
        Some((id, entity))
    }
}
