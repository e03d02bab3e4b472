//! Side passability.
//!
//! A side's wall type, flags and door state reduce to four bits: can a sphere
//! fly through, should the side be drawn, can sight pass through, and does the
//! side open onto the outside of the level.

use crate::{
    cell::{CellId, Neighbor, SideId},
    wall::{DoorState, WallFlag, WallType},
    world::World,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Passability {
    pub can_fly: bool,
    pub should_render: bool,
    pub can_see_through: bool,
    pub external: bool,
}

impl Passability {
    /// Nothing there: fly and see straight through, nothing to draw.
    pub const OPEN: Self = Self {
        can_fly: true,
        should_render: false,
        can_see_through: true,
        external: false,
    };

    /// Drawn and see-through, but blocks flight (e.g. a door mid-opening).
    pub const TRANSPARENT_WALL: Self = Self {
        can_fly: false,
        should_render: true,
        can_see_through: true,
        external: false,
    };

    /// Drawn and passable in every way (e.g. an opened door).
    pub const TRANSITIONAL: Self = Self {
        can_fly: true,
        should_render: true,
        can_see_through: true,
        external: false,
    };

    pub const SOLID: Self = Self {
        can_fly: false,
        should_render: true,
        can_see_through: false,
        external: false,
    };

    pub const EXTERNAL: Self = Self {
        can_fly: false,
        should_render: false,
        can_see_through: false,
        external: true,
    };

    /// Solid, letting sight through when the side's texture is transparent.
    #[inline]
    fn solid(transparent: bool) -> Self {
        Self {
            can_see_through: transparent,
            ..Self::SOLID
        }
    }
}

/// Resolve what can pass through `side` of `cell`. A missing cell is solid.
pub fn resolve_passability(world: &World, cell: CellId, side: SideId) -> Passability {
    let Some(c) = world.cell(cell) else {
        return Passability::SOLID;
    };
    let s = c.side(side);

    match s.neighbor {
        Neighbor::Solid => return Passability::SOLID,
        Neighbor::External => return Passability::EXTERNAL,
        Neighbor::Cell(_) => {}
    }

    let Some(wall) = s.wall.and_then(|id| world.wall(id)) else {
        return Passability::OPEN;
    };

    match wall.kind {
        WallType::Open => Passability::OPEN,
        WallType::Illusion => {
            if wall.has(WallFlag::IllusionOff) {
                Passability::OPEN
            } else {
                Passability {
                    can_fly: true,
                    ..Passability::solid(s.transparent)
                }
            }
        }
        WallType::Blastable => {
            if wall.has(WallFlag::Blasted) {
                Passability::TRANSITIONAL
            } else {
                Passability::solid(s.transparent)
            }
        }
        _ if wall.has(WallFlag::DoorOpened) => Passability::TRANSITIONAL,
        WallType::Cloaked => Passability::TRANSPARENT_WALL,
        WallType::Door if wall.state == DoorState::Opening => Passability::TRANSPARENT_WALL,
        _ => Passability::solid(s.transparent),
    }
}
