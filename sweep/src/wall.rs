//! Wall records attached to cell sides.
//!
//! Walls are created with the level and mutated in place by door and blast
//! logic between simulation steps, never during a query. Their type, flags and
//! door state decide a side's passability (see `collision::passability`).

use crate::{bitmask_flags::BitmaskFlags, define_bitmask_flags};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum WallType {
    /// Solid unless its side is textured transparent (then see-through only).
    #[default]
    Normal,
    /// Destroyed by damage; passable once blasted.
    Blastable,
    Door,
    /// Looks solid, flies through.
    Illusion,
    /// Fully open; equivalent to no wall.
    Open,
    /// Permanently closed barrier (e.g. a force field that never opens).
    Closed,
    /// Rendered and seen through, never flown through.
    Cloaked,
}

define_bitmask_flags!(WallFlag, u8, {
    Blasted,
    DoorOpened,
    Locked,
    AutoClose,
    IllusionOff,
    /// Door opens only from a trigger, not from contact.
    DoorSwitch,
});

pub type WallFlags = BitmaskFlags<u8>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DoorState {
    #[default]
    Closed,
    Opening,
    /// Fully open, waiting to close again.
    Waiting,
    Closing,
}

/// Key needed to open a door.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum KeyRequirement {
    #[default]
    None,
    Blue,
    Red,
    Gold,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wall {
    pub kind: WallType,
    pub flags: WallFlags,
    pub state: DoorState,
    /// Remaining hit points of a blastable wall.
    pub hit_points: f32,
    pub key: KeyRequirement,
}

impl Default for Wall {
    fn default() -> Self {
        Self {
            kind: WallType::Normal,
            flags: WallFlags::empty(),
            state: DoorState::Closed,
            hit_points: 0.0,
            key: KeyRequirement::None,
        }
    }
}

impl Wall {
    #[inline]
    pub fn new(kind: WallType) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// A closed door.
    #[inline]
    pub fn door(key: KeyRequirement) -> Self {
        Self {
            kind: WallType::Door,
            key,
            ..Self::default()
        }
    }

    #[inline]
    pub fn blastable(hit_points: f32) -> Self {
        Self {
            kind: WallType::Blastable,
            hit_points,
            ..Self::default()
        }
    }

    #[inline]
    pub fn has(&self, flag: WallFlag) -> bool {
        self.flags.has(flag)
    }
}
