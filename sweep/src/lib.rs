pub mod bitmask_flags;
pub mod cell;
pub mod collision;
pub mod constants;
pub mod entity;
pub mod error;
pub mod movement;
pub mod wall;
pub mod world;

pub use cell::{CellId, Neighbor, SideId, WallId};
pub use collision::{
    CollisionHandler, HitKind, MoveRequest, MoveResult, QueryFlag, SweepEngine, SweepQuery,
    SweepResult, Vec3, move_entity, resolve_passability,
};
pub use entity::{EntityClass, EntityId, EntityKind, ProjectileInfo};
pub use error::{BuildError, BuildResult};
pub use movement::{Relocation, relocate, step_entity};
pub use wall::{DoorState, KeyRequirement, Wall, WallFlag, WallType};
pub use world::{World, WorldBuilder};
