/*!
Collision root module.

This module re-exports the submodules that implement the swept-sphere query
over the cell graph and the movement loop built on it. The code is split for
clarity:

- types:        shared data types (SweepQuery, SweepResult, MoveResult, flags)
- settings:     tolerances, caps and `SweepSettings`
- narrow_phase: face/edge/sphere predicates
- masks:        per-cell containment masks
- passability:  what a side lets through, from its wall
- filter:       which entity pairs collide
- broad:        cell AABB BVH and point location
- sweep:        recursive traversal and its preallocated scratch
- query:        `SweepEngine`, the public entry point
- kinematic:    sweep-and-slide/bounce movement loop
*/

pub mod broad;
pub mod filter;
pub mod kinematic;
pub mod masks;
pub mod narrow_phase;
pub mod passability;
pub mod query;
pub mod settings;
pub mod sweep;
pub mod types;

// Re-export commonly used types and functions.
pub use filter::CollisionMatrix;
pub use kinematic::{
    CollisionHandler, EntityContact, EntityHitResponse, MoveRequest, NoopHandler, WallContact,
    move_entity,
};
pub use passability::{Passability, resolve_passability};
pub use query::SweepEngine;
pub use settings::SweepSettings;
pub use types::{
    FaceRef, HitKind, MoveHit, MoveOutcome, MoveResult, QueryFlag, QueryFlags, Response,
    SweepNote, SweepNotes, SweepQuery, SweepResult, Vec3,
};
