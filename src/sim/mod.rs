//! Simulation module
//!
//! All gameplay logic lives here:
//! - Single-threaded, one update per entity per frame
//! - Seeded RNG only (level generation)
//! - Stable iteration order (insertion order, spawns behind the spawner)
//! - No rendering or platform dependencies; the render snapshot is plain data

pub mod chain;
pub mod collision;
pub mod context;
pub mod enemy;
pub mod entity;
pub mod level;
pub mod level_function;
pub mod level_getter;
pub mod movement;
pub mod player;
pub mod powerup;
pub mod tick;
pub mod track;
pub mod world;

pub use chain::ChainLinks;
pub use collision::{CollisionHandler, CollisionIdentity, HitEffect, Rect, attempt_hit, check_hit};
pub use context::{EntityContext, Others, SimContext};
pub use enemy::{SharkState, SnakeDifficulty, SnakeState};
pub use entity::{Body, Entity, EntityId, EntityKind, IdAllocator, TimedEffect};
pub use level::{Level, LevelFrame, LevelMode};
pub use level_function::{Delayed, LevelFunction, PowerupFunction};
pub use level_getter::{GameLevelGetter, LevelGetter, PlayerStatus};
pub use movement::MoveComponent;
pub use player::{BulletState, PlayerState, ShotType};
pub use powerup::{PowerupKind, PowerupState};
pub use tick::{FrameReport, GameLoop, GameSession};
pub use track::Track;
pub use world::World;
