//! Enemies: sharks and snakes
//!
//! Sharks chase a point on the track ahead of or behind the player and return
//! to their start during RESET. Snakes are chains of parts; the head steers and
//! every other part follows the one in front of it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::chain::ChainLinks;
use super::collision::{CollisionIdentity, HitEffect, HitOutcome};
use super::context::{EntityContext, Others};
use super::entity::{Body, Entity, EntityId, EntityKind, TimedEffect};
use super::level::LevelMode;
use super::movement::MoveComponent;
use crate::achievements::GameEvent;
use crate::consts::*;
use crate::render::RenderHandle;
use crate::vec_to_degrees;

const SHARK_SIZE: f32 = 0.8;
/// Track units per second a shark's offset from the player shrinks by
const SHARK_OFFSET_CLOSE_SPEED: f32 = 0.5;

const SNAKE_DEFAULT_SIZE: f32 = 0.4;
const SNAKE_HITBOX_RATIO: f32 = 0.625;
/// Squared distance from the origin a returning head must get within
const SNAKE_RETURN_RADIUS_SQ: f32 = 9.0;
const SNAKE_HIT_BOOST: TimedEffect = TimedEffect {
    remaining_ms: 1000.0,
    speed_multiplier: 1.5,
};

// === Sharks ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharkState {
    pub start: Vec2,
    pub start_rotation: f32,
    /// Track distance from the player the shark aims for at level start
    pub initial_offset: f32,
    pub track_offset: f32,
}

impl Entity {
    pub fn shark(id: EntityId, start: Vec2, start_rotation: f32, track_offset: f32) -> Entity {
        let mut shark = Entity::new(
            id,
            Body::new(start, start_rotation, Vec2::splat(SHARK_SIZE)),
            MoveComponent::Idle,
            EntityKind::Shark(SharkState {
                start,
                start_rotation,
                initial_offset: track_offset,
                track_offset,
            }),
            CollisionIdentity::Enemy,
            Some(RenderHandle::SHARK),
        );
        shark.blocks_level_end = true;
        shark
    }
}

pub(super) fn control_shark(
    state: &mut SharkState,
    body: &Body,
    movement: &mut MoveComponent,
    delta: f32,
    ctx: &EntityContext<'_, '_>,
) {
    match ctx.mode {
        LevelMode::Normal => {
            let Some(player) = ctx.others.player() else {
                *movement = MoveComponent::Idle;
                return;
            };
            let close = (SHARK_OFFSET_CLOSE_SPEED * delta).min(state.track_offset.abs());
            state.track_offset -= state.track_offset.signum() * close;

            let player_distance = match player.movement {
                MoveComponent::Track { distance, .. } => distance,
                _ => ctx.track.closest_distance(player.body.location),
            };
            let target = ctx.track.point_at(player_distance + state.track_offset);
            let away = target - body.location;
            let desired = if away.length_squared() > f32::EPSILON {
                Some(vec_to_degrees(away))
            } else {
                None
            };
            *movement = MoveComponent::direct(target, SHARK_SPEED, desired, SHARK_TURN_VELOCITY);
        }
        LevelMode::Reset => {
            state.track_offset = state.initial_offset;
            *movement = MoveComponent::direct(state.start, SHARK_SPEED, Some(state.start_rotation), SHARK_TURN_VELOCITY);
        }
        LevelMode::Standby => *movement = MoveComponent::Idle,
    }
}

/// Sharks only die to friendly fire
pub(super) fn shark_hit(other: &Entity) -> HitOutcome {
    if other.identity != CollisionIdentity::FriendlyProjectile {
        return HitOutcome::none();
    }
    let mut effects = Vec::new();
    if let Some(player) = other.credited_player() {
        effects.push(HitEffect::AddScore {
            player,
            points: SHARK_POINTS,
        });
    }
    effects.push(HitEffect::Report(GameEvent::SharksKilled, 1));
    HitOutcome::removed(effects)
}

// === Snakes ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum SnakeDifficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnakeState {
    pub difficulty: SnakeDifficulty,
    /// Drawn size and follow distance, shared along the chain
    pub size: f32,
}

impl Entity {
    pub fn snake_part(id: EntityId, location: Vec2, difficulty: SnakeDifficulty) -> Entity {
        let mut part = Entity::new(
            id,
            Body::new(location, 0.0, Vec2::splat(SNAKE_DEFAULT_SIZE)),
            MoveComponent::Idle,
            EntityKind::SnakePart(SnakeState {
                difficulty,
                size: SNAKE_DEFAULT_SIZE,
            }),
            CollisionIdentity::Enemy,
            Some(RenderHandle::SNAKE_PART),
        );
        part.body.hitbox = Vec2::splat(SNAKE_DEFAULT_SIZE * SNAKE_HITBOX_RATIO);
        part.blocks_level_end = true;
        part
    }
}

/// Parts shrink as the snake grows, down to the default at ten parts
pub fn snake_size(parts: usize) -> f32 {
    if parts <= 10 {
        SNAKE_DEFAULT_SIZE - (parts as f32 - 10.0) * 0.04
    } else {
        SNAKE_DEFAULT_SIZE
    }
}

/// Head speed and turn multiplier. Short snakes are faster on harder difficulties.
pub fn snake_speed(difficulty: SnakeDifficulty, parts: usize) -> (f32, f32) {
    let mut speed = SNAKE_DEFAULT_SPEED;
    let mut turn = SNAKE_DEFAULT_TURN_MULTIPLIER;
    if parts <= 10 && difficulty >= SnakeDifficulty::Normal {
        if difficulty >= SnakeDifficulty::Hard {
            speed = 15.0 - parts as f32;
        } else if parts <= 5 {
            speed = 5.0 + (5.0 - parts as f32) * 0.5;
        }
        turn = 4.5 - parts as f32 * 0.25;
    }
    (speed, turn)
}

pub(super) fn snake_is_returning(location: Vec2) -> bool {
    location.length_squared() > SNAKE_RETURN_RADIUS_SQ
}

/// Parts in the chain starting at `links`' owner, counting the owner
fn chain_length(links: &ChainLinks, others: Others<'_>) -> usize {
    let mut count = 1;
    let mut cursor = links.behind;
    while let Some(id) = cursor {
        count += 1;
        if count > others.iter().count() + 1 {
            break;
        }
        cursor = others.get(id).and_then(|e| e.links.behind);
    }
    count
}

fn set_size(state: &mut SnakeState, body: &mut Body, size: f32) {
    state.size = size;
    body.size = Vec2::splat(size);
    body.hitbox = Vec2::splat(size * SNAKE_HITBOX_RATIO);
}

pub(super) fn control_snake(
    state: &mut SnakeState,
    links: &ChainLinks,
    body: &mut Body,
    movement: &mut MoveComponent,
    ctx: &EntityContext<'_, '_>,
) {
    if let Some(leader) = links.in_front {
        // Size flows back from the head one link per frame
        if let Some(EntityKind::SnakePart(front)) = ctx.others.get(leader).map(|e| &e.kind) {
            set_size(state, body, front.size);
        }
        *movement = MoveComponent::Follow {
            leader,
            distance: state.size,
        };
        return;
    }

    let parts = chain_length(links, ctx.others);
    set_size(state, body, snake_size(parts));
    let (speed, turn_multiplier) = snake_speed(state.difficulty, parts);
    let target = match ctx.mode {
        LevelMode::Normal => Some(ctx.others.player().map_or(Vec2::ZERO, |p| p.body.location)),
        LevelMode::Reset if snake_is_returning(body.location) => Some(Vec2::ZERO),
        LevelMode::Reset | LevelMode::Standby => None,
    };
    *movement = match target {
        Some(target) => MoveComponent::SmoothTravel {
            target,
            speed,
            turn_multiplier,
        },
        None => MoveComponent::Idle,
    };
}

/// Any hit by the player or its bullets kills this part and every part behind it
pub(super) fn snake_hit(id: EntityId, is_head: bool, other: &Entity) -> HitOutcome {
    if !matches!(
        other.identity,
        CollisionIdentity::FriendlyProjectile | CollisionIdentity::Player
    ) {
        return HitOutcome::none();
    }
    let mut effects = vec![
        HitEffect::SpeedBoostHead {
            part: id,
            effect: SNAKE_HIT_BOOST,
        },
        HitEffect::KillChainBehind {
            part: id,
            player: other.credited_player(),
            points: SNAKE_PART_POINTS,
        },
    ];
    if is_head {
        effects.push(HitEffect::Report(GameEvent::SnakesKilled, 1));
    }
    HitOutcome::removed(effects)
}
