//! The player and its bullets

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionIdentity, HitEffect, HitOutcome};
use super::context::EntityContext;
use super::entity::{Body, Entity, EntityId, EntityKind};
use super::level::LevelMode;
use super::movement::MoveComponent;
use crate::consts::*;
use crate::error::{GameError, Result};
use crate::input::RumbleRequest;
use crate::normalize_degrees;
use crate::render::RenderHandle;

/// How long a shot power-up lasts once activated (ms)
pub const SHOT_POWERUP_MS: f32 = 10_000.0;

const PLAYER_SIZE: f32 = 0.5;
const BULLET_SIZE: f32 = 0.2;

const SHOT_RUMBLE: RumbleRequest = RumbleRequest {
    duration_ms: 40,
    intensity: 0.3,
};
const HIT_RUMBLE: RumbleRequest = RumbleRequest {
    duration_ms: 500,
    intensity: 1.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShotType {
    #[default]
    Straight,
    /// Three bullets, 15 degrees apart
    Triple,
    /// Five slower bullets across 40 degrees
    ShotGun,
}

impl ShotType {
    /// Bullet angles relative to the player's rotation
    pub fn spread(self) -> &'static [f32] {
        match self {
            ShotType::Straight => &[0.0],
            ShotType::Triple => &[-15.0, 0.0, 15.0],
            ShotType::ShotGun => &[-20.0, -10.0, 0.0, 10.0, 20.0],
        }
    }

    pub fn bullet_speed(self) -> f32 {
        match self {
            ShotType::ShotGun => SHOT_GUN_BULLET_SPEED,
            _ => BULLET_SPEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub lives: u32,
    pub score: u64,
    pub shot: ShotType,
    pub shot_remaining_ms: f32,
    /// Collected but not yet activated
    pub stored_shot: Option<ShotType>,
    pub fire_cooldown_ms: f32,
    pub shots_fired: u64,
}

impl PlayerState {
    pub fn new(lives: u32) -> Self {
        Self {
            lives,
            score: 0,
            shot: ShotType::Straight,
            shot_remaining_ms: 0.0,
            stored_shot: None,
            fire_cooldown_ms: 0.0,
            shots_fired: 0,
        }
    }

    pub fn tick(&mut self, elapsed_ms: f32) {
        self.fire_cooldown_ms = (self.fire_cooldown_ms - elapsed_ms).max(0.0);
        if self.shot != ShotType::Straight {
            self.shot_remaining_ms -= elapsed_ms;
            if self.shot_remaining_ms <= 0.0 {
                self.shot = ShotType::Straight;
                self.shot_remaining_ms = 0.0;
            }
        }
    }

    /// A newer collected shot replaces an older one
    pub fn store_shot(&mut self, shot: ShotType) {
        self.stored_shot = Some(shot);
    }

    pub fn activate_stored(&mut self) -> bool {
        let Some(shot) = self.stored_shot.take() else {
            return false;
        };
        self.shot = shot;
        self.shot_remaining_ms = SHOT_POWERUP_MS;
        true
    }

    pub(crate) fn reset_for_respawn(&mut self) {
        self.shot = ShotType::Straight;
        self.shot_remaining_ms = 0.0;
        self.fire_cooldown_ms = 0.0;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletState {
    pub shooter: EntityId,
    pub start: Vec2,
    pub max_distance: f32,
    /// A bullet registers at most one hit
    pub hit: Option<EntityId>,
}

impl BulletState {
    pub fn out_of_range(&self, location: Vec2) -> bool {
        self.start.distance(location) > self.max_distance
    }
}

impl Entity {
    pub fn player(id: EntityId, lives: u32, location: Vec2) -> Entity {
        let mut player = Entity::new(
            id,
            Body::new(location, 90.0, Vec2::splat(PLAYER_SIZE)),
            MoveComponent::Idle,
            EntityKind::Player(PlayerState::new(lives)),
            CollisionIdentity::Player,
            Some(RenderHandle::PLAYER),
        );
        player.can_respawn = true;
        player
    }

    /// Bullet fired by `shooter` from its location
    pub fn bullet(id: EntityId, shooter: &Entity, rotation: f32, speed: f32, max_distance: f32) -> Entity {
        let identity = match shooter.identity {
            CollisionIdentity::Player => CollisionIdentity::FriendlyProjectile,
            _ => CollisionIdentity::EnemyProjectile,
        };
        Entity::bullet_from(id, shooter.id, identity, shooter.body.location, rotation, speed, max_distance)
    }

    pub(crate) fn bullet_from(
        id: EntityId,
        shooter: EntityId,
        identity: CollisionIdentity,
        location: Vec2,
        rotation: f32,
        speed: f32,
        max_distance: f32,
    ) -> Entity {
        Entity::new(
            id,
            Body::new(location, rotation, Vec2::splat(BULLET_SIZE)),
            MoveComponent::FixedVelocity {
                velocity: crate::degrees_to_vec(rotation) * speed,
            },
            EntityKind::Bullet(BulletState {
                shooter,
                start: location,
                max_distance,
                hit: None,
            }),
            identity,
            Some(RenderHandle::BULLET),
        )
    }
}

/// Player AI: reads the active controls. Outside NORMAL the player holds still.
pub(super) fn control(
    id: EntityId,
    state: &mut PlayerState,
    body: &mut Body,
    movement: &mut MoveComponent,
    delta: f32,
    ctx: &mut EntityContext<'_, '_>,
) {
    state.tick(delta * 1000.0);
    let controls = *ctx.sim.controls;
    let distance = match *movement {
        MoveComponent::Track { distance, .. } => distance,
        _ => ctx.track.closest_distance(body.location),
    };
    let mut velocity = 0.0;

    if ctx.mode == LevelMode::Normal {
        let tangent = ctx.track.tangent_at(distance);
        velocity = controls.main_joystick.live_vector().dot(tangent) * PLAYER_VELOCITY;
        if controls.slow.down {
            velocity *= SLOW_MULTIPLIER;
        }
        body.rotation = normalize_degrees(body.rotation + controls.rotate_axis * PLAYER_ROTATION_SPEED * delta);

        if controls.activate_powerup.pressed && state.activate_stored() {
            log::debug!("Activated {:?} shot", state.shot);
        }
        if controls.fire.down && state.fire_cooldown_ms <= 0.0 {
            fire(id, state, body, ctx);
            if controls.rumble_on_shot {
                ctx.sim.rumble(SHOT_RUMBLE);
            }
        }
    }
    *movement = MoveComponent::Track { distance, velocity };
}

fn fire(id: EntityId, state: &mut PlayerState, body: &Body, ctx: &mut EntityContext<'_, '_>) {
    for offset in state.shot.spread() {
        let bullet = Entity::bullet_from(
            ctx.next_id(),
            id,
            CollisionIdentity::FriendlyProjectile,
            body.location,
            normalize_degrees(body.rotation + offset),
            state.shot.bullet_speed(),
            BULLET_SHOT_DISTANCE,
        );
        ctx.add_entity(bullet);
    }
    state.fire_cooldown_ms = FIRE_COOLDOWN_MS as f32;
    state.shots_fired += 1;
}

pub(super) fn player_hit(state: &mut PlayerState, other: &Entity) -> HitOutcome {
    match other.identity {
        CollisionIdentity::Enemy | CollisionIdentity::EnemyProjectile => {
            state.lives = state.lives.saturating_sub(1);
            log::info!("Player hit by {:?}, {} lives left", other.id, state.lives);
            HitOutcome::removed(vec![HitEffect::Rumble(HIT_RUMBLE)])
        }
        _ => HitOutcome::none(),
    }
}

pub(super) fn ensure_unspent(id: EntityId, bullet: &BulletState) -> Result<()> {
    match bullet.hit {
        Some(previous) => Err(GameError::illegal(format!(
            "bullet {:?} already hit {:?}",
            id, previous
        ))),
        None => Ok(()),
    }
}

pub(super) fn bullet_hit(id: EntityId, bullet: &mut BulletState, other: &Entity) -> Result<HitOutcome> {
    ensure_unspent(id, bullet)?;
    bullet.hit = Some(other.id);
    Ok(HitOutcome::removed(Vec::new()))
}
