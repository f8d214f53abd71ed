//! Entities and their shared body state
//!
//! Every simulated object is an `Entity`: a body (location, rotation, hitbox,
//! timed effects), one active move component, a closed set of kinds carrying
//! the per-kind AI state, and the removal flags the world acts on.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::chain::ChainLinks;
use super::collision::{CollisionIdentity, HitEffect, HitOutcome, Rect};
use super::context::EntityContext;
use super::enemy::{self, SharkState, SnakeState};
use super::movement::MoveComponent;
use super::player::{self, BulletState, PlayerState};
use super::powerup::{self, PowerupState};
use super::track::Track;
use crate::consts::TRAVEL_VELOCITY_SET_GOTO_DEADBAND;
use crate::error::{GameError, Result};
use crate::render::{RenderHandle, RenderInstance};

/// Stable identity of an entity within one `World`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Hands out entity ids. Ids are never reused.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn next_id(&mut self) -> EntityId {
        self.next += 1;
        EntityId(self.next)
    }
}

/// Speed multiplier that expires after `remaining_ms`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedEffect {
    pub remaining_ms: f32,
    pub speed_multiplier: f32,
}

impl TimedEffect {
    pub fn speed(duration_ms: f32, speed_multiplier: f32) -> Self {
        Self {
            remaining_ms: duration_ms,
            speed_multiplier,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub location: Vec2,
    /// Degrees, counter-clockwise from +x
    pub rotation: f32,
    /// Full width and height of the hitbox
    pub hitbox: Vec2,
    /// Drawn size
    pub size: Vec2,
    pub effects: Vec<TimedEffect>,
}

impl Body {
    pub fn new(location: Vec2, rotation: f32, size: Vec2) -> Self {
        Self {
            location,
            rotation,
            hitbox: size,
            size,
            effects: Vec::new(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.location, self.hitbox)
    }

    /// Product of every active effect
    pub fn speed_multiplier(&self) -> f32 {
        self.effects.iter().map(|e| e.speed_multiplier).product()
    }

    pub fn add_effect(&mut self, effect: TimedEffect) {
        self.effects.push(effect);
    }

    pub fn tick_effects(&mut self, delta: f32) {
        let elapsed = delta * 1000.0;
        self.effects.retain_mut(|effect| {
            effect.remaining_ms -= elapsed;
            effect.remaining_ms > 0.0
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Player(PlayerState),
    Bullet(BulletState),
    Shark(SharkState),
    SnakePart(SnakeState),
    Powerup(PowerupState),
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub body: Body,
    pub movement: MoveComponent,
    pub kind: EntityKind,
    pub identity: CollisionIdentity,
    pub render: Option<RenderHandle>,
    pub links: ChainLinks,
    /// Kept aside instead of dropped when removed, so it can be re-added
    pub can_respawn: bool,
    /// The level is not done while this entity is alive
    pub blocks_level_end: bool,
    /// Updates received so far
    pub frames: u64,
    to_remove: bool,
    /// Marks the entity at the end of its next update, after it has acted
    #[cfg(test)]
    pub(crate) remove_after_update: bool,
}

impl Entity {
    pub fn new(
        id: EntityId,
        body: Body,
        movement: MoveComponent,
        kind: EntityKind,
        identity: CollisionIdentity,
        render: Option<RenderHandle>,
    ) -> Self {
        Self {
            id,
            body,
            movement,
            kind,
            identity,
            render,
            links: ChainLinks::default(),
            can_respawn: false,
            blocks_level_end: false,
            frames: 0,
            to_remove: false,
            #[cfg(test)]
            remove_after_update: false,
        }
    }

    pub fn should_remove(&self) -> bool {
        self.to_remove
    }

    pub fn set_to_remove(&mut self) {
        self.to_remove = true;
    }

    pub fn rect(&self) -> Rect {
        self.body.rect()
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player(_))
    }

    pub fn player_state(&self) -> Option<&PlayerState> {
        match &self.kind {
            EntityKind::Player(state) => Some(state),
            _ => None,
        }
    }

    pub fn player_state_mut(&mut self) -> Option<&mut PlayerState> {
        match &mut self.kind {
            EntityKind::Player(state) => Some(state),
            _ => None,
        }
    }

    /// The entity that fired this one, if it is a projectile
    pub fn shooter(&self) -> Option<EntityId> {
        match &self.kind {
            EntityKind::Bullet(bullet) => Some(bullet.shooter),
            _ => None,
        }
    }

    /// The player credited for damage this entity deals
    pub fn credited_player(&self) -> Option<EntityId> {
        match &self.kind {
            EntityKind::Player(_) => Some(self.id),
            EntityKind::Bullet(bullet) if self.identity == CollisionIdentity::FriendlyProjectile => {
                Some(bullet.shooter)
            }
            _ => None,
        }
    }

    /// Apply a speed effect to the head of a chain
    pub fn boost_head(&mut self, effect: TimedEffect) -> Result<()> {
        if self.links.in_front.is_some() {
            return Err(GameError::illegal(format!(
                "speed boost applied to {:?}, which is not a chain head",
                self.id
            )));
        }
        self.body.add_effect(effect);
        Ok(())
    }

    /// Per-frame update: effects tick, the kind's AI steers, then the move component runs
    pub(crate) fn update(&mut self, delta: f32, ctx: &mut EntityContext<'_, '_>) {
        self.frames += 1;
        self.body.tick_effects(delta);
        let id = self.id;
        match &mut self.kind {
            EntityKind::Player(state) => player::control(id, state, &mut self.body, &mut self.movement, delta, ctx),
            EntityKind::Shark(state) => enemy::control_shark(state, &self.body, &mut self.movement, delta, ctx),
            EntityKind::SnakePart(state) => enemy::control_snake(state, &self.links, &mut self.body, &mut self.movement, ctx),
            EntityKind::Bullet(_) | EntityKind::Powerup(_) => {}
        }
        self.movement.step(&mut self.body, delta, ctx.track, ctx.others);

        if let EntityKind::Bullet(bullet) = &self.kind {
            if bullet.out_of_range(self.body.location) || !ctx.bounds.contains(self.body.location) {
                self.to_remove = true;
            }
        }
        #[cfg(test)]
        if self.remove_after_update {
            self.to_remove = true;
        }
    }

    /// Err if this entity is in no state to register a hit, e.g. a bullet that already hit something
    pub fn ensure_can_be_hit(&self) -> Result<()> {
        match &self.kind {
            EntityKind::Bullet(bullet) => player::ensure_unspent(self.id, bullet),
            _ => Ok(()),
        }
    }

    /// Hit notification from the collision pass. The pair is already known to be eligible.
    pub fn on_hit(&mut self, other: &Entity) -> Result<Vec<HitEffect>> {
        let outcome = match &mut self.kind {
            EntityKind::Player(state) => player::player_hit(state, other),
            EntityKind::Bullet(bullet) => player::bullet_hit(self.id, bullet, other)?,
            EntityKind::Shark(_) => enemy::shark_hit(other),
            EntityKind::SnakePart(_) => enemy::snake_hit(self.id, self.links.in_front.is_none(), other),
            EntityKind::Powerup(state) => powerup::collected(state, other),
        };
        let HitOutcome { remove, effects } = outcome;
        if remove {
            self.to_remove = true;
        }
        Ok(effects)
    }

    /// True while the entity is still travelling back to its start during RESET
    pub fn is_going_to_start(&self) -> bool {
        match &self.kind {
            EntityKind::Shark(state) => {
                self.body.location.distance(state.start) > TRAVEL_VELOCITY_SET_GOTO_DEADBAND
            }
            EntityKind::SnakePart(_) => self.links.in_front.is_none() && enemy::snake_is_returning(self.body.location),
            _ => false,
        }
    }

    /// Reset state for re-adding after a removal
    pub fn on_respawn(&mut self, track: &Track) {
        self.to_remove = false;
        self.body.effects.clear();
        if let EntityKind::Player(state) = &mut self.kind {
            state.reset_for_respawn();
            self.body.location = track.point_at(0.0);
            self.movement = MoveComponent::Track {
                distance: 0.0,
                velocity: 0.0,
            };
        }
    }

    pub fn render_instance(&self) -> Option<RenderInstance> {
        self.render
            .map(|handle| RenderInstance::new(self.body.location, self.body.rotation, self.body.size, handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let mut ids = IdAllocator::default();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_ne!(a, b);
        assert_eq!(a, EntityId(1));
    }

    #[test]
    fn test_effects_expire() {
        let mut body = Body::new(Vec2::ZERO, 0.0, Vec2::ONE);
        body.add_effect(TimedEffect::speed(1000.0, 1.5));
        body.add_effect(TimedEffect::speed(300.0, 2.0));
        assert!((body.speed_multiplier() - 3.0).abs() < 1e-5);
        body.tick_effects(0.5);
        assert!((body.speed_multiplier() - 1.5).abs() < 1e-5);
        body.tick_effects(0.5);
        assert_eq!(body.speed_multiplier(), 1.0);
        assert!(body.effects.is_empty());
    }

    #[test]
    fn test_boost_requires_head() {
        let mut ids = IdAllocator::default();
        let mut part = Entity::snake_part(ids.next_id(), Vec2::ZERO, Default::default());
        part.links.in_front = Some(EntityId(99));
        assert!(matches!(
            part.boost_head(TimedEffect::speed(1000.0, 1.5)),
            Err(GameError::IllegalOperation(_))
        ));
        part.links.in_front = None;
        assert!(part.boost_head(TimedEffect::speed(1000.0, 1.5)).is_ok());
    }

    #[test]
    fn test_respawn_clears_removal() {
        let track = Track::circle();
        let mut ids = IdAllocator::default();
        let mut player = Entity::player(ids.next_id(), 3, Vec2::new(3.0, 3.0));
        player.set_to_remove();
        player.on_respawn(&track);
        assert!(!player.should_remove());
        assert!(player.body.location.abs_diff_eq(track.point_at(0.0), 1e-5));
    }
}
