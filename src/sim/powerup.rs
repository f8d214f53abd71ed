//! Collectible power-ups

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionIdentity, HitEffect, HitOutcome};
use super::entity::{Body, Entity, EntityId, EntityKind};
use super::movement::MoveComponent;
use super::player::ShotType;
use crate::achievements::GameEvent;
use crate::render::RenderHandle;

const POWERUP_SIZE: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerupKind {
    /// Points on pickup
    Fruit { points: u64 },
    /// Stored shot the player activates later
    Shot(ShotType),
}

impl PowerupKind {
    pub fn render_handle(self) -> RenderHandle {
        match self {
            PowerupKind::Fruit { .. } => RenderHandle::FRUIT,
            PowerupKind::Shot(_) => RenderHandle::SHOT_POWERUP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerupState {
    pub kind: PowerupKind,
}

impl Entity {
    pub fn powerup(id: EntityId, location: Vec2, kind: PowerupKind) -> Entity {
        Entity::new(
            id,
            Body::new(location, 0.0, Vec2::splat(POWERUP_SIZE)),
            MoveComponent::Idle,
            EntityKind::Powerup(PowerupState { kind }),
            CollisionIdentity::Powerup,
            Some(kind.render_handle()),
        )
    }
}

pub(super) fn collected(state: &PowerupState, other: &Entity) -> HitOutcome {
    if !other.is_player() {
        return HitOutcome::none();
    }
    let player = other.id;
    let effect = match state.kind {
        PowerupKind::Fruit { points } => HitEffect::AddScore { player, points },
        PowerupKind::Shot(shot) => HitEffect::GrantShot { player, shot },
    };
    log::debug!("{:?} collected {:?}", player, state.kind);
    HitOutcome::removed(vec![effect, HitEffect::Report(GameEvent::PowerupsCollected, 1)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::IdAllocator;

    #[test]
    fn test_shot_powerup_is_stored() {
        let mut ids = IdAllocator::default();
        let player = Entity::player(ids.next_id(), 3, Vec2::ZERO);
        let mut powerup = Entity::powerup(ids.next_id(), Vec2::ZERO, PowerupKind::Shot(ShotType::Triple));
        assert_eq!(powerup.render, Some(RenderHandle::SHOT_POWERUP));
        let effects = powerup.on_hit(&player).unwrap();
        assert!(powerup.should_remove());
        assert_eq!(
            effects,
            vec![
                HitEffect::GrantShot {
                    player: player.id,
                    shot: ShotType::Triple
                },
                HitEffect::Report(GameEvent::PowerupsCollected, 1),
            ]
        );
    }
}
