//! Collision identities, hitboxes and the per-frame hit pass
//!
//! Collision here is eligibility plus overlap. Hitboxes are axis-aligned
//! rectangles centered on each entity; the identity table decides whether an
//! overlapping pair may register a hit at all. The table is symmetric, and so
//! is shooter exclusion, so `check_hit(a, b)` and `check_hit(b, a)` always
//! agree.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::chain;
use super::context::SimContext;
use super::entity::{Entity, EntityId, TimedEffect};
use super::player::ShotType;
use crate::achievements::GameEvent;
use crate::error::{GameError, Result};
use crate::input::RumbleRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionIdentity {
    Player,
    Enemy,
    FriendlyProjectile,
    EnemyProjectile,
    Powerup,
    /// Scenery and anything else that never collides
    Unknown,
}

impl CollisionIdentity {
    fn rank(self) -> u8 {
        match self {
            CollisionIdentity::Player => 0,
            CollisionIdentity::Enemy => 1,
            CollisionIdentity::FriendlyProjectile => 2,
            CollisionIdentity::EnemyProjectile => 3,
            CollisionIdentity::Powerup => 4,
            CollisionIdentity::Unknown => 5,
        }
    }

    /// Whether the two identities may ever register a hit. Symmetric.
    pub fn can_hit(self, other: CollisionIdentity) -> bool {
        use CollisionIdentity::*;
        let (a, b) = if self.rank() <= other.rank() { (self, other) } else { (other, self) };
        matches!(
            (a, b),
            (Player, Enemy) | (Player, EnemyProjectile) | (Player, Powerup) | (Enemy, FriendlyProjectile)
        )
    }
}

/// Axis-aligned rectangle given by center and half extents
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub center: Vec2,
    pub half: Vec2,
}

impl Rect {
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half: size * 0.5,
        }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    /// Touching edges do not count
    pub fn overlaps(&self, other: &Rect) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.half + other.half;
        d.x < reach.x && d.y < reach.y
    }

    pub fn contains(&self, p: Vec2) -> bool {
        let d = (p - self.center).abs();
        d.x <= self.half.x && d.y <= self.half.y
    }
}

/// Effects of a hit on entities other than the two in the pair
#[derive(Debug, Clone, PartialEq)]
pub enum HitEffect {
    AddScore { player: EntityId, points: u64 },
    /// Mark `part` and every part behind it, scoring each for `player`
    KillChainBehind {
        part: EntityId,
        player: Option<EntityId>,
        points: u64,
    },
    /// Timed speed effect on the head of `part`'s chain
    SpeedBoostHead { part: EntityId, effect: TimedEffect },
    GrantShot { player: EntityId, shot: ShotType },
    Report(GameEvent, u32),
    Rumble(RumbleRequest),
}

/// What `on_hit` did to the entity that was hit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HitOutcome {
    pub remove: bool,
    pub effects: Vec<HitEffect>,
}

impl HitOutcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn removed(effects: Vec<HitEffect>) -> Self {
        Self { remove: true, effects }
    }
}

/// Ok if the pair may register a hit, `CannotHit` otherwise
pub fn check_hit(a: &Entity, b: &Entity) -> Result<()> {
    let cannot = || GameError::CannotHit { a: a.id, b: b.id };
    if a.id == b.id || !a.identity.can_hit(b.identity) {
        return Err(cannot());
    }
    if a.shooter() == Some(b.id) || b.shooter() == Some(a.id) {
        return Err(cannot());
    }
    Ok(())
}

/// Notify both sides of a hit. Nothing is mutated unless the pair is eligible
/// and both sides are able to take the hit.
pub fn attempt_hit(a: &mut Entity, b: &mut Entity) -> Result<Vec<HitEffect>> {
    check_hit(a, b)?;
    a.ensure_can_be_hit()?;
    b.ensure_can_be_hit()?;
    let mut effects = a.on_hit(b)?;
    effects.extend(b.on_hit(a)?);
    Ok(effects)
}

#[derive(Debug, Clone, Default)]
pub struct CollisionHandler {
    /// Hits registered over the handler's lifetime
    hits: u64,
}

impl CollisionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// One pass over every unordered pair. Entities are only marked here; removal
    /// happens in the next world update.
    pub fn run(&mut self, entities: &mut [Entity], ctx: &mut SimContext<'_>) {
        for j in 1..entities.len() {
            for i in 0..j {
                let (left, right) = entities.split_at_mut(j);
                let (a, b) = (&mut left[i], &mut right[0]);
                if a.should_remove() || b.should_remove() || !a.rect().overlaps(&b.rect()) {
                    continue;
                }
                match attempt_hit(a, b) {
                    Ok(effects) => {
                        self.hits += 1;
                        for effect in effects {
                            apply_effect(entities, effect, ctx);
                        }
                    }
                    Err(e) if e.is_cannot_hit() => {}
                    Err(e) => log::error!("Hit between entities aborted: {}", e),
                }
            }
        }
    }
}

fn apply_effect(entities: &mut [Entity], effect: HitEffect, ctx: &mut SimContext<'_>) {
    match effect {
        HitEffect::AddScore { player, points } => add_score(entities, player, points),
        HitEffect::KillChainBehind { part, player, points } => {
            for id in chain::parts_from(entities, part) {
                if let Some(entity) = entities.iter_mut().find(|e| e.id == id) {
                    entity.set_to_remove();
                }
                if let Some(player) = player {
                    add_score(entities, player, points);
                }
            }
        }
        HitEffect::SpeedBoostHead { part, effect } => match chain::head(entities, part) {
            Ok(head) => {
                if let Some(entity) = entities.iter_mut().find(|e| e.id == head) {
                    if let Err(e) = entity.boost_head(effect) {
                        log::error!("Speed boost skipped: {}", e);
                    }
                }
            }
            Err(e) => log::error!("Speed boost skipped: {}", e),
        },
        HitEffect::GrantShot { player, shot } => {
            if let Some(state) = entities.iter_mut().find(|e| e.id == player).and_then(Entity::player_state_mut) {
                state.store_shot(shot);
            }
        }
        HitEffect::Report(event, amount) => ctx.report(event, amount),
        HitEffect::Rumble(request) => ctx.rumble(request),
    }
}

fn add_score(entities: &mut [Entity], player: EntityId, points: u64) {
    if let Some(state) = entities.iter_mut().find(|e| e.id == player).and_then(Entity::player_state_mut) {
        state.score += points;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::NullSink;
    use crate::consts::SHARK_POINTS;
    use crate::input::ControlSnapshot;
    use crate::settings::SimConfig;
    use crate::sim::entity::IdAllocator;
    use proptest::prelude::*;

    const ALL: [CollisionIdentity; 6] = [
        CollisionIdentity::Player,
        CollisionIdentity::Enemy,
        CollisionIdentity::FriendlyProjectile,
        CollisionIdentity::EnemyProjectile,
        CollisionIdentity::Powerup,
        CollisionIdentity::Unknown,
    ];

    #[test]
    fn test_identity_table() {
        use CollisionIdentity::*;
        assert!(Player.can_hit(Enemy));
        assert!(FriendlyProjectile.can_hit(Enemy));
        assert!(!FriendlyProjectile.can_hit(EnemyProjectile));
        assert!(!FriendlyProjectile.can_hit(Powerup));
        assert!(!Enemy.can_hit(Enemy));
        assert!(!Player.can_hit(FriendlyProjectile));
    }

    #[test]
    fn test_rect_overlap() {
        let a = Rect::from_center(Vec2::ZERO, Vec2::splat(1.0));
        assert!(a.overlaps(&Rect::from_center(Vec2::new(0.9, 0.0), Vec2::splat(1.0))));
        assert!(!a.overlaps(&Rect::from_center(Vec2::new(1.0, 0.0), Vec2::splat(1.0))));
        assert!(a.contains(Vec2::new(0.5, -0.5)));
    }

    #[test]
    fn test_bullet_never_hits_its_shooter() {
        let mut ids = IdAllocator::default();
        let player = Entity::player(ids.next_id(), 3, Vec2::ZERO);
        let bullet = Entity::bullet(ids.next_id(), &player, 0.0, 10.0, 5.0);
        assert!(check_hit(&bullet, &player).unwrap_err().is_cannot_hit());
        assert!(check_hit(&player, &bullet).unwrap_err().is_cannot_hit());
    }

    #[test]
    fn test_pass_marks_and_scores() {
        let mut ids = IdAllocator::default();
        let player = Entity::player(ids.next_id(), 3, Vec2::new(5.0, 5.0));
        let bullet = Entity::bullet(ids.next_id(), &player, 0.0, 10.0, 5.0);
        let mut shark = Entity::shark(ids.next_id(), Vec2::new(1.0, 1.0), 45.0, 0.0);
        shark.body.location = Vec2::new(5.2, 5.0);
        let player_id = player.id;
        let mut entities = vec![player, bullet, shark];
        // Player and shark overlap too; the player loses a life in the same pass
        let config = SimConfig::default();
        let controls = ControlSnapshot::default();
        let mut sink: Vec<(GameEvent, u32)> = Vec::new();
        let mut ctx = SimContext::new(&config, &controls, &mut sink);
        let mut handler = CollisionHandler::new();
        handler.run(&mut entities, &mut ctx);

        assert!(entities[1].should_remove());
        assert!(entities[2].should_remove());
        let state = entities[0].player_state().unwrap();
        assert_eq!(state.score, SHARK_POINTS);
        drop(ctx);
        assert!(sink.contains(&(GameEvent::SharksKilled, 1)));
        assert_eq!(entities[0].id, player_id);
    }

    #[test]
    fn test_spent_bullet_leaves_target_untouched() {
        let mut ids = IdAllocator::default();
        let player = Entity::player(ids.next_id(), 3, Vec2::ZERO);
        let mut bullet = Entity::bullet(ids.next_id(), &player, 0.0, 10.0, 5.0);
        let mut first = Entity::shark(ids.next_id(), Vec2::ZERO, 0.0, 0.0);
        let mut second = Entity::shark(ids.next_id(), Vec2::ZERO, 0.0, 0.0);
        attempt_hit(&mut first, &mut bullet).unwrap();
        assert!(first.should_remove());

        let err = attempt_hit(&mut second, &mut bullet).unwrap_err();
        assert!(matches!(err, GameError::IllegalOperation(_)));
        assert!(!second.should_remove());
        let err = attempt_hit(&mut bullet, &mut second).unwrap_err();
        assert!(matches!(err, GameError::IllegalOperation(_)));
        assert!(!second.should_remove());
    }

    #[test]
    fn test_marked_pairs_are_skipped() {
        let mut ids = IdAllocator::default();
        let player = Entity::player(ids.next_id(), 3, Vec2::ZERO);
        let mut shark = Entity::shark(ids.next_id(), Vec2::ZERO, 0.0, 0.0);
        shark.set_to_remove();
        let mut entities = vec![player, shark];
        let config = SimConfig::default();
        let controls = ControlSnapshot::default();
        let mut sink = NullSink;
        let mut ctx = SimContext::new(&config, &controls, &mut sink);
        let mut handler = CollisionHandler::new();
        handler.run(&mut entities, &mut ctx);
        assert_eq!(handler.hits(), 0);
        assert_eq!(entities[0].player_state().unwrap().lives, 3);
    }

    proptest! {
        #[test]
        fn prop_identity_table_is_symmetric(a in 0usize..6, b in 0usize..6) {
            prop_assert_eq!(ALL[a].can_hit(ALL[b]), ALL[b].can_hit(ALL[a]));
        }

        #[test]
        fn prop_check_hit_is_symmetric(a in 0usize..6, b in 0usize..6, shot_by_other in any::<bool>()) {
            let mut ids = IdAllocator::default();
            let mut first = Entity::player(ids.next_id(), 3, Vec2::ZERO);
            first.identity = ALL[a];
            let mut second = if shot_by_other {
                Entity::bullet(ids.next_id(), &first, 0.0, 10.0, 5.0)
            } else {
                Entity::shark(ids.next_id(), Vec2::ZERO, 0.0, 0.0)
            };
            second.identity = ALL[b];
            prop_assert_eq!(check_hit(&first, &second).is_err(), check_hit(&second, &first).is_err());
            if shot_by_other {
                prop_assert!(check_hit(&second, &first).is_err());
            }
        }
    }
}
