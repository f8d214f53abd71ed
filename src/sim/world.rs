//! The world: entity collection, per-frame update pass, collisions and the current level
//!
//! One update does, in order:
//! 1. replace the level if there is none or it is done
//! 2. promote RESET to STANDBY once the reset has finished
//! 3. update every entity once in insertion order, splicing spawns in behind
//!    the cursor and removing entities right after their own update
//! 4. run the collision pass (marks only)
//! 5. advance the level

use glam::Vec2;

use super::chain;
use super::collision::{CollisionHandler, Rect};
use super::context::{EntityContext, Others, SimContext};
use super::entity::{Entity, EntityId, IdAllocator};
use super::level::{Level, LevelMode};
use super::level_getter::{LevelGetter, PlayerStatus};
use super::movement::MoveComponent;
use super::player::PlayerState;
use crate::achievements::GameEvent;
use crate::error::{GameError, Result};
use crate::render::RenderInstance;

pub struct World {
    entities: Vec<Entity>,
    /// Removed entities that may be re-added
    graveyard: Vec<Entity>,
    bounds: Rect,
    level: Option<Level>,
    getter: Box<dyn LevelGetter>,
    collisions: CollisionHandler,
    ids: IdAllocator,
    frames: u64,
}

impl World {
    /// A `width` x `height` world centered on the origin
    pub fn new(width: f32, height: f32, getter: Box<dyn LevelGetter>) -> Self {
        Self {
            entities: Vec::new(),
            graveyard: Vec::new(),
            bounds: Rect::from_center(Vec2::ZERO, Vec2::new(width, height)),
            level: None,
            getter,
            collisions: CollisionHandler::new(),
            ids: IdAllocator::default(),
            frames: 0,
        }
    }

    pub fn next_id(&mut self) -> EntityId {
        self.ids.next_id()
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    pub fn mode(&self) -> Option<LevelMode> {
        self.level.as_ref().map(Level::mode)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn collisions(&self) -> &CollisionHandler {
        &self.collisions
    }

    /// Entities in iteration and draw order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Add outside of the update pass. Entities use `EntityContext::add_entity` instead.
    pub fn add_entity(&mut self, entity: Entity) {
        log::trace!("Adding {:?}", entity.id);
        self.entities.push(entity);
    }

    /// Present and not marked for removal
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.iter().any(|e| e.id == id && !e.should_remove())
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// A player's state whether it is on the field or waiting to respawn
    pub fn player_state(&self, id: EntityId) -> Option<&PlayerState> {
        self.entities
            .iter()
            .chain(self.graveyard.iter())
            .find(|e| e.id == id)
            .and_then(Entity::player_state)
    }

    pub fn player_state_mut(&mut self, id: EntityId) -> Option<&mut PlayerState> {
        self.entities
            .iter_mut()
            .chain(self.graveyard.iter_mut())
            .find(|e| e.id == id)
            .and_then(Entity::player_state_mut)
    }

    fn player_status(&self) -> Option<PlayerStatus> {
        let player = self
            .entities
            .iter()
            .chain(self.graveyard.iter())
            .find(|e| e.is_player())?;
        let state = player.player_state()?;
        Some(PlayerStatus {
            location: player.body.location,
            score: state.score,
            lives: state.lives,
        })
    }

    /// Re-add a removed entity that can respawn
    pub fn respawn(&mut self, id: EntityId) -> Result<()> {
        let track = self
            .level
            .as_ref()
            .map(Level::track)
            .ok_or_else(|| GameError::illegal("cannot respawn without a level"))?;
        let index = self
            .graveyard
            .iter()
            .position(|e| e.id == id)
            .ok_or(GameError::UnknownEntity(id))?;
        let mut entity = self.graveyard.remove(index);
        entity.on_respawn(track);
        log::info!("Respawned {:?}", id);
        self.entities.push(entity);
        Ok(())
    }

    pub fn set_mode(&mut self, mode: LevelMode) {
        if let Some(level) = self.level.as_mut() {
            level.set_mode(mode, &mut self.entities);
        }
    }

    pub fn render_snapshot(&self) -> Vec<RenderInstance> {
        self.entities.iter().filter_map(Entity::render_instance).collect()
    }

    pub fn update(&mut self, delta: f32, ctx: &mut SimContext<'_>) {
        self.frames += 1;
        self.ensure_level(ctx);

        if let Some(level) = self.level.as_mut() {
            if level.mode() == LevelMode::Reset && level.is_reset_complete() {
                level.set_mode(LevelMode::Standby, &mut self.entities);
            }
        }

        self.update_entities(delta, ctx);
        self.collisions.run(&mut self.entities, ctx);

        if let Some(level) = self.level.as_mut() {
            let added = level.update(delta, &mut self.entities, &mut self.ids);
            self.entities.extend(added);
        }
    }

    fn ensure_level(&mut self, ctx: &mut SimContext<'_>) {
        if self.level.as_ref().is_some_and(|l| !l.is_done(&self.entities)) {
            return;
        }
        if let Some(mut old) = self.level.take() {
            old.level_end(&mut self.entities);
            ctx.report(GameEvent::LevelsCompleted, 1);
            log::info!("Level {} complete", old.number());
        }
        let status = self.player_status();
        let mut level = self.getter.next_level(status.as_ref(), &mut self.ids);
        let roster = level.start();
        self.entities.extend(roster);
        // Players pick up the new track from wherever they are
        for player in self.entities.iter_mut().filter(|e| e.is_player()) {
            player.movement = MoveComponent::Idle;
        }
        self.level = Some(level);
    }

    fn update_entities(&mut self, delta: f32, ctx: &mut SimContext<'_>) {
        let Some(level) = self.level.as_ref() else {
            return;
        };
        let (mode, track, bounds) = (level.mode(), level.track(), self.bounds);
        let mut spawns = Vec::new();
        let mut i = 0;
        while i < self.entities.len() {
            let (before, rest) = self.entities.split_at_mut(i);
            let Some((current, after)) = rest.split_first_mut() else {
                break;
            };
            // Marked by last frame's collisions or level: removed without another update
            if !current.should_remove() {
                let mut entity_ctx = EntityContext::new(
                    mode,
                    track,
                    bounds,
                    Others::new(before, after),
                    &mut self.ids,
                    &mut spawns,
                    ctx,
                );
                current.update(delta, &mut entity_ctx);
            }

            let spawned = spawns.len();
            if current.should_remove() {
                let removed = self.entities.remove(i);
                self.entities.splice(i..i, spawns.drain(..));
                i += spawned;
                retire(&mut self.entities, &mut self.graveyard, removed);
            } else {
                self.entities.splice(i + 1..i + 1, spawns.drain(..));
                i += 1 + spawned;
            }
        }
    }
}

/// An entity has left the collection: unlink it and keep it if it can come back
fn retire(entities: &mut [Entity], graveyard: &mut Vec<Entity>, mut entity: Entity) {
    chain::unlink_removed(entities, &mut entity);
    log::trace!("Removed {:?}", entity.id);
    if entity.can_respawn {
        graveyard.push(entity);
    }
}
