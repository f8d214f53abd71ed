//! Levels and the level mode state machine
//!
//! A level owns its track, the entities it adds at start, and a queue of
//! level functions polled once per frame. Mode transitions are driven from
//! outside (world and game loop); the level keeps the mode clock and tells
//! every function about each change.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId, IdAllocator};
use super::level_function::LevelFunction;
use super::track::Track;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LevelMode {
    /// Gameplay active
    #[default]
    Normal,
    /// Enemies return to their starts
    Reset,
    /// Everything holds still until the player is back
    Standby,
}

/// What level functions see of the world during one update
pub struct LevelFrame<'a> {
    pub mode: LevelMode,
    pub mode_time_ms: f64,
    pub track: &'a Track,
    entities: &'a mut [Entity],
    ids: &'a mut IdAllocator,
    to_add: Vec<Entity>,
}

impl<'a> LevelFrame<'a> {
    pub fn new(
        mode: LevelMode,
        mode_time_ms: f64,
        track: &'a Track,
        entities: &'a mut [Entity],
        ids: &'a mut IdAllocator,
    ) -> Self {
        Self {
            mode,
            mode_time_ms,
            track,
            entities,
            ids,
            to_add: Vec::new(),
        }
    }

    pub fn next_id(&mut self) -> EntityId {
        self.ids.next_id()
    }

    /// Queued, then added to the world once every function has run
    pub fn add_entity(&mut self, entity: Entity) {
        self.to_add.push(entity);
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().chain(self.to_add.iter()).find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().chain(self.to_add.iter_mut()).find(|e| e.id == id)
    }

    pub(crate) fn into_added(self) -> Vec<Entity> {
        self.to_add
    }
}

#[derive(Debug)]
pub struct Level {
    number: u32,
    track: Track,
    mode: LevelMode,
    mode_time_ms: f64,
    functions: Vec<Box<dyn LevelFunction>>,
    /// Added to the world when the level starts
    roster: Vec<Entity>,
    /// Every entity this level added
    owned: Vec<EntityId>,
    started: bool,
    reset_complete: bool,
}

impl Level {
    pub fn new(number: u32, track: Track) -> Self {
        Self {
            number,
            track,
            mode: LevelMode::Normal,
            mode_time_ms: 0.0,
            functions: Vec::new(),
            roster: Vec::new(),
            owned: Vec::new(),
            started: false,
            reset_complete: false,
        }
    }

    pub fn add_to_roster(&mut self, entity: Entity) {
        self.roster.push(entity);
    }

    pub fn roster_mut(&mut self) -> &mut Vec<Entity> {
        &mut self.roster
    }

    pub fn add_function(&mut self, function: Box<dyn LevelFunction>) {
        self.functions.push(function);
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn mode(&self) -> LevelMode {
        self.mode
    }

    /// Milliseconds of simulation time since the last mode change
    pub fn mode_time_ms(&self) -> f64 {
        self.mode_time_ms
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Set during RESET once nothing is still heading back to its start
    pub fn is_reset_complete(&self) -> bool {
        self.reset_complete
    }

    /// Hand over the roster for adding to the world
    pub fn start(&mut self) -> Vec<Entity> {
        self.started = true;
        let roster = std::mem::take(&mut self.roster);
        self.owned.extend(roster.iter().map(|e| e.id));
        log::info!(
            "Level {} started on {} with {} entities",
            self.number,
            self.track.name(),
            roster.len()
        );
        roster
    }

    /// Done once started and nothing that blocks the level end is left
    pub fn is_done(&self, entities: &[Entity]) -> bool {
        self.started && !entities.iter().any(|e| e.blocks_level_end)
    }

    pub fn set_mode(&mut self, mode: LevelMode, entities: &mut [Entity]) {
        if mode == self.mode {
            return;
        }
        let previous = self.mode;
        log::debug!(
            "Level {} mode {:?} -> {:?} after {:.0}ms",
            self.number,
            previous,
            mode,
            self.mode_time_ms
        );
        self.mode = mode;
        self.mode_time_ms = 0.0;
        self.reset_complete = false;
        for function in &mut self.functions {
            function.on_mode_change(mode, previous, entities);
        }
    }

    /// Advance the mode clock and poll every function. Returns entities to add to the world.
    pub fn update(&mut self, delta: f32, entities: &mut [Entity], ids: &mut IdAllocator) -> Vec<Entity> {
        self.mode_time_ms += f64::from(delta) * 1000.0;

        let mut frame = LevelFrame::new(self.mode, self.mode_time_ms, &self.track, entities, ids);
        let mut queued: Vec<Box<dyn LevelFunction>> = Vec::new();
        self.functions.retain_mut(|function| !function.update(delta, &mut frame, &mut queued));
        let added = frame.into_added();
        if !queued.is_empty() {
            log::trace!("Level {} queued {} functions", self.number, queued.len());
            self.functions.extend(queued);
        }
        self.owned.extend(added.iter().map(|e| e.id));

        if self.mode == LevelMode::Reset {
            self.reset_complete = !entities.iter().any(Entity::is_going_to_start);
        }
        added
    }

    /// Called once when the level is replaced. Marks what it added for removal.
    pub fn level_end(&mut self, entities: &mut [Entity]) {
        for function in &mut self.functions {
            function.level_end(entities);
        }
        self.functions.clear();
        for entity in entities.iter_mut().filter(|e| self.owned.contains(&e.id)) {
            entity.set_to_remove();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level_function::PowerupFunction;
    use crate::sim::powerup::PowerupKind;
    use glam::Vec2;

    fn level_with_shark(ids: &mut IdAllocator) -> Level {
        let mut level = Level::new(1, Track::circle());
        level.add_to_roster(Entity::shark(ids.next_id(), Vec2::new(1.0, 1.0), 45.0, 0.0));
        level
    }

    #[test]
    fn test_done_only_after_start() {
        let mut ids = IdAllocator::default();
        let mut level = level_with_shark(&mut ids);
        assert!(!level.is_done(&[]));
        let mut entities = level.start();
        assert!(!level.is_done(&entities));
        entities.clear();
        assert!(level.is_done(&entities));
    }

    #[test]
    fn test_mode_change_resets_clock() {
        let mut ids = IdAllocator::default();
        let mut level = level_with_shark(&mut ids);
        let mut entities = level.start();
        level.update(0.5, &mut entities, &mut ids);
        assert_eq!(level.mode_time_ms(), 500.0);
        level.set_mode(LevelMode::Normal, &mut entities);
        assert_eq!(level.mode_time_ms(), 500.0);
        level.set_mode(LevelMode::Reset, &mut entities);
        assert_eq!(level.mode_time_ms(), 0.0);
    }

    #[test]
    fn test_reset_completes_when_home() {
        let mut ids = IdAllocator::default();
        let mut level = level_with_shark(&mut ids);
        let mut entities = level.start();
        entities[0].body.location = Vec2::new(4.0, 4.0);
        level.set_mode(LevelMode::Reset, &mut entities);
        level.update(0.1, &mut entities, &mut ids);
        assert!(!level.is_reset_complete());
        entities[0].body.location = Vec2::new(1.0, 1.0);
        level.update(0.1, &mut entities, &mut ids);
        assert!(level.is_reset_complete());
    }

    #[test]
    fn test_level_end_marks_owned_entities() {
        let mut ids = IdAllocator::default();
        let mut level = level_with_shark(&mut ids);
        let mut entities = level.start();
        entities.push(Entity::player(ids.next_id(), 3, Vec2::ZERO));
        level.add_function(Box::new(PowerupFunction::new(
            0.0,
            10_000.0,
            PowerupKind::Fruit { points: 100 },
            Vec2::ZERO,
        )));
        level.update(0.1, &mut entities, &mut ids);
        level.level_end(&mut entities);
        assert!(entities[0].should_remove());
        assert!(!entities[1].should_remove());
        assert_eq!(level.function_count(), 0);
    }
}
