//! Context objects passed into every update call
//!
//! `SimContext` lives for one host frame and carries configuration, the
//! active controls and the event sink. `EntityContext` is built per entity
//! update and adds the read-only view of every other entity plus a spawn
//! buffer; entities never touch the world's collection directly.

use super::collision::Rect;
use super::entity::{Entity, EntityId, IdAllocator};
use super::level::LevelMode;
use super::track::Track;
use crate::achievements::{EventSink, GameEvent};
use crate::input::{ControlSnapshot, RumbleRequest};
use crate::settings::SimConfig;

pub struct SimContext<'a> {
    pub config: &'a SimConfig,
    pub controls: &'a ControlSnapshot,
    events: &'a mut dyn EventSink,
    rumble: Vec<RumbleRequest>,
}

impl<'a> SimContext<'a> {
    pub fn new(config: &'a SimConfig, controls: &'a ControlSnapshot, events: &'a mut dyn EventSink) -> Self {
        Self {
            config,
            controls,
            events,
            rumble: Vec::new(),
        }
    }

    pub fn report(&mut self, event: GameEvent, amount: u32) {
        log::debug!("Event {} +{}", event.id(), amount);
        self.events.report(event, amount);
    }

    pub fn rumble(&mut self, request: RumbleRequest) {
        self.rumble.push(request);
    }

    /// Rumble requested since the last call
    pub fn take_rumble(&mut self) -> Vec<RumbleRequest> {
        std::mem::take(&mut self.rumble)
    }
}

/// Every entity except the one being updated
#[derive(Clone, Copy)]
pub struct Others<'a> {
    before: &'a [Entity],
    after: &'a [Entity],
}

impl<'a> Others<'a> {
    pub fn new(before: &'a [Entity], after: &'a [Entity]) -> Self {
        Self { before, after }
    }

    pub fn iter(self) -> impl Iterator<Item = &'a Entity> {
        self.before.iter().chain(self.after.iter())
    }

    pub fn get(self, id: EntityId) -> Option<&'a Entity> {
        self.iter().find(|e| e.id == id)
    }

    pub fn player(self) -> Option<&'a Entity> {
        self.iter().find(|e| e.is_player() && !e.should_remove())
    }
}

pub struct EntityContext<'w, 's> {
    pub mode: LevelMode,
    pub track: &'w Track,
    pub bounds: Rect,
    pub others: Others<'w>,
    ids: &'w mut IdAllocator,
    spawns: &'w mut Vec<Entity>,
    pub sim: &'w mut SimContext<'s>,
}

impl<'w, 's> EntityContext<'w, 's> {
    pub fn new(
        mode: LevelMode,
        track: &'w Track,
        bounds: Rect,
        others: Others<'w>,
        ids: &'w mut IdAllocator,
        spawns: &'w mut Vec<Entity>,
        sim: &'w mut SimContext<'s>,
    ) -> Self {
        Self {
            mode,
            track,
            bounds,
            others,
            ids,
            spawns,
            sim,
        }
    }

    pub fn next_id(&mut self) -> EntityId {
        self.ids.next_id()
    }

    /// Queue an entity. The world splices it in right after the entity being updated.
    pub fn add_entity(&mut self, entity: Entity) {
        self.spawns.push(entity);
    }
}
