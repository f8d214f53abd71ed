//! Level functions: small behaviors polled once per frame for the life of a level

use glam::Vec2;

use super::entity::{Entity, EntityId};
use super::level::{LevelFrame, LevelMode};
use super::powerup::PowerupKind;

pub trait LevelFunction: std::fmt::Debug {
    /// Returns true once finished; the function is then dropped.
    ///
    /// Functions pushed to `queue` join the level after this frame's pass.
    fn update(&mut self, delta: f32, frame: &mut LevelFrame<'_>, queue: &mut Vec<Box<dyn LevelFunction>>) -> bool;

    /// The level is ending while this function is still active
    fn level_end(&mut self, _entities: &mut [Entity]) {}

    fn on_mode_change(&mut self, _mode: LevelMode, _previous: LevelMode, _entities: &mut [Entity]) {}
}

/// Puts a power-up on the field after `add_at_ms` of NORMAL play and takes it away `stay_ms` later
#[derive(Debug, Clone)]
pub struct PowerupFunction {
    add_at_ms: f64,
    remove_at_ms: f64,
    kind: PowerupKind,
    location: Vec2,
    powerup: Option<EntityId>,
}

impl PowerupFunction {
    pub const DEFAULT_ADD_AT_MS: f64 = 15_000.0;
    pub const DEFAULT_STAY_MS: f64 = 10_000.0;

    pub fn new(add_at_ms: f64, stay_ms: f64, kind: PowerupKind, location: Vec2) -> Self {
        Self {
            add_at_ms,
            remove_at_ms: add_at_ms + stay_ms,
            kind,
            location,
            powerup: None,
        }
    }

    pub fn powerup(&self) -> Option<EntityId> {
        self.powerup
    }
}

impl LevelFunction for PowerupFunction {
    fn update(&mut self, _delta: f32, frame: &mut LevelFrame<'_>, _queue: &mut Vec<Box<dyn LevelFunction>>) -> bool {
        let mode_time = frame.mode_time_ms;
        if let Some(id) = self.powerup {
            return match frame.entity_mut(id) {
                // Collected or cleaned up
                None => true,
                Some(powerup) if powerup.should_remove() => true,
                Some(powerup) => {
                    if mode_time >= self.remove_at_ms {
                        powerup.set_to_remove();
                        log::debug!("Power-up {:?} expired", id);
                        true
                    } else {
                        false
                    }
                }
            };
        }

        if frame.mode == LevelMode::Normal && mode_time > self.add_at_ms {
            let id = frame.next_id();
            frame.add_entity(Entity::powerup(id, self.location, self.kind));
            self.powerup = Some(id);
            log::debug!("Power-up {:?} ({:?}) added", id, self.kind);
        }
        false
    }

    fn on_mode_change(&mut self, _mode: LevelMode, _previous: LevelMode, entities: &mut [Entity]) {
        if let Some(id) = self.powerup {
            if let Some(powerup) = entities.iter_mut().find(|e| e.id == id) {
                powerup.set_to_remove();
            }
        }
    }
}

/// Waits `delay_ms` of level time, then hands `function` to the level
#[derive(Debug)]
pub struct Delayed {
    remaining_ms: f64,
    function: Option<Box<dyn LevelFunction>>,
}

impl Delayed {
    pub fn new(delay_ms: f64, function: Box<dyn LevelFunction>) -> Self {
        Self {
            remaining_ms: delay_ms,
            function: Some(function),
        }
    }
}

impl LevelFunction for Delayed {
    fn update(&mut self, delta: f32, _frame: &mut LevelFrame<'_>, queue: &mut Vec<Box<dyn LevelFunction>>) -> bool {
        self.remaining_ms -= f64::from(delta) * 1000.0;
        if self.remaining_ms > 0.0 {
            return false;
        }
        queue.extend(self.function.take());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::IdAllocator;
    use crate::sim::track::Track;

    fn fruit() -> PowerupFunction {
        PowerupFunction::new(1000.0, 500.0, PowerupKind::Fruit { points: 300 }, Vec2::ZERO)
    }

    fn poll(function: &mut dyn LevelFunction, mode: LevelMode, mode_time_ms: f64, entities: &mut Vec<Entity>) -> bool {
        let track = Track::circle();
        let mut ids = IdAllocator::default();
        let mut queue = Vec::new();
        let mut frame = LevelFrame::new(mode, mode_time_ms, &track, entities, &mut ids);
        let done = function.update(0.1, &mut frame, &mut queue);
        let added = frame.into_added();
        entities.extend(added);
        done
    }

    #[test]
    fn test_powerup_appears_then_expires() {
        let mut function = fruit();
        let mut entities = Vec::new();
        assert!(!poll(&mut function, LevelMode::Normal, 900.0, &mut entities));
        assert!(entities.is_empty());
        // Never added outside NORMAL
        assert!(!poll(&mut function, LevelMode::Standby, 1100.0, &mut entities));
        assert!(entities.is_empty());

        assert!(!poll(&mut function, LevelMode::Normal, 1100.0, &mut entities));
        assert_eq!(entities.len(), 1);
        assert_eq!(function.powerup(), Some(entities[0].id));

        assert!(!poll(&mut function, LevelMode::Normal, 1400.0, &mut entities));
        assert!(poll(&mut function, LevelMode::Normal, 1500.0, &mut entities));
        assert!(entities[0].should_remove());
    }

    #[test]
    fn test_mode_change_removes_powerup() {
        let mut function = fruit();
        let mut entities = Vec::new();
        poll(&mut function, LevelMode::Normal, 1100.0, &mut entities);
        function.on_mode_change(LevelMode::Reset, LevelMode::Normal, &mut entities);
        assert!(entities[0].should_remove());
        assert!(poll(&mut function, LevelMode::Reset, 0.0, &mut entities));
    }

    #[test]
    fn test_delayed_enqueues_once() {
        let track = Track::circle();
        let mut ids = IdAllocator::default();
        let mut entities: Vec<Entity> = Vec::new();
        let mut delayed = Delayed::new(150.0, Box::new(fruit()));
        let mut queue = Vec::new();
        let mut frame = LevelFrame::new(LevelMode::Normal, 0.0, &track, &mut entities, &mut ids);
        assert!(!delayed.update(0.1, &mut frame, &mut queue));
        assert!(queue.is_empty());
        assert!(delayed.update(0.1, &mut frame, &mut queue));
        assert_eq!(queue.len(), 1);
    }
}
