//! Per-frame polling of every input source
//!
//! The manager owns the arena, every `UsableGameInput` and the switchable
//! selectors over them. All inputs are updated every frame whether selected or
//! not, so a candidate that becomes active has correct pressed/released edges.

use super::arena::InputArena;
use super::game_input::{ControlSnapshot, UsableGameInput};
use super::rumble::{RumbleRequest, RumbleTarget};
use super::switchable::{InputId, SwitchableGameInput};
use crate::error::{GameError, Result};
use crate::settings::ControlConfig;

/// Handle to a switchable selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwitchId(pub(crate) usize);

#[derive(Debug, Clone, Default)]
pub struct ControllerManager {
    arena: InputArena,
    inputs: Vec<UsableGameInput>,
    switchables: Vec<SwitchableGameInput>,
}

impl ControllerManager {
    pub fn new(config: ControlConfig) -> Self {
        Self {
            arena: InputArena::new(config),
            inputs: Vec::new(),
            switchables: Vec::new(),
        }
    }

    pub fn arena(&self) -> &InputArena {
        &self.arena
    }

    /// Builders and the platform write through here
    pub fn arena_mut(&mut self) -> &mut InputArena {
        &mut self.arena
    }

    pub fn add_input(&mut self, input: UsableGameInput) -> InputId {
        log::debug!("Registered input '{}'", input.name());
        self.inputs.push(input);
        InputId(self.inputs.len() - 1)
    }

    /// Build an input with `build` against this manager's arena and register it
    pub fn build_input(
        &mut self,
        build: impl FnOnce(&mut InputArena) -> Result<UsableGameInput>,
    ) -> Result<InputId> {
        let input = build(&mut self.arena)?;
        Ok(self.add_input(input))
    }

    pub fn add_switchable(&mut self, name: impl Into<String>, candidates: Vec<InputId>) -> Result<SwitchId> {
        if let Some(bad) = candidates.iter().find(|c| c.0 >= self.inputs.len()) {
            return Err(GameError::illegal(format!("unknown input {}", bad.0)));
        }
        self.switchables.push(SwitchableGameInput::new(name, candidates)?);
        Ok(SwitchId(self.switchables.len() - 1))
    }

    pub fn input(&self, id: InputId) -> &UsableGameInput {
        &self.inputs[id.0]
    }

    pub fn inputs(&self) -> impl Iterator<Item = (InputId, &UsableGameInput)> {
        self.inputs.iter().enumerate().map(|(i, input)| (InputId(i), input))
    }

    pub fn switchable(&self, id: SwitchId) -> &SwitchableGameInput {
        &self.switchables[id.0]
    }

    pub fn current(&self, id: SwitchId) -> &UsableGameInput {
        self.input(self.switchables[id.0].current())
    }

    /// Poll every input for a new frame, then re-evaluate each selector
    pub fn update(&mut self) {
        self.arena.begin_frame();
        for input in &self.inputs {
            input.update(&mut self.arena);
        }

        let arena = &self.arena;
        let inputs = &self.inputs;
        for switchable in &mut self.switchables {
            if let Some((from, to)) = switchable.select(|id| inputs[id.0].is_connected(arena)) {
                log::info!(
                    "{}: switched input from '{}' to '{}'",
                    switchable.name(),
                    inputs[from.0].name(),
                    inputs[to.0].name()
                );
            }
        }
    }

    pub fn snapshot(&self, id: SwitchId) -> ControlSnapshot {
        self.current(id).snapshot(&self.arena)
    }

    pub fn input_snapshot(&self, id: InputId) -> ControlSnapshot {
        self.input(id).snapshot(&self.arena)
    }

    /// Queue rumble on the selected input (or the last one if nothing is connected)
    pub fn rumble(&mut self, id: SwitchId, request: RumbleRequest) {
        let rumble = self.current(id).controls().rumble;
        let now = self.arena.raw().time_ms;
        self.arena.rumble_mut(rumble).request(request, now);
    }

    /// Hand every pending rumble request to the platform
    pub fn drain_rumble(&mut self) -> Vec<(RumbleTarget, RumbleRequest)> {
        let mut drained = Vec::new();
        for input in &self.inputs {
            let id = input.controls().rumble;
            let rumble = self.arena.rumble_mut(id);
            if let Some(request) = rumble.take_pending() {
                if rumble.target != RumbleTarget::Disconnected {
                    drained.push((rumble.target, request));
                }
            }
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::builders::{keyboard_mouse, standard_gamepad};
    use crate::input::raw::{GamepadState, Key, RawInputState};

    fn manager_with_pad() -> (ControllerManager, InputId, InputId, SwitchId) {
        let mut manager = ControllerManager::default();
        *manager.arena_mut().raw_mut() = RawInputState::desktop();
        let mut pad = GamepadState::new("Xbox Controller", 6, 12);
        pad.rumble_capable = true;
        manager.arena_mut().raw_mut().gamepads.push(pad);
        let gamepad = manager.build_input(|arena| standard_gamepad(arena, 0)).unwrap();
        let keyboard = manager.build_input(keyboard_mouse).unwrap();
        let switch = manager.add_switchable("player", vec![gamepad, keyboard]).unwrap();
        (manager, gamepad, keyboard, switch)
    }

    #[test]
    fn test_switches_on_unplug_and_back() {
        let (mut manager, gamepad, keyboard, switch) = manager_with_pad();
        manager.update();
        assert_eq!(manager.switchable(switch).current(), gamepad);

        manager.arena_mut().raw_mut().gamepads[0].connected = false;
        manager.update();
        assert_eq!(manager.switchable(switch).current(), keyboard);

        // Gamepad back: keyboard still connected, so no flip
        manager.arena_mut().raw_mut().gamepads[0].connected = true;
        manager.update();
        assert_eq!(manager.switchable(switch).current(), keyboard);
    }

    #[test]
    fn test_unselected_inputs_keep_edges() {
        let (mut manager, _, keyboard, switch) = manager_with_pad();
        manager.update();
        manager.arena_mut().raw_mut().set_key(Key::Space, true);
        manager.update();
        assert!(manager.input_snapshot(keyboard).fire.pressed);
        assert!(!manager.snapshot(switch).fire.down);
    }

    #[test]
    fn test_rumble_routed_to_selection() {
        let (mut manager, _, _, switch) = manager_with_pad();
        manager.update();
        manager.rumble(
            switch,
            RumbleRequest {
                duration_ms: 200,
                intensity: 0.5,
            },
        );
        let drained = manager.drain_rumble();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].0, RumbleTarget::Gamepad(0));
        assert!(manager.drain_rumble().is_empty());
    }

    #[test]
    fn test_unknown_candidate_rejected() {
        let mut manager = ControllerManager::default();
        assert!(manager.add_switchable("player", vec![InputId(0)]).is_err());
    }
}
