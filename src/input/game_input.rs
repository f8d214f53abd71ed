//! A complete bundle of abstract game controls built from one source

use super::arena::InputArena;
use super::joystick::{JoystickId, JoystickValue};
use super::node::{ButtonState, NodeId};
use super::option::OptionId;
use super::part::PartId;
use super::rumble::RumbleId;

/// The abstract controls every input source provides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameControls {
    pub main_joystick: JoystickId,
    /// Positive turns counter-clockwise
    pub rotate_axis: NodeId,
    pub fire: NodeId,
    pub slow: NodeId,
    pub activate_powerup: NodeId,
    pub start: NodeId,
    pub pause: NodeId,
    pub back: NodeId,
    /// Menu navigation
    pub selector: JoystickId,
    pub enter: NodeId,
    pub rumble: RumbleId,
    /// Set when single shots should rumble
    pub rumble_on_shot: Option<NodeId>,
}

impl GameControls {
    fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        [
            self.rotate_axis,
            self.fire,
            self.slow,
            self.activate_powerup,
            self.start,
            self.pause,
            self.back,
            self.enter,
        ]
        .into_iter()
        .chain(self.rumble_on_shot)
    }
}

/// Everything the simulation reads from the active input for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlSnapshot {
    pub connected: bool,
    pub main_joystick: JoystickValue,
    pub rotate_axis: f32,
    pub fire: ButtonState,
    pub slow: ButtonState,
    pub activate_powerup: ButtonState,
    pub start: ButtonState,
    pub pause: ButtonState,
    pub back: ButtonState,
    pub selector: JoystickValue,
    pub enter: ButtonState,
    pub rumble_on_shot: bool,
}

#[derive(Debug, Clone)]
pub struct UsableGameInput {
    name: String,
    part: PartId,
    controls: GameControls,
    options: Vec<OptionId>,
}

impl UsableGameInput {
    /// `part` is the root whose connectivity decides whether this input is usable
    pub fn new(name: impl Into<String>, part: PartId, controls: GameControls, options: Vec<OptionId>) -> Self {
        Self {
            name: name.into(),
            part,
            controls,
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn part(&self) -> PartId {
        self.part
    }

    pub fn controls(&self) -> &GameControls {
        &self.controls
    }

    /// Options this input wired into its nodes, for menus and persistence
    pub fn options(&self) -> &[OptionId] {
        &self.options
    }

    pub fn is_connected(&self, arena: &InputArena) -> bool {
        arena.is_part_connected(self.part)
    }

    /// Recompute every control for the current frame
    pub fn update(&self, arena: &mut InputArena) {
        arena.update_part(self.part);
        // Dummy controls live outside the part tree
        arena.update_joystick(self.controls.main_joystick);
        arena.update_joystick(self.controls.selector);
        for node in self.controls.nodes() {
            arena.update_node(node);
        }
    }

    pub fn snapshot(&self, arena: &InputArena) -> ControlSnapshot {
        let c = &self.controls;
        ControlSnapshot {
            connected: self.is_connected(arena),
            main_joystick: arena.joystick_value(c.main_joystick),
            rotate_axis: arena.value(c.rotate_axis),
            fire: arena.button(c.fire),
            slow: arena.button(c.slow),
            activate_powerup: arena.button(c.activate_powerup),
            start: arena.button(c.start),
            pause: arena.button(c.pause),
            back: arena.button(c.back),
            selector: arena.joystick_value(c.selector),
            enter: arena.button(c.enter),
            rumble_on_shot: c.rumble_on_shot.is_some_and(|n| arena.is_down(n)),
        }
    }
}
