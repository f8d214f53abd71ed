//! The input arena: owner of every node, joystick, part, option and rumble
//!
//! Everything in the input graph lives here and is referenced by handle.
//! Children are always created before their parents, so the graph built
//! through this API is acyclic.
//!
//! Per frame the owner calls `begin_frame()` and then `update_*` on the roots.
//! Updates run post-order and are stamped with the frame number, so a node
//! shared by several parents is computed exactly once per frame and its
//! previous-frame state (for pressed/released edges) is never clobbered.
//!
//! Connectivity is never cached: every `is_*_connected` call reads the current
//! `RawInputState`, so unplugging a device is visible without an update.

use super::joystick::{Joystick, JoystickId, JoystickShape, JoystickValue};
use super::node::{ButtonState, GateRule, InputNode, NodeId, NodeKind, RawSource, TouchRegion};
use super::option::{ConfigurableOption, OptionId};
use super::part::{ConnectionPolicy, ControllerPart, PartChild, PartId};
use super::raw::{RawInputState, ScreenArea};
use super::rumble::{Rumble, RumbleId, RumbleTarget};
use crate::consts::MAX_TOUCH_POINTERS;
use crate::error::{GameError, Result};
use crate::min_change;
use crate::settings::ControlConfig;

/// Pixels of pointer movement per unit of pointer-delta axis
pub const POINTER_DELTA_UNIT_PX: f32 = 20.0;

#[derive(Debug, Clone)]
pub struct InputArena {
    nodes: Vec<InputNode>,
    joysticks: Vec<Joystick>,
    parts: Vec<ControllerPart>,
    options: Vec<ConfigurableOption>,
    rumbles: Vec<Rumble>,
    raw: RawInputState,
    config: ControlConfig,
    frame: u64,
    debug_change_in_parent: bool,
}

impl Default for InputArena {
    fn default() -> Self {
        Self::new(ControlConfig::default())
    }
}

impl InputArena {
    pub fn new(config: ControlConfig) -> Self {
        Self {
            nodes: Vec::new(),
            joysticks: Vec::new(),
            parts: Vec::new(),
            options: Vec::new(),
            rumbles: Vec::new(),
            raw: RawInputState::default(),
            config,
            // Nodes start stamped 0, so the first frame is 1
            frame: 1,
            debug_change_in_parent: false,
        }
    }

    pub fn set_debug_change_in_parent(&mut self, enabled: bool) {
        self.debug_change_in_parent = enabled;
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    pub fn raw(&self) -> &RawInputState {
        &self.raw
    }

    /// The platform writes device state here before each frame
    pub fn raw_mut(&mut self) -> &mut RawInputState {
        &mut self.raw
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Start a new frame. Cached values stay readable until the next update.
    pub fn begin_frame(&mut self) {
        self.frame += 1;
    }

    // === Options ===

    pub fn add_option(&mut self, option: ConfigurableOption) -> OptionId {
        self.options.push(option);
        OptionId(self.options.len() - 1)
    }

    pub fn option(&self, id: OptionId) -> &ConfigurableOption {
        &self.options[id.0]
    }

    pub fn option_mut(&mut self, id: OptionId) -> &mut ConfigurableOption {
        &mut self.options[id.0]
    }

    pub fn find_option(&self, key: &str) -> Option<OptionId> {
        self.options.iter().position(|o| o.key == key).map(OptionId)
    }

    fn option_set(&self, id: Option<OptionId>) -> bool {
        id.is_some_and(|id| self.options[id.0].bool_value())
    }

    // === Construction ===

    pub fn add_node(&mut self, kind: NodeKind) -> Result<NodeId> {
        self.validate_kind(&kind)?;
        let analog = self.kind_is_analog(&kind);
        self.nodes.push(InputNode::new(kind, analog));
        Ok(NodeId(self.nodes.len() - 1))
    }

    pub fn add_source(&mut self, source: RawSource) -> Result<NodeId> {
        self.add_node(NodeKind::Source(source))
    }

    pub fn add_joystick(&mut self, x: NodeId, y: NodeId, shape: JoystickShape) -> Result<JoystickId> {
        if x.0 >= self.nodes.len() || y.0 >= self.nodes.len() {
            return Err(GameError::illegal("joystick axis does not exist"));
        }
        self.joysticks.push(Joystick { x, y, shape });
        Ok(JoystickId(self.joysticks.len() - 1))
    }

    pub fn add_rumble(&mut self, target: RumbleTarget) -> RumbleId {
        self.rumbles.push(Rumble::new(target));
        RumbleId(self.rumbles.len() - 1)
    }

    pub fn add_part(&mut self, name: impl Into<String>, policy: ConnectionPolicy) -> PartId {
        self.parts.push(ControllerPart::new(name, policy));
        PartId(self.parts.len() - 1)
    }

    /// Give `part` ownership of `child`. A part can only have one parent.
    pub fn add_child(&mut self, part: PartId, child: PartChild) -> Result<()> {
        if part.0 >= self.parts.len() || !self.child_exists(child) {
            return Err(GameError::illegal("controller part child does not exist"));
        }
        if let PartChild::Part(owned) = child {
            if let Some(existing) = self.parts[owned.0].parent {
                if self.debug_change_in_parent {
                    log::warn!(
                        "Part '{}' is already owned by '{}', refusing to move it to '{}'",
                        self.parts[owned.0].name,
                        self.parts[existing.0].name,
                        self.parts[part.0].name
                    );
                }
                return Err(GameError::illegal("controller part already has a parent"));
            }
            // `owned` must not be `part` or one of its ancestors
            let mut cursor = Some(part);
            while let Some(p) = cursor {
                if p == owned {
                    return Err(GameError::illegal("controller part cannot own its ancestor"));
                }
                cursor = self.parts[p.0].parent;
            }
            self.parts[owned.0].parent = Some(part);
        }
        self.parts[part.0].children.push(child);
        Ok(())
    }

    pub fn add_children(&mut self, part: PartId, children: impl IntoIterator<Item = PartChild>) -> Result<()> {
        for child in children {
            self.add_child(part, child)?;
        }
        Ok(())
    }

    /// `part` is only connected while `target` is
    pub fn set_relies_on(&mut self, part: PartId, target: PartId) -> Result<()> {
        if part.0 >= self.parts.len() || target.0 >= self.parts.len() {
            return Err(GameError::illegal("relies-on part does not exist"));
        }
        let mut cursor = Some(target);
        while let Some(p) = cursor {
            if p == part {
                return Err(GameError::illegal("relies-on chain would loop"));
            }
            cursor = self.parts[p.0].relies_on;
        }
        self.parts[part.0].relies_on = Some(target);
        Ok(())
    }

    fn child_exists(&self, child: PartChild) -> bool {
        match child {
            PartChild::Node(id) => id.0 < self.nodes.len(),
            PartChild::Joystick(id) => id.0 < self.joysticks.len(),
            PartChild::Rumble(id) => id.0 < self.rumbles.len(),
            PartChild::Part(id) => id.0 < self.parts.len(),
        }
    }

    fn validate_kind(&self, kind: &NodeKind) -> Result<()> {
        let mut i = 0;
        while let Some(child) = kind.child(i) {
            if child.0 >= self.nodes.len() {
                return Err(GameError::illegal(format!("child node {} does not exist", child.0)));
            }
            i += 1;
        }
        if let NodeKind::Follow { joystick, .. } = kind {
            if joystick.0 >= self.joysticks.len() {
                return Err(GameError::illegal("followed joystick does not exist"));
            }
        }
        if let NodeKind::OptionFlag {
            connected_with: Some(rumble),
            ..
        } = kind
        {
            if rumble.0 >= self.rumbles.len() {
                return Err(GameError::illegal("rumble does not exist"));
            }
        }
        for option in referenced_options(kind).into_iter().flatten() {
            if option.0 >= self.options.len() {
                return Err(GameError::illegal(format!("option {} does not exist", option.0)));
            }
        }
        Ok(())
    }

    fn kind_is_analog(&self, kind: &NodeKind) -> bool {
        let analog = |id: &NodeId| self.nodes[id.0].analog;
        match kind {
            NodeKind::Source(source) => match source {
                RawSource::GamepadAxis { .. } | RawSource::Tilt { .. } | RawSource::PointerDelta { .. } => true,
                RawSource::Constant { analog, .. } => *analog,
                _ => false,
            },
            NodeKind::Highest(children) | NodeKind::Lowest(children) => children.iter().any(analog),
            NodeKind::Scaled { .. } | NodeKind::Follow { .. } => true,
            NodeKind::Choose {
                if_true, if_false, ..
            } => analog(if_true) || analog(if_false),
            NodeKind::Difference { positive, negative } => analog(positive) || analog(negative),
            NodeKind::Gate { .. } | NodeKind::Pattern { .. } | NodeKind::OptionFlag { .. } => false,
        }
    }

    // === Per-frame update ===

    /// Update every node reachable from `part`
    pub fn update_part(&mut self, part: PartId) {
        let mut i = 0;
        while let Some(child) = self.parts[part.0].children.get(i).copied() {
            match child {
                PartChild::Node(id) => self.update_node(id),
                PartChild::Joystick(id) => self.update_joystick(id),
                PartChild::Part(id) => self.update_part(id),
                PartChild::Rumble(_) => {}
            }
            i += 1;
        }
    }

    pub fn update_joystick(&mut self, id: JoystickId) {
        let Joystick { x, y, .. } = self.joysticks[id.0];
        self.update_node(x);
        self.update_node(y);
    }

    /// Recompute `id` for the current frame, children first. No-op if already done this frame.
    pub fn update_node(&mut self, id: NodeId) {
        let frame = self.frame;
        if self.nodes[id.0].frame == frame {
            return;
        }
        // Stamp before recursing so a malformed cycle reads the stale cache instead of looping
        self.nodes[id.0].frame = frame;

        let mut i = 0;
        while let Some(child) = self.nodes[id.0].kind.child(i) {
            self.update_node(child);
            i += 1;
        }
        if let NodeKind::Follow { joystick, .. } = self.nodes[id.0].kind {
            self.update_joystick(joystick);
        }

        let value = self.compute(id);
        let down = if self.nodes[id.0].analog {
            value.abs() >= self.config.analog_down_threshold
        } else {
            value != 0.0
        };
        let node = &mut self.nodes[id.0];
        node.prev_down = node.down;
        node.value = value;
        node.down = down;
    }

    fn compute(&mut self, id: NodeId) -> f32 {
        let now = self.raw.time_ms;
        if let NodeKind::Gate { child, rule } = self.nodes[id.0].kind {
            let (value, rule) = self.gate(child, rule, now);
            self.nodes[id.0].kind = NodeKind::Gate { child, rule };
            return value;
        }

        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::Source(source) => self.read_source(source),
            NodeKind::Highest(children) => self.pick(children, |candidate, best| candidate > best),
            NodeKind::Lowest(children) => self.pick(children, |candidate, best| candidate < best),
            NodeKind::Scaled {
                child,
                factor,
                sensitivity,
                invert,
            } => {
                if !self.is_node_connected(*child) {
                    return 0.0;
                }
                let sensitivity = sensitivity.map_or(1.0, |s| self.options[s.0].value() as f32);
                let sign = if self.option_set(*invert) { -1.0 } else { 1.0 };
                self.nodes[child.0].value * factor * sensitivity * sign
            }
            NodeKind::Choose {
                option,
                if_true,
                if_false,
            } => {
                let chosen = if self.options[option.0].bool_value() { *if_true } else { *if_false };
                if self.is_node_connected(chosen) {
                    self.nodes[chosen.0].value
                } else {
                    0.0
                }
            }
            NodeKind::Pattern { on_ms, off_ms } => {
                let period = on_ms + off_ms;
                digital(period > 0 && now % period < *on_ms)
            }
            NodeKind::Follow { joystick, y_axis } => {
                if !self.is_joystick_connected(*joystick) {
                    return 0.0;
                }
                let value = self.joystick_value(*joystick);
                match (value.deadzone, y_axis) {
                    (true, _) => 0.0,
                    (false, true) => value.y,
                    (false, false) => value.x,
                }
            }
            NodeKind::Difference { positive, negative } => {
                let read = |id: NodeId| {
                    if self.is_node_connected(id) {
                        self.nodes[id.0].value
                    } else {
                        0.0
                    }
                };
                read(*positive) - read(*negative)
            }
            NodeKind::OptionFlag { option, .. } => digital(self.options[option.0].bool_value()),
            NodeKind::Gate { .. } => unreachable!("gate handled above"),
        }
    }

    fn pick(&self, children: &[NodeId], better: impl Fn(f32, f32) -> bool) -> f32 {
        let mut best: Option<f32> = None;
        for &child in children {
            if !self.is_node_connected(child) {
                continue;
            }
            let value = self.nodes[child.0].value;
            match best {
                Some(b) if !better(value.abs(), b.abs()) => {}
                _ => best = Some(value),
            }
        }
        best.unwrap_or(0.0)
    }

    fn gate(&self, child: NodeId, rule: GateRule, now: u64) -> (f32, GateRule) {
        if !self.is_node_connected(child) {
            return (0.0, rule);
        }
        let state = self.nodes[child.0].button();
        match rule {
            GateRule::OnRelease { disabled_by } => {
                let fire = !self.option_set(disabled_by) && state.released;
                (digital(fire), rule)
            }
            GateRule::HeldWithGrace {
                grace_ms,
                enabled_by,
                last_down_ms,
            } => {
                if enabled_by.is_some() && !self.option_set(enabled_by) {
                    return (0.0, rule);
                }
                let last_down_ms = if state.down { Some(now) } else { last_down_ms };
                let held = state.down || last_down_ms.is_some_and(|t| now < t + grace_ms);
                (
                    digital(held),
                    GateRule::HeldWithGrace {
                        grace_ms,
                        enabled_by,
                        last_down_ms,
                    },
                )
            }
        }
    }

    fn read_source(&self, source: &RawSource) -> f32 {
        let raw = &self.raw;
        match *source {
            RawSource::Key(key) => digital(raw.key_down(key)),
            RawSource::Mouse(button) => digital(raw.mouse_down(button)),
            RawSource::GamepadButton { pad, button } => {
                digital(raw.gamepad(pad).is_some_and(|g| g.connected && g.button(button)))
            }
            RawSource::GamepadAxis { pad, axis, invert } => {
                let value = raw
                    .gamepad(pad)
                    .filter(|g| g.connected)
                    .map_or(0.0, |g| g.axis(axis).clamp(-1.0, 1.0));
                let value = if invert { -value } else { value };
                if value.abs() < self.config.full_analog_deadzone { 0.0 } else { value }
            }
            RawSource::Touch { region, .. } => digital(self.touch_in(&region)),
            RawSource::Tilt { roll, max_degrees } => {
                // Pitch is negated so tilting the top away reads as up
                let degrees = if roll { raw.tilt.roll } else { -raw.tilt.pitch };
                degrees_to_full_analog(degrees, self.options[max_degrees.0].value() as f32)
            }
            RawSource::Shake { threshold } => digital(raw.acceleration >= self.options[threshold.0].value() as f32),
            RawSource::PointerDelta { y_axis, within } => {
                if let Some(region) = within {
                    if !self.touch_in(&region) {
                        return 0.0;
                    }
                }
                let delta = if y_axis { raw.pointer_delta.y } else { raw.pointer_delta.x };
                delta / POINTER_DELTA_UNIT_PX
            }
            RawSource::Constant { value, .. } => value,
        }
    }

    fn active_area(&self, region: &TouchRegion) -> ScreenArea {
        match region.mirrored {
            Some((mirror, when)) if self.options[when.0].bool_value() => mirror,
            _ => region.area,
        }
    }

    /// Any pointer inside the region. Slots the platform cannot report are skipped.
    fn touch_in(&self, region: &TouchRegion) -> bool {
        let raw = &self.raw;
        if !raw.is_touched() {
            return false;
        }
        let area = self.active_area(region);
        let mut logged = false;
        for index in 0..MAX_TOUCH_POINTERS {
            match raw.pointer(index) {
                Ok(Some(p)) => {
                    if area.contains(raw.proportional(p)) {
                        return true;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    if !logged {
                        log::debug!("Skipping pointer slot: {}", e);
                        logged = true;
                    }
                }
            }
        }
        false
    }

    // === Reading cached values ===

    pub fn node(&self, id: NodeId) -> &InputNode {
        &self.nodes[id.0]
    }

    pub fn value(&self, id: NodeId) -> f32 {
        self.nodes[id.0].value
    }

    pub fn button(&self, id: NodeId) -> ButtonState {
        self.nodes[id.0].button()
    }

    pub fn is_down(&self, id: NodeId) -> bool {
        self.nodes[id.0].down
    }

    pub fn is_pressed(&self, id: NodeId) -> bool {
        self.button(id).pressed
    }

    pub fn is_released(&self, id: NodeId) -> bool {
        self.button(id).released
    }

    pub fn joystick(&self, id: JoystickId) -> &Joystick {
        &self.joysticks[id.0]
    }

    pub fn joystick_value(&self, id: JoystickId) -> JoystickValue {
        let Joystick { x, y, shape } = self.joysticks[id.0];
        JoystickValue::from_axes(
            self.nodes[x.0].value,
            self.nodes[y.0].value,
            shape,
            self.config.full_analog_deadzone,
        )
    }

    pub fn part(&self, id: PartId) -> &ControllerPart {
        &self.parts[id.0]
    }

    pub fn rumble(&self, id: RumbleId) -> &Rumble {
        &self.rumbles[id.0]
    }

    pub fn rumble_mut(&mut self, id: RumbleId) -> &mut Rumble {
        &mut self.rumbles[id.0]
    }

    // === Connectivity (always computed on demand) ===

    pub fn is_node_connected(&self, id: NodeId) -> bool {
        let raw = &self.raw;
        match &self.nodes[id.0].kind {
            NodeKind::Source(source) => match source {
                RawSource::Key(_) => raw.peripherals.keyboard,
                RawSource::Mouse(_) => raw.peripherals.mouse,
                RawSource::GamepadButton { pad, .. } | RawSource::GamepadAxis { pad, .. } => raw.gamepad_connected(*pad),
                RawSource::Touch {
                    needs_touchscreen, ..
                } => !needs_touchscreen || raw.peripherals.multitouch,
                RawSource::Tilt { .. } => raw.peripherals.gyroscope,
                RawSource::Shake { .. } => raw.peripherals.accelerometer,
                RawSource::PointerDelta { within, .. } => {
                    if within.is_some() {
                        raw.peripherals.multitouch
                    } else {
                        raw.peripherals.mouse
                    }
                }
                RawSource::Constant { .. } => true,
            },
            NodeKind::Highest(children) | NodeKind::Lowest(children) => {
                children.iter().any(|c| self.is_node_connected(*c))
            }
            NodeKind::Difference { positive, negative } => {
                self.is_node_connected(*positive) || self.is_node_connected(*negative)
            }
            NodeKind::Scaled { child, .. } | NodeKind::Gate { child, .. } => self.is_node_connected(*child),
            NodeKind::Choose {
                option,
                if_true,
                if_false,
            } => {
                if self.options[option.0].bool_value() {
                    self.is_node_connected(*if_true)
                } else {
                    self.is_node_connected(*if_false)
                }
            }
            NodeKind::Pattern { .. } => true,
            NodeKind::Follow { joystick, .. } => self.is_joystick_connected(*joystick),
            NodeKind::OptionFlag { connected_with, .. } => {
                connected_with.is_none_or(|r| self.is_rumble_connected(r))
            }
        }
    }

    pub fn is_joystick_connected(&self, id: JoystickId) -> bool {
        let Joystick { x, y, .. } = self.joysticks[id.0];
        self.is_node_connected(x) && self.is_node_connected(y)
    }

    pub fn is_rumble_connected(&self, id: RumbleId) -> bool {
        self.rumbles[id.0].is_connected(&self.raw)
    }

    pub fn is_child_connected(&self, child: PartChild) -> bool {
        match child {
            PartChild::Node(id) => self.is_node_connected(id),
            PartChild::Joystick(id) => self.is_joystick_connected(id),
            PartChild::Rumble(id) => self.is_rumble_connected(id),
            PartChild::Part(id) => self.is_part_connected(id),
        }
    }

    /// Relies-on part connected (if any) and the children satisfy the part's policy
    pub fn is_part_connected(&self, id: PartId) -> bool {
        let part = &self.parts[id.0];
        if let Some(target) = part.relies_on {
            if !self.is_part_connected(target) {
                return false;
            }
        }
        match part.policy {
            ConnectionPolicy::AnyChild => part.children.iter().any(|c| self.is_child_connected(*c)),
            ConnectionPolicy::AllChildren => {
                !part.children.is_empty() && part.children.iter().all(|c| self.is_child_connected(*c))
            }
        }
    }
}

#[inline]
fn digital(down: bool) -> f32 {
    if down { 1.0 } else { 0.0 }
}

/// Map a tilt in degrees to [-1, 1], saturating at `max_degrees`
fn degrees_to_full_analog(degrees: f32, max_degrees: f32) -> f32 {
    if max_degrees <= 0.0 {
        return 0.0;
    }
    let r = min_change(degrees, 0.0, 360.0).clamp(-max_degrees, max_degrees);
    r / max_degrees
}

fn referenced_options(kind: &NodeKind) -> [Option<OptionId>; 2] {
    match kind {
        NodeKind::Scaled {
            sensitivity, invert, ..
        } => [*sensitivity, *invert],
        NodeKind::Choose { option, .. } | NodeKind::OptionFlag { option, .. } => [Some(*option), None],
        NodeKind::Gate { rule, .. } => match rule {
            GateRule::OnRelease { disabled_by } => [*disabled_by, None],
            GateRule::HeldWithGrace { enabled_by, .. } => [*enabled_by, None],
        },
        NodeKind::Source(source) => match source {
            RawSource::Tilt { max_degrees, .. } => [Some(*max_degrees), None],
            RawSource::Shake { threshold } => [Some(*threshold), None],
            RawSource::Touch { region, .. }
            | RawSource::PointerDelta {
                within: Some(region), ..
            } => [region.mirrored.map(|(_, when)| when), None],
            _ => [None, None],
        },
        _ => [None, None],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::raw::{GamepadState, Key};
    use glam::Vec2;
    use proptest::prelude::*;

    fn desktop_arena() -> InputArena {
        let mut arena = InputArena::default();
        *arena.raw_mut() = RawInputState::desktop();
        arena
    }

    fn step(arena: &mut InputArena, id: NodeId) {
        arena.begin_frame();
        arena.update_node(id);
    }

    #[test]
    fn test_pressed_released_edges() {
        let mut arena = desktop_arena();
        let space = arena.add_source(RawSource::Key(Key::Space)).unwrap();

        step(&mut arena, space);
        assert_eq!(arena.button(space), ButtonState::default());

        arena.raw_mut().set_key(Key::Space, true);
        step(&mut arena, space);
        assert!(arena.is_down(space));
        assert!(arena.is_pressed(space));
        assert!(!arena.is_released(space));

        arena.raw_mut().set_key(Key::Space, false);
        step(&mut arena, space);
        assert!(!arena.is_down(space));
        assert!(!arena.is_pressed(space));
        assert!(arena.is_released(space));

        step(&mut arena, space);
        assert!(!arena.is_pressed(space) && !arena.is_released(space));
    }

    #[test]
    fn test_shared_child_updated_once_per_frame() {
        let mut arena = desktop_arena();
        let enter = arena.add_source(RawSource::Key(Key::Enter)).unwrap();
        let start = arena.add_node(NodeKind::Highest(vec![enter])).unwrap();
        let pause = arena.add_node(NodeKind::Highest(vec![enter])).unwrap();

        arena.raw_mut().set_key(Key::Enter, true);
        arena.begin_frame();
        arena.update_node(start);
        arena.update_node(pause);
        // Second parent must not recompute the shared key and eat the edge
        assert!(arena.is_pressed(enter));
        assert!(arena.is_pressed(start));
        assert!(arena.is_pressed(pause));
    }

    #[test]
    fn test_highest_prefers_largest_then_earliest() {
        let mut arena = desktop_arena();
        arena.raw_mut().gamepads.push(GamepadState::new("pad", 6, 4));
        let trigger = arena
            .add_source(RawSource::GamepadAxis {
                pad: 0,
                axis: 5,
                invert: false,
            })
            .unwrap();
        let key = arena.add_source(RawSource::Key(Key::Space)).unwrap();
        let fire = arena.add_node(NodeKind::Highest(vec![trigger, key])).unwrap();
        assert!(arena.node(fire).is_analog());

        arena.raw_mut().gamepads[0].axes[5] = 0.7;
        step(&mut arena, fire);
        assert!((arena.value(fire) - 0.7).abs() < 1e-6);
        assert!(arena.is_down(fire));

        arena.raw_mut().set_key(Key::Space, true);
        step(&mut arena, fire);
        assert_eq!(arena.value(fire), 1.0);

        // Disconnected pad no longer takes part
        arena.raw_mut().set_key(Key::Space, false);
        arena.raw_mut().gamepads[0].connected = false;
        step(&mut arena, fire);
        assert_eq!(arena.value(fire), 0.0);
        assert!(arena.is_node_connected(fire));
    }

    #[test]
    fn test_scaled_reads_live_option() {
        let mut arena = desktop_arena();
        arena.raw_mut().gamepads.push(GamepadState::new("pad", 4, 0));
        let axis = arena
            .add_source(RawSource::GamepadAxis {
                pad: 0,
                axis: 2,
                invert: false,
            })
            .unwrap();
        let sensitivity = arena.add_option(ConfigurableOption::analog("s", "S", "", 0.4, 2.5, 1.0));
        let invert = arena.add_option(ConfigurableOption::boolean("i", "I", "", false));
        let scaled = arena
            .add_node(NodeKind::Scaled {
                child: axis,
                factor: 1.0,
                sensitivity: Some(sensitivity),
                invert: Some(invert),
            })
            .unwrap();

        arena.raw_mut().gamepads[0].axes[2] = 0.5;
        step(&mut arena, scaled);
        assert!((arena.value(scaled) - 0.5).abs() < 1e-6);

        arena.option_mut(sensitivity).set_value(2.0);
        arena.option_mut(invert).set_bool(true);
        step(&mut arena, scaled);
        assert!((arena.value(scaled) + 1.0).abs() < 1e-6);

        // Required child gone: quiescent, not an error
        arena.raw_mut().gamepads[0].connected = false;
        step(&mut arena, scaled);
        assert_eq!(arena.value(scaled), 0.0);
        assert!(!arena.is_node_connected(scaled));
    }

    #[test]
    fn test_axis_deadzone() {
        let mut arena = desktop_arena();
        arena.raw_mut().gamepads.push(GamepadState::new("pad", 2, 0));
        let axis = arena
            .add_source(RawSource::GamepadAxis {
                pad: 0,
                axis: 1,
                invert: true,
            })
            .unwrap();
        arena.raw_mut().gamepads[0].axes[1] = 0.05;
        step(&mut arena, axis);
        assert_eq!(arena.value(axis), 0.0);
        arena.raw_mut().gamepads[0].axes[1] = -0.8;
        step(&mut arena, axis);
        assert!((arena.value(axis) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_gate_on_release() {
        let mut arena = desktop_arena();
        let constant = arena.add_option(ConfigurableOption::boolean("c", "C", "", false));
        let key = arena.add_source(RawSource::Key(Key::Space)).unwrap();
        let gate = arena
            .add_node(NodeKind::Gate {
                child: key,
                rule: GateRule::on_release(Some(constant)),
            })
            .unwrap();

        arena.raw_mut().set_key(Key::Space, true);
        step(&mut arena, gate);
        assert!(!arena.is_down(gate));
        arena.raw_mut().set_key(Key::Space, false);
        step(&mut arena, gate);
        assert!(arena.is_down(gate));
        step(&mut arena, gate);
        assert!(!arena.is_down(gate));

        arena.option_mut(constant).set_bool(true);
        arena.raw_mut().set_key(Key::Space, true);
        step(&mut arena, gate);
        arena.raw_mut().set_key(Key::Space, false);
        step(&mut arena, gate);
        assert!(!arena.is_down(gate));
    }

    #[test]
    fn test_gate_held_with_grace() {
        let mut arena = desktop_arena();
        let key = arena.add_source(RawSource::Key(Key::Space)).unwrap();
        let gate = arena
            .add_node(NodeKind::Gate {
                child: key,
                rule: GateRule::held_with_grace(500, None),
            })
            .unwrap();

        arena.raw_mut().time_ms = 1000;
        arena.raw_mut().set_key(Key::Space, true);
        step(&mut arena, gate);
        assert!(arena.is_down(gate));

        arena.raw_mut().set_key(Key::Space, false);
        arena.raw_mut().time_ms = 1499;
        step(&mut arena, gate);
        assert!(arena.is_down(gate));

        arena.raw_mut().time_ms = 1500;
        step(&mut arena, gate);
        assert!(!arena.is_down(gate));
    }

    #[test]
    fn test_pattern_and_lowest() {
        let mut arena = desktop_arena();
        let pattern = arena.add_node(NodeKind::Pattern { on_ms: 160, off_ms: 80 }).unwrap();
        let key = arena.add_source(RawSource::Key(Key::Space)).unwrap();
        let both = arena.add_node(NodeKind::Lowest(vec![pattern, key])).unwrap();

        arena.raw_mut().set_key(Key::Space, true);
        arena.raw_mut().time_ms = 100;
        step(&mut arena, both);
        assert!(arena.is_down(both));
        arena.raw_mut().time_ms = 200;
        step(&mut arena, both);
        assert!(!arena.is_down(both));
        arena.raw_mut().time_ms = 250;
        step(&mut arena, both);
        assert!(arena.is_down(both));
        arena.raw_mut().set_key(Key::Space, false);
        arena.raw_mut().time_ms = 260;
        step(&mut arena, both);
        assert!(!arena.is_down(both));
    }

    #[test]
    fn test_choose_follows_option() {
        let mut arena = desktop_arena();
        let use_y = arena.add_option(ConfigurableOption::boolean("y", "Y", "", false));
        let x = arena.add_source(RawSource::PointerDelta { y_axis: false, within: None }).unwrap();
        let y = arena.add_source(RawSource::PointerDelta { y_axis: true, within: None }).unwrap();
        let axis = arena
            .add_node(NodeKind::Choose {
                option: use_y,
                if_true: y,
                if_false: x,
            })
            .unwrap();

        arena.raw_mut().pointer_delta = Vec2::new(40.0, -20.0);
        step(&mut arena, axis);
        assert!((arena.value(axis) - 2.0).abs() < 1e-6);
        arena.option_mut(use_y).set_bool(true);
        step(&mut arena, axis);
        assert!((arena.value(axis) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_follow_zero_inside_deadzone() {
        let mut arena = desktop_arena();
        let right = arena.add_source(RawSource::Key(Key::D)).unwrap();
        let left = arena.add_source(RawSource::Key(Key::A)).unwrap();
        let up = arena.add_source(RawSource::Key(Key::W)).unwrap();
        let down = arena.add_source(RawSource::Key(Key::S)).unwrap();
        let x = arena
            .add_node(NodeKind::Difference {
                positive: right,
                negative: left,
            })
            .unwrap();
        let y = arena.add_node(NodeKind::Difference { positive: up, negative: down }).unwrap();
        let stick = arena.add_joystick(x, y, JoystickShape::Square).unwrap();
        let follow_x = arena.add_node(NodeKind::Follow { joystick: stick, y_axis: false }).unwrap();

        step(&mut arena, follow_x);
        assert_eq!(arena.value(follow_x), 0.0);

        arena.raw_mut().set_key(Key::D, true);
        arena.raw_mut().set_key(Key::W, true);
        step(&mut arena, follow_x);
        assert!((arena.value(follow_x) - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
        let value = arena.joystick_value(stick);
        assert!((value.angle_degrees - 45.0).abs() < 1e-3);
    }

    #[test]
    fn test_tilt_maps_degrees() {
        let mut arena = InputArena::default();
        *arena.raw_mut() = RawInputState::phone();
        let max = arena.add_option(ConfigurableOption::analog("t", "T", "", 5.0, 45.0, 20.0));
        let roll = arena.add_source(RawSource::Tilt { roll: true, max_degrees: max }).unwrap();

        arena.raw_mut().tilt.roll = 10.0;
        step(&mut arena, roll);
        assert!((arena.value(roll) - 0.5).abs() < 1e-5);

        arena.raw_mut().tilt.roll = 350.0;
        step(&mut arena, roll);
        assert!((arena.value(roll) + 0.5).abs() < 1e-5);

        arena.raw_mut().tilt.roll = 90.0;
        step(&mut arena, roll);
        assert!((arena.value(roll) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_touch_skips_out_of_range_slots() {
        let mut arena = InputArena::default();
        *arena.raw_mut() = RawInputState::phone();
        let left_handed = arena.add_option(ConfigurableOption::boolean("lh", "LH", "", false));
        let region = TouchRegion::mirrored(ScreenArea::LeftOf(0.5), ScreenArea::RightOf(0.5), left_handed);
        let touch = arena
            .add_source(RawSource::Touch {
                region,
                needs_touchscreen: true,
            })
            .unwrap();

        // Only 2 slots supported; the scan of 20 must not abort
        arena.raw_mut().pointer_capacity = 2;
        arena.raw_mut().pointers = vec![None, Some(Vec2::new(100.0, 500.0))];
        step(&mut arena, touch);
        assert!(arena.is_down(touch));

        arena.option_mut(left_handed).set_bool(true);
        step(&mut arena, touch);
        assert!(!arena.is_down(touch));
    }

    #[test]
    fn test_part_policies() {
        let mut arena = desktop_arena();
        arena.raw_mut().gamepads.push(GamepadState::new("pad", 2, 2));
        let a = arena.add_source(RawSource::GamepadButton { pad: 0, button: 0 }).unwrap();
        let key = arena.add_source(RawSource::Key(Key::Space)).unwrap();

        let any = arena.add_part("any", ConnectionPolicy::AnyChild);
        arena.add_children(any, [PartChild::Node(a), PartChild::Node(key)]).unwrap();
        let all = arena.add_part("all", ConnectionPolicy::AllChildren);
        let key2 = arena.add_source(RawSource::Key(Key::Enter)).unwrap();
        arena.add_children(all, [PartChild::Node(key2)]).unwrap();
        let b = arena.add_source(RawSource::GamepadButton { pad: 0, button: 1 }).unwrap();
        arena.add_child(all, PartChild::Node(b)).unwrap();

        assert!(arena.is_part_connected(any));
        assert!(arena.is_part_connected(all));

        arena.raw_mut().gamepads[0].connected = false;
        assert!(arena.is_part_connected(any));
        assert!(!arena.is_part_connected(all));

        let empty = arena.add_part("empty", ConnectionPolicy::AllChildren);
        assert!(!arena.is_part_connected(empty));
    }

    #[test]
    fn test_relies_on_without_update() {
        let mut arena = desktop_arena();
        arena.raw_mut().gamepads.push(GamepadState::new("pad", 2, 2));
        let button = arena.add_source(RawSource::GamepadButton { pad: 0, button: 0 }).unwrap();
        let device = arena.add_part("device", ConnectionPolicy::AllChildren);
        arena.add_child(device, PartChild::Node(button)).unwrap();

        let key = arena.add_source(RawSource::Key(Key::Space)).unwrap();
        let scheme = arena.add_part("scheme", ConnectionPolicy::AnyChild);
        arena.add_child(scheme, PartChild::Node(key)).unwrap();
        arena.set_relies_on(scheme, device).unwrap();
        assert!(arena.is_part_connected(scheme));

        // No update in between: unplugging is still visible
        arena.raw_mut().gamepads[0].connected = false;
        assert!(!arena.is_part_connected(scheme));

        assert!(arena.set_relies_on(device, scheme).is_err());
    }

    #[test]
    fn test_part_has_single_parent() {
        let mut arena = desktop_arena();
        arena.set_debug_change_in_parent(true);
        let root = arena.add_part("root", ConnectionPolicy::AnyChild);
        let other = arena.add_part("other", ConnectionPolicy::AnyChild);
        let child = arena.add_part("child", ConnectionPolicy::AnyChild);
        arena.add_child(root, PartChild::Part(child)).unwrap();
        assert!(matches!(
            arena.add_child(other, PartChild::Part(child)),
            Err(GameError::IllegalOperation(_))
        ));
        assert!(arena.add_child(child, PartChild::Part(root)).is_err());
        assert_eq!(arena.part(child).parent(), Some(root));
    }

    #[test]
    fn test_rejects_dangling_handles() {
        let mut arena = desktop_arena();
        assert!(arena.add_node(NodeKind::Highest(vec![NodeId(3)])).is_err());
        assert!(arena.add_joystick(NodeId(0), NodeId(1), JoystickShape::Circular).is_err());
    }

    proptest! {
        #[test]
        fn prop_reads_are_idempotent_within_a_frame(
            axis in -1.0f32..1.0,
            key in any::<bool>(),
            reads in 1usize..10,
        ) {
            let mut arena = desktop_arena();
            arena.raw_mut().gamepads.push(GamepadState::new("pad", 1, 0));
            let stick = arena.add_source(RawSource::GamepadAxis { pad: 0, axis: 0, invert: false }).unwrap();
            let space = arena.add_source(RawSource::Key(Key::Space)).unwrap();
            let pick = arena.add_node(NodeKind::Highest(vec![stick, space])).unwrap();

            arena.raw_mut().gamepads[0].axes[0] = axis;
            arena.raw_mut().set_key(Key::Space, key);
            step(&mut arena, pick);
            let first = (arena.value(pick), arena.button(pick));
            for _ in 0..reads {
                // Extra updates inside the same frame are no-ops too
                arena.update_node(pick);
                prop_assert_eq!((arena.value(pick), arena.button(pick)), first);
            }
        }
    }
}
