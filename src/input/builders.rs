//! Builders wiring physical sources into `UsableGameInput`s
//!
//! Each builder creates its options first, then the leaf nodes, then the
//! composites that read them, so every node only refers to earlier handles.

use super::arena::InputArena;
use super::game_input::{GameControls, UsableGameInput};
use super::joystick::JoystickShape;
use super::node::{GateRule, NodeId, NodeKind, RawSource, TouchRegion};
use super::option::{ConfigurableOption, OptionId};
use super::part::{ConnectionPolicy, PartChild, PartId};
use super::raw::{Key, MouseButton, ScreenArea};
use super::rumble::RumbleTarget;
use crate::error::Result;

/// Single-shot fire: on release. Constant fire: pattern while held plus grace.
pub const CONSTANT_SHOOT_ON_MS: u64 = 160;
pub const CONSTANT_SHOOT_OFF_MS: u64 = 80;
pub const CONSTANT_SHOOT_GRACE_MS: u64 = 500;

mod xinput {
    pub const LEFT_X: usize = 0;
    pub const LEFT_Y: usize = 1;
    pub const RIGHT_X: usize = 2;
    pub const LEFT_TRIGGER: usize = 4;
    pub const RIGHT_TRIGGER: usize = 5;

    pub const A: usize = 0;
    pub const B: usize = 1;
    pub const X: usize = 2;
    pub const LB: usize = 4;
    pub const RB: usize = 5;
    pub const BACK: usize = 6;
    pub const START: usize = 7;
}

fn key(arena: &mut InputArena, key: Key) -> Result<NodeId> {
    arena.add_source(RawSource::Key(key))
}

fn highest(arena: &mut InputArena, children: Vec<NodeId>) -> Result<NodeId> {
    arena.add_node(NodeKind::Highest(children))
}

/// Digital node that is never down, for controls a source does not have
fn dummy(arena: &mut InputArena) -> Result<NodeId> {
    arena.add_source(RawSource::Constant {
        value: 0.0,
        analog: false,
    })
}

/// Square joystick from four keys
fn four_keys(arena: &mut InputArena, up: Key, down: Key, left: Key, right: Key) -> Result<(NodeId, NodeId)> {
    let (up, down, left, right) = (key(arena, up)?, key(arena, down)?, key(arena, left)?, key(arena, right)?);
    let x = arena.add_node(NodeKind::Difference {
        positive: right,
        negative: left,
    })?;
    let y = arena.add_node(NodeKind::Difference {
        positive: up,
        negative: down,
    })?;
    Ok((x, y))
}

fn pad_axis(arena: &mut InputArena, pad: usize, axis: usize, invert: bool) -> Result<NodeId> {
    arena.add_source(RawSource::GamepadAxis { pad, axis, invert })
}

fn pad_button(arena: &mut InputArena, pad: usize, button: usize) -> Result<NodeId> {
    arena.add_source(RawSource::GamepadButton { pad, button })
}

/// Root part over every control, optionally relying on a device part
fn root_part(arena: &mut InputArena, name: &str, controls: &GameControls, relies_on: Option<PartId>) -> Result<PartId> {
    let part = arena.add_part(name, ConnectionPolicy::AnyChild);
    arena.add_children(
        part,
        [
            PartChild::Joystick(controls.main_joystick),
            PartChild::Node(controls.rotate_axis),
            PartChild::Node(controls.fire),
            PartChild::Node(controls.slow),
            PartChild::Node(controls.activate_powerup),
            PartChild::Node(controls.back),
            PartChild::Node(controls.enter),
            PartChild::Rumble(controls.rumble),
        ],
    )?;
    if let Some(device) = relies_on {
        arena.set_relies_on(part, device)?;
    }
    Ok(part)
}

pub fn keyboard_mouse(arena: &mut InputArena) -> Result<UsableGameInput> {
    let sensitivity = arena.add_option(ConfigurableOption::analog(
        "controls.rotation.mouse.sensitivity",
        "Mouse Sensitivity",
        "How far the player turns per mouse movement",
        0.2,
        2.0,
        1.0,
    ));
    let invert = arena.add_option(ConfigurableOption::boolean(
        "controls.rotation.mouse.invert",
        "Invert Mouse",
        "Turn the other way",
        false,
    ));
    let use_y = arena.add_option(ConfigurableOption::boolean(
        "controls.rotation.mouse.use_y",
        "Rotate With Y Axis",
        "Turn with up and down mouse movement",
        false,
    ));

    let (wasd_x, wasd_y) = four_keys(arena, Key::W, Key::S, Key::A, Key::D)?;
    let (arrows_x, arrows_y) = four_keys(arena, Key::Up, Key::Down, Key::Left, Key::Right)?;
    let main_joystick = arena.add_joystick(wasd_x, wasd_y, JoystickShape::Square)?;
    let selector_x = highest(arena, vec![wasd_x, arrows_x])?;
    let selector_y = highest(arena, vec![wasd_y, arrows_y])?;
    let selector = arena.add_joystick(selector_x, selector_y, JoystickShape::Square)?;

    let mouse_x = arena.add_source(RawSource::PointerDelta {
        y_axis: false,
        within: None,
    })?;
    let mouse_y = arena.add_source(RawSource::PointerDelta {
        y_axis: true,
        within: None,
    })?;
    let mouse_axis = arena.add_node(NodeKind::Choose {
        option: use_y,
        if_true: mouse_y,
        if_false: mouse_x,
    })?;
    // Moving right turns clockwise
    let mouse_rotate = arena.add_node(NodeKind::Scaled {
        child: mouse_axis,
        factor: -1.0,
        sensitivity: Some(sensitivity),
        invert: Some(invert),
    })?;
    let (left, right) = (key(arena, Key::Left)?, key(arena, Key::Right)?);
    let key_rotate = arena.add_node(NodeKind::Difference {
        positive: left,
        negative: right,
    })?;
    let rotate_axis = highest(arena, vec![mouse_rotate, key_rotate])?;

    let (left_click, right_click) = (
        arena.add_source(RawSource::Mouse(MouseButton::Left))?,
        arena.add_source(RawSource::Mouse(MouseButton::Right))?,
    );
    let space = key(arena, Key::Space)?;
    let fire = highest(arena, vec![left_click, space])?;
    let shift = key(arena, Key::ShiftLeft)?;
    let slow = highest(arena, vec![shift, right_click])?;
    let activate_powerup = key(arena, Key::F)?;
    let enter_key = key(arena, Key::Enter)?;
    let escape = key(arena, Key::Escape)?;
    let backspace = key(arena, Key::Backspace)?;
    let back = highest(arena, vec![escape, backspace])?;
    let enter = highest(arena, vec![enter_key, space])?;

    let controls = GameControls {
        main_joystick,
        rotate_axis,
        fire,
        slow,
        activate_powerup,
        start: enter_key,
        pause: escape,
        back,
        selector,
        enter,
        rumble: arena.add_rumble(RumbleTarget::Disconnected),
        rumble_on_shot: None,
    };
    let part = root_part(arena, "keyboard and mouse", &controls, None)?;
    Ok(UsableGameInput::new(
        "Keyboard and Mouse",
        part,
        controls,
        vec![sensitivity, invert, use_y],
    ))
}

pub fn touch_gyro(arena: &mut InputArena) -> Result<UsableGameInput> {
    let left_handed = arena.add_option(ConfigurableOption::boolean(
        "controls.touch.left_handed",
        "Left Handed",
        "Swap the shoot and turn sides of the screen",
        false,
    ));
    let constant_shoot = arena.add_option(ConfigurableOption::boolean(
        "controls.touch.constant_shoot",
        "Constant Shoot",
        "Keep shooting while the screen is held",
        false,
    ));
    let max_tilt = arena.add_option(ConfigurableOption::analog(
        "controls.gyro.max_tilt",
        "Max Tilt",
        "Degrees of tilt for full speed",
        5.0,
        45.0,
        20.0,
    ));
    let shake_threshold = arena.add_option(ConfigurableOption::discrete(
        "controls.gyro.shake_threshold",
        "Shake Threshold",
        "How hard to shake to activate a power up",
        3,
        16,
        9,
    ));
    let rumble_on_shot = arena.add_option(ConfigurableOption::boolean(
        "controls.rumble.single_shot",
        "Rumble On Shot",
        "Vibrate on every single shot",
        true,
    ));

    let tilt_x = arena.add_source(RawSource::Tilt {
        roll: true,
        max_degrees: max_tilt,
    })?;
    let tilt_y = arena.add_source(RawSource::Tilt {
        roll: false,
        max_degrees: max_tilt,
    })?;
    let main_joystick = arena.add_joystick(tilt_x, tilt_y, JoystickShape::Circular)?;

    let shoot_region = TouchRegion::mirrored(ScreenArea::LeftOf(0.5), ScreenArea::RightOf(0.5), left_handed);
    let turn_region = TouchRegion::mirrored(ScreenArea::RightOf(0.5), ScreenArea::LeftOf(0.5), left_handed);
    let shoot_touch = arena.add_source(RawSource::Touch {
        region: shoot_region,
        needs_touchscreen: true,
    })?;
    let single = arena.add_node(NodeKind::Gate {
        child: shoot_touch,
        rule: GateRule::on_release(Some(constant_shoot)),
    })?;
    let held = arena.add_node(NodeKind::Gate {
        child: shoot_touch,
        rule: GateRule::held_with_grace(CONSTANT_SHOOT_GRACE_MS, Some(constant_shoot)),
    })?;
    let pattern = arena.add_node(NodeKind::Pattern {
        on_ms: CONSTANT_SHOOT_ON_MS,
        off_ms: CONSTANT_SHOOT_OFF_MS,
    })?;
    let constant = arena.add_node(NodeKind::Lowest(vec![pattern, held]))?;
    let fire = highest(arena, vec![single, constant])?;

    let drag = arena.add_source(RawSource::PointerDelta {
        y_axis: false,
        within: Some(turn_region),
    })?;
    let rotate_axis = arena.add_node(NodeKind::Scaled {
        child: drag,
        factor: -1.0,
        sensitivity: None,
        invert: None,
    })?;

    let activate_powerup = arena.add_source(RawSource::Shake {
        threshold: shake_threshold,
    })?;
    let anywhere = arena.add_source(RawSource::Touch {
        region: TouchRegion::fixed(ScreenArea::Rect {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }),
        needs_touchscreen: true,
    })?;
    let back = key(arena, Key::Back)?;
    let slow = dummy(arena)?;
    let rumble = arena.add_rumble(RumbleTarget::Vibrator);
    let rumble_flag = arena.add_node(NodeKind::OptionFlag {
        option: rumble_on_shot,
        connected_with: Some(rumble),
    })?;

    let controls = GameControls {
        main_joystick,
        rotate_axis,
        fire,
        slow,
        activate_powerup,
        start: anywhere,
        pause: back,
        back,
        selector: main_joystick,
        enter: anywhere,
        rumble,
        rumble_on_shot: Some(rumble_flag),
    };
    let part = root_part(arena, "touch and gyro", &controls, None)?;
    Ok(UsableGameInput::new(
        "Touch and Gyro",
        part,
        controls,
        vec![left_handed, constant_shoot, max_tilt, shake_threshold, rumble_on_shot],
    ))
}

fn pad_name(arena: &InputArena, pad: usize) -> String {
    arena.raw().gamepad(pad).map(|g| g.name.clone()).unwrap_or_default()
}

/// Part modelling one physical pad: every component shares its connection
fn device_part(arena: &mut InputArena, pad: usize, components: &[PartChild]) -> Result<PartId> {
    let device = arena.add_part(format!("gamepad {pad} device"), ConnectionPolicy::AllChildren);
    arena.add_children(device, components.iter().copied())?;
    Ok(device)
}

fn rotation_options(
    arena: &mut InputArena,
    prefix: &str,
    min: f64,
    max: f64,
) -> (OptionId, OptionId) {
    let sensitivity = arena.add_option(ConfigurableOption::analog(
        format!("{prefix}.rotation.sensitivity"),
        "Rotation Sensitivity",
        "How fast the player turns",
        min,
        max,
        1.0,
    ));
    let invert = arena.add_option(ConfigurableOption::boolean(
        format!("{prefix}.rotation.invert"),
        "Invert Rotation",
        "Turn the other way",
        false,
    ));
    (sensitivity, invert)
}

pub fn standard_gamepad(arena: &mut InputArena, pad: usize) -> Result<UsableGameInput> {
    let (sensitivity, invert) = rotation_options(arena, &format!("controls.gamepad{pad}"), 0.4, 2.5);

    let left_x = pad_axis(arena, pad, xinput::LEFT_X, false)?;
    // Stick y grows downward
    let left_y = pad_axis(arena, pad, xinput::LEFT_Y, true)?;
    let main_joystick = arena.add_joystick(left_x, left_y, JoystickShape::Circular)?;

    let right_x = pad_axis(arena, pad, xinput::RIGHT_X, false)?;
    let rotate_axis = arena.add_node(NodeKind::Scaled {
        child: right_x,
        factor: -1.0,
        sensitivity: Some(sensitivity),
        invert: Some(invert),
    })?;

    let a = pad_button(arena, pad, xinput::A)?;
    let b = pad_button(arena, pad, xinput::B)?;
    let right_trigger = pad_axis(arena, pad, xinput::RIGHT_TRIGGER, false)?;
    let rb = pad_button(arena, pad, xinput::RB)?;
    let fire = highest(arena, vec![right_trigger, a, rb])?;
    let left_trigger = pad_axis(arena, pad, xinput::LEFT_TRIGGER, false)?;
    let lb = pad_button(arena, pad, xinput::LB)?;
    let slow = highest(arena, vec![left_trigger, lb])?;
    let activate_powerup = pad_button(arena, pad, xinput::X)?;
    let start = pad_button(arena, pad, xinput::START)?;
    let select = pad_button(arena, pad, xinput::BACK)?;
    let back = highest(arena, vec![b, select])?;

    let controls = GameControls {
        main_joystick,
        rotate_axis,
        fire,
        slow,
        activate_powerup,
        start,
        pause: start,
        back,
        selector: main_joystick,
        enter: a,
        rumble: arena.add_rumble(RumbleTarget::Gamepad(pad)),
        rumble_on_shot: None,
    };
    let device = device_part(arena, pad, &[PartChild::Node(a), PartChild::Joystick(main_joystick)])?;
    let part = root_part(arena, &format!("gamepad {pad}"), &controls, Some(device))?;
    Ok(UsableGameInput::new(
        format!("Gamepad {pad}: {}", pad_name(arena, pad)),
        part,
        controls,
        vec![sensitivity, invert],
    ))
}

/// Button and axis layout of a flight stick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlightStickLayout {
    pub label: &'static str,
    /// Twist axis used for rotation
    pub twist_axis: Option<usize>,
    /// Counter-clockwise and clockwise buttons, for sticks without a twist axis
    pub rotate_buttons: Option<(usize, usize)>,
    pub trigger: usize,
    pub thumb: usize,
    pub powerup: usize,
    pub start: usize,
    pub back: usize,
}

pub const EXTREME_3D: FlightStickLayout = FlightStickLayout {
    label: "Logitech Extreme 3D",
    twist_axis: Some(2),
    rotate_buttons: None,
    trigger: 0,
    thumb: 1,
    powerup: 2,
    start: 11,
    back: 10,
};

pub const ATTACK_3: FlightStickLayout = FlightStickLayout {
    label: "Logitech Attack 3",
    twist_axis: None,
    rotate_buttons: Some((3, 4)),
    trigger: 0,
    thumb: 1,
    powerup: 2,
    start: 8,
    back: 9,
};

pub fn flight_stick(arena: &mut InputArena, pad: usize, layout: &FlightStickLayout) -> Result<UsableGameInput> {
    let (sensitivity, invert) = rotation_options(arena, &format!("controls.flightstick{pad}"), 0.4, 2.5);

    let x = pad_axis(arena, pad, 0, false)?;
    let y = pad_axis(arena, pad, 1, true)?;
    let main_joystick = arena.add_joystick(x, y, JoystickShape::Circular)?;

    let raw_rotate = match (layout.twist_axis, layout.rotate_buttons) {
        (Some(axis), _) => pad_axis(arena, pad, axis, true)?,
        (None, Some((ccw, cw))) => {
            let (ccw, cw) = (pad_button(arena, pad, ccw)?, pad_button(arena, pad, cw)?);
            arena.add_node(NodeKind::Difference {
                positive: ccw,
                negative: cw,
            })?
        }
        (None, None) => dummy(arena)?,
    };
    let rotate_axis = arena.add_node(NodeKind::Scaled {
        child: raw_rotate,
        factor: 1.0,
        sensitivity: Some(sensitivity),
        invert: Some(invert),
    })?;

    let fire = pad_button(arena, pad, layout.trigger)?;
    let slow = pad_button(arena, pad, layout.thumb)?;
    let activate_powerup = pad_button(arena, pad, layout.powerup)?;
    let start = pad_button(arena, pad, layout.start)?;
    let back = pad_button(arena, pad, layout.back)?;

    let controls = GameControls {
        main_joystick,
        rotate_axis,
        fire,
        slow,
        activate_powerup,
        start,
        pause: start,
        back,
        selector: main_joystick,
        enter: fire,
        rumble: arena.add_rumble(RumbleTarget::Gamepad(pad)),
        rumble_on_shot: None,
    };
    let device = device_part(arena, pad, &[PartChild::Node(fire), PartChild::Joystick(main_joystick)])?;
    let part = root_part(arena, &format!("flight stick {pad}"), &controls, Some(device))?;
    Ok(UsableGameInput::new(
        format!("{} ({pad})", layout.label),
        part,
        controls,
        vec![sensitivity, invert],
    ))
}

pub fn extreme_3d(arena: &mut InputArena, pad: usize) -> Result<UsableGameInput> {
    flight_stick(arena, pad, &EXTREME_3D)
}

pub fn attack_3(arena: &mut InputArena, pad: usize) -> Result<UsableGameInput> {
    flight_stick(arena, pad, &ATTACK_3)
}

/// Convenience for tests and the demo: the input's options by key
pub fn find_input_option(arena: &InputArena, input: &UsableGameInput, key: &str) -> Option<OptionId> {
    input.options().iter().copied().find(|id| arena.option(*id).key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::raw::{GamepadState, RawInputState};
    use glam::Vec2;

    fn frame(arena: &mut InputArena, input: &UsableGameInput) {
        arena.begin_frame();
        input.update(arena);
    }

    #[test]
    fn test_keyboard_mouse_controls() {
        let mut arena = InputArena::default();
        *arena.raw_mut() = RawInputState::desktop();
        let input = keyboard_mouse(&mut arena).unwrap();
        assert!(input.is_connected(&arena));

        arena.raw_mut().set_key(Key::D, true);
        arena.raw_mut().set_key(Key::W, true);
        arena.raw_mut().pointer_delta = Vec2::new(20.0, 0.0);
        frame(&mut arena, &input);
        let snapshot = input.snapshot(&arena);
        assert!((snapshot.main_joystick.angle_degrees - 45.0).abs() < 1e-3);
        assert!((snapshot.main_joystick.magnitude - 1.0).abs() < 1e-5);
        assert!((snapshot.rotate_axis + 1.0).abs() < 1e-5);

        let invert = find_input_option(&arena, &input, "controls.rotation.mouse.invert").unwrap();
        arena.option_mut(invert).set_bool(true);
        frame(&mut arena, &input);
        assert!((input.snapshot(&arena).rotate_axis - 1.0).abs() < 1e-5);

        arena.raw_mut().peripherals.keyboard = false;
        arena.raw_mut().peripherals.mouse = false;
        assert!(!input.is_connected(&arena));
    }

    #[test]
    fn test_touch_single_and_constant_shoot() {
        let mut arena = InputArena::default();
        *arena.raw_mut() = RawInputState::phone();
        let input = touch_gyro(&mut arena).unwrap();
        assert!(input.is_connected(&arena));
        let left_side = Some(Vec2::new(100.0, 900.0));

        // Single shot fires on release only
        arena.raw_mut().pointers = vec![left_side];
        frame(&mut arena, &input);
        assert!(!input.snapshot(&arena).fire.down);
        arena.raw_mut().pointers = vec![None];
        frame(&mut arena, &input);
        assert!(input.snapshot(&arena).fire.pressed);
        assert!(input.snapshot(&arena).rumble_on_shot);

        // Constant shoot repeats while held
        let constant = find_input_option(&arena, &input, "controls.touch.constant_shoot").unwrap();
        arena.option_mut(constant).set_bool(true);
        arena.raw_mut().pointers = vec![left_side];
        let period = CONSTANT_SHOOT_ON_MS + CONSTANT_SHOOT_OFF_MS;
        let start = period * 40;
        arena.raw_mut().time_ms = start;
        frame(&mut arena, &input);
        assert!(input.snapshot(&arena).fire.down);
        arena.raw_mut().time_ms = start + CONSTANT_SHOOT_ON_MS;
        frame(&mut arena, &input);
        assert!(!input.snapshot(&arena).fire.down);

        // Released: keeps going through the grace period, then stops
        arena.raw_mut().pointers = vec![None];
        arena.raw_mut().time_ms = start + period;
        frame(&mut arena, &input);
        assert!(input.snapshot(&arena).fire.down);
        arena.raw_mut().time_ms = start + period * 3;
        frame(&mut arena, &input);
        assert!(!input.snapshot(&arena).fire.down);
    }

    #[test]
    fn test_gamepad_relies_on_device() {
        let mut arena = InputArena::default();
        *arena.raw_mut() = RawInputState::desktop();
        arena.raw_mut().gamepads.push(GamepadState::new("Generic Pad", 6, 12));
        let input = standard_gamepad(&mut arena, 0).unwrap();
        assert_eq!(input.name(), "Gamepad 0: Generic Pad");
        assert!(input.is_connected(&arena));

        arena.raw_mut().gamepads[0].axes[xinput::RIGHT_TRIGGER] = 0.9;
        arena.raw_mut().gamepads[0].axes[xinput::RIGHT_X] = 0.5;
        frame(&mut arena, &input);
        let snapshot = input.snapshot(&arena);
        assert!(snapshot.fire.pressed);
        assert!((snapshot.rotate_axis + 0.5).abs() < 1e-5);

        arena.raw_mut().gamepads[0].connected = false;
        assert!(!input.is_connected(&arena));
    }

    #[test]
    fn test_attack_3_rotates_with_buttons() {
        let mut arena = InputArena::default();
        arena.raw_mut().gamepads.push(GamepadState::new("Logitech Attack 3", 3, 11));
        let input = attack_3(&mut arena, 0).unwrap();
        arena.raw_mut().gamepads[0].buttons[4] = true;
        frame(&mut arena, &input);
        assert!((input.snapshot(&arena).rotate_axis + 1.0).abs() < 1e-5);
    }
}
