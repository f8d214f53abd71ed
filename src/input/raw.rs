//! Raw device state written by the platform once per frame
//!
//! The input graph never talks to devices directly. The platform fills a
//! `RawInputState` before `ControllerManager::update()` and every leaf node
//! reads from it.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Keyboard keys the game binds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    W,
    A,
    S,
    D,
    F,
    Up,
    Down,
    Left,
    Right,
    Space,
    Enter,
    Escape,
    Backspace,
    ShiftLeft,
    /// Android back key
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Which optional devices the platform currently reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Peripherals {
    pub keyboard: bool,
    pub mouse: bool,
    pub multitouch: bool,
    pub gyroscope: bool,
    pub accelerometer: bool,
    pub vibrator: bool,
}

/// Device orientation in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tilt {
    /// Up and down
    pub pitch: f32,
    /// Side to side
    pub roll: f32,
}

/// One physical gamepad slot
#[derive(Debug, Clone, Default)]
pub struct GamepadState {
    pub name: String,
    pub connected: bool,
    pub rumble_capable: bool,
    /// Raw axis values in [-1, 1]
    pub axes: Vec<f32>,
    pub buttons: Vec<bool>,
}

impl GamepadState {
    pub fn new(name: impl Into<String>, axis_count: usize, button_count: usize) -> Self {
        Self {
            name: name.into(),
            connected: true,
            rumble_capable: false,
            axes: vec![0.0; axis_count],
            buttons: vec![false; button_count],
        }
    }

    pub fn axis(&self, index: usize) -> f32 {
        self.axes.get(index).copied().unwrap_or(0.0)
    }

    pub fn button(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }
}

/// Everything the input graph can observe for one frame
#[derive(Debug, Clone, Default)]
pub struct RawInputState {
    /// Monotonic platform time
    pub time_ms: u64,
    pub peripherals: Peripherals,
    pub keys_down: HashSet<Key>,
    pub mouse_buttons_down: HashSet<MouseButton>,
    /// Pointer movement since last frame, in pixels
    pub pointer_delta: Vec2,
    /// Touch slots in pixel coordinates (index = pointer id)
    pub pointers: Vec<Option<Vec2>>,
    /// Number of pointer slots the platform supports
    pub pointer_capacity: usize,
    pub screen_size: Vec2,
    pub tilt: Tilt,
    /// Linear acceleration magnitude with gravity removed (m/s²)
    pub acceleration: f32,
    pub gamepads: Vec<GamepadState>,
}

impl RawInputState {
    /// Desktop defaults: keyboard and mouse present, 1280x720
    pub fn desktop() -> Self {
        Self {
            peripherals: Peripherals {
                keyboard: true,
                mouse: true,
                ..Default::default()
            },
            pointer_capacity: 1,
            screen_size: Vec2::new(1280.0, 720.0),
            ..Default::default()
        }
    }

    /// Phone defaults: touch, gyro, accelerometer and vibrator present
    pub fn phone() -> Self {
        Self {
            peripherals: Peripherals {
                multitouch: true,
                gyroscope: true,
                accelerometer: true,
                vibrator: true,
                ..Default::default()
            },
            pointer_capacity: 10,
            screen_size: Vec2::new(1080.0, 1920.0),
            ..Default::default()
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn set_key(&mut self, key: Key, down: bool) {
        if down {
            self.keys_down.insert(key);
        } else {
            self.keys_down.remove(&key);
        }
    }

    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons_down.contains(&button)
    }

    /// Pointer `index` in pixels, if touched
    pub fn pointer(&self, index: usize) -> Result<Option<Vec2>> {
        if index >= self.pointer_capacity {
            return Err(GameError::PointerOutOfRange {
                index,
                capacity: self.pointer_capacity,
            });
        }
        Ok(self.pointers.get(index).copied().flatten())
    }

    pub fn is_touched(&self) -> bool {
        self.pointers.iter().any(Option::is_some)
    }

    /// Convert a pixel position to [0, 1] screen proportions
    pub fn proportional(&self, pixel: Vec2) -> Vec2 {
        if self.screen_size.x <= 0.0 || self.screen_size.y <= 0.0 {
            return Vec2::ZERO;
        }
        pixel / self.screen_size
    }

    pub fn gamepad(&self, pad: usize) -> Option<&GamepadState> {
        self.gamepads.get(pad)
    }

    pub fn gamepad_mut(&mut self, pad: usize) -> Option<&mut GamepadState> {
        self.gamepads.get_mut(pad)
    }

    pub fn gamepad_connected(&self, pad: usize) -> bool {
        self.gamepad(pad).is_some_and(|g| g.connected)
    }
}

/// Region of the screen in [0, 1] proportions (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScreenArea {
    LeftOf(f32),
    RightOf(f32),
    Rect { x: f32, y: f32, width: f32, height: f32 },
}

impl ScreenArea {
    pub fn contains(&self, p: Vec2) -> bool {
        match *self {
            ScreenArea::LeftOf(x) => p.x < x,
            ScreenArea::RightOf(x) => p.x >= x,
            ScreenArea::Rect {
                x,
                y,
                width,
                height,
            } => p.x >= x && p.x <= x + width && p.y >= y && p.y <= y + height,
        }
    }
}
