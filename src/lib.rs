//! Track Shooter - a track-bound arcade shooter
//!
//! Core modules:
//! - `input`: Composable input-signal graph (nodes, options, controller parts, switching)
//! - `sim`: Single-threaded world loop (entities, collisions, levels)
//! - `settings`: Simulation configuration carried through every update
//! - `persistence`: Option store for per-control configuration values
//! - `achievements`: Gameplay event sink
//! - `render`: Render snapshot handed to the draw collaborator

pub mod achievements;
pub mod error;
pub mod input;
pub mod persistence;
pub mod render;
pub mod settings;
pub mod sim;

pub use achievements::{AchievementTracker, EventSink, GameEvent};
pub use error::{GameError, Result};
pub use settings::{ControlConfig, SimConfig};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Player travel speed along the track (world units/s)
    pub const PLAYER_VELOCITY: f32 = 5.0;
    /// Player rotation speed at full rotate-axis deflection (degrees/s)
    pub const PLAYER_ROTATION_SPEED: f32 = 270.0;
    /// Speed multiplier while the slow button is held
    pub const SLOW_MULTIPLIER: f32 = 0.5;

    /// Bullet speeds (world units/s)
    pub const BULLET_SPEED: f32 = 22.0;
    pub const SHOT_GUN_BULLET_SPEED: f32 = 15.0;
    /// Distance a bullet travels before it disappears
    pub const BULLET_SHOT_DISTANCE: f32 = 15.0;
    /// Minimum time between shots while fire is held (ms)
    pub const FIRE_COOLDOWN_MS: u32 = 180;

    /// In degrees
    pub const ROTATIONAL_VELOCITY_SET_GOTO_DEADBAND: f32 = 10.0;
    /// In world units
    pub const TRAVEL_VELOCITY_SET_GOTO_DEADBAND: f32 = 0.5;

    /// Enemy defaults
    pub const SHARK_SPEED: f32 = 3.0;
    pub const SHARK_TURN_VELOCITY: f32 = 200.0;
    pub const SNAKE_DEFAULT_SPEED: f32 = 4.0;
    pub const SNAKE_DEFAULT_TURN_MULTIPLIER: f32 = 2.0;

    /// Points
    pub const SHARK_POINTS: u64 = 100;
    pub const SNAKE_PART_POINTS: u64 = 50;

    /// Max touch pointers scanned per frame
    pub const MAX_TOUCH_POINTERS: usize = 20;
}

/// Smallest signed change that takes `current` to `desired` on a circle of size `wrap`
///
/// `min_change(10.0, 350.0, 360.0) == 20.0`
#[inline]
pub fn min_change(desired: f32, current: f32, wrap: f32) -> f32 {
    let mut change = (desired - current) % wrap;
    if change > wrap / 2.0 {
        change -= wrap;
    } else if change < -wrap / 2.0 {
        change += wrap;
    }
    change
}

/// Normalize degrees to [0, 360)
#[inline]
pub fn normalize_degrees(degrees: f32) -> f32 {
    let r = degrees % 360.0;
    if r < 0.0 { r + 360.0 } else { r }
}

/// Unit vector pointing at `degrees`
#[inline]
pub fn degrees_to_vec(degrees: f32) -> Vec2 {
    let radians = degrees.to_radians();
    Vec2::new(radians.cos(), radians.sin())
}

/// Angle of a vector in degrees, [0, 360)
#[inline]
pub fn vec_to_degrees(v: Vec2) -> f32 {
    normalize_degrees(v.y.atan2(v.x).to_degrees())
}
