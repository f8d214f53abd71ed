//! Joystick value types
//!
//! A joystick is a pair of axis nodes plus a shape. Square joysticks come from
//! keys or d-pads where a diagonal reads (1, 1); those are normalized so every
//! direction tops out at magnitude 1.

use glam::Vec2;

use super::node::NodeId;
use crate::vec_to_degrees;

/// Handle to a joystick in the `InputArena`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JoystickId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoystickShape {
    /// Analog stick or tilt: magnitude clamped to 1
    Circular,
    /// Keys or d-pad: diagonals normalized
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Joystick {
    pub x: NodeId,
    pub y: NodeId,
    pub shape: JoystickShape,
}

/// Snapshot of a joystick for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoystickValue {
    pub x: f32,
    pub y: f32,
    /// In [0, 1]
    pub magnitude: f32,
    /// Direction in degrees, [0, 360). Meaningless while `deadzone` is set.
    pub angle_degrees: f32,
    /// Magnitude is too small for the direction to be trusted
    pub deadzone: bool,
}

impl Default for JoystickValue {
    fn default() -> Self {
        Self::CENTERED
    }
}

impl JoystickValue {
    pub const CENTERED: JoystickValue = JoystickValue {
        x: 0.0,
        y: 0.0,
        magnitude: 0.0,
        angle_degrees: 0.0,
        deadzone: true,
    };

    pub fn from_axes(x: f32, y: f32, shape: JoystickShape, deadzone: f32) -> Self {
        let mut v = Vec2::new(x, y);
        let len = v.length();
        match shape {
            JoystickShape::Circular => {
                if len > 1.0 {
                    v /= len;
                }
            }
            JoystickShape::Square => {
                // Map the square onto the unit disc: the edge of the square lands on the circle
                if len > 0.0 {
                    let edge = x.abs().max(y.abs()).min(1.0);
                    v *= edge / len;
                }
            }
        }
        let magnitude = v.length().min(1.0);
        Self {
            x: v.x,
            y: v.y,
            magnitude,
            angle_degrees: if magnitude > 0.0 { vec_to_degrees(v) } else { 0.0 },
            deadzone: magnitude < deadzone || magnitude == 0.0,
        }
    }

    pub fn vector(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// The vector, or zero inside the deadzone
    pub fn live_vector(&self) -> Vec2 {
        if self.deadzone { Vec2::ZERO } else { self.vector() }
    }
}
