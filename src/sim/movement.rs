//! Move components
//!
//! Exactly one is active per entity. AI code swaps or retargets it each frame;
//! `step` then applies it to the body, scaled by the body's speed effects.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::context::Others;
use super::entity::{Body, EntityId};
use super::track::Track;
use crate::consts::{ROTATIONAL_VELOCITY_SET_GOTO_DEADBAND, TRAVEL_VELOCITY_SET_GOTO_DEADBAND};
use crate::{degrees_to_vec, min_change, normalize_degrees, vec_to_degrees};

/// Degrees per second of turning per unit of travel speed for smooth travel
pub const SMOOTH_TURN_DEGREES_PER_UNIT: f32 = 45.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum MoveComponent {
    #[default]
    Idle,
    FixedVelocity {
        velocity: Vec2,
    },
    /// Straight line to `target` without overshooting
    DirectTravel {
        target: Vec2,
        speed: f32,
        /// Turn towards this rotation while travelling; None leaves rotation alone
        desired_rotation: Option<f32>,
        /// Degrees per second, 0 snaps
        turn_velocity: f32,
    },
    /// Always moves forward, turning towards `target` at a rate tied to speed
    SmoothTravel {
        target: Vec2,
        speed: f32,
        turn_multiplier: f32,
    },
    /// Trail `leader` at a fixed distance
    Follow {
        leader: EntityId,
        distance: f32,
    },
    /// Travel along the level's track by distance
    Track {
        distance: f32,
        /// Units per second along the track; negative goes backwards
        velocity: f32,
    },
}

impl MoveComponent {
    pub fn direct(target: Vec2, speed: f32, desired_rotation: Option<f32>, turn_velocity: f32) -> Self {
        MoveComponent::DirectTravel {
            target,
            speed,
            desired_rotation,
            turn_velocity,
        }
    }

    /// Whether a direct travel has reached its target location and rotation
    pub fn is_at_target(&self, body: &Body) -> bool {
        match *self {
            MoveComponent::DirectTravel {
                target,
                desired_rotation,
                ..
            } => {
                let rotated = desired_rotation.is_none_or(|desired| {
                    min_change(desired, body.rotation, 360.0).abs() <= ROTATIONAL_VELOCITY_SET_GOTO_DEADBAND
                });
                body.location.distance(target) <= TRAVEL_VELOCITY_SET_GOTO_DEADBAND && rotated
            }
            _ => false,
        }
    }

    pub fn step(&mut self, body: &mut Body, delta: f32, track: &Track, others: Others<'_>) {
        let multiplier = body.speed_multiplier();
        match self {
            MoveComponent::Idle => {}
            MoveComponent::FixedVelocity { velocity } => {
                body.location += *velocity * multiplier * delta;
            }
            MoveComponent::DirectTravel {
                target,
                speed,
                desired_rotation,
                turn_velocity,
            } => {
                if let Some(desired) = *desired_rotation {
                    body.rotation = rotate_towards(body.rotation, desired, *turn_velocity * delta);
                }
                let amount = *speed * multiplier * delta;
                let away = *target - body.location;
                if away.length_squared() < amount * amount {
                    body.location = *target;
                } else {
                    body.location += away.normalize_or_zero() * amount;
                }
            }
            MoveComponent::SmoothTravel {
                target,
                speed,
                turn_multiplier,
            } => {
                let speed = *speed * multiplier;
                let away = *target - body.location;
                if away.length_squared() > f32::EPSILON {
                    let max_turn = speed * *turn_multiplier * SMOOTH_TURN_DEGREES_PER_UNIT * delta;
                    body.rotation = rotate_towards(body.rotation, vec_to_degrees(away), max_turn);
                }
                body.location += degrees_to_vec(body.rotation) * speed * delta;
            }
            MoveComponent::Follow { leader, distance } => {
                let Some(leader) = others.get(*leader) else {
                    return;
                };
                let to_leader = leader.body.location - body.location;
                let length = to_leader.length();
                if length > f32::EPSILON {
                    body.rotation = vec_to_degrees(to_leader);
                }
                if length > *distance {
                    body.location = leader.body.location - to_leader / length * *distance;
                }
            }
            MoveComponent::Track { distance, velocity } => {
                *distance = track.wrap(*distance + *velocity * multiplier * delta);
                body.location = track.point_at(*distance);
            }
        }
    }
}

/// Turn from `current` towards `desired` by at most `max_step` degrees. A step of 0 snaps.
pub fn rotate_towards(current: f32, desired: f32, max_step: f32) -> f32 {
    let change = min_change(desired, current, 360.0);
    if max_step <= 0.0 || change.abs() <= max_step {
        return normalize_degrees(desired);
    }
    normalize_degrees(current + change.signum() * max_step)
}
