//! Simulation configuration
//!
//! Loaded once at startup and handed to every update through `SimContext`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Input tuning shared by every node in the input graph
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Full-range analog values with a magnitude below this read as 0
    pub full_analog_deadzone: f32,
    /// Analog values at or above this magnitude count as "down"
    pub analog_down_threshold: f32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            full_analog_deadzone: 0.1,
            analog_down_threshold: 0.5,
        }
    }
}

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === World ===
    pub world_width: f32,
    pub world_height: f32,
    pub starting_lives: u32,
    /// Seed for level generation
    pub seed: u64,

    // === Frame stepping ===
    /// Deltas above this (seconds) are replayed in virtual sub-steps
    pub large_delta_threshold: f32,
    /// Length of one virtual sub-step (seconds)
    pub virtual_dt: f32,
    /// Sub-step cap per host frame
    pub max_substeps: u32,

    // === Standby timings (ms in STANDBY) ===
    pub respawn_after_ms: u64,
    pub resume_after_ms: u64,
    pub game_over_after_ms: u64,

    // === Diagnostics ===
    /// Log when a controller part is attached to a second parent
    pub debug_change_in_parent: bool,

    pub controls: ControlConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world_width: 18.0,
            world_height: 18.0,
            starting_lives: 3,
            seed: 0x5eed,

            large_delta_threshold: 1.0,
            virtual_dt: 1.0 / 30.0,
            max_substeps: 10,

            respawn_after_ms: 750,
            resume_after_ms: 1500,
            game_over_after_ms: 4000,

            debug_change_in_parent: true,

            controls: ControlConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load from `path`, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Using default config ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Number of virtual sub-steps needed to cover `delta`, or None if `delta` is normal
    pub fn substeps_for(&self, delta: f32) -> Option<u32> {
        if delta <= self.large_delta_threshold {
            return None;
        }
        let needed = (delta / self.virtual_dt).ceil() as u32;
        Some(needed.clamp(1, self.max_substeps.max(1)))
    }
}
