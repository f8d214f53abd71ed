//! Detected-device signature to builder lookup
//!
//! Rules are checked in order; the first match builds the input. Anything
//! unrecognised gets the standard gamepad layout.

use super::arena::InputArena;
use super::builders;
use super::game_input::UsableGameInput;
use crate::error::Result;

pub type BuildFn = fn(&mut InputArena, usize) -> Result<UsableGameInput>;

#[derive(Debug, Clone)]
pub struct DeviceRule {
    pub label: &'static str,
    /// Lowercase substrings that must all appear in the device name
    pub all_of: &'static [&'static str],
    pub build: BuildFn,
}

impl DeviceRule {
    pub fn matches(&self, device_name: &str) -> bool {
        let name = device_name.to_lowercase();
        self.all_of.iter().all(|needle| name.contains(needle))
    }
}

#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    rules: Vec<DeviceRule>,
    fallback: DeviceRule,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self {
            rules: vec![
                DeviceRule {
                    label: "extreme 3d",
                    all_of: &["extreme", "logitech"],
                    build: builders::extreme_3d,
                },
                DeviceRule {
                    label: "attack 3",
                    all_of: &["attack", "logitech"],
                    build: builders::attack_3,
                },
            ],
            fallback: DeviceRule {
                label: "standard gamepad",
                all_of: &[],
                build: builders::standard_gamepad,
            },
        }
    }
}

impl DeviceRegistry {
    /// Add a rule checked after the existing ones
    pub fn push(&mut self, rule: DeviceRule) {
        self.rules.push(rule);
    }

    pub fn rule_for(&self, device_name: &str) -> &DeviceRule {
        self.rules
            .iter()
            .find(|rule| rule.matches(device_name))
            .unwrap_or(&self.fallback)
    }

    /// Build the input for gamepad slot `pad` from the name the platform reports
    pub fn build(&self, arena: &mut InputArena, pad: usize) -> Result<UsableGameInput> {
        let name = arena.raw().gamepad(pad).map(|g| g.name.clone()).unwrap_or_default();
        let rule = self.rule_for(&name);
        log::info!("Building '{}' layout for gamepad {} ({})", rule.label, pad, name);
        (rule.build)(arena, pad)
    }
}
