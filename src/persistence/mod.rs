//! Option persistence
//!
//! A flat `key -> value` store for `ConfigurableOption`s. On startup the stored
//! values are applied to every matching option of an input; after a change the
//! input's current values are captured back. Keys the running build does not
//! know are kept untouched so older and newer builds can share one file.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::input::{ConfigurableOption, InputArena, StoredValue, UsableGameInput};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionStore {
    values: BTreeMap<String, StoredValue>,
}

impl OptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<StoredValue> {
        self.values.get(key).copied()
    }

    pub fn set(&mut self, key: impl Into<String>, value: StoredValue) {
        self.values.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Apply stored values to `input`'s options. Values are clamped to each
    /// option's range. Returns how many options were changed.
    pub fn apply(&self, arena: &mut InputArena, input: &UsableGameInput) -> usize {
        let mut applied = 0;
        for &id in input.options() {
            let option = arena.option_mut(id);
            if let Some(stored) = self.values.get(&option.key) {
                option.apply_stored(*stored);
                applied += 1;
            }
        }
        log::debug!("Applied {} stored options to {}", applied, input.name());
        applied
    }

    /// Record the current value of every option of `input`
    pub fn capture(&mut self, arena: &InputArena, input: &UsableGameInput) {
        for &id in input.options() {
            self.record(arena.option(id));
        }
    }

    /// Record one option's current value, e.g. right after `set_value` reported a change
    pub fn record(&mut self, option: &ConfigurableOption) {
        self.values.insert(option.key.clone(), option.stored());
    }

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

    /// Missing or unreadable files give an empty store
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("No stored options at {}: {}", path.display(), e);
            Self::default()
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
