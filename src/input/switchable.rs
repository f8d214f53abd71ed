//! Hot-swapping between input candidates
//!
//! The selection sticks while it stays connected. When it drops out the first
//! connected candidate takes over; with nothing connected the previous
//! selection is kept so its pending rumble is not lost.

use crate::error::{GameError, Result};

/// Handle to a `UsableGameInput` owned by the `ControllerManager`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputId(pub(crate) usize);

#[derive(Debug, Clone)]
pub struct SwitchableGameInput {
    name: String,
    candidates: Vec<InputId>,
    selected: usize,
}

impl SwitchableGameInput {
    /// Candidates are in priority order. At least one is required.
    pub fn new(name: impl Into<String>, candidates: Vec<InputId>) -> Result<Self> {
        if candidates.is_empty() {
            return Err(GameError::illegal("switchable input needs at least one candidate"));
        }
        Ok(Self {
            name: name.into(),
            candidates,
            selected: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn candidates(&self) -> &[InputId] {
        &self.candidates
    }

    pub fn current(&self) -> InputId {
        self.candidates[self.selected]
    }

    /// Re-evaluate the selection. Returns `(from, to)` when it changed.
    pub fn select(&mut self, is_connected: impl Fn(InputId) -> bool) -> Option<(InputId, InputId)> {
        let current = self.current();
        if is_connected(current) {
            return None;
        }
        let index = self.candidates.iter().position(|c| is_connected(*c))?;
        self.selected = index;
        Some((current, self.candidates[index]))
    }
}
