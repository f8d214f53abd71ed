//! Gameplay event sink and local achievement tracking
//!
//! The simulation reports discrete events with an amount. Delivery to an
//! online service is the platform's concern; `AchievementTracker` keeps counts
//! locally and unlocks threshold achievements.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GameEvent {
    GamesCompleted,
    SharksKilled,
    SnakesKilled,
    PowerupsCollected,
    LevelsCompleted,
}

impl GameEvent {
    pub const ALL: [GameEvent; 5] = [
        GameEvent::GamesCompleted,
        GameEvent::SharksKilled,
        GameEvent::SnakesKilled,
        GameEvent::PowerupsCollected,
        GameEvent::LevelsCompleted,
    ];

    /// Stable id used by achievement services
    pub fn id(self) -> &'static str {
        match self {
            GameEvent::GamesCompleted => "games-completed",
            GameEvent::SharksKilled => "sharks-killed",
            GameEvent::SnakesKilled => "snakes-killed",
            GameEvent::PowerupsCollected => "powerups-collected",
            GameEvent::LevelsCompleted => "levels-completed",
        }
    }
}

/// Receiver of gameplay events
pub trait EventSink {
    fn report(&mut self, event: GameEvent, amount: u32);
}

/// Records every report in order
impl EventSink for Vec<(GameEvent, u32)> {
    fn report(&mut self, event: GameEvent, amount: u32) {
        self.push((event, amount));
    }
}

/// Discards every report
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn report(&mut self, _event: GameEvent, _amount: u32) {}
}

/// An achievement unlocked once an event count reaches `threshold`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Achievement {
    pub id: &'static str,
    pub event: GameEvent,
    pub threshold: u64,
}

pub const ACHIEVEMENTS: [Achievement; 6] = [
    Achievement {
        id: "first-game",
        event: GameEvent::GamesCompleted,
        threshold: 1,
    },
    Achievement {
        id: "twenty-games",
        event: GameEvent::GamesCompleted,
        threshold: 20,
    },
    Achievement {
        id: "hundred-games",
        event: GameEvent::GamesCompleted,
        threshold: 100,
    },
    Achievement {
        id: "five-sharks",
        event: GameEvent::SharksKilled,
        threshold: 5,
    },
    Achievement {
        id: "twenty-sharks",
        event: GameEvent::SharksKilled,
        threshold: 20,
    },
    Achievement {
        id: "hundred-sharks",
        event: GameEvent::SharksKilled,
        threshold: 100,
    },
];

/// Persisted event counts and unlocked achievements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementTracker {
    /// Keyed by `GameEvent::id`
    pub counts: BTreeMap<String, u64>,
    pub unlocked: BTreeSet<String>,
}

impl AchievementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, event: GameEvent) -> u64 {
        self.counts.get(event.id()).copied().unwrap_or(0)
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.contains(id)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load progress, starting fresh if there is none
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path).map_err(GameError::from).and_then(|json| Self::from_json(&json)) {
            Ok(tracker) => {
                log::info!("Loaded achievement progress ({} unlocked)", tracker.unlocked.len());
                tracker
            }
            Err(e) => {
                log::info!("No achievement progress at {}, starting fresh: {}", path.display(), e);
                Self::new()
            }
        }
    }
}

impl EventSink for AchievementTracker {
    fn report(&mut self, event: GameEvent, amount: u32) {
        if amount == 0 {
            return;
        }
        let count = self.counts.entry(event.id().to_string()).or_insert(0);
        *count += u64::from(amount);
        let count = *count;
        for achievement in ACHIEVEMENTS.iter().filter(|a| a.event == event && count >= a.threshold) {
            if self.unlocked.insert(achievement.id.to_string()) {
                log::info!("Achievement unlocked: {}", achievement.id);
            }
        }
    }
}
