//! Level generation

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::chain;
use super::enemy::SnakeDifficulty;
use super::entity::{Entity, IdAllocator};
use super::level::Level;
use super::level_function::{Delayed, PowerupFunction};
use super::player::ShotType;
use super::powerup::PowerupKind;
use super::track::Track;
use crate::error::{GameError, Result};

/// What a level getter may know about the player when building the next level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerStatus {
    pub location: Vec2,
    pub score: u64,
    pub lives: u32,
}

/// Supplies the world with levels, one per call, whenever the current one is done
pub trait LevelGetter {
    fn next_level(&mut self, player: Option<&PlayerStatus>, ids: &mut IdAllocator) -> Level;
}

const SHARK_STARTS: [Vec2; 4] = [
    Vec2::new(1.0, 1.0),
    Vec2::new(-1.0, 1.0),
    Vec2::new(-1.0, -1.0),
    Vec2::new(1.0, -1.0),
];
const SNAKE_BASE_LENGTH: u32 = 6;
const SNAKE_MAX_LENGTH: u32 = 20;
/// Levels from this number on get a second, late fruit
const BONUS_FRUIT_FROM_LEVEL: u32 = 3;
const BONUS_FRUIT_DELAY_MS: f64 = 40_000.0;

/// Alternates shark and snake levels over the built-in tracks
#[derive(Debug, Clone)]
pub struct GameLevelGetter {
    number: u32,
    tracks: Vec<Track>,
    difficulty: SnakeDifficulty,
    rng: Pcg32,
}

impl GameLevelGetter {
    pub fn new(seed: u64) -> Self {
        Self {
            number: 1,
            tracks: vec![Track::kingdom(), Track::weird(), Track::circle()],
            difficulty: SnakeDifficulty::Normal,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn with_tracks(seed: u64, tracks: Vec<Track>) -> Result<Self> {
        if tracks.is_empty() {
            return Err(GameError::illegal("a level getter needs at least one track"));
        }
        Ok(Self {
            tracks,
            ..Self::new(seed)
        })
    }

    pub fn with_difficulty(mut self, difficulty: SnakeDifficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Number of the level the next call returns
    pub fn upcoming(&self) -> u32 {
        self.number
    }

    fn add_sharks(level: &mut Level, ids: &mut IdAllocator) {
        let spacing = level.track().total_distance() / SHARK_STARTS.len() as f32;
        for (i, start) in SHARK_STARTS.iter().enumerate() {
            let sign = ((i % 2) * 2) as f32 - 1.0;
            let offset = sign * (i as f32 / 2.0) * spacing;
            let angle = 45.0 + 90.0 * i as f32;
            level.add_to_roster(Entity::shark(ids.next_id(), *start, angle, offset));
        }
    }

    fn add_snake(&self, level: &mut Level, player: Option<&PlayerStatus>, ids: &mut IdAllocator) {
        let length = (SNAKE_BASE_LENGTH + level.number() / 2).min(SNAKE_MAX_LENGTH);
        // Start on the far side of the origin from the player
        let away = player.map_or(Vec2::NEG_Y, |p| -p.location.normalize_or(Vec2::Y));
        let head = away * 2.0;
        let roster = level.roster_mut();
        let first = roster.len();
        for i in 0..length {
            let location = head + away * (i as f32 * 0.4);
            roster.push(Entity::snake_part(ids.next_id(), location, self.difficulty));
        }
        for i in first + 1..roster.len() {
            let (part, leader) = (roster[i].id, roster[i - 1].id);
            if let Err(e) = chain::follow(roster, part, Some(leader)) {
                log::error!("Could not link snake part: {}", e);
            }
        }
    }

    fn random_powerup(&mut self) -> PowerupKind {
        match self.rng.random_range(0..3) {
            0 => PowerupKind::Shot(ShotType::Triple),
            1 => PowerupKind::Shot(ShotType::ShotGun),
            _ => PowerupKind::Fruit {
                points: 500 + 100 * u64::from(self.number),
            },
        }
    }
}

impl LevelGetter for GameLevelGetter {
    fn next_level(&mut self, player: Option<&PlayerStatus>, ids: &mut IdAllocator) -> Level {
        let number = self.number;
        let track = self.tracks[(number as usize - 1) % self.tracks.len()].clone();
        let mut level = Level::new(number, track);
        if number % 2 == 1 {
            Self::add_sharks(&mut level, ids);
        } else {
            self.add_snake(&mut level, player, ids);
        }

        let kind = self.random_powerup();
        level.add_function(Box::new(PowerupFunction::new(
            PowerupFunction::DEFAULT_ADD_AT_MS,
            PowerupFunction::DEFAULT_STAY_MS,
            kind,
            Vec2::ZERO,
        )));
        if number >= BONUS_FRUIT_FROM_LEVEL {
            let fruit = PowerupKind::Fruit {
                points: 1000 + 100 * u64::from(number),
            };
            let late = PowerupFunction::new(0.0, PowerupFunction::DEFAULT_STAY_MS, fruit, Vec2::ZERO);
            level.add_function(Box::new(Delayed::new(BONUS_FRUIT_DELAY_MS, Box::new(late))));
        }

        log::info!(
            "Generated level {} on {} (power-up {:?}, score {})",
            number,
            level.track().name(),
            kind,
            player.map_or(0, |p| p.score)
        );
        self.number += 1;
        level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::EntityKind;

    #[test]
    fn test_alternates_sharks_and_snakes() {
        let mut getter = GameLevelGetter::new(7);
        let mut ids = IdAllocator::default();

        let mut first = getter.next_level(None, &mut ids);
        assert_eq!(first.number(), 1);
        assert_eq!(first.track().name(), "kingdom");
        let sharks = first.start();
        assert_eq!(sharks.len(), 4);
        let offsets: Vec<f32> = sharks
            .iter()
            .map(|e| match &e.kind {
                EntityKind::Shark(state) => state.track_offset,
                _ => f32::NAN,
            })
            .collect();
        let spacing = Track::kingdom().total_distance() / 4.0;
        assert_eq!(offsets[0], 0.0);
        assert!((offsets[1] - spacing * 0.5).abs() < 1e-4);
        assert!((offsets[2] + spacing).abs() < 1e-4);
        assert!((sharks[1].body.rotation - 135.0).abs() < 1e-4);

        let status = PlayerStatus {
            location: Vec2::new(6.0, 0.0),
            score: 400,
            lives: 3,
        };
        let mut second = getter.next_level(Some(&status), &mut ids);
        assert_eq!(second.track().name(), "weird");
        let snake = second.start();
        assert_eq!(snake.len(), (SNAKE_BASE_LENGTH + 1) as usize);
        assert!(chain::is_symmetric(&snake));
        assert_eq!(chain::number_behind(&snake, snake[0].id).unwrap(), snake.len() - 1);
        assert!(snake[0].body.location.x < 0.0);
        assert_eq!(getter.upcoming(), 3);
    }

    #[test]
    fn test_same_seed_same_levels() {
        let mut ids = IdAllocator::default();
        let mut a = GameLevelGetter::new(42);
        let mut b = GameLevelGetter::new(42);
        for _ in 0..6 {
            assert_eq!(a.random_powerup(), b.random_powerup());
        }
        assert_eq!(
            a.next_level(None, &mut ids).function_count(),
            b.next_level(None, &mut ids).function_count()
        );
    }

    #[test]
    fn test_empty_tracks_rejected() {
        assert!(GameLevelGetter::with_tracks(1, Vec::new()).is_err());
    }
}
