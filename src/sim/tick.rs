//! Frame driver
//!
//! `GameLoop` advances the world once per host frame, replays oversized frames
//! as fixed virtual sub-steps, and applies the level mode timing rules after
//! each step. `GameSession` adds input polling, rumble forwarding and the
//! render hand-off around it.

use glam::Vec2;

use super::context::SimContext;
use super::entity::{Entity, EntityId};
use super::level::LevelMode;
use super::level_getter::LevelGetter;
use super::world::World;
use crate::achievements::{AchievementTracker, EventSink, GameEvent};
use crate::input::{ControlSnapshot, ControllerManager, RumbleRequest, SwitchId};
use crate::render::RenderSink;
use crate::settings::SimConfig;

/// What one host frame did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Simulation steps run; more than one after a stall
    pub steps: u32,
    pub rumble: Vec<RumbleRequest>,
    pub game_over: bool,
}

pub struct GameLoop {
    world: World,
    player: EntityId,
    config: SimConfig,
    game_over: bool,
}

impl GameLoop {
    pub fn new(config: SimConfig, getter: Box<dyn LevelGetter>) -> Self {
        let mut world = World::new(config.world_width, config.world_height, getter);
        let player = world.next_id();
        world.add_entity(Entity::player(player, config.starting_lives, Vec2::ZERO));
        Self {
            world,
            player,
            config,
            game_over: false,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn player(&self) -> EntityId {
        self.player
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn update(&mut self, delta: f32, controls: &ControlSnapshot, events: &mut dyn EventSink) -> FrameReport {
        if self.game_over {
            return FrameReport {
                game_over: true,
                ..Default::default()
            };
        }
        let Self {
            world,
            player,
            config,
            game_over,
        } = self;
        let config = &*config;

        let (steps, step_delta) = match config.substeps_for(delta) {
            Some(steps) => {
                log::warn!(
                    "Frame took {:.2}s, catching up with {} steps of {:.3}s",
                    delta,
                    steps,
                    config.virtual_dt
                );
                (steps, config.virtual_dt)
            }
            None => (1, delta),
        };

        let mut ctx = SimContext::new(config, controls, events);
        let mut run = 0;
        while run < steps && !*game_over {
            world.update(step_delta, &mut ctx);
            *game_over = apply_mode_rules(world, *player, config, &mut ctx);
            run += 1;
        }
        FrameReport {
            steps: run,
            rumble: ctx.take_rumble(),
            game_over: *game_over,
        }
    }
}

/// Level mode transitions that depend on the player. Returns true on game over.
///
/// In STANDBY a missing player is re-added before the resume rule is looked at,
/// so both thresholds can never fire on the same step.
fn apply_mode_rules(world: &mut World, player: EntityId, config: &SimConfig, ctx: &mut SimContext<'_>) -> bool {
    let Some(level) = world.level() else {
        return false;
    };
    let (mode, time) = (level.mode(), level.mode_time_ms());
    let lives = world.player_state(player).map_or(0, |p| p.lives);
    let present = world.contains(player);

    match mode {
        LevelMode::Normal => {
            if lives == 0 || !present {
                log::info!("Player down ({} lives left), resetting", lives);
                world.set_mode(LevelMode::Reset);
            }
        }
        // Promoted to STANDBY by the world once everything is back home
        LevelMode::Reset => {}
        LevelMode::Standby => {
            if lives == 0 {
                if time >= config.game_over_after_ms as f64 {
                    let score = world.player_state(player).map_or(0, |p| p.score);
                    log::info!("Game over with score {}", score);
                    ctx.report(GameEvent::GamesCompleted, 1);
                    return true;
                }
            } else if !present {
                if time >= config.respawn_after_ms as f64 {
                    if let Err(e) = world.respawn(player) {
                        log::error!("Could not respawn player: {}", e);
                    }
                }
            } else if time >= config.resume_after_ms as f64 {
                world.set_mode(LevelMode::Normal);
            }
        }
    }
    false
}

/// Input, simulation and presentation for one player
pub struct GameSession {
    pub manager: ControllerManager,
    pub switch: SwitchId,
    pub game: GameLoop,
    pub achievements: AchievementTracker,
}

impl GameSession {
    pub fn new(manager: ControllerManager, switch: SwitchId, game: GameLoop) -> Self {
        Self {
            manager,
            switch,
            game,
            achievements: AchievementTracker::new(),
        }
    }

    /// Poll input, advance the game, forward rumble, then draw the settled state
    pub fn frame(&mut self, delta: f32, sink: &mut dyn RenderSink) -> FrameReport {
        self.manager.update();
        let controls = self.manager.snapshot(self.switch);
        let report = self.game.update(delta, &controls, &mut self.achievements);
        for request in &report.rumble {
            self.manager.rumble(self.switch, *request);
        }
        sink.draw(&self.game.world().render_snapshot());
        report
    }
}
