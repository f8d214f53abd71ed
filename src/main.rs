//! Track Shooter headless runner
//!
//! Drives a full session on the desktop input profile with scripted key
//! presses and logs what happened. Usage:
//!
//! ```text
//! track-shooter [config.json] [options.json]
//! ```

use track_shooter::input::{ControllerManager, DeviceRegistry, Key, RawInputState, builders};
use track_shooter::persistence::OptionStore;
use track_shooter::render::{LastFrame, instance_bytes};
use track_shooter::sim::{GameLevelGetter, GameLoop, GameSession};
use track_shooter::{GameEvent, Result, SimConfig};

const FRAME: f32 = 1.0 / 60.0;
const MAX_FRAMES: u32 = 60 * 60 * 5;

fn main() {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SimConfig::load_or_default(path),
        None => SimConfig::default(),
    };
    let options = args.next();

    if let Err(e) = run(config, options.as_deref()) {
        log::error!("Session aborted: {}", e);
        std::process::exit(1);
    }
}

fn run(config: SimConfig, options_path: Option<&str>) -> Result<()> {
    log::info!("Track Shooter (headless) starting with seed {}", config.seed);
    let mut manager = ControllerManager::new(config.controls);
    manager.arena_mut().set_debug_change_in_parent(config.debug_change_in_parent);
    *manager.arena_mut().raw_mut() = RawInputState::desktop();

    let keyboard = manager.build_input(builders::keyboard_mouse)?;
    let mut candidates = vec![keyboard];
    let registry = DeviceRegistry::default();
    let pads = manager.arena().raw().gamepads.len();
    for pad in 0..pads {
        candidates.push(manager.build_input(|arena| registry.build(arena, pad))?);
    }

    let store = options_path.map(OptionStore::load_or_default).unwrap_or_default();
    for id in candidates.iter().copied() {
        let input = manager.input(id).clone();
        store.apply(manager.arena_mut(), &input);
    }

    let switch = manager.add_switchable("player one", candidates)?;
    let getter = GameLevelGetter::new(config.seed);
    let game = GameLoop::new(config, Box::new(getter));
    let mut session = GameSession::new(manager, switch, game);
    let mut sink = LastFrame::default();

    let mut frames = 0;
    while frames < MAX_FRAMES {
        script_keys(session.manager.arena_mut().raw_mut(), frames);
        let report = session.frame(FRAME, &mut sink);
        for (target, request) in session.manager.drain_rumble() {
            log::trace!("Rumble {:?}: {:?}", target, request);
        }
        frames += 1;
        if report.game_over {
            break;
        }
    }

    let world = session.game.world();
    let score = world.player_state(session.game.player()).map_or(0, |p| p.score);
    log::info!(
        "Stopped after {} frames on level {} with score {}, {} hits, {} bytes of instances in the last frame",
        frames,
        world.level().map_or(0, |l| l.number()),
        score,
        world.collisions().hits(),
        instance_bytes(&sink.instances).len()
    );
    for event in [GameEvent::SharksKilled, GameEvent::SnakesKilled, GameEvent::LevelsCompleted] {
        log::info!("{}: {}", event.id(), session.achievements.count(event));
    }

    if let Some(path) = options_path {
        let mut store = store;
        let current = session.manager.current(switch).clone();
        store.capture(session.manager.arena(), &current);
        store.save(path)?;
    }
    Ok(())
}

/// Circle the track, sweep the aim back and forth and fire in bursts
fn script_keys(raw: &mut RawInputState, frame: u32) {
    raw.time_ms = u64::from(frame) * 1000 / 60;
    let phase = frame % 240;
    raw.set_key(Key::D, true);
    raw.set_key(Key::Left, phase < 120);
    raw.set_key(Key::Right, phase >= 120);
    raw.set_key(Key::Space, frame % 12 < 6);
    raw.set_key(Key::F, frame % 600 == 0);
}
