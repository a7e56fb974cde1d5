//! Headless host: wires the simulation core to idle collaborators and
//! paces the frame loop. A real deployment swaps in a windowed renderer
//! and a streaming transport behind the same traits.

use std::time::{Duration, Instant};

use rand::Rng;
use tracing_subscriber::EnvFilter;

use astrobrawl_core::config::ArenaConfig;
use astrobrawl_core::game::GameState;
use astrobrawl_core::render::{IdleInput, NullRenderer, NullSink};
use astrobrawl_core::session::IdleSession;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ArenaConfig::load();
    let seed: u64 = rand::rng().random();
    tracing::info!(seed, fps = config.fps, "Astro Brawl host starting");

    // 0 = run until killed.
    let frame_budget: u64 = std::env::var("ASTROBRAWL_FRAMES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let frame_time = Duration::from_secs(1) / config.fps.max(1);
    let mut state = GameState::new(config, seed);

    let mut session = IdleSession;
    let mut renderer = NullRenderer;
    let mut sink = NullSink::default();
    let input = IdleInput;

    let mut frames: u64 = 0;
    while frame_budget == 0 || frames < frame_budget {
        let started = Instant::now();
        state.frame(&mut session, &mut renderer, &mut sink, &input);
        frames += 1;

        if frames % u64::from(state.config.fps.max(1)) == 0 {
            tracing::debug!(
                frame = state.clock.now(),
                players = state.active_player_count(),
                "tick"
            );
        }

        if let Some(rest) = frame_time.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }
    tracing::info!(frames, "host loop finished");
}
