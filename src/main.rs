//! Chase2D headless entry point
//!
//! Lays out a scene, then drives the simulation with a scripted player and
//! the sandbox physics until the run ends.
//!
//! Usage: `chase2d [tuning.json] [seed]`

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use chase2d::Tuning;
use chase2d::consts::*;
use chase2d::sandbox::Sandbox;
use chase2d::sim::{Building, EntityKind, GameEvent, GameMode, GameState, TickInput, nearest, tick};

/// Host frame time; the simulation substeps at `SIM_DT`
const FRAME_DT: f32 = 1.0 / 30.0;
/// Stop after this many simulated seconds
const RUN_LIMIT_SECS: f32 = 120.0;

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => Tuning::load_or_default(path),
        None => Tuning::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);

    log::info!("Chase2D (headless) starting, seed {}", seed);

    let mut state = GameState::new(seed, tuning);
    populate(&mut state, seed);
    state.show_idle();

    let mut sandbox = Sandbox::new();
    let mut input = TickInput {
        start: true,
        accelerate: true,
        ..Default::default()
    };
    let mut accumulator = 0.0;
    let mut next_report = 1.0;

    while state.mode() != GameMode::GameOver && state.economy().time < RUN_LIMIT_SECS {
        accumulator += FRAME_DT;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            input.steer = steer_for_cash(&state);
            tick(&mut state, &input, SIM_DT);
            for contact in sandbox.step(&mut state, SIM_DT) {
                state.handle_contact(&contact);
            }
            accumulator -= SIM_DT;
            substeps += 1;

            // One-shot inputs
            input.start = false;
        }

        for event in state.drain_events() {
            match event {
                GameEvent::PowerUp(_) | GameEvent::ModeChanged(_) => {}
                other => log::debug!("{:?}", other),
            }
        }

        if state.economy().time >= next_report {
            next_report += 1.0;
            match serde_json::to_string(&state.hud()) {
                Ok(hud) => log::info!("HUD {}", hud),
                Err(e) => log::warn!("Failed to serialize HUD: {}", e),
            }
        }
    }

    let economy = state.economy();
    log::info!(
        "Run ended after {:.1}s: score {}, health {:.0}",
        economy.time,
        economy.score,
        economy.player_health()
    );
}

/// Head for the closest pickup
fn steer_for_cash(state: &GameState) -> Option<Vec2> {
    let player = state.player().pos;
    nearest(player, &state.population().cash).map(|cash| cash.pos - player)
}

/// Scatter buildings, traffic and police around the origin
fn populate(state: &mut GameState, seed: u64) {
    let mut rng = Pcg32::seed_from_u64(seed.wrapping_add(1));
    let half = state.tuning.play_area_half_extent;

    for _ in 0..40 {
        let center = Vec2::new(rng.random_range(-half..=half), rng.random_range(-half..=half));
        // Keep the start clear
        if center.length() < 200.0 {
            continue;
        }
        let size = Vec2::new(rng.random_range(60.0..=200.0), rng.random_range(60.0..=200.0));
        state.add_building(Building::new(center, size));
    }

    let around = |rng: &mut Pcg32, min: f32, max: f32| {
        let angle = rng.random_range(-std::f32::consts::PI..std::f32::consts::PI);
        Vec2::from_angle(angle) * rng.random_range(min..=max)
    };

    let spawns = [
        (EntityKind::PedestrianCar, 12),
        (EntityKind::CopCar, 5),
        (EntityKind::CopTruck, 2),
        (EntityKind::CopTank, 1),
    ];
    for (kind, count) in spawns {
        for _ in 0..count {
            let pos = around(&mut rng, 300.0, 900.0);
            state.spawn(kind, pos);
        }
    }

    log::info!(
        "Scene ready: {} buildings, {} cops",
        state.buildings().len(),
        state.economy().number_of_cops
    );
}
