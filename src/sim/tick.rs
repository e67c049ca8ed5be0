//! Fixed timestep simulation tick
//!
//! Advances one frame of gameplay in a fixed order. Contacts arrive between
//! ticks through `GameState::handle_contact`.

use glam::Vec2;

use super::behavior::{Throttle, nearest};
use super::population::{Faction, expire_bullets, maintain_faction, top_up_cash};
use super::state::GameState;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Direction the player wants to face (stick/keys); `None` holds heading
    pub steer: Option<Vec2>,
    pub accelerate: bool,
    pub brake: bool,
    /// Fire at the nearest cop
    pub fire: bool,
    /// Leave the menu or idle screen
    pub start: bool,
}

impl TickInput {
    /// Brake wins over accelerate
    pub fn throttle(&self) -> Throttle {
        if self.brake {
            Throttle::Reverse
        } else if self.accelerate {
            Throttle::Forward
        } else {
            Throttle::Coast
        }
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.start {
        state.start();
    }

    state.check_game_over();
    if !state.modes.is_playing() {
        return;
    }

    state.economy.advance(dt, state.tuning.score_per_second);

    for faction in Faction::MAINTENANCE_ORDER {
        maintain_faction(state, faction, dt);
    }

    drive_player(state, input, dt);
    expire_bullets(state, dt);
    top_up_cash(state);
}

/// Steer, throttle and shoot for the player car
fn drive_player(state: &mut GameState, input: &TickInput, dt: f32) {
    let now = state.economy.time;
    let speed_cap = state.economy.player_speed;
    let wants_fire = input.fire || state.tuning.player_auto_fire;
    // Only cops that survived this tick's maintenance
    let target = nearest(state.player.pos, state.population.cops()).map(|cop| cop.pos);

    let player = &mut state.player;
    player.impulse = Vec2::ZERO;

    if let Some(driving) = &player.driving {
        if let Some(dir) = input.steer.filter(|d| d.is_finite() && *d != Vec2::ZERO) {
            player.heading = driving.turn_toward(player.heading, dir.y.atan2(dir.x), dt);
        }
        player.impulse = driving.thrust(player.heading, player.vel, input.throttle(), speed_cap);
    }

    let (id, pos) = (player.id, player.pos);
    let shot = match (&mut player.shooting, wants_fire) {
        (Some(gun), true) => gun.fire(now, pos, target),
        _ => None,
    };
    if let Some(vel) = shot {
        state.spawn_bullet(id, pos, vel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::entity::EntityKind;
    use crate::sim::mode::GameMode;
    use crate::sim::state::GameEvent;
    use crate::tuning::Tuning;

    fn quiet_tuning() -> Tuning {
        Tuning {
            player_auto_fire: false,
            ..Default::default()
        }
    }

    fn start_input() -> TickInput {
        TickInput {
            start: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_nothing_runs_in_menu() {
        let mut state = GameState::new(1, quiet_tuning());
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.mode(), GameMode::Menu);
        assert_eq!(state.economy().time, 0.0);
        assert!(state.population().cash.is_empty());
    }

    #[test]
    fn test_start_input_begins_play() {
        let mut state = GameState::new(1, quiet_tuning());
        tick(&mut state, &start_input(), SIM_DT);
        assert_eq!(state.mode(), GameMode::Playing);
        assert!(state.economy().time > 0.0);
        assert_eq!(
            state.economy().cash_in_scene,
            state.tuning.initial_cash_number
        );
    }

    #[test]
    fn test_game_over_stops_the_tick() {
        let mut state = GameState::new(1, quiet_tuning());
        tick(&mut state, &start_input(), SIM_DT);
        state.damage_player(10_000.0);
        let time = state.economy().time;

        tick(&mut state, &TickInput::default(), SIM_DT);

        assert_eq!(state.mode(), GameMode::GameOver);
        assert_eq!(state.economy().time, time);
        assert!(state.events().iter().any(|e| matches!(
            e,
            GameEvent::ModeChanged(t) if t.to == GameMode::GameOver
        )));

        // Terminal: start is ignored
        tick(&mut state, &start_input(), SIM_DT);
        assert_eq!(state.mode(), GameMode::GameOver);
    }

    #[test]
    fn test_player_thrust_and_steering() {
        let mut state = GameState::new(1, quiet_tuning());
        let input = TickInput {
            steer: Some(Vec2::Y),
            accelerate: true,
            start: true,
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        let player = state.player();
        assert!(player.heading > 0.0);
        assert!(player.impulse.length() > 0.0);

        let brake = TickInput {
            brake: true,
            accelerate: true,
            ..Default::default()
        };
        assert_eq!(brake.throttle(), Throttle::Reverse);
    }

    #[test]
    fn test_player_fires_at_nearest_cop() {
        let mut state = GameState::new(1, quiet_tuning());
        state.start();
        state.spawn(EntityKind::CopCar, Vec2::new(0.0, 300.0));
        let near = state.spawn(EntityKind::CopCar, Vec2::new(-100.0, 0.0)).unwrap();
        let input = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);

        let player_id = state.player().id;
        let shots: Vec<_> = state
            .population()
            .bullets
            .iter()
            .filter(|b| b.source == Some(player_id))
            .collect();
        assert_eq!(shots.len(), 1);
        assert!(shots[0].vel.x < 0.0, "should aim at cop {near}");
    }

    #[test]
    fn test_no_cops_no_shot() {
        let mut state = GameState::new(1, Tuning::default());
        state.start();
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.population().bullets.is_empty());
    }

    #[test]
    fn test_despawned_cop_is_not_targeted() {
        let mut state = GameState::new(
            1,
            Tuning {
                despawn_radius: 200.0,
                ..Default::default()
            },
        );
        state.start();
        state.spawn(EntityKind::CopCar, Vec2::new(250.0, 0.0));
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.economy().number_of_cops, 0);
        assert!(state.population().bullets.is_empty());
    }

    #[test]
    fn test_score_accrues_with_time() {
        let mut state = GameState::new(1, quiet_tuning());
        tick(&mut state, &start_input(), SIM_DT);
        for _ in 0..120 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert!(state.economy().score >= 19);
    }

    #[test]
    fn test_determinism() {
        let run = || {
            let mut state = GameState::new(99999, Tuning::default());
            state.spawn(EntityKind::PedestrianCar, Vec2::new(50.0, 50.0));
            state.spawn(EntityKind::CopTank, Vec2::new(-80.0, 20.0));
            let inputs = [
                start_input(),
                TickInput {
                    steer: Some(Vec2::new(0.3, 1.0)),
                    accelerate: true,
                    ..Default::default()
                },
                TickInput::default(),
            ];
            for input in &inputs {
                tick(&mut state, input, SIM_DT);
            }
            state
        };
        let (a, b) = (run(), run());
        assert_eq!(a.events(), b.events());
        assert_eq!(a.population().pedestrians[0].heading, b.population().pedestrians[0].heading);
        let cash_a: Vec<_> = a.population().cash.iter().map(|c| c.pos).collect();
        let cash_b: Vec<_> = b.population().cash.iter().map(|c| c.pos).collect();
        assert_eq!(cash_a, cash_b);
    }
}
