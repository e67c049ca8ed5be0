//! Score, health and currency bookkeeping
//!
//! Health only changes through methods that re-check the game-over latch,
//! so the invariant "health at zero means game over" holds after every
//! mutation.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tuning::{PowerUpTable, Tuning};

/// Instant effects granted for collecting enough cash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUp {
    /// Heal the player
    RestoreHealth,
    /// Wreck every cop vehicle in the scene
    DestroyCops,
    /// Raise the player's speed cap
    SpeedBoost,
}

/// Session economy read by the HUD
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEconomy {
    /// Never decreases
    pub score: u64,
    /// Seconds of play
    pub time: f32,
    player_health: f32,
    pub max_health: f32,
    /// Speed cap of the player car
    pub player_speed: f32,
    /// Cash towards the next power-up
    pub cash_collected: u32,
    pub cash_in_scene: u32,
    pub number_of_cops: u32,
    game_over: bool,
}

impl GameEconomy {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            score: 0,
            time: 0.0,
            player_health: tuning.max_health,
            max_health: tuning.max_health,
            player_speed: tuning.player_speed,
            cash_collected: 0,
            cash_in_scene: 0,
            number_of_cops: 0,
            game_over: false,
        }
    }

    pub fn player_health(&self) -> f32 {
        self.player_health
    }

    /// Latched: once true, stays true for the session
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Clamp health to zero and latch game over if it ran out
    pub fn enforce_health_invariant(&mut self) {
        if !self.player_health.is_finite() {
            self.player_health = 0.0;
        }
        if self.player_health <= 0.0 {
            self.player_health = 0.0;
            if !self.game_over {
                log::info!("Player wrecked at {:.1}s, score {}", self.time, self.score);
            }
            self.game_over = true;
        }
    }

    pub fn set_player_health(&mut self, health: f32) {
        self.player_health = health.min(self.max_health);
        self.enforce_health_invariant();
    }

    /// Apply damage to the player. Non-finite or negative amounts are ignored.
    pub fn damage_player(&mut self, amount: f32) {
        if amount.is_finite() && amount > 0.0 {
            self.player_health -= amount;
        }
        self.enforce_health_invariant();
    }

    /// Heal the player up to max health
    pub fn heal_player(&mut self, amount: f32) {
        if amount.is_finite() && amount > 0.0 {
            self.player_health = (self.player_health + amount).min(self.max_health);
        }
        self.enforce_health_invariant();
    }

    /// Accrue play time and the score derived from it
    pub fn advance(&mut self, dt: f32, score_per_second: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.time += dt;
        }
        let earned = (self.time * score_per_second).floor();
        if earned.is_finite() && earned > 0.0 {
            self.score = self.score.max(earned as u64);
        }
    }

    /// Count a collected pickup. Returns true when enough cash has been
    /// collected for a power-up, resetting the counter.
    pub fn collect_cash(&mut self, per_power_up: u32) -> bool {
        self.cash_collected += 1;
        if self.cash_collected >= per_power_up {
            self.cash_collected = 0;
            return true;
        }
        false
    }

    pub fn boost_speed(&mut self, amount: f32) {
        self.player_speed += amount;
    }
}

/// Draw a power-up from the table. `None` only for an empty table.
pub fn roll_power_up(table: &PowerUpTable, rng: &mut impl Rng) -> Option<PowerUp> {
    let roll = rng.random_range(0..=table.draw_max);
    table.select(roll)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn economy() -> GameEconomy {
        GameEconomy::new(&Tuning::default())
    }

    #[test]
    fn test_damage_short_of_zero_keeps_playing() {
        let mut eco = economy();
        eco.set_player_health(30.0);
        eco.damage_player(25.0);
        assert_eq!(eco.player_health(), 5.0);
        assert!(!eco.is_game_over());
    }

    #[test]
    fn test_damage_past_zero_clamps_and_latches() {
        let mut eco = economy();
        eco.set_player_health(20.0);
        eco.damage_player(25.0);
        assert_eq!(eco.player_health(), 0.0);
        assert!(eco.is_game_over());

        // Latch survives healing
        eco.heal_player(50.0);
        assert!(eco.is_game_over());
    }

    #[test]
    fn test_heal_clamps_to_max() {
        let mut eco = economy();
        eco.set_player_health(90.0);
        eco.heal_player(25.0);
        assert_eq!(eco.player_health(), eco.max_health);
    }

    #[test]
    fn test_nan_damage_is_ignored() {
        let mut eco = economy();
        eco.damage_player(f32::NAN);
        assert_eq!(eco.player_health(), eco.max_health);
        eco.damage_player(-10.0);
        assert_eq!(eco.player_health(), eco.max_health);
    }

    #[test]
    fn test_score_is_monotonic() {
        let mut eco = economy();
        let mut last = 0;
        for _ in 0..8 {
            eco.advance(0.25, 10.0);
            assert!(eco.score >= last);
            last = eco.score;
        }
        assert_eq!(eco.score, 20);
        eco.advance(0.0, 10.0);
        assert_eq!(eco.score, last);
    }

    #[test]
    fn test_cash_counter_resets_on_power_up() {
        let mut eco = economy();
        assert!(!eco.collect_cash(3));
        assert_eq!(eco.cash_collected, 1);
        assert!(!eco.collect_cash(3));
        assert_eq!(eco.cash_collected, 2);
        assert!(eco.collect_cash(3));
        assert_eq!(eco.cash_collected, 0);
    }

    #[test]
    fn test_roll_covers_every_effect() {
        let table = PowerUpTable::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(roll_power_up(&table, &mut rng).unwrap());
        }
        assert_eq!(seen.len(), 3);
    }
}
