//! Game balance constants
//!
//! Loaded from JSON so difficulty can be adjusted without a rebuild. Every
//! field has a default, so a tuning file only needs the values it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::PowerUp;

/// Errors raised while loading or validating a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("power-up table has no bands")]
    EmptyPowerUpTable,
    #[error("power-up band {index} ends at {upto}, which does not follow the previous band")]
    UnorderedBand { index: usize, upto: u32 },
    #[error("power-up bands end at {last} but the draw range ends at {draw_max}")]
    BandRangeMismatch { last: u32, draw_max: u32 },
}

/// Per-vehicle handling and combat stats
///
/// Which fields matter depends on the vehicle: pedestrians ignore the weapon
/// and health values, only tanks use the ram values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleTuning {
    /// Forward force along the heading
    pub thrust: f32,
    /// Backward force when braking or unsticking
    pub reverse_thrust: f32,
    /// No forward thrust is applied above this speed
    pub max_speed: f32,
    /// Radians per second
    pub turn_rate: f32,
    /// Below this speed squared an AI driver considers itself stuck
    pub stuck_speed_sq: f32,
    /// Seconds an AI driver reverses once it decides it is stuck
    pub unstick_time: f32,
    pub health: f32,
    /// Seconds between shots
    pub fire_interval: f32,
    pub bullet_speed: f32,
    /// Impulse of a tank ram burst
    pub ram_impulse: f32,
    /// Seconds between ram bursts
    pub ram_cooldown: f32,
}

impl Default for VehicleTuning {
    fn default() -> Self {
        Self {
            thrust: 300.0,
            reverse_thrust: 200.0,
            max_speed: 250.0,
            turn_rate: 3.0,
            stuck_speed_sq: 25.0,
            unstick_time: 0.6,
            health: 100.0,
            fire_interval: 1.5,
            bullet_speed: 600.0,
            ram_impulse: 0.0,
            ram_cooldown: 2.0,
        }
    }
}

/// One slice of the power-up draw range: draws up to and including `upto`
/// (and above the previous band) select `effect`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerUpBand {
    pub upto: u32,
    pub effect: PowerUp,
}

/// Weighted power-up selection, weights given by band width
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUpTable {
    /// Draws are uniform over `0..=draw_max`
    pub draw_max: u32,
    pub bands: Vec<PowerUpBand>,
}

impl Default for PowerUpTable {
    fn default() -> Self {
        Self {
            draw_max: 5,
            bands: vec![
                PowerUpBand { upto: 1, effect: PowerUp::RestoreHealth },
                PowerUpBand { upto: 3, effect: PowerUp::DestroyCops },
                PowerUpBand { upto: 5, effect: PowerUp::SpeedBoost },
            ],
        }
    }
}

impl PowerUpTable {
    /// Map a draw to its effect. Draws past the last band clamp to it.
    pub fn select(&self, roll: u32) -> Option<PowerUp> {
        self.bands
            .iter()
            .find(|band| roll <= band.upto)
            .or(self.bands.last())
            .map(|band| band.effect)
    }

    fn validate(&self) -> Result<(), TuningError> {
        let last = self.bands.last().ok_or(TuningError::EmptyPowerUpTable)?;
        for (index, pair) in self.bands.windows(2).enumerate() {
            if pair[1].upto <= pair[0].upto {
                return Err(TuningError::UnorderedBand {
                    index: index + 1,
                    upto: pair[1].upto,
                });
            }
        }
        if last.upto != self.draw_max {
            return Err(TuningError::BandRangeMismatch {
                last: last.upto,
                draw_max: self.draw_max,
            });
        }
        Ok(())
    }
}

/// Complete balance data for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Player ===
    pub max_health: f32,
    /// Starting speed cap of the player car
    pub player_speed: f32,
    /// Fire at the nearest cop without waiting for the fire intent
    pub player_auto_fire: bool,

    // === Economy ===
    pub score_per_second: f32,
    pub cash_per_power_up: u32,
    pub health_boost: f32,
    pub speed_boost: f32,
    pub power_ups: PowerUpTable,

    // === Population ===
    /// Non-player entities farther than this from the player are removed
    pub despawn_radius: f32,
    pub cash_floor: u32,
    /// Pickups added per top-up
    pub initial_cash_number: u32,
    /// Pickups spawn within [-half, half] on both axes
    pub play_area_half_extent: f32,
    /// Pedestrians pick wander points within this distance of themselves
    pub wander_radius: f32,

    // === Steering ===
    /// Buildings closer than this push self-driving vehicles away
    pub avoid_radius: f32,
    pub avoid_weight: f32,

    // === Damage ===
    pub bullet_damage_player: f32,
    pub bullet_damage_cop: f32,
    pub player_impact_factor: f32,
    pub cop_impact_factor: f32,

    // === Bullets ===
    /// Seconds a bullet survives without touching anything
    pub bullet_ttl: f32,
    /// Distance ahead of the shooter where bullets appear
    pub muzzle_offset: f32,

    // === Vehicles ===
    pub player: VehicleTuning,
    pub pedestrian: VehicleTuning,
    pub cop_car: VehicleTuning,
    pub cop_truck: VehicleTuning,
    pub cop_tank: VehicleTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            player_speed: 400.0,
            player_auto_fire: true,

            score_per_second: 10.0,
            cash_per_power_up: CASH_PER_POWER_UP,
            health_boost: 25.0,
            speed_boost: 200.0,
            power_ups: PowerUpTable::default(),

            despawn_radius: 1500.0,
            cash_floor: CASH_FLOOR,
            initial_cash_number: 30,
            play_area_half_extent: 2000.0,
            wander_radius: 300.0,

            avoid_radius: 80.0,
            avoid_weight: 1.5,

            bullet_damage_player: BULLET_DAMAGE_PLAYER,
            bullet_damage_cop: BULLET_DAMAGE_COP,
            player_impact_factor: PLAYER_IMPACT_FACTOR,
            cop_impact_factor: COP_IMPACT_FACTOR,

            bullet_ttl: 3.0,
            muzzle_offset: 12.0,

            player: VehicleTuning {
                thrust: 600.0,
                reverse_thrust: 400.0,
                max_speed: 400.0,
                turn_rate: 4.0,
                stuck_speed_sq: 0.0,
                health: 100.0,
                fire_interval: 0.5,
                bullet_speed: 900.0,
                ..Default::default()
            },
            pedestrian: VehicleTuning {
                thrust: 150.0,
                max_speed: 120.0,
                turn_rate: 2.0,
                ..Default::default()
            },
            cop_car: VehicleTuning {
                thrust: 450.0,
                max_speed: 380.0,
                health: 50.0,
                ..Default::default()
            },
            cop_truck: VehicleTuning {
                thrust: 350.0,
                max_speed: 300.0,
                turn_rate: 2.2,
                health: 120.0,
                fire_interval: 2.0,
                ..Default::default()
            },
            cop_tank: VehicleTuning {
                thrust: 250.0,
                reverse_thrust: 250.0,
                max_speed: 200.0,
                turn_rate: 1.5,
                stuck_speed_sq: 100.0,
                unstick_time: 0.8,
                health: 250.0,
                fire_interval: 1.0,
                bullet_speed: 500.0,
                ram_impulse: 4000.0,
                ram_cooldown: 3.0,
            },
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Read, parse and validate a tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load a tuning file, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("Using default tuning ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Check the values the simulation divides by or samples from
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("max_health", self.max_health),
            ("despawn_radius", self.despawn_radius),
            ("play_area_half_extent", self.play_area_half_extent),
            ("wander_radius", self.wander_radius),
            ("bullet_ttl", self.bullet_ttl),
            ("player.fire_interval", self.player.fire_interval),
            ("cop_truck.fire_interval", self.cop_truck.fire_interval),
            ("cop_tank.fire_interval", self.cop_tank.fire_interval),
            ("cop_tank.ram_cooldown", self.cop_tank.ram_cooldown),
        ];
        for (field, value) in positive {
            // Negated comparison also rejects NaN
            if !(value > 0.0) {
                return Err(TuningError::NonPositive { field, value });
            }
        }
        if self.cash_per_power_up == 0 {
            return Err(TuningError::NonPositive {
                field: "cash_per_power_up",
                value: 0.0,
            });
        }
        self.power_ups.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "despawn_radius": 400.0 }"#).unwrap();
        assert_eq!(tuning.despawn_radius, 400.0);
        assert_eq!(tuning.cash_floor, CASH_FLOOR);
        assert_eq!(tuning.cop_tank.ram_impulse, 4000.0);
    }

    #[test]
    fn test_malformed_json() {
        let err = Tuning::from_json("{ despawn_radius: }").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
    }

    #[test]
    fn test_rejects_non_positive_radius() {
        let err = Tuning::from_json(r#"{ "despawn_radius": 0.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::NonPositive { field: "despawn_radius", .. }
        ));
    }

    #[test]
    fn test_rejects_gap_at_end_of_draw_range() {
        let json = r#"{
            "power_ups": {
                "draw_max": 10,
                "bands": [
                    { "upto": 3, "effect": "RestoreHealth" },
                    { "upto": 6, "effect": "SpeedBoost" }
                ]
            }
        }"#;
        let err = Tuning::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            TuningError::BandRangeMismatch { last: 6, draw_max: 10 }
        ));
    }

    #[test]
    fn test_rejects_unordered_bands() {
        let table = PowerUpTable {
            draw_max: 4,
            bands: vec![
                PowerUpBand { upto: 3, effect: PowerUp::SpeedBoost },
                PowerUpBand { upto: 3, effect: PowerUp::DestroyCops },
                PowerUpBand { upto: 4, effect: PowerUp::RestoreHealth },
            ],
        };
        assert!(matches!(
            table.validate(),
            Err(TuningError::UnorderedBand { index: 1, upto: 3 })
        ));
    }

    #[test]
    fn test_rejects_empty_table() {
        let table = PowerUpTable { draw_max: 0, bands: Vec::new() };
        assert!(matches!(table.validate(), Err(TuningError::EmptyPowerUpTable)));
        assert_eq!(table.select(0), None);
    }

    #[test]
    fn test_every_draw_selects_exactly_one_effect() {
        let table = PowerUpTable::default();
        let picks: Vec<_> = (0..=table.draw_max).map(|r| table.select(r)).collect();
        assert!(picks.iter().all(Option::is_some));
        assert_eq!(picks[0], Some(PowerUp::RestoreHealth));
        assert_eq!(picks[1], Some(PowerUp::RestoreHealth));
        assert_eq!(picks[2], Some(PowerUp::DestroyCops));
        assert_eq!(picks[3], Some(PowerUp::DestroyCops));
        assert_eq!(picks[4], Some(PowerUp::SpeedBoost));
        assert_eq!(picks[5], Some(PowerUp::SpeedBoost));
    }
}
