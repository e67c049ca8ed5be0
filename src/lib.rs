//! Chase2D - top-down arcade police chase
//!
//! Core modules:
//! - `sim`: Per-frame simulation (entities, steering, contacts, economy, game mode)
//! - `tuning`: Data-driven game balance
//! - `sandbox`: Minimal kinematic stand-in for the physics engine (headless runs)

pub mod sandbox;
pub mod sim;
pub mod tuning;

pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matches the display refresh of the target devices)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Cash pickups needed to trigger a power-up
    pub const CASH_PER_POWER_UP: u32 = 3;
    /// Top up pickups when fewer than this many remain in the scene
    pub const CASH_FLOOR: u32 = 20;

    /// Flat damage a bullet deals to the player
    pub const BULLET_DAMAGE_PLAYER: f32 = 25.0;
    /// Flat damage a bullet deals to a cop vehicle
    pub const BULLET_DAMAGE_COP: f32 = 10.0;
    /// Impact damage scale for the player car
    pub const PLAYER_IMPACT_FACTOR: f32 = 0.000099;
    /// Impact damage scale for cop vehicles
    pub const COP_IMPACT_FACTOR: f32 = 0.00008;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector pointing along a heading angle
#[inline]
pub fn heading_vector(heading: f32) -> Vec2 {
    Vec2::new(heading.cos(), heading.sin())
}

/// Replace an absent or non-finite vector with zero
#[inline]
pub fn finite_or_zero(v: Option<Vec2>) -> Vec2 {
    match v {
        Some(v) if v.is_finite() => v,
        _ => Vec2::ZERO,
    }
}
