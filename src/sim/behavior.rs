//! Steering and combat behaviors
//!
//! Behaviors are plain data attached to entities. They compute forces and
//! shots from snapshots of position and velocity; applying those forces is
//! the physics engine's job.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::Entity;
use crate::tuning::VehicleTuning;
use crate::{heading_vector, normalize_angle};

/// Static axis-aligned obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Building {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half_extents: size.abs() * 0.5,
        }
    }

    /// Closest point on (or in) the building to `p`
    #[inline]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.center - self.half_extents, self.center + self.half_extents)
    }
}

/// Throttle request for a manually driven vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Throttle {
    Forward,
    Reverse,
    #[default]
    Coast,
}

/// One-off shove a tank uses to break free when pinned
#[derive(Debug, Clone)]
struct Ram {
    impulse: f32,
    cooldown: f32,
    ready_at: f32,
}

impl Ram {
    fn burst(&mut self, heading: f32, now: f32) -> Option<Vec2> {
        if now < self.ready_at {
            return None;
        }
        self.ready_at = now + self.cooldown;
        Some(-heading_vector(heading) * self.impulse)
    }
}

/// Engine and steering wheel
#[derive(Debug, Clone)]
pub struct Driving {
    pub thrust: f32,
    pub reverse_thrust: f32,
    pub max_speed: f32,
    pub turn_rate: f32,
    pub stuck_speed_sq: f32,
    pub unstick_time: f32,
    ram: Option<Ram>,
    /// Keep reversing until this time
    reverse_until: f32,
    /// Stuck detection is suspended until this time
    check_after: f32,
}

impl Driving {
    pub fn from_tuning(v: &VehicleTuning, ram: bool) -> Self {
        Self {
            thrust: v.thrust,
            reverse_thrust: v.reverse_thrust,
            max_speed: v.max_speed,
            turn_rate: v.turn_rate,
            stuck_speed_sq: v.stuck_speed_sq,
            unstick_time: v.unstick_time,
            ram: ram.then(|| Ram {
                impulse: v.ram_impulse,
                cooldown: v.ram_cooldown,
                ready_at: 0.0,
            }),
            reverse_until: 0.0,
            check_after: 0.0,
        }
    }

    pub fn can_ram(&self) -> bool {
        self.ram.is_some()
    }

    /// Give a freshly spawned vehicle time to get moving before it can be
    /// judged stuck.
    pub fn arm(&mut self, now: f32) {
        self.reverse_until = now;
        self.check_after = now + self.unstick_time;
    }

    /// Rotate `heading` toward `desired`, limited by the turn rate
    pub fn turn_toward(&self, heading: f32, desired: f32, dt: f32) -> f32 {
        let mut delta = normalize_angle(desired) - normalize_angle(heading);
        // Take the short way round
        if delta > std::f32::consts::PI {
            delta -= std::f32::consts::TAU;
        } else if delta < -std::f32::consts::PI {
            delta += std::f32::consts::TAU;
        }
        let max_delta = self.turn_rate * dt;
        normalize_angle(heading + delta.clamp(-max_delta, max_delta))
    }

    /// Force for a throttle request. Forward thrust cuts out at `speed_cap`.
    pub fn thrust(&self, heading: f32, vel: Vec2, throttle: Throttle, speed_cap: f32) -> Vec2 {
        let forward = heading_vector(heading);
        match throttle {
            Throttle::Forward if vel.length_squared() < speed_cap * speed_cap => {
                forward * self.thrust
            }
            Throttle::Forward | Throttle::Coast => Vec2::ZERO,
            Throttle::Reverse => -forward * self.reverse_thrust,
        }
    }

    pub fn is_stuck(&self, vel: Vec2) -> bool {
        vel.length_squared() < self.stuck_speed_sq
    }

    /// AI throttle: drive forward unless stuck, in which case back up for
    /// `unstick_time` (ramming first, if equipped).
    pub fn autopilot(&mut self, heading: f32, vel: Vec2, now: f32) -> Vec2 {
        if now < self.reverse_until {
            return self.thrust(heading, vel, Throttle::Reverse, self.max_speed);
        }
        if now >= self.check_after && self.is_stuck(vel) {
            self.reverse_until = now + self.unstick_time;
            self.check_after = self.reverse_until + self.unstick_time;
            let mut force = self.thrust(heading, vel, Throttle::Reverse, self.max_speed);
            if let Some(burst) = self.ram.as_mut().and_then(|ram| ram.burst(heading, now)) {
                force += burst;
            }
            return force;
        }
        self.thrust(heading, vel, Throttle::Forward, self.max_speed)
    }
}

/// Roaming target for vehicles with nobody to chase
#[derive(Debug, Clone)]
pub struct Wander {
    pub radius: f32,
    point: Option<Vec2>,
}

impl Wander {
    pub fn new(radius: f32) -> Self {
        Self { radius, point: None }
    }

    /// Current wander point, re-drawn once reached
    pub fn target(&mut self, pos: Vec2, rng: &mut impl Rng) -> Vec2 {
        let arrive = self.radius * 0.1;
        match self.point {
            Some(point) if point.distance_squared(pos) > arrive * arrive => point,
            _ => {
                let r = self.radius;
                let y = rng.random_range(-r..=r);
                let x = rng.random_range(-r..=r);
                let point = pos + Vec2::new(x, y);
                self.point = Some(point);
                point
            }
        }
    }
}

/// Pursuit with building avoidance
#[derive(Debug, Clone)]
pub struct SelfDriving {
    pub avoid_radius: f32,
    pub avoid_weight: f32,
    wander: Option<Wander>,
}

impl SelfDriving {
    pub fn new(avoid_radius: f32, avoid_weight: f32) -> Self {
        Self {
            avoid_radius,
            avoid_weight,
            wander: None,
        }
    }

    pub fn with_wander(mut self, wander: Wander) -> Self {
        self.wander = Some(wander);
        self
    }

    pub fn wander_mut(&mut self) -> Option<&mut Wander> {
        self.wander.as_mut()
    }

    /// Repulsion from nearby buildings, stronger the closer they are
    pub fn avoidance(&self, pos: Vec2, obstacles: &[Building]) -> Vec2 {
        let mut push = Vec2::ZERO;
        for building in obstacles {
            let closest = building.closest_point(pos);
            let mut away = pos - closest;
            let mut dist = away.length();
            if dist < f32::EPSILON {
                // Inside the footprint: push out from the center
                away = pos - building.center;
                dist = 0.0;
            }
            if dist < self.avoid_radius {
                push += away.normalize_or_zero() * (1.0 - dist / self.avoid_radius);
            }
        }
        push
    }

    /// Direction to steer this tick.
    ///
    /// Avoidance is computed first. The follow vector then loses any
    /// component that points back into the obstacles.
    pub fn steer(&self, pos: Vec2, target: Vec2, obstacles: &[Building]) -> Vec2 {
        let avoid = self.avoidance(pos, obstacles);
        let mut follow = (target - pos).normalize_or_zero();

        let avoid_dir = avoid.normalize_or_zero();
        let along = follow.dot(avoid_dir);
        if along < 0.0 {
            follow -= avoid_dir * along;
        }

        avoid * self.avoid_weight + follow
    }
}

/// Weapon with a fixed fire interval
#[derive(Debug, Clone)]
pub struct Shooting {
    /// Seconds between shots
    pub interval: f32,
    pub bullet_speed: f32,
    ready_at: f32,
}

impl Shooting {
    pub fn from_tuning(v: &VehicleTuning) -> Self {
        Self {
            interval: v.fire_interval,
            bullet_speed: v.bullet_speed,
            ready_at: 0.0,
        }
    }

    pub fn is_ready(&self, now: f32) -> bool {
        now >= self.ready_at
    }

    /// Fire from `origin` at `target`, returning the bullet velocity.
    ///
    /// Without a target (or with one sitting on the muzzle) nothing is fired
    /// and the weapon stays ready.
    pub fn fire(&mut self, now: f32, origin: Vec2, target: Option<Vec2>) -> Option<Vec2> {
        let dir = (target? - origin).normalize_or_zero();
        if dir == Vec2::ZERO || !self.is_ready(now) {
            return None;
        }
        self.ready_at = now + self.interval;
        Some(dir * self.bullet_speed)
    }
}

/// Closest entity to `from` by squared distance. Ties keep the first found.
pub fn nearest<'a>(
    from: Vec2,
    candidates: impl IntoIterator<Item = &'a Entity>,
) -> Option<&'a Entity> {
    let mut best: Option<(&Entity, f32)> = None;
    for entity in candidates {
        let dist_sq = entity.pos.distance_squared(from);
        match best {
            Some((_, best_sq)) if dist_sq >= best_sq => {}
            _ => best = Some((entity, dist_sq)),
        }
    }
    best.map(|(entity, _)| entity)
}

impl Entity {
    /// One tick of AI driving toward `target`, shooting at `aim` when armed.
    /// Returns the velocity of a bullet to spawn, if one was fired.
    pub fn run_autopilot(
        &mut self,
        target: Vec2,
        aim: Option<Vec2>,
        obstacles: &[Building],
        dt: f32,
        now: f32,
    ) -> Option<Vec2> {
        self.impulse = Vec2::ZERO;

        if let (Some(steering), Some(driving)) = (&self.self_driving, &self.driving) {
            let dir = steering.steer(self.pos, target, obstacles);
            if dir != Vec2::ZERO {
                self.heading = driving.turn_toward(self.heading, dir.y.atan2(dir.x), dt);
            }
        }

        if let Some(driving) = &mut self.driving {
            self.impulse += driving.autopilot(self.heading, self.vel, now);
        }

        let pos = self.pos;
        self.shooting.as_mut().and_then(|s| s.fire(now, pos, aim))
    }
}
