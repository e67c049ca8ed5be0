//! Game objects and their contact categories
//!
//! Every entity carries a fixed set of optional behavior slots decided by its
//! constructor. Call sites treat an empty slot as "nothing to do".

use std::ops::BitOr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::behavior::{Driving, SelfDriving, Shooting, Wander};
use crate::tuning::{Tuning, VehicleTuning};

/// Stable handle to an entity. May outlive the entity it names, so every
/// lookup through it returns an `Option`.
pub type EntityId = u32;

/// Physics contact category bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Category(pub u32);

impl Category {
    pub const NONE: Category = Category(0);
    pub const CAR: Category = Category(1 << 0);
    pub const BUILDING: Category = Category(1 << 1);
    pub const CASH: Category = Category(1 << 2);
    pub const PED: Category = Category(1 << 3);
    pub const COP_CAR: Category = Category(1 << 4);
    pub const BULLET: Category = Category(1 << 5);
    pub const COP_TRUCK: Category = Category(1 << 6);
    pub const COP_TANK: Category = Category(1 << 7);

    /// Any police vehicle
    pub const COPS: Category = Category(Self::COP_CAR.0 | Self::COP_TRUCK.0 | Self::COP_TANK.0);

    /// True if any bit of `other` is set in `self`
    #[inline]
    pub const fn intersects(self, other: Category) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for Category {
    type Output = Category;

    fn bitor(self, rhs: Category) -> Category {
        Category(self.0 | rhs.0)
    }
}

/// Entity variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    PlayerCar,
    PedestrianCar,
    CopCar,
    CopTruck,
    CopTank,
    Bullet,
    CashPickup,
}

impl EntityKind {
    pub fn category(self) -> Category {
        match self {
            EntityKind::PlayerCar => Category::CAR,
            EntityKind::PedestrianCar => Category::PED,
            EntityKind::CopCar => Category::COP_CAR,
            EntityKind::CopTruck => Category::COP_TRUCK,
            EntityKind::CopTank => Category::COP_TANK,
            EntityKind::Bullet => Category::BULLET,
            EntityKind::CashPickup => Category::CASH,
        }
    }

    pub fn is_cop(self) -> bool {
        matches!(
            self,
            EntityKind::CopCar | EntityKind::CopTruck | EntityKind::CopTank
        )
    }
}

/// Hit points of a combat-capable entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
    dead: bool,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            dead: false,
        }
    }

    pub fn damage(&mut self, amount: f32) {
        if amount.is_finite() && amount > 0.0 {
            self.current -= amount;
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }

    /// Mark the entity dead. Returns true only on the first call so death
    /// side effects fire once.
    pub fn apply_death(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        self.current = self.current.min(0.0);
        true
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }
}

/// A game object
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    /// Last velocity reported by physics
    pub vel: Vec2,
    /// Facing angle in radians
    pub heading: f32,
    /// Force requested this tick, consumed by physics
    pub impulse: Vec2,
    pub driving: Option<Driving>,
    pub self_driving: Option<SelfDriving>,
    pub shooting: Option<Shooting>,
    pub health: Option<Health>,
    /// Shooter of a bullet. Not guaranteed to still exist.
    pub source: Option<EntityId>,
    /// Seconds left before an untouched bullet is culled
    pub ttl: Option<f32>,
}

impl Entity {
    fn bare(id: EntityId, kind: EntityKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
            heading: 0.0,
            impulse: Vec2::ZERO,
            driving: None,
            self_driving: None,
            shooting: None,
            health: None,
            source: None,
            ttl: None,
        }
    }

    /// Build an entity with the behavior slots its kind calls for.
    ///
    /// Bullets should be created with [`Entity::bullet`] instead; built here
    /// they have no shooter and never expire.
    pub fn new(id: EntityId, kind: EntityKind, pos: Vec2, tuning: &Tuning) -> Self {
        let mut entity = Self::bare(id, kind, pos);
        match kind {
            EntityKind::PlayerCar => {
                entity.driving = Some(Driving::from_tuning(&tuning.player, false));
                entity.shooting = Some(Shooting::from_tuning(&tuning.player));
            }
            EntityKind::PedestrianCar => {
                entity.driving = Some(Driving::from_tuning(&tuning.pedestrian, false));
                entity.self_driving = Some(
                    SelfDriving::new(tuning.avoid_radius, tuning.avoid_weight)
                        .with_wander(Wander::new(tuning.wander_radius)),
                );
            }
            EntityKind::CopCar => {
                entity.equip_cop(&tuning.cop_car, tuning, false, false);
            }
            EntityKind::CopTruck => {
                entity.equip_cop(&tuning.cop_truck, tuning, true, false);
            }
            EntityKind::CopTank => {
                entity.equip_cop(&tuning.cop_tank, tuning, true, true);
            }
            EntityKind::Bullet | EntityKind::CashPickup => {}
        }
        entity
    }

    fn equip_cop(&mut self, vehicle: &VehicleTuning, tuning: &Tuning, armed: bool, ram: bool) {
        self.driving = Some(Driving::from_tuning(vehicle, ram));
        self.self_driving = Some(SelfDriving::new(tuning.avoid_radius, tuning.avoid_weight));
        self.health = Some(Health::new(vehicle.health));
        if armed {
            self.shooting = Some(Shooting::from_tuning(vehicle));
        }
    }

    /// A bullet fired by `source`
    pub fn bullet(id: EntityId, source: EntityId, pos: Vec2, vel: Vec2, ttl: f32) -> Self {
        let mut entity = Self::bare(id, EntityKind::Bullet, pos);
        entity.vel = vel;
        entity.heading = vel.y.atan2(vel.x);
        entity.source = Some(source);
        entity.ttl = Some(ttl);
        entity
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    /// Health at or below zero (entities without health never qualify)
    pub fn is_wrecked(&self) -> bool {
        self.health.is_some_and(|h| h.is_depleted())
    }
}
