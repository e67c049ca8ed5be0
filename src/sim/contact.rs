//! Contact classification and resolution
//!
//! The physics engine reports each pair of bodies that starts touching.
//! A contact is classified by the union of both categories, so the order the
//! two bodies arrive in never changes the outcome.

use glam::Vec2;

use super::entity::{Category, Entity, EntityId};
use super::state::{GameState, RemovalCause};
use crate::finite_or_zero;

/// One side of a contact as physics sees it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactBody {
    pub category: Category,
    /// Owning entity. `None` for static scenery.
    pub entity: Option<EntityId>,
    pub velocity: Option<Vec2>,
}

impl ContactBody {
    pub fn of(entity: &Entity) -> Self {
        Self {
            category: entity.category(),
            entity: Some(entity.id),
            velocity: Some(entity.vel),
        }
    }

    pub fn building() -> Self {
        Self {
            category: Category::BUILDING,
            entity: None,
            velocity: None,
        }
    }

    /// Velocity with missing or non-finite values read as zero
    pub fn velocity(&self) -> Vec2 {
        finite_or_zero(self.velocity)
    }
}

/// Two bodies that started touching
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub a: ContactBody,
    pub b: ContactBody,
}

impl ContactEvent {
    pub fn new(a: ContactBody, b: ContactBody) -> Self {
        Self { a, b }
    }

    pub fn bodies(&self) -> [&ContactBody; 2] {
        [&self.a, &self.b]
    }

    /// The side in `category` first, then the other side
    pub fn split(&self, category: Category) -> Option<(&ContactBody, &ContactBody)> {
        if self.a.category.intersects(category) {
            Some((&self.a, &self.b))
        } else if self.b.category.intersects(category) {
            Some((&self.b, &self.a))
        } else {
            None
        }
    }
}

/// Which effects a contact triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContactClass {
    pub cash_pickup: bool,
    pub bullet: bool,
    pub bullet_hits_player: bool,
    pub player_impact: bool,
    pub bullet_hits_cop: bool,
    pub cop_impact: bool,
}

const PLAYER_IMPACT_PAIRS: [Category; 5] = [
    Category(Category::CAR.0 | Category::BUILDING.0),
    Category(Category::CAR.0 | Category::COP_CAR.0),
    Category(Category::CAR.0 | Category::COP_TRUCK.0),
    Category(Category::CAR.0 | Category::COP_TANK.0),
    Category(Category::CAR.0 | Category::PED.0),
];

const BULLET_COP_PAIRS: [Category; 3] = [
    Category(Category::BULLET.0 | Category::COP_CAR.0),
    Category(Category::BULLET.0 | Category::COP_TRUCK.0),
    Category(Category::BULLET.0 | Category::COP_TANK.0),
];

pub fn classify(a: Category, b: Category) -> ContactClass {
    let mask = a | b;
    let bullet = mask.intersects(Category::BULLET);
    ContactClass {
        cash_pickup: mask == Category::CAR | Category::CASH,
        bullet,
        bullet_hits_player: mask == Category::BULLET | Category::CAR,
        player_impact: PLAYER_IMPACT_PAIRS.contains(&mask),
        bullet_hits_cop: BULLET_COP_PAIRS.contains(&mask),
        // Pickups are sensors, not vehicles
        cop_impact: !bullet && !mask.intersects(Category::CASH) && mask.intersects(Category::COPS),
    }
}

/// Damage from a collision: the difference in squared speeds, scaled
pub fn impact_damage(va: Vec2, vb: Vec2, factor: f32) -> f32 {
    (va.length_squared() - vb.length_squared()).abs() * factor
}

/// Apply every effect of one contact, in order. Ignored outside play.
pub fn resolve_contact(state: &mut GameState, contact: &ContactEvent) {
    if !state.modes.is_playing() {
        return;
    }
    let class = classify(contact.a.category, contact.b.category);

    if class.cash_pickup {
        if let Some(id) = contact.split(Category::CASH).and_then(|(cash, _)| cash.entity) {
            state.collect_cash(id);
        }
    }

    // A bullet already consumed by an earlier contact deals no more damage
    let mut spent = false;
    if class.bullet {
        for body in contact.bodies() {
            if let (true, Some(id)) = (body.category.intersects(Category::BULLET), body.entity) {
                spent |= state.remove_entity(id, RemovalCause::Consumed).is_none();
            }
        }
    }

    if class.bullet_hits_player && !spent {
        state.damage_player(state.tuning.bullet_damage_player);
    }

    if class.player_impact {
        let damage = impact_damage(
            contact.a.velocity(),
            contact.b.velocity(),
            state.tuning.player_impact_factor,
        );
        state.damage_player(damage);
    }

    state.economy.enforce_health_invariant();

    if class.bullet_hits_cop && !spent {
        if let Some(id) = contact.split(Category::COPS).and_then(|(cop, _)| cop.entity) {
            state.damage_cop(id, state.tuning.bullet_damage_cop);
        }
    }

    if class.cop_impact {
        let damage = impact_damage(
            contact.a.velocity(),
            contact.b.velocity(),
            state.tuning.cop_impact_factor,
        );
        for body in contact.bodies() {
            if let (true, Some(id)) = (body.category.intersects(Category::COPS), body.entity) {
                state.damage_cop(id, damage);
            }
        }
    }
}

impl GameState {
    /// Entry point for contact callbacks from physics
    pub fn handle_contact(&mut self, contact: &ContactEvent) {
        resolve_contact(self, contact);
    }
}
