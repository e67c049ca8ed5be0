//! Minimal kinematic physics for headless runs
//!
//! Stands in for the real physics engine: integrates each entity's requested
//! force, writes the result back through `GameState::sync_body`, and reports
//! circle/box overlaps as contacts the first step they start touching.

use std::collections::HashSet;

use glam::Vec2;

use crate::heading_vector;
use crate::sim::{ContactBody, ContactEvent, Entity, EntityId, EntityKind, GameState};

/// Fraction of velocity lost per second by vehicles
const DAMPING: f32 = 0.8;

/// Collision radius per entity kind
pub fn body_radius(kind: EntityKind) -> f32 {
    match kind {
        EntityKind::PlayerCar | EntityKind::PedestrianCar | EntityKind::CopCar => 10.0,
        EntityKind::CopTruck => 14.0,
        EntityKind::CopTank => 18.0,
        EntityKind::Bullet => 2.0,
        EntityKind::CashPickup => 8.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum BodyKey {
    Entity(EntityId),
    Building(usize),
}

#[derive(Debug, Clone, Copy)]
struct Body {
    key: BodyKey,
    kind: EntityKind,
    source: Option<EntityId>,
    pos: Vec2,
    radius: f32,
    contact: ContactBody,
}

impl Body {
    fn of(entity: &Entity) -> Self {
        Self {
            key: BodyKey::Entity(entity.id),
            kind: entity.kind,
            source: entity.source,
            pos: entity.pos,
            radius: body_radius(entity.kind),
            contact: ContactBody::of(entity),
        }
    }

    /// Pickups only react to the player; bullets pass through their shooter
    fn can_touch(&self, other: &Body) -> bool {
        let pickup_ok = |a: &Body, b: &Body| {
            a.kind != EntityKind::CashPickup || b.kind == EntityKind::PlayerCar
        };
        let own_shot = |a: &Body, b: &Body| match (a.source, b.key) {
            (Some(source), BodyKey::Entity(id)) => source == id,
            _ => false,
        };
        pickup_ok(self, other)
            && pickup_ok(other, self)
            && !own_shot(self, other)
            && !own_shot(other, self)
    }
}

/// Kinematic world tracking which pairs are currently touching
#[derive(Debug, Default)]
pub struct Sandbox {
    touching: HashSet<(BodyKey, BodyKey)>,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move every body by one step and return the contacts that began
    pub fn step(&mut self, state: &mut GameState, dt: f32) -> Vec<ContactEvent> {
        integrate(state, dt);
        self.detect(state)
    }

    fn detect(&mut self, state: &GameState) -> Vec<ContactEvent> {
        let bodies: Vec<Body> = std::iter::once(state.player())
            .chain(state.population().iter())
            .map(Body::of)
            .collect();

        let mut touching = HashSet::new();
        let mut began = Vec::new();
        let mut touch = |a: BodyKey, b: BodyKey, event: ContactEvent| {
            let pair = if a <= b { (a, b) } else { (b, a) };
            if touching.insert(pair) && !self.touching.contains(&pair) {
                began.push(event);
            }
        };

        for (i, a) in bodies.iter().enumerate() {
            for b in &bodies[i + 1..] {
                if a.can_touch(b) && a.pos.distance(b.pos) < a.radius + b.radius {
                    touch(a.key, b.key, ContactEvent::new(a.contact, b.contact));
                }
            }
            if matches!(a.kind, EntityKind::CashPickup) {
                continue;
            }
            for (index, building) in state.buildings().iter().enumerate() {
                if building.closest_point(a.pos).distance(a.pos) < a.radius {
                    touch(
                        a.key,
                        BodyKey::Building(index),
                        ContactEvent::new(a.contact, ContactBody::building()),
                    );
                }
            }
        }

        self.touching = touching;
        if !began.is_empty() {
            log::trace!("{} new contacts", began.len());
        }
        began
    }
}

/// Apply forces and write positions back
fn integrate(state: &mut GameState, dt: f32) {
    let moves: Vec<(EntityId, Vec2, Vec2)> = std::iter::once(state.player())
        .chain(state.population().iter())
        .filter_map(|entity| {
            let vel = match entity.kind {
                EntityKind::CashPickup => return None,
                EntityKind::Bullet => entity.vel,
                _ => {
                    let forward = heading_vector(entity.heading);
                    let vel = entity.vel + entity.impulse * dt;
                    // Tyres grip: no sideways slide
                    let vel = forward * vel.dot(forward);
                    vel * (1.0 - DAMPING * dt).max(0.0)
                }
            };
            Some((entity.id, entity.pos + vel * dt, vel))
        })
        .collect();

    for (id, pos, vel) in moves {
        state.sync_body(id, pos, vel);
    }
}
