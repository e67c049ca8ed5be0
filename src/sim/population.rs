//! Faction collections and their per-tick maintenance
//!
//! Members are culled by distance from the player or by death, and the
//! survivors run their driving, steering and shooting behaviors.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::behavior::SelfDriving;
use super::entity::{Entity, EntityId, EntityKind};
use super::state::{GameState, RemovalCause};

/// Non-player groups sharing spawn/despawn/behavior rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    CopCars,
    CopTrucks,
    CopTanks,
    Pedestrians,
}

impl Faction {
    /// Order factions are maintained in each tick
    pub const MAINTENANCE_ORDER: [Faction; 4] = [
        Faction::CopCars,
        Faction::CopTrucks,
        Faction::CopTanks,
        Faction::Pedestrians,
    ];

    pub const COPS: [Faction; 3] = [Faction::CopCars, Faction::CopTrucks, Faction::CopTanks];
}

/// Every non-player entity in the scene
#[derive(Debug, Clone, Default)]
pub struct Population {
    pub cop_cars: Vec<Entity>,
    pub cop_trucks: Vec<Entity>,
    pub cop_tanks: Vec<Entity>,
    pub pedestrians: Vec<Entity>,
    pub cash: Vec<Entity>,
    pub bullets: Vec<Entity>,
}

impl Population {
    pub fn faction(&self, faction: Faction) -> &[Entity] {
        match faction {
            Faction::CopCars => &self.cop_cars,
            Faction::CopTrucks => &self.cop_trucks,
            Faction::CopTanks => &self.cop_tanks,
            Faction::Pedestrians => &self.pedestrians,
        }
    }

    fn collection_mut(&mut self, kind: EntityKind) -> Option<&mut Vec<Entity>> {
        match kind {
            EntityKind::CopCar => Some(&mut self.cop_cars),
            EntityKind::CopTruck => Some(&mut self.cop_trucks),
            EntityKind::CopTank => Some(&mut self.cop_tanks),
            EntityKind::PedestrianCar => Some(&mut self.pedestrians),
            EntityKind::CashPickup => Some(&mut self.cash),
            EntityKind::Bullet => Some(&mut self.bullets),
            EntityKind::PlayerCar => None,
        }
    }

    /// Every collection, cops first
    fn collections(&self) -> [&Vec<Entity>; 6] {
        [
            &self.cop_cars,
            &self.cop_trucks,
            &self.cop_tanks,
            &self.pedestrians,
            &self.cash,
            &self.bullets,
        ]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.collections().into_iter().flatten()
    }

    /// All cop vehicles in faction order
    pub fn cops(&self) -> impl Iterator<Item = &Entity> {
        self.cop_cars
            .iter()
            .chain(&self.cop_trucks)
            .chain(&self.cop_tanks)
    }

    pub fn cop_count(&self) -> usize {
        self.cop_cars.len() + self.cop_trucks.len() + self.cop_tanks.len()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        [
            &mut self.cop_cars,
            &mut self.cop_trucks,
            &mut self.cop_tanks,
            &mut self.pedestrians,
            &mut self.cash,
            &mut self.bullets,
        ]
        .into_iter()
        .flatten()
        .find(|e| e.id == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Add to the collection matching the entity's kind. The player car has
    /// no collection and is dropped.
    pub(crate) fn insert(&mut self, entity: Entity) {
        if let Some(list) = self.collection_mut(entity.kind) {
            list.push(entity);
        }
    }

    /// Remove by identity. Absent ids are a no-op.
    pub(crate) fn take(&mut self, id: EntityId) -> Option<Entity> {
        let kind = self.get(id)?.kind;
        let list = self.collection_mut(kind)?;
        let index = list.iter().position(|e| e.id == id)?;
        Some(list.remove(index))
    }
}

/// Cull and drive every member of one faction.
///
/// Works from a snapshot of ids, looking each member up again before acting,
/// so removals earlier in the pass never shift a later lookup.
pub fn maintain_faction(state: &mut GameState, faction: Faction, dt: f32) {
    let player_pos = state.player.pos;
    let despawn_sq = state.tuning.despawn_radius * state.tuning.despawn_radius;
    let now = state.economy.time;
    let ids: Vec<EntityId> = state.population.faction(faction).iter().map(|e| e.id).collect();

    for id in ids {
        let Some(entity) = state.population.get(id) else {
            continue;
        };

        if entity.pos.distance_squared(player_pos) >= despawn_sq {
            log::debug!("{:?} {} left the despawn radius", entity.kind, id);
            state.remove_entity(id, RemovalCause::OutOfRange);
            continue;
        }

        if entity.is_wrecked() {
            state.kill(id);
            continue;
        }

        if let Some((origin, vel)) = drive_member(state, id, player_pos, dt, now) {
            state.spawn_bullet(id, origin, vel);
        }
    }
}

/// Run one member's behaviors. Returns a shot to spawn as (origin, velocity).
fn drive_member(
    state: &mut GameState,
    id: EntityId,
    player_pos: Vec2,
    dt: f32,
    now: f32,
) -> Option<(Vec2, Vec2)> {
    let entity = state.population.get_mut(id)?;

    // Wanderers roam; everyone else chases and shoots at the player
    let wander = entity.self_driving.as_mut().and_then(SelfDriving::wander_mut);
    let (target, aim) = match wander {
        Some(wander) => (wander.target(entity.pos, &mut state.rng), None),
        None => (player_pos, Some(player_pos)),
    };

    let vel = entity.run_autopilot(target, aim, &state.buildings, dt, now)?;
    Some((entity.pos, vel))
}

/// Count down bullet lifetimes and cull the expired ones
pub fn expire_bullets(state: &mut GameState, dt: f32) {
    let mut expired = Vec::new();
    for bullet in &mut state.population.bullets {
        if let Some(ttl) = &mut bullet.ttl {
            *ttl -= dt;
            if *ttl <= 0.0 {
                expired.push(bullet.id);
            }
        }
    }
    for id in expired {
        state.remove_entity(id, RemovalCause::Expired);
    }
}

/// Add a batch of pickups when the scene runs low
pub fn top_up_cash(state: &mut GameState) {
    if state.economy.cash_in_scene >= state.tuning.cash_floor {
        return;
    }
    let half = state.tuning.play_area_half_extent;
    for _ in 0..state.tuning.initial_cash_number {
        let y = state.rng.random_range(-half..=half);
        let x = state.rng.random_range(-half..=half);
        state.spawn(EntityKind::CashPickup, Vec2::new(x, y));
    }
    log::debug!("Cash topped up to {}", state.economy.cash_in_scene);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::GameEvent;
    use crate::tuning::Tuning;

    fn playing_state(tuning: Tuning) -> GameState {
        let mut state = GameState::new(42, tuning);
        state.start();
        state
    }

    #[test]
    fn test_far_cop_is_despawned() {
        let mut state = playing_state(Tuning {
            despawn_radius: 400.0,
            ..Default::default()
        });
        let far = state.spawn(EntityKind::CopCar, Vec2::new(500.0, 0.0)).unwrap();
        let near = state.spawn(EntityKind::CopCar, Vec2::new(100.0, 0.0)).unwrap();
        assert_eq!(state.economy().number_of_cops, 2);

        maintain_faction(&mut state, Faction::CopCars, 1.0 / 60.0);

        assert_eq!(state.economy().number_of_cops, 1);
        assert_eq!(state.population().cop_cars.len(), 1);
        assert!(!state.population().contains(far));
        assert!(state.population().contains(near));
        assert!(state.events().iter().any(|e| matches!(
            e,
            GameEvent::Detached { id, cause: RemovalCause::OutOfRange, .. } if *id == far
        )));
    }

    #[test]
    fn test_simultaneous_removals_are_counted_exactly() {
        let mut state = playing_state(Tuning {
            despawn_radius: 400.0,
            ..Default::default()
        });
        state.spawn(EntityKind::CopTruck, Vec2::new(0.0, 900.0));
        let wrecked = state.spawn(EntityKind::CopTruck, Vec2::new(0.0, 50.0)).unwrap();
        state.spawn(EntityKind::CopTruck, Vec2::new(0.0, 60.0));
        state.spawn(EntityKind::CopTank, Vec2::new(-800.0, 0.0));
        state.damage_cop(wrecked, 10_000.0);

        for faction in Faction::MAINTENANCE_ORDER {
            maintain_faction(&mut state, faction, 1.0 / 60.0);
        }

        assert_eq!(state.economy().number_of_cops, 1);
        assert_eq!(state.population().cop_trucks.len(), 1);
        assert!(state.population().cop_tanks.is_empty());
        assert!(state.events().iter().any(|e| matches!(
            e,
            GameEvent::Died { id, .. } if *id == wrecked
        )));
    }

    #[test]
    fn test_pedestrian_despawn_leaves_cop_count_alone() {
        let mut state = playing_state(Tuning {
            despawn_radius: 400.0,
            ..Default::default()
        });
        state.spawn(EntityKind::CopCar, Vec2::new(10.0, 0.0));
        state.spawn(EntityKind::PedestrianCar, Vec2::new(1000.0, 0.0));

        maintain_faction(&mut state, Faction::Pedestrians, 1.0 / 60.0);

        assert!(state.population().pedestrians.is_empty());
        assert_eq!(state.economy().number_of_cops, 1);
    }

    #[test]
    fn test_armed_cop_fires_at_player() {
        let mut state = playing_state(Tuning::default());
        let tank = state.spawn(EntityKind::CopTank, Vec2::new(0.0, 200.0)).unwrap();

        maintain_faction(&mut state, Faction::CopTanks, 1.0 / 60.0);

        let bullet = &state.population().bullets[0];
        assert_eq!(bullet.source, Some(tank));
        assert!(bullet.vel.y < 0.0, "bullet should head toward the player");
    }

    #[test]
    fn test_pedestrians_never_shoot() {
        let mut state = playing_state(Tuning::default());
        state.spawn(EntityKind::PedestrianCar, Vec2::new(0.0, 200.0));
        maintain_faction(&mut state, Faction::Pedestrians, 1.0 / 60.0);
        assert!(state.population().bullets.is_empty());
        assert!(state.population().pedestrians[0].impulse.length() > 0.0);
    }

    #[test]
    fn test_expired_bullets_are_culled() {
        let mut state = playing_state(Tuning {
            bullet_ttl: 0.5,
            ..Default::default()
        });
        let source = state.player().id;
        state.spawn_bullet(source, Vec2::ZERO, Vec2::new(100.0, 0.0));
        expire_bullets(&mut state, 0.25);
        assert_eq!(state.population().bullets.len(), 1);
        expire_bullets(&mut state, 0.25);
        assert!(state.population().bullets.is_empty());
    }

    #[test]
    fn test_cash_top_up_below_floor() {
        let mut state = playing_state(Tuning {
            cash_floor: 20,
            initial_cash_number: 25,
            play_area_half_extent: 300.0,
            ..Default::default()
        });
        top_up_cash(&mut state);
        assert_eq!(state.economy().cash_in_scene, 25);
        assert_eq!(state.population().cash.len(), 25);
        assert!(state
            .population()
            .cash
            .iter()
            .all(|c| c.pos.x.abs() <= 300.0 && c.pos.y.abs() <= 300.0));

        // At or above the floor nothing more is added
        top_up_cash(&mut state);
        assert_eq!(state.population().cash.len(), 25);
    }

    #[test]
    fn test_take_is_identity_based_and_idempotent() {
        let mut population = Population::default();
        let tuning = Tuning::default();
        for id in 1..=3 {
            population.insert(Entity::new(id, EntityKind::CopCar, Vec2::ZERO, &tuning));
        }
        assert_eq!(population.take(2).map(|e| e.id), Some(2));
        assert!(population.take(2).is_none());
        let left: Vec<_> = population.cop_cars.iter().map(|e| e.id).collect();
        assert_eq!(left, vec![1, 3]);
    }
}
