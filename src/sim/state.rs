//! Game state and core simulation types
//!
//! `GameState` is the single owner of everything the simulation mutates.
//! Removing an entity always emits a `Detached` event in the same call, so
//! the host's physics world and the collections never disagree.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::behavior::Building;
use super::economy::{GameEconomy, PowerUp, roll_power_up};
use super::entity::{Entity, EntityId, EntityKind};
use super::mode::{GameMode, ModeMachine, Transition};
use super::population::{Faction, Population};
use crate::tuning::Tuning;

/// Why an entity left the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalCause {
    /// Too far from the player
    OutOfRange,
    /// Health ran out or a power-up wrecked it
    Destroyed,
    /// Used up on contact (bullets, pickups)
    Consumed,
    /// Bullet lifetime ran out
    Expired,
}

/// Notifications for the physics, render and audio hosts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Spawned { id: EntityId, kind: EntityKind },
    /// Remove the body and node for this entity
    Detached {
        id: EntityId,
        kind: EntityKind,
        cause: RemovalCause,
    },
    /// Play the death fade; the entity is already gone from the simulation
    Died { id: EntityId, kind: EntityKind },
    BulletFired { id: EntityId, source: EntityId },
    /// Pickups collected towards the next power-up (0 after one fires)
    CashCollected { progress: u32 },
    PlayerHit { damage: f32 },
    PowerUp(PowerUp),
    ModeChanged(Transition),
}

/// Values the HUD shows each frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub mode: GameMode,
    pub score: u64,
    pub time: f32,
    pub health: f32,
    pub max_health: f32,
    pub speed: f32,
    pub cash: u32,
    pub cops: u32,
}

/// Complete simulation state for one session
#[derive(Debug, Clone)]
pub struct GameState {
    /// Session seed
    pub seed: u64,
    pub tuning: Tuning,
    pub(crate) rng: Pcg32,
    pub(crate) modes: ModeMachine,
    pub(crate) economy: GameEconomy,
    pub(crate) player: Entity,
    pub(crate) population: Population,
    pub(crate) buildings: Vec<Building>,
    pub(crate) events: Vec<GameEvent>,
    /// Next entity ID
    next_id: EntityId,
}

impl GameState {
    /// Create a new session in the menu with the player car at the origin.
    /// Tuning that fails validation is replaced by the defaults.
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let tuning = match tuning.validate() {
            Ok(()) => tuning,
            Err(e) => {
                log::warn!("Invalid tuning, using defaults: {}", e);
                Tuning::default()
            }
        };
        let player = Entity::new(1, EntityKind::PlayerCar, Vec2::ZERO, &tuning);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            modes: ModeMachine::new(),
            economy: GameEconomy::new(&tuning),
            player,
            population: Population::default(),
            buildings: Vec::new(),
            events: Vec::new(),
            next_id: 2,
            tuning,
        }
    }

    /// Allocate a new entity ID
    fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn mode(&self) -> GameMode {
        self.modes.current()
    }

    pub fn economy(&self) -> &GameEconomy {
        &self.economy
    }

    pub fn player(&self) -> &Entity {
        &self.player
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    /// Events queued since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot {
            mode: self.mode(),
            score: self.economy.score,
            time: self.economy.time,
            health: self.economy.player_health(),
            max_health: self.economy.max_health,
            speed: self.economy.player_speed,
            cash: self.economy.cash_collected,
            cops: self.economy.number_of_cops,
        }
    }

    // === Mode ===

    fn record_transition(&mut self, transition: Option<Transition>) -> bool {
        match transition {
            Some(t) => {
                self.events.push(GameEvent::ModeChanged(t));
                true
            }
            None => false,
        }
    }

    /// Menu → Idle
    pub fn show_idle(&mut self) -> bool {
        let transition = self.modes.show_idle();
        self.record_transition(transition)
    }

    /// Begin play from the menu or idle screen
    pub fn start(&mut self) -> bool {
        let transition = self.modes.start();
        if transition.is_some() {
            log::info!(
                "Session started (seed {}, {} cops, {} buildings)",
                self.seed,
                self.economy.number_of_cops,
                self.buildings.len()
            );
        }
        self.record_transition(transition)
    }

    /// Move to GameOver if the economy has latched it
    pub fn check_game_over(&mut self) -> bool {
        let transition = self.modes.observe_game_over(self.economy.is_game_over());
        self.record_transition(transition)
    }

    // === Spawning ===

    pub fn add_building(&mut self, building: Building) {
        self.buildings.push(building);
    }

    /// Add a non-player entity. Returns `None` for kinds that cannot be
    /// spawned this way (the player car, bullets).
    pub fn spawn(&mut self, kind: EntityKind, pos: Vec2) -> Option<EntityId> {
        if matches!(kind, EntityKind::PlayerCar | EntityKind::Bullet) {
            return None;
        }
        let id = self.next_entity_id();
        let mut entity = Entity::new(id, kind, pos, &self.tuning);
        if let Some(driving) = &mut entity.driving {
            driving.arm(self.economy.time);
        }

        if kind.is_cop() {
            self.economy.number_of_cops += 1;
        } else if kind == EntityKind::CashPickup {
            self.economy.cash_in_scene += 1;
        }

        self.population.insert(entity);
        self.events.push(GameEvent::Spawned { id, kind });
        Some(id)
    }

    /// Fire a bullet from `origin`. It appears a muzzle length ahead so it
    /// does not start inside its shooter.
    pub fn spawn_bullet(&mut self, source: EntityId, origin: Vec2, vel: Vec2) -> EntityId {
        let id = self.next_entity_id();
        let pos = origin + vel.normalize_or_zero() * self.tuning.muzzle_offset;
        let bullet = Entity::bullet(id, source, pos, vel, self.tuning.bullet_ttl);
        self.population.insert(bullet);
        self.events.push(GameEvent::BulletFired { id, source });
        id
    }

    // === Lookup ===

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        if id == self.player.id {
            return Some(&self.player);
        }
        self.population.get(id)
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        if id == self.player.id {
            return Some(&mut self.player);
        }
        self.population.get_mut(id)
    }

    /// Copy in the position and velocity physics computed for a body.
    /// Non-finite values are ignored. Returns false for unknown ids.
    pub fn sync_body(&mut self, id: EntityId, pos: Vec2, vel: Vec2) -> bool {
        let Some(entity) = self.entity_mut(id) else {
            return false;
        };
        if pos.is_finite() {
            entity.pos = pos;
        }
        if vel.is_finite() {
            entity.vel = vel;
        }
        true
    }

    // === Removal ===

    /// Remove an entity from its collection and detach it from the world.
    /// Removing an absent entity is a no-op returning `None`.
    pub fn remove_entity(&mut self, id: EntityId, cause: RemovalCause) -> Option<Entity> {
        let entity = self.population.take(id)?;
        if entity.kind.is_cop() {
            self.economy.number_of_cops = self.economy.number_of_cops.saturating_sub(1);
        } else if entity.kind == EntityKind::CashPickup {
            self.economy.cash_in_scene = self.economy.cash_in_scene.saturating_sub(1);
        }
        self.events.push(GameEvent::Detached {
            id,
            kind: entity.kind,
            cause,
        });
        Some(entity)
    }

    /// Run an entity's death and remove it. Death side effects fire once
    /// however often this is called.
    pub fn kill(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.population.get_mut(id) else {
            return false;
        };
        let first_death = entity.health.as_mut().is_none_or(|h| h.apply_death());
        let kind = entity.kind;
        if first_death {
            log::debug!("{:?} {} destroyed", kind, id);
            self.events.push(GameEvent::Died { id, kind });
        }
        self.remove_entity(id, RemovalCause::Destroyed).is_some()
    }

    // === Damage ===

    pub fn damage_player(&mut self, amount: f32) {
        if amount.is_finite() && amount > 0.0 {
            self.events.push(GameEvent::PlayerHit { damage: amount });
        }
        self.economy.damage_player(amount);
    }

    /// Damage a cop vehicle. Unknown ids and non-cops are ignored; death is
    /// handled by the next maintenance pass.
    pub fn damage_cop(&mut self, id: EntityId, amount: f32) {
        let Some(entity) = self.population.get_mut(id) else {
            return;
        };
        if !entity.kind.is_cop() {
            return;
        }
        if let Some(health) = &mut entity.health {
            health.damage(amount);
        }
    }

    // === Economy ===

    /// Consume a pickup. Returns false if it was already gone.
    pub fn collect_cash(&mut self, id: EntityId) -> bool {
        if self.population.get(id).map(|e| e.kind) != Some(EntityKind::CashPickup) {
            return false;
        }
        if self.remove_entity(id, RemovalCause::Consumed).is_none() {
            return false;
        }
        let power_up_due = self.economy.collect_cash(self.tuning.cash_per_power_up);
        self.events.push(GameEvent::CashCollected {
            progress: self.economy.cash_collected,
        });
        if power_up_due {
            self.activate_power_up();
        }
        true
    }

    /// Draw and apply a random power-up
    pub fn activate_power_up(&mut self) -> Option<PowerUp> {
        if self.economy.is_game_over() {
            return None;
        }
        let power_up = roll_power_up(&self.tuning.power_ups, &mut self.rng)?;
        self.apply_power_up(power_up);
        Some(power_up)
    }

    pub fn apply_power_up(&mut self, power_up: PowerUp) {
        match power_up {
            PowerUp::RestoreHealth => self.economy.heal_player(self.tuning.health_boost),
            PowerUp::DestroyCops => {
                self.destroy_all_cops();
            }
            PowerUp::SpeedBoost => self.economy.boost_speed(self.tuning.speed_boost),
        }
        log::info!("Power-up: {:?}", power_up);
        self.events.push(GameEvent::PowerUp(power_up));
    }

    /// Wreck every cop vehicle. Returns how many were removed.
    pub fn destroy_all_cops(&mut self) -> u32 {
        let ids: Vec<EntityId> = Faction::COPS
            .iter()
            .flat_map(|&f| self.population.faction(f).iter().map(|e| e.id))
            .collect();
        let mut removed = 0;
        for id in ids {
            if self.kill(id) {
                removed += 1;
            }
        }
        removed
    }
}
