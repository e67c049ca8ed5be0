//! Deterministic simulation module
//!
//! All gameplay logic lives here:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Physics, rendering and audio stay with the host; they talk to the
//!   simulation through contacts, body snapshots and drained events

pub mod behavior;
pub mod contact;
pub mod economy;
pub mod entity;
pub mod mode;
pub mod population;
pub mod state;
pub mod tick;

pub use behavior::{Building, Driving, SelfDriving, Shooting, Throttle, Wander, nearest};
pub use contact::{
    ContactBody, ContactClass, ContactEvent, classify, impact_damage, resolve_contact,
};
pub use economy::{GameEconomy, PowerUp, roll_power_up};
pub use entity::{Category, Entity, EntityId, EntityKind, Health};
pub use mode::{GameMode, ModeMachine, Transition};
pub use population::{Faction, Population, expire_bullets, maintain_faction, top_up_cash};
pub use state::{GameEvent, GameState, HudSnapshot, RemovalCause};
pub use tick::{TickInput, tick};
