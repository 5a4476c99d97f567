//! A state-machine driven combat core for hero-versus-monster games
//!
//! This crate provides:
//! - A generic owner-parameterized finite state machine with shared
//!   blackboard data and deferred transitions
//! - Hero and monster controllers with camp-based hostility, attribute
//!   sheets and pluggable damage policies
//! - A single-threaded world that spawns entities from RON/JSON encounter
//!   data and updates them in deterministic id order
//! - Host integration traits for movement, animation and input, so the
//!   simulation stays engine agnostic

pub mod combat;
pub mod core;
pub mod entity;
pub mod fsm;
pub mod host;
pub mod states;

#[cfg(test)]
pub(crate) mod testkit;

// Re-exports for convenience
pub use glam;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::combat::{Camp, DamageOutcome, DamagePolicy, EntityAttributes, ImpactData};
    pub use crate::core::{CombatEvent, EventQueue, GameClock, TickDelta};
    pub use crate::entity::{
        Actor, EncounterSpec, EntityDirectory, EntityId, EntityWorld, Hero, HeroSpawn, Monster,
        MonsterSpawn, SpawnError, Targetable, Transform,
    };
    pub use crate::fsm::{Fsm, FsmContext, FsmError, FsmOwner, State, StateCatalog};
    pub use crate::host::{AnimationDriver, AxisInput, Movement};
    pub use glam::Vec3;
}
