//! Core runtime services
//!
//! Contains the game clock and the combat event queue

mod clock;
mod events;

pub use clock::{GameClock, TickDelta};
pub use events::{CombatEvent, EventQueue};
