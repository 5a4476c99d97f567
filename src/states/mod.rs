//! Concrete combat states
//!
//! One submodule per owner type. Both rosters share the same priority
//! order inside `on_update`: death first, then a pending stagger, then
//! offense, then movement.

pub mod hero;
pub mod monster;
