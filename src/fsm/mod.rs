//! Finite state machine engine
//!
//! Entities drive their behavior through a per-entity [`Fsm`] built from a
//! [`StateSet`] or stamped out of a [`StateRegistry`]. States implement
//! [`State`] over their owner type and coordinate through the machine's
//! [`Blackboard`]. The machine never stores its owner; callers pass
//! `&mut O` plus a shared `&O::Ctx` into every engine call.

mod blackboard;
mod error;
mod machine;
mod registry;
mod state;

pub use blackboard::Blackboard;
pub use error::FsmError;
pub use machine::{Fsm, FsmContext, StateSet};
pub use registry::{StateCatalog, StateRegistry};
pub use state::{FsmOwner, State};
