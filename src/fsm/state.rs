//! The state trait and owner contract

use std::fmt;
use std::hash::Hash;

use crate::fsm::machine::FsmContext;

/// Types that can own a state machine.
///
/// The machine never stores a reference to its owner. Every engine call
/// takes the owner as `&mut O` alongside a shared context `&O::Ctx`, and the
/// same pair is forwarded into state callbacks through [`FsmContext`].
pub trait FsmOwner: 'static {
    /// Blackboard key type.
    type DataKey: Copy + Eq + Hash + fmt::Debug + 'static;
    /// Blackboard value type.
    type DataValue: Clone + fmt::Debug + 'static;
    /// Shared context handed to every state callback alongside the owner.
    type Ctx;
}

/// A state in an entity's state machine.
///
/// One instance of each state lives inside the machine for its whole life
/// and is reused across entries. All five callbacks default to no-ops;
/// states override the ones they need. The lifecycle is:
///
/// 1. `on_init` - once, when the owning machine is built
/// 2. `on_enter` - every time this state becomes current
/// 3. `on_update` - every tick while current
/// 4. `on_leave` - every time the machine switches away, with `is_shutdown`
///    set when the machine is being destroyed rather than transitioning
/// 5. `on_destroy` - once, when the owning machine is destroyed
pub trait State<O: FsmOwner>: fmt::Debug {
    /// State name for logging and debugging.
    fn name(&self) -> &'static str;

    /// Called once when the owning machine is built.
    ///
    /// Transition requests made here are discarded; the machine has no
    /// current state until `start`.
    fn on_init(&mut self, _fsm: &mut FsmContext<'_, O>) {}

    /// Called when this state becomes current.
    fn on_enter(&mut self, _fsm: &mut FsmContext<'_, O>) {}

    /// Called every tick while this state is current.
    ///
    /// `elapsed` is scaled logic time and `real_elapsed` unscaled wall
    /// time, both in seconds.
    fn on_update(&mut self, _fsm: &mut FsmContext<'_, O>, _elapsed: f32, _real_elapsed: f32) {}

    /// Called when the machine leaves this state.
    fn on_leave(&mut self, _fsm: &mut FsmContext<'_, O>, _is_shutdown: bool) {}

    /// Called once when the owning machine is destroyed.
    fn on_destroy(&mut self, _fsm: &mut FsmContext<'_, O>) {}
}

/// Last path segment of a type name, for error messages and logs.
pub(crate) fn short_type_name<T: ?Sized + 'static>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_type_name_strips_path() {
        assert_eq!(short_type_name::<String>(), "String");
        assert_eq!(short_type_name::<Vec<u8>>(), "Vec<u8>");
    }
}
