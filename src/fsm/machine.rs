//! Finite state machine engine
//!
//! # Design Principles
//!
//! - **Owner outside the machine**: the machine never stores its owner.
//!   Every call takes `&mut O` plus a shared `&O::Ctx`, so the owner can sit
//!   in an `Rc<RefCell<..>>` without the machine participating in that.
//! - **One instance per state**: each state type is instantiated once and
//!   reused across entries. State structs keep per-visit fields and reset
//!   them in `on_enter`.
//! - **Deferred transitions**: `change_state` records a request; the engine
//!   applies it after the running callback returns. Only the last request
//!   made during a callback wins.
//! - **Explicit failure**: unknown target states and calls on a destroyed
//!   machine surface as [`FsmError`] instead of panics.

use rustc_hash::FxHashMap;
use std::any::TypeId;
use std::fmt;

use crate::fsm::blackboard::Blackboard;
use crate::fsm::error::FsmError;
use crate::fsm::state::{short_type_name, FsmOwner, State};

// ============================================================================
// State Set
// ============================================================================

struct StateEntry<O: FsmOwner> {
    id: TypeId,
    type_name: &'static str,
    state: Box<dyn State<O>>,
}

/// The states a machine is built from, in registration order.
///
/// Built by chaining [`StateSet::with`]; registering the same state type
/// twice fails before any state callback has run.
pub struct StateSet<O: FsmOwner> {
    entries: Vec<StateEntry<O>>,
}

impl<O: FsmOwner> StateSet<O> {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a state to the set.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::DuplicateState`] if a state of the same type is
    /// already registered.
    pub fn with<S: State<O> + 'static>(mut self, state: S) -> Result<Self, FsmError> {
        let id = TypeId::of::<S>();
        if self.entries.iter().any(|entry| entry.id == id) {
            return Err(FsmError::DuplicateState {
                state: short_type_name::<S>(),
            });
        }
        self.entries.push(StateEntry {
            id,
            type_name: short_type_name::<S>(),
            state: Box::new(state),
        });
        Ok(self)
    }

    /// Add an already boxed state under an explicit type id.
    pub(crate) fn push_raw(
        &mut self,
        id: TypeId,
        type_name: &'static str,
        state: Box<dyn State<O>>,
    ) -> Result<(), FsmError> {
        if self.entries.iter().any(|entry| entry.id == id) {
            return Err(FsmError::DuplicateState { state: type_name });
        }
        self.entries.push(StateEntry {
            id,
            type_name,
            state,
        });
        Ok(())
    }

    /// Number of registered states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set holds no states.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<O: FsmOwner> Default for StateSet<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: FsmOwner> fmt::Debug for StateSet<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.entries.iter().map(|e| e.type_name).collect();
        f.debug_struct("StateSet").field("states", &names).finish()
    }
}

// ============================================================================
// Callback Context
// ============================================================================

struct TransitionRequest {
    id: TypeId,
    state: &'static str,
}

/// View of the machine handed to state callbacks.
///
/// Exposes the owner, the shared context, the blackboard, and the only way
/// to request a transition. The request is applied after the callback
/// returns; if a callback requests several transitions, the last one wins.
pub struct FsmContext<'a, O: FsmOwner> {
    /// The entity this machine drives.
    pub owner: &'a mut O,
    /// Shared per-call context, e.g. the entity directory.
    pub ctx: &'a O::Ctx,
    data: &'a mut Blackboard<O::DataKey, O::DataValue>,
    pending: &'a mut Option<TransitionRequest>,
    current_name: &'static str,
    state_time: f32,
}

impl<O: FsmOwner> FsmContext<'_, O> {
    /// Request a transition to state `S`.
    ///
    /// Takes effect after the current callback returns. Requests made in
    /// `on_init` are discarded.
    pub fn change_state<S: State<O> + 'static>(&mut self) {
        let target = short_type_name::<S>();
        log::debug!("{} requests transition to {}", self.current_name, target);
        *self.pending = Some(TransitionRequest {
            id: TypeId::of::<S>(),
            state: target,
        });
    }

    /// Seconds of scaled time spent in the current state, including the
    /// elapsed time of the tick being processed.
    #[must_use]
    pub fn state_time(&self) -> f32 {
        self.state_time
    }

    /// Fetch a clone of the blackboard value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::MissingKey`] when nothing is stored under `key`.
    pub fn get_data(&self, key: O::DataKey) -> Result<O::DataValue, FsmError> {
        self.data.get(key)
    }

    /// Store a blackboard value, returning the previous one if any.
    pub fn set_data(&mut self, key: O::DataKey, value: O::DataValue) -> Option<O::DataValue> {
        self.data.set(key, value)
    }

    /// Remove a blackboard value, returning it if present.
    pub fn remove_data(&mut self, key: O::DataKey) -> Option<O::DataValue> {
        self.data.remove(key)
    }

    /// Whether a blackboard value is stored under `key`.
    #[must_use]
    pub fn has_data(&self, key: O::DataKey) -> bool {
        self.data.contains(key)
    }
}

// ============================================================================
// Machine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Running,
    Destroyed,
}

struct Slot<O: FsmOwner> {
    id: TypeId,
    type_name: &'static str,
    // Taken while this state's callback runs, put back afterwards.
    state: Option<Box<dyn State<O>>>,
}

/// A finite state machine over an owner type `O`.
///
/// Built from a [`StateSet`], started once with [`Fsm::start`], driven by
/// [`Fsm::update`] and torn down with [`Fsm::destroy`]. After destruction
/// every operation fails with [`FsmError::Destroyed`].
pub struct Fsm<O: FsmOwner> {
    slots: Vec<Slot<O>>,
    index: FxHashMap<TypeId, usize>,
    current: Option<usize>,
    data: Blackboard<O::DataKey, O::DataValue>,
    pending: Option<TransitionRequest>,
    state_time: f32,
    phase: Phase,
}

impl<O: FsmOwner> Fsm<O> {
    /// Build a machine from `states` and run `on_init` on each state in
    /// registration order. The machine has no current state until
    /// [`Fsm::start`].
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::EmptyStateSet`] if `states` is empty.
    pub fn new(owner: &mut O, ctx: &O::Ctx, states: StateSet<O>) -> Result<Self, FsmError> {
        if states.is_empty() {
            return Err(FsmError::EmptyStateSet {
                owner: short_type_name::<O>(),
            });
        }

        let mut slots = Vec::with_capacity(states.entries.len());
        let mut index = FxHashMap::default();
        for (position, entry) in states.entries.into_iter().enumerate() {
            index.insert(entry.id, position);
            slots.push(Slot {
                id: entry.id,
                type_name: entry.type_name,
                state: Some(entry.state),
            });
        }

        let mut fsm = Self {
            slots,
            index,
            current: None,
            data: Blackboard::new(),
            pending: None,
            state_time: 0.0,
            phase: Phase::Created,
        };

        for idx in 0..fsm.slots.len() {
            fsm.run_callback(owner, ctx, idx, |state, fsm| state.on_init(fsm));
        }
        // There is no current state yet, so init-time requests go nowhere.
        fsm.pending = None;

        log::debug!(
            "fsm<{}> created with {} states",
            short_type_name::<O>(),
            fsm.slots.len()
        );
        Ok(fsm)
    }

    /// Enter the initial state `S`.
    ///
    /// # Errors
    ///
    /// Fails with [`FsmError::AlreadyStarted`] if the machine is running,
    /// [`FsmError::UnknownState`] if `S` was not registered (the machine
    /// stays startable), or [`FsmError::Destroyed`] after [`Fsm::destroy`].
    /// A transition requested during entry can also surface
    /// [`FsmError::UnknownState`]; the machine is left running in the last
    /// state entered, as for a bad request during [`Fsm::update`].
    pub fn start<S: State<O> + 'static>(
        &mut self,
        owner: &mut O,
        ctx: &O::Ctx,
    ) -> Result<(), FsmError> {
        self.ensure_alive("start")?;
        if self.phase == Phase::Running {
            return Err(FsmError::AlreadyStarted {
                current: self.current_state_name().unwrap_or("<none>"),
            });
        }
        let Some(&idx) = self.index.get(&TypeId::of::<S>()) else {
            return Err(FsmError::UnknownState {
                state: short_type_name::<S>(),
            });
        };

        self.phase = Phase::Running;
        self.current = Some(idx);
        self.state_time = 0.0;
        log::debug!(
            "fsm<{}> starting in {}",
            short_type_name::<O>(),
            self.slots[idx].type_name
        );
        self.run_callback(owner, ctx, idx, |state, fsm| state.on_enter(fsm));
        self.apply_pending(owner, ctx)
    }

    /// Advance the current state by one tick.
    ///
    /// `elapsed` is scaled logic time, `real_elapsed` unscaled wall time.
    /// State time accumulates before `on_update` runs, so the callback
    /// already sees the tick it is processing. A no-op before [`Fsm::start`].
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::Destroyed`] after [`Fsm::destroy`], or
    /// [`FsmError::UnknownState`] if the callback requested an unregistered
    /// state. The current state is kept in that case.
    pub fn update(
        &mut self,
        owner: &mut O,
        ctx: &O::Ctx,
        elapsed: f32,
        real_elapsed: f32,
    ) -> Result<(), FsmError> {
        self.ensure_alive("update")?;
        let Some(idx) = self.current else {
            return Ok(());
        };
        self.state_time += elapsed;
        self.run_callback(owner, ctx, idx, |state, fsm| {
            state.on_update(fsm, elapsed, real_elapsed);
        });
        self.apply_pending(owner, ctx)
    }

    /// Tear the machine down.
    ///
    /// Runs `on_leave(is_shutdown = true)` on the current state if any,
    /// then `on_destroy` on every state in registration order, and clears
    /// the blackboard. Transition requests made during teardown are
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::Destroyed`] if called twice.
    pub fn destroy(&mut self, owner: &mut O, ctx: &O::Ctx) -> Result<(), FsmError> {
        self.ensure_alive("destroy")?;
        if let Some(idx) = self.current {
            self.run_callback(owner, ctx, idx, |state, fsm| state.on_leave(fsm, true));
        }
        self.pending = None;
        for idx in 0..self.slots.len() {
            self.run_callback(owner, ctx, idx, |state, fsm| state.on_destroy(fsm));
        }
        self.pending = None;
        self.current = None;
        self.data.clear();
        self.phase = Phase::Destroyed;
        log::debug!("fsm<{}> destroyed", short_type_name::<O>());
        Ok(())
    }

    fn run_callback<F>(&mut self, owner: &mut O, ctx: &O::Ctx, idx: usize, f: F)
    where
        F: FnOnce(&mut dyn State<O>, &mut FsmContext<'_, O>),
    {
        let name = self.slots[idx].type_name;
        // Re-entrant callbacks cannot happen: the engine only invokes one
        // callback at a time and the slot is empty while it runs.
        let Some(mut state) = self.slots[idx].state.take() else {
            return;
        };
        let mut context = FsmContext {
            owner,
            ctx,
            data: &mut self.data,
            pending: &mut self.pending,
            current_name: name,
            state_time: self.state_time,
        };
        f(state.as_mut(), &mut context);
        self.slots[idx].state = Some(state);
    }

    fn apply_pending(&mut self, owner: &mut O, ctx: &O::Ctx) -> Result<(), FsmError> {
        while let Some(request) = self.pending.take() {
            let Some(&next) = self.index.get(&request.id) else {
                return Err(FsmError::UnknownState {
                    state: request.state,
                });
            };
            let from = self
                .current
                .map_or("<none>", |idx| self.slots[idx].type_name);
            log::debug!(
                "fsm<{}> {} -> {}",
                short_type_name::<O>(),
                from,
                self.slots[next].type_name
            );
            if let Some(idx) = self.current {
                self.run_callback(owner, ctx, idx, |state, fsm| state.on_leave(fsm, false));
            }
            self.current = Some(next);
            self.state_time = 0.0;
            self.run_callback(owner, ctx, next, |state, fsm| state.on_enter(fsm));
        }
        Ok(())
    }

    /// Name of the current state, if the machine is running.
    #[must_use]
    pub fn current_state_name(&self) -> Option<&'static str> {
        self.current.map(|idx| self.slots[idx].type_name)
    }

    /// Whether the current state is `S`.
    #[must_use]
    pub fn is_in<S: State<O> + 'static>(&self) -> bool {
        self.current
            .is_some_and(|idx| self.slots[idx].id == TypeId::of::<S>())
    }

    /// Whether the machine has been started and not destroyed.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Whether the machine has been destroyed.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.phase == Phase::Destroyed
    }

    /// Number of registered states.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.slots.len()
    }

    /// Seconds of scaled time spent in the current state.
    #[must_use]
    pub fn state_time(&self) -> f32 {
        self.state_time
    }

    /// Fetch a clone of the blackboard value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::MissingKey`] when nothing is stored under `key`,
    /// or [`FsmError::Destroyed`] after [`Fsm::destroy`].
    pub fn get_data(&self, key: O::DataKey) -> Result<O::DataValue, FsmError> {
        self.ensure_alive("get_data")?;
        self.data.get(key)
    }

    /// Store a blackboard value, returning the previous one if any.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::Destroyed`] after [`Fsm::destroy`].
    pub fn set_data(
        &mut self,
        key: O::DataKey,
        value: O::DataValue,
    ) -> Result<Option<O::DataValue>, FsmError> {
        self.ensure_alive("set_data")?;
        Ok(self.data.set(key, value))
    }

    /// Remove a blackboard value, returning it if present.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::Destroyed`] after [`Fsm::destroy`].
    pub fn remove_data(&mut self, key: O::DataKey) -> Result<Option<O::DataValue>, FsmError> {
        self.ensure_alive("remove_data")?;
        Ok(self.data.remove(key))
    }

    /// Whether a blackboard value is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::Destroyed`] after [`Fsm::destroy`].
    pub fn has_data(&self, key: O::DataKey) -> Result<bool, FsmError> {
        self.ensure_alive("has_data")?;
        Ok(self.data.contains(key))
    }

    fn ensure_alive(&self, op: &'static str) -> Result<(), FsmError> {
        if self.phase == Phase::Destroyed {
            return Err(FsmError::Destroyed { op });
        }
        Ok(())
    }
}

impl<O: FsmOwner> fmt::Debug for Fsm<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fsm")
            .field("owner", &short_type_name::<O>())
            .field("current", &self.current_state_name())
            .field("states", &self.slots.len())
            .field("phase", &self.phase)
            .finish()
    }
}
