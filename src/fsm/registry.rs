//! State factories for stamping out per-entity machines
//!
//! Every entity owns its own state instances, so a machine cannot be built
//! from shared state objects. The registry stores one factory per state
//! type and [`StateRegistry::instantiate`] produces a fresh [`StateSet`]
//! each time an entity spawns.

use smallvec::SmallVec;
use std::any::TypeId;
use std::fmt;

use crate::fsm::error::FsmError;
use crate::fsm::machine::StateSet;
use crate::fsm::state::{short_type_name, FsmOwner, State};

struct Factory<O: FsmOwner> {
    id: TypeId,
    type_name: &'static str,
    build: fn() -> Box<dyn State<O>>,
}

/// An ordered collection of state factories for owner type `O`.
pub struct StateRegistry<O: FsmOwner> {
    factories: SmallVec<[Factory<O>; 8]>,
}

impl<O: FsmOwner> StateRegistry<O> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: SmallVec::new(),
        }
    }

    /// Register state type `S`, constructed through its `Default` impl.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::DuplicateState`] if `S` is already registered.
    pub fn with<S>(mut self) -> Result<Self, FsmError>
    where
        S: State<O> + Default + 'static,
    {
        let id = TypeId::of::<S>();
        if self.factories.iter().any(|factory| factory.id == id) {
            return Err(FsmError::DuplicateState {
                state: short_type_name::<S>(),
            });
        }
        self.factories.push(Factory {
            id,
            type_name: short_type_name::<S>(),
            build: || Box::new(S::default()),
        });
        Ok(self)
    }

    /// Build a fresh [`StateSet`] with one new instance per registered state,
    /// in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::EmptyStateSet`] if nothing was registered.
    pub fn instantiate(&self) -> Result<StateSet<O>, FsmError> {
        if self.factories.is_empty() {
            return Err(FsmError::EmptyStateSet {
                owner: short_type_name::<O>(),
            });
        }
        let mut set = StateSet::new();
        for factory in &self.factories {
            set.push_raw(factory.id, factory.type_name, (factory.build)())?;
        }
        Ok(set)
    }

    /// Whether state type `S` is registered.
    #[must_use]
    pub fn contains<S: State<O> + 'static>(&self) -> bool {
        let id = TypeId::of::<S>();
        self.factories.iter().any(|factory| factory.id == id)
    }

    /// Number of registered state types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether the registry holds no factories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Names of the registered state types, in registration order.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.iter().map(|factory| factory.type_name)
    }
}

impl<O: FsmOwner> Default for StateRegistry<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: FsmOwner> fmt::Debug for StateRegistry<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.type_names().collect();
        f.debug_struct("StateRegistry")
            .field("owner", &short_type_name::<O>())
            .field("states", &names)
            .finish()
    }
}

/// Owners that can name their full state roster.
///
/// Spawning code calls [`StateCatalog::state_registry`] instead of listing
/// states at every call site.
pub trait StateCatalog: FsmOwner + Sized {
    /// Build the registry of every state this owner's machine uses.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::DuplicateState`] if the roster lists a state
    /// type twice.
    fn state_registry() -> Result<StateRegistry<Self>, FsmError>;
}
