//! World orchestration
//!
//! `EntityWorld` owns every spawned actor together with its state machine,
//! the shared [`EntityDirectory`] and the combat [`EventQueue`]. One
//! `update` call is one simulation tick:
//!
//! 1. swap the event queue so last tick's events become readable,
//! 2. update actors in ascending [`EntityId`] order (ids are handed out
//!    sequentially, so this equals spawn order),
//! 3. flush each entity's buffered events into the queue, again in id
//!    order,
//! 4. sweep hide requests, destroying the machines of entities that asked
//!    to leave.
//!
//! Everything is single threaded. Cross-entity reads during step 2 go
//! through the directory, where the updating actor's own entry is
//! borrow-blocked and therefore invisible to itself.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use glam::Vec3;
use smallvec::SmallVec;

use crate::combat::{Camp, ImpactData};
use crate::core::{CombatEvent, EventQueue};
use crate::entity::directory::{EntityDirectory, EntityId, TargetHandle, Targetable};
use crate::entity::hero::Hero;
use crate::entity::monster::Monster;
use crate::entity::spawn::{EncounterSpec, HeroSpawn, MonsterSpawn, SpawnError};
use crate::entity::{DataKey, DataValue};
use crate::fsm::{Fsm, FsmError, StateCatalog};
use crate::host::{AnimationDriver, AxisInput, Movement};
use crate::states;

// ============================================================================
// Actors
// ============================================================================

/// A spawned entity paired with the machine that drives it.
#[derive(Debug)]
pub enum Actor {
    Hero {
        logic: Rc<RefCell<Hero>>,
        fsm: Fsm<Hero>,
    },
    Monster {
        logic: Rc<RefCell<Monster>>,
        fsm: Fsm<Monster>,
    },
}

impl Actor {
    /// Name of the state the actor's machine currently runs.
    #[must_use]
    pub fn state_name(&self) -> Option<&'static str> {
        match self {
            Self::Hero { fsm, .. } => fsm.current_state_name(),
            Self::Monster { fsm, .. } => fsm.current_state_name(),
        }
    }

    fn is_alive_in(&self, camp: Camp) -> bool {
        match self {
            Self::Hero { logic, .. } => {
                let hero = logic.borrow();
                hero.camp() == camp && !hero.is_dead()
            }
            Self::Monster { logic, .. } => {
                let monster = logic.borrow();
                monster.camp() == camp && !monster.is_dead()
            }
        }
    }

    fn hide_requested(&self) -> bool {
        match self {
            Self::Hero { logic, .. } => logic.borrow().hide_requested(),
            Self::Monster { logic, .. } => logic.borrow().hide_requested(),
        }
    }

    fn drain_events(&self) -> SmallVec<[CombatEvent; 4]> {
        match self {
            Self::Hero { logic, .. } => logic.borrow_mut().drain_events(),
            Self::Monster { logic, .. } => logic.borrow_mut().drain_events(),
        }
    }
}

// ============================================================================
// World
// ============================================================================

/// Owns and drives every entity in one game world.
pub struct EntityWorld {
    /// Actors in ascending id order, which is the update order.
    actors: BTreeMap<EntityId, Actor>,
    directory: EntityDirectory,
    events: EventQueue,
    /// Input handle shared with every spawned hero.
    input: Rc<dyn AxisInput>,
    next_id: u32,
    ticks: u64,
}

impl EntityWorld {
    /// Create an empty world around the host's input source.
    #[must_use]
    pub fn new(input: Rc<dyn AxisInput>) -> Self {
        Self {
            actors: BTreeMap::new(),
            directory: EntityDirectory::new(),
            events: EventQueue::new(),
            input,
            next_id: 1,
            ticks: 0,
        }
    }

    // ------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------

    /// Spawn a hero from `row`, binding the given host services and the
    /// world's shared input.
    ///
    /// The full sequence runs only when every step succeeds: validate the
    /// row, bind services, register in the directory, build and start the
    /// state machine, seed the spawn point, emit [`CombatEvent::EntitySpawned`].
    /// On any failure the world is left unchanged and the id is not spent.
    ///
    /// # Errors
    ///
    /// [`SpawnError::InvalidData`] for a malformed row,
    /// [`SpawnError::InsufficientClips`] when the animation driver cannot
    /// cover every animation state, [`SpawnError::Fsm`] when the state
    /// machine cannot be assembled.
    pub fn spawn_hero(
        &mut self,
        row: &HeroSpawn,
        movement: Rc<dyn Movement>,
        animation: Rc<dyn AnimationDriver>,
    ) -> Result<EntityId, SpawnError> {
        let id = EntityId(self.next_id);
        let hero = Hero::new(id, row, movement, animation, Rc::clone(&self.input))
            .map_err(|err| {
                log::warn!("hero spawn rejected: {err}");
                err
            })?;
        let logic = Rc::new(RefCell::new(hero));
        self.directory
            .insert(id, Rc::clone(&logic) as TargetHandle);
        let fsm = match self.start_hero_fsm(&logic, row.position) {
            Ok(fsm) => fsm,
            Err(err) => {
                self.directory.remove(id);
                log::warn!("hero spawn rejected: {err}");
                return Err(err.into());
            }
        };
        self.actors.insert(id, Actor::Hero { logic, fsm });
        self.next_id += 1;
        self.events.push(CombatEvent::EntitySpawned {
            entity: id,
            camp: Camp::Player,
        });
        log::info!("spawned hero {} as {id}", row.name);
        Ok(id)
    }

    /// Spawn a monster from `row`. Same sequence and failure contract as
    /// [`EntityWorld::spawn_hero`].
    ///
    /// # Errors
    ///
    /// See [`EntityWorld::spawn_hero`].
    pub fn spawn_monster(
        &mut self,
        row: &MonsterSpawn,
        movement: Rc<dyn Movement>,
        animation: Rc<dyn AnimationDriver>,
    ) -> Result<EntityId, SpawnError> {
        let id = EntityId(self.next_id);
        let monster = Monster::new(id, row, movement, animation).map_err(|err| {
            log::warn!("monster spawn rejected: {err}");
            err
        })?;
        let logic = Rc::new(RefCell::new(monster));
        self.directory
            .insert(id, Rc::clone(&logic) as TargetHandle);
        let fsm = match self.start_monster_fsm(&logic, row.position) {
            Ok(fsm) => fsm,
            Err(err) => {
                self.directory.remove(id);
                log::warn!("monster spawn rejected: {err}");
                return Err(err.into());
            }
        };
        self.actors.insert(id, Actor::Monster { logic, fsm });
        self.next_id += 1;
        self.events.push(CombatEvent::EntitySpawned {
            entity: id,
            camp: Camp::Enemy,
        });
        log::info!("spawned monster {} as {id}", row.name);
        Ok(id)
    }

    /// Spawn a whole encounter: the hero first, then every monster row in
    /// file order. `services` is asked for a `(movement, animation)` pair
    /// per entity, keyed by the row's name.
    ///
    /// # Errors
    ///
    /// The spec is validated up front, so failures past the first spawn
    /// can only come from the host services; entities spawned before the
    /// failure stay in the world.
    pub fn spawn_encounter(
        &mut self,
        spec: &EncounterSpec,
        mut services: impl FnMut(&str) -> (Rc<dyn Movement>, Rc<dyn AnimationDriver>),
    ) -> Result<Vec<EntityId>, SpawnError> {
        spec.validate()?;
        let mut spawned = Vec::with_capacity(1 + spec.monsters.len());
        let (movement, animation) = services(&spec.hero.name);
        spawned.push(self.spawn_hero(&spec.hero, movement, animation)?);
        for row in &spec.monsters {
            let (movement, animation) = services(&row.name);
            spawned.push(self.spawn_monster(row, movement, animation)?);
        }
        log::info!(
            "encounter \"{}\" spawned {} entities",
            spec.name,
            spawned.len()
        );
        Ok(spawned)
    }

    fn start_hero_fsm(
        &self,
        logic: &Rc<RefCell<Hero>>,
        spawn_point: Vec3,
    ) -> Result<Fsm<Hero>, FsmError> {
        let states = Hero::state_registry()?.instantiate()?;
        let mut hero = logic.borrow_mut();
        let mut fsm = Fsm::new(&mut *hero, &self.directory, states)?;
        fsm.set_data(DataKey::SpawnPoint, DataValue::Point(spawn_point))?;
        fsm.start::<states::hero::Idle>(&mut *hero, &self.directory)?;
        Ok(fsm)
    }

    fn start_monster_fsm(
        &self,
        logic: &Rc<RefCell<Monster>>,
        spawn_point: Vec3,
    ) -> Result<Fsm<Monster>, FsmError> {
        let states = Monster::state_registry()?.instantiate()?;
        let mut monster = logic.borrow_mut();
        let mut fsm = Fsm::new(&mut *monster, &self.directory, states)?;
        fsm.set_data(DataKey::SpawnPoint, DataValue::Point(spawn_point))?;
        fsm.start::<states::monster::Idle>(&mut *monster, &self.directory)?;
        Ok(fsm)
    }

    // ------------------------------------------------------------------
    // Update loop
    // ------------------------------------------------------------------

    /// Advance the world by one tick.
    ///
    /// `elapsed` is scaled game time, `real_elapsed` wall-clock time; both
    /// are forwarded to every state callback. Actor update errors are
    /// logged and skipped, never propagated, so one broken machine cannot
    /// stall the world.
    pub fn update(&mut self, elapsed: f32, real_elapsed: f32) {
        self.ticks += 1;
        self.events.swap();

        for (id, actor) in &mut self.actors {
            match actor {
                Actor::Hero { logic, fsm } => {
                    let mut hero = logic.borrow_mut();
                    hero.pre_update(elapsed);
                    if let Err(err) = fsm.update(&mut *hero, &self.directory, elapsed, real_elapsed)
                    {
                        log::warn!("hero {id} update failed: {err}");
                    }
                }
                Actor::Monster { logic, fsm } => {
                    let mut monster = logic.borrow_mut();
                    if let Err(err) =
                        fsm.update(&mut *monster, &self.directory, elapsed, real_elapsed)
                    {
                        log::warn!("monster {id} update failed: {err}");
                    }
                }
            }
        }

        self.flush_entity_events();
        self.sweep_hidden();
    }

    /// Move every entity's buffered events into the world queue, in id
    /// order. Within one entity the buffer keeps arrival order, so two
    /// hits landed in the same tick flush in the order they landed.
    fn flush_entity_events(&mut self) {
        for actor in self.actors.values() {
            for event in actor.drain_events() {
                self.events.push(event);
            }
        }
    }

    fn sweep_hidden(&mut self) {
        let hidden: Vec<EntityId> = self
            .actors
            .iter()
            .filter(|(_, actor)| actor.hide_requested())
            .map(|(id, _)| *id)
            .collect();
        for id in hidden {
            self.hide(id);
        }
    }

    /// Remove `id` from the world: run the machine's shutdown path, drop
    /// the directory entry, emit [`CombatEvent::EntityHidden`]. Returns
    /// false when the id is unknown.
    pub fn hide(&mut self, id: EntityId) -> bool {
        let Some(actor) = self.actors.remove(&id) else {
            return false;
        };
        match actor {
            Actor::Hero { logic, mut fsm } => {
                let mut hero = logic.borrow_mut();
                if let Err(err) = fsm.destroy(&mut *hero, &self.directory) {
                    log::warn!("hero {id} teardown failed: {err}");
                }
            }
            Actor::Monster { logic, mut fsm } => {
                let mut monster = logic.borrow_mut();
                if let Err(err) = fsm.destroy(&mut *monster, &self.directory) {
                    log::warn!("monster {id} teardown failed: {err}");
                }
            }
        }
        self.directory.remove(id);
        self.events.push(CombatEvent::EntityHidden { entity: id });
        log::debug!("entity {id} left the world");
        true
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Events from the previous update.
    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// The shared lookup directory.
    #[must_use]
    pub fn directory(&self) -> &EntityDirectory {
        &self.directory
    }

    /// The actor behind `id`, if it is still in the world.
    #[must_use]
    pub fn actor(&self, id: EntityId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.actors.contains_key(&id)
    }

    /// Number of actors in the world, dead-but-lingering included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// All actor ids in update order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.actors.keys().copied().collect()
    }

    /// Completed update calls.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Living entities fighting for `camp`.
    #[must_use]
    pub fn alive_in_camp(&self, camp: Camp) -> usize {
        self.actors
            .values()
            .filter(|actor| actor.is_alive_in(camp))
            .count()
    }

    /// Name of the state `id`'s machine currently runs.
    #[must_use]
    pub fn state_name(&self, id: EntityId) -> Option<&'static str> {
        self.actors.get(&id).and_then(Actor::state_name)
    }

    /// Combat snapshot of `id`, unless it is missing or mid-update.
    #[must_use]
    pub fn impact_of(&self, id: EntityId) -> Option<ImpactData> {
        let handle = self.directory.lookup(id)?;
        let target = handle.try_borrow().ok()?;
        Some(target.impact_data())
    }
}

impl fmt::Debug for EntityWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityWorld")
            .field("actors", &self.ids())
            .field("directory", &self.directory)
            .field("next_id", &self.next_id)
            .field("ticks", &self.ticks)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
