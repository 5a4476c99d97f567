//! Entity lookup across the world
//!
//! Entities reference each other by [`EntityId`] and resolve those ids
//! through the directory at the moment of use, never by holding direct
//! references. An entity that is mid-update holds its own `RefCell` borrow,
//! so directory queries skip unborrowable entries instead of panicking;
//! to a searching attacker, such an entity is simply absent this tick.

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use glam::Vec3;

use crate::combat::{Camp, DamageOutcome, ImpactData};

/// Stable handle of one spawned entity. Ids are assigned in spawn order
/// and never reused within a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The combat-facing surface of an entity, object safe so heroes and
/// monsters can share one directory.
pub trait Targetable {
    fn id(&self) -> EntityId;
    fn camp(&self) -> Camp;
    fn position(&self) -> Vec3;
    fn is_dead(&self) -> bool;

    /// Snapshot for an attacker's damage formula.
    fn impact_data(&self) -> ImpactData;

    /// Take a hit of `attack` from `attacker`.
    fn apply_damage(&mut self, attacker: EntityId, attack: f32) -> DamageOutcome;
}

/// Shared handle to a live entity.
pub type TargetHandle = Rc<RefCell<dyn Targetable>>;

/// Id to entity map shared by every state machine in a world.
#[derive(Default)]
pub struct EntityDirectory {
    entries: FxHashMap<EntityId, TargetHandle>,
}

impl EntityDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    /// Register `handle` under `id`. Replacing a live entry is a host bug,
    /// logged and tolerated.
    pub fn insert(&mut self, id: EntityId, handle: TargetHandle) {
        if self.entries.insert(id, handle).is_some() {
            log::warn!("entity {id} was already in the directory, replacing");
        }
    }

    /// Remove the entry for `id`, returning its handle if present.
    pub fn remove(&mut self, id: EntityId) -> Option<TargetHandle> {
        self.entries.remove(&id)
    }

    /// Fetch the handle registered under `id`.
    #[must_use]
    pub fn lookup(&self, id: EntityId) -> Option<TargetHandle> {
        self.entries.get(&id).cloned()
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of registered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of every registered entity, in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Closest living entity hostile to `camp`, measured from `from`.
    ///
    /// Entries that cannot be borrowed are skipped, which is how a
    /// searcher avoids finding itself. Distance ties go to the lower id
    /// so the result is deterministic.
    #[must_use]
    pub fn nearest_hostile(&self, from: Vec3, camp: Camp) -> Option<(EntityId, TargetHandle)> {
        let mut best: Option<(f32, EntityId)> = None;
        for (&id, handle) in &self.entries {
            let Ok(target) = handle.try_borrow() else {
                continue;
            };
            if target.is_dead() || !target.camp().is_hostile_to(camp) {
                continue;
            }
            let distance = from.distance(target.position());
            let replace = match best {
                None => true,
                Some((best_distance, best_id)) => match distance.partial_cmp(&best_distance) {
                    Some(Ordering::Less) => true,
                    Some(Ordering::Equal) => id < best_id,
                    _ => false,
                },
            };
            if replace {
                best = Some((distance, id));
            }
        }
        best.and_then(|(_, id)| self.lookup(id).map(|handle| (id, handle)))
    }
}

impl fmt::Debug for EntityDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDirectory")
            .field("entities", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{resolve, standard_damage, EntityAttributes};

    #[derive(Debug)]
    struct Dummy {
        id: EntityId,
        position: Vec3,
        attributes: EntityAttributes,
    }

    impl Dummy {
        fn handle(id: u32, camp: Camp, position: Vec3) -> (EntityId, TargetHandle) {
            let id = EntityId(id);
            let dummy = Dummy {
                id,
                position,
                attributes: EntityAttributes::new(camp, 50.0),
            };
            (id, Rc::new(RefCell::new(dummy)))
        }
    }

    impl Targetable for Dummy {
        fn id(&self) -> EntityId {
            self.id
        }

        fn camp(&self) -> Camp {
            self.attributes.camp()
        }

        fn position(&self) -> Vec3 {
            self.position
        }

        fn is_dead(&self) -> bool {
            self.attributes.is_dead()
        }

        fn impact_data(&self) -> ImpactData {
            self.attributes.impact_data()
        }

        fn apply_damage(&mut self, _attacker: EntityId, attack: f32) -> DamageOutcome {
            resolve(standard_damage, attack, &mut self.attributes)
        }
    }

    fn directory_with(entries: &[(EntityId, TargetHandle)]) -> EntityDirectory {
        let mut directory = EntityDirectory::new();
        for (id, handle) in entries {
            directory.insert(*id, Rc::clone(handle));
        }
        directory
    }

    #[test]
    fn test_insert_lookup_remove() {
        let (id, handle) = Dummy::handle(1, Camp::Player, Vec3::ZERO);
        let mut directory = directory_with(&[(id, handle)]);
        assert_eq!(directory.len(), 1);
        assert!(directory.contains(id));
        assert!(directory.lookup(id).is_some());
        assert!(directory.remove(id).is_some());
        assert!(directory.is_empty());
        assert!(directory.lookup(id).is_none());
    }

    #[test]
    fn test_ids_are_sorted() {
        let a = Dummy::handle(7, Camp::Enemy, Vec3::ZERO);
        let b = Dummy::handle(2, Camp::Enemy, Vec3::ZERO);
        let c = Dummy::handle(5, Camp::Player, Vec3::ZERO);
        let directory = directory_with(&[a, b, c]);
        assert_eq!(directory.ids(), [EntityId(2), EntityId(5), EntityId(7)]);
    }

    #[test]
    fn test_nearest_hostile_picks_closest_cross_camp() {
        let hero = Dummy::handle(1, Camp::Player, Vec3::ZERO);
        let near = Dummy::handle(2, Camp::Enemy, Vec3::new(2.0, 0.0, 0.0));
        let far = Dummy::handle(3, Camp::Enemy, Vec3::new(9.0, 0.0, 0.0));
        let directory = directory_with(&[hero, near, far]);
        let (id, _) = directory.nearest_hostile(Vec3::ZERO, Camp::Player).unwrap();
        assert_eq!(id, EntityId(2));
    }

    #[test]
    fn test_nearest_hostile_ignores_same_camp() {
        let hero = Dummy::handle(1, Camp::Player, Vec3::ZERO);
        let ally = Dummy::handle(2, Camp::Player, Vec3::new(1.0, 0.0, 0.0));
        let directory = directory_with(&[hero, ally]);
        assert!(directory.nearest_hostile(Vec3::ZERO, Camp::Player).is_none());
    }

    #[test]
    fn test_nearest_hostile_skips_dead() {
        let (dead_id, dead) = Dummy::handle(2, Camp::Enemy, Vec3::new(1.0, 0.0, 0.0));
        dead.borrow_mut().apply_damage(EntityId(1), 999.0);
        let live = Dummy::handle(3, Camp::Enemy, Vec3::new(8.0, 0.0, 0.0));
        let directory = directory_with(&[(dead_id, dead), live]);
        let (id, _) = directory.nearest_hostile(Vec3::ZERO, Camp::Player).unwrap();
        assert_eq!(id, EntityId(3));
    }

    #[test]
    fn test_nearest_hostile_skips_borrowed_entries() {
        let (near_id, near) = Dummy::handle(2, Camp::Enemy, Vec3::new(1.0, 0.0, 0.0));
        let far = Dummy::handle(3, Camp::Enemy, Vec3::new(8.0, 0.0, 0.0));
        let directory = directory_with(&[(near_id, Rc::clone(&near)), far]);

        let held = near.borrow_mut();
        let (id, _) = directory.nearest_hostile(Vec3::ZERO, Camp::Player).unwrap();
        drop(held);
        assert_eq!(id, EntityId(3), "borrowed entry must be invisible");
    }

    #[test]
    fn test_nearest_hostile_tie_goes_to_lower_id() {
        let left = Dummy::handle(9, Camp::Enemy, Vec3::new(-3.0, 0.0, 0.0));
        let right = Dummy::handle(4, Camp::Enemy, Vec3::new(3.0, 0.0, 0.0));
        let directory = directory_with(&[left, right]);
        let (id, _) = directory.nearest_hostile(Vec3::ZERO, Camp::Player).unwrap();
        assert_eq!(id, EntityId(4));
    }

    #[test]
    fn test_impact_data_flows_through_the_trait() {
        let (_, handle) = Dummy::handle(1, Camp::Enemy, Vec3::ZERO);
        let impact = handle.borrow().impact_data();
        assert_eq!(impact.camp, Camp::Enemy);
        assert!((impact.hp - 50.0).abs() < f32::EPSILON);
    }
}
