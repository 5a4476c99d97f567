//! Entity controllers, spawning and world bookkeeping

use glam::Vec3;

mod animation;
mod body;
mod directory;
mod hero;
mod monster;
mod spawn;
mod transform;
mod world;

pub use animation::{AnimationState, AnimationTable, ANIMATION_BLEND_SECONDS};
pub use directory::{EntityDirectory, EntityId, TargetHandle, Targetable};
pub use hero::{Hero, INPUT_YAW_FACTOR};
pub use monster::Monster;
pub use spawn::{EncounterSpec, HeroSpawn, MonsterSpawn, SpawnError};
pub use transform::Transform;
pub use world::{Actor, EntityWorld};

/// Blackboard keys shared by hero and monster machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKey {
    /// Id of the entity currently locked as the attack target.
    LockAim,
    /// Where the entity entered the world.
    SpawnPoint,
}

/// Blackboard values stored under [`DataKey`].
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Entity(EntityId),
    Point(Vec3),
}

impl DataValue {
    /// The entity id, if this value holds one.
    #[must_use]
    pub fn as_entity(&self) -> Option<EntityId> {
        match self {
            Self::Entity(id) => Some(*id),
            Self::Point(_) => None,
        }
    }

    /// The point, if this value holds one.
    #[must_use]
    pub fn as_point(&self) -> Option<Vec3> {
        match self {
            Self::Point(point) => Some(*point),
            Self::Entity(_) => None,
        }
    }
}
