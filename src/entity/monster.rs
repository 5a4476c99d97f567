//! AI-driven monsters

use std::fmt;
use std::rc::Rc;

use glam::Vec3;

use crate::combat::{Camp, DamageOutcome, DamagePolicy, EntityAttributes, ImpactData};
use crate::core::CombatEvent;
use crate::entity::animation::AnimationState;
use crate::entity::body::EntityBody;
use crate::entity::directory::{EntityDirectory, EntityId, Targetable};
use crate::entity::spawn::{MonsterSpawn, SpawnError};
use crate::entity::transform::Transform;
use crate::entity::{DataKey, DataValue};
use crate::fsm::{FsmError, FsmOwner, StateCatalog, StateRegistry};
use crate::host::{AnimationDriver, Movement};
use crate::states::monster;
use smallvec::SmallVec;

/// A monster: no input, aggro-driven targeting, otherwise the same chassis
/// as the hero.
pub struct Monster {
    body: EntityBody,
    aggro_range: f32,
}

impl Monster {
    /// Validate `row`, bind host services and build the monster.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError::InvalidData`] for a bad row or
    /// [`SpawnError::InsufficientClips`] when the animation driver cannot
    /// cover every animation state.
    pub fn new(
        id: EntityId,
        row: &MonsterSpawn,
        movement: Rc<dyn Movement>,
        animation: Rc<dyn AnimationDriver>,
    ) -> Result<Self, SpawnError> {
        row.validate()?;
        let attributes = EntityAttributes::new(Camp::Enemy, row.hp)
            .with_attack(row.attack)
            .with_defense(row.defense)
            .with_move_speed(row.move_speed)
            .with_rotate_speed(row.rotate_speed)
            .with_attack_range(row.attack_range)
            .with_attack_interval(row.attack_interval);
        let transform = Transform::from_position_yaw(row.position, row.yaw);
        let body = EntityBody::new(
            id,
            row.name.clone(),
            attributes,
            transform,
            movement,
            animation,
        )?;
        Ok(Self {
            body,
            aggro_range: row.aggro_range,
        })
    }

    /// Distance at which this monster notices a hostile.
    #[must_use]
    pub fn aggro_range(&self) -> f32 {
        self.aggro_range
    }

    /// Swap the damage formula this monster resolves incoming hits with.
    pub fn set_damage_policy(&mut self, policy: DamagePolicy) {
        self.body.set_damage_policy(policy);
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.body.name()
    }

    #[must_use]
    pub fn attributes(&self) -> &EntityAttributes {
        self.body.attributes()
    }

    #[must_use]
    pub fn transform(&self) -> &Transform {
        self.body.transform()
    }

    // Verbs the states drive the monster through.

    pub(crate) fn forward_move(&mut self, amount: f32) {
        self.body.forward_move(amount);
    }

    pub(crate) fn turn_towards(&mut self, target: Vec3, elapsed: f32) -> f32 {
        self.body.turn_towards(target, elapsed)
    }

    pub(crate) fn distance_to(&self, point: Vec3) -> f32 {
        self.body.distance_to(point)
    }

    pub(crate) fn play_animation(&mut self, state: AnimationState) {
        self.body.play_animation(state);
    }

    pub(crate) fn is_playing(&self, state: AnimationState) -> bool {
        self.body.is_playing(state)
    }

    pub(crate) fn in_attack_range(&self, target: Vec3) -> bool {
        self.body.in_attack_range(target)
    }

    pub(crate) fn take_hurt_pending(&mut self) -> bool {
        self.body.take_hurt_pending()
    }

    pub(crate) fn last_attacker(&self) -> Option<EntityId> {
        self.body.last_attacker()
    }

    pub(crate) fn request_hide(&mut self) {
        self.body.request_hide();
    }

    pub(crate) fn hide_requested(&self) -> bool {
        self.body.hide_requested()
    }

    pub(crate) fn drain_events(&mut self) -> SmallVec<[CombatEvent; 4]> {
        self.body.drain_events()
    }
}

impl Targetable for Monster {
    fn id(&self) -> EntityId {
        self.body.id()
    }

    fn camp(&self) -> Camp {
        self.body.camp()
    }

    fn position(&self) -> Vec3 {
        self.body.position()
    }

    fn is_dead(&self) -> bool {
        self.body.is_dead()
    }

    fn impact_data(&self) -> ImpactData {
        self.body.impact_data()
    }

    fn apply_damage(&mut self, attacker: EntityId, attack: f32) -> DamageOutcome {
        self.body.apply_damage(attacker, attack)
    }
}

impl FsmOwner for Monster {
    type DataKey = DataKey;
    type DataValue = DataValue;
    type Ctx = EntityDirectory;
}

impl StateCatalog for Monster {
    fn state_registry() -> Result<StateRegistry<Self>, FsmError> {
        StateRegistry::new()
            .with::<monster::Idle>()?
            .with::<monster::LockAim>()?
            .with::<monster::Attack>()?
            .with::<monster::Cooldown>()?
            .with::<monster::Hurt>()?
            .with::<monster::Dead>()
    }
}

impl fmt::Debug for Monster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monster")
            .field("body", &self.body)
            .field("aggro_range", &self.aggro_range)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{monster_spawn, RecordingMovement, ScriptedAnimation};

    fn test_monster(position: Vec3) -> Monster {
        Monster::new(
            EntityId(2),
            &monster_spawn("Gnarl", position),
            Rc::new(RecordingMovement::default()),
            Rc::new(ScriptedAnimation::standard()),
        )
        .unwrap()
    }

    #[test]
    fn test_spawn_rejects_invalid_row() {
        let mut row = monster_spawn("Gnarl", Vec3::ZERO);
        row.aggro_range = 0.0;
        let err = Monster::new(
            EntityId(2),
            &row,
            Rc::new(RecordingMovement::default()),
            Rc::new(ScriptedAnimation::standard()),
        )
        .unwrap_err();
        assert!(matches!(err, SpawnError::InvalidData { .. }));
    }

    #[test]
    fn test_monster_is_enemy_camp() {
        let monster = test_monster(Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(monster.camp(), Camp::Enemy);
        assert!((monster.aggro_range() - 10.0).abs() < f32::EPSILON);
        assert!(monster.position().distance(Vec3::new(4.0, 0.0, 0.0)) < f32::EPSILON);
    }

    #[test]
    fn test_last_attacker_tracks_latest_hit() {
        let mut monster = test_monster(Vec3::ZERO);
        assert_eq!(monster.last_attacker(), None);
        monster.apply_damage(EntityId(1), 50.0);
        assert_eq!(monster.last_attacker(), Some(EntityId(1)));
        monster.apply_damage(EntityId(5), 50.0);
        assert_eq!(monster.last_attacker(), Some(EntityId(5)));
    }

    #[test]
    fn test_state_catalog_covers_full_roster() {
        let registry = Monster::state_registry().unwrap();
        assert_eq!(registry.len(), 6);
        let names: Vec<_> = registry.type_names().collect();
        assert_eq!(
            names,
            ["Idle", "LockAim", "Attack", "Cooldown", "Hurt", "Dead"]
        );
    }
}
