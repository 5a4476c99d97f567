//! The player-controlled hero

use std::fmt;
use std::rc::Rc;

use glam::Vec3;

use crate::combat::{Camp, DamageOutcome, DamagePolicy, EntityAttributes, ImpactData};
use crate::core::CombatEvent;
use crate::entity::animation::AnimationState;
use crate::entity::body::EntityBody;
use crate::entity::directory::{EntityDirectory, EntityId, Targetable};
use crate::entity::spawn::{HeroSpawn, SpawnError};
use crate::entity::transform::Transform;
use crate::entity::{DataKey, DataValue};
use crate::fsm::{FsmError, FsmOwner, StateCatalog, StateRegistry};
use crate::host::{AnimationDriver, AxisInput, Movement, AXIS_FIRE, AXIS_HORIZONTAL, AXIS_VERTICAL};
use crate::states::hero;
use smallvec::SmallVec;

/// Steering gain applied to the horizontal input axis.
pub const INPUT_YAW_FACTOR: f32 = 0.8;

/// The hero: input-driven movement, one state machine, one set of combat
/// attributes.
pub struct Hero {
    body: EntityBody,
    input: Rc<dyn AxisInput>,
}

impl Hero {
    /// Validate `row`, bind host services and build the hero.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError::InvalidData`] for a bad row or
    /// [`SpawnError::InsufficientClips`] when the animation driver cannot
    /// cover every animation state.
    pub fn new(
        id: EntityId,
        row: &HeroSpawn,
        movement: Rc<dyn Movement>,
        animation: Rc<dyn AnimationDriver>,
        input: Rc<dyn AxisInput>,
    ) -> Result<Self, SpawnError> {
        row.validate()?;
        let attributes = EntityAttributes::new(Camp::Player, row.hp)
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
        Ok(Self { body, input })
    }

    /// Steering, applied every tick before the state machine runs. The
    /// horizontal axis turns the hero regardless of which state is active.
    pub fn pre_update(&mut self, elapsed: f32) {
        if self.body.is_dead() {
            return;
        }
        let horizontal = self.input.axis(AXIS_HORIZONTAL);
        if horizontal.abs() > f32::EPSILON {
            let turn =
                horizontal * INPUT_YAW_FACTOR * self.body.attributes().rotate_speed() * elapsed;
            self.body.rotate(turn);
        }
    }

    /// Swap the damage formula this hero resolves incoming hits with.
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

    // Verbs the states drive the hero through.

    pub(crate) fn move_axis(&self) -> f32 {
        self.input.axis(AXIS_VERTICAL)
    }

    pub(crate) fn wants_attack(&self) -> bool {
        self.input.axis(AXIS_FIRE) > 0.0
    }

    pub(crate) fn forward_move(&mut self, amount: f32) {
        self.body.forward_move(amount);
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

impl Targetable for Hero {
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

impl FsmOwner for Hero {
    type DataKey = DataKey;
    type DataValue = DataValue;
    type Ctx = EntityDirectory;
}

impl StateCatalog for Hero {
    fn state_registry() -> Result<StateRegistry<Self>, FsmError> {
        StateRegistry::new()
            .with::<hero::Idle>()?
            .with::<hero::Move>()?
            .with::<hero::Attack>()?
            .with::<hero::Cooldown>()?
            .with::<hero::Hurt>()?
            .with::<hero::Dead>()
    }
}

impl fmt::Debug for Hero {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hero").field("body", &self.body).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{hero_spawn, RecordingMovement, ScriptedAnimation, ScriptedInput};

    fn test_hero(input: Rc<ScriptedInput>) -> Hero {
        Hero::new(
            EntityId(1),
            &hero_spawn(),
            Rc::new(RecordingMovement::default()),
            Rc::new(ScriptedAnimation::standard()),
            input,
        )
        .unwrap()
    }

    #[test]
    fn test_spawn_rejects_invalid_row() {
        let mut row = hero_spawn();
        row.hp = 0.0;
        let err = Hero::new(
            EntityId(1),
            &row,
            Rc::new(RecordingMovement::default()),
            Rc::new(ScriptedAnimation::standard()),
            Rc::new(ScriptedInput::default()),
        )
        .unwrap_err();
        assert!(matches!(err, SpawnError::InvalidData { .. }));
    }

    #[test]
    fn test_steering_follows_horizontal_axis() {
        let input = Rc::new(ScriptedInput::default());
        let mut hero = test_hero(Rc::clone(&input));
        input.set(AXIS_HORIZONTAL, 1.0);
        hero.pre_update(0.5);
        // 1.0 axis * 0.8 gain * rotate speed 2.0 * 0.5 s = 0.8 rad of yaw.
        assert!((hero.transform().yaw() - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_dead_hero_ignores_steering() {
        let input = Rc::new(ScriptedInput::default());
        let mut hero = test_hero(Rc::clone(&input));
        hero.apply_damage(EntityId(9), 1000.0);
        assert!(hero.is_dead());
        input.set(AXIS_HORIZONTAL, 1.0);
        hero.pre_update(0.5);
        assert!(hero.transform().yaw().abs() < f32::EPSILON);
    }

    #[test]
    fn test_fire_axis_triggers_attack_intent() {
        let input = Rc::new(ScriptedInput::default());
        let hero = test_hero(Rc::clone(&input));
        assert!(!hero.wants_attack());
        input.set(AXIS_FIRE, 1.0);
        assert!(hero.wants_attack());
    }

    #[test]
    fn test_targetable_surface() {
        let hero = test_hero(Rc::new(ScriptedInput::default()));
        assert_eq!(hero.camp(), Camp::Player);
        assert_eq!(Targetable::id(&hero), EntityId(1));
        let impact = hero.impact_data();
        assert!((impact.hp - 100.0).abs() < f32::EPSILON);
        assert!((impact.defense - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_state_catalog_covers_full_roster() {
        let registry = Hero::state_registry().unwrap();
        assert_eq!(registry.len(), 6);
        let names: Vec<_> = registry.type_names().collect();
        assert_eq!(
            names,
            ["Idle", "Move", "Attack", "Cooldown", "Hurt", "Dead"]
        );
    }
}
