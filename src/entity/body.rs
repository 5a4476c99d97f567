//! Shared controller chassis for heroes and monsters
//!
//! Both controller types are a thin shell around an [`EntityBody`], which
//! owns the attributes, the transform, the bound host services and the
//! per-entity combat event buffer. States drive entities exclusively
//! through the verbs here, so movement scaling, clip lookup and damage
//! bookkeeping behave identically for every entity kind.

use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;

use glam::Vec3;

use crate::combat::{resolve, Camp, DamageOutcome, DamagePolicy, EntityAttributes, ImpactData};
use crate::core::CombatEvent;
use crate::entity::animation::{AnimationState, AnimationTable, ANIMATION_BLEND_SECONDS};
use crate::entity::directory::EntityId;
use crate::entity::spawn::SpawnError;
use crate::entity::transform::Transform;
use crate::host::{AnimationDriver, Movement};

pub(crate) struct EntityBody {
    id: EntityId,
    name: String,
    attributes: EntityAttributes,
    transform: Transform,
    movement: Rc<dyn Movement>,
    animation: Rc<dyn AnimationDriver>,
    animation_table: AnimationTable,
    damage_policy: DamagePolicy,
    events: SmallVec<[CombatEvent; 4]>,
    hurt_pending: bool,
    last_attacker: Option<EntityId>,
    hide_requested: bool,
}

impl EntityBody {
    /// Bind host services and build the chassis. Fails if the animation
    /// driver cannot cover every animation state.
    pub(crate) fn new(
        id: EntityId,
        name: String,
        attributes: EntityAttributes,
        transform: Transform,
        movement: Rc<dyn Movement>,
        animation: Rc<dyn AnimationDriver>,
    ) -> Result<Self, SpawnError> {
        let animation_table = AnimationTable::from_clips(animation.clip_names())?;
        Ok(Self {
            id,
            name,
            attributes,
            transform,
            movement,
            animation,
            animation_table,
            damage_policy: crate::combat::standard_damage,
            events: SmallVec::new(),
            hurt_pending: false,
            last_attacker: None,
            hide_requested: false,
        })
    }

    // ========================================================================
    // Movement
    // ========================================================================

    /// Move `amount` along the current facing, scaled by move speed, and
    /// notify the host of the new position.
    pub(crate) fn forward_move(&mut self, amount: f32) {
        let step = self.transform.forward() * amount * self.attributes.move_speed();
        self.transform.translate(step);
        self.movement.move_to(self.transform.position);
    }

    /// Apply an additional yaw of `angle` radians.
    pub(crate) fn rotate(&mut self, angle: f32) {
        self.transform.rotate_y(angle);
    }

    /// Turn toward `target`, limited by rotate speed over `elapsed`
    /// seconds. Returns the signed yaw error left after the turn.
    pub(crate) fn turn_towards(&mut self, target: Vec3, elapsed: f32) -> f32 {
        let max_step = self.attributes.rotate_speed() * elapsed;
        self.transform.yaw_towards(target, max_step)
    }

    // ========================================================================
    // Animation
    // ========================================================================

    /// Cross-fade to the clip mapped to `state`.
    pub(crate) fn play_animation(&mut self, state: AnimationState) {
        let clip = self.animation_table.clip(state);
        self.animation.play(clip, ANIMATION_BLEND_SECONDS);
    }

    /// Whether the clip mapped to `state` is still playing.
    pub(crate) fn is_playing(&self, state: AnimationState) -> bool {
        self.animation.is_playing(self.animation_table.clip(state))
    }

    // ========================================================================
    // Combat
    // ========================================================================

    /// Take a hit. Applies the damage policy, buffers the resulting events
    /// and latches the hurt flag on a non-lethal hit. Fully blocked hits
    /// change nothing.
    pub(crate) fn apply_damage(&mut self, attacker: EntityId, attack: f32) -> DamageOutcome {
        let outcome = resolve(self.damage_policy, attack, &mut self.attributes);
        if outcome.damage <= 0.0 {
            return outcome;
        }
        self.last_attacker = Some(attacker);
        self.events.push(CombatEvent::EntityDamaged {
            entity: self.id,
            amount: outcome.damage,
            remaining: outcome.remaining_hp,
            source: Some(attacker),
        });
        if outcome.lethal {
            log::info!("{} slain by {}", self.name, attacker);
            self.events.push(CombatEvent::EntityDestroyed {
                entity: self.id,
                destroyer: Some(attacker),
            });
        } else {
            self.hurt_pending = true;
        }
        outcome
    }

    /// Whether `target` is inside this entity's attack range.
    pub(crate) fn in_attack_range(&self, target: Vec3) -> bool {
        self.transform.distance_to(target) <= self.attributes.attack_range()
    }

    /// Consume the hurt latch set by the last non-lethal hit.
    pub(crate) fn take_hurt_pending(&mut self) -> bool {
        std::mem::take(&mut self.hurt_pending)
    }

    pub(crate) fn last_attacker(&self) -> Option<EntityId> {
        self.last_attacker
    }

    /// Swap the damage formula this entity resolves hits with.
    pub(crate) fn set_damage_policy(&mut self, policy: DamagePolicy) {
        self.damage_policy = policy;
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Ask the world to despawn this entity at the end of the tick.
    pub(crate) fn request_hide(&mut self) {
        if !self.hide_requested {
            log::debug!("{} requests hide", self.name);
        }
        self.hide_requested = true;
    }

    pub(crate) fn hide_requested(&self) -> bool {
        self.hide_requested
    }

    /// Hand the buffered combat events to the world.
    pub(crate) fn drain_events(&mut self) -> SmallVec<[CombatEvent; 4]> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub(crate) fn id(&self) -> EntityId {
        self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn camp(&self) -> Camp {
        self.attributes.camp()
    }

    pub(crate) fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub(crate) fn transform(&self) -> &Transform {
        &self.transform
    }

    pub(crate) fn distance_to(&self, point: Vec3) -> f32 {
        self.transform.distance_to(point)
    }

    pub(crate) fn attributes(&self) -> &EntityAttributes {
        &self.attributes
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.attributes.is_dead()
    }

    pub(crate) fn impact_data(&self) -> ImpactData {
        self.attributes.impact_data()
    }
}

impl fmt::Debug for EntityBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityBody")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("camp", &self.camp())
            .field("hp", &self.attributes.hp())
            .field("position", &self.transform.position)
            .finish()
    }
}
