//! Monster combat states
//!
//! Monsters acquire targets by proximity, chase the locked entity until it
//! stands inside attack range, strike once per attack entry and retaliate
//! against whoever hit them last. The lock lives in the machine's
//! blackboard under [`DataKey::LockAim`], exactly where the attack state
//! looks it up again.

use std::f32::consts::FRAC_PI_2;

use crate::entity::{AnimationState, DataKey, DataValue, EntityId, Monster, Targetable};
use crate::fsm::{FsmContext, State};

/// Seconds a dead monster stays in the world before asking to despawn.
const DEAD_LINGER_SECONDS: f32 = 3.0;

/// How close to its spawn point a monster settles when nothing is worth
/// chasing.
const HOME_RADIUS: f32 = 0.5;

/// Death and stagger checks shared by every interruptible state. Returns
/// true when a transition was requested and the caller should bail out.
fn interrupted(fsm: &mut FsmContext<'_, Monster>) -> bool {
    if fsm.owner.is_dead() {
        fsm.change_state::<Dead>();
        return true;
    }
    if fsm.owner.take_hurt_pending() {
        fsm.change_state::<Hurt>();
        return true;
    }
    false
}

/// The locked target's position, if the lock still points at a live
/// entity. Drops the lock when it has gone stale.
fn locked_target_position(fsm: &mut FsmContext<'_, Monster>) -> Option<glam::Vec3> {
    let target_id = fsm
        .get_data(DataKey::LockAim)
        .ok()
        .and_then(|value| value.as_entity())?;
    let handle = match fsm.ctx.lookup(target_id) {
        Some(handle) => handle,
        None => {
            fsm.remove_data(DataKey::LockAim);
            return None;
        }
    };
    let position = handle
        .try_borrow()
        .ok()
        .filter(|target| !target.is_dead())
        .map(|target| target.position());
    if position.is_none() {
        fsm.remove_data(DataKey::LockAim);
    }
    position
}

/// Drifting near the spawn point, scanning for hostiles.
#[derive(Debug, Default)]
pub struct Idle;

impl State<Monster> for Idle {
    fn name(&self) -> &'static str {
        "Idle"
    }

    fn on_enter(&mut self, fsm: &mut FsmContext<'_, Monster>) {
        fsm.owner.play_animation(AnimationState::Idle);
    }

    fn on_update(&mut self, fsm: &mut FsmContext<'_, Monster>, elapsed: f32, _real_elapsed: f32) {
        if interrupted(fsm) {
            return;
        }
        let mut lock: Option<EntityId> = None;
        if let Some((target_id, handle)) =
            fsm.ctx.nearest_hostile(fsm.owner.position(), fsm.owner.camp())
        {
            if let Ok(target) = handle.try_borrow() {
                if fsm.owner.distance_to(target.position()) <= fsm.owner.aggro_range() {
                    lock = Some(target_id);
                }
            }
        }
        if let Some(target_id) = lock {
            fsm.set_data(DataKey::LockAim, DataValue::Entity(target_id));
            fsm.change_state::<LockAim>();
            return;
        }
        walk_home(fsm, elapsed);
    }
}

fn walk_home(fsm: &mut FsmContext<'_, Monster>, elapsed: f32) {
    let Ok(DataValue::Point(home)) = fsm.get_data(DataKey::SpawnPoint) else {
        return;
    };
    if fsm.owner.distance_to(home) > HOME_RADIUS {
        let remaining = fsm.owner.turn_towards(home, elapsed);
        if remaining.abs() < FRAC_PI_2 {
            fsm.owner.forward_move(elapsed);
        }
        if !fsm.owner.is_playing(AnimationState::Walk) {
            fsm.owner.play_animation(AnimationState::Walk);
        }
    } else if !fsm.owner.is_playing(AnimationState::Idle) {
        fsm.owner.play_animation(AnimationState::Idle);
    }
}

/// Chasing the locked target until it stands inside attack range.
#[derive(Debug, Default)]
pub struct LockAim;

impl State<Monster> for LockAim {
    fn name(&self) -> &'static str {
        "LockAim"
    }

    fn on_enter(&mut self, fsm: &mut FsmContext<'_, Monster>) {
        fsm.owner.play_animation(AnimationState::Walk);
    }

    fn on_update(&mut self, fsm: &mut FsmContext<'_, Monster>, elapsed: f32, _real_elapsed: f32) {
        if interrupted(fsm) {
            return;
        }
        let Some(target_position) = locked_target_position(fsm) else {
            fsm.change_state::<Idle>();
            return;
        };
        if fsm.owner.in_attack_range(target_position) {
            fsm.change_state::<Attack>();
            return;
        }
        let remaining = fsm.owner.turn_towards(target_position, elapsed);
        // Only close in once the target is roughly ahead, otherwise the
        // chase spirals.
        if remaining.abs() < FRAC_PI_2 {
            fsm.owner.forward_move(elapsed);
        }
    }
}

/// One strike against the locked target. The hit lands on entry; the
/// first update always moves on to the cooldown.
#[derive(Debug, Default)]
pub struct Attack;

impl State<Monster> for Attack {
    fn name(&self) -> &'static str {
        "Attack"
    }

    fn on_enter(&mut self, fsm: &mut FsmContext<'_, Monster>) {
        fsm.owner.play_animation(AnimationState::Attack);
        let owner_id = fsm.owner.id();
        let attack = fsm.owner.attributes().attack();
        let Some(target_id) = fsm
            .get_data(DataKey::LockAim)
            .ok()
            .and_then(|value| value.as_entity())
        else {
            return;
        };
        let Some(handle) = fsm.ctx.lookup(target_id) else {
            return;
        };
        if let Ok(mut target) = handle.try_borrow_mut() {
            if !target.is_dead() {
                let outcome = target.apply_damage(owner_id, attack);
                log::debug!(
                    "{} hits {} for {:.1}",
                    fsm.owner.name(),
                    target_id,
                    outcome.damage
                );
            }
        }
    }

    fn on_update(&mut self, fsm: &mut FsmContext<'_, Monster>, _elapsed: f32, _real_elapsed: f32) {
        fsm.change_state::<Cooldown>();
    }
}

/// Recovery between strikes. Ends back in idle, which re-scans and
/// re-locks immediately when the target is still close.
#[derive(Debug, Default)]
pub struct Cooldown;

impl State<Monster> for Cooldown {
    fn name(&self) -> &'static str {
        "Cooldown"
    }

    fn on_enter(&mut self, fsm: &mut FsmContext<'_, Monster>) {
        fsm.owner.play_animation(AnimationState::Idle);
    }

    fn on_update(&mut self, fsm: &mut FsmContext<'_, Monster>, _elapsed: f32, _real_elapsed: f32) {
        if interrupted(fsm) {
            return;
        }
        if fsm.state_time() >= fsm.owner.attributes().attack_interval() {
            fsm.change_state::<Idle>();
        }
    }
}

/// Staggered by a hit. Locks the attacker so the monster comes back
/// swinging.
#[derive(Debug, Default)]
pub struct Hurt;

impl State<Monster> for Hurt {
    fn name(&self) -> &'static str {
        "Hurt"
    }

    fn on_enter(&mut self, fsm: &mut FsmContext<'_, Monster>) {
        fsm.owner.play_animation(AnimationState::Hurt);
        if let Some(attacker) = fsm.owner.last_attacker() {
            fsm.set_data(DataKey::LockAim, DataValue::Entity(attacker));
        }
    }

    fn on_update(&mut self, fsm: &mut FsmContext<'_, Monster>, _elapsed: f32, _real_elapsed: f32) {
        if fsm.owner.is_dead() {
            fsm.change_state::<Dead>();
            return;
        }
        if fsm.owner.take_hurt_pending() {
            fsm.change_state::<Hurt>();
            return;
        }
        if !fsm.owner.is_playing(AnimationState::Hurt) {
            if fsm.has_data(DataKey::LockAim) {
                fsm.change_state::<LockAim>();
            } else {
                fsm.change_state::<Idle>();
            }
        }
    }
}

/// Terminal state. Lingers for the body to be seen, then asks the world
/// to despawn.
#[derive(Debug, Default)]
pub struct Dead;

impl State<Monster> for Dead {
    fn name(&self) -> &'static str {
        "Dead"
    }

    fn on_enter(&mut self, fsm: &mut FsmContext<'_, Monster>) {
        fsm.owner.play_animation(AnimationState::Dead);
        fsm.remove_data(DataKey::LockAim);
    }

    fn on_update(&mut self, fsm: &mut FsmContext<'_, Monster>, _elapsed: f32, _real_elapsed: f32) {
        if fsm.state_time() >= DEAD_LINGER_SECONDS {
            fsm.owner.request_hide();
        }
    }
}
