//! Hero combat states
//!
//! The hero is input-driven: idle and movement read the input axes and
//! refresh the aim lock when the fire button comes down, the attack
//! swings once at the locked target on entry and hands off to the
//! cooldown on its first update no matter what, and incoming hits
//! interrupt through the hurt latch on the body. The lock lives in the
//! machine's blackboard under [`DataKey::LockAim`], exactly where the
//! attack state looks it up again.

use crate::entity::{AnimationState, DataKey, DataValue, Hero, Targetable};
use crate::fsm::{FsmContext, State};

/// Seconds a fallen hero stays in the world before asking to despawn.
const DEAD_LINGER_SECONDS: f32 = 3.0;

/// Death and stagger checks shared by every interruptible state. Returns
/// true when a transition was requested and the caller should bail out.
fn interrupted(fsm: &mut FsmContext<'_, Hero>) -> bool {
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
fn locked_target_position(fsm: &mut FsmContext<'_, Hero>) -> Option<glam::Vec3> {
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

/// Refresh the aim lock for a swing. A lock that still points at a live
/// entity inside attack range is kept; anything else is replaced by the
/// nearest live hostile, or cleared when the world offers none.
fn refresh_lock(fsm: &mut FsmContext<'_, Hero>) {
    if let Some(position) = locked_target_position(fsm) {
        if fsm.owner.in_attack_range(position) {
            return;
        }
    }
    match fsm.ctx.nearest_hostile(fsm.owner.position(), fsm.owner.camp()) {
        Some((target_id, _)) => {
            fsm.set_data(DataKey::LockAim, DataValue::Entity(target_id));
        }
        None => {
            fsm.remove_data(DataKey::LockAim);
        }
    }
}

/// Swing at the locked target. A missing lock or a target out of reach
/// leaves the swing hitting air, which is fine.
fn strike_locked(fsm: &mut FsmContext<'_, Hero>) {
    let owner_id = fsm.owner.id();
    let attack = fsm.owner.attributes().attack();
    let Some(target_id) = fsm
        .get_data(DataKey::LockAim)
        .ok()
        .and_then(|value| value.as_entity())
    else {
        log::debug!("{} swings at empty air", fsm.owner.name());
        return;
    };
    let Some(handle) = fsm.ctx.lookup(target_id) else {
        log::debug!("{} swings at empty air", fsm.owner.name());
        return;
    };
    let Ok(target_position) = handle.try_borrow().map(|target| target.position()) else {
        return;
    };
    if !fsm.owner.in_attack_range(target_position) {
        log::debug!("{} swings, {} is out of reach", fsm.owner.name(), target_id);
        return;
    }
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

/// Standing ready. Watches the input for movement or an attack.
#[derive(Debug, Default)]
pub struct Idle;

impl State<Hero> for Idle {
    fn name(&self) -> &'static str {
        "Idle"
    }

    fn on_enter(&mut self, fsm: &mut FsmContext<'_, Hero>) {
        fsm.owner.play_animation(AnimationState::Idle);
    }

    fn on_update(&mut self, fsm: &mut FsmContext<'_, Hero>, _elapsed: f32, _real_elapsed: f32) {
        if interrupted(fsm) {
            return;
        }
        if fsm.owner.wants_attack() {
            refresh_lock(fsm);
            fsm.change_state::<Attack>();
            return;
        }
        if fsm.owner.move_axis().abs() > f32::EPSILON {
            fsm.change_state::<Move>();
        }
    }
}

/// Walking under input control.
#[derive(Debug, Default)]
pub struct Move;

impl State<Hero> for Move {
    fn name(&self) -> &'static str {
        "Move"
    }

    fn on_enter(&mut self, fsm: &mut FsmContext<'_, Hero>) {
        fsm.owner.play_animation(AnimationState::Walk);
    }

    fn on_update(&mut self, fsm: &mut FsmContext<'_, Hero>, elapsed: f32, _real_elapsed: f32) {
        if interrupted(fsm) {
            return;
        }
        if fsm.owner.wants_attack() {
            refresh_lock(fsm);
            fsm.change_state::<Attack>();
            return;
        }
        let axis = fsm.owner.move_axis();
        if axis.abs() <= f32::EPSILON {
            fsm.change_state::<Idle>();
            return;
        }
        fsm.owner.forward_move(axis * elapsed);
    }
}

/// One swing against the locked target. The hit lands on entry; the
/// first update always moves on to the cooldown.
#[derive(Debug, Default)]
pub struct Attack;

impl State<Hero> for Attack {
    fn name(&self) -> &'static str {
        "Attack"
    }

    fn on_enter(&mut self, fsm: &mut FsmContext<'_, Hero>) {
        fsm.owner.play_animation(AnimationState::Attack);
        strike_locked(fsm);
    }

    fn on_update(&mut self, fsm: &mut FsmContext<'_, Hero>, _elapsed: f32, _real_elapsed: f32) {
        fsm.change_state::<Cooldown>();
    }
}

/// Weapon recovery between swings.
#[derive(Debug, Default)]
pub struct Cooldown;

impl State<Hero> for Cooldown {
    fn name(&self) -> &'static str {
        "Cooldown"
    }

    fn on_enter(&mut self, fsm: &mut FsmContext<'_, Hero>) {
        fsm.owner.play_animation(AnimationState::Idle);
    }

    fn on_update(&mut self, fsm: &mut FsmContext<'_, Hero>, _elapsed: f32, _real_elapsed: f32) {
        if interrupted(fsm) {
            return;
        }
        if fsm.state_time() >= fsm.owner.attributes().attack_interval() {
            fsm.change_state::<Idle>();
        }
    }
}

/// Staggered by a hit. A fresh hit restarts the flinch; otherwise the
/// state ends with its animation.
#[derive(Debug, Default)]
pub struct Hurt;

impl State<Hero> for Hurt {
    fn name(&self) -> &'static str {
        "Hurt"
    }

    fn on_enter(&mut self, fsm: &mut FsmContext<'_, Hero>) {
        fsm.owner.play_animation(AnimationState::Hurt);
    }

    fn on_update(&mut self, fsm: &mut FsmContext<'_, Hero>, _elapsed: f32, _real_elapsed: f32) {
        if fsm.owner.is_dead() {
            fsm.change_state::<Dead>();
            return;
        }
        if fsm.owner.take_hurt_pending() {
            fsm.change_state::<Hurt>();
            return;
        }
        if !fsm.owner.is_playing(AnimationState::Hurt) {
            fsm.change_state::<Idle>();
        }
    }
}

/// Terminal state. Lingers for the body to be seen, then asks the world
/// to despawn.
#[derive(Debug, Default)]
pub struct Dead;

impl State<Hero> for Dead {
    fn name(&self) -> &'static str {
        "Dead"
    }

    fn on_enter(&mut self, fsm: &mut FsmContext<'_, Hero>) {
        fsm.owner.play_animation(AnimationState::Dead);
        fsm.remove_data(DataKey::LockAim);
    }

    fn on_update(&mut self, fsm: &mut FsmContext<'_, Hero>, _elapsed: f32, _real_elapsed: f32) {
        if fsm.state_time() >= DEAD_LINGER_SECONDS {
            fsm.owner.request_hide();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Camp;
    use crate::entity::{EntityDirectory, EntityId, TargetHandle};
    use crate::fsm::{Fsm, StateCatalog};
    use crate::host::{AnimationDriver, AxisInput, AXIS_FIRE, AXIS_VERTICAL};
    use crate::testkit::{
        hero_spawn, RecordingMovement, ScriptedAnimation, ScriptedInput, StubTarget,
    };
    use glam::Vec3;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct HeroRig {
        hero: Hero,
        fsm: Fsm<Hero>,
        directory: EntityDirectory,
        input: Rc<ScriptedInput>,
        animation: Rc<ScriptedAnimation>,
    }

    impl HeroRig {
        fn new() -> Self {
            let input = Rc::new(ScriptedInput::default());
            let animation = Rc::new(ScriptedAnimation::standard());
            let mut hero = Hero::new(
                EntityId(1),
                &hero_spawn(),
                Rc::new(RecordingMovement::default()),
                Rc::clone(&animation) as Rc<dyn AnimationDriver>,
                Rc::clone(&input) as Rc<dyn AxisInput>,
            )
            .unwrap();
            let directory = EntityDirectory::new();
            let states = Hero::state_registry().unwrap().instantiate().unwrap();
            let mut fsm = Fsm::new(&mut hero, &directory, states).unwrap();
            fsm.start::<Idle>(&mut hero, &directory).unwrap();
            Self {
                hero,
                fsm,
                directory,
                input,
                animation,
            }
        }

        fn add_enemy(&mut self, id: u32, position: Vec3, hp: f32) -> Rc<RefCell<StubTarget>> {
            let stub = Rc::new(RefCell::new(StubTarget::new(id, Camp::Enemy, position, hp)));
            let handle: TargetHandle = stub.clone();
            self.directory.insert(EntityId(id), handle);
            stub
        }

        fn tick(&mut self, elapsed: f32) {
            self.fsm
                .update(&mut self.hero, &self.directory, elapsed, elapsed)
                .unwrap();
        }
    }

    #[test]
    fn test_idle_to_move_and_back_follows_input() {
        let mut rig = HeroRig::new();
        assert!(rig.fsm.is_in::<Idle>());
        assert_eq!(rig.animation.last_played().as_deref(), Some("stand"));

        rig.input.set(AXIS_VERTICAL, 1.0);
        rig.tick(0.1);
        assert!(rig.fsm.is_in::<Move>());
        assert_eq!(rig.animation.last_played().as_deref(), Some("walk"));

        rig.tick(0.1);
        // 1.0 axis * 0.1 s * move speed 2.0 along the -Z facing.
        assert!(rig
            .hero
            .transform()
            .position
            .distance(Vec3::new(0.0, 0.0, -0.2))
            < 1e-5);

        rig.input.release_all();
        rig.tick(0.1);
        assert!(rig.fsm.is_in::<Idle>());
    }

    #[test]
    fn test_attack_strikes_once_then_cools_down() {
        let mut rig = HeroRig::new();
        let enemy = rig.add_enemy(2, Vec3::new(0.0, 0.0, -1.0), 200.0);
        rig.input.set(AXIS_FIRE, 1.0);
        rig.tick(0.1);
        assert!(rig.fsm.is_in::<Attack>());
        assert_eq!(enemy.borrow().hits(), [(EntityId(1), 50.0)]);
        assert_eq!(
            rig.fsm.get_data(DataKey::LockAim).unwrap(),
            DataValue::Entity(EntityId(2))
        );

        rig.input.release_all();
        rig.tick(0.1);
        assert!(rig.fsm.is_in::<Cooldown>());
        assert_eq!(enemy.borrow().hits().len(), 1, "one swing, one hit");
    }

    #[test]
    fn test_cooldown_waits_the_attack_interval() {
        let mut rig = HeroRig::new();
        rig.add_enemy(2, Vec3::new(0.0, 0.0, -1.0), 200.0);
        rig.input.set(AXIS_FIRE, 1.0);
        rig.tick(0.1);
        rig.input.release_all();
        rig.tick(0.1);
        assert!(rig.fsm.is_in::<Cooldown>());

        rig.tick(0.5);
        assert!(rig.fsm.is_in::<Cooldown>(), "interval 1.0 not yet served");
        rig.tick(0.6);
        assert!(rig.fsm.is_in::<Idle>());
    }

    #[test]
    fn test_attack_out_of_range_hits_nothing() {
        let mut rig = HeroRig::new();
        let enemy = rig.add_enemy(2, Vec3::new(0.0, 0.0, -6.0), 200.0);
        rig.input.set(AXIS_FIRE, 1.0);
        rig.tick(0.1);
        assert!(rig.fsm.is_in::<Attack>());
        assert!(enemy.borrow().hits().is_empty());
        rig.tick(0.1);
        assert!(rig.fsm.is_in::<Cooldown>(), "whiffing still costs the swing");
    }

    #[test]
    fn test_attack_in_an_empty_world_is_harmless() {
        let mut rig = HeroRig::new();
        rig.input.set(AXIS_FIRE, 1.0);
        rig.tick(0.1);
        assert!(rig.fsm.is_in::<Attack>());
        rig.tick(0.1);
        assert!(rig.fsm.is_in::<Cooldown>());
    }

    #[test]
    fn test_attack_honors_an_existing_lock_over_a_nearer_hostile() {
        let mut rig = HeroRig::new();
        let locked = rig.add_enemy(2, Vec3::new(0.0, 0.0, -1.8), 200.0);
        let nearer = rig.add_enemy(3, Vec3::new(0.0, 0.0, -0.5), 200.0);
        rig.fsm
            .set_data(DataKey::LockAim, DataValue::Entity(EntityId(2)))
            .unwrap();

        rig.input.set(AXIS_FIRE, 1.0);
        rig.tick(0.1);
        assert!(rig.fsm.is_in::<Attack>());
        assert_eq!(locked.borrow().hits(), [(EntityId(1), 50.0)]);
        assert!(nearer.borrow().hits().is_empty());
        assert_eq!(
            rig.fsm.get_data(DataKey::LockAim).unwrap(),
            DataValue::Entity(EntityId(2))
        );
    }

    #[test]
    fn test_attack_relocks_when_the_lock_went_stale() {
        let mut rig = HeroRig::new();
        let enemy = rig.add_enemy(3, Vec3::new(0.0, 0.0, -0.5), 200.0);
        rig.fsm
            .set_data(DataKey::LockAim, DataValue::Entity(EntityId(99)))
            .unwrap();

        rig.input.set(AXIS_FIRE, 1.0);
        rig.tick(0.1);
        assert_eq!(enemy.borrow().hits(), [(EntityId(1), 50.0)]);
        assert_eq!(
            rig.fsm.get_data(DataKey::LockAim).unwrap(),
            DataValue::Entity(EntityId(3))
        );
    }

    #[test]
    fn test_hurt_interrupts_and_recovers() {
        let mut rig = HeroRig::new();
        rig.hero.apply_damage(EntityId(9), 50.0);
        rig.tick(0.1);
        assert!(rig.fsm.is_in::<Hurt>());
        assert_eq!(rig.animation.last_played().as_deref(), Some("flinch"));

        rig.tick(0.1);
        assert!(rig.fsm.is_in::<Hurt>(), "flinch still playing");
        rig.animation.stop();
        rig.tick(0.1);
        assert!(rig.fsm.is_in::<Idle>());
    }

    #[test]
    fn test_hurt_beats_attack_intent() {
        let mut rig = HeroRig::new();
        rig.input.set(AXIS_FIRE, 1.0);
        rig.hero.apply_damage(EntityId(9), 50.0);
        rig.tick(0.1);
        assert!(rig.fsm.is_in::<Hurt>());
    }

    #[test]
    fn test_second_hit_restarts_the_flinch() {
        let mut rig = HeroRig::new();
        rig.hero.apply_damage(EntityId(9), 50.0);
        rig.tick(0.1);
        assert!(rig.fsm.is_in::<Hurt>());

        rig.hero.apply_damage(EntityId(9), 50.0);
        rig.tick(0.1);
        assert!(rig.fsm.is_in::<Hurt>());
        let flinches = rig
            .animation
            .played()
            .iter()
            .filter(|(clip, _)| clip == "flinch")
            .count();
        assert_eq!(flinches, 2, "re-entry replays the flinch");
        assert!(rig.fsm.state_time() < 0.2, "re-entry resets state time");
    }

    #[test]
    fn test_lethal_hit_reaches_dead_and_lingers() {
        let mut rig = HeroRig::new();
        rig.input.set(AXIS_VERTICAL, 1.0);
        rig.tick(0.1);
        assert!(rig.fsm.is_in::<Move>());

        rig.hero.apply_damage(EntityId(9), 1000.0);
        rig.tick(0.1);
        assert!(rig.fsm.is_in::<Dead>());
        assert_eq!(rig.animation.last_played().as_deref(), Some("collapse"));
        assert!(!rig.hero.hide_requested());

        rig.tick(DEAD_LINGER_SECONDS);
        assert!(rig.hero.hide_requested());
        rig.tick(0.1);
        assert!(rig.fsm.is_in::<Dead>(), "death is terminal");
    }
}
