//! Console skirmish demonstrating the combat core without an engine
//!
//! Spawns an encounter from an embedded RON string, pilots the hero with a
//! tiny steering routine and narrates the combat events until one camp is
//! wiped out or the step budget runs dry.

use std::cell::{Cell, RefCell};
use std::f32::consts::{PI, TAU};
use std::rc::Rc;

use rustc_hash::FxHashMap;

use gauntlet::host::{AXIS_FIRE, AXIS_HORIZONTAL, AXIS_VERTICAL};
use gauntlet::prelude::*;

/// Fixed simulation step.
const STEP_SECONDS: f32 = 0.1;

/// Step budget before the demo gives up on a stalemate.
const MAX_STEPS: u32 = 600;

/// Playtime of the swing and flinch clips.
const ONE_SHOT_SECONDS: f32 = 0.4;

/// Clip roster every demo entity shares, in animation-state order.
const CLIP_ROSTER: [&str; 5] = ["idle", "run", "attack", "hit", "die"];

/// Clips that end on their own instead of looping.
const ONE_SHOT_CLIPS: [&str; 2] = ["attack", "hit"];

const ENCOUNTER: &str = r#"(
    name: "Gate of the Fallen",
    hero: (
        name: "Aldric",
        position: (0.0, 0.0, 0.0),
        hp: 100.0,
        attack: 50.0,
        defense: 20.0,
        move_speed: 2.0,
        rotate_speed: 4.0,
        attack_range: 2.0,
        attack_interval: 1.0,
    ),
    monsters: [
        (
            name: "Gnarl",
            position: (0.0, 0.0, -6.0),
            hp: 100.0,
            attack: 30.0,
            defense: 20.0,
            move_speed: 1.6,
            rotate_speed: 6.0,
            attack_range: 1.5,
            attack_interval: 1.2,
            aggro_range: 6.0,
        ),
        (
            name: "Skug",
            position: (7.0, 0.0, -11.0),
            hp: 80.0,
            attack: 35.0,
            defense: 15.0,
            move_speed: 1.8,
            rotate_speed: 6.0,
            attack_range: 1.5,
            attack_interval: 1.0,
            aggro_range: 6.0,
        ),
    ],
)"#;

/// Movement sink for a world without a scene graph. The transform already
/// tracks position, so the sink only narrates at debug level.
struct ConsoleMovement {
    name: String,
}

impl Movement for ConsoleMovement {
    fn move_to(&self, position: Vec3) {
        log::debug!(
            "{} moves to ({:.1}, {:.1}, {:.1})",
            self.name,
            position.x,
            position.y,
            position.z
        );
    }
}

#[derive(Default)]
struct ClipState {
    current: Option<String>,
    remaining: f32,
}

/// Clip player that expires one-shot clips after a fixed playtime and
/// loops everything else until replaced.
#[derive(Default)]
struct ConsoleAnimation {
    state: RefCell<ClipState>,
}

impl ConsoleAnimation {
    /// Advance playback; called once per simulation step.
    fn advance(&self, elapsed: f32) {
        let mut state = self.state.borrow_mut();
        if state.current.is_none() {
            return;
        }
        state.remaining -= elapsed;
        if state.remaining <= 0.0 {
            state.current = None;
        }
    }
}

impl AnimationDriver for ConsoleAnimation {
    fn clip_names(&self) -> Vec<String> {
        CLIP_ROSTER.iter().map(|clip| (*clip).to_string()).collect()
    }

    fn play(&self, clip: &str, _blend_seconds: f32) {
        let mut state = self.state.borrow_mut();
        state.current = Some(clip.to_string());
        state.remaining = if ONE_SHOT_CLIPS.contains(&clip) {
            ONE_SHOT_SECONDS
        } else {
            f32::INFINITY
        };
    }

    fn is_playing(&self, clip: &str) -> bool {
        self.state.borrow().current.as_deref() == Some(clip)
    }
}

/// Input source the pilot routine writes into before every step.
#[derive(Default)]
struct ConsoleInput {
    horizontal: Cell<f32>,
    vertical: Cell<f32>,
    fire: Cell<f32>,
}

impl ConsoleInput {
    fn steer(&self, horizontal: f32, vertical: f32, fire: f32) {
        self.horizontal.set(horizontal);
        self.vertical.set(vertical);
        self.fire.set(fire);
    }
}

impl AxisInput for ConsoleInput {
    fn axis(&self, name: &str) -> f32 {
        match name {
            AXIS_HORIZONTAL => self.horizontal.get(),
            AXIS_VERTICAL => self.vertical.get(),
            AXIS_FIRE => self.fire.get(),
            _ => 0.0,
        }
    }
}

/// Steer the hero toward the nearest living enemy and swing once it
/// stands inside reach.
fn drive_pilot(world: &EntityWorld, hero: EntityId, input: &ConsoleInput, engage_range: f32) {
    input.steer(0.0, 0.0, 0.0);
    let Some(Actor::Hero { logic, .. }) = world.actor(hero) else {
        return;
    };
    let Ok(pilot) = logic.try_borrow() else {
        return;
    };
    if pilot.is_dead() {
        return;
    }
    let position = pilot.transform().position;
    let yaw = pilot.transform().yaw();
    let Some((_, handle)) = world.directory().nearest_hostile(position, pilot.camp()) else {
        return;
    };
    let Ok(target) = handle.try_borrow() else {
        return;
    };

    let to_target = target.position() - position;
    let desired = (-to_target.x).atan2(-to_target.z);
    let mut error = desired - yaw;
    while error > PI {
        error -= TAU;
    }
    while error < -PI {
        error += TAU;
    }
    let steering = (error * 2.0).clamp(-1.0, 1.0);

    if to_target.length() > engage_range {
        input.steer(steering, 1.0, 0.0);
    } else {
        input.steer(steering, 0.0, 1.0);
    }
}

fn label(names: &FxHashMap<EntityId, String>, id: EntityId) -> &str {
    names.get(&id).map(String::as_str).unwrap_or("a stranger")
}

fn report_events(world: &EntityWorld, names: &FxHashMap<EntityId, String>, seconds: f32) {
    for event in world.events().iter() {
        match event {
            CombatEvent::EntitySpawned { entity, camp } => {
                println!(
                    "[{seconds:5.1}s] {} joins the {camp} camp",
                    label(names, *entity)
                );
            }
            CombatEvent::EntityDamaged {
                entity,
                amount,
                remaining,
                source,
            } => {
                let source = source.map_or("the void", |id| label(names, id));
                println!(
                    "[{seconds:5.1}s] {} takes {amount:.0} damage from {source} ({remaining:.0} hp left)",
                    label(names, *entity)
                );
            }
            CombatEvent::EntityDestroyed { entity, destroyer } => {
                let destroyer = destroyer.map_or("the void", |id| label(names, id));
                println!(
                    "[{seconds:5.1}s] {} is slain by {destroyer}",
                    label(names, *entity)
                );
            }
            CombatEvent::EntityHidden { entity } => {
                println!(
                    "[{seconds:5.1}s] the body of {} fades from the field",
                    label(names, *entity)
                );
            }
            _ => {}
        }
    }
}

fn run() -> Result<(), SpawnError> {
    let spec = EncounterSpec::from_ron_str(ENCOUNTER)?;

    let input = Rc::new(ConsoleInput::default());
    let mut world = EntityWorld::new(Rc::clone(&input) as Rc<dyn AxisInput>);

    let mut animations: Vec<Rc<ConsoleAnimation>> = Vec::new();
    let ids = world.spawn_encounter(&spec, |name| {
        let animation = Rc::new(ConsoleAnimation::default());
        animations.push(Rc::clone(&animation));
        (
            Rc::new(ConsoleMovement {
                name: name.to_string(),
            }) as Rc<dyn Movement>,
            animation as Rc<dyn AnimationDriver>,
        )
    })?;

    let Some((&hero, monster_ids)) = ids.split_first() else {
        return Ok(());
    };
    let mut names = FxHashMap::default();
    names.insert(hero, spec.hero.name.clone());
    for (id, row) in monster_ids.iter().zip(&spec.monsters) {
        names.insert(*id, row.name.clone());
    }
    let engage_range = spec.hero.attack_range * 0.9;

    println!("=== {} ===", spec.name);

    let mut clock = GameClock::new();
    let mut finale: Option<u32> = None;
    for step in 0..MAX_STEPS {
        drive_pilot(&world, hero, &input, engage_range);
        let delta = clock.tick(STEP_SECONDS);
        world.update(delta.elapsed, delta.real_elapsed);
        for animation in &animations {
            animation.advance(delta.elapsed);
        }
        report_events(&world, &names, clock.total_elapsed());

        if finale.is_none() {
            let outcome = if world.alive_in_camp(Camp::Player) == 0 {
                Some("The hero has fallen.")
            } else if world.alive_in_camp(Camp::Enemy) == 0 {
                Some("The field is clear; the hero prevails.")
            } else {
                None
            };
            if let Some(line) = outcome {
                println!("{line}");
                finale = Some(step);
            }
        }
        // Two extra steps so the closing events reach the queue and print.
        if finale.is_some_and(|at| step >= at + 2) {
            break;
        }
    }
    if finale.is_none() {
        println!("Time is up with both camps still standing.");
    }
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Demo error: {}", e);
    }
}
