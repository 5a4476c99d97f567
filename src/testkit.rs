//! Test doubles and fixture rows shared across the crate's test modules

use rustc_hash::FxHashMap;
use std::cell::RefCell;

use glam::Vec3;

use crate::combat::{resolve, standard_damage, Camp, DamageOutcome, EntityAttributes, ImpactData};
use crate::entity::{EntityId, HeroSpawn, MonsterSpawn, Targetable};
use crate::host::{AnimationDriver, AxisInput, Movement};

/// Movement sink that remembers every requested position.
#[derive(Debug, Default)]
pub(crate) struct RecordingMovement {
    moves: RefCell<Vec<Vec3>>,
}

impl RecordingMovement {
    pub(crate) fn moves(&self) -> Vec<Vec3> {
        self.moves.borrow().clone()
    }
}

impl Movement for RecordingMovement {
    fn move_to(&self, position: Vec3) {
        self.moves.borrow_mut().push(position);
    }
}

/// Animation driver with a scripted clip list and a play history.
///
/// A clip keeps "playing" until another is played or [`ScriptedAnimation::stop`]
/// is called, which is how tests release states that wait on playback.
#[derive(Debug)]
pub(crate) struct ScriptedAnimation {
    clips: Vec<String>,
    played: RefCell<Vec<(String, f32)>>,
    playing: RefCell<Option<String>>,
}

impl ScriptedAnimation {
    /// The canonical five-clip roster in animation-state order.
    pub(crate) fn standard() -> Self {
        Self::with_clips(&["stand", "walk", "swing", "flinch", "collapse"])
    }

    pub(crate) fn with_clips(names: &[&str]) -> Self {
        Self {
            clips: names.iter().map(|name| (*name).to_string()).collect(),
            played: RefCell::new(Vec::new()),
            playing: RefCell::new(None),
        }
    }

    /// Full play history as `(clip, blend_seconds)` pairs.
    pub(crate) fn played(&self) -> Vec<(String, f32)> {
        self.played.borrow().clone()
    }

    pub(crate) fn last_played(&self) -> Option<String> {
        self.played.borrow().last().map(|(clip, _)| clip.clone())
    }

    /// End the currently playing clip.
    pub(crate) fn stop(&self) {
        self.playing.borrow_mut().take();
    }
}

impl AnimationDriver for ScriptedAnimation {
    fn clip_names(&self) -> Vec<String> {
        self.clips.clone()
    }

    fn play(&self, clip: &str, blend_seconds: f32) {
        self.played
            .borrow_mut()
            .push((clip.to_string(), blend_seconds));
        *self.playing.borrow_mut() = Some(clip.to_string());
    }

    fn is_playing(&self, clip: &str) -> bool {
        self.playing.borrow().as_deref() == Some(clip)
    }
}

/// Input source driven directly by the test.
#[derive(Debug, Default)]
pub(crate) struct ScriptedInput {
    axes: RefCell<FxHashMap<String, f32>>,
}

impl ScriptedInput {
    pub(crate) fn set(&self, axis: &str, value: f32) {
        self.axes.borrow_mut().insert(axis.to_string(), value);
    }

    pub(crate) fn release_all(&self) {
        self.axes.borrow_mut().clear();
    }
}

impl AxisInput for ScriptedInput {
    fn axis(&self, name: &str) -> f32 {
        self.axes.borrow().get(name).copied().unwrap_or(0.0)
    }
}

/// Standalone target that records who hit it and for how much.
#[derive(Debug)]
pub(crate) struct StubTarget {
    id: EntityId,
    position: Vec3,
    attributes: EntityAttributes,
    hits: Vec<(EntityId, f32)>,
}

impl StubTarget {
    pub(crate) fn new(id: u32, camp: Camp, position: Vec3, hp: f32) -> Self {
        Self {
            id: EntityId(id),
            position,
            attributes: EntityAttributes::new(camp, hp).with_defense(0.0),
            hits: Vec::new(),
        }
    }

    pub(crate) fn hits(&self) -> &[(EntityId, f32)] {
        &self.hits
    }
}

impl Targetable for StubTarget {
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

    fn apply_damage(&mut self, attacker: EntityId, attack: f32) -> DamageOutcome {
        self.hits.push((attacker, attack));
        resolve(standard_damage, attack, &mut self.attributes)
    }
}

/// Hero row the tests are tuned to. Against 20 defense the hero's 50
/// attack lands 30 per hit, and the monster row's 30 attack lands 10.
pub(crate) fn hero_spawn() -> HeroSpawn {
    HeroSpawn {
        name: "Tess".to_string(),
        position: Vec3::ZERO,
        yaw: 0.0,
        hp: 100.0,
        attack: 50.0,
        defense: 20.0,
        move_speed: 2.0,
        rotate_speed: 2.0,
        attack_range: 2.0,
        attack_interval: 1.0,
    }
}

/// Monster row matched to [`hero_spawn`]: dies in four hero hits, kills
/// the hero in ten of its own.
pub(crate) fn monster_spawn(name: &str, position: Vec3) -> MonsterSpawn {
    MonsterSpawn {
        name: name.to_string(),
        position,
        yaw: 0.0,
        hp: 100.0,
        attack: 30.0,
        defense: 20.0,
        move_speed: 2.0,
        rotate_speed: 6.0,
        attack_range: 1.5,
        attack_interval: 1.0,
        aggro_range: 10.0,
    }
}
