//! Combat stats carried by every entity

use std::fmt;

use crate::combat::damage::ImpactData;

/// Which side of the fight an entity is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Camp {
    Player,
    Enemy,
}

impl Camp {
    /// Whether entities of `self` attack entities of `other`.
    #[must_use]
    pub const fn is_hostile_to(self, other: Camp) -> bool {
        !matches!(
            (self, other),
            (Camp::Player, Camp::Player) | (Camp::Enemy, Camp::Enemy)
        )
    }
}

impl fmt::Display for Camp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Camp::Player => write!(f, "player"),
            Camp::Enemy => write!(f, "enemy"),
        }
    }
}

/// The combat attributes of one entity instance.
///
/// Health stays clamped to `[0, max_hp]`; only damage resolution mutates
/// it, everything else reads through the getters.
#[derive(Debug, Clone)]
pub struct EntityAttributes {
    camp: Camp,
    max_hp: f32,
    hp: f32,
    attack: f32,
    defense: f32,
    move_speed: f32,
    rotate_speed: f32,
    attack_range: f32,
    attack_interval: f32,
}

impl EntityAttributes {
    /// Create attributes at full health with zeroed combat stats.
    #[must_use]
    pub fn new(camp: Camp, max_hp: f32) -> Self {
        let max_hp = max_hp.max(0.0);
        Self {
            camp,
            max_hp,
            hp: max_hp,
            attack: 0.0,
            defense: 0.0,
            move_speed: 0.0,
            rotate_speed: 0.0,
            attack_range: 0.0,
            attack_interval: 1.0,
        }
    }

    #[must_use]
    pub fn with_attack(mut self, attack: f32) -> Self {
        self.attack = attack;
        self
    }

    #[must_use]
    pub fn with_defense(mut self, defense: f32) -> Self {
        self.defense = defense;
        self
    }

    #[must_use]
    pub fn with_move_speed(mut self, move_speed: f32) -> Self {
        self.move_speed = move_speed;
        self
    }

    #[must_use]
    pub fn with_rotate_speed(mut self, rotate_speed: f32) -> Self {
        self.rotate_speed = rotate_speed;
        self
    }

    #[must_use]
    pub fn with_attack_range(mut self, attack_range: f32) -> Self {
        self.attack_range = attack_range;
        self
    }

    #[must_use]
    pub fn with_attack_interval(mut self, attack_interval: f32) -> Self {
        self.attack_interval = attack_interval;
        self
    }

    #[must_use]
    pub const fn camp(&self) -> Camp {
        self.camp
    }

    #[must_use]
    pub const fn max_hp(&self) -> f32 {
        self.max_hp
    }

    #[must_use]
    pub const fn hp(&self) -> f32 {
        self.hp
    }

    #[must_use]
    pub const fn attack(&self) -> f32 {
        self.attack
    }

    #[must_use]
    pub const fn defense(&self) -> f32 {
        self.defense
    }

    #[must_use]
    pub const fn move_speed(&self) -> f32 {
        self.move_speed
    }

    #[must_use]
    pub const fn rotate_speed(&self) -> f32 {
        self.rotate_speed
    }

    #[must_use]
    pub const fn attack_range(&self) -> f32 {
        self.attack_range
    }

    #[must_use]
    pub const fn attack_interval(&self) -> f32 {
        self.attack_interval
    }

    /// Whether health has reached zero.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    /// Snapshot for an attacker's damage formula. Impact force is zero by
    /// default; there is no contact damage in this core.
    #[must_use]
    pub fn impact_data(&self) -> ImpactData {
        ImpactData::new(self.camp, self.hp, 0.0, self.defense)
    }

    /// Subtract `amount` from health, clamped at zero. Returns the new
    /// health value.
    pub(crate) fn reduce_hp(&mut self, amount: f32) -> f32 {
        self.hp = (self.hp - amount).max(0.0);
        self.hp
    }
}
