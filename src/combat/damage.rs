//! Damage resolution
//!
//! The damage formula is a game-balance policy, not an engine rule, so it
//! is passed in as a plain function pointer. [`standard_damage`] is the
//! default: attack minus defense, never negative.

use crate::combat::attributes::{Camp, EntityAttributes};

/// A damage formula: `(attack, defense) -> damage`.
pub type DamagePolicy = fn(f32, f32) -> f32;

/// Default policy: `max(0, attack - defense)`.
#[must_use]
pub fn standard_damage(attack: f32, defense: f32) -> f32 {
    (attack - defense).max(0.0)
}

/// Snapshot a target hands to an attacker, discarded after one resolution.
#[derive(Debug, Clone, Copy)]
pub struct ImpactData {
    pub camp: Camp,
    pub hp: f32,
    pub impact_force: f32,
    pub defense: f32,
}

impl ImpactData {
    #[must_use]
    pub const fn new(camp: Camp, hp: f32, impact_force: f32, defense: f32) -> Self {
        Self {
            camp,
            hp,
            impact_force,
            defense,
        }
    }
}

/// What one application of damage did to the target.
#[derive(Debug, Clone, Copy)]
pub struct DamageOutcome {
    /// Damage actually applied, after the policy and the non-negative clamp.
    pub damage: f32,
    /// Target health after application.
    pub remaining_hp: f32,
    /// Whether this application brought the target to zero health.
    pub lethal: bool,
}

impl DamageOutcome {
    /// Outcome for a hit on an already dead target: nothing happens.
    #[must_use]
    pub(crate) const fn absorbed(remaining_hp: f32) -> Self {
        Self {
            damage: 0.0,
            remaining_hp,
            lethal: false,
        }
    }
}

/// Apply `attack` to `target` under `policy`.
///
/// Damage is clamped non-negative before application and health clamps at
/// zero. A target that is already dead absorbs the hit without change and
/// without reporting it as lethal, so one kill produces exactly one lethal
/// outcome no matter how many attackers land in the same tick.
pub fn resolve(policy: DamagePolicy, attack: f32, target: &mut EntityAttributes) -> DamageOutcome {
    if target.is_dead() {
        return DamageOutcome::absorbed(target.hp());
    }
    let damage = policy(attack, target.defense()).max(0.0);
    let remaining_hp = target.reduce_hp(damage);
    DamageOutcome {
        damage,
        remaining_hp,
        lethal: remaining_hp <= 0.0,
    }
}
