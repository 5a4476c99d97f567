//! Camps, combat attributes and damage resolution

mod attributes;
mod damage;

pub use attributes::{Camp, EntityAttributes};
pub use damage::{resolve, standard_damage, DamageOutcome, DamagePolicy, ImpactData};
