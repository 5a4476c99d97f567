//! Spawn rows and encounter files
//!
//! Entities are spawned from plain data rows. An [`EncounterSpec`] bundles
//! one hero and any number of monsters and can be saved or loaded in RON
//! and JSON. Rows are validated when a file is parsed and again when an
//! entity spawns, so hand-built rows get the same checks as loaded ones.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::fsm::FsmError;

/// Errors raised while spawning an entity or handling encounter files.
#[derive(Debug, Clone)]
pub enum SpawnError {
    /// A spawn row failed validation.
    InvalidData { reason: String },
    /// The animation driver has fewer clips than the states need.
    InsufficientClips { found: usize, required: usize },
    /// Building or starting the entity's state machine failed.
    Fsm(FsmError),
    /// IO error.
    Io(String),
    /// Serialization error.
    Serialize(String),
    /// Deserialization error.
    Parse(String),
}

impl std::fmt::Display for SpawnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidData { reason } => write!(f, "invalid spawn data: {reason}"),
            Self::InsufficientClips { found, required } => write!(
                f,
                "animation driver reports {found} clips, at least {required} required"
            ),
            Self::Fsm(e) => write!(f, "state machine setup failed: {e}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Serialize(e) => write!(f, "serialization error: {e}"),
            Self::Parse(e) => write!(f, "deserialization error: {e}"),
        }
    }
}

impl std::error::Error for SpawnError {}

impl From<FsmError> for SpawnError {
    fn from(e: FsmError) -> Self {
        Self::Fsm(e)
    }
}

fn default_attack_interval() -> f32 {
    1.0
}

fn default_aggro_range() -> f32 {
    8.0
}

fn default_encounter_name() -> String {
    "Skirmish".to_string()
}

fn require_positive(field: &'static str, value: f32) -> Result<(), SpawnError> {
    if value.is_nan() || value <= 0.0 {
        return Err(SpawnError::InvalidData {
            reason: format!("{field} must be positive, got {value}"),
        });
    }
    Ok(())
}

fn require_non_negative(field: &'static str, value: f32) -> Result<(), SpawnError> {
    if value.is_nan() || value < 0.0 {
        return Err(SpawnError::InvalidData {
            reason: format!("{field} must not be negative, got {value}"),
        });
    }
    Ok(())
}

fn require_placement(position: Vec3, yaw: f32) -> Result<(), SpawnError> {
    if !position.is_finite() || !yaw.is_finite() {
        return Err(SpawnError::InvalidData {
            reason: format!("placement must be finite, got position {position} yaw {yaw}"),
        });
    }
    Ok(())
}

fn require_name(name: &str) -> Result<(), SpawnError> {
    if name.trim().is_empty() {
        return Err(SpawnError::InvalidData {
            reason: "name must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Spawn row for the player-controlled hero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroSpawn {
    pub name: String,
    pub position: Vec3,
    /// Initial facing in radians.
    #[serde(default)]
    pub yaw: f32,
    pub hp: f32,
    pub attack: f32,
    pub defense: f32,
    pub move_speed: f32,
    pub rotate_speed: f32,
    pub attack_range: f32,
    /// Cooldown between attacks in seconds.
    #[serde(default = "default_attack_interval")]
    pub attack_interval: f32,
}

impl HeroSpawn {
    /// Check the row for values an entity cannot be built from.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError::InvalidData`] naming the offending field.
    pub fn validate(&self) -> Result<(), SpawnError> {
        require_name(&self.name)?;
        require_placement(self.position, self.yaw)?;
        require_positive("hp", self.hp)?;
        require_non_negative("attack", self.attack)?;
        require_non_negative("defense", self.defense)?;
        require_positive("move_speed", self.move_speed)?;
        require_positive("rotate_speed", self.rotate_speed)?;
        require_positive("attack_range", self.attack_range)?;
        require_positive("attack_interval", self.attack_interval)
    }
}

/// Spawn row for one monster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterSpawn {
    pub name: String,
    pub position: Vec3,
    /// Initial facing in radians.
    #[serde(default)]
    pub yaw: f32,
    pub hp: f32,
    pub attack: f32,
    pub defense: f32,
    pub move_speed: f32,
    pub rotate_speed: f32,
    pub attack_range: f32,
    /// Cooldown between attacks in seconds.
    #[serde(default = "default_attack_interval")]
    pub attack_interval: f32,
    /// Distance at which the monster notices a hostile.
    #[serde(default = "default_aggro_range")]
    pub aggro_range: f32,
}

impl MonsterSpawn {
    /// Check the row for values an entity cannot be built from.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError::InvalidData`] naming the offending field.
    pub fn validate(&self) -> Result<(), SpawnError> {
        require_name(&self.name)?;
        require_placement(self.position, self.yaw)?;
        require_positive("hp", self.hp)?;
        require_non_negative("attack", self.attack)?;
        require_non_negative("defense", self.defense)?;
        require_positive("move_speed", self.move_speed)?;
        require_positive("rotate_speed", self.rotate_speed)?;
        require_positive("attack_range", self.attack_range)?;
        require_positive("attack_interval", self.attack_interval)?;
        require_positive("aggro_range", self.aggro_range)
    }
}

/// One hero and a pack of monsters, ready to spawn as a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterSpec {
    /// Encounter name, for logs.
    #[serde(default = "default_encounter_name")]
    pub name: String,
    pub hero: HeroSpawn,
    #[serde(default)]
    pub monsters: Vec<MonsterSpawn>,
}

impl EncounterSpec {
    /// Validate every row in the encounter.
    ///
    /// # Errors
    ///
    /// Returns the first [`SpawnError::InvalidData`] found.
    pub fn validate(&self) -> Result<(), SpawnError> {
        self.hero.validate()?;
        for monster in &self.monsters {
            monster.validate()?;
        }
        Ok(())
    }

    /// Parse and validate an encounter from RON text.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or validation fails.
    pub fn from_ron_str(source: &str) -> Result<Self, SpawnError> {
        let spec: Self = ron::from_str(source).map_err(|e| SpawnError::Parse(e.to_string()))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse and validate an encounter from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or validation fails.
    pub fn from_json_str(source: &str) -> Result<Self, SpawnError> {
        let spec: Self =
            serde_json::from_str(source).map_err(|e| SpawnError::Parse(e.to_string()))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Load an encounter from a RON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, SpawnError> {
        let content = fs::read_to_string(path).map_err(|e| SpawnError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Save the encounter to a RON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails.
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), SpawnError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SpawnError::Serialize(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| SpawnError::Io(e.to_string()))?;
        Ok(())
    }

    /// Load an encounter from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SpawnError> {
        let content = fs::read_to_string(path).map_err(|e| SpawnError::Io(e.to_string()))?;
        Self::from_json_str(&content)
    }

    /// Save the encounter to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), SpawnError> {
        let json_string =
            serde_json::to_string_pretty(self).map_err(|e| SpawnError::Serialize(e.to_string()))?;
        fs::write(path, json_string).map_err(|e| SpawnError::Io(e.to_string()))?;
        Ok(())
    }
}
