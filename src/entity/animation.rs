//! Animation states and the clip table
//!
//! Clips are matched to states by position: the host's driver reports its
//! clip names and the first five map onto [`AnimationState`] in declaration
//! order. That mirrors how the art side exports clips, so the core never
//! hardcodes clip names.

use std::fmt;

use crate::entity::spawn::SpawnError;

/// Cross-fade duration for every animation switch, in seconds.
pub const ANIMATION_BLEND_SECONDS: f32 = 0.01;

/// The animation poses the combat states drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationState {
    Idle,
    Walk,
    Attack,
    Hurt,
    Dead,
}

impl AnimationState {
    /// Every state, in clip-table order.
    pub const ALL: [AnimationState; 5] = [
        AnimationState::Idle,
        AnimationState::Walk,
        AnimationState::Attack,
        AnimationState::Hurt,
        AnimationState::Dead,
    ];

    /// Number of states, which is also the minimum clip count.
    pub const COUNT: usize = Self::ALL.len();

    /// Position of this state in the clip table.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            AnimationState::Idle => 0,
            AnimationState::Walk => 1,
            AnimationState::Attack => 2,
            AnimationState::Hurt => 3,
            AnimationState::Dead => 4,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            AnimationState::Idle => "idle",
            AnimationState::Walk => "walk",
            AnimationState::Attack => "attack",
            AnimationState::Hurt => "hurt",
            AnimationState::Dead => "dead",
        }
    }
}

impl fmt::Display for AnimationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps each [`AnimationState`] to the host clip that plays it.
#[derive(Debug, Clone)]
pub struct AnimationTable {
    clips: [String; AnimationState::COUNT],
}

impl AnimationTable {
    /// Build a table from a driver's clip list, taking the first
    /// [`AnimationState::COUNT`] entries positionally.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError::InsufficientClips`] when the driver reports
    /// fewer clips than there are states.
    pub fn from_clips(clips: Vec<String>) -> Result<Self, SpawnError> {
        if clips.len() < AnimationState::COUNT {
            return Err(SpawnError::InsufficientClips {
                found: clips.len(),
                required: AnimationState::COUNT,
            });
        }
        let mut clips = clips.into_iter();
        // Length was checked above, the iterator cannot run dry here.
        let clips = std::array::from_fn(|_| clips.next().unwrap_or_default());
        Ok(Self { clips })
    }

    /// Clip name for `state`.
    #[must_use]
    pub fn clip(&self, state: AnimationState) -> &str {
        &self.clips[state.index()]
    }
}
