//! Host services an entity binds when it spawns
//!
//! The combat core never talks to a renderer, a physics engine or an input
//! device directly. Entities hold trait objects for the three services
//! they need and the host wires real implementations in at spawn time.
//! Implementations use interior mutability where they need state, so the
//! traits take `&self` and the objects can be shared through `Rc`.

use glam::Vec3;

/// Left/right input axis, used for steering.
pub const AXIS_HORIZONTAL: &str = "Horizontal";
/// Forward/back input axis, used for movement.
pub const AXIS_VERTICAL: &str = "Vertical";
/// Attack trigger axis; any value above zero counts as pressed.
pub const AXIS_FIRE: &str = "Fire1";

/// Moves an entity's physical representation.
pub trait Movement {
    /// Request a move of the entity's body to `position` in world space.
    fn move_to(&self, position: Vec3);
}

/// Plays animation clips on an entity's visual representation.
pub trait AnimationDriver {
    /// Names of the available clips, in the driver's fixed order.
    fn clip_names(&self) -> Vec<String>;

    /// Cross-fade to `clip` over `blend_seconds`.
    fn play(&self, clip: &str, blend_seconds: f32);

    /// Whether `clip` is currently playing.
    fn is_playing(&self, clip: &str) -> bool;
}

/// Samples player input axes.
pub trait AxisInput {
    /// Current value of the named axis, typically in `[-1, 1]`.
    fn axis(&self, name: &str) -> f32;
}

/// Movement sink for entities without a physical representation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMovement;

impl Movement for NullMovement {
    fn move_to(&self, _position: Vec3) {}
}

/// Animation driver with no clips. Spawning an entity against it fails
/// clip validation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAnimation;

impl AnimationDriver for NullAnimation {
    fn clip_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn play(&self, _clip: &str, _blend_seconds: f32) {}

    fn is_playing(&self, _clip: &str) -> bool {
        false
    }
}

/// Input source that reports every axis at rest.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullInput;

impl AxisInput for NullInput {
    fn axis(&self, _name: &str) -> f32 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_services_are_inert() {
        NullMovement.move_to(Vec3::ONE);
        assert!(NullAnimation.clip_names().is_empty());
        assert!(!NullAnimation.is_playing("anything"));
        assert!(NullInput.axis(AXIS_HORIZONTAL).abs() < f32::EPSILON);
        assert!(NullInput.axis(AXIS_FIRE).abs() < f32::EPSILON);
    }
}
