//! World-space position and facing
//!
//! Entities move on the ground plane, so rotation is a pure yaw around the
//! Y axis. Facing follows the -Z convention: an identity transform looks
//! down negative Z.

use glam::{Quat, Vec3};

/// Position and orientation of an entity in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    /// Transform at `position`, facing -Z.
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Transform at `position` with an initial yaw in radians.
    #[must_use]
    pub fn from_position_yaw(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_y(yaw),
        }
    }

    /// Unit vector the entity is facing.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Current yaw in radians, in `[-pi, pi]`.
    #[must_use]
    pub fn yaw(&self) -> f32 {
        let forward = self.forward();
        (-forward.x).atan2(-forward.z)
    }

    /// Offset the position by `delta`.
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Move `distance` along the current facing.
    pub fn advance(&mut self, distance: f32) {
        self.position += self.forward() * distance;
    }

    /// Apply an additional yaw of `angle` radians.
    pub fn rotate_y(&mut self, angle: f32) {
        self.rotation = Quat::from_rotation_y(angle) * self.rotation;
    }

    /// Turn toward `target` by at most `max_step` radians, the short way
    /// around. Returns the signed yaw error still left after the turn;
    /// zero means the entity now faces the target.
    pub fn yaw_towards(&mut self, target: Vec3, max_step: f32) -> f32 {
        let to_target = target - self.position;
        let planar = to_target.x * to_target.x + to_target.z * to_target.z;
        if planar <= f32::EPSILON {
            return 0.0;
        }
        let desired = (-to_target.x).atan2(-to_target.z);
        let delta = wrap_angle(desired - self.yaw());
        let step = delta.clamp(-max_step.abs(), max_step.abs());
        self.rotate_y(step);
        delta - step
    }

    /// Straight-line distance from this transform to `point`.
    #[must_use]
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Wrap an angle to `[-pi, pi]`.
fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    (angle + PI).rem_euclid(TAU) - PI
}
