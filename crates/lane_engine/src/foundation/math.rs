//! Math utilities and types
//!
//! Thin aliases over `nalgebra` plus the rigid `Transform` frame used by the
//! entity world. The runner's primary travel axis is +Z.

pub use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Unit quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Rigid frame: position plus orientation
///
/// Entities in a lane runner are never scaled at runtime, so unlike a full
/// render transform this carries no scale component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in world (or parent) space
    pub position: Vec3,

    /// Orientation
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Map a point from this frame's local space into the enclosing space
    pub fn transform_point(&self, local: &Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Compose a child frame expressed in this frame's local space
    pub fn compose(&self, local: &Self) -> Self {
        Self {
            position: self.transform_point(&local.position),
            rotation: self.rotation * local.rotation,
        }
    }
}

/// Math utility functions
pub mod utils {
    use super::{Quat, Vec3, Vector3};

    /// Distance between two points measured along the forward (Z) axis only
    pub fn forward_distance(a: &Vec3, b: &Vec3) -> f32 {
        (a.z - b.z).abs()
    }

    /// Linear interpolation with `t` clamped to `[0, 1]`
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t.clamp(0.0, 1.0)
    }

    /// Rotation about the vertical axis
    pub fn yaw(degrees: f32) -> Quat {
        Quat::from_axis_angle(&Vector3::y_axis(), degrees.to_radians())
    }
}
