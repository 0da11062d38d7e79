use bevy::math::{DQuat, DVec3};
use bevy::prelude::*;

/// World-space transform of a simulated entity, in double precision.
///
/// There is no hierarchy: every transform is already world-space, which is
/// all a physics mirror needs.
#[derive(Component, Debug, PartialEq, Clone, Copy)]
pub struct Transform64 {
    pub translation: DVec3,
    pub rotation: DQuat,
    pub scale: DVec3,
}

impl Default for Transform64 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform64 {
    pub const IDENTITY: Transform64 = Transform64 {
        translation: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
        scale: DVec3::ONE,
    };

    pub fn from_translation(translation: DVec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn from_rotation(rotation: DQuat) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    pub fn from_scale(scale: DVec3) -> Self {
        Self {
            scale,
            ..Self::IDENTITY
        }
    }

    #[must_use]
    pub fn with_scale(mut self, scale: DVec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn local_x(&self) -> DVec3 {
        self.rotation * DVec3::X
    }

    pub fn local_y(&self) -> DVec3 {
        self.rotation * DVec3::Y
    }

    pub fn local_z(&self) -> DVec3 {
        self.rotation * DVec3::Z
    }

    pub fn forward(&self) -> DVec3 {
        -self.local_z()
    }

    pub fn back(&self) -> DVec3 {
        self.local_z()
    }

    pub fn left(&self) -> DVec3 {
        -self.local_x()
    }

    pub fn right(&self) -> DVec3 {
        self.local_x()
    }

    pub fn up(&self) -> DVec3 {
        self.local_y()
    }

    pub fn down(&self) -> DVec3 {
        -self.local_y()
    }

    /// Rotates the transform around `point`, orbiting its translation when
    /// the point is elsewhere.
    pub fn rotate_around(&mut self, point: DVec3, rotation: DQuat) {
        self.translation = point + rotation * (self.translation - point);
        self.rotation = rotation * self.rotation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::dvec3;

    #[test]
    fn rotate_around_orbits_the_point() {
        let mut transform = Transform64::from_translation(dvec3(0., 10., 0.));
        transform.rotate_around(
            DVec3::ZERO,
            DQuat::from_axis_angle(DVec3::X, std::f64::consts::FRAC_PI_2),
        );
        assert!(transform.translation.distance(dvec3(0., 0., 10.)) < 1e-9);
        assert!(transform.up().distance(dvec3(0., 0., 1.)) < 1e-9);
    }

    #[test]
    fn rotate_around_own_translation_only_turns() {
        let mut transform = Transform64::from_translation(dvec3(3., 0., 0.));
        let pivot = transform.translation;
        transform.rotate_around(pivot, DQuat::from_rotation_y(1.));
        assert_eq!(transform.translation, dvec3(3., 0., 0.));
    }
}
