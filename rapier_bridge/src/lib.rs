mod transform;
pub use transform::*;

mod context;
pub use context::*;

mod components;
pub use components::*;

pub mod systems;
pub use systems::*;

mod plugin;
pub use plugin::*;

pub use rapier3d_f64 as rapier;

pub use rapier::dynamics::RigidBodyType;
pub use rapier::geometry::{Group, InteractionGroups, SharedShape};

pub type Float = rapier::math::Real;
pub type Vector3 = bevy::math::DVec3;

use bevy::math::{DQuat, DVec3};
use rapier::na;

pub trait ToRapier {
    type Rapier;

    fn to_rapier(&self) -> Self::Rapier;
}

pub trait ToBevy {
    type Bevy;

    fn to_bevy(&self) -> Self::Bevy;
}

impl ToRapier for DVec3 {
    type Rapier = na::Vector3<Float>;

    fn to_rapier(&self) -> na::Vector3<Float> {
        na::Vector3::new(self.x, self.y, self.z)
    }
}

impl ToBevy for na::Vector3<Float> {
    type Bevy = DVec3;

    fn to_bevy(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }
}

impl ToBevy for na::Point3<Float> {
    type Bevy = DVec3;

    fn to_bevy(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }
}

impl ToRapier for DQuat {
    type Rapier = na::UnitQuaternion<Float>;

    fn to_rapier(&self) -> na::UnitQuaternion<Float> {
        na::UnitQuaternion::new_normalize(na::Quaternion::new(
            self.w,
            self.x,
            self.y,
            self.z,
        ))
    }
}

impl ToBevy for na::UnitQuaternion<Float> {
    type Bevy = DQuat;

    fn to_bevy(&self) -> DQuat {
        DQuat::from_xyzw(
            self.coords.x,
            self.coords.y,
            self.coords.z,
            self.coords.w,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::dvec3;

    #[test]
    fn vector_conversion_roundtrip() {
        let v = dvec3(1., -2., 3.5);
        assert_eq!(v.to_rapier().to_bevy(), v);
    }

    #[test]
    fn quaternion_conversion_roundtrip() {
        let q = DQuat::from_axis_angle(dvec3(0., 1., 0.), 1.2);
        let back = q.to_rapier().to_bevy();
        assert!((back.x - q.x).abs() < 1e-12);
        assert!((back.y - q.y).abs() < 1e-12);
        assert!((back.z - q.z).abs() < 1e-12);
        assert!((back.w - q.w).abs() < 1e-12);
    }
}
