mod is_zero_approx;
pub use is_zero_approx::*;

#[cfg(feature = "logging")]
pub mod logging;

use bevy_math::{DVec3, Vec3};

pub trait Vec3Ext {
    type Scalar;

    fn array(&self) -> [Self::Scalar; 3];
    /// Largest of the three axis magnitudes.
    fn max_axis_abs(&self) -> Self::Scalar;
    /// Mean of the three axis magnitudes.
    fn mean_axis_abs(&self) -> Self::Scalar;
}

impl Vec3Ext for DVec3 {
    type Scalar = f64;

    fn array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    fn max_axis_abs(&self) -> f64 {
        self.x.abs().max(self.y.abs()).max(self.z.abs())
    }

    fn mean_axis_abs(&self) -> f64 {
        (self.x.abs() + self.y.abs() + self.z.abs()) / 3.
    }
}

impl Vec3Ext for Vec3 {
    type Scalar = f32;

    fn array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    fn max_axis_abs(&self) -> f32 {
        self.x.abs().max(self.y.abs()).max(self.z.abs())
    }

    fn mean_axis_abs(&self) -> f32 {
        (self.x.abs() + self.y.abs() + self.z.abs()) / 3.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_math::dvec3;

    #[test]
    fn axis_helpers() {
        let v = dvec3(1., -4., 2.);
        assert_eq!(v.array(), [1., -4., 2.]);
        assert_eq!(v.max_axis_abs(), 4.);
        assert_eq!(v.mean_axis_abs(), 7. / 3.);
    }
}
