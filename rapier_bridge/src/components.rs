use bevy::prelude::*;

use crate::*;
use rapier::dynamics::{RigidBodyHandle, RigidBodyType};
use rapier::geometry::{ColliderHandle, InteractionGroups, SharedShape};

#[derive(Debug, Bundle, Clone)]
pub struct RigidBodyBundle {
    pub rigid_body: RigidBodyComp,
    pub damping: RigidBodyDampingComp,
    pub velocity: VelocityComp,
    pub forces: ExternalForceComp,
}

impl RigidBodyBundle {
    pub fn new(kind: RigidBodyType) -> Self {
        Self {
            rigid_body: RigidBodyComp {
                kind,
                enabled: true,
                lock_rotations: false,
            },
            damping: default(),
            velocity: default(),
            forces: default(),
        }
    }

    pub fn dynamic() -> Self {
        Self::new(RigidBodyType::Dynamic)
    }

    pub fn fixed() -> Self {
        Self::new(RigidBodyType::Fixed)
    }

    /// Bodies whose orientation is driven from the outside rather than by
    /// the solver.
    #[must_use]
    pub fn locked_rotations(mut self) -> Self {
        self.rigid_body.lock_rotations = true;
        self
    }

    #[must_use]
    pub fn with_linvel(mut self, linvel: Vector3) -> Self {
        self.velocity.linvel = linvel;
        self
    }

    #[must_use]
    pub fn with_damping(mut self, linear: Float, angular: Float) -> Self {
        self.damping.linear = linear;
        self.damping.angular = angular;
        self
    }
}

#[derive(getset::CopyGetters, Default, Debug, Component, Clone)]
pub struct RigidBodyHandleComp {
    #[getset(get_copy = "pub")]
    pub(crate) handle: RigidBodyHandle,
}

#[derive(Debug, Component, Clone)]
pub struct RigidBodyComp {
    pub kind: RigidBodyType,
    pub enabled: bool,
    pub lock_rotations: bool,
}

#[derive(Default, Debug, Component, Clone)]
pub struct RigidBodyDampingComp {
    pub linear: Float,
    pub angular: Float,
}

#[derive(getset::CopyGetters, Default, Debug, Component, Clone)]
pub struct VelocityComp {
    #[getset(get_copy = "pub")]
    pub(crate) linvel: Vector3,
}

impl VelocityComp {
    pub fn new(linvel: Vector3) -> Self {
        Self { linvel }
    }
}

/// Force accumulator consumed by the rapier sync every tick.
#[derive(Default, Debug, Component, Clone)]
pub struct ExternalForceComp {
    /// Continuous force, re-accumulated every tick.
    pub force: Vector3,
    /// Applied once on the next step, then cleared.
    pub impulse: Vector3,
}

#[derive(Debug, Bundle, Clone)]
pub struct ColliderBundle {
    pub shape: ColliderShapeComp,
    pub mass: ColliderMassComp,
    pub groups: CollisionGroupsComp,
}

impl ColliderBundle {
    pub fn new(shape: SharedShape) -> Self {
        Self {
            shape: ColliderShapeComp {
                shape,
                sensor: false,
            },
            mass: default(),
            groups: default(),
        }
    }

    pub fn ball(radius: Float) -> Self {
        Self::new(SharedShape::ball(radius))
    }

    pub fn cuboid(hx: Float, hy: Float, hz: Float) -> Self {
        Self::new(SharedShape::cuboid(hx, hy, hz))
    }

    /// A volume that detects overlaps without colliding.
    #[must_use]
    pub fn sensor(mut self) -> Self {
        self.shape.sensor = true;
        self
    }

    #[must_use]
    pub fn with_mass(mut self, mass: Float) -> Self {
        self.mass.mass = mass;
        self
    }

    #[must_use]
    pub fn with_groups(mut self, groups: InteractionGroups) -> Self {
        self.groups.groups = groups;
        self
    }
}

#[derive(getset::CopyGetters, Debug, Component, Clone)]
pub struct ColliderHandleComp {
    #[getset(get_copy = "pub")]
    pub(crate) handle: ColliderHandle,
}

#[derive(Debug, Component, Clone)]
pub struct ColliderShapeComp {
    pub shape: SharedShape,
    pub sensor: bool,
}

#[derive(Debug, Component, Clone)]
pub struct ColliderMassComp {
    pub mass: Float,
}

impl Default for ColliderMassComp {
    fn default() -> Self {
        Self { mass: 1. }
    }
}

#[derive(Debug, Component, Clone, Copy)]
pub struct CollisionGroupsComp {
    pub groups: InteractionGroups,
}

impl Default for CollisionGroupsComp {
    fn default() -> Self {
        Self {
            groups: InteractionGroups::all(),
        }
    }
}
