use bevy::{math::DVec3, prelude::*};
use rapier_bridge::Group;

use crate::orientation::{GravityLockState, OrientationCorrector};
use crate::sources::{GravityAffected, GravityContributions, MaxVelocityComp};

/// Key bindings polled by the locomotion systems.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementKeybinds {
    pub forward: KeyCode,
    pub left: KeyCode,
    pub back: KeyCode,
    pub right: KeyCode,
    pub jump: KeyCode,
    pub sprint: KeyCode,
}

impl Default for MovementKeybinds {
    fn default() -> Self {
        Self {
            forward: KeyCode::KeyW,
            left: KeyCode::KeyA,
            back: KeyCode::KeyS,
            right: KeyCode::KeyD,
            jump: KeyCode::Space,
            sprint: KeyCode::ShiftLeft,
        }
    }
}

/// Locomotion tuning of a player-driven body.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct CharacterMovementComp {
    pub speed: f64,
    pub sprint_multiplier: f64,
    /// Speed factor once fully airborne, in [0, 1].
    pub air_speed_multiplier: f64,
    /// How fast the air factor ramps in, per second. Grounding resets the
    /// factor to one instantly.
    pub air_speed_transition: f64,
    pub jump_force: f64,
    /// Seconds between possible jumps.
    pub jump_pause: f64,
    /// Half-window of the ground probe below the collider surface.
    pub ground_check_distance: f64,
    /// Collision groups the ground probe ignores.
    pub ground_ignore_groups: Group,
}

impl Default for CharacterMovementComp {
    fn default() -> Self {
        Self {
            speed: 8.,
            sprint_multiplier: 1.5,
            air_speed_multiplier: 0.5,
            air_speed_transition: 1.,
            jump_force: 6.,
            jump_pause: 0.5,
            ground_check_distance: 0.1,
            ground_ignore_groups: Group::NONE,
        }
    }
}

/// Per-tick locomotion state, written by the systems.
#[derive(getset::CopyGetters, Component, Debug, Clone, Copy, PartialEq)]
pub struct CharacterStateComp {
    /// True only for the tick the ground probe hit.
    #[getset(get_copy = "pub")]
    pub(crate) grounded: bool,
    /// Source position the ground probe hit toward, the jump pivot.
    #[getset(get_copy = "pub")]
    pub(crate) ground_contact: Option<DVec3>,
    #[getset(get_copy = "pub")]
    pub(crate) air_multiplier: f64,
    #[getset(get_copy = "pub")]
    pub(crate) jump_cooldown: f64,
}

impl Default for CharacterStateComp {
    fn default() -> Self {
        Self {
            grounded: false,
            ground_contact: None,
            air_multiplier: 1.,
            jump_cooldown: 0.,
        }
    }
}

/// Everything a player-driven body needs on top of its rigid body and
/// collider.
#[derive(Bundle, Debug, Default, Clone)]
pub struct CharacterBundle {
    pub movement: CharacterMovementComp,
    pub state: CharacterStateComp,
    pub corrector: OrientationCorrector,
    pub lock: GravityLockState,
    pub affected: GravityAffected,
    pub contributions: GravityContributions,
    pub max_velocity: MaxVelocityComp,
}
