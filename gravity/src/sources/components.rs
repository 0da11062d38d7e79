use bevy::{math::DVec3, prelude::*};
use smallvec::SmallVec;

/// Pull-vs-distance curve of a [`GravitySource`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum GravityFalloff {
    /// Twice the peak force inside the terminal radius, decaying linearly
    /// to zero at the outer radius.
    #[default]
    Gradual,
    /// Constant peak force anywhere inside the volume.
    Linear,
}

/// A bounded volume pulling nearby bodies toward its center.
///
/// The entity's sensor collider radius is kept synchronized to
/// `range * max axis scale` by the plugin.
#[derive(getset::CopyGetters, Component, Debug, Clone, Copy, PartialEq)]
pub struct GravitySource {
    pub falloff: GravityFalloff,
    /// Peak pull magnitude.
    pub gravitational_force: f64,
    /// Outer radius, before scaling by the transform.
    pub range: f64,
    /// Fraction of the outer radius at which gradual pull saturates,
    /// in [0, 1].
    pub range_terminal_cutoff: f64,
    /// Whether any body was inside the volume this tick. Debug display
    /// only, no physics effect.
    #[getset(get_copy = "pub")]
    pub(crate) body_detected: bool,
}

impl Default for GravitySource {
    fn default() -> Self {
        Self {
            falloff: GravityFalloff::Gradual,
            gravitational_force: 100.,
            range: 1.5,
            range_terminal_cutoff: 0.5,
            body_detected: false,
        }
    }
}

impl GravitySource {
    pub fn gradual(gravitational_force: f64, range: f64, range_terminal_cutoff: f64) -> Self {
        Self {
            falloff: GravityFalloff::Gradual,
            gravitational_force,
            range,
            range_terminal_cutoff,
            ..default()
        }
    }

    pub fn linear(gravitational_force: f64, range: f64) -> Self {
        Self {
            falloff: GravityFalloff::Linear,
            gravitational_force,
            range,
            ..default()
        }
    }

    /// Outer radius of the volume under the given transform scale.
    pub fn max_radius(&self, max_axis_scale: f64) -> f64 {
        self.range * max_axis_scale
    }

    /// Pull magnitude at `distance` from the center.
    ///
    /// Only meaningful while the body overlaps the volume, so
    /// `distance <= max_radius` is assumed.
    pub fn pull_at(&self, max_axis_scale: f64, distance: f64) -> f64 {
        match self.falloff {
            GravityFalloff::Linear => self.gravitational_force,
            GravityFalloff::Gradual => {
                let max_radius = self.max_radius(max_axis_scale);
                let min_radius = max_radius * self.range_terminal_cutoff;
                let falloff_width = max_radius - min_radius;
                if falloff_width <= f64::EPSILON {
                    // Degenerate curve, the whole volume is saturated.
                    return 2. * self.gravitational_force;
                }

                let pull = (falloff_width - (distance - min_radius)) / falloff_width * 2.;
                pull.min(2.) * self.gravitational_force
            },
        }
    }
}

/// One overlapping source's pull on a body this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityContribution {
    pub point: DVec3,
    pub strength: f64,
}

/// Per-tick pulls on a body, one entry per distinct overlapping source.
/// Filled by the collection pass, consumed and cleared by the orientation
/// pass.
#[derive(Component, Debug, Default, Clone)]
pub struct GravityContributions(pub(crate) SmallVec<[GravityContribution; 4]>);

impl GravityContributions {
    pub fn iter(&self) -> impl Iterator<Item = &GravityContribution> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Marks a rigid body as pulled by the gravity sources it overlaps.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct GravityAffected {
    /// Scales the pull of every source on this body.
    pub gravity: f64,
}

impl Default for GravityAffected {
    fn default() -> Self {
        Self { gravity: 3. }
    }
}

/// Velocity magnitudes above the limit are rescaled to exactly the limit,
/// direction preserved. Keeps fast bodies from tunnelling into the ground.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct MaxVelocityComp {
    pub max_velocity: f64,
}

impl Default for MaxVelocityComp {
    fn default() -> Self {
        Self { max_velocity: 50. }
    }
}

/// Pins a body to one designated source entity: constant pull and hard
/// up-alignment toward it, regardless of overlap volumes.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct PrimarySource {
    pub source: Entity,
    /// Pull multiplier toward the source.
    pub gravity: f64,
    /// Move by a fixed angular speed instead of constant surface speed.
    pub angle_based_movement: bool,
    /// Restrict velocity to the radial axis toward or away from the
    /// source.
    pub no_horizontal_velocity: bool,
}

impl PrimarySource {
    pub fn new(source: Entity) -> Self {
        Self {
            source,
            gravity: 3.,
            angle_based_movement: false,
            no_horizontal_velocity: true,
        }
    }
}

/// Everything a free rigid body needs to react to gravity sources.
#[derive(Bundle, Debug, Default, Clone)]
pub struct GravityBodyBundle {
    pub affected: GravityAffected,
    pub contributions: GravityContributions,
    pub max_velocity: MaxVelocityComp,
}
