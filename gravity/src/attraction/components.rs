use bevy::prelude::*;

/// A body participating in mutual N-body attraction.
///
/// The entity also needs a [`Massive`] mass and a
/// [`rapier_bridge::Transform64`] position. Membership in the
/// [`AttractorRegistry`](super::AttractorRegistry) is maintained by the
/// plugin's systems when the component is added or removed.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Attractor {
    /// Scales the force this attractor exerts on the other registered
    /// bodies.
    pub g_multiplier: f64,
}

impl Default for Attractor {
    fn default() -> Self {
        Self { g_multiplier: 1. }
    }
}

#[derive(Component, Default, Debug, Clone, Copy, PartialEq)]
pub struct Massive {
    pub mass: f64,
}

/// Keeps an attractor's mass, scale-derived volume and density mutually
/// consistent under external edits to any of the three.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct DensityComp {
    pub density: f64,
    /// When set, density is the fixed quantity: mass edits resize the body
    /// and volume edits recompute the mass. Otherwise density floats to
    /// follow mass and volume.
    pub lock_density: bool,
    pub(crate) last: DensitySnapshot,
}

impl Default for DensityComp {
    fn default() -> Self {
        Self {
            density: 1.,
            lock_density: false,
            last: DensitySnapshot::default(),
        }
    }
}

impl DensityComp {
    pub fn new(density: f64, lock_density: bool) -> Self {
        Self {
            density,
            lock_density,
            ..default()
        }
    }
}

#[derive(Bundle, Debug, Default, Clone)]
pub struct AttractorBundle {
    pub attractor: Attractor,
    pub massive: Massive,
    pub density: DensityComp,
}

/// Last observed (density, mass, volume) triple, the only state the
/// reconciler keeps between passes.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DensitySnapshot {
    pub density: f64,
    pub mass: f64,
    pub volume: f64,
}

/// What the caller must apply to restore `mass == density * volume`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReconcileAction {
    None,
    SetMass(f64),
    SetDensity(f64),
    /// Multiply the body's scale by this factor.
    ScaleBy(f64),
}

/// One reconciliation pass over the currently observed values.
///
/// `volume` must be positive (clamp before calling) and already include
/// the unit conversion. Whichever value changed since the snapshot is the
/// driving one; a density edit wins over simultaneous mass or volume
/// edits. The returned snapshot reflects the state once the action is
/// applied, so calling again without external edits yields
/// [`ReconcileAction::None`].
pub fn reconcile(
    mut prev: DensitySnapshot,
    density: f64,
    mass: f64,
    volume: f64,
    lock_density: bool,
) -> (ReconcileAction, DensitySnapshot) {
    // A zero snapshot is an unseeded one, not a real prior value.
    if prev.density == 0. {
        prev.density = density;
    }
    if prev.mass == 0. {
        prev.mass = mass;
    }
    if prev.volume == 0. {
        prev.volume = volume;
    }

    let action = if density != prev.density {
        ReconcileAction::SetMass(density * volume)
    } else if mass != prev.mass {
        if lock_density {
            ReconcileAction::ScaleBy(mass / prev.mass)
        } else {
            ReconcileAction::SetDensity(mass / volume)
        }
    } else if volume != prev.volume {
        if lock_density {
            ReconcileAction::SetMass(density * volume)
        } else {
            ReconcileAction::SetDensity(mass / volume)
        }
    } else {
        ReconcileAction::None
    };

    let next = match action {
        ReconcileAction::None => prev,
        ReconcileAction::SetMass(new_mass) => DensitySnapshot {
            density,
            mass: new_mass,
            volume,
        },
        // The resize only lands on the transform next pass; snapshotting
        // the pre-resize volume makes the follow-up pass recompute the
        // mass from the new one.
        ReconcileAction::SetDensity(new_density) => DensitySnapshot {
            density: new_density,
            mass,
            volume,
        },
        ReconcileAction::ScaleBy(_) => DensitySnapshot {
            density,
            mass,
            volume,
        },
    };

    (action, next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(density: f64, mass: f64, volume: f64) -> DensitySnapshot {
        DensitySnapshot { density, mass, volume }
    }

    #[test]
    fn first_observation_seeds_without_jump() {
        // Inconsistent spawn values must not trigger a correction on the
        // first pass.
        let (action, next) = reconcile(DensitySnapshot::default(), 2., 1., 3., false);
        assert_eq!(action, ReconcileAction::None);
        assert_eq!(next, seeded(2., 1., 3.));
    }

    #[test]
    fn density_edit_drives_mass() {
        let prev = seeded(1., 3., 3.);
        let (action, next) = reconcile(prev, 2., 3., 3., false);
        assert_eq!(action, ReconcileAction::SetMass(6.));
        assert_eq!(next, seeded(2., 6., 3.));
    }

    #[test]
    fn density_edit_wins_over_simultaneous_mass_edit() {
        let prev = seeded(1., 3., 3.);
        let (action, _) = reconcile(prev, 2., 100., 3., false);
        assert_eq!(action, ReconcileAction::SetMass(6.));
    }

    #[test]
    fn unlocked_mass_edit_floats_density() {
        let prev = seeded(1., 3., 3.);
        let (action, next) = reconcile(prev, 1., 6., 3., false);
        assert_eq!(action, ReconcileAction::SetDensity(2.));
        assert_eq!(next, seeded(2., 6., 3.));
    }

    #[test]
    fn locked_mass_edit_scales_the_body() {
        let prev = seeded(1., 2., 2.);
        let (action, next) = reconcile(prev, 1., 4., 2., true);
        assert_eq!(action, ReconcileAction::ScaleBy(2.));

        // Follow-up pass sees the doubled volume and recomputes the mass
        // from the locked density, landing exactly on the edited mass.
        let (action, next) = reconcile(next, 1., 4., 4., true);
        assert_eq!(action, ReconcileAction::SetMass(4.));
        assert_eq!(next, seeded(1., 4., 4.));
    }

    #[test]
    fn locked_volume_edit_recomputes_mass() {
        let prev = seeded(2., 4., 2.);
        let (action, next) = reconcile(prev, 2., 4., 3., true);
        assert_eq!(action, ReconcileAction::SetMass(6.));
        assert_eq!(next, seeded(2., 6., 3.));
    }

    #[test]
    fn reconciliation_is_idempotent() {
        let prev = seeded(1., 3., 3.);
        let (_, next) = reconcile(prev, 2., 3., 3., false);
        let (action, again) = reconcile(next, 2., 6., 3., false);
        assert_eq!(action, ReconcileAction::None);
        assert_eq!(again, next);
    }
}
