use crate::*;
use bevy::{diagnostic::{Diagnostic, RegisterDiagnostic}, prelude::*};
use rapier_bridge::PhysicsSystems;

#[derive(SystemSet, Debug, PartialEq, Eq, Default, Hash, Clone, Copy)]
pub struct GravitySystems;

#[derive(Default)]
pub struct CosmicGravityPlugin {
    /// Prevents public contruction
    _private: (),
}

impl Plugin for CosmicGravityPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, (
            (
                sync_attractor_masses_system,
                register_attractors_system,
                reconcile_density_system,
                reset_forces_system,
                nbody_attraction_system,
            ).chain(),
            (
                sync_source_volumes_system,
                reset_source_detection_system,
                collect_contributions_system,
                primary_source_pull_system,
            ).chain(),
            (
                ground_check_system,
                jump_system,
                orient_to_gravity_system,
                primary_source_orientation_system,
                movement_system,
                velocity_clamp_system,
            ).chain(),
        ).chain().in_set(GravitySystems).before(PhysicsSystems));

        app.register_diagnostic(
            Diagnostic::new(GRAVITY_COMPUTE_SYSTEM_DURATION)
                .with_suffix(" ms")
        );

        app.init_resource::<GravityConfig>();
        app.init_resource::<AttractorRegistry>();
        app.init_resource::<MovementKeybinds>();
        // Apps without an input plugin still need the key states to exist.
        app.init_resource::<ButtonInput<KeyCode>>();
    }
}
