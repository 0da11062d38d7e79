use bevy::prelude::*;
use crate::*;

#[derive(SystemSet, Debug, PartialEq, Eq, Default, Hash, Clone, Copy)]
pub struct PhysicsSystems;

#[derive(Default)]
pub struct PhysicsPlugin {
    // Prevents creation without using Default
    _private: (),
}

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app
            .insert_resource(RapierContext::default())
            .add_systems(PostStartup, (
                rigid_body_init_system,
                collider_init_system,
            ).chain())
            .add_systems(FixedUpdate, (
                // update before init because a body that has just been
                // created needs no update
                rigid_body_remove_system,
                collider_remove_system,
                rigid_body_update_system,
                collider_update_system,
                rigid_body_forces_system,
                rigid_body_init_system,
                collider_init_system,

                physics_step_system,
                physics_writeback_system,
            ).chain().in_set(PhysicsSystems))
        ;
    }
}
