use bevy::prelude::*;
use rapier::dynamics::{IntegrationParameters, RigidBodyBuilder};
use rapier::geometry::ColliderBuilder;
use rapier::math::Isometry;
use utils::IsZeroApprox as _;

use crate::*;

fn isometry_of(transform: &Transform64) -> Isometry<Float> {
    Isometry::from_parts(
        transform.translation.to_rapier().into(),
        transform.rotation.to_rapier(),
    )
}

pub fn rigid_body_init_system(
    mut commands: Commands,
    mut context: ResMut<RapierContext>,

    new_rigid_body_query: Query<(
        Entity,
        &Transform64,

        &RigidBodyComp,
        &RigidBodyDampingComp,
        &VelocityComp,

        Option<&ColliderHandleComp>,
    ), (
        Without<RigidBodyHandleComp>,
    )>,
) {
    for (
        entity, transform,
        rigid_body, damping, velocity,
        collider,
    ) in &new_rigid_body_query {
        let mut builder = RigidBodyBuilder::new(rigid_body.kind)
            .position(isometry_of(transform))
            .linear_damping(damping.linear)
            .angular_damping(damping.angular)
            .linvel(velocity.linvel.to_rapier())
            .enabled(rigid_body.enabled);
        if rigid_body.lock_rotations {
            builder = builder.lock_rotations();
        }

        let handle = context.rigid_body_set.insert(builder);
        context.entities2rigidbodies.insert(entity, handle);
        context.entities_last_set_transform.insert(entity, *transform);

        commands.entity(entity).insert(RigidBodyHandleComp {
            handle,
        });

        if let Some(col_comp) = collider {
            // Partial borrow because we need two mut borrows to context
            let RapierContext { collider_set, rigid_body_set, .. } = &mut *context;
            collider_set.set_parent(col_comp.handle(), Some(handle), rigid_body_set);
        }
    }
}

pub fn collider_init_system(
    mut commands: Commands,
    mut context: ResMut<RapierContext>,

    new_colliders_query: Query<(
        Entity,
        &Transform64,
        &ColliderShapeComp,
        &ColliderMassComp,
        &CollisionGroupsComp,

        Option<&RigidBodyHandleComp>,
    ), (
        Without<ColliderHandleComp>,
    )>,
) {
    for (
        entity, transform,
        shape_comp, mass_comp, groups_comp,
        rigid_body,
    ) in &new_colliders_query {
        let mut builder = ColliderBuilder::new(shape_comp.shape.clone())
            .sensor(shape_comp.sensor)
            .mass(mass_comp.mass)
            .collision_groups(groups_comp.groups);

        if rigid_body.is_none() {
            builder = builder.position(isometry_of(transform));
        }

        let handle = context.collider_set.insert(builder);
        context.entities2colliders.insert(entity, handle);
        context.colliders2entities.insert(handle, entity);

        commands.entity(entity).insert(ColliderHandleComp {
            handle,
        });

        if let Some(rigid_body) = rigid_body {
            // Partial borrow because we need two mut borrows to context
            let RapierContext { collider_set, rigid_body_set, .. } = &mut *context;
            collider_set.set_parent(handle, Some(rigid_body.handle()), rigid_body_set);
        }
    }
}

pub fn rigid_body_remove_system(
    mut commands: Commands,
    mut context: ResMut<RapierContext>,

    invalid_handles: Query<Entity, (With<RigidBodyHandleComp>, Or<(
        Without<RigidBodyComp>,
        Without<RigidBodyDampingComp>,
        Without<VelocityComp>,
    )>)>,

    mut removed_handles: RemovedComponents<RigidBodyHandleComp>,
) {
    for entity in std::iter::empty()
        .chain(
            removed_handles.read()
        )
        .chain(
            invalid_handles.iter().inspect(|&e| {
                commands.entity(e).remove::<RigidBodyHandleComp>();
            })
        )
    {
        let Some(handle) = context.entities2rigidbodies.remove(&entity)
        else { continue; };
        context.entities_last_set_transform.remove(&entity);

        let RapierContext {
            collider_set, island_manager, rigid_body_set,
            impulse_joint_set, multibody_joint_set, ..
        } = &mut *context;

        rigid_body_set.remove(
            handle,
            island_manager,
            collider_set,
            impulse_joint_set,
            multibody_joint_set,
            false,
        );
    }
}

pub fn collider_remove_system(
    mut commands: Commands,
    mut context: ResMut<RapierContext>,

    invalid_handles: Query<Entity, (With<ColliderHandleComp>, Or<(
        Without<ColliderShapeComp>,
        Without<ColliderMassComp>,
        Without<CollisionGroupsComp>,
    )>)>,

    mut removed_handles: RemovedComponents<ColliderHandleComp>,
) {
    for entity in std::iter::empty()
        .chain(
            removed_handles.read()
        )
        .chain(
            invalid_handles.iter().inspect(|&e| {
                commands.entity(e).remove::<ColliderHandleComp>();
            })
        )
    {
        let Some(handle) = context.entities2colliders.remove(&entity)
        else { continue; };
        context.colliders2entities.remove(&handle);

        let RapierContext {
            collider_set, island_manager, rigid_body_set, ..
        } = &mut *context;

        collider_set.remove(handle, island_manager, rigid_body_set, false);
    }
}

pub fn rigid_body_update_system(
    mut context: ResMut<RapierContext>,

    rigid_body_changed_query: Query<(
        &RigidBodyHandleComp, &RigidBodyComp,
    ), (
        Changed<RigidBodyComp>,
    )>,
    damping_changed_query: Query<(
        &RigidBodyHandleComp, &RigidBodyDampingComp,
    ), (
        Changed<RigidBodyDampingComp>,
    )>,
    transform_changed_query: Query<(
        Entity, &RigidBodyHandleComp, &Transform64,
    ), (
        Changed<Transform64>,
    )>,
) {
    for (handle, comp) in &rigid_body_changed_query {
        let Some(rigid_body) = context.rigid_body_set.get_mut(handle.handle)
        else {
            log::warn!("Invalid rigid body handle");
            continue;
        };

        rigid_body.set_enabled(comp.enabled);
        rigid_body.set_body_type(comp.kind, true);
        rigid_body.lock_rotations(comp.lock_rotations, true);
    }

    for (handle, comp) in &damping_changed_query {
        let Some(rigid_body) = context.rigid_body_set.get_mut(handle.handle)
        else {
            log::warn!("Invalid rigid body handle");
            continue;
        };

        rigid_body.set_linear_damping(comp.linear);
        rigid_body.set_angular_damping(comp.angular);
    }

    for (entity, handle, transform) in &transform_changed_query {
        let RapierContext { rigid_body_set, entities_last_set_transform, .. }
            = &mut *context;

        let Some(rigid_body) = rigid_body_set.get_mut(handle.handle)
        else {
            log::warn!("Invalid rigid body handle");
            continue;
        };

        if Some(transform) != entities_last_set_transform.get(&entity) {
            entities_last_set_transform.insert(entity, *transform);
            rigid_body.set_translation(transform.translation.to_rapier(), true);
            rigid_body.set_rotation(transform.rotation.to_rapier(), true);
        }
    }
}

pub fn collider_update_system(
    mut context: ResMut<RapierContext>,

    shape_changed_query: Query<(
        &ColliderHandleComp, &ColliderShapeComp,
    ), (
        Changed<ColliderShapeComp>,
    )>,
    mass_changed_query: Query<(
        &ColliderHandleComp, &ColliderMassComp,
    ), (
        Changed<ColliderMassComp>,
    )>,
    groups_changed_query: Query<(
        &ColliderHandleComp, &CollisionGroupsComp,
    ), (
        Changed<CollisionGroupsComp>,
    )>,
) {
    for (handle, shape) in &shape_changed_query {
        let Some(collider) = context.collider_set.get_mut(handle.handle)
        else {
            log::warn!("Invalid collider handle");
            continue;
        };

        collider.set_shape(shape.shape.clone());
        collider.set_sensor(shape.sensor);
    }
    for (handle, mass) in &mass_changed_query {
        let Some(collider) = context.collider_set.get_mut(handle.handle)
        else {
            log::warn!("Invalid collider handle");
            continue;
        };

        collider.set_mass(mass.mass);
    }
    for (handle, groups) in &groups_changed_query {
        let Some(collider) = context.collider_set.get_mut(handle.handle)
        else {
            log::warn!("Invalid collider handle");
            continue;
        };

        collider.set_collision_groups(groups.groups);
    }
}

pub fn rigid_body_forces_system(
    mut context: ResMut<RapierContext>,

    mut forces_changed_query: Query<(
        &RigidBodyHandleComp, &mut ExternalForceComp,
    ), (
        Changed<ExternalForceComp>,
    )>,
) {
    for (handle, mut comp) in &mut forces_changed_query {
        let Some(rigid_body) = context.rigid_body_set.get_mut(handle.handle)
        else {
            log::warn!("Invalid rigid body handle");
            continue;
        };

        rigid_body.reset_forces(true);
        rigid_body.add_force(comp.force.to_rapier(), true);

        if !comp.impulse.is_zero_approx() {
            rigid_body.apply_impulse(comp.impulse.to_rapier(), true);
            comp.impulse = Vector3::ZERO;
        }
    }
}

pub fn physics_step_system(
    time: Res<Time<Fixed>>,
    mut context: ResMut<RapierContext>,
) {
    let params = IntegrationParameters {
        dt: time.delta_seconds_f64(),
        ..default()
    };

    let RapierContext {
        rigid_body_set, collider_set, physics_pipeline, island_manager,
        broad_phase, narrow_phase, impulse_joint_set, multibody_joint_set,
        ccd_solver, query_pipeline, ..
    } = &mut *context;

    // All gravity comes from the simulation's own force passes.
    physics_pipeline.step(
        &Vector3::ZERO.to_rapier(),
        &params,
        island_manager,
        broad_phase,
        narrow_phase,
        rigid_body_set,
        collider_set,
        impulse_joint_set,
        multibody_joint_set,
        ccd_solver,
        Some(query_pipeline),
        &(),
        &(),
    );
}

pub fn physics_writeback_system(
    mut context: ResMut<RapierContext>,

    mut rigid_bodies_query: Query<(
        Entity,
        &RigidBodyHandleComp,
        &mut VelocityComp,
        &mut Transform64,
    )>,
) {
    let RapierContext { rigid_body_set, entities_last_set_transform, .. }
        = &mut *context;

    for (
        entity, handle_comp, mut linvel_comp, mut transform_comp,
    ) in &mut rigid_bodies_query {
        let Some(rigid_body) = rigid_body_set.get(handle_comp.handle())
        else { continue; };

        if rigid_body.is_moving() {
            let mut new_transform = *transform_comp;
            new_transform.translation = rigid_body.translation().to_bevy();
            new_transform.rotation = rigid_body.rotation().to_bevy();
            if new_transform != *transform_comp {
                entities_last_set_transform.insert(entity, new_transform);
                *transform_comp = new_transform;
            }
        }

        let new_linvel = rigid_body.linvel().to_bevy();
        if new_linvel != linvel_comp.linvel {
            linvel_comp.linvel = new_linvel;
        }
    }
}
