use super::*;

use bevy::{math::{DQuat, DVec3}, prelude::*};
use rapier_bridge::{
    ExternalForceComp, Group, InteractionGroups, RapierContext, RayFilter, Transform64,
};
use smallvec::SmallVec;
use utils::IsZeroApprox as _;

use crate::sources::{GravityContributions, PrimarySource};
use crate::orientation::GravityLockState;

/// Scale of the jump impulse relative to `jump_force`.
const JUMP_KICK: f64 = 100.;

/// Probes for ground toward every source acting on the body this tick:
/// a short ray from the collider surface, inward, twice the check
/// distance long. Grounded holds for this tick only.
pub fn ground_check_system(
    context: Res<RapierContext>,

    transforms: Query<&Transform64>,
    mut players: Query<(
        Entity, &CharacterMovementComp, &mut CharacterStateComp,
        &GravityContributions, Option<&PrimarySource>,
    )>,
) {
    for (entity, movement, mut state, contributions, primary) in &mut players {
        state.grounded = false;
        state.ground_contact = None;

        let Ok(transform) = transforms.get(entity)
        else { continue; };

        let mut probe_targets = contributions.iter()
            .map(|contribution| contribution.point)
            .collect::<SmallVec<[DVec3; 4]>>();
        if let Some(primary) = primary {
            if let Ok(source_transform) = transforms.get(primary.source) {
                probe_targets.push(source_transform.translation);
            }
        }

        for source_pos in probe_targets {
            let to_source = source_pos - transform.translation;
            if to_source.is_zero_approx() {
                continue;
            }
            let toward = to_source.normalize();

            let Some(surface) = context.project_point(entity, source_pos)
            else { continue; };
            let origin = surface - toward * movement.ground_check_distance;

            let filter = RayFilter::excluding(entity)
                .exclude_sensors()
                .groups(InteractionGroups::new(
                    Group::ALL,
                    !movement.ground_ignore_groups,
                ));

            let hit = context.cast_ray(
                origin,
                toward,
                movement.ground_check_distance * 2.,
                true,
                filter,
            );
            if hit.is_some() {
                state.grounded = true;
                state.ground_contact = Some(source_pos);
                break;
            }
        }
    }
}

/// Jump away from the ground contact when grounded, the key is held and
/// the cooldown has elapsed.
pub fn jump_system(
    time: Res<Time<Fixed>>,
    keybinds: Res<MovementKeybinds>,
    keys: Res<ButtonInput<KeyCode>>,
    mut context: ResMut<RapierContext>,

    transforms: Query<&Transform64>,
    mut players: Query<(
        Entity, &CharacterMovementComp, &mut CharacterStateComp,
        &mut ExternalForceComp,
    )>,
) {
    let dt = time.delta_seconds_f64();

    for (entity, movement, mut state, mut accumulator) in &mut players {
        if state.jump_cooldown > 0. {
            state.jump_cooldown = (state.jump_cooldown - dt).max(0.);
        }

        if !state.grounded || !keys.pressed(keybinds.jump) || state.jump_cooldown > 0. {
            continue;
        }
        let Some(contact) = state.ground_contact
        else { continue; };
        let Ok(transform) = transforms.get(entity)
        else { continue; };

        let away = transform.translation - contact;
        if away.is_zero_approx() {
            continue;
        }
        let away = away.normalize();

        // Flatten the into-gravity velocity component so the kick doesn't
        // have to fight it.
        if let Some(linvel) = context.linvel(entity) {
            if !linvel.is_zero_approx() && linvel.dot(away) < 0. {
                context.set_linvel(entity, linvel.reject_from(away));
            }
        }

        accumulator.impulse += away * JUMP_KICK * movement.jump_force;
        state.jump_cooldown = movement.jump_pause;
    }
}

/// Turns planar input into motion: around the gravity pivot at constant
/// surface speed while locked, free translation otherwise.
pub fn movement_system(
    time: Res<Time<Fixed>>,
    keybinds: Res<MovementKeybinds>,
    keys: Res<ButtonInput<KeyCode>>,

    mut players: Query<(
        &CharacterMovementComp, &mut CharacterStateComp, &GravityLockState,
        Option<&PrimarySource>, &mut Transform64,
    )>,
) {
    let dt = time.delta_seconds_f64();

    for (movement, mut state, lock, primary, mut transform) in &mut players {
        let mut local_direction = DVec3::ZERO;
        if keys.pressed(keybinds.forward) {
            local_direction += DVec3::NEG_Z;
        }
        if keys.pressed(keybinds.left) {
            local_direction += DVec3::NEG_X;
        }
        if keys.pressed(keybinds.back) {
            local_direction += DVec3::Z;
        }
        if keys.pressed(keybinds.right) {
            local_direction += DVec3::X;
        }

        let mut current_speed = movement.speed;
        if keys.pressed(keybinds.sprint) {
            current_speed *= movement.sprint_multiplier;
        }

        if state.grounded {
            state.air_multiplier = 1.;
        } else {
            let ramped = state.air_multiplier - movement.air_speed_transition * dt;
            state.air_multiplier = ramped.max(movement.air_speed_multiplier);
        }
        current_speed *= state.air_multiplier;

        if local_direction == DVec3::ZERO {
            continue;
        }
        let local_direction = local_direction.normalize();

        if lock.locked() {
            if let Some(pivot) = lock.pivot() {
                let radius = transform.translation.distance(pivot);
                if radius > f64::EPSILON {
                    // A quarter turn of the input around local up is the
                    // axis perpendicular to both up and the travel
                    // direction.
                    let axis = transform.rotation
                        * (DQuat::from_rotation_y(std::f64::consts::FRAC_PI_2)
                            * local_direction);

                    let angle = if primary.is_some_and(|p| p.angle_based_movement) {
                        (current_speed * dt).to_radians()
                    } else {
                        // Constant surface speed whatever the orbital
                        // radius.
                        current_speed / radius * dt
                    };

                    transform.rotate_around(pivot, DQuat::from_axis_angle(axis, angle));
                    continue;
                }
            }
        }

        let delta = (transform.rotation * local_direction) * current_speed * dt;
        transform.translation += delta;
    }
}
