use super::*;

use bevy::prelude::*;
use rapier_bridge::{
    ColliderShapeComp, ExternalForceComp, RapierContext, SharedShape, Transform64,
};
use utils::{IsZeroApprox as _, Vec3Ext as _};

/// Pull scale of a pinned source, matching a peak-force-100 overlap source.
const PRIMARY_PULL_SCALE: f64 = 100.;

/// Keeps every source's sensor radius synchronized with its range and the
/// largest axis of its scale.
pub fn sync_source_volumes_system(
    mut sources: Query<(&GravitySource, &Transform64, &mut ColliderShapeComp)>,
) {
    for (source, transform, mut shape) in &mut sources {
        let radius = source.max_radius(transform.scale.max_axis_abs());

        let current = shape.shape.as_ball().map(|ball| ball.radius);
        if current != Some(radius) || !shape.sensor {
            shape.shape = SharedShape::ball(radius);
            shape.sensor = true;
        }
    }
}

pub fn reset_source_detection_system(
    mut sources: Query<&mut GravitySource>,
) {
    for mut source in &mut sources {
        if source.body_detected {
            source.body_detected = false;
        }
    }
}

/// Gathers this tick's overlapping sources for every affected body:
/// applies the pull into the force accumulator and records one
/// contribution per distinct source for the orientation pass.
pub fn collect_contributions_system(
    time: Res<Time<Fixed>>,
    context: Res<RapierContext>,

    mut sources: Query<(&mut GravitySource, &Transform64)>,
    mut bodies: Query<(
        Entity, &Transform64, &GravityAffected,
        &mut GravityContributions, &mut ExternalForceComp,
    )>,
) {
    let dt = time.delta_seconds_f64();

    for (
        body_entity, body_transform, affected, mut contributions, mut accumulator,
    ) in &mut bodies {
        // One-tick freshness even for bodies nothing consumes them on.
        if !contributions.0.is_empty() {
            contributions.0.clear();
        }

        for volume_entity in context.overlaps_with(body_entity) {
            let Ok((mut source, source_transform)) = sources.get_mut(volume_entity)
            else { continue; };

            source.body_detected = true;

            let source_pos = source_transform.translation;
            let body_pos = body_transform.translation;

            let pull = source.pull_at(
                source_transform.scale.max_axis_abs(),
                body_pos.distance(source_pos),
            );

            let to_source = source_pos - body_pos;
            if !to_source.is_zero_approx() {
                accumulator.force += to_source.normalize() * dt * affected.gravity * pull;
            }

            contributions.0.push(GravityContribution {
                point: source_pos,
                strength: pull,
            });
        }
    }
}

/// Constant pull of pinned bodies toward their designated source.
pub fn primary_source_pull_system(
    time: Res<Time<Fixed>>,

    transforms: Query<&Transform64>,
    mut bodies: Query<(Entity, &PrimarySource, &mut ExternalForceComp)>,
) {
    let dt = time.delta_seconds_f64();

    for (entity, primary, mut accumulator) in &mut bodies {
        let Ok([body_transform, source_transform]) =
            transforms.get_many([entity, primary.source])
        else {
            log::warn!("Primary gravity source of {entity:?} is gone, no pull this tick");
            continue;
        };

        let to_source = source_transform.translation - body_transform.translation;
        if to_source.is_zero_approx() {
            continue;
        }

        accumulator.force +=
            to_source.normalize() * dt * primary.gravity * PRIMARY_PULL_SCALE;
    }
}

/// Runs after every force pass: radial restriction of pinned bodies, then
/// the hard magnitude clamp.
pub fn velocity_clamp_system(
    mut context: ResMut<RapierContext>,

    transforms: Query<&Transform64>,
    pinned: Query<(Entity, &PrimarySource)>,
    clamped: Query<(Entity, &MaxVelocityComp)>,
) {
    for (entity, primary) in &pinned {
        if !primary.no_horizontal_velocity {
            continue;
        }
        let Ok([body_transform, source_transform]) =
            transforms.get_many([entity, primary.source])
        else { continue; };

        let radial = body_transform.translation - source_transform.translation;
        if radial.is_zero_approx() {
            continue;
        }
        let away = radial.normalize();

        let Some(linvel) = context.linvel(entity)
        else { continue; };
        if linvel.is_zero_approx() {
            continue;
        }

        let speed = linvel.length();
        let new_linvel = if linvel.dot(away) < 0. {
            -away * speed
        } else {
            away * speed
        };
        context.set_linvel(entity, new_linvel);
    }

    for (entity, max_velocity) in &clamped {
        let Some(linvel) = context.linvel(entity)
        else { continue; };

        let speed = linvel.length();
        if speed > max_velocity.max_velocity {
            context.set_linvel(entity, linvel / speed * max_velocity.max_velocity);
        }
    }
}
