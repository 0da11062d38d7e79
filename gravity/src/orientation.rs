use bevy::{math::{DQuat, DVec3}, prelude::*};
use rapier_bridge::Transform64;
use utils::IsZeroApprox as _;

use crate::player::CharacterStateComp;
use crate::sources::{GravityContribution, GravityContributions, PrimarySource};

/// How the corrector's angular speed responds to misalignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationEasing {
    /// Constant angular speed.
    Linear,
    /// Ease-out: slow near alignment, faster when far off. The field is
    /// the width of the easing parabola's latus rectum; higher values
    /// ease out more abruptly.
    Smooth { dampen: f64 },
}

impl Default for RotationEasing {
    fn default() -> Self {
        Self::Smooth { dampen: 5. }
    }
}

/// Reorients a body so its local up points away from the blended gravity
/// it is currently inside.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct OrientationCorrector {
    pub rotation_speed: f64,
    pub easing: RotationEasing,
    /// Master switch for gravity lock.
    pub gravity_lock: bool,
    /// Keep the lock whenever the body is grounded, even with no or
    /// ambiguous contributions this tick.
    pub lock_to_ground: bool,
}

impl Default for OrientationCorrector {
    fn default() -> Self {
        Self {
            rotation_speed: 5.,
            easing: RotationEasing::default(),
            gravity_lock: true,
            lock_to_ground: false,
        }
    }
}

/// Lock state derived every tick from the contribution list.
#[derive(getset::CopyGetters, Component, Debug, Default, Clone, Copy, PartialEq)]
pub struct GravityLockState {
    /// Movement follows the curved surface around the pivot when set.
    #[getset(get_copy = "pub")]
    pub(crate) locked: bool,
    /// Position of the dominant gravity source, the locomotion pivot.
    /// Keeps its last value while no source dominates.
    #[getset(get_copy = "pub")]
    pub(crate) pivot: Option<DVec3>,
}

/// Blended result of one tick's contributions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GravityBlend {
    pub average_point: DVec3,
    pub strongest_point: DVec3,
    /// False when two sources tie for the strongest pull: no unique
    /// pivot exists.
    pub unambiguous: bool,
}

pub(crate) fn blend_contributions(
    body: DVec3,
    contributions: &[GravityContribution],
) -> Option<GravityBlend> {
    if contributions.is_empty() {
        return None;
    }

    let mut average = DVec3::ZERO;
    let mut strongest = 0.;
    let mut strongest_point = DVec3::ZERO;
    let mut unambiguous = false;

    for contribution in contributions {
        let to_source = contribution.point - body;
        let direction = if to_source.is_zero_approx() {
            DVec3::ZERO
        } else {
            to_source.normalize()
        };
        average += body + direction * contribution.strength;

        if contribution.strength > strongest {
            strongest = contribution.strength;
            strongest_point = contribution.point;
            unambiguous = true;
        } else if contribution.strength == strongest {
            unambiguous = false;
        }
    }

    Some(GravityBlend {
        average_point: average / contributions.len() as f64,
        strongest_point,
        unambiguous,
    })
}

pub(crate) fn eased_rotation_speed(
    easing: RotationEasing,
    rotation_speed: f64,
    angle: f64,
) -> f64 {
    match easing {
        RotationEasing::Linear => rotation_speed,
        RotationEasing::Smooth { dampen } => {
            let remaining = (std::f64::consts::PI - angle) / std::f64::consts::PI;
            rotation_speed * (dampen - dampen * remaining * remaining)
        },
    }
}

/// Axis to rotate `from` toward `to`; parallel vectors get an arbitrary
/// perpendicular axis so an upside-down body still rights itself.
fn rotation_axis(from: DVec3, to: DVec3) -> DVec3 {
    let cross = from.cross(to);
    if cross.is_zero_approx() {
        from.any_orthonormal_vector()
    } else {
        cross.normalize()
    }
}

/// Consumes the tick's contributions: derives the lock state and rotates
/// the body toward up = away from the blended gravity, by at most the
/// per-tick angular step.
pub fn orient_to_gravity_system(
    time: Res<Time<Fixed>>,

    mut bodies: Query<(
        &OrientationCorrector, &mut GravityLockState,
        &mut GravityContributions, &mut Transform64,
        Option<&CharacterStateComp>,
    )>,
) {
    let dt = time.delta_seconds_f64();

    for (corrector, mut lock, mut contributions, mut transform, character) in &mut bodies {
        let body_pos = transform.translation;

        match blend_contributions(body_pos, &contributions.0) {
            None => {
                lock.locked = false;
            },
            Some(blend) => {
                lock.locked = blend.unambiguous;
                if blend.unambiguous {
                    lock.pivot = Some(blend.strongest_point);
                }

                let target_up = body_pos - blend.average_point;
                if !target_up.is_zero_approx() {
                    let target_up = target_up.normalize();
                    let current_up = transform.up();

                    let angle = current_up.angle_between(target_up);
                    if angle > f64::EPSILON {
                        let speed = eased_rotation_speed(
                            corrector.easing,
                            corrector.rotation_speed,
                            angle,
                        );
                        let step = (body_pos.distance(blend.average_point)
                            * dt * 0.1 * speed).to_radians();

                        let rotation = DQuat::from_axis_angle(
                            rotation_axis(current_up, target_up),
                            angle.min(step),
                        );
                        transform.rotate_around(body_pos, rotation);
                    }
                }
            },
        }

        if !corrector.gravity_lock {
            lock.locked = false;
        } else if corrector.lock_to_ground && character.is_some_and(|c| c.grounded()) {
            lock.locked = true;
        }

        if !contributions.0.is_empty() {
            contributions.0.clear();
        }
    }
}

/// Pinned bodies align to their designated source in one step and always
/// pivot around it. A despawned source falls back to free locomotion.
pub fn primary_source_orientation_system(
    source_transforms: Query<&Transform64, Without<PrimarySource>>,
    mut bodies: Query<(
        Entity, &PrimarySource, &mut Transform64, &mut GravityLockState,
    )>,
) {
    for (entity, primary, mut transform, mut lock) in &mut bodies {
        let Ok(source_transform) = source_transforms.get(primary.source)
        else {
            log::warn!(
                "Primary gravity source of {entity:?} is gone, \
                falling back to free locomotion",
            );
            lock.locked = false;
            continue;
        };
        let source_pos = source_transform.translation;

        lock.locked = true;
        lock.pivot = Some(source_pos);

        let target_up = transform.translation - source_pos;
        if target_up.is_zero_approx() {
            continue;
        }
        let target_up = target_up.normalize();
        let current_up = transform.up();

        let angle = current_up.angle_between(target_up);
        if angle > f64::EPSILON {
            let rotation = DQuat::from_axis_angle(
                rotation_axis(current_up, target_up),
                angle,
            );
            let pivot = transform.translation;
            transform.rotate_around(pivot, rotation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce as _;
    use bevy::math::dvec3;
    use smallvec::smallvec;
    use std::time::Duration;

    fn world_with_time(dt: f64) -> World {
        let mut world = World::new();
        let mut time = Time::<Fixed>::default();
        time.advance_by(Duration::from_secs_f64(dt));
        world.insert_resource(time);
        world
    }

    fn contribution(point: DVec3, strength: f64) -> GravityContribution {
        GravityContribution { point, strength }
    }

    #[test]
    fn blend_tracks_the_strongest_source() {
        let blend = blend_contributions(DVec3::ZERO, &[
            contribution(dvec3(0., -10., 0.), 5.),
            contribution(dvec3(10., 0., 0.), 3.),
        ]).unwrap();

        assert!(blend.unambiguous);
        assert_eq!(blend.strongest_point, dvec3(0., -10., 0.));
    }

    #[test]
    fn blend_averages_strength_scaled_directions() {
        let blend = blend_contributions(DVec3::ZERO, &[
            contribution(dvec3(0., -10., 0.), 5.),
        ]).unwrap();
        assert_eq!(blend.average_point, dvec3(0., -5., 0.));
    }

    #[test]
    fn tied_strengths_are_ambiguous() {
        let blend = blend_contributions(DVec3::ZERO, &[
            contribution(dvec3(0., -10., 0.), 5.),
            contribution(dvec3(10., 0., 0.), 5.),
        ]).unwrap();
        assert!(!blend.unambiguous);
    }

    #[test]
    fn smooth_easing_stalls_near_alignment() {
        let easing = RotationEasing::Smooth { dampen: 5. };
        assert_eq!(eased_rotation_speed(easing, 10., 0.), 0.);
        let far = eased_rotation_speed(easing, 10., std::f64::consts::PI);
        assert!((far - 50.).abs() < 1e-12);
        assert_eq!(eased_rotation_speed(RotationEasing::Linear, 10., 0.3), 10.);
    }

    #[test]
    fn aligned_body_locks_without_rotating() {
        let mut world = world_with_time(1. / 64.);
        let body = world.spawn((
            OrientationCorrector::default(),
            GravityLockState::default(),
            GravityContributions(smallvec![
                contribution(dvec3(0., -10., 0.), 5.),
            ]),
            Transform64::IDENTITY,
        )).id();

        world.run_system_once(orient_to_gravity_system);

        let lock = world.get::<GravityLockState>(body).unwrap();
        assert!(lock.locked());
        assert_eq!(lock.pivot(), Some(dvec3(0., -10., 0.)));
        assert_eq!(world.get::<Transform64>(body).unwrap().rotation, DQuat::IDENTITY);
        assert!(world.get::<GravityContributions>(body).unwrap().is_empty());
    }

    #[test]
    fn rotation_is_capped_by_the_per_tick_step() {
        let dt = 0.5;
        let mut world = world_with_time(dt);
        // Source above the body: target up is straight down, a half-turn
        // away.
        let body = world.spawn((
            OrientationCorrector {
                easing: RotationEasing::Linear,
                ..default()
            },
            GravityLockState::default(),
            GravityContributions(smallvec![
                contribution(dvec3(0., 10., 0.), 5.),
            ]),
            Transform64::IDENTITY,
        )).id();

        world.run_system_once(orient_to_gravity_system);

        // distance to average point 5, rotation speed 5
        let expected_step = (5. * dt * 0.1 * 5.0f64).to_radians();
        let up = world.get::<Transform64>(body).unwrap().up();
        let turned = up.angle_between(DVec3::Y);
        assert!((turned - expected_step).abs() < 1e-9, "turned {turned}");
    }

    #[test]
    fn tie_disables_lock_for_the_tick() {
        let mut world = world_with_time(1. / 64.);
        let body = world.spawn((
            OrientationCorrector::default(),
            GravityLockState::default(),
            GravityContributions(smallvec![
                contribution(dvec3(0., -10., 0.), 5.),
                contribution(dvec3(10., 0., 0.), 5.),
            ]),
            Transform64::IDENTITY,
        )).id();

        world.run_system_once(orient_to_gravity_system);

        assert!(!world.get::<GravityLockState>(body).unwrap().locked());
    }

    #[test]
    fn no_contributions_release_the_lock() {
        let mut world = world_with_time(1. / 64.);
        let body = world.spawn((
            OrientationCorrector::default(),
            GravityLockState { locked: true, pivot: Some(DVec3::ZERO) },
            GravityContributions::default(),
            Transform64::from_translation(dvec3(0., 20., 0.)),
        )).id();

        world.run_system_once(orient_to_gravity_system);

        assert!(!world.get::<GravityLockState>(body).unwrap().locked());
    }

    #[test]
    fn grounded_override_keeps_the_lock() {
        let mut world = world_with_time(1. / 64.);
        let body = world.spawn((
            OrientationCorrector {
                lock_to_ground: true,
                ..default()
            },
            GravityLockState { locked: true, pivot: Some(DVec3::ZERO) },
            GravityContributions::default(),
            Transform64::from_translation(dvec3(0., 20., 0.)),
            CharacterStateComp {
                grounded: true,
                ..default()
            },
        )).id();

        world.run_system_once(orient_to_gravity_system);

        assert!(world.get::<GravityLockState>(body).unwrap().locked());
    }
}
