use super::*;

use std::time::Instant;

use bevy::{diagnostic::Diagnostics, math::DVec3, prelude::*};
use itertools::Itertools as _;
use rapier_bridge::{ColliderMassComp, ExternalForceComp, Transform64};
use utils::Vec3Ext as _;

use crate::GRAVITY_COMPUTE_SYSTEM_DURATION;

/// Mirrors `Attractor` component add/remove into the registry.
pub fn register_attractors_system(
    mut registry: ResMut<AttractorRegistry>,

    added: Query<Entity, Added<Attractor>>,
    mut removed: RemovedComponents<Attractor>,
) {
    for entity in &added {
        registry.register(entity);
    }
    for entity in removed.read() {
        registry.unregister(entity);
    }
}

pub fn sync_attractor_masses_system(
    mut query: Query<(
        &ColliderMassComp, &mut Massive,
    ), (
        Changed<ColliderMassComp>,
    )>,
) {
    for (collider_mass, mut massive) in &mut query {
        let &ColliderMassComp { mass } = collider_mass;
        massive.mass = mass;
    }
}

pub fn reconcile_density_system(
    cfg: Res<GravityConfig>,

    mut attractors: Query<(
        &mut DensityComp, &mut Massive, &mut Transform64,
        Option<&mut ColliderMassComp>,
    ), With<Attractor>>,
) {
    for (mut density_comp, mut massive, mut transform, collider_mass) in &mut attractors {
        let volume = (transform.scale.mean_axis_abs() * cfg.meters_per_unit)
            .max(cfg.min_volume);

        let DensityComp { density, lock_density, last } = *density_comp;
        let (action, next) = reconcile(last, density, massive.mass, volume, lock_density);

        match action {
            ReconcileAction::None => {},
            ReconcileAction::SetMass(mass) => {
                massive.mass = mass;
                if let Some(mut collider_mass) = collider_mass {
                    collider_mass.mass = mass;
                }
            },
            ReconcileAction::SetDensity(new_density) => {
                density_comp.density = new_density;
            },
            ReconcileAction::ScaleBy(factor) => {
                transform.scale *= factor;
            },
        }

        if density_comp.last != next {
            density_comp.last = next;
        }
    }
}

/// Force accumulators start every tick empty; impulses are left alone as
/// the bridge clears them itself once applied.
pub fn reset_forces_system(
    mut accumulators: Query<&mut ExternalForceComp>,
) {
    for mut accumulator in &mut accumulators {
        if accumulator.force != DVec3::ZERO {
            accumulator.force = DVec3::ZERO;
        }
    }
}

struct AttractorSnapshot {
    entity: Entity,
    position: DVec3,
    mass: f64,
    g_multiplier: f64,
}

/// Pairwise pass over the registry. Each unordered pair is visited once
/// and both sides receive the force, so the aggregate is exactly
/// Newtonian whenever the pair's multipliers agree.
pub fn nbody_attraction_system(
    mut diagnostics: Diagnostics,
    cfg: Res<GravityConfig>,
    registry: Res<AttractorRegistry>,

    mut bodies: Query<(&Transform64, &Massive, &Attractor, &mut ExternalForceComp)>,
) {
    let start = Instant::now();

    // Frozen membership: spawns and despawns commanded mid-pass only land
    // on the registry next tick.
    let snapshot = registry.snapshot().into_iter()
        .filter_map(|entity| {
            let (transform, massive, attractor, _) = bodies.get(entity).ok()?;
            Some(AttractorSnapshot {
                entity,
                position: transform.translation,
                mass: massive.mass,
                g_multiplier: attractor.g_multiplier,
            })
        })
        .collect::<Vec<_>>();

    let mut forces = vec![DVec3::ZERO; snapshot.len()];

    for ((i, a), (j, b)) in snapshot.iter().enumerate().tuple_combinations() {
        let diff = a.position - b.position;
        let distance = diff.length() * cfg.meters_per_unit;
        if distance < cfg.min_pair_distance {
            continue;
        }

        let direction = diff / diff.length();
        let shared = cfg.gravity_constant * cfg.gravity_multiplier
            * a.mass * b.mass / (distance * distance);

        // Each attractor pulls the other with its own multiplier.
        forces[j] += direction * shared * a.g_multiplier;
        forces[i] -= direction * shared * b.g_multiplier;
    }

    for (snap, force) in snapshot.iter().zip(&forces) {
        let Ok((.., mut accumulator)) = bodies.get_mut(snap.entity)
        else { continue; };
        accumulator.force += *force;
    }

    diagnostics.add_measurement(
        &GRAVITY_COMPUTE_SYSTEM_DURATION,
        || start.elapsed().as_secs_f64() * 1000.,
    );
}
