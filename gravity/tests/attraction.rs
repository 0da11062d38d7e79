use bevy::diagnostic::DiagnosticsStore;
use bevy::ecs::system::RunSystemOnce as _;
use bevy::math::{dvec3, DVec3};
use bevy::prelude::*;

use gravity::*;
use rapier_bridge::{ExternalForceComp, Transform64};

fn gravity_world() -> World {
    let mut world = World::new();
    world.init_resource::<GravityConfig>();
    world.init_resource::<AttractorRegistry>();
    world.init_resource::<DiagnosticsStore>();
    world
}

fn spawn_attractor(world: &mut World, position: DVec3, mass: f64) -> Entity {
    world.spawn((
        Transform64::from_translation(position),
        Massive { mass },
        Attractor::default(),
        ExternalForceComp::default(),
    )).id()
}

fn run_attraction_pass(world: &mut World) {
    world.run_system_once(register_attractors_system);
    world.run_system_once(reset_forces_system);
    world.run_system_once(nbody_attraction_system);
}

fn force_of(world: &World, entity: Entity) -> DVec3 {
    world.get::<ExternalForceComp>(entity).unwrap().force
}

#[test]
fn pair_forces_follow_the_inverse_square_law() {
    let mut world = gravity_world();
    let first = spawn_attractor(&mut world, DVec3::ZERO, 10.);
    let second = spawn_attractor(&mut world, dvec3(10., 0., 0.), 20.);

    run_attraction_pass(&mut world);

    let expected = 6.674_08e-11 * 10. * 20. / (10. * 10.);

    let on_first = force_of(&world, first);
    assert!((on_first.length() - expected).abs() < 1e-24, "{}", on_first.length());
    assert!(on_first.x > 0., "first body must be pulled toward the second");

    let on_second = force_of(&world, second);
    assert!(on_second.x < 0., "second body must be pulled toward the first");
}

#[test]
fn pair_forces_are_equal_and_opposite() {
    let mut world = gravity_world();
    let first = spawn_attractor(&mut world, DVec3::ZERO, 3.0e5);
    let second = spawn_attractor(&mut world, dvec3(2., 5., -1.), 7.0e4);

    run_attraction_pass(&mut world);

    let net = force_of(&world, first) + force_of(&world, second);
    assert_eq!(net, DVec3::ZERO);
}

#[test]
fn aggregate_momentum_stays_zero_with_many_attractors() {
    let mut world = gravity_world();
    let bodies = [
        spawn_attractor(&mut world, dvec3(0., 0., 0.), 1.0e6),
        spawn_attractor(&mut world, dvec3(13., -2., 4.), 2.5e5),
        spawn_attractor(&mut world, dvec3(-7., 9., 1.), 8.0e5),
        spawn_attractor(&mut world, dvec3(3., 3., -11.), 4.2e4),
    ];

    run_attraction_pass(&mut world);

    let net: DVec3 = bodies.iter().map(|&body| force_of(&world, body)).sum();
    assert!(net.length() < 1e-18, "net force {net}");
}

#[test]
fn coincident_attractors_are_skipped() {
    let mut world = gravity_world();
    let first = spawn_attractor(&mut world, dvec3(1., 1., 1.), 10.);
    let second = spawn_attractor(&mut world, dvec3(1., 1., 1.), 20.);

    run_attraction_pass(&mut world);

    assert_eq!(force_of(&world, first), DVec3::ZERO);
    assert_eq!(force_of(&world, second), DVec3::ZERO);
}

#[test]
fn meters_per_unit_rescales_distances() {
    let mut world = gravity_world();
    world.resource_mut::<GravityConfig>().meters_per_unit = 2.;
    let first = spawn_attractor(&mut world, DVec3::ZERO, 10.);
    let _ = spawn_attractor(&mut world, dvec3(10., 0., 0.), 20.);

    run_attraction_pass(&mut world);

    let expected = 6.674_08e-11 * 10. * 20. / (20. * 20.);
    assert!((force_of(&world, first).length() - expected).abs() < 1e-24);
}

#[test]
fn forces_do_not_accumulate_across_ticks() {
    let mut world = gravity_world();
    let first = spawn_attractor(&mut world, DVec3::ZERO, 10.);
    let _ = spawn_attractor(&mut world, dvec3(10., 0., 0.), 20.);

    run_attraction_pass(&mut world);
    let once = force_of(&world, first);
    run_attraction_pass(&mut world);
    assert_eq!(force_of(&world, first), once);
}

#[test]
fn despawned_attractors_leave_the_registry() {
    let mut world = gravity_world();
    let first = spawn_attractor(&mut world, DVec3::ZERO, 10.);
    let second = spawn_attractor(&mut world, dvec3(10., 0., 0.), 20.);

    run_attraction_pass(&mut world);
    assert_eq!(world.resource::<AttractorRegistry>().len(), 2);

    world.despawn(second);
    run_attraction_pass(&mut world);

    assert_eq!(world.resource::<AttractorRegistry>().len(), 1);
    assert_eq!(force_of(&world, first), DVec3::ZERO);
}

#[test]
fn density_edit_drives_mass_through_the_system() {
    let mut world = gravity_world();
    let body = world.spawn((
        Transform64::from_translation(DVec3::ZERO).with_scale(DVec3::splat(3.)),
        Massive { mass: 3. },
        Attractor::default(),
        DensityComp::new(1., false),
        ExternalForceComp::default(),
    )).id();

    // First pass seeds the snapshots without touching anything.
    world.run_system_once(reconcile_density_system);
    assert_eq!(world.get::<Massive>(body).unwrap().mass, 3.);

    world.get_mut::<DensityComp>(body).unwrap().density = 2.;
    world.run_system_once(reconcile_density_system);
    assert_eq!(world.get::<Massive>(body).unwrap().mass, 6.);

    // No external edits: a second pass changes nothing further.
    world.run_system_once(reconcile_density_system);
    assert_eq!(world.get::<Massive>(body).unwrap().mass, 6.);
    assert_eq!(world.get::<DensityComp>(body).unwrap().density, 2.);
}

#[test]
fn unlocked_mass_edit_floats_density_through_the_system() {
    let mut world = gravity_world();
    let body = world.spawn((
        Transform64::from_translation(DVec3::ZERO).with_scale(DVec3::splat(3.)),
        Massive { mass: 3. },
        Attractor::default(),
        DensityComp::new(1., false),
        ExternalForceComp::default(),
    )).id();

    world.run_system_once(reconcile_density_system);
    world.get_mut::<Massive>(body).unwrap().mass = 9.;
    world.run_system_once(reconcile_density_system);

    assert_eq!(world.get::<DensityComp>(body).unwrap().density, 3.);
}

#[test]
fn locked_mass_edit_resizes_until_consistent() {
    let mut world = gravity_world();
    let body = world.spawn((
        Transform64::from_translation(DVec3::ZERO).with_scale(DVec3::splat(2.)),
        Massive { mass: 2. },
        Attractor::default(),
        DensityComp::new(1., true),
        ExternalForceComp::default(),
    )).id();

    world.run_system_once(reconcile_density_system);
    world.get_mut::<Massive>(body).unwrap().mass = 4.;
    world.run_system_once(reconcile_density_system);

    // The mass edit resized the body by the mass ratio.
    let scale = world.get::<Transform64>(body).unwrap().scale;
    assert_eq!(scale, DVec3::splat(4.));

    // The follow-up pass recomputes mass from the locked density and the
    // new volume, landing exactly on the edited mass.
    world.run_system_once(reconcile_density_system);
    let mass = world.get::<Massive>(body).unwrap().mass;
    let density = world.get::<DensityComp>(body).unwrap().density;
    assert_eq!(mass, 4.);
    assert_eq!(density, 1.);
    assert_eq!(density * 4., mass);
}
