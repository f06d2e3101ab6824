use phys_dynamics::collision::CollisionCategory;
use phys_dynamics::core::{BodyEvent, BodyEventType, ContactEvent, ContactEventType};
use phys_dynamics::integration::Integrator;
use phys_dynamics::math::{Quaternion, Transform, Vector3};
use phys_dynamics::shapes::{BoxShape, CollisionShape, Sphere};
use phys_dynamics::{
    BodyHandle, DynamicsConfig, DynamicsWorld, Material, PhysicsError, RigidBodyType,
};
use approx::assert_relative_eq;
use std::sync::Arc;

const DT: f32 = 1.0 / 60.0;

fn ground(world: &mut DynamicsWorld) -> BodyHandle {
    world.create_static_body(
        Transform::from_position(Vector3::new(0.0, -0.5, 0.0)),
        Arc::new(BoxShape::new(Vector3::new(20.0, 0.5, 20.0))),
    )
}

fn sphere(world: &mut DynamicsWorld, position: Vector3, radius: f32, mass: f32) -> BodyHandle {
    let shape = Sphere::new(radius);
    let inertia = shape.local_inertia_tensor(mass);
    world
        .create_rigid_body(Transform::from_position(position), mass, inertia, Arc::new(shape))
        .unwrap()
}

/// Steps the world, reading the events of every step before the next one drops them
fn step_collecting_events(
    world: &mut DynamicsWorld,
    steps: usize,
) -> (Vec<BodyEvent>, Vec<ContactEvent>) {
    let mut body_events = Vec::new();
    let mut contact_events = Vec::new();
    for _ in 0..steps {
        world.step().unwrap();
        body_events.extend(world.events_mut().drain_body_events());
        contact_events.extend(world.events_mut().drain_contact_events());
    }
    (body_events, contact_events)
}

fn weightless_world() -> DynamicsWorld {
    let mut world = DynamicsWorld::new();
    world.set_is_gravity_on(false);
    world
}

fn step_n(world: &mut DynamicsWorld, steps: usize) {
    for _ in 0..steps {
        world.step().unwrap();
    }
}

#[test]
fn test_pure_integration_without_forces() {
    let mut world = weightless_world();
    let start = Vector3::new(1.0, 2.0, 3.0);
    let velocity = Vector3::new(1.0, -2.0, 0.5);
    let handle = sphere(&mut world, start, 0.5, 1.0);
    world.rigid_body_mut(handle).unwrap().set_linear_velocity(velocity);

    step_n(&mut world, 10);

    let body = world.rigid_body(handle).unwrap();
    assert_relative_eq!(body.get_position(), start + velocity * (10.0 * DT), epsilon = 1e-5);
    assert_relative_eq!(body.get_linear_velocity(), velocity);
}

#[test]
fn test_free_fall_matches_semi_implicit_euler() {
    let mut world = DynamicsWorld::new();
    let handle = sphere(&mut world, Vector3::new(0.0, 100.0, 0.0), 0.5, 2.0);

    let steps = 30;
    step_n(&mut world, steps);

    let g = world.get_gravity().y;
    let n = steps as f32;
    let body = world.rigid_body(handle).unwrap();
    assert_relative_eq!(body.get_linear_velocity().y, g * DT * n, epsilon = 1e-4);
    assert_relative_eq!(
        body.get_position().y,
        100.0 + g * DT * DT * n * (n + 1.0) * 0.5,
        epsilon = 1e-3
    );
}

#[test]
fn test_body_without_gravity_flag_floats() {
    let mut world = DynamicsWorld::new();
    let handle = sphere(&mut world, Vector3::new(0.0, 10.0, 0.0), 0.5, 1.0);
    world.rigid_body_mut(handle).unwrap().enable_gravity(false);

    step_n(&mut world, 20);
    assert_relative_eq!(world.rigid_body(handle).unwrap().get_position().y, 10.0);
}

#[test]
fn test_spheres_come_to_rest_on_ground() {
    let mut world = DynamicsWorld::new();
    world.set_is_deactivation_active(false);
    ground(&mut world);
    let lower = sphere(&mut world, Vector3::new(0.0, 0.48, 0.0), 0.5, 1.0);
    let upper = sphere(&mut world, Vector3::new(0.0, 1.45, 0.0), 0.5, 1.0);

    step_n(&mut world, 300);

    let lower_body = world.rigid_body(lower).unwrap();
    let upper_body = world.rigid_body(upper).unwrap();
    assert!(lower_body.get_linear_velocity().length() < 0.05);
    assert!(upper_body.get_linear_velocity().length() < 0.05);
    assert!((lower_body.get_position().y - 0.5).abs() < 0.03);
    assert!((upper_body.get_position().y - lower_body.get_position().y - 1.0).abs() < 0.03);

    for (_, manifold) in world.contact_manifolds() {
        for point in manifold.points() {
            assert!(point.penetration_depth < 0.03, "depth {}", point.penetration_depth);
        }
    }
    assert_eq!(world.nb_contact_manifolds(), 2);
}

#[test]
fn test_box_does_not_fall_through_ground() {
    for center_friction in [true, false] {
        let mut world = DynamicsWorld::new();
        world.set_is_solve_friction_at_contact_manifold_center_active(center_friction);
        ground(&mut world);
        let shape = BoxShape::new(Vector3::splat(0.5));
        let inertia = shape.local_inertia_tensor(1.0);
        let handle = world
            .create_rigid_body(
                Transform::from_position(Vector3::new(0.0, 1.0, 0.0)),
                1.0,
                inertia,
                Arc::new(shape),
            )
            .unwrap();

        step_n(&mut world, 240);

        let body = world.rigid_body(handle).unwrap();
        assert!(body.get_position().y > 0.3, "box sank to {}", body.get_position());
        assert!(body.get_position().y < 1.0, "box jumped to {}", body.get_position());
        assert!(body.get_linear_velocity().length() < 0.2);
    }
}

#[test]
fn test_resting_without_split_impulse() {
    let mut world = DynamicsWorld::new();
    world.set_is_split_impulse_active(false);
    world.set_is_deactivation_active(false);
    ground(&mut world);
    let handle = sphere(&mut world, Vector3::new(0.0, 0.6, 0.0), 0.5, 1.0);

    step_n(&mut world, 240);

    let body = world.rigid_body(handle).unwrap();
    assert!((body.get_position().y - 0.5).abs() < 0.03);
    assert!(body.get_linear_velocity().length() < 0.05);
}

#[test]
fn test_restitution_bounces() {
    let mut world = DynamicsWorld::new();
    let floor = ground(&mut world);
    world.rigid_body_mut(floor).unwrap().set_material(Material::new(1.0, 0.3));
    let ball = sphere(&mut world, Vector3::new(0.0, 3.0, 0.0), 0.5, 1.0);
    world.rigid_body_mut(ball).unwrap().set_material(Material::new(0.9, 0.3));

    let mut max_upward = 0.0f32;
    for _ in 0..120 {
        world.step().unwrap();
        max_upward = max_upward.max(world.rigid_body(ball).unwrap().get_linear_velocity().y);
    }
    assert!(max_upward > 3.0, "ball bounced at {}", max_upward);
}

#[test]
fn test_linear_damping() {
    let mut world = weightless_world();
    let handle = sphere(&mut world, Vector3::zero(), 0.5, 1.0);
    {
        let body = world.rigid_body_mut(handle).unwrap();
        body.set_linear_velocity(Vector3::new(10.0, 0.0, 0.0));
        body.set_linear_damping(1.0);
    }

    step_n(&mut world, 60);

    let expected = 10.0 * (1.0 / (1.0 + DT)).powi(60);
    assert_relative_eq!(
        world.rigid_body(handle).unwrap().get_linear_velocity().x,
        expected,
        epsilon = 1e-3
    );
}

#[test]
fn test_external_force_applies_for_one_step() {
    let mut world = weightless_world();
    let handle = sphere(&mut world, Vector3::zero(), 0.5, 2.0);
    world
        .rigid_body_mut(handle)
        .unwrap()
        .apply_force_to_center(Vector3::new(4.0, 0.0, 0.0));

    world.step().unwrap();
    let body = world.rigid_body(handle).unwrap();
    assert_relative_eq!(body.get_linear_velocity().x, 2.0 * DT, epsilon = 1e-6);
    assert!(body.get_external_force().is_zero());

    world.step().unwrap();
    assert_relative_eq!(
        world.rigid_body(handle).unwrap().get_linear_velocity().x,
        2.0 * DT,
        epsilon = 1e-6
    );
}

#[test]
fn test_torque_spins_body() {
    let mut world = weightless_world();
    let handle = sphere(&mut world, Vector3::zero(), 1.0, 1.0);
    world
        .rigid_body_mut(handle)
        .unwrap()
        .apply_torque(Vector3::new(0.0, 0.4, 0.0));

    world.step().unwrap();
    // I = 0.4 m r² = 0.4
    assert_relative_eq!(
        world.rigid_body(handle).unwrap().get_angular_velocity(),
        Vector3::new(0.0, DT, 0.0),
        epsilon = 1e-6
    );
}

#[test]
fn test_static_body_never_moves() {
    let mut world = DynamicsWorld::new();
    let floor = ground(&mut world);
    sphere(&mut world, Vector3::new(0.0, 2.0, 0.0), 0.5, 10.0);
    world
        .rigid_body_mut(floor)
        .unwrap()
        .set_linear_velocity(Vector3::new(1.0, 0.0, 0.0));

    step_n(&mut world, 120);

    let body = world.rigid_body(floor).unwrap();
    assert_eq!(body.get_body_type(), RigidBodyType::Static);
    assert_eq!(body.get_position(), Vector3::new(0.0, -0.5, 0.0));
    assert!(body.get_linear_velocity().is_zero());
}

#[test]
fn test_kinematic_body_pushes_dynamic_body() {
    let mut world = weightless_world();
    let pusher = world.create_kinematic_body(
        Transform::from_position(Vector3::new(-3.0, 0.0, 0.0)),
        Arc::new(BoxShape::new(Vector3::splat(0.5))),
    );
    world
        .rigid_body_mut(pusher)
        .unwrap()
        .set_linear_velocity(Vector3::new(2.0, 0.0, 0.0));
    let ball = sphere(&mut world, Vector3::zero(), 0.5, 1.0);

    step_n(&mut world, 90);

    let pusher_body = world.rigid_body(pusher).unwrap();
    assert_relative_eq!(pusher_body.get_position().x, 0.0, epsilon = 1e-3);
    assert_relative_eq!(pusher_body.get_linear_velocity(), Vector3::new(2.0, 0.0, 0.0));
    assert!(world.rigid_body(ball).unwrap().get_linear_velocity().x > 1.0);
    assert!(world.rigid_body(ball).unwrap().get_position().x > 0.5);
}

#[test]
fn test_collision_mask_lets_body_fall_through() {
    let mut world = DynamicsWorld::new();
    ground(&mut world);
    let ghost = sphere(&mut world, Vector3::new(0.0, 1.0, 0.0), 0.5, 1.0);
    world
        .rigid_body_mut(ghost)
        .unwrap()
        .set_collision_filter(CollisionCategory::DEBRIS, CollisionCategory::DYNAMIC);

    step_n(&mut world, 90);

    assert!(world.rigid_body(ghost).unwrap().get_position().y < -1.0);
    assert_eq!(world.nb_overlapping_pairs(), 0);
}

#[test]
fn test_resting_body_falls_asleep_and_wakes_up() {
    let mut world = DynamicsWorld::new();
    ground(&mut world);
    let handle = sphere(&mut world, Vector3::new(0.0, 0.5, 0.0), 0.5, 1.0);
    world.events_mut().clear();

    let (body_events, _) = step_collecting_events(&mut world, 300);

    assert!(world.rigid_body(handle).unwrap().is_sleeping());
    assert_eq!(world.active_bodies().count(), 1);
    let slept = body_events
        .iter()
        .filter(|event| event.event_type == BodyEventType::Sleep && event.body == handle)
        .count();
    assert_eq!(slept, 1);

    let position = world.rigid_body(handle).unwrap().get_position();
    step_n(&mut world, 10);
    assert_eq!(world.rigid_body(handle).unwrap().get_position(), position);

    world
        .rigid_body_mut(handle)
        .unwrap()
        .set_linear_velocity(Vector3::new(1.0, 0.0, 0.0));
    assert!(!world.rigid_body(handle).unwrap().is_sleeping());
    world.step().unwrap();
    assert!(world.rigid_body(handle).unwrap().get_position().x > position.x);
}

#[test]
fn test_body_nudged_every_frame_still_falls_asleep() {
    let mut world = DynamicsWorld::new();
    ground(&mut world);
    let handle = sphere(&mut world, Vector3::new(0.0, 0.5, 0.0), 0.5, 1.0);

    let mut slept = false;
    for _ in 0..300 {
        world
            .rigid_body_mut(handle)
            .unwrap()
            .apply_force_to_center(Vector3::new(0.0, -1.0e-3, 0.0));
        world.step().unwrap();
        slept |= world
            .events_mut()
            .drain_body_events()
            .any(|event| event.event_type == BodyEventType::Sleep && event.body == handle);
    }
    assert!(slept);
}

#[test]
fn test_falling_body_wakes_sleeping_body() {
    let mut world = DynamicsWorld::new();
    ground(&mut world);
    let sleeper = sphere(&mut world, Vector3::new(0.0, 0.5, 0.0), 0.5, 1.0);
    step_n(&mut world, 300);
    assert!(world.rigid_body(sleeper).unwrap().is_sleeping());
    world.events_mut().clear();

    sphere(&mut world, Vector3::new(0.0, 2.0, 0.0), 0.5, 1.0);
    let (body_events, _) = step_collecting_events(&mut world, 60);

    let woken = body_events
        .iter()
        .any(|event| event.event_type == BodyEventType::Awake && event.body == sleeper);
    assert!(woken);
}

#[test]
fn test_deactivation_off_keeps_bodies_awake() {
    let mut world = DynamicsWorld::new();
    world.set_is_deactivation_active(false);
    ground(&mut world);
    let handle = sphere(&mut world, Vector3::new(0.0, 0.5, 0.0), 0.5, 1.0);

    step_n(&mut world, 300);
    assert!(!world.rigid_body(handle).unwrap().is_sleeping());
}

#[test]
fn test_contact_events() {
    let mut world = DynamicsWorld::new();
    let floor = ground(&mut world);
    let ball = sphere(&mut world, Vector3::new(0.0, 0.5, 0.0), 0.5, 1.0);

    let added: Vec<BodyHandle> = world
        .events_mut()
        .drain_body_events()
        .filter(|event| event.event_type == BodyEventType::Added)
        .map(|event| event.body)
        .collect();
    assert_eq!(added, vec![floor, ball]);

    let (_, contact_events) = step_collecting_events(&mut world, 60);
    let begin = contact_events[0];
    assert_eq!(begin.event_type, ContactEventType::Begin);
    assert!(begin.pair.contains(floor) && begin.pair.contains(ball));

    world.events_mut().clear();
    world.destroy_rigid_body(ball).unwrap();
    let end = world.events_mut().next_contact_event().unwrap();
    assert_eq!(end.event_type, ContactEventType::End);
    let removed = world.events_mut().next_body_event().unwrap();
    assert_eq!(removed.event_type, BodyEventType::Removed);
    assert_eq!(removed.body, ball);
    assert_eq!(world.nb_contact_manifolds(), 0);
}

#[test]
fn test_invalid_mass_is_rejected() {
    let mut world = DynamicsWorld::new();
    let shape: Arc<dyn CollisionShape> = Arc::new(Sphere::new(1.0));
    for mass in [0.0, -1.0, f32::NAN, f32::INFINITY] {
        let result = world.create_rigid_body(
            Transform::identity(),
            mass,
            shape.local_inertia_tensor(1.0),
            shape.clone(),
        );
        assert!(matches!(result, Err(PhysicsError::InvalidParameter(_))), "mass {}", mass);
    }
    assert_eq!(world.nb_rigid_bodies(), 0);
}

#[test]
fn test_stale_handles_are_rejected() {
    let mut world = DynamicsWorld::new();
    let old = sphere(&mut world, Vector3::zero(), 0.5, 1.0);
    world.destroy_rigid_body(old).unwrap();

    let new = sphere(&mut world, Vector3::zero(), 0.5, 1.0);
    assert_ne!(old, new);
    assert!(matches!(world.rigid_body(old), Err(PhysicsError::ResourceNotFound(_))));
    assert!(matches!(
        world.destroy_rigid_body(old),
        Err(PhysicsError::ResourceNotFound(_))
    ));
    assert!(world.rigid_body(new).is_ok());
    assert_eq!(world.rigid_bodies().count(), 1);
}

#[test]
fn test_configuration_errors() {
    let mut world = DynamicsWorld::new();
    assert!(matches!(
        world.set_nb_iterations_solver(0),
        Err(PhysicsError::InvalidParameter(_))
    ));
    assert!(world.set_time_step(0.0).is_err());
    assert!(world.set_time_step(-1.0).is_err());
    assert!(world.set_gravity(Vector3::new(0.0, f32::NAN, 0.0)).is_err());
    assert_eq!(world.config(), &DynamicsConfig::default());

    world.set_nb_iterations_solver(4).unwrap();
    assert_eq!(world.config().nb_iterations_solver, 4);

    world.config_mut().nb_iterations_solver = 0;
    assert!(matches!(world.step(), Err(PhysicsError::InvalidParameter(_))));
    assert_eq!(world.timer().get_nb_steps(), 0);
}

#[test]
fn test_update_runs_whole_steps_and_interpolates() {
    let mut world = weightless_world();
    let handle = sphere(&mut world, Vector3::zero(), 0.5, 1.0);
    world
        .rigid_body_mut(handle)
        .unwrap()
        .set_linear_velocity(Vector3::new(1.0, 0.0, 0.0));

    world.update(0.04).unwrap();
    assert_eq!(world.timer().get_nb_steps(), 2);

    let body = world.rigid_body(handle).unwrap();
    assert_relative_eq!(body.get_interpolation_factor(), 0.4, epsilon = 1e-3);
    assert_relative_eq!(body.get_position().x, 2.0 * DT, epsilon = 1e-5);
    assert_relative_eq!(
        body.get_interpolated_transform().position.x,
        1.4 * DT,
        epsilon = 1e-4
    );
}

#[test]
fn test_update_drops_backlog_beyond_max_substeps() {
    let mut world = weightless_world();
    world.update(1.0).unwrap();
    assert_eq!(world.timer().get_nb_steps(), world.config().max_substeps as u64);
    assert!(world.timer().interpolation_factor() < 1.0);
}

#[test]
fn test_rotating_body_keeps_unit_orientation() {
    let mut world = weightless_world();
    let shape = BoxShape::new(Vector3::new(1.0, 0.2, 0.5));
    let inertia = shape.local_inertia_tensor(3.0);
    let handle = world
        .create_rigid_body(
            Transform::new(Vector3::zero(), Quaternion::from_axis_angle(Vector3::unit_x(), 0.3)),
            3.0,
            inertia,
            Arc::new(shape),
        )
        .unwrap();
    world
        .rigid_body_mut(handle)
        .unwrap()
        .set_angular_velocity(Vector3::new(1.0, 4.0, -2.0));

    step_n(&mut world, 200);
    assert_relative_eq!(
        world.rigid_body(handle).unwrap().get_orientation().length(),
        1.0,
        epsilon = 1e-4
    );
}

fn build_scene(world: &mut DynamicsWorld) -> Vec<BodyHandle> {
    ground(world);
    let mut handles = Vec::new();
    for i in 0..4 {
        let shape = BoxShape::new(Vector3::new(0.5, 0.25, 0.5));
        let inertia = shape.local_inertia_tensor(1.0);
        let transform = Transform::new(
            Vector3::new(0.05 * i as f32, 0.3 + 0.55 * i as f32, 0.0),
            Quaternion::from_axis_angle(Vector3::unit_y(), 0.1 * i as f32),
        );
        handles.push(world.create_rigid_body(transform, 1.0, inertia, Arc::new(shape)).unwrap());
    }
    handles.push(sphere(world, Vector3::new(0.2, 4.0, 0.1), 0.4, 2.0));
    handles
}

#[test]
fn test_identical_runs_are_bit_identical() {
    let mut first = DynamicsWorld::new();
    let mut second = DynamicsWorld::new();
    let handles1 = build_scene(&mut first);
    let handles2 = build_scene(&mut second);

    for _ in 0..200 {
        first.step().unwrap();
        second.step().unwrap();
    }

    for (h1, h2) in handles1.iter().zip(&handles2) {
        let b1 = first.rigid_body(*h1).unwrap();
        let b2 = second.rigid_body(*h2).unwrap();
        assert_eq!(b1.get_transform(), b2.get_transform());
        assert_eq!(b1.get_linear_velocity(), b2.get_linear_velocity());
        assert_eq!(b1.get_angular_velocity(), b2.get_angular_velocity());
    }
}

#[test]
fn test_material_presets_and_mixing() {
    for material in [Material::ice(), Material::rubber(), Material::wood(), Material::default()] {
        assert!(material.is_valid());
    }
    assert!(!Material::new(1.5, 0.3).is_valid());
    assert!(!Material::new(0.5, -0.1).is_valid());

    let (a, b) = (Material::new(0.2, 0.25), Material::new(0.7, 1.0));
    assert_relative_eq!(Material::mix_restitution(&a, &b), 0.7);
    assert_relative_eq!(Material::mix_friction(&a, &b), 0.5);
}

#[test]
fn test_off_center_force_adds_torque() {
    let mut world = weightless_world();
    let shape = Sphere::new(1.0);
    let handle = sphere(&mut world, Vector3::zero(), 1.0, 1.0);
    assert_relative_eq!(world.rigid_body(handle).unwrap().get_mass(), 1.0);
    assert_relative_eq!(
        world.rigid_body(handle).unwrap().get_local_inertia_tensor(),
        shape.local_inertia_tensor(1.0)
    );

    world
        .rigid_body_mut(handle)
        .unwrap()
        .apply_force(Vector3::new(0.0, 0.0, 1.0), Vector3::new(1.0, 0.0, 0.0));
    let body = world.rigid_body(handle).unwrap();
    assert_relative_eq!(body.get_external_torque(), Vector3::new(0.0, -1.0, 0.0));

    world.step().unwrap();
    let body = world.rigid_body(handle).unwrap();
    assert_relative_eq!(body.get_linear_velocity(), Vector3::new(0.0, 0.0, DT), epsilon = 1e-6);
    assert_relative_eq!(body.get_angular_velocity(), Vector3::new(0.0, -DT / 0.4, 0.0), epsilon = 1e-5);
}

#[test]
fn test_angular_damping() {
    let mut world = weightless_world();
    let handle = sphere(&mut world, Vector3::zero(), 0.5, 1.0);
    {
        let body = world.rigid_body_mut(handle).unwrap();
        body.set_angular_velocity(Vector3::new(0.0, 0.0, 5.0));
        body.set_angular_damping(2.0);
    }

    step_n(&mut world, 30);

    let expected = 5.0 * (1.0 / (1.0 + 2.0 * DT)).powi(30);
    assert_relative_eq!(
        world.rigid_body(handle).unwrap().get_angular_velocity().z,
        expected,
        epsilon = 1e-3
    );
}

#[test]
fn test_teleport_wakes_body_and_updates_contacts() {
    let mut world = DynamicsWorld::new();
    ground(&mut world);
    let handle = sphere(&mut world, Vector3::new(0.0, 0.5, 0.0), 0.5, 1.0);
    step_n(&mut world, 300);
    assert!(world.rigid_body(handle).unwrap().is_sleeping());
    assert_eq!(world.nb_contact_manifolds(), 1);

    world
        .rigid_body_mut(handle)
        .unwrap()
        .set_transform(Transform::from_position(Vector3::new(0.0, 5.0, 0.0)));
    assert!(!world.rigid_body(handle).unwrap().is_sleeping());

    world.step().unwrap();
    assert_eq!(world.nb_contact_manifolds(), 0);
    assert!(world.rigid_body(handle).unwrap().get_position().y < 5.0);
}

#[test]
fn test_body_not_allowed_to_sleep_stays_awake() {
    let mut world = DynamicsWorld::new();
    ground(&mut world);
    let handle = sphere(&mut world, Vector3::new(0.0, 0.5, 0.0), 0.5, 1.0);
    world.rigid_body_mut(handle).unwrap().set_is_allowed_to_sleep(false);

    step_n(&mut world, 300);
    assert!(!world.rigid_body(handle).unwrap().is_sleeping());
    assert!(!world.rigid_body(handle).unwrap().is_allowed_to_sleep());
}

#[test]
fn test_solver_toggles_still_rest() {
    let toggles: [(bool, bool); 3] = [(false, true), (true, false), (false, false)];
    for (warm_starting, error_correction) in toggles {
        let mut world = DynamicsWorld::new();
        world.set_is_warm_starting_active(warm_starting);
        world.set_is_error_correction_active(error_correction);
        world.set_is_deactivation_active(false);
        ground(&mut world);
        let handle = sphere(&mut world, Vector3::new(0.0, 0.55, 0.0), 0.5, 1.0);

        step_n(&mut world, 180);

        let body = world.rigid_body(handle).unwrap();
        assert!(body.get_position().y > 0.3, "sank to {}", body.get_position());
        assert!(body.get_linear_velocity().length() < 0.1);
    }
}

#[derive(Debug)]
struct FrozenIntegrator;

impl Integrator for FrozenIntegrator {
    fn integrate(&self, transform: &Transform, _: Vector3, _: Vector3, _: f32) -> Transform {
        *transform
    }

    fn name(&self) -> &str {
        "Frozen"
    }
}

#[test]
fn test_custom_integrator_is_used() {
    let mut world = DynamicsWorld::new();
    world.set_integrator(Box::new(FrozenIntegrator));
    let handle = sphere(&mut world, Vector3::new(0.0, 3.0, 0.0), 0.5, 1.0);

    step_n(&mut world, 10);

    let body = world.rigid_body(handle).unwrap();
    assert_eq!(body.get_position(), Vector3::new(0.0, 3.0, 0.0));
    assert!(body.get_linear_velocity().y < 0.0);
}

#[test]
fn test_timer_tracks_simulated_time() {
    let mut world = DynamicsWorld::new();
    world.set_time_step(0.01).unwrap();
    assert_relative_eq!(world.timer().get_time_step(), 0.01);

    step_n(&mut world, 5);
    world.update(0.025).unwrap();

    assert_eq!(world.timer().get_nb_steps(), 7);
    assert_relative_eq!(world.timer().get_simulated_time(), 0.07, epsilon = 1e-6);
}

#[test]
fn test_contact_events_drain_in_order() {
    let mut world = DynamicsWorld::new();
    ground(&mut world);
    let ball = sphere(&mut world, Vector3::new(0.0, 0.5, 0.0), 0.5, 1.0);
    let (_, mut contact_events) = step_collecting_events(&mut world, 30);

    world
        .rigid_body_mut(ball)
        .unwrap()
        .set_transform(Transform::from_position(Vector3::new(0.0, 10.0, 0.0)));
    contact_events.extend(step_collecting_events(&mut world, 1).1);

    let kinds: Vec<ContactEventType> = contact_events.iter().map(|event| event.event_type).collect();
    assert_eq!(kinds, vec![ContactEventType::Begin, ContactEventType::End]);
    assert!(world.events().is_empty());
}

#[test]
fn test_unread_events_do_not_pile_up() {
    let mut world = DynamicsWorld::new();
    world.set_is_gravity_on(false);
    ground(&mut world);
    let ball = sphere(&mut world, Vector3::new(0.0, 0.45, 0.0), 0.5, 1.0);
    world.rigid_body_mut(ball).unwrap().set_is_allowed_to_sleep(false);

    for i in 0..1000 {
        let height = if i % 2 == 0 { 5.0 } else { 0.45 };
        let body = world.rigid_body_mut(ball).unwrap();
        body.set_transform(Transform::from_position(Vector3::new(0.0, height, 0.0)));
        body.set_linear_velocity(Vector3::zero());
        world.step().unwrap();
        assert!(world.events().len() <= 4, "{} events pending", world.events().len());
    }

    // The last step's events are still readable
    let last = world.events_mut().next_contact_event().unwrap();
    assert_eq!(last.event_type, ContactEventType::Begin);
    assert!(world.events_mut().next_body_event().is_none());
}

#[test]
fn test_lifecycle_events_survive_the_next_step() {
    let mut world = DynamicsWorld::new();
    let ball = sphere(&mut world, Vector3::zero(), 0.5, 1.0);
    world.step().unwrap();

    let added = world.events_mut().next_body_event().unwrap();
    assert_eq!(added.event_type, BodyEventType::Added);
    assert_eq!(added.body, ball);

    world.step().unwrap();
    assert!(world.events().is_empty());
}

fn sunken_sphere_velocity(split_impulse: bool) -> (Vector3, f32) {
    let mut world = DynamicsWorld::new();
    world.set_is_gravity_on(false);
    world.set_is_deactivation_active(false);
    world.set_is_split_impulse_active(split_impulse);
    ground(&mut world);
    let ball = sphere(&mut world, Vector3::new(0.0, 0.3, 0.0), 0.5, 1.0);

    step_n(&mut world, 3);
    let body = world.rigid_body(ball).unwrap();
    (body.get_linear_velocity(), body.get_position().y)
}

#[test]
fn test_split_impulse_corrects_penetration_without_velocity() {
    let (velocity, height) = sunken_sphere_velocity(true);
    assert!(velocity.y.abs() < 1.0e-3, "vy = {}", velocity.y);
    assert!(height > 0.3);

    let (velocity, height) = sunken_sphere_velocity(false);
    assert!(velocity.y > 0.5, "vy = {}", velocity.y);
    assert!(height > 0.3);
}
