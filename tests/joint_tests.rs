use phys_dynamics::constraints::{
    BallSocketJointInfo, DistanceJoint, DistanceJointInfo, FixedJointInfo, HingeJoint,
    HingeJointInfo, JointType, SliderJoint, SliderJointInfo,
};
use phys_dynamics::math::{Transform, Vector3};
use phys_dynamics::shapes::{BoxShape, CollisionShape, Sphere};
use phys_dynamics::{BodyHandle, DynamicsWorld, PhysicsError};
use approx::assert_relative_eq;
use std::sync::Arc;

fn anchor_body(world: &mut DynamicsWorld, position: Vector3) -> BodyHandle {
    world.create_static_body(Transform::from_position(position), Arc::new(Sphere::new(0.1)))
}

fn dynamic_sphere(world: &mut DynamicsWorld, position: Vector3, radius: f32) -> BodyHandle {
    let shape = Sphere::new(radius);
    let inertia = shape.local_inertia_tensor(1.0);
    world
        .create_rigid_body(Transform::from_position(position), 1.0, inertia, Arc::new(shape))
        .unwrap()
}

fn dynamic_box(world: &mut DynamicsWorld, position: Vector3, half_extents: Vector3) -> BodyHandle {
    let shape = BoxShape::new(half_extents);
    let inertia = shape.local_inertia_tensor(1.0);
    world
        .create_rigid_body(Transform::from_position(position), 1.0, inertia, Arc::new(shape))
        .unwrap()
}

fn step_n(world: &mut DynamicsWorld, steps: usize) {
    for _ in 0..steps {
        world.step().unwrap();
    }
}

#[test]
fn test_ball_socket_pendulum_keeps_its_length() {
    let mut world = DynamicsWorld::new();
    let pivot = anchor_body(&mut world, Vector3::zero());
    let bob = dynamic_sphere(&mut world, Vector3::new(2.0, 0.0, 0.0), 0.25);
    let joint = world
        .create_joint(BallSocketJointInfo::new(pivot, bob, Vector3::zero()).into())
        .unwrap();
    assert_eq!(world.joint(joint).unwrap().joint_type(), JointType::BallSocket);

    let mut lowest = 0.0f32;
    for _ in 0..180 {
        world.step().unwrap();
        let position = world.rigid_body(bob).unwrap().get_position();
        assert!((position.length() - 2.0).abs() < 0.05, "bob drifted to {}", position);
        lowest = lowest.min(position.y);
    }
    assert!(lowest < -1.5);
}

#[test]
fn test_fixed_joint_holds_body_in_place() {
    let mut world = DynamicsWorld::new();
    let base = anchor_body(&mut world, Vector3::new(0.0, 5.0, 0.0));
    let held = dynamic_box(&mut world, Vector3::new(1.0, 5.0, 0.0), Vector3::splat(0.25));
    world
        .create_joint(FixedJointInfo::new(base, held, Vector3::new(0.5, 5.0, 0.0)).into())
        .unwrap();

    step_n(&mut world, 120);

    let body = world.rigid_body(held).unwrap();
    assert_relative_eq!(body.get_position(), Vector3::new(1.0, 5.0, 0.0), epsilon = 0.05);
    assert!(body.get_orientation().w.abs() > 0.995);
}

#[test]
fn test_hinge_motor_reaches_target_speed() {
    let mut world = DynamicsWorld::new();
    world.set_is_gravity_on(false);
    let base = anchor_body(&mut world, Vector3::new(0.0, -5.0, 0.0));
    let wheel = dynamic_sphere(&mut world, Vector3::zero(), 0.5);
    let info = HingeJointInfo::new(base, wheel, Vector3::zero(), Vector3::unit_y()).with_motor(2.0, 100.0);
    let joint = world.create_joint(info.into()).unwrap();

    step_n(&mut world, 60);

    let body = world.rigid_body(wheel).unwrap();
    assert_relative_eq!(body.get_angular_velocity().y, 2.0, epsilon = 0.05);
    assert_relative_eq!(body.get_position(), Vector3::zero(), epsilon = 0.01);

    let hinge = world.joint_mut(joint).unwrap().as_any_mut().downcast_mut::<HingeJoint>().unwrap();
    assert!(hinge.is_motor_enabled());
    hinge.set_motor_speed(-1.0);
    step_n(&mut world, 60);
    assert_relative_eq!(
        world.rigid_body(wheel).unwrap().get_angular_velocity().y,
        -1.0,
        epsilon = 0.05
    );
}

#[test]
fn test_hinge_limits_bound_the_angle() {
    let mut world = DynamicsWorld::new();
    let base = anchor_body(&mut world, Vector3::new(-5.0, 0.0, 0.0));
    let arm = dynamic_box(&mut world, Vector3::new(1.0, 0.0, 0.0), Vector3::new(1.0, 0.1, 0.1));
    let info = HingeJointInfo::new(base, arm, Vector3::zero(), Vector3::unit_z()).with_limits(-0.5, 0.5);
    let joint = world.create_joint(info.into()).unwrap();

    for _ in 0..180 {
        world.step().unwrap();
        let q = world.rigid_body(arm).unwrap().get_orientation();
        let angle = 2.0 * q.z.atan2(q.w);
        assert!(angle.abs() < 0.6, "hinge angle {}", angle);
    }
    let q = world.rigid_body(arm).unwrap().get_orientation();
    assert!(2.0 * q.z.atan2(q.w) < -0.4);

    let hinge = world.joint(joint).unwrap().as_any().downcast_ref::<HingeJoint>().unwrap();
    assert_relative_eq!(hinge.get_min_angle_limit(), -0.5);
    assert_relative_eq!(hinge.get_max_angle_limit(), 0.5);
}

#[test]
fn test_slider_limit_stops_fall() {
    let mut world = DynamicsWorld::new();
    let base = anchor_body(&mut world, Vector3::zero());
    let carriage = dynamic_sphere(&mut world, Vector3::new(0.0, 5.0, 0.0), 0.25);
    let info = SliderJointInfo::new(base, carriage, Vector3::new(0.0, 5.0, 0.0), Vector3::unit_y())
        .with_limits(-1.0, 0.0);
    let joint = world.create_joint(info.into()).unwrap();

    step_n(&mut world, 120);

    let body = world.rigid_body(carriage).unwrap();
    assert!((body.get_position().y - 4.0).abs() < 0.1, "carriage at {}", body.get_position());
    assert!(body.get_position().x.abs() < 0.01);
    assert!(body.get_position().z.abs() < 0.01);

    let slider = world.joint(joint).unwrap().as_any().downcast_ref::<SliderJoint>().unwrap();
    assert!((slider.get_translation() + 1.0).abs() < 0.1);
}

#[test]
fn test_slider_motor_drives_along_axis() {
    let mut world = DynamicsWorld::new();
    world.set_is_gravity_on(false);
    let base = anchor_body(&mut world, Vector3::new(0.0, -5.0, 0.0));
    let carriage = dynamic_sphere(&mut world, Vector3::zero(), 0.25);
    let axis = Vector3::new(1.0, 1.0, 0.0);
    let info = SliderJointInfo::new(base, carriage, Vector3::zero(), axis).with_motor(1.5, 100.0);
    let joint = world.create_joint(info.into()).unwrap();

    step_n(&mut world, 30);

    let body = world.rigid_body(carriage).unwrap();
    assert_relative_eq!(body.get_linear_velocity(), axis.normalize() * 1.5, epsilon = 0.05);
    let slider = world.joint(joint).unwrap().as_any().downcast_ref::<SliderJoint>().unwrap();
    assert!(slider.get_translation() > 0.5);
}

#[test]
fn test_distance_joint_converges_to_rest_length() {
    let mut world = DynamicsWorld::new();
    world.set_is_gravity_on(false);
    let base = anchor_body(&mut world, Vector3::zero());
    let weight = dynamic_sphere(&mut world, Vector3::new(3.0, 0.0, 0.0), 0.25);
    let mut info = DistanceJointInfo::new(base, weight, Vector3::zero(), Vector3::new(3.0, 0.0, 0.0));
    info.rest_length = Some(2.0);
    let joint = world.create_joint(info.into()).unwrap();

    step_n(&mut world, 240);

    let distance = world.rigid_body(weight).unwrap().get_position().length();
    assert!((distance - 2.0).abs() < 0.05, "distance {}", distance);
    let rod = world.joint(joint).unwrap().as_any().downcast_ref::<DistanceJoint>().unwrap();
    assert_relative_eq!(rod.get_rest_length(), 2.0);
}

#[test]
fn test_distance_joint_defaults_to_initial_distance() {
    let mut world = DynamicsWorld::new();
    let base = anchor_body(&mut world, Vector3::zero());
    let weight = dynamic_sphere(&mut world, Vector3::new(0.0, -1.5, 0.0), 0.25);
    let info = DistanceJointInfo::new(base, weight, Vector3::zero(), Vector3::new(0.0, -1.5, 0.0));
    let joint = world.create_joint(info.into()).unwrap();

    let rod = world.joint(joint).unwrap().as_any().downcast_ref::<DistanceJoint>().unwrap();
    assert_relative_eq!(rod.get_rest_length(), 1.5, epsilon = 1e-6);
}

#[test]
fn test_invalid_joints_are_rejected() {
    let mut world = DynamicsWorld::new();
    let a = dynamic_sphere(&mut world, Vector3::zero(), 0.5);
    let b = dynamic_sphere(&mut world, Vector3::new(2.0, 0.0, 0.0), 0.5);

    let same = BallSocketJointInfo::new(a, a, Vector3::zero());
    assert!(matches!(world.create_joint(same.into()), Err(PhysicsError::InvalidParameter(_))));

    let zero_axis = HingeJointInfo::new(a, b, Vector3::zero(), Vector3::zero());
    assert!(matches!(world.create_joint(zero_axis.into()), Err(PhysicsError::InvalidParameter(_))));

    let bad_limits = SliderJointInfo::new(a, b, Vector3::zero(), Vector3::unit_x()).with_limits(0.5, 1.0);
    assert!(matches!(world.create_joint(bad_limits.into()), Err(PhysicsError::InvalidParameter(_))));

    let mut bad_length = DistanceJointInfo::new(a, b, Vector3::zero(), Vector3::unit_x());
    bad_length.rest_length = Some(-1.0);
    assert!(world.create_joint(bad_length.into()).is_err());

    world.destroy_rigid_body(b).unwrap();
    let stale = BallSocketJointInfo::new(a, b, Vector3::zero());
    assert!(matches!(world.create_joint(stale.into()), Err(PhysicsError::ResourceNotFound(_))));
    assert_eq!(world.nb_joints(), 0);
}

#[test]
fn test_destroying_joint_and_body() {
    let mut world = DynamicsWorld::new();
    let a = anchor_body(&mut world, Vector3::zero());
    let b = dynamic_sphere(&mut world, Vector3::new(0.0, -1.0, 0.0), 0.25);
    let c = dynamic_sphere(&mut world, Vector3::new(0.0, -2.0, 0.0), 0.25);
    let first = world.create_joint(BallSocketJointInfo::new(a, b, Vector3::zero()).into()).unwrap();
    let second = world
        .create_joint(BallSocketJointInfo::new(b, c, Vector3::new(0.0, -1.0, 0.0)).into())
        .unwrap();
    assert_eq!(world.nb_joints(), 2);

    world.destroy_joint(first).unwrap();
    assert!(matches!(world.joint(first), Err(PhysicsError::ResourceNotFound(_))));
    assert!(world.destroy_joint(first).is_err());

    world.destroy_rigid_body(c).unwrap();
    assert!(world.joint(second).is_err());
    assert_eq!(world.nb_joints(), 0);
    step_n(&mut world, 10);
}

#[test]
fn test_joint_can_disable_collision_between_its_bodies() {
    for collide in [true, false] {
        let mut world = DynamicsWorld::new();
        world.set_is_gravity_on(false);
        let a = dynamic_sphere(&mut world, Vector3::zero(), 0.5);
        let b = dynamic_sphere(&mut world, Vector3::new(0.8, 0.0, 0.0), 0.5);
        world.step().unwrap();
        assert_eq!(world.nb_contact_manifolds(), 1);

        let mut info = BallSocketJointInfo::new(a, b, Vector3::new(0.4, 0.0, 0.0));
        info.is_collision_enabled = collide;
        world.create_joint(info.into()).unwrap();
        step_n(&mut world, 5);

        let expected = if collide { 1 } else { 0 };
        assert_eq!(world.nb_contact_manifolds(), expected);
    }
}

#[test]
fn test_joint_settings_can_be_changed_after_creation() {
    let mut world = DynamicsWorld::new();
    let a = anchor_body(&mut world, Vector3::new(0.0, -5.0, 0.0));
    let b = dynamic_sphere(&mut world, Vector3::zero(), 0.25);
    let c = dynamic_sphere(&mut world, Vector3::new(3.0, 0.0, 0.0), 0.25);

    let hinge_handle = world
        .create_joint(HingeJointInfo::new(a, b, Vector3::zero(), Vector3::unit_x()).into())
        .unwrap();
    let slider_handle = world
        .create_joint(SliderJointInfo::new(a, c, Vector3::new(3.0, 0.0, 0.0), Vector3::unit_y()).into())
        .unwrap();
    let rod_handle = world
        .create_joint(DistanceJointInfo::new(b, c, Vector3::zero(), Vector3::new(3.0, 0.0, 0.0)).into())
        .unwrap();

    let hinge = world.joint_mut(hinge_handle).unwrap().as_any_mut().downcast_mut::<HingeJoint>().unwrap();
    assert!(!hinge.is_limit_enabled() && !hinge.is_motor_enabled());
    hinge.enable_limit(true);
    hinge.set_limits(-1.0, 1.0);
    hinge.set_limits(0.5, 1.0);
    assert_relative_eq!(hinge.get_min_angle_limit(), -1.0);
    assert_relative_eq!(hinge.get_max_angle_limit(), 1.0);
    hinge.enable_motor(true);
    hinge.set_motor_speed(3.0);
    hinge.set_max_motor_torque(10.0);
    hinge.set_max_motor_torque(-1.0);
    assert!(hinge.is_limit_enabled() && hinge.is_motor_enabled());
    assert_relative_eq!(hinge.get_motor_speed(), 3.0);
    assert_relative_eq!(hinge.get_max_motor_torque(), 10.0);
    assert_eq!(hinge.get_motor_torque(), 0.0);

    let slider = world.joint_mut(slider_handle).unwrap().as_any_mut().downcast_mut::<SliderJoint>().unwrap();
    slider.enable_limit(true);
    slider.set_limits(-2.0, 0.5);
    slider.enable_motor(true);
    slider.set_motor_speed(1.0);
    slider.set_max_motor_force(50.0);
    assert_relative_eq!(slider.get_min_translation_limit(), -2.0);
    assert_relative_eq!(slider.get_max_translation_limit(), 0.5);
    assert_relative_eq!(slider.get_max_motor_force(), 50.0);

    let rod = world.joint_mut(rod_handle).unwrap().as_any_mut().downcast_mut::<DistanceJoint>().unwrap();
    rod.set_rest_length(2.5);
    rod.set_rest_length(-1.0);
    assert_relative_eq!(rod.get_rest_length(), 2.5);

    world.set_is_gravity_on(false);
    world.step().unwrap();

    let hinge = world.joint(hinge_handle).unwrap().as_any().downcast_ref::<HingeJoint>().unwrap();
    assert!(hinge.get_motor_torque().abs() <= 10.0 + 1e-3);
    assert!(hinge.get_motor_torque().abs() > 0.0);
    let slider = world.joint(slider_handle).unwrap().as_any().downcast_ref::<SliderJoint>().unwrap();
    assert!(slider.get_motor_force().abs() <= 50.0 + 1e-3);
}

#[test]
fn test_ball_socket_reports_accumulated_impulse() {
    let mut world = DynamicsWorld::new();
    let pivot = anchor_body(&mut world, Vector3::zero());
    let bob = dynamic_sphere(&mut world, Vector3::new(0.0, -1.0, 0.0), 0.25);
    let joint = world
        .create_joint(BallSocketJointInfo::new(pivot, bob, Vector3::zero()).into())
        .unwrap();

    step_n(&mut world, 30);

    let socket = world
        .joint(joint)
        .unwrap()
        .as_any()
        .downcast_ref::<phys_dynamics::constraints::BallSocketJoint>()
        .unwrap();
    // Holding one unit of mass against gravity for one step
    assert_relative_eq!(socket.get_impulse().length(), 9.81 / 60.0, epsilon = 0.02);
}

fn heavy_box(world: &mut DynamicsWorld, position: Vector3) -> BodyHandle {
    let shape = BoxShape::new(Vector3::splat(1.0));
    let mass = 1.0e4;
    let inertia = shape.local_inertia_tensor(mass);
    world
        .create_rigid_body(Transform::from_position(position), mass, inertia, Arc::new(shape))
        .unwrap()
}

#[test]
fn test_hinge_holds_heavy_body_off_axis() {
    let mut world = DynamicsWorld::new();
    world.set_is_gravity_on(false);
    let base = anchor_body(&mut world, Vector3::new(0.0, -5.0, 0.0));
    let door = heavy_box(&mut world, Vector3::zero());
    world
        .create_joint(HingeJointInfo::new(base, door, Vector3::zero(), Vector3::unit_z()).into())
        .unwrap();
    world
        .rigid_body_mut(door)
        .unwrap()
        .set_angular_velocity(Vector3::new(1.0, 0.0, 0.5));

    world.step().unwrap();

    let spin = world.rigid_body(door).unwrap().get_angular_velocity();
    assert!(spin.x.abs() < 1e-3, "off-axis spin {}", spin);
    assert!(spin.y.abs() < 1e-3, "off-axis spin {}", spin);
    assert_relative_eq!(spin.z, 0.5, epsilon = 1e-3);
}

#[test]
fn test_slider_holds_heavy_body_off_axis() {
    let mut world = DynamicsWorld::new();
    world.set_is_gravity_on(false);
    let base = anchor_body(&mut world, Vector3::new(0.0, -5.0, 0.0));
    let carriage = heavy_box(&mut world, Vector3::zero());
    world
        .create_joint(SliderJointInfo::new(base, carriage, Vector3::zero(), Vector3::unit_y()).into())
        .unwrap();
    world
        .rigid_body_mut(carriage)
        .unwrap()
        .set_linear_velocity(Vector3::new(1.0, 2.0, -1.0));

    world.step().unwrap();

    let velocity = world.rigid_body(carriage).unwrap().get_linear_velocity();
    assert!(velocity.x.abs() < 1e-3, "off-axis velocity {}", velocity);
    assert!(velocity.z.abs() < 1e-3, "off-axis velocity {}", velocity);
    assert_relative_eq!(velocity.y, 2.0, epsilon = 1e-3);
}
