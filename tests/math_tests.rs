use phys_dynamics::math::{Aabb, Matrix3, Quaternion, Transform, Vector3};
use std::f32::consts::PI;
use approx::assert_relative_eq;

#[test]
fn test_vector3_operations() {
    let v1 = Vector3::new(1.0, 2.0, 3.0);
    let v2 = Vector3::new(4.0, 5.0, 6.0);

    assert_eq!(v1 + v2, Vector3::new(5.0, 7.0, 9.0));
    assert_eq!(v2 - v1, Vector3::new(3.0, 3.0, 3.0));
    assert_eq!(v1 * 2.0, Vector3::new(2.0, 4.0, 6.0));
    assert_eq!(-v1, Vector3::new(-1.0, -2.0, -3.0));

    assert_eq!(v1.dot(&v2), 32.0);

    let cross = v1.cross(&v2);
    assert_eq!(cross, Vector3::new(-3.0, 6.0, -3.0));
    assert_relative_eq!(cross.dot(&v1), 0.0);
    assert_relative_eq!(cross.dot(&v2), 0.0);

    assert_relative_eq!(v1.length(), 14.0f32.sqrt());
    assert_relative_eq!(v1.normalize().length(), 1.0, epsilon = 1e-6);
}

#[test]
fn test_vector3_normalize_zero_is_zero() {
    assert!(Vector3::zero().normalize().is_zero());
}

#[test]
fn test_orthonormal_basis() {
    for normal in [
        Vector3::unit_x(),
        Vector3::unit_y(),
        Vector3::new(1.0, 1.0, 1.0).normalize(),
        Vector3::new(-0.3, 0.1, 0.9).normalize(),
    ] {
        let (t1, t2) = normal.orthonormal_basis();
        assert_relative_eq!(t1.length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(t2.length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(t1.dot(&normal), 0.0, epsilon = 1e-5);
        assert_relative_eq!(t2.dot(&normal), 0.0, epsilon = 1e-5);
        assert_relative_eq!(t1.dot(&t2), 0.0, epsilon = 1e-5);
    }
}

#[test]
fn test_matrix3_inverse() {
    let m = Matrix3::new([[2.0, 0.0, 1.0], [0.0, 3.0, 0.0], [1.0, 0.0, 4.0]]);
    let inverse = m.inverse().unwrap();
    assert_relative_eq!(m * inverse, Matrix3::identity(), epsilon = 1e-5);

    let singular = Matrix3::new([[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 1.0, 0.0]]);
    assert!(singular.inverse().is_none());
}

#[test]
fn test_matrix3_skew_symmetric_matches_cross() {
    let v = Vector3::new(0.5, -1.0, 2.0);
    let w = Vector3::new(3.0, 0.25, -1.5);
    assert_relative_eq!(Matrix3::skew_symmetric(v) * w, v.cross(&w), epsilon = 1e-6);
}

#[test]
fn test_quaternion_rotation() {
    let q = Quaternion::from_axis_angle(Vector3::unit_z(), PI / 2.0);
    let rotated = q.rotate(Vector3::unit_x());
    assert_relative_eq!(rotated, Vector3::unit_y(), epsilon = 1e-6);

    let back = q.inverse_rotate(rotated);
    assert_relative_eq!(back, Vector3::unit_x(), epsilon = 1e-6);

    let matrix = q.to_rotation_matrix();
    assert_relative_eq!(matrix * Vector3::unit_x(), Vector3::unit_y(), epsilon = 1e-6);
}

#[test]
fn test_quaternion_integrate_matches_axis_angle() {
    let angular_velocity = Vector3::new(0.0, 2.0, 0.0);
    let dt = 1.0 / 600.0;
    let mut q = Quaternion::identity();
    for _ in 0..600 {
        q = q.integrate(angular_velocity, dt);
    }
    assert_relative_eq!(q.length(), 1.0, epsilon = 1e-5);

    let expected = Quaternion::from_axis_angle(Vector3::unit_y(), 2.0);
    assert!(q.dot(&expected).abs() > 0.999);
}

#[test]
fn test_transform_point_round_trip() {
    let transform = Transform::new(
        Vector3::new(1.0, 2.0, 3.0),
        Quaternion::from_axis_angle(Vector3::new(1.0, 1.0, 0.0), 0.7),
    );
    let point = Vector3::new(-2.0, 0.5, 4.0);

    let world = transform.transform_point(point);
    assert_relative_eq!(transform.inverse_transform_point(world), point, epsilon = 1e-5);
    assert_relative_eq!(transform.inverse() * world, point, epsilon = 1e-5);

    let direction = Vector3::new(0.0, 0.0, 2.0);
    let rotated = transform.transform_direction(direction);
    assert_relative_eq!(rotated.length(), 2.0, epsilon = 1e-5);
    assert_relative_eq!(transform.inverse_transform_direction(rotated), direction, epsilon = 1e-5);
}

#[test]
fn test_transform_interpolate_endpoints() {
    let previous = Transform::from_position(Vector3::zero());
    let current = Transform::new(
        Vector3::new(2.0, 0.0, 0.0),
        Quaternion::from_axis_angle(Vector3::unit_y(), 1.0),
    );

    let half = Transform::interpolate(&previous, &current, 0.5);
    assert_relative_eq!(half.position, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-6);

    let end = Transform::interpolate(&previous, &current, 1.0);
    assert_relative_eq!(end.position, current.position, epsilon = 1e-6);
    assert!(end.orientation.dot(&current.orientation).abs() > 0.9999);
}

#[test]
fn test_aabb_intersection() {
    let a = Aabb::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
    let b = Aabb::new(Vector3::new(0.5, 0.5, 0.5), Vector3::new(1.5, 1.5, 1.5));
    let c = Aabb::new(Vector3::new(2.0, 2.0, 2.0), Vector3::new(3.0, 3.0, 3.0));

    assert!(a.intersects(&b));
    assert!(!a.intersects(&c));

    let merged = a.merge(&c);
    assert!(merged.contains(&a));
    assert!(merged.contains(&c));
    assert!(merged.contains_point(Vector3::splat(1.5)));
}

#[test]
fn test_nalgebra_interop() {
    let v = Vector3::new(1.0, -2.0, 3.5);
    assert_eq!(Vector3::from_nalgebra(&v.to_nalgebra()), v);

    let q = Quaternion::from_axis_angle(Vector3::unit_x(), 0.3);
    assert_relative_eq!(Quaternion::from_nalgebra(&q.to_nalgebra()), q, epsilon = 1e-6);
}
