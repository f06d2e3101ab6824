use phys_dynamics::math::{Quaternion, Transform, Vector3};
use phys_dynamics::shapes::{
    world_support_point, BoxShape, Capsule, CollisionShape, Cone, ConvexHull, Cylinder, ShapeKind,
    Sphere, DEFAULT_MARGIN,
};
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_direction(rng: &mut StdRng) -> Vector3 {
    loop {
        let v = Vector3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        if v.length_squared() > 1e-4 {
            return v;
        }
    }
}

fn all_shapes() -> Vec<Box<dyn CollisionShape>> {
    vec![
        Box::new(Sphere::new(0.7)) as Box<dyn CollisionShape>,
        Box::new(BoxShape::new(Vector3::new(1.0, 0.5, 0.25))),
        Box::new(Capsule::new(0.4, 1.5)),
        Box::new(Cylinder::new(0.6, 2.0)),
        Box::new(Cone::new(0.5, 1.2)),
        Box::new(ConvexHull::new(&[
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(0.0, -0.5, -1.0),
        ])),
    ]
}

#[test]
fn test_capsule_support_top_for_up_direction() {
    let capsule = Capsule::new(0.5, 2.0);
    let support = capsule.support_point_with_margin(Vector3::new(0.0, 1.0, 0.0));
    assert_relative_eq!(support, Vector3::new(0.0, 1.5, 0.0), epsilon = 1e-6);

    let support = capsule.support_point_with_margin(Vector3::new(0.0, -1.0, 0.0));
    assert_relative_eq!(support, Vector3::new(0.0, -1.5, 0.0), epsilon = 1e-6);
}

#[test]
fn test_capsule_support_horizontal_tie_goes_to_bottom() {
    let capsule = Capsule::new(0.5, 2.0);

    // Both end spheres reach the same extent along a horizontal direction
    let support = capsule.support_point_with_margin(Vector3::new(3.0, 0.0, 0.0));
    assert_relative_eq!(support, Vector3::new(0.5, -1.0, 0.0), epsilon = 1e-6);

    let core = capsule.support_point_without_margin(Vector3::new(3.0, 0.0, 0.0));
    assert_eq!(core, Vector3::new(0.0, -1.0, 0.0));
}

#[test]
fn test_capsule_support_zero_direction() {
    let capsule = Capsule::new(0.35, 1.0);
    assert_eq!(
        capsule.support_point_with_margin(Vector3::zero()),
        Vector3::new(0.0, 0.35, 0.0)
    );
    assert_eq!(
        capsule.support_point_without_margin(Vector3::zero()),
        Vector3::new(0.0, -0.5, 0.0)
    );
}

#[test]
fn test_zero_direction_never_produces_nan() {
    for shape in all_shapes() {
        let with_margin = shape.support_point_with_margin(Vector3::zero());
        let without_margin = shape.support_point_without_margin(Vector3::zero());
        assert!(with_margin.is_finite(), "{:?}", shape.kind());
        assert!(without_margin.is_finite(), "{:?}", shape.kind());
    }
}

#[test]
fn test_margin_inflates_core_support() {
    let mut rng = StdRng::seed_from_u64(7);
    for shape in all_shapes() {
        if shape.kind() == ShapeKind::Capsule {
            continue;
        }
        for _ in 0..64 {
            let direction = random_direction(&mut rng);
            let expected = shape.support_point_without_margin(direction)
                + direction.normalize() * shape.margin();
            assert_relative_eq!(
                shape.support_point_with_margin(direction),
                expected,
                epsilon = 1e-5
            );
        }
    }
}

#[test]
fn test_support_point_is_extreme_along_direction() {
    let mut rng = StdRng::seed_from_u64(42);
    for shape in all_shapes() {
        let samples: Vec<Vector3> = (0..128)
            .map(|_| shape.support_point_with_margin(random_direction(&mut rng)))
            .collect();

        for _ in 0..64 {
            let direction = random_direction(&mut rng);
            let support = shape.support_point_with_margin(direction);
            let reach = support.dot(&direction);
            for sample in &samples {
                assert!(
                    sample.dot(&direction) <= reach + 1e-4,
                    "{:?}: sample {} beats support {} along {}",
                    shape.kind(),
                    sample,
                    support,
                    direction
                );
            }
        }
    }
}

#[test]
fn test_box_margin_keeps_outer_extents() {
    let half_extents = Vector3::new(1.0, 2.0, 3.0);
    let shape = BoxShape::new(half_extents);
    assert_relative_eq!(shape.margin(), DEFAULT_MARGIN);
    assert_relative_eq!(shape.get_half_extents(), half_extents, epsilon = 1e-6);

    let corner = shape.support_point_without_margin(Vector3::new(1.0, 1.0, 1.0));
    assert_relative_eq!(corner, half_extents - Vector3::splat(DEFAULT_MARGIN), epsilon = 1e-6);
}

#[test]
fn test_capsule_inertia_symmetry_and_linearity() {
    let capsule = Capsule::new(0.5, 2.0);
    let tensor = capsule.local_inertia_tensor(3.0);

    assert_relative_eq!(tensor.data[0][0], tensor.data[2][2]);
    assert!((tensor.data[0][0] - tensor.data[1][1]).abs() > 1e-4);
    for i in 0..3 {
        for j in 0..3 {
            if i != j {
                assert_eq!(tensor.data[i][j], 0.0);
            }
        }
    }

    let doubled = capsule.local_inertia_tensor(6.0);
    assert_relative_eq!(doubled, tensor * 2.0, epsilon = 1e-5);
}

#[test]
fn test_sphere_inertia() {
    let sphere = Sphere::new(2.0);
    let tensor = sphere.local_inertia_tensor(5.0);
    assert_relative_eq!(tensor.diagonal(), Vector3::splat(0.4 * 5.0 * 4.0), epsilon = 1e-5);
}

#[test]
fn test_inertia_is_linear_in_mass_for_every_shape() {
    for shape in all_shapes() {
        let one = shape.local_inertia_tensor(1.0);
        let many = shape.local_inertia_tensor(7.5);
        assert_relative_eq!(many, one * 7.5, epsilon = 1e-4);
        assert_relative_eq!(one, one.transpose(), epsilon = 1e-6);
    }
}

#[test]
fn test_world_bounds_contain_world_support_points() {
    let mut rng = StdRng::seed_from_u64(3);
    let transform = Transform::new(
        Vector3::new(3.0, -1.0, 2.0),
        Quaternion::from_axis_angle(Vector3::new(0.3, 1.0, -0.2), 0.9),
    );
    for shape in all_shapes() {
        let bounds = shape.world_bounds(&transform).inflate(1e-4);
        for _ in 0..64 {
            let point = world_support_point(&*shape, random_direction(&mut rng), &transform);
            assert!(bounds.contains_point(point), "{:?}", shape.kind());
        }
    }
}

#[test]
#[should_panic]
fn test_capsule_rejects_zero_radius() {
    let _ = Capsule::new(0.0, 1.0);
}

#[test]
#[should_panic]
fn test_sphere_rejects_negative_radius() {
    let _ = Sphere::new(-1.0);
}

#[test]
fn test_downcast_through_as_any() {
    let shape: Box<dyn CollisionShape> = Box::new(Cylinder::new(0.5, 1.0));
    let cylinder = shape.as_any().downcast_ref::<Cylinder>().unwrap();
    assert_relative_eq!(cylinder.get_radius(), 0.5);
    assert!(shape.as_any().downcast_ref::<Sphere>().is_none());
}

#[test]
fn test_shape_accessors() {
    let capsule = Capsule::new(0.25, 0.75);
    assert_relative_eq!(capsule.get_radius(), 0.25);
    assert_relative_eq!(capsule.get_half_height(), 0.375);
    assert_relative_eq!(capsule.margin(), 0.25);

    let points = [
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(0.0, 0.0, 1.0),
    ];
    let hull = ConvexHull::new(&points);
    assert_eq!(hull.get_vertices().len(), 4);
    assert_eq!(hull.kind(), ShapeKind::ConvexHull);
}
