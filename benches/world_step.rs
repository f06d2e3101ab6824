//! Benchmarks for stepping a dynamics world.
//!
//! Run with: cargo bench --bench world_step

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use phys_dynamics::math::{Transform, Vector3};
use phys_dynamics::shapes::{BoxShape, CollisionShape, Sphere};
use phys_dynamics::DynamicsWorld;
use std::sync::Arc;

/// Ground plus a grid of box columns, each `height` boxes tall, with a sphere on top
fn falling_stacks(columns: usize, height: usize) -> DynamicsWorld {
    let mut world = DynamicsWorld::new();
    world.create_static_body(
        Transform::from_position(Vector3::new(0.0, -0.5, 0.0)),
        Arc::new(BoxShape::new(Vector3::new(50.0, 0.5, 50.0))),
    );

    let box_shape: Arc<dyn CollisionShape> = Arc::new(BoxShape::new(Vector3::splat(0.5)));
    let sphere_shape: Arc<dyn CollisionShape> = Arc::new(Sphere::new(0.4));
    for column in 0..columns {
        let x = (column % 4) as f32 * 2.5;
        let z = (column / 4) as f32 * 2.5;
        for level in 0..height {
            let position = Vector3::new(x, 0.55 + level as f32 * 1.05, z);
            let _ = world.create_rigid_body(
                Transform::from_position(position),
                1.0,
                box_shape.local_inertia_tensor(1.0),
                box_shape.clone(),
            );
        }
        let top = Vector3::new(x + 0.1, 1.0 + height as f32 * 1.05, z);
        let _ = world.create_rigid_body(
            Transform::from_position(top),
            0.5,
            sphere_shape.local_inertia_tensor(0.5),
            sphere_shape.clone(),
        );
    }
    world
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step");
    for columns in [1, 4, 16] {
        group.bench_with_input(BenchmarkId::new("stacks", columns), &columns, |b, &columns| {
            let mut world = falling_stacks(columns, 5);
            b.iter(|| {
                let _ = black_box(world.step());
            });
        });
    }
    group.finish();
}

fn bench_settle(c: &mut Criterion) {
    c.bench_function("settle_four_stacks_120_steps", |b| {
        b.iter(|| {
            let mut world = falling_stacks(4, 5);
            for _ in 0..120 {
                let _ = world.step();
            }
            black_box(world.nb_contact_manifolds())
        });
    });
}

criterion_group!(benches, bench_step, bench_settle);
criterion_main!(benches);
