use crate::collision::contact_manifold::ContactManifold;
use crate::core::{ConstrainedVelocities, DynamicsConfig};
use crate::math::{Vector3, MACHINE_EPSILON};

/// Contact manifold handed to the solver for one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactConstraint {
    /// Index of the manifold in the slice given to [`ContactSolver::init`]
    pub manifold: usize,

    /// Velocity slots of the two bodies
    pub body1: usize,
    pub body2: usize,

    /// Centers of mass of the two bodies, world space
    pub center1: Vector3,
    pub center2: Vector3,

    /// Mixed friction coefficient of the two materials
    pub friction: f32,

    /// Mixed restitution of the two materials
    pub restitution: f32,
}

#[derive(Debug, Clone, Default)]
struct ContactPointSolver {
    normal: Vector3,
    r1: Vector3,
    r2: Vector3,
    penetration_depth: f32,
    is_resting_contact: bool,
    restitution_bias: f32,
    inverse_penetration_mass: f32,

    friction_vector1: Vector3,
    friction_vector2: Vector3,
    old_friction_vector1: Vector3,
    old_friction_vector2: Vector3,
    inverse_friction_mass1: f32,
    inverse_friction_mass2: f32,

    penetration_impulse: f32,
    friction_impulse1: f32,
    friction_impulse2: f32,
    penetration_split_impulse: f32,
}

#[derive(Debug, Clone, Default)]
struct ContactManifoldSolver {
    manifold: usize,
    index1: usize,
    index2: usize,
    friction_coefficient: f32,
    points: Vec<ContactPointSolver>,

    // Manifold center friction
    normal: Vector3,
    r1_friction: Vector3,
    r2_friction: Vector3,
    friction_vector1: Vector3,
    friction_vector2: Vector3,
    old_friction_vector1: Vector3,
    old_friction_vector2: Vector3,
    inverse_friction_mass1: f32,
    inverse_friction_mass2: f32,
    inverse_twist_friction_mass: f32,
    friction_impulse1: f32,
    friction_impulse2: f32,
    friction_twist_impulse: f32,
}

/// Sequential impulse solver for the contacts of one island.
///
/// Each contact point gets a non-penetration constraint and, unless friction
/// is solved at the manifold center, two friction constraints bounded by the
/// normal impulse. Impulses are applied straight to the constrained velocity
/// arrays, manifold after manifold, point after point.
#[derive(Debug)]
pub struct ContactSolver {
    manifolds: Vec<ContactManifoldSolver>,
    time_step: f32,
    baumgarte_factor: f32,
    slop: f32,
    restitution_velocity_threshold: f32,
    is_split_impulse_active: bool,
    is_solve_friction_at_manifold_center_active: bool,
    is_warm_starting_active: bool,
    is_error_correction_active: bool,
}

/// Effective mass of a constraint along `direction` at the two anchors
#[inline]
fn effective_mass(
    velocities: &ConstrainedVelocities,
    index1: usize,
    index2: usize,
    r1: Vector3,
    r2: Vector3,
    direction: Vector3,
) -> f32 {
    let r1_cross = r1.cross(&direction);
    let r2_cross = r2.cross(&direction);
    velocities.inverse_mass[index1]
        + velocities.inverse_mass[index2]
        + (velocities.inverse_inertia[index1] * r1_cross).cross(&r1).dot(&direction)
        + (velocities.inverse_inertia[index2] * r2_cross).cross(&r2).dot(&direction)
}

#[inline]
fn inverse_or_zero(value: f32) -> f32 {
    if value > 0.0 {
        1.0 / value
    } else {
        0.0
    }
}

/// Two unit friction directions orthogonal to `normal`, the first one along
/// the tangential relative velocity when there is one
fn compute_friction_vectors(relative_velocity: Vector3, normal: Vector3) -> (Vector3, Vector3) {
    let tangent_velocity = relative_velocity - normal * relative_velocity.dot(&normal);
    let length = tangent_velocity.length();
    let first = if length > MACHINE_EPSILON {
        tangent_velocity / length
    } else {
        normal.one_unit_orthogonal_vector()
    };
    let second = normal.cross(&first).normalize();
    (first, second)
}

/// Relative velocity of the anchor on body 2 with respect to the anchor on body 1
#[inline]
fn relative_velocity(
    linear: &[Vector3],
    angular: &[Vector3],
    index1: usize,
    index2: usize,
    r1: Vector3,
    r2: Vector3,
) -> Vector3 {
    linear[index2] + angular[index2].cross(&r2) - linear[index1] - angular[index1].cross(&r1)
}

impl ContactSolver {
    pub fn new(config: &DynamicsConfig, time_step: f32) -> Self {
        Self {
            manifolds: Vec::new(),
            time_step,
            baumgarte_factor: config.baumgarte_factor,
            slop: config.slop,
            restitution_velocity_threshold: config.restitution_velocity_threshold,
            is_split_impulse_active: config.is_split_impulse_active,
            is_solve_friction_at_manifold_center_active: config
                .is_solve_friction_at_contact_manifold_center_active,
            is_warm_starting_active: config.is_warm_starting_active,
            is_error_correction_active: config.is_error_correction_active,
        }
    }

    /// Precomputes the constraint data of the given manifolds
    pub fn init(
        &mut self,
        constraints: &[ContactConstraint],
        manifolds: &[ContactManifold],
        velocities: &ConstrainedVelocities,
    ) {
        self.manifolds.clear();
        self.manifolds.reserve(constraints.len());

        for constraint in constraints {
            let manifold = &manifolds[constraint.manifold];
            if manifold.is_empty() {
                continue;
            }
            let (index1, index2) = (constraint.body1, constraint.body2);

            let mut solver = ContactManifoldSolver {
                manifold: constraint.manifold,
                index1,
                index2,
                friction_coefficient: constraint.friction,
                points: Vec::with_capacity(manifold.len()),
                ..Default::default()
            };

            for point in manifold.points() {
                let r1 = point.world_point1 - constraint.center1;
                let r2 = point.world_point2 - constraint.center2;
                let normal = point.normal;
                let delta_v = relative_velocity(
                    &velocities.linear,
                    &velocities.angular,
                    index1,
                    index2,
                    r1,
                    r2,
                );

                let mut point_solver = ContactPointSolver {
                    normal,
                    r1,
                    r2,
                    penetration_depth: point.penetration_depth,
                    is_resting_contact: point.is_resting_contact,
                    inverse_penetration_mass: inverse_or_zero(effective_mass(
                        velocities, index1, index2, r1, r2, normal,
                    )),
                    old_friction_vector1: point.friction_vectors[0],
                    old_friction_vector2: point.friction_vectors[1],
                    ..Default::default()
                };

                if !self.is_solve_friction_at_manifold_center_active {
                    let (t1, t2) = compute_friction_vectors(delta_v, normal);
                    point_solver.friction_vector1 = t1;
                    point_solver.friction_vector2 = t2;
                    point_solver.inverse_friction_mass1 =
                        inverse_or_zero(effective_mass(velocities, index1, index2, r1, r2, t1));
                    point_solver.inverse_friction_mass2 =
                        inverse_or_zero(effective_mass(velocities, index1, index2, r1, r2, t2));
                }

                let approach_speed = delta_v.dot(&normal);
                if approach_speed < -self.restitution_velocity_threshold {
                    point_solver.restitution_bias = constraint.restitution * approach_speed;
                }

                if self.is_warm_starting_active {
                    point_solver.penetration_impulse = point.penetration_impulse;
                    point_solver.friction_impulse1 = point.friction_impulse1;
                    point_solver.friction_impulse2 = point.friction_impulse2;
                }

                solver.points.push(point_solver);
            }

            if self.is_solve_friction_at_manifold_center_active {
                let (center1, center2) = manifold.centers();
                let normal = manifold.average_normal();
                let r1 = center1 - constraint.center1;
                let r2 = center2 - constraint.center2;
                let delta_v = relative_velocity(
                    &velocities.linear,
                    &velocities.angular,
                    index1,
                    index2,
                    r1,
                    r2,
                );
                let (t1, t2) = compute_friction_vectors(delta_v, normal);

                solver.normal = normal;
                solver.r1_friction = r1;
                solver.r2_friction = r2;
                solver.friction_vector1 = t1;
                solver.friction_vector2 = t2;
                solver.old_friction_vector1 = manifold.friction_vector1;
                solver.old_friction_vector2 = manifold.friction_vector2;
                solver.inverse_friction_mass1 =
                    inverse_or_zero(effective_mass(velocities, index1, index2, r1, r2, t1));
                solver.inverse_friction_mass2 =
                    inverse_or_zero(effective_mass(velocities, index1, index2, r1, r2, t2));
                solver.inverse_twist_friction_mass = inverse_or_zero(
                    normal.dot(&(velocities.inverse_inertia[index1] * normal))
                        + normal.dot(&(velocities.inverse_inertia[index2] * normal)),
                );

                if self.is_warm_starting_active {
                    solver.friction_impulse1 = manifold.friction_impulse1;
                    solver.friction_impulse2 = manifold.friction_impulse2;
                    solver.friction_twist_impulse = manifold.friction_twist_impulse;
                }
            }

            self.manifolds.push(solver);
        }
    }

    /// Re-applies the impulses cached from the previous step.
    ///
    /// Only points that survived a refresh are warm started; new points start
    /// from zero. Old friction impulses are projected on the new friction
    /// directions.
    pub fn warm_start(&mut self, velocities: &mut ConstrainedVelocities) {
        if !self.is_warm_starting_active {
            return;
        }
        let at_center = self.is_solve_friction_at_manifold_center_active;

        for manifold in &mut self.manifolds {
            let (index1, index2) = (manifold.index1, manifold.index2);
            let mut has_resting_point = false;

            for point in &mut manifold.points {
                if !point.is_resting_contact {
                    point.penetration_impulse = 0.0;
                    point.friction_impulse1 = 0.0;
                    point.friction_impulse2 = 0.0;
                    continue;
                }
                has_resting_point = true;

                velocities.apply_linear_impulse(
                    index1,
                    index2,
                    point.r1,
                    point.r2,
                    point.normal * point.penetration_impulse,
                );

                if !at_center {
                    let old_impulse = point.old_friction_vector1 * point.friction_impulse1
                        + point.old_friction_vector2 * point.friction_impulse2;
                    point.friction_impulse1 = old_impulse.dot(&point.friction_vector1);
                    point.friction_impulse2 = old_impulse.dot(&point.friction_vector2);

                    let impulse = point.friction_vector1 * point.friction_impulse1
                        + point.friction_vector2 * point.friction_impulse2;
                    velocities.apply_linear_impulse(index1, index2, point.r1, point.r2, impulse);
                }
            }

            if !at_center {
                continue;
            }

            if has_resting_point {
                let old_impulse = manifold.old_friction_vector1 * manifold.friction_impulse1
                    + manifold.old_friction_vector2 * manifold.friction_impulse2;
                manifold.friction_impulse1 = old_impulse.dot(&manifold.friction_vector1);
                manifold.friction_impulse2 = old_impulse.dot(&manifold.friction_vector2);

                let impulse = manifold.friction_vector1 * manifold.friction_impulse1
                    + manifold.friction_vector2 * manifold.friction_impulse2;
                velocities.apply_linear_impulse(
                    index1,
                    index2,
                    manifold.r1_friction,
                    manifold.r2_friction,
                    impulse,
                );
                velocities.apply_angular_impulse(
                    index1,
                    index2,
                    manifold.normal * manifold.friction_twist_impulse,
                );
            } else {
                manifold.friction_impulse1 = 0.0;
                manifold.friction_impulse2 = 0.0;
                manifold.friction_twist_impulse = 0.0;
            }
        }
    }

    /// One Gauss-Seidel pass over every contact constraint
    pub fn solve(&mut self, velocities: &mut ConstrainedVelocities) {
        let beta_over_dt = self.baumgarte_factor / self.time_step;

        for manifold in &mut self.manifolds {
            let (index1, index2) = (manifold.index1, manifold.index2);
            let mut sum_penetration_impulse = 0.0;

            for point in &mut manifold.points {
                let delta_v = relative_velocity(
                    &velocities.linear,
                    &velocities.angular,
                    index1,
                    index2,
                    point.r1,
                    point.r2,
                );
                let jv = delta_v.dot(&point.normal);

                let bias_penetration = if self.is_error_correction_active {
                    -beta_over_dt * (point.penetration_depth - self.slop).max(0.0)
                } else {
                    0.0
                };

                let bias = if self.is_split_impulse_active {
                    point.restitution_bias
                } else {
                    bias_penetration + point.restitution_bias
                };
                let lambda = -(jv + bias) * point.inverse_penetration_mass;
                let previous = point.penetration_impulse;
                point.penetration_impulse = (previous + lambda).max(0.0);
                let delta_lambda = point.penetration_impulse - previous;
                velocities.apply_linear_impulse(
                    index1,
                    index2,
                    point.r1,
                    point.r2,
                    point.normal * delta_lambda,
                );
                sum_penetration_impulse += point.penetration_impulse;

                if self.is_split_impulse_active {
                    let delta_v_split = relative_velocity(
                        &velocities.split_linear,
                        &velocities.split_angular,
                        index1,
                        index2,
                        point.r1,
                        point.r2,
                    );
                    let jv_split = delta_v_split.dot(&point.normal);
                    let lambda_split = -(jv_split + bias_penetration) * point.inverse_penetration_mass;
                    let previous_split = point.penetration_split_impulse;
                    point.penetration_split_impulse = (previous_split + lambda_split).max(0.0);
                    let delta_split = point.penetration_split_impulse - previous_split;
                    velocities.apply_split_impulse(
                        index1,
                        index2,
                        point.r1,
                        point.r2,
                        point.normal * delta_split,
                    );
                }

                if !self.is_solve_friction_at_manifold_center_active {
                    let limit = manifold.friction_coefficient * point.penetration_impulse;

                    for axis in 0..2 {
                        let (direction, inverse_mass) = if axis == 0 {
                            (point.friction_vector1, point.inverse_friction_mass1)
                        } else {
                            (point.friction_vector2, point.inverse_friction_mass2)
                        };
                        let delta_v = relative_velocity(
                            &velocities.linear,
                            &velocities.angular,
                            index1,
                            index2,
                            point.r1,
                            point.r2,
                        );
                        let lambda = -delta_v.dot(&direction) * inverse_mass;
                        let accumulated = if axis == 0 {
                            &mut point.friction_impulse1
                        } else {
                            &mut point.friction_impulse2
                        };
                        let previous = *accumulated;
                        *accumulated = (previous + lambda).clamp(-limit, limit);
                        let delta_lambda = *accumulated - previous;
                        velocities.apply_linear_impulse(
                            index1,
                            index2,
                            point.r1,
                            point.r2,
                            direction * delta_lambda,
                        );
                    }
                }
            }

            if self.is_solve_friction_at_manifold_center_active {
                let limit = manifold.friction_coefficient * sum_penetration_impulse;
                let (r1, r2) = (manifold.r1_friction, manifold.r2_friction);

                for axis in 0..2 {
                    let (direction, inverse_mass) = if axis == 0 {
                        (manifold.friction_vector1, manifold.inverse_friction_mass1)
                    } else {
                        (manifold.friction_vector2, manifold.inverse_friction_mass2)
                    };
                    let delta_v =
                        relative_velocity(&velocities.linear, &velocities.angular, index1, index2, r1, r2);
                    let lambda = -delta_v.dot(&direction) * inverse_mass;
                    let accumulated = if axis == 0 {
                        &mut manifold.friction_impulse1
                    } else {
                        &mut manifold.friction_impulse2
                    };
                    let previous = *accumulated;
                    *accumulated = (previous + lambda).clamp(-limit, limit);
                    let delta_lambda = *accumulated - previous;
                    velocities.apply_linear_impulse(index1, index2, r1, r2, direction * delta_lambda);
                }

                // Twist friction about the contact normal
                let delta_w = velocities.angular[index2] - velocities.angular[index1];
                let lambda = -delta_w.dot(&manifold.normal) * manifold.inverse_twist_friction_mass;
                let previous = manifold.friction_twist_impulse;
                manifold.friction_twist_impulse = (previous + lambda).clamp(-limit, limit);
                let delta_lambda = manifold.friction_twist_impulse - previous;
                velocities.apply_angular_impulse(index1, index2, manifold.normal * delta_lambda);
            }
        }
    }

    /// Writes the accumulated impulses back into the manifolds for the next step
    pub fn store_impulses(&self, manifolds: &mut [ContactManifold]) {
        for solver in &self.manifolds {
            let manifold = &mut manifolds[solver.manifold];
            for (point, point_solver) in manifold.points_mut().iter_mut().zip(&solver.points) {
                point.penetration_impulse = point_solver.penetration_impulse;
                point.friction_impulse1 = point_solver.friction_impulse1;
                point.friction_impulse2 = point_solver.friction_impulse2;
                point.friction_vectors = [point_solver.friction_vector1, point_solver.friction_vector2];
            }
            manifold.friction_impulse1 = solver.friction_impulse1;
            manifold.friction_impulse2 = solver.friction_impulse2;
            manifold.friction_twist_impulse = solver.friction_twist_impulse;
            manifold.friction_vector1 = solver.friction_vector1;
            manifold.friction_vector2 = solver.friction_vector2;
        }
    }
}
