use crate::bodies::RigidBody;
use crate::collision::contact_manifold::ContactPointInfo;
use crate::collision::epa::Epa;
use crate::collision::gjk::{Gjk, GjkResult, SupportVertex};
use crate::math::{Transform, Vector3};
use crate::shapes::{world_core_support_point, world_support_point, CollisionShape};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One pair to test: two shapes with their transforms and the axis cached for the pair
#[derive(Debug, Clone, Copy)]
pub struct NarrowPhaseInput<'a> {
    pub shape1: &'a dyn CollisionShape,
    pub transform1: Transform,
    pub shape2: &'a dyn CollisionShape,
    pub transform2: Transform,
    pub cached_axis: Vector3,
}

impl<'a> NarrowPhaseInput<'a> {
    pub fn from_bodies(body1: &'a RigidBody, body2: &'a RigidBody, cached_axis: Vector3) -> Self {
        Self {
            shape1: body1.get_shape().as_ref(),
            transform1: body1.get_transform(),
            shape2: body2.get_shape().as_ref(),
            transform2: body2.get_transform(),
            cached_axis,
        }
    }
}

/// Result of one narrow-phase query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NarrowPhaseOutput {
    /// New contact point, in the local frames of the two bodies
    pub contact: Option<ContactPointInfo>,

    /// Axis to start from on the next query of the same pair
    pub separating_axis: Vector3,
}

/// Core distance, relative to the margin sum, below which the cores count as touching
const TOUCHING_CORE_TOLERANCE: f32 = 1.0e-4;

/// GJK/EPA contact generation between two convex shapes.
///
/// GJK first runs on the core shapes. If the cores are further apart than the
/// sum of the margins there is no contact. If they are closer, the contact is
/// built from the core closest points pushed out by each margin. If the cores
/// touch or overlap, EPA runs on the inflated shapes.
pub struct NarrowPhase;

impl NarrowPhase {
    pub fn compute_contact(input: &NarrowPhaseInput<'_>) -> NarrowPhaseOutput {
        let NarrowPhaseInput { shape1, transform1, shape2, transform2, cached_axis } = *input;
        let margin1 = shape1.margin();
        let margin2 = shape2.margin();
        let margin = margin1 + margin2;

        let core_support = |direction: Vector3| {
            SupportVertex::new(
                world_core_support_point(shape1, direction, &transform1),
                world_core_support_point(shape2, -direction, &transform2),
            )
        };

        match Gjk::compute(core_support, margin, cached_axis) {
            GjkResult::Separated { axis } => NarrowPhaseOutput {
                contact: None,
                separating_axis: axis,
            },
            GjkResult::Closest { point_a, point_b, distance } => {
                let axis = point_a - point_b;
                if distance >= margin {
                    return NarrowPhaseOutput {
                        contact: None,
                        separating_axis: axis,
                    };
                }
                // Touching cores give no usable normal
                if distance <= margin * TOUCHING_CORE_TOLERANCE {
                    return Self::compute_penetration(input);
                }
                let normal = (point_b - point_a) / distance;
                let contact_a = point_a + normal * margin1;
                let contact_b = point_b - normal * margin2;
                NarrowPhaseOutput {
                    contact: Some(ContactPointInfo {
                        normal,
                        penetration_depth: margin - distance,
                        local_point1: transform1.inverse_transform_point(contact_a),
                        local_point2: transform2.inverse_transform_point(contact_b),
                    }),
                    separating_axis: axis,
                }
            }
            GjkResult::Overlapping { .. } => Self::compute_penetration(input),
        }
    }

    /// Runs every query of `inputs`; the outputs keep the input order
    #[cfg(not(feature = "parallel"))]
    pub fn compute_contacts(inputs: &[NarrowPhaseInput<'_>]) -> Vec<NarrowPhaseOutput> {
        inputs.iter().map(Self::compute_contact).collect()
    }

    /// Runs every query of `inputs` on the rayon pool; the outputs keep the input order
    #[cfg(feature = "parallel")]
    pub fn compute_contacts(inputs: &[NarrowPhaseInput<'_>]) -> Vec<NarrowPhaseOutput> {
        inputs.par_iter().map(Self::compute_contact).collect()
    }

    /// Deep contact: the cores overlap, so the inflated shapes do too
    fn compute_penetration(input: &NarrowPhaseInput<'_>) -> NarrowPhaseOutput {
        let NarrowPhaseInput { shape1, transform1, shape2, transform2, cached_axis } = *input;

        let support = |direction: Vector3| {
            SupportVertex::new(
                world_support_point(shape1, direction, &transform1),
                world_support_point(shape2, -direction, &transform2),
            )
        };

        let simplex = match Gjk::compute(support, 0.0, cached_axis) {
            GjkResult::Overlapping { simplex } => simplex,
            _ => {
                return NarrowPhaseOutput {
                    contact: None,
                    separating_axis: cached_axis,
                }
            }
        };

        match Epa::compute(&simplex, support) {
            Some(penetration) if penetration.normal.is_finite() && penetration.depth.is_finite() => {
                NarrowPhaseOutput {
                    contact: Some(ContactPointInfo {
                        normal: penetration.normal,
                        penetration_depth: penetration.depth,
                        local_point1: transform1.inverse_transform_point(penetration.point_a),
                        local_point2: transform2.inverse_transform_point(penetration.point_b),
                    }),
                    separating_axis: -penetration.normal,
                }
            }
            _ => NarrowPhaseOutput {
                contact: None,
                separating_axis: cached_axis,
            },
        }
    }
}
