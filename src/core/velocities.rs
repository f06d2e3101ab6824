use std::collections::HashMap;

use crate::bodies::RigidBody;
use crate::core::{BodyHandle, BodyStorage};
use crate::math::{Matrix3, Vector3};

/// Dense index of the bodies taking part in one step.
///
/// Every non-sleeping body gets a slot, in arena order. Rebuilt each step.
#[derive(Debug, Default)]
pub struct BodyIndexMap {
    indices: HashMap<BodyHandle, usize>,
    handles: Vec<BodyHandle>,
}

impl BodyIndexMap {
    pub(crate) fn build(bodies: &BodyStorage<RigidBody>) -> Self {
        let handles: Vec<BodyHandle> = bodies
            .iter()
            .filter(|(_, body)| !body.is_sleeping())
            .map(|(handle, _)| handle)
            .collect();
        let indices = handles
            .iter()
            .enumerate()
            .map(|(index, handle)| (*handle, index))
            .collect();
        Self { indices, handles }
    }

    /// Slot of a body, or None if it does not take part in the step
    #[inline]
    pub fn index(&self, handle: BodyHandle) -> Option<usize> {
        self.indices.get(&handle).copied()
    }

    #[inline]
    pub fn handle(&self, index: usize) -> BodyHandle {
        self.handles[index]
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn handles(&self) -> &[BodyHandle] {
        &self.handles
    }
}

/// Step-scoped velocity arrays shared by the contact and joint solvers.
///
/// `linear` and `angular` start from the body velocities with external forces
/// and gravity applied. The split arrays collect the pseudo velocities of the
/// position correction and only feed the position integration.
#[derive(Debug, Default)]
pub struct ConstrainedVelocities {
    pub linear: Vec<Vector3>,
    pub angular: Vec<Vector3>,
    pub split_linear: Vec<Vector3>,
    pub split_angular: Vec<Vector3>,
    /// Inverse mass of each slot (zero for static and kinematic bodies)
    pub inverse_mass: Vec<f32>,
    /// World-space inverse inertia tensor of each slot
    pub inverse_inertia: Vec<Matrix3>,
    /// True for slots that hold a dynamic body
    pub is_dynamic: Vec<bool>,
}

impl ConstrainedVelocities {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            linear: Vec::with_capacity(capacity),
            angular: Vec::with_capacity(capacity),
            split_linear: vec![Vector3::zero(); capacity],
            split_angular: vec![Vector3::zero(); capacity],
            inverse_mass: Vec::with_capacity(capacity),
            inverse_inertia: Vec::with_capacity(capacity),
            is_dynamic: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, body: &RigidBody, linear: Vector3, angular: Vector3) {
        self.linear.push(linear);
        self.angular.push(angular);
        self.inverse_mass.push(body.get_inverse_mass());
        self.inverse_inertia.push(body.get_inverse_inertia_tensor_world());
        self.is_dynamic.push(body.is_dynamic());
    }

    pub fn len(&self) -> usize {
        self.linear.len()
    }

    pub fn is_empty(&self) -> bool {
        self.linear.is_empty()
    }

    /// Applies an impulse pair at the two anchors of a constraint.
    ///
    /// `r1` and `r2` go from each center of mass to the anchor. `impulse` acts on
    /// body 2 and its opposite on body 1.
    #[inline]
    pub fn apply_linear_impulse(
        &mut self,
        index1: usize,
        index2: usize,
        r1: Vector3,
        r2: Vector3,
        impulse: Vector3,
    ) {
        self.linear[index1] -= impulse * self.inverse_mass[index1];
        self.angular[index1] -= self.inverse_inertia[index1] * r1.cross(&impulse);
        self.linear[index2] += impulse * self.inverse_mass[index2];
        self.angular[index2] += self.inverse_inertia[index2] * r2.cross(&impulse);
    }

    /// Applies an angular impulse on body 2 and its opposite on body 1
    #[inline]
    pub fn apply_angular_impulse(&mut self, index1: usize, index2: usize, impulse: Vector3) {
        self.angular[index1] -= self.inverse_inertia[index1] * impulse;
        self.angular[index2] += self.inverse_inertia[index2] * impulse;
    }

    /// Same as `apply_linear_impulse` on the split arrays
    #[inline]
    pub fn apply_split_impulse(
        &mut self,
        index1: usize,
        index2: usize,
        r1: Vector3,
        r2: Vector3,
        impulse: Vector3,
    ) {
        self.split_linear[index1] -= impulse * self.inverse_mass[index1];
        self.split_angular[index1] -= self.inverse_inertia[index1] * r1.cross(&impulse);
        self.split_linear[index2] += impulse * self.inverse_mass[index2];
        self.split_angular[index2] += self.inverse_inertia[index2] * r2.cross(&impulse);
    }
}
