use crate::bodies::{BodyFlags, Material, RigidBodyType};
use crate::collision::{CollisionCategory, CollisionFilter};
use crate::math::{Vector3, Transform, Matrix3, Quaternion, Aabb};
use crate::shapes::CollisionShape;

use std::fmt;
use std::sync::Arc;

/// A rigid body simulated by the dynamics world
#[derive(Clone)]
pub struct RigidBody {
    /// Current transform of the body (center of mass frame)
    transform: Transform,

    /// Transform at the beginning of the last step, used for interpolation
    previous_transform: Transform,

    /// Interpolation factor set by the fixed-step timer, in [0, 1)
    interpolation_factor: f32,

    linear_velocity: Vector3,
    angular_velocity: Vector3,

    /// Force accumulated since the last step, applied at the center of mass
    external_force: Vector3,

    /// Torque accumulated since the last step
    external_torque: Vector3,

    mass: f32,
    inverse_mass: f32,

    /// Inertia tensor in body space
    local_inertia: Matrix3,
    inverse_local_inertia: Matrix3,

    linear_damping: f32,
    angular_damping: f32,

    shape: Arc<dyn CollisionShape>,
    body_type: RigidBodyType,
    flags: BodyFlags,
    material: Material,
    filter: CollisionFilter,

    /// Time the body has spent below the sleep velocity thresholds
    sleep_time: f32,
}

impl RigidBody {
    /// Creates a dynamic body. `mass` must be positive and finite; the caller validates it.
    pub(crate) fn new_dynamic(
        transform: Transform,
        mass: f32,
        local_inertia: Matrix3,
        shape: Arc<dyn CollisionShape>,
    ) -> Self {
        let inverse_local_inertia = local_inertia.inverse().unwrap_or_else(Matrix3::zero);
        Self {
            transform,
            previous_transform: transform,
            interpolation_factor: 0.0,
            linear_velocity: Vector3::zero(),
            angular_velocity: Vector3::zero(),
            external_force: Vector3::zero(),
            external_torque: Vector3::zero(),
            mass,
            inverse_mass: 1.0 / mass,
            local_inertia,
            inverse_local_inertia,
            linear_damping: 0.0,
            angular_damping: 0.0,
            shape,
            body_type: RigidBodyType::Dynamic,
            flags: BodyFlags::default(),
            material: Material::default(),
            filter: CollisionFilter::new(CollisionCategory::DYNAMIC, CollisionCategory::ALL),
            sleep_time: 0.0,
        }
    }

    /// Creates a body with infinite mass (static or kinematic)
    pub(crate) fn new_immovable(
        transform: Transform,
        shape: Arc<dyn CollisionShape>,
        body_type: RigidBodyType,
    ) -> Self {
        let category = match body_type {
            RigidBodyType::Kinematic => CollisionCategory::KINEMATIC,
            _ => CollisionCategory::STATIC,
        };
        let mut flags = BodyFlags::default();
        flags.remove(BodyFlags::AFFECTED_BY_GRAVITY);
        Self {
            transform,
            previous_transform: transform,
            interpolation_factor: 0.0,
            linear_velocity: Vector3::zero(),
            angular_velocity: Vector3::zero(),
            external_force: Vector3::zero(),
            external_torque: Vector3::zero(),
            mass: f32::INFINITY,
            inverse_mass: 0.0,
            local_inertia: Matrix3::zero(),
            inverse_local_inertia: Matrix3::zero(),
            linear_damping: 0.0,
            angular_damping: 0.0,
            shape,
            body_type,
            flags,
            material: Material::default(),
            filter: CollisionFilter::new(category, CollisionCategory::ALL),
            sleep_time: 0.0,
        }
    }

    /// Returns the body's transform
    pub fn get_transform(&self) -> Transform {
        self.transform
    }

    /// Teleports the body. Wakes it up and flags it for a broad-phase update.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.previous_transform = transform;
        self.flags.insert(BodyFlags::HAS_MOVED);
        self.wake_up();
    }

    /// Transform interpolated between the last two steps for rendering
    pub fn get_interpolated_transform(&self) -> Transform {
        Transform::interpolate(&self.previous_transform, &self.transform, self.interpolation_factor)
    }

    pub fn get_interpolation_factor(&self) -> f32 {
        self.interpolation_factor
    }

    pub(crate) fn set_interpolation_factor(&mut self, factor: f32) {
        self.interpolation_factor = factor;
    }

    pub fn get_position(&self) -> Vector3 {
        self.transform.position
    }

    pub fn get_orientation(&self) -> Quaternion {
        self.transform.orientation
    }

    pub fn get_linear_velocity(&self) -> Vector3 {
        self.linear_velocity
    }

    /// Sets the linear velocity and wakes the body. Ignored for static bodies.
    pub fn set_linear_velocity(&mut self, velocity: Vector3) {
        if self.body_type == RigidBodyType::Static {
            return;
        }
        self.linear_velocity = velocity;
        if !velocity.is_zero() {
            self.wake_up();
        }
    }

    pub fn get_angular_velocity(&self) -> Vector3 {
        self.angular_velocity
    }

    /// Sets the angular velocity and wakes the body. Ignored for static bodies.
    pub fn set_angular_velocity(&mut self, velocity: Vector3) {
        if self.body_type == RigidBodyType::Static {
            return;
        }
        self.angular_velocity = velocity;
        if !velocity.is_zero() {
            self.wake_up();
        }
    }

    /// Mass of the body (infinite for static and kinematic bodies)
    pub fn get_mass(&self) -> f32 {
        self.mass
    }

    pub fn get_inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    pub fn get_local_inertia_tensor(&self) -> Matrix3 {
        self.local_inertia
    }

    /// Inverse inertia tensor in world space, `R * I^-1 * R^T`
    pub fn get_inverse_inertia_tensor_world(&self) -> Matrix3 {
        if self.inverse_mass == 0.0 {
            return Matrix3::zero();
        }
        let rotation = self.transform.rotation_matrix();
        rotation * self.inverse_local_inertia * rotation.transpose()
    }

    pub fn get_linear_damping(&self) -> f32 {
        self.linear_damping
    }

    /// Sets the linear damping coefficient (clamped to be non-negative)
    pub fn set_linear_damping(&mut self, damping: f32) {
        self.linear_damping = damping.max(0.0);
    }

    pub fn get_angular_damping(&self) -> f32 {
        self.angular_damping
    }

    /// Sets the angular damping coefficient (clamped to be non-negative)
    pub fn set_angular_damping(&mut self, damping: f32) {
        self.angular_damping = damping.max(0.0);
    }

    pub fn get_shape(&self) -> &Arc<dyn CollisionShape> {
        &self.shape
    }

    pub fn get_body_type(&self) -> RigidBodyType {
        self.body_type
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.body_type.is_dynamic()
    }

    pub fn get_material(&self) -> &Material {
        &self.material
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn get_collision_filter(&self) -> CollisionFilter {
        self.filter
    }

    /// Sets the categories the body belongs to and the ones it collides with.
    ///
    /// Takes effect for pairs created after the change.
    pub fn set_collision_filter(&mut self, category: CollisionCategory, mask: CollisionCategory) {
        self.filter = CollisionFilter::new(category, mask);
    }

    pub fn is_sleeping(&self) -> bool {
        self.flags.contains(BodyFlags::SLEEPING)
    }

    pub fn is_allowed_to_sleep(&self) -> bool {
        self.flags.contains(BodyFlags::CAN_SLEEP)
    }

    /// Allows or forbids sleeping. Forbidding it wakes the body.
    pub fn set_is_allowed_to_sleep(&mut self, allowed: bool) {
        self.flags.set(BodyFlags::CAN_SLEEP, allowed);
        if !allowed {
            self.wake_up();
        }
    }

    pub fn is_gravity_enabled(&self) -> bool {
        self.flags.contains(BodyFlags::AFFECTED_BY_GRAVITY)
    }

    pub fn enable_gravity(&mut self, enabled: bool) {
        self.flags.set(BodyFlags::AFFECTED_BY_GRAVITY, enabled);
    }

    /// Wakes the body up if it is sleeping
    pub fn wake_up(&mut self) {
        if self.body_type != RigidBodyType::Static && self.is_sleeping() {
            self.set_is_sleeping(false);
        }
    }

    /// Changes the sleeping state. Putting a body to sleep zeroes its velocities and forces.
    /// The rest timer only restarts when the state actually changes.
    pub(crate) fn set_is_sleeping(&mut self, sleeping: bool) {
        if sleeping == self.is_sleeping() {
            return;
        }
        if sleeping {
            self.previous_transform = self.transform;
            self.linear_velocity = Vector3::zero();
            self.angular_velocity = Vector3::zero();
            self.external_force = Vector3::zero();
            self.external_torque = Vector3::zero();
        }
        self.sleep_time = 0.0;
        self.flags.set(BodyFlags::SLEEPING, sleeping);
    }

    pub(crate) fn get_sleep_time(&self) -> f32 {
        self.sleep_time
    }

    pub(crate) fn set_sleep_time(&mut self, time: f32) {
        self.sleep_time = time;
    }

    pub(crate) fn has_moved(&self) -> bool {
        self.flags.contains(BodyFlags::HAS_MOVED)
    }

    pub(crate) fn clear_has_moved(&mut self) {
        self.flags.remove(BodyFlags::HAS_MOVED);
    }

    /// Adds a force at the center of mass for the next step. Wakes the body.
    pub fn apply_force_to_center(&mut self, force: Vector3) {
        if !self.is_dynamic() {
            return;
        }
        self.wake_up();
        self.external_force += force;
    }

    /// Adds a force applied at a world-space point for the next step. Wakes the body.
    pub fn apply_force(&mut self, force: Vector3, point: Vector3) {
        if !self.is_dynamic() {
            return;
        }
        self.wake_up();
        self.external_force += force;
        self.external_torque += (point - self.transform.position).cross(&force);
    }

    /// Adds a torque for the next step. Wakes the body.
    pub fn apply_torque(&mut self, torque: Vector3) {
        if !self.is_dynamic() {
            return;
        }
        self.wake_up();
        self.external_torque += torque;
    }

    pub fn get_external_force(&self) -> Vector3 {
        self.external_force
    }

    pub fn get_external_torque(&self) -> Vector3 {
        self.external_torque
    }

    pub(crate) fn clear_forces(&mut self) {
        self.external_force = Vector3::zero();
        self.external_torque = Vector3::zero();
    }

    /// World-space bounds of the body's shape
    pub fn get_world_bounds(&self) -> Aabb {
        self.shape.world_bounds(&self.transform)
    }

    /// Stores integrated state at the end of a step
    pub(crate) fn update_state(
        &mut self,
        transform: Transform,
        linear_velocity: Vector3,
        angular_velocity: Vector3,
    ) {
        self.previous_transform = self.transform;
        self.transform = transform;
        self.linear_velocity = linear_velocity;
        self.angular_velocity = angular_velocity;
        self.flags.insert(BodyFlags::HAS_MOVED);
    }
}

impl fmt::Debug for RigidBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RigidBody")
            .field("body_type", &self.body_type)
            .field("position", &self.transform.position)
            .field("orientation", &self.transform.orientation)
            .field("linear_velocity", &self.linear_velocity)
            .field("angular_velocity", &self.angular_velocity)
            .field("mass", &self.mass)
            .field("shape", &self.shape.kind())
            .field("flags", &self.flags)
            .finish()
    }
}
