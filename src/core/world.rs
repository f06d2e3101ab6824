use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::bodies::{Material, RigidBody, RigidBodyType};
use crate::collision::{
    BodyPair, BroadPhase, ContactConstraint, ContactManifold, ContactSolver, NarrowPhase,
    NarrowPhaseInput, OverlappingPair, SpatialHashing,
};
use crate::constraints::{ConstraintSolver, Joint, JointConstraint, JointInfo};
use crate::core::{
    BodyEventType, BodyHandle, BodyIndexMap, BodyStorage, ConstrainedVelocities, ContactEventType,
    DynamicsConfig, EventQueue, Island, IslandBuilder, JointHandle, JointStorage, Timer,
};
use crate::error::PhysicsError;
use crate::integration::{Integrator, SymplecticEulerIntegrator};
use crate::math::{Matrix3, Transform, Vector3};
use crate::shapes::CollisionShape;
use crate::Result;

/// A world of rigid bodies, joints and contacts advanced with a fixed time step.
///
/// Each step runs, in order: broad phase, overlapping pair maintenance,
/// manifold refresh and narrow phase, wake-up propagation, constrained
/// velocity setup (gravity, external forces, damping), island building, the
/// joint and contact solvers, position integration, and the sleep pass.
/// Bodies are only mutated by the integration and sleep stages.
pub struct DynamicsWorld {
    bodies: BodyStorage<RigidBody>,
    joints: JointStorage<Box<dyn Joint>>,

    /// Pairs reported by the broad phase, in canonical pair order
    pairs: BTreeMap<BodyPair, OverlappingPair>,

    broad_phase: Box<dyn BroadPhase>,
    integrator: Box<dyn Integrator>,
    config: DynamicsConfig,
    timer: Timer,
    events: EventQueue,
}

/// Contact manifolds taken out of their pairs for the duration of a step
struct StepContacts {
    pairs: Vec<BodyPair>,
    manifolds: Vec<ContactManifold>,
    constraints: Vec<ContactConstraint>,
    edges: Vec<(usize, usize)>,
}

/// Joints taking part in a step
struct StepJoints {
    constraints: Vec<JointConstraint>,
    edges: Vec<(usize, usize)>,
}

impl DynamicsWorld {
    /// Creates a world with the default configuration
    pub fn new() -> Self {
        Self::with_config(DynamicsConfig::default())
    }

    /// Creates a world with the given configuration and a spatial hashing broad phase
    pub fn with_config(config: DynamicsConfig) -> Self {
        Self::with_broad_phase(config, Box::new(SpatialHashing::default()))
    }

    /// Creates a world with the given configuration and broad phase
    pub fn with_broad_phase(config: DynamicsConfig, broad_phase: Box<dyn BroadPhase>) -> Self {
        let timer = Timer::new(config.time_step);
        Self {
            bodies: BodyStorage::new(),
            joints: JointStorage::new(),
            pairs: BTreeMap::new(),
            broad_phase,
            integrator: Box::new(SymplecticEulerIntegrator::new()),
            config,
            timer,
            events: EventQueue::new(),
        }
    }

    /// Replaces the position integration scheme
    pub fn set_integrator(&mut self, integrator: Box<dyn Integrator>) {
        debug!("Using integrator {}", integrator.name());
        self.integrator = integrator;
    }

    pub fn config(&self) -> &DynamicsConfig {
        &self.config
    }

    /// Mutable access to the configuration. Checked before every step.
    pub fn config_mut(&mut self) -> &mut DynamicsConfig {
        &mut self.config
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    // Bodies

    /// Creates a dynamic body.
    ///
    /// `local_inertia` is the inertia tensor in the body frame, usually
    /// `shape.local_inertia_tensor(mass)`.
    pub fn create_rigid_body(
        &mut self,
        transform: Transform,
        mass: f32,
        local_inertia: Matrix3,
        shape: Arc<dyn CollisionShape>,
    ) -> Result<BodyHandle> {
        if !(mass > 0.0 && mass.is_finite()) {
            return Err(PhysicsError::InvalidParameter(format!(
                "body mass must be positive and finite, got {}",
                mass
            )));
        }
        if !local_inertia.is_finite() {
            return Err(PhysicsError::InvalidParameter(
                "inertia tensor must be finite".into(),
            ));
        }
        let transform = Self::checked_transform(transform)?;
        let body = RigidBody::new_dynamic(transform, mass, local_inertia, shape);
        Ok(self.insert_body(body))
    }

    /// Creates a static body: infinite mass, never moves, never sleeps
    pub fn create_static_body(&mut self, transform: Transform, shape: Arc<dyn CollisionShape>) -> BodyHandle {
        let transform = Transform::new(transform.position, transform.orientation.normalize());
        self.insert_body(RigidBody::new_immovable(transform, shape, RigidBodyType::Static))
    }

    /// Creates a kinematic body: infinite mass, moved by its user-set velocity
    pub fn create_kinematic_body(&mut self, transform: Transform, shape: Arc<dyn CollisionShape>) -> BodyHandle {
        let transform = Transform::new(transform.position, transform.orientation.normalize());
        self.insert_body(RigidBody::new_immovable(transform, shape, RigidBodyType::Kinematic))
    }

    fn checked_transform(transform: Transform) -> Result<Transform> {
        if !transform.is_finite() {
            return Err(PhysicsError::InvalidParameter(
                "body transform must be finite".into(),
            ));
        }
        Ok(Transform::new(transform.position, transform.orientation.normalize()))
    }

    fn insert_body(&mut self, body: RigidBody) -> BodyHandle {
        let bounds = body.get_world_bounds();
        let body_type = body.get_body_type();
        let handle = self.bodies.insert(body);
        self.broad_phase.add_object(handle, bounds);
        self.events.push_body_event(BodyEventType::Added, handle);
        debug!("Created {:?} body {}", body_type, handle);
        handle
    }

    /// Destroys a body with its joints and overlapping pairs.
    ///
    /// Bodies that were touching it or jointed to it are woken up.
    pub fn destroy_rigid_body(&mut self, handle: BodyHandle) -> Result<()> {
        if !self.bodies.contains(handle) {
            return Err(PhysicsError::ResourceNotFound(format!("{}", handle)));
        }

        let joints: Vec<JointHandle> = self
            .joints
            .iter()
            .filter(|(_, joint)| joint.body1() == handle || joint.body2() == handle)
            .map(|(joint_handle, _)| joint_handle)
            .collect();
        for joint in joints {
            self.destroy_joint(joint)?;
        }

        let pairs: Vec<BodyPair> = self.pairs.keys().filter(|pair| pair.contains(handle)).copied().collect();
        for pair in pairs {
            if let Some(other) = pair.other(handle) {
                self.wake_body(other);
            }
            self.destroy_pair(pair);
        }

        self.broad_phase.remove_object(handle);
        self.bodies.remove(handle);
        self.events.push_body_event(BodyEventType::Removed, handle);
        debug!("Destroyed body {}", handle);
        Ok(())
    }

    pub fn rigid_body(&self, handle: BodyHandle) -> Result<&RigidBody> {
        self.bodies.try_get(handle)
    }

    pub fn rigid_body_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody> {
        self.bodies.try_get_mut(handle)
    }

    /// Every body of the world, in handle order
    pub fn rigid_bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> + '_ {
        self.bodies.iter()
    }

    /// Bodies that are not sleeping
    pub fn active_bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> + '_ {
        self.bodies.iter().filter(|(_, body)| !body.is_sleeping())
    }

    pub fn nb_rigid_bodies(&self) -> usize {
        self.bodies.len()
    }

    // Joints

    /// Creates a joint between two existing bodies.
    ///
    /// If the joint disables collision between its bodies, their current
    /// overlapping pair is dropped. Both bodies are woken up.
    pub fn create_joint(&mut self, info: JointInfo) -> Result<JointHandle> {
        info.validate()?;
        let (handle1, handle2) = (info.body1(), info.body2());
        let transform1 = self.bodies.try_get(handle1)?.get_transform();
        let transform2 = self.bodies.try_get(handle2)?.get_transform();

        let joint = info.build(&transform1, &transform2);
        if !joint.is_collision_enabled() {
            let pair = BodyPair::new(handle1, handle2);
            if self.pairs.contains_key(&pair) {
                self.destroy_pair(pair);
            }
        }

        let joint_type = joint.joint_type();
        let handle = self.joints.insert(joint);
        self.wake_body(handle1);
        self.wake_body(handle2);
        debug!("Created {:?} joint {} between {} and {}", joint_type, handle, handle1, handle2);
        Ok(handle)
    }

    /// Destroys a joint and wakes its two bodies up
    pub fn destroy_joint(&mut self, handle: JointHandle) -> Result<()> {
        let joint = self
            .joints
            .remove(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("{}", handle)))?;
        self.wake_body(joint.body1());
        self.wake_body(joint.body2());
        debug!("Destroyed {:?} joint {}", joint.joint_type(), handle);
        Ok(())
    }

    pub fn joint(&self, handle: JointHandle) -> Result<&dyn Joint> {
        self.joints.try_get(handle).map(|joint| &**joint)
    }

    pub fn joint_mut(&mut self, handle: JointHandle) -> Result<&mut dyn Joint> {
        self.joints.try_get_mut(handle).map(|joint| &mut **joint)
    }

    pub fn joints(&self) -> impl Iterator<Item = (JointHandle, &dyn Joint)> + '_ {
        self.joints.iter().map(|(handle, joint)| (handle, &**joint))
    }

    pub fn nb_joints(&self) -> usize {
        self.joints.len()
    }

    // Contacts

    /// Number of overlapping pairs that currently hold contact points
    pub fn nb_contact_manifolds(&self) -> usize {
        self.pairs.values().filter(|pair| !pair.manifold().is_empty()).count()
    }

    /// Non-empty contact manifolds, in canonical pair order
    pub fn contact_manifolds(&self) -> impl Iterator<Item = (BodyPair, &ContactManifold)> + '_ {
        self.pairs
            .values()
            .filter(|pair| !pair.manifold().is_empty())
            .map(|pair| (pair.pair(), pair.manifold()))
    }

    /// Number of pairs whose bounds overlap
    pub fn nb_overlapping_pairs(&self) -> usize {
        self.pairs.len()
    }

    // Tunables

    /// Sets the number of velocity iterations. Rejects zero.
    pub fn set_nb_iterations_solver(&mut self, iterations: u32) -> Result<()> {
        if iterations == 0 {
            warn!("Rejected solver iteration count of zero");
            return Err(PhysicsError::InvalidParameter(
                "the solver needs at least one iteration".into(),
            ));
        }
        self.config.nb_iterations_solver = iterations;
        Ok(())
    }

    /// Sets the fixed time step. Rejects non-positive or non-finite values.
    pub fn set_time_step(&mut self, time_step: f32) -> Result<()> {
        if !(time_step > 0.0 && time_step.is_finite()) {
            warn!("Rejected time step {}", time_step);
            return Err(PhysicsError::InvalidParameter(format!(
                "time step must be positive and finite, got {}",
                time_step
            )));
        }
        self.config.time_step = time_step;
        self.timer.set_time_step(time_step);
        Ok(())
    }

    pub fn get_gravity(&self) -> Vector3 {
        self.config.gravity
    }

    /// Sets the gravity vector. Rejects non-finite vectors.
    pub fn set_gravity(&mut self, gravity: Vector3) -> Result<()> {
        if !gravity.is_finite() {
            warn!("Rejected gravity {}", gravity);
            return Err(PhysicsError::InvalidParameter(format!(
                "gravity must be finite, got {}",
                gravity
            )));
        }
        self.config.gravity = gravity;
        Ok(())
    }

    pub fn set_is_gravity_on(&mut self, on: bool) {
        self.config.is_gravity_on = on;
    }

    pub fn set_is_split_impulse_active(&mut self, active: bool) {
        self.config.is_split_impulse_active = active;
    }

    pub fn set_is_solve_friction_at_contact_manifold_center_active(&mut self, active: bool) {
        self.config.is_solve_friction_at_contact_manifold_center_active = active;
    }

    pub fn set_is_error_correction_active(&mut self, active: bool) {
        self.config.is_error_correction_active = active;
    }

    pub fn set_is_warm_starting_active(&mut self, active: bool) {
        self.config.is_warm_starting_active = active;
    }

    /// Turns sleeping on or off. Turning it off wakes every body.
    pub fn set_is_deactivation_active(&mut self, active: bool) {
        self.config.is_deactivation_active = active;
        if !active {
            for (_, body) in self.bodies.iter_mut() {
                body.wake_up();
            }
        }
    }

    // Stepping

    /// Runs exactly one fixed step
    pub fn step(&mut self) -> Result<()> {
        self.config.validate()?;
        self.timer.set_time_step(self.config.time_step);
        self.events.begin_step();
        let result = self.run_step();
        self.events.end_step();
        result?;
        self.timer.record_step();
        Ok(())
    }

    /// Advances the simulation by `elapsed` seconds of real time.
    ///
    /// Runs as many fixed steps as the accumulated time allows, at most
    /// `max_substeps`, then sets the interpolation factor of every body.
    pub fn update(&mut self, elapsed: f32) -> Result<()> {
        self.config.validate()?;
        self.timer.set_time_step(self.config.time_step);
        self.timer.accumulate(elapsed);
        self.events.begin_step();
        let result = self.run_steps();
        self.events.end_step();
        result
    }

    fn run_steps(&mut self) -> Result<()> {
        let mut nb_steps = 0;
        while self.timer.is_possible_to_take_step() {
            if nb_steps == self.config.max_substeps {
                warn!(
                    "Dropping simulation backlog after {} steps in one update",
                    nb_steps
                );
                self.timer.discard_backlog();
                break;
            }
            self.run_step()?;
            self.timer.consume_step();
            nb_steps += 1;
        }

        let factor = self.timer.interpolation_factor();
        for (_, body) in self.bodies.iter_mut() {
            body.set_interpolation_factor(factor);
        }
        Ok(())
    }

    fn run_step(&mut self) -> Result<()> {
        let dt = self.config.time_step;

        self.update_broad_phase();
        self.compute_contacts();
        self.wake_up_connected_bodies();

        let index_map = BodyIndexMap::build(&self.bodies);
        let mut velocities = self.init_velocities(&index_map, dt)?;

        let mut contacts = self.collect_contacts(&index_map)?;
        let joints = self.collect_joints(&index_map)?;
        let islands = IslandBuilder::new(index_map.len()).build(
            &velocities.is_dynamic,
            &contacts.edges,
            &joints.edges,
        );
        trace!(
            "Step: {} bodies, {} manifolds, {} joints, {} islands",
            index_map.len(),
            contacts.manifolds.len(),
            joints.constraints.len(),
            islands.len()
        );

        for island in &islands {
            self.solve_island(island, &mut contacts, &joints, &mut velocities, dt);
        }

        for (pair, manifold) in contacts.pairs.iter().zip(contacts.manifolds) {
            if let Some(overlapping) = self.pairs.get_mut(pair) {
                *overlapping.manifold_mut() = manifold;
            }
        }

        self.integrate(&index_map, &velocities, dt)?;

        for (_, body) in self.bodies.iter_mut() {
            body.clear_forces();
        }

        self.update_sleeping_bodies(&index_map, &islands, dt);
        Ok(())
    }

    /// Moves the bounds of the bodies that moved and refreshes the pair set
    fn update_broad_phase(&mut self) {
        for (handle, body) in self.bodies.iter_mut() {
            if body.has_moved() {
                self.broad_phase.update_object(handle, body.get_world_bounds());
                body.clear_has_moved();
            }
        }

        let delta = self.broad_phase.compute_pairs();
        trace!(
            "Broad phase: {} added, {} removed, {} persisting",
            delta.added.len(),
            delta.removed.len(),
            delta.persisting.len()
        );

        for pair in delta.removed {
            if self.pairs.contains_key(&pair) {
                self.destroy_pair(pair);
            }
        }

        for pair in delta.added.into_iter().chain(delta.persisting) {
            let eligible = self.should_collide(pair);
            let exists = self.pairs.contains_key(&pair);
            if eligible && !exists {
                self.pairs.insert(pair, OverlappingPair::new(pair));
            } else if !eligible && exists {
                self.destroy_pair(pair);
            }
        }
    }

    /// Whether two overlapping bodies may generate contacts
    fn should_collide(&self, pair: BodyPair) -> bool {
        let (body1, body2) = match (self.bodies.get(pair.body1()), self.bodies.get(pair.body2())) {
            (Some(body1), Some(body2)) => (body1, body2),
            _ => return false,
        };
        if !body1.is_dynamic() && !body2.is_dynamic() {
            return false;
        }
        if !body1.get_collision_filter().can_collide(&body2.get_collision_filter()) {
            return false;
        }
        !self.joints.iter().any(|(_, joint)| {
            !joint.is_collision_enabled() && BodyPair::new(joint.body1(), joint.body2()) == pair
        })
    }

    fn destroy_pair(&mut self, pair: BodyPair) {
        if let Some(overlapping) = self.pairs.remove(&pair) {
            if !overlapping.manifold().is_empty() {
                self.events.push_contact_event(ContactEventType::End, pair);
            }
        }
    }

    fn wake_body(&mut self, handle: BodyHandle) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.wake_up();
        }
    }

    /// True for a body that can wake up the bodies it touches
    fn is_waking(body: &RigidBody) -> bool {
        if body.is_sleeping() {
            return false;
        }
        match body.get_body_type() {
            RigidBodyType::Dynamic => true,
            RigidBodyType::Kinematic => {
                !body.get_linear_velocity().is_zero() || !body.get_angular_velocity().is_zero()
            }
            RigidBodyType::Static => false,
        }
    }

    /// Refreshes the manifolds of the active pairs and runs the narrow phase on them
    fn compute_contacts(&mut self) {
        let threshold = self.config.persistent_contact_distance_threshold;
        let mut keys = Vec::new();
        let mut was_empty = Vec::new();
        let mut inputs = Vec::new();

        for (pair, overlapping) in self.pairs.iter_mut() {
            let (body1, body2) = match (self.bodies.get(pair.body1()), self.bodies.get(pair.body2())) {
                (Some(body1), Some(body2)) => (body1, body2),
                _ => continue,
            };
            if !Self::is_waking(body1) && !Self::is_waking(body2) {
                continue;
            }

            was_empty.push(overlapping.manifold().is_empty());
            overlapping
                .manifold_mut()
                .update(&body1.get_transform(), &body2.get_transform(), threshold);
            keys.push(*pair);
            inputs.push(NarrowPhaseInput::from_bodies(
                body1,
                body2,
                overlapping.cached_separating_axis(),
            ));
        }

        let outputs = NarrowPhase::compute_contacts(&inputs);
        drop(inputs);

        let mut nb_new_points = 0;
        for ((pair, output), was_empty) in keys.iter().zip(outputs).zip(was_empty) {
            let (transform1, transform2) = match (self.bodies.get(pair.body1()), self.bodies.get(pair.body2())) {
                (Some(body1), Some(body2)) => (body1.get_transform(), body2.get_transform()),
                _ => continue,
            };
            let overlapping = match self.pairs.get_mut(pair) {
                Some(overlapping) => overlapping,
                None => continue,
            };

            overlapping.set_cached_separating_axis(output.separating_axis);
            if let Some(info) = output.contact {
                overlapping
                    .manifold_mut()
                    .add_contact_point(&info, &transform1, &transform2, threshold);
                nb_new_points += 1;
            }

            let is_empty = overlapping.manifold().is_empty();
            if was_empty && !is_empty {
                self.events.push_contact_event(ContactEventType::Begin, *pair);
            } else if !was_empty && is_empty {
                self.events.push_contact_event(ContactEventType::End, *pair);
            }
        }
        trace!("Narrow phase: {} pairs tested, {} contact points", keys.len(), nb_new_points);
    }

    /// Wakes the sleeping dynamic bodies reachable from a waking body through
    /// contacts and joints
    fn wake_up_connected_bodies(&mut self) {
        let mut neighbours: BTreeMap<BodyHandle, Vec<BodyHandle>> = BTreeMap::new();
        let contact_edges = self
            .pairs
            .values()
            .filter(|pair| !pair.manifold().is_empty())
            .map(|pair| (pair.pair().body1(), pair.pair().body2()));
        let joint_edges = self.joints.iter().map(|(_, joint)| (joint.body1(), joint.body2()));
        for (a, b) in contact_edges.chain(joint_edges) {
            neighbours.entry(a).or_default().push(b);
            neighbours.entry(b).or_default().push(a);
        }

        let mut queue: VecDeque<BodyHandle> = neighbours
            .keys()
            .copied()
            .filter(|handle| self.bodies.get(*handle).map_or(false, Self::is_waking))
            .collect();

        while let Some(handle) = queue.pop_front() {
            let adjacent = match neighbours.get(&handle) {
                Some(adjacent) => adjacent,
                None => continue,
            };
            for other in adjacent {
                if let Some(body) = self.bodies.get_mut(*other) {
                    if body.is_dynamic() && body.is_sleeping() {
                        body.wake_up();
                        self.events.push_body_event(BodyEventType::Awake, *other);
                        debug!("Woke up body {} from {}", other, handle);
                        queue.push_back(*other);
                    }
                }
            }
        }
    }

    /// Builds the constrained velocity arrays: velocities after gravity,
    /// external forces and damping
    fn init_velocities(&self, index_map: &BodyIndexMap, dt: f32) -> Result<ConstrainedVelocities> {
        let mut velocities = ConstrainedVelocities::with_capacity(index_map.len());
        let gravity = if self.config.is_gravity_on {
            self.config.gravity
        } else {
            Vector3::zero()
        };

        for &handle in index_map.handles() {
            let body = self
                .bodies
                .get(handle)
                .ok_or_else(|| PhysicsError::InternalError(format!("missing body {}", handle)))?;
            let mut linear = body.get_linear_velocity();
            let mut angular = body.get_angular_velocity();

            if body.is_dynamic() {
                if body.is_gravity_enabled() {
                    linear += gravity * dt;
                }
                linear += body.get_external_force() * (body.get_inverse_mass() * dt);
                angular += body.get_inverse_inertia_tensor_world() * body.get_external_torque() * dt;

                linear *= 1.0 / (1.0 + dt * body.get_linear_damping());
                angular *= 1.0 / (1.0 + dt * body.get_angular_damping());
            }

            velocities.push(body, linear, angular);
        }
        Ok(velocities)
    }

    /// Takes out the manifolds that join two bodies of the step
    fn collect_contacts(&mut self, index_map: &BodyIndexMap) -> Result<StepContacts> {
        let mut contacts = StepContacts {
            pairs: Vec::new(),
            manifolds: Vec::new(),
            constraints: Vec::new(),
            edges: Vec::new(),
        };

        for (pair, overlapping) in self.pairs.iter_mut() {
            if overlapping.manifold().is_empty() {
                continue;
            }
            let (index1, index2) = match (index_map.index(pair.body1()), index_map.index(pair.body2())) {
                (Some(index1), Some(index2)) => (index1, index2),
                _ => continue,
            };
            let body1 = self.bodies.try_get(pair.body1())?;
            let body2 = self.bodies.try_get(pair.body2())?;
            if !body1.is_dynamic() && !body2.is_dynamic() {
                continue;
            }

            contacts.constraints.push(ContactConstraint {
                manifold: contacts.manifolds.len(),
                body1: index1,
                body2: index2,
                center1: body1.get_position(),
                center2: body2.get_position(),
                friction: Material::mix_friction(body1.get_material(), body2.get_material()),
                restitution: Material::mix_restitution(body1.get_material(), body2.get_material()),
            });
            contacts.edges.push((index1, index2));
            contacts.pairs.push(*pair);
            contacts.manifolds.push(std::mem::take(overlapping.manifold_mut()));
        }
        Ok(contacts)
    }

    fn collect_joints(&self, index_map: &BodyIndexMap) -> Result<StepJoints> {
        let mut joints = StepJoints {
            constraints: Vec::new(),
            edges: Vec::new(),
        };
        for (handle, joint) in self.joints.iter() {
            let (index1, index2) = match (index_map.index(joint.body1()), index_map.index(joint.body2())) {
                (Some(index1), Some(index2)) => (index1, index2),
                _ => continue,
            };
            joints.constraints.push(JointConstraint {
                joint: handle,
                body1: index1,
                body2: index2,
                transform1: self.bodies.try_get(joint.body1())?.get_transform(),
                transform2: self.bodies.try_get(joint.body2())?.get_transform(),
            });
            joints.edges.push((index1, index2));
        }
        Ok(joints)
    }

    fn solve_island(
        &mut self,
        island: &Island,
        contacts: &mut StepContacts,
        joints: &StepJoints,
        velocities: &mut ConstrainedVelocities,
        dt: f32,
    ) {
        let contact_constraints: Vec<ContactConstraint> =
            island.manifolds.iter().map(|&i| contacts.constraints[i]).collect();
        let joint_constraints: Vec<JointConstraint> =
            island.joints.iter().map(|&i| joints.constraints[i]).collect();
        if contact_constraints.is_empty() && joint_constraints.is_empty() {
            return;
        }

        let joint_solver = ConstraintSolver::new(&self.config, dt);
        let mut contact_solver = ContactSolver::new(&self.config, dt);

        joint_solver.init(&mut self.joints, &joint_constraints, velocities);
        contact_solver.init(&contact_constraints, &contacts.manifolds, velocities);

        joint_solver.warm_start(&mut self.joints, &joint_constraints, velocities);
        contact_solver.warm_start(velocities);

        for _ in 0..self.config.nb_iterations_solver {
            joint_solver.solve(&mut self.joints, &joint_constraints, velocities);
            contact_solver.solve(velocities);
        }

        contact_solver.store_impulses(&mut contacts.manifolds);
    }

    /// Writes the new velocities and transforms back into the bodies.
    ///
    /// Every new transform is computed first; a non-finite one aborts the step
    /// before any body is touched.
    fn integrate(&mut self, index_map: &BodyIndexMap, velocities: &ConstrainedVelocities, dt: f32) -> Result<()> {
        let mut states = Vec::with_capacity(index_map.len());
        for (slot, &handle) in index_map.handles().iter().enumerate() {
            let body = self
                .bodies
                .get(handle)
                .ok_or_else(|| PhysicsError::InternalError(format!("missing body {}", handle)))?;
            if body.get_body_type() == RigidBodyType::Static {
                continue;
            }

            let linear = velocities.linear[slot];
            let angular = velocities.angular[slot];
            let transform = self.integrator.integrate(
                &body.get_transform(),
                linear + velocities.split_linear[slot],
                angular + velocities.split_angular[slot],
                dt,
            );
            if !transform.is_finite() || !linear.is_finite() || !angular.is_finite() {
                warn!("Body {} reached a non-finite state", handle);
                return Err(PhysicsError::SimulationError(format!(
                    "body {} reached a non-finite state",
                    handle
                )));
            }
            states.push((handle, transform, linear, angular));
        }

        for (handle, transform, linear, angular) in states {
            if let Some(body) = self.bodies.get_mut(handle) {
                body.update_state(transform, linear, angular);
            }
        }
        Ok(())
    }

    /// Puts to sleep the islands whose bodies all rested long enough
    fn update_sleeping_bodies(&mut self, index_map: &BodyIndexMap, islands: &[Island], dt: f32) {
        if !self.config.is_deactivation_active {
            return;
        }
        let linear_limit = self.config.sleep_linear_velocity * self.config.sleep_linear_velocity;
        let angular_limit = self.config.sleep_angular_velocity * self.config.sleep_angular_velocity;

        for island in islands {
            let mut min_sleep_time = f32::MAX;
            for &slot in &island.bodies {
                let body = match self.bodies.get_mut(index_map.handle(slot)) {
                    Some(body) => body,
                    None => continue,
                };
                if !body.is_allowed_to_sleep()
                    || body.get_linear_velocity().length_squared() > linear_limit
                    || body.get_angular_velocity().length_squared() > angular_limit
                {
                    body.set_sleep_time(0.0);
                    min_sleep_time = 0.0;
                } else {
                    let time = body.get_sleep_time() + dt;
                    body.set_sleep_time(time);
                    min_sleep_time = min_sleep_time.min(time);
                }
            }

            if min_sleep_time >= self.config.time_before_sleep {
                for &slot in &island.bodies {
                    let handle = index_map.handle(slot);
                    if let Some(body) = self.bodies.get_mut(handle) {
                        body.set_is_sleeping(true);
                        self.events.push_body_event(BodyEventType::Sleep, handle);
                        debug!("Body {} fell asleep", handle);
                    }
                }
            }
        }
    }
}

impl Default for DynamicsWorld {
    fn default() -> Self {
        Self::new()
    }
}
