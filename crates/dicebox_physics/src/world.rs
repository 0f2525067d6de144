use crate::{ColliderHandle, ConstraintHandle, Handle, PhysicsConfig, PointConstraint, Result};
use log::info;
use rapier3d::{
    dynamics::{
        CCDSolver, ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet,
        RigidBody, RigidBodySet,
    },
    geometry::{BroadPhase, Collider, ColliderSet, NarrowPhase},
    math::Real,
    na::{Point3, Vector3},
    parry::query::Ray,
    pipeline::{PhysicsPipeline, QueryFilter, QueryPipeline},
};
use std::collections::BTreeMap;

/// The closest intersection between a ray and a body's collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub body: Handle,
    pub collider: ColliderHandle,
    pub distance: Real,
    pub point: Point3<Real>,
}

/// Owns every rigid body, collider and drag constraint of one simulation.
pub struct PhysicsWorld {
    config: PhysicsConfig,
    gravity: Vector3<Real>,
    integration_parameters: IntegrationParameters,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    pipeline: PhysicsPipeline,
    constraints: BTreeMap<ConstraintHandle, PointConstraint>,
    next_constraint: u64,
}

impl PhysicsWorld {
    /// Builds the simulation world.
    ///
    /// Fails if the configuration cannot produce a working world, in which case
    /// nothing that depends on physics should be set up.
    pub async fn init(config: PhysicsConfig) -> Result<Self> {
        config.validate()?;

        let gravity = config.gravity();
        info!(
            "Physics world created with gravity {:?} and {} substeps per step",
            config.gravity, config.substeps
        );

        Ok(Self {
            gravity,
            integration_parameters: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            pipeline: PhysicsPipeline::new(),
            constraints: BTreeMap::new(),
            next_constraint: 0,
            config,
        })
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Advances the simulation by `delta_time` seconds split into fixed substeps.
    ///
    /// Every substep applies the hosted drag constraints before integrating,
    /// so a target written between two calls is consumed by the next one.
    pub fn step(&mut self, delta_time: Real) {
        if !(delta_time.is_finite() && delta_time > 0.0) {
            return;
        }

        let frame_time = match self.config.max_frame_time {
            Some(max_frame_time) => delta_time.min(max_frame_time),
            None => delta_time,
        };

        let substeps = self.config.substeps.max(1);
        let substep_time = frame_time / substeps as Real;
        self.integration_parameters.dt = substep_time;

        // Contact events are not consumed
        let event_handler = ();

        for _ in 0..substeps {
            self.solve_constraints(substep_time);

            self.pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.islands,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                Some(&mut self.query_pipeline),
                &(),
                &event_handler,
            );
        }
    }

    fn solve_constraints(&mut self, substep_time: Real) {
        for constraint in self.constraints.values() {
            // The dragged body may already be gone, the controller releases the constraint later.
            if let Some(body) = self.bodies.get_mut(constraint.body()) {
                constraint.solve(body, substep_time);
            }
        }
    }

    pub fn add_body(&mut self, body: RigidBody, collider: Collider) -> (Handle, ColliderHandle) {
        let handle = self.bodies.insert(body);
        let collider = self
            .colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        // Additional mass properties only count once recomputed, do it now rather than on the next step
        if let Some(body) = self.bodies.get_mut(handle) {
            body.recompute_mass_properties_from_colliders(&self.colliders);
        }
        self.query_pipeline.update(&self.bodies, &self.colliders);
        (handle, collider)
    }

    /// Removes a body and its colliders. Removing a body twice is a no-op.
    pub fn remove_body(&mut self, handle: Handle) -> Option<RigidBody> {
        let body = self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        )?;
        // Removed colliders must leave the ray cast acceleration structure before the next query
        self.query_pipeline.update(&self.bodies, &self.colliders);
        Some(body)
    }

    pub fn contains_body(&self, handle: Handle) -> bool {
        self.bodies.contains(handle)
    }

    pub fn body(&self, handle: Handle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: Handle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn add_constraint(&mut self, constraint: PointConstraint) -> ConstraintHandle {
        let handle = ConstraintHandle(self.next_constraint);
        self.next_constraint += 1;
        self.constraints.insert(handle, constraint);
        handle
    }

    /// Removes a constraint. Removing a constraint twice is a no-op.
    pub fn remove_constraint(&mut self, handle: ConstraintHandle) -> Option<PointConstraint> {
        self.constraints.remove(&handle)
    }

    pub fn constraint(&self, handle: ConstraintHandle) -> Option<&PointConstraint> {
        self.constraints.get(&handle)
    }

    pub fn constraint_mut(&mut self, handle: ConstraintHandle) -> Option<&mut PointConstraint> {
        self.constraints.get_mut(&handle)
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Finds the nearest collider hit by the ray whose parent body passes `accept`.
    pub fn cast_ray(
        &self,
        ray: &Ray,
        max_distance: Real,
        accept: impl Fn(Handle) -> bool,
    ) -> Option<RayHit> {
        let predicate =
            |_: ColliderHandle, collider: &Collider| collider.parent().map_or(false, &accept);
        let filter = QueryFilter::default().predicate(&predicate);

        let (collider, distance) = self.query_pipeline.cast_ray(
            &self.bodies,
            &self.colliders,
            ray,
            max_distance,
            true,
            filter,
        )?;
        let body = self.colliders.get(collider)?.parent()?;

        Some(RayHit {
            body,
            collider,
            distance,
            point: ray.point_at(distance),
        })
    }
}
