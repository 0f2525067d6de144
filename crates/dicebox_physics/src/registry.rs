use crate::{
    ColliderHandle, CollisionShape, Handle, MassData, PhysicsError, PhysicsWorld, Result, Scene,
};
use log::debug;
use rapier3d::{
    dynamics::RigidBodyBuilder,
    geometry::ColliderBuilder,
    math::Real,
    na::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3},
    parry::query::Ray,
};
use std::{collections::HashMap, fmt::Debug, hash::Hash, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Dynamic,
    Static,
}

/// A rigid body hosted by a `PhysicsWorld`, together with the shape and mass it was built from.
#[derive(Debug)]
pub struct Body {
    handle: Handle,
    collider: ColliderHandle,
    shape: Arc<CollisionShape>,
    mass: MassData,
    kind: BodyKind,
}

impl Body {
    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn collider(&self) -> ColliderHandle {
        self.collider
    }

    pub fn shape(&self) -> &Arc<CollisionShape> {
        &self.shape
    }

    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }

    pub fn mass(&self) -> Real {
        self.mass.mass
    }

    pub fn local_inertia(&self) -> Vector3<Real> {
        self.mass.principal_inertia
    }

    pub fn mass_data(&self) -> &MassData {
        &self.mass
    }
}

/// The result of picking a tracked body with a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit<N> {
    pub node: N,
    pub body: Handle,
    pub point: Point3<Real>,
    pub distance: Real,
}

/// Pairs visual nodes with the rigid bodies that drive them.
pub struct BodyRegistry<N> {
    entities: HashMap<N, Body>,
    nodes: HashMap<Handle, N>,
}

impl<N> Default for BodyRegistry<N> {
    fn default() -> Self {
        Self {
            entities: HashMap::new(),
            nodes: HashMap::new(),
        }
    }
}

impl<N> BodyRegistry<N>
where
    N: Copy + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an awake dynamic body whose inertia is derived from the shape and mass.
    pub fn create_dynamic_body(
        &self,
        world: &mut PhysicsWorld,
        mass: Real,
        shape: &Arc<CollisionShape>,
        position: Vector3<Real>,
        orientation: UnitQuaternion<Real>,
    ) -> Result<Body> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(PhysicsError::InvalidMass(mass));
        }

        let mass_data = shape.mass_data(mass)?;

        let body = RigidBodyBuilder::dynamic()
            .position(isometry(position, orientation))
            .additional_mass_properties(mass_data.to_mass_properties())
            .sleeping(false)
            .build();

        // Mass comes entirely from the body, the collider only contributes geometry
        let collider = ColliderBuilder::new(shape.shared().clone())
            .density(0.0)
            .build();

        let (handle, collider) = world.add_body(body, collider);
        Ok(Body {
            handle,
            collider,
            shape: shape.clone(),
            mass: mass_data,
            kind: BodyKind::Dynamic,
        })
    }

    pub fn create_static_body(
        &self,
        world: &mut PhysicsWorld,
        shape: &Arc<CollisionShape>,
        position: Vector3<Real>,
        orientation: UnitQuaternion<Real>,
    ) -> Body {
        let body = RigidBodyBuilder::fixed()
            .position(isometry(position, orientation))
            .build();
        let collider = ColliderBuilder::new(shape.shared().clone())
            .density(0.0)
            .build();

        let (handle, collider) = world.add_body(body, collider);
        Body {
            handle,
            collider,
            shape: shape.clone(),
            mass: MassData::zero(),
            kind: BodyKind::Static,
        }
    }

    /// Associates a visual node with a body.
    ///
    /// A node that is already tracked has its previous body removed from the world.
    pub fn track(&mut self, world: &mut PhysicsWorld, node: N, body: Body) {
        debug!("Tracking node {:?} with body {:?}", node, body.handle);
        self.nodes.insert(body.handle, node);
        if let Some(previous) = self.entities.insert(node, body) {
            self.nodes.remove(&previous.handle);
            world.remove_body(previous.handle);
        }
    }

    /// Removes the node's body from the world and detaches the node from the scene.
    ///
    /// Returns false if the node was not tracked.
    pub fn untrack<S>(&mut self, world: &mut PhysicsWorld, scene: &mut S, node: N) -> bool
    where
        S: Scene<Node = N>,
    {
        let body = match self.entities.remove(&node) {
            Some(body) => body,
            None => return false,
        };
        debug!("Untracking node {:?} with body {:?}", node, body.handle);
        self.nodes.remove(&body.handle);
        world.remove_body(body.handle);
        scene.detach(node);
        true
    }

    /// Untracks every node.
    pub fn clear<S>(&mut self, world: &mut PhysicsWorld, scene: &mut S)
    where
        S: Scene<Node = N>,
    {
        let nodes = self.entities.keys().copied().collect::<Vec<_>>();
        for node in nodes {
            self.untrack(world, scene, node);
        }
    }

    pub fn get(&self, node: N) -> Option<&Body> {
        self.entities.get(&node)
    }

    pub fn body_of(&self, node: N) -> Option<Handle> {
        self.entities.get(&node).map(Body::handle)
    }

    pub fn node_of(&self, handle: Handle) -> Option<N> {
        self.nodes.get(&handle).copied()
    }

    pub fn is_tracked(&self, node: N) -> bool {
        self.entities.contains_key(&node)
    }

    pub fn is_dynamic(&self, node: N) -> bool {
        self.entities.get(&node).map_or(false, Body::is_dynamic)
    }

    pub fn iter(&self) -> impl Iterator<Item = (N, &Body)> + '_ {
        self.entities.iter().map(|(node, body)| (*node, body))
    }

    pub fn dynamic_entities(&self) -> impl Iterator<Item = (N, &Body)> + '_ {
        self.iter().filter(|(_, body)| body.is_dynamic())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Casts a ray against the tracked dynamic bodies only.
    pub fn pick(&self, world: &PhysicsWorld, ray: &Ray, max_distance: Real) -> Option<PickHit<N>> {
        let hit = world.cast_ray(ray, max_distance, |handle| {
            self.node_of(handle)
                .map_or(false, |node| self.is_dynamic(node))
        })?;
        let node = self.node_of(hit.body)?;
        Some(PickHit {
            node,
            body: hit.body,
            point: hit.point,
            distance: hit.distance,
        })
    }
}

fn isometry(position: Vector3<Real>, orientation: UnitQuaternion<Real>) -> Isometry3<Real> {
    Isometry3::from_parts(Translation3::from(position), orientation)
}
