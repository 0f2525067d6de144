use crate::{
    BodyRegistry, ConstraintHandle, DragSettings, Handle, PhysicsConfig, PhysicsError,
    PhysicsWorld, PointConstraint, Result,
};
use log::{debug, warn};
use rapier3d::{
    math::Real,
    na::{Point2, Point3, Vector3},
    parry::query::Ray,
};
use std::{fmt::Debug, hash::Hash, mem};

/// A camera that can turn pointer positions into world space rays.
pub trait PickCamera {
    /// Unit vector the camera looks along.
    fn view_direction(&self) -> Vector3<Real>;

    /// Ray from the camera through a pointer position in normalized device coordinates.
    fn pointer_ray(&self, ndc: &Point2<Real>) -> Ray;
}

/// Pointer input in normalized device coordinates, `[-1, 1]` on both axes with +Y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point2<Real>),
    Move(Point2<Real>),
    Up(Point2<Real>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag<N> {
    pub node: N,
    pub body: Handle,
    pub constraint: ConstraintHandle,
    /// Grab point in the body's local frame, fixed for the whole drag.
    pub local_pivot: Point3<Real>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState<N> {
    Idle,
    Dragging(Drag<N>),
}

impl<N> Default for DragState<N> {
    fn default() -> Self {
        Self::Idle
    }
}

/// Drags at most one dynamic body at a time with a point constraint.
///
/// The world owns the constraint of an active drag, so call `reset` before
/// dropping a controller mid-drag or the constraint stays hosted.
pub struct InteractionController<N> {
    settings: DragSettings,
    pick_distance: Real,
    state: DragState<N>,
}

impl<N> Drop for InteractionController<N> {
    fn drop(&mut self) {
        if let DragState::Dragging(drag) = &self.state {
            warn!(
                "Interaction controller dropped mid-drag, constraint {:?} is still hosted",
                drag.constraint
            );
        }
    }
}

impl<N> InteractionController<N>
where
    N: Copy + Eq + Hash + Debug,
{
    pub fn new(settings: DragSettings, pick_distance: Real) -> Self {
        Self {
            settings,
            pick_distance,
            state: DragState::Idle,
        }
    }

    pub fn from_config(config: &PhysicsConfig) -> Self {
        Self::new(config.drag, config.pick_distance)
    }

    pub fn state(&self) -> &DragState<N> {
        &self.state
    }

    pub fn drag(&self) -> Option<&Drag<N>> {
        match &self.state {
            DragState::Dragging(drag) => Some(drag),
            DragState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag().is_some()
    }

    pub fn dragged_node(&self) -> Option<N> {
        self.drag().map(|drag| drag.node)
    }

    pub fn handle_event(
        &mut self,
        world: &mut PhysicsWorld,
        registry: &BodyRegistry<N>,
        camera: &impl PickCamera,
        event: PointerEvent,
    ) -> Result<bool> {
        match event {
            PointerEvent::Down(ndc) => self.on_pointer_down(world, registry, camera, &ndc),
            PointerEvent::Move(ndc) => Ok(self.on_pointer_move(world, camera, &ndc)),
            PointerEvent::Up(_) => Ok(self.on_pointer_up(world)),
        }
    }

    /// Starts dragging the tracked dynamic body under the pointer.
    ///
    /// A miss leaves the current state untouched. A hit while already dragging
    /// releases the previous drag before the new one starts.
    pub fn on_pointer_down(
        &mut self,
        world: &mut PhysicsWorld,
        registry: &BodyRegistry<N>,
        camera: &impl PickCamera,
        ndc: &Point2<Real>,
    ) -> Result<bool> {
        let ray = camera.pointer_ray(ndc);
        let hit = match registry.pick(world, &ray, self.pick_distance) {
            Some(hit) => hit,
            None => return Ok(false),
        };

        let mass = *registry
            .get(hit.node)
            .ok_or(PhysicsError::MissingBody(hit.body))?
            .mass_data();
        let local_pivot = world
            .body(hit.body)
            .ok_or(PhysicsError::MissingBody(hit.body))?
            .position()
            .inverse_transform_point(&hit.point);

        self.release(world);

        let constraint = world.add_constraint(PointConstraint::new(
            hit.body,
            local_pivot,
            hit.point,
            self.settings,
            mass,
        ));
        if let Some(body) = world.body_mut(hit.body) {
            body.wake_up(true);
        }

        debug!("Started dragging node {:?} at {:?}", hit.node, hit.point);
        self.state = DragState::Dragging(Drag {
            node: hit.node,
            body: hit.body,
            constraint,
            local_pivot,
        });
        Ok(true)
    }

    /// Moves the drag target to where the pointer ray crosses the plane facing
    /// the camera through the dragged body's current position.
    pub fn on_pointer_move(
        &mut self,
        world: &mut PhysicsWorld,
        camera: &impl PickCamera,
        ndc: &Point2<Real>,
    ) -> bool {
        let drag = match &self.state {
            DragState::Dragging(drag) => *drag,
            DragState::Idle => return false,
        };

        let origin = match world.body(drag.body) {
            Some(body) => Point3::from(*body.translation()),
            None => return false,
        };

        let ray = camera.pointer_ray(ndc);
        let target = match intersect_plane(&ray, &origin, &camera.view_direction()) {
            Some(target) => target,
            None => return false,
        };

        match world.constraint_mut(drag.constraint) {
            Some(constraint) => {
                constraint.set_target(target);
                true
            }
            None => false,
        }
    }

    pub fn on_pointer_up(&mut self, world: &mut PhysicsWorld) -> bool {
        self.release(world)
    }

    /// Ends the current drag. Returns false if nothing was being dragged.
    pub fn release(&mut self, world: &mut PhysicsWorld) -> bool {
        match mem::replace(&mut self.state, DragState::Idle) {
            DragState::Dragging(drag) => {
                world.remove_constraint(drag.constraint);
                debug!("Stopped dragging node {:?}", drag.node);
                true
            }
            DragState::Idle => false,
        }
    }

    pub fn reset(&mut self, world: &mut PhysicsWorld) {
        self.release(world);
    }

    /// Ends the drag if it holds the given node.
    pub fn cancel_for(&mut self, world: &mut PhysicsWorld, node: N) -> bool {
        if self.dragged_node() == Some(node) {
            self.release(world)
        } else {
            false
        }
    }

    /// Keeps the dragged body awake, or releases the drag if its body is gone.
    pub fn update(&mut self, world: &mut PhysicsWorld, registry: &BodyRegistry<N>) {
        let drag = match &self.state {
            DragState::Dragging(drag) => *drag,
            DragState::Idle => return,
        };

        let tracked = registry.body_of(drag.node) == Some(drag.body);
        if !tracked || !world.contains_body(drag.body) {
            self.release(world);
            return;
        }

        if let Some(body) = world.body_mut(drag.body) {
            body.wake_up(true);
        }
    }
}

/// Intersects a ray with the plane through `origin` with the given normal.
///
/// Returns `None` for rays parallel to the plane or planes behind the ray origin.
pub fn intersect_plane(
    ray: &Ray,
    origin: &Point3<Real>,
    normal: &Vector3<Real>,
) -> Option<Point3<Real>> {
    let denominator = normal.dot(&ray.dir);
    if denominator.abs() < 1e-6 {
        return None;
    }
    let distance = normal.dot(&(origin - ray.origin)) / denominator;
    if !distance.is_finite() || distance < 0.0 {
        return None;
    }
    Some(ray.point_at(distance))
}
