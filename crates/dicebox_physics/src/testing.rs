use crate::{PickCamera, Scene};
use rapier3d::{
    math::Real,
    na::{Point2, Point3, UnitQuaternion, Vector3},
    parry::query::Ray,
};
use std::collections::HashMap;

#[derive(Default)]
pub struct TestScene {
    pub poses: HashMap<u32, (Vector3<Real>, UnitQuaternion<Real>)>,
    pub detached: Vec<u32>,
}

impl Scene for TestScene {
    type Node = u32;

    fn set_pose(&mut self, node: u32, translation: &Vector3<Real>, rotation: &UnitQuaternion<Real>) {
        self.poses.insert(node, (*translation, *rotation));
    }

    fn detach(&mut self, node: u32) {
        self.poses.remove(&node);
        self.detached.push(node);
    }
}

/// Orthographic camera looking down -Z from z = 20, one NDC unit spans ten world units.
pub struct TestCamera;

impl PickCamera for TestCamera {
    fn view_direction(&self) -> Vector3<Real> {
        -Vector3::z()
    }

    fn pointer_ray(&self, ndc: &Point2<Real>) -> Ray {
        Ray::new(
            Point3::new(ndc.x * 10.0, ndc.y * 10.0, 20.0),
            -Vector3::z(),
        )
    }
}
