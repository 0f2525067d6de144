use crate::{BodyRegistry, PhysicsWorld};
use log::warn;
use rapier3d::{
    math::Real,
    na::{UnitQuaternion, Vector3},
};
use std::{fmt::Debug, hash::Hash};

/// The scene graph side of the simulation: visual nodes that follow rigid bodies.
pub trait Scene {
    type Node: Copy + Eq + Hash + Debug;

    fn set_pose(
        &mut self,
        node: Self::Node,
        translation: &Vector3<Real>,
        rotation: &UnitQuaternion<Real>,
    );

    fn detach(&mut self, node: Self::Node);
}

/// Copies the pose of every tracked dynamic body onto its visual node.
///
/// Returns the number of nodes written.
pub fn sync_visuals<S: Scene>(
    world: &PhysicsWorld,
    registry: &BodyRegistry<S::Node>,
    scene: &mut S,
) -> usize {
    let mut synced = 0;
    for (node, body) in registry.dynamic_entities() {
        let rigid_body = match world.body(body.handle()) {
            Some(rigid_body) => rigid_body,
            None => continue,
        };

        let position = rigid_body.position();
        let translation = position.translation.vector;
        let rotation = position.rotation;

        let finite = translation.iter().all(|c| c.is_finite())
            && rotation.coords.iter().all(|c| c.is_finite());
        if !finite {
            warn!("Skipping non-finite pose for node {:?}", node);
            continue;
        }

        scene.set_pose(node, &translation, &rotation);
        synced += 1;
    }
    synced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{testing::TestScene, PhysicsConfig, Primitive, Result, ShapeFactory};
    use approx::assert_relative_eq;

    #[test]
    fn dynamic_poses_are_copied_and_static_nodes_left_alone() -> Result<()> {
        let mut world = pollster::block_on(PhysicsWorld::init(PhysicsConfig::default()))?;
        let mut scene = TestScene::default();
        let mut registry = BodyRegistry::new();
        let shape = ShapeFactory::default().build_primitive(Primitive::Box {
            half_extents: Vector3::repeat(0.5),
        })?;

        let die = registry.create_dynamic_body(
            &mut world,
            1.0,
            &shape,
            Vector3::new(0.0, 5.0, 0.0),
            UnitQuaternion::from_euler_angles(0.4, 0.0, 0.2),
        )?;
        let die_handle = die.handle();
        registry.track(&mut world, 1, die);
        let floor = registry.create_static_body(
            &mut world,
            &shape,
            Vector3::new(0.0, -5.0, 0.0),
            UnitQuaternion::identity(),
        );
        registry.track(&mut world, 2, floor);

        for _ in 0..20 {
            world.step(1.0 / 60.0);
        }

        assert_eq!(sync_visuals(&world, &registry, &mut scene), 1);
        assert!(!scene.poses.contains_key(&2));

        let (translation, rotation) = scene.poses[&1];
        let body = world.body(die_handle).expect("body should exist");
        assert_relative_eq!(translation, *body.translation());
        assert_relative_eq!(rotation, *body.rotation());
        assert!(translation.y < 5.0);
        assert!(translation.iter().all(|c| c.is_finite()));
        Ok(())
    }

    #[test]
    fn bodies_missing_from_the_world_are_skipped() -> Result<()> {
        let mut world = pollster::block_on(PhysicsWorld::init(PhysicsConfig::default()))?;
        let mut scene = TestScene::default();
        let mut registry = BodyRegistry::new();
        let shape = ShapeFactory::default().build_primitive(Primitive::Sphere { radius: 0.5 })?;

        let body = registry.create_dynamic_body(
            &mut world,
            1.0,
            &shape,
            Vector3::zeros(),
            UnitQuaternion::identity(),
        )?;
        let handle = body.handle();
        registry.track(&mut world, 3, body);
        world.remove_body(handle);

        assert_eq!(sync_visuals(&world, &registry, &mut scene), 0);
        assert!(scene.poses.is_empty());
        Ok(())
    }

    #[test]
    fn non_finite_poses_never_reach_the_scene() -> Result<()> {
        let mut world = pollster::block_on(PhysicsWorld::init(PhysicsConfig::default()))?;
        let mut scene = TestScene::default();
        let mut registry = BodyRegistry::new();
        let shape = ShapeFactory::default().build_primitive(Primitive::Sphere { radius: 0.5 })?;

        let body = registry.create_dynamic_body(
            &mut world,
            1.0,
            &shape,
            Vector3::zeros(),
            UnitQuaternion::identity(),
        )?;
        let handle = body.handle();
        registry.track(&mut world, 4, body);

        world
            .body_mut(handle)
            .expect("body should exist")
            .set_translation(Vector3::new(Real::NAN, 0.0, 0.0), true);

        assert_eq!(sync_visuals(&world, &registry, &mut scene), 0);
        assert!(!scene.poses.contains_key(&4));
        Ok(())
    }
}
