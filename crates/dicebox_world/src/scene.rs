use crate::Transform;
use anyhow::Result;
use dicebox_physics::{
    rapier3d::na::{UnitQuaternion, Vector3},
    Scene,
};
use legion::{EntityStore, IntoQuery};
use log::warn;

pub type Ecs = legion::World;
pub type Entity = legion::Entity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility(pub bool);

impl Visibility {
    pub fn is_visible(&self) -> bool {
        self.0
    }
}

/// Visual nodes of the scene, stored as entities with a name, a transform and a visibility flag.
#[derive(Default)]
pub struct SceneGraph {
    pub ecs: Ecs,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, name: &str, transform: Transform) -> Entity {
        self.ecs
            .push((Name(name.to_string()), transform, Visibility(true)))
    }

    /// Attaches a node that takes part in the scene but is never drawn, such as a tray wall.
    pub fn attach_hidden(&mut self, name: &str, transform: Transform) -> Entity {
        self.ecs
            .push((Name(name.to_string()), transform, Visibility(false)))
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.ecs.contains(entity)
    }

    pub fn len(&self) -> usize {
        self.ecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ecs.is_empty()
    }

    pub fn transform(&self, entity: Entity) -> Result<Transform> {
        let transform = *self
            .ecs
            .entry_ref(entity)?
            .get_component::<Transform>()?;
        Ok(transform)
    }

    pub fn is_visible(&self, entity: Entity) -> Result<bool> {
        let visible = self
            .ecs
            .entry_ref(entity)?
            .get_component::<Visibility>()?
            .is_visible();
        Ok(visible)
    }

    pub fn visible_entities(&self) -> Vec<Entity> {
        let mut query = <(Entity, &Visibility)>::query();
        query
            .iter(&self.ecs)
            .filter(|(_, visibility)| visibility.is_visible())
            .map(|(entity, _)| *entity)
            .collect()
    }
}

impl Scene for SceneGraph {
    type Node = Entity;

    fn set_pose(&mut self, node: Entity, translation: &Vector3<f32>, rotation: &UnitQuaternion<f32>) {
        let result = self
            .ecs
            .entry_mut(node)
            .map_err(anyhow::Error::from)
            .and_then(|mut entry| {
                entry
                    .get_component_mut::<Transform>()
                    .map(|transform| transform.set_pose(translation, rotation))
                    .map_err(anyhow::Error::from)
            });
        if let Err(error) = result {
            warn!("Failed to pose node {:?}: {}", node, error);
        }
    }

    fn detach(&mut self, node: Entity) {
        self.ecs.remove(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra_glm as glm;

    #[test]
    fn set_pose_overwrites_translation_and_rotation() -> Result<()> {
        let mut scene = SceneGraph::new();
        let entity = scene.attach("d6", Transform::default());

        let rotation = UnitQuaternion::from_euler_angles(0.5, 0.0, 0.0);
        scene.set_pose(entity, &Vector3::new(1.0, 2.0, 3.0), &rotation);

        let transform = scene.transform(entity)?;
        assert_relative_eq!(transform.translation, glm::vec3(1.0, 2.0, 3.0));
        assert_relative_eq!(transform.rotation, *rotation.quaternion());
        assert_relative_eq!(transform.scale, glm::vec3(1.0, 1.0, 1.0));
        Ok(())
    }

    #[test]
    fn detached_nodes_leave_the_scene() {
        let mut scene = SceneGraph::new();
        let floor = scene.attach("floor", Transform::default());
        let wall = scene.attach_hidden("wall", Transform::default());
        assert_eq!(scene.visible_entities(), vec![floor]);

        scene.detach(wall);
        scene.detach(wall);
        assert!(!scene.contains(wall));
        assert_eq!(scene.len(), 1);

        scene.set_pose(wall, &Vector3::zeros(), &UnitQuaternion::identity());
        assert!(scene.transform(wall).is_err());
    }
}
