use crate::DiceCounts;
use anyhow::{Context, Result};
use dicebox_physics::{
    rapier3d::na::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3},
    BodyRegistry, CollisionShape, InteractionController, PhysicsWorld, Primitive, ShapeFactory,
};
use dicebox_world::{DieKind, Entity, SceneGraph, Transform};
use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{collections::HashMap, f32::consts::TAU, sync::Arc};

pub const DIE_MASS: f32 = 15.0;

const FLOOR_HEIGHT: f32 = -5.0;
const FLOOR_HALF_EXTENTS: [f32; 3] = [12.5, 0.5, 12.5];
const WALL_OFFSET: f32 = 13.0;
const WALL_HEIGHT: f32 = 45.0;
const SPAWN_SPREAD: f32 = 5.0;
const SPAWN_HEIGHT: f32 = 5.0;
const SPAWN_STAGGER: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Die {
    pub kind: DieKind,
    pub node: Entity,
}

/// The dice set and the box they are rolled in.
pub struct DiceTray {
    shapes: HashMap<DieKind, Arc<CollisionShape>>,
    dice: Vec<Die>,
    arena: Vec<Entity>,
    rng: StdRng,
}

impl DiceTray {
    /// Builds one shared hull per die kind from its template mesh.
    pub fn new(factory: &ShapeFactory, seed: Option<u64>) -> Result<Self> {
        let mut shapes = HashMap::new();
        for kind in DieKind::ALL {
            let template = kind.template();
            let vertices = template
                .vertices
                .iter()
                .map(|vertex| Point3::from(*vertex))
                .collect::<Vec<_>>();
            let shape = factory
                .build_convex_hull(&vertices, &template.transform)
                .with_context(|| format!("Failed to build the collision hull of a {}", kind))?;
            debug!(
                "Built {} hull from {} vertices, {} points kept",
                kind,
                vertices.len(),
                shape.hull_point_count()
            );
            shapes.insert(kind, shape);
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            shapes,
            dice: Vec::new(),
            arena: Vec::new(),
            rng,
        })
    }

    pub fn dice(&self) -> &[Die] {
        &self.dice
    }

    pub fn arena(&self) -> &[Entity] {
        &self.arena
    }

    pub fn shape(&self, kind: DieKind) -> Option<&Arc<CollisionShape>> {
        self.shapes.get(&kind)
    }

    /// Adds the floor and the four invisible walls that keep the dice on it.
    pub fn build_arena(
        &mut self,
        world: &mut PhysicsWorld,
        registry: &mut BodyRegistry<Entity>,
        scene: &mut SceneGraph,
        factory: &ShapeFactory,
    ) -> Result<()> {
        let floor = factory.build_primitive(Primitive::Box {
            half_extents: Vector3::from(FLOOR_HALF_EXTENTS),
        })?;
        let floor_position = Vector3::new(0.0, FLOOR_HEIGHT, 0.0);
        let body =
            registry.create_static_body(world, &floor, floor_position, UnitQuaternion::identity());
        let node = scene.attach("floor", Transform::from_translation(floor_position));
        registry.track(world, node, body);
        self.arena.push(node);

        let side = factory.build_primitive(Primitive::Box {
            half_extents: Vector3::new(0.5, 50.0, 12.5),
        })?;
        let front = factory.build_primitive(Primitive::Box {
            half_extents: Vector3::new(12.5, 50.0, 0.5),
        })?;
        let walls = [
            (&side, Vector3::new(WALL_OFFSET, WALL_HEIGHT, 0.0)),
            (&side, Vector3::new(-WALL_OFFSET, WALL_HEIGHT, 0.0)),
            (&front, Vector3::new(0.0, WALL_HEIGHT, WALL_OFFSET)),
            (&front, Vector3::new(0.0, WALL_HEIGHT, -WALL_OFFSET)),
        ];
        for (shape, position) in walls {
            let body = registry.create_static_body(world, shape, position, UnitQuaternion::identity());
            let node = scene.attach_hidden("wall", Transform::from_translation(position));
            registry.track(world, node, body);
            self.arena.push(node);
        }

        Ok(())
    }

    /// Drops the configured dice above the tray. Returns the number of dice spawned.
    pub fn spawn(
        &mut self,
        world: &mut PhysicsWorld,
        registry: &mut BodyRegistry<Entity>,
        scene: &mut SceneGraph,
        counts: &DiceCounts,
    ) -> Result<usize> {
        for (index, kind) in counts.expand().into_iter().enumerate() {
            let shape = self
                .shapes
                .get(&kind)
                .cloned()
                .with_context(|| format!("No collision shape was built for a {}", kind))?;
            let (position, orientation) = self.random_pose(index);

            let body = registry.create_dynamic_body(world, DIE_MASS, &shape, position, orientation)?;
            let node = scene.attach(
                kind.name(),
                Transform::from(Isometry3::from_parts(
                    Translation3::from(position),
                    orientation,
                )),
            );
            registry.track(world, node, body);
            self.dice.push(Die { kind, node });
        }

        info!("Spawned {} dice", self.dice.len());
        Ok(self.dice.len())
    }

    /// Removes every die from the world and the scene, ending any drag on one of them.
    pub fn clear(
        &mut self,
        world: &mut PhysicsWorld,
        registry: &mut BodyRegistry<Entity>,
        scene: &mut SceneGraph,
        controller: &mut InteractionController<Entity>,
    ) {
        for die in self.dice.drain(..) {
            controller.cancel_for(world, die.node);
            registry.untrack(world, scene, die.node);
        }
    }

    /// Replaces the current dice with a new set.
    pub fn update_set(
        &mut self,
        world: &mut PhysicsWorld,
        registry: &mut BodyRegistry<Entity>,
        scene: &mut SceneGraph,
        controller: &mut InteractionController<Entity>,
        counts: &DiceCounts,
    ) -> Result<usize> {
        self.clear(world, registry, scene, controller);
        self.spawn(world, registry, scene, counts)
    }

    /// Throws every die again from a fresh random pose.
    pub fn reroll(&mut self, world: &mut PhysicsWorld, registry: &BodyRegistry<Entity>) {
        let nodes = self.dice.iter().map(|die| die.node).collect::<Vec<_>>();
        for (index, node) in nodes.into_iter().enumerate() {
            let (position, orientation) = self.random_pose(index);
            let body = match registry.body_of(node).and_then(|handle| world.body_mut(handle)) {
                Some(body) => body,
                None => continue,
            };
            body.set_linvel(Vector3::zeros(), true);
            body.set_angvel(Vector3::zeros(), true);
            body.set_position(
                Isometry3::from_parts(Translation3::from(position), orientation),
                true,
            );
            body.wake_up(true);
        }
        info!("Rerolled {} dice", self.dice.len());
    }

    fn random_pose(&mut self, index: usize) -> (Vector3<f32>, UnitQuaternion<f32>) {
        let x = (self.rng.gen::<f32>() - 0.5) * SPAWN_SPREAD;
        let z = (self.rng.gen::<f32>() - 0.5) * SPAWN_SPREAD;
        let y = SPAWN_HEIGHT + index as f32 * SPAWN_STAGGER;
        let orientation = UnitQuaternion::from_euler_angles(
            self.rng.gen::<f32>() * TAU,
            self.rng.gen::<f32>() * TAU,
            self.rng.gen::<f32>() * TAU,
        );
        (Vector3::new(x, y, z), orientation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicebox_physics::{rapier3d::na::Point2, PhysicsConfig};
    use dicebox_world::{Camera, Viewport};
    use nalgebra_glm as glm;

    struct Fixture {
        world: PhysicsWorld,
        registry: BodyRegistry<Entity>,
        scene: SceneGraph,
        controller: InteractionController<Entity>,
        tray: DiceTray,
    }

    fn fixture() -> Result<Fixture> {
        let config = PhysicsConfig::default();
        let factory = ShapeFactory::from_config(&config);
        let mut fixture = Fixture {
            world: pollster::block_on(PhysicsWorld::init(config.clone()))?,
            registry: BodyRegistry::new(),
            scene: SceneGraph::new(),
            controller: InteractionController::from_config(&config),
            tray: DiceTray::new(&factory, Some(42))?,
        };
        fixture.tray.build_arena(
            &mut fixture.world,
            &mut fixture.registry,
            &mut fixture.scene,
            &factory,
        )?;
        Ok(fixture)
    }

    #[test]
    fn every_die_kind_gets_a_hull() -> Result<()> {
        let tray = DiceTray::new(&ShapeFactory::default(), Some(1))?;
        for kind in DieKind::ALL {
            let shape = tray.shape(kind).context("missing hull")?;
            assert!(shape.hull_point_count() > 0);
            assert!(shape.hull_point_count() < kind.template().vertices.len());
        }
        Ok(())
    }

    #[test]
    fn arena_is_static_with_hidden_walls() -> Result<()> {
        let fixture = fixture()?;
        assert_eq!(fixture.tray.arena().len(), 5);
        assert_eq!(fixture.registry.dynamic_entities().count(), 0);
        assert_eq!(fixture.scene.visible_entities().len(), 1);
        Ok(())
    }

    #[test]
    fn spawn_staggers_dice_above_the_tray() -> Result<()> {
        let mut fixture = fixture()?;
        let counts = DiceCounts {
            d6: 2,
            d20: 1,
            ..DiceCounts::none()
        };
        let spawned = fixture.tray.spawn(
            &mut fixture.world,
            &mut fixture.registry,
            &mut fixture.scene,
            &counts,
        )?;
        assert_eq!(spawned, 3);
        assert_eq!(fixture.registry.dynamic_entities().count(), 3);

        for (index, die) in fixture.tray.dice().iter().enumerate() {
            let transform = fixture.scene.transform(die.node)?;
            assert_eq!(transform.translation.y, 5.0 + index as f32 * 1.5);
            assert!(transform.translation.x.abs() <= 2.5);
            assert!(transform.translation.z.abs() <= 2.5);
            assert_eq!(
                fixture.registry.get(die.node).map(|body| body.mass()),
                Some(DIE_MASS)
            );
        }
        Ok(())
    }

    #[test]
    fn update_set_replaces_dice_and_cancels_drags() -> Result<()> {
        let mut fixture = fixture()?;
        fixture.tray.spawn(
            &mut fixture.world,
            &mut fixture.registry,
            &mut fixture.scene,
            &DiceCounts::default(),
        )?;
        let old_nodes = fixture
            .tray
            .dice()
            .iter()
            .map(|die| die.node)
            .collect::<Vec<_>>();
        let bodies_before = fixture.world.body_count();

        let first = fixture.scene.transform(old_nodes[0])?.translation;
        let camera = Camera::looking_at(
            first + glm::vec3(0.0, 8.0, 8.0),
            first,
            45_f32.to_radians(),
            Viewport::new(800.0, 600.0),
        );
        assert!(fixture.controller.on_pointer_down(
            &mut fixture.world,
            &fixture.registry,
            &camera,
            &Point2::new(0.0, 0.0),
        )?);
        assert_eq!(fixture.world.constraint_count(), 1);

        let counts = DiceCounts {
            d12: 2,
            ..DiceCounts::none()
        };
        let spawned = fixture.tray.update_set(
            &mut fixture.world,
            &mut fixture.registry,
            &mut fixture.scene,
            &mut fixture.controller,
            &counts,
        )?;

        assert_eq!(spawned, 2);
        assert_eq!(fixture.world.body_count(), bodies_before - 6 + 2);
        for node in old_nodes {
            assert!(!fixture.scene.contains(node));
            assert!(!fixture.registry.is_tracked(node));
        }
        assert!(!fixture.controller.is_dragging());
        assert_eq!(fixture.world.constraint_count(), 0);
        Ok(())
    }

    #[test]
    fn reroll_resets_height_and_velocity() -> Result<()> {
        let mut fixture = fixture()?;
        fixture.tray.spawn(
            &mut fixture.world,
            &mut fixture.registry,
            &mut fixture.scene,
            &DiceCounts::default(),
        )?;
        for _ in 0..120 {
            fixture.world.step(1.0 / 60.0);
        }

        fixture.tray.reroll(&mut fixture.world, &fixture.registry);

        for (index, die) in fixture.tray.dice().iter().enumerate() {
            let handle = fixture
                .registry
                .body_of(die.node)
                .context("die should be tracked")?;
            let body = fixture.world.body(handle).context("die should exist")?;
            assert_eq!(body.translation().y, 5.0 + index as f32 * 1.5);
            assert_eq!(*body.linvel(), Vector3::zeros());
            assert!(!body.is_sleeping());
        }

        assert_eq!(
            dicebox_physics::sync_visuals(&fixture.world, &fixture.registry, &mut fixture.scene),
            6
        );
        Ok(())
    }
}
