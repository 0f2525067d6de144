use anyhow::Result;
use dicebox_physics::{
    rapier3d::{
        math::Real,
        na::{Point2, Point3, UnitQuaternion, Vector3},
        parry::query::Ray,
    },
    sync_visuals, BodyRegistry, InteractionController, PhysicsConfig, PhysicsWorld, PickCamera,
    PointerEvent, Primitive, Scene, ShapeFactory,
};
use std::collections::HashMap;

const FRAME_TIME: Real = 1.0 / 60.0;

#[derive(Default)]
struct Poses(HashMap<&'static str, Vector3<Real>>);

impl Scene for Poses {
    type Node = &'static str;

    fn set_pose(&mut self, node: Self::Node, translation: &Vector3<Real>, _: &UnitQuaternion<Real>) {
        self.0.insert(node, *translation);
    }

    fn detach(&mut self, node: Self::Node) {
        self.0.remove(node);
    }
}

/// Looks down -Z from the front of the tray.
struct FrontCamera;

impl PickCamera for FrontCamera {
    fn view_direction(&self) -> Vector3<Real> {
        -Vector3::z()
    }

    fn pointer_ray(&self, ndc: &Point2<Real>) -> Ray {
        Ray::new(Point3::new(ndc.x * 10.0, ndc.y * 10.0, 20.0), -Vector3::z())
    }
}

fn tray() -> Result<(PhysicsWorld, BodyRegistry<&'static str>)> {
    let mut world = pollster::block_on(PhysicsWorld::init(PhysicsConfig::default()))?;
    let mut registry = BodyRegistry::new();
    let factory = ShapeFactory::default();

    let floor = factory.build_primitive(Primitive::Box {
        half_extents: Vector3::new(12.5, 0.5, 12.5),
    })?;
    let floor = registry.create_static_body(
        &mut world,
        &floor,
        Vector3::new(0.0, -5.0, 0.0),
        UnitQuaternion::identity(),
    );
    registry.track(&mut world, "floor", floor);

    let cube = factory.build_primitive(Primitive::Box {
        half_extents: Vector3::repeat(0.5),
    })?;
    let die = registry.create_dynamic_body(
        &mut world,
        1.0,
        &cube,
        Vector3::new(0.0, 5.0, 0.0),
        UnitQuaternion::identity(),
    )?;
    registry.track(&mut world, "die", die);

    Ok((world, registry))
}

#[test]
fn box_settles_on_the_floor() -> Result<()> {
    let (mut world, registry) = tray()?;
    let mut scene = Poses::default();

    for _ in 0..600 {
        world.step(FRAME_TIME);
        sync_visuals(&world, &registry, &mut scene);
        assert!(scene.0["die"].iter().all(|c| c.is_finite()));
    }

    let handle = registry.body_of("die").expect("die should be tracked");
    let body = world.body(handle).expect("die should exist");
    let speed = body.linvel().norm() + body.angvel().norm();
    assert!(speed < 1e-2, "die still moving at {}", speed);

    let height = scene.0["die"].y;
    assert!((height + 4.0).abs() < 0.05, "die rests at {}", height);
    assert!(!scene.0.contains_key("floor"));
    Ok(())
}

#[test]
fn dragged_box_is_lifted_and_dropped() -> Result<()> {
    let (mut world, registry) = tray()?;
    let mut controller = InteractionController::from_config(world.config());

    for _ in 0..300 {
        world.step(FRAME_TIME);
    }

    let handle = registry.body_of("die").expect("die should be tracked");
    let resting = world.body(handle).expect("die should exist").translation().y;

    // The die rests at y = -4, the pointer ray at ndc y = -0.4 crosses its front face
    assert!(controller.handle_event(
        &mut world,
        &registry,
        &FrontCamera,
        PointerEvent::Down(Point2::new(0.0, -0.4)),
    )?);
    controller.handle_event(
        &mut world,
        &registry,
        &FrontCamera,
        PointerEvent::Move(Point2::new(0.0, 0.0)),
    )?;

    for _ in 0..120 {
        world.step(FRAME_TIME);
        controller.update(&mut world, &registry);
    }

    let lifted = world.body(handle).expect("die should exist").translation().y;
    assert!(lifted > resting + 2.0, "die only reached {}", lifted);
    assert_eq!(world.constraint_count(), 1);

    controller.handle_event(
        &mut world,
        &registry,
        &FrontCamera,
        PointerEvent::Up(Point2::new(0.0, 0.0)),
    )?;
    assert_eq!(world.constraint_count(), 0);

    for _ in 0..600 {
        world.step(FRAME_TIME);
    }
    let dropped = world.body(handle).expect("die should exist").translation().y;
    assert!((dropped + 4.0).abs() < 0.1, "die dropped to {}", dropped);
    Ok(())
}
