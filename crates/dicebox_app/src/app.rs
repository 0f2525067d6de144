use crate::{DiceCounts, DiceTray, Die, Input, MouseInput, Settings, System};
use anyhow::{Context, Result};
use dicebox_physics::{
    rapier3d::na::Point2, sync_visuals, BodyRegistry, InteractionController, PhysicsWorld,
    PointerEvent, ShapeFactory,
};
use dicebox_world::{Camera, DieKind, Entity, SceneGraph, Transform};
use log::info;
use nalgebra_glm as glm;

pub struct Application {
    pub settings: Settings,
    pub world: PhysicsWorld,
    pub registry: BodyRegistry<Entity>,
    pub scene: SceneGraph,
    pub camera: Camera,
    pub controller: InteractionController<Entity>,
    pub tray: DiceTray,
    pub input: Input,
    pub system: System,
}

impl Application {
    /// Sets up the physics world, the tray and the configured dice.
    ///
    /// Nothing is built if the physics world fails to initialize.
    pub async fn new(settings: Settings) -> Result<Self> {
        let mut world = PhysicsWorld::init(settings.physics.clone())
            .await
            .context("Failed to initialize the physics world")?;

        let factory = ShapeFactory::from_config(&settings.physics);
        let mut registry = BodyRegistry::new();
        let mut scene = SceneGraph::new();

        let mut tray = DiceTray::new(&factory, settings.seed)?;
        tray.build_arena(&mut world, &mut registry, &mut scene, &factory)?;
        tray.spawn(&mut world, &mut registry, &mut scene, &settings.dice)?;

        let system =
            System::new(settings.width, settings.height).with_fixed_timestep(settings.timestep);
        let camera = Camera::looking_at(
            glm::vec3(0.0, 14.0, 14.0),
            glm::vec3(0.0, -4.0, 0.0),
            45_f32.to_radians(),
            system.viewport,
        );

        info!(
            "Dice tray ready with {} dice at {}x{}",
            tray.dice().len(),
            settings.width,
            settings.height
        );

        Ok(Self {
            controller: InteractionController::from_config(&settings.physics),
            settings,
            world,
            registry,
            scene,
            camera,
            tray,
            input: Input::new(),
            system,
        })
    }

    /// Advances one frame: step the simulation, move the visuals, then keep the drag alive.
    pub fn update(&mut self) {
        self.world.step(self.system.delta_time);
        sync_visuals(&self.world, &self.registry, &mut self.scene);
        self.controller.update(&mut self.world, &self.registry);
        self.input.mouse.new_frame();
    }

    pub fn run(&mut self, frames: u32) {
        for _ in 0..frames {
            if self.system.exit_requested {
                break;
            }
            self.system.new_frame();
            self.update();
        }
    }

    /// Feeds pointer input to the drag controller. Returns true if the drag state changed
    /// or its target moved.
    pub fn on_mouse(&mut self, input: MouseInput) -> Result<bool> {
        self.input.handle_mouse(input);
        if !self.input.allowed {
            return Ok(false);
        }

        let ndc = self.system.viewport.to_ndc(&self.input.mouse.position);
        let ndc = Point2::new(ndc.x, ndc.y);
        let event = match input {
            MouseInput::Moved(_) => PointerEvent::Move(ndc),
            MouseInput::Pressed => PointerEvent::Down(ndc),
            MouseInput::Released => PointerEvent::Up(ndc),
        };

        let changed =
            self.controller
                .handle_event(&mut self.world, &self.registry, &self.camera, event)?;
        Ok(changed)
    }

    pub fn reroll(&mut self) {
        self.controller.reset(&mut self.world);
        self.tray.reroll(&mut self.world, &self.registry);
    }

    pub fn update_dice(&mut self, counts: DiceCounts) -> Result<usize> {
        let spawned = self.tray.update_set(
            &mut self.world,
            &mut self.registry,
            &mut self.scene,
            &mut self.controller,
            &counts,
        )?;
        self.settings.dice = counts;
        Ok(spawned)
    }

    /// Whether every die moves slower than `threshold`.
    pub fn settled(&self, threshold: f32) -> bool {
        self.tray.dice().iter().all(|die| {
            self.registry
                .body_of(die.node)
                .and_then(|handle| self.world.body(handle))
                .map_or(true, |body| body.linvel().norm() + body.angvel().norm() < threshold)
        })
    }

    pub fn die_poses(&self) -> Result<Vec<(DieKind, Transform)>> {
        self.tray
            .dice()
            .iter()
            .map(|Die { kind, node }| Ok((*kind, self.scene.transform(*node)?)))
            .collect()
    }

    /// Pixel position of a world point, origin at the top left.
    pub fn world_to_screen(&self, point: &glm::Vec3) -> glm::Vec2 {
        let viewport = self.camera.viewport;
        let window = glm::project_zo(
            point,
            &self.camera.view_matrix(),
            &self.camera.projection_matrix(),
            viewport.as_glm_vec(),
        );
        glm::vec2(window.x, viewport.y + viewport.height - (window.y - viewport.y))
    }
}
