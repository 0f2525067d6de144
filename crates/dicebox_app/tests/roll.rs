use anyhow::Result;
use dicebox_app::{Application, DiceCounts, MouseInput, Settings};
use dicebox_physics::PhysicsConfig;
use nalgebra_glm as glm;

fn settings() -> Settings {
    Settings {
        seed: Some(7),
        ..Default::default()
    }
}

#[test]
fn rolled_dice_come_to_rest_inside_the_tray() -> Result<()> {
    let mut application = pollster::block_on(Application::new(settings()))?;
    application.run(900);

    let poses = application.die_poses()?;
    assert_eq!(poses.len(), 6);
    for (kind, transform) in poses {
        let translation = transform.translation;
        assert!(translation.iter().all(|c| c.is_finite()), "{} is not finite", kind);
        assert!(
            translation.y > -4.6 && translation.y < -3.0,
            "{} rests at height {}",
            kind,
            translation.y
        );
        assert!(translation.x.abs() < 12.5 && translation.z.abs() < 12.5);
    }
    Ok(())
}

#[test]
fn invalid_physics_settings_abort_setup() {
    let settings = Settings {
        physics: PhysicsConfig {
            substeps: 0,
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(pollster::block_on(Application::new(settings)).is_err());
}

#[test]
fn clicking_a_die_drags_it_until_release() -> Result<()> {
    let mut application = pollster::block_on(Application::new(settings()))?;
    application.run(600);

    let (_, transform) = application.die_poses()?[0];
    let pixel = application.world_to_screen(&transform.translation);

    application.on_mouse(MouseInput::Moved(pixel))?;
    assert!(application.on_mouse(MouseInput::Pressed)?);
    assert!(application.controller.is_dragging());
    assert_eq!(application.world.constraint_count(), 1);

    application.on_mouse(MouseInput::Moved(pixel - glm::vec2(0.0, 80.0)))?;
    application.run(60);
    assert!(application.controller.is_dragging());

    assert!(application.on_mouse(MouseInput::Released)?);
    assert!(!application.on_mouse(MouseInput::Released)?);
    assert_eq!(application.world.constraint_count(), 0);
    Ok(())
}

#[test]
fn changing_the_set_respawns_dice() -> Result<()> {
    let mut application = pollster::block_on(Application::new(settings()))?;
    application.run(30);

    let spawned = application.update_dice(DiceCounts {
        d20: 4,
        ..DiceCounts::none()
    })?;
    assert_eq!(spawned, 4);
    assert_eq!(application.registry.dynamic_entities().count(), 4);

    application.reroll();
    application.run(30);
    assert_eq!(application.die_poses()?.len(), 4);
    Ok(())
}
