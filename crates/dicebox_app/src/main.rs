use anyhow::Result;
use dicebox_app::{create_logger, Application, Settings};
use log::info;

fn main() -> Result<()> {
    create_logger()?;
    let settings = Settings::load_current_settings()?;
    let frames = settings.frames;

    let mut application = pollster::block_on(Application::new(settings))?;
    application.run(frames);

    if !application.settled(1e-2) {
        info!("Some dice were still rolling after {} frames", frames);
    }
    for (kind, transform) in application.die_poses()? {
        info!(
            "{} came to rest at ({:.2}, {:.2}, {:.2})",
            kind, transform.translation.x, transform.translation.y, transform.translation.z
        );
    }
    Ok(())
}
