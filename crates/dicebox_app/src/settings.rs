//! Handles loading, serialization, deserialization, and generation of the settings file
use anyhow::Result;
use dicebox_physics::PhysicsConfig;
use dicebox_world::DieKind;
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

/// How many dice of each kind are rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiceCounts {
    pub d4: u32,
    pub d6: u32,
    pub d8: u32,
    pub d10: u32,
    pub d12: u32,
    pub d20: u32,
}

impl Default for DiceCounts {
    fn default() -> Self {
        Self {
            d4: 1,
            d6: 1,
            d8: 1,
            d10: 1,
            d12: 1,
            d20: 1,
        }
    }
}

impl DiceCounts {
    pub fn none() -> Self {
        Self {
            d4: 0,
            d6: 0,
            d8: 0,
            d10: 0,
            d12: 0,
            d20: 0,
        }
    }

    pub fn count(&self, kind: DieKind) -> u32 {
        match kind {
            DieKind::D4 => self.d4,
            DieKind::D6 => self.d6,
            DieKind::D8 => self.d8,
            DieKind::D10 => self.d10,
            DieKind::D12 => self.d12,
            DieKind::D20 => self.d20,
        }
    }

    pub fn total(&self) -> u32 {
        DieKind::ALL.iter().map(|kind| self.count(*kind)).sum()
    }

    /// Every die to spawn, in d4 to d20 order.
    pub fn expand(&self) -> Vec<DieKind> {
        DieKind::ALL
            .iter()
            .flat_map(|kind| std::iter::repeat(*kind).take(self.count(*kind) as usize))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub width: u32,
    pub height: u32,
    /// Seconds simulated per frame.
    pub timestep: f32,
    /// Frames run by the headless roll.
    pub frames: u32,
    /// Fixes the spawn positions and orientations when set.
    pub seed: Option<u64>,
    pub physics: PhysicsConfig,
    pub dice: DiceCounts,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            timestep: 1.0 / 60.0,
            frames: 600,
            seed: None,
            physics: PhysicsConfig::default(),
            dice: DiceCounts::default(),
        }
    }
}

impl Settings {
    pub const SETTINGS_FILE: &'static str = "settings.toml";

    pub fn load_current_settings() -> Result<Self> {
        let settings_path = Path::new(Self::SETTINGS_FILE);
        if !settings_path.exists() {
            Settings::generate_settings_file(settings_path)?;
        }
        let settings = Settings::from_path(settings_path)?;
        Ok(settings)
    }

    pub fn from_path<P: AsRef<Path> + Into<PathBuf>>(path: P) -> Result<Settings> {
        let path_str = path.as_ref().display().to_string();
        debug!("Loading settings file: {}", &path_str);
        let mut config = config::Config::default();
        let config_file = config::File::with_name(&path_str);
        config.merge(config_file)?;
        let settings: Settings = config.try_into()?;
        Ok(settings)
    }

    pub fn generate_settings_file<P: AsRef<Path> + Into<PathBuf> + Copy>(path: P) -> Result<()> {
        let settings = Self::default();
        let toml = toml::to_string(&settings)?;

        let mut file = File::create(&path)?;
        file.write_all(toml.as_bytes())?;

        debug!(
            "Generated settings file: {}",
            path.as_ref().display().to_string()
        );

        Ok(())
    }
}
