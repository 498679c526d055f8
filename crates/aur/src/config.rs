//! Configuration of the `aur` binary, loaded from a TOML file.
//!
//! ```toml
//! [engine]
//! frames = 300
//! frame_rate = 60.0
//! backend = "wgpu"
//!
//! [driver]
//! width = 1280
//! height = 720
//! fov = 90.0
//! frame_rate = 30.0
//!
//! [screen]
//! auto_size = true
//!
//! [placement]
//! distance = 100.0
//! ```
//!
//! Every section and field is optional.

use crate::{screen::ScreenConfig, video::DriverConfig};
use anyhow::ensure;
use aur_utils::{AnyResult, AnyhowResultExt};
use log::*;
use serde::Deserialize;
use std::{fs, io, path::Path};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub driver: DriverConfig,
    pub screen: ScreenConfig,
    pub placement: PlacementConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Uses a GPU, falling back to headless if none is available.
    #[default]
    Wgpu,
    Headless,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Amount of frames to run before shutting down.
    pub frames: u64,
    /// Upper bound on frames per second, 0 runs frames back to back.
    pub frame_rate: f32,
    pub backend: Backend,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frames: 120,
            frame_rate: 60.0,
            backend: Backend::Wgpu,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Distance between the camera and the screen.
    pub distance: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self { distance: 100.0 }
    }
}

impl AppConfig {
    pub fn parse(source: &str) -> AnyResult<Self> {
        let config: Self = toml::from_str(source).otherwise("couldn't parse the configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AnyResult<()> {
        ensure!(self.engine.frames > 0, "engine must run at least one frame");
        ensure!(self.engine.frame_rate >= 0.0, "engine frame rate must not be negative");

        let driver = &self.driver;
        ensure!(
            driver.width > 0 && driver.height > 0,
            "driver resolution must not be empty"
        );
        ensure!(
            driver.fov.0 > 0.0 && driver.fov.0 < 180.0,
            "driver field of view must be within (0, 180) degrees"
        );
        ensure!(
            driver.aspect_ratio.map_or(true, |a| a > 0.0),
            "driver aspect ratio must be positive"
        );
        ensure!(driver.frame_rate > 0.0, "driver frame rate must be positive");
        ensure!(self.screen.quad_unit > 0.0, "screen quad unit must be positive");
        Ok(())
    }

    /// Loads the configuration from a file. A missing file isn't an error, defaults are used.
    pub fn load(path: &Path) -> AnyResult<Self> {
        match fs::read_to_string(path) {
            Ok(source) => Self::parse(&source),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!("Configuration file `{}` not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(err).otherwise(format!("couldn't read `{}`", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::PixelFormat;

    #[test]
    fn partial_files_fill_in_defaults() {
        let config = AppConfig::parse(
            r#"
            [engine]
            backend = "headless"

            [driver]
            width = 1920
            height = 1080
            fov = 90.0
            pixel_format = "rgba8"

            [screen]
            auto_size = false
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.backend, Backend::Headless);
        assert_eq!(config.engine.frames, 120);
        assert_eq!(config.engine.frame_rate, 60.0);
        assert_eq!(config.driver.width, 1920);
        assert_eq!(config.driver.fov.0, 90.0);
        assert_eq!(config.driver.pixel_format, PixelFormat::Rgba8);
        assert!(config.driver.aspect_ratio.is_none());
        assert!(!config.screen.auto_size);
        assert_eq!(config.screen.quad_unit, 100.0);
        assert_eq!(config.placement.distance, 100.0);
    }

    #[test]
    fn unknown_backends_are_rejected() {
        assert!(AppConfig::parse("[engine]\nbackend = \"vulkan\"").is_err());
    }

    #[test]
    fn nonsense_values_are_rejected() {
        assert!(AppConfig::parse("[driver]\nfov = 180.0").is_err());
        assert!(AppConfig::parse("[driver]\nwidth = 0").is_err());
        assert!(AppConfig::parse("[screen]\nquad_unit = -1.0").is_err());
        assert!(AppConfig::parse("[engine]\nframes = 0").is_err());
        assert!(AppConfig::parse("[engine]\nframe_rate = -1.0").is_err());
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/aur.toml")).unwrap();
        assert_eq!(config.engine.frames, 120);
        assert_eq!(config.driver.width, 640);
    }
}
