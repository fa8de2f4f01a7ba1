//! Runtime configuration
//!
//! Defaults match the shipped garden demo; a `assets/config.ron` file can
//! override any subset of fields (serde fills the rest from `Default`).

use serde::{Deserialize, Serialize};

/// Viewport orientation, derived from the current aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Landscape,
    Portrait,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Landscape => write!(f, "landscape"),
            Orientation::Portrait => write!(f, "portrait"),
        }
    }
}

/// A reference resolution the overlay is authored against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefSize {
    pub width: f32,
    pub height: f32,
}

/// Reference resolutions per orientation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub landscape: RefSize,
    pub portrait: RefSize,
}

impl ScreenConfig {
    /// Reference resolution for the given orientation
    pub fn base(&self, orientation: Orientation) -> RefSize {
        match orientation {
            Orientation::Landscape => self.landscape,
            Orientation::Portrait => self.portrait,
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            landscape: RefSize {
                width: 1920.0,
                height: 1080.0,
            },
            portrait: RefSize {
                width: 1080.0,
                height: 1920.0,
            },
        }
    }
}

/// Perspective camera defaults for the 3D surface
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_y: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y: 70.0,
            position: [0.0, 10.0, 20.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

/// Mixer defaults, all in 0..=1
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub master_volume: f32,
    pub music_volume: f32,
    pub sfx_volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            music_volume: 0.7,
            sfx_volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Clear color for the 3D surface, linear RGB
    pub clear_color: [f32; 3],
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0],
        }
    }
}

/// Top-level runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub name: String,
    /// Fixed-step frame rate the update delta is derived from
    pub target_fps: f32,
    pub screen: ScreenConfig,
    pub camera: CameraConfig,
    pub audio: AudioConfig,
    pub renderer: RendererConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "Terrarium".to_string(),
            target_fps: 60.0,
            screen: ScreenConfig::default(),
            camera: CameraConfig::default(),
            audio: AudioConfig::default(),
            renderer: RendererConfig::default(),
        }
    }
}

/// Error type for configuration parsing
#[derive(Debug)]
pub enum ConfigError {
    /// RON syntax or type error
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Parse a configuration from RON text
    pub fn from_ron(text: &str) -> Result<Config, ConfigError> {
        ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> String {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.target_fps, 60.0);
        assert_eq!(config.screen.landscape.width, 1920.0);
        assert_eq!(config.screen.portrait.width, 1080.0);
        assert_eq!(config.camera.fov_y, 70.0);
        assert_eq!(config.audio.music_volume, 0.7);
    }

    #[test]
    fn test_partial_override() {
        // Only the overridden fields change, the rest come from Default
        let config = Config::from_ron("(target_fps: 30.0)").unwrap();
        assert_eq!(config.target_fps, 30.0);
        assert_eq!(config.screen.landscape.height, 1080.0);
    }

    #[test]
    fn test_bad_ron_is_an_error() {
        assert!(Config::from_ron("(target_fps: )").is_err());
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");

        let mut config = Config::default();
        config.name = "RoundTrip".to_string();
        config.camera.fov_y = 55.0;
        std::fs::write(&path, config.to_ron()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let loaded = Config::from_ron(&text).unwrap();
        assert_eq!(loaded.name, "RoundTrip");
        assert_eq!(loaded.camera.fov_y, 55.0);
    }

    #[test]
    fn test_base_resolution_per_orientation() {
        let screen = ScreenConfig::default();
        assert_eq!(screen.base(Orientation::Landscape).width, 1920.0);
        assert_eq!(screen.base(Orientation::Portrait).width, 1080.0);
    }
}
