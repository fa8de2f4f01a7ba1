//! Declarative asset manifests
//!
//! A manifest lists everything a game wants resident before play: 3D model
//! paths, named 2D images, and sound/music entries with an id, source path
//! and optional volume. Manifests are plain RON data.

use serde::{Deserialize, Serialize};

/// A named 2D image entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub name: String,
    pub path: String,
}

/// A sound or music entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipEntry {
    pub id: String,
    pub path: String,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_volume() -> f32 {
    1.0
}

/// Everything a batch load request can carry; every list is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetManifest {
    /// glTF model paths (keyed by path)
    pub models: Vec<String>,
    pub images: Vec<ImageEntry>,
    pub sounds: Vec<ClipEntry>,
    /// Looping tracks
    pub music: Vec<ClipEntry>,
}

impl AssetManifest {
    /// Total number of resources the manifest lists
    pub fn len(&self) -> usize {
        self.models.len() + self.images.len() + self.sounds.len() + self.music.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
