//! Static content for the garden demo: the item catalog, the level scripts
//! and the asset manifest. All positions are in world units on the ground
//! plane of the garden model.

use serde::{Deserialize, Serialize};

use crate::assets::{AssetManifest, ClipEntry, ImageEntry};

pub const MODEL_PATH: &str = "assets/gltf/garden.glb";

pub const LOADING: &str = "loading";
pub const LEVEL_ANIMAL: &str = "level-animal";
pub const LEVEL_FENCE: &str = "level-fence";
pub const LEVEL_GARDEN: &str = "level-garden";
pub const WIN: &str = "win";

/// Phase that plays a given level index.
pub fn phase_for_level(level: u32) -> Option<&'static str> {
    match level {
        1 => Some(LEVEL_ANIMAL),
        2 => Some(LEVEL_FENCE),
        3 => Some(LEVEL_GARDEN),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemCategory {
    Animal,
    Crop,
    Structure,
    Terrain,
}

/// One placeable catalog entry. `id` doubles as the glTF node name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemConfig {
    pub id: String,
    pub category: ItemCategory,
    pub scale: f32,
    /// Effect fired when the item lands, if any
    pub sound: Option<String>,
}

fn entry(id: &str, category: ItemCategory, scale: f32, sound: Option<&str>) -> ItemConfig {
    ItemConfig {
        id: id.to_string(),
        category,
        scale,
        sound: sound.map(str::to_string),
    }
}

pub fn items() -> Vec<ItemConfig> {
    vec![
        entry("chicken", ItemCategory::Animal, 1.0, Some("chicken")),
        entry("cow", ItemCategory::Animal, 1.2, Some("cow")),
        entry("fence", ItemCategory::Structure, 1.0, Some("place")),
        entry("tree", ItemCategory::Terrain, 1.4, Some("place")),
        entry("ground", ItemCategory::Terrain, 1.0, None),
        entry("strawberry", ItemCategory::Crop, 0.8, Some("place")),
        entry("corn", ItemCategory::Crop, 1.0, Some("place")),
        entry("grape", ItemCategory::Crop, 0.9, Some("place")),
        entry("tomato", ItemCategory::Crop, 0.8, Some("place")),
    ]
}

pub fn item(id: &str) -> Option<ItemConfig> {
    items().into_iter().find(|item| item.id == id)
}

/// One scripted drop within a level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placement {
    pub item: String,
    pub position: [f32; 3],
    /// Rotation around the vertical axis, radians
    #[serde(default)]
    pub rotation: f32,
}

fn put(item: &str, x: f32, z: f32, rotation: f32) -> Placement {
    Placement {
        item: item.to_string(),
        position: [x, 0.0, z],
        rotation,
    }
}

/// One level: which phase hosts it, what lands, and what follows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSpec {
    pub id: u32,
    pub phase: String,
    pub title: String,
    pub placements: Vec<Placement>,
    /// Next level id, or none when this level ends the game
    pub next: Option<u32>,
}

impl LevelSpec {
    pub fn goal(&self) -> usize {
        self.placements.len()
    }
}

pub fn levels() -> Vec<LevelSpec> {
    vec![
        LevelSpec {
            id: 1,
            phase: LEVEL_ANIMAL.to_string(),
            title: "Bring in the animals".to_string(),
            placements: vec![
                put("ground", 0.0, 0.0, 0.0),
                put("chicken", -2.0, 1.0, 0.4),
                put("chicken", -1.0, 2.5, 2.1),
                put("cow", 2.5, -1.0, 0.0),
                put("cow", 3.5, 1.5, 3.1),
            ],
            next: Some(2),
        },
        LevelSpec {
            id: 2,
            phase: LEVEL_FENCE.to_string(),
            title: "Fence the paddock".to_string(),
            placements: vec![
                put("fence", -4.0, -4.0, 0.0),
                put("fence", -2.0, -4.0, 0.0),
                put("fence", 0.0, -4.0, 0.0),
                put("fence", 2.0, -4.0, 0.0),
                put("fence", 4.0, -4.0, 0.0),
                put("fence", 4.0, -2.0, 1.5708),
                put("fence", 4.0, 0.0, 1.5708),
            ],
            next: Some(3),
        },
        LevelSpec {
            id: 3,
            phase: LEVEL_GARDEN.to_string(),
            title: "Plant the garden".to_string(),
            placements: vec![
                put("tree", -5.0, 3.0, 0.0),
                put("strawberry", -1.5, -1.5, 0.0),
                put("corn", -0.5, -1.5, 0.0),
                put("grape", 0.5, -1.5, 0.0),
                put("tomato", 1.5, -1.5, 0.0),
                put("tree", 5.0, 4.0, 2.0),
            ],
            next: None,
        },
    ]
}

pub fn level(id: u32) -> Option<LevelSpec> {
    levels().into_iter().find(|level| level.id == id)
}

/// Everything the demo loads up front.
pub fn manifest() -> AssetManifest {
    AssetManifest {
        models: vec![MODEL_PATH.to_string()],
        images: vec![
            ImageEntry {
                name: "logo".to_string(),
                path: "assets/images/logo.png".to_string(),
            },
            ImageEntry {
                name: "hand".to_string(),
                path: "assets/images/hand.png".to_string(),
            },
        ],
        sounds: vec![
            ClipEntry {
                id: "place".to_string(),
                path: "assets/audio/place.ogg".to_string(),
                volume: 1.0,
            },
            ClipEntry {
                id: "chicken".to_string(),
                path: "assets/audio/chicken.ogg".to_string(),
                volume: 0.9,
            },
            ClipEntry {
                id: "cow".to_string(),
                path: "assets/audio/cow.ogg".to_string(),
                volume: 0.9,
            },
            ClipEntry {
                id: "level".to_string(),
                path: "assets/audio/level.ogg".to_string(),
                volume: 1.0,
            },
            ClipEntry {
                id: "win".to_string(),
                path: "assets/audio/win.ogg".to_string(),
                volume: 1.0,
            },
        ],
        music: vec![ClipEntry {
            id: "theme".to_string(),
            path: "assets/audio/theme.ogg".to_string(),
            volume: 0.4,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_unique() {
        let items = items();
        for (i, a) in items.iter().enumerate() {
            for b in &items[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn every_placement_references_a_catalog_item() {
        for level in levels() {
            for placement in &level.placements {
                assert!(
                    item(&placement.item).is_some(),
                    "level {} places unknown item '{}'",
                    level.id,
                    placement.item
                );
            }
        }
    }

    #[test]
    fn levels_chain_to_the_end() {
        let levels = levels();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].next, Some(2));
        assert_eq!(levels[1].next, Some(3));
        assert_eq!(levels[2].next, None);
        for level in &levels {
            assert_eq!(phase_for_level(level.id), Some(level.phase.as_str()));
            assert!(level.goal() > 0);
        }
        assert_eq!(phase_for_level(4), None);
    }

    #[test]
    fn manifest_covers_every_item_sound() {
        let manifest = manifest();
        for item in items() {
            if let Some(sound) = item.sound {
                assert!(
                    manifest.sounds.iter().any(|clip| clip.id == sound),
                    "no clip for '{}'",
                    sound
                );
            }
        }
        assert_eq!(manifest.models, vec![MODEL_PATH.to_string()]);
    }
}
