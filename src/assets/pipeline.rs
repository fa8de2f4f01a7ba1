//! The asset pipeline proper
//!
//! Caches keyed by path (models) or logical id (images, sounds, music).
//! Per-key loads are idempotent: a repeat call returns the cached entry
//! without a second transfer. Aggregate loads settle every entry and report
//! all failures together; one failure never aborts its siblings.
//!
//! Progress accounting: the denominator grows when a load is requested,
//! the numerator only on successful completion. A failed or stalled
//! resource therefore caps aggregate progress below 1.0 for the lifetime
//! of the pipeline; there are no timeouts.

use std::collections::HashMap;

use macroquad::audio::{load_sound_from_bytes, Sound};
use macroquad::models::Mesh;
use macroquad::texture::Texture2D;

use super::manifest::AssetManifest;
use super::model::{Model3d, NamedNode};
use super::source::{FileSource, HostSource};
use super::AssetError;

/// Lifecycle of one keyed resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
    Failed,
}

/// Aggregate progress accounting
///
/// Monotone by construction: `requested` only grows when new loads are
/// issued, `loaded` only grows on success.
#[derive(Debug, Default)]
pub struct ProgressLedger {
    requested: usize,
    loaded: usize,
}

impl ProgressLedger {
    pub fn request(&mut self, count: usize) {
        self.requested += count;
    }

    pub fn complete(&mut self) {
        self.loaded += 1;
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// loaded / requested, or 0.0 before anything was requested
    pub fn progress(&self) -> f32 {
        if self.requested == 0 {
            0.0
        } else {
            self.loaded as f32 / self.requested as f32
        }
    }
}

/// A decoded 2D image
///
/// Pixels are decoded at load time; the GPU texture is created lazily the
/// first time a renderer asks for it, so loading works without a drawing
/// context.
pub struct ImageAsset {
    pixels: image::RgbaImage,
    texture: Option<Texture2D>,
}

impl ImageAsset {
    fn from_bytes(bytes: &[u8]) -> Result<ImageAsset, AssetError> {
        let pixels = image::load_from_memory(bytes)
            .map_err(|e| AssetError::Decode(e.to_string()))?
            .to_rgba8();
        Ok(ImageAsset {
            pixels,
            texture: None,
        })
    }

    pub fn width(&self) -> f32 {
        self.pixels.width() as f32
    }

    pub fn height(&self) -> f32 {
        self.pixels.height() as f32
    }

    /// The GPU texture, uploading on first use. Requires a drawing context.
    pub fn texture(&mut self) -> &Texture2D {
        let pixels = &self.pixels;
        self.texture.get_or_insert_with(|| {
            Texture2D::from_rgba8(pixels.width() as u16, pixels.height() as u16, pixels.as_raw())
        })
    }
}

/// A cached sound clip or music track
///
/// Bytes are fetched at load time; decoding into a playable `Sound` happens
/// lazily because the audio context only exists under the running loop.
pub struct AudioClip {
    bytes: Vec<u8>,
    pub volume: f32,
    pub looping: bool,
    sound: Option<Sound>,
}

impl AudioClip {
    fn new(bytes: Vec<u8>, volume: f32, looping: bool) -> AudioClip {
        AudioClip {
            bytes,
            volume,
            looping,
            sound: None,
        }
    }

    /// Decode the clip if it has not been decoded yet
    pub async fn decode(&mut self) -> Result<(), AssetError> {
        if self.sound.is_none() {
            let sound = load_sound_from_bytes(&self.bytes)
                .await
                .map_err(|e| AssetError::Decode(e.to_string()))?;
            self.sound = Some(sound);
        }
        Ok(())
    }

    /// The playable handle, if `decode` has run
    pub fn sound(&self) -> Option<&Sound> {
        self.sound.as_ref()
    }
}

/// Outcome of an aggregate load: every entry settled, failures collected
#[derive(Default)]
pub struct LoadReport {
    pub failures: Vec<(String, AssetError)>,
}

impl LoadReport {
    pub fn ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Typed resource caches plus the progress ledger
pub struct AssetPipeline {
    source: Box<dyn FileSource>,
    models: HashMap<String, Model3d>,
    images: HashMap<String, ImageAsset>,
    sounds: HashMap<String, AudioClip>,
    music: HashMap<String, AudioClip>,
    /// Named-node lookup across every loaded model; duplicate names are a
    /// silent last-writer-wins override
    nodes: HashMap<String, NamedNode>,
    states: HashMap<String, LoadState>,
    ledger: ProgressLedger,
}

impl AssetPipeline {
    /// Pipeline reading through the host (filesystem / fetch)
    pub fn new() -> AssetPipeline {
        AssetPipeline::with_source(Box::new(HostSource))
    }

    pub fn with_source(source: Box<dyn FileSource>) -> AssetPipeline {
        AssetPipeline {
            source,
            models: HashMap::new(),
            images: HashMap::new(),
            sounds: HashMap::new(),
            music: HashMap::new(),
            nodes: HashMap::new(),
            states: HashMap::new(),
            ledger: ProgressLedger::default(),
        }
    }

    // --- single loads (idempotent per key) ---

    /// Load a glTF model, keyed by path
    pub async fn load_model(&mut self, path: &str) -> Result<(), AssetError> {
        if self.models.contains_key(path) {
            return Ok(());
        }
        self.ledger.request(1);
        self.fetch_model(path).await
    }

    /// Load a 2D image under a logical name
    pub async fn load_image(&mut self, name: &str, path: &str) -> Result<(), AssetError> {
        if self.images.contains_key(name) {
            return Ok(());
        }
        self.ledger.request(1);
        self.fetch_image(name, path).await
    }

    /// Load a sound clip under a logical id
    pub async fn load_sound(
        &mut self,
        id: &str,
        path: &str,
        volume: f32,
    ) -> Result<(), AssetError> {
        if self.sounds.contains_key(id) {
            return Ok(());
        }
        self.ledger.request(1);
        self.fetch_clip(id, path, volume, false).await
    }

    /// Load a looping music track under a logical id
    pub async fn load_music(
        &mut self,
        id: &str,
        path: &str,
        volume: f32,
    ) -> Result<(), AssetError> {
        if self.music.contains_key(id) {
            return Ok(());
        }
        self.ledger.request(1);
        self.fetch_clip(id, path, volume, true).await
    }

    // --- aggregate loads ---

    /// Load the 2D-image, sound and music sections of a manifest.
    ///
    /// The ledger counts the whole batch up front, so aggregate progress is
    /// monotone regardless of the order entries settle in.
    pub async fn load_from_config(&mut self, manifest: &AssetManifest) -> LoadReport {
        let mut report = LoadReport::default();

        let images = self.pending_images(manifest);
        let sounds = self.pending_clips(&manifest.sounds, false);
        let music = self.pending_clips(&manifest.music, true);
        self.ledger
            .request(images.len() + sounds.len() + music.len());

        for (name, path) in &images {
            if let Err(e) = self.fetch_image(name, path).await {
                report.failures.push((name.clone(), e));
            }
        }
        for (id, path, volume) in &sounds {
            if let Err(e) = self.fetch_clip(id, path, *volume, false).await {
                report.failures.push((id.clone(), e));
            }
        }
        for (id, path, volume) in &music {
            if let Err(e) = self.fetch_clip(id, path, *volume, true).await {
                report.failures.push((id.clone(), e));
            }
        }

        report
    }

    /// Load everything a manifest lists: models first, then the rest
    pub async fn load_all(&mut self, manifest: &AssetManifest) -> LoadReport {
        let mut report = LoadReport::default();

        let mut models: Vec<String> = Vec::new();
        for path in &manifest.models {
            if !self.models.contains_key(path) && !models.contains(path) {
                models.push(path.clone());
            }
        }
        self.ledger.request(models.len());

        for path in &models {
            if let Err(e) = self.fetch_model(path).await {
                report.failures.push((path.clone(), e));
            }
        }

        let rest = self.load_from_config(manifest).await;
        report.failures.extend(rest.failures);
        report
    }

    fn pending_images(&self, manifest: &AssetManifest) -> Vec<(String, String)> {
        let mut pending: Vec<(String, String)> = Vec::new();
        for entry in &manifest.images {
            if !self.images.contains_key(&entry.name)
                && !pending.iter().any(|(name, _)| *name == entry.name)
            {
                pending.push((entry.name.clone(), entry.path.clone()));
            }
        }
        pending
    }

    fn pending_clips(
        &self,
        entries: &[super::manifest::ClipEntry],
        looping: bool,
    ) -> Vec<(String, String, f32)> {
        let cache = if looping { &self.music } else { &self.sounds };
        let mut pending: Vec<(String, String, f32)> = Vec::new();
        for entry in entries {
            if !cache.contains_key(&entry.id)
                && !pending.iter().any(|(id, _, _)| *id == entry.id)
            {
                pending.push((entry.id.clone(), entry.path.clone(), entry.volume));
            }
        }
        pending
    }

    // --- fetch helpers (no ledger requests; callers account up front) ---

    async fn fetch_model(&mut self, path: &str) -> Result<(), AssetError> {
        self.states.insert(path.to_string(), LoadState::Loading);
        let bytes = match self.source.read(path).await {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.fail(path, e)),
        };
        let model = match Model3d::from_bytes(&bytes) {
            Ok(model) => model,
            Err(e) => return Err(self.fail(path, e)),
        };

        for (name, index) in model.named_nodes() {
            self.nodes.insert(
                name.to_string(),
                NamedNode {
                    model: path.to_string(),
                    node: index,
                },
            );
        }

        self.models.insert(path.to_string(), model);
        self.finish(path);
        Ok(())
    }

    async fn fetch_image(&mut self, name: &str, path: &str) -> Result<(), AssetError> {
        self.states.insert(name.to_string(), LoadState::Loading);
        let bytes = match self.source.read(path).await {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.fail(name, e)),
        };
        let asset = match ImageAsset::from_bytes(&bytes) {
            Ok(asset) => asset,
            Err(e) => return Err(self.fail(name, e)),
        };
        self.images.insert(name.to_string(), asset);
        self.finish(name);
        Ok(())
    }

    async fn fetch_clip(
        &mut self,
        id: &str,
        path: &str,
        volume: f32,
        looping: bool,
    ) -> Result<(), AssetError> {
        self.states.insert(id.to_string(), LoadState::Loading);
        let bytes = match self.source.read(path).await {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.fail(id, e)),
        };
        let clip = AudioClip::new(bytes, volume, looping);
        if looping {
            self.music.insert(id.to_string(), clip);
        } else {
            self.sounds.insert(id.to_string(), clip);
        }
        self.finish(id);
        Ok(())
    }

    fn fail(&mut self, key: &str, e: AssetError) -> AssetError {
        self.states.insert(key.to_string(), LoadState::Failed);
        e
    }

    fn finish(&mut self, key: &str) {
        self.states.insert(key.to_string(), LoadState::Loaded);
        self.ledger.complete();
    }

    // --- lookups ---

    pub fn model(&self, path: &str) -> Option<&Model3d> {
        self.models.get(path)
    }

    pub fn image(&self, name: &str) -> Option<&ImageAsset> {
        self.images.get(name)
    }

    pub fn image_mut(&mut self, name: &str) -> Option<&mut ImageAsset> {
        self.images.get_mut(name)
    }

    pub fn sound(&self, id: &str) -> Option<&AudioClip> {
        self.sounds.get(id)
    }

    pub fn music(&self, id: &str) -> Option<&AudioClip> {
        self.music.get(id)
    }

    pub fn music_mut(&mut self, id: &str) -> Option<&mut AudioClip> {
        self.music.get_mut(id)
    }

    /// Named-node lookup across all loaded models
    pub fn node(&self, name: &str) -> Option<&NamedNode> {
        self.nodes.get(name)
    }

    /// Build drawable meshes for a named node
    pub fn meshes_for(&self, node_name: &str) -> Vec<Mesh> {
        let Some(node) = self.nodes.get(node_name) else {
            return Vec::new();
        };
        let Some(model) = self.models.get(&node.model) else {
            return Vec::new();
        };
        model.node_meshes(node.node)
    }

    /// Decode every cached clip so playback later is synchronous
    pub async fn decode_audio(&mut self) -> LoadReport {
        let mut report = LoadReport::default();
        for (id, clip) in self.sounds.iter_mut().chain(self.music.iter_mut()) {
            if let Err(e) = clip.decode().await {
                report.failures.push((id.clone(), e));
            }
        }
        report
    }

    pub fn state(&self, key: &str) -> Option<LoadState> {
        self.states.get(key).copied()
    }

    /// Aggregate progress in 0..=1
    pub fn progress(&self) -> f32 {
        self.ledger.progress()
    }

    pub fn ledger(&self) -> &ProgressLedger {
        &self.ledger
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
            && self.images.is_empty()
            && self.sounds.is_empty()
            && self.music.is_empty()
            && self.nodes.is_empty()
    }

    /// Drop every cached resource and reset progress.
    ///
    /// Whole-cache clear only; there is no per-key eviction. GPU textures
    /// and sound handles are released as the caches drop them.
    pub fn dispose(&mut self) {
        self.models.clear();
        self.images.clear();
        self.sounds.clear();
        self.music.clear();
        self.nodes.clear();
        self.states.clear();
        self.ledger = ProgressLedger::default();
    }
}

impl Default for AssetPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::assets::testutil::{gltf_with_nodes, png_bytes};
    use super::super::source::MemorySource;
    use super::super::manifest::{ClipEntry, ImageEntry};
    use super::*;
    use pollster::block_on;

    fn pipeline_with(files: &[(&str, Vec<u8>)]) -> (AssetPipeline, std::rc::Rc<std::cell::RefCell<Vec<String>>>) {
        let mut source = MemorySource::new();
        for (path, bytes) in files {
            source.insert(*path, bytes.clone());
        }
        let reads = source.reads();
        (AssetPipeline::with_source(Box::new(source)), reads)
    }

    #[test]
    fn test_repeat_load_causes_one_transfer() {
        let (mut pipeline, reads) = pipeline_with(&[("ui/logo.png", png_bytes())]);

        block_on(pipeline.load_image("logo", "ui/logo.png")).unwrap();
        block_on(pipeline.load_image("logo", "ui/logo.png")).unwrap();
        block_on(pipeline.load_image("logo", "ui/logo.png")).unwrap();

        assert_eq!(reads.borrow().len(), 1);
        assert_eq!(pipeline.ledger().requested(), 1);
        assert_eq!(pipeline.progress(), 1.0);
    }

    #[test]
    fn test_progress_counts_batch_at_request_time() {
        let (mut pipeline, _) = pipeline_with(&[
            ("a.png", png_bytes()),
            ("clip.ogg", vec![1, 2, 3]),
        ]);

        let manifest = AssetManifest {
            images: vec![ImageEntry {
                name: "a".to_string(),
                path: "a.png".to_string(),
            }],
            sounds: vec![
                ClipEntry {
                    id: "clip".to_string(),
                    path: "clip.ogg".to_string(),
                    volume: 1.0,
                },
                ClipEntry {
                    id: "missing".to_string(),
                    path: "missing.ogg".to_string(),
                    volume: 1.0,
                },
            ],
            ..Default::default()
        };

        let report = block_on(pipeline.load_from_config(&manifest));

        // All three settled, one failed; the failure caps progress below 1.0
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "missing");
        assert_eq!(pipeline.ledger().requested(), 3);
        assert_eq!(pipeline.ledger().loaded(), 2);
        assert!((pipeline.progress() - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(pipeline.state("missing"), Some(LoadState::Failed));
        assert_eq!(pipeline.state("clip"), Some(LoadState::Loaded));
    }

    #[test]
    fn test_failure_does_not_abort_siblings() {
        let (mut pipeline, _) = pipeline_with(&[("b.png", png_bytes())]);

        let manifest = AssetManifest {
            images: vec![
                ImageEntry {
                    name: "gone".to_string(),
                    path: "gone.png".to_string(),
                },
                ImageEntry {
                    name: "b".to_string(),
                    path: "b.png".to_string(),
                },
            ],
            ..Default::default()
        };

        let report = block_on(pipeline.load_from_config(&manifest));
        assert_eq!(report.failures.len(), 1);
        assert!(pipeline.image("b").is_some());
    }

    #[test]
    fn test_single_load_failure_is_reported() {
        let (mut pipeline, _) = pipeline_with(&[]);
        let err = block_on(pipeline.load_image("x", "x.png")).unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
        assert_eq!(pipeline.state("x"), Some(LoadState::Failed));
        assert_eq!(pipeline.progress(), 0.0);
    }

    #[test]
    fn test_undecodable_image_is_a_decode_error() {
        let (mut pipeline, _) = pipeline_with(&[("junk.png", vec![0, 1, 2, 3])]);
        let err = block_on(pipeline.load_image("junk", "junk.png")).unwrap_err();
        assert!(matches!(err, AssetError::Decode(_)));
    }

    #[test]
    fn test_model_load_indexes_named_nodes() {
        let (mut pipeline, _) =
            pipeline_with(&[("garden.gltf", gltf_with_nodes(&["tree", "chicken"]))]);

        block_on(pipeline.load_model("garden.gltf")).unwrap();

        let node = pipeline.node("tree").unwrap();
        assert_eq!(node.model, "garden.gltf");
        assert_eq!(node.node, 0);
        assert!(pipeline.node("Scene").is_none());
    }

    #[test]
    fn test_duplicate_node_name_resolves_to_latest_model() {
        let (mut pipeline, _) = pipeline_with(&[
            ("first.gltf", gltf_with_nodes(&["tree"])),
            ("second.gltf", gltf_with_nodes(&["fence", "tree"])),
        ]);

        block_on(pipeline.load_model("first.gltf")).unwrap();
        block_on(pipeline.load_model("second.gltf")).unwrap();

        // Last writer wins, silently
        assert_eq!(pipeline.node("tree").unwrap().model, "second.gltf");
        assert_eq!(pipeline.node("tree").unwrap().node, 1);
        assert_eq!(pipeline.node("fence").unwrap().model, "second.gltf");
    }

    #[test]
    fn test_duplicate_manifest_entries_counted_once() {
        let (mut pipeline, reads) = pipeline_with(&[("a.png", png_bytes())]);

        let manifest = AssetManifest {
            images: vec![
                ImageEntry {
                    name: "a".to_string(),
                    path: "a.png".to_string(),
                },
                ImageEntry {
                    name: "a".to_string(),
                    path: "a.png".to_string(),
                },
            ],
            ..Default::default()
        };

        let report = block_on(pipeline.load_from_config(&manifest));
        assert!(report.ok());
        assert_eq!(reads.borrow().len(), 1);
        assert_eq!(pipeline.progress(), 1.0);
    }

    #[test]
    fn test_dispose_round_trip_empties_everything() {
        let png = png_bytes();
        let files: Vec<(String, Vec<u8>)> = (0..5)
            .map(|i| (format!("img{}.png", i), png.clone()))
            .chain((0..3).map(|i| (format!("snd{}.ogg", i), vec![7, 7, 7])))
            .collect();
        let mut source = MemorySource::new();
        for (path, bytes) in &files {
            source.insert(path.clone(), bytes.clone());
        }
        let mut pipeline = AssetPipeline::with_source(Box::new(source));

        for i in 0..5 {
            block_on(pipeline.load_image(&format!("img{}", i), &format!("img{}.png", i)))
                .unwrap();
        }
        for i in 0..3 {
            block_on(pipeline.load_sound(&format!("snd{}", i), &format!("snd{}.ogg", i), 1.0))
                .unwrap();
        }
        assert!(!pipeline.is_empty());
        assert_eq!(pipeline.progress(), 1.0);

        pipeline.dispose();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.progress(), 0.0);
        assert!(pipeline.state("img0").is_none());
    }

    #[test]
    fn test_clip_volume_and_loop_flags() {
        let (mut pipeline, _) = pipeline_with(&[
            ("s.ogg", vec![1]),
            ("m.ogg", vec![2]),
        ]);

        block_on(pipeline.load_sound("s", "s.ogg", 0.8)).unwrap();
        block_on(pipeline.load_music("m", "m.ogg", 0.5)).unwrap();

        let sound = pipeline.sound("s").unwrap();
        assert_eq!(sound.volume, 0.8);
        assert!(!sound.looping);

        let music = pipeline.music("m").unwrap();
        assert_eq!(music.volume, 0.5);
        assert!(music.looping);
        // Not decoded until an audio context asks for it
        assert!(music.sound().is_none());
    }
}
