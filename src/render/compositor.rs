use macroquad::camera::{set_camera, set_default_camera, Camera3D};
use macroquad::color::Color;
use macroquad::math::vec3;
use macroquad::window::clear_background;

use crate::assets::AssetPipeline;
use crate::config::{Config, Orientation, ScreenConfig};
use crate::render::layout::{classify_orientation, StageLayout};
use crate::render::overlay::Overlay;
use crate::render::scene::Scene3d;

/// Owner of both drawing surfaces and all viewport-derived state. A resize
/// updates size, orientation, camera aspect and stage layout together before
/// anything can observe a half-updated view.
pub struct Compositor {
    width: f32,
    height: f32,
    dpi_scale: f32,
    orientation: Orientation,
    screen: ScreenConfig,
    camera: Camera3D,
    clear_color: Color,
    stage: StageLayout,
    pub scene: Scene3d,
    pub overlay: Overlay,
}

impl Compositor {
    pub fn new(width: f32, height: f32, config: &Config) -> Compositor {
        let orientation = classify_orientation(width, height, None);
        let base = config.screen.base(orientation);
        let [r, g, b] = config.renderer.clear_color;
        let camera = Camera3D {
            position: config.camera.position.into(),
            target: config.camera.target.into(),
            up: vec3(0.0, 1.0, 0.0),
            fovy: config.camera.fov_y,
            aspect: Some(width / height),
            ..Default::default()
        };
        Compositor {
            width,
            height,
            dpi_scale: 1.0,
            orientation,
            screen: config.screen,
            camera,
            clear_color: Color::new(r, g, b, 1.0),
            stage: StageLayout::compute(width, height, base),
            scene: Scene3d::new(),
            overlay: Overlay::new(base),
        }
    }

    pub fn resize(&mut self, width: f32, height: f32, dpi_scale: f32) {
        self.width = width;
        self.height = height;
        self.dpi_scale = dpi_scale;
        self.orientation = classify_orientation(width, height, Some(self.orientation));
        self.camera.aspect = Some(width / height);
        let base = self.screen.base(self.orientation);
        self.stage = StageLayout::compute(width, height, base);
        self.overlay.set_base(base);
    }

    pub fn viewport(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn dpi_scale(&self) -> f32 {
        self.dpi_scale
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn stage(&self) -> &StageLayout {
        &self.stage
    }

    pub fn camera(&self) -> &Camera3D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera3D {
        &mut self.camera
    }

    /// Three-quarter view over the scene origin, used by the garden levels.
    pub fn set_isometric_view(&mut self) {
        self.camera.position = vec3(12.0, 11.0, 12.0);
        self.camera.target = vec3(0.0, 0.0, 0.0);
    }

    /// One frame: clear, draw the 3D scene under the perspective camera,
    /// then the overlay in screen space on top.
    pub fn render(&mut self, assets: &mut AssetPipeline) {
        clear_background(self.clear_color);
        set_camera(&self.camera);
        self.scene.draw();
        set_default_camera();
        self.overlay.draw(&self.stage, assets);
    }

    pub fn dispose(&mut self) {
        self.scene.clear();
        self.overlay.clear();
    }
}
