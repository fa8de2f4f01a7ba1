//! Application loop
//!
//! Owns the shared services (bus, assets, audio, compositor) and the hosted
//! game, polls the window for resizes, and drives one frame per call with a
//! fixed update step derived from the target frame rate.

use macroquad::time::get_time;
use macroquad::window::{screen_height, screen_width};
use macroquad::miniquad::window::dpi_scale;

use crate::assets::AssetPipeline;
use crate::audio::AudioManager;
use crate::bus::{EventBus, Payload};
use crate::config::Config;
use crate::game::Game;
use crate::phase::PhaseError;
use crate::render::Compositor;

/// Shared services handed to phases and games. Fields are public so callers
/// can borrow services independently of each other.
pub struct Core {
    pub config: Config,
    pub bus: EventBus,
    pub assets: AssetPipeline,
    pub audio: AudioManager,
    pub compositor: Compositor,
    /// False in headless contexts where no pointer state exists.
    pub input_enabled: bool,
}

impl Core {
    pub fn new(config: Config, width: f32, height: f32) -> Core {
        let compositor = Compositor::new(width, height, &config);
        let audio = AudioManager::new(&config.audio);
        Core {
            config,
            bus: EventBus::new(),
            assets: AssetPipeline::new(),
            audio,
            compositor,
            input_enabled: true,
        }
    }
}

/// Per-frame timing. Updates advance by a fixed step so gameplay pacing is
/// independent of the real frame rate; the measured delta is kept alongside
/// for diagnostics.
pub struct FrameClock {
    fixed_delta: f32,
    last_time: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDelta {
    pub fixed: f32,
    pub real: f32,
}

impl FrameClock {
    pub fn new(target_fps: f32) -> FrameClock {
        let fps = if target_fps > 0.0 { target_fps } else { 60.0 };
        FrameClock {
            fixed_delta: 1.0 / fps,
            last_time: None,
        }
    }

    pub fn fixed_delta(&self) -> f32 {
        self.fixed_delta
    }

    pub fn tick(&mut self, now: f64) -> FrameDelta {
        let real = match self.last_time {
            Some(last) => (now - last) as f32,
            None => self.fixed_delta,
        };
        self.last_time = Some(now);
        FrameDelta {
            fixed: self.fixed_delta,
            real,
        }
    }
}

pub struct App {
    pub core: Core,
    game: Option<Box<dyn Game>>,
    clock: FrameClock,
    last_size: (f32, f32),
    disposed: bool,
}

impl App {
    pub fn new(config: Config, width: f32, height: f32) -> App {
        let clock = FrameClock::new(config.target_fps);
        App {
            core: Core::new(config, width, height),
            game: None,
            clock,
            last_size: (width, height),
            disposed: false,
        }
    }

    /// Install and start a game. The game keeps running across frames until
    /// `dispose`.
    pub async fn run_game(&mut self, mut game: Box<dyn Game>) -> Result<(), PhaseError> {
        game.init(&mut self.core);
        let started = game.start(&mut self.core).await;
        self.game = Some(game);
        started
    }

    /// One frame: resize poll, fixed-step update, composite.
    pub async fn frame(&mut self) {
        self.poll_resize(screen_width(), screen_height(), dpi_scale());
        let delta = self.clock.tick(get_time());
        self.update(delta.fixed).await;
        self.core.compositor.render(&mut self.core.assets);
    }

    /// Compare the window size against the last seen one and propagate a
    /// change. The compositor updates before the broadcast, so listeners
    /// always observe the new layout.
    pub fn poll_resize(&mut self, width: f32, height: f32, dpi: f32) {
        if (width, height) != self.last_size && width > 0.0 && height > 0.0 {
            self.last_size = (width, height);
            self.resize(width, height, dpi);
        }
    }

    pub fn resize(&mut self, width: f32, height: f32, dpi: f32) {
        self.core.compositor.resize(width, height, dpi);
        self.core.bus.dispatch(
            "resize",
            &Payload::Resize {
                width,
                height,
                orientation: self.core.compositor.orientation(),
            },
        );
    }

    pub async fn update(&mut self, delta: f32) {
        if let Some(game) = self.game.as_mut() {
            game.update(delta, &mut self.core).await;
        }
    }

    pub fn fixed_delta(&self) -> f32 {
        self.clock.fixed_delta()
    }

    /// Tear everything down in dependency order: the game first, then the
    /// shared services it used. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if let Some(mut game) = self.game.take() {
            game.dispose(&mut self.core);
        }
        self.core.bus.remove_all(None);
        self.core.audio.dispose(&self.core.assets);
        self.core.assets.dispose();
        self.core.compositor.dispose();
        self.disposed = true;
    }
}
