use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use macroquad::input::{is_mouse_button_pressed, mouse_position, MouseButton};
use macroquad::math::{vec2, Vec3};

use crate::app::Core;
use crate::bus::{ItemPlacement, Payload};
use crate::garden::config::{self, LevelSpec};
use crate::garden::hud;
use crate::garden::model::GardenModel;
use crate::phase::{Phase, PhaseError};
use crate::render::Instance;

/// Seconds the loading screen stays up even when assets arrive instantly.
const MIN_LOADING_SECONDS: f32 = 1.0;

/// Seconds between scripted drops within a level.
const DROP_INTERVAL: f32 = 0.35;

/// Boot phase: shows the loading screen, pulls the whole manifest through
/// the pipeline, then waits for the start button.
pub struct LoadingPhase {
    elapsed: f32,
    reported: f32,
    ready: bool,
    started: bool,
}

impl LoadingPhase {
    pub fn new() -> LoadingPhase {
        LoadingPhase {
            elapsed: 0.0,
            reported: -1.0,
            ready: false,
            started: false,
        }
    }

    fn begin(&mut self, core: &mut Core) {
        self.started = true;
        core.audio.play_music(&core.assets, "theme");
        core.bus.dispatch("model:level-changed", &Payload::Level(1));
    }
}

#[async_trait(?Send)]
impl Phase for LoadingPhase {
    fn name(&self) -> &str {
        config::LOADING
    }

    async fn enter(&mut self, core: &mut Core) -> Result<(), PhaseError> {
        self.elapsed = 0.0;
        self.reported = -1.0;
        self.ready = false;
        self.started = false;
        hud::install_loading_screen(&mut core.compositor.overlay);
        core.compositor.set_isometric_view();

        // Missing assets degrade to placeholders at draw time, so a partial
        // load still reaches the start button.
        let report = core.assets.load_all(&config::manifest()).await;
        for (key, error) in &report.failures {
            eprintln!("Failed to load '{}': {}", key, error);
        }
        if core.audio.enabled() {
            let decoded = core.assets.decode_audio().await;
            for (id, error) in &decoded.failures {
                eprintln!("Failed to decode '{}': {}", id, error);
            }
        }
        self.ready = true;
        Ok(())
    }

    fn update(&mut self, delta: f32, core: &mut Core) {
        self.elapsed += delta;
        let loaded = if self.ready { core.assets.progress() } else { 0.0 };
        let progress = loaded.min(self.elapsed / MIN_LOADING_SECONDS).clamp(0.0, 1.0);
        core.compositor
            .overlay
            .set_progress(hud::LOADING_BAR, progress);
        if progress != self.reported {
            self.reported = progress;
            core.bus.dispatch("load:progress", &Payload::Progress(progress));
        }
        if progress >= 1.0 && !self.started {
            core.compositor.overlay.set_visible(hud::START_BUTTON, true);
            core.compositor
                .overlay
                .set_text(hud::LOADING_LABEL, "Ready!");
            if core.input_enabled && is_mouse_button_pressed(MouseButton::Left) {
                let (x, y) = mouse_position();
                let hit = core
                    .compositor
                    .overlay
                    .hit_test(core.compositor.stage(), vec2(x, y))
                    == Some(hud::START_BUTTON);
                if hit {
                    self.begin(core);
                }
            }
        }
    }

    fn exit(&mut self, core: &mut Core) {
        hud::remove_loading_screen(&mut core.compositor.overlay);
    }
}

/// One scripted level. Drops land on a timer; each one goes into the scene,
/// the shared model and out on the bus. When the script is exhausted the
/// phase requests the next level, or the win screen after the last.
pub struct LevelPhase {
    spec: LevelSpec,
    model: Rc<RefCell<GardenModel>>,
    cursor: usize,
    timer: f32,
    advanced: bool,
}

impl LevelPhase {
    pub fn new(spec: LevelSpec, model: Rc<RefCell<GardenModel>>) -> LevelPhase {
        LevelPhase {
            spec,
            model,
            cursor: 0,
            timer: 0.0,
            advanced: false,
        }
    }

    fn drop_next(&mut self, core: &mut Core) {
        let Some(placement) = self.spec.placements.get(self.cursor) else {
            return;
        };
        self.cursor += 1;
        let Some(item) = config::item(&placement.item) else {
            eprintln!("Level {} places unknown item '{}'", self.spec.id, placement.item);
            return;
        };
        let id = format!("{}:{}", self.spec.phase, self.cursor);
        core.compositor.scene.place(
            Instance::new(&id, &item.id, Vec3::from(placement.position))
                .rotated(placement.rotation)
                .scaled(item.scale),
            &core.assets,
        );
        if let Some(sound) = &item.sound {
            core.audio.play_sound(&core.assets, sound, None);
        }
        let payload = ItemPlacement {
            id,
            item: item.id.clone(),
            position: placement.position,
            rotation: placement.rotation,
        };
        {
            let mut model = self.model.borrow_mut();
            model.add_placed(payload.clone());
            model.add_score(10);
        }
        core.bus.dispatch("model:item-added", &Payload::ItemAdded(payload));
    }
}

#[async_trait(?Send)]
impl Phase for LevelPhase {
    fn name(&self) -> &str {
        &self.spec.phase
    }

    async fn enter(&mut self, core: &mut Core) -> Result<(), PhaseError> {
        self.cursor = 0;
        self.timer = 0.0;
        self.advanced = false;
        self.model.borrow_mut().set_level(self.spec.id);
        hud::install_hud(&mut core.compositor.overlay, &self.spec.title);
        hud::set_goal_progress(&mut core.compositor.overlay, 0, self.spec.goal());
        hud::set_score(&mut core.compositor.overlay, self.model.borrow().score());
        core.audio.play_sound(&core.assets, "level", None);
        Ok(())
    }

    fn update(&mut self, delta: f32, core: &mut Core) {
        self.timer += delta;
        while self.timer >= DROP_INTERVAL && self.cursor < self.spec.placements.len() {
            self.timer -= DROP_INTERVAL;
            self.drop_next(core);
        }
        hud::set_goal_progress(&mut core.compositor.overlay, self.cursor, self.spec.goal());
        hud::set_score(&mut core.compositor.overlay, self.model.borrow().score());

        if self.cursor >= self.spec.goal() && !self.advanced {
            self.advanced = true;
            match self.spec.next {
                Some(next) => core
                    .bus
                    .dispatch("model:level-changed", &Payload::Level(next)),
                None => {
                    self.model.borrow_mut().set_complete(true);
                    core.bus.dispatch("game:won", &Payload::Empty);
                }
            }
        }
    }

    fn exit(&mut self, _core: &mut Core) {
        // Placed items stay in the scene; the next level builds on them.
    }
}

/// End screen with a restart button.
pub struct WinPhase {
    model: Rc<RefCell<GardenModel>>,
}

impl WinPhase {
    pub fn new(model: Rc<RefCell<GardenModel>>) -> WinPhase {
        WinPhase { model }
    }
}

#[async_trait(?Send)]
impl Phase for WinPhase {
    fn name(&self) -> &str {
        config::WIN
    }

    async fn enter(&mut self, core: &mut Core) -> Result<(), PhaseError> {
        hud::install_win_screen(&mut core.compositor.overlay);
        hud::set_score(&mut core.compositor.overlay, self.model.borrow().score());
        core.audio.play_sound(&core.assets, "win", None);
        Ok(())
    }

    fn update(&mut self, _delta: f32, core: &mut Core) {
        if core.input_enabled && is_mouse_button_pressed(MouseButton::Left) {
            let (x, y) = mouse_position();
            let hit = core
                .compositor
                .overlay
                .hit_test(core.compositor.stage(), vec2(x, y))
                == Some(hud::RESTART_BUTTON);
            if hit {
                core.bus.dispatch("game:restart", &Payload::Empty);
            }
        }
    }

    fn exit(&mut self, core: &mut Core) {
        hud::remove_win_screen(&mut core.compositor.overlay);
    }
}
