//! Garden makeover demo
//!
//! A small scripted building game: load everything, then walk three levels
//! that drop animals, fences and plants into the scene, and finish on a win
//! screen. Phases never call each other; they publish on the bus and the
//! game drains the resulting actions between frames.

pub mod config;
pub mod hud;
mod model;
mod phases;

pub use model::GardenModel;
pub use phases::{LevelPhase, LoadingPhase, WinPhase};

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;

use crate::app::Core;
use crate::bus::{EventBus, ListenerError, ListenerId, Payload};
use crate::game::Game;
use crate::phase::{PhaseError, StateMachine};

/// Transition requests gathered from bus listeners, applied once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PendingAction {
    Level(u32),
    Win,
    Restart,
}

pub struct GardenGame {
    machine: StateMachine,
    model: Rc<RefCell<GardenModel>>,
    pending: Rc<RefCell<Option<PendingAction>>>,
    listeners: Vec<(&'static str, ListenerId)>,
}

impl GardenGame {
    pub fn new(bus: &EventBus) -> GardenGame {
        let model = Rc::new(RefCell::new(GardenModel::new()));
        let pending: Rc<RefCell<Option<PendingAction>>> = Rc::new(RefCell::new(None));
        let mut listeners = Vec::new();

        {
            let pending = pending.clone();
            let id = bus.add("model:level-changed", move |payload| {
                let Payload::Level(level) = payload else {
                    return Err(ListenerError("expected a level payload".into()));
                };
                *pending.borrow_mut() = Some(PendingAction::Level(*level));
                Ok(())
            });
            listeners.push(("model:level-changed", id));
        }
        {
            let pending = pending.clone();
            let id = bus.add("game:won", move |_| {
                *pending.borrow_mut() = Some(PendingAction::Win);
                Ok(())
            });
            listeners.push(("game:won", id));
        }
        {
            let pending = pending.clone();
            let id = bus.add("game:restart", move |_| {
                *pending.borrow_mut() = Some(PendingAction::Restart);
                Ok(())
            });
            listeners.push(("game:restart", id));
        }
        {
            let id = bus.add("model:item-added", move |payload| {
                let Payload::ItemAdded(placement) = payload else {
                    return Err(ListenerError("expected an item payload".into()));
                };
                println!(
                    "Placed {} '{}' at ({:.1}, {:.1}, {:.1})",
                    placement.item,
                    placement.id,
                    placement.position[0],
                    placement.position[1],
                    placement.position[2]
                );
                Ok(())
            });
            listeners.push(("model:item-added", id));
        }

        GardenGame {
            machine: StateMachine::new(),
            model,
            pending,
            listeners,
        }
    }

    pub fn phase(&self) -> Option<&str> {
        self.machine.current()
    }

    pub fn model(&self) -> Rc<RefCell<GardenModel>> {
        self.model.clone()
    }

    async fn apply(&mut self, action: PendingAction, core: &mut Core) -> Result<(), PhaseError> {
        match action {
            PendingAction::Level(level) => match config::phase_for_level(level) {
                Some(phase) => self.machine.change_to(phase, core).await,
                None => Err(PhaseError::Unknown(format!("level {}", level))),
            },
            PendingAction::Win => self.machine.change_to(config::WIN, core).await,
            PendingAction::Restart => {
                core.compositor.scene.clear();
                self.model.borrow_mut().reset();
                core.bus.dispatch("model:cleared", &Payload::Empty);
                self.machine.change_to(config::LEVEL_ANIMAL, core).await
            }
        }
    }
}

#[async_trait(?Send)]
impl Game for GardenGame {
    fn init(&mut self, _core: &mut Core) {
        self.machine.add(Box::new(LoadingPhase::new()));
        for spec in config::levels() {
            self.machine
                .add(Box::new(LevelPhase::new(spec, self.model.clone())));
        }
        self.machine.add(Box::new(WinPhase::new(self.model.clone())));
    }

    async fn start(&mut self, core: &mut Core) -> Result<(), PhaseError> {
        self.machine.change_to(config::LOADING, core).await
    }

    async fn update(&mut self, delta: f32, core: &mut Core) {
        self.machine.update(delta, core);
        let action = self.pending.borrow_mut().take();
        if let Some(action) = action {
            if let Err(error) = self.apply(action, core).await {
                eprintln!("Transition failed: {}", error);
            }
        }
    }

    fn dispose(&mut self, core: &mut Core) {
        self.machine.shutdown(core);
        for (channel, id) in self.listeners.drain(..) {
            core.bus.remove(channel, id);
        }
        self.model.borrow_mut().reset();
    }
}
