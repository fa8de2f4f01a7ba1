//! Phase state machine
//!
//! Gameplay is a flat set of named phases with exactly one current at a
//! time. Entering a phase is async so it can await asset loads; transitions
//! are serialized by ownership, so a transition requested while another is
//! mid-flight simply runs after it and wins.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::app::Core;
use crate::bus::Payload;

#[derive(Debug)]
pub enum PhaseError {
    /// Transition target was never registered
    Unknown(String),
    /// A phase's enter hook failed
    Enter { phase: String, message: String },
}

impl std::fmt::Display for PhaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhaseError::Unknown(name) => write!(f, "Unknown phase '{}'", name),
            PhaseError::Enter { phase, message } => {
                write!(f, "Entering phase '{}' failed: {}", phase, message)
            }
        }
    }
}

impl std::error::Error for PhaseError {}

/// One gameplay phase. `enter` may await; `update` and `exit` run inside
/// the frame and must not block.
#[async_trait(?Send)]
pub trait Phase {
    fn name(&self) -> &str;

    async fn enter(&mut self, _core: &mut Core) -> Result<(), PhaseError> {
        Ok(())
    }

    fn update(&mut self, _delta: f32, _core: &mut Core) {}

    fn exit(&mut self, _core: &mut Core) {}
}

#[derive(Default)]
pub struct StateMachine {
    phases: HashMap<String, Box<dyn Phase>>,
    current: Option<String>,
}

impl StateMachine {
    pub fn new() -> StateMachine {
        StateMachine::default()
    }

    /// Register a phase under its own name, replacing any previous one.
    pub fn add(&mut self, phase: Box<dyn Phase>) {
        self.phases.insert(phase.name().to_string(), phase);
    }

    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Phase>> {
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        self.phases.remove(name)
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.phases.contains_key(name)
    }

    /// Leave the current phase and enter `name`. On an unknown name the
    /// current phase has already exited and none is current. The new phase
    /// is current for the whole of its enter hook, so events it emits while
    /// loading are attributed to it even if the hook then fails.
    pub async fn change_to(&mut self, name: &str, core: &mut Core) -> Result<(), PhaseError> {
        if let Some(current) = self.current.take() {
            if let Some(phase) = self.phases.get_mut(&current) {
                phase.exit(core);
            }
        }
        if !self.phases.contains_key(name) {
            return Err(PhaseError::Unknown(name.to_string()));
        }
        self.current = Some(name.to_string());
        if let Some(phase) = self.phases.get_mut(name) {
            phase.enter(core).await?;
        }
        // Late subscribers get the layout the phase was entered under.
        let (width, height) = core.compositor.viewport();
        core.bus.dispatch(
            "resize",
            &Payload::Resize {
                width,
                height,
                orientation: core.compositor.orientation(),
            },
        );
        Ok(())
    }

    pub fn update(&mut self, delta: f32, core: &mut Core) {
        if let Some(current) = self.current.as_deref() {
            if let Some(phase) = self.phases.get_mut(current) {
                phase.update(delta, core);
            }
        }
    }

    /// Exit the current phase without entering another.
    pub fn shutdown(&mut self, core: &mut Core) {
        if let Some(current) = self.current.take() {
            if let Some(phase) = self.phases.get_mut(&current) {
                phase.exit(core);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::ListenerError;
    use crate::config::Config;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Probe {
        name: String,
        log: Rc<RefCell<Vec<String>>>,
        fail_enter: bool,
    }

    impl Probe {
        fn boxed(name: &str, log: &Rc<RefCell<Vec<String>>>) -> Box<Probe> {
            Box::new(Probe {
                name: name.to_string(),
                log: log.clone(),
                fail_enter: false,
            })
        }
    }

    #[async_trait(?Send)]
    impl Phase for Probe {
        fn name(&self) -> &str {
            &self.name
        }

        async fn enter(&mut self, _core: &mut Core) -> Result<(), PhaseError> {
            self.log.borrow_mut().push(format!("enter {}", self.name));
            if self.fail_enter {
                return Err(PhaseError::Enter {
                    phase: self.name.clone(),
                    message: "probe failure".into(),
                });
            }
            Ok(())
        }

        fn update(&mut self, delta: f32, _core: &mut Core) {
            self.log
                .borrow_mut()
                .push(format!("update {} {}", self.name, delta));
        }

        fn exit(&mut self, _core: &mut Core) {
            self.log.borrow_mut().push(format!("exit {}", self.name));
        }
    }

    fn core() -> Core {
        Core::new(Config::default(), 1920.0, 1080.0)
    }

    #[test]
    fn change_runs_exit_before_enter() {
        let mut core = core();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut machine = StateMachine::new();
        machine.add(Probe::boxed("a", &log));
        machine.add(Probe::boxed("b", &log));

        pollster::block_on(machine.change_to("a", &mut core)).unwrap();
        pollster::block_on(machine.change_to("b", &mut core)).unwrap();

        assert_eq!(machine.current(), Some("b"));
        assert_eq!(
            *log.borrow(),
            vec!["enter a".to_string(), "exit a".into(), "enter b".into()]
        );
    }

    #[test]
    fn unknown_target_leaves_no_current_phase() {
        let mut core = core();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut machine = StateMachine::new();
        machine.add(Probe::boxed("a", &log));

        pollster::block_on(machine.change_to("a", &mut core)).unwrap();
        let err = pollster::block_on(machine.change_to("nope", &mut core)).unwrap_err();

        assert!(matches!(err, PhaseError::Unknown(_)));
        assert_eq!(machine.current(), None);
        // The old phase still exited.
        assert_eq!(*log.borrow(), vec!["enter a".to_string(), "exit a".into()]);
        // Updating with no current phase is a no-op.
        machine.update(0.016, &mut core);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn update_reaches_only_the_current_phase() {
        let mut core = core();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut machine = StateMachine::new();
        machine.add(Probe::boxed("a", &log));
        machine.add(Probe::boxed("b", &log));

        pollster::block_on(machine.change_to("b", &mut core)).unwrap();
        machine.update(0.5, &mut core);

        assert_eq!(log.borrow().last().map(String::as_str), Some("update b 0.5"));
    }

    #[test]
    fn failed_enter_keeps_phase_current_and_reports() {
        let mut core = core();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut machine = StateMachine::new();
        let mut bad = Probe::boxed("bad", &log);
        bad.fail_enter = true;
        machine.add(bad);

        let err = pollster::block_on(machine.change_to("bad", &mut core)).unwrap_err();
        assert!(matches!(err, PhaseError::Enter { .. }));
        assert_eq!(machine.current(), Some("bad"));
    }

    #[test]
    fn resize_broadcast_follows_successful_enter() {
        let mut core = core();
        let log = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::new(RefCell::new(None));
        {
            let seen = seen.clone();
            core.bus.add("resize", move |payload| {
                if let Payload::Resize { width, height, .. } = payload {
                    *seen.borrow_mut() = Some((*width, *height));
                    Ok(())
                } else {
                    Err(ListenerError("unexpected payload".into()))
                }
            });
        }
        let mut machine = StateMachine::new();
        machine.add(Probe::boxed("a", &log));
        pollster::block_on(machine.change_to("a", &mut core)).unwrap();

        assert_eq!(*seen.borrow(), Some((1920.0, 1080.0)));
    }

    #[test]
    fn shutdown_exits_without_replacement() {
        let mut core = core();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut machine = StateMachine::new();
        machine.add(Probe::boxed("a", &log));

        pollster::block_on(machine.change_to("a", &mut core)).unwrap();
        machine.shutdown(&mut core);

        assert_eq!(machine.current(), None);
        assert_eq!(log.borrow().last().map(String::as_str), Some("exit a"));
    }
}
