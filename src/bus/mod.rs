//! Event bus
//!
//! Named publish/subscribe channels that decouple the runtime's systems.
//! Instead of calling each other directly, producers dispatch on a channel
//! and any number of consumers listen. Channel names are free-form strings
//! and form an implicit contract between producers and consumers (e.g.
//! "resize" carries `Payload::Resize`, "model:item-added" carries
//! `Payload::ItemAdded`).
//!
//! The bus is an explicitly constructed, cheaply clonable handle. Pass it
//! down as a service; tests build an isolated bus per case.
//!
//! Delivery rules:
//! - Within one channel, listeners fire synchronously in registration order.
//! - Dispatch on a channel with zero listeners is a no-op.
//! - A failing listener is logged and does not stop the remaining listeners.
//! - Listeners added to a channel while it is dispatching fire from the next
//!   dispatch on; removals are honored before the affected listener fires.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::config::Orientation;

/// Identifies a registered listener so it can be removed later.
///
/// Closures have no stable identity in Rust, so `add` hands out an id
/// instead of removing by function reference.
pub type ListenerId = u64;

/// Error a listener can surface without aborting the dispatch
#[derive(Debug, Clone)]
pub struct ListenerError(pub String);

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ListenerError {}

pub type ListenerResult = Result<(), ListenerError>;

type Listener = Box<dyn FnMut(&Payload) -> ListenerResult>;

/// A placed-item payload carried on "model:item-added"
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPlacement {
    /// Unique instance id
    pub id: String,
    /// Catalog item id
    pub item: String,
    pub position: [f32; 3],
    /// Rotation around the vertical axis, radians
    pub rotation: f32,
}

/// Event vocabulary of the runtime
///
/// The closed-enum rendition of the free-form payloads the channels carry.
/// Game-specific values ride in the generic `Text`/`Number` variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Resize {
        width: f32,
        height: f32,
        orientation: Orientation,
    },
    /// Aggregate load progress in 0..=1
    Progress(f32),
    /// Level index
    Level(u32),
    ItemAdded(ItemPlacement),
    /// Instance id of a removed item
    ItemRemoved(String),
    Text(String),
    Number(f64),
}

struct Entry {
    id: ListenerId,
    once: bool,
    callback: Listener,
}

#[derive(Default)]
struct Channel {
    entries: Vec<Entry>,
    /// Depth of in-flight dispatches on this channel
    dispatching: u32,
    /// Ids removed while a dispatch had the entries checked out
    removed: Vec<ListenerId>,
    /// `remove_all(name)` arrived while a dispatch was in flight
    cleared: bool,
}

#[derive(Default)]
struct BusInner {
    channels: HashMap<String, Channel>,
    next_id: ListenerId,
}

/// Named-channel publish/subscribe registry
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure the channel exists (channels are created lazily on first
    /// reference; this is idempotent)
    pub fn channel(&self, name: &str) {
        self.inner
            .borrow_mut()
            .channels
            .entry(name.to_string())
            .or_default();
    }

    /// Whether the channel has ever been referenced
    pub fn has(&self, name: &str) -> bool {
        self.inner.borrow().channels.contains_key(name)
    }

    /// Number of listeners currently registered on a channel
    pub fn listener_count(&self, name: &str) -> usize {
        self.inner
            .borrow()
            .channels
            .get(name)
            .map_or(0, |ch| ch.entries.len())
    }

    /// Register a listener; it stays until removed
    pub fn add<F>(&self, name: &str, listener: F) -> ListenerId
    where
        F: FnMut(&Payload) -> ListenerResult + 'static,
    {
        self.insert(name, false, Box::new(listener))
    }

    /// Register a listener that deregisters itself after its first call
    pub fn add_once<F>(&self, name: &str, listener: F) -> ListenerId
    where
        F: FnMut(&Payload) -> ListenerResult + 'static,
    {
        self.insert(name, true, Box::new(listener))
    }

    fn insert(&self, name: &str, once: bool, callback: Listener) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = inner.next_id;
        inner
            .channels
            .entry(name.to_string())
            .or_default()
            .entries
            .push(Entry { id, once, callback });
        id
    }

    /// Deregister one listener from a channel
    pub fn remove(&self, name: &str, id: ListenerId) {
        let mut inner = self.inner.borrow_mut();
        if let Some(ch) = inner.channels.get_mut(name) {
            if ch.dispatching > 0 {
                ch.removed.push(id);
            }
            ch.entries.retain(|e| e.id != id);
        }
    }

    /// Clear one channel's listeners, or with `None` clear and delete every
    /// channel (full application teardown)
    pub fn remove_all(&self, name: Option<&str>) {
        let mut inner = self.inner.borrow_mut();
        match name {
            Some(name) => {
                if let Some(ch) = inner.channels.get_mut(name) {
                    ch.entries.clear();
                    if ch.dispatching > 0 {
                        ch.cleared = true;
                    }
                }
            }
            None => inner.channels.clear(),
        }
    }

    /// Invoke every currently-registered listener on the channel, in
    /// registration order. Listener failures are logged to stderr and do not
    /// stop the remaining listeners.
    pub fn dispatch(&self, name: &str, payload: &Payload) {
        let running = {
            let mut inner = self.inner.borrow_mut();
            let ch = inner.channels.entry(name.to_string()).or_default();
            ch.dispatching += 1;
            std::mem::take(&mut ch.entries)
        };

        let mut kept: Vec<Entry> = Vec::with_capacity(running.len());
        for mut entry in running {
            // A listener earlier in this dispatch may have removed this one
            // or cleared the channel.
            let skip = {
                let inner = self.inner.borrow();
                inner
                    .channels
                    .get(name)
                    .map_or(true, |ch| ch.cleared || ch.removed.contains(&entry.id))
            };
            if skip {
                continue;
            }

            if let Err(e) = (entry.callback)(payload) {
                eprintln!("Listener on '{}' failed: {}", name, e);
            }

            if !entry.once {
                kept.push(entry);
            }
        }

        let mut inner = self.inner.borrow_mut();
        // The channel can be gone entirely if a listener tore the bus down.
        if let Some(ch) = inner.channels.get_mut(name) {
            ch.dispatching -= 1;
            if ch.cleared {
                if ch.dispatching == 0 {
                    ch.cleared = false;
                    ch.removed.clear();
                }
            } else {
                // Listeners registered during the dispatch landed in
                // `entries`; keep them after the survivors so registration
                // order is preserved.
                let added = std::mem::take(&mut ch.entries);
                ch.entries = kept;
                ch.entries.extend(added);
                if ch.dispatching == 0 && !ch.removed.is_empty() {
                    let removed = std::mem::take(&mut ch.removed);
                    ch.entries.retain(|e| !removed.contains(&e.id));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_bus() -> (EventBus, Rc<RefCell<Vec<String>>>) {
        (EventBus::new(), Rc::new(RefCell::new(Vec::new())))
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let (bus, log) = recording_bus();
        for tag in ["a", "b", "c"] {
            let log = log.clone();
            bus.add("ping", move |_| {
                log.borrow_mut().push(tag.to_string());
                Ok(())
            });
        }

        bus.dispatch("ping", &Payload::Empty);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);

        // Every listener exactly once per dispatch
        bus.dispatch("ping", &Payload::Empty);
        assert_eq!(log.borrow().len(), 6);
    }

    #[test]
    fn test_zero_subscriber_dispatch_is_noop() {
        let bus = EventBus::new();
        bus.dispatch("nobody-home", &Payload::Empty);
        assert!(bus.has("nobody-home"));
        assert_eq!(bus.listener_count("nobody-home"), 0);
    }

    #[test]
    fn test_listener_failure_does_not_stop_siblings() {
        let (bus, log) = recording_bus();
        bus.add("ping", |_| Err(ListenerError("boom".to_string())));
        {
            let log = log.clone();
            bus.add("ping", move |_| {
                log.borrow_mut().push("ran".to_string());
                Ok(())
            });
        }

        bus.dispatch("ping", &Payload::Empty);
        assert_eq!(*log.borrow(), vec!["ran"]);
    }

    #[test]
    fn test_add_once_fires_once() {
        let (bus, log) = recording_bus();
        {
            let log = log.clone();
            bus.add_once("ping", move |_| {
                log.borrow_mut().push("once".to_string());
                Ok(())
            });
        }

        bus.dispatch("ping", &Payload::Empty);
        bus.dispatch("ping", &Payload::Empty);
        assert_eq!(*log.borrow(), vec!["once"]);
        assert_eq!(bus.listener_count("ping"), 0);
    }

    #[test]
    fn test_remove_by_id() {
        let (bus, log) = recording_bus();
        let id = {
            let log = log.clone();
            bus.add("ping", move |_| {
                log.borrow_mut().push("gone".to_string());
                Ok(())
            })
        };
        bus.remove("ping", id);

        bus.dispatch("ping", &Payload::Empty);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_remove_all_one_channel() {
        let bus = EventBus::new();
        bus.add("a", |_| Ok(()));
        bus.add("b", |_| Ok(()));

        bus.remove_all(Some("a"));
        assert_eq!(bus.listener_count("a"), 0);
        assert_eq!(bus.listener_count("b"), 1);
        // Channel object survives a targeted clear
        assert!(bus.has("a"));
    }

    #[test]
    fn test_remove_all_teardown_deletes_channels() {
        let bus = EventBus::new();
        bus.add("a", |_| Ok(()));
        bus.add("b", |_| Ok(()));

        bus.remove_all(None);
        assert!(!bus.has("a"));
        assert!(!bus.has("b"));
    }

    #[test]
    fn test_listener_added_during_dispatch_waits_for_next() {
        let (bus, log) = recording_bus();
        {
            let bus2 = bus.clone();
            let log = log.clone();
            bus.add("ping", move |_| {
                let log = log.clone();
                bus2.add("ping", move |_| {
                    log.borrow_mut().push("late".to_string());
                    Ok(())
                });
                Ok(())
            });
        }

        bus.dispatch("ping", &Payload::Empty);
        assert!(log.borrow().is_empty());

        bus.dispatch("ping", &Payload::Empty);
        assert_eq!(*log.borrow(), vec!["late"]);
    }

    #[test]
    fn test_removal_during_dispatch_prevents_later_listener() {
        let (bus, log) = recording_bus();
        // First listener removes the second before it gets a chance to run
        let victim = Rc::new(RefCell::new(0));
        {
            let bus2 = bus.clone();
            let victim = victim.clone();
            bus.add("ping", move |_| {
                bus2.remove("ping", *victim.borrow());
                Ok(())
            });
        }
        let id = {
            let log = log.clone();
            bus.add("ping", move |_| {
                log.borrow_mut().push("victim".to_string());
                Ok(())
            })
        };
        *victim.borrow_mut() = id;

        bus.dispatch("ping", &Payload::Empty);
        assert!(log.borrow().is_empty());
        assert_eq!(bus.listener_count("ping"), 1);
    }

    #[test]
    fn test_payload_passes_through() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(None));
        {
            let seen = seen.clone();
            bus.add("resize", move |payload| {
                *seen.borrow_mut() = Some(payload.clone());
                Ok(())
            });
        }

        let payload = Payload::Resize {
            width: 800.0,
            height: 600.0,
            orientation: Orientation::Landscape,
        };
        bus.dispatch("resize", &payload);
        assert_eq!(seen.borrow().as_ref(), Some(&payload));
    }
}
