//! In-process event bus shared by overlay surfaces and services.
//!
//! Delivery is synchronous and fans out to every registered observer in
//! registration order, on the thread that calls [`EventBus::send`].
//!
//! # Ordering
//!
//! Dispatch is strictly depth-first. When an observer sends an event while
//! handling another one, the nested event is delivered to every observer
//! before the outer dispatch moves on to its remaining observers:
//!
//! ```text
//! send(X) -> A(X) -> send(Y) -> A(Y), B(Y), C(Y)
//!         -> B(X)
//!         -> C(X)
//! ```
//!
//! The bus is `Rc` based and therefore `!Send`: it lives on the owner thread
//! and anything produced elsewhere must be marshaled onto that thread first.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use lsw_core::prelude::*;
use lsw_core::Event;

/// Receiver of bus events.
///
/// Observers are stored weakly. An observer that has been dropped is skipped
/// and pruned on the next dispatch.
pub trait EventObserver {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Handle one event. An error aborts the dispatch and is returned to the
    /// sender.
    fn on_event(&self, event: &Event) -> Result<()>;
}

/// Handle returned by [`EventBus::add_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

struct ObserverEntry {
    id: ObserverId,
    observer: Weak<dyn EventObserver>,
}

#[derive(Default)]
struct BusInner {
    observers: RefCell<Vec<ObserverEntry>>,
    next_id: Cell<u64>,
    depth: Cell<usize>,
}

/// Multi-observer broadcast bus. Cloning yields another handle to the same bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<BusInner>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observer_count())
            .field("depth", &self.inner.depth.get())
            .finish()
    }
}

/// Restores the dispatch depth even when an observer fails.
struct DepthGuard<'a>(&'a Cell<usize>);

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        Self(depth)
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. It receives events sent after the current
    /// dispatch (if any) completes.
    pub fn add_observer<O: EventObserver + 'static>(&self, observer: &Rc<O>) -> ObserverId {
        let observer: Rc<dyn EventObserver> = observer.clone();
        self.add_observer_weak(Rc::downgrade(&observer))
    }

    /// Register an observer that only has a weak handle to itself.
    pub fn add_observer_weak(&self, observer: Weak<dyn EventObserver>) -> ObserverId {
        let id = ObserverId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner
            .observers
            .borrow_mut()
            .push(ObserverEntry { id, observer });
        trace!("Observer {:?} added", id);
        id
    }

    /// Remove an observer. Takes effect immediately, including for a
    /// dispatch already in progress. Returns `false` if it was not registered.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.inner.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|entry| entry.id != id);
        let removed = observers.len() != before;
        if removed {
            trace!("Observer {:?} removed", id);
        }
        removed
    }

    pub fn is_registered(&self, id: ObserverId) -> bool {
        self.inner
            .observers
            .borrow()
            .iter()
            .any(|entry| entry.id == id)
    }

    /// Number of registered observers (including ones not yet pruned)
    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    /// Current nesting level of dispatches. Zero outside of `send`.
    pub fn dispatch_depth(&self) -> usize {
        self.inner.depth.get()
    }

    /// Deliver `event` to every observer, depth-first.
    ///
    /// Events sent with no observers registered are dropped.
    pub fn send(&self, event: Event) -> Result<()> {
        let snapshot: Vec<(ObserverId, Weak<dyn EventObserver>)> = self
            .inner
            .observers
            .borrow()
            .iter()
            .map(|entry| (entry.id, entry.observer.clone()))
            .collect();

        if snapshot.is_empty() {
            trace!("Dropping {} (no observers)", event.event_type());
            return Ok(());
        }

        let _guard = DepthGuard::enter(&self.inner.depth);
        debug!(
            depth = self.inner.depth.get(),
            "Dispatching {} to {} observer(s)",
            event.event_type(),
            snapshot.len()
        );

        for (id, observer) in snapshot {
            if !self.is_registered(id) {
                continue;
            }

            let Some(observer) = observer.upgrade() else {
                trace!("Pruning dropped observer {:?}", id);
                self.remove_observer(id);
                continue;
            };

            if let Err(e) = observer.on_event(&event) {
                warn!(
                    "Observer '{}' failed on {}: {}",
                    observer.name(),
                    event.event_type(),
                    e
                );
                return Err(e);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        name: String,
        log: Log,
        bus: EventBus,
        /// Event to send (once) when `on` is received
        relay: RefCell<Option<(Event, Event)>>,
    }

    impl Recorder {
        fn new(name: &str, log: &Log, bus: &EventBus) -> Rc<Self> {
            Rc::new(Self {
                name: name.to_string(),
                log: log.clone(),
                bus: bus.clone(),
                relay: RefCell::new(None),
            })
        }

        fn relaying(self: Rc<Self>, on: Event, send: Event) -> Rc<Self> {
            *self.relay.borrow_mut() = Some((on, send));
            self
        }
    }

    impl EventObserver for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn on_event(&self, event: &Event) -> Result<()> {
            self.log
                .borrow_mut()
                .push(format!("{}:{}", self.name, event.event_type()));

            let relay = {
                let relay = self.relay.borrow();
                match relay.as_ref() {
                    Some((on, send)) if on == event => Some(send.clone()),
                    _ => None,
                }
            };
            if let Some(send) = relay {
                self.relay.borrow_mut().take();
                self.bus.send(send)?;
            }
            Ok(())
        }
    }

    struct Failing;

    impl EventObserver for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn on_event(&self, _event: &Event) -> Result<()> {
            Err(Error::observer("failing", "intentional failure"))
        }
    }

    fn entries(log: &Log) -> Vec<String> {
        log.borrow().clone()
    }

    #[test]
    fn test_send_without_observers_is_dropped() {
        let bus = EventBus::new();
        assert!(bus.send(Event::ShowDrawer).is_ok());
        assert_eq!(bus.dispatch_depth(), 0);
    }

    #[test]
    fn test_delivery_follows_registration_order() {
        let bus = EventBus::new();
        let log: Log = Rc::default();
        let a = Recorder::new("a", &log, &bus);
        let b = Recorder::new("b", &log, &bus);
        let c = Recorder::new("c", &log, &bus);
        bus.add_observer(&a);
        bus.add_observer(&b);
        bus.add_observer(&c);

        bus.send(Event::ScreenOn).unwrap();

        assert_eq!(
            entries(&log),
            vec!["a:screen_on", "b:screen_on", "c:screen_on"]
        );
    }

    #[test]
    fn test_nested_send_dispatches_depth_first() {
        let bus = EventBus::new();
        let log: Log = Rc::default();
        let a = Recorder::new("a", &log, &bus).relaying(Event::ScrollOpenFinish, Event::DrawerShown);
        let b = Recorder::new("b", &log, &bus);
        let c = Recorder::new("c", &log, &bus);
        bus.add_observer(&a);
        bus.add_observer(&b);
        bus.add_observer(&c);

        bus.send(Event::ScrollOpenFinish).unwrap();

        assert_eq!(
            entries(&log),
            vec![
                "a:scroll_open_finish",
                "a:drawer_shown",
                "b:drawer_shown",
                "c:drawer_shown",
                "b:scroll_open_finish",
                "c:scroll_open_finish",
            ]
        );
        assert_eq!(bus.dispatch_depth(), 0);
    }

    #[test]
    fn test_nested_send_from_middle_observer() {
        let bus = EventBus::new();
        let log: Log = Rc::default();
        let a = Recorder::new("a", &log, &bus);
        let b = Recorder::new("b", &log, &bus).relaying(Event::CloseDrawer, Event::DrawerHidden);
        let c = Recorder::new("c", &log, &bus);
        bus.add_observer(&a);
        bus.add_observer(&b);
        bus.add_observer(&c);

        bus.send(Event::CloseDrawer).unwrap();

        assert_eq!(
            entries(&log),
            vec![
                "a:close_drawer",
                "b:close_drawer",
                "a:drawer_hidden",
                "b:drawer_hidden",
                "c:drawer_hidden",
                "c:close_drawer",
            ]
        );
    }

    #[test]
    fn test_removed_observer_stops_receiving() {
        let bus = EventBus::new();
        let log: Log = Rc::default();
        let a = Recorder::new("a", &log, &bus);
        let b = Recorder::new("b", &log, &bus);
        let id_a = bus.add_observer(&a);
        bus.add_observer(&b);

        assert!(bus.remove_observer(id_a));
        assert!(!bus.remove_observer(id_a));
        bus.send(Event::ScreenOff).unwrap();

        assert_eq!(entries(&log), vec!["b:screen_off"]);
    }

    #[test]
    fn test_dropped_observer_is_pruned() {
        let bus = EventBus::new();
        let log: Log = Rc::default();
        let a = Recorder::new("a", &log, &bus);
        bus.add_observer(&a);
        drop(a);

        bus.send(Event::ScreenOn).unwrap();

        assert!(entries(&log).is_empty());
        assert_eq!(bus.observer_count(), 0);
    }

    #[test]
    fn test_observer_error_propagates_and_stops_dispatch() {
        let bus = EventBus::new();
        let log: Log = Rc::default();
        let a = Recorder::new("a", &log, &bus);
        let failing = Rc::new(Failing);
        let c = Recorder::new("c", &log, &bus);
        bus.add_observer(&a);
        bus.add_observer(&failing);
        bus.add_observer(&c);

        let result = bus.send(Event::ShowDrawer);

        assert!(matches!(result, Err(Error::Observer { .. })));
        assert_eq!(entries(&log), vec!["a:show_drawer"]);
        assert_eq!(bus.dispatch_depth(), 0);
    }

    #[test]
    fn test_observer_added_during_dispatch_waits_for_next_event() {
        struct Adder {
            bus: EventBus,
            late: Rc<Recorder>,
        }

        impl EventObserver for Adder {
            fn name(&self) -> &str {
                "adder"
            }

            fn on_event(&self, _event: &Event) -> Result<()> {
                if !self.bus.is_registered(ObserverId(1)) {
                    self.bus.add_observer(&self.late);
                }
                Ok(())
            }
        }

        let bus = EventBus::new();
        let log: Log = Rc::default();
        let late = Recorder::new("late", &log, &bus);
        let adder = Rc::new(Adder {
            bus: bus.clone(),
            late: late.clone(),
        });
        bus.add_observer(&adder);

        bus.send(Event::ScreenOn).unwrap();
        assert!(entries(&log).is_empty());

        bus.send(Event::ScreenOff).unwrap();
        assert_eq!(entries(&log), vec!["late:screen_off"]);
    }
}
